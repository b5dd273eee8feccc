// ABOUTME: Retry policies and the executor that runs fallible async actions under them
// ABOUTME: Aggregates per-attempt failures and classifies errors through their source chain

use crate::client::{MessagingError, SmppError};
use crate::client::config::{duration_ms, durations_ms};
use crate::preparator::PreparationError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// How many attempts to make and how long to wait between them
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RetryPolicy {
    FixedDelay {
        max_attempts: u32,
        #[serde(rename = "delay_ms", with = "duration_ms")]
        delay: Duration,
    },
    /// Delay doubles after every failed attempt
    ExponentialDelay {
        max_attempts: u32,
        #[serde(rename = "initial_delay_ms", with = "duration_ms")]
        initial_delay: Duration,
    },
    /// The n-th failure waits `delays[n - 1]`; the last entry repeats
    PerAttemptDelays {
        max_attempts: u32,
        #[serde(rename = "delays_ms", with = "durations_ms")]
        delays: Vec<Duration>,
    },
    /// Attempts start `interval` apart regardless of how long each took
    FixedInterval {
        max_attempts: u32,
        #[serde(rename = "interval_ms", with = "duration_ms")]
        interval: Duration,
    },
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        let max = match self {
            RetryPolicy::FixedDelay { max_attempts, .. }
            | RetryPolicy::ExponentialDelay { max_attempts, .. }
            | RetryPolicy::PerAttemptDelays { max_attempts, .. }
            | RetryPolicy::FixedInterval { max_attempts, .. } => *max_attempts,
        };
        max.max(1)
    }

    /// Wait after failed attempt number `attempt` (1-based) that took
    /// `elapsed` from its start
    pub fn delay_after(&self, attempt: u32, elapsed: Duration) -> Duration {
        match self {
            RetryPolicy::FixedDelay { delay, .. } => *delay,
            RetryPolicy::ExponentialDelay { initial_delay, .. } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                initial_delay.saturating_mul(factor)
            }
            RetryPolicy::PerAttemptDelays { delays, .. } => {
                let index = attempt.saturating_sub(1) as usize;
                delays
                    .get(index)
                    .or_else(|| delays.last())
                    .copied()
                    .unwrap_or(Duration::ZERO)
            }
            RetryPolicy::FixedInterval { interval, .. } => interval.saturating_sub(elapsed),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::FixedDelay {
            max_attempts: 10,
            delay: Duration::from_millis(500),
        }
    }
}

/// Failure of an action run by [`RetryExecutor`]
///
/// `failures` is never empty and lists the error of every attempt in order.
/// [`Error::source`] yields the last one.
#[derive(Debug)]
pub enum RetryError<E> {
    MaximumAttemptsReached { action: String, failures: Vec<E> },
    NotRetryable { action: String, failures: Vec<E> },
    /// No policy configured, so the single failure is reported as is
    NotRetried { action: String, source: E },
}

impl<E> RetryError<E> {
    pub fn failures(&self) -> &[E] {
        match self {
            RetryError::MaximumAttemptsReached { failures, .. }
            | RetryError::NotRetryable { failures, .. } => failures,
            RetryError::NotRetried { source, .. } => std::slice::from_ref(source),
        }
    }

    pub fn last(&self) -> Option<&E> {
        self.failures().last()
    }

    pub fn into_last(self) -> Option<E> {
        match self {
            RetryError::MaximumAttemptsReached { mut failures, .. }
            | RetryError::NotRetryable { mut failures, .. } => failures.pop(),
            RetryError::NotRetried { source, .. } => Some(source),
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::MaximumAttemptsReached { action, failures } => {
                write!(f, "{action} failed after {} attempts", failures.len())
            }
            RetryError::NotRetryable { action, failures } => write!(
                f,
                "{action} failed with a non-retryable error after {} attempt(s)",
                failures.len()
            ),
            RetryError::NotRetried { action, .. } => write!(f, "{action} failed"),
        }
    }
}

impl<E: Error + 'static> Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.last().map(|e| e as &(dyn Error + 'static))
    }
}

pub type RetryPredicate = Arc<dyn Fn(&(dyn Error + 'static)) -> bool + Send + Sync>;

/// Walks `error` and its sources
pub fn error_chain<'a>(
    error: &'a (dyn Error + 'static),
) -> impl Iterator<Item = &'a (dyn Error + 'static)> {
    std::iter::successors(Some(error), |e| (*e).source())
}

/// False when the SMSC rejected the credentials or the bind itself
pub fn can_retry_connecting(error: &(dyn Error + 'static)) -> bool {
    !error_chain(error).any(|e| {
        matches!(
            e.downcast_ref::<SmppError>(),
            Some(SmppError::BindRejected(status)) if status.is_fatal_bind_failure()
        )
    })
}

/// False when the message itself could not be prepared or the sender was
/// cleaned
pub fn can_resend_message(error: &(dyn Error + 'static)) -> bool {
    !error_chain(error).any(|e| {
        e.is::<PreparationError>()
            || matches!(e.downcast_ref::<MessagingError>(), Some(MessagingError::Closed))
    })
}

#[derive(Clone)]
pub struct RetryExecutor {
    policy: Option<RetryPolicy>,
    retryable: RetryPredicate,
}

impl RetryExecutor {
    pub fn new(policy: Option<RetryPolicy>, retryable: RetryPredicate) -> Self {
        Self { policy, retryable }
    }

    /// Executor retrying every error
    pub fn always(policy: Option<RetryPolicy>) -> Self {
        Self::new(policy, Arc::new(|_: &(dyn Error + 'static)| true))
    }

    pub fn policy(&self) -> Option<&RetryPolicy> {
        self.policy.as_ref()
    }

    pub async fn execute<T, E, F, Fut>(
        &self,
        action: &str,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error + 'static,
    {
        let Some(policy) = &self.policy else {
            return operation().await.map_err(|source| RetryError::NotRetried {
                action: action.to_string(),
                source,
            });
        };

        let max_attempts = policy.max_attempts();
        let mut failures = Vec::new();

        for attempt in 1..=max_attempts {
            let started = Instant::now();
            let error = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(action, attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            let as_dyn: &(dyn Error + 'static) = &error;
            let retryable = (self.retryable)(as_dyn);
            warn!(action, attempt, max_attempts, retryable, error = %error, "attempt failed");
            failures.push(error);

            if !retryable {
                return Err(RetryError::NotRetryable {
                    action: action.to_string(),
                    failures,
                });
            }
            if attempt < max_attempts {
                let delay = policy.delay_after(attempt, started.elapsed());
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(RetryError::MaximumAttemptsReached {
            action: action.to_string(),
            failures,
        })
    }
}

impl fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::CommandStatus;
    use crate::encoding::EncodingError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use thiserror::Error;

    #[derive(Debug, Error, PartialEq)]
    #[error("attempt {0} failed")]
    struct Flaky(u32);

    fn fixed(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::FixedDelay {
            max_attempts,
            delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_delay_schedules() {
        let exponential = RetryPolicy::ExponentialDelay {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
        };
        assert_eq!(exponential.delay_after(1, Duration::ZERO), Duration::from_millis(100));
        assert_eq!(exponential.delay_after(3, Duration::ZERO), Duration::from_millis(400));

        let per_attempt = RetryPolicy::PerAttemptDelays {
            max_attempts: 5,
            delays: vec![Duration::from_millis(10), Duration::from_millis(50)],
        };
        assert_eq!(per_attempt.delay_after(1, Duration::ZERO), Duration::from_millis(10));
        assert_eq!(per_attempt.delay_after(4, Duration::ZERO), Duration::from_millis(50));

        let interval = RetryPolicy::FixedInterval {
            max_attempts: 3,
            interval: Duration::from_millis(100),
        };
        assert_eq!(
            interval.delay_after(1, Duration::from_millis(30)),
            Duration::from_millis(70)
        );
        assert_eq!(interval.delay_after(1, Duration::from_millis(300)), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let executor = RetryExecutor::always(Some(fixed(5)));
        let result = executor
            .execute("connect", move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 { Err(Flaky(n)) } else { Ok(n) }
            })
            .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_keeps_every_failure_in_order() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let executor = RetryExecutor::always(Some(fixed(3)));
        let err = executor
            .execute("connect", move || async move {
                Err::<(), _>(Flaky(counter.fetch_add(1, Ordering::SeqCst) + 1))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RetryError::MaximumAttemptsReached { .. }));
        assert_eq!(err.failures(), &[Flaky(1), Flaky(2), Flaky(3)]);
        assert_eq!(err.source().unwrap().to_string(), "attempt 3 failed");
    }

    #[tokio::test]
    async fn test_non_retryable_error_stops_immediately() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let never: RetryPredicate = Arc::new(|_: &(dyn Error + 'static)| false);
        let executor = RetryExecutor::new(Some(fixed(5)), never);
        let err = executor
            .execute("connect", move || async move {
                Err::<(), _>(Flaky(counter.fetch_add(1, Ordering::SeqCst) + 1))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RetryError::NotRetryable { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_without_policy_runs_once() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let executor = RetryExecutor::always(None);
        let err = executor
            .execute("send", move || async move {
                Err::<(), _>(Flaky(counter.fetch_add(1, Ordering::SeqCst) + 1))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RetryError::NotRetried { .. }));
        assert_eq!(err.into_last(), Some(Flaky(1)));
    }

    #[test]
    fn test_fatal_bind_statuses_are_not_retried() {
        let fatal = SmppError::BindRejected(CommandStatus::InvalidPassword);
        assert!(!can_retry_connecting(&fatal));
        let transient = SmppError::BindRejected(CommandStatus::SystemError);
        assert!(can_retry_connecting(&transient));
        assert!(can_retry_connecting(&SmppError::ConnectionClosed));
    }

    #[test]
    fn test_preparation_errors_anywhere_in_chain_block_resend() {
        let preparation = PreparationError::Encoding(EncodingError::Unsupported { tried: vec![] });
        assert!(!can_resend_message(&preparation));

        let wrapped = crate::client::MessagingError::Preparation(preparation);
        assert!(!can_resend_message(&wrapped));
        assert!(can_resend_message(&SmppError::Timeout("submit_sm")));
    }

    #[test]
    fn test_cleaned_sender_blocks_resend() {
        assert!(!can_resend_message(&MessagingError::Closed));

        let connection = MessagingError::Connection(RetryError::NotRetried {
            action: "connect".to_string(),
            source: SmppError::ConnectionClosed,
        });
        assert!(can_resend_message(&connection));
    }

    #[test]
    fn test_policy_deserializes_from_toml() {
        let policy: RetryPolicy =
            toml::from_str("type = \"exponential_delay\"\nmax_attempts = 4\ninitial_delay_ms = 250")
                .unwrap();
        assert_eq!(
            policy,
            RetryPolicy::ExponentialDelay {
                max_attempts: 4,
                initial_delay: Duration::from_millis(250),
            }
        );
    }
}
