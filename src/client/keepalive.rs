// ABOUTME: Background enquire_link task keeping a long-lived SMPP session healthy
// ABOUTME: Counts consecutive probe timeouts and closes the session when the limit is hit

use super::config::{ConfigError, duration_ms};
use super::error::SmppError;
use super::session::{Session, SessionState};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

/// Configuration for SMPP keep-alive functionality
///
/// Controls the periodic enquire_link PDUs sent on a bound session. The
/// first probe is sent one interval after the bind; ticks missed while a
/// probe is outstanding are delayed rather than bunched up.
///
/// # Example
///
/// ```rust
/// use smpp_sender::client::KeepAliveConfig;
/// use std::time::Duration;
///
/// let config = KeepAliveConfig::new(Duration::from_secs(60))
///     .with_timeout(Duration::from_secs(15))
///     .with_max_consecutive_timeouts(3);
/// assert_eq!(config.max_consecutive_timeouts, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepAliveConfig {
    /// Interval between enquire_link PDUs (default: 30 seconds)
    #[serde(rename = "interval_ms", with = "duration_ms")]
    pub interval: Duration,

    /// Timeout for enquire_link responses (default: 10 seconds)
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,

    /// Consecutive timeouts after which the session is considered dead (default: 5)
    pub max_consecutive_timeouts: u32,

    /// Bind when the sender is built instead of on the first send
    pub connect_at_startup: bool,

    /// Bind a replacement as soon as the session dies instead of on the next send
    pub reconnect_eagerly: bool,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(10),
            max_consecutive_timeouts: 5,
            connect_at_startup: false,
            reconnect_eagerly: false,
        }
    }
}

impl KeepAliveConfig {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_consecutive_timeouts(mut self, max: u32) -> Self {
        self.max_consecutive_timeouts = max;
        self
    }

    pub fn with_connect_at_startup(mut self, enabled: bool) -> Self {
        self.connect_at_startup = enabled;
        self
    }

    pub fn with_reconnect_eagerly(mut self, enabled: bool) -> Self {
        self.reconnect_eagerly = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::Invalid {
                field: "session.interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.max_consecutive_timeouts == 0 {
            return Err(ConfigError::Invalid {
                field: "session.max_consecutive_timeouts",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Why the keep-alive task stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepAliveExit {
    /// The session was dropped or closed by someone else
    SessionGone,
    TooManyTimeouts,
    ProbeFailed,
}

/// Starts probing `session` and returns the task handle. `on_dead` runs
/// when the task itself declares the session dead.
pub(crate) fn spawn<F>(session: &Arc<Session>, config: KeepAliveConfig, on_dead: F) -> JoinHandle<()>
where
    F: FnOnce(u64) + Send + 'static,
{
    let weak = Arc::downgrade(session);
    let session_id = session.id();
    debug!(
        session_id,
        interval_ms = config.interval.as_millis() as u64,
        "starting keep-alive"
    );

    tokio::spawn(async move {
        let exit = run(weak, &config).await;
        match exit {
            KeepAliveExit::SessionGone => debug!(session_id, "keep-alive stopped"),
            KeepAliveExit::TooManyTimeouts | KeepAliveExit::ProbeFailed => {
                info!(session_id, ?exit, "keep-alive declared session dead");
                on_dead(session_id);
            }
        }
    })
}

async fn run(session: Weak<Session>, config: &KeepAliveConfig) -> KeepAliveExit {
    let mut ticker = interval_at(Instant::now() + config.interval, config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(session) = session.upgrade() else {
            return KeepAliveExit::SessionGone;
        };
        if !session.state().is_usable() {
            return KeepAliveExit::SessionGone;
        }

        session.set_state(SessionState::HealthChecking);
        let result = session.enquire_link(config.timeout).await;
        if session.state() == SessionState::HealthChecking {
            session.set_state(SessionState::Bound);
        }

        match result {
            Ok(()) => {
                session.reset_probe_timeouts();
            }
            Err(SmppError::Timeout(_)) => {
                let timeouts = session.record_probe_timeout();
                warn!(
                    session_id = session.id(),
                    timeouts,
                    max = config.max_consecutive_timeouts,
                    "enquire_link timed out"
                );
                if timeouts >= config.max_consecutive_timeouts {
                    session.mark_closed();
                    return KeepAliveExit::TooManyTimeouts;
                }
            }
            Err(e) => {
                warn!(session_id = session.id(), error = %e, "enquire_link failed");
                session.mark_closed();
                return KeepAliveExit::ProbeFailed;
            }
        }
    }
}
