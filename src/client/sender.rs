// ABOUTME: Caller-facing SMS sender combining message preparation with session management
// ABOUTME: Sends every segment in order on one session, optionally retrying the whole send

use super::error::MessagingError;
use super::manager::SessionManager;
use super::types::{SendReceipt, SmsMessage};
use crate::preparator::MessagePreparator;
use crate::retry::{RetryError, RetryExecutor};
use std::sync::Arc;
use tracing::{debug, info};

/// Sends [`SmsMessage`]s through an SMSC
///
/// Built with [`SmsSenderBuilder`](super::SmsSenderBuilder). Call
/// [`clean`](Self::clean) before dropping to unbind open sessions.
pub struct SmsSender {
    preparator: Arc<dyn MessagePreparator>,
    manager: SessionManager,
    send_retry: Option<RetryExecutor>,
}

impl SmsSender {
    pub fn new(
        preparator: Arc<dyn MessagePreparator>,
        manager: SessionManager,
        send_retry: Option<RetryExecutor>,
    ) -> Self {
        Self {
            preparator,
            manager,
            send_retry,
        }
    }

    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }

    /// Prepares `message` and submits its segments in order. Resolves once
    /// every segment is acknowledged or the first one fails.
    pub async fn send(&self, message: &SmsMessage) -> Result<SendReceipt, MessagingError> {
        let Some(retry) = &self.send_retry else {
            return self.send_once(message).await;
        };

        retry
            .execute("send", move || self.send_once(message))
            .await
            .map_err(|e| match e {
                RetryError::NotRetried { source, .. } => source,
                e if e.failures().len() == 1 => match e.into_last() {
                    Some(last) => last,
                    None => MessagingError::Closed,
                },
                e => MessagingError::Retry(Box::new(e)),
            })
    }

    async fn send_once(&self, message: &SmsMessage) -> Result<SendReceipt, MessagingError> {
        let pdus = self.preparator.prepare(message)?;
        let session = self.manager.acquire().await?;
        let total = pdus.len();
        debug!(session_id = session.id(), segments = total, "sending message");

        let mut message_ids = Vec::with_capacity(total);
        for (index, pdu) in pdus.into_iter().enumerate() {
            match session.submit(pdu).await {
                Ok(message_id) => message_ids.push(message_id),
                Err(source) => {
                    self.manager.message_not_sent(&session, &source).await;
                    return Err(MessagingError::Send {
                        session_id: session.id(),
                        segment: index + 1,
                        total,
                        source,
                    });
                }
            }
        }

        self.manager.message_sent(&session).await;
        info!(session_id = session.id(), ?message_ids, "message sent");
        Ok(SendReceipt {
            session_id: session.id(),
            message_ids,
        })
    }

    /// Stops background tasks and unbinds every open session
    pub async fn clean(&self) {
        self.manager.clean().await;
    }
}
