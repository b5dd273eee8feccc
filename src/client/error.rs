// ABOUTME: Error types for SMPP sessions and for the caller-facing send operation
// ABOUTME: Classifies transport failures that require a new session

use crate::codec::CodecError;
use crate::datatypes::{CommandId, CommandStatus};
use crate::preparator::PreparationError;
use crate::retry::RetryError;
use std::io;
use thiserror::Error;

/// Errors raised while talking to the SMSC over one session
#[derive(Debug, Error)]
pub enum SmppError {
    /// I/O error during network operations (connection, read, write)
    #[error("Connection error: {0}")]
    Connection(#[from] io::Error),

    #[error("Malformed PDU")]
    Codec(#[from] CodecError),

    /// The SMSC answered the bind request with an error status
    #[error("Bind rejected by SMSC: {0:?}")]
    BindRejected(CommandStatus),

    /// SMPP protocol error indicated by command_status field
    #[error("Protocol error: {0:?}")]
    Protocol(CommandStatus),

    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    /// Unexpected PDU received (wrong response type for request)
    #[error("Unexpected PDU: expected {expected:?}, got {actual:?}")]
    UnexpectedPdu {
        expected: CommandId,
        actual: CommandId,
    },

    /// Connection closed unexpectedly
    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    #[error("Invalid session state: {0}")]
    InvalidState(String),
}

impl SmppError {
    /// Whether the session that produced this error can no longer be trusted
    pub fn requires_new_session(&self) -> bool {
        match self {
            SmppError::Connection(_)
            | SmppError::Codec(_)
            | SmppError::Timeout(_)
            | SmppError::ConnectionClosed
            | SmppError::InvalidState(_) => true,
            SmppError::BindRejected(_) | SmppError::Protocol(_) | SmppError::UnexpectedPdu { .. } => {
                false
            }
        }
    }
}

/// Result type alias for SMPP operations
pub type SmppResult<T> = Result<T, SmppError>;

/// Failure of [`SmsSender::send`](super::SmsSender::send), named after the
/// phase that failed
#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("could not obtain an SMPP session")]
    Connection(#[source] RetryError<SmppError>),

    #[error("could not prepare the message")]
    Preparation(#[from] PreparationError),

    #[error("failed to send segment {segment} of {total} on session {session_id}")]
    Send {
        session_id: u64,
        /// 1-based index of the failing submit_sm
        segment: usize,
        total: usize,
        #[source]
        source: SmppError,
    },

    #[error("sender has been cleaned")]
    Closed,

    /// Every attempt of a retried send failed
    #[error(transparent)]
    Retry(Box<RetryError<MessagingError>>),
}

impl MessagingError {
    pub fn requires_new_session(&self) -> bool {
        match self {
            MessagingError::Send { source, .. } => source.requires_new_session(),
            _ => false,
        }
    }
}
