pub mod client;
pub mod codec;
pub mod coding_scheme;
pub mod connection;
pub mod datatypes;
pub mod encoding;
mod macros;
pub mod preparator;
pub mod retry;
pub mod splitter;

#[cfg(test)]
mod mock_smsc;

// Re-export codec types for direct access
pub use codec::{CodecError, Decodable, Encodable, Frame, PduHeader, PduRegistry};

// Re-export the main sender API for easy access
pub use client::{
    BindCredentials, MessagingError, SendReceipt, SenderConfig, SessionStrategy, SmppError,
    SmppResult, SmsMessage, SmsSender, SmsSenderBuilder,
};
pub use retry::{RetryError, RetryExecutor, RetryPolicy};

/// Boxed error for callers that do not care which stage failed.
///
/// Every stage has its own error type ([`SmppError`], [`MessagingError`],
/// [`preparator::PreparationError`], [`client::ConfigError`]); all of them
/// convert into this one through `?`.
///
/// # Examples
///
/// ## Sending with a long-lived session
///
/// ```rust,no_run
/// use smpp_sender::client::{KeepAliveConfig, SenderConfig, SessionStrategy};
/// use smpp_sender::{SmsMessage, SmsSenderBuilder};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> smpp_sender::Result<()> {
///     let config = SenderConfig {
///         host: "localhost".to_string(),
///         port: 2775,
///         system_id: "system_id".to_string(),
///         password: "password".to_string(),
///         session: SessionStrategy::KeepAlive(
///             KeepAliveConfig::new(Duration::from_secs(30)).with_connect_at_startup(true),
///         ),
///         ..SenderConfig::default()
///     };
///
///     let sender = SmsSenderBuilder::new(config).build().await?;
///
///     // Long texts are split and sent as concatenated segments
///     let text = "Hello, World! ".repeat(20);
///     let receipt = sender
///         .send(&SmsMessage::new("ACME", "+33612345678", text))
///         .await?;
///     println!("{} segments on session {}", receipt.message_ids.len(), receipt.session_id);
///
///     sender.clean().await;
///     Ok(())
/// }
/// ```
///
/// ## Retrying sends
///
/// ```rust,no_run
/// use smpp_sender::client::SenderConfig;
/// use smpp_sender::{RetryPolicy, SmsMessage, SmsSenderBuilder};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> smpp_sender::Result<()> {
///     let config = SenderConfig {
///         system_id: "system_id".to_string(),
///         password: "password".to_string(),
///         send_retry: Some(RetryPolicy::ExponentialDelay {
///             max_attempts: 3,
///             initial_delay: Duration::from_millis(200),
///         }),
///         ..SenderConfig::default()
///     };
///
///     let sender = SmsSenderBuilder::new(config).build().await?;
///     sender
///         .send(&SmsMessage::new("0601020304", "0605060708", "Prix: 10€"))
///         .await?;
///     sender.clean().await;
///     Ok(())
/// }
/// ```
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// A specialized `Result` type for sender operations.
pub type Result<T> = std::result::Result<T, Error>;
