// ABOUTME: SMS sending client built on SMPP sessions managed by a configurable strategy
// ABOUTME: Exports the sender, its builder and configuration, session types and errors

//! SMS Sender
//!
//! * **Strategies** - always-new, keep-alive or reuse-until-stale sessions
//! * **Self-healing** - broken sessions are replaced on the next send or in the background
//! * **Retries** - connection and send retries driven by [`RetryPolicy`](crate::retry::RetryPolicy)
//! * **Preparation** - encoding, data_coding and segmentation are handled before submitting
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use smpp_sender::client::{SenderConfig, SmsMessage, SmsSenderBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SenderConfig::from_toml_str(r#"
//!     host = "localhost"
//!     port = 2775
//!     system_id = "system_id"
//!     password = "password"
//!
//!     [session]
//!     type = "keep_alive"
//!     interval_ms = 30000
//! "#)?;
//!
//! let sender = SmsSenderBuilder::new(config).build().await?;
//! let receipt = sender
//!     .send(&SmsMessage::new("123456789", "987654321", "Hello!"))
//!     .await?;
//! println!("segments accepted: {:?}", receipt.message_ids);
//!
//! sender.clean().await;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod keepalive;
pub mod manager;
pub mod sender;
pub mod session;
pub mod strategy;
pub mod types;

pub use builder::SmsSenderBuilder;
pub use config::{ConfigError, SenderConfig, Timeouts};
pub use error::{MessagingError, SmppError, SmppResult};
pub use keepalive::KeepAliveConfig;
pub use manager::SessionManager;
pub use sender::SmsSender;
pub use session::{Session, SessionState};
pub use strategy::{ReuseSessionConfig, SessionStrategy};
pub use types::{BindCredentials, BindType, PhoneNumber, SendReceipt, SmsMessage};
