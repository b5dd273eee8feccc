// ABOUTME: Supporting types for the sender including bind credentials and the message model
// ABOUTME: Phone numbers are either raw strings to translate or pre-built SMPP addresses

use crate::datatypes::InterfaceVersion;
use crate::preparator::Address;
use serde::{Deserialize, Serialize};

/// SMPP bind operation credentials
#[derive(Debug, Clone, PartialEq)]
pub struct BindCredentials {
    pub system_id: String,
    pub password: String,
    /// Sent as an empty string when not set
    pub system_type: Option<String>,
    pub bind_type: BindType,
    pub interface_version: InterfaceVersion,
}

impl BindCredentials {
    /// Transmitter credentials with SMPP v3.4
    pub fn transmitter(system_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            system_id: system_id.into(),
            password: password.into(),
            system_type: None,
            bind_type: BindType::Transmitter,
            interface_version: InterfaceVersion::SmppV34,
        }
    }

    /// Transceiver credentials with SMPP v3.4
    pub fn transceiver(system_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            bind_type: BindType::Transceiver,
            ..Self::transmitter(system_id, password)
        }
    }

    pub fn with_system_type(mut self, system_type: impl Into<String>) -> Self {
        self.system_type = Some(system_type.into());
        self
    }

    pub fn with_version(mut self, version: InterfaceVersion) -> Self {
        self.interface_version = version;
        self
    }
}

/// Bind flavours usable for submitting messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindType {
    #[default]
    Transmitter,
    Transceiver,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhoneNumber {
    /// Translated by the configured `AddressTranslator`
    Raw(String),
    /// Used as is
    Addressed(Address),
}

impl From<&str> for PhoneNumber {
    fn from(value: &str) -> Self {
        PhoneNumber::Raw(value.to_string())
    }
}

impl From<String> for PhoneNumber {
    fn from(value: String) -> Self {
        PhoneNumber::Raw(value)
    }
}

impl From<Address> for PhoneNumber {
    fn from(value: Address) -> Self {
        PhoneNumber::Addressed(value)
    }
}

/// A text message from one number to another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsMessage {
    pub from: PhoneNumber,
    pub to: PhoneNumber,
    pub content: String,
}

impl SmsMessage {
    pub fn new(
        from: impl Into<PhoneNumber>,
        to: impl Into<PhoneNumber>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            content: content.into(),
        }
    }
}

/// Outcome of a successful send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// Session the segments went out on
    pub session_id: u64,
    /// One message id per segment, in segment order
    pub message_ids: Vec<String>,
}
