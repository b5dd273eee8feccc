// ABOUTME: Sender configuration loadable from TOML with defaults for every section
// ABOUTME: Connection settings, timeouts, retry policies, session strategy and preparation options

use crate::coding_scheme::CodingSchemeConfig;
use crate::datatypes::InterfaceVersion;
use crate::encoding::EncodingConfig;
use crate::preparator::PayloadStrategy;
use crate::retry::RetryPolicy;
use crate::splitter::SplittingConfig;
use super::strategy::SessionStrategy;
use super::types::{BindCredentials, BindType};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Serializes a `Duration` as integer milliseconds
pub mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Serializes a list of `Duration`s as integer milliseconds
pub mod durations_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        values: &[Duration],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|d| d.as_millis() as u64))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Duration>, D::Error> {
        Vec::<u64>::deserialize(deserializer)
            .map(|values| values.into_iter().map(Duration::from_millis).collect())
    }
}

/// Upper bound of each protocol exchange
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    #[serde(rename = "connect_ms", with = "duration_ms")]
    pub connect: Duration,
    #[serde(rename = "bind_ms", with = "duration_ms")]
    pub bind: Duration,
    /// Wait for a submit_sm_resp
    #[serde(rename = "response_ms", with = "duration_ms")]
    pub response: Duration,
    #[serde(rename = "unbind_ms", with = "duration_ms")]
    pub unbind: Duration,
    #[serde(rename = "write_ms", with = "duration_ms")]
    pub write: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            bind: Duration::from_secs(5),
            response: Duration::from_secs(5),
            unbind: Duration::from_secs(5),
            write: Duration::from_secs(5),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    pub host: String,
    pub port: u16,
    pub system_id: String,
    pub password: String,
    pub system_type: Option<String>,
    pub interface_version: InterfaceVersion,
    pub bind_type: BindType,
    pub timeouts: Timeouts,
    /// `None` makes a single connection attempt
    pub connect_retry: Option<RetryPolicy>,
    pub send_retry: Option<RetryPolicy>,
    pub session: SessionStrategy,
    pub encoding: EncodingConfig,
    pub splitting: SplittingConfig,
    pub coding_scheme: CodingSchemeConfig,
    pub payload: PayloadStrategy,
    pub delivery_receipt: bool,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 2775,
            system_id: String::new(),
            password: String::new(),
            system_type: None,
            interface_version: InterfaceVersion::SmppV34,
            bind_type: BindType::Transmitter,
            timeouts: Timeouts::default(),
            connect_retry: Some(RetryPolicy::default()),
            send_retry: None,
            session: SessionStrategy::default(),
            encoding: EncodingConfig::default(),
            splitting: SplittingConfig::default(),
            coding_scheme: CodingSchemeConfig::default(),
            payload: PayloadStrategy::default(),
            delivery_receipt: false,
        }
    }
}

impl SenderConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: SenderConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::Invalid {
                field: "host",
                reason: "must not be empty".to_string(),
            });
        }
        if self.system_id.is_empty() {
            return Err(ConfigError::Invalid {
                field: "system_id",
                reason: "must not be empty".to_string(),
            });
        }
        self.session.validate()
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn credentials(&self) -> BindCredentials {
        let credentials = match self.bind_type {
            BindType::Transmitter => BindCredentials::transmitter(&self.system_id, &self.password),
            BindType::Transceiver => BindCredentials::transceiver(&self.system_id, &self.password),
        }
        .with_version(self.interface_version);

        match &self.system_type {
            Some(system_type) => credentials.with_system_type(system_type),
            None => credentials,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::keepalive::KeepAliveConfig;
    use crate::client::strategy::ReuseSessionConfig;
    use crate::encoding::BuiltinCharset;
    use crate::splitter::ReferenceWidth;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = SenderConfig::default();
        assert_eq!(config.timeouts.connect, Duration::from_secs(10));
        assert_eq!(config.timeouts.response, Duration::from_secs(5));
        assert_eq!(
            config.connect_retry,
            Some(RetryPolicy::FixedDelay {
                max_attempts: 10,
                delay: Duration::from_millis(500),
            })
        );
        assert!(config.send_retry.is_none());
        assert_eq!(config.session, SessionStrategy::AlwaysNew);
    }

    #[test]
    fn test_parses_full_toml() {
        let config = SenderConfig::from_toml_str(
            r#"
            host = "smsc.example.net"
            port = 2776
            system_id = "acme"
            password = "secret"
            interface_version = "3.3"
            bind_type = "transceiver"
            delivery_receipt = true
            payload = "message_payload"

            [timeouts]
            response_ms = 2500

            [send_retry]
            type = "per_attempt_delays"
            max_attempts = 3
            delays_ms = [100, 500]

            [session]
            type = "keep_alive"
            interval_ms = 15000
            reconnect_eagerly = true

            [encoding]
            auto_guess = false
            fallback = "latin1"

            [splitting]
            reference = "u16"

            [coding_scheme]
            message_class = "flash"
            "#,
        )
        .unwrap();

        assert_eq!(config.address(), "smsc.example.net:2776");
        assert_eq!(config.interface_version, InterfaceVersion::SmppV33);
        assert_eq!(config.credentials().bind_type, BindType::Transceiver);
        assert_eq!(config.timeouts.response, Duration::from_millis(2500));
        assert_eq!(config.timeouts.bind, Duration::from_secs(5));
        assert_eq!(config.payload, PayloadStrategy::MessagePayload);
        assert_eq!(
            config.session,
            SessionStrategy::KeepAlive(KeepAliveConfig {
                interval: Duration::from_secs(15),
                reconnect_eagerly: true,
                ..KeepAliveConfig::default()
            })
        );
        assert_eq!(config.encoding.fallback, BuiltinCharset::Latin1);
        assert_eq!(config.splitting.reference, ReferenceWidth::U16);
        assert!(config.splitting.enabled);
        assert!(matches!(
            config.send_retry,
            Some(RetryPolicy::PerAttemptDelays { max_attempts: 3, .. })
        ));
    }

    #[test]
    fn test_reuse_session_defaults() {
        let config =
            SenderConfig::from_toml_str("system_id = \"acme\"\n[session]\ntype = \"reuse_session\"\n")
                .unwrap();
        assert_eq!(
            config.session,
            SessionStrategy::ReuseSession(ReuseSessionConfig::default())
        );
    }

    #[test]
    fn test_rejects_missing_system_id() {
        assert!(matches!(
            SenderConfig::from_toml_str("host = \"smsc\""),
            Err(ConfigError::Invalid { field: "system_id", .. })
        ));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(matches!(
            SenderConfig::from_toml_str("port = \"not a number\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
