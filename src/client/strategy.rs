// ABOUTME: Session handling strategies selectable from configuration
// ABOUTME: Always-new, keep-alive and reuse-until-stale with their settings

use super::config::{ConfigError, duration_ms};
use super::keepalive::KeepAliveConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How sessions are shared between sends
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionStrategy {
    /// Bind a session for each send and unbind it afterwards
    #[default]
    AlwaysNew,
    /// One long-lived session probed in the background
    KeepAlive(KeepAliveConfig),
    /// One long-lived session probed lazily before a send after an idle period
    ReuseSession(ReuseSessionConfig),
}

impl SessionStrategy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            SessionStrategy::AlwaysNew => Ok(()),
            SessionStrategy::KeepAlive(config) => config.validate(),
            SessionStrategy::ReuseSession(config) => config.validate(),
        }
    }

    pub fn keeps_session(&self) -> bool {
        !matches!(self, SessionStrategy::AlwaysNew)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReuseSessionConfig {
    /// Idle time after which the session is probed before use
    #[serde(rename = "last_interaction_expiration_ms", with = "duration_ms")]
    pub last_interaction_expiration: Duration,
    #[serde(rename = "probe_timeout_ms", with = "duration_ms")]
    pub probe_timeout: Duration,
}

impl Default for ReuseSessionConfig {
    fn default() -> Self {
        Self {
            last_interaction_expiration: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(10),
        }
    }
}

impl ReuseSessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.probe_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "session.probe_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
