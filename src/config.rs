use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DispatchConfig {
    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub delivery_policy: DeliveryPolicy,
}

impl DispatchConfig {
    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&raw).map_err(|error| ConfigError::Load(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transport.cert_file.is_some() != self.transport.key_file.is_some() {
            return Err(ConfigError::Validation(
                "cert-file and key-file must be provided together".into(),
            ));
        }
        Ok(())
    }
}

// ── Transport ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TransportConfig {
    /// PEM client certificate presented to the content service.
    #[serde(default)]
    pub cert_file: Option<PathBuf>,
    /// PEM private key matching `cert_file`.
    #[serde(default)]
    pub key_file: Option<PathBuf>,
    /// Extra PEM root certificates trusted alongside the system roots.
    #[serde(default)]
    pub ca_files: Vec<PathBuf>,
    /// Whole-request timeout in seconds; unset means no timeout.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

// ── Reply delivery ────────────────────────────────────────────────

/// What to do with a reply whose external delivery fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Log the failure and retire the reply anyway, so no pending state
    /// leaks. Failed payloads are gone beyond the log line.
    #[default]
    RetireAlways,
    /// Abandon the reply without a retirement signal, leaving redelivery
    /// to external supervision.
    AbandonOnFailure,
}
