//! Configuration for the ga4deck plugin.
//!
//! Two sources: per-button settings pushed by the host as JSON, and an
//! optional plugin-wide `ga4deck.toml` next to the executable with
//! `GA4DECK_*` environment overrides. Both translate into
//! `ga4deck_core` types.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ga4deck_core::{Credentials, SessionConfig};

/// File name looked up in the plugin directory.
pub const CONFIG_FILE_NAME: &str = "ga4deck.toml";

/// Prefix of environment overrides, e.g. `GA4DECK_POLL_INTERVAL_SECS`.
pub const ENV_PREFIX: &str = "GA4DECK_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing setting: {field}")]
    MissingSetting { field: &'static str },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Button settings ─────────────────────────────────────────────────

/// Settings the host stores per button and sends on appear and on change.
///
/// Every field is optional on the wire: the property inspector sends
/// `{}` until the user fills the form in.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub property_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<SecretString>,
    #[serde(default)]
    pub refresh_token: Option<SecretString>,
}

impl Settings {
    /// Validate and convert into session credentials.
    ///
    /// Blank values count as missing.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let property_id = required_str(self.property_id.as_deref(), "propertyId")?;
        let client_id = required_str(self.client_id.as_deref(), "clientId")?;
        let client_secret = required_secret(self.client_secret.as_ref(), "clientSecret")?;
        let refresh_token = required_secret(self.refresh_token.as_ref(), "refreshToken")?;

        Ok(Credentials {
            property_id: property_id.to_owned(),
            client_id: client_id.to_owned(),
            client_secret: client_secret.clone(),
            refresh_token: refresh_token.clone(),
        })
    }

    pub fn is_complete(&self) -> bool {
        self.credentials().is_ok()
    }
}

fn required_str<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, ConfigError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingSetting { field })
}

fn required_secret<'a>(
    value: Option<&'a SecretString>,
    field: &'static str,
) -> Result<&'a SecretString, ConfigError> {
    value
        .filter(|v| !v.expose_secret().trim().is_empty())
        .ok_or(ConfigError::MissingSetting { field })
}

// ── Plugin config ───────────────────────────────────────────────────

/// Plugin-wide tuning shared by every button.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PluginConfig {
    pub poll_interval_secs: u64,
    pub renewal_interval_secs: u64,
    pub renewal_fraction: f64,
    pub renewal_retry_secs: u64,
    pub request_timeout_secs: u64,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub token_url: String,
    pub analytics_base_url: String,
}

impl Default for PluginConfig {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            poll_interval_secs: session.poll_interval.as_secs(),
            renewal_interval_secs: session.renewal_interval.as_secs(),
            renewal_fraction: session.renewal_fraction,
            renewal_retry_secs: session.renewal_retry.as_secs(),
            request_timeout_secs: session.request_timeout.as_secs(),
            log_level: "info".into(),
            token_url: session.token_url,
            analytics_base_url: session.analytics_base_url,
        }
    }
}

impl PluginConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("poll_interval_secs", self.poll_interval_secs),
            ("renewal_interval_secs", self.renewal_interval_secs),
            ("renewal_retry_secs", self.renewal_retry_secs),
            ("request_timeout_secs", self.request_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::Validation {
                    field: field.into(),
                    reason: "must be greater than zero".into(),
                });
            }
        }

        if !(self.renewal_fraction > 0.0 && self.renewal_fraction <= 1.0) {
            return Err(ConfigError::Validation {
                field: "renewal_fraction".into(),
                reason: format!("expected a value in (0, 1], got {}", self.renewal_fraction),
            });
        }

        for (field, value) in [
            ("token_url", &self.token_url),
            ("analytics_base_url", &self.analytics_base_url),
        ] {
            url::Url::parse(value).map_err(|e| ConfigError::Validation {
                field: field.into(),
                reason: format!("invalid URL '{value}': {e}"),
            })?;
        }

        Ok(())
    }

    /// Translate into the core's session configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            renewal_interval: Duration::from_secs(self.renewal_interval_secs),
            renewal_fraction: self.renewal_fraction,
            renewal_retry: Duration::from_secs(self.renewal_retry_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            token_url: self.token_url.clone(),
            analytics_base_url: self.analytics_base_url.clone(),
        }
    }
}

// ── Config loading ──────────────────────────────────────────────────

/// `ga4deck.toml` inside `dir`.
pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}

/// Load defaults, then `dir/ga4deck.toml`, then `GA4DECK_*` variables,
/// and validate the result. A missing file is not an error.
pub fn load_config(dir: &Path) -> Result<PluginConfig, ConfigError> {
    let config: PluginConfig = Figment::new()
        .merge(Serialized::defaults(PluginConfig::default()))
        .merge(Toml::file(config_path(dir)))
        .merge(Env::prefixed(ENV_PREFIX))
        .extract()?;

    config.validate()?;
    Ok(config)
}
