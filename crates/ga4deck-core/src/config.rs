// ── Runtime session configuration ──
//
// These types describe *what* a session talks to and *how often*.
// They carry credential data and timing, but never touch disk.
// The plugin binary builds them from button settings and the
// plugin config file and hands them in.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use ga4deck_api::{ANALYTICS_DATA_BASE_URL, GOOGLE_TOKEN_URL};

/// Everything needed to read one GA4 property on behalf of one user.
///
/// Immutable for the lifetime of a session; a settings change swaps in a
/// whole new value.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub property_id: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub refresh_token: SecretString,
}

impl Credentials {
    pub fn new(
        property_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            property_id: property_id.into(),
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
            refresh_token: SecretString::from(refresh_token.into()),
        }
    }

    /// Whether both values exchange for a token on the same OAuth grant.
    /// The property is not part of the grant.
    pub fn same_grant(&self, other: &Self) -> bool {
        self.client_id == other.client_id
            && self.client_secret.expose_secret() == other.client_secret.expose_secret()
            && self.refresh_token.expose_secret() == other.refresh_token.expose_secret()
    }
}

/// Timing and endpoint configuration shared by every session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Cadence of the scheduled metric fetch.
    pub poll_interval: Duration,
    /// Renewal cadence when the token endpoint reports no `expires_in`.
    pub renewal_interval: Duration,
    /// Fraction of the reported validity after which the token is renewed.
    pub renewal_fraction: f64,
    /// Delay before retrying a failed scheduled renewal. Never longer than
    /// `renewal_interval`.
    pub renewal_retry: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    pub token_url: String,
    pub analytics_base_url: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10 * 60),
            renewal_interval: Duration::from_secs(50 * 60),
            renewal_fraction: 0.8,
            renewal_retry: Duration::from_secs(60),
            request_timeout: ga4deck_api::transport::DEFAULT_TIMEOUT,
            token_url: GOOGLE_TOKEN_URL.into(),
            analytics_base_url: ANALYTICS_DATA_BASE_URL.into(),
        }
    }
}

impl SessionConfig {
    /// Delay before retrying after a failed renewal.
    pub(crate) fn retry_delay(&self) -> Duration {
        self.renewal_retry.min(self.renewal_interval)
    }
}
