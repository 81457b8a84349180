// ── Collaborator seams ──
//
// The session logic only sees these traits. Production wires them to the
// Google clients in `ga4deck-api` and to the host socket; tests wire them
// to in-memory fakes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use url::Url;

use ga4deck_api::{AnalyticsClient, OAuthClient, TransportConfig};

use crate::config::{Credentials, SessionConfig};
use crate::error::CoreError;

/// A freshly issued access token.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: SecretString,
    /// Validity reported by the issuer, if any.
    pub expires_in: Option<Duration>,
}

/// Exchanges a refresh token for an access token.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn exchange(&self, credentials: &Credentials) -> Result<TokenGrant, CoreError>;
}

/// Reads the realtime active-user count of a property.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Returns the display value, `"0"` when the report has no rows.
    async fn active_users(
        &self,
        property_id: &str,
        access_token: &SecretString,
    ) -> Result<String, CoreError>;
}

/// Where fetched values are rendered.
pub trait DisplaySink: Send + Sync {
    fn show(&self, text: &str);
}

/// Hands a URL to the host's browser launcher.
pub trait UrlOpener: Send + Sync {
    fn open_url(&self, url: &str);
}

#[async_trait]
impl TokenSource for OAuthClient {
    async fn exchange(&self, credentials: &Credentials) -> Result<TokenGrant, CoreError> {
        let token = self
            .refresh_access_token(
                &credentials.client_id,
                &credentials.client_secret,
                &credentials.refresh_token,
            )
            .await?;
        Ok(TokenGrant {
            access_token: SecretString::from(token.access_token),
            expires_in: token.expires_in.map(Duration::from_secs),
        })
    }
}

#[async_trait]
impl MetricSource for AnalyticsClient {
    async fn active_users(
        &self,
        property_id: &str,
        access_token: &SecretString,
    ) -> Result<String, CoreError> {
        Ok(AnalyticsClient::active_users(self, property_id, access_token).await?)
    }
}

/// The network side of a session.
#[derive(Clone)]
pub struct Sources {
    pub tokens: Arc<dyn TokenSource>,
    pub metrics: Arc<dyn MetricSource>,
}

impl Sources {
    /// Google's token endpoint and Data API, as configured.
    pub fn google(config: &SessionConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig::default().with_timeout(config.request_timeout);
        let token_url = Url::parse(&config.token_url).map_err(ga4deck_api::Error::from)?;
        let base_url = Url::parse(&config.analytics_base_url).map_err(ga4deck_api::Error::from)?;

        Ok(Self {
            tokens: Arc::new(OAuthClient::new(token_url, &transport)?),
            metrics: Arc::new(AnalyticsClient::new(base_url, &transport)?),
        })
    }
}

/// GA4 web UI for `property_id`.
pub fn analytics_url(property_id: &str) -> String {
    format!(
        "https://analytics.google.com/analytics/web/#/p{}",
        property_id.trim()
    )
}
