// OAuth2 token endpoint client
//
// Exchanges a long-lived refresh token for a short-lived access token.
// Only the `refresh_token` grant is implemented; the initial consent flow
// happens outside the agent and yields the refresh token it is configured
// with.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::TokenResponse;
use crate::transport::TransportConfig;

/// Google's token-issuance endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Raw HTTP client for the OAuth2 token endpoint.
pub struct OAuthClient {
    http: reqwest::Client,
    token_url: Url,
}

impl OAuthClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(token_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, token_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, token_url: Url) -> Self {
        Self { http, token_url }
    }

    /// Exchange `refresh_token` for a new access token.
    ///
    /// Sends a form-encoded `grant_type=refresh_token` request. Any
    /// non-2xx status becomes [`Error::TokenRefresh`] carrying the
    /// server's body verbatim.
    pub async fn refresh_access_token(
        &self,
        client_id: &str,
        client_secret: &SecretString,
        refresh_token: &SecretString,
    ) -> Result<TokenResponse, Error> {
        debug!(url = %self.token_url, "exchanging refresh token");

        let form = [
            ("client_id", client_id),
            ("client_secret", client_secret.expose_secret()),
            ("refresh_token", refresh_token.expose_secret()),
            ("grant_type", "refresh_token"),
        ];

        let resp = self
            .http
            .post(self.token_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::TokenRefresh {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            // The success body holds the token itself; keep it out of the error.
            Error::Deserialization {
                message: format!("invalid token response: {e}"),
                body: String::new(),
            }
        })?;

        debug!(expires_in = ?token.expires_in, "token exchange successful");
        Ok(token)
    }
}
