use thiserror::Error;

/// Top-level error type for the `ga4deck-api` crate.
///
/// Covers every failure mode of the two wire surfaces: the OAuth2 token
/// endpoint and the GA4 realtime report endpoint.
/// `ga4deck-core` maps these into display-safe diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Token endpoint ──────────────────────────────────────────────
    /// The token endpoint rejected the refresh-token exchange.
    #[error("Token refresh failed: {status} - {body}")]
    TokenRefresh { status: u16, body: String },

    // ── Realtime report endpoint ────────────────────────────────────
    /// The bearer token was rejected (HTTP 401).
    #[error("Unauthorized: 401")]
    Unauthorized,

    /// Rate limited by the Data API (HTTP 429).
    #[error("Rate limit exceeded: 429")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Any other non-2xx response.
    #[error("HTTP error! status: {status}")]
    Http { status: u16, body: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}
