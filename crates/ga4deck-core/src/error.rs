// ── Core error types ──
//
// Every variant renders as the short text shown on the button, so the
// `Display` strings double as the display contract. The
// `From<ga4deck_api::Error>` impl folds transport-layer detail into
// those variants.

use thiserror::Error;

/// Unified error type for the core crate.
///
/// `Clone` so a single token-exchange outcome can be handed to every
/// caller waiting on it.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Token errors ─────────────────────────────────────────────────
    #[error("Token refresh failed: {status} - {body}")]
    TokenRefreshFailed { status: u16, body: String },

    #[error("Access token is null")]
    MissingToken,

    // ── Metric errors ────────────────────────────────────────────────
    #[error("Unauthorized: 401")]
    Unauthorized,

    #[error("Rate limit exceeded: 429")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    // ── Transport errors ─────────────────────────────────────────────
    #[error("Connection failed: {reason}")]
    Connection { reason: String },

    #[error("Request timed out")]
    Timeout,

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<ga4deck_api::Error> for CoreError {
    fn from(err: ga4deck_api::Error) -> Self {
        match err {
            ga4deck_api::Error::TokenRefresh { status, body } => {
                CoreError::TokenRefreshFailed { status, body }
            }
            ga4deck_api::Error::Unauthorized => CoreError::Unauthorized,
            ga4deck_api::Error::RateLimited { retry_after_secs } => {
                CoreError::RateLimited { retry_after_secs }
            }
            ga4deck_api::Error::Http { status, body: _ } => CoreError::Http { status },
            ga4deck_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if let Some(status) = e.status() {
                    CoreError::Http {
                        status: status.as_u16(),
                    }
                } else {
                    CoreError::Connection {
                        reason: e.to_string(),
                    }
                }
            }
            ga4deck_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ga4deck_api::Error::Tls(msg) => CoreError::Connection { reason: msg },
            ga4deck_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
