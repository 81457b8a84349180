//! Plugin error types with miette diagnostics.
//!
//! Operational failures inside a session never reach this type; only
//! problems that end the process do.

use miette::Diagnostic;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

use ga4deck_config::ConfigError;
use ga4deck_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum PluginError {
    // ── Host connection ──────────────────────────────────────────────
    #[error("Could not connect to the Stream Deck host at {url}")]
    #[diagnostic(
        code(ga4deck::connection_failed),
        help("The plugin must be launched by the Stream Deck application, which passes -port.")
    )]
    Connect {
        url: String,
        #[source]
        source: Box<tungstenite::Error>,
    },

    #[error("Stream Deck connection failed")]
    #[diagnostic(code(ga4deck::socket))]
    Socket(#[source] Box<tungstenite::Error>),

    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid plugin configuration")]
    #[diagnostic(
        code(ga4deck::config),
        help("Check ga4deck.toml next to the plugin binary and any GA4DECK_* environment variables.")
    )]
    Config(#[from] ConfigError),

    #[error("Could not set up API clients")]
    #[diagnostic(code(ga4deck::clients))]
    Clients(#[from] CoreError),

    // ── Local ────────────────────────────────────────────────────────
    #[error("Failed to encode message")]
    #[diagnostic(code(ga4deck::encode))]
    Encode(#[from] serde_json::Error),
}

impl From<tungstenite::Error> for PluginError {
    fn from(err: tungstenite::Error) -> Self {
        Self::Socket(Box::new(err))
    }
}

impl PluginError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Connect { .. } | Self::Socket(_) => exit_code::CONNECTION,
            Self::Config(_) => exit_code::CONFIG,
            Self::Clients(_) | Self::Encode(_) => exit_code::GENERAL,
        }
    }
}
