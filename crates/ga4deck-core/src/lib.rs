// ga4deck-core: Token lifecycle and realtime polling between ga4deck-api and the plugin host.

pub mod config;
pub mod error;
pub mod poller;
pub mod session;
pub mod source;
pub mod token;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{Credentials, SessionConfig};
pub use error::CoreError;
pub use poller::MetricPoller;
pub use session::{Session, SessionState};
pub use source::{
    DisplaySink, MetricSource, Sources, TokenGrant, TokenSource, UrlOpener, analytics_url,
};
pub use token::TokenManager;
