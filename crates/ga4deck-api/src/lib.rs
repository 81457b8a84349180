// ga4deck-api: Async clients for the Google OAuth2 token endpoint and the GA4 Data API

pub mod analytics;
pub mod error;
pub mod models;
pub mod oauth;
pub mod transport;

pub use analytics::{ANALYTICS_DATA_BASE_URL, AnalyticsClient};
pub use error::Error;
pub use models::{RealtimeReportRequest, RealtimeReportResponse, TokenResponse};
pub use oauth::{GOOGLE_TOKEN_URL, OAuthClient};
pub use transport::TransportConfig;
