// GA4 Data API client
//
// Wraps `reqwest::Client` with realtime-report URL construction, bearer
// auth, and status classification. 401 and 429 get their own error
// variants because callers react to them differently.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{RealtimeReportRequest, RealtimeReportResponse};
use crate::transport::TransportConfig;

/// Root of the GA4 Data API.
pub const ANALYTICS_DATA_BASE_URL: &str = "https://analyticsdata.googleapis.com";

/// Raw HTTP client for the GA4 Data API (`v1beta`).
pub struct AnalyticsClient {
    http: reqwest::Client,
    base_url: Url,
}

impl AnalyticsClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// Build `{base}/v1beta/properties/{property_id}:runRealtimeReport`.
    pub(crate) fn realtime_report_url(&self, property_id: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let full = format!("{base}/v1beta/properties/{}:runRealtimeReport", property_id.trim());
        Url::parse(&full).map_err(Error::InvalidUrl)
    }

    /// Run a realtime report for `property_id`.
    pub async fn run_realtime_report(
        &self,
        property_id: &str,
        access_token: &SecretString,
        request: &RealtimeReportRequest,
    ) -> Result<RealtimeReportResponse, Error> {
        let url = self.realtime_report_url(property_id)?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .bearer_auth(access_token.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            return Err(Error::RateLimited { retry_after_secs });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized);
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }

    /// Current realtime `activeUsers` for `property_id`.
    ///
    /// A report without rows means nobody is on the site right now and
    /// yields `"0"`.
    pub async fn active_users(
        &self,
        property_id: &str,
        access_token: &SecretString,
    ) -> Result<String, Error> {
        let report = self
            .run_realtime_report(
                property_id,
                access_token,
                &RealtimeReportRequest::active_users(),
            )
            .await?;
        Ok(report.first_metric_value().unwrap_or("0").to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn realtime_report_url_handles_trailing_slash() {
        for base in [
            "https://analyticsdata.googleapis.com",
            "https://analyticsdata.googleapis.com/",
        ] {
            let client = AnalyticsClient::with_client(reqwest::Client::new(), Url::parse(base).unwrap());
            let url = client.realtime_report_url(" 123456 ").unwrap();
            assert_eq!(
                url.as_str(),
                "https://analyticsdata.googleapis.com/v1beta/properties/123456:runRealtimeReport"
            );
        }
    }
}
