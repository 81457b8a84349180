// Wire models for the token endpoint and the realtime report endpoint.
//
// Only the fields the agent reads are modelled; unknown fields are ignored
// by serde so API additions never break parsing.

use serde::{Deserialize, Serialize};

/// Success body of `POST https://oauth2.googleapis.com/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Validity in seconds. Google sends it; other issuers may not.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// A metric selector in a report request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
}

/// Body of `runRealtimeReport`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeReportRequest {
    pub metrics: Vec<Metric>,
}

impl RealtimeReportRequest {
    /// The single-metric request the button displays.
    pub fn active_users() -> Self {
        Self {
            metrics: vec![Metric {
                name: "activeUsers".into(),
            }],
        }
    }
}

/// Response of `runRealtimeReport`. Every level may be absent when the
/// property had no traffic in the realtime window.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeReportResponse {
    #[serde(default)]
    pub rows: Option<Vec<Row>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    #[serde(default)]
    pub metric_values: Option<Vec<MetricValue>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricValue {
    #[serde(default)]
    pub value: Option<String>,
}

impl RealtimeReportResponse {
    /// `rows[0].metricValues[0].value`, if present and non-empty.
    pub fn first_metric_value(&self) -> Option<&str> {
        self.rows
            .as_deref()?
            .first()?
            .metric_values
            .as_deref()?
            .first()?
            .value
            .as_deref()
            .filter(|v| !v.is_empty())
    }
}
