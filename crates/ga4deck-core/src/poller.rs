// ── Realtime metric polling ──
//
// Fetches the active-user count with whatever token the session's
// `TokenManager` holds and turns every outcome into a display string.
// Nothing here ever fails: errors become their text.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::Credentials;
use crate::error::CoreError;
use crate::source::{DisplaySink, MetricSource};
use crate::token::TokenManager;

#[derive(Clone)]
pub struct MetricPoller {
    inner: Arc<PollerInner>,
}

struct PollerInner {
    source: Arc<dyn MetricSource>,
    tokens: TokenManager,
    display: Arc<dyn DisplaySink>,
    last_value: watch::Sender<Option<String>>,
}

impl MetricPoller {
    pub fn new(
        source: Arc<dyn MetricSource>,
        tokens: TokenManager,
        display: Arc<dyn DisplaySink>,
    ) -> Self {
        let (last_value, _) = watch::channel(None);
        Self {
            inner: Arc::new(PollerInner {
                source,
                tokens,
                display,
                last_value,
            }),
        }
    }

    /// Fetch the realtime active-user count for `credentials.property_id`.
    ///
    /// Waits for any in-flight token exchange before reading the token. A
    /// 401 triggers one renewal and one retry. Errors are returned as
    /// their display text.
    pub async fn fetch_active_users(&self, credentials: &Credentials) -> String {
        match self.try_fetch(credentials).await {
            Ok(value) => {
                debug!(property_id = %credentials.property_id, %value, "active users fetched");
                value
            }
            Err(e) => {
                warn!(property_id = %credentials.property_id, error = %e, "metric fetch failed");
                e.to_string()
            }
        }
    }

    async fn try_fetch(&self, credentials: &Credentials) -> Result<String, CoreError> {
        let tokens = &self.inner.tokens;
        let token = tokens.settled().await.ok_or(CoreError::MissingToken)?;

        match self
            .inner
            .source
            .active_users(&credentials.property_id, &token)
            .await
        {
            Err(CoreError::Unauthorized) => {
                info!("access token rejected, renewing before retry");
                if tokens.acquire_or_refresh(credentials).await.is_err() {
                    return Err(CoreError::Unauthorized);
                }
                let token = tokens.current_token().ok_or(CoreError::MissingToken)?;
                self.inner
                    .source
                    .active_users(&credentials.property_id, &token)
                    .await
            }
            other => other,
        }
    }

    /// Render `value` and remember it as the last known value.
    pub fn publish(&self, value: &str) {
        self.inner.display.show(value);
        self.inner.last_value.send_replace(Some(value.to_owned()));
    }

    /// Show a transient placeholder without touching the last value.
    pub fn show_placeholder(&self, text: &str) {
        self.inner.display.show(text);
    }

    /// The last published value, if any fetch has completed.
    pub fn last_value(&self) -> Option<String> {
        self.inner.last_value.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.inner.last_value.subscribe()
    }
}
