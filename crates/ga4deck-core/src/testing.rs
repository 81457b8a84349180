// In-memory collaborators for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::config::Credentials;
use crate::error::CoreError;
use crate::source::{DisplaySink, MetricSource, TokenGrant, TokenSource, UrlOpener};

pub(crate) fn credentials(property_id: &str) -> Credentials {
    Credentials::new(property_id, "client.apps", "secret", "1//refresh")
}

// ── Token endpoint ───────────────────────────────────────────────────

/// Issues `tok-1`, `tok-2`, ... unless a scripted failure is queued.
pub(crate) struct FakeTokenSource {
    expires_in: Option<Duration>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    failures: Mutex<VecDeque<CoreError>>,
    clients: Mutex<Vec<String>>,
}

impl FakeTokenSource {
    pub(crate) fn new(expires_in: Option<Duration>) -> Arc<Self> {
        Self::delayed(expires_in, Duration::ZERO)
    }

    pub(crate) fn delayed(expires_in: Option<Duration>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            expires_in,
            delay,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            failures: Mutex::new(VecDeque::new()),
            clients: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn push_failure(&self, status: u16, body: &str) {
        self.failures
            .lock()
            .unwrap()
            .push_back(CoreError::TokenRefreshFailed {
                status,
                body: body.into(),
            });
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// `client_id` of every exchange, in call order.
    pub(crate) fn clients(&self) -> Vec<String> {
        self.clients.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenSource for FakeTokenSource {
    async fn exchange(&self, credentials: &Credentials) -> Result<TokenGrant, CoreError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.clients
            .lock()
            .unwrap()
            .push(credentials.client_id.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(TokenGrant {
            access_token: SecretString::from(format!("tok-{n}")),
            expires_in: self.expires_in,
        })
    }
}

// ── Metrics endpoint ─────────────────────────────────────────────────

/// Replays scripted outcomes, then repeats the last successful value.
pub(crate) struct FakeMetricSource {
    script: Mutex<VecDeque<Result<String, CoreError>>>,
    fallback: Mutex<String>,
    requests: Mutex<Vec<(String, String)>>,
}

impl FakeMetricSource {
    pub(crate) fn new<I, S>(values: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let source = Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new("0".into()),
            requests: Mutex::new(Vec::new()),
        });
        for v in values {
            source.push(Ok(v.into()));
        }
        source
    }

    pub(crate) fn push(&self, outcome: Result<String, CoreError>) {
        self.script.lock().unwrap().push_back(outcome);
    }

    /// `(property_id, bearer token)` of every request, in order.
    pub(crate) fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl MetricSource for FakeMetricSource {
    async fn active_users(
        &self,
        property_id: &str,
        access_token: &SecretString,
    ) -> Result<String, CoreError> {
        self.requests.lock().unwrap().push((
            property_id.to_owned(),
            access_token.expose_secret().to_owned(),
        ));

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(value)) => {
                *self.fallback.lock().unwrap() = value.clone();
                Ok(value)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.fallback.lock().unwrap().clone()),
        }
    }
}

// ── Host side ────────────────────────────────────────────────────────

/// Records display updates and URL launches in one ordered log.
#[derive(Default)]
pub(crate) struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Only the display updates.
    pub(crate) fn shown(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix("show:").map(str::to_owned))
            .collect()
    }
}

impl DisplaySink for Recorder {
    fn show(&self, text: &str) {
        self.events.lock().unwrap().push(format!("show:{text}"));
    }
}

impl UrlOpener for Recorder {
    fn open_url(&self, url: &str) {
        self.events.lock().unwrap().push(format!("open:{url}"));
    }
}
