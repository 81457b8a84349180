// ── Per-button session ──
//
// A `Session` owns one button's credentials, its `TokenManager` and its
// `MetricPoller`, and the two background tasks that drive them. Both
// tasks share one `CancellationToken` and are spawned and joined under
// the same lock, so a session is either fully active or fully inactive.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{Credentials, SessionConfig};
use crate::poller::MetricPoller;
use crate::source::{DisplaySink, Sources, UrlOpener, analytics_url};
use crate::token::TokenManager;

/// Whether the background tasks are running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Inactive,
    Active,
}

/// Cheaply cloneable handle to one button's refresh session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    credentials: ArcSwap<Credentials>,
    tokens: TokenManager,
    poller: MetricPoller,
    opener: Arc<dyn UrlOpener>,
    timers: Mutex<Option<ActiveTimers>>,
    state: watch::Sender<SessionState>,
}

struct ActiveTimers {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Session {
    /// Create an inactive session. Call [`start()`](Self::start) to
    /// acquire a token and begin polling.
    pub fn new(
        credentials: Credentials,
        config: SessionConfig,
        sources: Sources,
        display: Arc<dyn DisplaySink>,
        opener: Arc<dyn UrlOpener>,
    ) -> Self {
        let tokens = TokenManager::new(sources.tokens);
        let poller = MetricPoller::new(sources.metrics, tokens.clone(), display);
        let (state, _) = watch::channel(SessionState::Inactive);

        Self {
            inner: Arc::new(SessionInner {
                config,
                credentials: ArcSwap::from_pointee(credentials),
                tokens,
                poller,
                opener,
                timers: Mutex::new(None),
                state,
            }),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Arm the poll and renewal tasks, then acquire a token and publish a
    /// first value.
    ///
    /// Returns `false` without doing anything if already active.
    pub async fn start(&self) -> bool {
        if !self.arm().await {
            return false;
        }
        self.trigger().await;
        true
    }

    /// Arm the poll and renewal tasks without the initial refresh.
    ///
    /// Callers that cannot wait for the network run the initial refresh
    /// themselves with [`trigger()`](Self::trigger). Returns `false` if
    /// already active.
    pub async fn arm(&self) -> bool {
        let mut timers = self.inner.timers.lock().await;
        if timers.is_some() {
            debug!("session already active");
            return false;
        }

        let cancel = CancellationToken::new();
        let handles = vec![
            tokio::spawn(poll_task(self.clone(), cancel.clone())),
            tokio::spawn(renewal_task(self.clone(), cancel.clone())),
        ];
        *timers = Some(ActiveTimers { cancel, handles });
        drop(timers);

        self.inner.state.send_replace(SessionState::Active);
        info!(property_id = %self.inner.credentials.load().property_id, "session started");
        true
    }

    /// Cancel both tasks, wait for them to finish and discard the token.
    ///
    /// Returns `false` if the session was not active.
    pub async fn stop(&self) -> bool {
        let mut timers = self.inner.timers.lock().await;
        let Some(active) = timers.take() else {
            return false;
        };

        active.cancel.cancel();
        for handle in active.handles {
            let _ = handle.await;
        }
        drop(timers);

        self.inner.tokens.reset().await;
        self.inner.state.send_replace(SessionState::Inactive);
        info!(property_id = %self.inner.credentials.load().property_id, "session stopped");
        true
    }

    // ── Manual triggers ──────────────────────────────────────────

    /// Refresh the token, then fetch and publish. Leaves the timer
    /// cadence untouched.
    ///
    /// Returns the published value, or `None` if the session is inactive
    /// or was stopped mid-cycle.
    pub async fn trigger(&self) -> Option<String> {
        let cancel = self.active_cancel().await?;
        tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            value = self.refresh_cycle() => Some(value),
        }
    }

    /// Key press: show a placeholder, open the property in GA4, refresh.
    pub async fn key_pressed(&self) -> Option<String> {
        let active = self.is_active().await;
        if active {
            self.inner.poller.show_placeholder("-");
        }
        let url = analytics_url(&self.inner.credentials.load().property_id);
        self.inner.opener.open_url(&url);

        if active { self.trigger().await } else { None }
    }

    /// Swap in new credentials. Running tasks pick them up on their next
    /// cycle.
    pub fn set_credentials(&self, credentials: Credentials) {
        debug!(property_id = %credentials.property_id, "credentials updated");
        self.inner.credentials.store(Arc::new(credentials));
    }

    /// Swap in new credentials and refresh with them.
    pub async fn update_credentials(&self, credentials: Credentials) -> Option<String> {
        self.set_credentials(credentials);
        self.trigger().await
    }

    // ── Observation ──────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    pub fn last_value(&self) -> Option<String> {
        self.inner.poller.last_value()
    }

    pub fn credentials(&self) -> Arc<Credentials> {
        self.inner.credentials.load_full()
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.inner.tokens
    }

    // ── Internals ────────────────────────────────────────────────

    async fn is_active(&self) -> bool {
        self.inner.timers.lock().await.is_some()
    }

    async fn active_cancel(&self) -> Option<CancellationToken> {
        self.inner
            .timers
            .lock()
            .await
            .as_ref()
            .map(|t| t.cancel.clone())
    }

    /// Token refresh strictly before the fetch that uses it.
    async fn refresh_cycle(&self) -> String {
        let credentials = self.inner.credentials.load_full();
        // Failures are logged by the manager; the fetch still runs with
        // the last good token.
        let _ = self.inner.tokens.acquire_or_refresh(&credentials).await;
        let value = self.inner.poller.fetch_active_users(&credentials).await;
        self.inner.poller.publish(&value);
        value
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Fetch and publish on the poll cadence.
async fn poll_task(session: Session, cancel: CancellationToken) {
    let poller = &session.inner.poller;
    let mut interval = tokio::time::interval(session.inner.config.poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let credentials = session.inner.credentials.load_full();
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    value = poller.fetch_active_users(&credentials) => poller.publish(&value),
                }
            }
        }
    }
    debug!("poll task stopped");
}

/// Renew the token ahead of expiry. The deadline is recomputed whenever
/// any exchange succeeds, including manual ones.
async fn renewal_task(session: Session, cancel: CancellationToken) {
    let config = &session.inner.config;
    let tokens = &session.inner.tokens;
    let mut generation = tokens.subscribe();
    let mut deadline = tokens.renewal_deadline(config);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = generation.changed() => {
                if changed.is_err() {
                    break;
                }
                deadline = tokens.renewal_deadline(config);
                debug!(in_secs = deadline.saturating_duration_since(Instant::now()).as_secs(), "renewal rescheduled");
            }
            () = tokio::time::sleep_until(deadline) => {
                let credentials = session.inner.credentials.load_full();
                let outcome = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    outcome = tokens.acquire_or_refresh(&credentials) => outcome,
                };
                deadline = match outcome {
                    Ok(()) => tokens.renewal_deadline(config),
                    Err(_) => Instant::now() + config.retry_delay(),
                };
            }
        }
    }
    debug!("renewal task stopped");
}
