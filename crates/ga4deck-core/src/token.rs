// ── Access-token lifecycle ──
//
// One `TokenManager` per session. It owns the current bearer token and a
// single "pending exchange" slot. Every caller that asks for a refresh
// while an exchange is outstanding attaches to the same shared future,
// so the token endpoint sees at most one request at a time and all
// waiters observe the same outcome. A caller holding a different grant
// waits for the outstanding exchange to finish and then starts its own.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use secrecy::SecretString;
use tokio::sync::{Mutex, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{Credentials, SessionConfig};
use crate::error::CoreError;
use crate::source::TokenSource;

type PendingExchange = Shared<BoxFuture<'static, Result<(), CoreError>>>;

/// The outstanding exchange and the credentials it was started with.
struct Pending {
    id: u64,
    credentials: Credentials,
    exchange: PendingExchange,
}

/// The token currently in use.
struct AccessToken {
    value: SecretString,
    expires_in: Option<Duration>,
    acquired_at: Instant,
}

/// Cheaply cloneable handle to a session's token state.
#[derive(Clone)]
pub struct TokenManager {
    inner: Arc<TokenInner>,
}

struct TokenInner {
    source: Arc<dyn TokenSource>,
    current: ArcSwapOption<AccessToken>,
    pending: Mutex<Option<Pending>>,
    next_id: AtomicU64,
    /// Bumped after every successful exchange.
    generation: watch::Sender<u64>,
}

impl TokenManager {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            inner: Arc::new(TokenInner {
                source,
                current: ArcSwapOption::empty(),
                pending: Mutex::new(None),
                next_id: AtomicU64::new(0),
                generation,
            }),
        }
    }

    /// Exchange the refresh token for a new access token, or join the
    /// exchange that is already running for the same grant.
    ///
    /// An outstanding exchange for other credentials is allowed to finish
    /// first, then a fresh one is started. On failure the previously
    /// stored token is kept.
    pub async fn acquire_or_refresh(&self, credentials: &Credentials) -> Result<(), CoreError> {
        loop {
            let mut pending = self.inner.pending.lock().await;
            match pending.as_ref() {
                Some(p) if p.credentials.same_grant(credentials) => {
                    debug!(exchange = p.id, "joining in-flight token exchange");
                    let exchange = p.exchange.clone();
                    drop(pending);
                    return exchange.await;
                }
                Some(p) => {
                    debug!(exchange = p.id, "waiting out token exchange for previous credentials");
                    let stale = p.exchange.clone();
                    drop(pending);
                    // Its outcome belongs to the old credentials.
                    let _ = stale.await;
                }
                None => {
                    let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
                    let exchange = run_exchange(
                        Arc::downgrade(&self.inner),
                        Arc::clone(&self.inner.source),
                        id,
                        credentials.clone(),
                    )
                    .boxed()
                    .shared();
                    *pending = Some(Pending {
                        id,
                        credentials: credentials.clone(),
                        exchange: exchange.clone(),
                    });
                    drop(pending);
                    return exchange.await;
                }
            }
        }
    }

    /// The latest token, without touching the network.
    pub fn current_token(&self) -> Option<SecretString> {
        self.inner.current.load_full().map(|t| t.value.clone())
    }

    /// Wait for any in-flight exchange to settle, then return the current
    /// token.
    pub async fn settled(&self) -> Option<SecretString> {
        let pending = self
            .inner
            .pending
            .lock()
            .await
            .as_ref()
            .map(|p| p.exchange.clone());

        if let Some(exchange) = pending {
            // Outcome already logged by the exchange itself.
            let _ = exchange.await;
        }
        self.current_token()
    }

    /// Whether an exchange is outstanding.
    pub async fn is_refreshing(&self) -> bool {
        self.inner.pending.lock().await.is_some()
    }

    /// Number of successful exchanges. Changes are observable through
    /// [`subscribe()`](Self::subscribe).
    pub fn generation(&self) -> u64 {
        *self.inner.generation.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.generation.subscribe()
    }

    /// When the next scheduled renewal is due.
    ///
    /// `renewal_fraction` of the reported validity after acquisition, or
    /// `renewal_interval` when the issuer reported none (or zero). Never
    /// sooner than the retry delay after acquisition. Without a token the
    /// renewal is due after the retry delay.
    pub fn renewal_deadline(&self, config: &SessionConfig) -> Instant {
        match self.inner.current.load_full() {
            Some(token) => {
                let lifetime = token
                    .expires_in
                    .filter(|ttl| !ttl.is_zero())
                    .map_or(config.renewal_interval, |ttl| {
                        scaled(ttl, config.renewal_fraction)
                    })
                    .max(config.retry_delay());
                token.acquired_at + lifetime
            }
            None => Instant::now() + config.retry_delay(),
        }
    }

    /// Drop the token and abandon any pending exchange.
    pub async fn reset(&self) {
        *self.inner.pending.lock().await = None;
        self.inner.current.store(None);
    }
}

#[allow(
    clippy::as_conversions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn scaled(ttl: Duration, fraction: f64) -> Duration {
    Duration::from_millis((ttl.as_millis() as f64 * fraction).round() as u64)
}

/// Body of the shared exchange future.
///
/// Holds the manager weakly: the future itself lives in the manager's
/// pending slot.
async fn run_exchange(
    inner: Weak<TokenInner>,
    source: Arc<dyn TokenSource>,
    id: u64,
    credentials: Credentials,
) -> Result<(), CoreError> {
    let outcome = source.exchange(&credentials).await;

    let Some(inner) = inner.upgrade() else {
        return outcome.map(|_| ());
    };

    let outcome = match outcome {
        Ok(grant) => {
            info!(
                property_id = %credentials.property_id,
                expires_in = ?grant.expires_in,
                "access token renewed"
            );
            inner.current.store(Some(Arc::new(AccessToken {
                value: grant.access_token,
                expires_in: grant.expires_in,
                acquired_at: Instant::now(),
            })));
            inner.generation.send_modify(|g| *g += 1);
            Ok(())
        }
        Err(e) => {
            warn!(
                property_id = %credentials.property_id,
                error = %e,
                "token exchange failed, keeping previous token"
            );
            Err(e)
        }
    };

    let mut pending = inner.pending.lock().await;
    if pending.as_ref().is_some_and(|p| p.id == id) {
        *pending = None;
    }

    outcome
}
