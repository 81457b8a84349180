//! One [`Session`] per visible key, keyed by the host's context id.
//!
//! Lifecycle events are applied in arrival order. Arming, stopping and
//! credential swaps happen inline so a quick burst of events always
//! settles on the last one; the network-bound refresh work is spawned so
//! the socket keeps draining while it runs.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use ga4deck_config::Settings;
use ga4deck_core::{Credentials, DisplaySink, Session, SessionConfig, Sources, UrlOpener};

use crate::messages::{Inbound, Outbound};

/// Title shown while a key's settings are incomplete.
pub const SETUP_TITLE: &str = "Setup";

// ── Host-backed collaborators ───────────────────────────────────────

/// Renders onto one key through `setTitle`.
struct KeyTitle {
    context: String,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl DisplaySink for KeyTitle {
    fn show(&self, text: &str) {
        // Send fails only once the socket task is gone.
        let _ = self.outbound.send(Outbound::set_title(&self.context, text));
    }
}

/// Opens URLs in the user's browser through the host.
struct HostBrowser {
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl UrlOpener for HostBrowser {
    fn open_url(&self, url: &str) {
        let _ = self.outbound.send(Outbound::open_url(url));
    }
}

// ── Registry ────────────────────────────────────────────────────────

pub struct SessionRegistry {
    sessions: HashMap<String, Session>,
    config: SessionConfig,
    sources: Sources,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl SessionRegistry {
    pub fn new(
        config: SessionConfig,
        sources: Sources,
        outbound: mpsc::UnboundedSender<Outbound>,
    ) -> Self {
        Self {
            sessions: HashMap::new(),
            config,
            sources,
            outbound,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, context: &str) -> Option<&Session> {
        self.sessions.get(context)
    }

    /// Apply one host event.
    pub async fn handle(&mut self, event: Inbound) {
        match event {
            Inbound::WillAppear { context, payload } => {
                self.appear(context, &payload.settings).await;
            }
            Inbound::WillDisappear { context } => self.disappear(&context).await,
            Inbound::KeyDown { context, payload } => self.key_down(&context, &payload.settings),
            Inbound::DidReceiveSettings { context, payload } => {
                self.settings_changed(context, &payload.settings).await;
            }
            Inbound::Other => {}
        }
    }

    /// Stop every session. Used on shutdown.
    pub async fn stop_all(&mut self) {
        info!(sessions = self.len(), "stopping all sessions");
        for (context, session) in self.sessions.drain() {
            session.stop().await;
            debug!(%context, "session stopped on shutdown");
        }
    }

    // ── Event handlers ──────────────────────────────────────────────

    async fn appear(&mut self, context: String, settings: &Settings) {
        let credentials = match settings.credentials() {
            Ok(credentials) => credentials,
            Err(e) => {
                info!(%context, reason = %e, "key not configured");
                self.show_setup(&context);
                return;
            }
        };

        let (session, changed) = match self.sessions.get(&context) {
            Some(existing) => {
                let current = existing.credentials();
                let changed = current.property_id != credentials.property_id
                    || !current.same_grant(&credentials);
                if changed {
                    debug!(%context, "appear carried new settings");
                    existing.set_credentials(credentials);
                }
                (existing.clone(), changed)
            }
            None => {
                let session = self.new_session(&context, credentials);
                self.sessions.insert(context.clone(), session.clone());
                (session, false)
            }
        };

        let armed = session.arm().await;
        if armed {
            info!(%context, property_id = %session.credentials().property_id, "key appeared");
        }
        if armed || changed {
            tokio::spawn(async move {
                session.trigger().await;
            });
        }
    }

    async fn disappear(&mut self, context: &str) {
        if let Some(session) = self.sessions.remove(context) {
            session.stop().await;
            info!(%context, "key disappeared");
        }
    }

    fn key_down(&mut self, context: &str, settings: &Settings) {
        let Some(session) = self.sessions.get(context).cloned() else {
            // Unconfigured keys have no session; nudge the user instead.
            if !settings.is_complete() {
                self.show_setup(context);
            }
            return;
        };

        tokio::spawn(async move {
            session.key_pressed().await;
        });
    }

    async fn settings_changed(&mut self, context: String, settings: &Settings) {
        match (settings.credentials(), self.sessions.get(&context).cloned()) {
            (Ok(credentials), Some(session)) => {
                session.set_credentials(credentials);
                tokio::spawn(async move {
                    session.trigger().await;
                });
            }
            // First complete settings for a visible key.
            (Ok(_), None) => self.appear(context, settings).await,
            (Err(e), existing) => {
                info!(%context, reason = %e, "settings incomplete");
                if let Some(session) = existing {
                    self.sessions.remove(&context);
                    session.stop().await;
                }
                self.show_setup(&context);
            }
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────

    fn new_session(&self, context: &str, credentials: Credentials) -> Session {
        Session::new(
            credentials,
            self.config.clone(),
            self.sources.clone(),
            Arc::new(KeyTitle {
                context: context.to_owned(),
                outbound: self.outbound.clone(),
            }),
            Arc::new(HostBrowser {
                outbound: self.outbound.clone(),
            }),
        )
    }

    fn show_setup(&self, context: &str) {
        let _ = self.outbound.send(Outbound::set_title(context, SETUP_TITLE));
    }
}
