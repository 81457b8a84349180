//! Wire messages exchanged with the Stream Deck host.
//!
//! Every frame is a JSON object discriminated by its `event` field.
//! Events the plugin does not handle parse as [`Inbound::Other`].

use serde::{Deserialize, Serialize};

use ga4deck_config::Settings;

// ── Host → plugin ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Inbound {
    WillAppear {
        context: String,
        #[serde(default)]
        payload: SettingsPayload,
    },
    WillDisappear {
        context: String,
    },
    KeyDown {
        context: String,
        #[serde(default)]
        payload: SettingsPayload,
    },
    DidReceiveSettings {
        context: String,
        #[serde(default)]
        payload: SettingsPayload,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
pub struct SettingsPayload {
    #[serde(default)]
    pub settings: Settings,
}

// ── Plugin → host ───────────────────────────────────────────────────

/// First frame after connecting.
#[derive(Debug, Serialize)]
pub struct Registration<'a> {
    pub event: &'a str,
    pub uuid: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Outbound {
    SetTitle {
        context: String,
        payload: TitlePayload,
    },
    OpenUrl {
        payload: UrlPayload,
    },
    LogMessage {
        payload: LogPayload,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitlePayload {
    pub title: String,
    /// 0 renders on both hardware and software keys.
    pub target: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlPayload {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogPayload {
    pub message: String,
}

impl Outbound {
    pub fn set_title(context: &str, title: &str) -> Self {
        Self::SetTitle {
            context: context.to_owned(),
            payload: TitlePayload {
                title: title.to_owned(),
                target: 0,
            },
        }
    }

    pub fn open_url(url: &str) -> Self {
        Self::OpenUrl {
            payload: UrlPayload {
                url: url.to_owned(),
            },
        }
    }

    pub fn log_message(message: impl Into<String>) -> Self {
        Self::LogMessage {
            payload: LogPayload {
                message: message.into(),
            },
        }
    }
}
