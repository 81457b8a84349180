//! Launch arguments passed by the Stream Deck host.
//!
//! The host invokes plugins as
//! `ga4deck -port 28196 -pluginUUID <uuid> -registerEvent registerPlugin -info <json>`.
//! The single-dash long flags are rewritten to `--` before clap sees them.

use clap::Parser;
use serde::Deserialize;

/// Flags the host passes with a single leading dash.
const HOST_FLAGS: [&str; 4] = ["-port", "-pluginUUID", "-registerEvent", "-info"];

/// GA4 realtime active users on a Stream Deck key.
#[derive(Parser, Debug)]
#[command(name = "ga4deck", version, about)]
pub struct PluginArgs {
    /// Port of the host's local WebSocket server
    #[arg(long = "port")]
    pub port: u16,

    /// Identifier to register with
    #[arg(long = "pluginUUID")]
    pub plugin_uuid: String,

    /// Event name to send the registration under
    #[arg(long = "registerEvent")]
    pub register_event: String,

    /// Host and device description (JSON)
    #[arg(long = "info")]
    pub info: Option<String>,
}

impl PluginArgs {
    /// Parse the host's `-info` JSON. Malformed or absent input yields
    /// an empty description.
    pub fn host_info(&self) -> HostInfo {
        self.info
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HostInfo {
    #[serde(default)]
    pub application: Application,
    #[serde(default)]
    pub plugin: Plugin,
}

#[derive(Debug, Default, Deserialize)]
pub struct Application {
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Plugin {
    #[serde(default)]
    pub version: Option<String>,
}

/// Rewrite the host's `-flag` spelling to `--flag`.
pub fn normalize_args<I, S>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if HOST_FLAGS.contains(&arg.as_str()) {
                format!("-{arg}")
            } else {
                arg
            }
        })
        .collect()
}
