//! `ga4deck`: Stream Deck plugin that shows GA4 realtime active users.
//!
//! Launched by the Stream Deck application with `-port`, `-pluginUUID`,
//! `-registerEvent` and `-info`. Each visible key gets its own session
//! that keeps an OAuth token fresh and polls the realtime report.

mod args;
mod error;
mod host;
mod logging;
mod messages;
mod registry;

use std::path::{Path, PathBuf};

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info};

use ga4deck_core::Sources;

use crate::args::{PluginArgs, normalize_args};
use crate::error::PluginError;
use crate::registry::SessionRegistry;

#[tokio::main]
async fn main() {
    let args = PluginArgs::parse_from(normalize_args(std::env::args()));

    if let Err(err) = run(args).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

async fn run(args: PluginArgs) -> Result<(), PluginError> {
    let plugin_dir = plugin_dir();
    let config = ga4deck_config::load_config(&plugin_dir);
    let level = config.as_ref().map_or("info", |c| c.log_level.as_str());
    let _guard = logging::setup_tracing(&plugin_dir, level);

    let result = serve(&args, config).await;
    if let Err(ref e) = result {
        error!(error = %e, "plugin exiting");
    }
    result
}

async fn serve(
    args: &PluginArgs,
    config: Result<ga4deck_config::PluginConfig, ga4deck_config::ConfigError>,
) -> Result<(), PluginError> {
    let config = config?;
    let host = args.host_info();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        host_version = ?host.application.version,
        platform = ?host.application.platform,
        plugin_version = ?host.plugin.version,
        "ga4deck starting"
    );

    let session_config = config.session_config();
    let sources = Sources::google(&session_config)?;
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let registry = SessionRegistry::new(session_config, sources, outbound_tx);

    host::run(args, registry, outbound_rx).await?;
    info!("ga4deck stopped");
    Ok(())
}

/// Directory holding the executable, where the host unpacks the plugin.
fn plugin_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}
