//! File-based tracing. The host owns stdout/stderr, so logs go to a
//! daily-rotated file under `<plugin dir>/logs`.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_DIR_NAME: &str = "logs";
pub const LOG_FILE_PREFIX: &str = "ga4deck.log";

/// Install the global subscriber. `RUST_LOG` wins over `default_level`.
///
/// The returned guard must live until exit so buffered lines are flushed.
pub fn setup_tracing(plugin_dir: &Path, default_level: &str) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "ga4deck={default_level},ga4deck_core={default_level},ga4deck_api={default_level}"
        ))
    });

    let file_appender =
        tracing_appender::rolling::daily(plugin_dir.join(LOG_DIR_NAME), LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    guard
}
