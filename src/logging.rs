use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::config::ClientConfig;

pub const LOG_FILE_PREFIX: &str = "taskboard.log";

/// Keeps the background log writer alive. Dropping it flushes the file log.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Filter for terminal output: `RUST_LOG` wins, then `--verbose`, then the
/// configured default.
fn stderr_filter(verbose: bool, default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("info,taskboard=debug")
        } else {
            EnvFilter::new(default)
        }
    })
}

/// Install the global subscriber. Terminal output goes to stderr so command
/// output on stdout stays clean; when `log_dir` is set a daily-rolling JSON
/// file log is written there as well.
pub fn init_logging(config: &ClientConfig) -> LogGuard {
    let json = config.log_json;
    let stderr_plain = (!json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(stderr_filter(config.verbose, &config.log_filter))
    });
    let stderr_json = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(stderr_filter(config.verbose, &config.log_filter))
    });

    let (file_layer, guard) = match config.log_dir.as_deref() {
        Some(dir) => {
            let (layer, guard) = file_layer(dir);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // A subscriber may already be installed (tests, embedding callers).
    let _ = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_plain)
        .with(stderr_json)
        .try_init();

    LogGuard { _file: guard }
}

fn file_layer(dir: &Path) -> (Box<dyn Layer<Registry> + Send + Sync>, WorkerGuard) {
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = tracing_subscriber::fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(EnvFilter::new("info,taskboard=debug"))
        .boxed();
    (layer, guard)
}
