//! Structured observability for the bridge.
//!
//! A layered `tracing` subscriber:
//! - **stderr** output for interactive use, filtered by `RUST_LOG`
//!   (default `warn`);
//! - an optional **file layer** writing JSON lines to
//!   `~/.ud-bridge/logs/ud-bridge.log` at `debug` level.
//!
//! Login tokens never appear in events; handlers log the storage key only.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

const LOG_DIR_RELATIVE: &str = ".ud-bridge/logs";
const LOG_FILE_NAME: &str = "ud-bridge.log";

/// Initialize the global tracing subscriber with stderr + file layers.
///
/// Call this once early in `main()`. Panics if called twice.
pub fn init_logging() {
    let stderr_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(stderr_filter);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(make_file_layer())
        .init();
}

fn log_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(LOG_DIR_RELATIVE))
}

fn make_file_layer<S>() -> Option<Box<dyn Layer<S> + Send + Sync>>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let dir = log_dir()?;
    fs::create_dir_all(&dir).ok()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE_NAME))
        .ok()?;

    let layer = fmt::layer()
        .json()
        .with_writer(std::sync::Mutex::new(file))
        .with_filter(EnvFilter::new("debug"));
    Some(layer.boxed())
}
