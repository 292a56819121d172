pub mod auth;
pub mod config;
pub mod error;
pub mod format;
pub mod handlers;
pub mod mcp;
pub mod metrics;
pub mod server;
pub mod signals;
pub mod stdio;
pub mod store;
pub mod tools;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing/logging
///
/// Logs always go to stderr (stdout belongs to the stdio protocol). `RUST_LOG`
/// overrides `level`; `format` is `text` or `json`. Keep the returned guard
/// alive for the whole process, dropping it flushes buffered lines.
///
/// Only the first call installs a subscriber.
pub fn init_tracing(level: &str, format: &str) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let json = format.eq_ignore_ascii_case("json");
    let json_layer = json.then(|| {
        fmt::layer()
            .json()
            .with_target(true)
            .with_writer(writer.clone())
    });
    let text_layer = (!json).then(|| {
        fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(writer)
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init();

    guard
}
