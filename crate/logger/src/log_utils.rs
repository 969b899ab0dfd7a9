use std::sync::Once;

use tracing_subscriber::{
    EnvFilter,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

static LOG_INIT: Once = Once::new();

/// Filter used when neither `RUST_LOG` nor an explicit default is provided
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Initialize the tracing subscriber once for the whole process.
///
/// `RUST_LOG` wins over `default_value`, which wins over [`DEFAULT_LOG_FILTER`].
/// Logs are written to stderr: stdout is reserved for the round trip report.
pub fn log_init(default_value: Option<&str>) {
    LOG_INIT.call_once(|| {
        let filter = std::env::var("RUST_LOG")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default_value.unwrap_or(DEFAULT_LOG_FILTER).to_owned());
        if let Err(e) = tracing_setup(&filter) {
            eprintln!("failed to install the tracing subscriber: {e}");
        }
    });
}

fn tracing_setup(filter: &str) -> Result<(), TryInitError> {
    let format = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true)
        .compact();

    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(format)
        .try_init()
}
