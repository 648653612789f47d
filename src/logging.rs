use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes the logging system with both console and file output.
///
/// Console output is plain text, the daily-rotated file under `logs/` is JSON.
/// `RUST_LOG` still wins over the default directive.
pub fn init_logging(verbose: bool) {
    // Ensure logs directory exists
    let _ = fs::create_dir_all("logs");

    let file_appender = tracing_appender::rolling::daily("logs", "contact_cleaner.log");
    let (non_blocking_writer, _guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);

    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let default_level = if verbose { "debug" } else { "info" };
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("contact_cleaner={}", default_level).parse() {
        filter = filter.add_directive(directive);
    }

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    // Keep the writer alive so buffered lines are flushed on exit
    std::mem::forget(_guard);
}
