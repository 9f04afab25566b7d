use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global tracing subscriber, writing to stderr so command output
/// on stdout stays machine-readable. `RUST_LOG` takes precedence over `verbose`.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "bankcore=debug,sqlx=info"
    } else {
        "bankcore=info,sqlx=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .init();
}
