use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// JSON lines on stderr; stdout belongs to the stdio transport.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer()
        .json()
        .with_current_span(false)
        .with_writer(std::io::stderr);
    // A subscriber installed earlier wins.
    let _ = tracing_subscriber::registry().with(filter).with(fmt_layer).try_init();
}
