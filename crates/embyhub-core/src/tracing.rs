use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize stdout tracing. Call once at service startup.
///
/// `RUST_LOG` takes precedence; otherwise `default_directive` (e.g. `"info"` or
/// `"embyhub_bot=debug,info"`) is used. `json` selects structured JSON lines
/// instead of the human-readable formatter.
///
/// Safe to call multiple times; later calls are ignored.
pub fn init_tracing(default_directive: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };
}
