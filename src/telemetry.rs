use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingSettings;

/// Install the global tracing subscriber. `RUST_LOG` wins over the
/// configured level. Calling this twice is a no-op.
pub fn init_tracing(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_str()));

    let result = if settings.json {
        fmt().with_env_filter(filter).json().with_target(true).try_init()
    } else {
        fmt().with_env_filter(filter).with_target(false).try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
