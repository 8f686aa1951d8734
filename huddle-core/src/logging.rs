use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Resolves the filter directive: `RUST_LOG` wins, then `-v`, then the
/// configured level.
pub fn filter_directive(config: &LoggingConfig, verbose: bool) -> String {
    match std::env::var("RUST_LOG") {
        Ok(directive) if !directive.trim().is_empty() => directive,
        _ if verbose => "debug".to_string(),
        _ => config.level.clone(),
    }
}

/// Installs the global subscriber. A second call is a no-op.
pub fn init(config: &LoggingConfig, verbose: bool) {
    let filter = EnvFilter::try_new(filter_directive(config, verbose))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    let _ = if config.json_format {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).compact())
            .try_init()
    };
}
