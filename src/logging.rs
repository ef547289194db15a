use tracing_subscriber::EnvFilter;

use crate::config::LoggingOptions;

/// Render the per-logger level map as an `EnvFilter` directive string, root level first.
pub fn filter_directives(options: &LoggingOptions) -> String {
    let mut directives = Vec::with_capacity(options.min_levels.len());
    if let Some(root) = options.min_levels.get("") {
        directives.push(root.clone());
    }
    for (logger, level) in &options.min_levels {
        if !logger.is_empty() {
            directives.push(format!("{logger}={level}"));
        }
    }
    directives.join(",")
}

/// Install the stderr subscriber. `RUST_LOG` wins over the configured levels.
pub fn init(options: &LoggingOptions) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directives(options)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
