//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::error::BoxError;

/// Map the configured level name to a filter directive; unknown names mean `info`.
pub fn level_directive(level: &str) -> &'static str {
    match level {
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    }
}

/// Install the global subscriber.
///
/// Production environments log JSON, everything else logs human-readable
/// lines. `RUST_LOG` takes precedence over the configured level. Fails if a
/// global subscriber is already installed.
pub fn init_logging(config: &ServerConfig) -> Result<(), BoxError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(&config.log_level)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.is_production() {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_directive() {
        assert_eq!(level_directive("debug"), "debug");
        assert_eq!(level_directive("warn"), "warn");
        assert_eq!(level_directive("error"), "error");
        assert_eq!(level_directive("info"), "info");
        assert_eq!(level_directive("verbose"), "info");
    }

    #[test]
    fn test_init_twice_fails() {
        let config = ServerConfig::default();
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
