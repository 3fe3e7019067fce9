// Copyright 2025 Cowboy AI, LLC.

//! Tracing subscriber setup

use crate::config::Environment;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// `RUST_LOG` wins over `default_filter`. Production logs are JSON, all
/// other environments get human-readable output. Returns `false` when a
/// subscriber was already installed.
pub fn init(environment: Environment, default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let result = match environment {
        Environment::Production => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .try_init(),
        Environment::Development => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_line_number(true)
            .try_init(),
    };
    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_harmless() {
        let _ = init(Environment::Development, "smart_agri_core=debug");
        assert!(!init(Environment::Production, "info"));
    }
}
