// Copyright 2025 Cowboy AI, LLC.

//! Runtime configuration
//!
//! Loaded from JSON with every field optional, then overridden by
//! `SMART_AGRI_*` environment variables.

use crate::agronomy::AgronomyTables;
use crate::errors::{DomainError, DomainResult};
use crate::nats::NatsConfig;
use crate::notification::DEFAULT_RETENTION_DAYS;
use crate::persistence::query_support::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Local development; human-readable logs
    #[default]
    Development,
    /// Production; JSON logs
    Production,
}

impl std::str::FromStr for Environment {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(DomainError::ValidationError(format!(
                "unknown environment '{other}'"
            ))),
        }
    }
}

/// Settings for the advisory services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Deployment environment
    pub environment: Environment,
    /// Deadline for weather calls
    pub weather_timeout_ms: u64,
    /// Deadline for each SMS or email delivery
    pub delivery_timeout_ms: u64,
    /// Read notifications older than this are purged
    pub notification_retention_days: u32,
    /// Notification page size when the caller gives none
    pub default_page_size: usize,
    /// Default tracing filter, used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Message bus connection
    pub nats: NatsConfig,
    /// Agronomy lookup tables
    pub tables: AgronomyTables,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            weather_timeout_ms: 5_000,
            delivery_timeout_ms: 10_000,
            notification_retention_days: DEFAULT_RETENTION_DAYS,
            default_page_size: DEFAULT_PAGE_SIZE,
            log_filter: "smart_agri_core=info".to_string(),
            nats: NatsConfig::default(),
            tables: AgronomyTables::default(),
        }
    }
}

impl AdvisorConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> DomainResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> DomainResult<Self> {
        let mut config = Self::default();
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `SMART_AGRI_*` overrides from a lookup function
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> DomainResult<()> {
        if let Some(env) = lookup("SMART_AGRI_ENV") {
            self.environment = env.parse()?;
        }
        if let Some(ms) = lookup("SMART_AGRI_WEATHER_TIMEOUT_MS") {
            self.weather_timeout_ms = parse_number("SMART_AGRI_WEATHER_TIMEOUT_MS", &ms)?;
        }
        if let Some(ms) = lookup("SMART_AGRI_DELIVERY_TIMEOUT_MS") {
            self.delivery_timeout_ms = parse_number("SMART_AGRI_DELIVERY_TIMEOUT_MS", &ms)?;
        }
        if let Some(url) = lookup("SMART_AGRI_NATS_URL") {
            self.nats.url = url;
        }
        if let Some(filter) = lookup("SMART_AGRI_LOG") {
            self.log_filter = filter;
        }
        self.validate()
    }

    /// Weather deadline
    pub fn weather_timeout(&self) -> Duration {
        Duration::from_millis(self.weather_timeout_ms)
    }

    /// Delivery deadline
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }

    /// Whether this is a production deployment
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    fn validate(&self) -> DomainResult<()> {
        if self.weather_timeout_ms == 0 || self.delivery_timeout_ms == 0 {
            return Err(DomainError::ValidationError(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        if self.default_page_size == 0 {
            return Err(DomainError::ValidationError(
                "default page size must be greater than zero".to_string(),
            ));
        }
        if self.tables.stages.is_empty() {
            return Err(DomainError::ValidationError(
                "at least one growth stage is required".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_number(key: &str, value: &str) -> DomainResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| DomainError::ValidationError(format!("{key} must be a number, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = AdvisorConfig::default();
        assert_eq!(config.weather_timeout(), Duration::from_secs(5));
        assert_eq!(config.delivery_timeout(), Duration::from_secs(10));
        assert_eq!(config.notification_retention_days, 90);
        assert_eq!(config.default_page_size, 20);
        assert!(!config.is_production());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AdvisorConfig::from_json_str(
            r#"{"environment": "production", "weather_timeout_ms": 2500}"#,
        )
        .unwrap();
        assert!(config.is_production());
        assert_eq!(config.weather_timeout_ms, 2500);
        assert_eq!(config.tables, AgronomyTables::default());
        assert_eq!(config.nats.url, "nats://localhost:4222");
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SMART_AGRI_ENV", "prod"),
            ("SMART_AGRI_WEATHER_TIMEOUT_MS", "750"),
            ("SMART_AGRI_NATS_URL", "nats://bus:4222"),
            ("SMART_AGRI_LOG", "debug"),
        ]);
        let mut config = AdvisorConfig::default();
        config
            .apply_env_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.weather_timeout(), Duration::from_millis(750));
        assert_eq!(config.nats.url, "nats://bus:4222");
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn bad_override_is_validation_error() {
        let mut config = AdvisorConfig::default();
        let err = config
            .apply_env_overrides(|key| (key == "SMART_AGRI_WEATHER_TIMEOUT_MS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.is_validation_error());

        let err = config
            .apply_env_overrides(|key| (key == "SMART_AGRI_ENV").then(|| "staging".to_string()))
            .unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = AdvisorConfig::from_json_str(r#"{"delivery_timeout_ms": 0}"#).unwrap_err();
        assert!(err.is_validation_error());
    }
}
