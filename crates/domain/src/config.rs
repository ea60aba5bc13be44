//! Service configuration loaded from environment variables.

use std::str::FromStr;
use std::sync::Arc;

use common::{IdGenerator, SequentialIdGenerator, UuidIdGenerator};

use crate::command::DEFAULT_SNAPSHOT_INTERVAL;

/// How new ticket and comment ids are minted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdStrategy {
    /// Random v4 UUIDs.
    #[default]
    Uuid,
    /// `ticket-1`, `ticket-2`, ... for demos and reproducible runs.
    Sequential,
}

impl IdStrategy {
    pub fn generator(&self) -> Arc<dyn IdGenerator> {
        match self {
            IdStrategy::Uuid => Arc::new(UuidIdGenerator),
            IdStrategy::Sequential => Arc::new(SequentialIdGenerator::new("ticket")),
        }
    }
}

impl FromStr for IdStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uuid" => Ok(IdStrategy::Uuid),
            "sequential" => Ok(IdStrategy::Sequential),
            other => Err(format!("unknown id strategy: {other}")),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Ticket service configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `TICKET_SNAPSHOT_INTERVAL`: events between snapshots, 0 disables (default: `50`)
/// - `TICKET_ID_STRATEGY`: `uuid` or `sequential` (default: `uuid`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `TICKET_LOG_FORMAT`: `text` or `json` (default: `text`)
///
/// Unparseable values fall back to the default.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub snapshot_interval: u64,
    pub id_strategy: IdStrategy,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl ServiceConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            snapshot_interval: lookup("TICKET_SNAPSHOT_INTERVAL")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.snapshot_interval),
            id_strategy: lookup("TICKET_ID_STRATEGY")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.id_strategy),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("TICKET_LOG_FORMAT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.log_format),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: DEFAULT_SNAPSHOT_INTERVAL,
            id_strategy: IdStrategy::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = ServiceConfig::default();
        assert_eq!(config.snapshot_interval, 50);
        assert_eq!(config.id_strategy, IdStrategy::Uuid);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_reads_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("TICKET_SNAPSHOT_INTERVAL", "10"),
            ("TICKET_ID_STRATEGY", "Sequential"),
            ("RUST_LOG", "domain=debug"),
            ("TICKET_LOG_FORMAT", "json"),
        ]));

        assert_eq!(config.snapshot_interval, 10);
        assert_eq!(config.id_strategy, IdStrategy::Sequential);
        assert_eq!(config.log_level, "domain=debug");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("TICKET_SNAPSHOT_INTERVAL", "often"),
            ("TICKET_ID_STRATEGY", "snowflake"),
        ]));

        assert_eq!(config.snapshot_interval, 50);
        assert_eq!(config.id_strategy, IdStrategy::Uuid);
    }

    #[test]
    fn test_sequential_generator() {
        let ids = IdStrategy::Sequential.generator();
        assert_eq!(ids.generate(), "ticket-1");
        assert_eq!(ids.generate(), "ticket-2");
    }
}
