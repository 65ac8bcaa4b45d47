//! YAML configuration for the ledger views.

use chrono::NaiveDate;
use ledger_core::ValidationError;
use ledger_econ::{ReprocessSettings, SettingsError};
use ledger_series::{MiningMetric, SeriesLabels};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid reprocess settings: {0}")]
    Settings(#[from] SettingsError),
    #[error("invalid dataset: {0}")]
    Validation(#[from] ValidationError),
}

/// Default date range of the mining graph, in whole days.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub reprocess: ReprocessSettings,
    pub metric: MiningMetric,
    pub labels: SeriesLabels,
    pub window: WindowConfig,
}

impl LedgerConfig {
    /// Parse and validate a YAML document; missing fields take defaults.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let cfg: LedgerConfig = serde_yaml::from_str(text)?;
        cfg.reprocess.validate()?;
        Ok(cfg)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = LedgerConfig::from_yaml("{}").unwrap();
        assert_eq!(cfg, LedgerConfig::default());
        assert_eq!(cfg.reprocess.station_yield, Decimal::new(50, 0));
        assert_eq!(cfg.metric, MiningMetric::Ore);
    }

    #[test]
    fn partial_document_overrides() {
        let yaml = r#"
metric: reprocessed-max
reprocess:
  station_yield: 54
  reprocessing_level: 5
labels:
  grand_total: "All Ores"
window:
  from: 2023-01-01
"#;
        let cfg = LedgerConfig::from_yaml(yaml).unwrap();
        assert_eq!(cfg.metric, MiningMetric::ReprocessedMax);
        assert_eq!(cfg.reprocess.station_yield, Decimal::new(54, 0));
        assert_eq!(cfg.reprocess.reprocessing_level, 5);
        assert_eq!(cfg.reprocess.processing_level, 0);
        assert_eq!(cfg.labels.grand_total, "All Ores");
        assert_eq!(cfg.labels.group_total, "{group} Total");
        assert_eq!(cfg.window.from, NaiveDate::from_ymd_opt(2023, 1, 1));
        assert_eq!(cfg.window.to, None);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let err = LedgerConfig::from_yaml("reprocess:\n  processing_level: 9\n").unwrap_err();
        assert!(matches!(err, ConfigError::Settings(_)));
        let err = LedgerConfig::from_yaml("metric: [1, 2]").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }
}
