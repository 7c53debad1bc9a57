//! Pipeline configuration

use crate::Result;
use anyhow::Context;
use pantry_core::expiry::{DEFAULT_SHELF_LIFE_DAYS, LABEL_FALLBACK_DAYS};
use pantry_core::{MatcherConfig, PixelThresholds, SpoilageBands};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Detector classes that count as food
pub const DEFAULT_ALLOWED_CLASSES: &[&str] = &[
    "banana", "apple", "sandwich", "orange", "broccoli", "carrot", "hot dog", "pizza", "donut",
    "cake",
];

/// Main pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub retry: RetryConfig,
    pub matching: MatcherConfig,
    pub allowed_classes: Vec<String>,
    pub spoilage: SpoilageConfig,
    pub default_shelf_life_days: u32,
    pub label_fallback_days: u32,
}

/// What to do when every attempt stays below the acceptance confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LowConfidencePolicy {
    /// Report the best detection as a low-confidence outcome
    #[default]
    Report,
    /// Build a draft from the best detection, flagged as low confidence
    AcceptBest,
}

/// Detector retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub acceptance_confidence: f64,
    pub backoff_ms: u64,
    pub low_confidence_policy: LowConfidencePolicy,
}

/// Pixel and band thresholds for the spoilage estimate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpoilageConfig {
    pub pixels: PixelThresholds,
    pub bands: SpoilageBands,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            acceptance_confidence: 0.5,
            backoff_ms: 500,
            low_confidence_policy: LowConfidencePolicy::Report,
        }
    }
}

impl RetryConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            matching: MatcherConfig::default(),
            allowed_classes: DEFAULT_ALLOWED_CLASSES.iter().map(|c| c.to_string()).collect(),
            spoilage: SpoilageConfig::default(),
            default_shelf_life_days: DEFAULT_SHELF_LIFE_DAYS,
            label_fallback_days: LABEL_FALLBACK_DAYS,
        }
    }
}

impl PipelineConfig {
    /// Accept the best available detection instead of reporting low confidence
    pub fn accept_best_available() -> Self {
        Self {
            retry: RetryConfig {
                low_confidence_policy: LowConfidencePolicy::AcceptBest,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// No wait between attempts, for replayed detector output
    pub fn without_backoff() -> Self {
        Self {
            retry: RetryConfig {
                backoff_ms: 0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Load configuration from a JSON file; missing fields take defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;

        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config: {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Write configuration as pretty JSON
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to: {:?}", path))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.retry.max_retries == 0 {
            anyhow::bail!("retry.max_retries must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.retry.acceptance_confidence) {
            anyhow::bail!(
                "retry.acceptance_confidence must be within [0, 1], got {}",
                self.retry.acceptance_confidence
            );
        }
        if self.allowed_classes.is_empty() {
            anyhow::bail!("allowed_classes must not be empty");
        }
        if self.default_shelf_life_days == 0 {
            anyhow::bail!("default_shelf_life_days must be at least 1");
        }
        if self.label_fallback_days == 0 {
            anyhow::bail!("label_fallback_days must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.acceptance_confidence, 0.5);
        assert_eq!(config.retry.backoff(), Duration::from_millis(500));
        assert_eq!(config.matching.similarity_threshold, 0.7);
        assert_eq!(config.matching.min_confidence, 0.3);
        assert_eq!(config.default_shelf_life_days, 7);
        assert_eq!(config.label_fallback_days, 30);
        assert!(config.allowed_classes.iter().any(|c| c == "hot dog"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        assert_eq!(
            PipelineConfig::accept_best_available().retry.low_confidence_policy,
            LowConfidencePolicy::AcceptBest
        );
        assert_eq!(PipelineConfig::without_backoff().retry.backoff(), Duration::ZERO);
    }

    #[test]
    fn test_zero_day_shelf_lives_rejected() {
        let mut config = PipelineConfig::default();
        config.label_fallback_days = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("label_fallback_days"));

        let mut config = PipelineConfig::default();
        config.default_shelf_life_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("pipeline.json");

        let mut config = PipelineConfig::accept_best_available();
        config.allowed_classes = vec!["banana".into()];
        config.to_file(&path)?;

        let loaded = PipelineConfig::from_file(&path)?;
        assert_eq!(loaded.allowed_classes, vec!["banana".to_string()]);
        assert_eq!(loaded.retry.low_confidence_policy, LowConfidencePolicy::AcceptBest);
        Ok(())
    }

    #[test]
    fn test_partial_file_uses_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "retry": { "max_retries": 2 } }"#)?;

        let loaded = PipelineConfig::from_file(&path)?;
        assert_eq!(loaded.retry.max_retries, 2);
        assert_eq!(loaded.retry.backoff_ms, 500);
        assert_eq!(loaded.label_fallback_days, 30);
        Ok(())
    }

    #[test]
    fn test_invalid_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "retry": { "max_retries": 0 } }"#)?;

        assert!(PipelineConfig::from_file(&path).is_err());
        assert!(PipelineConfig::from_file(dir.path().join("missing.json")).is_err());
        Ok(())
    }
}
