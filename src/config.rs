//! Configuration for the synergy scorer and the combo matcher.
//!
//! All configuration is plain data: build it with `Default` and the `with_*`
//! builders, or deserialize it from JSON. Missing JSON fields take their
//! default values.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::corpus::DEFAULT_PAGE_SIZE;
use crate::error::{GlaiveError, Result};

/// Smallest accepted `max_results` for a synergy request.
pub const MIN_SYNERGY_RESULTS: usize = 1;

/// Largest accepted `max_results` for a synergy request.
pub const MAX_SYNERGY_RESULTS: usize = 100;

/// Configuration for [`SynergyScorer`](crate::synergy::scorer::SynergyScorer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Cards requested from the corpus per planned search.
    pub page_size: usize,

    /// Maximum number of corpus searches in flight for one request.
    pub max_concurrent_searches: usize,

    /// Multiplier applied to cards that merely share a creature type with the
    /// source card.
    pub fellow_tribal_multiplier: f32,

    /// Weight of the color identity overlap bonus.
    pub color_bonus_weight: f32,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_concurrent_searches: num_cpus::get() * 2,
            fellow_tribal_multiplier: 0.9,
            color_bonus_weight: 0.1,
        }
    }
}

impl ScorerConfig {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_max_concurrent_searches(mut self, max: usize) -> Self {
        self.max_concurrent_searches = max;
        self
    }

    pub fn with_fellow_tribal_multiplier(mut self, multiplier: f32) -> Self {
        self.fellow_tribal_multiplier = multiplier;
        self
    }

    pub fn with_color_bonus_weight(mut self, weight: f32) -> Self {
        self.color_bonus_weight = weight;
        self
    }

    /// Check that the values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(GlaiveError::config("page_size must be at least 1"));
        }
        if self.max_concurrent_searches == 0 {
            return Err(GlaiveError::config(
                "max_concurrent_searches must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.fellow_tribal_multiplier) {
            return Err(GlaiveError::config(
                "fellow_tribal_multiplier must be within [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.color_bonus_weight) {
            return Err(GlaiveError::config(
                "color_bonus_weight must be within [0, 1]",
            ));
        }
        Ok(())
    }
}

/// Defaults used by callers of [`ComboMatcher`](crate::combo::matcher::ComboMatcher)
/// that do not pass explicit limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboMatcherConfig {
    /// Maximum number of combos returned per query.
    pub default_limit: usize,

    /// Largest number of absent cards for a potential combo.
    pub default_max_missing: usize,

    /// Smallest number of present cards for a potential combo.
    pub default_min_present: usize,
}

impl Default for ComboMatcherConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            default_max_missing: 1,
            default_min_present: 1,
        }
    }
}

impl ComboMatcherConfig {
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn with_default_max_missing(mut self, max_missing: usize) -> Self {
        self.default_max_missing = max_missing;
        self
    }

    pub fn with_default_min_present(mut self, min_present: usize) -> Self {
        self.default_min_present = min_present;
        self
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlaiveConfig {
    pub scorer: ScorerConfig,
    pub combos: ComboMatcherConfig,
}

impl GlaiveConfig {
    /// Parse configuration from JSON and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: GlaiveConfig = serde_json::from_str(json)
            .map_err(|e| GlaiveError::config(format!("Failed to parse configuration: {e}")))?;
        config.scorer.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GlaiveConfig::default();
        assert_eq!(config.scorer.page_size, DEFAULT_PAGE_SIZE);
        assert!(config.scorer.max_concurrent_searches > 0);
        assert_eq!(config.scorer.fellow_tribal_multiplier, 0.9);
        assert_eq!(config.scorer.color_bonus_weight, 0.1);
        assert_eq!(config.combos.default_limit, 50);
        assert!(config.scorer.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let scorer = ScorerConfig::default()
            .with_page_size(5)
            .with_max_concurrent_searches(1)
            .with_fellow_tribal_multiplier(0.5)
            .with_color_bonus_weight(0.0);
        assert_eq!(scorer.page_size, 5);
        assert_eq!(scorer.max_concurrent_searches, 1);
        assert_eq!(scorer.fellow_tribal_multiplier, 0.5);
        assert_eq!(scorer.color_bonus_weight, 0.0);

        let combos = ComboMatcherConfig::default()
            .with_default_limit(10)
            .with_default_max_missing(2)
            .with_default_min_present(2);
        assert_eq!(combos.default_limit, 10);
        assert_eq!(combos.default_max_missing, 2);
        assert_eq!(combos.default_min_present, 2);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = GlaiveConfig::from_json_str(r#"{"scorer": {"page_size": 7}}"#).unwrap();
        assert_eq!(config.scorer.page_size, 7);
        assert_eq!(config.scorer.fellow_tribal_multiplier, 0.9);
        assert_eq!(config.combos, ComboMatcherConfig::default());
    }

    #[test]
    fn test_invalid_json_config() {
        let err = GlaiveConfig::from_json_str(r#"{"scorer": {"page_size": 0}}"#).unwrap_err();
        assert!(matches!(err, GlaiveError::Config(_)));

        let err = GlaiveConfig::from_json_str("[1, 2").unwrap_err();
        assert!(matches!(err, GlaiveError::Config(_)));
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"combos": {{"default_max_missing": 3}}}}"#).unwrap();
        file.flush().unwrap();

        let config = GlaiveConfig::from_file(file.path()).unwrap();
        assert_eq!(config.combos.default_max_missing, 3);
    }
}
