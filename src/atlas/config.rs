//! Tuning parameters for the KeyFrame database.
//!
//! The defaults are the ORB-SLAM values and reproduce its candidate
//! selection exactly. They can be overridden from a YAML settings file:
//!
//! ```yaml
//! min_common_words_ratio: 0.8
//! min_retain_ratio: 0.75
//! covisibility_neighbors: 10
//! ```

use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Configuration for place-recognition candidate retrieval.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyFrameDatabaseConfig {
    /// Fraction of the best shared-word count a keyframe must exceed
    /// (after truncation to an integer) to be scored at all.
    pub min_common_words_ratio: f64,

    /// Fraction of the best accumulated covisibility score a group must
    /// exceed to be returned.
    pub min_retain_ratio: f64,

    /// Number of best covisible neighbours used to accumulate a group score.
    pub covisibility_neighbors: usize,
}

impl Default for KeyFrameDatabaseConfig {
    fn default() -> Self {
        Self {
            min_common_words_ratio: 0.8,
            min_retain_ratio: 0.75,
            covisibility_neighbors: 10,
        }
    }
}

impl KeyFrameDatabaseConfig {
    /// Load a configuration from a YAML file. Missing keys keep their defaults.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open database config {}", path.display()))?;
        let config: Self = serde_yaml::from_reader(file)
            .with_context(|| format!("Failed to parse database config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).context("Failed to parse database config")?;
        config.validate()?;
        Ok(config)
    }

    /// Check that both ratios are in `(0, 1)` and the neighbour cap is non-zero.
    ///
    /// Both ratios gate with a strict `>` against the best value, so a ratio
    /// of 1 would reject every keyframe.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_common_words_ratio > 0.0 && self.min_common_words_ratio < 1.0) {
            bail!(
                "min_common_words_ratio must be in (0, 1), got {}",
                self.min_common_words_ratio
            );
        }
        if !(self.min_retain_ratio > 0.0 && self.min_retain_ratio < 1.0) {
            bail!(
                "min_retain_ratio must be in (0, 1), got {}",
                self.min_retain_ratio
            );
        }
        if self.covisibility_neighbors == 0 {
            bail!("covisibility_neighbors must be at least 1");
        }
        Ok(())
    }

    /// Shared-word threshold for a query whose best candidate shares
    /// `max_common_words` words. Truncates toward zero.
    pub fn min_common_words(&self, max_common_words: usize) -> usize {
        (max_common_words as f64 * self.min_common_words_ratio) as usize
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = KeyFrameDatabaseConfig::default();
        assert_eq!(config.min_common_words_ratio, 0.8);
        assert_eq!(config.min_retain_ratio, 0.75);
        assert_eq!(config.covisibility_neighbors, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_min_common_words_truncates() {
        let config = KeyFrameDatabaseConfig::default();
        assert_eq!(config.min_common_words(0), 0);
        assert_eq!(config.min_common_words(1), 0); // 0.8
        assert_eq!(config.min_common_words(2), 1); // 1.6
        assert_eq!(config.min_common_words(4), 3); // 3.2
        assert_eq!(config.min_common_words(5), 4);
        assert_eq!(config.min_common_words(9), 7); // 7.2
        assert_eq!(config.min_common_words(10), 8);
        assert_eq!(config.min_common_words(15), 12);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = KeyFrameDatabaseConfig::from_yaml_str("covisibility_neighbors: 5\n").unwrap();
        assert_eq!(config.covisibility_neighbors, 5);
        assert_eq!(config.min_common_words_ratio, 0.8);
        assert_eq!(config.min_retain_ratio, 0.75);
    }

    #[test]
    fn test_invalid_yaml_values_rejected() {
        assert!(KeyFrameDatabaseConfig::from_yaml_str("min_retain_ratio: 1.5\n").is_err());
        assert!(KeyFrameDatabaseConfig::from_yaml_str("min_common_words_ratio: 0.0\n").is_err());
        assert!(KeyFrameDatabaseConfig::from_yaml_str("min_common_words_ratio: 1.0\n").is_err());
        assert!(KeyFrameDatabaseConfig::from_yaml_str("min_retain_ratio: 1.0\n").is_err());
        assert!(KeyFrameDatabaseConfig::from_yaml_str("min_retain_ratio: .nan\n").is_err());
        assert!(KeyFrameDatabaseConfig::from_yaml_str("covisibility_neighbors: 0\n").is_err());
        assert!(KeyFrameDatabaseConfig::from_yaml_str("unknown_key: 3\n").is_err());
    }

    #[test]
    fn test_from_yaml_file() {
        let path = std::env::temp_dir().join(format!(
            "kfdb_config_{}_{:?}.yaml",
            std::process::id(),
            std::thread::current().id()
        ));
        {
            let mut file = File::create(&path).unwrap();
            writeln!(file, "min_common_words_ratio: 0.7").unwrap();
            writeln!(file, "min_retain_ratio: 0.5").unwrap();
        }

        let config = KeyFrameDatabaseConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.min_common_words_ratio, 0.7);
        assert_eq!(config.min_retain_ratio, 0.5);
        assert_eq!(config.covisibility_neighbors, 10);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = KeyFrameDatabaseConfig::from_yaml_file("/nonexistent/kfdb.yaml").unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/kfdb.yaml"));
    }
}
