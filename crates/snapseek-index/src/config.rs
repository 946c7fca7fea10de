//! Index manager configuration.
//!
//! Plain serde-deserializable structs with defaults; reading a config
//! file or environment is the composing process's job.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Search result count limits.
///
/// A requested limit outside `[min, max]` (or no limit at all) falls
/// back to `default` rather than clamping to the nearer bound.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResultLimits {
    /// Smallest accepted result count
    #[serde(default = "default_min_results")]
    pub min: usize,

    /// Largest accepted result count
    #[serde(default = "default_max_results")]
    pub max: usize,

    /// Used when the request carries no usable limit
    #[serde(default = "default_default_results")]
    pub default: usize,
}

fn default_min_results() -> usize {
    3
}

fn default_max_results() -> usize {
    48
}

fn default_default_results() -> usize {
    12
}

impl Default for ResultLimits {
    fn default() -> Self {
        Self {
            min: default_min_results(),
            max: default_max_results(),
            default: default_default_results(),
        }
    }
}

impl ResultLimits {
    /// Resolve a requested limit against the configured bounds.
    pub fn resolve(&self, requested: Option<usize>) -> usize {
        match requested {
            Some(limit) if limit >= self.min && limit <= self.max => limit,
            _ => self.default,
        }
    }
}

/// Index manager configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Name of the sidecar directory created inside each indexed folder
    #[serde(default = "default_sidecar_dir")]
    pub sidecar_dir: String,

    /// Number of files embedded per provider batch. Bounds peak memory
    /// and provider call overhead only; correctness does not depend on
    /// the batch boundaries.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Search result count limits
    #[serde(default)]
    pub limits: ResultLimits,

    /// Maximum comment length in characters
    #[serde(default = "default_max_comment_len")]
    pub max_comment_len: usize,

    /// When set, folders outside this root are rejected as invalid
    #[serde(default)]
    pub allowed_root: Option<PathBuf>,
}

fn default_sidecar_dir() -> String {
    ".snapseek".to_string()
}

fn default_batch_size() -> usize {
    32
}

fn default_max_comment_len() -> usize {
    100
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            sidecar_dir: default_sidecar_dir(),
            batch_size: default_batch_size(),
            limits: ResultLimits::default(),
            max_comment_len: default_max_comment_len(),
            allowed_root: None,
        }
    }
}

impl IndexConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.sidecar_dir.is_empty() || self.sidecar_dir.contains(std::path::MAIN_SEPARATOR) {
            return Err(format!(
                "sidecar_dir must be a plain directory name, got {:?}",
                self.sidecar_dir
            ));
        }
        if self.batch_size == 0 {
            return Err("batch_size must be > 0".to_string());
        }
        if self.limits.min > self.limits.max {
            return Err(format!(
                "result limits min {} > max {}",
                self.limits.min, self.limits.max
            ));
        }
        if self.limits.default < self.limits.min || self.limits.default > self.limits.max {
            return Err(format!(
                "default result limit {} outside [{}, {}]",
                self.limits.default, self.limits.min, self.limits.max
            ));
        }
        if self.max_comment_len == 0 {
            return Err("max_comment_len must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IndexConfig::default();
        assert_eq!(config.sidecar_dir, ".snapseek");
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.limits.min, 3);
        assert_eq!(config.limits.max, 48);
        assert_eq!(config.limits.default, 12);
        assert_eq!(config.max_comment_len, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_limit() {
        let limits = ResultLimits::default();
        assert_eq!(limits.resolve(None), 12);
        assert_eq!(limits.resolve(Some(10)), 10);
        assert_eq!(limits.resolve(Some(3)), 3);
        assert_eq!(limits.resolve(Some(48)), 48);
        // Out of range falls back to the default, not the nearer bound
        assert_eq!(limits.resolve(Some(2)), 12);
        assert_eq!(limits.resolve(Some(49)), 12);
        assert_eq!(limits.resolve(Some(0)), 12);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = IndexConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.batch_size = 32;
        config.limits.default = 100;
        assert!(config.validate().is_err());

        config.limits = ResultLimits::default();
        config.sidecar_dir = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: IndexConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.limits.default, 12);

        let config: IndexConfig =
            serde_json::from_str("{\"batch_size\": 8, \"limits\": {\"max\": 20}}").unwrap();
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.limits.max, 20);
        assert_eq!(config.limits.min, 3);
    }
}
