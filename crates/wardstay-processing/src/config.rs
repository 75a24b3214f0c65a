//! Configuration types for the processing engine.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic setup.

use serde::{Deserialize, Serialize};

/// Configuration for normalization and sentiment scoring.
///
/// Use [`ProcessConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use wardstay_processing::config::ProcessConfig;
///
/// let config = ProcessConfig::builder()
///     .sparsity_threshold(0.1)
///     .positive_threshold(0.05)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessConfig {
    /// Minimum share of non-null values a column must have to survive
    /// normalization (0.0 - 1.0). Columns below this threshold are dropped
    /// from the whole table before entity splitting.
    /// Default: 0.1 (10%)
    pub sparsity_threshold: f64,

    /// Compound score at or above which a document is labeled positive.
    /// Default: 0.05
    pub positive_threshold: f64,

    /// Compound score at or below which a document is labeled negative.
    /// Default: -0.05
    pub negative_threshold: f64,

    /// Tokens of this length or shorter are dropped during text cleaning.
    /// Default: 2
    pub min_token_len: usize,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            sparsity_threshold: 0.1,
            positive_threshold: 0.05,
            negative_threshold: -0.05,
            min_token_len: 2,
        }
    }
}

impl ProcessConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ProcessConfigBuilder {
        ProcessConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.sparsity_threshold) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "sparsity_threshold".to_string(),
                value: self.sparsity_threshold,
            });
        }

        if self.positive_threshold < 0.0 || self.positive_threshold > 1.0 {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "positive_threshold".to_string(),
                value: self.positive_threshold,
            });
        }

        if self.negative_threshold > 0.0 || self.negative_threshold < -1.0 {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "negative_threshold".to_string(),
                value: self.negative_threshold,
            });
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value}")]
    InvalidThreshold { field: String, value: f64 },
}

/// Builder for [`ProcessConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ProcessConfigBuilder {
    sparsity_threshold: Option<f64>,
    positive_threshold: Option<f64>,
    negative_threshold: Option<f64>,
    min_token_len: Option<usize>,
}

impl ProcessConfigBuilder {
    /// Set the column sparsity threshold.
    ///
    /// Columns with a lower share of non-null values than this threshold
    /// are dropped from the table before entity splitting.
    ///
    /// # Arguments
    /// * `threshold` - Value between 0.0 and 1.0 (e.g., 0.1 = 10%)
    pub fn sparsity_threshold(mut self, threshold: f64) -> Self {
        self.sparsity_threshold = Some(threshold);
        self
    }

    /// Set the positive sentiment threshold.
    pub fn positive_threshold(mut self, threshold: f64) -> Self {
        self.positive_threshold = Some(threshold);
        self
    }

    /// Set the negative sentiment threshold.
    pub fn negative_threshold(mut self, threshold: f64) -> Self {
        self.negative_threshold = Some(threshold);
        self
    }

    /// Set the minimum surviving token length for text cleaning.
    pub fn min_token_len(mut self, len: usize) -> Self {
        self.min_token_len = Some(len);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `ProcessConfig` or an error if validation fails.
    pub fn build(self) -> Result<ProcessConfig, ConfigValidationError> {
        let config = ProcessConfig {
            sparsity_threshold: self.sparsity_threshold.unwrap_or(0.1),
            positive_threshold: self.positive_threshold.unwrap_or(0.05),
            negative_threshold: self.negative_threshold.unwrap_or(-0.05),
            min_token_len: self.min_token_len.unwrap_or(2),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProcessConfig::default();
        assert_eq!(config.sparsity_threshold, 0.1);
        assert_eq!(config.positive_threshold, 0.05);
        assert_eq!(config.negative_threshold, -0.05);
        assert_eq!(config.min_token_len, 2);
    }

    #[test]
    fn test_builder_defaults() {
        let config = ProcessConfig::builder().build().unwrap();
        assert_eq!(config.sparsity_threshold, 0.1);
    }

    #[test]
    fn test_builder_custom_values() {
        let config = ProcessConfig::builder()
            .sparsity_threshold(0.25)
            .positive_threshold(0.1)
            .negative_threshold(-0.1)
            .min_token_len(3)
            .build()
            .unwrap();

        assert_eq!(config.sparsity_threshold, 0.25);
        assert_eq!(config.positive_threshold, 0.1);
        assert_eq!(config.negative_threshold, -0.1);
        assert_eq!(config.min_token_len, 3);
    }

    #[test]
    fn test_validation_invalid_sparsity() {
        let result = ProcessConfig::builder().sparsity_threshold(1.5).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidThreshold { .. }
        ));
    }

    #[test]
    fn test_validation_positive_negative_threshold() {
        let result = ProcessConfig::builder().negative_threshold(0.2).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = ProcessConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: ProcessConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.sparsity_threshold, deserialized.sparsity_threshold);
    }
}
