//! Validator configuration

use crate::{CausewayError, CausewayResult, ConfigError};
use serde::{Deserialize, Serialize};

/// Default maximum node count.
pub const NODE_LIMIT: usize = 50;
/// Default maximum edge count.
pub const EDGE_LIMIT: usize = 200;
/// Default minimum option count.
pub const MIN_OPTIONS: usize = 2;
/// Default maximum option count.
pub const MAX_OPTIONS: usize = 6;
/// Shortest id stem a fuzzy constraint match will consider.
pub const MIN_FUZZY_STEM_LENGTH: usize = 4;

/// Limits applied by Tier 1 of the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub node_limit: usize,
    pub edge_limit: usize,
    pub min_options: usize,
    pub max_options: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            node_limit: NODE_LIMIT,
            edge_limit: EDGE_LIMIT,
            min_options: MIN_OPTIONS,
            max_options: MAX_OPTIONS,
        }
    }
}

impl ValidatorConfig {
    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `CAUSEWAY_NODE_LIMIT` (default: 50)
    /// - `CAUSEWAY_EDGE_LIMIT` (default: 200)
    /// - `CAUSEWAY_MIN_OPTIONS` (default: 2)
    /// - `CAUSEWAY_MAX_OPTIONS` (default: 6)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let read = |name: &str, fallback: usize| {
            std::env::var(name)
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(fallback)
        };

        Self {
            node_limit: read("CAUSEWAY_NODE_LIMIT", defaults.node_limit),
            edge_limit: read("CAUSEWAY_EDGE_LIMIT", defaults.edge_limit),
            min_options: read("CAUSEWAY_MIN_OPTIONS", defaults.min_options),
            max_options: read("CAUSEWAY_MAX_OPTIONS", defaults.max_options),
        }
    }

    /// Parse a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(source: &str) -> CausewayResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::ParseFailed {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - node_limit > 0 and edge_limit > 0
    /// - min_options > 0
    /// - min_options <= max_options
    pub fn validate(&self) -> CausewayResult<()> {
        for (field, value) in [("node_limit", self.node_limit), ("edge_limit", self.edge_limit)] {
            if value == 0 {
                return Err(CausewayError::Config(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.to_string(),
                    reason: format!("{} must be greater than 0", field),
                }));
            }
        }

        if self.min_options == 0 {
            return Err(CausewayError::Config(ConfigError::InvalidValue {
                field: "min_options".to_string(),
                value: self.min_options.to_string(),
                reason: "min_options must be greater than 0".to_string(),
            }));
        }

        if self.min_options > self.max_options {
            return Err(CausewayError::Config(ConfigError::IncompatibleOptions {
                option_a: format!("min_options={}", self.min_options),
                option_b: format!("max_options={}", self.max_options),
            }));
        }

        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = ValidatorConfig::default();
        assert_eq!(config.node_limit, 50);
        assert_eq!(config.edge_limit, 200);
        assert_eq!(config.min_options, 2);
        assert_eq!(config.max_options, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_limit_rejected() {
        let config = ValidatorConfig {
            edge_limit: 0,
            ..ValidatorConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("edge_limit"));
    }

    #[test]
    fn test_inverted_option_bounds_rejected() {
        let config = ValidatorConfig {
            min_options: 5,
            max_options: 3,
            ..ValidatorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CausewayError::Config(ConfigError::IncompatibleOptions { .. }))
        ));
    }

    #[test]
    fn test_from_toml_partial() {
        let config = ValidatorConfig::from_toml_str("node_limit = 80\n").unwrap();
        assert_eq!(config.node_limit, 80);
        assert_eq!(config.edge_limit, EDGE_LIMIT);
    }

    #[test]
    fn test_from_toml_invalid() {
        assert!(ValidatorConfig::from_toml_str("node_limit = \"many\"").is_err());
        assert!(ValidatorConfig::from_toml_str("max_options = 1").is_err());
    }
}
