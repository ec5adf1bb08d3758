// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-zero bounds and a valid bind address. Collects
//! all errors rather than failing fast.

use crate::diagnostic::ConfigError;
use crate::model::TandemConfig;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &TandemConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let require_nonzero = |errors: &mut Vec<ConfigError>, value: u64, key: &str| {
        if value == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be greater than zero"),
            });
        }
    };

    require_nonzero(&mut errors, config.matching.max_attempts as u64, "matching.max_attempts");
    require_nonzero(
        &mut errors,
        config.matching.stats_cap as u64,
        "matching.stats_cap",
    );
    require_nonzero(
        &mut errors,
        config.matching.stats_retention_hours,
        "matching.stats_retention_hours",
    );
    require_nonzero(&mut errors, config.guards.burst_limit as u64, "guards.burst_limit");
    require_nonzero(
        &mut errors,
        config.guards.burst_ring_capacity as u64,
        "guards.burst_ring_capacity",
    );
    require_nonzero(
        &mut errors,
        config.relay.mirror_capacity as u64,
        "relay.mirror_capacity",
    );

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("gateway.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.service.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "service.log_level `{}` is not one of: {}",
                config.service.log_level,
                valid_levels.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&TandemConfig::default()).is_ok());
    }

    #[test]
    fn zero_thresholds_are_rejected() {
        let mut config = TandemConfig::default();
        config.matching.max_attempts = 0;
        config.relay.mirror_capacity = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let mut config = TandemConfig::default();
        config.service.log_level = "verbose".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("log_level"));
    }

    #[test]
    fn bad_host_is_rejected() {
        let mut config = TandemConfig::default();
        config.gateway.host = "not a host!".into();
        assert!(validate_config(&config).is_err());
    }
}
