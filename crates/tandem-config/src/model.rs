// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Tandem matchmaking service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup. The matching, guard, and relay thresholds that
//! tune the engine all live here rather than as constants in the engine.

use serde::{Deserialize, Serialize};

/// Top-level Tandem configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TandemConfig {
    /// Service identity and operational settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Matching engine thresholds.
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Abuse/spam guard windows and limits.
    #[serde(default)]
    pub guards: GuardsConfig,

    /// Relay and message-mirror settings.
    #[serde(default)]
    pub relay: RelayConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// TCP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Service identity and operational configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name of the service.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// When true, non-moderator traffic receives a canned maintenance
    /// notice and is otherwise ignored.
    #[serde(default)]
    pub maintenance_mode: bool,

    /// Handles granted moderator commands (`ban`) and maintenance exemption.
    #[serde(default)]
    pub moderators: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
            maintenance_mode: false,
            moderators: Vec::new(),
        }
    }
}

fn default_service_name() -> String {
    "tandem".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Matching engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MatchingConfig {
    /// Number of same-desire narrow seekers above which a new seeker's
    /// search is broadened to "anyone".
    #[serde(default = "default_congestion_threshold")]
    pub congestion_threshold: u32,

    /// Maximum candidate attempts per search before reporting failure.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Cooldown after a session before re-entering the pool, in seconds.
    #[serde(default = "default_rematch_cooldown_secs")]
    pub rematch_cooldown_secs: u64,

    /// Retention window for the wait-time statistics log, in hours.
    #[serde(default = "default_stats_retention_hours")]
    pub stats_retention_hours: u64,

    /// Hard cap on retained statistics entries.
    #[serde(default = "default_stats_cap")]
    pub stats_cap: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            congestion_threshold: default_congestion_threshold(),
            max_attempts: default_max_attempts(),
            rematch_cooldown_secs: default_rematch_cooldown_secs(),
            stats_retention_hours: default_stats_retention_hours(),
            stats_cap: default_stats_cap(),
        }
    }
}

fn default_congestion_threshold() -> u32 {
    4
}

fn default_max_attempts() -> u32 {
    5
}

fn default_rematch_cooldown_secs() -> u64 {
    60
}

fn default_stats_retention_hours() -> u64 {
    24
}

fn default_stats_cap() -> usize {
    512
}

/// Abuse/spam guard configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GuardsConfig {
    /// Messages allowed within the burst window before throttling.
    #[serde(default = "default_burst_limit")]
    pub burst_limit: u32,

    /// Trailing burst window, in seconds.
    #[serde(default = "default_burst_window_secs")]
    pub burst_window_secs: u64,

    /// Capacity of the recent-sends ring.
    #[serde(default = "default_burst_ring_capacity")]
    pub burst_ring_capacity: usize,

    /// Lifetime sessions required before link-bearing messages are relayed.
    #[serde(default = "default_link_min_sessions")]
    pub link_min_sessions: i64,
}

impl Default for GuardsConfig {
    fn default() -> Self {
        Self {
            burst_limit: default_burst_limit(),
            burst_window_secs: default_burst_window_secs(),
            burst_ring_capacity: default_burst_ring_capacity(),
            link_min_sessions: default_link_min_sessions(),
        }
    }
}

fn default_burst_limit() -> u32 {
    6
}

fn default_burst_window_secs() -> u64 {
    30
}

fn default_burst_ring_capacity() -> usize {
    256
}

fn default_link_min_sessions() -> i64 {
    10
}

/// Relay and mirror configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    /// Bounded size of the cross-channel message mirror.
    #[serde(default = "default_mirror_capacity")]
    pub mirror_capacity: usize,

    /// Typing-indicator passthrough throttle, in seconds.
    #[serde(default = "default_typing_ttl_secs")]
    pub typing_ttl_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            mirror_capacity: default_mirror_capacity(),
            typing_ttl_secs: default_typing_ttl_secs(),
        }
    }
}

fn default_mirror_capacity() -> usize {
    2000
}

fn default_typing_ttl_secs() -> u64 {
    5
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Retry attempts for transient persistence failures.
    #[serde(default = "default_write_retries")]
    pub write_retries: u32,

    /// Linear backoff step between retries, in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            write_retries: default_write_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_database_path() -> String {
    "tandem.db".to_string()
}

fn default_write_retries() -> u32 {
    5
}

fn default_retry_backoff_ms() -> u64 {
    100
}

/// TCP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    7340
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_thresholds() {
        let config = TandemConfig::default();
        assert_eq!(config.matching.congestion_threshold, 4);
        assert_eq!(config.matching.max_attempts, 5);
        assert_eq!(config.matching.rematch_cooldown_secs, 60);
        assert_eq!(config.matching.stats_retention_hours, 24);
        assert_eq!(config.guards.burst_limit, 6);
        assert_eq!(config.guards.burst_window_secs, 30);
        assert_eq!(config.guards.link_min_sessions, 10);
        assert_eq!(config.relay.mirror_capacity, 2000);
        assert_eq!(config.relay.typing_ttl_secs, 5);
    }

    #[test]
    fn serializes_round_trip() {
        let config = TandemConfig::default();
        let toml = toml::to_string(&config).expect("should serialize");
        let parsed: TandemConfig = toml::from_str(&toml).expect("should deserialize");
        assert_eq!(parsed.service.name, "tandem");
        assert_eq!(parsed.gateway.port, 7340);
    }
}
