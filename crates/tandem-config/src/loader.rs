// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./tandem.toml` > `~/.config/tandem/tandem.toml` >
//! `/etc/tandem/tandem.toml`, with environment variable overrides via the
//! `TANDEM_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::TandemConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tandem/tandem.toml` (system-wide)
/// 3. `~/.config/tandem/tandem.toml` (user XDG config)
/// 4. `./tandem.toml` (local directory)
/// 5. `TANDEM_*` environment variables
pub fn load_config() -> Result<TandemConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TandemConfig::default()))
        .merge(Toml::file("/etc/tandem/tandem.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("tandem/tandem.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("tandem.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<TandemConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TandemConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TandemConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TandemConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `TANDEM_STORAGE_DATABASE_PATH` must map
/// to `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("TANDEM_").map(|key| {
        // The key arrives in its original (uppercase) environment form;
        // figment lowercases only after mapping.
        let key_str = key.as_str().to_ascii_lowercase();
        let mapped = key_str
            .replacen("service_", "service.", 1)
            .replacen("matching_", "matching.", 1)
            .replacen("guards_", "guards.", 1)
            .replacen("relay_", "relay.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("gateway_", "gateway.", 1);
        mapped.into()
    })
}
