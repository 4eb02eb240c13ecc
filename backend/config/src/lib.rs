//! `plugboard-config`: configuration for the plugboard resolver.
//!
//! Provides:
//! - Typed config schema (discovery roots, timeout, cache, logging)
//! - YAML read/write with atomic replace
//! - `${ENV_VAR}` substitution
//! - Default value application
//! - Validation with errors and warnings

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, write_config};
pub use schema::{CacheConfig, DiscoveryConfig, LoggingConfig, PlugboardConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;

/// A validated config plus the warnings validation raised for it.
#[derive(Debug, Clone)]
pub struct PreparedConfig {
    pub config: PlugboardConfig,
    pub warnings: Vec<ConfigValidationError>,
}

/// Load, substitute env vars, apply defaults, and validate a config file.
///
/// This is the main entry point for loading a config at runtime. Relative
/// plugin roots are resolved against the directory holding the file.
/// Validation errors fail the load; warnings are handed back to the caller,
/// which usually has no logger installed yet.
pub async fn load_and_prepare(path: &Path) -> Result<PreparedConfig> {
    let raw_config = load_config(path).await?;

    let value: Value = serde_json::to_value(&raw_config)
        .context("Failed to serialize config for processing")?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;
    let config: PlugboardConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let config = apply_all_defaults(config, base_dir);

    let ValidationReport { errors, warnings } = validate(&config);
    if !errors.is_empty() {
        let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
        bail!(
            "Config at {} has {} error(s): {}",
            path.display(),
            errors.len(),
            details.join("; ")
        );
    }

    Ok(PreparedConfig { config, warnings })
}
