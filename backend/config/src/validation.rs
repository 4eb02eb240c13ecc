//! Config validation: field checks with user-friendly error messages.

use crate::schema::PlugboardConfig;
use std::collections::HashSet;
use thiserror::Error;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// A config validation error with field path and message.
#[derive(Debug, Clone, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// All errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &PlugboardConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_discovery(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_discovery(config: &PlugboardConfig, report: &mut ValidationReport) {
    let discovery = &config.discovery;

    if discovery.timeout_ms == Some(0) {
        report.error(
            "discovery.timeoutMs",
            "Timeout must be greater than zero; omit it to wait indefinitely",
        );
    }

    if let Some(name) = &discovery.manifest_file {
        if name.trim().is_empty() {
            report.error("discovery.manifestFile", "Manifest file name cannot be empty");
        } else if name.contains('/') || name.contains('\\') {
            report.error(
                "discovery.manifestFile",
                format!("Manifest file name must not contain a path separator: {name}"),
            );
        }
    }

    if discovery.roots.is_empty() {
        report.warn("discovery.roots", "No plugin roots configured; nothing will be discovered");
    }
    let mut seen = HashSet::new();
    for (i, root) in discovery.roots.iter().enumerate() {
        if !seen.insert(root) {
            report.warn(
                format!("discovery.roots[{i}]"),
                format!("Duplicate plugin root: {}", root.display()),
            );
        }
    }
}

fn validate_logging(config: &PlugboardConfig, report: &mut ValidationReport) {
    let Some(level) = &config.logging.level else { return };
    if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        report.error(
            "logging.level",
            format!("Unknown log level '{level}'; expected one of {}", LOG_LEVELS.join(", ")),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> PlugboardConfig {
        let mut config = PlugboardConfig::default();
        config.discovery.roots = vec!["/opt/plugins".into()];
        config
    }

    #[test]
    fn default_with_roots_is_clean() {
        let report = validate(&base());
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn zero_timeout_is_an_error() {
        let mut config = base();
        config.discovery.timeout_ms = Some(0);
        let report = validate(&config);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, "discovery.timeoutMs");
        assert!(report.errors[0].to_string().contains("discovery.timeoutMs"));
    }

    #[test]
    fn manifest_name_must_be_a_plain_file_name() {
        let mut config = base();
        config.discovery.manifest_file = Some("meta/plugboard.json".into());
        assert!(!validate(&config).is_valid());

        config.discovery.manifest_file = Some("  ".into());
        assert!(!validate(&config).is_valid());
    }

    #[test]
    fn unknown_log_level_is_an_error() {
        let mut config = base();
        config.logging.level = Some("loud".into());
        let report = validate(&config);
        assert_eq!(report.errors[0].path, "logging.level");

        config.logging.level = Some("DEBUG".into());
        assert!(validate(&config).is_valid());
    }

    #[test]
    fn duplicate_roots_warn() {
        let mut config = base();
        config.discovery.roots.push("/opt/plugins".into());
        let report = validate(&config);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].path, "discovery.roots[1]");
    }
}
