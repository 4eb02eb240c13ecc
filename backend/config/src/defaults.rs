//! Config defaults: applies default values to a parsed config.

use std::path::{Path, PathBuf};

use crate::schema::PlugboardConfig;

/// Default manifest file name inside a component directory.
pub const DEFAULT_MANIFEST_FILE: &str = "plugboard.json";

/// Default plugin root, relative to the config directory.
pub const DEFAULT_PLUGINS_SUBDIR: &str = "plugins";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
///
/// `base_dir` is the directory the config was loaded from. The default root
/// lives under it and relative roots are resolved against it, after a leading
/// `~` has been expanded to the home directory.
pub fn apply_all_defaults(config: PlugboardConfig, base_dir: &Path) -> PlugboardConfig {
    let config = apply_discovery_defaults(config, base_dir);
    let config = apply_cache_defaults(config);
    apply_logging_defaults(config)
}

/// Ensure at least one plugin root, absolute roots, manifest name and parallelism.
fn apply_discovery_defaults(mut config: PlugboardConfig, base_dir: &Path) -> PlugboardConfig {
    let discovery = &mut config.discovery;
    if discovery.roots.is_empty() {
        discovery.roots.push(base_dir.join(DEFAULT_PLUGINS_SUBDIR));
    }
    for root in &mut discovery.roots {
        *root = expand_home(root);
        if root.is_relative() {
            *root = base_dir.join(&*root);
        }
    }
    if discovery.manifest_file.is_none() {
        discovery.manifest_file = Some(DEFAULT_MANIFEST_FILE.to_string());
    }
    if discovery.parallel.is_none() {
        discovery.parallel = Some(true);
    }
    config
}

/// Replace a leading `~` with the home directory. Left as is when there is
/// no home directory.
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

fn apply_cache_defaults(mut config: PlugboardConfig) -> PlugboardConfig {
    if config.cache.enabled.is_none() {
        config.cache.enabled = Some(true);
    }
    config
}

fn apply_logging_defaults(mut config: PlugboardConfig) -> PlugboardConfig {
    if config.logging.level.is_none() {
        config.logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    if config.logging.json.is_none() {
        config.logging.json = Some(false);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_missing_values() {
        let config = apply_all_defaults(PlugboardConfig::default(), Path::new("/etc/plugboard"));
        assert_eq!(config.discovery.roots, [PathBuf::from("/etc/plugboard/plugins")]);
        assert_eq!(config.discovery.manifest_file.as_deref(), Some(DEFAULT_MANIFEST_FILE));
        assert_eq!(config.discovery.parallel, Some(true));
        assert_eq!(config.cache.enabled, Some(true));
        assert_eq!(config.logging.level.as_deref(), Some("info"));
        assert!(config.discovery.timeout_ms.is_none());
    }

    #[test]
    fn keeps_explicit_values_and_absolutizes_roots() {
        let mut config = PlugboardConfig::default();
        config.discovery.roots = vec!["vendor".into(), "/abs".into()];
        config.cache.enabled = Some(false);
        config.logging.level = Some("warn".into());

        let config = apply_all_defaults(config, Path::new("/srv/app"));
        assert_eq!(
            config.discovery.roots,
            [PathBuf::from("/srv/app/vendor"), PathBuf::from("/abs")]
        );
        assert_eq!(config.cache.enabled, Some(false));
        assert_eq!(config.logging.level.as_deref(), Some("warn"));
    }

    #[test]
    fn expands_home_in_roots() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let mut config = PlugboardConfig::default();
        config.discovery.roots = vec!["~/.plugboard/plugins".into(), "~".into(), "~other/x".into()];

        let config = apply_all_defaults(config, Path::new("/srv/app"));
        assert_eq!(
            config.discovery.roots,
            [
                home.join(".plugboard/plugins"),
                home,
                PathBuf::from("/srv/app/~other/x"),
            ]
        );
    }
}
