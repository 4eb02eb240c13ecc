use std::path::{Path, PathBuf};

use anyhow::Result;
use plugboard_config::{
    config_dir, config_file_path, load_and_prepare, ConfigValidationError, PlugboardConfig,
    PreparedConfig,
};

/// A prepared config together with the file it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub path: PathBuf,
    pub config: PlugboardConfig,
    /// Validation warnings, to be shown once output is set up.
    pub warnings: Vec<ConfigValidationError>,
}

/// Config file to use: the `--config` flag, else `config.yaml` in the config dir.
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config_file_path(&config_dir()))
}

/// Load, substitute, default and validate the config.
pub async fn load(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let path = resolve_path(explicit);
    let PreparedConfig { config, warnings } = load_and_prepare(&path).await?;
    Ok(LoadedConfig {
        path,
        config,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_falls_back_to_defaults_next_to_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let loaded = load(Some(path.as_path())).await.unwrap();
        assert_eq!(loaded.path, path);
        assert_eq!(loaded.config.discovery.roots, [dir.path().join("plugins")]);
        assert!(loaded.config.cache.is_enabled());
    }

    #[tokio::test]
    async fn duplicate_roots_come_back_as_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        tokio::fs::write(&path, "discovery:\n  roots: [plugins, plugins]\n")
            .await
            .unwrap();

        let loaded = load(Some(path.as_path())).await.unwrap();
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].message.contains("Duplicate plugin root"));
    }
}
