//! Built-in demo plugins.
//!
//! `foo` defines the `foo.Base` interface and ships `foo:Bar` as its fallback
//! implementation; `other` overrides it with `other:Bar`. With both installed,
//! resolving `foo.Base` picks the override.

use std::path::Path;

use anyhow::{Context, Result};
use plugboard_core::Interface;
use plugboard_plugins::{ModuleRegistry, MANIFEST_FILE_NAME};
use tokio::fs;
use tracing::info;

pub trait Base: Send + Sync {
    fn describe(&self) -> String;
}

pub type BasePlugin = Box<dyn Base>;

struct FooBar;

impl Base for FooBar {
    fn describe(&self) -> String {
        "built-in Bar from foo".to_string()
    }
}

struct OtherBar;

impl Base for OtherBar {
    fn describe(&self) -> String {
        "override Bar from other".to_string()
    }
}

/// The `foo.Base` interface: any value that is a [`BasePlugin`].
pub fn interface() -> Interface {
    Interface::of_type::<BasePlugin>("foo", "Base")
}

/// Loader exporting the demo namespaces `foo` and `other`.
pub fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry
        .register("foo", "Bar", || Ok(Box::new(FooBar) as BasePlugin))
        .register("other", "Bar", || Ok(Box::new(OtherBar) as BasePlugin));
    registry
}

const DEMO_MANIFESTS: &[(&str, &str)] = &[
    (
        "foo",
        r#"{
  "package": "foo",
  "version": "0.1.0",
  "entryPoints": { "foo": [{ "name": "Base", "target": "foo:Bar" }] }
}
"#,
    ),
    (
        "other",
        r#"{
  "package": "other",
  "version": "0.1.0",
  "entryPoints": { "foo": [{ "name": "Base", "target": "other:Bar" }] }
}
"#,
    ),
];

/// Write the `foo` and `other` component manifests under `root`.
pub async fn install(root: &Path) -> Result<()> {
    for (package, manifest) in DEMO_MANIFESTS {
        let dir = root.join(package);
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = dir.join(MANIFEST_FILE_NAME);
        fs::write(&path, manifest)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Installed demo manifest");
    }
    Ok(())
}
