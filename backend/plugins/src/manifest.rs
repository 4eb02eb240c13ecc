//! Component manifest: the `plugboard.json` an installed component ships.
//!
//! ```json
//! {
//!   "package": "foo",
//!   "version": "0.1.0",
//!   "entryPoints": { "foo": [{ "name": "Base", "target": "foo:Bar" }] }
//! }
//! ```

use anyhow::{Context, Result, bail};
use std::collections::HashSet;
use std::path::Path;

use plugboard_core::ComponentMetadata;

/// Default manifest file name inside a component directory.
pub const MANIFEST_FILE_NAME: &str = "plugboard.json";

/// Read and validate a manifest file.
pub fn read_manifest(path: &Path) -> Result<ComponentMetadata> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read manifest at {:?}", path))?;
    parse_manifest(&raw).with_context(|| format!("invalid manifest at {:?}", path))
}

/// Parse and validate manifest JSON.
pub fn parse_manifest(raw: &str) -> Result<ComponentMetadata> {
    let metadata: ComponentMetadata =
        serde_json::from_str(raw).context("parse component manifest")?;
    validate(&metadata)?;
    Ok(metadata)
}

/// Validate component metadata for required fields.
pub fn validate(metadata: &ComponentMetadata) -> Result<()> {
    if metadata.package.trim().is_empty() {
        bail!("Component manifest missing 'package'");
    }
    for (group, entries) in &metadata.entry_points {
        if group.trim().is_empty() {
            bail!("Component '{}' declares an empty group name", metadata.package);
        }
        let mut names = HashSet::new();
        for entry in entries {
            if entry.name.trim().is_empty() {
                bail!(
                    "Component '{}' declares an unnamed entry in group '{}'",
                    metadata.package,
                    group
                );
            }
            if !names.insert(entry.name.as_str()) {
                bail!(
                    "Component '{}' declares entry '{}' twice in group '{}'",
                    metadata.package,
                    entry.name,
                    group
                );
            }
        }
    }
    Ok(())
}
