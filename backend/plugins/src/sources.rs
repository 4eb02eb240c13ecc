//! Discovery sources: where component metadata is read from.

use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use plugboard_config::DiscoveryConfig;
use plugboard_core::{ComponentMetadata, DiscoveryError, DiscoverySource};
use tracing::{debug, warn};

use crate::manifest::{self, MANIFEST_FILE_NAME};

/// The source described by a `discovery` config section: the configured roots,
/// bounded by the timeout when one is set.
pub fn discovery_source(config: &DiscoveryConfig) -> Arc<dyn DiscoverySource> {
    let source: Arc<dyn DiscoverySource> = Arc::new(
        DirectorySource::new(config.roots.iter().cloned())
            .with_manifest_file(config.manifest_file())
            .with_parallel(config.is_parallel()),
    );
    match config.timeout() {
        Some(timeout) => Arc::new(TimeoutSource::new(source, timeout)),
        None => source,
    }
}

/// In-memory component list. Used by tests and embedded registries.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    components: Vec<ComponentMetadata>,
}

impl StaticSource {
    pub fn new(components: Vec<ComponentMetadata>) -> Self {
        Self { components }
    }
}

impl DiscoverySource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    fn components(&self) -> Result<Vec<ComponentMetadata>, DiscoveryError> {
        Ok(self.components.clone())
    }
}

/// Scans plugin roots on disk.
///
/// Every immediate subdirectory of a root that contains a manifest file is one
/// installed component. Missing roots contribute nothing; broken manifests are
/// skipped with a warning.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    roots: Vec<PathBuf>,
    manifest_file: String,
    parallel: bool,
}

impl DirectorySource {
    pub fn new(roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            manifest_file: MANIFEST_FILE_NAME.to_string(),
            parallel: true,
        }
    }

    pub fn with_manifest_file(mut self, name: impl Into<String>) -> Self {
        self.manifest_file = name.into();
        self
    }

    /// Read manifests on worker threads.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Per-directory outcome of reading each manifest, for diagnostics.
    ///
    /// Directories without a manifest are not listed.
    pub fn inspect(&self) -> Result<Vec<ScannedComponent>, DiscoveryError> {
        let dirs = self.component_dirs()?;
        Ok(dirs
            .into_iter()
            .filter_map(|dir| {
                let path = dir.join(&self.manifest_file);
                if !path.is_file() {
                    return None;
                }
                let outcome = manifest::read_manifest(&path).map_err(|e| format!("{e:#}"));
                Some(ScannedComponent { dir, outcome })
            })
            .collect())
    }

    /// Component directories under all roots, sorted. A root listed twice, or
    /// reached through two spellings, contributes its components once.
    fn component_dirs(&self) -> Result<Vec<PathBuf>, DiscoveryError> {
        let mut dirs = Vec::new();
        for root in &self.roots {
            if !root.exists() {
                debug!(root = %root.display(), "[Discovery] Plugin root does not exist");
                continue;
            }
            let unreadable = |source: std::io::Error| DiscoveryError::Unreadable {
                path: root.clone(),
                source,
            };
            let root = std::fs::canonicalize(root).map_err(unreadable)?;
            let entries = std::fs::read_dir(&root).map_err(unreadable)?;
            dirs.extend(
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|p| p.is_dir()),
            );
        }
        dirs.sort();
        dirs.dedup();
        Ok(dirs)
    }

    fn read_component(&self, dir: &Path) -> Option<ComponentMetadata> {
        let path = dir.join(&self.manifest_file);
        if !path.is_file() {
            debug!(dir = %dir.display(), "[Discovery] No manifest, skipping");
            return None;
        }
        match manifest::read_manifest(&path) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                let error = format!("{e:#}");
                warn!(path = %path.display(), %error, "[Discovery] Skipping component");
                None
            }
        }
    }

    fn read_parallel(&self, dirs: &[PathBuf]) -> Vec<Option<ComponentMetadata>> {
        let workers = thread::available_parallelism().map_or(4, |n| n.get());
        let chunk_size = dirs.len().div_ceil(workers).max(1);
        thread::scope(|scope| {
            let handles: Vec<_> = dirs
                .chunks(chunk_size)
                .map(|chunk| {
                    let handle = scope.spawn(move || {
                        chunk.iter().map(|d| self.read_component(d)).collect::<Vec<_>>()
                    });
                    (chunk, handle)
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|(chunk, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        warn!(
                            count = chunk.len(),
                            "[Discovery] Manifest reader panicked; skipping its components"
                        );
                        vec![None; chunk.len()]
                    })
                })
                .collect()
        })
    }
}

impl DiscoverySource for DirectorySource {
    fn name(&self) -> &str {
        "directory"
    }

    fn components(&self) -> Result<Vec<ComponentMetadata>, DiscoveryError> {
        let dirs = self.component_dirs()?;
        let read = if self.parallel && dirs.len() > 1 {
            self.read_parallel(&dirs)
        } else {
            dirs.iter().map(|d| self.read_component(d)).collect()
        };
        Ok(read.into_iter().flatten().collect())
    }
}

/// One component directory as seen by [`DirectorySource::inspect`].
#[derive(Debug, Clone)]
pub struct ScannedComponent {
    pub dir: PathBuf,
    pub outcome: Result<ComponentMetadata, String>,
}

/// Bounds a slow source: the scan runs on a worker thread and the call fails
/// with [`DiscoveryError::Timeout`] if it does not finish in time.
pub struct TimeoutSource {
    inner: Arc<dyn DiscoverySource>,
    timeout: Duration,
}

impl TimeoutSource {
    pub fn new(inner: Arc<dyn DiscoverySource>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

impl DiscoverySource for TimeoutSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn components(&self) -> Result<Vec<ComponentMetadata>, DiscoveryError> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        thread::Builder::new()
            .name("plugboard-discovery".into())
            .spawn(move || {
                // Receiver is gone if the caller already timed out.
                let _ = tx.send(inner.components());
            })
            .map_err(|e| DiscoveryError::Worker(e.to_string()))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(source = self.inner.name(), timeout = ?self.timeout, "[Discovery] Timed out");
                Err(DiscoveryError::Timeout(self.timeout))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(DiscoveryError::Worker(
                "discovery thread exited without a result".into(),
            )),
        }
    }
}

/// Concatenation of several sources, e.g. system and user plugin roots.
#[derive(Default)]
pub struct CompositeSource {
    sources: Vec<Arc<dyn DiscoverySource>>,
}

impl CompositeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: Arc<dyn DiscoverySource>) -> Self {
        self.sources.push(source);
        self
    }
}

impl DiscoverySource for CompositeSource {
    fn name(&self) -> &str {
        "composite"
    }

    fn components(&self) -> Result<Vec<ComponentMetadata>, DiscoveryError> {
        let mut all = Vec::new();
        for source in &self.sources {
            all.extend(source.components()?);
        }
        Ok(all)
    }
}
