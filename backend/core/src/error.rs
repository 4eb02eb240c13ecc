use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::types::Binding;

/// Pipeline-level failure: the whole discovery scan could not run.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("cannot enumerate components under {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("discovery did not finish within {0:?}")]
    Timeout(Duration),

    #[error("discovery source is corrupt: {0}")]
    Corrupt(String),

    #[error("discovery worker failed: {0}")]
    Worker(String),
}

/// A single binding's target could not be turned into a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("malformed target reference '{0}' (expected '<namespace>:<attribute>')")]
    MalformedTarget(String),

    #[error("namespace '{0}' is not registered")]
    NamespaceNotFound(String),

    #[error("namespace '{namespace}' has no attribute '{attribute}'")]
    AttributeNotFound { namespace: String, attribute: String },

    #[error("initialization of '{target}' failed: {reason}")]
    Initialization { target: String, reason: String },
}

/// Per-candidate problems. These never fail a resolution; the candidate is
/// dropped and the warning is recorded.
#[derive(Debug, Clone, Error)]
pub enum CandidateWarning {
    #[error("plugin {binding} failed to load: {error}")]
    LoadFailed { binding: Binding, error: LoadError },

    #[error("plugin {binding} does not satisfy {interface} (loaded value is {actual_type})")]
    Invalid {
        binding: Binding,
        interface: String,
        actual_type: String,
    },
}

impl CandidateWarning {
    /// The binding the warning is about.
    pub fn binding(&self) -> &Binding {
        match self {
            CandidateWarning::LoadFailed { binding, .. } => binding,
            CandidateWarning::Invalid { binding, .. } => binding,
        }
    }
}

/// Errors returned to the caller of a resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("no plugins found for {interface}")]
    NotFound { interface: String },

    #[error("cannot choose a plugin for {interface}: {external_count} external candidates, need 1")]
    Ambiguous {
        interface: String,
        external_count: usize,
    },

    #[error("conflict strategy '{strategy}' failed for {interface}: {reason}")]
    Strategy {
        strategy: String,
        interface: String,
        reason: String,
    },

    #[error("plugin for {interface} is a {actual}, not a {expected}")]
    TypeMismatch {
        interface: String,
        expected: &'static str,
        actual: &'static str,
    },
}
