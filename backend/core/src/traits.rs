use crate::error::{DiscoveryError, LoadError, ResolveError};
use crate::interface::{Interface, LoadedValue};
use crate::types::{Candidate, ComponentMetadata, TargetRef};

/// Where installed-component metadata comes from.
///
/// Implementations skip individual broken components and only return an
/// error when nothing can be enumerated at all.
pub trait DiscoverySource: Send + Sync {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    /// Read the metadata of every installed component.
    fn components(&self) -> Result<Vec<ComponentMetadata>, DiscoveryError>;
}

/// Turns a target reference into a concrete value.
///
/// This is the step that may run third-party initialization code.
pub trait TargetLoader: Send + Sync {
    fn load(&self, target: &TargetRef) -> Result<LoadedValue, LoadError>;
}

/// Picks one candidate out of several valid ones.
///
/// Only called with two or more candidates. Returns the index of the pick.
pub trait ConflictStrategy: Send + Sync {
    fn name(&self) -> &str {
        "custom"
    }

    fn select(&self, candidates: &[Candidate], interface: &Interface)
        -> Result<usize, ResolveError>;
}

impl<F> ConflictStrategy for F
where
    F: Fn(&[Candidate], &Interface) -> Result<usize, ResolveError> + Send + Sync,
{
    fn select(
        &self,
        candidates: &[Candidate],
        interface: &Interface,
    ) -> Result<usize, ResolveError> {
        self(candidates, interface)
    }
}
