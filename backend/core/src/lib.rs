pub mod error;
pub mod interface;
pub mod traits;
pub mod types;

pub use error::{CandidateWarning, DiscoveryError, LoadError, ResolveError};
pub use interface::{Interface, LoadedValue};
pub use traits::{ConflictStrategy, DiscoverySource, TargetLoader};
pub use types::{Binding, CacheKey, Candidate, ComponentMetadata, EntryDecl, TargetRef};
