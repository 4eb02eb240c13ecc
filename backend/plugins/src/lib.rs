pub mod cache;
pub mod discovery;
pub mod facade;
pub mod filter;
pub mod loader;
pub mod manifest;
pub mod resolver;
pub mod sources;
pub mod validator;

pub use cache::LoadCache;
pub use discovery::Discoverer;
pub use facade::{PluginResolver, ResolutionReport, ResolveOptions};
pub use filter::filter_bindings;
pub use loader::ModuleRegistry;
pub use manifest::{MANIFEST_FILE_NAME, parse_manifest, read_manifest};
pub use resolver::{PreferExternal, PreferPackage};
pub use sources::{
    CompositeSource, DirectorySource, ScannedComponent, StaticSource, TimeoutSource,
    discovery_source,
};
