//! Binding discovery.
//!
//! Turns whatever a [`DiscoverySource`] reports into a flat, deterministically
//! ordered list of bindings: components sorted by package then version, groups
//! in key order, entries in declaration order.

use std::sync::Arc;

use plugboard_core::{Binding, ComponentMetadata, DiscoveryError, DiscoverySource};
use tracing::{debug, warn};

use crate::filter::filter_bindings;
use crate::manifest;

#[derive(Clone)]
pub struct Discoverer {
    source: Arc<dyn DiscoverySource>,
}

impl Discoverer {
    pub fn new(source: Arc<dyn DiscoverySource>) -> Self {
        Self { source }
    }

    /// Every binding visible through the source, unfiltered.
    pub fn discover(&self) -> Result<Vec<Binding>, DiscoveryError> {
        let mut components = self.source.components()?;
        components.retain(|component| match manifest::validate(component) {
            Ok(()) => true,
            Err(e) => {
                warn!(source = self.source.name(), error = %e, "[Discovery] Skipping component");
                false
            }
        });
        sort_components(&mut components);

        let bindings: Vec<Binding> = components.iter().flat_map(|c| c.bindings()).collect();
        debug!(
            source = self.source.name(),
            components = components.len(),
            bindings = bindings.len(),
            "[Discovery] Scan complete"
        );
        Ok(bindings)
    }

    /// Discover, then keep bindings matching `group` and `name`.
    pub fn filtered(
        &self,
        group: Option<&str>,
        name: Option<&str>,
    ) -> Result<Vec<Binding>, DiscoveryError> {
        Ok(filter_bindings(self.discover()?, group, name))
    }
}

/// Stable sort by owner identity. Declaration order inside a component is kept.
fn sort_components(components: &mut [ComponentMetadata]) {
    components.sort_by(|a, b| {
        a.package
            .cmp(&b.package)
            .then_with(|| a.version.cmp(&b.version))
    });
}
