//! Resolution facade.
//!
//! One resolution runs the whole pipeline for a single interface:
//! discover, filter by `(group, name)`, load each binding, validate each value,
//! then either return everything or pick exactly one. Per-candidate failures are
//! recorded as warnings and never abort the call; only discovery failure does.

use std::any::Any;
use std::sync::Arc;

use plugboard_config::PlugboardConfig;
use plugboard_core::{
    Binding, Candidate, CandidateWarning, ConflictStrategy, DiscoverySource, Interface, LoadError,
    LoadedValue, ResolveError, TargetLoader,
};
use plugboard_logging::{EventLogger, ResolutionEvent};
use tracing::{debug, info};

use crate::cache::LoadCache;
use crate::discovery::Discoverer;
use crate::filter::filter_bindings;
use crate::resolver::PreferExternal;
use crate::sources::discovery_source;
use crate::validator;

/// Per-call overrides of the facade's defaults.
#[derive(Clone, Default)]
pub struct ResolveOptions {
    pub strategy: Option<Arc<dyn ConflictStrategy>>,
    pub source: Option<Arc<dyn DiscoverySource>>,
    /// Load afresh; the cache is neither read nor written.
    pub bypass_cache: bool,
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: Arc<dyn ConflictStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_source(mut self, source: Arc<dyn DiscoverySource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn bypass_cache(mut self) -> Self {
        self.bypass_cache = true;
        self
    }
}

/// Everything one resolution saw: surviving candidates in discovery order,
/// the warnings for dropped ones and, for single resolutions, the winner.
#[derive(Debug, Clone, Default)]
pub struct ResolutionReport {
    candidates: Vec<Candidate>,
    warnings: Vec<CandidateWarning>,
    selected: Option<usize>,
}

impl ResolutionReport {
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn warnings(&self) -> &[CandidateWarning] {
        &self.warnings
    }

    pub fn selected(&self) -> Option<&Candidate> {
        self.selected.and_then(|i| self.candidates.get(i))
    }

    pub fn values(&self) -> Vec<LoadedValue> {
        self.candidates.iter().map(|c| c.value().clone()).collect()
    }

    pub fn into_selected(mut self) -> Option<LoadedValue> {
        let index = self.selected?;
        (index < self.candidates.len()).then(|| self.candidates.swap_remove(index).into_value())
    }
}

pub struct PluginResolver {
    discoverer: Discoverer,
    loader: Arc<dyn TargetLoader>,
    strategy: Arc<dyn ConflictStrategy>,
    cache: Option<Arc<LoadCache>>,
}

impl PluginResolver {
    /// A resolver with its own load cache and the [`PreferExternal`] strategy.
    pub fn new(source: Arc<dyn DiscoverySource>, loader: Arc<dyn TargetLoader>) -> Self {
        Self {
            discoverer: Discoverer::new(source),
            loader,
            strategy: Arc::new(PreferExternal),
            cache: Some(Arc::new(LoadCache::new())),
        }
    }

    /// Wire sources, timeout and cache policy from configuration.
    pub fn from_config(config: &PlugboardConfig, loader: Arc<dyn TargetLoader>) -> Self {
        let resolver = Self::new(discovery_source(&config.discovery), loader);
        if config.cache.is_enabled() {
            resolver
        } else {
            resolver.without_cache()
        }
    }

    pub fn with_strategy(mut self, strategy: Arc<dyn ConflictStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Share a cache with other resolvers.
    pub fn with_cache(mut self, cache: Arc<LoadCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Load every binding afresh on every call.
    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    pub fn cache(&self) -> Option<&Arc<LoadCache>> {
        self.cache.as_ref()
    }

    // -----------------------------------------------------------------------
    // resolve_all
    // -----------------------------------------------------------------------

    /// Every valid plugin for `interface`, in discovery order. Possibly empty.
    pub fn resolve_all(&self, interface: &Interface) -> Result<Vec<LoadedValue>, ResolveError> {
        self.resolve_all_with(interface, &ResolveOptions::default())
    }

    pub fn resolve_all_with(
        &self,
        interface: &Interface,
        options: &ResolveOptions,
    ) -> Result<Vec<LoadedValue>, ResolveError> {
        let report = self.resolve_all_report(interface, options)?;
        Ok(report.candidates.into_iter().map(Candidate::into_value).collect())
    }

    pub fn resolve_all_report(
        &self,
        interface: &Interface,
        options: &ResolveOptions,
    ) -> Result<ResolutionReport, ResolveError> {
        let report = self.collect(interface, options)?;
        info!(
            interface = %interface,
            valid = report.candidates.len(),
            dropped = report.warnings.len(),
            "[Resolve] Collected plugins"
        );
        Ok(report)
    }

    /// Every valid plugin, downcast to `T`.
    pub fn resolve_all_as<T: Any + Send + Sync>(
        &self,
        interface: &Interface,
    ) -> Result<Vec<Arc<T>>, ResolveError> {
        self.resolve_all(interface)?
            .iter()
            .map(|value| downcast(value, interface))
            .collect()
    }

    // -----------------------------------------------------------------------
    // resolve_one
    // -----------------------------------------------------------------------

    /// Exactly one plugin for `interface`.
    ///
    /// A lone valid candidate is returned without consulting the strategy.
    pub fn resolve_one(&self, interface: &Interface) -> Result<LoadedValue, ResolveError> {
        self.resolve_one_with(interface, &ResolveOptions::default())
    }

    pub fn resolve_one_with(
        &self,
        interface: &Interface,
        options: &ResolveOptions,
    ) -> Result<LoadedValue, ResolveError> {
        self.resolve_one_report(interface, options)?
            .into_selected()
            .ok_or_else(|| ResolveError::NotFound {
                interface: interface.to_string(),
            })
    }

    pub fn resolve_one_report(
        &self,
        interface: &Interface,
        options: &ResolveOptions,
    ) -> Result<ResolutionReport, ResolveError> {
        let mut report = self.collect(interface, options)?;

        let (index, strategy) = match report.candidates.len() {
            0 => {
                EventLogger::log_event(ResolutionEvent::NotFound {
                    interface: interface.to_string(),
                });
                return Err(ResolveError::NotFound {
                    interface: interface.to_string(),
                });
            }
            1 => (0, None),
            _ => {
                let strategy = options.strategy.as_ref().unwrap_or(&self.strategy);
                match select(strategy.as_ref(), &report.candidates, interface) {
                    Ok(index) => (index, Some(strategy.name().to_string())),
                    Err(e) => {
                        if let ResolveError::Ambiguous { external_count, .. } = &e {
                            EventLogger::log_event(ResolutionEvent::Ambiguous {
                                interface: interface.to_string(),
                                external_count: *external_count,
                            });
                        }
                        return Err(e);
                    }
                }
            }
        };

        EventLogger::log_event(ResolutionEvent::Resolved {
            interface: interface.to_string(),
            binding: report.candidates[index].binding().to_string(),
            candidates: report.candidates.len(),
            strategy,
        });
        report.selected = Some(index);
        Ok(report)
    }

    /// Exactly one plugin, downcast to `T`.
    pub fn resolve_one_as<T: Any + Send + Sync>(
        &self,
        interface: &Interface,
    ) -> Result<Arc<T>, ResolveError> {
        downcast(&self.resolve_one(interface)?, interface)
    }

    // -----------------------------------------------------------------------
    // Pipeline
    // -----------------------------------------------------------------------

    fn collect(
        &self,
        interface: &Interface,
        options: &ResolveOptions,
    ) -> Result<ResolutionReport, ResolveError> {
        let bindings = match &options.source {
            Some(source) => Discoverer::new(Arc::clone(source)).discover()?,
            None => self.discoverer.discover()?,
        };
        let bindings = filter_bindings(bindings, Some(interface.group()), Some(interface.name()));
        debug!(interface = %interface, matches = bindings.len(), "[Resolve] Filtered bindings");

        let mut report = ResolutionReport::default();
        for binding in bindings {
            match self.load(&binding, options.bypass_cache) {
                Ok(value) if validator::validate(&value, interface) => {
                    report.candidates.push(Candidate::new(binding, value, interface));
                }
                Ok(value) => report.warnings.push(CandidateWarning::Invalid {
                    binding,
                    interface: interface.to_string(),
                    actual_type: value.type_name().to_string(),
                }),
                Err(error) => report.warnings.push(CandidateWarning::LoadFailed { binding, error }),
            }
        }

        for warning in &report.warnings {
            EventLogger::log_event(ResolutionEvent::CandidateDropped {
                interface: interface.to_string(),
                binding: warning.binding().to_string(),
                reason: warning.to_string(),
            });
        }
        Ok(report)
    }

    fn load(&self, binding: &Binding, bypass_cache: bool) -> Result<LoadedValue, LoadError> {
        let target = binding.target_ref()?;
        match &self.cache {
            Some(cache) if !bypass_cache => {
                cache.get_or_load(&binding.cache_key(), || self.loader.load(&target))
            }
            _ => self.loader.load(&target),
        }
    }
}

/// Run the strategy and reject an index that does not name a candidate.
fn select(
    strategy: &dyn ConflictStrategy,
    candidates: &[Candidate],
    interface: &Interface,
) -> Result<usize, ResolveError> {
    let index = strategy.select(candidates, interface)?;
    if index < candidates.len() {
        Ok(index)
    } else {
        Err(ResolveError::Strategy {
            strategy: strategy.name().to_string(),
            interface: interface.to_string(),
            reason: format!("selected index {index} but only {} candidates", candidates.len()),
        })
    }
}

fn downcast<T: Any + Send + Sync>(
    value: &LoadedValue,
    interface: &Interface,
) -> Result<Arc<T>, ResolveError> {
    value.downcast::<T>().ok_or_else(|| ResolveError::TypeMismatch {
        interface: interface.to_string(),
        expected: std::any::type_name::<T>(),
        actual: value.type_name(),
    })
}
