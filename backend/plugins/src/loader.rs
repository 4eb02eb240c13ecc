//! Target loader backed by a table of registered namespaces.
//!
//! The host (or a plugin crate's registration function) declares which
//! namespaces exist and which attributes they export. Each attribute is backed
//! by a factory, so resolving a target runs the plugin's initialization code.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use plugboard_core::{LoadError, LoadedValue, TargetLoader, TargetRef};
use tracing::debug;

type Factory = Arc<dyn Fn() -> anyhow::Result<LoadedValue> + Send + Sync>;

#[derive(Default, Clone)]
pub struct ModuleRegistry {
    namespaces: HashMap<String, HashMap<String, Factory>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Export `attribute` from `namespace`, built by `factory` on load.
    pub fn register<T, F>(
        &mut self,
        namespace: impl Into<String>,
        attribute: impl Into<String>,
        factory: F,
    ) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move || factory().map(LoadedValue::new));
        self.insert(namespace.into(), attribute.into(), factory);
        self
    }

    /// Export a ready-made value. Every load hands out the same instance.
    pub fn register_value<T: Any + Send + Sync>(
        &mut self,
        namespace: impl Into<String>,
        attribute: impl Into<String>,
        value: T,
    ) -> &mut Self {
        let value = LoadedValue::new(value);
        self.insert(
            namespace.into(),
            attribute.into(),
            Arc::new(move || Ok::<_, anyhow::Error>(value.clone())),
        );
        self
    }

    /// Declare a namespace with no attributes yet.
    pub fn declare_namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.namespaces.entry(namespace.into()).or_default();
        self
    }

    /// Registered namespaces, sorted.
    pub fn namespaces(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.namespaces.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn insert(&mut self, namespace: String, attribute: String, factory: Factory) {
        self.namespaces
            .entry(namespace)
            .or_default()
            .insert(attribute, factory);
    }
}

impl TargetLoader for ModuleRegistry {
    fn load(&self, target: &TargetRef) -> Result<LoadedValue, LoadError> {
        let exports = self
            .namespaces
            .get(target.namespace())
            .ok_or_else(|| LoadError::NamespaceNotFound(target.namespace().to_string()))?;
        let factory = exports
            .get(target.attribute())
            .ok_or_else(|| LoadError::AttributeNotFound {
                namespace: target.namespace().to_string(),
                attribute: target.attribute().to_string(),
            })?;

        debug!(target = %target, "[Loader] Initializing plugin");
        let initialization_failed = |reason: String| LoadError::Initialization {
            target: target.to_string(),
            reason,
        };
        match panic::catch_unwind(AssertUnwindSafe(|| factory())) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(initialization_failed(format!("{e:#}"))),
            Err(payload) => Err(initialization_failed(format!(
                "panicked: {}",
                panic_message(payload.as_ref())
            ))),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
