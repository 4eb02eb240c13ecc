//! Conflict strategies: choose one plugin out of several valid candidates.
//!
//! The default, [`PreferExternal`], implements the override pattern: a component
//! may ship a fallback implementation of its own interface, and exactly one
//! outside component may replace it.

use std::sync::Arc;

use plugboard_core::{Candidate, ConflictStrategy, Interface, ResolveError};
use tracing::debug;

/// Pick the single external candidate; zero or several externals is ambiguous.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferExternal;

impl ConflictStrategy for PreferExternal {
    fn name(&self) -> &str {
        "prefer-external"
    }

    fn select(
        &self,
        candidates: &[Candidate],
        interface: &Interface,
    ) -> Result<usize, ResolveError> {
        let external: Vec<usize> = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_external())
            .map(|(i, _)| i)
            .collect();
        debug!(
            interface = %interface,
            candidates = candidates.len(),
            external = external.len(),
            "[Resolver] Partitioned candidates"
        );
        match external.as_slice() {
            [only] => Ok(*only),
            _ => Err(ResolveError::Ambiguous {
                interface: interface.to_string(),
                external_count: external.len(),
            }),
        }
    }
}

/// Caller preference by owner package.
///
/// Walks `packages` in order; the first package owning exactly one candidate
/// wins. When no listed package decides, `fallback` is asked.
#[derive(Clone)]
pub struct PreferPackage {
    packages: Vec<String>,
    fallback: Arc<dyn ConflictStrategy>,
}

impl PreferPackage {
    pub fn new(packages: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            packages: packages.into_iter().map(Into::into).collect(),
            fallback: Arc::new(PreferExternal),
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn ConflictStrategy>) -> Self {
        self.fallback = fallback;
        self
    }
}

impl ConflictStrategy for PreferPackage {
    fn name(&self) -> &str {
        "prefer-package"
    }

    fn select(
        &self,
        candidates: &[Candidate],
        interface: &Interface,
    ) -> Result<usize, ResolveError> {
        for package in &self.packages {
            let mut owned = candidates
                .iter()
                .enumerate()
                .filter(|(_, c)| c.binding().owner_package() == package);
            if let (Some((index, _)), None) = (owned.next(), owned.next()) {
                debug!(interface = %interface, %package, "[Resolver] Preferred package selected");
                return Ok(index);
            }
        }
        self.fallback.select(candidates, interface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugboard_core::{Binding, LoadedValue};

    fn iface() -> Interface {
        Interface::new("foo", "Base", |_| true)
    }

    fn candidate(package: &str, target: &str) -> Candidate {
        Candidate::new(
            Binding::new("foo", "Base", target, package, None),
            LoadedValue::new(target.to_string()),
            &iface(),
        )
    }

    #[test]
    fn single_external_wins_over_internals() {
        let candidates = [
            candidate("foo", "foo:Bar"),
            candidate("foo-extra", "foo.extra:Bar"),
            candidate("other", "other:Bar"),
        ];
        assert_eq!(PreferExternal.select(&candidates, &iface()).unwrap(), 2);
    }

    #[test]
    fn no_external_is_ambiguous() {
        let candidates = [candidate("foo", "foo:Bar"), candidate("foo", "foo:Baz")];
        match PreferExternal.select(&candidates, &iface()).unwrap_err() {
            ResolveError::Ambiguous { interface, external_count } => {
                assert_eq!(interface, "foo.Base");
                assert_eq!(external_count, 0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn two_externals_are_ambiguous() {
        let candidates = [
            candidate("foo", "foo:Bar"),
            candidate("other", "other:Bar"),
            candidate("third", "third:Bar"),
        ];
        assert!(matches!(
            PreferExternal.select(&candidates, &iface()),
            Err(ResolveError::Ambiguous { external_count: 2, .. })
        ));
    }

    #[test]
    fn preferred_package_breaks_tie() {
        let candidates = [candidate("other", "other:Bar"), candidate("third", "third:Bar")];
        let strategy = PreferPackage::new(["missing", "third"]);
        assert_eq!(strategy.select(&candidates, &iface()).unwrap(), 1);
    }

    #[test]
    fn preferred_package_with_two_candidates_falls_back() {
        let candidates = [
            candidate("foo", "foo:Bar"),
            candidate("foo", "foo:Baz"),
            candidate("other", "other:Bar"),
        ];
        let strategy = PreferPackage::new(["foo"]);
        assert_eq!(strategy.select(&candidates, &iface()).unwrap(), 2);
    }

    #[test]
    fn closures_are_strategies() {
        let last =
            |candidates: &[Candidate], _: &Interface| Ok::<_, ResolveError>(candidates.len() - 1);
        let candidates = [candidate("foo", "foo:Bar"), candidate("foo", "foo:Baz")];
        assert_eq!(last.select(&candidates, &iface()).unwrap(), 1);
        assert_eq!(last.name(), "custom");
    }
}
