//! End-to-end resolutions over components installed on disk.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use plugboard_core::{Candidate, CandidateWarning, Interface, LoadError, ResolveError};
use plugboard_plugins::{DirectorySource, ModuleRegistry, PluginResolver, ResolveOptions};

trait Base: Send + Sync {
    fn origin(&self) -> &'static str;
}

type BasePlugin = Box<dyn Base>;

struct Impl(&'static str);

impl Base for Impl {
    fn origin(&self) -> &'static str {
        self.0
    }
}

fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    for namespace in ["foo", "other", "alpha", "beta"] {
        registry.register(namespace, "Bar", move || Ok(Box::new(Impl(namespace)) as BasePlugin));
    }
    registry
}

fn install(root: &Path, package: &str, entries: &[(&str, &str, &str)]) {
    let mut groups = serde_json::Map::new();
    for (group, name, target) in entries {
        groups
            .entry(group.to_string())
            .or_insert_with(|| serde_json::Value::Array(Vec::new()))
            .as_array_mut()
            .unwrap()
            .push(serde_json::json!({ "name": name, "target": target }));
    }
    let manifest = serde_json::json!({
        "package": package,
        "version": "0.1.0",
        "entryPoints": groups,
    });
    let dir = root.join(package);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("plugboard.json"), manifest.to_string()).unwrap();
}

fn resolver(root: &Path) -> PluginResolver {
    PluginResolver::new(Arc::new(DirectorySource::new([root])), Arc::new(registry()))
}

fn base() -> Interface {
    Interface::of_type::<BasePlugin>("foo", "Base")
}

fn origin(value: &plugboard_core::LoadedValue) -> &'static str {
    value.downcast_ref::<BasePlugin>().unwrap().origin()
}

#[test]
fn scenario_a_lone_internal_binding_is_returned_directly() {
    let root = tempfile::tempdir().unwrap();
    install(root.path(), "foo", &[("foo", "Base", "foo:Bar"), ("food", "Base", "foo:Bar")]);

    let r = resolver(root.path()).with_strategy(Arc::new(
        |_: &[Candidate], _: &Interface| -> Result<usize, ResolveError> {
            panic!("strategy must not run for a single candidate")
        },
    ));
    let plugin = r.resolve_one_as::<BasePlugin>(&base()).unwrap();
    assert_eq!(plugin.origin(), "foo");
}

#[test]
fn scenario_b_external_override_wins() {
    let root = tempfile::tempdir().unwrap();
    install(root.path(), "foo", &[("foo", "Base", "foo:Bar")]);
    install(root.path(), "other", &[("foo", "Base", "other:Bar")]);
    let r = resolver(root.path());

    let all: Vec<_> = r.resolve_all(&base()).unwrap().iter().map(origin).collect();
    assert_eq!(all, ["foo", "other"]);

    assert_eq!(origin(&r.resolve_one(&base()).unwrap()), "other");
}

#[test]
fn root_listed_twice_still_resolves_the_override() {
    let root = tempfile::tempdir().unwrap();
    install(root.path(), "foo", &[("foo", "Base", "foo:Bar")]);
    install(root.path(), "other", &[("foo", "Base", "other:Bar")]);
    let r = PluginResolver::new(
        Arc::new(DirectorySource::new([root.path(), root.path()])),
        Arc::new(registry()),
    );

    assert_eq!(r.resolve_all(&base()).unwrap().len(), 2);
    assert_eq!(origin(&r.resolve_one(&base()).unwrap()), "other");
}

#[test]
fn scenario_c_two_externals_are_ambiguous() {
    let root = tempfile::tempdir().unwrap();
    install(root.path(), "alpha", &[("foo", "Base", "alpha:Bar")]);
    install(root.path(), "beta", &[("foo", "Base", "beta:Bar")]);

    match resolver(root.path()).resolve_one(&base()).unwrap_err() {
        ResolveError::Ambiguous {
            interface,
            external_count,
        } => {
            assert_eq!(interface, "foo.Base");
            assert_eq!(external_count, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn scenario_d_broken_binding_is_dropped_with_a_warning() {
    let root = tempfile::tempdir().unwrap();
    install(root.path(), "foo", &[("foo", "Base", "foo:Bar")]);
    install(root.path(), "ghost", &[("foo", "Base", "other:Missing")]);
    install(root.path(), "other", &[("foo", "Base", "other:Bar")]);
    let r = resolver(root.path());

    let report = r.resolve_all_report(&base(), &ResolveOptions::default()).unwrap();
    let origins: Vec<_> = report.candidates().iter().map(|c| origin(c.value())).collect();
    assert_eq!(origins, ["foo", "other"]);

    assert_eq!(report.warnings().len(), 1);
    match &report.warnings()[0] {
        CandidateWarning::LoadFailed { binding, error } => {
            assert_eq!(binding.owner_package(), "ghost");
            assert_eq!(
                *error,
                LoadError::AttributeNotFound {
                    namespace: "other".into(),
                    attribute: "Missing".into(),
                }
            );
        }
        other => panic!("unexpected warning: {other}"),
    }
    assert!(report.warnings()[0].to_string().contains("ghost:foo:Base"));
}

#[test]
fn nothing_installed_is_not_found() {
    let root = tempfile::tempdir().unwrap();
    let r = resolver(root.path());
    assert!(r.resolve_all(&base()).unwrap().is_empty());
    assert!(matches!(r.resolve_one(&base()), Err(ResolveError::NotFound { .. })));
}

#[test]
fn only_internal_candidates_are_ambiguous() {
    let root = tempfile::tempdir().unwrap();
    install(root.path(), "foo", &[("foo", "Base", "foo:Bar")]);
    install(root.path(), "foo-extra", &[("foo", "Base", "foo.extra:Bar")]);
    let mut registry = registry();
    registry.register("foo.extra", "Bar", || Ok(Box::new(Impl("foo.extra")) as BasePlugin));
    let r = PluginResolver::new(
        Arc::new(DirectorySource::new([root.path()])),
        Arc::new(registry),
    );

    assert!(matches!(
        r.resolve_one(&base()),
        Err(ResolveError::Ambiguous {
            external_count: 0,
            ..
        })
    ));
}

#[test]
fn repeated_resolutions_are_identical_and_cached() {
    let root = tempfile::tempdir().unwrap();
    install(root.path(), "foo", &[("foo", "Base", "foo:Bar")]);
    install(root.path(), "other", &[("foo", "Base", "other:Bar")]);
    let r = resolver(root.path());

    let first = r.resolve_all(&base()).unwrap();
    let second = r.resolve_all(&base()).unwrap();
    assert_eq!(first.len(), second.len());
    assert!(first.iter().zip(&second).all(|(a, b)| a.ptr_eq(b)));
}
