use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::interface::{Interface, LoadedValue};

/// First dotted segment of `namespace`: `other` for `other.impls`.
pub(crate) fn root_namespace(namespace: &str) -> &str {
    namespace.split_once('.').map_or(namespace, |(root, _)| root)
}

/// A capability binding declared by an installed component.
///
/// Bindings are immutable once discovered and are rebuilt on every scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    group: String,
    name: String,
    target: String,
    owner_package: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    owner_version: Option<String>,
}

impl Binding {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        target: impl Into<String>,
        owner_package: impl Into<String>,
        owner_version: Option<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            target: target.into(),
            owner_package: owner_package.into(),
            owner_version,
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw, unparsed target reference.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn owner_package(&self) -> &str {
        &self.owner_package
    }

    pub fn owner_version(&self) -> Option<&str> {
        self.owner_version.as_deref()
    }

    /// Parse the target reference.
    pub fn target_ref(&self) -> Result<TargetRef, LoadError> {
        self.target.parse()
    }

    /// Root namespace the target lives in, e.g. `other` for `other.impls:Bar`.
    ///
    /// `None` when the target is malformed.
    pub fn owner_namespace(&self) -> Option<&str> {
        let (namespace, _) = self.target.split_once(':')?;
        let root = root_namespace(namespace.trim());
        (!root.is_empty()).then_some(root)
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey {
            group: self.group.clone(),
            name: self.name.clone(),
            owner_package: self.owner_package.clone(),
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.owner_package, self.group, self.name)?;
        match &self.owner_version {
            Some(version) => write!(f, " ({version})"),
            None => write!(f, " (unversioned)"),
        }
    }
}

/// Identity of a loaded binding in the load cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub group: String,
    pub name: String,
    pub owner_package: String,
}

/// Parsed `<namespace-path>:<attribute-path>` target reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetRef {
    namespace: String,
    attribute: String,
}

impl TargetRef {
    /// Dotted path of the loadable unit, e.g. `other.impls`.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Dotted path of the value inside the namespace, e.g. `Bar` or `Bar.default`.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }
}

impl FromStr for TargetRef {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || LoadError::MalformedTarget(s.to_string());
        let (namespace, attribute) = s.split_once(':').ok_or_else(malformed)?;
        let (namespace, attribute) = (namespace.trim(), attribute.trim());
        if !is_dotted_path(namespace) || !is_dotted_path(attribute) {
            return Err(malformed());
        }
        Ok(Self {
            namespace: namespace.to_string(),
            attribute: attribute.to_string(),
        })
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.attribute)
    }
}

fn is_dotted_path(s: &str) -> bool {
    let bad_char = |c: char| c == ':' || c.is_whitespace();
    !s.is_empty() && s.split('.').all(|seg| !seg.is_empty() && !seg.contains(bad_char))
}

/// One `(name, target)` entry inside a group of a component's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDecl {
    pub name: String,
    pub target: String,
}

/// Metadata of one installed component: which bindings it declares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMetadata {
    pub package: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Group name → entries, in declaration order within each group.
    #[serde(default)]
    pub entry_points: BTreeMap<String, Vec<EntryDecl>>,
}

impl ComponentMetadata {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            ..Default::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Declare an entry under `group`.
    pub fn with_entry(
        mut self,
        group: impl Into<String>,
        name: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.entry_points
            .entry(group.into())
            .or_default()
            .push(EntryDecl {
                name: name.into(),
                target: target.into(),
            });
        self
    }

    /// Flatten into bindings: groups in key order, entries in declaration order.
    pub fn bindings(&self) -> impl Iterator<Item = Binding> + '_ {
        self.entry_points.iter().flat_map(move |(group, entries)| {
            entries.iter().map(move |entry| {
                Binding::new(
                    group.clone(),
                    entry.name.clone(),
                    entry.target.clone(),
                    self.package.clone(),
                    self.version.clone(),
                )
            })
        })
    }
}

/// A loaded binding, tagged internal/external relative to one interface.
#[derive(Debug, Clone)]
pub struct Candidate {
    binding: Binding,
    value: LoadedValue,
    is_external: bool,
}

impl Candidate {
    pub fn new(binding: Binding, value: LoadedValue, interface: &Interface) -> Self {
        let is_external = binding.owner_namespace() != Some(interface.group());
        Self {
            binding,
            value,
            is_external,
        }
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn value(&self) -> &LoadedValue {
        &self.value
    }

    pub fn into_value(self) -> LoadedValue {
        self.value
    }

    /// True when the binding's namespace differs from the interface's.
    pub fn is_external(&self) -> bool {
        self.is_external
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_target_reference() {
        let target: TargetRef = "other.impls:Bar.default".parse().unwrap();
        assert_eq!(target.namespace(), "other.impls");
        assert_eq!(target.attribute(), "Bar.default");
        assert_eq!(target.to_string(), "other.impls:Bar.default");
    }

    #[test]
    fn rejects_malformed_targets() {
        for raw in ["foo", ":Bar", "foo:", "foo..x:Bar", "foo:Bar.", "fo o:Bar"] {
            assert!(
                matches!(raw.parse::<TargetRef>(), Err(LoadError::MalformedTarget(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn owner_namespace_is_root_of_target() {
        let b = Binding::new("foo", "Base", "other.impls:Bar", "other-bar", None);
        assert_eq!(b.owner_namespace(), Some("other"));
        let broken = Binding::new("foo", "Base", "nothing-here", "x", None);
        assert_eq!(broken.owner_namespace(), None);
    }

    #[test]
    fn bindings_follow_group_then_declaration_order() {
        let meta = ComponentMetadata::new("foo")
            .with_version("0.1.0")
            .with_entry("food", "Base", "foo:Bar")
            .with_entry("foo", "Second", "foo:Two")
            .with_entry("foo", "First", "foo:One");
        let names: Vec<_> = meta
            .bindings()
            .map(|b| format!("{}.{}", b.group(), b.name()))
            .collect();
        assert_eq!(names, ["foo.Second", "foo.First", "food.Base"]);
    }

    #[test]
    fn metadata_without_groups_has_no_bindings() {
        let meta: ComponentMetadata = serde_json::from_str(r#"{"package": "empty"}"#).unwrap();
        assert_eq!(meta.bindings().count(), 0);
    }

    #[test]
    fn candidate_external_flag() {
        let iface = Interface::new("foo", "Base", |_| true);
        let internal = Candidate::new(
            Binding::new("foo", "Base", "foo:Bar", "foo", None),
            LoadedValue::new(1u8),
            &iface,
        );
        let external = Candidate::new(
            Binding::new("foo", "Base", "other:Bar", "other", None),
            LoadedValue::new(2u8),
            &iface,
        );
        assert!(!internal.is_external());
        assert!(external.is_external());
    }
}
