use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// A loaded plugin value.
///
/// Wraps the value behind `Arc<dyn Any>` and remembers the concrete type name
/// so mismatches can be reported.
#[derive(Clone)]
pub struct LoadedValue {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl LoadedValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            inner: value,
            type_name: type_name::<T>(),
        }
    }

    /// Concrete type name of the wrapped value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Shared handle to the value if it is a `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.inner).downcast::<T>().ok()
    }

    /// Whether both handles point at the same loaded value.
    pub fn ptr_eq(&self, other: &LoadedValue) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for LoadedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LoadedValue").field(&self.type_name).finish()
    }
}

type Predicate = Arc<dyn Fn(&LoadedValue) -> bool + Send + Sync>;

/// The capability a caller wants fulfilled.
///
/// Addressed by `(group, name)`: the group is the root segment of the defining
/// namespace (`foo.models` → `foo`), the name is the interface identifier.
/// The predicate decides whether a loaded value satisfies the capability.
#[derive(Clone)]
pub struct Interface {
    namespace: String,
    name: String,
    predicate: Predicate,
    expected: Option<&'static str>,
}

impl Interface {
    pub fn new<F>(namespace: impl Into<String>, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&LoadedValue) -> bool + Send + Sync + 'static,
    {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            predicate: Arc::new(predicate),
            expected: None,
        }
    }

    /// Interface satisfied by values of type `T`.
    ///
    /// For trait-object plugins register and request `Box<dyn Trait>`.
    pub fn of_type<T: Any + Send + Sync>(
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            expected: Some(type_name::<T>()),
            ..Self::new(namespace, name, |value: &LoadedValue| value.is::<T>())
        }
    }

    /// Full defining namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Group the interface's bindings are declared under.
    pub fn group(&self) -> &str {
        crate::types::root_namespace(&self.namespace)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_satisfied_by(&self, value: &LoadedValue) -> bool {
        (self.predicate)(value)
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

impl fmt::Debug for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interface")
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .field("expected", &self.expected)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct Hello;

    impl Greeter for Hello {
        fn greet(&self) -> String {
            "hello".into()
        }
    }

    #[test]
    fn group_is_root_namespace() {
        let iface = Interface::new("foo.models", "Base", |_| true);
        assert_eq!(iface.group(), "foo");
        assert_eq!(iface.name(), "Base");
        assert_eq!(iface.to_string(), "foo.models.Base");
    }

    #[test]
    fn typed_interface_checks_value_type() {
        let iface = Interface::of_type::<Box<dyn Greeter>>("greet", "Greeter");
        let good = LoadedValue::new(Box::new(Hello) as Box<dyn Greeter>);
        let bad = LoadedValue::new(42u32);
        assert!(iface.is_satisfied_by(&good));
        assert!(!iface.is_satisfied_by(&bad));
        assert_eq!(bad.type_name(), "u32");

        let greeter = good.downcast::<Box<dyn Greeter>>().unwrap();
        assert_eq!(greeter.greet(), "hello");
    }

    #[test]
    fn clones_share_the_value() {
        let a = LoadedValue::new(String::from("x"));
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&LoadedValue::new(String::from("x"))));
    }
}
