//! Binding filter: order-preserving selection by group and name.

use plugboard_core::Binding;

/// Keep the bindings whose group and name match the given values.
///
/// `None` matches anything, so with both unset the input comes back unchanged.
pub fn filter_bindings(
    bindings: impl IntoIterator<Item = Binding>,
    group: Option<&str>,
    name: Option<&str>,
) -> Vec<Binding> {
    bindings
        .into_iter()
        .filter(|b| group.map_or(true, |g| b.group() == g))
        .filter(|b| name.map_or(true, |n| b.name() == n))
        .collect()
}
