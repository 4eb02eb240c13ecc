//! Capability validation.

use std::panic::{self, AssertUnwindSafe};

use plugboard_core::{Interface, LoadedValue};
use tracing::warn;

/// Whether `value` satisfies `interface`. Never fails: a panicking predicate
/// counts as "not satisfied".
pub fn validate(value: &LoadedValue, interface: &Interface) -> bool {
    panic::catch_unwind(AssertUnwindSafe(|| interface.is_satisfied_by(value))).unwrap_or_else(
        |_| {
            warn!(interface = %interface, "[Validator] Satisfaction predicate panicked");
            false
        },
    )
}
