//! Builtin type names
//!
//! A named type is treated as builtin only if its name appears here and it
//! has no package path. Every other named scalar or composite type is
//! classified as [`Custom`](crate::Custom).

use once_cell::sync::Lazy;
use reflector_core::builtin::PREDECLARED_NAMES;
use reflector_core::Descriptor;
use rustc_hash::FxHashSet;

static BUILTIN_NAMES: Lazy<FxHashSet<&'static str>> =
    Lazy::new(|| PREDECLARED_NAMES.iter().copied().collect());

/// Whether `name` is a builtin type name
pub fn is_builtin_name(name: &str) -> bool {
    BUILTIN_NAMES.contains(name)
}

/// Whether a descriptor denotes a builtin type
pub fn is_builtin(descriptor: &Descriptor) -> bool {
    descriptor.pkg_path().is_empty() && descriptor.type_name().is_some_and(is_builtin_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflector_core::builtin;

    #[test]
    fn test_builtin_names() {
        assert!(is_builtin_name("int"));
        assert!(is_builtin_name("error"));
        assert!(!is_builtin_name("Dessert"));
    }

    #[test]
    fn test_named_types_are_not_builtin() {
        assert!(is_builtin(&builtin::float64()));
        let named = Descriptor::named("example.com/food", "string");
        named.define(&builtin::string()).unwrap();
        assert!(!is_builtin(&named));
        assert!(!is_builtin(&Descriptor::slice_of(&builtin::int())));
    }
}
