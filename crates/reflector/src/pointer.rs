//! Pointer variant

use std::sync::Arc;

use crate::classify::classify;
use crate::error::Result;
use crate::ty::{Node, Reflected, Type};

/// `*T`
///
/// `can_set` covers the pointer variable itself. Whether the pointee may be
/// written is answered by the node returned from [`Pointer::elem`].
#[derive(Debug, Clone)]
pub struct Pointer {
    node: Node,
}

impl Pointer {
    pub(crate) fn new(node: Node) -> Self {
        Self { node }
    }

    /// The pointee, bound to the pointed-to cell when the pointer is bound
    /// and not nil
    pub fn elem(&self) -> Option<Type> {
        let elem = self.node.descriptor.elem()?;
        let handle = self
            .node
            .handle
            .as_ref()
            .and_then(|handle| handle.elem().ok().flatten());
        classify(&elem, handle, Some(Arc::new(Type::Pointer(self.clone()))))
    }

    /// Whether the bound pointer is nil
    pub fn is_nil(&self) -> Result<bool> {
        Ok(self.node.load()?.is_nil())
    }
}

impl Reflected for Pointer {
    fn node(&self) -> &Node {
        &self.node
    }

    fn package_name(&self) -> String {
        match self.node.descriptor.elem() {
            Some(elem) => elem.package_name().to_string(),
            None => String::new(),
        }
    }

    fn package_path(&self) -> String {
        match self.node.descriptor.elem() {
            Some(elem) => elem.pkg_path().to_string(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{type_of_descriptor, type_of_value, ReflectError};
    use reflector_core::{builtin, Descriptor, Value};

    #[test]
    fn test_elem_is_settable_through_pointer() {
        let target = Value::pointer_to(Value::int(1));
        let ty = type_of_value(target.clone()).unwrap();
        assert!(!ty.can_set());

        let elem = ty.as_pointer().unwrap().elem().unwrap();
        assert!(elem.can_set());
        assert!(elem.parent().unwrap().is_pointer());
        elem.set_value(Value::int(42)).unwrap();
        assert_eq!(target.deref(), Some(Value::int(42)));
    }

    #[test]
    fn test_nil_pointer_elem_is_unbound() {
        let ty = type_of_value(Value::zero(&Descriptor::pointer_to(&builtin::int()))).unwrap();
        let pointer = ty.as_pointer().unwrap();
        assert!(pointer.is_nil().unwrap());
        let elem = pointer.elem().unwrap();
        assert!(!elem.has_value());
        assert_eq!(elem.value(), Err(ReflectError::NilReference));
    }

    #[test]
    fn test_identity_follows_pointee() {
        let dessert = Descriptor::named("github.com/example/bakery", "Dessert");
        dessert.define(&Descriptor::struct_of(vec![])).unwrap();
        let ty = type_of_descriptor(&Descriptor::pointer_to(&dessert)).unwrap();
        assert_eq!(ty.name(), "*Dessert");
        assert_eq!(ty.package_name(), "bakery");
        assert_eq!(ty.package_path(), "github.com/example/bakery");
    }
}
