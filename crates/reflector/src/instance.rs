//! Instances produced by `instantiate`

use reflector_core::{new_slot, Descriptor, Handle, Slot, Value};

use crate::classify::classify;
use crate::ty::Type;

/// A freshly allocated value owned by the caller
///
/// The value lives in its own storage cell; it never aliases the node that
/// produced it.
#[derive(Debug, Clone)]
pub struct Instance {
    slot: Slot,
}

impl Instance {
    pub(crate) fn new(value: Value) -> Self {
        Self {
            slot: new_slot(value),
        }
    }

    /// Pointer to the instance
    pub fn val(&self) -> Value {
        Value::pointer_from_slot(&self.ty(), self.slot.clone())
    }

    /// Copy of the instance
    pub fn elem(&self) -> Value {
        self.slot.read().clone()
    }

    /// Addressable handle to the instance
    pub fn handle(&self) -> Handle {
        Handle::addressable(self.slot.clone())
    }

    /// Type of the instance
    pub fn ty(&self) -> Descriptor {
        self.slot.read().ty().clone()
    }

    /// Settable classification of the instance
    pub fn reflect(&self) -> Option<Type> {
        classify(&self.ty(), Some(self.handle()), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reflected;
    use reflector_core::builtin;

    #[test]
    fn test_val_and_elem_share_storage() {
        let instance = Instance::new(Value::zero(&builtin::int()));
        let ptr = instance.val();
        assert_eq!(ptr.ty().name(), "*int");
        *ptr.pointee().unwrap().write() = Value::int(8);
        assert_eq!(instance.elem(), Value::int(8));
    }

    #[test]
    fn test_reflect_is_settable() {
        let instance = Instance::new(Value::zero(&builtin::string()));
        let ty = instance.reflect().unwrap();
        ty.set_value(Value::string("hi")).unwrap();
        assert_eq!(instance.elem(), Value::string("hi"));
    }
}
