//! Slice variant
//!
//! Length and capacity exist only on a bound slice. `append` stores the
//! grown slice back through the bound handle, so the caller's variable
//! observes the new length; after a reallocation the old and new values no
//! longer share elements.

use std::sync::Arc;

use reflector_core::{Data, Value};

use crate::classify::classify;
use crate::error::{ReflectError, Result};
use crate::instance::Instance;
use crate::ty::{Node, Reflected, Type};

/// `[]T`
#[derive(Debug, Clone)]
pub struct Slice {
    node: Node,
}

impl Slice {
    pub(crate) fn new(node: Node) -> Self {
        Self { node }
    }

    /// Element type, shared by every element
    pub fn elem(&self) -> Option<Type> {
        classify(&self.node.descriptor.elem()?, None, None)
    }

    /// Current length
    pub fn len(&self) -> Result<usize> {
        Ok(self.node.load()?.len().unwrap_or_default())
    }

    /// Whether the bound slice has no elements
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Current capacity
    pub fn cap(&self) -> Result<usize> {
        Ok(self.node.load()?.cap().unwrap_or_default())
    }

    /// Whether the bound slice is nil
    pub fn is_nil(&self) -> Result<bool> {
        Ok(self.node.load()?.is_nil())
    }

    /// Copy of element `index`
    pub fn get(&self, index: usize) -> Result<Value> {
        Ok(self.node.readable()?.index(index)?.load())
    }

    /// Replace element `index`
    pub fn set(&self, index: usize, value: Value) -> Result<()> {
        self.node.settable()?.index(index)?.store(value)?;
        Ok(())
    }

    /// Element `index` as a node bound to its cell
    pub fn element(&self, index: usize) -> Result<Option<Type>> {
        let handle = self.node.readable()?.index(index)?;
        Ok(classify(
            &handle.ty(),
            Some(handle),
            Some(Arc::new(Type::Slice(self.clone()))),
        ))
    }

    /// Append `items` and store the result in the bound variable
    pub fn append(&self, items: Vec<Value>) -> Result<()> {
        self.node.settable()?;
        let grown = self.node.load()?.append(items)?;
        self.node.store(grown)
    }

    /// `s[low:high]`, sharing elements with the bound slice
    pub fn slice(&self, low: usize, high: usize) -> Result<Value> {
        let value = self.node.load()?;
        let len = value.len().unwrap_or_default();
        if low > high || high > len {
            return Err(ReflectError::SliceBounds { low, high, len });
        }
        let data = match value.as_slice() {
            Some(header) => Data::Slice(Some(header.reslice(low, high)?)),
            None => Data::Slice(None),
        };
        Ok(Value::from_parts(value.ty().clone(), data))
    }

    /// Copy elements into `dst`; returns the number copied
    ///
    /// The count is the shorter of the two lengths, not `dst`'s capacity:
    /// elements past `dst`'s length stay untouched.
    pub fn copy(&self, dst: &Slice) -> Result<usize> {
        let src = self.node.load()?;
        let target = dst.node.load()?;
        if target.is_nil() {
            return Err(ReflectError::NilReference);
        }
        if self.node.descriptor.elem() != dst.node.descriptor.elem() {
            return Err(ReflectError::invalid_type(
                &dst.node.descriptor,
                &self.node.descriptor,
            ));
        }
        Ok(src.copy_into(&target)?)
    }
}

impl Reflected for Slice {
    fn node(&self) -> &Node {
        &self.node
    }

    fn instantiate(&self) -> Result<Instance> {
        Ok(Instance::new(Value::make_slice(&self.node.descriptor, 0, 0)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{type_of, type_of_handle, type_of_value};
    use reflector_core::{builtin, new_slot, Handle};

    fn ints(values: &[i64]) -> Value {
        Value::slice(&builtin::int(), values.iter().copied().map(Value::int).collect()).unwrap()
    }

    fn variable(value: Value) -> (Handle, Type) {
        let handle = Handle::addressable(new_slot(value));
        (handle.clone(), type_of_handle(handle).unwrap())
    }

    #[test]
    fn test_type_only() {
        let ty = type_of::<Vec<String>>().unwrap();
        let slice = ty.as_slice().unwrap();
        assert!(slice.elem().unwrap().is_string());
        assert_eq!(slice.len(), Err(ReflectError::NilReference));
    }

    #[test]
    fn test_get_and_set() {
        let (_, ty) = variable(ints(&[1, 2, 3]));
        let slice = ty.as_slice().unwrap();
        assert_eq!(slice.get(1).unwrap(), Value::int(2));
        assert!(matches!(
            slice.get(3),
            Err(ReflectError::IndexOutOfRange { index: 3, len: 3 })
        ));
        slice.set(0, Value::int(9)).unwrap();
        assert_eq!(slice.get(0).unwrap(), Value::int(9));
        assert!(slice.set(3, Value::int(0)).is_err());
        assert_eq!(slice.len().unwrap(), 3);
    }

    #[test]
    fn test_append_updates_variable() {
        let (handle, ty) = variable(ints(&[1]));
        let slice = ty.as_slice().unwrap();
        slice.append(vec![Value::int(2), Value::int(3)]).unwrap();
        assert_eq!(slice.len().unwrap(), 3);
        assert_eq!(handle.load().len(), Some(3));
        assert_eq!(slice.get(2).unwrap(), Value::int(3));
    }

    #[test]
    fn test_append_requires_settable() {
        let ty = type_of_value(ints(&[1])).unwrap();
        assert_eq!(
            ty.as_slice().unwrap().append(vec![Value::int(2)]),
            Err(ReflectError::CannotSet)
        );
    }

    #[test]
    fn test_slice_expression() {
        let ty = type_of_value(ints(&[1, 2, 3, 4])).unwrap();
        let slice = ty.as_slice().unwrap();
        let middle = slice.slice(1, 3).unwrap();
        assert_eq!(middle.elements().unwrap(), vec![Value::int(2), Value::int(3)]);
        assert_eq!(
            slice.slice(3, 5),
            Err(ReflectError::SliceBounds {
                low: 3,
                high: 5,
                len: 4
            })
        );
        assert!(slice.slice(3, 2).is_err());
    }

    #[test]
    fn test_copy() {
        let src = type_of_value(ints(&[1, 2, 3])).unwrap();
        let dst_value = Value::make_slice(src.descriptor(), 2, 2).unwrap();
        let dst = type_of_value(dst_value.clone()).unwrap();
        let copied = src.as_slice().unwrap().copy(dst.as_slice().unwrap()).unwrap();
        assert_eq!(copied, 2);
        assert_eq!(dst_value.elements().unwrap(), vec![Value::int(1), Value::int(2)]);
    }

    #[test]
    fn test_copy_rejects_nil_and_mismatch() {
        let src = type_of_value(ints(&[1])).unwrap();
        let nil = type_of_value(Value::zero(src.descriptor())).unwrap();
        assert_eq!(
            src.as_slice().unwrap().copy(nil.as_slice().unwrap()),
            Err(ReflectError::NilReference)
        );
        let strings = type_of_value(
            Value::slice(&builtin::string(), vec![Value::string("a")]).unwrap(),
        )
        .unwrap();
        assert!(matches!(
            src.as_slice().unwrap().copy(strings.as_slice().unwrap()),
            Err(ReflectError::InvalidType { .. })
        ));
        let unbound = type_of::<Vec<isize>>().unwrap();
        assert_eq!(
            unbound.as_slice().unwrap().copy(src.as_slice().unwrap()),
            Err(ReflectError::NilReference)
        );
    }

    #[test]
    fn test_instantiate_is_empty_not_nil() {
        let instance = type_of::<Vec<isize>>().unwrap().instantiate().unwrap();
        let elem = instance.elem();
        assert!(!elem.is_nil());
        assert_eq!(elem.len(), Some(0));
    }
}
