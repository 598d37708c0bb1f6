//! Storage cells and handles
//!
//! Every variable, struct field, array element and pointee lives in a
//! [`Slot`]. A [`Handle`] is a view onto a slot that remembers how it was
//! reached: only handles that denote a variable are addressable, and handles
//! reached through an unexported field are read-only.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::descriptor::{Descriptor, Kind};
use crate::error::{CoreError, Result};
use crate::value::{round_complex, round_float, wrap_signed, wrap_unsigned, Data, Value};

/// A shared, lockable storage cell
pub type Slot = Arc<RwLock<Value>>;

/// Allocate a cell holding `value`
pub fn new_slot(value: Value) -> Slot {
    Arc::new(RwLock::new(value))
}

/// A view onto a storage cell
#[derive(Debug, Clone)]
pub struct Handle {
    slot: Slot,
    addressable: bool,
    read_only: bool,
}

impl Handle {
    /// Handle to a private copy of `value`; it cannot be written through
    pub fn detached(value: Value) -> Self {
        Self {
            slot: new_slot(value),
            addressable: false,
            read_only: false,
        }
    }

    /// Handle denoting the variable stored in `slot`
    pub fn addressable(slot: Slot) -> Self {
        Self {
            slot,
            addressable: true,
            read_only: false,
        }
    }

    /// Underlying cell
    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    /// Whether the handle denotes a variable
    pub fn is_addressable(&self) -> bool {
        self.addressable
    }

    /// Whether the handle was reached through an unexported field
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Whether stores through the handle are permitted
    pub fn can_set(&self) -> bool {
        self.addressable && !self.read_only
    }

    /// Static type of the stored value
    pub fn ty(&self) -> Descriptor {
        self.slot.read().ty().clone()
    }

    /// Kind of the stored value
    pub fn kind(&self) -> Kind {
        self.slot.read().kind()
    }

    /// Copy of the stored value
    pub fn load(&self) -> Value {
        self.slot.read().clone()
    }

    /// Borrow the stored value
    pub fn with<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        f(&self.slot.read())
    }

    fn check_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(CoreError::ReadOnly);
        }
        if !self.addressable {
            return Err(CoreError::NotAddressable);
        }
        Ok(())
    }

    /// Store `value`, converting it to the cell's static type
    ///
    /// Aggregates are written element by element so that handles to inner
    /// cells keep observing the variable.
    pub fn store(&self, value: Value) -> Result<()> {
        self.check_writable()?;
        let value = value.assign_to(&self.ty())?;
        write_into(&self.slot, value);
        Ok(())
    }

    /// Replace a scalar payload, keeping the static type
    ///
    /// The payload is normalised to the width of the cell's kind.
    pub fn store_scalar(&self, data: Data) -> Result<()> {
        self.check_writable()?;
        let mut cell = self.slot.write();
        let kind = cell.kind();
        let data = match (data, kind) {
            (Data::Bool(v), Kind::Bool) => Data::Bool(v),
            (Data::String(v), Kind::String) => Data::String(v),
            (Data::Int(v), k) if k.is_signed() => Data::Int(wrap_signed(i128::from(v), k)),
            (Data::Uint(v), k) if k.is_unsigned() => Data::Uint(wrap_unsigned(i128::from(v), k)),
            (Data::Float(v), k) if k.is_float() => Data::Float(round_float(v, k)),
            (Data::Complex(v), k) if k.is_complex() => Data::Complex(round_complex(v, k)),
            (other, kind) => {
                return Err(CoreError::KindMismatch {
                    expected: kind.to_string(),
                    actual: format!("{other:?}"),
                });
            }
        };
        let ty = cell.ty().clone();
        *cell = Value::from_parts(ty, data);
        Ok(())
    }

    /// Pointer to the variable
    pub fn address(&self) -> Result<Value> {
        if self.read_only {
            return Err(CoreError::ReadOnly);
        }
        if !self.addressable {
            return Err(CoreError::NotAddressable);
        }
        Ok(Value::pointer_from_slot(&self.ty(), self.slot.clone()))
    }

    /// Handle to a struct field
    pub fn field(&self, index: usize) -> Result<Handle> {
        self.field_handle(index, true)
    }

    /// Handle to an embedded field walked while promoting a method
    ///
    /// The field's own name does not seal the handle; only the parent's
    /// read-only state carries over.
    pub fn embedded_field(&self, index: usize) -> Result<Handle> {
        self.field_handle(index, false)
    }

    fn field_handle(&self, index: usize, seal: bool) -> Result<Handle> {
        let value = self.slot.read();
        let (Data::Struct(cells), Some(decls)) = (value.data(), value.ty().fields()) else {
            return Err(CoreError::KindMismatch {
                expected: Kind::Struct.to_string(),
                actual: value.kind().to_string(),
            });
        };
        let (Some(cell), Some(decl)) = (cells.get(index), decls.get(index)) else {
            return Err(CoreError::IndexOutOfRange {
                index,
                len: cells.len(),
            });
        };
        Ok(Handle {
            slot: cell.clone(),
            addressable: self.addressable,
            read_only: self.read_only || (seal && !decl.is_exported()),
        })
    }

    /// Handle to an array or slice element
    ///
    /// Slice elements are always addressable; array elements inherit the
    /// addressability of the array.
    pub fn index(&self, index: usize) -> Result<Handle> {
        let value = self.slot.read();
        let (cell, addressable, len) = match value.data() {
            Data::Array(cells) => (cells.get(index), self.addressable, cells.len()),
            Data::Slice(Some(header)) => (header.cell(index), true, header.len()),
            Data::Slice(None) => (None, true, 0),
            _ => {
                return Err(CoreError::KindMismatch {
                    expected: "array or slice".to_string(),
                    actual: value.kind().to_string(),
                })
            }
        };
        let cell = cell.ok_or(CoreError::IndexOutOfRange { index, len })?;
        Ok(Handle {
            slot: cell.clone(),
            addressable,
            read_only: self.read_only,
        })
    }

    /// Handle to a pointee or to the dynamic value of an interface
    ///
    /// Returns `None` for nil. Pointees are addressable, interface contents
    /// are not.
    pub fn elem(&self) -> Result<Option<Handle>> {
        let value = self.slot.read();
        match value.data() {
            Data::Pointer(cell) => Ok(cell.as_ref().map(|cell| Handle {
                slot: cell.clone(),
                addressable: true,
                read_only: self.read_only,
            })),
            Data::Interface(cell) => Ok(cell.as_ref().map(|cell| Handle {
                slot: cell.clone(),
                addressable: false,
                read_only: self.read_only,
            })),
            _ => Err(CoreError::KindMismatch {
                expected: "pointer or interface".to_string(),
                actual: value.kind().to_string(),
            }),
        }
    }

    /// Whether two handles refer to the same cell
    pub fn same_slot(&self, other: &Handle) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

/// Write `value` into `slot`, descending into struct and array cells
pub(crate) fn write_into(slot: &Slot, value: Value) {
    let existing = {
        let current = slot.read();
        match current.data() {
            Data::Struct(cells) | Data::Array(cells) => Some(cells.clone()),
            _ => None,
        }
    };
    let (ty, data) = value.into_parts();
    match (existing, data) {
        (Some(cells), Data::Struct(incoming) | Data::Array(incoming))
            if cells.len() == incoming.len() =>
        {
            for (cell, next) in cells.iter().zip(&incoming) {
                let next = next.read().clone();
                write_into(cell, next);
            }
            let mut current = slot.write();
            let is_struct = matches!(current.data(), Data::Struct(_));
            *current = if is_struct {
                Value::from_parts(ty, Data::Struct(cells))
            } else {
                Value::from_parts(ty, Data::Array(cells))
            };
        }
        (_, data) => *slot.write() = Value::from_parts(ty, data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;
    use crate::descriptor::StructField;

    fn person() -> Descriptor {
        let ty = Descriptor::named("example.com/people", "Person");
        ty.define(&Descriptor::struct_of(vec![
            StructField::new("Name", builtin::string()),
            StructField::new("age", builtin::int()).in_package("example.com/people"),
        ]))
        .unwrap();
        ty
    }

    #[test]
    fn test_detached_is_not_settable() {
        let handle = Handle::detached(Value::int(1));
        assert!(!handle.can_set());
        assert_eq!(handle.store(Value::int(2)), Err(CoreError::NotAddressable));
        assert!(handle.address().is_err());
    }

    #[test]
    fn test_unexported_field_is_read_only() {
        let value = Value::structure(&person(), vec![Value::string("Ann"), Value::int(30)]).unwrap();
        let handle = Handle::addressable(new_slot(value));
        let name = handle.field(0).unwrap();
        let age = handle.field(1).unwrap();
        assert!(name.can_set());
        assert!(age.is_read_only());
        assert_eq!(age.store(Value::int(1)), Err(CoreError::ReadOnly));
        name.store(Value::string("Bob")).unwrap();
        assert_eq!(handle.load().field(0).unwrap().as_str(), Some("Bob"));
    }

    #[test]
    fn test_read_only_handle_has_no_address() {
        let value = Value::structure(&person(), vec![Value::string("Ann"), Value::int(30)]).unwrap();
        let handle = Handle::addressable(new_slot(value));
        assert!(handle.field(0).unwrap().address().is_ok());
        assert_eq!(handle.field(1).unwrap().address(), Err(CoreError::ReadOnly));

        let embedded = handle.embedded_field(1).unwrap();
        assert!(!embedded.is_read_only());
        assert!(embedded.address().is_ok());
    }

    #[test]
    fn test_store_keeps_inner_handles_live() {
        let value = Value::structure(&person(), vec![Value::string("Ann"), Value::int(30)]).unwrap();
        let handle = Handle::addressable(new_slot(value));
        let name = handle.field(0).unwrap();
        handle
            .store(Value::structure(&person(), vec![Value::string("Cid"), Value::int(1)]).unwrap())
            .unwrap();
        assert_eq!(name.load().as_str(), Some("Cid"));
    }

    #[test]
    fn test_store_scalar_wraps_width() {
        let handle = Handle::addressable(new_slot(Value::zero(&builtin::int8())));
        handle.store_scalar(Data::Int(127)).unwrap();
        assert_eq!(handle.load().as_int(), Some(127));
        assert!(handle.store_scalar(Data::String("x".into())).is_err());
    }

    #[test]
    fn test_slice_elements_are_addressable() {
        let slice = Value::slice(&builtin::int(), vec![Value::int(1)]).unwrap();
        let handle = Handle::detached(slice.clone());
        let first = handle.index(0).unwrap();
        assert!(first.can_set());
        first.store(Value::int(7)).unwrap();
        assert_eq!(slice.elements().unwrap()[0].as_int(), Some(7));
        assert!(matches!(
            handle.index(1),
            Err(CoreError::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_array_elements_inherit_addressability() {
        let array = Value::array(&builtin::int(), vec![Value::int(1), Value::int(2)]).unwrap();
        assert!(!Handle::detached(array.clone()).index(0).unwrap().can_set());
        assert!(Handle::addressable(new_slot(array)).index(0).unwrap().can_set());
    }

    #[test]
    fn test_pointer_elem_is_addressable() {
        let handle = Handle::detached(Value::pointer_to(Value::int(3)));
        let elem = handle.elem().unwrap().unwrap();
        assert!(elem.can_set());
        let nil = Handle::detached(Value::zero(&Descriptor::pointer_to(&builtin::int())));
        assert!(nil.elem().unwrap().is_none());
    }
}
