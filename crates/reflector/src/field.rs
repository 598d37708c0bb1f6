//! Struct fields

use std::sync::Arc;

use reflector_core::{StructField, Value};

use crate::classify::classify;
use crate::error::Result;
use crate::structure::Struct;
use crate::tag::{Tag, Tags};
use crate::ty::{Node, Reflected, Type};

/// A field of a [`Struct`]
///
/// Values are read and written through the owning struct's handle. Fields
/// reached through an unexported field are never readable.
#[derive(Debug, Clone)]
pub struct Field {
    owner: Struct,
    index: usize,
    decl: StructField,
}

impl Field {
    pub(crate) fn new(owner: Struct, index: usize, decl: StructField) -> Self {
        Self { owner, index, decl }
    }

    /// Declared name; for embedded fields the embedded type's name
    pub fn name(&self) -> &str {
        &self.decl.name
    }

    /// Position in the struct
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether the field name is exported
    pub fn is_exported(&self) -> bool {
        self.decl.is_exported()
    }

    /// Whether the field is embedded
    pub fn is_anonymous(&self) -> bool {
        self.decl.embedded
    }

    /// The struct the field belongs to
    pub fn owner(&self) -> &Struct {
        &self.owner
    }

    /// Declared type, bound to the field's storage when the owner is bound
    pub fn ty(&self) -> Option<Type> {
        let node = self.node();
        classify(&node.descriptor, node.handle, node.parent)
    }

    /// Parsed tags
    pub fn tags(&self) -> Tags {
        Tags::parse(&self.decl.tag)
    }

    /// First tag called `name`
    pub fn tag(&self, name: &str) -> Option<Tag> {
        self.tags().find(name).cloned()
    }

    /// Whether `set_value` may succeed
    pub fn can_set(&self) -> bool {
        self.node().can_set()
    }

    /// Copy of the field value
    pub fn value(&self) -> Result<Value> {
        self.node().load()
    }

    /// Replace the field value
    pub fn set_value(&self, value: Value) -> Result<()> {
        self.node().store(value)
    }

    fn node(&self) -> Node {
        let handle = self
            .owner
            .handle()
            .and_then(|handle| handle.field(self.index).ok());
        Node::new(
            self.decl.ty.clone(),
            handle,
            Some(Arc::new(Type::Struct(self.owner.clone()))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{type_of_descriptor, type_of_value, ReflectError};
    use reflector_core::{builtin, Descriptor};

    const PKG: &str = "github.com/example/people";

    fn person() -> Descriptor {
        let ty = Descriptor::named(PKG, "Person");
        ty.define(&Descriptor::struct_of(vec![
            StructField::new("Name", builtin::string()).with_tag(r#"json:"name" xml:"n""#),
            StructField::new("age", builtin::int()).in_package(PKG),
        ]))
        .unwrap();
        ty
    }

    fn alice() -> Value {
        Value::structure(&person(), vec![Value::string("Alice"), Value::int(30)]).unwrap()
    }

    #[test]
    fn test_attributes() {
        let ty = type_of_descriptor(&person()).unwrap();
        let name = ty.as_struct().unwrap().field(0).unwrap();
        assert!(name.is_exported());
        assert!(!name.is_anonymous());
        assert_eq!(name.tags().len(), 2);
        assert_eq!(name.tag("xml").unwrap().value(), "n");
        assert!(name.ty().unwrap().is_string());
        assert_eq!(name.value(), Err(ReflectError::NilReference));
        assert_eq!(name.owner().num_field(), 2);
    }

    #[test]
    fn test_settable_through_pointer() {
        let target = Value::pointer_to(alice());
        let ty = type_of_value(target.clone()).unwrap();
        let elem = ty.as_pointer().unwrap().elem().unwrap();
        let name = elem.as_struct().unwrap().field(0).unwrap();
        assert_eq!(name.value().unwrap(), Value::string("Alice"));
        assert!(name.can_set());
        name.set_value(Value::string("Bob")).unwrap();
        assert_eq!(target.deref().unwrap().field(0), Some(Value::string("Bob")));

        let bound = name.ty().unwrap();
        assert!(bound.can_set());
        assert!(bound.parent().unwrap().is_struct());
    }

    #[test]
    fn test_unexported_is_sealed() {
        let ty = type_of_value(Value::pointer_to(alice())).unwrap();
        let elem = ty.as_pointer().unwrap().elem().unwrap();
        let age = elem.as_struct().unwrap().field(1).unwrap();
        assert!(!age.is_exported());
        assert!(!age.can_set());
        assert_eq!(age.value(), Err(ReflectError::Unexported));
        assert_eq!(age.set_value(Value::int(1)), Err(ReflectError::Unexported));
    }

    #[test]
    fn test_by_value_struct_is_read_only() {
        let ty = type_of_value(alice()).unwrap();
        let name = ty.as_struct().unwrap().field(0).unwrap();
        assert_eq!(name.value().unwrap(), Value::string("Alice"));
        assert!(!name.can_set());
        assert_eq!(
            name.set_value(Value::string("Bob")),
            Err(ReflectError::CannotSet)
        );
    }
}
