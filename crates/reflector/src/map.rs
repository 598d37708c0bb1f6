//! Map variant
//!
//! `key_set`, `value_set` and `entry_set` copy the current contents; later
//! mutations are not reflected in snapshots already taken.

use reflector_core::{MapKey, MapObject, Value};

use crate::classify::classify;
use crate::error::{ReflectError, Result};
use crate::instance::Instance;
use crate::ty::{Node, Reflected, Type};

/// A key/value pair copied out of a map
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    key: Value,
    value: Value,
}

impl Entry {
    /// Key
    pub fn key(&self) -> &Value {
        &self.key
    }

    /// Value
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Split into key and value
    pub fn into_parts(self) -> (Value, Value) {
        (self.key, self.value)
    }
}

/// `map[K]V`
#[derive(Debug, Clone)]
pub struct Map {
    node: Node,
}

impl Map {
    pub(crate) fn new(node: Node) -> Self {
        Self { node }
    }

    /// Key type
    pub fn key(&self) -> Option<Type> {
        classify(&self.node.descriptor.key()?, None, None)
    }

    /// Element type
    pub fn elem(&self) -> Option<Type> {
        classify(&self.node.descriptor.elem()?, None, None)
    }

    /// Number of entries
    pub fn len(&self) -> Result<usize> {
        Ok(self.node.load()?.len().unwrap_or_default())
    }

    /// Whether the bound map has no entries
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Value stored under `key`; `Ok(None)` when absent
    pub fn get(&self, key: Value) -> Result<Option<Value>> {
        let value = self.node.load()?;
        let key = self.map_key(key)?;
        Ok(value.as_map().and_then(|map| map.get(&key)))
    }

    /// Whether `key` is present
    pub fn contains(&self, key: Value) -> Result<bool> {
        let value = self.node.load()?;
        let key = self.map_key(key)?;
        Ok(value.as_map().is_some_and(|map| map.contains(&key)))
    }

    /// Insert or replace an entry
    pub fn put(&self, key: Value, elem: Value) -> Result<()> {
        let value = self.writable()?;
        let (key, elem) = value.check_map_entry(key, elem)?;
        table(&value)?.insert(key, elem);
        Ok(())
    }

    /// Remove an entry; absent keys are ignored
    pub fn delete(&self, key: Value) -> Result<()> {
        let value = self.writable()?;
        let key = self.map_key(key)?;
        table(&value)?.remove(&key);
        Ok(())
    }

    /// Remove every entry
    pub fn clear(&self) -> Result<()> {
        let value = self.writable()?;
        table(&value)?.clear();
        Ok(())
    }

    /// Snapshot of the keys
    pub fn key_set(&self) -> Result<Vec<Value>> {
        Ok(self.snapshot()?.into_iter().map(|(k, _)| k).collect())
    }

    /// Snapshot of the values
    pub fn value_set(&self) -> Result<Vec<Value>> {
        Ok(self.snapshot()?.into_iter().map(|(_, v)| v).collect())
    }

    /// Snapshot of the entries
    pub fn entry_set(&self) -> Result<Vec<Entry>> {
        Ok(self
            .snapshot()?
            .into_iter()
            .map(|(key, value)| Entry { key, value })
            .collect())
    }

    fn snapshot(&self) -> Result<Vec<(Value, Value)>> {
        Ok(self.node.load()?.entries().unwrap_or_default())
    }

    fn writable(&self) -> Result<Value> {
        self.node.settable()?;
        self.node.load()
    }

    fn map_key(&self, key: Value) -> Result<MapKey> {
        let key_ty = self
            .node
            .descriptor
            .key()
            .ok_or_else(|| ReflectError::invalid_type(&self.node.descriptor, key.ty()))?;
        Ok(MapKey::new(key.assign_to(&key_ty)?)?)
    }
}

fn table(value: &Value) -> Result<&MapObject> {
    value.as_map().ok_or(ReflectError::NilReference)
}

impl Reflected for Map {
    fn node(&self) -> &Node {
        &self.node
    }

    fn instantiate(&self) -> Result<Instance> {
        Ok(Instance::new(Value::empty_map(&self.node.descriptor)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{type_of, type_of_handle, type_of_value};
    use reflector_core::{builtin, new_slot, Handle};

    fn ages() -> Value {
        Value::map(
            &builtin::string(),
            &builtin::int(),
            vec![
                (Value::string("ann"), Value::int(31)),
                (Value::string("bob"), Value::int(0)),
            ],
        )
        .unwrap()
    }

    fn variable(value: Value) -> Type {
        type_of_handle(Handle::addressable(new_slot(value))).unwrap()
    }

    #[test]
    fn test_key_and_elem_types() {
        let ty = type_of::<std::collections::HashMap<String, f64>>().unwrap();
        let map = ty.as_map().unwrap();
        assert!(map.key().unwrap().is_string());
        assert!(map.elem().unwrap().is_float());
        assert!(map.key().unwrap().parent().is_none());
        assert_eq!(map.len(), Err(ReflectError::NilReference));
    }

    #[test]
    fn test_get_distinguishes_missing_from_zero() {
        let ty = type_of_value(ages()).unwrap();
        let map = ty.as_map().unwrap();
        assert_eq!(map.get(Value::string("bob")).unwrap(), Some(Value::int(0)));
        assert_eq!(map.get(Value::string("cid")).unwrap(), None);
        assert!(map.contains(Value::string("ann")).unwrap());
        assert!(map.get(Value::int(1)).is_err());
    }

    #[test]
    fn test_mutation_requires_settable() {
        let ty = type_of_value(ages()).unwrap();
        let map = ty.as_map().unwrap();
        assert_eq!(
            map.put(Value::string("cid"), Value::int(3)),
            Err(ReflectError::CannotSet)
        );
        assert_eq!(map.clear(), Err(ReflectError::CannotSet));
    }

    #[test]
    fn test_put_delete_clear() {
        let ty = variable(ages());
        let map = ty.as_map().unwrap();
        map.put(Value::string("cid"), Value::int(7)).unwrap();
        assert_eq!(map.len().unwrap(), 3);
        map.delete(Value::string("ann")).unwrap();
        map.delete(Value::string("zed")).unwrap();
        assert_eq!(map.len().unwrap(), 2);
        assert!(matches!(
            map.put(Value::string("x"), Value::string("y")),
            Err(ReflectError::InvalidType { .. })
        ));
        map.clear().unwrap();
        assert!(map.is_empty().unwrap());
    }

    #[test]
    fn test_nil_map_put_fails() {
        let ty = variable(Value::zero(&reflector_core::Descriptor::map_of(
            &builtin::string(),
            &builtin::int(),
        )));
        let map = ty.as_map().unwrap();
        assert_eq!(map.len().unwrap(), 0);
        assert_eq!(map.get(Value::string("a")).unwrap(), None);
        assert_eq!(
            map.put(Value::string("a"), Value::int(1)),
            Err(ReflectError::NilReference)
        );
    }

    #[test]
    fn test_snapshots_are_copies() {
        let ty = variable(ages());
        let map = ty.as_map().unwrap();
        let entries = map.entry_set().unwrap();
        assert_eq!(entries.len(), map.len().unwrap());
        for entry in &entries {
            assert_eq!(map.get(entry.key().clone()).unwrap().as_ref(), Some(entry.value()));
        }
        map.clear().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(map.key_set().unwrap().is_empty());
    }

    #[test]
    fn test_instantiate_is_empty_not_nil() {
        let ty = type_of::<std::collections::HashMap<String, isize>>().unwrap();
        let instance = ty.instantiate().unwrap();
        assert!(!instance.elem().is_nil());
        let map = instance.reflect().unwrap();
        map.as_map()
            .unwrap()
            .put(Value::string("a"), Value::int(1))
            .unwrap();
        assert_eq!(instance.elem().len(), Some(1));
    }
}
