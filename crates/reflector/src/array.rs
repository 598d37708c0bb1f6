//! Array variant

use std::sync::Arc;

use reflector_core::Value;

use crate::classify::classify;
use crate::error::Result;
use crate::ty::{Node, Reflected, Type};

/// `[N]T`
#[derive(Debug, Clone)]
pub struct Array {
    node: Node,
}

impl Array {
    pub(crate) fn new(node: Node) -> Self {
        Self { node }
    }

    /// Element type, shared by every element
    pub fn elem(&self) -> Option<Type> {
        classify(&self.node.descriptor.elem()?, None, None)
    }

    /// Fixed length
    pub fn len(&self) -> usize {
        self.node.descriptor.array_len().unwrap_or_default()
    }

    /// Whether the array type has no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
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
            Some(Arc::new(Type::Array(self.clone()))),
        ))
    }
}

impl Reflected for Array {
    fn node(&self) -> &Node {
        &self.node
    }
}
