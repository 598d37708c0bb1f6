//! Named non-struct, non-interface types
//!
//! A [`Custom`] node wraps the classification of its underlying type, bound
//! to the same storage. Value access passes straight through to it; methods
//! come from the named type.

use reflector_core::{Descriptor, Handle, Value};

use crate::error::Result;
use crate::instance::Instance;
use crate::interface::Interface;
use crate::method::{lookup, Method};
use crate::ty::{Node, Reflected, Type};

/// A named type such as `type Celsius float64`
#[derive(Debug, Clone)]
pub struct Custom {
    node: Node,
    underlying: Box<Type>,
}

impl Custom {
    pub(crate) fn new(node: Node, underlying: Type) -> Self {
        Self {
            node,
            underlying: Box::new(underlying),
        }
    }

    /// Classification of the underlying type
    pub fn underlying(&self) -> &Type {
        &self.underlying
    }

    /// Methods visible from how this node was reached, sorted by name
    pub fn methods(&self) -> Vec<Method> {
        let (receiver_ty, receiver) = self.receiver();
        receiver_ty
            .method_set()
            .into_iter()
            .map(|entry| {
                Method::new(
                    entry,
                    receiver_ty.clone(),
                    receiver.clone(),
                    Type::Custom(self.clone()),
                )
            })
            .collect()
    }

    /// Number of methods in the visible method set
    pub fn num_method(&self) -> usize {
        self.receiver().0.method_set().len()
    }

    /// Method named `name`, pointer-receiver methods included
    pub fn method_by_name(&self, name: &str) -> Option<Method> {
        let (receiver_ty, receiver) = self.receiver();
        let entry = lookup(&receiver_ty, name)?;
        Some(Method::new(
            entry,
            receiver_ty,
            receiver,
            Type::Custom(self.clone()),
        ))
    }

    /// Whether the visible method set satisfies `iface`
    pub fn implements(&self, iface: &Interface) -> bool {
        self.receiver().0.implements(iface.descriptor())
    }

    fn receiver(&self) -> (Descriptor, Option<Handle>) {
        match self.parent() {
            Some(Type::Pointer(pointer)) => {
                (pointer.descriptor().clone(), pointer.handle().cloned())
            }
            _ => (self.node.descriptor.clone(), self.node.handle.clone()),
        }
    }
}

impl Reflected for Custom {
    fn node(&self) -> &Node {
        &self.node
    }

    fn set_value(&self, value: Value) -> Result<()> {
        if value.ty() == &self.node.descriptor {
            return self.node.store(value);
        }
        self.underlying.set_value(value)
    }

    fn instantiate(&self) -> Result<Instance> {
        let zero = self.underlying.instantiate()?.elem();
        Ok(Instance::new(zero.retyped(&self.node.descriptor)))
    }
}
