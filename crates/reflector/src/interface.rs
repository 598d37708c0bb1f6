//! Interface variant
//!
//! A bound, non-nil interface resolves each of its methods against the
//! dynamic value it holds, so invoking one reaches the concrete
//! implementation. Otherwise the abstract signatures are returned and
//! dispatch happens at call time.

use std::sync::Arc;

use reflector_core::Handle;

use crate::classify::classify;
use crate::error::Result;
use crate::method::Method;
use crate::ty::{Node, Reflected, Type};

/// `interface { ... }`
#[derive(Debug, Clone)]
pub struct Interface {
    node: Node,
}

impl Interface {
    pub(crate) fn new(node: Node) -> Self {
        Self { node }
    }

    /// Number of declared methods
    pub fn num_method(&self) -> usize {
        self.node
            .descriptor
            .interface_methods()
            .map_or(0, <[_]>::len)
    }

    /// Whether the bound interface holds no value
    pub fn is_nil(&self) -> Result<bool> {
        Ok(self.node.load()?.is_nil())
    }

    /// The dynamic value, classified under its own type
    pub fn elem(&self) -> Option<Type> {
        let dynamic = self.dynamic()?;
        let ty = dynamic.ty();
        classify(&ty, Some(dynamic), Some(Arc::new(Type::Interface(self.clone()))))
    }

    /// Methods, sorted by name
    pub fn methods(&self) -> Vec<Method> {
        let owner = Type::Interface(self.clone());
        let abstract_set = self.node.descriptor.method_set();

        let Some(dynamic) = self.dynamic() else {
            return abstract_set
                .into_iter()
                .map(|entry| {
                    Method::new(
                        entry,
                        self.node.descriptor.clone(),
                        self.node.handle.clone(),
                        owner.clone(),
                    )
                })
                .collect();
        };

        let concrete_ty = dynamic.ty();
        let concrete = concrete_ty.method_set();
        abstract_set
            .into_iter()
            .filter_map(|entry| {
                let resolved = concrete
                    .iter()
                    .find(|m| m.name == entry.name && m.pkg_path == entry.pkg_path)?;
                Some(Method::new(
                    resolved.clone(),
                    concrete_ty.clone(),
                    Some(dynamic.clone()),
                    owner.clone(),
                ))
            })
            .collect()
    }

    /// Method called `name`
    pub fn method_by_name(&self, name: &str) -> Option<Method> {
        self.methods()
            .into_iter()
            .find(|method| method.name() == name)
    }

    fn dynamic(&self) -> Option<Handle> {
        let handle = self.node.handle.as_ref()?;
        if handle.is_read_only() {
            return None;
        }
        handle.elem().ok().flatten()
    }
}

impl Reflected for Interface {
    fn node(&self) -> &Node {
        &self.node
    }
}
