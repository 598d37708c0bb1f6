//! Method variant
//!
//! A method is reached through the struct, interface or named type that
//! owns it. Calls walk the embedding path from the receiver, then pick the
//! receiver form the declaration needs: a held pointer is passed as is, an
//! addressable value passes its own address, and anything else passes a
//! pointer to a fresh copy.

use std::sync::Arc;

use reflector_core::{
    native, Descriptor, Handle, Kind, MethodDecl, MethodEntry, MethodTarget, Signature, Value,
};
use tracing::trace;

use crate::error::{ReflectError, Result};
use crate::instance::Instance;
use crate::invoke::{bind_arguments, classify_all};
use crate::ty::{Node, Reflected, Type};

/// A method bound (or not) to a receiver
#[derive(Debug, Clone)]
pub struct Method {
    node: Node,
    entry: MethodEntry,
    receiver_ty: Descriptor,
    receiver: Option<Handle>,
}

impl Method {
    pub(crate) fn new(
        entry: MethodEntry,
        receiver_ty: Descriptor,
        receiver: Option<Handle>,
        owner: Type,
    ) -> Self {
        let node = Node::new(
            Descriptor::func_of(entry.sig.clone()),
            None,
            Some(Arc::new(owner)),
        );
        Self {
            node,
            entry,
            receiver_ty,
            receiver,
        }
    }

    /// Whether the method is visible outside its package
    pub fn is_exported(&self) -> bool {
        self.entry.is_exported()
    }

    /// Whether the method was promoted from an embedded field
    pub fn is_promoted(&self) -> bool {
        self.entry.is_promoted()
    }

    /// Whether the declaration takes a pointer receiver
    pub fn has_pointer_receiver(&self) -> bool {
        match &self.entry.target {
            MethodTarget::Declared(decl) => decl.pointer_receiver(),
            MethodTarget::Interface => false,
        }
    }

    /// The node the method was reached through
    pub fn receiver(&self) -> Option<Type> {
        self.parent().cloned()
    }

    /// Parameter and result types, without the receiver
    pub fn signature(&self) -> &Signature {
        &self.entry.sig
    }

    /// Parameter types, in order
    pub fn parameters(&self) -> Vec<Option<Type>> {
        classify_all(&self.entry.sig.params)
    }

    /// Parameter `index`
    pub fn parameter(&self, index: usize) -> Option<Type> {
        self.parameters().into_iter().nth(index).flatten()
    }

    /// Number of declared parameters
    pub fn num_parameter(&self) -> usize {
        self.entry.sig.params.len()
    }

    /// Result types, in order
    pub fn results(&self) -> Vec<Option<Type>> {
        classify_all(&self.entry.sig.results)
    }

    /// Result `index`
    pub fn result(&self, index: usize) -> Option<Type> {
        self.results().into_iter().nth(index).flatten()
    }

    /// Number of results
    pub fn num_result(&self) -> usize {
        self.entry.sig.results.len()
    }

    /// Whether the last parameter collects trailing arguments
    pub fn is_variadic(&self) -> bool {
        self.entry.sig.variadic
    }

    /// Call the method on the bound receiver
    pub fn invoke(&self, args: Vec<Value>) -> Result<Vec<Value>> {
        let receiver = self.receiver.clone().ok_or(ReflectError::NilReference)?;
        let args = bind_arguments(&self.entry.sig, args)?;
        let (decl, receiver) = resolve(&self.entry, receiver)?;
        trace!(
            receiver = %self.receiver_ty,
            method = %self.entry.name,
            args = args.len(),
            "invoke"
        );
        Ok(decl.call(receiver, args))
    }
}

/// Entry named `name` callable on a receiver of type `receiver_ty`
///
/// A non-pointer receiver also finds the pointer-receiver methods of its
/// type; those are invoked through its address or through a copy.
pub(crate) fn lookup(receiver_ty: &Descriptor, name: &str) -> Option<MethodEntry> {
    let find = |ty: &Descriptor| ty.method_set().into_iter().find(|entry| entry.name == name);
    find(receiver_ty).or_else(|| match receiver_ty.kind() {
        Kind::Pointer | Kind::Interface => None,
        _ => find(&Descriptor::pointer_to(receiver_ty)),
    })
}

/// Declaration and receiver value a call through `entry` lands on
///
/// A receiver reached through an unexported field is sealed: its methods
/// can be listed but not called.
fn resolve(entry: &MethodEntry, receiver: Handle) -> Result<(Arc<MethodDecl>, Value)> {
    if receiver.is_read_only() {
        return Err(ReflectError::Unexported);
    }
    let mut current = receiver;
    for &index in &entry.path {
        if current.kind() == Kind::Pointer {
            current = current.elem()?.ok_or(ReflectError::NilReference)?;
        }
        current = current.embedded_field(index)?;
    }

    match &entry.target {
        MethodTarget::Declared(decl) => Ok((decl.clone(), receiver_value(decl, &current)?)),
        MethodTarget::Interface => {
            let dynamic = current.elem()?.ok_or(ReflectError::NilReference)?;
            let concrete = dynamic
                .ty()
                .method_set()
                .into_iter()
                .find(|m| m.name == entry.name && m.pkg_path == entry.pkg_path)
                .ok_or(ReflectError::NilReference)?;
            resolve(&concrete, dynamic)
        }
    }
}

fn receiver_value(decl: &MethodDecl, handle: &Handle) -> Result<Value> {
    let is_pointer = handle.kind() == Kind::Pointer;
    if decl.pointer_receiver() {
        if is_pointer {
            Ok(handle.load())
        } else if handle.is_addressable() {
            Ok(handle.address()?)
        } else {
            Ok(Value::pointer_to(handle.load()))
        }
    } else if is_pointer {
        Ok(handle.elem()?.ok_or(ReflectError::NilReference)?.load())
    } else {
        Ok(handle.load())
    }
}

impl Reflected for Method {
    fn node(&self) -> &Node {
        &self.node
    }

    fn name(&self) -> String {
        self.entry.name.clone()
    }

    fn package_name(&self) -> String {
        receiver_owner(&self.receiver_ty).package_name().to_string()
    }

    fn package_path(&self) -> String {
        receiver_owner(&self.receiver_ty).pkg_path().to_string()
    }

    fn has_value(&self) -> bool {
        self.receiver.is_some()
    }

    /// The method value: a function with the receiver already bound
    fn value(&self) -> Result<Value> {
        let receiver = self.receiver.clone().ok_or(ReflectError::NilReference)?;
        let (decl, receiver) = resolve(&self.entry, receiver)?;
        Ok(Value::function(
            self.entry.sig.clone(),
            native(move |args| decl.call(receiver.clone(), args.to_vec())),
        ))
    }

    fn set_value(&self, _value: Value) -> Result<()> {
        Err(ReflectError::CannotSet)
    }

    fn is_instantiable(&self) -> bool {
        false
    }

    fn instantiate(&self) -> Result<Instance> {
        Err(ReflectError::NotInstantiable { name: self.name() })
    }

    fn can_convert(&self, _target: &Type) -> bool {
        false
    }
}

/// Named type behind a receiver type, looking through an unnamed pointer
fn receiver_owner(receiver_ty: &Descriptor) -> Descriptor {
    match receiver_ty.kind() {
        Kind::Pointer if !receiver_ty.is_named() => receiver_ty
            .elem()
            .unwrap_or_else(|| receiver_ty.clone()),
        _ => receiver_ty.clone(),
    }
}
