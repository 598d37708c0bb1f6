//! Classification dispatcher
//!
//! Maps a descriptor (and optionally a bound handle) onto exactly one
//! [`Type`] variant. Named types outside the builtin table whose underlying
//! kind is neither struct nor interface become [`Custom`], wrapping the
//! classification of their underlying type.

use std::sync::Arc;

use reflector_core::{Descriptor, Handle, Kind, Reflect, Value};
use tracing::trace;

use crate::builtin::is_builtin;
use crate::ty::{Node, Type};
use crate::{
    Array, Boolean, Chan, Complex, Custom, Float, Function, Interface, Map, Pointer,
    SignedInteger, Slice, StringType, Struct, UnsignedInteger,
};

/// Type-only classification of a Rust type's counterpart
pub fn type_of<T: Reflect>() -> Option<Type> {
    classify(&T::descriptor(), None, None)
}

/// Type-only classification of a descriptor
pub fn type_of_descriptor(descriptor: &Descriptor) -> Option<Type> {
    classify(descriptor, None, None)
}

/// Classification bound to a private copy of `value`
///
/// The copy is not addressable; reach settable nodes through a pointer
/// (`Pointer::elem`) or through [`type_of_handle`].
pub fn type_of_value(value: Value) -> Option<Type> {
    let descriptor = value.ty().clone();
    classify(&descriptor, Some(Handle::detached(value)), None)
}

/// Classification bound to an existing storage handle
pub fn type_of_handle(handle: Handle) -> Option<Type> {
    let descriptor = handle.ty();
    classify(&descriptor, Some(handle), None)
}

/// Classification bound to a Rust value converted into the dynamic model
pub fn value_of<T: Reflect>(value: T) -> Option<Type> {
    type_of_value(value.into_value())
}

/// Classify `descriptor`, binding `handle` and linking `parent`
///
/// Returns `None` for `uintptr`, `unsafe.Pointer`, the untyped nil and
/// undefined named types.
pub(crate) fn classify(
    descriptor: &Descriptor,
    handle: Option<Handle>,
    parent: Option<Arc<Type>>,
) -> Option<Type> {
    let kind = descriptor.kind();
    let bound = handle.is_some();
    let node = Node::new(descriptor.clone(), handle, parent);

    let ty = if is_custom(descriptor, kind) {
        let underlying = Node::new(descriptor.underlying(), node.handle.clone(), None);
        let underlying = classify_shape(underlying)?;
        Type::Custom(Custom::new(node, underlying))
    } else {
        classify_shape(node)?
    };

    trace!(ty = %descriptor, %kind, bound, "classified");
    Some(ty)
}

fn is_custom(descriptor: &Descriptor, kind: Kind) -> bool {
    descriptor.is_named()
        && !is_builtin(descriptor)
        && !matches!(kind, Kind::Struct | Kind::Interface)
}

fn classify_shape(node: Node) -> Option<Type> {
    let ty = match node.descriptor.kind() {
        Kind::Bool => Type::Boolean(Boolean::new(node)),
        Kind::String => Type::String(StringType::new(node)),
        Kind::Uintptr | Kind::UnsafePointer | Kind::UntypedNil | Kind::Invalid => return None,
        k if k.is_signed() => Type::SignedInteger(SignedInteger::new(node)),
        k if k.is_unsigned() => Type::UnsignedInteger(UnsignedInteger::new(node)),
        k if k.is_float() => Type::Float(Float::new(node)),
        k if k.is_complex() => Type::Complex(Complex::new(node)),
        Kind::Pointer => Type::Pointer(Pointer::new(node)),
        Kind::Struct => Type::Struct(Struct::new(node)),
        Kind::Interface => Type::Interface(Interface::new(node)),
        Kind::Array => Type::Array(Array::new(node)),
        Kind::Slice => Type::Slice(Slice::new(node)),
        Kind::Map => Type::Map(Map::new(node)),
        Kind::Chan => Type::Chan(Chan::new(node)),
        Kind::Func => Type::Function(Function::new(node)),
        _ => return None,
    };
    Some(ty)
}
