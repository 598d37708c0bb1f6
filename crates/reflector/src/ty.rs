//! The `Type` model
//!
//! [`Type`] is a closed sum over the structural kinds. Each variant wraps a
//! struct holding a [`Node`]: the static descriptor, the bound value handle
//! (if any) and the parent node that produced it. [`Reflected`] supplies the
//! capability set every variant shares; variants override the parts whose
//! meaning differs for their kind.

use std::sync::Arc;

use reflector_core::{Data, Descriptor, Handle, Value};

use crate::error::{ReflectError, Result};
use crate::instance::Instance;
use crate::{
    Array, Boolean, Chan, Complex, Custom, Float, Function, Interface, Map, Method, Pointer,
    SignedInteger, Slice, StringType, Struct, UnsignedInteger,
};

/// Descriptor, bound handle and parent of a classified node
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) descriptor: Descriptor,
    pub(crate) handle: Option<Handle>,
    pub(crate) parent: Option<Arc<Type>>,
}

impl Node {
    pub(crate) fn new(
        descriptor: Descriptor,
        handle: Option<Handle>,
        parent: Option<Arc<Type>>,
    ) -> Self {
        Self {
            descriptor,
            handle,
            parent,
        }
    }

    /// Bound handle
    pub(crate) fn bound(&self) -> Result<&Handle> {
        self.handle.as_ref().ok_or(ReflectError::NilReference)
    }

    /// Bound handle that may be read
    pub(crate) fn readable(&self) -> Result<&Handle> {
        let handle = self.bound()?;
        if handle.is_read_only() {
            return Err(ReflectError::Unexported);
        }
        Ok(handle)
    }

    /// Bound handle that may be written
    pub(crate) fn settable(&self) -> Result<&Handle> {
        let handle = self.readable()?;
        if !handle.can_set() {
            return Err(ReflectError::CannotSet);
        }
        Ok(handle)
    }

    pub(crate) fn can_set(&self) -> bool {
        self.handle.as_ref().is_some_and(Handle::can_set)
    }

    /// Current value, typed as this node
    pub(crate) fn load(&self) -> Result<Value> {
        Ok(self.readable()?.load().retyped(&self.descriptor))
    }

    /// Store through the bound handle
    ///
    /// The value must be assignable to this node's type; it is stored under
    /// the cell's own type, which differs for the underlying node of a
    /// named type.
    pub(crate) fn store(&self, value: Value) -> Result<()> {
        let handle = self.settable()?;
        let value = value.assign_to(&self.descriptor)?;
        handle.store(value.retyped(&handle.ty()))?;
        Ok(())
    }

    pub(crate) fn store_scalar(&self, data: Data) -> Result<()> {
        self.settable()?.store_scalar(data)?;
        Ok(())
    }
}

/// Capabilities shared by every classified type
pub trait Reflected {
    /// The node behind this type
    fn node(&self) -> &Node;

    /// Type name, e.g. `int`, `*Dessert`, `map[string]any`
    fn name(&self) -> String {
        self.node().descriptor.name()
    }

    /// Last segment of the package path
    fn package_name(&self) -> String {
        self.node().descriptor.package_name().to_string()
    }

    /// Full package path
    fn package_path(&self) -> String {
        self.node().descriptor.pkg_path().to_string()
    }

    /// Static descriptor
    fn descriptor(&self) -> &Descriptor {
        &self.node().descriptor
    }

    /// Bound value handle
    fn handle(&self) -> Option<&Handle> {
        self.node().handle.as_ref()
    }

    /// Whether a value is bound
    fn has_value(&self) -> bool {
        self.node().handle.is_some()
    }

    /// Node that produced this one
    fn parent(&self) -> Option<&Type> {
        self.node().parent.as_deref()
    }

    /// Whether `set_value` may succeed
    fn can_set(&self) -> bool {
        self.node().can_set()
    }

    /// Copy of the bound value
    fn value(&self) -> Result<Value> {
        self.node().load()
    }

    /// Replace the bound value
    fn set_value(&self, value: Value) -> Result<()> {
        self.node().store(value)
    }

    /// Whether both types have identical descriptors
    fn compare(&self, other: &Type) -> bool {
        self.descriptor() == other.descriptor()
    }

    /// Whether [`Reflected::instantiate`] is supported
    fn is_instantiable(&self) -> bool {
        true
    }

    /// Allocate a zero instance of this type
    fn instantiate(&self) -> Result<Instance> {
        Ok(Instance::new(Value::zero(self.descriptor())))
    }

    /// Whether the bound value converts to `target`'s type
    fn can_convert(&self, target: &Type) -> bool {
        self.has_value() && self.descriptor().convertible_to(target.descriptor())
    }

    /// Convert the bound value into a fresh instance of `target`'s type
    fn convert(&self, target: &Type) -> Result<Instance> {
        let value = self.value()?;
        if !self.can_convert(target) {
            return Err(ReflectError::NotConvertible {
                from: self.name(),
                to: target.name(),
            });
        }
        Ok(Instance::new(value.convert(target.descriptor())?))
    }
}

/// A classified type
#[derive(Debug, Clone)]
pub enum Type {
    /// `*T`
    Pointer(Pointer),
    /// `struct { ... }`
    Struct(Struct),
    /// `interface { ... }`
    Interface(Interface),
    /// `[N]T`
    Array(Array),
    /// `[]T`
    Slice(Slice),
    /// `map[K]V`
    Map(Map),
    /// `chan T`
    Chan(Chan),
    /// `func(...) ...`
    Function(Function),
    /// A method reached through its owner
    Method(Method),
    /// Named non-struct, non-interface type
    Custom(Custom),
    /// `bool`
    Boolean(Boolean),
    /// `string`
    String(StringType),
    /// `int`, `int8` ... `int64`
    SignedInteger(SignedInteger),
    /// `uint`, `uint8` ... `uint64`
    UnsignedInteger(UnsignedInteger),
    /// `float32`, `float64`
    Float(Float),
    /// `complex64`, `complex128`
    Complex(Complex),
}

macro_rules! variant_accessors {
    ($($variant:ident($inner:ident) => $is:ident, $as:ident;)*) => {
        impl Type {
            $(
                #[doc = concat!("Whether this is a [`", stringify!($inner), "`]")]
                pub fn $is(&self) -> bool {
                    matches!(self, Type::$variant(_))
                }

                #[doc = concat!("Downcast to [`", stringify!($inner), "`]")]
                pub fn $as(&self) -> Option<&$inner> {
                    match self {
                        Type::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            )*
        }
    };
}

variant_accessors! {
    Pointer(Pointer) => is_pointer, as_pointer;
    Struct(Struct) => is_struct, as_struct;
    Interface(Interface) => is_interface, as_interface;
    Array(Array) => is_array, as_array;
    Slice(Slice) => is_slice, as_slice;
    Map(Map) => is_map, as_map;
    Chan(Chan) => is_chan, as_chan;
    Function(Function) => is_function, as_function;
    Method(Method) => is_method, as_method;
    Custom(Custom) => is_custom, as_custom;
    Boolean(Boolean) => is_boolean, as_boolean;
    String(StringType) => is_string, as_string;
    SignedInteger(SignedInteger) => is_signed_integer, as_signed_integer;
    UnsignedInteger(UnsignedInteger) => is_unsigned_integer, as_unsigned_integer;
    Float(Float) => is_float, as_float;
    Complex(Complex) => is_complex, as_complex;
}

impl Type {
    /// The variant as a trait object
    pub fn reflected(&self) -> &dyn Reflected {
        match self {
            Type::Pointer(t) => t,
            Type::Struct(t) => t,
            Type::Interface(t) => t,
            Type::Array(t) => t,
            Type::Slice(t) => t,
            Type::Map(t) => t,
            Type::Chan(t) => t,
            Type::Function(t) => t,
            Type::Method(t) => t,
            Type::Custom(t) => t,
            Type::Boolean(t) => t,
            Type::String(t) => t,
            Type::SignedInteger(t) => t,
            Type::UnsignedInteger(t) => t,
            Type::Float(t) => t,
            Type::Complex(t) => t,
        }
    }

    /// Signed or unsigned integer
    pub fn is_integer(&self) -> bool {
        self.is_signed_integer() || self.is_unsigned_integer()
    }

    /// Integer, float or complex
    pub fn is_number(&self) -> bool {
        self.is_integer() || self.is_float() || self.is_complex()
    }

    /// Boolean, string or number
    pub fn is_basic(&self) -> bool {
        self.is_boolean() || self.is_string() || self.is_number()
    }
}

impl Reflected for Type {
    fn node(&self) -> &Node {
        self.reflected().node()
    }

    fn name(&self) -> String {
        self.reflected().name()
    }

    fn package_name(&self) -> String {
        self.reflected().package_name()
    }

    fn package_path(&self) -> String {
        self.reflected().package_path()
    }

    fn has_value(&self) -> bool {
        self.reflected().has_value()
    }

    fn can_set(&self) -> bool {
        self.reflected().can_set()
    }

    fn value(&self) -> Result<Value> {
        self.reflected().value()
    }

    fn set_value(&self, value: Value) -> Result<()> {
        self.reflected().set_value(value)
    }

    fn compare(&self, other: &Type) -> bool {
        self.reflected().compare(other)
    }

    fn is_instantiable(&self) -> bool {
        self.reflected().is_instantiable()
    }

    fn instantiate(&self) -> Result<Instance> {
        self.reflected().instantiate()
    }

    fn can_convert(&self, target: &Type) -> bool {
        self.reflected().can_convert(target)
    }

    fn convert(&self, target: &Type) -> Result<Instance> {
        self.reflected().convert(target)
    }
}
