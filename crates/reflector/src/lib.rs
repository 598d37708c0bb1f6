//! Reflector
//!
//! Runtime type introspection over the `reflector-core` value model.
//!
//! # Overview
//!
//! [`type_of`], [`type_of_value`], [`type_of_handle`] and
//! [`type_of_descriptor`] classify a type (and optionally a live value) into a
//! [`Type`]: a closed set of variants, one per structural kind. Every variant
//! implements [`Reflected`], the shared capability set (identity, value access,
//! instantiation, conversion). Kind-specific operations live on the variant
//! structs: fields and methods on [`Struct`], indexed access on [`Slice`],
//! dynamic invocation on [`Function`] and [`Method`], and so on.
//!
//! # Example
//!
//! ```
//! use reflector::{type_of_value, Reflected};
//! use reflector_core::Value;
//!
//! let ty = type_of_value(Value::slice(&reflector_core::builtin::int(), vec![Value::int(1)]).unwrap()).unwrap();
//! let slice = ty.as_slice().unwrap();
//! assert_eq!(ty.name(), "[]int");
//! assert_eq!(slice.get(0).unwrap(), Value::int(1));
//! ```

pub mod array;
pub mod builtin;
pub mod chan;
pub mod classify;
pub mod custom;
pub mod defaults;
pub mod error;
pub mod field;
pub mod function;
pub mod instance;
pub mod interface;
mod invoke;
pub mod map;
pub mod method;
pub mod pointer;
pub mod primitive;
pub mod slice;
pub mod structure;
pub mod tag;
pub mod ty;

pub use array::Array;
pub use chan::{Chan, ChanDirection};
pub use classify::{type_of, type_of_descriptor, type_of_handle, type_of_value, value_of};
pub use custom::Custom;
pub use error::{ReflectError, Result};
pub use field::Field;
pub use function::Function;
pub use instance::Instance;
pub use interface::Interface;
pub use map::{Entry, Map};
pub use method::Method;
pub use pointer::Pointer;
pub use primitive::{
    BitSize, Boolean, Complex, Float, SignedInteger, StringType, UnsignedInteger,
};
pub use slice::Slice;
pub use structure::Struct;
pub use tag::{Tag, Tags};
pub use ty::{Node, Reflected, Type};
