//! Reflector Core
//!
//! The host substrate the reflection engine inspects: type descriptors,
//! dynamic values, shared storage cells, channels and native callables.
//!
//! # Model
//!
//! - [`Descriptor`]: a shared, immutable description of a type. Named types
//!   are declared first and defined afterwards so they can refer to
//!   themselves.
//! - [`Value`]: a typed dynamic value. Aggregates own their cells, reference
//!   kinds (slices, maps, channels, pointers) share them.
//! - [`Handle`]: a view onto a storage [`Slot`] that knows whether it may be
//!   written through.
//! - [`Reflect`]: bridges plain Rust values into the model.

#![warn(missing_docs)]

pub mod builtin;
pub mod channel;
pub mod defaults;
pub mod descriptor;
pub mod error;
pub mod func;
pub mod reflect;
pub mod slot;
pub mod value;

pub use channel::{ChannelError, ChannelObject};
pub use descriptor::{
    ChanDir, Descriptor, InterfaceMethod, Kind, MethodEntry, MethodTarget, Shape, Signature,
    StructField,
};
pub use error::{CoreError, Result};
pub use func::{native, FuncValue, MethodDecl, NativeFn};
pub use reflect::Reflect;
pub use slot::{new_slot, Handle, Slot};
pub use value::{Complex128, Data, MapKey, MapObject, SliceHeader, Value};
