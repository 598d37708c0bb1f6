//! Substrate errors

use thiserror::Error;

/// Errors raised by descriptors, values and storage handles
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CoreError {
    /// A value is not assignable to the destination type
    #[error("cannot use {from} as {to}")]
    NotAssignable {
        /// Type of the value
        from: String,
        /// Destination type
        to: String,
    },

    /// A value cannot be converted to the destination type
    #[error("cannot convert {from} to {to}")]
    NotConvertible {
        /// Type of the value
        from: String,
        /// Destination type
        to: String,
    },

    /// An operation was applied to a value of the wrong kind
    #[error("kind mismatch: expected {expected}, got {actual}")]
    KindMismatch {
        /// Kind the operation works on
        expected: String,
        /// Kind that was found
        actual: String,
    },

    /// Dereference of a nil pointer
    #[error("nil dereference")]
    NilPointer,

    /// Index outside of the valid range
    #[error("index out of range [{index}] with length {len}")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Length of the container
        len: usize,
    },

    /// Slice expression with invalid bounds
    #[error("slice bounds out of range [{low}:{high}] with capacity {cap}")]
    SliceBounds {
        /// Low bound
        low: usize,
        /// High bound
        high: usize,
        /// Capacity of the slice
        cap: usize,
    },

    /// Map key of a type that does not support equality
    #[error("{ty} is not comparable")]
    NotComparable {
        /// Offending type
        ty: String,
    },

    /// Write through a handle that does not refer to a variable
    #[error("value is not addressable")]
    NotAddressable,

    /// Write through a handle obtained via an unexported field
    #[error("value is read-only")]
    ReadOnly,

    /// A named type was used before its underlying type was defined
    #[error("type {name} is declared but not defined")]
    Undefined {
        /// Type name
        name: String,
    },

    /// A named type was defined twice
    #[error("type {name} is already defined")]
    AlreadyDefined {
        /// Type name
        name: String,
    },
}

/// Result type for substrate operations
pub type Result<T> = std::result::Result<T, CoreError>;
