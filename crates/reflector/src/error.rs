//! Reflection errors

use reflector_core::{ChannelError, CoreError, Descriptor};
use thiserror::Error;

/// Errors returned by reflection operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReflectError {
    /// The node is not bound to a value, or the bound reference is nil
    #[error("value reference is nil")]
    NilReference,

    /// The bound value is not addressable
    #[error("value cannot be set")]
    CannotSet,

    /// Access through an unexported field
    #[error("the field is unexported")]
    Unexported,

    /// Index outside of the current length
    #[error("index out of range [{index}] with length {len}")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Current length
        len: usize,
    },

    /// Slice expression outside of the current length
    #[error("slice bounds out of range [{low}:{high}] with length {len}")]
    SliceBounds {
        /// Low bound
        low: usize,
        /// High bound
        high: usize,
        /// Current length
        len: usize,
    },

    /// Numeric value does not fit the bit width
    #[error("value is too large")]
    Overflow,

    /// Value of the wrong type for the operation
    #[error("type is not valid: expected {expected} but got {actual}")]
    InvalidType {
        /// Expected type
        expected: String,
        /// Actual type
        actual: String,
    },

    /// Wrong number of arguments
    #[error("invalid parameter count, expected {expected} but got {actual}")]
    InvalidParameterCount {
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        actual: usize,
    },

    /// Argument not assignable to its parameter
    #[error("expected {expected} but got {actual} at index {index}")]
    ArgumentMismatch {
        /// Parameter type
        expected: String,
        /// Argument type
        actual: String,
        /// Argument position
        index: usize,
    },

    /// No conversion between the two types
    #[error("cannot convert {from} to {to}")]
    NotConvertible {
        /// Source type
        from: String,
        /// Target type
        to: String,
    },

    /// Non-blocking channel operation found no partner or no space
    #[error("value could not be sent/received")]
    NotReady,

    /// Channel closed (and drained, for receives)
    #[error("channel is closed")]
    ChannelClosed,

    /// Channel direction forbids the operation
    #[error("channel direction does not allow {operation}")]
    InvalidDirection {
        /// `send` or `receive`
        operation: &'static str,
    },

    /// The node cannot produce new instances
    #[error("{name} cannot be instantiated")]
    NotInstantiable {
        /// Type name
        name: String,
    },

    /// Other substrate failure
    #[error(transparent)]
    Core(CoreError),
}

impl ReflectError {
    /// `InvalidType` for a pair of descriptors
    pub fn invalid_type(expected: &Descriptor, actual: &Descriptor) -> Self {
        ReflectError::InvalidType {
            expected: expected.name(),
            actual: actual.name(),
        }
    }
}

impl From<CoreError> for ReflectError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotAssignable { from, to } => ReflectError::InvalidType {
                expected: to,
                actual: from,
            },
            CoreError::NotConvertible { from, to } => ReflectError::NotConvertible { from, to },
            CoreError::NilPointer => ReflectError::NilReference,
            CoreError::IndexOutOfRange { index, len } => {
                ReflectError::IndexOutOfRange { index, len }
            }
            CoreError::NotAddressable => ReflectError::CannotSet,
            CoreError::ReadOnly => ReflectError::Unexported,
            other => ReflectError::Core(other),
        }
    }
}

impl From<ChannelError> for ReflectError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::Closed => ReflectError::ChannelClosed,
            ChannelError::WouldBlock => ReflectError::NotReady,
        }
    }
}

/// Result type for reflection operations
pub type Result<T> = std::result::Result<T, ReflectError>;
