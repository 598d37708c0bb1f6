//! Scalar variants
//!
//! Numeric setters check the target width before storing; a value that does
//! not fit fails with [`ReflectError::Overflow`] and leaves the stored value
//! untouched. `set_value` with a value of exactly the node's type skips that
//! check.

use reflector_core::{Complex128, Data, Kind, Value};

use crate::error::{ReflectError, Result};
use crate::ty::{Node, Reflected};

/// Storage width of a numeric type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BitSize {
    /// 8 bits
    Bits8,
    /// 16 bits
    Bits16,
    /// 32 bits
    Bits32,
    /// 64 bits
    Bits64,
    /// 128 bits
    Bits128,
}

impl BitSize {
    /// Width of a numeric kind
    pub fn of(kind: Kind) -> Option<BitSize> {
        match kind.bits()? {
            8 => Some(BitSize::Bits8),
            16 => Some(BitSize::Bits16),
            32 => Some(BitSize::Bits32),
            64 => Some(BitSize::Bits64),
            128 => Some(BitSize::Bits128),
            _ => None,
        }
    }

    /// Number of bits
    pub fn bits(self) -> u32 {
        match self {
            BitSize::Bits8 => 8,
            BitSize::Bits16 => 16,
            BitSize::Bits32 => 32,
            BitSize::Bits64 => 64,
            BitSize::Bits128 => 128,
        }
    }
}

fn bit_size(node: &Node) -> BitSize {
    BitSize::of(node.descriptor.kind()).unwrap_or(BitSize::Bits64)
}

fn mismatch(node: &Node, value: &Value) -> ReflectError {
    ReflectError::invalid_type(&node.descriptor, value.ty())
}

macro_rules! scalar_node {
    ($($name:ident),* $(,)?) => {
        $(
            impl $name {
                pub(crate) fn new(node: Node) -> Self {
                    Self { node }
                }
            }
        )*
    };
}

scalar_node!(Boolean, StringType, SignedInteger, UnsignedInteger, Float, Complex);

/// `bool`
#[derive(Debug, Clone)]
pub struct Boolean {
    node: Node,
}

impl Boolean {
    /// Bound value
    pub fn bool_value(&self) -> Result<bool> {
        let value = self.node.load()?;
        value.as_bool().ok_or_else(|| mismatch(&self.node, &value))
    }

    /// Store a new value
    pub fn set_bool_value(&self, v: bool) -> Result<()> {
        self.node.store_scalar(Data::Bool(v))
    }
}

impl Reflected for Boolean {
    fn node(&self) -> &Node {
        &self.node
    }

    fn set_value(&self, value: Value) -> Result<()> {
        self.node.settable()?;
        if value.ty() == self.descriptor() {
            return self.node.store(value);
        }
        match value.data() {
            Data::Bool(v) => self.set_bool_value(*v),
            _ => Err(mismatch(&self.node, &value)),
        }
    }
}

/// `string`
#[derive(Debug, Clone)]
pub struct StringType {
    node: Node,
}

impl StringType {
    /// Bound value
    pub fn string_value(&self) -> Result<String> {
        let value = self.node.load()?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch(&self.node, &value))
    }

    /// Store a new value
    pub fn set_string_value(&self, v: impl Into<String>) -> Result<()> {
        self.node.store_scalar(Data::String(v.into()))
    }
}

impl Reflected for StringType {
    fn node(&self) -> &Node {
        &self.node
    }

    fn set_value(&self, value: Value) -> Result<()> {
        self.node.settable()?;
        if value.ty() == self.descriptor() {
            return self.node.store(value);
        }
        match value.data() {
            Data::String(v) => self.set_string_value(v.clone()),
            _ => Err(mismatch(&self.node, &value)),
        }
    }
}

/// `int`, `int8`, `int16`, `int32`, `int64`
#[derive(Debug, Clone)]
pub struct SignedInteger {
    node: Node,
}

impl SignedInteger {
    /// Storage width
    pub fn bit_size(&self) -> BitSize {
        bit_size(&self.node)
    }

    /// Bound value
    pub fn integer_value(&self) -> Result<i64> {
        let value = self.node.load()?;
        value.as_int().ok_or_else(|| mismatch(&self.node, &value))
    }

    /// Store a new value after checking it fits
    pub fn set_integer_value(&self, v: i64) -> Result<()> {
        self.node.settable()?;
        if self.overflow(v) {
            return Err(ReflectError::Overflow);
        }
        self.node.store_scalar(Data::Int(v))
    }

    /// Whether `v` lies outside `[min, max]` for the width
    pub fn overflow(&self, v: i64) -> bool {
        let shift = 64 - self.bit_size().bits().min(64);
        (v << shift) >> shift != v
    }
}

impl Reflected for SignedInteger {
    fn node(&self) -> &Node {
        &self.node
    }

    fn set_value(&self, value: Value) -> Result<()> {
        self.node.settable()?;
        if value.ty() == self.descriptor() {
            return self.node.store(value);
        }
        match value.data() {
            Data::Int(v) => self.set_integer_value(*v),
            Data::Uint(v) => {
                let v = i64::try_from(*v).map_err(|_| ReflectError::Overflow)?;
                self.set_integer_value(v)
            }
            _ => Err(mismatch(&self.node, &value)),
        }
    }
}

/// `uint`, `uint8`, `uint16`, `uint32`, `uint64`
#[derive(Debug, Clone)]
pub struct UnsignedInteger {
    node: Node,
}

impl UnsignedInteger {
    /// Storage width
    pub fn bit_size(&self) -> BitSize {
        bit_size(&self.node)
    }

    /// Bound value
    pub fn integer_value(&self) -> Result<u64> {
        let value = self.node.load()?;
        value.as_uint().ok_or_else(|| mismatch(&self.node, &value))
    }

    /// Store a new value after checking it fits
    pub fn set_integer_value(&self, v: u64) -> Result<()> {
        self.node.settable()?;
        if self.overflow(v) {
            return Err(ReflectError::Overflow);
        }
        self.node.store_scalar(Data::Uint(v))
    }

    /// Whether `v` exceeds the maximum for the width
    pub fn overflow(&self, v: u64) -> bool {
        let bits = self.bit_size().bits();
        bits < 64 && v >> bits != 0
    }
}

impl Reflected for UnsignedInteger {
    fn node(&self) -> &Node {
        &self.node
    }

    fn set_value(&self, value: Value) -> Result<()> {
        self.node.settable()?;
        if value.ty() == self.descriptor() {
            return self.node.store(value);
        }
        match value.data() {
            Data::Uint(v) => self.set_integer_value(*v),
            Data::Int(v) => {
                let v = u64::try_from(*v).map_err(|_| ReflectError::Overflow)?;
                self.set_integer_value(v)
            }
            _ => Err(mismatch(&self.node, &value)),
        }
    }
}

/// `float32`, `float64`
#[derive(Debug, Clone)]
pub struct Float {
    node: Node,
}

impl Float {
    /// Storage width
    pub fn bit_size(&self) -> BitSize {
        bit_size(&self.node)
    }

    /// Bound value
    pub fn float_value(&self) -> Result<f64> {
        let value = self.node.load()?;
        value.as_float().ok_or_else(|| mismatch(&self.node, &value))
    }

    /// Store a new value after checking it fits
    pub fn set_float_value(&self, v: f64) -> Result<()> {
        self.node.settable()?;
        if self.overflow(v) {
            return Err(ReflectError::Overflow);
        }
        self.node.store_scalar(Data::Float(v))
    }

    /// Whether a finite `v` is out of range for `float32`
    pub fn overflow(&self, v: f64) -> bool {
        float_overflow(self.bit_size(), v)
    }
}

fn float_overflow(size: BitSize, v: f64) -> bool {
    if size != BitSize::Bits32 {
        return false;
    }
    let magnitude = v.abs();
    magnitude > f64::from(f32::MAX) && magnitude <= f64::MAX
}

impl Reflected for Float {
    fn node(&self) -> &Node {
        &self.node
    }

    fn set_value(&self, value: Value) -> Result<()> {
        self.node.settable()?;
        if value.ty() == self.descriptor() {
            return self.node.store(value);
        }
        match value.data() {
            Data::Float(v) => self.set_float_value(*v),
            _ => Err(mismatch(&self.node, &value)),
        }
    }
}

/// `complex64`, `complex128`
#[derive(Debug, Clone)]
pub struct Complex {
    node: Node,
}

impl Complex {
    /// Storage width of the whole number
    pub fn bit_size(&self) -> BitSize {
        bit_size(&self.node)
    }

    fn part_size(&self) -> BitSize {
        if self.bit_size() == BitSize::Bits64 {
            BitSize::Bits32
        } else {
            BitSize::Bits64
        }
    }

    /// Bound value
    pub fn complex_value(&self) -> Result<Complex128> {
        let value = self.node.load()?;
        value.as_complex().ok_or_else(|| mismatch(&self.node, &value))
    }

    /// Store a new value after checking both parts fit
    pub fn set_complex_value(&self, v: Complex128) -> Result<()> {
        self.node.settable()?;
        if self.overflow(v) {
            return Err(ReflectError::Overflow);
        }
        self.node.store_scalar(Data::Complex(v))
    }

    /// Real part
    pub fn real_data(&self) -> Result<f64> {
        Ok(self.complex_value()?.re)
    }

    /// Imaginary part
    pub fn imaginary_data(&self) -> Result<f64> {
        Ok(self.complex_value()?.im)
    }

    /// Replace the real part
    pub fn set_real_data(&self, re: f64) -> Result<()> {
        let current = self.complex_value()?;
        self.set_complex_value(Complex128::new(re, current.im))
    }

    /// Replace the imaginary part
    pub fn set_imaginary_data(&self, im: f64) -> Result<()> {
        let current = self.complex_value()?;
        self.set_complex_value(Complex128::new(current.re, im))
    }

    /// Whether either part is out of range for `complex64`
    pub fn overflow(&self, v: Complex128) -> bool {
        let part = self.part_size();
        float_overflow(part, v.re) || float_overflow(part, v.im)
    }
}

impl Reflected for Complex {
    fn node(&self) -> &Node {
        &self.node
    }

    fn set_value(&self, value: Value) -> Result<()> {
        self.node.settable()?;
        if value.ty() == self.descriptor() {
            return self.node.store(value);
        }
        match value.data() {
            Data::Complex(v) => self.set_complex_value(*v),
            _ => Err(mismatch(&self.node, &value)),
        }
    }
}
