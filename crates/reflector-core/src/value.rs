//! Dynamic values
//!
//! A [`Value`] pairs a [`Descriptor`] with its [`Data`]. Structs and arrays
//! own their cells and are copied on clone; slices, maps, channels, functions
//! and pointers share their storage the way references do.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::builtin;
use crate::channel::ChannelObject;
use crate::defaults::SLICE_GROWTH_FACTOR;
use crate::descriptor::{Descriptor, Kind, MethodTarget, Shape, Signature};
use crate::error::{CoreError, Result};
use crate::func::{FuncValue, NativeFn};
use crate::slot::{new_slot, Slot};

/// A `complex128` number
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex128 {
    /// Real part
    pub re: f64,
    /// Imaginary part
    pub im: f64,
}

impl Complex128 {
    /// Build from parts
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

/// A window onto a shared backing array
#[derive(Clone)]
pub struct SliceHeader {
    backing: Arc<[Slot]>,
    offset: usize,
    len: usize,
}

impl SliceHeader {
    /// Fresh backing array holding `items`, padded with zero values up to `cap`
    pub fn with_items(items: Vec<Value>, cap: usize, elem: &Descriptor) -> Self {
        let len = items.len();
        let mut cells: Vec<Slot> = items.into_iter().map(new_slot).collect();
        while cells.len() < cap {
            cells.push(new_slot(Value::zero(elem)));
        }
        Self {
            backing: cells.into(),
            offset: 0,
            len,
        }
    }

    /// Number of visible elements
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no element is visible
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Elements reachable from the start of the window
    pub fn cap(&self) -> usize {
        self.backing.len() - self.offset
    }

    /// Cell of a visible element
    pub fn cell(&self, index: usize) -> Option<&Slot> {
        if index < self.len {
            self.backing.get(self.offset + index)
        } else {
            None
        }
    }

    /// Cells of all visible elements
    pub fn cells(&self) -> &[Slot] {
        &self.backing[self.offset..self.offset + self.len]
    }

    /// `s[low:high]`; `high` may extend up to the capacity
    pub fn reslice(&self, low: usize, high: usize) -> Result<SliceHeader> {
        let cap = self.cap();
        if low > high || high > cap {
            return Err(CoreError::SliceBounds { low, high, cap });
        }
        Ok(Self {
            backing: self.backing.clone(),
            offset: self.offset + low,
            len: high - low,
        })
    }

    /// Whether two headers view the same backing array
    pub fn shares_backing(&self, other: &SliceHeader) -> bool {
        Arc::ptr_eq(&self.backing, &other.backing)
    }
}

impl fmt::Debug for SliceHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliceHeader")
            .field("len", &self.len)
            .field("cap", &self.cap())
            .finish()
    }
}

/// Key of a map entry; only comparable values qualify
#[derive(Debug, Clone)]
pub struct MapKey(pub(crate) Value);

impl MapKey {
    /// Wrap a key, rejecting values that do not support equality
    pub fn new(value: Value) -> Result<Self> {
        if !is_comparable_value(&value) {
            return Err(CoreError::NotComparable {
                ty: value.ty().name(),
            });
        }
        Ok(Self(value))
    }

    /// The wrapped key
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Unwrap the key
    pub fn into_value(self) -> Value {
        self.0
    }
}

fn is_comparable_value(value: &Value) -> bool {
    match &value.data {
        Data::Interface(Some(boxed)) => is_comparable_value(&boxed.read_recursive()),
        Data::Interface(None) => true,
        _ => value.ty.is_comparable(),
    }
}

impl PartialEq for MapKey {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for MapKey {}

impl Hash for MapKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_value(&self.0, state);
    }
}

fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    value.ty.hash(state);
    match &value.data {
        Data::Nil => {}
        Data::Bool(v) => v.hash(state),
        Data::Int(v) => v.hash(state),
        Data::Uint(v) => v.hash(state),
        Data::Float(v) => float_bits(*v).hash(state),
        Data::Complex(c) => {
            float_bits(c.re).hash(state);
            float_bits(c.im).hash(state);
        }
        Data::String(s) => s.hash(state),
        Data::Pointer(p) => p.as_ref().map(|s| Arc::as_ptr(s) as usize).hash(state),
        Data::Chan(c) => c.as_ref().map(|c| Arc::as_ptr(c) as usize).hash(state),
        Data::Array(cells) | Data::Struct(cells) => {
            for cell in cells {
                hash_value(&cell.read_recursive(), state);
            }
        }
        Data::Interface(boxed) => {
            if let Some(boxed) = boxed {
                hash_value(&boxed.read_recursive(), state);
            }
        }
        Data::Slice(_) | Data::Map(_) | Data::Func(_) => {}
    }
}

fn float_bits(v: f64) -> u64 {
    if v == 0.0 {
        0
    } else {
        v.to_bits()
    }
}

/// Shared hash table behind a map value
#[derive(Debug, Clone, Default)]
pub struct MapObject(Arc<RwLock<FxHashMap<MapKey, Value>>>);

impl MapObject {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Value stored under `key`
    pub fn get(&self, key: &MapKey) -> Option<Value> {
        self.0.read().get(key).cloned()
    }

    /// Whether `key` is present
    pub fn contains(&self, key: &MapKey) -> bool {
        self.0.read().contains_key(key)
    }

    /// Insert or replace an entry
    pub fn insert(&self, key: MapKey, value: Value) {
        self.0.write().insert(key, value);
    }

    /// Remove an entry
    pub fn remove(&self, key: &MapKey) -> Option<Value> {
        self.0.write().remove(key)
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.0.write().clear();
    }

    /// Snapshot of all entries
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.0
            .read()
            .iter()
            .map(|(k, v)| (k.value().clone(), v.clone()))
            .collect()
    }

    /// Whether two handles refer to the same table
    pub fn ptr_eq(&self, other: &MapObject) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Payload of a [`Value`]
pub enum Data {
    /// The untyped `nil`
    Nil,
    /// `bool`
    Bool(bool),
    /// Signed integers
    Int(i64),
    /// Unsigned integers
    Uint(u64),
    /// Floats; `float32` values are kept rounded
    Float(f64),
    /// Complex numbers
    Complex(Complex128),
    /// Strings
    String(String),
    /// Pointer to a cell, `None` for nil
    Pointer(Option<Slot>),
    /// Owned element cells
    Array(Vec<Slot>),
    /// Shared window, `None` for nil
    Slice(Option<SliceHeader>),
    /// Shared table, `None` for nil
    Map(Option<MapObject>),
    /// Shared channel, `None` for nil
    Chan(Option<Arc<ChannelObject>>),
    /// Callable, `None` for nil
    Func(Option<FuncValue>),
    /// Owned field cells
    Struct(Vec<Slot>),
    /// Boxed dynamic value, `None` for nil
    Interface(Option<Slot>),
}

fn copy_cells(cells: &[Slot]) -> Vec<Slot> {
    cells
        .iter()
        .map(|cell| new_slot(cell.read_recursive().clone()))
        .collect()
}

impl Clone for Data {
    fn clone(&self) -> Self {
        match self {
            Data::Nil => Data::Nil,
            Data::Bool(v) => Data::Bool(*v),
            Data::Int(v) => Data::Int(*v),
            Data::Uint(v) => Data::Uint(*v),
            Data::Float(v) => Data::Float(*v),
            Data::Complex(v) => Data::Complex(*v),
            Data::String(v) => Data::String(v.clone()),
            Data::Pointer(v) => Data::Pointer(v.clone()),
            Data::Array(cells) => Data::Array(copy_cells(cells)),
            Data::Slice(v) => Data::Slice(v.clone()),
            Data::Map(v) => Data::Map(v.clone()),
            Data::Chan(v) => Data::Chan(v.clone()),
            Data::Func(v) => Data::Func(v.clone()),
            Data::Struct(cells) => Data::Struct(copy_cells(cells)),
            Data::Interface(v) => Data::Interface(v.clone()),
        }
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Data::Nil => f.write_str("nil"),
            Data::Bool(v) => write!(f, "{v}"),
            Data::Int(v) => write!(f, "{v}"),
            Data::Uint(v) => write!(f, "{v}"),
            Data::Float(v) => write!(f, "{v}"),
            Data::Complex(c) => write!(f, "({}{:+}i)", c.re, c.im),
            Data::String(s) => write!(f, "{s:?}"),
            Data::Pointer(None)
            | Data::Slice(None)
            | Data::Map(None)
            | Data::Chan(None)
            | Data::Func(None)
            | Data::Interface(None) => f.write_str("nil"),
            Data::Pointer(Some(cell)) => write!(f, "{:p}", Arc::as_ptr(cell)),
            Data::Array(cells) | Data::Struct(cells) => f
                .debug_list()
                .entries(cells.iter().map(|c| c.read_recursive().clone()))
                .finish(),
            Data::Slice(Some(header)) => f
                .debug_list()
                .entries(header.cells().iter().map(|c| c.read_recursive().clone()))
                .finish(),
            Data::Map(Some(map)) => f.debug_map().entries(map.entries()).finish(),
            Data::Chan(Some(chan)) => write!(f, "{chan:?}"),
            Data::Func(Some(func)) => write!(f, "{func:?}"),
            Data::Interface(Some(boxed)) => write!(f, "{:?}", boxed.read_recursive()),
        }
    }
}

/// A typed dynamic value
#[derive(Clone)]
pub struct Value {
    ty: Descriptor,
    data: Data,
}

impl Value {
    /// Pair a type with a payload without checking that they agree
    pub fn from_parts(ty: Descriptor, data: Data) -> Self {
        Self { ty, data }
    }

    /// Zero value of a type
    pub fn zero(ty: &Descriptor) -> Self {
        let data = match ty.shape() {
            None => Data::Nil,
            Some(Shape::Basic(kind)) => match kind {
                Kind::Bool => Data::Bool(false),
                Kind::String => Data::String(String::new()),
                Kind::UnsafePointer => Data::Pointer(None),
                k if k.is_signed() => Data::Int(0),
                k if k.is_unsigned() => Data::Uint(0),
                k if k.is_float() => Data::Float(0.0),
                k if k.is_complex() => Data::Complex(Complex128::default()),
                _ => Data::Nil,
            },
            Some(Shape::Pointer(_)) => Data::Pointer(None),
            Some(Shape::Array { len, elem }) => {
                Data::Array((0..*len).map(|_| new_slot(Value::zero(elem))).collect())
            }
            Some(Shape::Slice(_)) => Data::Slice(None),
            Some(Shape::Map { .. }) => Data::Map(None),
            Some(Shape::Chan { .. }) => Data::Chan(None),
            Some(Shape::Func(_)) => Data::Func(None),
            Some(Shape::Struct(fields)) => Data::Struct(
                fields
                    .iter()
                    .map(|field| new_slot(Value::zero(&field.ty)))
                    .collect(),
            ),
            Some(Shape::Interface(_)) => Data::Interface(None),
        };
        Self {
            ty: ty.clone(),
            data,
        }
    }

    /// The untyped `nil`
    pub fn nil() -> Self {
        Self::from_parts(builtin::untyped_nil(), Data::Nil)
    }

    /// `bool` value
    pub fn bool(v: bool) -> Self {
        Self::from_parts(builtin::bool(), Data::Bool(v))
    }

    /// `int` value
    pub fn int(v: i64) -> Self {
        Self::from_parts(builtin::int(), Data::Int(v))
    }

    /// `uint` value
    pub fn uint(v: u64) -> Self {
        Self::from_parts(builtin::uint(), Data::Uint(v))
    }

    /// `float64` value
    pub fn float64(v: f64) -> Self {
        Self::from_parts(builtin::float64(), Data::Float(v))
    }

    /// `float32` value
    pub fn float32(v: f32) -> Self {
        Self::from_parts(builtin::float32(), Data::Float(f64::from(v)))
    }

    /// `complex128` value
    pub fn complex128(v: Complex128) -> Self {
        Self::from_parts(builtin::complex128(), Data::Complex(v))
    }

    /// `string` value
    pub fn string(v: impl Into<String>) -> Self {
        Self::from_parts(builtin::string(), Data::String(v.into()))
    }

    /// Pointer to a fresh cell holding `v`
    pub fn pointer_to(v: Value) -> Self {
        let ty = Descriptor::pointer_to(&v.ty);
        Self::from_parts(ty, Data::Pointer(Some(new_slot(v))))
    }

    /// Pointer to an existing cell
    pub fn pointer_from_slot(elem: &Descriptor, slot: Slot) -> Self {
        Self::from_parts(Descriptor::pointer_to(elem), Data::Pointer(Some(slot)))
    }

    /// `[]elem{items...}`
    pub fn slice(elem: &Descriptor, items: Vec<Value>) -> Result<Self> {
        Self::slice_of_type(&Descriptor::slice_of(elem), items)
    }

    /// Slice of an explicit (possibly named) slice type
    pub fn slice_of_type(ty: &Descriptor, items: Vec<Value>) -> Result<Self> {
        let elem = element_type(ty, Kind::Slice)?;
        let items = assign_all(items, &elem)?;
        let cap = items.len();
        Ok(Self::from_parts(
            ty.clone(),
            Data::Slice(Some(SliceHeader::with_items(items, cap, &elem))),
        ))
    }

    /// Non-nil slice of length `len` and capacity `cap`
    pub fn make_slice(ty: &Descriptor, len: usize, cap: usize) -> Result<Self> {
        let elem = element_type(ty, Kind::Slice)?;
        let items = (0..len).map(|_| Value::zero(&elem)).collect();
        Ok(Self::from_parts(
            ty.clone(),
            Data::Slice(Some(SliceHeader::with_items(items, cap.max(len), &elem))),
        ))
    }

    /// `[N]elem{items...}`
    pub fn array(elem: &Descriptor, items: Vec<Value>) -> Result<Self> {
        let ty = Descriptor::array_of(items.len(), elem);
        let items = assign_all(items, elem)?;
        Ok(Self::from_parts(
            ty,
            Data::Array(items.into_iter().map(new_slot).collect()),
        ))
    }

    /// `map[key]elem{entries...}`
    pub fn map(key: &Descriptor, elem: &Descriptor, entries: Vec<(Value, Value)>) -> Result<Self> {
        Self::map_of_type(&Descriptor::map_of(key, elem), entries)
    }

    /// Map of an explicit (possibly named) map type
    pub fn map_of_type(ty: &Descriptor, entries: Vec<(Value, Value)>) -> Result<Self> {
        let value = Self::empty_map(ty)?;
        if let Data::Map(Some(map)) = &value.data {
            for (k, v) in entries {
                value.check_map_entry(k, v).map(|(k, v)| map.insert(k, v))?;
            }
        }
        Ok(value)
    }

    /// Non-nil map with no entries
    pub fn empty_map(ty: &Descriptor) -> Result<Self> {
        element_type(ty, Kind::Map)?;
        Ok(Self::from_parts(ty.clone(), Data::Map(Some(MapObject::new()))))
    }

    /// Convert a key and value to this map's key and element types
    pub fn check_map_entry(&self, key: Value, value: Value) -> Result<(MapKey, Value)> {
        let (Some(key_ty), Some(elem_ty)) = (self.ty.key(), self.ty.elem()) else {
            return Err(kind_mismatch(Kind::Map, self.kind()));
        };
        let key = MapKey::new(key.assign_to(&key_ty)?)?;
        Ok((key, value.assign_to(&elem_ty)?))
    }

    /// Struct value from field values in declaration order
    pub fn structure(ty: &Descriptor, fields: Vec<Value>) -> Result<Self> {
        let Some(decls) = ty.fields() else {
            return Err(kind_mismatch(Kind::Struct, ty.kind()));
        };
        if decls.len() != fields.len() {
            return Err(CoreError::NotAssignable {
                from: format!("{} values", fields.len()),
                to: ty.name(),
            });
        }
        let cells = decls
            .iter()
            .zip(fields)
            .map(|(decl, value)| value.assign_to(&decl.ty).map(new_slot))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_parts(ty.clone(), Data::Struct(cells)))
    }

    /// Live channel with the given buffer capacity
    pub fn channel(ty: &Descriptor, capacity: usize) -> Result<Self> {
        element_type(ty, Kind::Chan)?;
        Ok(Self::from_parts(
            ty.clone(),
            Data::Chan(Some(Arc::new(ChannelObject::new(capacity)))),
        ))
    }

    /// Anonymous function value
    pub fn function(sig: Signature, body: NativeFn) -> Self {
        Self::from_parts(
            Descriptor::func_of(sig),
            Data::Func(Some(FuncValue::new(body))),
        )
    }

    /// Function value registered under a package-qualified name
    pub fn named_function(
        pkg_path: impl Into<String>,
        name: impl Into<String>,
        sig: Signature,
        body: NativeFn,
    ) -> Self {
        Self::from_parts(
            Descriptor::func_of(sig),
            Data::Func(Some(FuncValue::named(pkg_path, name, body))),
        )
    }

    /// Box `value` into an interface type
    pub fn boxed(iface: &Descriptor, value: Value) -> Self {
        let data = match value.data {
            Data::Nil => Data::Interface(None),
            Data::Interface(inner) => Data::Interface(inner),
            data => Data::Interface(Some(new_slot(Self::from_parts(value.ty, data)))),
        };
        Self::from_parts(iface.clone(), data)
    }

    /// An `error` whose `Error()` method returns `message`
    pub fn error(message: impl Into<String>) -> Self {
        let inner = Self::from_parts(
            builtin::error_string(),
            Data::Struct(vec![new_slot(Value::string(message))]),
        );
        Self::boxed(&builtin::error(), Self::pointer_to(inner))
    }

    /// Static type
    pub fn ty(&self) -> &Descriptor {
        &self.ty
    }

    /// Kind of the static type
    pub fn kind(&self) -> Kind {
        self.ty.kind()
    }

    /// Payload
    pub fn data(&self) -> &Data {
        &self.data
    }

    /// Split into type and payload
    pub fn into_parts(self) -> (Descriptor, Data) {
        (self.ty, self.data)
    }

    /// Same payload under another type
    pub fn retyped(self, ty: &Descriptor) -> Self {
        Self::from_parts(ty.clone(), self.data)
    }

    /// Whether the value is a nil reference (or the untyped nil)
    pub fn is_nil(&self) -> bool {
        matches!(
            self.data,
            Data::Nil
                | Data::Pointer(None)
                | Data::Slice(None)
                | Data::Map(None)
                | Data::Chan(None)
                | Data::Func(None)
                | Data::Interface(None)
        )
    }

    /// `bool` payload
    pub fn as_bool(&self) -> Option<bool> {
        match self.data {
            Data::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// Signed integer payload
    pub fn as_int(&self) -> Option<i64> {
        match self.data {
            Data::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Unsigned integer payload
    pub fn as_uint(&self) -> Option<u64> {
        match self.data {
            Data::Uint(v) => Some(v),
            _ => None,
        }
    }

    /// Float payload
    pub fn as_float(&self) -> Option<f64> {
        match self.data {
            Data::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Complex payload
    pub fn as_complex(&self) -> Option<Complex128> {
        match self.data {
            Data::Complex(v) => Some(v),
            _ => None,
        }
    }

    /// String payload
    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            Data::String(v) => Some(v),
            _ => None,
        }
    }

    /// Function payload
    pub fn as_func(&self) -> Option<&FuncValue> {
        match &self.data {
            Data::Func(Some(func)) => Some(func),
            _ => None,
        }
    }

    /// Channel payload
    pub fn as_chan(&self) -> Option<&Arc<ChannelObject>> {
        match &self.data {
            Data::Chan(Some(chan)) => Some(chan),
            _ => None,
        }
    }

    /// Map payload
    pub fn as_map(&self) -> Option<&MapObject> {
        match &self.data {
            Data::Map(Some(map)) => Some(map),
            _ => None,
        }
    }

    /// Slice payload
    pub fn as_slice(&self) -> Option<&SliceHeader> {
        match &self.data {
            Data::Slice(Some(header)) => Some(header),
            _ => None,
        }
    }

    /// Cell a non-nil pointer refers to
    pub fn pointee(&self) -> Option<&Slot> {
        match &self.data {
            Data::Pointer(Some(cell)) => Some(cell),
            _ => None,
        }
    }

    /// Copy of the value a non-nil pointer refers to
    pub fn deref(&self) -> Option<Value> {
        self.pointee().map(|cell| cell.read().clone())
    }

    /// Copy of a struct field
    pub fn field(&self, index: usize) -> Option<Value> {
        match &self.data {
            Data::Struct(cells) => cells.get(index).map(|cell| cell.read().clone()),
            _ => None,
        }
    }

    /// Copies of the elements of an array or slice
    pub fn elements(&self) -> Option<Vec<Value>> {
        let cells = match &self.data {
            Data::Array(cells) => cells.as_slice(),
            Data::Slice(Some(header)) => header.cells(),
            Data::Slice(None) => &[],
            _ => return None,
        };
        Some(cells.iter().map(|cell| cell.read().clone()).collect())
    }

    /// Snapshot of the entries of a map
    pub fn entries(&self) -> Option<Vec<(Value, Value)>> {
        match &self.data {
            Data::Map(Some(map)) => Some(map.entries()),
            Data::Map(None) => Some(Vec::new()),
            _ => None,
        }
    }

    /// Length of strings, arrays, slices, maps and channels
    pub fn len(&self) -> Option<usize> {
        match &self.data {
            Data::String(s) => Some(s.len()),
            Data::Array(cells) => Some(cells.len()),
            Data::Slice(header) => Some(header.as_ref().map_or(0, SliceHeader::len)),
            Data::Map(map) => Some(map.as_ref().map_or(0, MapObject::len)),
            Data::Chan(chan) => Some(chan.as_ref().map_or(0, |c| c.length())),
            _ => None,
        }
    }

    /// Capacity of arrays, slices and channels
    pub fn cap(&self) -> Option<usize> {
        match &self.data {
            Data::Array(cells) => Some(cells.len()),
            Data::Slice(header) => Some(header.as_ref().map_or(0, SliceHeader::cap)),
            Data::Chan(chan) => Some(chan.as_ref().map_or(0, |c| c.capacity())),
            _ => None,
        }
    }

    /// Dynamic value of an interface; other values are returned as is
    pub fn unboxed(&self) -> Value {
        match &self.data {
            Data::Interface(Some(boxed)) => boxed.read().clone(),
            Data::Interface(None) => Value::nil(),
            _ => self.clone(),
        }
    }

    /// Convert for storage in a variable of type `target`
    pub fn assign_to(self, target: &Descriptor) -> Result<Value> {
        if self.ty == *target {
            return Ok(self);
        }
        if !self.ty.assignable_to(target) {
            return Err(CoreError::NotAssignable {
                from: self.ty.name(),
                to: target.name(),
            });
        }
        if target.kind() == Kind::Interface {
            return Ok(Self::boxed(target, self));
        }
        if self.ty.kind() == Kind::UntypedNil {
            return Ok(Self::zero(target));
        }
        Ok(self.retyped(target))
    }

    /// Explicit conversion to `target`
    pub fn convert(&self, target: &Descriptor) -> Result<Value> {
        if !self.ty.convertible_to(target) {
            return Err(CoreError::NotConvertible {
                from: self.ty.name(),
                to: target.name(),
            });
        }
        if target.kind() == Kind::Interface {
            return self.clone().assign_to(target);
        }
        let to = target.kind();
        let data = match (&self.data, to) {
            (Data::Int(v), to) if to.is_integer() || to.is_float() => cast(Number::Int(*v), to),
            (Data::Uint(v), to) if to.is_integer() || to.is_float() => cast(Number::Uint(*v), to),
            (Data::Float(v), to) if to.is_integer() || to.is_float() => {
                cast(Number::Float(*v), to)
            }
            (Data::Complex(c), to) if to.is_complex() => Data::Complex(round_complex(*c, to)),
            (Data::Int(v), Kind::String) => Data::String(rune_string(u32::try_from(*v).ok())),
            (Data::Uint(v), Kind::String) => Data::String(rune_string(u32::try_from(*v).ok())),
            (Data::Slice(_), Kind::String) if self.ty.is_text_slice() => {
                Data::String(self.text_of_slice())
            }
            (Data::String(s), Kind::Slice) if target.is_text_slice() => {
                return text_to_slice(s, target);
            }
            (data, _) => data.clone(),
        };
        Ok(Self::from_parts(target.clone(), data))
    }

    fn text_of_slice(&self) -> String {
        let items = self.elements().unwrap_or_default();
        let is_bytes = self.ty.elem().is_some_and(|e| e.kind() == Kind::Uint8);
        if is_bytes {
            let bytes: Vec<u8> = items
                .iter()
                .filter_map(|v| v.as_uint().and_then(|b| u8::try_from(b).ok()))
                .collect();
            String::from_utf8_lossy(&bytes).into_owned()
        } else {
            items
                .iter()
                .map(|v| rune_string(v.as_int().and_then(|r| u32::try_from(r).ok())))
                .collect()
        }
    }

    /// `append(s, items...)`; reuses the backing array while capacity allows
    pub fn append(&self, items: Vec<Value>) -> Result<Value> {
        let elem = element_type(&self.ty, Kind::Slice)?;
        let Data::Slice(header) = &self.data else {
            return Err(kind_mismatch(Kind::Slice, self.kind()));
        };
        let items = assign_all(items, &elem)?;
        let (len, cap) = header.as_ref().map_or((0, 0), |h| (h.len, h.cap()));
        let needed = len + items.len();

        let header = match header {
            Some(h) if needed <= cap => {
                for (i, item) in items.into_iter().enumerate() {
                    *h.backing[h.offset + len + i].write() = item;
                }
                SliceHeader {
                    backing: h.backing.clone(),
                    offset: h.offset,
                    len: needed,
                }
            }
            _ => {
                let grown = (cap * SLICE_GROWTH_FACTOR).max(needed);
                let mut values = self.elements().unwrap_or_default();
                values.extend(items);
                SliceHeader::with_items(values, grown, &elem)
            }
        };
        Ok(Self::from_parts(self.ty.clone(), Data::Slice(Some(header))))
    }

    /// `copy(dst, src)`; returns the number of elements copied
    pub fn copy_into(&self, dst: &Value) -> Result<usize> {
        let (Some(src_elem), Some(dst_elem)) = (self.ty.elem(), dst.ty.elem()) else {
            return Err(kind_mismatch(Kind::Slice, dst.kind()));
        };
        if self.kind() != Kind::Slice || dst.kind() != Kind::Slice || src_elem != dst_elem {
            return Err(CoreError::NotAssignable {
                from: self.ty.name(),
                to: dst.ty.name(),
            });
        }
        let (Data::Slice(Some(src)), Data::Slice(Some(to))) = (&self.data, &dst.data) else {
            return Ok(0);
        };
        let count = src.len().min(to.len());
        let values: Vec<Value> = src.cells()[..count]
            .iter()
            .map(|cell| cell.read().clone())
            .collect();
        for (cell, value) in to.cells()[..count].iter().zip(values) {
            *cell.write() = value;
        }
        Ok(count)
    }

    /// Message of an `error` value
    pub fn error_message(&self) -> Option<String> {
        let dynamic = self.unboxed();
        if dynamic.is_nil() {
            return None;
        }
        let entry = dynamic
            .ty
            .method_set()
            .into_iter()
            .find(|m| m.name == "Error" && !m.is_promoted())?;
        let MethodTarget::Declared(decl) = entry.target else {
            return None;
        };
        decl.call(dynamic, Vec::new())
            .into_iter()
            .next()?
            .as_str()
            .map(str::to_string)
    }
}

fn element_type(ty: &Descriptor, kind: Kind) -> Result<Descriptor> {
    match ty.elem() {
        Some(elem) if ty.kind() == kind => Ok(elem),
        _ => Err(kind_mismatch(kind, ty.kind())),
    }
}

fn kind_mismatch(expected: Kind, actual: Kind) -> CoreError {
    CoreError::KindMismatch {
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

fn assign_all(items: Vec<Value>, elem: &Descriptor) -> Result<Vec<Value>> {
    items.into_iter().map(|v| v.assign_to(elem)).collect()
}

enum Number {
    Int(i64),
    Uint(u64),
    Float(f64),
}

fn cast(number: Number, to: Kind) -> Data {
    if to.is_float() {
        let v = match number {
            Number::Int(v) => v as f64,
            Number::Uint(v) => v as f64,
            Number::Float(v) => v,
        };
        return Data::Float(round_float(v, to));
    }
    let wide: i128 = match number {
        Number::Int(v) => i128::from(v),
        Number::Uint(v) => i128::from(v),
        Number::Float(v) => v as i128,
    };
    if to.is_signed() {
        Data::Int(wrap_signed(wide, to))
    } else {
        Data::Uint(wrap_unsigned(wide, to))
    }
}

/// Truncate to the width of a signed kind
pub(crate) fn wrap_signed(v: i128, kind: Kind) -> i64 {
    match kind {
        Kind::Int8 => i64::from(v as i8),
        Kind::Int16 => i64::from(v as i16),
        Kind::Int32 => i64::from(v as i32),
        _ => v as i64,
    }
}

/// Truncate to the width of an unsigned kind
pub(crate) fn wrap_unsigned(v: i128, kind: Kind) -> u64 {
    match kind {
        Kind::Uint8 => u64::from(v as u8),
        Kind::Uint16 => u64::from(v as u16),
        Kind::Uint32 => u64::from(v as u32),
        _ => v as u64,
    }
}

/// Round to the precision of a float kind
pub(crate) fn round_float(v: f64, kind: Kind) -> f64 {
    if kind == Kind::Float32 {
        f64::from(v as f32)
    } else {
        v
    }
}

/// Round both parts to the precision of a complex kind
pub(crate) fn round_complex(c: Complex128, kind: Kind) -> Complex128 {
    if kind == Kind::Complex64 {
        Complex128::new(f64::from(c.re as f32), f64::from(c.im as f32))
    } else {
        c
    }
}

fn rune_string(code: Option<u32>) -> String {
    code.and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
        .to_string()
}

fn text_to_slice(s: &str, target: &Descriptor) -> Result<Value> {
    let elem = element_type(target, Kind::Slice)?;
    let items: Vec<Value> = if elem.kind() == Kind::Uint8 {
        s.bytes()
            .map(|b| Value::from_parts(elem.clone(), Data::Uint(u64::from(b))))
            .collect()
    } else {
        s.chars()
            .map(|c| Value::from_parts(elem.clone(), Data::Int(i64::from(u32::from(c)))))
            .collect()
    };
    let cap = items.len();
    Ok(Value::from_parts(
        target.clone(),
        Data::Slice(Some(SliceHeader::with_items(items, cap, &elem))),
    ))
}

fn cells_eq(a: &[Slot], b: &[Slot]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| Arc::ptr_eq(x, y) || *x.read_recursive() == *y.read_recursive())
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.ty != other.ty {
            return false;
        }
        match (&self.data, &other.data) {
            (Data::Nil, Data::Nil) => true,
            (Data::Bool(a), Data::Bool(b)) => a == b,
            (Data::Int(a), Data::Int(b)) => a == b,
            (Data::Uint(a), Data::Uint(b)) => a == b,
            (Data::Float(a), Data::Float(b)) => a == b,
            (Data::Complex(a), Data::Complex(b)) => a == b,
            (Data::String(a), Data::String(b)) => a == b,
            (Data::Pointer(a), Data::Pointer(b)) => match (a, b) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            },
            (Data::Array(a), Data::Array(b)) | (Data::Struct(a), Data::Struct(b)) => {
                cells_eq(a, b)
            }
            (Data::Slice(a), Data::Slice(b)) => match (a, b) {
                (Some(a), Some(b)) => cells_eq(a.cells(), b.cells()),
                (None, None) => true,
                _ => false,
            },
            (Data::Map(a), Data::Map(b)) => match (a, b) {
                (Some(a), Some(b)) => {
                    a.ptr_eq(b)
                        || (a.len() == b.len()
                            && a.entries().into_iter().all(|(k, v)| {
                                MapKey::new(k).ok().and_then(|k| b.get(&k)) == Some(v)
                            }))
                }
                (None, None) => true,
                _ => false,
            },
            (Data::Chan(a), Data::Chan(b)) => match (a, b) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            },
            (Data::Func(a), Data::Func(b)) => match (a, b) {
                (Some(a), Some(b)) => a.same(b),
                (None, None) => true,
                _ => false,
            },
            (Data::Interface(a), Data::Interface(b)) => match (a, b) {
                (Some(a), Some(b)) => {
                    Arc::ptr_eq(a, b) || *a.read_recursive() == *b.read_recursive()
                }
                (None, None) => true,
                _ => false,
            },
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.ty.name(), self.data)
    }
}
