//! Type descriptors
//!
//! A [`Descriptor`] is a cheaply clonable handle to an immutable type
//! description. Unnamed types are built from a [`Shape`]; named types are
//! declared with [`Descriptor::named`] and receive their underlying shape and
//! method declarations afterwards, which lets a struct refer to itself
//! through a pointer field.
//!
//! # Identity
//!
//! Two named types are identical when their package path and name match.
//! Unnamed types are identical when their shapes are. Rendering and equality
//! stop at named types, so recursive types terminate.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{CoreError, Result};
use crate::func::MethodDecl;

/// The kind of a type: which of the primitive or composite forms it takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Declared but undefined named type
    Invalid,
    /// `bool`
    Bool,
    /// `int`, pointer sized
    Int,
    /// `int8`
    Int8,
    /// `int16`
    Int16,
    /// `int32` (also `rune`)
    Int32,
    /// `int64`
    Int64,
    /// `uint`, pointer sized
    Uint,
    /// `uint8` (also `byte`)
    Uint8,
    /// `uint16`
    Uint16,
    /// `uint32`
    Uint32,
    /// `uint64`
    Uint64,
    /// `uintptr`
    Uintptr,
    /// `float32`
    Float32,
    /// `float64`
    Float64,
    /// `complex64`
    Complex64,
    /// `complex128`
    Complex128,
    /// `[N]T`
    Array,
    /// `chan T`
    Chan,
    /// `func(...) ...`
    Func,
    /// `interface { ... }`
    Interface,
    /// `map[K]V`
    Map,
    /// `*T`
    Pointer,
    /// `[]T`
    Slice,
    /// `string`
    String,
    /// `struct { ... }`
    Struct,
    /// `unsafe.Pointer`
    UnsafePointer,
    /// The type of the bare `nil` literal
    UntypedNil,
}

impl Kind {
    /// Signed integer kinds
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            Kind::Int | Kind::Int8 | Kind::Int16 | Kind::Int32 | Kind::Int64
        )
    }

    /// Unsigned integer kinds, including `uintptr`
    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            Kind::Uint | Kind::Uint8 | Kind::Uint16 | Kind::Uint32 | Kind::Uint64 | Kind::Uintptr
        )
    }

    /// Any integer kind
    pub fn is_integer(self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    /// `float32` or `float64`
    pub fn is_float(self) -> bool {
        matches!(self, Kind::Float32 | Kind::Float64)
    }

    /// `complex64` or `complex128`
    pub fn is_complex(self) -> bool {
        matches!(self, Kind::Complex64 | Kind::Complex128)
    }

    /// Integer, float or complex
    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float() || self.is_complex()
    }

    /// Kinds whose zero value is `nil`
    pub fn is_nillable(self) -> bool {
        matches!(
            self,
            Kind::Pointer
                | Kind::Slice
                | Kind::Map
                | Kind::Chan
                | Kind::Func
                | Kind::Interface
                | Kind::UnsafePointer
        )
    }

    /// Storage width in bits for numeric kinds
    pub fn bits(self) -> Option<u32> {
        match self {
            Kind::Int8 | Kind::Uint8 => Some(8),
            Kind::Int16 | Kind::Uint16 => Some(16),
            Kind::Int32 | Kind::Uint32 | Kind::Float32 => Some(32),
            Kind::Int64 | Kind::Uint64 | Kind::Float64 | Kind::Complex64 => Some(64),
            Kind::Int | Kind::Uint | Kind::Uintptr => Some(usize::BITS),
            Kind::Complex128 => Some(128),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Invalid => "invalid",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Int8 => "int8",
            Kind::Int16 => "int16",
            Kind::Int32 => "int32",
            Kind::Int64 => "int64",
            Kind::Uint => "uint",
            Kind::Uint8 => "uint8",
            Kind::Uint16 => "uint16",
            Kind::Uint32 => "uint32",
            Kind::Uint64 => "uint64",
            Kind::Uintptr => "uintptr",
            Kind::Float32 => "float32",
            Kind::Float64 => "float64",
            Kind::Complex64 => "complex64",
            Kind::Complex128 => "complex128",
            Kind::Array => "array",
            Kind::Chan => "chan",
            Kind::Func => "func",
            Kind::Interface => "interface",
            Kind::Map => "map",
            Kind::Pointer => "ptr",
            Kind::Slice => "slice",
            Kind::String => "string",
            Kind::Struct => "struct",
            Kind::UnsafePointer => "unsafe.Pointer",
            Kind::UntypedNil => "nil",
        };
        f.write_str(name)
    }
}

/// Channel direction at the type level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    /// `chan T`
    Both,
    /// `chan<- T`
    Send,
    /// `<-chan T`
    Recv,
}

impl ChanDir {
    /// Whether values may be sent on a channel of this direction
    pub fn can_send(self) -> bool {
        self != ChanDir::Recv
    }

    /// Whether values may be received from a channel of this direction
    pub fn can_recv(self) -> bool {
        self != ChanDir::Send
    }
}

/// Parameter and result types of a function or method
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    /// Parameter types; for variadic signatures the last one is a slice
    pub params: Vec<Descriptor>,
    /// Result types
    pub results: Vec<Descriptor>,
    /// Whether the last parameter collects trailing arguments
    pub variadic: bool,
}

impl Signature {
    /// Fixed-arity signature
    pub fn new(params: Vec<Descriptor>, results: Vec<Descriptor>) -> Self {
        Self {
            params,
            results,
            variadic: false,
        }
    }

    /// Variadic signature; the last parameter must be a slice type
    pub fn variadic(params: Vec<Descriptor>, results: Vec<Descriptor>) -> Self {
        Self {
            params,
            results,
            variadic: true,
        }
    }

    /// Renders `func(P1,P2) R` or `func(P1) (R1,R2)`
    pub fn render(&self) -> String {
        format!("func{}", self.render_tail())
    }

    fn render_tail(&self) -> String {
        let params = join_names(&self.params);
        match self.results.len() {
            0 => format!("({params})"),
            1 => format!("({params}) {}", self.results[0].name()),
            _ => format!("({params}) ({})", join_names(&self.results)),
        }
    }
}

fn join_names(types: &[Descriptor]) -> String {
    types
        .iter()
        .map(Descriptor::name)
        .collect::<Vec<_>>()
        .join(",")
}

/// Whether an identifier is visible outside its package
pub fn is_exported_name(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// A field of a struct type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructField {
    /// Field name; for embedded fields the embedded type's name
    pub name: String,
    /// Field type
    pub ty: Descriptor,
    /// Raw tag text
    pub tag: String,
    /// Whether the field is embedded
    pub embedded: bool,
    /// Declaring package for unexported fields, empty otherwise
    pub pkg_path: String,
}

impl StructField {
    /// Named field with no tag
    pub fn new(name: impl Into<String>, ty: Descriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            tag: String::new(),
            embedded: false,
            pkg_path: String::new(),
        }
    }

    /// Embedded field; the name is taken from the (pointed-to) type
    pub fn embedded(ty: Descriptor) -> Self {
        let base = match ty.shape() {
            Some(Shape::Pointer(elem)) if !ty.is_named() => elem.clone(),
            _ => ty.clone(),
        };
        let name = base
            .type_name()
            .map(str::to_string)
            .unwrap_or_else(|| base.name());
        Self {
            name,
            ty,
            tag: String::new(),
            embedded: true,
            pkg_path: String::new(),
        }
    }

    /// Attach a raw tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Record the declaring package of an unexported field
    pub fn in_package(mut self, pkg_path: impl Into<String>) -> Self {
        self.pkg_path = pkg_path.into();
        self
    }

    /// Whether the field is visible outside its package
    pub fn is_exported(&self) -> bool {
        is_exported_name(&self.name)
    }
}

/// A method requirement of an interface type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceMethod {
    /// Method name
    pub name: String,
    /// Declaring package for unexported methods, empty otherwise
    pub pkg_path: String,
    /// Signature, without receiver
    pub sig: Signature,
}

impl InterfaceMethod {
    /// Exported interface method
    pub fn new(name: impl Into<String>, sig: Signature) -> Self {
        Self {
            name: name.into(),
            pkg_path: String::new(),
            sig,
        }
    }

    /// Whether the method is visible outside its package
    pub fn is_exported(&self) -> bool {
        is_exported_name(&self.name)
    }
}

/// Structure of a type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Boolean, numeric, string and pointer-like scalars
    Basic(Kind),
    /// `*T`
    Pointer(Descriptor),
    /// `[N]T`
    Array {
        /// Fixed length
        len: usize,
        /// Element type
        elem: Descriptor,
    },
    /// `[]T`
    Slice(Descriptor),
    /// `map[K]V`
    Map {
        /// Key type
        key: Descriptor,
        /// Value type
        elem: Descriptor,
    },
    /// `chan T`, `chan<- T`, `<-chan T`
    Chan {
        /// Direction
        dir: ChanDir,
        /// Element type
        elem: Descriptor,
    },
    /// `func(...) ...`
    Func(Signature),
    /// `struct { ... }`
    Struct(Vec<StructField>),
    /// `interface { ... }`, methods sorted by name
    Interface(Vec<InterfaceMethod>),
}

impl Shape {
    /// Kind of the shape
    pub fn kind(&self) -> Kind {
        match self {
            Shape::Basic(kind) => *kind,
            Shape::Pointer(_) => Kind::Pointer,
            Shape::Array { .. } => Kind::Array,
            Shape::Slice(_) => Kind::Slice,
            Shape::Map { .. } => Kind::Map,
            Shape::Chan { .. } => Kind::Chan,
            Shape::Func(_) => Kind::Func,
            Shape::Struct(_) => Kind::Struct,
            Shape::Interface(_) => Kind::Interface,
        }
    }

    fn render(&self) -> String {
        match self {
            Shape::Basic(kind) => kind.to_string(),
            Shape::Pointer(elem) => format!("*{}", elem.name()),
            Shape::Array { len, elem } => format!("[{len}]{}", elem.name()),
            Shape::Slice(elem) => format!("[]{}", elem.name()),
            Shape::Map { key, elem } => format!("map[{}]{}", key.name(), elem.name()),
            Shape::Chan { dir, elem } => match dir {
                ChanDir::Both => format!("chan {}", elem.name()),
                ChanDir::Send => format!("chan<- {}", elem.name()),
                ChanDir::Recv => format!("<-chan {}", elem.name()),
            },
            Shape::Func(sig) => sig.render(),
            Shape::Struct(fields) if fields.is_empty() => "struct {}".to_string(),
            Shape::Struct(fields) => {
                let body = fields
                    .iter()
                    .map(|field| {
                        let mut decl = if field.embedded {
                            field.ty.name()
                        } else {
                            format!("{} {}", field.name, field.ty.name())
                        };
                        if !field.tag.is_empty() {
                            decl.push_str(&format!(" {:?}", field.tag));
                        }
                        decl
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                format!("struct {{ {body} }}")
            }
            Shape::Interface(methods) if methods.is_empty() => "interface {}".to_string(),
            Shape::Interface(methods) => {
                let body = methods
                    .iter()
                    .map(|m| format!("{}{}", m.name, m.sig.render_tail()))
                    .collect::<Vec<_>>()
                    .join("; ");
                format!("interface {{ {body} }}")
            }
        }
    }
}

/// How a method in a method set is reached
#[derive(Debug, Clone)]
pub enum MethodTarget {
    /// A method declared on a named type
    Declared(Arc<MethodDecl>),
    /// A method of an embedded interface, dispatched on its dynamic value
    Interface,
}

/// A method reachable from a type, possibly promoted through embedded fields
#[derive(Debug, Clone)]
pub struct MethodEntry {
    /// Method name
    pub name: String,
    /// Declaring package for unexported methods, empty otherwise
    pub pkg_path: String,
    /// Signature, without receiver
    pub sig: Signature,
    /// Indices of the embedded fields walked from the receiver
    pub path: Vec<usize>,
    /// Where the call lands
    pub target: MethodTarget,
}

impl MethodEntry {
    /// Whether the method is visible outside its package
    pub fn is_exported(&self) -> bool {
        is_exported_name(&self.name)
    }

    /// Whether the method was promoted from an embedded field
    pub fn is_promoted(&self) -> bool {
        !self.path.is_empty()
    }
}

struct TypeDescriptor {
    name: Option<String>,
    pkg_path: String,
    repr: Repr,
}

enum Repr {
    Shape(Shape),
    Named {
        underlying: OnceCell<Descriptor>,
        methods: OnceCell<Vec<Arc<MethodDecl>>>,
    },
}

/// Shared handle to a type description
#[derive(Clone)]
pub struct Descriptor(Arc<TypeDescriptor>);

impl Descriptor {
    fn from_shape(shape: Shape) -> Self {
        Self(Arc::new(TypeDescriptor {
            name: None,
            pkg_path: String::new(),
            repr: Repr::Shape(shape),
        }))
    }

    pub(crate) fn predeclared(name: &str, shape: Shape) -> Self {
        Self(Arc::new(TypeDescriptor {
            name: Some(name.to_string()),
            pkg_path: String::new(),
            repr: Repr::Shape(shape),
        }))
    }

    /// Named type whose definition is known up front
    pub(crate) fn defined(
        pkg_path: &str,
        name: &str,
        underlying: &Descriptor,
        methods: Vec<MethodDecl>,
    ) -> Self {
        let mut methods: Vec<_> = methods.into_iter().map(Arc::new).collect();
        methods.sort_by(|a, b| a.name().cmp(b.name()));
        Self(Arc::new(TypeDescriptor {
            name: Some(name.to_string()),
            pkg_path: pkg_path.to_string(),
            repr: Repr::Named {
                underlying: OnceCell::with_value(underlying.underlying()),
                methods: OnceCell::with_value(methods),
            },
        }))
    }

    /// Declare a named type; its underlying type is supplied by [`Descriptor::define`]
    pub fn named(pkg_path: impl Into<String>, name: impl Into<String>) -> Self {
        Self(Arc::new(TypeDescriptor {
            name: Some(name.into()),
            pkg_path: pkg_path.into(),
            repr: Repr::Named {
                underlying: OnceCell::new(),
                methods: OnceCell::new(),
            },
        }))
    }

    /// Give a declared named type its underlying type
    pub fn define(&self, underlying: &Descriptor) -> Result<()> {
        let Repr::Named { underlying: cell, .. } = &self.0.repr else {
            return Err(CoreError::AlreadyDefined { name: self.name() });
        };
        if underlying.shape().is_none() {
            return Err(CoreError::Undefined {
                name: underlying.name(),
            });
        }
        cell.set(underlying.underlying())
            .map_err(|_| CoreError::AlreadyDefined { name: self.name() })
    }

    /// Attach the methods declared on a named type
    pub fn define_methods(&self, methods: Vec<MethodDecl>) -> Result<()> {
        let Repr::Named { methods: cell, .. } = &self.0.repr else {
            return Err(CoreError::AlreadyDefined { name: self.name() });
        };
        let mut methods: Vec<_> = methods.into_iter().map(Arc::new).collect();
        methods.sort_by(|a, b| a.name().cmp(b.name()));
        cell.set(methods)
            .map_err(|_| CoreError::AlreadyDefined { name: self.name() })
    }

    /// `*elem`
    pub fn pointer_to(elem: &Descriptor) -> Self {
        Self::from_shape(Shape::Pointer(elem.clone()))
    }

    /// `[]elem`
    pub fn slice_of(elem: &Descriptor) -> Self {
        Self::from_shape(Shape::Slice(elem.clone()))
    }

    /// `[len]elem`
    pub fn array_of(len: usize, elem: &Descriptor) -> Self {
        Self::from_shape(Shape::Array {
            len,
            elem: elem.clone(),
        })
    }

    /// `map[key]elem`
    pub fn map_of(key: &Descriptor, elem: &Descriptor) -> Self {
        Self::from_shape(Shape::Map {
            key: key.clone(),
            elem: elem.clone(),
        })
    }

    /// Channel of the given direction
    pub fn chan_of(dir: ChanDir, elem: &Descriptor) -> Self {
        Self::from_shape(Shape::Chan {
            dir,
            elem: elem.clone(),
        })
    }

    /// Function type
    pub fn func_of(sig: Signature) -> Self {
        Self::from_shape(Shape::Func(sig))
    }

    /// Unnamed struct type
    pub fn struct_of(fields: Vec<StructField>) -> Self {
        Self::from_shape(Shape::Struct(fields))
    }

    /// Unnamed interface type
    pub fn interface_of(mut methods: Vec<InterfaceMethod>) -> Self {
        methods.sort_by(|a, b| a.name.cmp(&b.name));
        Self::from_shape(Shape::Interface(methods))
    }

    /// Display name: the declared name, or the rendered shape for unnamed types
    pub fn name(&self) -> String {
        match &self.0.name {
            Some(name) => name.clone(),
            None => match &self.0.repr {
                Repr::Shape(shape) => shape.render(),
                Repr::Named { .. } => String::new(),
            },
        }
    }

    /// Declared name, `None` for unnamed types
    pub fn type_name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    /// Whether the type carries a name (predeclared types included)
    pub fn is_named(&self) -> bool {
        self.0.name.is_some()
    }

    /// Whether the type is one of the predeclared names
    pub fn is_predeclared(&self) -> bool {
        self.is_named() && matches!(self.0.repr, Repr::Shape(_))
    }

    /// Full package path, empty for predeclared and unnamed types
    pub fn pkg_path(&self) -> &str {
        &self.0.pkg_path
    }

    /// Last segment of the package path
    pub fn package_name(&self) -> &str {
        self.0.pkg_path.rsplit('/').next().unwrap_or_default()
    }

    /// Kind of the underlying type
    pub fn kind(&self) -> Kind {
        self.shape().map_or(Kind::Invalid, Shape::kind)
    }

    /// Underlying shape, `None` while a named type is undefined
    pub fn shape(&self) -> Option<&Shape> {
        match &self.0.repr {
            Repr::Shape(shape) => Some(shape),
            Repr::Named { underlying, .. } => underlying.get().and_then(Descriptor::shape),
        }
    }

    /// Underlying type; predeclared and unnamed types are their own
    pub fn underlying(&self) -> Descriptor {
        match &self.0.repr {
            Repr::Shape(_) => self.clone(),
            Repr::Named { underlying, .. } => {
                underlying.get().cloned().unwrap_or_else(|| self.clone())
            }
        }
    }

    /// Element type of pointers, arrays, slices, maps and channels
    pub fn elem(&self) -> Option<Descriptor> {
        match self.shape()? {
            Shape::Pointer(elem) | Shape::Slice(elem) => Some(elem.clone()),
            Shape::Array { elem, .. } | Shape::Map { elem, .. } | Shape::Chan { elem, .. } => {
                Some(elem.clone())
            }
            _ => None,
        }
    }

    /// Key type of a map
    pub fn key(&self) -> Option<Descriptor> {
        match self.shape()? {
            Shape::Map { key, .. } => Some(key.clone()),
            _ => None,
        }
    }

    /// Fixed length of an array
    pub fn array_len(&self) -> Option<usize> {
        match self.shape()? {
            Shape::Array { len, .. } => Some(*len),
            _ => None,
        }
    }

    /// Direction of a channel
    pub fn chan_dir(&self) -> Option<ChanDir> {
        match self.shape()? {
            Shape::Chan { dir, .. } => Some(*dir),
            _ => None,
        }
    }

    /// Signature of a function type
    pub fn signature(&self) -> Option<&Signature> {
        match self.shape()? {
            Shape::Func(sig) => Some(sig),
            _ => None,
        }
    }

    /// Fields of a struct type
    pub fn fields(&self) -> Option<&[StructField]> {
        match self.shape()? {
            Shape::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Methods required by an interface type
    pub fn interface_methods(&self) -> Option<&[InterfaceMethod]> {
        match self.shape()? {
            Shape::Interface(methods) => Some(methods),
            _ => None,
        }
    }

    /// Methods declared directly on a named type, sorted by name
    pub fn declared_methods(&self) -> &[Arc<MethodDecl>] {
        match &self.0.repr {
            Repr::Named { methods, .. } => methods.get().map_or(&[], Vec::as_slice),
            Repr::Shape(_) => &[],
        }
    }

    /// Method set of the type, sorted by name
    ///
    /// Values of a named type carry the value-receiver methods; pointers to
    /// it carry both receiver forms. Methods of embedded fields are promoted,
    /// the shallowest declaration wins and ambiguous names are dropped.
    pub fn method_set(&self) -> Vec<MethodEntry> {
        match self.shape() {
            Some(Shape::Interface(methods)) => methods
                .iter()
                .map(|m| MethodEntry {
                    name: m.name.clone(),
                    pkg_path: m.pkg_path.clone(),
                    sig: m.sig.clone(),
                    path: Vec::new(),
                    target: MethodTarget::Interface,
                })
                .collect(),
            Some(Shape::Pointer(elem)) if !self.is_named() => match elem.kind() {
                Kind::Pointer | Kind::Interface => Vec::new(),
                _ => collect_methods(elem, true),
            },
            _ => collect_methods(self, false),
        }
    }

    /// Whether the method set satisfies an interface
    pub fn implements(&self, iface: &Descriptor) -> bool {
        let Some(required) = iface.interface_methods() else {
            return false;
        };
        if required.is_empty() {
            return true;
        }
        let available = self.method_set();
        required.iter().all(|req| {
            available.iter().any(|m| {
                m.name == req.name
                    && m.sig == req.sig
                    && (req.is_exported() || m.pkg_path == req.pkg_path)
            })
        })
    }

    /// Whether a value of this type may be stored in a variable of `target`
    pub fn assignable_to(&self, target: &Descriptor) -> bool {
        if self == target {
            return true;
        }
        let kind = self.kind();
        if kind == Kind::UntypedNil {
            return target.kind().is_nillable();
        }
        if target.kind() == Kind::Interface {
            return self.implements(target);
        }
        if (!self.is_named() || !target.is_named()) && self.underlying() == target.underlying()
        {
            return true;
        }
        match (self.shape(), target.shape()) {
            (
                Some(Shape::Chan {
                    dir: ChanDir::Both,
                    elem,
                }),
                Some(Shape::Chan {
                    elem: target_elem, ..
                }),
            ) => (!self.is_named() || !target.is_named()) && elem == target_elem,
            _ => false,
        }
    }

    /// Whether a value of this type may be converted to `target`
    pub fn convertible_to(&self, target: &Descriptor) -> bool {
        if self.assignable_to(target) || self.underlying() == target.underlying() {
            return true;
        }
        let (from, to) = (self.kind(), target.kind());
        if from == Kind::Pointer && to == Kind::Pointer && !self.is_named() && !target.is_named()
        {
            if let (Some(a), Some(b)) = (self.elem(), target.elem()) {
                return a.underlying() == b.underlying();
            }
        }
        if (from.is_integer() || from.is_float()) && (to.is_integer() || to.is_float()) {
            return true;
        }
        if from.is_complex() && to.is_complex() {
            return true;
        }
        if to == Kind::String && (from.is_integer() || self.is_text_slice()) {
            return true;
        }
        from == Kind::String && target.is_text_slice()
    }

    /// `[]byte` or `[]rune` underlying
    pub(crate) fn is_text_slice(&self) -> bool {
        match self.shape() {
            Some(Shape::Slice(elem)) => matches!(elem.kind(), Kind::Uint8 | Kind::Int32),
            _ => false,
        }
    }

    /// Whether values of the type support `==`
    pub fn is_comparable(&self) -> bool {
        match self.shape() {
            None => false,
            Some(Shape::Slice(_) | Shape::Map { .. } | Shape::Func(_)) => false,
            Some(Shape::Array { elem, .. }) => elem.is_comparable(),
            Some(Shape::Struct(fields)) => fields.iter().all(|f| f.ty.is_comparable()),
            Some(_) => true,
        }
    }

    /// Same underlying allocation
    pub fn ptr_eq(&self, other: &Descriptor) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

fn collect_methods(root: &Descriptor, pointer: bool) -> Vec<MethodEntry> {
    let mut methods = Vec::new();
    let mut claimed: FxHashSet<String> = FxHashSet::default();
    let mut visited: FxHashSet<Descriptor> = FxHashSet::default();
    let mut level = vec![(root.clone(), pointer, Vec::new())];

    while !level.is_empty() {
        let mut found: FxHashMap<String, Vec<MethodEntry>> = FxHashMap::default();
        let mut next = Vec::new();

        for (ty, pointer, path) in level {
            if !visited.insert(ty.clone()) {
                continue;
            }
            if let Some(required) = ty.interface_methods() {
                for m in required {
                    found.entry(m.name.clone()).or_default().push(MethodEntry {
                        name: m.name.clone(),
                        pkg_path: m.pkg_path.clone(),
                        sig: m.sig.clone(),
                        path: path.clone(),
                        target: MethodTarget::Interface,
                    });
                }
                continue;
            }
            for decl in ty.declared_methods() {
                if decl.pointer_receiver() && !pointer {
                    continue;
                }
                found
                    .entry(decl.name().to_string())
                    .or_default()
                    .push(MethodEntry {
                        name: decl.name().to_string(),
                        pkg_path: decl.pkg_path().to_string(),
                        sig: decl.sig().clone(),
                        path: path.clone(),
                        target: MethodTarget::Declared(decl.clone()),
                    });
            }
            let Some(fields) = ty.fields() else {
                continue;
            };
            for (index, field) in fields.iter().enumerate().filter(|(_, f)| f.embedded) {
                let mut field_path = path.clone();
                field_path.push(index);
                match field.ty.shape() {
                    Some(Shape::Pointer(elem)) if !field.ty.is_named() => {
                        next.push((elem.clone(), true, field_path))
                    }
                    _ => next.push((field.ty.clone(), pointer, field_path)),
                }
            }
        }

        for (name, mut candidates) in found {
            if !claimed.insert(name) {
                continue;
            }
            if candidates.len() == 1 {
                methods.extend(candidates.pop());
            }
        }
        level = next;
    }

    methods.sort_by(|a, b| a.name.cmp(&b.name));
    methods
}

impl PartialEq for Descriptor {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        match (&self.0.name, &other.0.name) {
            (Some(a), Some(b)) => a == b && self.0.pkg_path == other.0.pkg_path,
            (None, None) => self.shape() == other.shape(),
            _ => false,
        }
    }
}

impl Eq for Descriptor {}

impl Hash for Descriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.0.name {
            Some(name) => {
                name.hash(state);
                self.0.pkg_path.hash(state);
            }
            None => self.shape().hash(state),
        }
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;
    use crate::func::{native, MethodDecl};

    fn stringer() -> Descriptor {
        Descriptor::interface_of(vec![InterfaceMethod::new(
            "String",
            Signature::new(vec![], vec![builtin::string()]),
        )])
    }

    fn point() -> Descriptor {
        let point = Descriptor::named("example.com/geo", "Point");
        point
            .define(&Descriptor::struct_of(vec![
                StructField::new("X", builtin::int()),
                StructField::new("Y", builtin::int()),
            ]))
            .unwrap();
        point
            .define_methods(vec![
                MethodDecl::new(
                    "String",
                    Signature::new(vec![], vec![builtin::string()]),
                    native(|_| vec![]),
                ),
                MethodDecl::pointer(
                    "Scale",
                    Signature::new(vec![builtin::int()], vec![]),
                    native(|_| vec![]),
                ),
            ])
            .unwrap();
        point
    }

    #[test]
    fn test_render_composites() {
        let int = builtin::int();
        assert_eq!(Descriptor::slice_of(&int).name(), "[]int");
        assert_eq!(Descriptor::array_of(3, &int).name(), "[3]int");
        assert_eq!(
            Descriptor::map_of(&builtin::string(), &builtin::any()).name(),
            "map[string]any"
        );
        assert_eq!(
            Descriptor::chan_of(ChanDir::Recv, &builtin::string()).name(),
            "<-chan string"
        );
        assert_eq!(
            Descriptor::chan_of(ChanDir::Send, &builtin::string()).name(),
            "chan<- string"
        );
        let sig = Signature::variadic(
            vec![
                builtin::string(),
                Descriptor::slice_of(&int),
                Descriptor::slice_of(&builtin::any()),
            ],
            vec![int.clone(), builtin::error()],
        );
        assert_eq!(sig.render(), "func(string,[]int,[]any) (int,error)");
        assert_eq!(
            Signature::new(vec![], vec![int.clone()]).render(),
            "func() int"
        );
    }

    #[test]
    fn test_named_identity() {
        let a = Descriptor::named("example.com/geo", "Point");
        let b = Descriptor::named("example.com/geo", "Point");
        let c = Descriptor::named("example.com/other", "Point");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(
            Descriptor::slice_of(&builtin::int()),
            Descriptor::slice_of(&builtin::int())
        );
        assert_eq!(a.package_name(), "geo");
    }

    #[test]
    fn test_define_twice_fails() {
        let a = Descriptor::named("p", "A");
        a.define(&builtin::int()).unwrap();
        assert!(matches!(
            a.define(&builtin::int()),
            Err(CoreError::AlreadyDefined { .. })
        ));
        assert_eq!(a.kind(), Kind::Int);
        assert_eq!(a.underlying(), builtin::int());
    }

    #[test]
    fn test_self_referential_type() {
        let node = Descriptor::named("p", "Node");
        node.define(&Descriptor::struct_of(vec![
            StructField::new("Next", Descriptor::pointer_to(&node)),
        ]))
        .unwrap();
        let next = &node.fields().unwrap()[0];
        assert_eq!(next.ty.name(), "*Node");
        assert_eq!(next.ty.elem().unwrap(), node);
    }

    #[test]
    fn test_method_sets_by_receiver() {
        let point = point();
        let values: Vec<_> = point.method_set().into_iter().map(|m| m.name).collect();
        assert_eq!(values, vec!["String"]);
        let pointers: Vec<_> = Descriptor::pointer_to(&point)
            .method_set()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(pointers, vec!["Scale", "String"]);
    }

    #[test]
    fn test_promoted_methods() {
        let point = point();
        let wrapper = Descriptor::named("p", "Wrapper");
        wrapper
            .define(&Descriptor::struct_of(vec![
                StructField::new("Label", builtin::string()),
                StructField::embedded(Descriptor::pointer_to(&point)),
            ]))
            .unwrap();
        let set = wrapper.method_set();
        assert_eq!(set.len(), 2);
        assert!(set.iter().all(|m| m.path == vec![1]));
        assert!(wrapper.implements(&stringer()));
    }

    #[test]
    fn test_ambiguous_promotion_dropped() {
        let a = Descriptor::named("p", "A");
        a.define(&Descriptor::struct_of(vec![])).unwrap();
        a.define_methods(vec![MethodDecl::new(
            "Name",
            Signature::new(vec![], vec![]),
            native(|_| vec![]),
        )])
        .unwrap();
        let b = Descriptor::named("p", "B");
        b.define(&Descriptor::struct_of(vec![])).unwrap();
        b.define_methods(vec![MethodDecl::new(
            "Name",
            Signature::new(vec![], vec![]),
            native(|_| vec![]),
        )])
        .unwrap();
        let both = Descriptor::struct_of(vec![StructField::embedded(a), StructField::embedded(b)]);
        assert!(both.method_set().is_empty());
    }

    #[test]
    fn test_assignability() {
        let point = point();
        let int = builtin::int();
        let age = Descriptor::named("p", "Age");
        age.define(&int).unwrap();

        assert!(int.assignable_to(&builtin::any()));
        assert!(point.assignable_to(&stringer()));
        assert!(!age.assignable_to(&int));
        assert!(age.convertible_to(&int));
        assert!(builtin::untyped_nil().assignable_to(&Descriptor::slice_of(&int)));
        assert!(!builtin::untyped_nil().assignable_to(&int));

        let ints = Descriptor::named("p", "Ints");
        ints.define(&Descriptor::slice_of(&int)).unwrap();
        assert!(Descriptor::slice_of(&int).assignable_to(&ints));

        let both = Descriptor::chan_of(ChanDir::Both, &int);
        assert!(both.assignable_to(&Descriptor::chan_of(ChanDir::Recv, &int)));
        assert!(!Descriptor::chan_of(ChanDir::Recv, &int).assignable_to(&both));
    }

    #[test]
    fn test_conversions() {
        let int = builtin::int();
        assert!(int.convertible_to(&builtin::float64()));
        assert!(int.convertible_to(&builtin::string()));
        assert!(builtin::string().convertible_to(&Descriptor::slice_of(&builtin::uint8())));
        assert!(!builtin::string().convertible_to(&int));
        assert!(!builtin::bool().convertible_to(&int));
    }

    #[test]
    fn test_comparable() {
        assert!(builtin::int().is_comparable());
        assert!(!Descriptor::slice_of(&builtin::int()).is_comparable());
        assert!(Descriptor::array_of(2, &builtin::string()).is_comparable());
        assert!(!Descriptor::struct_of(vec![StructField::new(
            "M",
            Descriptor::map_of(&builtin::string(), &builtin::int())
        )])
        .is_comparable());
    }
}
