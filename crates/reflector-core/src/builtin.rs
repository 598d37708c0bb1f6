//! Predeclared types
//!
//! Every predeclared type is a process-wide singleton so that identity checks
//! against them are pointer comparisons in the common case.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::descriptor::{Descriptor, InterfaceMethod, Kind, Shape, Signature, StructField};
use crate::func::{native, MethodDecl};
use crate::value::Value;

macro_rules! predeclared {
    ($($func:ident, $cell:ident, $name:literal => $kind:ident;)*) => {
        $(
            static $cell: Lazy<Descriptor> =
                Lazy::new(|| Descriptor::predeclared($name, Shape::Basic(Kind::$kind)));

            #[doc = concat!("The predeclared `", $name, "` type")]
            pub fn $func() -> Descriptor {
                $cell.clone()
            }
        )*
    };
}

predeclared! {
    bool, BOOL, "bool" => Bool;
    int, INT, "int" => Int;
    int8, INT8, "int8" => Int8;
    int16, INT16, "int16" => Int16;
    int32, INT32, "int32" => Int32;
    int64, INT64, "int64" => Int64;
    uint, UINT, "uint" => Uint;
    uint8, UINT8, "uint8" => Uint8;
    uint16, UINT16, "uint16" => Uint16;
    uint32, UINT32, "uint32" => Uint32;
    uint64, UINT64, "uint64" => Uint64;
    uintptr, UINTPTR, "uintptr" => Uintptr;
    float32, FLOAT32, "float32" => Float32;
    float64, FLOAT64, "float64" => Float64;
    complex64, COMPLEX64, "complex64" => Complex64;
    complex128, COMPLEX128, "complex128" => Complex128;
    string, STRING, "string" => String;
    unsafe_pointer, UNSAFE_POINTER, "unsafe.Pointer" => UnsafePointer;
    untyped_nil, UNTYPED_NIL, "nil" => UntypedNil;
}

static ANY: Lazy<Descriptor> = Lazy::new(|| Descriptor::predeclared("any", Shape::Interface(vec![])));

static ERROR: Lazy<Descriptor> = Lazy::new(|| {
    Descriptor::predeclared(
        "error",
        Shape::Interface(vec![InterfaceMethod::new(
            "Error",
            Signature::new(vec![], vec![string()]),
        )]),
    )
});

static ERROR_STRING: Lazy<Descriptor> = Lazy::new(|| {
    let fields = Descriptor::struct_of(vec![StructField::new("s", string()).in_package("errors")]);
    let error = MethodDecl::pointer(
        "Error",
        Signature::new(vec![], vec![string()]),
        native(|args| {
            let message = args
                .first()
                .and_then(Value::deref)
                .and_then(|inner| inner.field(0))
                .unwrap_or_else(|| Value::string(""));
            vec![message]
        }),
    );
    Descriptor::defined("errors", "errorString", &fields, vec![error])
});

/// The empty interface, `any`
pub fn any() -> Descriptor {
    ANY.clone()
}

/// The predeclared `error` interface
pub fn error() -> Descriptor {
    ERROR.clone()
}

/// Concrete type behind [`Value::error`]
pub fn error_string() -> Descriptor {
    ERROR_STRING.clone()
}

static BY_NAME: Lazy<FxHashMap<String, Descriptor>> = Lazy::new(|| {
    [
        bool(),
        int(),
        int8(),
        int16(),
        int32(),
        int64(),
        uint(),
        uint8(),
        uint16(),
        uint32(),
        uint64(),
        uintptr(),
        float32(),
        float64(),
        complex64(),
        complex128(),
        string(),
        unsafe_pointer(),
        any(),
        error(),
    ]
    .into_iter()
    .map(|ty| (ty.name(), ty))
    .collect()
});

/// Names of the predeclared types
pub const PREDECLARED_NAMES: &[&str] = &[
    "bool",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
    "float32",
    "float64",
    "complex64",
    "complex128",
    "string",
    "unsafe.Pointer",
    "any",
    "error",
];

/// Look up a predeclared type by name
pub fn lookup(name: &str) -> Option<Descriptor> {
    BY_NAME.get(name).cloned()
}

/// Whether a descriptor is one of the predeclared types
pub fn is_predeclared(ty: &Descriptor) -> bool {
    ty.pkg_path().is_empty()
        && ty
            .type_name()
            .is_some_and(|name| BY_NAME.get(name).is_some_and(|known| known == ty))
}

/// Predeclared type of a scalar kind
pub fn basic(kind: Kind) -> Option<Descriptor> {
    let ty = match kind {
        Kind::Bool => bool(),
        Kind::Int => int(),
        Kind::Int8 => int8(),
        Kind::Int16 => int16(),
        Kind::Int32 => int32(),
        Kind::Int64 => int64(),
        Kind::Uint => uint(),
        Kind::Uint8 => uint8(),
        Kind::Uint16 => uint16(),
        Kind::Uint32 => uint32(),
        Kind::Uint64 => uint64(),
        Kind::Uintptr => uintptr(),
        Kind::Float32 => float32(),
        Kind::Float64 => float64(),
        Kind::Complex64 => complex64(),
        Kind::Complex128 => complex128(),
        Kind::String => string(),
        Kind::UnsafePointer => unsafe_pointer(),
        Kind::UntypedNil => untyped_nil(),
        _ => return None,
    };
    Some(ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("int"), Some(int()));
        assert_eq!(lookup("error"), Some(error()));
        assert!(lookup("Dessert").is_none());
        assert_eq!(BY_NAME.len(), PREDECLARED_NAMES.len());
    }

    #[test]
    fn test_is_predeclared() {
        assert!(is_predeclared(&string()));
        assert!(is_predeclared(&any()));
        let shadow = Descriptor::named("example.com/p", "int");
        shadow.define(&int()).unwrap();
        assert!(!is_predeclared(&shadow));
        assert!(!is_predeclared(&Descriptor::slice_of(&int())));
    }

    #[test]
    fn test_error_string_implements_error() {
        assert!(Descriptor::pointer_to(&error_string()).implements(&error()));
        assert!(!error_string().implements(&error()));
    }

    #[test]
    fn test_basic_kinds() {
        assert_eq!(basic(Kind::Float32).unwrap().name(), "float32");
        assert!(basic(Kind::Struct).is_none());
    }
}
