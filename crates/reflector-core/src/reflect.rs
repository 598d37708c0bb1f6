//! Bridging Rust values into the dynamic model
//!
//! `isize`/`usize` map to `int`/`uint`, `Vec<T>` to slices, `[T; N]` to
//! arrays, `HashMap<K, V>` to maps and [`Value`] itself to `any`.

use std::collections::HashMap;
use std::hash::Hash;

use crate::builtin;
use crate::descriptor::Descriptor;
use crate::value::{Complex128, Data, MapKey, MapObject, SliceHeader, Value};

/// A Rust type with a counterpart in the dynamic model
pub trait Reflect: Sized {
    /// Descriptor of the counterpart type
    fn descriptor() -> Descriptor;

    /// Convert into a dynamic value
    fn into_value(self) -> Value;

    /// Extract from a dynamic value of a matching kind
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! reflect_signed {
    ($($t:ty => $ty:ident),* $(,)?) => {
        $(
            impl Reflect for $t {
                fn descriptor() -> Descriptor {
                    builtin::$ty()
                }

                fn into_value(self) -> Value {
                    Value::from_parts(builtin::$ty(), Data::Int(self as i64))
                }

                fn from_value(value: &Value) -> Option<Self> {
                    value.as_int().and_then(|v| <$t>::try_from(v).ok())
                }
            }

            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    v.into_value()
                }
            }
        )*
    };
}

macro_rules! reflect_unsigned {
    ($($t:ty => $ty:ident),* $(,)?) => {
        $(
            impl Reflect for $t {
                fn descriptor() -> Descriptor {
                    builtin::$ty()
                }

                fn into_value(self) -> Value {
                    Value::from_parts(builtin::$ty(), Data::Uint(self as u64))
                }

                fn from_value(value: &Value) -> Option<Self> {
                    value.as_uint().and_then(|v| <$t>::try_from(v).ok())
                }
            }

            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    v.into_value()
                }
            }
        )*
    };
}

reflect_signed!(i8 => int8, i16 => int16, i32 => int32, i64 => int64, isize => int);
reflect_unsigned!(u8 => uint8, u16 => uint16, u32 => uint32, u64 => uint64, usize => uint);

impl Reflect for bool {
    fn descriptor() -> Descriptor {
        builtin::bool()
    }

    fn into_value(self) -> Value {
        Value::bool(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl Reflect for f32 {
    fn descriptor() -> Descriptor {
        builtin::float32()
    }

    fn into_value(self) -> Value {
        Value::float32(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_float().map(|v| v as f32)
    }
}

impl Reflect for f64 {
    fn descriptor() -> Descriptor {
        builtin::float64()
    }

    fn into_value(self) -> Value {
        Value::float64(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_float()
    }
}

impl Reflect for Complex128 {
    fn descriptor() -> Descriptor {
        builtin::complex128()
    }

    fn into_value(self) -> Value {
        Value::complex128(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_complex()
    }
}

impl Reflect for String {
    fn descriptor() -> Descriptor {
        builtin::string()
    }

    fn into_value(self) -> Value {
        Value::string(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl Reflect for Value {
    fn descriptor() -> Descriptor {
        builtin::any()
    }

    fn into_value(self) -> Value {
        Value::boxed(&builtin::any(), self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.unboxed())
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn descriptor() -> Descriptor {
        Descriptor::slice_of(&T::descriptor())
    }

    fn into_value(self) -> Value {
        let elem = T::descriptor();
        let items: Vec<Value> = self.into_iter().map(T::into_value).collect();
        let cap = items.len();
        Value::from_parts(
            Descriptor::slice_of(&elem),
            Data::Slice(Some(SliceHeader::with_items(items, cap, &elem))),
        )
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.elements()?.iter().map(T::from_value).collect()
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn descriptor() -> Descriptor {
        Descriptor::array_of(N, &T::descriptor())
    }

    fn into_value(self) -> Value {
        let cells = self
            .into_iter()
            .map(|item| crate::slot::new_slot(item.into_value()))
            .collect();
        Value::from_parts(Self::descriptor(), Data::Array(cells))
    }

    fn from_value(value: &Value) -> Option<Self> {
        let items: Vec<T> = value
            .elements()?
            .iter()
            .map(T::from_value)
            .collect::<Option<_>>()?;
        items.try_into().ok()
    }
}

impl<K, V> Reflect for HashMap<K, V>
where
    K: Reflect + Eq + Hash,
    V: Reflect,
{
    fn descriptor() -> Descriptor {
        Descriptor::map_of(&K::descriptor(), &V::descriptor())
    }

    fn into_value(self) -> Value {
        let map = MapObject::new();
        for (k, v) in self {
            map.insert(MapKey(k.into_value()), v.into_value());
        }
        Value::from_parts(Self::descriptor(), Data::Map(Some(map)))
    }

    fn from_value(value: &Value) -> Option<Self> {
        value
            .entries()?
            .iter()
            .map(|(k, v)| Some((K::from_value(k)?, V::from_value(v)?)))
            .collect()
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::float32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::float64(v)
    }
}

impl From<Complex128> for Value {
    fn from(v: Complex128) -> Self {
        Value::complex128(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::string(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::string(v)
    }
}
