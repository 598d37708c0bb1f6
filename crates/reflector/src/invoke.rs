//! Argument binding for dynamic calls
//!
//! An argument binds to a parameter when its type is assignable to the
//! parameter type. The untyped nil binds as the parameter's zero value.
//! Trailing arguments of a variadic call are bound against the element type
//! of the last parameter and packed into one slice.

use reflector_core::{Descriptor, Kind, Signature, Value};

use crate::classify::classify;
use crate::error::{ReflectError, Result};
use crate::ty::Type;

/// Check the argument count and convert every argument to its parameter type
pub(crate) fn bind_arguments(sig: &Signature, args: Vec<Value>) -> Result<Vec<Value>> {
    let expected = sig.params.len();
    let actual = args.len();
    let variadic = sig.variadic.then(|| sig.params.split_last()).flatten();

    let Some((tail_ty, fixed)) = variadic else {
        if actual != expected {
            return Err(ReflectError::InvalidParameterCount { expected, actual });
        }
        return args
            .into_iter()
            .zip(&sig.params)
            .enumerate()
            .map(|(index, (arg, param))| bind(arg, param, index))
            .collect();
    };

    if actual < expected {
        return Err(ReflectError::InvalidParameterCount { expected, actual });
    }
    let elem = tail_ty.elem().ok_or_else(|| ReflectError::InvalidType {
        expected: "slice".to_string(),
        actual: tail_ty.name(),
    })?;

    let mut args = args.into_iter();
    let mut bound = Vec::with_capacity(expected);
    for (index, (param, arg)) in fixed.iter().zip(args.by_ref()).enumerate() {
        bound.push(bind(arg, param, index)?);
    }
    let tail = args
        .enumerate()
        .map(|(offset, arg)| bind(arg, &elem, fixed.len() + offset))
        .collect::<Result<Vec<_>>>()?;
    bound.push(Value::slice_of_type(tail_ty, tail)?);
    Ok(bound)
}

fn bind(arg: Value, param: &Descriptor, index: usize) -> Result<Value> {
    if arg.kind() == Kind::UntypedNil {
        return Ok(Value::zero(param));
    }
    if !arg.ty().assignable_to(param) {
        return Err(ReflectError::ArgumentMismatch {
            expected: param.name(),
            actual: arg.ty().name(),
            index,
        });
    }
    Ok(arg.assign_to(param)?)
}

/// Type-only classification of a parameter or result list
pub(crate) fn classify_all(types: &[Descriptor]) -> Vec<Option<Type>> {
    types.iter().map(|ty| classify(ty, None, None)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflector_core::builtin;

    fn variadic() -> Signature {
        Signature::variadic(
            vec![
                builtin::string(),
                Descriptor::slice_of(&builtin::int()),
                Descriptor::slice_of(&builtin::any()),
            ],
            vec![builtin::int(), builtin::error()],
        )
    }

    fn ints(values: &[i64]) -> Value {
        Value::slice(&builtin::int(), values.iter().copied().map(Value::int).collect()).unwrap()
    }

    #[test]
    fn test_fixed_arity() {
        let sig = Signature::new(vec![builtin::int(), builtin::any()], vec![]);
        let bound = bind_arguments(&sig, vec![Value::int(1), Value::string("x")]).unwrap();
        assert_eq!(bound[0], Value::int(1));
        assert_eq!(bound[1].ty(), &builtin::any());
        assert_eq!(
            bind_arguments(&sig, vec![Value::int(1)]),
            Err(ReflectError::InvalidParameterCount {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_variadic_tail_is_packed() {
        let args = vec![
            Value::string("a"),
            ints(&[1, 2]),
            Value::string("b"),
            Value::int(3),
        ];
        let bound = bind_arguments(&variadic(), args).unwrap();
        assert_eq!(bound.len(), 3);
        let tail = bound[2].elements().unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].unboxed(), Value::string("b"));
        assert_eq!(tail[1].unboxed(), Value::int(3));
    }

    #[test]
    fn test_variadic_minimum_arity() {
        assert_eq!(
            bind_arguments(&variadic(), vec![Value::string("a")]),
            Err(ReflectError::InvalidParameterCount {
                expected: 3,
                actual: 1
            })
        );
    }

    #[test]
    fn test_mismatch_reports_position() {
        let args = vec![Value::int(1), ints(&[]), Value::nil()];
        assert_eq!(
            bind_arguments(&variadic(), args),
            Err(ReflectError::ArgumentMismatch {
                expected: "string".into(),
                actual: "int".into(),
                index: 0
            })
        );

        let sig = Signature::variadic(
            vec![Descriptor::slice_of(&builtin::string())],
            vec![],
        );
        assert!(matches!(
            bind_arguments(&sig, vec![Value::string("a"), Value::int(2)]),
            Err(ReflectError::ArgumentMismatch { index: 1, .. })
        ));
    }

    #[test]
    fn test_nil_binds_zero_value() {
        let args = vec![Value::nil(), Value::nil(), Value::nil()];
        let bound = bind_arguments(&variadic(), args).unwrap();
        assert_eq!(bound[0], Value::string(""));
        assert!(bound[1].is_nil());
        assert!(bound[2].elements().unwrap()[0].is_nil());
    }

    #[test]
    fn test_distinct_numeric_types_rejected() {
        let sig = Signature::new(vec![builtin::int64()], vec![]);
        assert!(matches!(
            bind_arguments(&sig, vec![Value::int(1)]),
            Err(ReflectError::ArgumentMismatch { .. })
        ));
    }
}
