//! Shared fixtures for the integration tests

#![allow(dead_code)]

use reflector_core::{
    builtin, native, ChanDir, Descriptor, InterfaceMethod, MethodDecl, Signature, StructField,
    Value,
};

pub const PKG: &str = "github.com/example/fixtures";

/// `interface { Describe() string }`, embedded in [`test_struct`]
pub fn interface5() -> Descriptor {
    let ty = Descriptor::named(PKG, "Interface5");
    ty.define(&Descriptor::interface_of(vec![InterfaceMethod::new(
        "Describe",
        describe_sig(),
    )]))
    .unwrap();
    ty
}

pub fn embedded_struct() -> Descriptor {
    let ty = Descriptor::named(PKG, "EmbeddedStruct");
    ty.define(&Descriptor::struct_of(vec![StructField::new(
        "Label",
        builtin::string(),
    )]))
    .unwrap();
    ty
}

pub fn int_chan() -> Descriptor {
    Descriptor::chan_of(ChanDir::Both, &builtin::int())
}

/// Eight fields: two embedded, `StringField` holds `"TestValue"`, and the
/// last two (a rune and a channel) are unexported
pub fn test_struct() -> Descriptor {
    let ty = Descriptor::named(PKG, "TestStruct");
    ty.define(&Descriptor::struct_of(vec![
        StructField::embedded(interface5()),
        StructField::embedded(embedded_struct()),
        StructField::new("StructField", topping()),
        StructField::new("StringField", builtin::string())
            .with_tag(r#"json:"Name" xml:"name""#),
        StructField::new("PointerField", Descriptor::pointer_to(&builtin::int())),
        StructField::new("SliceField", Descriptor::slice_of(&builtin::int())),
        StructField::new("runeField", builtin::int32()).in_package(PKG),
        StructField::new("chanField", int_chan()).in_package(PKG),
    ]))
    .unwrap();
    ty
}

pub fn test_struct_value() -> Value {
    Value::structure(
        &test_struct(),
        vec![
            Value::boxed(&interface5(), dessert_value("Flan", 200)),
            Value::structure(&embedded_struct(), vec![Value::string("inner")]).unwrap(),
            Value::structure(&topping(), vec![Value::string("sprinkles")]).unwrap(),
            Value::string("TestValue"),
            Value::pointer_to(Value::int(9)),
            Value::slice(
                &builtin::int(),
                vec![Value::int(1), Value::int(3), Value::int(5)],
            )
            .unwrap(),
            Value::from('r' as i32),
            Value::channel(&int_chan(), 1).unwrap(),
        ],
    )
    .unwrap()
}

fn describe_sig() -> Signature {
    Signature::new(vec![], vec![builtin::string()])
}

fn rename_sig() -> Signature {
    Signature::new(vec![builtin::string()], vec![])
}

/// `Dessert` with a value-receiver `Describe` and a pointer-receiver `Rename`
pub fn dessert() -> Descriptor {
    let ty = Descriptor::named(PKG, "Dessert");
    ty.define(&Descriptor::struct_of(vec![
        StructField::new("Name", builtin::string()),
        StructField::new("Calories", builtin::int()),
    ]))
    .unwrap();
    ty.define_methods(vec![
        MethodDecl::new(
            "Describe",
            describe_sig(),
            native(|args| {
                let name = args[0].field(0).unwrap();
                let calories = args[0].field(1).unwrap();
                vec![Value::string(format!(
                    "{} ({} kcal)",
                    name.as_str().unwrap(),
                    calories.as_int().unwrap()
                ))]
            }),
        ),
        MethodDecl::pointer(
            "Rename",
            rename_sig(),
            native(|args| {
                let cell = args[0].pointee().unwrap();
                if let reflector_core::Data::Struct(fields) = cell.read().data() {
                    *fields[0].write() = args[1].clone();
                }
                vec![]
            }),
        ),
    ])
    .unwrap();
    ty
}

pub fn dessert_value(name: &str, calories: i64) -> Value {
    Value::structure(&dessert(), vec![Value::string(name), Value::int(calories)]).unwrap()
}

/// `interface { Describe() string }`
pub fn describer() -> Descriptor {
    let ty = Descriptor::named(PKG, "Describer");
    ty.define(&Descriptor::interface_of(vec![InterfaceMethod::new(
        "Describe",
        describe_sig(),
    )]))
    .unwrap();
    ty
}

/// `interface { Describe() string; Rename(string) }`
pub fn menu_item() -> Descriptor {
    let ty = Descriptor::named(PKG, "MenuItem");
    ty.define(&Descriptor::interface_of(vec![
        InterfaceMethod::new("Describe", describe_sig()),
        InterfaceMethod::new("Rename", rename_sig()),
    ]))
    .unwrap();
    ty
}

/// `Topping` with no methods
pub fn topping() -> Descriptor {
    let ty = Descriptor::named(PKG, "Topping");
    ty.define(&Descriptor::struct_of(vec![StructField::new(
        "Kind",
        builtin::string(),
    )]))
    .unwrap();
    ty
}

/// `Sundae` embeds `Dessert` by value and `*Topping` by pointer
pub fn sundae() -> Descriptor {
    let ty = Descriptor::named(PKG, "Sundae");
    ty.define(&Descriptor::struct_of(vec![
        StructField::embedded(dessert()),
        StructField::embedded(Descriptor::pointer_to(&topping())),
        StructField::new("Scoops", builtin::int()),
    ]))
    .unwrap();
    ty
}

/// `Banquet` embeds `Sundae`, reaching `Dessert` two levels down
pub fn banquet() -> Descriptor {
    let ty = Descriptor::named(PKG, "Banquet");
    ty.define(&Descriptor::struct_of(vec![
        StructField::embedded(sundae()),
        StructField::new("Guests", builtin::int()),
    ]))
    .unwrap();
    ty
}

/// `func(string, []int, ...any) (int, error)`
pub fn function1_sig() -> Signature {
    Signature::variadic(
        vec![
            builtin::string(),
            Descriptor::slice_of(&builtin::int()),
            Descriptor::slice_of(&builtin::any()),
        ],
        vec![builtin::int(), builtin::error()],
    )
}

/// Returns `(25, errors.New("Function1"))`
pub fn function1() -> Value {
    Value::named_function(
        PKG,
        "Function1",
        function1_sig(),
        native(|_| vec![Value::int(25), Value::error("Function1")]),
    )
}
