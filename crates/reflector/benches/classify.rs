use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use reflector::{type_of_descriptor, type_of_value, Tags};
use reflector_core::{builtin, native, Descriptor, Signature, StructField, Value};

fn record() -> Descriptor {
    let ty = Descriptor::named("github.com/example/bench", "Record");
    let fields = (0..16)
        .map(|i| {
            StructField::new(format!("Field{i}"), builtin::int())
                .with_tag(format!(r#"json:"field{i}" db:"f{i}""#))
        })
        .collect();
    ty.define(&Descriptor::struct_of(fields)).unwrap();
    ty
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");

    let scalar = builtin::int64();
    group.bench_with_input(BenchmarkId::new("descriptor", "int64"), &scalar, |b, ty| {
        b.iter(|| type_of_descriptor(black_box(ty)))
    });

    let nested = Descriptor::map_of(
        &builtin::string(),
        &Descriptor::slice_of(&Descriptor::pointer_to(&record())),
    );
    group.bench_with_input(
        BenchmarkId::new("descriptor", "map[string][]*Record"),
        &nested,
        |b, ty| b.iter(|| type_of_descriptor(black_box(ty))),
    );

    group.finish();
}

fn bench_fields(c: &mut Criterion) {
    let values = (0..16).map(Value::int).collect();
    let value = Value::pointer_to(Value::structure(&record(), values).unwrap());

    c.bench_function("read_all_fields", |b| {
        b.iter(|| {
            let ty = type_of_value(black_box(value.clone())).unwrap();
            let elem = ty.as_pointer().unwrap().elem().unwrap();
            elem.as_struct()
                .unwrap()
                .fields()
                .iter()
                .map(|field| field.value().unwrap())
                .count()
        })
    });

    c.bench_function("parse_tags", |b| {
        b.iter(|| Tags::parse(black_box(r#"json:"name,omitempty" xml:"name" db:"name_col""#)))
    });
}

fn bench_invoke(c: &mut Criterion) {
    let sum = Value::function(
        Signature::variadic(vec![Descriptor::slice_of(&builtin::int())], vec![builtin::int()]),
        native(|args| {
            let total = args[0]
                .elements()
                .unwrap_or_default()
                .iter()
                .filter_map(Value::as_int)
                .sum();
            vec![Value::int(total)]
        }),
    );
    let ty = type_of_value(sum).unwrap();
    let func = ty.as_function().unwrap();

    c.bench_function("invoke_variadic", |b| {
        b.iter(|| {
            let args = (0..8).map(Value::int).collect();
            func.invoke(black_box(args)).unwrap()
        })
    });
}

criterion_group!(benches, bench_classify, bench_fields, bench_invoke);
criterion_main!(benches);
