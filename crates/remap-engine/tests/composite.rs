//! Composite mapping: sequences, sets, maps, pairs, triples, and
//! category mismatches.

use remap_engine::{MapOptions, Mapper, Rename};
use remap_model::{
    ConstructorSchema, Fallback, FieldSchema, ObjectSchema, ObjectValue, ParamSchema,
    SchemaRegistry, TypeId, Value,
};

fn registry() -> (SchemaRegistry, TypeId, TypeId) {
    let mut registry = SchemaRegistry::new();
    let person = registry
        .register_object(
            "Person",
            ObjectSchema::new()
                .with_field(FieldSchema::new("name", TypeId::TEXT.nullable()))
                .with_constructor(ConstructorSchema::new([ParamSchema::new(
                    "name",
                    TypeId::TEXT.nullable(),
                )])),
        )
        .unwrap();
    let dto = registry
        .register_object(
            "PersonDto",
            ObjectSchema::new()
                .with_field(FieldSchema::new("name_str", TypeId::TEXT.nullable()))
                .with_constructor(ConstructorSchema::new([ParamSchema::new(
                    "name_str",
                    TypeId::TEXT.nullable(),
                )])),
        )
        .unwrap();
    (registry, person, dto)
}

fn person(person: TypeId, name: &str) -> Value {
    Value::Object(ObjectValue::new(person).with("name", Value::text(name)))
}

#[test]
fn lists_map_element_wise_with_directives() {
    let (mut registry, person_ty, dto_ty) = registry();
    let source_list = registry.seq_of(person_ty.non_null());
    let target_list = registry.seq_of(dto_ty.non_null());
    let mapper = Mapper::new(&registry);

    let source = Value::Seq(vec![
        person(person_ty, "first"),
        person(person_ty, "second"),
    ]);
    let options = MapOptions::new().with_rename(Rename::new("name", "name_str", Fallback::Null));
    let mapped = mapper
        .map(&source, source_list.non_null(), target_list.non_null(), &options)
        .unwrap();

    let Value::Seq(items) = mapped else {
        panic!("expected a sequence, got {mapped:?}");
    };
    assert_eq!(items.len(), 2);
    assert_eq!(
        items[0].as_object().unwrap().field("name_str"),
        &Value::text("first")
    );
    assert_eq!(
        items[1].as_object().unwrap().field("name_str"),
        &Value::text("second")
    );
}

#[test]
fn mismatched_composite_categories_map_to_null() {
    let (mut registry, person_ty, dto_ty) = registry();
    let triple = registry.triple_of(
        TypeId::TEXT.non_null(),
        TypeId::I32.non_null(),
        person_ty.non_null(),
    );
    let target_list = registry.seq_of(dto_ty.non_null());
    let mapper = Mapper::new(&registry);

    let source = Value::triple(Value::text("0"), Value::i32(5), person(person_ty, "p"));
    let mapped = mapper
        .map(
            &source,
            triple.non_null(),
            target_list.non_null(),
            &MapOptions::new(),
        )
        .unwrap();
    assert!(mapped.is_null());
}

#[test]
fn null_and_unmappable_elements_are_dropped_from_sequences() {
    let (mut registry, person_ty, dto_ty) = registry();
    let source_list = registry.seq_of(person_ty.nullable());
    let target_list = registry.seq_of(dto_ty.non_null());
    let mapper = Mapper::new(&registry);

    let source = Value::Seq(vec![person(person_ty, "kept"), Value::Null]);
    let mapped = mapper
        .map(
            &source,
            source_list.non_null(),
            target_list.non_null(),
            &MapOptions::new(),
        )
        .unwrap();
    let Value::Seq(items) = mapped else {
        panic!("expected a sequence, got {mapped:?}");
    };
    assert_eq!(items.len(), 1);
}

#[test]
fn set_targets_deduplicate_preserving_order() {
    let mut registry = SchemaRegistry::new();
    let source_list = registry.seq_of(TypeId::TEXT.non_null());
    let target_set = registry.set_of(TypeId::TEXT.non_null());
    let mapper = Mapper::new(&registry);

    let source = Value::Seq(vec![
        Value::text("b"),
        Value::text("a"),
        Value::text("b"),
    ]);
    let mapped = mapper
        .map(
            &source,
            source_list.non_null(),
            target_set.non_null(),
            &MapOptions::new(),
        )
        .unwrap();
    assert_eq!(
        mapped,
        Value::Set(vec![Value::text("b"), Value::text("a")])
    );
}

#[test]
fn map_keys_and_values_map_independently() {
    let mut registry = SchemaRegistry::new();
    let source_map = registry.map_of(TypeId::TEXT.non_null(), TypeId::I32.non_null());
    let target_map = registry.map_of(TypeId::TEXT.non_null(), TypeId::TEXT.non_null());
    let mapper = Mapper::new(&registry);

    let source = Value::Map(vec![(Value::text("age"), Value::i32(5))]);
    let mapped = mapper
        .map(
            &source,
            source_map.non_null(),
            target_map.non_null(),
            &MapOptions::new(),
        )
        .unwrap();
    assert_eq!(
        mapped,
        Value::Map(vec![(Value::text("age"), Value::text("5"))])
    );
}

#[test]
fn pairs_map_positionally() {
    let mut registry = SchemaRegistry::new();
    let source_pair = registry.pair_of(TypeId::I32.non_null(), TypeId::TEXT.non_null());
    let target_pair = registry.pair_of(TypeId::TEXT.non_null(), TypeId::TEXT.non_null());
    let mapper = Mapper::new(&registry);

    let source = Value::pair(Value::i32(1), Value::text("x"));
    let mapped = mapper
        .map(
            &source,
            source_pair.non_null(),
            target_pair.non_null(),
            &MapOptions::new(),
        )
        .unwrap();
    assert_eq!(mapped, Value::pair(Value::text("1"), Value::text("x")));
}

#[test]
fn triples_map_positionally() {
    let mut registry = SchemaRegistry::new();
    let source_triple = registry.triple_of(
        TypeId::I32.non_null(),
        TypeId::I32.non_null(),
        TypeId::TEXT.non_null(),
    );
    let target_triple = registry.triple_of(
        TypeId::TEXT.non_null(),
        TypeId::I64.non_null(),
        TypeId::TEXT.non_null(),
    );
    let mapper = Mapper::new(&registry);

    let source = Value::triple(Value::i32(1), Value::i32(2), Value::text("z"));
    let mapped = mapper
        .map(
            &source,
            source_triple.non_null(),
            target_triple.non_null(),
            &MapOptions::new(),
        )
        .unwrap();
    assert_eq!(
        mapped,
        Value::triple(Value::text("1"), Value::i64(2), Value::text("z"))
    );
}
