//! Registry, assignability, and conformance tests.

use remap_model::{
    ConstructorSchema, FieldSchema, Number, ObjectSchema, ObjectValue, ParamSchema,
    SchemaRegistry, TypeId, TypeKind, Value,
};

fn person_registry() -> (SchemaRegistry, TypeId) {
    let mut registry = SchemaRegistry::new();
    let person = registry
        .register_object(
            "Person",
            ObjectSchema::new()
                .with_field(FieldSchema::new("name", TypeId::TEXT.non_null()))
                .with_field(FieldSchema::new("age", TypeId::I32.nullable()))
                .with_constructor(ConstructorSchema::new([
                    ParamSchema::new("name", TypeId::TEXT.non_null()),
                    ParamSchema::new("age", TypeId::I32.nullable()),
                ])),
        )
        .expect("register Person");
    (registry, person)
}

#[test]
fn duplicate_registration_is_rejected() {
    let (mut registry, _) = person_registry();
    let err = registry.register_object("Person", ObjectSchema::new());
    assert!(err.is_err());
}

#[test]
fn lookup_finds_registered_types() {
    let (registry, person) = person_registry();
    assert_eq!(registry.lookup("Person").unwrap(), person);
    assert!(registry.lookup("Missing").is_err());
}

#[test]
fn assignability_widens_nullability_only_one_way() {
    let (registry, person) = person_registry();
    assert!(registry.is_assignable(person.nullable(), person.non_null()));
    assert!(!registry.is_assignable(person.non_null(), person.nullable()));
    assert!(!registry.is_assignable(person.non_null(), TypeId::TEXT.non_null()));
}

#[test]
fn assignability_recurses_through_composites() {
    let (mut registry, person) = person_registry();
    let seq_non_null = registry.seq_of(person.non_null());
    let seq_nullable = registry.seq_of(person.nullable());
    assert!(registry.is_assignable(seq_nullable.non_null(), seq_non_null.non_null()));
    assert!(!registry.is_assignable(seq_non_null.non_null(), seq_nullable.non_null()));
}

#[test]
fn composite_interning_reuses_ids() {
    let (mut registry, person) = person_registry();
    let a = registry.seq_of(person.non_null());
    let b = registry.seq_of(person.non_null());
    assert_eq!(a, b);
}

#[test]
fn value_conformance_is_shallow() {
    let (mut registry, person) = person_registry();
    let seq = registry.seq_of(TypeId::I32.non_null());
    // Element types are erased at conformance time.
    assert!(registry.value_conforms(seq.non_null(), &Value::Seq(vec![Value::text("a")])));
    assert!(registry.value_conforms(
        person.non_null(),
        &Value::Object(ObjectValue::new(person)),
    ));
    assert!(!registry.value_conforms(person.non_null(), &Value::text("a")));
    assert!(registry.value_conforms(person.nullable(), &Value::Null));
    assert!(!registry.value_conforms(person.non_null(), &Value::Null));
}

#[test]
fn runtime_type_is_exact_for_primitives_and_objects() {
    let (registry, person) = person_registry();
    assert_eq!(
        registry.runtime_type(&Value::Number(Number::I32(1))),
        Some(TypeId::I32.non_null())
    );
    assert_eq!(
        registry.runtime_type(&Value::Object(ObjectValue::new(person))),
        Some(person.non_null())
    );
    assert_eq!(registry.runtime_type(&Value::Null), None);
    assert_eq!(registry.runtime_type(&Value::Seq(vec![])), None);
}

#[test]
fn resolve_field_walks_nested_objects() {
    let mut registry = SchemaRegistry::new();
    let house = registry
        .register_object(
            "House",
            ObjectSchema::new().with_field(FieldSchema::new("number", TypeId::I32.nullable())),
        )
        .unwrap();
    let owner = registry
        .register_object(
            "Owner",
            ObjectSchema::new().with_field(FieldSchema::new("house", house.nullable())),
        )
        .unwrap();

    let field = registry
        .resolve_field(
            owner.non_null(),
            &remap_model::FieldPath::parse("house/number"),
        )
        .expect("resolve house/number");
    assert_eq!(field.name, "number");
    assert_eq!(field.ty, TypeId::I32.nullable());
    assert!(
        registry
            .resolve_field(owner.non_null(), &remap_model::FieldPath::parse("garden"))
            .is_none()
    );
}

#[test]
fn registry_serializes_round_trip() {
    let (registry, person) = person_registry();
    let json = serde_json::to_string(&registry).expect("serialize registry");
    let round: SchemaRegistry = serde_json::from_str(&json).expect("deserialize registry");
    assert_eq!(round.lookup("Person").unwrap(), person);
    assert!(matches!(round.kind(person), TypeKind::Object(_)));
}
