//! Primitive coercion.
//!
//! Bidirectional conversion between textual and numeric values, and
//! between numeric kinds of different width. The outcome distinguishes
//! "neither side is primitive" (the caller continues with composite or
//! field-by-field mapping) from "primitive but unconvertible" (a terminal
//! null).

use remap_model::{Number, SchemaRegistry, TypeKind, TypeRef, Value};

fn is_primitive(registry: &SchemaRegistry, ty: TypeRef) -> bool {
    matches!(registry.kind(ty.id), TypeKind::Text | TypeKind::Number(_))
}

/// Coerces `value` (declared as `source_ty`, nullability already stripped)
/// to `target`.
///
/// Returns `None` when neither side is primitive, so the caller can try
/// the remaining strategies; returns `Some(Value::Null)` when the sides
/// are primitive-incompatible or the conversion fails.
pub(crate) fn map_primitive(
    registry: &SchemaRegistry,
    target: TypeRef,
    source_ty: TypeRef,
    value: &Value,
    coerce: bool,
) -> Option<Value> {
    let target_primitive = is_primitive(registry, target);
    let source_primitive = is_primitive(registry, source_ty);
    if !target_primitive && !source_primitive {
        return None;
    }
    if target_primitive != source_primitive {
        // One primitive side only: nothing to walk into, nothing to cast.
        return Some(Value::Null);
    }

    if registry.is_assignable(target, source_ty) {
        return Some(value.clone());
    }
    if !coerce {
        return Some(Value::Null);
    }

    match (registry.kind(target.id), value) {
        (TypeKind::Number(kind), Value::Number(number)) => {
            Some(Value::Number(number.cast(*kind)))
        }
        (TypeKind::Number(kind), Value::Text(text)) => Some(
            Number::parse(text, *kind)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        ),
        (TypeKind::Text, Value::Number(number)) => Some(Value::Text(number.to_string())),
        _ => Some(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remap_model::{FieldSchema, NumberKind, ObjectSchema, TypeId};

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry
            .register_object(
                "Marker",
                ObjectSchema::new().with_field(FieldSchema::new("id", TypeId::I32.non_null())),
            )
            .unwrap();
        registry
    }

    #[test]
    fn non_primitive_sides_continue() {
        let registry = registry();
        let marker = registry.lookup("Marker").unwrap();
        assert_eq!(
            map_primitive(
                &registry,
                marker.non_null(),
                marker.non_null(),
                &Value::Null,
                true,
            ),
            None
        );
    }

    #[test]
    fn mixed_primitive_and_object_is_terminal_null() {
        let registry = registry();
        let marker = registry.lookup("Marker").unwrap();
        assert_eq!(
            map_primitive(
                &registry,
                TypeId::I32.non_null(),
                marker.non_null(),
                &Value::Null,
                true,
            ),
            Some(Value::Null)
        );
    }

    #[test]
    fn identical_types_pass_through() {
        let registry = registry();
        assert_eq!(
            map_primitive(
                &registry,
                TypeId::TEXT.non_null(),
                TypeId::TEXT.non_null(),
                &Value::text("as-is"),
                false,
            ),
            Some(Value::text("as-is"))
        );
    }

    #[test]
    fn numeric_widening_uses_native_cast() {
        let registry = registry();
        assert_eq!(
            map_primitive(
                &registry,
                TypeId::F64.non_null(),
                TypeId::I32.non_null(),
                &Value::i32(10),
                true,
            ),
            Some(Value::f64(10.0))
        );
    }

    #[test]
    fn disabled_coercion_is_terminal_null() {
        let registry = registry();
        assert_eq!(
            map_primitive(
                &registry,
                TypeId::F64.non_null(),
                TypeId::I32.non_null(),
                &Value::i32(10),
                false,
            ),
            Some(Value::Null)
        );
    }

    #[test]
    fn parse_failure_is_terminal_null() {
        let registry = registry();
        assert_eq!(
            map_primitive(
                &registry,
                TypeId::I32.non_null(),
                TypeId::TEXT.non_null(),
                &Value::text("not a number"),
                true,
            ),
            Some(Value::Null)
        );
        assert_eq!(
            map_primitive(
                &registry,
                TypeId::I16.non_null(),
                TypeId::TEXT.non_null(),
                &Value::text("31"),
                true,
            ),
            Some(Value::Number(Number::I16(31)))
        );
    }

    #[test]
    fn numbers_stringify_with_natural_decimals() {
        let registry = registry();
        assert_eq!(
            map_primitive(
                &registry,
                TypeId::TEXT.non_null(),
                TypeId::number(NumberKind::F64).non_null(),
                &Value::f64(1.5),
                true,
            ),
            Some(Value::text("1.5"))
        );
    }
}
