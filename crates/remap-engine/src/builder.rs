//! Target construction.
//!
//! Builds a new value by scoring and selecting the best-matching declared
//! constructor, then completes leftover fields through setters; or applies
//! every resolved field to an existing base value in place. No mapping
//! happens here: values must already be of the right shape or they are
//! skipped.

use std::collections::BTreeMap;

use tracing::debug;

use remap_model::{ObjectValue, SchemaRegistry, TypeRef, UpdateOption, Value};

struct Candidate<'s> {
    constructor: &'s remap_model::ConstructorSchema,
    /// Constructor arguments by parameter name, explicit nulls included.
    args: BTreeMap<String, Value>,
    /// Properties consumed by the constructor.
    used: Vec<String>,
    /// Parameters bound to a resolved property.
    matched: usize,
    /// Optional/nullable parameters carried without a matching property.
    unneeded: usize,
}

fn bind<'s>(
    registry: &SchemaRegistry,
    constructor: &'s remap_model::ConstructorSchema,
    props: &BTreeMap<String, Value>,
) -> Option<Candidate<'s>> {
    let mut candidate = Candidate {
        constructor,
        args: BTreeMap::new(),
        used: Vec::new(),
        matched: 0,
        unneeded: 0,
    };
    for param in &constructor.params {
        match props.get(&param.name) {
            None => {
                if param.is_optional() {
                    // Left unbound so the default applies.
                    candidate.unneeded += 1;
                } else if param.ty.nullable {
                    candidate.args.insert(param.name.clone(), Value::Null);
                    candidate.unneeded += 1;
                } else {
                    return None;
                }
            }
            Some(Value::Null) => {
                // The caller is explicitly setting this parameter to null.
                if param.ty.nullable {
                    candidate.args.insert(param.name.clone(), Value::Null);
                    candidate.used.push(param.name.clone());
                    candidate.matched += 1;
                } else if param.is_optional() {
                    candidate.unneeded += 1;
                } else {
                    return None;
                }
            }
            Some(value) => {
                if registry.value_conforms(param.ty, value) {
                    candidate.args.insert(param.name.clone(), value.clone());
                    candidate.used.push(param.name.clone());
                    candidate.matched += 1;
                } else if param.is_optional() {
                    candidate.unneeded += 1;
                } else if param.ty.nullable {
                    candidate.args.insert(param.name.clone(), Value::Null);
                    candidate.unneeded += 1;
                } else {
                    return None;
                }
            }
        }
    }
    Some(candidate)
}

fn construct(ty: TypeRef, candidate: &Candidate<'_>) -> Value {
    let mut object = ObjectValue::new(ty.id);
    for param in &candidate.constructor.params {
        if let Some(value) = candidate.args.get(&param.name) {
            object.set(param.name.clone(), value.clone());
        } else if let Some(default) = &param.default {
            object.set(param.name.clone(), default.clone());
        }
    }
    Value::Object(object)
}

/// Creates a value of `ty` setting as many properties as possible through
/// a constructor.
///
/// Scores every declared constructor by the number of properties it binds,
/// breaking ties toward fewer unneeded optional/nullable parameters. When
/// no constructor qualifies, a zero-argument constructor is attempted;
/// when that also fails, the result is `None`.
///
/// Returns the built value and the property names that could not be set
/// through the chosen constructor.
#[must_use]
pub fn build_with_constructor(
    registry: &SchemaRegistry,
    ty: TypeRef,
    props: &BTreeMap<String, Value>,
) -> (Option<Value>, Vec<String>) {
    let Some(schema) = registry.object(ty.id) else {
        return (None, props.keys().cloned().collect());
    };

    let mut best: Option<Candidate<'_>> = None;
    for constructor in &schema.constructors {
        let Some(candidate) = bind(registry, constructor, props) else {
            continue;
        };
        let better = match &best {
            None => true,
            Some(saved) => {
                candidate.matched > saved.matched
                    || (candidate.matched == saved.matched && candidate.unneeded <= saved.unneeded)
            }
        };
        if better {
            best = Some(candidate);
        }
    }

    let Some(candidate) = best.or_else(|| {
        // Fall back to a bare zero-argument constructor.
        schema
            .constructors
            .iter()
            .find(|constructor| constructor.params.is_empty())
            .and_then(|constructor| bind(registry, constructor, &BTreeMap::new()))
    }) else {
        debug!(target_type = registry.name(ty.id), "no usable constructor");
        return (None, props.keys().cloned().collect());
    };

    let leftover = props
        .keys()
        .filter(|name| !candidate.used.contains(*name))
        .cloned()
        .collect();
    (Some(construct(ty, &candidate)), leftover)
}

fn apply_setters<'p>(
    registry: &SchemaRegistry,
    ty: TypeRef,
    value: &mut Value,
    props: impl Iterator<Item = (&'p String, &'p Value)>,
    update: Option<UpdateOption>,
) {
    let Some(schema) = registry.object(ty.id) else {
        return;
    };
    for (name, desired) in props {
        let Some(field) = schema.field(name) else {
            continue;
        };
        let Some(object) = value.as_object_mut() else {
            return;
        };
        if object.field(name) == desired {
            continue;
        }
        if !field.mutable {
            continue;
        }
        if desired.is_null() {
            if update == Some(UpdateOption::IgnoreNulls) {
                continue;
            }
            if !field.ty.nullable {
                continue;
            }
            object.set(name.clone(), Value::Null);
        } else if registry.value_conforms(field.ty, desired) {
            object.set(name.clone(), desired.clone());
        }
    }
}

/// Builds a new value or updates an existing one, setting properties
/// through a constructor and then setters.
///
/// With a base value, construction is skipped and every property is
/// applied through its setter, honoring the update option: under
/// [`UpdateOption::IgnoreNulls`] a null property leaves the existing field
/// untouched. Without a base, leftover properties the chosen constructor
/// did not consume go through setters; `use_setters_only` forces all of
/// them down that path.
#[must_use]
pub fn build_or_update(
    registry: &SchemaRegistry,
    ty: TypeRef,
    props: &BTreeMap<String, Value>,
    use_setters_only: bool,
    base: Option<(Value, UpdateOption)>,
) -> Option<Value> {
    let (mut value, unset, update) = match base {
        Some((base_value, update)) => {
            let unset: Vec<String> = props.keys().cloned().collect();
            (base_value, unset, Some(update))
        }
        None if use_setters_only => {
            let (built, _) = build_with_constructor(registry, ty, &BTreeMap::new());
            (built?, props.keys().cloned().collect(), None)
        }
        None => {
            let (built, leftover) = build_with_constructor(registry, ty, props);
            (built?, leftover, None)
        }
    };

    apply_setters(
        registry,
        ty,
        &mut value,
        props.iter().filter(|(name, _)| unset.contains(*name)),
        update,
    );
    Some(value)
}

/// Builds a new value of `ty` from a base entity's fields overlaid with
/// extra properties. Always constructs a fresh value.
#[must_use]
pub fn build_with_base(
    registry: &SchemaRegistry,
    ty: TypeRef,
    props: &BTreeMap<String, Value>,
    base: &Value,
) -> Option<Value> {
    let mut merged: BTreeMap<String, Value> = BTreeMap::new();
    if let Some(schema) = registry.object(ty.id) {
        for field in &schema.fields {
            let current = base
                .as_object()
                .map(|object| object.field(&field.name).clone())
                .unwrap_or(Value::Null);
            merged.insert(field.name.clone(), current);
        }
    }
    for (name, value) in props {
        merged.insert(name.clone(), value.clone());
    }
    build_or_update(registry, ty, &merged, false, None)
}
