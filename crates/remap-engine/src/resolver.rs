//! Directive resolution.
//!
//! Turns the renames, function directives, and pre-resolved overrides of
//! a mapping call into a table of target locations and final values.
//! Renames resolve first, function directives override them, and
//! overrides handed down from a parent call override both. A `Value::Null`
//! entry means "explicitly set this location to null".

use std::collections::BTreeMap;

use tracing::debug;

use remap_model::{Fallback, FieldPath, TypeRef, Value, is_excluded};

use crate::directive::MapFunction;
use crate::engine::{Mapper, Scope};
use crate::error::{MapError, Result};
use crate::source::{NodeId, SourceTree};

enum Directive<'a> {
    Rename,
    Function(&'a MapFunction),
    /// A value already resolved by a parent call, behaving like a
    /// sourceless constant function.
    Constant(&'a Value),
}

/// Resolves every directive in scope against the source tree and the
/// target type. Directives whose target is excluded or does not exist on
/// the target type are dropped.
pub(crate) fn resolve_directives(
    mapper: &Mapper<'_>,
    tree: &mut SourceTree,
    node: NodeId,
    target: TypeRef,
    scope: &Scope<'_>,
) -> Result<BTreeMap<String, Value>> {
    let mut table = BTreeMap::new();
    for rename in scope.renames {
        if let Some(value) = resolve_one(
            mapper,
            tree,
            node,
            target,
            Some(&rename.source),
            Directive::Rename,
            &rename.target,
            rename.fallback,
            &scope.exclusions,
        )? {
            table.insert(rename.target.clone(), value);
        }
    }
    for directive in scope.functions {
        if let Some(value) = resolve_one(
            mapper,
            tree,
            node,
            target,
            directive.source.as_deref(),
            Directive::Function(&directive.function),
            &directive.target,
            directive.fallback,
            &scope.exclusions,
        )? {
            table.insert(directive.target.clone(), value);
        }
    }
    for (location, value) in &scope.overrides {
        if let Some(value) = resolve_one(
            mapper,
            tree,
            node,
            target,
            None,
            Directive::Constant(value),
            location,
            Fallback::Null,
            &scope.exclusions,
        )? {
            table.insert(location.clone(), value);
        }
    }
    Ok(table)
}

#[allow(clippy::too_many_arguments)]
fn resolve_one(
    mapper: &Mapper<'_>,
    tree: &mut SourceTree,
    node: NodeId,
    target: TypeRef,
    source: Option<&str>,
    directive: Directive<'_>,
    target_location: &str,
    fallback: Fallback,
    exclusions: &[FieldPath],
) -> Result<Option<Value>> {
    let registry = mapper.registry();
    let target_path = FieldPath::parse(target_location);
    if is_excluded(&target_path, exclusions) {
        return Ok(None);
    }
    let Some(field) = registry.resolve_field(target, &target_path) else {
        debug!(target_location, "directive target not found, dropping");
        return Ok(None);
    };
    let field_ty = field.ty;

    let source_node =
        source.and_then(|location| tree.resolve(registry, node, &FieldPath::parse(location)));

    match directive {
        Directive::Function(function) => evaluate_function(
            mapper,
            tree,
            function,
            source_node,
            field_ty,
            target_location,
            fallback,
        ),
        Directive::Constant(value) => finish_return(mapper, tree, value.clone(), field_ty),
        Directive::Rename => {
            let null_fallback = || (field_ty.nullable && fallback.is_null()).then_some(Value::Null);
            let Some(source_node) = source_node else {
                return Ok(null_fallback());
            };
            if tree.value(source_node).is_null() {
                return Ok(null_fallback());
            }
            tree.strip_nullability(source_node);
            if registry.is_assignable(field_ty, tree.ty(source_node)) {
                return Ok(Some(tree.value(source_node).clone()));
            }
            let mapped = mapper.map_node(tree, source_node, field_ty, None, &Scope::empty())?;
            if mapped.is_null() {
                Ok(null_fallback())
            } else {
                Ok(Some(mapped))
            }
        }
    }
}

/// Evaluates a transform against its (possibly absent) source value per
/// the arity and nullability rules. An invocation error surfaces only
/// under an or-throw fallback; everything else degrades to the exit
/// value, which is an explicit null when the fallback allows it and the
/// target is nullable, or a dropped directive otherwise.
fn evaluate_function(
    mapper: &Mapper<'_>,
    tree: &mut SourceTree,
    function: &MapFunction,
    source_node: Option<NodeId>,
    field_ty: TypeRef,
    target_location: &str,
    fallback: Fallback,
) -> Result<Option<Value>> {
    let registry = mapper.registry();
    let exit = (field_ty.nullable && fallback.is_null()).then_some(Value::Null);

    // Coerce the source value into the declared parameter type.
    let input: Option<Value> = match source_node {
        Some(node) if !tree.value(node).is_null() => {
            tree.strip_nullability(node);
            match &function.param {
                Some(param) if !registry.is_assignable(param.ty, tree.ty(node)) => {
                    let mapped = mapper.map_node(tree, node, param.ty, None, &Scope::empty())?;
                    (!mapped.is_null()).then_some(mapped)
                }
                _ => Some(tree.value(node).clone()),
            }
        }
        _ => None,
    };

    let outcome = match (&function.param, &input) {
        (None, _) => function.invoke(None),
        (Some(_), Some(value)) => function.invoke(Some(value)),
        (Some(param), None) => {
            if let Some(default) = &param.default {
                function.invoke(Some(default))
            } else if param.ty.nullable {
                function.invoke(Some(&Value::Null))
            } else {
                return Ok(exit);
            }
        }
    };
    let value = match outcome {
        Ok(value) => value,
        Err(error) if fallback.is_throw() => {
            return Err(MapError::Function {
                target: target_location.to_string(),
                source: error,
            });
        }
        Err(error) => {
            debug!(target_location, %error, "transform failed, using fallback");
            return Ok(exit);
        }
    };

    finish_return(mapper, tree, value, field_ty)
}

/// Checks a transform's return value against the target field, mapping it
/// recursively when the runtime type does not already conform.
fn finish_return(
    mapper: &Mapper<'_>,
    tree: &mut SourceTree,
    value: Value,
    field_ty: TypeRef,
) -> Result<Option<Value>> {
    let registry = mapper.registry();
    if value.is_null() {
        return Ok(field_ty.nullable.then_some(Value::Null));
    }
    if registry.value_conforms(field_ty, &value) {
        return Ok(Some(value));
    }
    let Some(runtime) = registry.runtime_type(&value) else {
        // A composite return's element types are erased, so it cannot be
        // remapped.
        return Ok(field_ty.nullable.then_some(Value::Null));
    };
    let spawned = tree.spawn(value, runtime);
    let mapped = mapper.map_node(tree, spawned, field_ty, None, &Scope::empty())?;
    if mapped.is_null() {
        Ok(field_ty.nullable.then_some(Value::Null))
    } else {
        Ok(Some(mapped))
    }
}
