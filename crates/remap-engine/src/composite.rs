//! Composite mapping.
//!
//! Element-wise recursion through sequences, sets, maps, pairs, and
//! triples. Both sides must agree on the composite category; a category
//! mismatch is a terminal null, and two non-composite sides hand control
//! back to the rest of the pipeline.

use remap_model::{TypeKind, TypeRef, UpdateOption, Value};

use crate::engine::{Mapper, Scope};
use crate::error::Result;
use crate::source::{NodeId, SourceTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Iterable,
    Map,
    Pair,
    Triple,
}

fn category(kind: &TypeKind) -> Option<Category> {
    match kind {
        TypeKind::Seq(_) | TypeKind::Set(_) => Some(Category::Iterable),
        TypeKind::Map(_, _) => Some(Category::Map),
        TypeKind::Pair(_, _) => Some(Category::Pair),
        TypeKind::Triple(_, _, _) => Some(Category::Triple),
        _ => None,
    }
}

/// Maps one element of a composite.
///
/// Without a base the element itself recurses. With a base the iteration
/// runs over the base's elements, so the element at hand becomes the
/// threaded base and the whole original value recurses against it.
#[allow(clippy::too_many_arguments)]
fn map_element(
    mapper: &Mapper<'_>,
    tree: &mut SourceTree,
    node: NodeId,
    element: &Value,
    target: TypeRef,
    source_elem: Option<TypeRef>,
    update: Option<UpdateOption>,
    scope: &Scope<'_>,
) -> Result<Value> {
    if element.is_null() {
        return Ok(Value::Null);
    }
    let (spawned, base) = if let Some(update) = update {
        let value = tree.value(node).clone();
        let ty = tree.ty(node);
        (tree.spawn(value, ty), Some((element.clone(), update)))
    } else {
        let ty = mapper
            .registry()
            .runtime_type(element)
            .unwrap_or_else(|| source_elem.unwrap_or(target).strip_nullability());
        (tree.spawn(element.clone(), ty), None)
    };
    mapper.map_node(tree, spawned, target, base, scope)
}

/// Maps the node as a composite, if possible.
///
/// `Ok(None)` means neither side is a composite and the caller should
/// continue with the next strategy; `Ok(Some(Value::Null))` means the
/// categories do not line up and the mapping is over. With a base entity
/// the base value drives the iteration.
pub(crate) fn map_composite(
    mapper: &Mapper<'_>,
    tree: &mut SourceTree,
    node: NodeId,
    target: TypeRef,
    base: &Option<(Value, UpdateOption)>,
    scope: &Scope<'_>,
) -> Result<Option<Value>> {
    let registry = mapper.registry();
    let target_kind = registry.kind(target.id).clone();

    // With a base the base value is iterated and its declared type is the
    // target type itself.
    let (entity_value, entity_kind, update) = match base {
        Some((value, update)) => (value.clone(), target_kind.clone(), Some(*update)),
        None => (
            tree.value(node).clone(),
            registry.kind(tree.ty(node).id).clone(),
            None,
        ),
    };

    let target_category = category(&target_kind);
    let entity_category = category(&entity_kind);
    match (target_category, entity_category) {
        (None, None) => return Ok(None),
        (Some(t), Some(e)) if t == e => {}
        _ => return Ok(Some(Value::Null)),
    }

    match target_kind {
        TypeKind::Seq(elem) | TypeKind::Set(elem) => {
            let source_elem = match entity_kind {
                TypeKind::Seq(e) | TypeKind::Set(e) => Some(e),
                _ => None,
            };
            let (Value::Seq(items) | Value::Set(items)) = entity_value else {
                return Ok(Some(Value::Null));
            };
            let mut mapped = Vec::with_capacity(items.len());
            for item in &items {
                let value =
                    map_element(mapper, tree, node, item, elem, source_elem, update, scope)?;
                // Unmappable elements are dropped.
                if !value.is_null() {
                    mapped.push(value);
                }
            }
            if matches!(registry.kind(target.id), TypeKind::Set(_)) {
                let mut unique = Vec::with_capacity(mapped.len());
                for value in mapped {
                    if !unique.contains(&value) {
                        unique.push(value);
                    }
                }
                Ok(Some(Value::Set(unique)))
            } else {
                Ok(Some(Value::Seq(mapped)))
            }
        }
        TypeKind::Map(key_ty, value_ty) => {
            let (source_key, source_value) = match entity_kind {
                TypeKind::Map(k, v) => (Some(k), Some(v)),
                _ => (None, None),
            };
            let Value::Map(entries) = entity_value else {
                return Ok(Some(Value::Null));
            };
            let mut mapped = Vec::with_capacity(entries.len());
            for (key, value) in &entries {
                let mapped_key =
                    map_element(mapper, tree, node, key, key_ty, source_key, update, scope)?;
                let mapped_value = map_element(
                    mapper,
                    tree,
                    node,
                    value,
                    value_ty,
                    source_value,
                    update,
                    scope,
                )?;
                mapped.push((mapped_key, mapped_value));
            }
            Ok(Some(Value::Map(mapped)))
        }
        TypeKind::Pair(first_ty, second_ty) => {
            let source_tys = match entity_kind {
                TypeKind::Pair(a, b) => [Some(a), Some(b)],
                _ => [None, None],
            };
            let Value::Pair(parts) = entity_value else {
                return Ok(Some(Value::Null));
            };
            let first = map_element(
                mapper,
                tree,
                node,
                &parts[0],
                first_ty,
                source_tys[0],
                update,
                scope,
            )?;
            let second = map_element(
                mapper,
                tree,
                node,
                &parts[1],
                second_ty,
                source_tys[1],
                update,
                scope,
            )?;
            Ok(Some(Value::pair(first, second)))
        }
        TypeKind::Triple(first_ty, second_ty, third_ty) => {
            let source_tys = match entity_kind {
                TypeKind::Triple(a, b, c) => [Some(a), Some(b), Some(c)],
                _ => [None, None, None],
            };
            let Value::Triple(parts) = entity_value else {
                return Ok(Some(Value::Null));
            };
            let first = map_element(
                mapper,
                tree,
                node,
                &parts[0],
                first_ty,
                source_tys[0],
                update,
                scope,
            )?;
            let second = map_element(
                mapper,
                tree,
                node,
                &parts[1],
                second_ty,
                source_tys[1],
                update,
                scope,
            )?;
            let third = map_element(
                mapper,
                tree,
                node,
                &parts[2],
                third_ty,
                source_tys[2],
                update,
                scope,
            )?;
            Ok(Some(Value::triple(first, second, third)))
        }
        _ => Ok(Some(Value::Null)),
    }
}
