//! The core mapper.
//!
//! One mapping call walks the target type's fields and fills each one
//! from, in priority order: a resolved directive, the field's declared
//! default-source locations, or the same-named source field. Composite
//! and primitive values short-circuit before the field walk. The final
//! value is assembled through the constructor-scoring builder, or applied
//! in place when a base value is being updated.

use std::collections::BTreeMap;

use tracing::trace;

use remap_model::{FieldPath, MapFromSpec, SchemaRegistry, TypeRef, UpdateOption, Value};

use crate::builder::{build_or_update, build_with_base};
use crate::coerce::map_primitive;
use crate::composite::map_composite;
use crate::directive::{FunctionDirective, MapOptions, Rename};
use crate::error::Result;
use crate::resolver::resolve_directives;
use crate::source::{NodeId, SourceTree};

/// The directives and flags of one mapping call.
///
/// Recursions into sub-fields carry sliced exclusions and pre-resolved
/// override values instead of the parent's directives; recursions into
/// composite elements carry everything unchanged.
pub(crate) struct Scope<'a> {
    pub exclusions: Vec<FieldPath>,
    pub renames: &'a [Rename],
    pub functions: &'a [FunctionDirective],
    /// Values already resolved by a parent call, keyed by target
    /// location relative to this call. Highest priority.
    pub overrides: BTreeMap<String, Value>,
    pub use_annotation_defaults: bool,
    pub use_setters_only: bool,
    pub coerce_primitives: bool,
}

impl<'a> Scope<'a> {
    pub(crate) fn from_options(options: &'a MapOptions) -> Scope<'a> {
        Scope {
            exclusions: options
                .exclusions
                .iter()
                .map(|location| FieldPath::parse(location))
                .collect(),
            renames: &options.renames,
            functions: &options.functions,
            overrides: BTreeMap::new(),
            use_annotation_defaults: options.use_annotation_defaults,
            use_setters_only: options.use_setters_only,
            coerce_primitives: options.coerce_primitives,
        }
    }

    /// The default scope of an implicit recursion: no directives, all
    /// flags back to their defaults.
    pub(crate) fn empty() -> Scope<'static> {
        Scope {
            exclusions: Vec::new(),
            renames: &[],
            functions: &[],
            overrides: BTreeMap::new(),
            use_annotation_defaults: true,
            use_setters_only: false,
            coerce_primitives: true,
        }
    }

    fn has_directives(&self) -> bool {
        !self.renames.is_empty() || !self.functions.is_empty() || !self.overrides.is_empty()
    }
}

/// The mapping engine over one type registry.
#[derive(Debug, Clone, Copy)]
pub struct Mapper<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> Mapper<'r> {
    #[must_use]
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &'r SchemaRegistry {
        self.registry
    }

    /// Maps `source` (declared as `source_ty`) into a new value of
    /// `target`. Returns `Value::Null` when the source is null or the
    /// sides cannot be mapped.
    ///
    /// The walk recurses per nested object; a cyclic source graph is not
    /// detected and will overflow the stack.
    pub fn map(
        &self,
        source: &Value,
        source_ty: TypeRef,
        target: TypeRef,
        options: &MapOptions,
    ) -> Result<Value> {
        let (mut tree, root) = SourceTree::new(source.clone(), source_ty);
        let scope = Scope::from_options(options);
        self.map_node(&mut tree, root, target, None, &scope)
    }

    /// Updates `base` in place from `source`. Fields are applied through
    /// setters; a null overall result leaves the base untouched.
    pub fn update(
        &self,
        base: &mut Value,
        update: UpdateOption,
        source: &Value,
        source_ty: TypeRef,
        target: TypeRef,
        options: &MapOptions,
    ) -> Result<()> {
        let (mut tree, root) = SourceTree::new(source.clone(), source_ty);
        let mut scope = Scope::from_options(options);
        scope.use_setters_only = true;
        let mapped = self.map_node(&mut tree, root, target, Some((base.clone(), update)), &scope)?;
        if !mapped.is_null() {
            *base = mapped;
        }
        Ok(())
    }

    pub(crate) fn map_node(
        &self,
        tree: &mut SourceTree,
        node: NodeId,
        target: TypeRef,
        base: Option<(Value, UpdateOption)>,
        scope: &Scope<'_>,
    ) -> Result<Value> {
        if tree.value(node).is_null() {
            return Ok(Value::Null);
        }
        tree.strip_nullability(node);
        let target = target.strip_nullability();
        trace!(
            source_type = self.registry.name(tree.ty(node).id),
            target_type = self.registry.name(target.id),
            "mapping node"
        );

        // Identical enough already: hand the value over as is.
        if self.registry.is_assignable(target, tree.ty(node))
            && base.is_none()
            && !scope.has_directives()
            && scope.exclusions.is_empty()
        {
            return Ok(tree.value(node).clone());
        }

        if let Some(value) = map_composite(self, tree, node, target, &base, scope)? {
            return Ok(value);
        }
        if let Some(value) = map_primitive(
            self.registry,
            target,
            tree.ty(node),
            tree.value(node),
            scope.coerce_primitives,
        ) {
            return Ok(value);
        }

        let resolved = resolve_directives(self, tree, node, target, scope)?;
        let props = self.map_properties(tree, node, target, &base, scope, &resolved)?;

        let built = if !scope.use_setters_only
            && !props.is_empty()
            && let Some((base_value, _)) = &base
        {
            build_with_base(self.registry, target, &props, base_value)
        } else {
            build_or_update(self.registry, target, &props, scope.use_setters_only, base)
        };
        Ok(built.unwrap_or(Value::Null))
    }

    /// Resolves a value for every target field, in declaration order.
    fn map_properties(
        &self,
        tree: &mut SourceTree,
        node: NodeId,
        target: TypeRef,
        base: &Option<(Value, UpdateOption)>,
        scope: &Scope<'_>,
        resolved: &BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, Value>> {
        let Some(schema) = self.registry.object(target.id) else {
            return Ok(BTreeMap::new());
        };
        let update = base.as_ref().map(|(_, update)| *update);
        let mut props = BTreeMap::new();

        for field in &schema.fields {
            let name = field.name.as_str();
            if scope
                .exclusions
                .iter()
                .any(|exclusion| exclusion.len() == 1 && exclusion.head() == Some(name))
            {
                continue;
            }

            // Priority: directive value, declared default sources,
            // same-named source field.
            let mut prop: Option<Value> = if let Some(value) = resolved.get(name) {
                Some(value.clone())
            } else if let Some(map_from) = &field.map_from {
                if scope.use_annotation_defaults {
                    self.resolve_default_sources(tree, node, field.ty, map_from)?
                } else {
                    None
                }
            } else {
                None
            };

            if prop.is_none() {
                if let Some(child) = tree.child(self.registry, node, name) {
                    let value = if tree.value(child).is_null() {
                        Value::Null
                    } else {
                        tree.strip_nullability(child);
                        if self.registry.is_assignable(field.ty, tree.ty(child)) {
                            tree.value(child).clone()
                        } else {
                            self.map_node(tree, child, field.ty, None, &Scope::empty())?
                        }
                    };
                    // A null same-name match only survives when an update
                    // explicitly sets nulls.
                    if !value.is_null() || update == Some(UpdateOption::SetNulls) {
                        prop = Some(value);
                    }
                }
            }

            let sub_overrides = slice_overrides(resolved, name);
            let sub_exclusions = slice_exclusions(&scope.exclusions, name);
            // Exclusions alone never force a sub-object into existence.
            let recurses = !sub_overrides.is_empty()
                || (!sub_exclusions.is_empty()
                    && matches!(&prop, Some(value) if !value.is_null()));
            if !recurses {
                if let Some(value) = prop {
                    props.insert(field.name.clone(), value);
                }
                continue;
            }

            let sub_base = base.as_ref().and_then(|(base_value, update)| {
                base_value
                    .as_object()
                    .map(|object| object.field(name).clone())
                    .filter(|value| !value.is_null())
                    .map(|value| (value, *update))
            });

            let value = match prop {
                Some(value) if !value.is_null() => {
                    let spawned = tree.spawn(value, field.ty);
                    let sub_scope = Scope {
                        exclusions: sub_exclusions,
                        overrides: sub_overrides,
                        use_setters_only: scope.use_setters_only,
                        ..Scope::empty()
                    };
                    self.map_node(tree, spawned, field.ty, sub_base, &sub_scope)?
                }
                _ => {
                    // Nothing resolved at this level: build the sub-object
                    // from the direct overrides, then map the deeper ones
                    // into it.
                    let (direct, deeper): (BTreeMap<_, _>, BTreeMap<_, _>) = sub_overrides
                        .into_iter()
                        .partition(|(location, _)| FieldPath::parse(location).len() == 1);
                    let built = build_or_update(
                        self.registry,
                        field.ty,
                        &direct,
                        scope.use_setters_only,
                        sub_base.clone(),
                    );
                    match built {
                        Some(built) => {
                            let spawned = match tree.child(self.registry, node, name) {
                                Some(child) => {
                                    tree.set_value(child, built);
                                    child
                                }
                                None => {
                                    let ty = self
                                        .registry
                                        .runtime_type(&built)
                                        .unwrap_or(field.ty.strip_nullability());
                                    tree.spawn(built, ty)
                                }
                            };
                            let sub_scope = Scope {
                                exclusions: sub_exclusions,
                                overrides: deeper,
                                ..Scope::empty()
                            };
                            self.map_node(tree, spawned, field.ty, sub_base, &sub_scope)?
                        }
                        None => Value::Null,
                    }
                }
            };
            props.insert(field.name.clone(), value);
        }

        Ok(props)
    }

    /// Resolves a field's declared default-source locations: the first
    /// location with a non-null value wins, a location resolving to null
    /// yields an explicit null, and no resolution at all applies the
    /// declared fallback.
    fn resolve_default_sources(
        &self,
        tree: &mut SourceTree,
        node: NodeId,
        field_ty: TypeRef,
        map_from: &MapFromSpec,
    ) -> Result<Option<Value>> {
        let mut found: Option<NodeId> = None;
        for location in &map_from.sources {
            let path = FieldPath::parse(location);
            if let Some(resolved) = tree.resolve(self.registry, node, &path) {
                if !tree.value(resolved).is_null() {
                    found = Some(resolved);
                    break;
                }
                found.get_or_insert(resolved);
            }
        }

        let Some(resolved) = found else {
            return Ok(map_from.fallback.is_null().then_some(Value::Null));
        };
        if tree.value(resolved).is_null() {
            return Ok(Some(Value::Null));
        }
        tree.strip_nullability(resolved);
        if self.registry.is_assignable(field_ty, tree.ty(resolved)) {
            Ok(Some(tree.value(resolved).clone()))
        } else {
            Ok(Some(self.map_node(
                tree,
                resolved,
                field_ty,
                None,
                &Scope::empty(),
            )?))
        }
    }
}

fn slice_overrides(resolved: &BTreeMap<String, Value>, field: &str) -> BTreeMap<String, Value> {
    resolved
        .iter()
        .filter_map(|(location, value)| {
            let path = FieldPath::parse(location);
            if path.len() > 1 && path.head() == Some(field) {
                Some((path.tail().join(), value.clone()))
            } else {
                None
            }
        })
        .collect()
}

fn slice_exclusions(exclusions: &[FieldPath], field: &str) -> Vec<FieldPath> {
    exclusions
        .iter()
        .filter(|exclusion| exclusion.len() > 1 && exclusion.head() == Some(field))
        .map(FieldPath::tail)
        .collect()
}
