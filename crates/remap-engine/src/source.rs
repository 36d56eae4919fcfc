//! Source value tree.
//!
//! An arena of traversal nodes over the source object graph. Every node
//! carries the current value, its declared type, and an explicit parent
//! index so `..` path segments can climb without back-pointers. Children
//! are materialized lazily from the value's registered object schema and
//! cached per node; rebinding a node's value drops the cache.

use std::collections::BTreeMap;

use remap_model::{FieldPath, PARENT_SEGMENT, SchemaRegistry, TypeKind, TypeRef, Value};

/// Index of a node in a [`SourceTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(usize);

#[derive(Debug)]
struct SourceNode {
    value: Value,
    ty: TypeRef,
    parent: Option<NodeId>,
    children: Option<BTreeMap<String, NodeId>>,
}

/// Arena of source traversal nodes.
#[derive(Debug)]
pub struct SourceTree {
    nodes: Vec<SourceNode>,
}

impl SourceTree {
    /// Creates a tree rooted at `value` with declared type `ty`.
    #[must_use]
    pub fn new(value: Value, ty: TypeRef) -> (SourceTree, NodeId) {
        let mut tree = SourceTree { nodes: Vec::new() };
        let root = tree.insert(value, ty, None);
        (tree, root)
    }

    /// Adds a detached root, used when recursing into a value that has no
    /// place in the original graph (a function result, a rebuilt
    /// sub-object).
    pub fn spawn(&mut self, value: Value, ty: TypeRef) -> NodeId {
        self.insert(value, ty, None)
    }

    fn insert(&mut self, value: Value, ty: TypeRef, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(SourceNode {
            value,
            ty,
            parent,
            children: None,
        });
        id
    }

    #[must_use]
    pub fn value(&self, id: NodeId) -> &Value {
        &self.nodes[id.0].value
    }

    #[must_use]
    pub fn ty(&self, id: NodeId) -> TypeRef {
        self.nodes[id.0].ty
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Rebinds the node to a new value and invalidates its child cache.
    pub fn set_value(&mut self, id: NodeId, value: Value) {
        self.nodes[id.0].value = value;
        self.nodes[id.0].children = None;
    }

    /// Strips top-level nullability from the node's declared type.
    pub fn strip_nullability(&mut self, id: NodeId) {
        self.nodes[id.0].ty = self.nodes[id.0].ty.strip_nullability();
    }

    /// Returns the node for a named field of this node's value, or `None`
    /// if the value has no such field. The child's declared type is the
    /// field's declared type, nullability intact; an absent field value
    /// reads as null.
    pub fn child(&mut self, registry: &SchemaRegistry, id: NodeId, name: &str) -> Option<NodeId> {
        self.materialize_children(registry, id);
        self.nodes[id.0]
            .children
            .as_ref()
            .and_then(|children| children.get(name))
            .copied()
    }

    fn materialize_children(&mut self, registry: &SchemaRegistry, id: NodeId) {
        if self.nodes[id.0].children.is_some() {
            return;
        }
        let mut fields: Vec<(String, TypeRef, Value)> = Vec::new();
        if let Value::Object(obj) = &self.nodes[id.0].value
            && let TypeKind::Object(schema) = registry.kind(obj.type_id)
        {
            for field in &schema.fields {
                let value = obj.fields.get(&field.name).cloned().unwrap_or(Value::Null);
                fields.push((field.name.clone(), field.ty, value));
            }
        }
        let mut children = BTreeMap::new();
        for (name, ty, value) in fields {
            let child = self.insert(value, ty, Some(id));
            children.insert(name, child);
        }
        self.nodes[id.0].children = Some(children);
    }

    /// Walks a location from `id`. `..` moves to the parent (no parent
    /// fails the resolution), a normal segment descends into the named
    /// child, and an empty path fails.
    pub fn resolve(
        &mut self,
        registry: &SchemaRegistry,
        id: NodeId,
        path: &FieldPath,
    ) -> Option<NodeId> {
        if path.is_empty() {
            return None;
        }
        let mut current = id;
        for segment in path.segments() {
            current = if segment == PARENT_SEGMENT {
                self.parent(current)?
            } else {
                self.child(registry, current, segment)?
            };
        }
        Some(current)
    }
}
