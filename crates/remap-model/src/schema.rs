//! Schema registry: explicit type descriptions the engine walks instead of
//! language reflection.
//!
//! Every mappable type is registered once and addressed by [`TypeId`].
//! Object types describe their fields (declaration order preserved), their
//! constructors, and any per-field default-source directive. The registry
//! also answers the two compatibility questions the engine asks: declared
//! assignability between type references, and shallow runtime conformance
//! of a value to a type reference.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::path::{FieldPath, PARENT_SEGMENT};
use crate::policy::Fallback;
use crate::value::{NumberKind, Value};

/// Dense index of a registered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeId(u32);

impl TypeId {
    /// The pre-interned text type.
    pub const TEXT: TypeId = TypeId(0);
    pub const F64: TypeId = TypeId(1);
    pub const F32: TypeId = TypeId(2);
    pub const I64: TypeId = TypeId(3);
    pub const I32: TypeId = TypeId(4);
    pub const I16: TypeId = TypeId(5);
    pub const I8: TypeId = TypeId(6);

    /// The pre-interned id for a numeric kind.
    #[must_use]
    pub fn number(kind: NumberKind) -> TypeId {
        match kind {
            NumberKind::F64 => Self::F64,
            NumberKind::F32 => Self::F32,
            NumberKind::I64 => Self::I64,
            NumberKind::I32 => Self::I32,
            NumberKind::I16 => Self::I16,
            NumberKind::I8 => Self::I8,
        }
    }

    /// A non-nullable reference to this type.
    #[must_use]
    pub fn non_null(self) -> TypeRef {
        TypeRef {
            id: self,
            nullable: false,
        }
    }

    /// A nullable reference to this type.
    #[must_use]
    pub fn nullable(self) -> TypeRef {
        TypeRef {
            id: self,
            nullable: true,
        }
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A use-site reference to a type: the type plus nullability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    pub id: TypeId,
    pub nullable: bool,
}

impl TypeRef {
    /// The same reference with nullability stripped.
    #[must_use]
    pub fn strip_nullability(self) -> TypeRef {
        TypeRef {
            id: self.id,
            nullable: false,
        }
    }
}

/// The declarative default-source directive a field can carry: an ordered
/// list of source locations to try, plus the fallback used after every
/// location failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapFromSpec {
    pub sources: Vec<String>,
    pub fallback: Fallback,
}

impl MapFromSpec {
    #[must_use]
    pub fn new(sources: impl IntoIterator<Item = impl Into<String>>, fallback: Fallback) -> Self {
        Self {
            sources: sources.into_iter().map(Into::into).collect(),
            fallback,
        }
    }
}

/// A named field of an object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    pub ty: TypeRef,
    /// Whether the field has a setter.
    pub mutable: bool,
    /// Optional default-source directive.
    pub map_from: Option<MapFromSpec>,
}

impl FieldSchema {
    /// A mutable field with no default-source directive.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            mutable: true,
            map_from: None,
        }
    }

    /// Marks the field as having no setter.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.mutable = false;
        self
    }

    /// Attaches a default-source directive.
    #[must_use]
    pub fn with_map_from(mut self, spec: MapFromSpec) -> Self {
        self.map_from = Some(spec);
        self
    }
}

/// A constructor parameter. A parameter with a default value is optional;
/// nullability comes from its type reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSchema {
    pub name: String,
    pub ty: TypeRef,
    pub default: Option<Value>,
}

impl ParamSchema {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// True when the parameter can be left unbound to use its default.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

/// A declared constructor of an object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorSchema {
    pub params: Vec<ParamSchema>,
}

impl ConstructorSchema {
    #[must_use]
    pub fn new(params: impl IntoIterator<Item = ParamSchema>) -> Self {
        Self {
            params: params.into_iter().collect(),
        }
    }
}

/// The shape of an object type: fields in declaration order plus the
/// declared constructors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectSchema {
    pub fields: Vec<FieldSchema>,
    pub constructors: Vec<ConstructorSchema>,
}

impl ObjectSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_constructor(mut self, constructor: ConstructorSchema) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// What a registered type is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeKind {
    Text,
    Number(NumberKind),
    Seq(TypeRef),
    Set(TypeRef),
    Map(TypeRef, TypeRef),
    Pair(TypeRef, TypeRef),
    Triple(TypeRef, TypeRef, TypeRef),
    Object(ObjectSchema),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TypeDef {
    name: String,
    kind: TypeKind,
}

/// The registry of every type a mapping call can see.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaRegistry {
    types: Vec<TypeDef>,
    by_name: BTreeMap<String, TypeId>,
}

impl SchemaRegistry {
    /// An empty registry with the primitive types pre-interned.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            types: Vec::new(),
            by_name: BTreeMap::new(),
        };
        registry.push("text", TypeKind::Text);
        registry.push("f64", TypeKind::Number(NumberKind::F64));
        registry.push("f32", TypeKind::Number(NumberKind::F32));
        registry.push("i64", TypeKind::Number(NumberKind::I64));
        registry.push("i32", TypeKind::Number(NumberKind::I32));
        registry.push("i16", TypeKind::Number(NumberKind::I16));
        registry.push("i8", TypeKind::Number(NumberKind::I8));
        registry
    }

    fn push(&mut self, name: &str, kind: TypeKind) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(TypeDef {
            name: name.to_string(),
            kind,
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Registers a named type. Duplicate names are an error.
    pub fn register(&mut self, name: &str, kind: TypeKind) -> Result<TypeId> {
        if self.by_name.contains_key(name) {
            return Err(SchemaError::DuplicateType(name.to_string()));
        }
        Ok(self.push(name, kind))
    }

    /// Registers an object type.
    pub fn register_object(&mut self, name: &str, schema: ObjectSchema) -> Result<TypeId> {
        self.register(name, TypeKind::Object(schema))
    }

    /// Looks a type up by name.
    pub fn lookup(&self, name: &str) -> Result<TypeId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))
    }

    #[must_use]
    pub fn name(&self, id: TypeId) -> &str {
        &self.types[id.index()].name
    }

    #[must_use]
    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.types[id.index()].kind
    }

    /// The object schema of `id`, if it is an object type.
    #[must_use]
    pub fn object(&self, id: TypeId) -> Option<&ObjectSchema> {
        match self.kind(id) {
            TypeKind::Object(schema) => Some(schema),
            _ => None,
        }
    }

    /// Interns a sequence type over `elem`, reusing a structurally equal
    /// registration if one exists.
    pub fn seq_of(&mut self, elem: TypeRef) -> TypeId {
        self.intern(TypeKind::Seq(elem))
    }

    pub fn set_of(&mut self, elem: TypeRef) -> TypeId {
        self.intern(TypeKind::Set(elem))
    }

    pub fn map_of(&mut self, key: TypeRef, value: TypeRef) -> TypeId {
        self.intern(TypeKind::Map(key, value))
    }

    pub fn pair_of(&mut self, first: TypeRef, second: TypeRef) -> TypeId {
        self.intern(TypeKind::Pair(first, second))
    }

    pub fn triple_of(&mut self, first: TypeRef, second: TypeRef, third: TypeRef) -> TypeId {
        self.intern(TypeKind::Triple(first, second, third))
    }

    fn intern(&mut self, kind: TypeKind) -> TypeId {
        if let Some(index) = self.types.iter().position(|def| def.kind == kind) {
            return TypeId(index as u32);
        }
        let name = self.describe(&kind);
        self.push(&name, kind)
    }

    fn describe(&self, kind: &TypeKind) -> String {
        let arg = |ty: &TypeRef| {
            let mut name = self.name(ty.id).to_string();
            if ty.nullable {
                name.push('?');
            }
            name
        };
        match kind {
            TypeKind::Text => "text".to_string(),
            TypeKind::Number(_) => "number".to_string(),
            TypeKind::Seq(elem) => format!("seq<{}>", arg(elem)),
            TypeKind::Set(elem) => format!("set<{}>", arg(elem)),
            TypeKind::Map(key, value) => format!("map<{}, {}>", arg(key), arg(value)),
            TypeKind::Pair(a, b) => format!("pair<{}, {}>", arg(a), arg(b)),
            TypeKind::Triple(a, b, c) => format!("triple<{}, {}, {}>", arg(a), arg(b), arg(c)),
            TypeKind::Object(_) => "object".to_string(),
        }
    }

    /// Declared assignability: can a value declared as `source` be used
    /// where `target` is expected, without any coercion?
    ///
    /// Nullability widens (non-null fits a nullable slot, not the other
    /// way), composite kinds recurse into their arguments, and object
    /// types are assignable only to themselves.
    #[must_use]
    pub fn is_assignable(&self, target: TypeRef, source: TypeRef) -> bool {
        if source.nullable && !target.nullable {
            return false;
        }
        if target.id == source.id {
            return true;
        }
        match (self.kind(target.id), self.kind(source.id)) {
            (TypeKind::Seq(a), TypeKind::Seq(b)) | (TypeKind::Set(a), TypeKind::Set(b)) => {
                self.is_assignable(*a, *b)
            }
            (TypeKind::Map(ak, av), TypeKind::Map(bk, bv)) => {
                self.is_assignable(*ak, *bk) && self.is_assignable(*av, *bv)
            }
            (TypeKind::Pair(a1, a2), TypeKind::Pair(b1, b2)) => {
                self.is_assignable(*a1, *b1) && self.is_assignable(*a2, *b2)
            }
            (TypeKind::Triple(a1, a2, a3), TypeKind::Triple(b1, b2, b3)) => {
                self.is_assignable(*a1, *b1)
                    && self.is_assignable(*a2, *b2)
                    && self.is_assignable(*a3, *b3)
            }
            _ => false,
        }
    }

    /// Shallow runtime conformance of a value to a type reference, the
    /// check every setter and constructor call applies. Composite element
    /// types are deliberately not inspected (erasure semantics).
    #[must_use]
    pub fn value_conforms(&self, ty: TypeRef, value: &Value) -> bool {
        match value {
            Value::Null => ty.nullable,
            Value::Text(_) => matches!(self.kind(ty.id), TypeKind::Text),
            Value::Number(number) => {
                matches!(self.kind(ty.id), TypeKind::Number(kind) if *kind == number.kind())
            }
            Value::Seq(_) => matches!(self.kind(ty.id), TypeKind::Seq(_)),
            Value::Set(_) => matches!(self.kind(ty.id), TypeKind::Set(_)),
            Value::Map(_) => matches!(self.kind(ty.id), TypeKind::Map(..)),
            Value::Pair(_) => matches!(self.kind(ty.id), TypeKind::Pair(..)),
            Value::Triple(_) => matches!(self.kind(ty.id), TypeKind::Triple(..)),
            Value::Object(obj) => {
                matches!(self.kind(ty.id), TypeKind::Object(_)) && obj.type_id == ty.id
            }
        }
    }

    /// Best-effort runtime type of a value. Exact for primitives and
    /// objects; `None` for null and for composites, whose runtime element
    /// types are erased.
    #[must_use]
    pub fn runtime_type(&self, value: &Value) -> Option<TypeRef> {
        match value {
            Value::Null => None,
            Value::Text(_) => Some(TypeId::TEXT.non_null()),
            Value::Number(number) => Some(TypeId::number(number.kind()).non_null()),
            Value::Object(obj) => Some(obj.type_id.non_null()),
            Value::Seq(_)
            | Value::Set(_)
            | Value::Map(_)
            | Value::Pair(_)
            | Value::Triple(_) => None,
        }
    }

    /// Resolves a field location against a target type's declared shape.
    ///
    /// Every segment must name a field of the object type reached so far;
    /// parent segments never resolve here (a target path cannot climb).
    #[must_use]
    pub fn resolve_field(&self, ty: TypeRef, path: &FieldPath) -> Option<&FieldSchema> {
        if path.is_empty() {
            return None;
        }
        let mut current = ty;
        let mut found: Option<&FieldSchema> = None;
        for segment in path.segments() {
            if segment == PARENT_SEGMENT {
                return None;
            }
            let field = self.object(current.id)?.field(segment)?;
            current = field.ty;
            found = Some(field);
        }
        found
    }
}
