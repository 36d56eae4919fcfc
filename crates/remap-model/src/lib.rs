pub mod error;
pub mod path;
pub mod policy;
pub mod schema;
pub mod value;

pub use error::{Result, SchemaError};
pub use path::{FieldPath, PARENT_SEGMENT, is_excluded};
pub use policy::{Fallback, UpdateOption};
pub use schema::{
    ConstructorSchema, FieldSchema, MapFromSpec, ObjectSchema, ParamSchema, SchemaRegistry,
    TypeId, TypeKind, TypeRef,
};
pub use value::{Number, NumberKind, ObjectValue, Value};
