use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("type '{0}' is already registered")]
    DuplicateType(String),
    #[error("unknown type '{0}'")]
    UnknownType(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
