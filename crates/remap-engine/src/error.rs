use thiserror::Error;

/// Errors a mapping call can surface.
///
/// Everything below the `_OR_THROW` boundary resolves to a null or a
/// skipped field instead of an error; the only failure that reaches the
/// caller is a transform function raising under an or-throw fallback.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("transform function for '{target}' failed: {source}")]
    Function {
        target: String,
        #[source]
        source: anyhow::Error,
    },
}

pub type Result<T> = std::result::Result<T, MapError>;
