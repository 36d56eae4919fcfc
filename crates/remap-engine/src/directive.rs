//! Caller-supplied mapping directives and call options.

use std::fmt;

use remap_model::{Fallback, TypeRef, Value};

/// The value a unary transform declares for its parameter.
#[derive(Debug, Clone)]
pub struct FunctionParam {
    /// Declared parameter type; nullability allows invoking with an
    /// explicit null when the source is absent.
    pub ty: TypeRef,
    /// Default used when the source is absent; a parameter with a default
    /// is optional.
    pub default: Option<Value>,
}

type FunctionBody = Box<dyn Fn(Option<&Value>) -> anyhow::Result<Value>>;

/// A transform function of arity zero or one.
///
/// Transforms of higher arity are unrepresentable by construction, which
/// is the rejection rule for them.
pub struct MapFunction {
    pub(crate) param: Option<FunctionParam>,
    body: FunctionBody,
}

impl MapFunction {
    /// A transform taking no input.
    pub fn nullary(body: impl Fn() -> anyhow::Result<Value> + 'static) -> Self {
        Self {
            param: None,
            body: Box::new(move |_| body()),
        }
    }

    /// A transform taking one input of declared type `ty`. A null input is
    /// only ever passed when `ty` is nullable.
    pub fn unary(ty: TypeRef, body: impl Fn(&Value) -> anyhow::Result<Value> + 'static) -> Self {
        Self {
            param: Some(FunctionParam { ty, default: None }),
            body: Box::new(move |value| body(value.unwrap_or(&Value::Null))),
        }
    }

    /// A unary transform whose parameter falls back to `default` when the
    /// source is absent.
    pub fn unary_or(
        ty: TypeRef,
        default: Value,
        body: impl Fn(&Value) -> anyhow::Result<Value> + 'static,
    ) -> Self {
        Self {
            param: Some(FunctionParam {
                ty,
                default: Some(default),
            }),
            body: Box::new(move |value| body(value.unwrap_or(&Value::Null))),
        }
    }

    pub(crate) fn invoke(&self, input: Option<&Value>) -> anyhow::Result<Value> {
        (self.body)(input)
    }
}

impl fmt::Debug for MapFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapFunction")
            .field("param", &self.param)
            .finish_non_exhaustive()
    }
}

/// A plain rename directive: copy the value at `source` into `target`.
#[derive(Debug, Clone)]
pub struct Rename {
    pub source: String,
    pub target: String,
    pub fallback: Fallback,
}

impl Rename {
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>, fallback: Fallback) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            fallback,
        }
    }
}

/// A function directive: feed the value at `source` (if any) through a
/// transform and place the result at `target`.
#[derive(Debug)]
pub struct FunctionDirective {
    pub source: Option<String>,
    pub function: MapFunction,
    pub target: String,
    pub fallback: Fallback,
}

impl FunctionDirective {
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        function: MapFunction,
        target: impl Into<String>,
        fallback: Fallback,
    ) -> Self {
        Self {
            source: Some(source.into()),
            function,
            target: target.into(),
            fallback,
        }
    }

    /// A directive whose transform has no source field.
    #[must_use]
    pub fn sourceless(
        function: MapFunction,
        target: impl Into<String>,
        fallback: Fallback,
    ) -> Self {
        Self {
            source: None,
            function,
            target: target.into(),
            fallback,
        }
    }
}

/// Configuration for one mapping call.
#[derive(Debug)]
pub struct MapOptions {
    /// Target locations to exclude, descendants included.
    pub exclusions: Vec<String>,
    /// Plain rename directives.
    pub renames: Vec<Rename>,
    /// Function directives; these win over renames on the same target.
    pub functions: Vec<FunctionDirective>,
    /// Honor default-source directives carried by target fields.
    pub use_annotation_defaults: bool,
    /// Never bind values through constructors; mutate via setters only.
    pub use_setters_only: bool,
    /// Enable the text/numeric coercion table.
    pub coerce_primitives: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            exclusions: Vec::new(),
            renames: Vec::new(),
            functions: Vec::new(),
            use_annotation_defaults: true,
            use_setters_only: false,
            coerce_primitives: true,
        }
    }
}

impl MapOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_exclusion(mut self, location: impl Into<String>) -> Self {
        self.exclusions.push(location.into());
        self
    }

    #[must_use]
    pub fn with_rename(mut self, rename: Rename) -> Self {
        self.renames.push(rename);
        self
    }

    #[must_use]
    pub fn with_function(mut self, directive: FunctionDirective) -> Self {
        self.functions.push(directive);
        self
    }

    #[must_use]
    pub fn ignore_annotation_defaults(mut self) -> Self {
        self.use_annotation_defaults = false;
        self
    }

    #[must_use]
    pub fn setters_only(mut self) -> Self {
        self.use_setters_only = true;
        self
    }

    #[must_use]
    pub fn without_primitive_coercion(mut self) -> Self {
        self.coerce_primitives = false;
        self
    }
}
