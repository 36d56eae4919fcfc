//! Recursive, type-directed object-graph mapping.
//!
//! A [`Mapper`] walks a source value against a target type registered in
//! a [`SchemaRegistry`](remap_model::SchemaRegistry), filling each target
//! field from caller directives, declared default-source locations, or
//! the same-named source field, then assembles the result through the
//! best-matching constructor and setters. Primitives coerce between text
//! and the numeric kinds; sequences, sets, maps, pairs, and triples map
//! element-wise; existing values can be updated in place.

pub mod builder;
mod coerce;
mod composite;
pub mod directive;
mod engine;
pub mod error;
mod resolver;
pub mod source;

pub use builder::{build_or_update, build_with_base, build_with_constructor};
pub use directive::{FunctionDirective, FunctionParam, MapFunction, MapOptions, Rename};
pub use engine::Mapper;
pub use error::{MapError, Result};
pub use source::{NodeId, SourceTree};
