//! Runtime value model.
//!
//! Every object graph the engine maps lives in this representation: a
//! dynamically typed [`Value`] tree whose object nodes are tagged with the
//! [`TypeId`] of their registered schema.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::TypeId;

/// The numeric kinds the coercion table supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NumberKind {
    F64,
    F32,
    I64,
    I32,
    I16,
    I8,
}

/// A numeric value of one of the six supported kinds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Number {
    F64(f64),
    F32(f32),
    I64(i64),
    I32(i32),
    I16(i16),
    I8(i8),
}

impl Number {
    /// Returns the kind of this number.
    #[must_use]
    pub fn kind(&self) -> NumberKind {
        match self {
            Self::F64(_) => NumberKind::F64,
            Self::F32(_) => NumberKind::F32,
            Self::I64(_) => NumberKind::I64,
            Self::I32(_) => NumberKind::I32,
            Self::I16(_) => NumberKind::I16,
            Self::I8(_) => NumberKind::I8,
        }
    }

    /// Converts to `f64` with the native cast.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::F64(v) => v,
            Self::F32(v) => f64::from(v),
            Self::I64(v) => v as f64,
            Self::I32(v) => f64::from(v),
            Self::I16(v) => f64::from(v),
            Self::I8(v) => f64::from(v),
        }
    }

    /// Converts to `i64` with the native cast (floats truncate).
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        match *self {
            Self::F64(v) => v as i64,
            Self::F32(v) => v as i64,
            Self::I64(v) => v,
            Self::I32(v) => i64::from(v),
            Self::I16(v) => i64::from(v),
            Self::I8(v) => i64::from(v),
        }
    }

    /// Casts this number to another kind using the native numeric
    /// conversion, widening or narrowing as required.
    #[must_use]
    pub fn cast(&self, kind: NumberKind) -> Number {
        match kind {
            NumberKind::F64 => Number::F64(self.as_f64()),
            NumberKind::F32 => Number::F32(self.as_f64() as f32),
            NumberKind::I64 => Number::I64(self.as_i64()),
            NumberKind::I32 => Number::I32(self.as_i64() as i32),
            NumberKind::I16 => Number::I16(self.as_i64() as i16),
            NumberKind::I8 => Number::I8(self.as_i64() as i8),
        }
    }

    /// Parses a number of the given kind from text, locale-independent.
    ///
    /// Returns `None` for anything the native parser rejects.
    #[must_use]
    pub fn parse(text: &str, kind: NumberKind) -> Option<Number> {
        match kind {
            NumberKind::F64 => text.parse().ok().map(Number::F64),
            NumberKind::F32 => text.parse().ok().map(Number::F32),
            NumberKind::I64 => text.parse().ok().map(Number::I64),
            NumberKind::I32 => text.parse().ok().map(Number::I32),
            NumberKind::I16 => text.parse().ok().map(Number::I16),
            NumberKind::I8 => text.parse().ok().map(Number::I8),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::F64(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
        }
    }
}

/// An object value: the fields of an instance of a registered object type.
///
/// A field absent from the map reads as [`Value::Null`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectValue {
    /// The registered type this instance belongs to.
    pub type_id: TypeId,
    /// Field values by field name.
    pub fields: BTreeMap<String, Value>,
}

impl ObjectValue {
    /// Creates an object with no fields set.
    #[must_use]
    pub fn new(type_id: TypeId) -> Self {
        Self {
            type_id,
            fields: BTreeMap::new(),
        }
    }

    /// Reads a field; absent fields read as null.
    #[must_use]
    pub fn field(&self, name: &str) -> &Value {
        self.fields.get(name).unwrap_or(&Value::Null)
    }

    /// Sets a field, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set(name, value);
        self
    }
}

/// A dynamically typed runtime value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Text(String),
    Number(Number),
    /// Ordered sequence.
    Seq(Vec<Value>),
    /// Order-preserving set; elements are unique by equality.
    Set(Vec<Value>),
    /// Insertion-ordered key/value pairs.
    Map(Vec<(Value, Value)>),
    Pair(Box<[Value; 2]>),
    Triple(Box<[Value; 3]>),
    Object(ObjectValue),
}

impl Value {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Convenience constructor for text values.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    #[must_use]
    pub fn i32(v: i32) -> Self {
        Self::Number(Number::I32(v))
    }

    #[must_use]
    pub fn i64(v: i64) -> Self {
        Self::Number(Number::I64(v))
    }

    #[must_use]
    pub fn f64(v: f64) -> Self {
        Self::Number(Number::F64(v))
    }

    #[must_use]
    pub fn pair(first: Value, second: Value) -> Self {
        Self::Pair(Box::new([first, second]))
    }

    #[must_use]
    pub fn triple(first: Value, second: Value, third: Value) -> Self {
        Self::Triple(Box::new([first, second, third]))
    }

    /// Returns the text payload if this value is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the object payload if this value is an object.
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Mutable variant of [`as_object`](Self::as_object).
    pub fn as_object_mut(&mut self) -> Option<&mut ObjectValue> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_casts_between_kinds() {
        assert_eq!(Number::I32(10).cast(NumberKind::F64), Number::F64(10.0));
        assert_eq!(Number::F64(3.9).cast(NumberKind::I32), Number::I32(3));
        assert_eq!(Number::I64(300).cast(NumberKind::I8), Number::I8(44));
    }

    #[test]
    fn number_parses_locale_independent() {
        assert_eq!(Number::parse("10", NumberKind::I32), Some(Number::I32(10)));
        assert_eq!(
            Number::parse("10.5", NumberKind::F64),
            Some(Number::F64(10.5))
        );
        assert_eq!(Number::parse("10.5", NumberKind::I32), None);
        assert_eq!(Number::parse("", NumberKind::I64), None);
    }

    #[test]
    fn number_displays_natural_decimal() {
        assert_eq!(Number::I64(42).to_string(), "42");
        assert_eq!(Number::F64(10.5).to_string(), "10.5");
    }

    #[test]
    fn as_text_reads_text_only() {
        assert_eq!(Value::text("a").as_text(), Some("a"));
        assert_eq!(Value::i32(1).as_text(), None);
        assert_eq!(Value::Null.as_text(), None);
    }

    #[test]
    fn object_absent_field_reads_null() {
        let obj = ObjectValue::new(TypeId::TEXT).with("name", Value::text("a"));
        assert_eq!(obj.field("name"), &Value::text("a"));
        assert_eq!(obj.field("missing"), &Value::Null);
    }
}
