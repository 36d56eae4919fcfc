//! Field location language.
//!
//! A location string uses `/` as the segment separator, `..` to refer to
//! the parent node, and ignores blank segments and the literal `.`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The segment that moves resolution to the parent node.
pub const PARENT_SEGMENT: &str = "..";

/// A parsed field location: an ordered list of segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parses a location string, dropping blank segments and `.`.
    #[must_use]
    pub fn parse(location: &str) -> Self {
        let segments = location
            .split('/')
            .filter(|segment| !segment.trim().is_empty() && *segment != ".")
            .map(str::to_string)
            .collect();
        Self { segments }
    }

    /// A single-segment path.
    #[must_use]
    pub fn single(segment: impl Into<String>) -> Self {
        Self {
            segments: vec![segment.into()],
        }
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// The first segment, if any.
    #[must_use]
    pub fn head(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// The path with its first segment removed.
    #[must_use]
    pub fn tail(&self) -> FieldPath {
        Self {
            segments: self.segments.iter().skip(1).cloned().collect(),
        }
    }

    /// The canonical string form: segments joined with `/`.
    #[must_use]
    pub fn join(&self) -> String {
        self.segments.join("/")
    }

    /// True when `self`'s segments are a prefix of `other`'s (equality
    /// included). Used for exclusion propagation: excluding a path also
    /// excludes everything beneath it.
    #[must_use]
    pub fn is_prefix_of(&self, other: &FieldPath) -> bool {
        other.segments.starts_with(&self.segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join())
    }
}

/// True when `path` matches an exclusion or sits beneath one.
#[must_use]
pub fn is_excluded(path: &FieldPath, exclusions: &[FieldPath]) -> bool {
    exclusions
        .iter()
        .any(|exclusion| !exclusion.is_empty() && exclusion.is_prefix_of(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_drops_blank_and_dot_segments() {
        let path = FieldPath::parse("pet//./name/");
        assert_eq!(path.segments(), ["pet", "name"]);
        assert_eq!(path.join(), "pet/name");
    }

    #[test]
    fn parse_keeps_parent_segments() {
        let path = FieldPath::parse("../id");
        assert_eq!(path.segments(), ["..", "id"]);
    }

    #[test]
    fn prefix_covers_nested_paths() {
        let house = FieldPath::parse("house");
        let number = FieldPath::parse("house/number");
        assert!(house.is_prefix_of(&number));
        assert!(house.is_prefix_of(&house));
        assert!(!number.is_prefix_of(&house));
    }

    #[test]
    fn exclusion_applies_to_descendants() {
        let exclusions = vec![FieldPath::parse("house")];
        assert!(is_excluded(&FieldPath::parse("house/number"), &exclusions));
        assert!(is_excluded(&FieldPath::parse("house"), &exclusions));
        assert!(!is_excluded(&FieldPath::parse("houses"), &exclusions));
    }

    #[test]
    fn head_and_tail_slice_one_level() {
        let path = FieldPath::parse("house/number/digit");
        assert_eq!(path.head(), Some("house"));
        assert_eq!(path.tail().join(), "number/digit");
    }
}
