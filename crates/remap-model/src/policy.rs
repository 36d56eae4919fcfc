//! Fallback and update policies.

use serde::{Deserialize, Serialize};

/// What to do when a directive fails to produce a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fallback {
    /// Resolve the target field to null if it is nullable; drop the
    /// directive otherwise.
    Null,
    /// Drop the directive and let generic name matching proceed.
    Skip,
    /// Like [`Skip`](Self::Skip), but an error raised by a transform
    /// function propagates to the caller instead of being swallowed.
    ContinueOrThrow,
    /// Like [`Null`](Self::Null), but an error raised by a transform
    /// function propagates to the caller instead of being swallowed.
    NullOrThrow,
}

impl Fallback {
    /// True for the variants that resolve to an explicit null.
    #[must_use]
    pub fn is_null(self) -> bool {
        matches!(self, Self::Null | Self::NullOrThrow)
    }

    /// True for the variants that re-throw transform-function errors.
    #[must_use]
    pub fn is_throw(self) -> bool {
        matches!(self, Self::ContinueOrThrow | Self::NullOrThrow)
    }
}

/// Whether a null resolution overwrites an existing field during an
/// update-in-place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateOption {
    /// A null resolution leaves the base entity's value untouched.
    IgnoreNulls,
    /// A null resolution overwrites the base entity's value.
    SetNulls,
}
