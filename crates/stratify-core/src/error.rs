//! Error types for the data model.
//!
//! These errors represent contract breaches by the upstream parser, not
//! unsupported user patterns. Unsupported patterns are reported through
//! [`crate::warning::Warning`] records and the run-level abort flag instead.

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that indicate a malformed input model.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A rule or declaration violates the model invariants.
    #[error("Malformed rule in '{style_key}': {message}")]
    MalformedRule { style_key: String, message: String },

    /// Two component declarations share the same style key.
    #[error("Duplicate style key '{style_key}'")]
    DuplicateStyleKey { style_key: String },

    /// A declaration references a slot index outside its component's slot list.
    #[error("Slot index {index} out of range for '{style_key}' ({slot_count} slots)")]
    SlotOutOfRange {
        style_key: String,
        index: usize,
        slot_count: usize,
    },
}

impl Error {
    /// Create a malformed-rule error.
    pub fn malformed_rule(style_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedRule {
            style_key: style_key.into(),
            message: message.into(),
        }
    }

    /// Create a duplicate-key error.
    pub fn duplicate_style_key(style_key: impl Into<String>) -> Self {
        Self::DuplicateStyleKey {
            style_key: style_key.into(),
        }
    }

    /// Create a slot-out-of-range error.
    pub fn slot_out_of_range(
        style_key: impl Into<String>,
        index: usize,
        slot_count: usize,
    ) -> Self {
        Self::SlotOutOfRange {
            style_key: style_key.into(),
            index,
            slot_count,
        }
    }
}
