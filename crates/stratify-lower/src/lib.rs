//! The Stratify lowering engine.
//!
//! Lowers one file's component declarations (see `stratify-core`) from the
//! dynamic, cascade-based CSS-in-JS model into condition-keyed atomic style
//! objects:
//!
//! - **Pre-scan**: reduce every declaration to its base contribution map,
//!   with mixins expanded at their cascade position
//! - **Classification**: sort each rule's selector into same-element,
//!   ancestor-relation, sibling-relation, descendant-reference, or
//!   unsupported
//! - **Merge**: resolve slots once per declaration and fold values into
//!   per-property defaults and conditioned variants; relation declarations
//!   accumulate in buckets instead
//! - **Cascade patching**: recover true defaults for after-base mixins
//!   under consumer-scoped derived keys
//! - **Finalization**: render buckets, decide marker scoping, order
//!   variants by specificity, prune empty entries
//!
//! The engine is fail-closed: any rule whose cascade or selector semantics
//! cannot be proven preserved aborts the whole file, yielding
//! [`output::FileOutcome::Skipped`] with the diagnostics that explain why.
//! There is no partially-lowered output.

pub mod classify;
pub mod engine;
pub mod options;
pub mod output;
pub mod prescan;
pub mod relation;
pub mod shorthand;

mod finalize;
mod patch;
mod run;

pub use engine::{lower_file, LowerEngine};

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::classify::RuleClass;
    pub use crate::engine::{lower_file, LowerEngine};
    pub use crate::options::{LowerOptions, MarkerStrategy};
    pub use crate::output::{
        FileOutcome, Lowered, MarkerRequirement, MixinPatch, PropertyEntry, RelationOverride,
        ResolvedStyle, StyleCondition, StyleValue,
    };
    pub use stratify_core::prelude::*;
}
