//! Data model for the Stratify style migration engine.
//!
//! Stratify migrates UI components written against a dynamic, cascade-based
//! CSS-in-JS API into a static, atomic-style API. This crate holds the
//! source-side model that the lowering engine (`stratify-lower`) consumes:
//!
//! - **Component declarations**: one per styled unit (component or mixin),
//!   with its rules, interpolation slots, and composition metadata
//! - **Rules and declarations**: the normalized (selector, at-rule stack,
//!   declarations) triples produced by the upstream parser
//! - **Values and slots**: static literals vs. interpolated values carrying
//!   opaque sub-expression slots, plus the resolver traits that classify them
//! - **Conditions**: same-element condition keys with specificity ordering
//! - **Warnings**: the two-tier (advisory / fatal) diagnostic records
//!
//! The model is deliberately free of any parsing or printing logic; upstream
//! and downstream collaborators own those concerns.

pub mod component;
pub mod condition;
pub mod rule;
pub mod value;
pub mod warning;

mod error;

pub use error::{Error, Result};

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::component::{
        ComponentArena, ComponentDecl, MixinPlacement, MixinUse, StyleKey,
    };
    pub use crate::condition::{Condition, RelationKind};
    pub use crate::rule::{Declaration, Rule};
    pub use crate::value::{
        CssValue, NoResolvers, ResolvedSlot, SelectorResolver, SlotRef, ValuePart, ValueResolver,
    };
    pub use crate::warning::{Severity, Warning, WarningKind};
}
