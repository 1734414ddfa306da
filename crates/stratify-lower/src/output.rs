//! Emitter-facing output of a lowering run.

use std::fmt;

use indexmap::IndexMap;

use stratify_core::component::StyleKey;
use stratify_core::condition::{Condition, RelationKind};
use stratify_core::warning::Warning;

/// A resolved style value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleValue {
    /// A compile-time literal (e.g. `"red"`).
    Literal(String),
    /// An opaque expression reference kept verbatim for the emitter
    /// (e.g. a theme token path).
    Expr(String),
}

impl StyleValue {
    /// The literal text, if this value is a literal.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(text) => Some(text),
            Self::Expr(_) => None,
        }
    }
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => write!(f, "{}", text),
            Self::Expr(expr) => write!(f, "{{{}}}", expr),
        }
    }
}

/// A condition attached to one variant entry of a resolved property.
///
/// Same-element conditions carry no relation; relation conditions are
/// rendered by the emitter as marker-qualified entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleCondition {
    /// The relation gating this entry, if any.
    pub relation: Option<RelationKind>,
    /// Pseudo chain or guard text (may be empty for a bare relation).
    pub selector: String,
    /// Composed enclosing at-rule text, if any.
    pub at_rule: Option<String>,
}

impl StyleCondition {
    /// A same-element condition.
    pub fn same_element(condition: &Condition) -> Self {
        Self {
            relation: None,
            selector: condition.selector.clone(),
            at_rule: condition.at_rule.clone(),
        }
    }

    /// A relation condition.
    pub fn relation(kind: RelationKind, selector: impl Into<String>) -> Self {
        Self {
            relation: Some(kind),
            selector: selector.into(),
            at_rule: None,
        }
    }

    /// The composed condition key. Distinct conditions have distinct keys.
    pub fn key(&self) -> String {
        let mut key = String::new();
        if let Some(kind) = self.relation {
            key.push_str(&kind.to_string());
            key.push('^');
        }
        if let Some(at_rule) = &self.at_rule {
            key.push_str(at_rule);
            if !self.selector.is_empty() {
                key.push(' ');
            }
        }
        key.push_str(&self.selector);
        key
    }

    /// Number of combined condition atoms, for finalizer ordering.
    ///
    /// A relation counts as one atom on top of the pseudo/at-rule atoms.
    pub fn specificity(&self) -> u32 {
        let base = Condition {
            selector: self.selector.clone(),
            at_rule: self.at_rule.clone(),
        }
        .specificity();
        base + u32::from(self.relation.is_some())
    }
}

impl fmt::Display for StyleCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.relation {
            Some(kind) => write!(f, "{}({})", kind, self.selector),
            None => write!(f, "{}", self.key()),
        }
    }
}

/// One property of a resolved style object: an optional default plus
/// condition-keyed overrides in emission order.
#[derive(Debug, Clone, Default)]
pub struct PropertyEntry {
    /// The unconditioned value, if any.
    pub default: Option<StyleValue>,
    /// Conditioned overrides; ordered first-seen, re-sorted by increasing
    /// specificity during finalization.
    pub variants: Vec<(StyleCondition, StyleValue)>,
}

impl PropertyEntry {
    /// Whether this entry carries no values at all.
    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.variants.is_empty()
    }

    /// Look up the value for a condition key.
    pub fn variant(&self, key: &str) -> Option<&StyleValue> {
        self.variants
            .iter()
            .find(|(condition, _)| condition.key() == key)
            .map(|(_, value)| value)
    }

    /// Set or replace the variant for a condition. Replacement keeps the
    /// first-seen position, so insertion order stays stable under cascade
    /// overrides.
    pub fn upsert_variant(&mut self, condition: StyleCondition, value: StyleValue) {
        let key = condition.key();
        if let Some(slot) = self
            .variants
            .iter_mut()
            .find(|(existing, _)| existing.key() == key)
        {
            slot.1 = value;
        } else {
            self.variants.push((condition, value));
        }
    }
}

/// One resolved style object: property → condition-keyed values.
///
/// When no variants exist anywhere this degenerates to a plain merged
/// object (defaults only).
#[derive(Debug, Clone, Default)]
pub struct ResolvedStyle {
    /// Properties in stable first-seen order.
    pub properties: IndexMap<String, PropertyEntry>,
}

impl ResolvedStyle {
    /// Whether this style carries no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Whether any property carries conditioned variants.
    pub fn has_conditions(&self) -> bool {
        self.properties.values().any(|entry| !entry.variants.is_empty())
    }

    /// Get or create the entry for a property.
    pub fn entry(&mut self, property: &str) -> &mut PropertyEntry {
        self.properties.entry(property.to_string()).or_default()
    }

    /// Look up a property entry.
    pub fn get(&self, property: &str) -> Option<&PropertyEntry> {
        self.properties.get(property)
    }
}

/// Marker scoping decided for one style key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerRequirement {
    /// The single shared, file-wide marker suffices.
    Shared,
    /// A uniquely-scoped marker must be allocated for this declaration.
    Unique,
}

/// A selector relationship crossing component boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationOverride {
    /// The component whose style is gated.
    pub child: StyleKey,
    /// The component whose state gates it (ancestor relations only).
    pub parent: Option<StyleKey>,
    /// The style key receiving the conditioned entries.
    pub resulting: StyleKey,
    /// The relation kind.
    pub kind: RelationKind,
}

/// Record of a cascade patch: `derived` replaces `mixin` for `component`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixinPatch {
    /// The original mixin style key.
    pub mixin: StyleKey,
    /// The consuming component.
    pub component: StyleKey,
    /// The derived, consumer-scoped style key.
    pub derived: StyleKey,
}

/// Successful lowering of one file.
#[derive(Debug, Default)]
pub struct Lowered {
    /// Resolved style objects per style key, in stable order.
    pub styles: IndexMap<StyleKey, ResolvedStyle>,
    /// Cross-component relations for the emitter's marker wiring.
    pub overrides: Vec<RelationOverride>,
    /// Marker scoping per style key carrying relations.
    pub markers: IndexMap<StyleKey, MarkerRequirement>,
    /// Cascade patches applied to after-base mixins.
    pub patches: Vec<MixinPatch>,
    /// Advisory warnings accumulated during the run.
    pub warnings: Vec<Warning>,
}

/// File-level result: either a complete lowering or an intentional skip.
///
/// A skip means an unsupported or unsafe pattern was found; the file must
/// be left untouched. There is no partially-lowered result.
#[derive(Debug)]
pub enum FileOutcome {
    /// The file was lowered completely.
    Lowered(Lowered),
    /// The file was left untouched; warnings explain why.
    Skipped {
        /// All accumulated warnings, including the triggering error.
        warnings: Vec<Warning>,
    },
}

impl FileOutcome {
    /// Whether the file was skipped.
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    /// All warnings, regardless of outcome.
    pub fn warnings(&self) -> &[Warning] {
        match self {
            Self::Lowered(lowered) => &lowered.warnings,
            Self::Skipped { warnings } => warnings,
        }
    }

    /// The lowered result, if any.
    pub fn lowered(&self) -> Option<&Lowered> {
        match self {
            Self::Lowered(lowered) => Some(lowered),
            Self::Skipped { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_keeps_first_seen_position() {
        let mut entry = PropertyEntry::default();
        entry.upsert_variant(
            StyleCondition::same_element(&Condition::pseudo(":hover")),
            StyleValue::Literal("blue".into()),
        );
        entry.upsert_variant(
            StyleCondition::same_element(&Condition::pseudo(":focus")),
            StyleValue::Literal("green".into()),
        );
        // Cascade override of :hover keeps its original slot.
        entry.upsert_variant(
            StyleCondition::same_element(&Condition::pseudo(":hover")),
            StyleValue::Literal("red".into()),
        );

        assert_eq!(entry.variants.len(), 2);
        assert_eq!(entry.variants[0].0.key(), ":hover");
        assert_eq!(entry.variant(":hover").unwrap().as_literal(), Some("red"));
    }

    #[test]
    fn relation_conditions_have_distinct_keys() {
        let same = StyleCondition::same_element(&Condition::pseudo(":hover"));
        let ancestor = StyleCondition::relation(RelationKind::Ancestor, ":hover");
        assert_ne!(same.key(), ancestor.key());
        assert_eq!(ancestor.specificity(), 2);
    }
}
