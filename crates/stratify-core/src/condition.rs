//! Condition keys for condition-keyed style values.
//!
//! In the target model a style key resolves to a condition-keyed object:
//! a default value plus per-condition overrides. A [`Condition`] is the
//! same-element part of that key: the pseudo chain with the self token
//! stripped, composed with any enclosing at-rule text.

use std::fmt;

/// How a cross-component relation gates a style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// Gated by a pseudo state of an ancestor component.
    Ancestor,
    /// Gated by the immediately preceding sibling.
    AdjacentSibling,
    /// Gated by any earlier sibling matching a guard.
    AnySibling,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ancestor => write!(f, "ancestor"),
            Self::AdjacentSibling => write!(f, "adjacent-sibling"),
            Self::AnySibling => write!(f, "any-sibling"),
        }
    }
}

/// A same-element condition: pseudo chain plus optional at-rule context.
///
/// The base (unconditioned) state is a condition with neither part set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Condition {
    /// Pseudo chain with the self token stripped (e.g. `":hover"`,
    /// `"::before"`, `":hover:focus"`). Empty for the base state.
    pub selector: String,
    /// Composed enclosing at-rule text, if any.
    pub at_rule: Option<String>,
}

impl Condition {
    /// The base (unconditioned) state.
    pub fn base() -> Self {
        Self::default()
    }

    /// A pseudo-chain condition with no at-rule context.
    pub fn pseudo(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            at_rule: None,
        }
    }

    /// An at-rule-only condition (base selector inside a conditional block).
    pub fn at_rule(at_rule: impl Into<String>) -> Self {
        Self {
            selector: String::new(),
            at_rule: Some(at_rule.into()),
        }
    }

    /// Attach at-rule context to this condition.
    pub fn in_at_rule(mut self, at_rule: impl Into<String>) -> Self {
        self.at_rule = Some(at_rule.into());
        self
    }

    /// Whether this is the base (unconditioned) state.
    pub fn is_base(&self) -> bool {
        self.selector.is_empty() && self.at_rule.is_none()
    }

    /// The composed condition key (at-rule text first, then pseudo chain).
    pub fn key(&self) -> String {
        match (&self.at_rule, self.selector.is_empty()) {
            (None, _) => self.selector.clone(),
            (Some(at), true) => at.clone(),
            (Some(at), false) => format!("{} {}", at, self.selector),
        }
    }

    /// Number of combined condition atoms.
    ///
    /// Each pseudo-class/pseudo-element in the chain counts as one atom and
    /// an enclosing at-rule counts as one more. The finalizer sorts variant
    /// entries by increasing atom count so broader defaults are established
    /// before narrower overrides.
    pub fn specificity(&self) -> u32 {
        let pseudo_atoms = count_pseudo_atoms(&self.selector);
        pseudo_atoms + u32::from(self.at_rule.is_some())
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_base() {
            write!(f, "(base)")
        } else {
            write!(f, "{}", self.key())
        }
    }
}

/// Count pseudo atoms in a chain like `":hover:focus"` or `"::before"`.
///
/// A `::` pseudo-element introducer counts as a single atom. Functional
/// pseudo arguments (e.g. `:nth-child(2n+1)`) do not add extra atoms even
/// when they contain colons, because chains are produced by the classifier
/// from token boundaries, never from raw user text.
fn count_pseudo_atoms(chain: &str) -> u32 {
    let mut atoms = 0u32;
    let mut chars = chain.chars().peekable();
    let mut depth = 0u32;

    while let Some(ch) = chars.next() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => {
                if chars.peek() == Some(&':') {
                    chars.next();
                }
                atoms += 1;
            }
            _ => {}
        }
    }

    atoms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_condition() {
        let cond = Condition::base();
        assert!(cond.is_base());
        assert_eq!(cond.key(), "");
        assert_eq!(cond.specificity(), 0);
    }

    #[test]
    fn pseudo_condition_key_and_specificity() {
        let cond = Condition::pseudo(":hover");
        assert_eq!(cond.key(), ":hover");
        assert_eq!(cond.specificity(), 1);

        let cond = Condition::pseudo(":hover:focus");
        assert_eq!(cond.specificity(), 2);

        let cond = Condition::pseudo("::before");
        assert_eq!(cond.specificity(), 1);
    }

    #[test]
    fn at_rule_composition() {
        let cond = Condition::pseudo(":hover").in_at_rule("@media (min-width: 600px)");
        assert_eq!(cond.key(), "@media (min-width: 600px) :hover");
        assert_eq!(cond.specificity(), 2);

        let cond = Condition::at_rule("@media (min-width: 600px)");
        assert_eq!(cond.key(), "@media (min-width: 600px)");
        assert_eq!(cond.specificity(), 1);
    }

    #[test]
    fn functional_pseudo_is_one_atom() {
        let cond = Condition::pseudo(":nth-child(2n+1)");
        assert_eq!(cond.specificity(), 1);
    }
}
