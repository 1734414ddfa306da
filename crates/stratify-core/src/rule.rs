//! Rules and declarations.
//!
//! A [`Rule`] is the immutable (selector, at-rule stack, declarations)
//! triple produced by the external parser. The selector is kept as raw
//! relative-selector text (e.g. `"&:hover"` or `"Card:hover &"`); the
//! lowering engine classifies it later.

use crate::value::CssValue;

/// A (property, value) pair within a rule.
///
/// The property may be empty: a "bare" declaration is a slot used purely as
/// a mixin expansion (or nested selector) rather than a property assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Property name in kebab-case (e.g. `"background-color"`), or empty
    /// for a bare declaration.
    pub property: String,
    /// The declaration value.
    pub value: CssValue,
    /// Whether the declaration carried `!important`.
    pub important: bool,
}

impl Declaration {
    /// Create a declaration.
    pub fn new(property: impl Into<String>, value: CssValue) -> Self {
        Self {
            property: property.into(),
            value,
            important: false,
        }
    }

    /// Create a static declaration from property and literal text.
    pub fn literal(property: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(property, CssValue::literal(text))
    }

    /// Create a bare declaration (empty property) wrapping a value.
    pub fn bare(value: CssValue) -> Self {
        Self::new("", value)
    }

    /// Mark the declaration as `!important`.
    pub fn important(mut self) -> Self {
        self.important = true;
        self
    }

    /// Whether this is a bare declaration.
    pub fn is_bare(&self) -> bool {
        self.property.is_empty()
    }
}

/// An immutable rule: selector, at-rule stack, and declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Raw relative-selector text. The self-reference token (`&` by
    /// default) stands for the component's own element.
    pub selector: String,
    /// Ordered list of enclosing conditional blocks, outermost first
    /// (e.g. `["@media (min-width: 600px)"]`).
    pub at_rules: Vec<String>,
    /// Declarations in source order.
    pub declarations: Vec<Declaration>,
}

impl Rule {
    /// Create a rule.
    pub fn new(
        selector: impl Into<String>,
        at_rules: Vec<String>,
        declarations: Vec<Declaration>,
    ) -> Self {
        Self {
            selector: selector.into(),
            at_rules,
            declarations,
        }
    }

    /// Create a base rule: bare self selector, no at-rules.
    pub fn base(declarations: Vec<Declaration>) -> Self {
        Self::new("&", vec![], declarations)
    }

    /// Create a rule for a same-element selector with no at-rules.
    pub fn on(selector: impl Into<String>, declarations: Vec<Declaration>) -> Self {
        Self::new(selector, vec![], declarations)
    }

    /// Create a rule nested inside a single at-rule block.
    pub fn in_at_rule(
        at_rule: impl Into<String>,
        selector: impl Into<String>,
        declarations: Vec<Declaration>,
    ) -> Self {
        Self::new(selector, vec![at_rule.into()], declarations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_rule_uses_self_token() {
        let rule = Rule::base(vec![Declaration::literal("color", "red")]);
        assert_eq!(rule.selector, "&");
        assert!(rule.at_rules.is_empty());
        assert_eq!(rule.declarations.len(), 1);
    }

    #[test]
    fn bare_declaration() {
        let decl = Declaration::bare(CssValue::slot(0));
        assert!(decl.is_bare());
        assert!(!decl.value.is_static());
    }

    #[test]
    fn important_flag() {
        let decl = Declaration::literal("color", "red").important();
        assert!(decl.important);
    }
}
