//! Component declarations and the per-file component arena.

use std::collections::HashMap;
use std::fmt;

use crate::rule::Rule;
use crate::{Error, Result};

/// The unique name under which one component's or mixin's resolved style
/// object is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleKey(String);

impl StyleKey {
    /// Create a style key.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StyleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StyleKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for StyleKey {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Where a mixed-in style key sits relative to the component's own base
/// declarations in source cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixinPlacement {
    /// Applied before the component's own base rules (base rules win).
    BeforeBase,
    /// Applied after the component's own base rules (mixin wins).
    AfterBase,
}

/// One mixed-in style key with its cascade placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixinUse {
    /// The mixin's style key.
    pub key: StyleKey,
    /// Placement relative to the consumer's base declarations.
    pub placement: MixinPlacement,
}

impl MixinUse {
    /// A mixin applied before the consumer's base rules.
    pub fn before_base(key: impl Into<StyleKey>) -> Self {
        Self {
            key: key.into(),
            placement: MixinPlacement::BeforeBase,
        }
    }

    /// A mixin applied after the consumer's base rules.
    pub fn after_base(key: impl Into<StyleKey>) -> Self {
        Self {
            key: key.into(),
            placement: MixinPlacement::AfterBase,
        }
    }
}

/// One source-level styled unit (component or mixin).
///
/// Created once per source unit during collection. The lowering engine
/// reads it and records derived metadata in its own output; declarations
/// are never deleted, though a mixin's contribution may be pruned to empty
/// once fully inlined and unreferenced.
#[derive(Debug, Clone)]
pub struct ComponentDecl {
    /// Stable unique name for this unit's resolved style object.
    pub style_key: StyleKey,
    /// Rules in source order.
    pub rules: Vec<Rule>,
    /// Number of dynamic sub-expression slots this unit references.
    pub slot_count: usize,
    /// Whether this unit is a reusable mixin rather than a component.
    pub is_mixin: bool,
    /// Whether this unit is exported from its module.
    pub is_exported: bool,
    /// Whether external consumers may pass styles into this component.
    pub supports_external_styling: bool,
    /// Style key of the base being styled-wrapped, if any.
    pub extends: Option<StyleKey>,
    /// Mixed-in style keys with their cascade placement.
    pub mixins: Vec<MixinUse>,
    /// Stable selector identifier for external, unconverted consumers.
    pub bridge: Option<String>,
}

impl ComponentDecl {
    /// Create a component declaration.
    pub fn component(style_key: impl Into<StyleKey>) -> Self {
        Self {
            style_key: style_key.into(),
            rules: vec![],
            slot_count: 0,
            is_mixin: false,
            is_exported: false,
            supports_external_styling: false,
            extends: None,
            mixins: vec![],
            bridge: None,
        }
    }

    /// Create a mixin declaration.
    pub fn mixin(style_key: impl Into<StyleKey>) -> Self {
        Self {
            is_mixin: true,
            ..Self::component(style_key)
        }
    }

    /// Append a rule.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Set the number of dynamic slots.
    pub fn with_slots(mut self, slot_count: usize) -> Self {
        self.slot_count = slot_count;
        self
    }

    /// Mark as exported.
    pub fn exported(mut self) -> Self {
        self.is_exported = true;
        self
    }

    /// Set the extends base.
    pub fn with_extends(mut self, base: impl Into<StyleKey>) -> Self {
        self.extends = Some(base.into());
        self
    }

    /// Append a mixin use.
    pub fn with_mixin(mut self, mixin: MixinUse) -> Self {
        self.mixins.push(mixin);
        self
    }

    /// Set the bridge identifier.
    pub fn with_bridge(mut self, bridge: impl Into<String>) -> Self {
        self.bridge = Some(bridge.into());
        self
    }

    /// Validate the declaration against model invariants.
    ///
    /// Checks that no declaration references a slot outside the declared
    /// slot list and that no bare declaration carries a static value.
    /// Violations are contract breaches by the upstream parser.
    pub fn validate(&self) -> Result<()> {
        for rule in &self.rules {
            for decl in &rule.declarations {
                if decl.is_bare() && decl.value.is_static() {
                    return Err(Error::malformed_rule(
                        self.style_key.as_str(),
                        "bare declaration with a static value",
                    ));
                }
                if let Some(max) = decl.value.max_slot_index() {
                    if max >= self.slot_count {
                        return Err(Error::slot_out_of_range(
                            self.style_key.as_str(),
                            max,
                            self.slot_count,
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Per-file registry of component declarations, keyed by style key.
///
/// The arena is populated incrementally as declarations are collected;
/// readers tolerate "not yet present" lookups by deferring to a later pass
/// rather than assuming single-pass completeness.
#[derive(Debug, Default)]
pub struct ComponentArena {
    decls: Vec<ComponentDecl>,
    index: HashMap<StyleKey, usize>,
}

impl ComponentArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration, validating it first.
    pub fn push(&mut self, decl: ComponentDecl) -> Result<()> {
        decl.validate()?;
        if self.index.contains_key(&decl.style_key) {
            return Err(Error::duplicate_style_key(decl.style_key.as_str()));
        }
        self.index.insert(decl.style_key.clone(), self.decls.len());
        self.decls.push(decl);
        Ok(())
    }

    /// Look up a declaration by style key.
    pub fn get(&self, key: &StyleKey) -> Option<&ComponentDecl> {
        self.index.get(key).map(|&i| &self.decls[i])
    }

    /// Look up a declaration by component name.
    pub fn get_named(&self, name: &str) -> Option<&ComponentDecl> {
        self.get(&StyleKey::new(name))
    }

    /// Whether a style key is declared in this file.
    pub fn contains(&self, key: &StyleKey) -> bool {
        self.index.contains_key(key)
    }

    /// Iterate declarations in source order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentDecl> {
        self.decls.iter()
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.decls.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}
