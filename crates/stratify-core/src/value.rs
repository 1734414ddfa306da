//! Declaration values and interpolation slots.
//!
//! A declaration value is either a static literal or an interpolated value
//! carrying one or more opaque sub-expression slots. The lowering engine
//! never looks inside a slot itself; it asks the [`ValueResolver`]
//! collaborator to classify each slot exactly once, and acts on the
//! resulting [`ResolvedSlot`] tag.

use std::fmt;

use crate::component::StyleKey;

/// A reference to one dynamic sub-expression slot of a component.
///
/// The index points into the owning component declaration's slot list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRef(pub usize);

impl SlotRef {
    /// The slot index in the owning component's slot list.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}}}", self.0)
    }
}

/// One segment of an interpolated value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValuePart {
    /// Literal text surrounding the slots.
    Literal(String),
    /// A dynamic sub-expression slot.
    Slot(SlotRef),
}

/// A declaration value.
///
/// Invariant: a [`CssValue::Static`] value never contains an unresolved
/// slot reference; any dynamic content must use [`CssValue::Interpolated`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssValue {
    /// A fully literal value (e.g. `"red"`, `"2px solid blue"`).
    Static(String),
    /// A value with one or more dynamic slots plus surrounding literal text.
    Interpolated(Vec<ValuePart>),
}

impl CssValue {
    /// Create a static value.
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Static(text.into())
    }

    /// Create an interpolated value holding a single slot.
    pub fn slot(index: usize) -> Self {
        Self::Interpolated(vec![ValuePart::Slot(SlotRef(index))])
    }

    /// Whether this value is fully static.
    pub fn is_static(&self) -> bool {
        matches!(self, Self::Static(_))
    }

    /// The literal text, if this value is static.
    pub fn as_static(&self) -> Option<&str> {
        match self {
            Self::Static(text) => Some(text),
            Self::Interpolated(_) => None,
        }
    }

    /// Iterate over the slots referenced by this value.
    pub fn slots(&self) -> impl Iterator<Item = SlotRef> + '_ {
        let parts = match self {
            Self::Static(_) => &[][..],
            Self::Interpolated(parts) => parts.as_slice(),
        };
        parts.iter().filter_map(|part| match part {
            ValuePart::Slot(slot) => Some(*slot),
            ValuePart::Literal(_) => None,
        })
    }

    /// The highest slot index referenced, if any.
    pub fn max_slot_index(&self) -> Option<usize> {
        self.slots().map(|slot| slot.index()).max()
    }
}

impl fmt::Display for CssValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(text) => write!(f, "{}", text),
            Self::Interpolated(parts) => {
                for part in parts {
                    match part {
                        ValuePart::Literal(text) => write!(f, "{}", text)?,
                        ValuePart::Slot(slot) => write!(f, "{}", slot)?,
                    }
                }
                Ok(())
            }
        }
    }
}

/// The classification of one dynamic slot, decided once by the
/// [`ValueResolver`] collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSlot {
    /// The slot evaluates to a compile-time literal.
    Literal(String),
    /// The slot references a known theme/token path; kept as an opaque
    /// expression reference in the output.
    ThemeToken(String),
    /// The slot references another in-file mixin.
    MixinRef(StyleKey),
    /// The slot cannot be classified; forces a per-declaration abort.
    Unknown,
}

impl ResolvedSlot {
    /// Whether this slot resolved to something the engine can emit.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Collaborator that classifies dynamic sub-expression slots.
///
/// Resolution is performed once per slot at the start of a component's
/// processing; the result is cached and never re-inferred at use sites.
pub trait ValueResolver {
    /// Classify the `slot`-th dynamic sub-expression of `component`.
    fn resolve(&self, component: &StyleKey, slot: SlotRef) -> ResolvedSlot;
}

/// Collaborator that maps helper-style selector expressions (e.g. a named
/// breakpoint) to literal at-rule condition strings.
pub trait SelectorResolver {
    /// Map an at-rule helper expression to its literal text, or `None` when
    /// the expression is already literal or unrecognized.
    fn resolve_at_rule(&self, expr: &str) -> Option<String>;
}

/// A resolver that knows nothing: every slot is [`ResolvedSlot::Unknown`]
/// and no at-rule helpers are mapped.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolvers;

impl ValueResolver for NoResolvers {
    fn resolve(&self, _component: &StyleKey, _slot: SlotRef) -> ResolvedSlot {
        ResolvedSlot::Unknown
    }
}

impl SelectorResolver for NoResolvers {
    fn resolve_at_rule(&self, _expr: &str) -> Option<String> {
        None
    }
}
