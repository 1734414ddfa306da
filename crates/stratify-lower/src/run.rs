//! Per-file run state.
//!
//! One [`RunState`] is owned exclusively by the lowering of one file; it is
//! created at the start of the run, threaded by reference through every
//! phase, and consumed into a [`FileOutcome`] at the end. Nothing is shared
//! across files.

use indexmap::IndexMap;

use stratify_core::component::StyleKey;
use stratify_core::warning::Warning;

use crate::output::{
    FileOutcome, Lowered, MarkerRequirement, MixinPatch, RelationOverride, ResolvedStyle,
};
use crate::relation::RelationBuckets;

/// Mutable state for lowering one file.
#[derive(Debug, Default)]
pub struct RunState {
    warnings: Vec<Warning>,
    aborted: bool,
    styles: IndexMap<StyleKey, ResolvedStyle>,
    /// Relation overrides in discovery order.
    pub overrides: Vec<RelationOverride>,
    /// Accumulated relation buckets.
    pub buckets: RelationBuckets,
    /// Marker decisions, filled during finalization.
    pub markers: IndexMap<StyleKey, MarkerRequirement>,
    /// Cascade patches applied so far.
    pub patches: Vec<MixinPatch>,
    derived_count: u32,
}

impl RunState {
    /// Create a fresh run state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an advisory warning.
    pub fn warn(&mut self, warning: Warning) {
        debug_assert!(!warning.is_fatal());
        self.warnings.push(warning);
    }

    /// Record a fatal warning and set the abort flag.
    ///
    /// From this point on no further entries can be added to the resolved
    /// style map and the file-level result will be a skip.
    pub fn abort(&mut self, warning: Warning) {
        debug_assert!(warning.is_fatal());
        tracing::warn!(target: "stratify_lower", "aborting file: {}", warning);
        self.warnings.push(warning);
        self.aborted = true;
    }

    /// Whether the abort flag is set.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Ensure a (possibly empty) entry exists for a style key.
    ///
    /// No-op once the run is aborted, preserving abort monotonicity.
    pub fn ensure_style(&mut self, key: &StyleKey) {
        if self.aborted {
            return;
        }
        self.styles.entry(key.clone()).or_default();
    }

    /// Mutable access to a style key's entry, creating it if needed.
    ///
    /// Returns `None` once the run is aborted.
    pub fn style_mut(&mut self, key: &StyleKey) -> Option<&mut ResolvedStyle> {
        if self.aborted {
            return None;
        }
        Some(self.styles.entry(key.clone()).or_default())
    }

    /// Read access to a style key's entry.
    pub fn style(&self, key: &StyleKey) -> Option<&ResolvedStyle> {
        self.styles.get(key)
    }

    /// Whether an entry exists for a style key.
    pub fn has_style(&self, key: &StyleKey) -> bool {
        self.styles.contains_key(key)
    }

    /// Style keys in stable insertion order.
    pub fn style_keys(&self) -> Vec<StyleKey> {
        self.styles.keys().cloned().collect()
    }

    /// Replace a style key's entry wholesale (used by pruning).
    pub fn replace_style(&mut self, key: &StyleKey, style: ResolvedStyle) {
        if self.aborted {
            return;
        }
        self.styles.insert(key.clone(), style);
    }

    /// Remove a style key's entry (used by pruning).
    pub fn remove_style(&mut self, key: &StyleKey) {
        self.styles.shift_remove(key);
    }

    /// Allocate a derived style key scoped to (mixin, consumer).
    pub fn derive_key(&mut self, mixin: &StyleKey, component: &StyleKey) -> StyleKey {
        self.derived_count += 1;
        let mut name = format!("{}_{}", mixin, component);
        // Collisions can only come from pathological key names; disambiguate
        // with the allocation counter.
        if self.styles.contains_key(&StyleKey::new(name.clone())) {
            name = format!("{}_{}", name, self.derived_count);
        }
        StyleKey::new(name)
    }

    /// Number of resolved style entries so far.
    pub fn style_count(&self) -> usize {
        self.styles.len()
    }

    /// Consume the run into the file-level outcome.
    pub fn into_outcome(self) -> FileOutcome {
        if self.aborted {
            FileOutcome::Skipped {
                warnings: self.warnings,
            }
        } else {
            FileOutcome::Lowered(Lowered {
                styles: self.styles,
                overrides: self.overrides,
                markers: self.markers,
                patches: self.patches,
                warnings: self.warnings,
            })
        }
    }
}
