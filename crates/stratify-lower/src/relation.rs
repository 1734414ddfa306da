//! Relation bucket aggregation and marker allocation.
//!
//! Ancestor and sibling classifications do not merge straight into a style
//! object; their declarations accumulate per (resulting style key,
//! condition) pair first, across all rules and components of the file.
//! After aggregation, marker scoping is decided for the whole file at once.

use indexmap::IndexMap;

use stratify_core::component::StyleKey;
use stratify_core::condition::RelationKind;

use crate::options::MarkerStrategy;
use crate::output::{MarkerRequirement, RelationOverride};

/// A value accumulated into a bucket.
///
/// Dynamic values are stored as opaque expression references rather than
/// evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketValue {
    /// A compile-time literal.
    Literal(String),
    /// An opaque expression reference.
    Expr(String),
}

/// One accumulated bucket: a relation condition plus its property map.
#[derive(Debug, Clone)]
pub struct BucketEntry {
    /// The relation kind gating this bucket.
    pub kind: RelationKind,
    /// Pseudo or guard text; empty for the base (unconditioned) bucket.
    pub selector: String,
    /// Accumulated property values in first-seen order.
    pub props: IndexMap<String, BucketValue>,
}

impl BucketEntry {
    fn new(kind: RelationKind, selector: String) -> Self {
        Self {
            kind,
            selector,
            props: IndexMap::new(),
        }
    }

    /// Whether this is the base (unconditioned) bucket.
    pub fn is_base(&self) -> bool {
        self.selector.is_empty()
    }
}

/// All relation buckets of one file, keyed by resulting style key and
/// condition.
#[derive(Debug, Default)]
pub struct RelationBuckets {
    entries: IndexMap<StyleKey, IndexMap<String, BucketEntry>>,
}

impl RelationBuckets {
    /// Create an empty bucket set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a property value to the bucket for (resulting key, condition).
    ///
    /// Within a bucket, later appends of the same property override earlier
    /// ones (cascade order); conditions keep first-seen insertion order.
    ///
    /// Returns `false` when the append would violate the one-base-bucket
    /// invariant: the unconditioned bucket for a resulting key already
    /// exists with a different relation kind.
    #[must_use]
    pub fn add(
        &mut self,
        resulting: &StyleKey,
        kind: RelationKind,
        selector: &str,
        property: &str,
        value: BucketValue,
    ) -> bool {
        let buckets = self.entries.entry(resulting.clone()).or_default();
        let key = bucket_key(kind, selector);

        if selector.is_empty() {
            // At most one "none" bucket per resulting style key.
            let conflict = buckets
                .values()
                .any(|entry| entry.is_base() && entry.kind != kind);
            if conflict {
                return false;
            }
        }

        let entry = buckets
            .entry(key)
            .or_insert_with(|| BucketEntry::new(kind, selector.to_string()));
        entry.props.insert(property.to_string(), value);
        true
    }

    /// Iterate (resulting style key, buckets) pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&StyleKey, &IndexMap<String, BucketEntry>)> {
        self.entries.iter()
    }

    /// The buckets for one resulting style key.
    pub fn for_key(&self, resulting: &StyleKey) -> Option<&IndexMap<String, BucketEntry>> {
        self.entries.get(resulting)
    }

    /// Whether no buckets were accumulated.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The distinct-condition key for one bucket.
fn bucket_key(kind: RelationKind, selector: &str) -> String {
    format!("{}^{}", kind, selector)
}

/// Decide marker scoping for every style key touched by a relation.
///
/// The shared, file-wide marker is reused only when a single component in
/// the file carries sibling/ancestor relations; as soon as two distinct
/// components could overlap in scope, every one of them gets a
/// uniquely-scoped marker. Detection runs over all declarations of the
/// file, so re-running lowering after an edit re-evaluates collisions.
pub fn decide_markers(
    overrides: &[RelationOverride],
    strategy: MarkerStrategy,
) -> IndexMap<StyleKey, MarkerRequirement> {
    let mut distinct_children: Vec<&StyleKey> = vec![];
    for or in overrides {
        if !distinct_children.contains(&&or.child) {
            distinct_children.push(&or.child);
        }
    }

    let requirement = match strategy {
        MarkerStrategy::AlwaysUnique => MarkerRequirement::Unique,
        MarkerStrategy::SharedWhenSafe if distinct_children.len() > 1 => MarkerRequirement::Unique,
        MarkerStrategy::SharedWhenSafe => MarkerRequirement::Shared,
    };

    let mut markers = IndexMap::new();
    for or in overrides {
        markers.entry(or.resulting.clone()).or_insert(requirement);
    }
    markers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sibling_override(child: &str) -> RelationOverride {
        RelationOverride {
            child: StyleKey::new(child),
            parent: None,
            resulting: StyleKey::new(child),
            kind: RelationKind::AdjacentSibling,
        }
    }

    #[test]
    fn buckets_preserve_condition_order_and_override_props() {
        let mut buckets = RelationBuckets::new();
        let key = StyleKey::new("Item");

        assert!(buckets.add(
            &key,
            RelationKind::Ancestor,
            ":hover",
            "color",
            BucketValue::Literal("blue".into()),
        ));
        assert!(buckets.add(
            &key,
            RelationKind::Ancestor,
            ":focus",
            "color",
            BucketValue::Literal("green".into()),
        ));
        // Cascade override within the first bucket.
        assert!(buckets.add(
            &key,
            RelationKind::Ancestor,
            ":hover",
            "color",
            BucketValue::Literal("red".into()),
        ));

        let entries = buckets.for_key(&key).unwrap();
        assert_eq!(entries.len(), 2);
        let first = entries.values().next().unwrap();
        assert_eq!(first.selector, ":hover");
        assert_eq!(
            first.props.get("color"),
            Some(&BucketValue::Literal("red".into()))
        );
    }

    #[test]
    fn base_bucket_kind_conflict_is_rejected() {
        let mut buckets = RelationBuckets::new();
        let key = StyleKey::new("Item");

        assert!(buckets.add(
            &key,
            RelationKind::AdjacentSibling,
            "",
            "margin-left",
            BucketValue::Literal("8px".into()),
        ));
        assert!(!buckets.add(
            &key,
            RelationKind::AnySibling,
            "",
            "margin-left",
            BucketValue::Literal("4px".into()),
        ));
    }

    #[test]
    fn single_relation_shares_marker() {
        let markers = decide_markers(&[sibling_override("A")], MarkerStrategy::SharedWhenSafe);
        assert_eq!(
            markers.get(&StyleKey::new("A")),
            Some(&MarkerRequirement::Shared)
        );
    }

    #[test]
    fn two_components_force_unique_markers() {
        let markers = decide_markers(
            &[sibling_override("A"), sibling_override("B")],
            MarkerStrategy::SharedWhenSafe,
        );
        assert_eq!(
            markers.get(&StyleKey::new("A")),
            Some(&MarkerRequirement::Unique)
        );
        assert_eq!(
            markers.get(&StyleKey::new("B")),
            Some(&MarkerRequirement::Unique)
        );
    }

    #[test]
    fn always_unique_strategy() {
        let markers = decide_markers(&[sibling_override("A")], MarkerStrategy::AlwaysUnique);
        assert_eq!(
            markers.get(&StyleKey::new("A")),
            Some(&MarkerRequirement::Unique)
        );
    }
}
