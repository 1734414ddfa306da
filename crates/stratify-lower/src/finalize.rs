//! Run finalization.
//!
//! After all rules are merged and cascades patched, the finalizer renders
//! the accumulated relation buckets into conditioned variants, decides
//! marker scoping for the whole file, checks referenced style keys for
//! completeness, orders each property's variants by increasing condition
//! specificity, and prunes empty unreferenced entries.

use stratify_core::component::{ComponentArena, StyleKey};
use stratify_core::warning::{Warning, WarningKind};

use crate::options::LowerOptions;
use crate::output::{StyleCondition, StyleValue};
use crate::relation::{decide_markers, BucketValue};
use crate::run::RunState;

/// Finalize a run in place. No-op on an already-aborted run.
pub fn finalize(arena: &ComponentArena, run: &mut RunState, options: &LowerOptions) {
    if run.is_aborted() {
        return;
    }

    check_completeness(arena, run);
    if run.is_aborted() {
        return;
    }

    render_buckets(run);

    let markers = decide_markers(&run.overrides, options.marker_strategy);
    run.markers = markers;

    sort_variants(run);
    prune_empty(arena, run);
}

/// Every style key referenced by a declaration must resolve to an entry in
/// this file.
fn check_completeness(arena: &ComponentArena, run: &mut RunState) {
    for decl in arena.iter() {
        if let Some(parent) = &decl.extends {
            if !arena.contains(parent) {
                run.abort(
                    Warning::error(
                        WarningKind::UnresolvableStyleKey,
                        format!("'{}' extends undeclared style key '{}'", decl.style_key, parent),
                    )
                    .with_style_key(decl.style_key.as_str()),
                );
                return;
            }
        }
        for mixin_use in &decl.mixins {
            if !arena.contains(&mixin_use.key) {
                run.abort(
                    Warning::error(
                        WarningKind::UnknownMixin,
                        format!(
                            "'{}' composes undeclared mixin '{}'",
                            decl.style_key, mixin_use.key
                        ),
                    )
                    .with_style_key(decl.style_key.as_str()),
                );
                return;
            }
        }
    }
}

/// Turn each relation bucket into conditioned variants on its resulting
/// style key. The unconditioned bucket becomes an empty-selector relation
/// variant, never a default: its value only applies when the relation
/// holds.
fn render_buckets(run: &mut RunState) {
    let buckets = std::mem::take(&mut run.buckets);
    for (resulting, entries) in buckets.iter() {
        for entry in entries.values() {
            for (property, value) in &entry.props {
                let condition = StyleCondition::relation(entry.kind, entry.selector.clone());
                let value = match value {
                    BucketValue::Literal(text) => StyleValue::Literal(text.clone()),
                    BucketValue::Expr(expr) => StyleValue::Expr(expr.clone()),
                };
                let Some(style) = run.style_mut(resulting) else {
                    return;
                };
                style.entry(property).upsert_variant(condition, value);
            }
        }
    }
}

/// Stable-sort each property's variants by increasing specificity, so
/// fewer-atom conditions emit first and ties keep first-seen order.
fn sort_variants(run: &mut RunState) {
    for key in run.style_keys() {
        let Some(style) = run.style_mut(&key) else {
            return;
        };
        for entry in style.properties.values_mut() {
            entry.variants.sort_by_key(|(condition, _)| condition.specificity());
        }
    }
}

/// Drop style entries that ended up empty and that nothing references.
fn prune_empty(arena: &ComponentArena, run: &mut RunState) {
    let mut referenced: Vec<StyleKey> = vec![];
    for or in &run.overrides {
        referenced.push(or.resulting.clone());
        if let Some(parent) = &or.parent {
            referenced.push(parent.clone());
        }
    }
    for patch in &run.patches {
        referenced.push(patch.derived.clone());
    }
    for decl in arena.iter() {
        if let Some(parent) = &decl.extends {
            referenced.push(parent.clone());
        }
    }

    for key in run.style_keys() {
        let empty = run.style(&key).is_some_and(|style| style.is_empty());
        if empty && !referenced.contains(&key) {
            run.remove_style(&key);
        }
    }
}
