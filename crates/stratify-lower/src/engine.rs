//! The lowering engine.
//!
//! One [`LowerEngine`] lowers one file's component arena into condition-
//! keyed style objects. The pipeline runs pre-scan, per-rule classification
//! and merge, cascade patching, and finalization, accumulating everything
//! in a [`RunState`] that collapses to a [`FileOutcome`] at the end. Any
//! fatal diagnostic aborts the whole file: there is no partially-lowered
//! output.

use stratify_core::component::{ComponentArena, ComponentDecl, StyleKey};
use stratify_core::condition::{Condition, RelationKind};
use stratify_core::rule::{Declaration, Rule};
use stratify_core::value::{
    CssValue, ResolvedSlot, SelectorResolver, SlotRef, ValuePart, ValueResolver,
};
use stratify_core::warning::{Warning, WarningKind};

use crate::classify::{classify_rule, compose_at_rules, RuleClass};
use crate::finalize::finalize;
use crate::options::LowerOptions;
use crate::output::{FileOutcome, StyleCondition, StyleValue};
use crate::patch::patch_cascades;
use crate::prescan::{Contribution, Prescan};
use crate::relation::BucketValue;
use crate::run::RunState;
use crate::shorthand;

/// Lower one file with default options.
pub fn lower_file(
    arena: &ComponentArena,
    values: &dyn ValueResolver,
    selectors: &dyn SelectorResolver,
) -> FileOutcome {
    LowerEngine::new(values, selectors).lower_file(arena)
}

/// The lowering engine for one file.
pub struct LowerEngine<'a> {
    values: &'a dyn ValueResolver,
    selectors: &'a dyn SelectorResolver,
    options: LowerOptions,
}

impl<'a> LowerEngine<'a> {
    /// Create an engine with default options.
    pub fn new(values: &'a dyn ValueResolver, selectors: &'a dyn SelectorResolver) -> Self {
        Self {
            values,
            selectors,
            options: LowerOptions::default(),
        }
    }

    /// Use specific options.
    pub fn with_options(mut self, options: LowerOptions) -> Self {
        self.options = options;
        self
    }

    /// Lower every declaration of a file.
    pub fn lower_file(&self, arena: &ComponentArena) -> FileOutcome {
        tracing::debug!(
            target: "stratify_lower",
            declarations = arena.len(),
            "lowering file"
        );

        let scan = Prescan::run(arena, self.values, &self.options);
        let mut run = RunState::new();

        for decl in arena.iter() {
            if run.is_aborted() {
                break;
            }
            self.lower_decl(arena, &scan, &mut run, decl);
        }

        patch_cascades(arena, &scan, &mut run);
        finalize(arena, &mut run, &self.options);

        tracing::debug!(
            target: "stratify_lower",
            aborted = run.is_aborted(),
            styles = run.style_count(),
            "lowering finished"
        );
        run.into_outcome()
    }

    fn lower_decl(
        &self,
        arena: &ComponentArena,
        scan: &Prescan,
        run: &mut RunState,
        decl: &ComponentDecl,
    ) {
        // Slots are classified exactly once per declaration, up front.
        let slots: Vec<ResolvedSlot> = (0..decl.slot_count)
            .map(|i| self.values.resolve(&decl.style_key, SlotRef(i)))
            .collect();

        run.ensure_style(&decl.style_key);

        for rule in &decl.rules {
            if run.is_aborted() {
                return;
            }
            match classify_rule(rule, arena, self.selectors, &self.options) {
                RuleClass::SameElement(condition) => {
                    self.merge_rule(arena, scan, run, &slots, &decl.style_key, &condition, rule);
                }
                RuleClass::DescendantRef { target } => {
                    let condition = match compose_at_rules(&rule.at_rules, self.selectors) {
                        Some(at_rule) => Condition::base().in_at_rule(at_rule),
                        None => Condition::base(),
                    };
                    self.merge_rule(arena, scan, run, &slots, &target, &condition, rule);
                }
                RuleClass::Ancestor { ancestor, pseudo } => {
                    self.merge_relation(
                        run,
                        &slots,
                        decl,
                        rule,
                        RelationKind::Ancestor,
                        Some(ancestor),
                        pseudo,
                    );
                }
                RuleClass::Sibling { kind, guard } => {
                    self.merge_relation(
                        run,
                        &slots,
                        decl,
                        rule,
                        kind,
                        None,
                        guard.unwrap_or_default(),
                    );
                }
                RuleClass::Unsupported { reason } => {
                    run.abort(
                        Warning::error(WarningKind::UnsupportedSelector, reason)
                            .with_selector(rule.selector.clone())
                            .with_style_key(decl.style_key.as_str()),
                    );
                    return;
                }
            }
        }
    }

    /// Merge a same-element (or rerouted descendant) rule into a style key.
    #[allow(clippy::too_many_arguments)]
    fn merge_rule(
        &self,
        arena: &ComponentArena,
        scan: &Prescan,
        run: &mut RunState,
        slots: &[ResolvedSlot],
        target: &StyleKey,
        condition: &Condition,
        rule: &Rule,
    ) {
        for d in &rule.declarations {
            if run.is_aborted() {
                return;
            }
            self.note_important(run, d, rule);

            if d.is_bare() {
                self.merge_bare(arena, scan, run, slots, target, condition, d, rule);
                continue;
            }

            let value = match resolve_value(slots, &d.value) {
                Ok(value) => value,
                Err(reason) => {
                    run.abort(
                        Warning::error(WarningKind::UnknownInterpolation, reason)
                            .with_property(d.property.clone())
                            .with_style_key(target.as_str()),
                    );
                    return;
                }
            };

            for (property, value) in expand_value(&d.property, value) {
                merge_property(run, target, condition, &property, value);
            }
        }
    }

    /// Inline a bare mixin expansion: the mixin's base contribution map,
    /// plus its conditioned rules merged as if written on the consumer.
    #[allow(clippy::too_many_arguments)]
    fn merge_bare(
        &self,
        arena: &ComponentArena,
        scan: &Prescan,
        run: &mut RunState,
        slots: &[ResolvedSlot],
        target: &StyleKey,
        condition: &Condition,
        d: &Declaration,
        rule: &Rule,
    ) {
        let referenced: Vec<SlotRef> = d.value.slots().collect();
        let mixin = match referenced[..] {
            [slot] => match slots.get(slot.index()) {
                Some(ResolvedSlot::MixinRef(key)) => key.clone(),
                _ => {
                    run.abort(
                        Warning::error(
                            WarningKind::UnknownInterpolation,
                            "bare interpolation does not resolve to a mixin",
                        )
                        .with_selector(rule.selector.clone())
                        .with_style_key(target.as_str()),
                    );
                    return;
                }
            },
            _ => {
                run.abort(
                    Warning::error(
                        WarningKind::UnknownInterpolation,
                        "bare declaration must be a single mixin reference",
                    )
                    .with_style_key(target.as_str()),
                );
                return;
            }
        };

        let Some(mixin_decl) = arena.get(&mixin) else {
            run.abort(
                Warning::error(
                    WarningKind::UnknownMixin,
                    format!("mixin '{}' is not declared in this file", mixin),
                )
                .with_style_key(target.as_str()),
            );
            return;
        };
        let map = scan.contribution(&mixin).cloned().unwrap_or_default();

        for (property, contribution) in &map {
            match contribution {
                Contribution::Literal(text) => {
                    for (property, value) in
                        expand_value(property, StyleValue::Literal(text.clone()))
                    {
                        merge_property(run, target, condition, &property, value);
                    }
                }
                Contribution::Dynamic => {
                    run.abort(
                        Warning::error(
                            WarningKind::UnknownInterpolation,
                            format!(
                                "mixin '{}' contributes a dynamic value for '{}'",
                                mixin, property
                            ),
                        )
                        .with_property(property.clone())
                        .with_style_key(target.as_str()),
                    );
                    return;
                }
            }
        }

        // The contribution map only carries base rules; the mixin's
        // conditioned rules must land on the consumer too, or its cascade
        // is silently truncated.
        let mixin_slots: Vec<ResolvedSlot> = (0..mixin_decl.slot_count)
            .map(|i| self.values.resolve(&mixin, SlotRef(i)))
            .collect();
        for mixin_rule in &mixin_decl.rules {
            if run.is_aborted() {
                return;
            }
            if crate::prescan::is_base_rule(mixin_rule, &self.options) {
                continue;
            }
            if !condition.is_base() {
                run.abort(
                    Warning::error(
                        WarningKind::UnsupportedSelector,
                        format!(
                            "mixin '{}' has conditioned rules but is inlined under a condition",
                            mixin
                        ),
                    )
                    .with_selector(rule.selector.clone())
                    .with_style_key(target.as_str()),
                );
                return;
            }
            match classify_rule(mixin_rule, arena, self.selectors, &self.options) {
                RuleClass::SameElement(mixin_condition) => {
                    self.merge_rule(
                        arena,
                        scan,
                        run,
                        &mixin_slots,
                        target,
                        &mixin_condition,
                        mixin_rule,
                    );
                }
                _ => {
                    run.abort(
                        Warning::error(
                            WarningKind::UnsupportedSelector,
                            format!(
                                "mixin '{}' carries a relation rule and cannot be inlined",
                                mixin
                            ),
                        )
                        .with_selector(mixin_rule.selector.clone())
                        .with_style_key(target.as_str()),
                    );
                    return;
                }
            }
        }
    }

    /// Accumulate a relation rule's declarations into buckets.
    #[allow(clippy::too_many_arguments)]
    fn merge_relation(
        &self,
        run: &mut RunState,
        slots: &[ResolvedSlot],
        decl: &ComponentDecl,
        rule: &Rule,
        kind: RelationKind,
        parent: Option<StyleKey>,
        selector: String,
    ) {
        if !rule.at_rules.is_empty() {
            run.abort(
                Warning::error(
                    WarningKind::UnsupportedSelector,
                    "relation selector inside an at-rule block",
                )
                .with_selector(rule.selector.clone())
                .with_style_key(decl.style_key.as_str()),
            );
            return;
        }

        let relation = crate::output::RelationOverride {
            child: decl.style_key.clone(),
            parent,
            resulting: decl.style_key.clone(),
            kind,
        };
        // Several rules may restate the same relation; record it once.
        if !run.overrides.contains(&relation) {
            run.overrides.push(relation);
        }

        for d in &rule.declarations {
            if run.is_aborted() {
                return;
            }
            self.note_important(run, d, rule);

            if d.is_bare() {
                run.abort(
                    Warning::error(
                        WarningKind::UnknownInterpolation,
                        "mixin expansion inside a relation rule",
                    )
                    .with_selector(rule.selector.clone())
                    .with_style_key(decl.style_key.as_str()),
                );
                return;
            }

            let value = match resolve_value(slots, &d.value) {
                Ok(StyleValue::Literal(text)) => BucketValue::Literal(text),
                Ok(StyleValue::Expr(expr)) => BucketValue::Expr(expr),
                Err(reason) => {
                    run.abort(
                        Warning::error(WarningKind::UnknownInterpolation, reason)
                            .with_property(d.property.clone())
                            .with_style_key(decl.style_key.as_str()),
                    );
                    return;
                }
            };

            for (property, value) in expand_bucket(&d.property, value) {
                let added =
                    run.buckets
                        .add(&decl.style_key, kind, &selector, &property, value);
                if !added {
                    run.abort(
                        Warning::error(
                            WarningKind::ConflictingDeclarations,
                            "conflicting unconditioned relation declarations",
                        )
                        .with_selector(rule.selector.clone())
                        .with_property(property)
                        .with_style_key(decl.style_key.as_str()),
                    );
                    return;
                }
            }
        }
    }

    fn note_important(&self, run: &mut RunState, d: &Declaration, rule: &Rule) {
        if d.important && self.options.warn_important {
            run.warn(
                Warning::advisory(
                    WarningKind::ImportantDeclaration,
                    "!important declaration carried over as-is",
                )
                .with_property(d.property.clone())
                .with_selector(rule.selector.clone()),
            );
        }
    }
}

/// Merge one resolved (property, value) under a condition.
fn merge_property(
    run: &mut RunState,
    target: &StyleKey,
    condition: &Condition,
    property: &str,
    value: StyleValue,
) {
    let Some(style) = run.style_mut(target) else {
        return;
    };
    let entry = style.entry(property);
    if condition.is_base() {
        // Later base declarations win in place.
        entry.default = Some(value);
    } else {
        entry.upsert_variant(StyleCondition::same_element(condition), value);
    }
}

/// Expand a literal shorthand into longhand pairs; dynamic values are kept
/// whole.
fn expand_value(property: &str, value: StyleValue) -> Vec<(String, StyleValue)> {
    if let StyleValue::Literal(text) = &value {
        if let Some(pairs) = shorthand::expand(property, text) {
            return pairs
                .into_iter()
                .map(|(p, v)| (p, StyleValue::Literal(v)))
                .collect();
        }
    }
    vec![(property.to_string(), value)]
}

fn expand_bucket(property: &str, value: BucketValue) -> Vec<(String, BucketValue)> {
    if let BucketValue::Literal(text) = &value {
        if let Some(pairs) = shorthand::expand(property, text) {
            return pairs
                .into_iter()
                .map(|(p, v)| (p, BucketValue::Literal(v)))
                .collect();
        }
    }
    vec![(property.to_string(), value)]
}

/// Resolve a declaration value against the owner's classified slot table.
fn resolve_value(slots: &[ResolvedSlot], value: &CssValue) -> Result<StyleValue, String> {
    let parts = match value {
        CssValue::Static(text) => return Ok(StyleValue::Literal(text.clone())),
        CssValue::Interpolated(parts) => parts,
    };

    // A value that is exactly one theme token keeps its bare path.
    if let [ValuePart::Slot(slot)] = parts[..] {
        return match slots.get(slot.index()) {
            Some(ResolvedSlot::Literal(text)) => Ok(StyleValue::Literal(text.clone())),
            Some(ResolvedSlot::ThemeToken(path)) => Ok(StyleValue::Expr(path.clone())),
            Some(ResolvedSlot::MixinRef(key)) => {
                Err(format!("mixin '{}' used as a property value", key))
            }
            _ => Err(format!("slot {} could not be classified", slot.index())),
        };
    }

    let mut out = String::new();
    let mut dynamic = false;
    for part in parts {
        match part {
            ValuePart::Literal(text) => out.push_str(text),
            ValuePart::Slot(slot) => match slots.get(slot.index()) {
                Some(ResolvedSlot::Literal(text)) => out.push_str(text),
                Some(ResolvedSlot::ThemeToken(path)) => {
                    dynamic = true;
                    out.push_str("${");
                    out.push_str(path);
                    out.push('}');
                }
                Some(ResolvedSlot::MixinRef(key)) => {
                    return Err(format!("mixin '{}' used inside a property value", key));
                }
                _ => return Err(format!("slot {} could not be classified", slot.index())),
            },
        }
    }
    Ok(if dynamic {
        StyleValue::Expr(out)
    } else {
        StyleValue::Literal(out)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_splices_literal_slots() {
        let slots = vec![ResolvedSlot::Literal("red".into())];
        let value = CssValue::Interpolated(vec![
            ValuePart::Literal("1px solid ".into()),
            ValuePart::Slot(SlotRef(0)),
        ]);
        assert_eq!(
            resolve_value(&slots, &value),
            Ok(StyleValue::Literal("1px solid red".into()))
        );
    }

    #[test]
    fn resolve_keeps_bare_theme_token_path() {
        let slots = vec![ResolvedSlot::ThemeToken("colors.primary".into())];
        assert_eq!(
            resolve_value(&slots, &CssValue::slot(0)),
            Ok(StyleValue::Expr("colors.primary".into()))
        );
    }

    #[test]
    fn resolve_renders_mixed_theme_token() {
        let slots = vec![ResolvedSlot::ThemeToken("space.2".into())];
        let value = CssValue::Interpolated(vec![
            ValuePart::Slot(SlotRef(0)),
            ValuePart::Literal(" auto".into()),
        ]);
        assert_eq!(
            resolve_value(&slots, &value),
            Ok(StyleValue::Expr("${space.2} auto".into()))
        );
    }

    #[test]
    fn resolve_rejects_unknown_and_mixin_slots() {
        let slots = vec![
            ResolvedSlot::Unknown,
            ResolvedSlot::MixinRef(StyleKey::new("helper")),
        ];
        assert!(resolve_value(&slots, &CssValue::slot(0)).is_err());
        assert!(resolve_value(&slots, &CssValue::slot(1)).is_err());
    }

    #[test]
    fn expand_value_splits_literal_shorthand_only() {
        let pairs = expand_value("margin", StyleValue::Literal("8px".into()));
        assert_eq!(pairs.len(), 4);

        let kept = expand_value("margin", StyleValue::Expr("space.2".into()));
        assert_eq!(kept, vec![("margin".into(), StyleValue::Expr("space.2".into()))]);
    }
}
