//! Cascade patching for after-base mixins.
//!
//! A mixin applied after a component's own base rules may set a property
//! only under a condition (e.g. a `:hover` color with no base color). In
//! the source cascade the unconditioned value falls through to the
//! consumer's base; a deduplicated atomic output has no such fall-through,
//! so the consumer's true default must be recovered and written into a
//! consumer-scoped copy of the mixin's style object.
//!
//! Recovery consults the pre-scanned contribution maps: the consumer's
//! `extends` chain, before-base mixins, and own base declarations, in
//! cascade order. A literal recovered default is patched in with an
//! advisory; a dynamic one aborts the file, since no static default can be
//! proven.

use stratify_core::component::{ComponentArena, MixinPlacement, StyleKey};
use stratify_core::warning::{Warning, WarningKind};

use crate::output::{MixinPatch, StyleValue};
use crate::prescan::{Contribution, Prescan};
use crate::run::RunState;

/// Patch every after-base mixin use in the file.
pub fn patch_cascades(arena: &ComponentArena, scan: &Prescan, run: &mut RunState) {
    for decl in arena.iter() {
        for mixin_use in &decl.mixins {
            if run.is_aborted() {
                return;
            }
            if mixin_use.placement != MixinPlacement::AfterBase {
                continue;
            }
            patch_one(arena, scan, run, &decl.style_key, &mixin_use.key);
        }
    }
    prune_inlined_mixins(arena, run);
}

fn patch_one(
    arena: &ComponentArena,
    scan: &Prescan,
    run: &mut RunState,
    component: &StyleKey,
    mixin: &StyleKey,
) {
    let Some(mixin_decl) = arena.get(mixin) else {
        run.abort(
            Warning::error(
                WarningKind::UnknownMixin,
                format!("mixin '{}' is not declared in this file", mixin),
            )
            .with_style_key(component.as_str()),
        );
        return;
    };
    if !mixin_decl.is_mixin {
        run.abort(
            Warning::error(
                WarningKind::UnknownMixin,
                format!("style key '{}' is mixed in but is not a mixin", mixin),
            )
            .with_style_key(component.as_str()),
        );
        return;
    }

    let Some(mut patched) = run.style(mixin).cloned() else {
        return;
    };
    let base = scan.base_contribution(component);

    let mut changed = false;
    for (property, entry) in patched.properties.iter_mut() {
        // Only conditioned-only properties lost their fall-through.
        if entry.default.is_some() || entry.variants.is_empty() {
            continue;
        }
        match base.and_then(|map| map.get(property.as_str())) {
            Some(Contribution::Literal(text)) => {
                entry.default = Some(StyleValue::Literal(text.clone()));
                changed = true;
                run.warn(
                    Warning::advisory(
                        WarningKind::InferredStaticDefault,
                        format!(
                            "default for '{}' recovered from the base of '{}'",
                            property, component
                        ),
                    )
                    .with_property(property.as_str())
                    .with_style_key(mixin.as_str()),
                );
            }
            Some(Contribution::Dynamic) => {
                run.abort(
                    Warning::error(
                        WarningKind::DynamicBase,
                        format!(
                            "mixin '{}' conditions '{}' over a dynamic base value",
                            mixin, property
                        ),
                    )
                    .with_property(property.as_str())
                    .with_style_key(component.as_str()),
                );
                return;
            }
            // No base value anywhere: the property genuinely had no
            // unconditioned state, nothing to recover.
            None => {}
        }
    }

    if changed {
        let derived = run.derive_key(mixin, component);
        run.replace_style(&derived, patched);
        run.patches.push(MixinPatch {
            mixin: mixin.clone(),
            component: component.clone(),
            derived,
        });
    }
}

/// Drop mixin style objects whose contribution is fully inlined or
/// replaced and that nothing external can reach.
fn prune_inlined_mixins(arena: &ComponentArena, run: &mut RunState) {
    if run.is_aborted() {
        return;
    }

    let mut referenced: Vec<StyleKey> = vec![];
    for decl in arena.iter() {
        if let Some(parent) = &decl.extends {
            referenced.push(parent.clone());
        }
        for mixin_use in &decl.mixins {
            let replaced = run
                .patches
                .iter()
                .any(|p| p.mixin == mixin_use.key && p.component == decl.style_key);
            if !replaced {
                referenced.push(mixin_use.key.clone());
            }
        }
    }

    for decl in arena.iter().filter(|d| d.is_mixin) {
        if decl.is_exported || decl.bridge.is_some() {
            continue;
        }
        if referenced.contains(&decl.style_key) {
            continue;
        }
        if run.has_style(&decl.style_key) {
            tracing::debug!(
                target: "stratify_lower",
                mixin = %decl.style_key,
                "pruning fully inlined mixin"
            );
            run.remove_style(&decl.style_key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratify_core::component::{ComponentDecl, MixinUse};
    use stratify_core::condition::Condition;
    use stratify_core::rule::{Declaration, Rule};
    use stratify_core::value::NoResolvers;

    use crate::options::LowerOptions;
    use crate::output::StyleCondition;

    fn hover_variant(run: &mut RunState, key: &StyleKey, property: &str, value: &str) {
        let style = run.style_mut(key).unwrap();
        style.entry(property).upsert_variant(
            StyleCondition::same_element(&Condition::pseudo(":hover")),
            StyleValue::Literal(value.into()),
        );
    }

    fn set_default(run: &mut RunState, key: &StyleKey, property: &str, value: &str) {
        let style = run.style_mut(key).unwrap();
        style.entry(property).default = Some(StyleValue::Literal(value.into()));
    }

    #[test]
    fn recovers_literal_default_under_derived_key() {
        let mut arena = ComponentArena::new();
        arena
            .push(
                ComponentDecl::mixin("emphasis")
                    .with_rule(Rule::on("&:hover", vec![Declaration::literal("color", "red")])),
            )
            .unwrap();
        arena
            .push(
                ComponentDecl::component("Button")
                    .with_rule(Rule::base(vec![Declaration::literal("color", "black")]))
                    .with_mixin(MixinUse::after_base("emphasis")),
            )
            .unwrap();

        let scan = Prescan::run(&arena, &NoResolvers, &LowerOptions::default());
        let mut run = RunState::new();
        let mixin = StyleKey::new("emphasis");
        hover_variant(&mut run, &mixin, "color", "red");
        set_default(&mut run, &StyleKey::new("Button"), "color", "black");

        patch_cascades(&arena, &scan, &mut run);

        assert!(!run.is_aborted());
        assert_eq!(run.patches.len(), 1);
        let derived = run.patches[0].derived.clone();
        assert_eq!(derived.as_str(), "emphasis_Button");
        let patched = run.style(&derived).unwrap();
        assert_eq!(
            patched.get("color").unwrap().default,
            Some(StyleValue::Literal("black".into()))
        );
        // Original mixin style is untouched.
        assert_eq!(run.style(&mixin).unwrap().get("color").unwrap().default, None);
    }

    #[test]
    fn dynamic_base_aborts() {
        let mut arena = ComponentArena::new();
        arena
            .push(
                ComponentDecl::mixin("emphasis")
                    .with_rule(Rule::on("&:hover", vec![Declaration::literal("color", "red")])),
            )
            .unwrap();
        arena
            .push(
                ComponentDecl::component("Button")
                    .with_slots(1)
                    .with_rule(Rule::base(vec![Declaration::new(
                        "color",
                        stratify_core::value::CssValue::slot(0),
                    )]))
                    .with_mixin(MixinUse::after_base("emphasis")),
            )
            .unwrap();

        // NoResolvers leaves the slot unknown, making the base dynamic.
        let scan = Prescan::run(&arena, &NoResolvers, &LowerOptions::default());
        let mut run = RunState::new();
        hover_variant(&mut run, &StyleKey::new("emphasis"), "color", "red");

        patch_cascades(&arena, &scan, &mut run);

        assert!(run.is_aborted());
        let outcome = run.into_outcome();
        assert!(outcome
            .warnings()
            .iter()
            .any(|w| w.kind == WarningKind::DynamicBase && w.is_fatal()));
    }

    #[test]
    fn unknown_mixin_aborts() {
        let mut arena = ComponentArena::new();
        arena
            .push(
                ComponentDecl::component("Button")
                    .with_mixin(MixinUse::after_base("missing")),
            )
            .unwrap();

        let scan = Prescan::run(&arena, &NoResolvers, &LowerOptions::default());
        let mut run = RunState::new();
        patch_cascades(&arena, &scan, &mut run);

        assert!(run.is_aborted());
    }

    #[test]
    fn no_conditioned_only_properties_means_no_patch() {
        let mut arena = ComponentArena::new();
        arena
            .push(
                ComponentDecl::mixin("resets")
                    .with_rule(Rule::base(vec![Declaration::literal("margin", "0")])),
            )
            .unwrap();
        arena
            .push(
                ComponentDecl::component("Button")
                    .with_mixin(MixinUse::after_base("resets")),
            )
            .unwrap();

        let scan = Prescan::run(&arena, &NoResolvers, &LowerOptions::default());
        let mut run = RunState::new();
        set_default(&mut run, &StyleKey::new("resets"), "margin", "0");

        patch_cascades(&arena, &scan, &mut run);

        assert!(!run.is_aborted());
        assert!(run.patches.is_empty());
    }

    #[test]
    fn unreferenced_inlined_mixin_is_pruned() {
        let mut arena = ComponentArena::new();
        arena
            .push(
                ComponentDecl::mixin("helper")
                    .with_rule(Rule::base(vec![Declaration::literal("margin", "0")])),
            )
            .unwrap();
        arena.push(ComponentDecl::component("Button")).unwrap();

        let scan = Prescan::run(&arena, &NoResolvers, &LowerOptions::default());
        let mut run = RunState::new();
        set_default(&mut run, &StyleKey::new("helper"), "margin", "0");

        patch_cascades(&arena, &scan, &mut run);

        assert!(!run.has_style(&StyleKey::new("helper")));
    }

    #[test]
    fn exported_mixin_survives_pruning() {
        let mut arena = ComponentArena::new();
        arena
            .push(
                ComponentDecl::mixin("helper")
                    .exported()
                    .with_rule(Rule::base(vec![Declaration::literal("margin", "0")])),
            )
            .unwrap();

        let scan = Prescan::run(&arena, &NoResolvers, &LowerOptions::default());
        let mut run = RunState::new();
        set_default(&mut run, &StyleKey::new("helper"), "margin", "0");

        patch_cascades(&arena, &scan, &mut run);

        assert!(run.has_style(&StyleKey::new("helper")));
    }
}
