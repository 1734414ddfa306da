//! Mixin pre-scanning.
//!
//! Before any rule is lowered, every declaration in the file is reduced to
//! its *contribution map*: the property values its base (unconditioned)
//! rules would contribute to a consumer, with mixins expanded at their
//! cascade position. The cascade patcher later consults these maps to
//! recover the true default a component had before an after-base mixin
//! overrode it.
//!
//! Maps are computed for every declaration, components included, because a
//! consumer's own base values and its `extends` chain take part in the same
//! recovery. Computation is memoized and cycle-guarded; a cyclic mixin
//! reference contributes nothing rather than recursing.

use indexmap::IndexMap;

use stratify_core::component::{ComponentArena, MixinPlacement, StyleKey};
use stratify_core::value::{CssValue, ResolvedSlot, ValuePart, ValueResolver};

use crate::options::LowerOptions;
use crate::shorthand;

/// The value one base declaration contributes to a consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contribution {
    /// A compile-time literal, usable as a recovered default.
    Literal(String),
    /// A dynamic value. Its presence matters to the patcher even though its
    /// content is unusable: overriding a dynamic default cannot be patched.
    Dynamic,
}

/// Property → contribution, in cascade order (later wins in place).
pub type ContributionMap = IndexMap<String, Contribution>;

/// The pre-scanned contribution maps of one file.
#[derive(Debug, Default)]
pub struct Prescan {
    /// Full maps: extends, before-base mixins, own base, after-base mixins.
    full: IndexMap<StyleKey, ContributionMap>,
    /// Base maps: like full, but stopping before after-base mixins. This is
    /// the state the patcher recovers defaults from.
    base: IndexMap<StyleKey, ContributionMap>,
}

impl Prescan {
    /// Pre-scan every declaration in the arena.
    pub fn run(arena: &ComponentArena, values: &dyn ValueResolver, options: &LowerOptions) -> Self {
        let mut scan = Self::default();
        let mut visiting = vec![];
        for decl in arena.iter() {
            scan.compute(&decl.style_key, arena, values, options, &mut visiting);
        }
        scan
    }

    /// The full contribution map for a style key, if declared in this file.
    pub fn contribution(&self, key: &StyleKey) -> Option<&ContributionMap> {
        self.full.get(key)
    }

    /// The contribution map excluding after-base mixins.
    pub fn base_contribution(&self, key: &StyleKey) -> Option<&ContributionMap> {
        self.base.get(key)
    }

    fn compute(
        &mut self,
        key: &StyleKey,
        arena: &ComponentArena,
        values: &dyn ValueResolver,
        options: &LowerOptions,
        visiting: &mut Vec<StyleKey>,
    ) {
        if self.full.contains_key(key) || visiting.contains(key) {
            return;
        }
        let Some(decl) = arena.get(key) else {
            return;
        };
        visiting.push(key.clone());

        let mut base = ContributionMap::new();

        if let Some(parent) = decl.extends.clone() {
            self.compute(&parent, arena, values, options, visiting);
            if let Some(map) = self.full.get(&parent) {
                merge(&mut base, map);
            }
        }

        let before: Vec<StyleKey> = decl
            .mixins
            .iter()
            .filter(|m| m.placement == MixinPlacement::BeforeBase)
            .map(|m| m.key.clone())
            .collect();
        for mixin in &before {
            self.compute(mixin, arena, values, options, visiting);
            if let Some(map) = self.full.get(mixin) {
                merge(&mut base, map);
            }
        }

        for rule in &decl.rules {
            if !is_base_rule(rule, options) {
                continue;
            }
            for d in &rule.declarations {
                if d.is_bare() {
                    // A bare slot resolving to a mixin expands inline at
                    // this cascade position.
                    let slots: Vec<_> = d.value.slots().collect();
                    if let [slot] = slots[..] {
                        if let ResolvedSlot::MixinRef(inner) = values.resolve(key, slot) {
                            self.compute(&inner, arena, values, options, visiting);
                            if let Some(map) = self.full.get(&inner) {
                                merge(&mut base, map);
                            }
                        }
                    }
                    continue;
                }
                // Literal shorthands expand into the same longhands the
                // merge phase produces, so patch lookups line up.
                match resolve_contribution(values, key, &d.value) {
                    Contribution::Literal(text) => {
                        match shorthand::expand(&d.property, &text) {
                            Some(pairs) => {
                                for (property, value) in pairs {
                                    base.insert(property, Contribution::Literal(value));
                                }
                            }
                            None => {
                                base.insert(d.property.clone(), Contribution::Literal(text));
                            }
                        }
                    }
                    Contribution::Dynamic => {
                        base.insert(d.property.clone(), Contribution::Dynamic);
                    }
                }
            }
        }

        let mut full = base.clone();
        let after: Vec<StyleKey> = decl
            .mixins
            .iter()
            .filter(|m| m.placement == MixinPlacement::AfterBase)
            .map(|m| m.key.clone())
            .collect();
        for mixin in &after {
            self.compute(mixin, arena, values, options, visiting);
            if let Some(map) = self.full.get(mixin) {
                merge(&mut full, map);
            }
        }

        visiting.pop();
        self.base.insert(key.clone(), base);
        self.full.insert(key.clone(), full);
    }
}

/// Whether a rule targets the bare self element outside any at-rule block.
pub(crate) fn is_base_rule(rule: &stratify_core::rule::Rule, options: &LowerOptions) -> bool {
    let selector = rule.selector.trim();
    rule.at_rules.is_empty()
        && selector.len() == options.self_token.len_utf8()
        && selector.starts_with(options.self_token)
}

fn resolve_contribution(
    values: &dyn ValueResolver,
    owner: &StyleKey,
    value: &CssValue,
) -> Contribution {
    match value {
        CssValue::Static(text) => Contribution::Literal(text.clone()),
        CssValue::Interpolated(parts) => {
            let mut out = String::new();
            for part in parts {
                match part {
                    ValuePart::Literal(text) => out.push_str(text),
                    ValuePart::Slot(slot) => match values.resolve(owner, *slot) {
                        ResolvedSlot::Literal(text) => out.push_str(&text),
                        _ => return Contribution::Dynamic,
                    },
                }
            }
            Contribution::Literal(out)
        }
    }
}

fn merge(into: &mut ContributionMap, from: &ContributionMap) {
    for (property, contribution) in from {
        into.insert(property.clone(), contribution.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratify_core::component::{ComponentDecl, MixinUse};
    use stratify_core::rule::{Declaration, Rule};
    use stratify_core::value::{NoResolvers, SelectorResolver, SlotRef};

    struct SlotTable(Vec<(&'static str, ResolvedSlot)>);

    impl ValueResolver for SlotTable {
        fn resolve(&self, component: &StyleKey, slot: SlotRef) -> ResolvedSlot {
            self.0
                .iter()
                .filter(|(name, _)| *name == component.as_str())
                .nth(slot.index())
                .map(|(_, resolved)| resolved.clone())
                .unwrap_or(ResolvedSlot::Unknown)
        }
    }

    impl SelectorResolver for SlotTable {
        fn resolve_at_rule(&self, _expr: &str) -> Option<String> {
            None
        }
    }

    fn run(arena: &ComponentArena, values: &dyn ValueResolver) -> Prescan {
        Prescan::run(arena, values, &LowerOptions::default())
    }

    #[test]
    fn static_base_contributions() {
        let mut arena = ComponentArena::new();
        arena
            .push(ComponentDecl::mixin("focusRing").with_rule(Rule::base(vec![
                Declaration::literal("outline", "2px solid blue"),
                Declaration::literal("outline-offset", "2px"),
            ])))
            .unwrap();

        let scan = run(&arena, &NoResolvers);
        let map = scan.contribution(&StyleKey::new("focusRing")).unwrap();
        assert_eq!(
            map.get("outline"),
            Some(&Contribution::Literal("2px solid blue".into()))
        );
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn conditioned_rules_do_not_contribute() {
        let mut arena = ComponentArena::new();
        arena
            .push(
                ComponentDecl::component("Button")
                    .with_rule(Rule::base(vec![Declaration::literal("color", "black")]))
                    .with_rule(Rule::on(
                        "&:hover",
                        vec![Declaration::literal("color", "blue")],
                    )),
            )
            .unwrap();

        let scan = run(&arena, &NoResolvers);
        let map = scan.contribution(&StyleKey::new("Button")).unwrap();
        assert_eq!(map.get("color"), Some(&Contribution::Literal("black".into())));
    }

    #[test]
    fn unresolvable_slot_is_dynamic() {
        let mut arena = ComponentArena::new();
        arena
            .push(
                ComponentDecl::component("Button")
                    .with_slots(1)
                    .with_rule(Rule::base(vec![Declaration::new(
                        "color",
                        CssValue::slot(0),
                    )])),
            )
            .unwrap();

        let scan = run(&arena, &NoResolvers);
        let map = scan.contribution(&StyleKey::new("Button")).unwrap();
        assert_eq!(map.get("color"), Some(&Contribution::Dynamic));
    }

    #[test]
    fn literal_slots_splice_into_literals() {
        let mut arena = ComponentArena::new();
        arena
            .push(
                ComponentDecl::component("Button")
                    .with_slots(1)
                    .with_rule(Rule::base(vec![Declaration::new(
                        "border",
                        CssValue::Interpolated(vec![
                            ValuePart::Literal("1px solid ".into()),
                            ValuePart::Slot(SlotRef(0)),
                        ]),
                    )])),
            )
            .unwrap();

        let values = SlotTable(vec![("Button", ResolvedSlot::Literal("red".into()))]);
        let scan = run(&arena, &values);
        let map = scan.contribution(&StyleKey::new("Button")).unwrap();
        // The spliced literal is a shorthand, so it lands as longhands.
        assert_eq!(map.get("border"), None);
        assert_eq!(
            map.get("border-top-color"),
            Some(&Contribution::Literal("red".into()))
        );
        assert_eq!(
            map.get("border-left-width"),
            Some(&Contribution::Literal("1px".into()))
        );
    }

    #[test]
    fn after_base_mixin_wins_in_full_map_only() {
        let mut arena = ComponentArena::new();
        arena
            .push(
                ComponentDecl::mixin("emphasis")
                    .with_rule(Rule::base(vec![Declaration::literal("color", "red")])),
            )
            .unwrap();
        arena
            .push(
                ComponentDecl::component("Button")
                    .with_rule(Rule::base(vec![Declaration::literal("color", "black")]))
                    .with_mixin(MixinUse::after_base("emphasis")),
            )
            .unwrap();

        let scan = run(&arena, &NoResolvers);
        let key = StyleKey::new("Button");
        assert_eq!(
            scan.contribution(&key).unwrap().get("color"),
            Some(&Contribution::Literal("red".into()))
        );
        assert_eq!(
            scan.base_contribution(&key).unwrap().get("color"),
            Some(&Contribution::Literal("black".into()))
        );
    }

    #[test]
    fn before_base_mixin_loses_to_own_base() {
        let mut arena = ComponentArena::new();
        arena
            .push(
                ComponentDecl::mixin("resets")
                    .with_rule(Rule::base(vec![Declaration::literal("margin-top", "0")])),
            )
            .unwrap();
        arena
            .push(
                ComponentDecl::component("Button")
                    .with_rule(Rule::base(vec![Declaration::literal("margin-top", "4px")]))
                    .with_mixin(MixinUse::before_base("resets")),
            )
            .unwrap();

        let scan = run(&arena, &NoResolvers);
        let map = scan.contribution(&StyleKey::new("Button")).unwrap();
        assert_eq!(
            map.get("margin-top"),
            Some(&Contribution::Literal("4px".into()))
        );
    }

    #[test]
    fn bare_mixin_slot_expands_inline() {
        let mut arena = ComponentArena::new();
        arena
            .push(
                ComponentDecl::mixin("focusRing")
                    .with_rule(Rule::base(vec![Declaration::literal("outline", "2px")])),
            )
            .unwrap();
        arena
            .push(
                ComponentDecl::component("Button")
                    .with_slots(1)
                    .with_rule(Rule::base(vec![
                        Declaration::literal("color", "black"),
                        Declaration::bare(CssValue::slot(0)),
                    ])),
            )
            .unwrap();

        let values = SlotTable(vec![(
            "Button",
            ResolvedSlot::MixinRef(StyleKey::new("focusRing")),
        )]);
        let scan = run(&arena, &values);
        let map = scan.contribution(&StyleKey::new("Button")).unwrap();
        assert_eq!(map.get("outline"), Some(&Contribution::Literal("2px".into())));
    }

    #[test]
    fn extends_chain_contributes_to_base() {
        let mut arena = ComponentArena::new();
        arena
            .push(
                ComponentDecl::component("Base")
                    .with_rule(Rule::base(vec![Declaration::literal("padding", "8px")])),
            )
            .unwrap();
        arena
            .push(
                ComponentDecl::component("Fancy")
                    .with_extends("Base")
                    .with_rule(Rule::base(vec![Declaration::literal("color", "blue")])),
            )
            .unwrap();

        let scan = run(&arena, &NoResolvers);
        let map = scan.base_contribution(&StyleKey::new("Fancy")).unwrap();
        assert_eq!(map.get("padding"), Some(&Contribution::Literal("8px".into())));
        assert_eq!(map.get("color"), Some(&Contribution::Literal("blue".into())));
    }

    #[test]
    fn literal_shorthands_expand_into_longhands() {
        let mut arena = ComponentArena::new();
        arena
            .push(
                ComponentDecl::component("Button")
                    .with_rule(Rule::base(vec![Declaration::literal("outline", "none")])),
            )
            .unwrap();

        let scan = run(&arena, &NoResolvers);
        let map = scan.contribution(&StyleKey::new("Button")).unwrap();
        assert_eq!(
            map.get("outline-style"),
            Some(&Contribution::Literal("none".into()))
        );
        assert!(map.get("outline").is_none());
    }

    #[test]
    fn cyclic_mixins_terminate() {
        let mut arena = ComponentArena::new();
        arena
            .push(
                ComponentDecl::mixin("a")
                    .with_rule(Rule::base(vec![Declaration::literal("color", "red")]))
                    .with_mixin(MixinUse::after_base("b")),
            )
            .unwrap();
        arena
            .push(
                ComponentDecl::mixin("b")
                    .with_rule(Rule::base(vec![Declaration::literal("color", "blue")]))
                    .with_mixin(MixinUse::after_base("a")),
            )
            .unwrap();

        let scan = run(&arena, &NoResolvers);
        assert!(scan.contribution(&StyleKey::new("a")).is_some());
        assert!(scan.contribution(&StyleKey::new("b")).is_some());
    }
}
