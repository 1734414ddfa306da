//! Relation classification.
//!
//! Each rule's raw selector text and at-rule stack is classified into one
//! of: same-element condition, ancestor-relation, sibling-relation,
//! descendant-component reference, or unsupported. Classification is a pure
//! function of (selector text, at-rule stack, known component names), so
//! re-classifying an already-classified rule always yields the same answer.
//!
//! Selector text is tokenized with `cssparser`; the recognized shapes are
//! matched on token segments, never on raw substrings.

use cssparser::{ParseError as CssParseError, Parser, ParserInput, ToCss, Token};

use stratify_core::component::{ComponentArena, StyleKey};
use stratify_core::condition::{Condition, RelationKind};
use stratify_core::rule::Rule;
use stratify_core::value::SelectorResolver;

use crate::options::LowerOptions;

/// The classification of one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleClass {
    /// A pseudo/at-rule condition on the component's own element.
    SameElement(Condition),
    /// The named component is an ancestor whose pseudo state gates the
    /// emitting component's style.
    Ancestor {
        /// The ancestor component.
        ancestor: StyleKey,
        /// The gating pseudo chain (e.g. `":hover"`).
        pseudo: String,
    },
    /// The style is gated by a preceding sibling.
    Sibling {
        /// Strictly the immediately preceding sibling, or any earlier one.
        kind: RelationKind,
        /// Optional class/attribute guard on the preceding sibling.
        guard: Option<String>,
    },
    /// The rule's declarations target another component nested below this
    /// one; they are routed to the referenced component's style key.
    DescendantRef {
        /// The referenced component.
        target: StyleKey,
    },
    /// A selector shape the engine cannot translate without changing
    /// behavior; forces a file-level abort.
    Unsupported {
        /// Human-readable reason.
        reason: String,
    },
}

/// One recognized token segment of a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Seg {
    SelfTok,
    Pseudo(String),
    Name(String),
    Class(String),
    Guard(String),
    Comb(char),
    Space,
    Comma,
    Universal,
}

/// Classify one rule against the components known in this file.
pub fn classify_rule(
    rule: &Rule,
    arena: &ComponentArena,
    resolver: &dyn SelectorResolver,
    options: &LowerOptions,
) -> RuleClass {
    let at_rule = compose_at_rules(&rule.at_rules, resolver);

    let selector = rule.selector.trim();
    let segs = match scan_segments(selector, options.self_token) {
        Ok(segs) => segs,
        Err(()) => {
            return RuleClass::Unsupported {
                reason: "unparseable selector".to_string(),
            };
        }
    };

    let groups = split_groups(segs);

    if groups.len() > 1 {
        // Comma groups are supported only when every branch is a pure
        // pseudo chain on the self token.
        let mut chains = vec![];
        for group in &groups {
            match pure_pseudo_chain(group) {
                Some(chain) if !chain.is_empty() => chains.push(chain),
                _ => {
                    return RuleClass::Unsupported {
                        reason: "comma group mixing pseudo and non-pseudo selectors".to_string(),
                    };
                }
            }
        }
        return RuleClass::SameElement(with_at_rule(
            Condition::pseudo(chains.join(", ")),
            at_rule,
        ));
    }

    let group = groups.into_iter().next().unwrap_or_default();
    classify_single(&group, arena, at_rule)
}

fn classify_single(group: &[Seg], arena: &ComponentArena, at_rule: Option<String>) -> RuleClass {
    if group.iter().any(|seg| *seg == Seg::Universal) {
        return RuleClass::Unsupported {
            reason: "universal selector".to_string(),
        };
    }

    // Bare self selector (or empty selector inside an at-rule block).
    if group.is_empty() || group == [Seg::SelfTok] {
        return RuleClass::SameElement(with_at_rule(Condition::base(), at_rule));
    }

    // "&:hover", "&::before", "&:hover:focus"
    if let Some(chain) = pure_pseudo_chain(group) {
        if !chain.is_empty() {
            return RuleClass::SameElement(with_at_rule(Condition::pseudo(chain), at_rule));
        }
    }

    // "Card:hover &", an ancestor relation.
    if let Some((name, pseudo)) = ancestor_shape(group) {
        return match arena.get_named(&name) {
            Some(decl) => RuleClass::Ancestor {
                ancestor: decl.style_key.clone(),
                pseudo,
            },
            None => RuleClass::Unsupported {
                reason: format!("component '{}' not found in this file", name),
            },
        };
    }

    // "& + &" or "&[data-open] ~ &", a sibling relation.
    if let Some((kind, guard)) = sibling_shape(group) {
        return RuleClass::Sibling { kind, guard };
    }

    // "& Icon" or a bare "Icon" nested under the component.
    if let Some(name) = descendant_shape(group) {
        return match arena.get_named(&name) {
            Some(decl) => RuleClass::DescendantRef {
                target: decl.style_key.clone(),
            },
            None => RuleClass::Unsupported {
                reason: format!("component '{}' not found in this file", name),
            },
        };
    }

    RuleClass::Unsupported {
        reason: unsupported_reason(group),
    }
}

/// `[SelfTok, Pseudo+]` → the joined pseudo chain.
fn pure_pseudo_chain(group: &[Seg]) -> Option<String> {
    let mut segs = group.iter();
    if segs.next() != Some(&Seg::SelfTok) {
        return None;
    }
    let mut chain = String::new();
    for seg in segs {
        match seg {
            Seg::Pseudo(text) => chain.push_str(text),
            _ => return None,
        }
    }
    Some(chain)
}

/// `[Name, Pseudo+, Space, SelfTok]` → (name, pseudo chain).
fn ancestor_shape(group: &[Seg]) -> Option<(String, String)> {
    let mut segs = group.iter().peekable();
    let name = match segs.next() {
        Some(Seg::Name(name)) => name.clone(),
        _ => return None,
    };
    let mut pseudo = String::new();
    while let Some(Seg::Pseudo(text)) = segs.peek() {
        pseudo.push_str(text);
        segs.next();
    }
    if pseudo.is_empty() {
        return None;
    }
    if segs.next() != Some(&Seg::Space) || segs.next() != Some(&Seg::SelfTok) {
        return None;
    }
    if segs.next().is_some() {
        return None;
    }
    Some((name, pseudo))
}

/// `[SelfTok, guard?, Comb(+|~), SelfTok]` → (kind, guard).
fn sibling_shape(group: &[Seg]) -> Option<(RelationKind, Option<String>)> {
    let mut segs = group.iter().filter(|seg| **seg != Seg::Space).peekable();
    if segs.next() != Some(&Seg::SelfTok) {
        return None;
    }
    let mut guard = String::new();
    loop {
        match segs.peek() {
            Some(Seg::Class(name)) => {
                guard.push('.');
                guard.push_str(name);
                segs.next();
            }
            Some(Seg::Guard(text)) => {
                guard.push_str(text);
                segs.next();
            }
            _ => break,
        }
    }
    let kind = match segs.next() {
        Some(Seg::Comb('+')) => RelationKind::AdjacentSibling,
        Some(Seg::Comb('~')) => RelationKind::AnySibling,
        _ => return None,
    };
    if segs.next() != Some(&Seg::SelfTok) || segs.next().is_some() {
        return None;
    }
    let guard = if guard.is_empty() { None } else { Some(guard) };
    Some((kind, guard))
}

/// `[SelfTok, Space, Name]` or `[Name]` → the referenced component name.
fn descendant_shape(group: &[Seg]) -> Option<String> {
    match group {
        [Seg::SelfTok, Seg::Space, Seg::Name(name)] => Some(name.clone()),
        [Seg::Name(name)] => Some(name.clone()),
        _ => None,
    }
}

fn unsupported_reason(group: &[Seg]) -> String {
    let names = group
        .iter()
        .filter(|seg| matches!(seg, Seg::Name(_)))
        .count();
    let spaces = group.iter().filter(|seg| **seg == Seg::Space).count();
    if names >= 2 || spaces >= 2 {
        return "multi-level descendant chain".to_string();
    }
    if group.iter().any(|seg| matches!(seg, Seg::Class(_)))
        && group.iter().any(|seg| matches!(seg, Seg::Pseudo(_)))
    {
        return "compound class and pseudo selector".to_string();
    }
    if group.iter().any(|seg| matches!(seg, Seg::Class(_))) {
        return "compound class selector".to_string();
    }
    "selector shape not supported".to_string()
}

fn with_at_rule(condition: Condition, at_rule: Option<String>) -> Condition {
    match at_rule {
        Some(at_rule) => condition.in_at_rule(at_rule),
        None => condition,
    }
}

/// Compose the at-rule stack into one condition string, mapping helper
/// expressions (e.g. named breakpoints) through the selector resolver.
pub(crate) fn compose_at_rules(
    at_rules: &[String],
    resolver: &dyn SelectorResolver,
) -> Option<String> {
    if at_rules.is_empty() {
        return None;
    }
    let composed = at_rules
        .iter()
        .map(|raw| resolver.resolve_at_rule(raw).unwrap_or_else(|| raw.clone()))
        .collect::<Vec<_>>()
        .join(" ");
    Some(composed)
}

fn split_groups(segs: Vec<Seg>) -> Vec<Vec<Seg>> {
    let mut groups = vec![];
    let mut current = vec![];
    for seg in segs {
        if seg == Seg::Comma {
            groups.push(std::mem::take(&mut current));
        } else {
            current.push(seg);
        }
    }
    groups.push(current);
    for group in &mut groups {
        while group.first() == Some(&Seg::Space) {
            group.remove(0);
        }
        while group.last() == Some(&Seg::Space) {
            group.pop();
        }
    }
    groups
}

/// Tokenize selector text into segments.
fn scan_segments(selector: &str, self_token: char) -> Result<Vec<Seg>, ()> {
    let mut input = ParserInput::new(selector);
    let mut parser = Parser::new(&mut input);
    let mut segs = vec![];

    loop {
        let token = match parser.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match token {
            Token::Delim(c) if c == self_token => segs.push(Seg::SelfTok),
            Token::Delim('*') => segs.push(Seg::Universal),
            Token::Delim(c @ ('+' | '~' | '>')) => segs.push(Seg::Comb(c)),
            Token::Delim('.') => match parser.next_including_whitespace() {
                Ok(Token::Ident(name)) => segs.push(Seg::Class(name.to_string())),
                _ => return Err(()),
            },
            Token::WhiteSpace(_) => segs.push(Seg::Space),
            Token::Comma => segs.push(Seg::Comma),
            Token::Ident(name) => segs.push(Seg::Name(name.to_string())),
            Token::Colon => segs.push(Seg::Pseudo(scan_pseudo(&mut parser)?)),
            Token::SquareBracketBlock => {
                let inner = serialize_nested(&mut parser).map_err(|_| ())?;
                segs.push(Seg::Guard(format!("[{}]", inner)));
            }
            _ => return Err(()),
        }
    }

    Ok(segs)
}

/// Scan the remainder of a pseudo after its leading colon.
fn scan_pseudo(parser: &mut Parser<'_, '_>) -> Result<String, ()> {
    let mut text = String::from(":");
    let mut token = match parser.next_including_whitespace() {
        Ok(token) => token.clone(),
        Err(_) => return Err(()),
    };
    if token == Token::Colon {
        text.push(':');
        token = match parser.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => return Err(()),
        };
    }
    match token {
        Token::Ident(name) => text.push_str(&name),
        Token::Function(name) => {
            text.push_str(&name);
            text.push('(');
            let args = serialize_nested(parser).map_err(|_| ())?;
            text.push_str(&args);
            text.push(')');
        }
        _ => return Err(()),
    }
    Ok(text)
}

/// Re-serialize the contents of the block whose opening token was just
/// consumed.
fn serialize_nested<'i>(parser: &mut Parser<'i, '_>) -> Result<String, CssParseError<'i, ()>> {
    parser.parse_nested_block(|block| {
        let mut out = String::new();
        serialize_tokens(block, &mut out)?;
        Ok(out)
    })
}

fn serialize_tokens<'i>(
    parser: &mut Parser<'i, '_>,
    out: &mut String,
) -> Result<(), CssParseError<'i, ()>> {
    loop {
        let token = match parser.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => return Ok(()),
        };
        match token {
            Token::Function(name) => {
                out.push_str(&name);
                out.push('(');
                let inner = serialize_nested(parser)?;
                out.push_str(&inner);
                out.push(')');
            }
            Token::ParenthesisBlock => {
                out.push('(');
                let inner = serialize_nested(parser)?;
                out.push_str(&inner);
                out.push(')');
            }
            Token::SquareBracketBlock => {
                out.push('[');
                let inner = serialize_nested(parser)?;
                out.push_str(&inner);
                out.push(']');
            }
            Token::CurlyBracketBlock => {
                out.push('{');
                let inner = serialize_nested(parser)?;
                out.push_str(&inner);
                out.push('}');
            }
            other => out.push_str(&other.to_css_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratify_core::component::ComponentDecl;
    use stratify_core::value::NoResolvers;

    fn arena_with(names: &[&str]) -> ComponentArena {
        let mut arena = ComponentArena::new();
        for name in names {
            arena.push(ComponentDecl::component(*name)).unwrap();
        }
        arena
    }

    fn classify(selector: &str, arena: &ComponentArena) -> RuleClass {
        let rule = Rule::on(selector, vec![]);
        classify_rule(&rule, arena, &NoResolvers, &LowerOptions::default())
    }

    #[test]
    fn bare_self_is_base_condition() {
        let arena = arena_with(&["Button"]);
        let class = classify("&", &arena);
        assert_eq!(class, RuleClass::SameElement(Condition::base()));
    }

    #[test]
    fn pseudo_chain_is_same_element() {
        let arena = arena_with(&["Button"]);
        assert_eq!(
            classify("&:hover", &arena),
            RuleClass::SameElement(Condition::pseudo(":hover"))
        );
        assert_eq!(
            classify("&:hover:focus", &arena),
            RuleClass::SameElement(Condition::pseudo(":hover:focus"))
        );
        assert_eq!(
            classify("&::before", &arena),
            RuleClass::SameElement(Condition::pseudo("::before"))
        );
    }

    #[test]
    fn functional_pseudo_keeps_arguments() {
        let arena = arena_with(&["Button"]);
        assert_eq!(
            classify("&:nth-child(2n+1)", &arena),
            RuleClass::SameElement(Condition::pseudo(":nth-child(2n+1)"))
        );
    }

    #[test]
    fn comma_grouped_pseudo_chains_are_supported() {
        let arena = arena_with(&["Button"]);
        assert_eq!(
            classify("&:hover, &:focus", &arena),
            RuleClass::SameElement(Condition::pseudo(":hover, :focus"))
        );
    }

    #[test]
    fn comma_group_with_class_branch_is_unsupported() {
        let arena = arena_with(&["Button"]);
        let class = classify("&.active, &[aria-selected=\"true\"]", &arena);
        assert!(matches!(class, RuleClass::Unsupported { .. }));
    }

    #[test]
    fn ancestor_relation() {
        let arena = arena_with(&["Button", "Card"]);
        assert_eq!(
            classify("Card:hover &", &arena),
            RuleClass::Ancestor {
                ancestor: StyleKey::new("Card"),
                pseudo: ":hover".to_string(),
            }
        );
    }

    #[test]
    fn ancestor_without_pseudo_is_unsupported() {
        let arena = arena_with(&["Button", "Card"]);
        assert!(matches!(
            classify("Card &", &arena),
            RuleClass::Unsupported { .. }
        ));
    }

    #[test]
    fn unknown_ancestor_component_is_unsupported() {
        let arena = arena_with(&["Button"]);
        let class = classify("Card:hover &", &arena);
        match class {
            RuleClass::Unsupported { reason } => assert!(reason.contains("Card")),
            other => panic!("expected unsupported, got {:?}", other),
        }
    }

    #[test]
    fn adjacent_sibling_relation() {
        let arena = arena_with(&["Item"]);
        assert_eq!(
            classify("& + &", &arena),
            RuleClass::Sibling {
                kind: RelationKind::AdjacentSibling,
                guard: None,
            }
        );
    }

    #[test]
    fn general_sibling_with_guard() {
        let arena = arena_with(&["Item"]);
        assert_eq!(
            classify("&[data-open] ~ &", &arena),
            RuleClass::Sibling {
                kind: RelationKind::AnySibling,
                guard: Some("[data-open]".to_string()),
            }
        );
    }

    #[test]
    fn descendant_component_reference() {
        let arena = arena_with(&["Button", "Icon"]);
        assert_eq!(
            classify("& Icon", &arena),
            RuleClass::DescendantRef {
                target: StyleKey::new("Icon"),
            }
        );
        assert_eq!(
            classify("Icon", &arena),
            RuleClass::DescendantRef {
                target: StyleKey::new("Icon"),
            }
        );
    }

    #[test]
    fn universal_selector_is_unsupported() {
        let arena = arena_with(&["Button"]);
        assert!(matches!(
            classify("& *", &arena),
            RuleClass::Unsupported { .. }
        ));
    }

    #[test]
    fn compound_class_is_unsupported() {
        let arena = arena_with(&["Button"]);
        assert!(matches!(
            classify("&.active", &arena),
            RuleClass::Unsupported { .. }
        ));
    }

    #[test]
    fn multi_level_chain_is_unsupported() {
        let arena = arena_with(&["Button", "Card", "Icon"]);
        match classify("Card Icon &", &arena) {
            RuleClass::Unsupported { reason } => {
                assert_eq!(reason, "multi-level descendant chain");
            }
            other => panic!("expected unsupported, got {:?}", other),
        }
    }

    #[test]
    fn classification_is_idempotent() {
        let arena = arena_with(&["Button", "Card"]);
        let first = classify("Card:hover &", &arena);
        let second = classify("Card:hover &", &arena);
        assert_eq!(first, second);
    }

    #[test]
    fn at_rules_compose_into_condition() {
        let arena = arena_with(&["Button"]);
        let rule = Rule::in_at_rule("@media (min-width: 600px)", "&:hover", vec![]);
        let class = classify_rule(&rule, &arena, &NoResolvers, &LowerOptions::default());
        assert_eq!(
            class,
            RuleClass::SameElement(
                Condition::pseudo(":hover").in_at_rule("@media (min-width: 600px)")
            )
        );
    }
}
