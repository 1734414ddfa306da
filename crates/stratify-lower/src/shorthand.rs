//! Shorthand property expansion.
//!
//! Atomic-style outputs deduplicate per longhand property, so static
//! shorthands are expanded into their longhands at merge time. Only fully
//! literal values are expanded; a shorthand carrying a dynamic slot is kept
//! whole, since splitting an opaque expression is not possible.

/// Expand a shorthand (property, literal value) into longhand pairs.
///
/// Returns `None` when the property is not a recognized shorthand or the
/// value does not parse into the expected token shape; the caller then
/// keeps the declaration as-is.
pub fn expand(property: &str, value: &str) -> Option<Vec<(String, String)>> {
    match property {
        "margin" | "padding" | "inset" => expand_box(property, value),
        "border" | "outline" => expand_edge(property, value),
        "border-width" | "border-style" | "border-color" => expand_border_sides(property, value),
        "gap" => expand_pair(value, "row-gap", "column-gap"),
        "overflow" => expand_pair(value, "overflow-x", "overflow-y"),
        _ => None,
    }
}

/// 1-to-4-value box expansion, top/right/bottom/left.
fn expand_box(property: &str, value: &str) -> Option<Vec<(String, String)>> {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    let (top, right, bottom, left) = match tokens[..] {
        [all] => (all, all, all, all),
        [vertical, horizontal] => (vertical, horizontal, vertical, horizontal),
        [top, horizontal, bottom] => (top, horizontal, bottom, horizontal),
        [top, right, bottom, left] => (top, right, bottom, left),
        _ => return None,
    };
    let name = |side: &str| {
        if property == "inset" {
            side.to_string()
        } else {
            format!("{}-{}", property, side)
        }
    };
    Some(vec![
        (name("top"), top.to_string()),
        (name("right"), right.to_string()),
        (name("bottom"), bottom.to_string()),
        (name("left"), left.to_string()),
    ])
}

/// `border` / `outline` into `-width`, `-style`, `-color`.
fn expand_edge(property: &str, value: &str) -> Option<Vec<(String, String)>> {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    if tokens.is_empty() || tokens.len() > 3 {
        return None;
    }

    let mut width = None;
    let mut style = None;
    let mut color = None;
    for token in tokens {
        if is_edge_style(token) {
            if style.replace(token).is_some() {
                return None;
            }
        } else if is_edge_width(token) {
            if width.replace(token).is_some() {
                return None;
            }
        } else if color.replace(token).is_some() {
            return None;
        }
    }

    let mut out = vec![];
    if let Some(width) = width {
        out.push((format!("{}-width", property), width.to_string()));
    }
    if let Some(style) = style {
        out.push((format!("{}-style", property), style.to_string()));
    }
    if let Some(color) = color {
        out.push((format!("{}-color", property), color.to_string()));
    }

    // border-width/style/color are themselves per-side shorthands; expand
    // all the way down so every path lands on the same longhands.
    let mut flat = Vec::with_capacity(out.len());
    for (p, v) in out {
        match expand(&p, &v) {
            Some(mut pairs) => flat.append(&mut pairs),
            None => flat.push((p, v)),
        }
    }
    Some(flat)
}

/// 1-to-4-value side expansion for `border-width`, `border-style` and
/// `border-color`, top/right/bottom/left.
fn expand_border_sides(property: &str, value: &str) -> Option<Vec<(String, String)>> {
    let suffix = property.strip_prefix("border-")?;
    let tokens: Vec<&str> = value.split_whitespace().collect();
    let (top, right, bottom, left) = match tokens[..] {
        [all] => (all, all, all, all),
        [vertical, horizontal] => (vertical, horizontal, vertical, horizontal),
        [top, horizontal, bottom] => (top, horizontal, bottom, horizontal),
        [top, right, bottom, left] => (top, right, bottom, left),
        _ => return None,
    };
    Some(vec![
        (format!("border-top-{}", suffix), top.to_string()),
        (format!("border-right-{}", suffix), right.to_string()),
        (format!("border-bottom-{}", suffix), bottom.to_string()),
        (format!("border-left-{}", suffix), left.to_string()),
    ])
}

fn expand_pair(value: &str, first: &str, second: &str) -> Option<Vec<(String, String)>> {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    let (a, b) = match tokens[..] {
        [all] => (all, all),
        [a, b] => (a, b),
        _ => return None,
    };
    Some(vec![
        (first.to_string(), a.to_string()),
        (second.to_string(), b.to_string()),
    ])
}

fn is_edge_style(token: &str) -> bool {
    matches!(
        token,
        "none"
            | "hidden"
            | "dotted"
            | "dashed"
            | "solid"
            | "double"
            | "groove"
            | "ridge"
            | "inset"
            | "outset"
            | "auto"
    )
}

fn is_edge_width(token: &str) -> bool {
    matches!(token, "thin" | "medium" | "thick")
        || token.starts_with(|c: char| c.is_ascii_digit() || c == '.')
}
