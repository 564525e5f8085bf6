use std::collections::HashSet;

use crate::extraction::{ExtractionUnit, UnitContext, UnitId};
use crate::parsers::html::utils::is_raw_text_element;
use crate::parsers::html::{serialize_document, NodeId, Tree};
use crate::parsers::js::escape_for_literal;
use crate::utils::{collapse_whitespace, normalize_nbsp};

/// Applies edited units to a clone of `tree` and serializes it
///
/// Returns the document and the number of edits written.
pub fn reinject_html(
    tree: &Tree,
    units: &[&ExtractionUnit],
    skipped: &mut Vec<UnitId>,
) -> (String, usize) {
    let mut tree = tree.clone();
    let mut written: HashSet<NodeId> = HashSet::new();
    let mut applied = 0;

    let mut literals = Vec::new();
    for unit in units.iter().filter(|u| u.is_edited()) {
        let ok = match &unit.context {
            UnitContext::HtmlText {
                node,
                prefix,
                suffix,
            } => write_text(&mut tree, *node, unit, prefix, suffix, &mut written),
            UnitContext::HtmlAttribute { offset, .. } => {
                literals.push((*offset, *unit));
                continue;
            }
            _ => false,
        };
        tally(ok, unit, &mut applied, skipped);
    }

    // Last literal first, so earlier offsets in the same attribute stay valid
    literals.sort_by(|a, b| b.0.cmp(&a.0));
    for (_, unit) in literals {
        let ok = match &unit.context {
            UnitContext::HtmlAttribute {
                node,
                attr_name,
                raw_literal,
                offset,
                quote,
            } => write_literal(
                &mut tree,
                *node,
                attr_name,
                raw_literal,
                *offset,
                *quote,
                &unit.current,
            ),
            _ => false,
        };
        tally(ok, unit, &mut applied, skipped);
    }

    normalize_text_nodes(&mut tree);
    (serialize_document(&tree), applied)
}

fn tally(ok: bool, unit: &ExtractionUnit, applied: &mut usize, skipped: &mut Vec<UnitId>) {
    if ok {
        *applied += 1;
    } else {
        skipped.push(unit.id.clone());
    }
}

/// Whether `node` is a text node that still holds `original`
fn holds_original(tree: &Tree, node: NodeId, original: &str) -> bool {
    tree.text(node)
        .is_some_and(|text| collapse_whitespace(text) == original)
}

/// Writes `prefix + current + suffix` into the unit's text node
///
/// When the recorded node no longer holds the original text, the first
/// not yet written sibling that does is used instead.
fn write_text(
    tree: &mut Tree,
    node: NodeId,
    unit: &ExtractionUnit,
    prefix: &str,
    suffix: &str,
    written: &mut HashSet<NodeId>,
) -> bool {
    let target = if holds_original(tree, node, &unit.original) && !written.contains(&node) {
        Some(node)
    } else {
        tree.parent(node).and_then(|parent| {
            tree.children(parent)
                .iter()
                .copied()
                .find(|&sibling| {
                    !written.contains(&sibling) && holds_original(tree, sibling, &unit.original)
                })
        })
    };

    let Some(target) = target else {
        return false;
    };
    if target != node {
        tracing::debug!("{}: recorded node moved, writing to a sibling", unit.id);
    }
    // Whitespace-only nodes are layout, never content
    if tree.text(target).is_some_and(|text| text.trim().is_empty()) {
        return false;
    }

    written.insert(target);
    tree.set_text(target, format!("{prefix}{}{suffix}", unit.current))
}

/// Replaces the literal at `offset` inside the handler attribute
///
/// When the attribute no longer holds the literal at `offset`, its first
/// occurrence is replaced instead.
fn write_literal(
    tree: &mut Tree,
    node: NodeId,
    attr_name: &str,
    raw_literal: &str,
    offset: usize,
    quote: char,
    current: &str,
) -> bool {
    let Some(value) = tree.get_attr(node, attr_name) else {
        return false;
    };
    let escaped = escape_for_literal(current, quote);
    let end = offset + raw_literal.len();

    // Prefer the quoted literal so a short text cannot hit the code around it
    let quoted = format!("{quote}{raw_literal}{quote}");
    let replaced = if value.get(offset..end) == Some(raw_literal) {
        format!("{}{}{}", &value[..offset], escaped, &value[end..])
    } else if value.contains(&quoted) {
        value.replacen(&quoted, &format!("{quote}{escaped}{quote}"), 1)
    } else if value.contains(raw_literal) {
        value.replacen(raw_literal, &escaped, 1)
    } else {
        return false;
    };
    tree.set_attr(node, attr_name, Some(replaced))
}

/// No-break spaces in text content become plain spaces
///
/// Script and style bodies and attribute values are left as they are.
fn normalize_text_nodes(tree: &mut Tree) {
    for node in tree.descendants(tree.document()) {
        let in_raw_text = tree
            .parent(node)
            .and_then(|parent| tree.element_name(parent))
            .is_some_and(is_raw_text_element);
        if in_raw_text {
            continue;
        }

        let normalized = match tree.text(node) {
            Some(text) if text.contains('\u{a0}') || text.contains("&nbsp;") => normalize_nbsp(text),
            _ => continue,
        };
        tree.set_text(node, normalized);
    }
}
