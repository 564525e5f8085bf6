use crate::parsers::html::{is_skip_element, NodeId, Tree};
use crate::parsers::js::{attr_is_translatable_handler, extract_handler_literals};
use crate::utils::{collapse_whitespace, has_letter, split_outer_whitespace, NBSP};

use super::{ExtractionUnit, UnitContext, UnitId, UnitKind};

/// Text nodes first, then handler literals, each numbered in document order
pub fn extract_html(tree: &Tree) -> Vec<ExtractionUnit> {
    let mut texts = Vec::new();
    let mut handlers = Vec::new();

    for node in tree.descendants(tree.document()) {
        if let Some(unit) = text_unit(tree, node, texts.len()) {
            texts.push(unit);
        }
        handler_units(tree, node, &mut handlers);
    }

    texts.append(&mut handlers);
    texts
}

fn is_inside_skipped_element(tree: &Tree, id: NodeId) -> bool {
    tree.ancestors(id)
        .filter_map(|ancestor| tree.element_name(ancestor))
        .any(is_skip_element)
}

/// The unit for `node` when it is a text node worth translating
pub(super) fn text_unit(tree: &Tree, node: NodeId, index: usize) -> Option<ExtractionUnit> {
    let text = tree.text(node)?;
    let collapsed = collapse_whitespace(text);
    if !has_letter(&collapsed) || is_inside_skipped_element(tree, node) {
        return None;
    }

    let (prefix, _, suffix) = split_outer_whitespace(text);
    let id = UnitId::Text(index);
    tracing::debug!("{}: {:?}", id, collapsed);
    Some(ExtractionUnit::new(
        id,
        UnitKind::TextNode,
        collapsed,
        UnitContext::HtmlText {
            node,
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        },
    ))
}

/// Appends the handler literals of `node` to `units`, numbering on from its length
pub(super) fn handler_units(tree: &Tree, node: NodeId, units: &mut Vec<ExtractionUnit>) {
    for attr in tree.attrs(node).iter().filter(|a| attr_is_translatable_handler(&a.name)) {
        for literal in extract_handler_literals(&attr.value) {
            let id = UnitId::Attribute(units.len());
            let original = literal.raw.replace("&nbsp;", &NBSP.to_string());
            tracing::debug!("{} ({}): {:?}", id, attr.name, original);
            units.push(ExtractionUnit::new(
                id,
                UnitKind::EventAttributeValue,
                original,
                UnitContext::HtmlAttribute {
                    node,
                    attr_name: attr.name.clone(),
                    raw_literal: literal.raw,
                    offset: literal.start,
                    quote: literal.quote,
                },
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::html_to_tree;

    fn originals(units: &[ExtractionUnit]) -> Vec<&str> {
        units.iter().map(|u| u.original.as_str()).collect()
    }

    #[test]
    fn test_extracts_text_nodes_in_document_order() {
        let tree = html_to_tree("<p>Hello <b>World</b></p><p>  12 </p><div>\n  Two\n  lines </div>");
        let units = extract_html(&tree);

        assert_eq!(originals(&units), vec!["Hello", "World", "Two lines"]);
        assert_eq!(units[0].id, UnitId::Text(0));
        assert_eq!(units[2].id, UnitId::Text(2));
        assert!(units.iter().all(|u| u.kind == UnitKind::TextNode));
    }

    #[test]
    fn test_keeps_outer_whitespace_in_context() {
        let tree = html_to_tree("<p>\n  Hello there  </p>");
        let units = extract_html(&tree);

        match &units[0].context {
            UnitContext::HtmlText { prefix, suffix, .. } => {
                assert_eq!(prefix, "\n  ");
                assert_eq!(suffix, "  ");
            }
            other => panic!("unexpected context {other:?}"),
        }
    }

    #[test]
    fn test_skips_excluded_elements_at_any_depth() {
        let tree = html_to_tree(
            "<head><title>Title</title></head><body><p>Hello <b>World</b></p>\
             <code>let x = <i>y</i>;</code><pre>raw</pre><script>var a = 'b';</script></body>",
        );
        let units = extract_html(&tree);

        assert_eq!(originals(&units), vec!["Hello", "World"]);
    }

    #[test]
    fn test_extracts_handler_literals() {
        let tree = html_to_tree(
            "<button onclick=\"alert('Saved!')\" onload=\"alert('Nope')\">Save</button>\
             <input onfocus='hint(\"Type here\")' onblur=\"go(42)\">",
        );
        let units = extract_html(&tree);

        assert_eq!(originals(&units), vec!["Save", "Saved!", "Type here"]);
        assert_eq!(units[1].id, UnitId::Attribute(0));
        assert_eq!(units[2].id, UnitId::Attribute(1));
        assert_eq!(units[1].attr_name(), Some("onclick"));
        assert_eq!(units[2].kind, UnitKind::EventAttributeValue);
    }

    #[test]
    fn test_letters_in_any_script_count() {
        let tree = html_to_tree("<p>Привет</p><p>-- 42 --</p>");
        assert_eq!(originals(&extract_html(&tree)), vec!["Привет"]);
    }
}
