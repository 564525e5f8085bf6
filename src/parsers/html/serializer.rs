use super::dom::{NodeData, NodeId, Tree};
use super::utils::{is_raw_text_element, is_void_element};

/// Serializes an edited tree as a full `<!DOCTYPE html>` document
///
/// The output always has the `<html><head>…</head><body>…</body></html>`
/// skeleton; attributes of the `html` element are kept.
pub fn serialize_document(tree: &Tree) -> String {
    let mut buf = String::new();
    let html = tree.find_element("html");

    buf.push_str("<!DOCTYPE html>\n");
    buf.push_str("<html");
    if let Some(html) = html {
        push_attrs(tree, html, &mut buf);
    }
    buf.push_str(">\n<head>\n");
    if let Some(head) = html.and_then(|html| tree.get_child_node_by_name(html, "head")) {
        serialize_children(tree, head, &mut buf);
    }
    buf.push_str("\n</head>\n<body>\n");
    if let Some(body) = html.and_then(|html| tree.get_child_node_by_name(html, "body")) {
        serialize_children(tree, body, &mut buf);
    }
    buf.push_str("\n</body>\n</html>");

    buf
}

/// Serializes the children of `id` (the node's inner HTML)
pub fn serialize_inner(tree: &Tree, id: NodeId) -> String {
    let mut buf = String::new();
    serialize_children(tree, id, &mut buf);
    buf
}

fn serialize_children(tree: &Tree, id: NodeId, buf: &mut String) {
    for child in tree.children(id) {
        serialize_node(tree, *child, buf);
    }
}

fn serialize_node(tree: &Tree, id: NodeId, buf: &mut String) {
    let Some(data) = tree.data(id) else {
        return;
    };

    match data {
        NodeData::Document => serialize_children(tree, id, buf),
        NodeData::Doctype { name } => {
            buf.push_str("<!DOCTYPE ");
            buf.push_str(name);
            buf.push('>');
        }
        NodeData::Text(contents) => {
            let raw_parent = tree
                .parent(id)
                .and_then(|parent| tree.element_name(parent))
                .is_some_and(is_raw_text_element);
            if raw_parent {
                buf.push_str(contents);
            } else {
                escape_text(contents, buf);
            }
        }
        NodeData::Comment(contents) => {
            buf.push_str("<!--");
            buf.push_str(contents);
            buf.push_str("-->");
        }
        NodeData::ProcessingInstruction { target, contents } => {
            buf.push_str("<?");
            buf.push_str(target);
            buf.push(' ');
            buf.push_str(contents);
            buf.push('>');
        }
        NodeData::Element { name, .. } => {
            buf.push('<');
            buf.push_str(name);
            push_attrs(tree, id, buf);
            buf.push('>');

            if is_void_element(name) {
                return;
            }

            // The parser drops one leading newline in these; put it back
            if matches!(name.as_str(), "pre" | "textarea" | "listing") {
                let leading_newline = tree
                    .children(id)
                    .first()
                    .and_then(|first| tree.text(*first))
                    .is_some_and(|text| text.starts_with('\n'));
                if leading_newline {
                    buf.push('\n');
                }
            }

            serialize_children(tree, id, buf);
            buf.push_str("</");
            buf.push_str(name);
            buf.push('>');
        }
    }
}

fn push_attrs(tree: &Tree, id: NodeId, buf: &mut String) {
    for attr in tree.attrs(id) {
        buf.push(' ');
        buf.push_str(&attr.name);
        buf.push_str("=\"");
        escape_attr(&attr.value, buf);
        buf.push('"');
    }
}

fn escape_text(text: &str, buf: &mut String) {
    for c in text.chars() {
        match c {
            '&' => buf.push_str("&amp;"),
            '\u{a0}' => buf.push_str("&nbsp;"),
            '<' => buf.push_str("&lt;"),
            '>' => buf.push_str("&gt;"),
            c => buf.push(c),
        }
    }
}

fn escape_attr(value: &str, buf: &mut String) {
    for c in value.chars() {
        match c {
            '&' => buf.push_str("&amp;"),
            '\u{a0}' => buf.push_str("&nbsp;"),
            '"' => buf.push_str("&quot;"),
            c => buf.push(c),
        }
    }
}
