//! Markup sanitizing for rendering
//!
//! `sanitize` removes, case-insensitively:
//! - `<script>…</script>` blocks and stray script tags
//! - `<iframe>…</iframe>` blocks and stray iframe tags
//! - every `on*` event-handler attribute, whatever its quoting
//!
//! Passes repeat until the markup stops changing, so nested or split tags
//! (`<scr<script></script>ipt>`) cannot reassemble, and the result is a fixed
//! point: `sanitize(sanitize(x)) == sanitize(x)`.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::utils::static_regex;

/// Class given to anchors so the preview stylesheet can disable them
pub const LINK_DISABLED_CLASS: &str = "link-disabled";

fn script_block_regex() -> &'static Regex {
    static SCRIPT_BLOCK: OnceLock<Regex> = OnceLock::new();
    SCRIPT_BLOCK.get_or_init(|| static_regex(r"(?is)<script\b[^>]*>.*?</script\s*>"))
}

fn iframe_block_regex() -> &'static Regex {
    static IFRAME_BLOCK: OnceLock<Regex> = OnceLock::new();
    IFRAME_BLOCK.get_or_init(|| static_regex(r"(?is)<iframe\b[^>]*>.*?</iframe\s*>"))
}

fn stray_tag_regex() -> &'static Regex {
    static STRAY_TAG: OnceLock<Regex> = OnceLock::new();
    STRAY_TAG.get_or_init(|| static_regex(r"(?i)</?\s*(?:script|iframe)\b[^>]*>?"))
}

/// A start tag, quoted attribute values (even unterminated ones) included
fn start_tag_regex() -> &'static Regex {
    static START_TAG: OnceLock<Regex> = OnceLock::new();
    START_TAG.get_or_init(|| {
        static_regex(r#"<[a-zA-Z][^\s/>]*(?:[^>"']|"[^"]*(?:"|$)|'[^']*(?:'|$))*(?:>|$)"#)
    })
}

/// One attribute inside a start tag, with its leading separator
fn attribute_regex() -> &'static Regex {
    static ATTRIBUTE: OnceLock<Regex> = OnceLock::new();
    ATTRIBUTE.get_or_init(|| {
        static_regex(
            r#"([\s/]*)([^\s"'>/=]+)(\s*=\s*(?:"[^"]*(?:"|$)|'[^']*(?:'|$)|[^\s>]*))?"#,
        )
    })
}

fn event_handler_name_regex() -> &'static Regex {
    static EVENT_HANDLER: OnceLock<Regex> = OnceLock::new();
    EVENT_HANDLER.get_or_init(|| static_regex(r"(?i)^on[a-z]+$"))
}

/// Removes scripts, frames and event-handler attributes
pub fn sanitize(markup: &str) -> String {
    let mut current = markup.to_string();
    let mut passes = 0;

    loop {
        let next = sanitize_pass(&current);
        passes += 1;
        if next == current {
            break;
        }
        current = next;
    }

    tracing::debug!("Sanitized {} bytes in {} passes", markup.len(), passes);
    current
}

fn sanitize_pass(markup: &str) -> String {
    let without_scripts = script_block_regex().replace_all(markup, "");
    let without_frames = iframe_block_regex().replace_all(&without_scripts, "");
    let without_stray = stray_tag_regex().replace_all(&without_frames, "");

    start_tag_regex()
        .replace_all(&without_stray, |tag: &Captures| strip_event_attributes(&tag[0]))
        .into_owned()
}

/// Drops `on*` attributes from a single start tag
fn strip_event_attributes(tag: &str) -> String {
    let name_end = tag[1..]
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .map_or(tag.len(), |i| i + 1);
    let (head, attributes) = tag.split_at(name_end);

    let kept = attribute_regex().replace_all(attributes, |attr: &Captures| {
        if event_handler_name_regex().is_match(&attr[2]) {
            String::new()
        } else {
            attr[0].to_string()
        }
    });

    format!("{head}{kept}")
}

/// Tags every anchor with `link-disabled`, merging into an existing `class`
pub fn disable_links(markup: &str) -> String {
    static ANCHOR: OnceLock<Regex> = OnceLock::new();
    static CLASS_ATTR: OnceLock<Regex> = OnceLock::new();
    let anchor = ANCHOR.get_or_init(|| static_regex(r#"(?i)<a(?:\s(?:[^>"']|"[^"]*"|'[^']*')*)?>"#));
    let class_attr = CLASS_ATTR.get_or_init(|| static_regex(r#"(?i)(\sclass\s*=\s*)(["'])"#));

    anchor
        .replace_all(markup, |tag: &Captures| {
            let tag = &tag[0];
            if class_attr.is_match(tag) {
                class_attr
                    .replacen(tag, 1, format!("${{1}}${{2}}{LINK_DISABLED_CLASS} "))
                    .into_owned()
            } else {
                format!("<a class=\"{LINK_DISABLED_CLASS}\"{}", &tag[2..])
            }
        })
        .into_owned()
}

/// Breaks up `</script` so inline markup cannot close an enclosing script
pub fn escape_script_close(markup: &str) -> String {
    static SCRIPT_CLOSE: OnceLock<Regex> = OnceLock::new();
    SCRIPT_CLOSE
        .get_or_init(|| static_regex(r"(?i)</(script)"))
        .replace_all(markup, r"<\/$1")
        .into_owned()
}

/// Full preparation for a sandboxed frame
///
/// Runs the complete sanitizer again, whatever was done to `markup` before.
pub fn prepare_for_sandbox(markup: &str) -> String {
    escape_script_close(&disable_links(&sanitize(markup)))
}

/// Encodes `&`, `<` and `>` for display as text
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Escapes a value for a double-quoted HTML attribute
pub fn escape_attribute(value: &str) -> String {
    escape_markup(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_clean(output: &str) {
        let lowered = output.to_lowercase();
        assert!(!lowered.contains("<script"), "script left in {output}");
        assert!(!lowered.contains("<iframe"), "iframe left in {output}");
        assert!(
            !event_attr_left(output),
            "event handler left in {output}"
        );
    }

    fn event_attr_left(output: &str) -> bool {
        start_tag_regex().find_iter(output).any(|tag| {
            attribute_regex()
                .captures_iter(tag.as_str())
                .skip(1)
                .any(|attr| event_handler_name_regex().is_match(&attr[2]))
        })
    }

    #[test]
    fn test_removes_scripts_and_frames() {
        let input = "<p>a</p><SCRIPT type=\"x\">alert(1)</script><iframe src=\"x\">in</IFRAME><p>b</p>";
        let output = sanitize(input);

        assert_eq!(output, "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_removes_event_handlers_any_quoting() {
        let input = r#"<a href="/x" onclick="go('a')" ONMOUSEOVER='y' onblur=z title="on it">k</a>"#;
        let output = sanitize(input);

        assert_eq!(output, r#"<a href="/x" title="on it">k</a>"#);
    }

    #[test]
    fn test_keeps_other_tags_and_text() {
        let input = "<div class=\"c\"><b>onclick=\"text\"</b><br/></div>";
        assert_eq!(sanitize(input), input);
    }

    #[test]
    fn test_nested_and_malformed_input() {
        let inputs = [
            "<scr<script>x</script>ipt>alert(1)</script>",
            "<<script>script>alert(1)<</script>/script>",
            "<img src=x onerror=alert(1)",
            "<img/onerror=alert(1)>",
            "<div onclick=\"unterminated>text",
            "<iframe src=x>",
            "<ifr<iframe></iframe>ame src=x></iframe>",
        ];

        for input in inputs {
            let once = sanitize(input);
            assert_clean(&once);
            assert_eq!(sanitize(&once), once, "not idempotent for {input}");
        }
    }

    #[test]
    fn test_disable_links() {
        assert_eq!(
            disable_links("<a href=\"x\">x</a><A class='big'>y</A><abbr>z</abbr>"),
            "<a class=\"link-disabled\" href=\"x\">x</a><A class='link-disabled big'>y</A><abbr>z</abbr>"
        );
    }

    #[test]
    fn test_escape_script_close() {
        assert_eq!(escape_script_close("a</SCRIPT>b"), "a<\\/SCRIPT>b");
    }

    #[test]
    fn test_prepare_for_sandbox_resanitizes() {
        let output = prepare_for_sandbox("<a onclick=\"x()\" href=\"#\">k</a><script>1</script>");
        assert_eq!(output, "<a class=\"link-disabled\" href=\"#\">k</a>");
    }

    #[test]
    fn test_escape_markup() {
        assert_eq!(escape_markup("<a & b>"), "&lt;a &amp; b&gt;");
        assert_eq!(escape_attribute("\"q\""), "&quot;q&quot;");
    }
}
