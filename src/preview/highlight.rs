//! Syntax highlighting for the code view
//!
//! Each highlighter tokenizes the raw source in one pass and emits escaped
//! text wrapped in `<span class="…">` elements, one class per category.
//! Nothing from the source reaches the output unescaped.

use std::sync::OnceLock;

use regex::Regex;

use crate::parsers::sanitize::escape_markup;
use crate::utils::static_regex;

/// CSS classes for one markup dialect
struct MarkupClasses {
    comment: &'static str,
    declaration: &'static str,
    cdata: &'static str,
    tag: &'static str,
    attr: &'static str,
    value: &'static str,
    number: Option<&'static str>,
    boolean: Option<&'static str>,
    text: Option<&'static str>,
}

const HTML_CLASSES: MarkupClasses = MarkupClasses {
    comment: "hl-comment",
    declaration: "hl-tag",
    cdata: "hl-comment",
    tag: "hl-tag",
    attr: "hl-attr",
    value: "hl-value",
    number: Some("hl-num"),
    boolean: Some("hl-bool"),
    text: Some("hl-text"),
};

const XML_CLASSES: MarkupClasses = MarkupClasses {
    comment: "xml-comment",
    declaration: "xml-decl",
    cdata: "xml-cdata",
    tag: "xml-tag",
    attr: "xml-attr",
    value: "xml-value",
    number: None,
    boolean: None,
    text: None,
};

fn span(class: &str, text: &str, out: &mut String) {
    out.push_str("<span class=\"");
    out.push_str(class);
    out.push_str("\">");
    out.push_str(&escape_markup(text));
    out.push_str("</span>");
}

fn markup_token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        static_regex(
            r#"(?s)(?P<comment><!--.*?(?:-->|$))|(?P<cdata><!\[CDATA\[.*?(?:\]\]>|$))|(?P<decl><[?!].*?(?:>|$))|(?P<tag></?[A-Za-z][^\s/>]*(?:[^>"']|"[^"]*"|'[^']*')*/?>)"#,
        )
    })
}

fn tag_parts_regex() -> &'static Regex {
    static PARTS: OnceLock<Regex> = OnceLock::new();
    PARTS.get_or_init(|| {
        static_regex(r#"(?s)^(?P<open></?[^\s/>]+)(?P<attrs>.*?)(?P<close>/?>)$"#)
    })
}

fn attribute_regex() -> &'static Regex {
    static ATTRIBUTE: OnceLock<Regex> = OnceLock::new();
    ATTRIBUTE.get_or_init(|| {
        static_regex(r#"(?s)(?P<name>[^\s"'>/=]+)(?:(?P<eq>\s*=\s*)(?P<value>"[^"]*"|'[^']*'|[^\s>]+))?"#)
    })
}

fn highlight_markup(source: &str, classes: &MarkupClasses) -> String {
    let mut out = String::with_capacity(source.len() * 2);
    let mut cursor = 0;

    for caps in markup_token_regex().captures_iter(source) {
        let Some(token) = caps.get(0) else {
            continue;
        };
        push_text(&source[cursor..token.start()], classes, &mut out);
        cursor = token.end();

        if caps.name("comment").is_some() {
            span(classes.comment, token.as_str(), &mut out);
        } else if caps.name("cdata").is_some() {
            span(classes.cdata, token.as_str(), &mut out);
        } else if caps.name("decl").is_some() {
            span(classes.declaration, token.as_str(), &mut out);
        } else {
            push_tag(token.as_str(), classes, &mut out);
        }
    }
    push_text(&source[cursor..], classes, &mut out);

    out
}

fn push_text(text: &str, classes: &MarkupClasses, out: &mut String) {
    match classes.text {
        Some(class) if !text.trim().is_empty() => span(class, text, out),
        _ => out.push_str(&escape_markup(text)),
    }
}

fn push_tag(tag: &str, classes: &MarkupClasses, out: &mut String) {
    let Some(parts) = tag_parts_regex().captures(tag) else {
        span(classes.tag, tag, out);
        return;
    };
    let (Some(open), Some(attrs), Some(close)) =
        (parts.name("open"), parts.name("attrs"), parts.name("close"))
    else {
        span(classes.tag, tag, out);
        return;
    };

    span(classes.tag, open.as_str(), out);

    let attrs = attrs.as_str();
    let mut cursor = 0;
    for attr in attribute_regex().captures_iter(attrs) {
        let (Some(whole), Some(name)) = (attr.get(0), attr.name("name")) else {
            continue;
        };
        out.push_str(&escape_markup(&attrs[cursor..whole.start()]));
        cursor = whole.end();

        span(classes.attr, name.as_str(), out);
        if let (Some(eq), Some(value)) = (attr.name("eq"), attr.name("value")) {
            out.push_str(&escape_markup(eq.as_str()));
            span(value_class(value.as_str(), classes), value.as_str(), out);
        }
    }
    out.push_str(&escape_markup(&attrs[cursor..]));

    span(classes.tag, close.as_str(), out);
}

fn value_class(value: &str, classes: &MarkupClasses) -> &'static str {
    let bare = value.trim_matches(|c| c == '"' || c == '\'');
    if let Some(class) = classes.boolean {
        if bare.eq_ignore_ascii_case("true") || bare.eq_ignore_ascii_case("false") {
            return class;
        }
    }
    if let Some(class) = classes.number {
        if !bare.is_empty() && bare.parse::<f64>().is_ok() {
            return class;
        }
    }
    classes.value
}

/// Highlights HTML source with the `hl-*` classes
///
/// ```
/// use textpatch::preview::highlight::highlight_html;
///
/// assert_eq!(
///     highlight_html("<b>Hi</b>"),
///     "<span class=\"hl-tag\">&lt;b</span><span class=\"hl-tag\">&gt;</span>\
///      <span class=\"hl-text\">Hi</span>\
///      <span class=\"hl-tag\">&lt;/b</span><span class=\"hl-tag\">&gt;</span>"
/// );
/// ```
pub fn highlight_html(source: &str) -> String {
    highlight_markup(source, &HTML_CLASSES)
}

/// Highlights XML source with the `xml-*` classes
pub fn highlight_xml(source: &str) -> String {
    highlight_markup(source, &XML_CLASSES)
}

/// Highlights JSON text with the `hl-json-*` classes
///
/// Strings followed by `:` are keys; everything that is not a token is copied
/// escaped.
pub fn highlight_json(source: &str) -> String {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    let token = TOKEN.get_or_init(|| {
        static_regex(
            r#"(?P<string>"(?:[^"\\]|\\.)*")(?P<colon>\s*:)?|(?P<number>-?\b\d+(?:\.\d+)?(?:[eE][+-]?\d+)?\b)|(?P<boolean>\b(?:true|false|null)\b)"#,
        )
    });

    let mut out = String::with_capacity(source.len() * 2);
    let mut cursor = 0;

    for caps in token.captures_iter(source) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&escape_markup(&source[cursor..whole.start()]));
        cursor = whole.end();

        if let Some(string) = caps.name("string") {
            match caps.name("colon") {
                Some(colon) => {
                    span("hl-json-key", string.as_str(), &mut out);
                    out.push_str(colon.as_str());
                }
                None => span("hl-json-string", string.as_str(), &mut out),
            }
        } else if let Some(number) = caps.name("number") {
            span("hl-json-number", number.as_str(), &mut out);
        } else if let Some(boolean) = caps.name("boolean") {
            span("hl-json-bool", boolean.as_str(), &mut out);
        }
    }
    out.push_str(&escape_markup(&source[cursor..]));

    out
}
