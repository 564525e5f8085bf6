//! XML text-run scanning using memchr
//!
//! XML documents are never rebuilt from a tree: exports patch the raw text at
//! byte offsets recorded here. The scanner checks well-formedness of the
//! element structure (matching start/end tags, a single root) and reports the
//! character-data runs between markup. Comments, CDATA sections, processing
//! instructions and the DOCTYPE are skipped and never reported.

use std::borrow::Cow;

use memchr::{memchr, memchr2};

use crate::core::{DocumentFormat, PatchError, PatchResult};

/// Byte span of character data between two pieces of markup
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextRun {
    pub start: usize,
    pub end: usize,
}

impl TextRun {
    pub fn as_str<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// Scanner over the raw bytes of an XML document
struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a [u8]) -> Self {
        Scanner { input, pos: 0 }
    }

    #[inline]
    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    #[inline]
    fn starts_with(&self, needle: &[u8]) -> bool {
        self.input[self.pos..].starts_with(needle)
    }

    #[inline]
    fn find_tag_start(&self) -> Option<usize> {
        memchr(b'<', &self.input[self.pos..]).map(|i| self.pos + i)
    }

    /// Position right after the next occurrence of `needle`
    fn find_after(&self, needle: &[u8]) -> Option<usize> {
        let first = *needle.first()?;
        let mut from = self.pos;

        while let Some(i) = memchr(first, &self.input[from..]) {
            let at = from + i;
            if self.input[at..].starts_with(needle) {
                return Some(at + needle.len());
            }
            from = at + 1;
        }
        None
    }

    /// Finds the `>` closing a tag, ignoring any inside quoted attribute values
    fn find_tag_end_quoted(&self) -> Option<usize> {
        let mut pos = self.pos;

        while pos < self.input.len() {
            let i = memchr2(b'>', b'"', &self.input[pos..])
                .into_iter()
                .chain(memchr(b'\'', &self.input[pos..]))
                .min()?;
            let at = pos + i;
            match self.input[at] {
                b'>' => return Some(at),
                quote => {
                    let close = memchr(quote, &self.input[at + 1..])?;
                    pos = at + 1 + close + 1;
                }
            }
        }
        None
    }

    /// End of a `<!DOCTYPE ...>` declaration, internal subset included
    fn find_doctype_end(&self) -> Option<usize> {
        let mut depth = 0usize;
        for (offset, byte) in self.input[self.pos..].iter().enumerate() {
            match byte {
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b'>' if depth == 0 => return Some(self.pos + offset + 1),
                _ => {}
            }
        }
        None
    }
}

fn line_of(input: &[u8], pos: usize) -> usize {
    input[..pos.min(input.len())]
        .iter()
        .filter(|b| **b == b'\n')
        .count()
        + 1
}

fn parse_error(input: &[u8], pos: usize, message: &str) -> PatchError {
    PatchError::parse(
        DocumentFormat::Xml,
        format!("line {}: {}", line_of(input, pos), message),
    )
}

fn tag_name(tag_body: &[u8]) -> &[u8] {
    let end = tag_body
        .iter()
        .position(|b| b.is_ascii_whitespace() || *b == b'/' || *b == b'>')
        .unwrap_or(tag_body.len());
    &tag_body[..end]
}

/// Scans `source` and returns every character-data run inside the root element
///
/// Runs are reported in document order, whitespace-only runs included.
///
/// # Errors
///
/// `PatchError::Parse` for mismatched or unclosed tags, unterminated markup,
/// a missing or repeated root element, or text outside the root element.
pub fn scan_text_runs(source: &str) -> PatchResult<Vec<TextRun>> {
    let input = source.as_bytes();
    let mut scanner = Scanner::new(input);
    let mut open: Vec<&[u8]> = Vec::new();
    let mut runs = Vec::new();
    let mut seen_root = false;

    while !scanner.is_eof() {
        let text_end = scanner.find_tag_start().unwrap_or(input.len());

        if text_end > scanner.pos {
            let text = &input[scanner.pos..text_end];
            if open.is_empty() {
                if !text.iter().all(u8::is_ascii_whitespace) {
                    return Err(parse_error(input, scanner.pos, "text outside the root element"));
                }
            } else {
                runs.push(TextRun {
                    start: scanner.pos,
                    end: text_end,
                });
            }
        }
        scanner.pos = text_end;
        if scanner.is_eof() {
            break;
        }

        let markup_start = scanner.pos;
        if scanner.starts_with(b"<!--") {
            scanner.pos = scanner
                .find_after(b"-->")
                .ok_or_else(|| parse_error(input, markup_start, "unterminated comment"))?;
        } else if scanner.starts_with(b"<![CDATA[") {
            if open.is_empty() {
                return Err(parse_error(input, markup_start, "CDATA outside the root element"));
            }
            scanner.pos = scanner
                .find_after(b"]]>")
                .ok_or_else(|| parse_error(input, markup_start, "unterminated CDATA section"))?;
        } else if scanner.starts_with(b"<?") {
            scanner.pos = scanner.find_after(b"?>").ok_or_else(|| {
                parse_error(input, markup_start, "unterminated processing instruction")
            })?;
        } else if scanner.starts_with(b"<!") {
            scanner.pos = scanner
                .find_doctype_end()
                .ok_or_else(|| parse_error(input, markup_start, "unterminated declaration"))?;
        } else if scanner.starts_with(b"</") {
            let end = scanner
                .find_tag_end_quoted()
                .ok_or_else(|| parse_error(input, markup_start, "unterminated end tag"))?;
            let name = tag_name(&input[markup_start + 2..end]);
            match open.pop() {
                Some(expected) if expected == name => {}
                Some(expected) => {
                    return Err(parse_error(
                        input,
                        markup_start,
                        &format!(
                            "end tag </{}> does not match <{}>",
                            String::from_utf8_lossy(name),
                            String::from_utf8_lossy(expected)
                        ),
                    ))
                }
                None => {
                    return Err(parse_error(
                        input,
                        markup_start,
                        &format!("unexpected end tag </{}>", String::from_utf8_lossy(name)),
                    ))
                }
            }
            scanner.pos = end + 1;
        } else {
            let end = scanner
                .find_tag_end_quoted()
                .ok_or_else(|| parse_error(input, markup_start, "unterminated start tag"))?;
            let name = tag_name(&input[markup_start + 1..end]);
            if name.is_empty() {
                return Err(parse_error(input, markup_start, "missing element name"));
            }
            if open.is_empty() {
                if seen_root {
                    return Err(parse_error(input, markup_start, "more than one root element"));
                }
                seen_root = true;
            }
            let self_closing = input[..end].ends_with(b"/");
            if !self_closing {
                open.push(name);
            }
            scanner.pos = end + 1;
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(parse_error(
            input,
            input.len(),
            &format!("unclosed element <{}>", String::from_utf8_lossy(unclosed)),
        ));
    }
    if !seen_root {
        return Err(parse_error(input, input.len(), "no root element"));
    }

    tracing::debug!("Scanned {} XML text runs", runs.len());
    Ok(runs)
}

/// Decodes the predefined entities and numeric character references
///
/// Unknown entity references are kept as written.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if memchr(b'&', text.as_bytes()).is_none() {
        return Cow::Borrowed(text);
    }

    let mut decoded = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        decoded.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let replacement = rest
            .find(';')
            .and_then(|semi| decode_entity(&rest[1..semi]).map(|c| (c, semi)));
        match replacement {
            Some((c, semi)) => {
                decoded.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                decoded.push('&');
                rest = &rest[1..];
            }
        }
    }
    decoded.push_str(rest);

    Cow::Owned(decoded)
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = entity.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Escapes text for use as XML character data
///
/// Values are plain text, so every `&` is escaped, including one that looks
/// like an entity reference.
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '&' => escaped.push_str("&amp;"),
            c => escaped.push(c),
        }
    }

    escaped
}

/// Splits a raw character-data run into leading padding, body and trailing
/// padding
///
/// Padding is whitespace written literally or as a character reference such
/// as `&#160;`.
pub fn split_padding(text: &str) -> (&str, &str, &str) {
    let mut start = 0;
    while let Some(len) = leading_space(&text[start..]) {
        start += len;
    }

    let mut end = text.len();
    while end > start {
        match trailing_space(&text[start..end]) {
            Some(len) => end -= len,
            None => break,
        }
    }

    (&text[..start], &text[start..end], &text[end..])
}

fn leading_space(text: &str) -> Option<usize> {
    let c = text.chars().next()?;
    if c.is_whitespace() {
        return Some(c.len_utf8());
    }
    if c != '&' {
        return None;
    }
    let semi = text.find(';')?;
    decode_entity(&text[1..semi])
        .filter(|decoded| decoded.is_whitespace())
        .map(|_| semi + 1)
}

fn trailing_space(text: &str) -> Option<usize> {
    let c = text.chars().next_back()?;
    if c.is_whitespace() {
        return Some(c.len_utf8());
    }
    if c != ';' {
        return None;
    }
    let amp = text.rfind('&')?;
    decode_entity(&text[amp + 1..text.len() - 1])
        .filter(|decoded| decoded.is_whitespace())
        .map(|_| text.len() - amp)
}
