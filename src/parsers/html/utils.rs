/// Elements whose text is never offered for translation
pub const SKIP_ELEMENTS: &[&str] = &[
    "code", "pre", "script", "style", "title", "link", "meta", "head",
];

/// Elements serialized without an end tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text children are serialized verbatim
pub const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

pub fn is_skip_element(name: &str) -> bool {
    SKIP_ELEMENTS.contains(&name)
}

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

pub fn is_raw_text_element(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&name)
}
