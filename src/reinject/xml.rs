use crate::extraction::{ExtractionUnit, UnitContext, UnitId};
use crate::parsers::xml::{decode_entities, escape_text};
use crate::utils::{collapse_whitespace, normalize_nbsp};

/// Patches edited character-data runs of `raw` by their recorded spans
///
/// Every byte outside an edited run is copied unchanged, so duplicate texts
/// are each written to their own position.
pub fn reinject_xml(
    raw: &str,
    units: &[&ExtractionUnit],
    skipped: &mut Vec<UnitId>,
) -> (String, usize) {
    let mut edits: Vec<(usize, usize, String)> = Vec::new();

    for unit in units.iter().filter(|u| u.is_edited()) {
        match &unit.context {
            UnitContext::XmlText {
                start,
                end,
                prefix,
                suffix,
            } if span_holds(raw, *start, *end, &unit.original) => {
                let text = escape_text(&normalize_nbsp(&unit.current));
                edits.push((*start, *end, format!("{prefix}{text}{suffix}")));
            }
            _ => skipped.push(unit.id.clone()),
        }
    }

    edits.sort_by_key(|(start, _, _)| *start);

    let mut output = String::with_capacity(raw.len());
    let mut cursor = 0;
    let mut applied = 0;
    for (start, end, replacement) in edits {
        if start < cursor {
            continue;
        }
        output.push_str(&raw[cursor..start]);
        output.push_str(&replacement);
        cursor = end;
        applied += 1;
    }
    output.push_str(&raw[cursor..]);

    (output, applied)
}

/// Whether `start..end` is a valid span of `raw` that still decodes to `original`
fn span_holds(raw: &str, start: usize, end: usize, original: &str) -> bool {
    raw.get(start..end)
        .is_some_and(|text| collapse_whitespace(&decode_entities(text)) == original)
}
