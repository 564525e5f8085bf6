use crate::core::PatchResult;
use crate::parsers::xml::{decode_entities, scan_text_runs, split_padding, TextRun};
use crate::utils::{collapse_whitespace, has_letter};

use super::{ExtractionUnit, UnitContext, UnitId, UnitKind};

/// One unit per character-data run that contains a letter
///
/// `original` is the entity-decoded, whitespace-collapsed text; the raw
/// leading and trailing padding, space references included, is kept for
/// reinjection.
pub fn extract_xml(raw: &str) -> PatchResult<Vec<ExtractionUnit>> {
    let mut units = Vec::new();

    for run in scan_text_runs(raw)? {
        if let Some(unit) = run_unit(raw, run, units.len()) {
            units.push(unit);
        }
    }

    Ok(units)
}

/// The unit for `run` when its text contains a letter
pub(super) fn run_unit(raw: &str, run: TextRun, index: usize) -> Option<ExtractionUnit> {
    let text = run.as_str(raw);
    let collapsed = collapse_whitespace(&decode_entities(text));
    if !has_letter(&collapsed) {
        return None;
    }

    let (prefix, _, suffix) = split_padding(text);
    Some(ExtractionUnit::new(
        UnitId::Text(index),
        UnitKind::TextNode,
        collapsed,
        UnitContext::XmlText {
            start: run.start,
            end: run.end,
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        },
    ))
}
