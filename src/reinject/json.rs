use serde_json::Value;

use crate::core::PatchResult;
use crate::extraction::{ExtractionUnit, UnitId};
use crate::parsers::json::{set_string_leaf, to_pretty_string};
use crate::utils::normalize_nbsp;

/// Writes every unit into a clone of `value` and pretty-prints it
///
/// Unedited units are written back unchanged, edited ones with no-break
/// spaces normalized.
pub fn reinject_json(
    value: &Value,
    units: &[&ExtractionUnit],
    skipped: &mut Vec<UnitId>,
) -> PatchResult<(String, usize)> {
    let mut output = value.clone();
    let mut applied = 0;

    for unit in units {
        let Some(path) = unit.json_path() else {
            if unit.is_edited() {
                skipped.push(unit.id.clone());
            }
            continue;
        };

        let text = if unit.is_edited() {
            normalize_nbsp(&unit.current)
        } else {
            unit.current.clone()
        };

        if set_string_leaf(&mut output, path, &text) {
            if unit.is_edited() {
                applied += 1;
            }
        } else if unit.is_edited() {
            skipped.push(unit.id.clone());
        }
    }

    Ok((to_pretty_string(&output)?, applied))
}
