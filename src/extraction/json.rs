use serde_json::Value;

use crate::parsers::json::{string_leaves, JsonPath};

use super::{ExtractionUnit, UnitContext, UnitId, UnitKind};

/// One unit per string leaf, in pre-order
pub fn extract_json(value: &Value) -> Vec<ExtractionUnit> {
    string_leaves(value)
        .into_iter()
        .map(|(path, text)| leaf_unit(path, text))
        .collect()
}

pub(super) fn leaf_unit(path: JsonPath, text: &str) -> ExtractionUnit {
    ExtractionUnit::new(
        UnitId::Json(path),
        UnitKind::JsonString,
        text.to_string(),
        UnitContext::Json,
    )
}
