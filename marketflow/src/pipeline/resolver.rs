//! Resume-point resolution.
//!
//! The resume point of a run is the position of the last progress marker in
//! the prefix chain that is present, scanning from the start and stopping at
//! the first gap. A later marker after a gap is ignored, so a description
//! with a missing oracle address never resumes past the oracle stage.

use crate::core::StageIndex;
use crate::description::{Marker, ProgressField, WorkflowDescription};
use serde_json::Value;

/// Returns the index of the last completed stage of a description.
#[must_use]
pub fn resolve_stage(description: &WorkflowDescription) -> StageIndex {
    resolve_with(|field| description.marker(field))
}

/// Returns the index of the last completed stage of a raw JSON document.
///
/// Missing keys and non-object documents are treated as having no progress.
#[must_use]
pub fn resolve_document(document: &Value) -> StageIndex {
    resolve_with(|field| Marker::of_value(document.get(field.key())))
}

fn resolve_with<'a>(marker: impl Fn(ProgressField) -> Marker<'a>) -> StageIndex {
    let last = ProgressField::CHAIN
        .iter()
        .take_while(|field| marker(**field).is_present())
        .count();
    StageIndex::from_position(last.checked_sub(1))
}
