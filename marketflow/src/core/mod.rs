//! Core domain types for marketflow.
//!
//! - Stage kind and status enums
//! - The derived stage index

mod index;
mod status;

pub use index::StageIndex;
pub use status::{StageKind, StageStatus};
