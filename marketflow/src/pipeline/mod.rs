//! Pipeline resolution and execution.
//!
//! This module provides:
//! - Resume-point resolution from progress markers
//! - The stage table mapping resume points to stage stacks
//! - The runner that executes a stack against a runtime context
//! - Per-run reports

mod report;
mod resolver;
mod runner;
mod table;

pub use report::{RunReport, StageRecord};
pub use resolver::{resolve_document, resolve_stage};
pub use runner::PipelineRunner;
pub use table::StageTable;
