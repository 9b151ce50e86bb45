//! Runtime context for pipeline execution.

mod runtime;

pub use runtime::RuntimeContext;
