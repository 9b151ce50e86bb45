//! Stage trait and implementations.
//!
//! Each stage performs exactly one ledger operation. It reads its
//! prerequisite fields from the description and on success returns a copy
//! carrying the one field it produces. On failure the input description is
//! left untouched and the ledger error is returned to the runner.

mod event;
mod fund;
mod market;
mod oracle;
mod resolve;

pub use event::{EventStage, EventVariant};
pub use fund::FundStage;
pub use market::MarketStage;
pub use oracle::OracleStage;
pub use resolve::ResolveStage;

use crate::context::RuntimeContext;
use crate::core::StageKind;
use crate::description::{Address, WorkflowDescription};
use crate::errors::LedgerError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Trait for provisioning stages.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the kind of the stage.
    fn kind(&self) -> StageKind;

    /// Executes the stage against `description`.
    ///
    /// # Returns
    ///
    /// The updated description, or the ledger error that stopped the stage.
    async fn execute(
        &self,
        description: &WorkflowDescription,
        ctx: &RuntimeContext,
    ) -> Result<WorkflowDescription, LedgerError>;
}

/// Lookup table from stage kind to implementation.
#[derive(Debug, Clone, Default)]
pub struct StageRegistry {
    stages: HashMap<StageKind, Arc<dyn Stage>>,
}

impl StageRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in stages.
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .with_stage(Arc::new(OracleStage))
            .with_stage(Arc::new(EventStage))
            .with_stage(Arc::new(MarketStage))
            .with_stage(Arc::new(FundStage))
            .with_stage(Arc::new(ResolveStage))
    }

    /// Registers a stage, replacing any stage of the same kind.
    #[must_use]
    pub fn with_stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.register(stage);
        self
    }

    /// Registers a stage, returning the one it replaced.
    pub fn register(&mut self, stage: Arc<dyn Stage>) -> Option<Arc<dyn Stage>> {
        self.stages.insert(stage.kind(), stage)
    }

    /// Returns the stage registered for `kind`.
    #[must_use]
    pub fn get(&self, kind: StageKind) -> Option<Arc<dyn Stage>> {
        self.stages.get(&kind).cloned()
    }

    /// Returns the number of registered stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if no stage is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Parses an address a stage depends on.
pub(crate) fn required_address(
    operation: &str,
    field: &str,
    value: Option<&str>,
) -> Result<Address, LedgerError> {
    value
        .ok_or_else(|| LedgerError::rejected(operation, format!("{field} is not set")))?
        .trim()
        .parse()
}

/// Returns a text input a stage depends on.
pub(crate) fn required_text<'a>(
    operation: &str,
    field: &str,
    value: Option<&'a str>,
) -> Result<&'a str, LedgerError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| LedgerError::rejected(operation, format!("{field} is not set")))
}
