//! The pipeline runner.
//!
//! A run validates the description, selects the stages still to execute
//! from the resume point and executes them in order. The description is
//! updated in place after every successful stage, so when a stage fails
//! the caller still holds every field produced before the failure.

use super::report::{RunReport, StageRecord};
use super::resolver::resolve_stage;
use super::table::StageTable;
use crate::confirmation::confirm;
use crate::context::RuntimeContext;
use crate::core::{StageIndex, StageKind};
use crate::description::WorkflowDescription;
use crate::errors::{PipelineError, StageError};
use crate::stages::StageRegistry;
use crate::validation::validate_description;
use chrono::Utc;
use serde_json::json;
use tracing::{error, info, warn};

/// Executes stage stacks against a runtime context.
#[derive(Debug, Clone)]
pub struct PipelineRunner {
    registry: StageRegistry,
    table: StageTable,
}

impl PipelineRunner {
    /// Creates a runner with the built-in stages and the standard table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: StageRegistry::standard(),
            table: StageTable::standard(),
        }
    }

    /// Sets the stage registry.
    #[must_use]
    pub fn with_registry(mut self, registry: StageRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the stage table.
    #[must_use]
    pub fn with_table(mut self, table: StageTable) -> Self {
        self.table = table;
        self
    }

    /// Returns the stages a run from `index` would visit.
    #[must_use]
    pub fn planned_stages(&self, index: StageIndex) -> &[StageKind] {
        self.table.stages_from(index)
    }

    /// Runs the stages that follow the description's own resume point.
    pub async fn resume(
        &self,
        ctx: &RuntimeContext,
        description: &mut WorkflowDescription,
    ) -> Result<RunReport, PipelineError> {
        let index = resolve_stage(description);
        self.run_stack(ctx, description, index).await
    }

    /// Validates `description` and runs the stages listed for `index`.
    ///
    /// On success every stage has run or been skipped and `description`
    /// holds the final state. On a stage failure the returned
    /// [`PipelineError::Stage`] carries the report up to the failed stage and
    /// `description` holds the fields written by the stages that completed.
    /// Validation failures leave `description` untouched.
    pub async fn run_stack(
        &self,
        ctx: &RuntimeContext,
        description: &mut WorkflowDescription,
        index: StageIndex,
    ) -> Result<RunReport, PipelineError> {
        if let Err(err) = validate_description(description) {
            warn!(field = %err.field, "{err}");
            ctx.emit(
                "pipeline.failed",
                json!({ "reason": "validation", "field": err.field, "error": err.to_string() }),
            );
            return Err(err.into());
        }

        let mut report = RunReport::new(ctx.run_id(), index);
        let stages = self.table.stages_from(index);
        info!(
            market = description.label(),
            start = %index,
            stages = stages.len(),
            "Starting stage stack"
        );

        for &kind in stages {
            if let Err(err) = self.run_stage(ctx, description, kind, &mut report).await {
                ctx.emit(
                    "pipeline.failed",
                    json!({ "stage": kind, "error": err.to_string() }),
                );
                return Err(err);
            }
        }

        ctx.emit(
            "pipeline.completed",
            json!({
                "executed": report.executed(),
                "skipped": report.skipped(),
            }),
        );
        Ok(report)
    }

    async fn run_stage(
        &self,
        ctx: &RuntimeContext,
        description: &mut WorkflowDescription,
        kind: StageKind,
        report: &mut RunReport,
    ) -> Result<(), PipelineError> {
        let started_at = Utc::now();
        let stage = self
            .registry
            .get(kind)
            .ok_or(PipelineError::UnregisteredStage(kind))?;

        if kind.requires_confirmation() && !confirm(ctx.gate(), &prompt_for(kind, description), false)? {
            info!(stage = %kind, "Skipping stage");
            ctx.emit("stage.skipped", json!({ "stage": kind, "reason": "declined" }));
            report.push(StageRecord::skipped(kind, started_at));
            return Ok(());
        }

        info!(stage = %kind, "Ready to execute {kind}");
        ctx.emit("stage.started", json!({ "stage": kind }));

        match stage.execute(description, ctx).await {
            Ok(updated) => {
                *description = updated;
                let record = StageRecord::ok(kind, started_at);
                ctx.emit(
                    "stage.completed",
                    json!({
                        "stage": kind,
                        "field": kind.produced_field(),
                        "duration_ms": record.duration_ms(),
                    }),
                );
                report.push(record);
                Ok(())
            }
            Err(source) => {
                error!(stage = %kind, error = %source, "Got an exception on stage {kind}");
                let record = StageRecord::failed(kind, started_at, source.to_string());
                ctx.emit(
                    "stage.failed",
                    json!({ "stage": kind, "error": record.error, "duration_ms": record.duration_ms() }),
                );
                report.push(record);
                Err(PipelineError::Stage {
                    error: StageError::new(kind, source),
                    report: Box::new(report.clone()),
                })
            }
        }
    }
}

impl Default for PipelineRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn prompt_for(kind: StageKind, description: &WorkflowDescription) -> String {
    match kind {
        StageKind::Fund => format!(
            "Do you wish to fund the market {}?",
            description.market_address().unwrap_or_default()
        ),
        StageKind::Oracle | StageKind::Event | StageKind::Market | StageKind::Resolve => {
            format!("Do you wish to run the {kind} stage?")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirmation::ScriptedGate;
    use crate::core::StageStatus;
    use crate::description::Address;
    use crate::errors::LedgerError;
    use crate::events::CollectingEventSink;
    use crate::ledger::{LedgerOperation, SandboxLedger};
    use crate::stages::fixtures;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    const ORACLE: &str = "0x1111111111111111111111111111111111111111";
    const EVENT: &str = "0x2222222222222222222222222222222222222222";
    const MARKET: &str = "0x3333333333333333333333333333333333333333";

    fn funded_sandbox() -> Arc<SandboxLedger> {
        Arc::new(SandboxLedger::new().with_balance(fixtures::COLLATERAL, fixtures::ACCOUNT, u128::MAX))
    }

    fn context(ledger: Arc<SandboxLedger>, gate: ScriptedGate) -> (RuntimeContext, Arc<CollectingEventSink>) {
        let sink = Arc::new(CollectingEventSink::new());
        let ctx = RuntimeContext::new(fixtures::config(), ledger)
            .with_gate(Arc::new(gate))
            .with_event_sink(sink.clone());
        (ctx, sink)
    }

    #[tokio::test]
    async fn test_full_run_from_scratch() {
        let ledger = funded_sandbox();
        let (ctx, sink) = context(ledger.clone(), ScriptedGate::always(true));
        let mut description = fixtures::categorical();

        let report = PipelineRunner::new()
            .resume(&ctx, &mut description)
            .await
            .unwrap();

        assert_eq!(
            report.executed(),
            vec![
                StageKind::Oracle,
                StageKind::Event,
                StageKind::Market,
                StageKind::Fund,
                StageKind::Resolve
            ]
        );
        assert_eq!(resolve_stage(&description), StageIndex::MARKET);
        let market: Address = description.market_address().unwrap().parse().unwrap();
        assert_eq!(ledger.market_funding(&market), Some(500_000_000_000_000_000));
        assert_eq!(sink.events_of_type("pipeline.completed").len(), 1);
        assert_eq!(sink.events_of_type("stage.completed").len(), 5);
    }

    #[tokio::test]
    async fn test_validation_failure_runs_nothing() {
        let ledger = funded_sandbox();
        let (ctx, sink) = context(ledger.clone(), ScriptedGate::always(true));
        let mut description = fixtures::categorical();
        description.outcomes = Some(vec!["Only".to_string()]);
        let before = description.clone();

        let err = PipelineRunner::new()
            .run_stack(&ctx, &mut description, StageIndex::NONE)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Validation(_)));
        assert_eq!(description, before);
        assert!(ledger.operations().is_empty());
        assert_eq!(sink.event_types(), vec!["pipeline.failed"]);
    }

    #[tokio::test]
    async fn test_fail_forward_keeps_earlier_fields() {
        let ledger = funded_sandbox();
        ledger.fail_next(
            LedgerOperation::CreateMarket,
            LedgerError::rejected("create_market", "reverted"),
        );
        let (ctx, sink) = context(ledger.clone(), ScriptedGate::always(true));
        let mut description = fixtures::scalar();

        let err = PipelineRunner::new()
            .resume(&ctx, &mut description)
            .await
            .unwrap_err();

        assert_eq!(err.failed_stage(), Some(StageKind::Market));
        let report = err.report().unwrap();
        assert_eq!(report.executed(), vec![StageKind::Oracle, StageKind::Event]);
        let failure = report.failure().unwrap();
        assert_eq!(failure.kind, StageKind::Market);
        assert_eq!(failure.status, StageStatus::Fail);
        assert!(failure.error.as_deref().unwrap().contains("reverted"));
        assert!(!report.is_success());
        assert!(description.oracle_address().is_some());
        assert!(description.event_address().is_some());
        assert_eq!(description.market_address(), None);
        assert_eq!(resolve_stage(&description), StageIndex::EVENT);
        assert_eq!(sink.events_of_type("stage.failed").len(), 1);
        assert_eq!(sink.events_of_type("pipeline.failed").len(), 1);
        assert!(!ledger.operations().contains(&LedgerOperation::FundMarket));
    }

    #[tokio::test]
    async fn test_declined_funding_is_skipped() {
        let ledger = funded_sandbox();
        let gate = ScriptedGate::always(false);
        let (ctx, _sink) = context(ledger.clone(), gate);
        let mut description = fixtures::categorical();
        description.oracle_address = Some(ORACLE.into());
        description.event_address = Some(EVENT.into());
        description.market_address = Some(MARKET.into());
        description.winning_outcome = Some(json!(2));

        // Only resolve reaches the ledger; the sandbox knows no such market,
        // which the resolve stage reports without failing the run.
        let report = PipelineRunner::new()
            .run_stack(&ctx, &mut description, StageIndex::MARKET)
            .await
            .unwrap();

        assert_eq!(report.skipped(), vec![StageKind::Fund]);
        assert_eq!(report.executed(), vec![StageKind::Resolve]);
        assert_eq!(description.market_address(), Some(MARKET));
        assert_eq!(ledger.operations(), vec![LedgerOperation::ResolveMarket]);
    }

    #[tokio::test]
    async fn test_funding_prompt_names_market() {
        let ledger = funded_sandbox();
        let gate = Arc::new(ScriptedGate::always(false));
        let ctx = RuntimeContext::new(fixtures::config(), ledger).with_gate(gate.clone());
        let mut description = fixtures::scalar();
        description.oracle_address = Some(ORACLE.into());
        description.event_address = Some(EVENT.into());
        description.market_address = Some(MARKET.into());

        PipelineRunner::new()
            .resume(&ctx, &mut description)
            .await
            .unwrap();

        assert_eq!(
            gate.prompts(),
            vec![format!("Do you wish to fund the market {MARKET}?")]
        );
    }

    #[tokio::test]
    async fn test_completed_description_runs_nothing() {
        let ledger = funded_sandbox();
        let (ctx, _sink) = context(ledger.clone(), ScriptedGate::always(true));
        let mut description = fixtures::categorical();
        description.oracle_address = Some(ORACLE.into());
        description.event_address = Some(EVENT.into());
        description.market_address = Some(MARKET.into());
        description.winning_outcome = Some(json!(0));
        let before = description.clone();

        let report = PipelineRunner::new()
            .resume(&ctx, &mut description)
            .await
            .unwrap();

        assert!(report.stages.is_empty());
        assert_eq!(description, before);
        assert_eq!(ledger.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_unregistered_stage() {
        let (ctx, _sink) = context(funded_sandbox(), ScriptedGate::always(true));
        let runner = PipelineRunner::new().with_registry(StageRegistry::new());
        let mut description = fixtures::categorical();

        let err = runner.resume(&ctx, &mut description).await.unwrap_err();
        assert_eq!(err, PipelineError::UnregisteredStage(StageKind::Oracle));
    }
}
