//! End-to-end runs against the sandbox ledger.

use async_trait::async_trait;
use marketflow::errors::LedgerError;
use marketflow::ledger::{FailurePlan, LedgerOperation};
use marketflow::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const ACCOUNT: &str = "0x90f8bf6a479f320ead074411a4b0e7944ea8c9c1";
const COLLATERAL: &str = "0xcfeb869f69431e42cdb54a4f4f105c19c080a601";
const MARKET_MAKER: &str = "0x254dffcd3277c0b1660f6d42efbb754edababc2b";

fn config() -> LedgerConfig {
    LedgerConfig::new(
        ACCOUNT.parse().unwrap(),
        COLLATERAL.parse().unwrap(),
        MARKET_MAKER.parse().unwrap(),
    )
}

fn scalar_market() -> serde_json::Value {
    json!({
        "title": "Berlin temperature",
        "description": "Highest temperature measured in Berlin on the resolution date",
        "resolutionDate": "2030-07-01T12:00:00Z",
        "outcomeType": "SCALAR",
        "lowerBound": "-300",
        "upperBound": "500",
        "decimals": 1,
        "unit": "°C",
        "fee": "1",
        "funding": "1e18",
        "currency": "WETH"
    })
}

fn sandbox() -> Arc<SandboxLedger> {
    Arc::new(SandboxLedger::new().with_balance(
        COLLATERAL.parse().unwrap(),
        ACCOUNT.parse().unwrap(),
        10_000_000_000_000_000_000,
    ))
}

fn context(ledger: Arc<SandboxLedger>, gate: Arc<ScriptedGate>) -> RuntimeContext {
    RuntimeContext::new(config(), ledger).with_gate(gate)
}

fn write_market(dir: &tempfile::TempDir, document: &serde_json::Value) -> JsonFileStore {
    let path = dir.path().join("market.json");
    std::fs::write(&path, serde_json::to_string_pretty(document).unwrap()).unwrap();
    JsonFileStore::new(path)
}

#[tokio::test]
async fn scalar_market_provisions_then_resumes() {
    let dir = tempfile::tempdir().unwrap();
    let store = write_market(&dir, &scalar_market());
    let ledger = sandbox();
    let gate = Arc::new(ScriptedGate::new([true, true, true, false], false));
    let session = Session::new(context(ledger.clone(), gate.clone()));

    let outcome = session.run(&store, SessionOptions::default()).await;
    assert_eq!(outcome.exit_code(), 0);

    let saved = store.load().await.unwrap();
    for address in [
        saved.oracle_address(),
        saved.event_address(),
        saved.market_address(),
    ] {
        assert_eq!(address.map(str::len), Some(42));
    }
    assert!(ledger.operations().contains(&LedgerOperation::CreateScalarEvent));
    assert!(!ledger.operations().contains(&LedgerOperation::CreateCategoricalEvent));
    let market: Address = saved.market_address().unwrap().parse().unwrap();
    assert_eq!(ledger.market_funding(&market), Some(1_000_000_000_000_000_000));
    let mutations_after_first_run = ledger.mutation_count();

    // Second run: the market exists and no outcome is known yet. Funding is
    // offered again and declined; resolution warns and does nothing.
    let outcome = session.run(&store, SessionOptions::default()).await;
    let SessionOutcome::Completed { report, description } = outcome else {
        panic!("second run should complete");
    };
    assert_eq!(report.start_index, StageIndex::MARKET);
    assert_eq!(report.skipped(), vec![StageKind::Fund]);
    assert_eq!(report.executed(), vec![StageKind::Resolve]);
    assert_eq!(description, saved);
    assert_eq!(ledger.mutation_count(), mutations_after_first_run);
    assert_eq!(gate.prompts().len(), 4);
}

#[tokio::test]
async fn preset_outcome_resolves_then_nothing_is_left() {
    let dir = tempfile::tempdir().unwrap();
    let mut document = scalar_market();
    document["winningOutcome"] = json!(215);
    let store = write_market(&dir, &document);
    let ledger = sandbox();
    let session = Session::new(context(ledger.clone(), Arc::new(ScriptedGate::always(true))));

    let outcome = session.run(&store, SessionOptions::default()).await;
    let SessionOutcome::Completed { report, description } = outcome else {
        panic!("first run should complete");
    };
    assert_eq!(report.executed(), StageKind::ALL.to_vec());
    let market: Address = description.market_address().unwrap().parse().unwrap();
    assert_eq!(ledger.market_resolution(&market), Some(215));
    assert_eq!(description.format_outcome(215), "21.5 °C");

    // Every marker is now present: a rerun touches nothing but the balance.
    let operations = ledger.operations().len();
    let outcome = session.run(&store, SessionOptions::default()).await;
    assert!(matches!(outcome, SessionOutcome::UpToDate));
    assert_eq!(resolve_stage(&store.load().await.unwrap()), StageIndex::OUTCOME);
    assert_eq!(ledger.operations().len(), operations + 1);
    assert_eq!(ledger.operations().last(), Some(&LedgerOperation::TokenBalance));
}

#[tokio::test]
async fn sandbox_state_carries_a_run_across_processes() {
    let dir = tempfile::tempdir().unwrap();
    let store = write_market(&dir, &scalar_market());
    let state = dir.path().join("sandbox.json");

    let first = sandbox();
    first.fail_next(
        LedgerOperation::CreateScalarEvent,
        LedgerError::Transport("node offline".into()),
    );
    let outcome = Session::new(context(first.clone(), Arc::new(ScriptedGate::always(true))))
        .run(&store, SessionOptions::default())
        .await;
    assert_eq!(outcome.exit_code(), 2);
    first.persist(&state).await.unwrap();
    assert_eq!(resolve_stage(&store.load().await.unwrap()), StageIndex::ORACLE);

    let second = Arc::new(SandboxLedger::open(&state).await.unwrap());
    let outcome = Session::new(context(second.clone(), Arc::new(ScriptedGate::always(true))))
        .run(&store, SessionOptions::default())
        .await;
    assert_eq!(outcome.exit_code(), 0, "{outcome:?}");

    let saved = store.load().await.unwrap();
    assert_eq!(resolve_stage(&saved), StageIndex::MARKET);
    assert!(!second.operations().contains(&LedgerOperation::CreateOracle));
    let market: Address = saved.market_address().unwrap().parse().unwrap();
    assert_eq!(second.market_funding(&market), Some(1_000_000_000_000_000_000));
}

#[tokio::test]
async fn recorded_outcome_resolves_in_resolution_mode() {
    let dir = tempfile::tempdir().unwrap();
    let store = write_market(&dir, &scalar_market());
    let ledger = sandbox();
    let ctx = context(ledger.clone(), Arc::new(ScriptedGate::always(true)));

    let outcome = Session::new(ctx.clone()).run(&store, SessionOptions::default()).await;
    assert_eq!(outcome.exit_code(), 0);

    let mut document = store.load_document().await.unwrap();
    document["winningOutcome"] = json!(215);
    let store = write_market(&dir, &document);

    let outcome = Session::new(ctx.clone()).run(&store, SessionOptions::default()).await;
    assert!(matches!(outcome, SessionOutcome::UpToDate));

    let outcome = Session::new(ctx)
        .with_runner(PipelineRunner::new().with_table(StageTable::resolution()))
        .run(&store, SessionOptions::default())
        .await;
    let SessionOutcome::Completed { report, description } = outcome else {
        panic!("resolution run should complete");
    };
    assert_eq!(report.executed(), vec![StageKind::Resolve]);
    let market: Address = description.market_address().unwrap().parse().unwrap();
    assert_eq!(ledger.market_resolution(&market), Some(215));
}

#[tokio::test]
async fn failing_stage_keeps_only_earlier_fields() {
    let cases = [
        (LedgerOperation::CreateOracle, StageKind::Oracle, StageIndex::NONE),
        (LedgerOperation::CreateScalarEvent, StageKind::Event, StageIndex::ORACLE),
        (LedgerOperation::CreateMarket, StageKind::Market, StageIndex::EVENT),
        (LedgerOperation::FundMarket, StageKind::Fund, StageIndex::MARKET),
    ];

    for (operation, stage, expected_index) in cases {
        let ledger = Arc::new(
            SandboxLedger::new()
                .with_balance(COLLATERAL.parse().unwrap(), ACCOUNT.parse().unwrap(), u128::MAX)
                .with_failures(
                    FailurePlan::new().fail(operation, LedgerError::Transport("node offline".into())),
                ),
        );
        let ctx = context(ledger, Arc::new(ScriptedGate::always(true)));
        let mut description: WorkflowDescription = serde_json::from_value(scalar_market()).unwrap();

        let err = PipelineRunner::new()
            .resume(&ctx, &mut description)
            .await
            .unwrap_err();

        assert_eq!(err.failed_stage(), Some(stage), "{operation}");
        assert_eq!(resolve_stage(&description), expected_index, "{operation}");
    }
}

#[tokio::test]
async fn resolution_failure_is_reported_not_raised() {
    let ledger = sandbox();
    let ctx = context(ledger.clone(), Arc::new(ScriptedGate::always(false)));
    let mut description: WorkflowDescription = serde_json::from_value(scalar_market()).unwrap();
    let runner = PipelineRunner::new();

    runner.resume(&ctx, &mut description).await.unwrap();
    description.winning_outcome = Some(json!(-12));
    let before = description.clone();

    ledger.fail_next(
        LedgerOperation::ResolveMarket,
        LedgerError::rejected("resolve_market", "oracle not set"),
    );
    // With every marker present the resume point is terminal, so resolution
    // is driven explicitly from the market position.
    let report = runner
        .run_stack(&ctx, &mut description, StageIndex::MARKET)
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(description, before);
    let market: Address = description.market_address().unwrap().parse().unwrap();
    assert_eq!(ledger.market_resolution(&market), None);
}

#[tokio::test]
async fn mistyped_description_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    let mut document = scalar_market();
    document["decimals"] = json!("1");
    let store = write_market(&dir, &document);
    let ledger = sandbox();
    let session = Session::new(context(ledger.clone(), Arc::new(ScriptedGate::always(true))));

    let outcome = session.run(&store, SessionOptions { wrap_amount: Some(1) }).await;

    let SessionOutcome::Invalid(err) = &outcome else {
        panic!("expected a validation failure, got {outcome:?}");
    };
    assert_eq!(err.field, "decimals");
    assert_eq!(outcome.exit_code(), 1);
    assert!(ledger.operations().is_empty());
}

#[tokio::test]
async fn invalid_description_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    let mut document = scalar_market();
    document["upperBound"] = json!("-400");
    let store = write_market(&dir, &document);
    let ledger = sandbox();
    let session = Session::new(context(ledger.clone(), Arc::new(ScriptedGate::always(true))));

    let outcome = session.run(&store, SessionOptions::default()).await;

    let SessionOutcome::Invalid(err) = &outcome else {
        panic!("expected a validation failure");
    };
    assert_eq!(err.field, "upperBound");
    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(ledger.mutation_count(), 0);
}

#[derive(Debug)]
struct CountingStage {
    kind: StageKind,
    counter: Arc<AtomicUsize>,
}

#[async_trait]
impl Stage for CountingStage {
    fn kind(&self) -> StageKind {
        self.kind
    }

    async fn execute(
        &self,
        description: &WorkflowDescription,
        _ctx: &RuntimeContext,
    ) -> Result<WorkflowDescription, LedgerError> {
        self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(description.clone())
    }
}

#[tokio::test]
async fn registered_stage_replaces_builtin() {
    let counter = Arc::new(AtomicUsize::new(0));
    let registry = StageRegistry::standard().with_stage(Arc::new(CountingStage {
        kind: StageKind::Fund,
        counter: counter.clone(),
    }));
    let ledger = sandbox();
    let ctx = context(ledger.clone(), Arc::new(ScriptedGate::always(true)));
    let mut description: WorkflowDescription = serde_json::from_value(scalar_market()).unwrap();

    PipelineRunner::new()
        .with_registry(registry)
        .resume(&ctx, &mut description)
        .await
        .unwrap();

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(!ledger.operations().contains(&LedgerOperation::FundMarket));
}
