//! `marketflow` command-line entry point.
//!
//! Exit codes: `0` when the run completes or the user declines, `1` when the
//! market description is invalid, `2` on any other failure.
//!
//! The only ledger built in is the local sandbox, so `--sandbox <STATE_FILE>`
//! is required. No blockchain is contacted.

mod args;
mod gate;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use marketflow::config::LedgerConfig;
use marketflow::confirmation::{AutoApprove, ConfirmationGate};
use marketflow::context::RuntimeContext;
use marketflow::events::LoggingEventSink;
use marketflow::errors::MarketflowError;
use marketflow::ledger::SandboxLedger;
use marketflow::pipeline::{PipelineRunner, StageTable};
use marketflow::session::{Session, SessionOptions, SessionOutcome};
use marketflow::store::JsonFileStore;

use crate::args::Cli;
use crate::gate::TerminalGate;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(&cli).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<u8> {
    let invocation = cli.invocation();

    let config = LedgerConfig::load(&invocation.config_path).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            invocation.config_path.display()
        )
    })?;
    tracing::debug!(account = %config.account, "Configuration loaded");

    let Some(sandbox_path) = invocation.sandbox_path.as_deref() else {
        bail!(
            "No blockchain client is available; pass --sandbox <STATE_FILE> to run against \
             the local sandbox ledger"
        );
    };
    let ledger = Arc::new(SandboxLedger::open(sandbox_path).await.with_context(|| {
        format!("Failed to open sandbox state {}", sandbox_path.display())
    })?);
    tracing::warn!(
        "Using the sandbox ledger in {}: no blockchain is contacted and the addresses written \
         to the market file exist only there",
        sandbox_path.display()
    );

    let gate: Arc<dyn ConfirmationGate> = if cli.yes {
        Arc::new(AutoApprove)
    } else {
        Arc::new(TerminalGate)
    };
    let ctx = RuntimeContext::new(config, ledger.clone())
        .with_gate(gate)
        .with_event_sink(Arc::new(LoggingEventSink::default()));

    let store = JsonFileStore::new(&invocation.market_path);
    let options = SessionOptions {
        wrap_amount: invocation.wrap_amount,
    };
    let mut session = Session::new(ctx);
    if invocation.resolve {
        session = session.with_runner(PipelineRunner::new().with_table(StageTable::resolution()));
    }

    let outcome = session.run(&store, options).await;
    ledger.persist(sandbox_path).await.with_context(|| {
        format!("Failed to save sandbox state {}", sandbox_path.display())
    })?;

    match &outcome {
        SessionOutcome::Completed { report, .. } => tracing::info!(
            executed = report.executed().len(),
            skipped = report.skipped().len(),
            "Market description saved to {}",
            store.path().display()
        ),
        SessionOutcome::UpToDate => tracing::info!("Market is already resolved"),
        SessionOutcome::Declined => tracing::info!("Stopped at user request"),
        SessionOutcome::Invalid(err) => tracing::warn!("{err}"),
        SessionOutcome::Failed(MarketflowError::Pipeline(err)) => {
            if let Some(report) = err.report() {
                tracing::error!(
                    executed = report.executed().len(),
                    skipped = report.skipped().len(),
                    "{err}"
                );
            } else {
                tracing::error!("{err}");
            }
        }
        SessionOutcome::Failed(err) => tracing::error!("{err}"),
    }

    u8::try_from(outcome.exit_code()).context("exit code out of range")
}
