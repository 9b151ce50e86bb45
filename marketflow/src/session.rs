//! The top-level session controller.
//!
//! A session is one invocation of the tool: load and validate the
//! description, optionally wrap collateral, report the balance, confirm, run
//! the remaining stages and write the description back. Nothing reaches the
//! ledger before the description has been validated. Every way a session can end is a
//! [`SessionOutcome`] carrying the process exit code; nothing in here exits
//! the process.

use crate::confirmation::confirm;
use crate::context::RuntimeContext;
use crate::description::WorkflowDescription;
use crate::errors::{LedgerError, MarketflowError, PipelineError, ValidationError};
use crate::pipeline::{resolve_stage, PipelineRunner, RunReport};
use crate::store::DescriptionStore;
use crate::validation::{parse_description, validate_description};
use tracing::{error, info, warn};

/// Options of a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    /// Collateral base units to wrap before the run.
    pub wrap_amount: Option<u128>,
}

/// How a session ended.
#[derive(Debug)]
pub enum SessionOutcome {
    /// The remaining stages ran.
    Completed {
        /// Per-stage records of the run.
        report: RunReport,
        /// The description as saved.
        description: WorkflowDescription,
    },
    /// Every stage had already run.
    UpToDate,
    /// The user declined to continue.
    Declined,
    /// The description failed validation.
    Invalid(ValidationError),
    /// Loading, a ledger call, a stage or saving failed.
    Failed(MarketflowError),
}

impl SessionOutcome {
    /// Returns the process exit code for the outcome.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Completed { .. } | Self::UpToDate | Self::Declined => 0,
            Self::Invalid(_) => 1,
            Self::Failed(_) => 2,
        }
    }
}

/// Drives one session against a runtime context.
#[derive(Debug, Clone)]
pub struct Session {
    ctx: RuntimeContext,
    runner: PipelineRunner,
}

impl Session {
    /// Creates a session with the standard runner.
    #[must_use]
    pub fn new(ctx: RuntimeContext) -> Self {
        Self {
            ctx,
            runner: PipelineRunner::new(),
        }
    }

    /// Sets the runner.
    #[must_use]
    pub fn with_runner(mut self, runner: PipelineRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Returns the runtime context.
    #[must_use]
    pub fn context(&self) -> &RuntimeContext {
        &self.ctx
    }

    /// Runs the session.
    pub async fn run(&self, store: &dyn DescriptionStore, options: SessionOptions) -> SessionOutcome {
        let document = match store.load_document().await {
            Ok(document) => document,
            Err(err) => {
                error!(error = %err, "Cannot load market description");
                return SessionOutcome::Failed(err.into());
            }
        };
        let parsed = parse_description(document)
            .and_then(|description| validate_description(&description).map(|()| description));
        let mut description = match parsed {
            Ok(description) => description,
            Err(err) => {
                warn!(field = %err.field, "{err}");
                return SessionOutcome::Invalid(err);
            }
        };

        if let Some(amount) = options.wrap_amount {
            if let Err(err) = self.wrap(amount).await {
                error!(error = %err, "Token wrapping failed");
                return SessionOutcome::Failed(err.into());
            }
        }
        self.report_balance().await;

        let index = resolve_stage(&description);
        let planned = self.runner.planned_stages(index);
        let Some(next) = planned.first() else {
            info!(market = description.label(), "Nothing left to do");
            return SessionOutcome::UpToDate;
        };

        let prompt = format!(
            "Market '{}' will be processed starting with the {next} stage. Continue?",
            description.label()
        );
        match confirm(self.ctx.gate(), &prompt, true) {
            Ok(_) => {}
            Err(PipelineError::Declined { .. }) => return SessionOutcome::Declined,
            Err(err) => {
                error!(error = %err, "Cannot ask for confirmation");
                return SessionOutcome::Failed(err.into());
            }
        }

        let result = match self.runner.run_stack(&self.ctx, &mut description, index).await {
            Err(PipelineError::Validation(err)) => return SessionOutcome::Invalid(err),
            other => other,
        };

        // Persist whatever progress the run made, failed or not.
        if let Err(err) = store.save(&description).await {
            error!(error = %err, "Cannot save market description");
            return SessionOutcome::Failed(err.into());
        }

        match result {
            Ok(report) => {
                info!(
                    oracle = description.oracle_address().unwrap_or_default(),
                    event = description.event_address().unwrap_or_default(),
                    market = description.market_address().unwrap_or_default(),
                    "Run completed"
                );
                SessionOutcome::Completed {
                    report,
                    description,
                }
            }
            Err(PipelineError::Declined { .. }) => SessionOutcome::Declined,
            Err(err) => SessionOutcome::Failed(err.into()),
        }
    }

    async fn wrap(&self, amount: u128) -> Result<(), LedgerError> {
        let config = self.ctx.config();
        info!(amount = %amount, "Wrapping tokens");
        self.ctx
            .ledger()
            .wrap_tokens(&config.collateral_token, &config.account, amount)
            .await
    }

    async fn report_balance(&self) {
        let config = self.ctx.config();
        match self
            .ctx
            .ledger()
            .token_balance(&config.collateral_token, &config.account)
            .await
        {
            Ok(balance) => info!("Your current collateral token balance is {balance}"),
            Err(err) => warn!(error = %err, "Cannot read collateral token balance"),
        }
    }
}
