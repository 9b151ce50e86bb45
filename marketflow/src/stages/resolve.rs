//! Market resolution.
//!
//! Resolution is the last stage and never fails the run: a missing outcome
//! or a rejected report is logged and the description is returned as is.

use super::{required_address, Stage};
use crate::context::RuntimeContext;
use crate::core::StageKind;
use crate::description::WorkflowDescription;
use crate::errors::LedgerError;
use async_trait::async_trait;
use tracing::{error, info, warn};

const OPERATION: &str = "resolve_market";

/// Reports the winning outcome and resolves the market.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveStage;

#[async_trait]
impl Stage for ResolveStage {
    fn kind(&self) -> StageKind {
        StageKind::Resolve
    }

    async fn execute(
        &self,
        description: &WorkflowDescription,
        ctx: &RuntimeContext,
    ) -> Result<WorkflowDescription, LedgerError> {
        let market = match required_address(OPERATION, "marketAddress", description.market_address()) {
            Ok(market) => market,
            Err(err) => {
                error!(error = %err, "Cannot resolve market");
                return Ok(description.clone());
            }
        };

        let outcome = match description.outcome_value() {
            None => {
                warn!("No winning outcome set for market {market}");
                return Ok(description.clone());
            }
            Some(Err(reason)) => {
                error!(market = %market, reason = %reason, "Winning outcome is unusable");
                return Ok(description.clone());
            }
            Some(Ok(outcome)) => outcome,
        };

        match ctx.ledger().resolve_market(&market, outcome).await {
            Ok(()) => info!(
                market = %market,
                outcome = %outcome,
                "Market resolved with winning outcome {}",
                description.format_outcome(outcome)
            ),
            Err(err) => error!(market = %market, error = %err, "Market resolution failed"),
        }
        Ok(description.clone())
    }
}
