//! Market creation.

use super::{required_address, Stage};
use crate::context::RuntimeContext;
use crate::core::StageKind;
use crate::description::amount::amount_from_value;
use crate::description::WorkflowDescription;
use crate::errors::LedgerError;
use crate::ledger::MarketRequest;
use async_trait::async_trait;
use tracing::info;

const OPERATION: &str = "create_market";

/// Creates the market on the event and records `marketAddress`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketStage;

#[async_trait]
impl Stage for MarketStage {
    fn kind(&self) -> StageKind {
        StageKind::Market
    }

    async fn execute(
        &self,
        description: &WorkflowDescription,
        ctx: &RuntimeContext,
    ) -> Result<WorkflowDescription, LedgerError> {
        let event = required_address(OPERATION, "eventAddress", description.event_address())?;
        let fee = match description.fee.as_ref() {
            Some(value) => amount_from_value(value).map_err(|r| LedgerError::rejected(OPERATION, r))?,
            None => return Err(LedgerError::rejected(OPERATION, "fee is not set")),
        };
        let request = MarketRequest {
            event,
            market_maker: ctx.config().lmsr_market_maker,
            fee,
        };

        let address = ctx.ledger().create_market(&request).await?;
        info!(market = %address, fee = %fee, "Market created");

        let mut updated = description.clone();
        updated.market_address = Some(address.to_string());
        Ok(updated)
    }
}
