//! Market funding.

use super::{required_address, Stage};
use crate::context::RuntimeContext;
use crate::core::StageKind;
use crate::description::amount::amount_from_value;
use crate::description::WorkflowDescription;
use crate::errors::LedgerError;
use async_trait::async_trait;
use tracing::{error, info};

const OPERATION: &str = "fund_market";

/// Funds the market with the description's `funding` amount.
///
/// Funding is not a progress marker, so a successful run returns the
/// description unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct FundStage;

#[async_trait]
impl Stage for FundStage {
    fn kind(&self) -> StageKind {
        StageKind::Fund
    }

    async fn execute(
        &self,
        description: &WorkflowDescription,
        ctx: &RuntimeContext,
    ) -> Result<WorkflowDescription, LedgerError> {
        let market = required_address(OPERATION, "marketAddress", description.market_address())?;
        let amount = match description.funding.as_ref() {
            Some(value) => amount_from_value(value).map_err(|r| LedgerError::rejected(OPERATION, r))?,
            None => return Err(LedgerError::rejected(OPERATION, "funding is not set")),
        };
        let account = ctx.config().account;

        if let Err(err) = ctx.ledger().fund_market(&market, &account, amount).await {
            error!(
                market = %market,
                amount = %amount,
                "Are you sure you have enough collateral tokens for funding the market?"
            );
            return Err(err);
        }
        info!(
            market = %market,
            amount = %amount,
            currency = description.currency.as_deref().unwrap_or_default(),
            "Market funded"
        );
        Ok(description.clone())
    }
}
