//! Event creation.
//!
//! Events come in two variants selected by `outcomeType`. Both are built
//! from the description and created through [`EventVariant::create`].

use super::{required_address, Stage};
use crate::context::RuntimeContext;
use crate::core::StageKind;
use crate::description::amount::integer_from_value;
use crate::description::{Address, OutcomeType, WorkflowDescription};
use crate::errors::LedgerError;
use crate::ledger::{CategoricalEventRequest, LedgerClient, ScalarEventRequest};
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

const OPERATION: &str = "create_event";

/// An event ready to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventVariant {
    /// A fixed list of outcomes.
    Categorical(CategoricalEventRequest),
    /// An integer outcome within bounds.
    Scalar(ScalarEventRequest),
}

impl EventVariant {
    /// Builds the event variant selected by the description's outcome type.
    pub fn from_description(
        description: &WorkflowDescription,
        collateral_token: Address,
    ) -> Result<Self, LedgerError> {
        let oracle = required_address(OPERATION, "oracleAddress", description.oracle_address())?;
        match description.outcome_type {
            Some(OutcomeType::Categorical) => {
                let count = description.outcomes.as_ref().map_or(0, Vec::len);
                let outcome_count = u8::try_from(count)
                    .map_err(|_| LedgerError::rejected(OPERATION, format!("{count} outcomes")))?;
                Ok(Self::Categorical(CategoricalEventRequest {
                    collateral_token,
                    oracle,
                    outcome_count,
                }))
            }
            Some(OutcomeType::Scalar) => Ok(Self::Scalar(ScalarEventRequest {
                collateral_token,
                oracle,
                lower_bound: bound("lowerBound", description.lower_bound.as_ref())?,
                upper_bound: bound("upperBound", description.upper_bound.as_ref())?,
            })),
            None => Err(LedgerError::rejected(OPERATION, "outcomeType is not set")),
        }
    }

    /// Returns the outcome type of the variant.
    #[must_use]
    pub fn outcome_type(&self) -> OutcomeType {
        match self {
            Self::Categorical(_) => OutcomeType::Categorical,
            Self::Scalar(_) => OutcomeType::Scalar,
        }
    }

    /// Creates the event and returns its address.
    pub async fn create(&self, ledger: &dyn LedgerClient) -> Result<Address, LedgerError> {
        match self {
            Self::Categorical(request) => ledger.create_categorical_event(request).await,
            Self::Scalar(request) => ledger.create_scalar_event(request).await,
        }
    }
}

fn bound(field: &str, value: Option<&Value>) -> Result<i128, LedgerError> {
    let value = value.ok_or_else(|| LedgerError::rejected(OPERATION, format!("{field} is not set")))?;
    integer_from_value(value).map_err(|reason| LedgerError::rejected(OPERATION, reason))
}

/// Creates the event and records `eventAddress`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventStage;

#[async_trait]
impl Stage for EventStage {
    fn kind(&self) -> StageKind {
        StageKind::Event
    }

    async fn execute(
        &self,
        description: &WorkflowDescription,
        ctx: &RuntimeContext,
    ) -> Result<WorkflowDescription, LedgerError> {
        let variant = EventVariant::from_description(description, ctx.config().collateral_token)?;
        let address = variant.create(ctx.ledger()).await?;
        info!(event = %address, outcome_type = %variant.outcome_type(), "Event created");

        let mut updated = description.clone();
        updated.event_address = Some(address.to_string());
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MockLedgerClient;
    use crate::stages::fixtures;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    const ORACLE: &str = "0x1111111111111111111111111111111111111111";

    #[test]
    fn test_variant_selection() {
        let mut scalar = fixtures::scalar();
        scalar.oracle_address = Some(ORACLE.to_string());
        let variant = EventVariant::from_description(&scalar, fixtures::COLLATERAL).unwrap();
        assert_eq!(
            variant,
            EventVariant::Scalar(ScalarEventRequest {
                collateral_token: fixtures::COLLATERAL,
                oracle: Address::from_bytes([0x11; 20]),
                lower_bound: -20,
                upper_bound: 50,
            })
        );

        let mut categorical = fixtures::categorical();
        categorical.oracle_address = Some(ORACLE.to_string());
        let variant = EventVariant::from_description(&categorical, fixtures::COLLATERAL).unwrap();
        assert_eq!(variant.outcome_type(), OutcomeType::Categorical);
        assert!(matches!(
            variant,
            EventVariant::Categorical(CategoricalEventRequest { outcome_count: 3, .. })
        ));
    }

    #[test]
    fn test_missing_oracle_is_rejected() {
        let err = EventVariant::from_description(&fixtures::scalar(), fixtures::COLLATERAL).unwrap_err();
        assert!(matches!(err, LedgerError::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_scalar_event_uses_scalar_operation() {
        let mut ledger = MockLedgerClient::new();
        ledger.expect_create_categorical_event().never();
        ledger
            .expect_create_scalar_event()
            .times(1)
            .returning(|_| Ok(Address::from_bytes([0x22; 20])));
        let ctx = RuntimeContext::new(fixtures::config(), Arc::new(ledger));

        let mut input = fixtures::scalar();
        input.oracle_address = Some(ORACLE.to_string());
        let output = EventStage.execute(&input, &ctx).await.unwrap();

        assert_eq!(
            output.event_address.as_deref(),
            Some("0x2222222222222222222222222222222222222222")
        );
        assert_eq!(output.oracle_address.as_deref(), Some(ORACLE));
    }

    #[tokio::test]
    async fn test_failure_leaves_no_event_address() {
        let mut ledger = MockLedgerClient::new();
        ledger
            .expect_create_categorical_event()
            .times(1)
            .returning(|_| Err(LedgerError::rejected("create_categorical_event", "reverted")));
        let ctx = RuntimeContext::new(fixtures::config(), Arc::new(ledger));

        let mut input = fixtures::categorical();
        input.oracle_address = Some(ORACLE.to_string());
        let err = EventStage.execute(&input, &ctx).await.unwrap_err();
        assert!(matches!(err, LedgerError::Rejected { .. }));
        assert_eq!(input.event_address, None);
    }
}
