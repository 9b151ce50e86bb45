//! Oracle creation.

use super::{required_text, Stage};
use crate::context::RuntimeContext;
use crate::core::StageKind;
use crate::description::{OutcomeType, WorkflowDescription};
use crate::errors::LedgerError;
use crate::ledger::OracleRequest;
use async_trait::async_trait;
use tracing::info;

const OPERATION: &str = "create_centralized_oracle";

/// Creates the centralized oracle and records `oracleAddress`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleStage;

impl OracleStage {
    fn request(description: &WorkflowDescription) -> Result<OracleRequest, LedgerError> {
        let outcomes = match description.outcome_type {
            Some(OutcomeType::Categorical) => description.outcomes.clone().unwrap_or_default(),
            _ => Vec::new(),
        };
        Ok(OracleRequest {
            title: required_text(OPERATION, "title", description.title.as_deref())?.to_string(),
            description: required_text(OPERATION, "description", description.description.as_deref())?
                .to_string(),
            resolution_date: required_text(
                OPERATION,
                "resolutionDate",
                description.resolution_date.as_deref(),
            )?
            .to_string(),
            outcomes,
        })
    }
}

#[async_trait]
impl Stage for OracleStage {
    fn kind(&self) -> StageKind {
        StageKind::Oracle
    }

    async fn execute(
        &self,
        description: &WorkflowDescription,
        ctx: &RuntimeContext,
    ) -> Result<WorkflowDescription, LedgerError> {
        let request = Self::request(description)?;
        let address = ctx.ledger().create_centralized_oracle(&request).await?;
        info!(oracle = %address, "Centralized oracle created");

        let mut updated = description.clone();
        updated.oracle_address = Some(address.to_string());
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::Address;
    use crate::ledger::MockLedgerClient;
    use crate::stages::fixtures;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_writes_oracle_address() {
        let mut ledger = MockLedgerClient::new();
        ledger
            .expect_create_centralized_oracle()
            .withf(|req: &OracleRequest| req.title == "Which color wins?" && req.outcomes.len() == 3)
            .times(1)
            .returning(|_| Ok(Address::from_bytes([0x11; 20])));
        let ctx = RuntimeContext::new(fixtures::config(), Arc::new(ledger));

        let input = fixtures::categorical();
        let output = OracleStage.execute(&input, &ctx).await.unwrap();

        assert_eq!(
            output.oracle_address.as_deref(),
            Some("0x1111111111111111111111111111111111111111")
        );
        assert_eq!(output.event_address, None);
        assert_eq!(output.title, input.title);
    }

    #[tokio::test]
    async fn test_scalar_request_has_no_outcomes() {
        let mut ledger = MockLedgerClient::new();
        ledger
            .expect_create_centralized_oracle()
            .withf(|req: &OracleRequest| req.outcomes.is_empty())
            .times(1)
            .returning(|_| Ok(Address::from_bytes([0x11; 20])));
        let ctx = RuntimeContext::new(fixtures::config(), Arc::new(ledger));

        OracleStage.execute(&fixtures::scalar(), &ctx).await.unwrap();
    }

    #[tokio::test]
    async fn test_failure_is_propagated() {
        let mut ledger = MockLedgerClient::new();
        ledger
            .expect_create_centralized_oracle()
            .times(1)
            .returning(|_| Err(LedgerError::Transport("connection refused".into())));
        let ctx = RuntimeContext::new(fixtures::config(), Arc::new(ledger));

        let err = OracleStage.execute(&fixtures::scalar(), &ctx).await.unwrap_err();
        assert_eq!(err, LedgerError::Transport("connection refused".into()));
    }

    #[tokio::test]
    async fn test_missing_title_makes_no_call() {
        let ledger = MockLedgerClient::new();
        let ctx = RuntimeContext::new(fixtures::config(), Arc::new(ledger));
        let mut input = fixtures::scalar();
        input.title = None;

        let err = OracleStage.execute(&input, &ctx).await.unwrap_err();
        assert!(matches!(err, LedgerError::Rejected { .. }));
    }
}
