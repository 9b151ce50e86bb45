//! The ledger seam.
//!
//! Stages never talk to a chain directly: every external operation goes
//! through a [`LedgerClient`]. Contract semantics, fees and signing belong to
//! the client implementation. [`SandboxLedger`] is a deterministic in-process
//! implementation used by the CLI and the tests.

mod sandbox;

pub use sandbox::{FailurePlan, LedgerOperation, SandboxLedger};

use crate::description::Address;
use crate::errors::LedgerError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Metadata describing the event an oracle reports on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleRequest {
    /// Event title.
    pub title: String,
    /// Event description.
    pub description: String,
    /// Resolution date (RFC 3339).
    pub resolution_date: String,
    /// Outcome labels, for categorical events.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outcomes: Vec<String>,
}

/// Parameters of a categorical event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoricalEventRequest {
    /// Collateral token backing the outcome tokens.
    pub collateral_token: Address,
    /// Oracle that reports the outcome.
    pub oracle: Address,
    /// Number of outcomes.
    pub outcome_count: u8,
}

/// Parameters of a scalar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalarEventRequest {
    /// Collateral token backing the outcome tokens.
    pub collateral_token: Address,
    /// Oracle that reports the outcome.
    pub oracle: Address,
    /// Lowest reportable value.
    pub lower_bound: i128,
    /// Highest reportable value.
    pub upper_bound: i128,
}

/// Parameters of a market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRequest {
    /// Event the market trades on.
    pub event: Address,
    /// Market maker used for pricing.
    pub market_maker: Address,
    /// Fee charged on trades.
    pub fee: u128,
}

/// Operations offered by a ledger.
///
/// Every create operation is non-idempotent: calling it twice creates two
/// artifacts and pays twice.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Returns the balance of `account` in `token`, in base units.
    async fn token_balance(&self, token: &Address, account: &Address) -> Result<u128, LedgerError>;

    /// Wraps native currency into the collateral token.
    async fn wrap_tokens(&self, token: &Address, account: &Address, amount: u128) -> Result<(), LedgerError>;

    /// Creates a centralized oracle and returns its address.
    async fn create_centralized_oracle(&self, request: &OracleRequest) -> Result<Address, LedgerError>;

    /// Creates a categorical event and returns its address.
    async fn create_categorical_event(
        &self,
        request: &CategoricalEventRequest,
    ) -> Result<Address, LedgerError>;

    /// Creates a scalar event and returns its address.
    async fn create_scalar_event(&self, request: &ScalarEventRequest) -> Result<Address, LedgerError>;

    /// Creates a market and returns its address.
    async fn create_market(&self, request: &MarketRequest) -> Result<Address, LedgerError>;

    /// Funds a market with `amount` collateral base units from `account`.
    async fn fund_market(&self, market: &Address, account: &Address, amount: u128) -> Result<(), LedgerError>;

    /// Reports the winning outcome and resolves the market.
    async fn resolve_market(&self, market: &Address, outcome: i128) -> Result<(), LedgerError>;
}
