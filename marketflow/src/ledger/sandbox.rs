//! A deterministic in-process ledger.
//!
//! No blockchain is involved. The artifacts and balances a sandbox holds can
//! be written to a JSON state file and reopened by a later process, so a
//! description provisioned against the sandbox can be resumed.

use super::{CategoricalEventRequest, LedgerClient, MarketRequest, OracleRequest, ScalarEventRequest};
use crate::description::Address;
use crate::errors::{LedgerError, StoreError};
use crate::store::write_json;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// The operations a ledger client exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerOperation {
    /// `token_balance`
    TokenBalance,
    /// `wrap_tokens`
    WrapTokens,
    /// `create_centralized_oracle`
    CreateOracle,
    /// `create_categorical_event`
    CreateCategoricalEvent,
    /// `create_scalar_event`
    CreateScalarEvent,
    /// `create_market`
    CreateMarket,
    /// `fund_market`
    FundMarket,
    /// `resolve_market`
    ResolveMarket,
}

impl LedgerOperation {
    /// Returns true if the operation changes ledger state.
    #[must_use]
    pub fn is_mutation(self) -> bool {
        !matches!(self, Self::TokenBalance)
    }
}

impl fmt::Display for LedgerOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TokenBalance => "token_balance",
            Self::WrapTokens => "wrap_tokens",
            Self::CreateOracle => "create_centralized_oracle",
            Self::CreateCategoricalEvent => "create_categorical_event",
            Self::CreateScalarEvent => "create_scalar_event",
            Self::CreateMarket => "create_market",
            Self::FundMarket => "fund_market",
            Self::ResolveMarket => "resolve_market",
        };
        f.write_str(name)
    }
}

/// One-shot failures injected into a [`SandboxLedger`].
#[derive(Debug, Clone, Default)]
pub struct FailurePlan {
    failures: HashMap<LedgerOperation, LedgerError>,
}

impl FailurePlan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next call of `operation` fail with `error`.
    #[must_use]
    pub fn fail(mut self, operation: LedgerOperation, error: LedgerError) -> Self {
        self.failures.insert(operation, error);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum EventOutcomes {
    Categorical(u8),
    Scalar { lower: i128, upper: i128 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EventState {
    collateral: Address,
    outcomes: EventOutcomes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MarketState {
    event: Address,
    funding: u128,
    resolved: Option<i128>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BalanceEntry {
    token: Address,
    account: Address,
    amount: u128,
}

/// The persisted part of a sandbox. The operation log and injected failures
/// belong to one process and are not kept.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct SandboxSnapshot {
    nonce: u64,
    balances: Vec<BalanceEntry>,
    oracles: BTreeMap<Address, OracleRequest>,
    events: BTreeMap<Address, EventState>,
    markets: BTreeMap<Address, MarketState>,
}

#[derive(Debug, Default)]
struct SandboxState {
    nonce: u64,
    balances: HashMap<(Address, Address), u128>,
    oracles: HashMap<Address, OracleRequest>,
    events: HashMap<Address, EventState>,
    markets: HashMap<Address, MarketState>,
    operations: Vec<LedgerOperation>,
    failures: HashMap<LedgerOperation, LedgerError>,
}

impl SandboxState {
    /// Records the call and returns an injected failure, if one is planned.
    fn enter(&mut self, operation: LedgerOperation) -> Result<(), LedgerError> {
        self.operations.push(operation);
        match self.failures.remove(&operation) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn derive_address(&mut self, operation: LedgerOperation, payload: &impl Serialize) -> Address {
        self.nonce += 1;
        let mut hasher = Sha256::new();
        hasher.update(self.nonce.to_be_bytes());
        hasher.update(operation.to_string().as_bytes());
        hasher.update(serde_json::to_vec(payload).unwrap_or_default());
        Address::from_digest(&hasher.finalize())
    }

    fn snapshot(&self) -> SandboxSnapshot {
        let mut balances: Vec<BalanceEntry> = self
            .balances
            .iter()
            .map(|(&(token, account), &amount)| BalanceEntry {
                token,
                account,
                amount,
            })
            .collect();
        balances.sort_by_key(|entry| (entry.token, entry.account));
        SandboxSnapshot {
            nonce: self.nonce,
            balances,
            oracles: self.oracles.iter().map(|(a, o)| (*a, o.clone())).collect(),
            events: self.events.iter().map(|(a, e)| (*a, e.clone())).collect(),
            markets: self.markets.iter().map(|(a, m)| (*a, m.clone())).collect(),
        }
    }
}

impl From<SandboxSnapshot> for SandboxState {
    fn from(snapshot: SandboxSnapshot) -> Self {
        Self {
            nonce: snapshot.nonce,
            balances: snapshot
                .balances
                .into_iter()
                .map(|entry| ((entry.token, entry.account), entry.amount))
                .collect(),
            oracles: snapshot.oracles.into_iter().collect(),
            events: snapshot.events.into_iter().collect(),
            markets: snapshot.markets.into_iter().collect(),
            operations: Vec::new(),
            failures: HashMap::new(),
        }
    }
}

/// An in-memory ledger that derives artifact addresses from a hash of the
/// request and a nonce, tracks collateral balances and market funding, and
/// enforces the prerequisites a real chain would (an event needs an oracle,
/// a market needs an event, funding needs collateral).
#[derive(Debug, Default)]
pub struct SandboxLedger {
    state: Mutex<SandboxState>,
}

impl SandboxLedger {
    /// Creates an empty sandbox ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the sandbox state kept at `path`.
    ///
    /// A missing or empty file yields an empty sandbox.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        if raw.trim().is_empty() {
            debug!(path = %path.display(), "Starting an empty sandbox");
            return Ok(Self::new());
        }
        let snapshot: SandboxSnapshot = serde_json::from_str(&raw)?;
        debug!(
            path = %path.display(),
            markets = snapshot.markets.len(),
            "Opened sandbox state"
        );
        Ok(Self {
            state: Mutex::new(snapshot.into()),
        })
    }

    /// Writes the sandbox's artifacts and balances to `path`.
    pub async fn persist(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let snapshot = self.state.lock().snapshot();
        write_json(path.as_ref(), &snapshot).await
    }

    /// Credits `amount` of `token` to `account`.
    #[must_use]
    pub fn with_balance(self, token: Address, account: Address, amount: u128) -> Self {
        *self.state.lock().balances.entry((token, account)).or_default() += amount;
        self
    }

    /// Installs one-shot failures.
    #[must_use]
    pub fn with_failures(self, plan: FailurePlan) -> Self {
        self.state.lock().failures.extend(plan.failures);
        self
    }

    /// Makes the next call of `operation` fail with `error`.
    pub fn fail_next(&self, operation: LedgerOperation, error: LedgerError) {
        self.state.lock().failures.insert(operation, error);
    }

    /// Returns every operation called so far, in order.
    #[must_use]
    pub fn operations(&self) -> Vec<LedgerOperation> {
        self.state.lock().operations.clone()
    }

    /// Returns the number of state-changing operations called so far.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.state
            .lock()
            .operations
            .iter()
            .filter(|op| op.is_mutation())
            .count()
    }

    /// Returns the collateral a market has been funded with.
    #[must_use]
    pub fn market_funding(&self, market: &Address) -> Option<u128> {
        self.state.lock().markets.get(market).map(|m| m.funding)
    }

    /// Returns the outcome a market was resolved with.
    #[must_use]
    pub fn market_resolution(&self, market: &Address) -> Option<i128> {
        self.state.lock().markets.get(market).and_then(|m| m.resolved)
    }

    /// Returns true if an oracle exists at `address`.
    #[must_use]
    pub fn has_oracle(&self, address: &Address) -> bool {
        self.state.lock().oracles.contains_key(address)
    }
}

#[async_trait]
impl LedgerClient for SandboxLedger {
    async fn token_balance(&self, token: &Address, account: &Address) -> Result<u128, LedgerError> {
        let mut state = self.state.lock();
        state.enter(LedgerOperation::TokenBalance)?;
        Ok(state.balances.get(&(*token, *account)).copied().unwrap_or(0))
    }

    async fn wrap_tokens(&self, token: &Address, account: &Address, amount: u128) -> Result<(), LedgerError> {
        let mut state = self.state.lock();
        state.enter(LedgerOperation::WrapTokens)?;
        let balance = state.balances.entry((*token, *account)).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::rejected("wrap_tokens", "balance overflow"))?;
        debug!(%token, %account, amount, "Sandbox wrapped tokens");
        Ok(())
    }

    async fn create_centralized_oracle(&self, request: &OracleRequest) -> Result<Address, LedgerError> {
        let mut state = self.state.lock();
        state.enter(LedgerOperation::CreateOracle)?;
        let address = state.derive_address(LedgerOperation::CreateOracle, request);
        state.oracles.insert(address, request.clone());
        Ok(address)
    }

    async fn create_categorical_event(
        &self,
        request: &CategoricalEventRequest,
    ) -> Result<Address, LedgerError> {
        let mut state = self.state.lock();
        state.enter(LedgerOperation::CreateCategoricalEvent)?;
        if !state.oracles.contains_key(&request.oracle) {
            return Err(LedgerError::UnknownArtifact(format!("oracle {}", request.oracle)));
        }
        if request.outcome_count < 2 {
            return Err(LedgerError::rejected(
                "create_categorical_event",
                "an event needs at least two outcomes",
            ));
        }
        let address = state.derive_address(LedgerOperation::CreateCategoricalEvent, request);
        state.events.insert(
            address,
            EventState {
                collateral: request.collateral_token,
                outcomes: EventOutcomes::Categorical(request.outcome_count),
            },
        );
        Ok(address)
    }

    async fn create_scalar_event(&self, request: &ScalarEventRequest) -> Result<Address, LedgerError> {
        let mut state = self.state.lock();
        state.enter(LedgerOperation::CreateScalarEvent)?;
        if !state.oracles.contains_key(&request.oracle) {
            return Err(LedgerError::UnknownArtifact(format!("oracle {}", request.oracle)));
        }
        if request.lower_bound >= request.upper_bound {
            return Err(LedgerError::rejected(
                "create_scalar_event",
                "lower bound must be below upper bound",
            ));
        }
        let address = state.derive_address(LedgerOperation::CreateScalarEvent, request);
        state.events.insert(
            address,
            EventState {
                collateral: request.collateral_token,
                outcomes: EventOutcomes::Scalar {
                    lower: request.lower_bound,
                    upper: request.upper_bound,
                },
            },
        );
        Ok(address)
    }

    async fn create_market(&self, request: &MarketRequest) -> Result<Address, LedgerError> {
        let mut state = self.state.lock();
        state.enter(LedgerOperation::CreateMarket)?;
        if !state.events.contains_key(&request.event) {
            return Err(LedgerError::UnknownArtifact(format!("event {}", request.event)));
        }
        let address = state.derive_address(LedgerOperation::CreateMarket, request);
        state.markets.insert(
            address,
            MarketState {
                event: request.event,
                funding: 0,
                resolved: None,
            },
        );
        Ok(address)
    }

    async fn fund_market(&self, market: &Address, account: &Address, amount: u128) -> Result<(), LedgerError> {
        let mut state = self.state.lock();
        state.enter(LedgerOperation::FundMarket)?;
        let collateral = state
            .markets
            .get(market)
            .and_then(|m| state.events.get(&m.event))
            .map(|e| e.collateral)
            .ok_or_else(|| LedgerError::UnknownArtifact(format!("market {market}")))?;

        let key = (collateral, *account);
        let available = state.balances.get(&key).copied().unwrap_or(0);
        if available < amount {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available,
            });
        }
        state.balances.insert(key, available - amount);
        if let Some(entry) = state.markets.get_mut(market) {
            entry.funding += amount;
        }
        Ok(())
    }

    async fn resolve_market(&self, market: &Address, outcome: i128) -> Result<(), LedgerError> {
        let mut state = self.state.lock();
        state.enter(LedgerOperation::ResolveMarket)?;
        let entry = state
            .markets
            .get(market)
            .cloned()
            .ok_or_else(|| LedgerError::UnknownArtifact(format!("market {market}")))?;
        if entry.resolved.is_some() {
            return Err(LedgerError::rejected("resolve_market", "market already resolved"));
        }

        let in_range = match state.events.get(&entry.event).map(|e| &e.outcomes) {
            Some(EventOutcomes::Categorical(count)) => (0..i128::from(*count)).contains(&outcome),
            Some(EventOutcomes::Scalar { lower, upper }) => (*lower..=*upper).contains(&outcome),
            None => false,
        };
        if !in_range {
            return Err(LedgerError::rejected(
                "resolve_market",
                format!("outcome {outcome} is outside the event's range"),
            ));
        }

        if let Some(entry) = state.markets.get_mut(market) {
            entry.resolved = Some(outcome);
        }
        Ok(())
    }
}
