//! Ledger configuration.
//!
//! The configuration file is JSON with camelCase keys:
//!
//! ```json
//! {
//!   "account": "0x…",
//!   "collateralToken": "0x…",
//!   "lmsrMarketMaker": "0x…",
//!   "blockchain": { "protocol": "http", "host": "localhost", "port": 8545 },
//!   "gasPrice": "1e9",
//!   "mnemonic": "…"
//! }
//! ```

use crate::description::amount::amount_from_value;
use crate::description::Address;
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "./conf/config.json";

/// Default location of the workflow description.
pub const DEFAULT_DESCRIPTION_PATH: &str = "./conf/market.json";

/// Where the ledger node listens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockchainEndpoint {
    /// URL scheme.
    #[serde(default = "default_protocol")]
    pub protocol: String,
    /// Host name.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_protocol() -> String {
    "http".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8545
}

impl Default for BlockchainEndpoint {
    fn default() -> Self {
        Self {
            protocol: default_protocol(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl BlockchainEndpoint {
    /// Returns the endpoint as a URL.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

/// Configuration of the account and contracts a run works with.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerConfig {
    /// Account that pays for and owns the created artifacts.
    pub account: Address,
    /// Collateral token backing events and funding markets.
    pub collateral_token: Address,
    /// Market maker contract used for pricing.
    pub lmsr_market_maker: Address,
    /// Ledger node endpoint.
    #[serde(default)]
    pub blockchain: BlockchainEndpoint,
    /// Gas price, in base units.
    #[serde(default = "default_gas_price")]
    pub gas_price: Value,
    /// Gas limit per transaction.
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    /// Wallet mnemonic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<String>,
}

fn default_gas_price() -> Value {
    Value::String("1e9".to_string())
}

fn default_gas_limit() -> u64 {
    4_000_000
}

// Manual Debug impl to avoid leaking the mnemonic
impl std::fmt::Debug for LedgerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerConfig")
            .field("account", &self.account)
            .field("collateral_token", &self.collateral_token)
            .field("lmsr_market_maker", &self.lmsr_market_maker)
            .field("blockchain", &self.blockchain)
            .field("gas_price", &self.gas_price)
            .field("gas_limit", &self.gas_limit)
            .field("mnemonic", &self.mnemonic.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl LedgerConfig {
    /// Creates a configuration with default endpoint and gas settings.
    #[must_use]
    pub fn new(account: Address, collateral_token: Address, lmsr_market_maker: Address) -> Self {
        Self {
            account,
            collateral_token,
            lmsr_market_maker,
            blockchain: BlockchainEndpoint::default(),
            gas_price: default_gas_price(),
            gas_limit: default_gas_limit(),
            mnemonic: None,
        }
    }

    /// Loads and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: PathBuf::from(path),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parses and validates a configuration document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.blockchain.port == 0 {
            return Err(ConfigError::invalid("blockchain.port", "port must be non-zero"));
        }
        if self.blockchain.host.trim().is_empty() {
            return Err(ConfigError::invalid("blockchain.host", "host must not be empty"));
        }
        if self.gas_limit == 0 {
            return Err(ConfigError::invalid("gasLimit", "gas limit must be non-zero"));
        }
        self.gas_price_units()?;
        Ok(())
    }

    /// Returns the gas price in base units.
    pub fn gas_price_units(&self) -> Result<u128, ConfigError> {
        amount_from_value(&self.gas_price).map_err(|message| ConfigError::invalid("gasPrice", message))
    }
}
