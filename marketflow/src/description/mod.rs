//! The workflow description: the persisted record of one provisioning run.
//!
//! A description carries the market parameters supplied by the user and the
//! progress markers written by the stages. Progress markers form a strict
//! prefix chain (see [`ProgressField`]); the resume point of a run is derived
//! from them rather than stored.

mod address;
pub mod amount;
mod outcome;

pub use address::{Address, ADDRESS_BYTES, ADDRESS_LEN};
pub use outcome::MAX_DECIMALS;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The kind of outcome an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeType {
    /// One of a fixed list of labelled outcomes.
    Categorical,
    /// An integer within a bounded range.
    Scalar,
}

impl fmt::Display for OutcomeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Categorical => write!(f, "Categorical"),
            Self::Scalar => write!(f, "Scalar"),
        }
    }
}

/// A progress marker in the prefix chain, in chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgressField {
    /// Written by the oracle stage.
    OracleAddress,
    /// Written by the event stage.
    EventAddress,
    /// Written by the market stage.
    MarketAddress,
    /// Supplied by the user once the outcome is known.
    WinningOutcome,
}

impl ProgressField {
    /// The prefix chain, in order.
    pub const CHAIN: [Self; 4] = [
        Self::OracleAddress,
        Self::EventAddress,
        Self::MarketAddress,
        Self::WinningOutcome,
    ];

    /// Returns the persisted key of the field.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::OracleAddress => "oracleAddress",
            Self::EventAddress => "eventAddress",
            Self::MarketAddress => "marketAddress",
            Self::WinningOutcome => "winningOutcome",
        }
    }
}

impl fmt::Display for ProgressField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The value held by a progress marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Marker<'a> {
    /// The field is missing or null.
    Absent,
    /// The field holds a string.
    Text(&'a str),
    /// The field holds a non-string value.
    Other(&'a Value),
}

impl<'a> Marker<'a> {
    /// Classifies an optional JSON value.
    #[must_use]
    pub fn of_value(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Absent,
            Some(Value::String(text)) => Self::Text(text),
            Some(other) => Self::Other(other),
        }
    }

    /// Returns true if the marker counts as completed progress.
    ///
    /// Strings that are empty after trimming count as absent; any other
    /// present value counts, whatever it holds.
    #[must_use]
    pub fn is_present(&self) -> bool {
        match self {
            Self::Absent => false,
            Self::Text(text) => !text.trim().is_empty(),
            Self::Other(_) => true,
        }
    }
}

/// A workflow description.
///
/// Every field is optional at the type level so that any persisted shape
/// loads; the validator decides which fields a run actually needs. Keys this
/// type does not know about are kept in [`WorkflowDescription::extra`] and
/// written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkflowDescription {
    /// Event title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Event description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// When the event resolves (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_date: Option<String>,
    /// Selects the event variant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome_type: Option<OutcomeType>,
    /// Outcome labels of a categorical event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcomes: Option<Vec<String>>,
    /// Lower bound of a scalar event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower_bound: Option<Value>,
    /// Upper bound of a scalar event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<Value>,
    /// Decimal places of a scalar outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u32>,
    /// Unit label of a scalar outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Market fee.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<Value>,
    /// Market funding, in collateral base units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding: Option<Value>,
    /// Currency label used for reporting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Written by the oracle stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oracle_address: Option<String>,
    /// Written by the event stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_address: Option<String>,
    /// Written by the market stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_address: Option<String>,
    /// Supplied by the user once the outcome is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winning_outcome: Option<Value>,
    /// Keys not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkflowDescription {
    /// Creates an empty description of the given outcome type.
    #[must_use]
    pub fn new(outcome_type: OutcomeType) -> Self {
        Self {
            outcome_type: Some(outcome_type),
            ..Self::default()
        }
    }

    /// Returns the marker held by a progress field.
    #[must_use]
    pub fn marker(&self, field: ProgressField) -> Marker<'_> {
        match field {
            ProgressField::OracleAddress => text_marker(self.oracle_address.as_deref()),
            ProgressField::EventAddress => text_marker(self.event_address.as_deref()),
            ProgressField::MarketAddress => text_marker(self.market_address.as_deref()),
            ProgressField::WinningOutcome => Marker::of_value(self.winning_outcome.as_ref()),
        }
    }

    /// Returns true if the progress field counts as completed.
    #[must_use]
    pub fn has(&self, field: ProgressField) -> bool {
        self.marker(field).is_present()
    }

    /// Returns the oracle address, if the oracle stage completed.
    #[must_use]
    pub fn oracle_address(&self) -> Option<&str> {
        present(self.oracle_address.as_deref())
    }

    /// Returns the event address, if the event stage completed.
    #[must_use]
    pub fn event_address(&self) -> Option<&str> {
        present(self.event_address.as_deref())
    }

    /// Returns the market address, if the market stage completed.
    #[must_use]
    pub fn market_address(&self) -> Option<&str> {
        present(self.market_address.as_deref())
    }

    /// Returns the winning outcome, if one was supplied.
    #[must_use]
    pub fn winning_outcome(&self) -> Option<&Value> {
        self.has(ProgressField::WinningOutcome)
            .then_some(self.winning_outcome.as_ref())
            .flatten()
    }

    /// Returns a short label for logs.
    #[must_use]
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("untitled market")
    }
}

fn text_marker(value: Option<&str>) -> Marker<'_> {
    value.map_or(Marker::Absent, Marker::Text)
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
