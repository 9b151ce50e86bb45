//! Stage kind and status enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The provisioning step a stage performs.
///
/// Variants are declared in execution order, so the derived `Ord` matches
/// the order in which a full run visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Create the centralized oracle.
    Oracle,
    /// Create the categorical or scalar event.
    Event,
    /// Create the market on top of the event.
    Market,
    /// Fund the market with collateral.
    Fund,
    /// Resolve the market with the winning outcome.
    Resolve,
}

impl StageKind {
    /// All stage kinds, in execution order.
    pub const ALL: [Self; 5] = [
        Self::Oracle,
        Self::Event,
        Self::Market,
        Self::Fund,
        Self::Resolve,
    ];

    /// Returns true if the stage must be confirmed before it runs.
    #[must_use]
    pub fn requires_confirmation(self) -> bool {
        match self {
            Self::Fund => true,
            Self::Oracle | Self::Event | Self::Market | Self::Resolve => false,
        }
    }

    /// Returns the description field this stage writes, if any.
    #[must_use]
    pub fn produced_field(self) -> Option<&'static str> {
        match self {
            Self::Oracle => Some("oracleAddress"),
            Self::Event => Some("eventAddress"),
            Self::Market => Some("marketAddress"),
            Self::Fund | Self::Resolve => None,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Oracle => write!(f, "oracle"),
            Self::Event => write!(f, "event"),
            Self::Market => write!(f, "market"),
            Self::Fund => write!(f, "fund"),
            Self::Resolve => write!(f, "resolve"),
        }
    }
}

/// The execution status of a stage within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage completed successfully.
    Ok,
    /// Stage was skipped after a declined confirmation.
    Skip,
    /// Stage failed.
    Fail,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Skip => write!(f, "skip"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

impl StageStatus {
    /// Returns true if the status lets the run continue.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok | Self::Skip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_kind_display() {
        assert_eq!(StageKind::Oracle.to_string(), "oracle");
        assert_eq!(StageKind::Fund.to_string(), "fund");
        assert_eq!(StageKind::Resolve.to_string(), "resolve");
    }

    #[test]
    fn test_only_funding_requires_confirmation() {
        let gated: Vec<_> = StageKind::ALL
            .into_iter()
            .filter(|kind| kind.requires_confirmation())
            .collect();
        assert_eq!(gated, vec![StageKind::Fund]);
    }

    #[test]
    fn test_stage_kind_order() {
        let mut kinds = StageKind::ALL.to_vec();
        kinds.reverse();
        kinds.sort();
        assert_eq!(kinds, StageKind::ALL.to_vec());
    }

    #[test]
    fn test_stage_status_serialize() {
        let json = serde_json::to_string(&StageStatus::Skip).unwrap();
        assert_eq!(json, r#""skip""#);
        assert!(StageStatus::Skip.is_success());
        assert!(!StageStatus::Fail.is_success());
    }
}
