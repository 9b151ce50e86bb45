//! The derived progress position of a description.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of the last completed position in the progress chain.
///
/// `-1` means nothing has completed; `3` means every progress marker,
/// including the winning outcome, is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub struct StageIndex(i8);

impl StageIndex {
    /// No stage has completed.
    pub const NONE: Self = Self(-1);
    /// The oracle exists.
    pub const ORACLE: Self = Self(0);
    /// The event exists.
    pub const EVENT: Self = Self(1);
    /// The market exists.
    pub const MARKET: Self = Self(2);
    /// The winning outcome is known.
    pub const OUTCOME: Self = Self(3);

    /// Every valid index, lowest first.
    pub const ALL: [Self; 5] = [
        Self::NONE,
        Self::ORACLE,
        Self::EVENT,
        Self::MARKET,
        Self::OUTCOME,
    ];

    /// Creates an index from a raw value, if it is in range.
    #[must_use]
    pub fn new(value: i8) -> Option<Self> {
        (Self::NONE.0..=Self::OUTCOME.0)
            .contains(&value)
            .then_some(Self(value))
    }

    /// Creates an index from the position of the last present field.
    pub(crate) fn from_position(position: Option<usize>) -> Self {
        position
            .and_then(|p| i8::try_from(p).ok())
            .and_then(Self::new)
            .unwrap_or(Self::NONE)
    }

    /// Returns the raw value.
    #[must_use]
    pub fn value(self) -> i8 {
        self.0
    }

    /// Returns true if no stage has completed.
    #[must_use]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl Default for StageIndex {
    fn default() -> Self {
        Self::NONE
    }
}

impl TryFrom<i8> for StageIndex {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("stage index {value} is outside -1..=3"))
    }
}

impl From<StageIndex> for i8 {
    fn from(index: StageIndex) -> Self {
        index.0
    }
}

impl fmt::Display for StageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
