//! The stage table: which stages a run executes from each resume point.

use crate::core::{StageIndex, StageKind};

/// Maps every resume point to the ordered stages still to run.
///
/// The standard table runs the contiguous suffix of stages after the
/// resume point. Funding has no progress marker of its own, so a run that
/// resumes at [`StageIndex::MARKET`] offers funding again behind its
/// confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTable {
    /// Indexed by `StageIndex::value() + 1`.
    rows: [Vec<StageKind>; 5],
}

impl StageTable {
    /// Creates the standard table.
    #[must_use]
    pub fn standard() -> Self {
        use StageKind::{Event, Fund, Market, Oracle, Resolve};
        Self {
            rows: [
                vec![Oracle, Event, Market, Fund, Resolve],
                vec![Event, Market, Fund, Resolve],
                vec![Market, Fund, Resolve],
                vec![Fund, Resolve],
                Vec::new(),
            ],
        }
    }

    /// Creates the standard table with resolution enabled at
    /// [`StageIndex::OUTCOME`].
    ///
    /// Once the winning outcome is recorded on a provisioned market the
    /// standard table has nothing left to run; this one resolves it.
    #[must_use]
    pub fn resolution() -> Self {
        Self::standard().with_row(StageIndex::OUTCOME, vec![StageKind::Resolve])
    }

    /// Replaces the stages run from `index`.
    #[must_use]
    pub fn with_row(mut self, index: StageIndex, stages: Vec<StageKind>) -> Self {
        self.rows[row(index)] = stages;
        self
    }

    /// Returns the stages to run from `index`, in order.
    #[must_use]
    pub fn stages_from(&self, index: StageIndex) -> &[StageKind] {
        &self.rows[row(index)]
    }
}

impl Default for StageTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn row(index: StageIndex) -> usize {
    // StageIndex is bounded to -1..=3.
    usize::try_from(i16::from(index.value()) + 1).unwrap_or_default()
}
