//! Confirmation gate for human-in-the-loop checkpoints.
//!
//! A gate answers yes/no questions and blocks the calling thread until it
//! has an answer. [`confirm`] layers the decline policy on top: a declined
//! fatal confirmation becomes [`PipelineError::Declined`], which the host
//! turns into a clean exit, while a declined non-fatal confirmation just
//! returns `false` so the caller can skip a stage.

use crate::errors::PipelineError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::{info, warn};

/// Source of yes/no answers.
pub trait ConfirmationGate: Send + Sync {
    /// Asks `prompt` and blocks until answered.
    fn ask(&self, prompt: &str) -> Result<bool, PipelineError>;
}

/// Asks `prompt` through `gate`, applying the decline policy.
///
/// Returns `Ok(true)` on approval and `Ok(false)` on a non-fatal decline.
/// A decline with `exit_on_decline` set returns [`PipelineError::Declined`].
pub fn confirm(
    gate: &dyn ConfirmationGate,
    prompt: &str,
    exit_on_decline: bool,
) -> Result<bool, PipelineError> {
    if gate.ask(prompt)? {
        return Ok(true);
    }
    if exit_on_decline {
        warn!(prompt, "Confirmation declined, stopping");
        return Err(PipelineError::Declined {
            prompt: prompt.to_string(),
        });
    }
    info!(prompt, "Confirmation declined, skipping");
    Ok(false)
}

/// Approves every prompt (`--yes`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl ConfirmationGate for AutoApprove {
    fn ask(&self, prompt: &str) -> Result<bool, PipelineError> {
        info!(prompt, "Auto-approved");
        Ok(true)
    }
}

/// Replays a fixed list of answers and records the prompts it was asked.
///
/// Once the answers run out every further prompt gets the fallback answer.
#[derive(Debug)]
pub struct ScriptedGate {
    answers: Mutex<VecDeque<bool>>,
    fallback: bool,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGate {
    /// Creates a gate that replays `answers`, then answers `fallback`.
    #[must_use]
    pub fn new(answers: impl IntoIterator<Item = bool>, fallback: bool) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            fallback,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Creates a gate that always answers `answer`.
    #[must_use]
    pub fn always(answer: bool) -> Self {
        Self::new([], answer)
    }

    /// Returns the prompts asked so far.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

impl ConfirmationGate for ScriptedGate {
    fn ask(&self, prompt: &str) -> Result<bool, PipelineError> {
        self.prompts.lock().push(prompt.to_string());
        Ok(self.answers.lock().pop_front().unwrap_or(self.fallback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_passes_through() {
        let gate = ScriptedGate::always(true);
        assert_eq!(confirm(&gate, "Fund?", true), Ok(true));
        assert_eq!(confirm(&gate, "Fund?", false), Ok(true));
    }

    #[test]
    fn test_non_fatal_decline_returns_false() {
        let gate = ScriptedGate::always(false);
        assert_eq!(confirm(&gate, "Fund?", false), Ok(false));
    }

    #[test]
    fn test_fatal_decline_is_an_error() {
        let gate = ScriptedGate::always(false);
        let err = confirm(&gate, "Proceed?", true).unwrap_err();
        assert!(err.is_declined());
    }

    #[test]
    fn test_scripted_answers_then_fallback() {
        let gate = ScriptedGate::new([false, true], false);
        assert_eq!(gate.ask("a"), Ok(false));
        assert_eq!(gate.ask("b"), Ok(true));
        assert_eq!(gate.ask("c"), Ok(false));
        assert_eq!(gate.prompts(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_auto_approve() {
        assert_eq!(confirm(&AutoApprove, "Proceed?", true), Ok(true));
    }
}
