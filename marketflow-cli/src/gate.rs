//! Terminal confirmation prompts.

use std::fmt::Display;

use dialoguer::Confirm;
use marketflow::confirmation::ConfirmationGate;
use marketflow::errors::PipelineError;

/// Asks on the terminal and blocks until the user answers.
///
/// Must be used from a multi-threaded tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalGate;

impl ConfirmationGate for TerminalGate {
    fn ask(&self, prompt: &str) -> Result<bool, PipelineError> {
        answer_blocking(|| {
            Confirm::new()
                .with_prompt(prompt)
                .default(false)
                .interact()
        })
    }
}

/// Runs a blocking prompt after handing the worker thread's other tasks to
/// another thread.
fn answer_blocking<F, E>(prompt: F) -> Result<bool, PipelineError>
where
    F: FnOnce() -> Result<bool, E>,
    E: Display,
{
    tokio::task::block_in_place(prompt).map_err(|e| PipelineError::Confirmation(e.to_string()))
}
