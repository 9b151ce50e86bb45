//! Error types for the marketflow engine.
//!
//! The taxonomy follows the lifecycle of a run: malformed input is a
//! [`ValidationError`], a failed ledger call is a [`LedgerError`] that the
//! runner wraps into a [`StageError`], and a declined fatal confirmation is
//! surfaced as [`PipelineError::Declined`] so the host decides how to exit.

use crate::core::StageKind;
use crate::pipeline::RunReport;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for marketflow operations.
#[derive(Debug, Error)]
pub enum MarketflowError {
    /// The pipeline failed or was declined.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// A description could not be loaded or saved.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// A ledger call made outside of a stage failed.
    #[error("{0}")]
    Ledger(#[from] LedgerError),
}

/// Diagnostic metadata attached to validation failures.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Error code (e.g., "DESC-002-OUTCOMES").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ErrorInfo {
    /// Creates a new error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Error raised when a workflow description is malformed or incomplete.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid description field '{field}': {message}")]
pub struct ValidationError {
    /// The offending field, in its persisted (camelCase) spelling.
    pub field: String,
    /// The error message.
    pub message: String,
    /// Optional diagnostic info.
    pub error_info: Option<ErrorInfo>,
}

impl ValidationError {
    /// Creates a new validation error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            error_info: None,
        }
    }

    /// Sets the diagnostic info.
    #[must_use]
    pub fn with_error_info(mut self, info: ErrorInfo) -> Self {
        self.error_info = Some(info);
        self
    }
}

/// Errors returned by a ledger client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The ledger could not be reached.
    #[error("Ledger unreachable: {0}")]
    Transport(String),

    /// The ledger rejected the operation (e.g., a contract revert).
    #[error("Ledger rejected {operation}: {reason}")]
    Rejected {
        /// The operation that was rejected.
        operation: String,
        /// The rejection reason.
        reason: String,
    },

    /// The account does not hold enough collateral.
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Amount required, in base units.
        required: u128,
        /// Amount available, in base units.
        available: u128,
    },

    /// An address passed to or returned by the ledger is malformed.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// The referenced artifact does not exist on the ledger.
    #[error("Unknown artifact: {0}")]
    UnknownArtifact(String),
}

impl LedgerError {
    /// Creates a rejected-operation error.
    #[must_use]
    pub fn rejected(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

/// A stage's external operation failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Stage {stage} failed: {source}")]
pub struct StageError {
    /// The stage that failed.
    pub stage: StageKind,
    /// The underlying ledger failure.
    #[source]
    pub source: LedgerError,
}

impl StageError {
    /// Creates a new stage error.
    #[must_use]
    pub fn new(stage: StageKind, source: LedgerError) -> Self {
        Self { stage, source }
    }
}

/// Outcomes of a pipeline run that stop it early.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// The description failed pre-flight validation. No stage ran.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// A stage failed; stages before it kept their progress.
    #[error("{error}")]
    Stage {
        /// The failure.
        #[source]
        error: StageError,
        /// Records of the run up to and including the failed stage.
        report: Box<RunReport>,
    },

    /// The user declined a confirmation marked fatal.
    #[error("Declined: {prompt}")]
    Declined {
        /// The prompt that was declined.
        prompt: String,
    },

    /// The confirmation gate could not read an answer.
    #[error("Confirmation unavailable: {0}")]
    Confirmation(String),

    /// The stage table names a stage the registry does not hold.
    #[error("No stage registered for {0}")]
    UnregisteredStage(StageKind),
}

impl PipelineError {
    /// Returns true if the run ended because the user declined.
    #[must_use]
    pub fn is_declined(&self) -> bool {
        matches!(self, Self::Declined { .. })
    }

    /// Returns the failed stage, if a stage caused the error.
    #[must_use]
    pub fn failed_stage(&self) -> Option<StageKind> {
        match self {
            Self::Stage { error, .. } => Some(error.stage),
            _ => None,
        }
    }

    /// Returns the report of the run a stage failure interrupted.
    #[must_use]
    pub fn report(&self) -> Option<&RunReport> {
        match self {
            Self::Stage { report, .. } => Some(&**report),
            _ => None,
        }
    }
}

/// Errors raised by description stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The description file could not be read or written.
    #[error("IO error on {path}: {source}")]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The description could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store holds no description.
    #[error("No description stored")]
    Empty,

    /// The stored document is not a well-typed description.
    #[error("{0}")]
    Invalid(#[from] ValidationError),
}

/// Errors raised while loading the ledger configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Cannot read configuration {path}: {source}")]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for the schema.
    #[error("Cannot parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A configuration value is invalid.
    #[error("Invalid configuration value '{key}': {message}")]
    Invalid {
        /// The key of the invalid value.
        key: String,
        /// Why the value is invalid.
        message: String,
    },
}

impl ConfigError {
    /// Creates an invalid-value error.
    #[must_use]
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }
}
