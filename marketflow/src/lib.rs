//! # Marketflow
//!
//! Resumable, staged provisioning of prediction markets.
//!
//! A market is provisioned in five stages: create an oracle, create a
//! categorical or scalar event, create a market, fund it and resolve it.
//! Progress is recorded in a persisted workflow description, so an
//! interrupted run picks up where it stopped:
//!
//! - **Resume-point resolution**: the next stage is derived from the
//!   progress markers already present in the description
//! - **Fail-forward execution**: fields written before a failing stage are kept
//! - **Confirmation gates**: funding asks before spending collateral
//! - **Ledger seam**: every external operation goes through [`ledger::LedgerClient`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use marketflow::prelude::*;
//!
//! let ctx = RuntimeContext::new(config, Arc::new(SandboxLedger::new()));
//! let store = JsonFileStore::new("./conf/market.json");
//!
//! let outcome = Session::new(ctx).run(&store, SessionOptions::default()).await;
//! std::process::exit(outcome.exit_code());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod confirmation;
pub mod context;
pub mod core;
pub mod description;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod pipeline;
pub mod session;
pub mod stages;
pub mod store;
pub mod validation;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{LedgerConfig, DEFAULT_CONFIG_PATH, DEFAULT_DESCRIPTION_PATH};
    pub use crate::confirmation::{confirm, AutoApprove, ConfirmationGate, ScriptedGate};
    pub use crate::context::RuntimeContext;
    pub use crate::core::{StageIndex, StageKind, StageStatus};
    pub use crate::description::{Address, OutcomeType, WorkflowDescription};
    pub use crate::errors::{
        LedgerError, MarketflowError, PipelineError, StageError, ValidationError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::ledger::{LedgerClient, SandboxLedger};
    pub use crate::pipeline::{resolve_document, resolve_stage, PipelineRunner, RunReport, StageTable};
    pub use crate::session::{Session, SessionOptions, SessionOutcome};
    pub use crate::stages::{Stage, StageRegistry};
    pub use crate::store::{DescriptionStore, InMemoryStore, JsonFileStore};
    pub use crate::validation::{parse_description, validate_description};
}
