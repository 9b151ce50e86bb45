//! The runtime context threaded through every stage.

use crate::config::LedgerConfig;
use crate::confirmation::{AutoApprove, ConfirmationGate};
use crate::events::{EventSink, NoOpEventSink};
use crate::ledger::LedgerClient;
use std::sync::Arc;
use uuid::Uuid;

/// Everything a run needs from the outside world.
///
/// Built once at process start and passed by reference to the runner and
/// every stage.
#[derive(Clone)]
pub struct RuntimeContext {
    /// Run identifier, attached to emitted events.
    run_id: Uuid,
    /// Account and contract configuration.
    config: Arc<LedgerConfig>,
    /// Ledger client performing external operations.
    ledger: Arc<dyn LedgerClient>,
    /// Source of yes/no answers.
    gate: Arc<dyn ConfirmationGate>,
    /// Event sink for emitting events.
    events: Arc<dyn EventSink>,
}

impl RuntimeContext {
    /// Creates a context that auto-approves confirmations and drops events.
    #[must_use]
    pub fn new(config: LedgerConfig, ledger: Arc<dyn LedgerClient>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            config: Arc::new(config),
            ledger,
            gate: Arc::new(AutoApprove),
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the confirmation gate.
    #[must_use]
    pub fn with_gate(mut self, gate: Arc<dyn ConfirmationGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    /// Returns the run identifier.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns the ledger configuration.
    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Returns the ledger client.
    #[must_use]
    pub fn ledger(&self) -> &dyn LedgerClient {
        self.ledger.as_ref()
    }

    /// Returns the confirmation gate.
    #[must_use]
    pub fn gate(&self) -> &dyn ConfirmationGate {
        self.gate.as_ref()
    }

    /// Emits an event tagged with the run identifier.
    pub fn emit(&self, event_type: &str, mut data: serde_json::Value) {
        if let Some(object) = data.as_object_mut() {
            object.insert("run_id".to_string(), serde_json::json!(self.run_id.to_string()));
        }
        self.events.try_emit(event_type, Some(data));
    }
}

impl std::fmt::Debug for RuntimeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeContext")
            .field("run_id", &self.run_id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
