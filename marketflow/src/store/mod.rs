//! Persistence of workflow descriptions.
//!
//! The description is read once before a run and written back after it,
//! whether the run succeeded or not, so progress made before a failure is
//! never lost. Stores hand out the raw JSON document; turning it into a
//! [`WorkflowDescription`] is [`parse_description`]'s job.

use crate::description::WorkflowDescription;
use crate::errors::StoreError;
use crate::validation::parse_description;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Loads and saves a single workflow description.
#[async_trait]
pub trait DescriptionStore: Send + Sync {
    /// Loads the stored document as raw JSON.
    async fn load_document(&self) -> Result<Value, StoreError>;

    /// Loads the stored document and parses it into a description.
    async fn load(&self) -> Result<WorkflowDescription, StoreError> {
        let document = self.load_document().await?;
        Ok(parse_description(document)?)
    }

    /// Replaces the stored description.
    async fn save(&self, description: &WorkflowDescription) -> Result<(), StoreError>;
}

/// Stores the description as pretty-printed JSON in a file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl DescriptionStore for JsonFileStore {
    async fn load_document(&self) -> Result<Value, StoreError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        if raw.trim().is_empty() {
            return Err(StoreError::Empty);
        }
        Ok(serde_json::from_str(&raw)?)
    }

    async fn save(&self, description: &WorkflowDescription) -> Result<(), StoreError> {
        write_json(&self.path, description).await?;
        debug!(path = %self.path.display(), "Saved description");
        Ok(())
    }
}

/// Writes `value` as pretty JSON to a sibling of `path`, then renames it
/// over `path`.
pub(crate) async fn write_json(path: &Path, value: &impl Serialize) -> Result<(), StoreError> {
    let mut content = serde_json::to_vec_pretty(value)?;
    content.push(b'\n');

    let io_error = |source: std::io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let temp_path = parent.join(format!(".tmp_{}", Uuid::new_v4()));
    tokio::fs::write(&temp_path, &content).await.map_err(io_error)?;
    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(io_error(e));
    }
    Ok(())
}

/// Keeps the description document in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    document: Mutex<Option<Value>>,
    saves: Mutex<usize>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `description`.
    #[must_use]
    pub fn with_description(description: WorkflowDescription) -> Self {
        Self::with_document(serde_json::to_value(description).unwrap_or_default())
    }

    /// Creates a store holding a raw document, which need not be a valid
    /// description.
    #[must_use]
    pub fn with_document(document: Value) -> Self {
        Self {
            document: Mutex::new(Some(document)),
            saves: Mutex::new(0),
        }
    }

    /// Returns the stored description, if the document parses.
    #[must_use]
    pub fn snapshot(&self) -> Option<WorkflowDescription> {
        let document = self.document.lock().clone()?;
        parse_description(document).ok()
    }

    /// Returns how many times the description was saved.
    #[must_use]
    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }
}

#[async_trait]
impl DescriptionStore for InMemoryStore {
    async fn load_document(&self) -> Result<Value, StoreError> {
        self.document.lock().clone().ok_or(StoreError::Empty)
    }

    async fn save(&self, description: &WorkflowDescription) -> Result<(), StoreError> {
        let document = serde_json::to_value(description)?;
        *self.document.lock() = Some(document);
        *self.saves.lock() += 1;
        Ok(())
    }
}
