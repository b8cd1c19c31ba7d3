//! Workflow persistence
//!
//! The store never performs I/O. Saving and opening go through a
//! [`WorkflowRepository`], which deals in whole documents: a save writes
//! the full document and an open returns a full replacement.
//!
//! Two implementations are provided: [`InMemoryRepository`] for tests and
//! embedding, and [`FileRepository`], which keeps one JSON file per
//! workflow in a directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;

use crate::constants::files;
use crate::error::{Result, WorkflowGraphError};
use crate::types::{WorkflowDocument, WorkflowId, WorkflowStatus};

/// Metadata for a stored workflow (for listing)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSummary {
    pub id: WorkflowId,
    pub name: String,
    pub status: WorkflowStatus,
    pub node_count: usize,
    pub connection_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<&WorkflowDocument> for WorkflowSummary {
    fn from(doc: &WorkflowDocument) -> Self {
        Self {
            id: doc.id.clone(),
            name: doc.name.clone(),
            status: doc.status,
            node_count: doc.nodes.len(),
            connection_count: doc.connections.len(),
            updated_at: doc.updated_at.clone(),
        }
    }
}

/// Create/update/load/list of whole workflow documents
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Insert or overwrite a document and return it as stored
    ///
    /// The document must already carry a persisted id; minting one is
    /// the caller's job.
    async fn save(&self, doc: WorkflowDocument) -> Result<WorkflowDocument>;

    /// Load a document by id
    async fn load(&self, id: &WorkflowId) -> Result<WorkflowDocument>;

    /// List stored workflows, ordered by name then id
    async fn list(&self) -> Result<Vec<WorkflowSummary>>;

    /// Delete a document. Returns whether it existed.
    async fn delete(&self, id: &WorkflowId) -> Result<bool>;
}

/// Stamp a document for storage
fn prepare_for_save(mut doc: WorkflowDocument) -> Result<WorkflowDocument> {
    if doc.id.is_unsaved() {
        return Err(WorkflowGraphError::MissingId);
    }
    doc.updated_at = Some(chrono::Utc::now().to_rfc3339());
    Ok(doc)
}

fn sort_summaries(summaries: &mut [WorkflowSummary]) {
    summaries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
}

// =============================================================================
// In-memory repository
// =============================================================================

/// Repository that keeps documents in memory
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    docs: RwLock<HashMap<WorkflowId, WorkflowDocument>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowRepository for InMemoryRepository {
    async fn save(&self, doc: WorkflowDocument) -> Result<WorkflowDocument> {
        let doc = prepare_for_save(doc)?;
        self.docs.write().await.insert(doc.id.clone(), doc.clone());
        Ok(doc)
    }

    async fn load(&self, id: &WorkflowId) -> Result<WorkflowDocument> {
        self.docs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| WorkflowGraphError::not_found(id))
    }

    async fn list(&self) -> Result<Vec<WorkflowSummary>> {
        let mut summaries: Vec<WorkflowSummary> = self
            .docs
            .read()
            .await
            .values()
            .map(WorkflowSummary::from)
            .collect();
        sort_summaries(&mut summaries);
        Ok(summaries)
    }

    async fn delete(&self, id: &WorkflowId) -> Result<bool> {
        Ok(self.docs.write().await.remove(id).is_some())
    }
}

// =============================================================================
// File repository
// =============================================================================

/// Repository that stores each workflow as `<id>.json` in a directory
///
/// The directory is created on first save.
#[derive(Debug, Clone)]
pub struct FileRepository {
    root: PathBuf,
}

impl FileRepository {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &WorkflowId) -> Result<PathBuf> {
        let raw = id.as_str();
        let usable = !raw.is_empty()
            && raw != "."
            && raw != ".."
            && !raw.contains(['/', '\\', '\0']);
        if !usable {
            return Err(WorkflowGraphError::InvalidId(raw.to_string()));
        }
        Ok(self
            .root
            .join(format!("{}.{}", raw, files::WORKFLOW_EXTENSION)))
    }
}

#[async_trait]
impl WorkflowRepository for FileRepository {
    async fn save(&self, doc: WorkflowDocument) -> Result<WorkflowDocument> {
        let doc = prepare_for_save(doc)?;
        let file_path = self.path_for(&doc.id)?;

        fs::create_dir_all(&self.root).await?;
        let content = serde_json::to_string_pretty(&doc)?;
        fs::write(&file_path, content).await?;
        log::info!("Saved workflow '{}' to {:?}", doc.id, file_path);
        Ok(doc)
    }

    async fn load(&self, id: &WorkflowId) -> Result<WorkflowDocument> {
        let file_path = self.path_for(id)?;
        if !fs::try_exists(&file_path).await? {
            return Err(WorkflowGraphError::not_found(id));
        }

        let content = fs::read_to_string(&file_path).await?;
        let doc: WorkflowDocument = serde_json::from_str(&content)?;
        log::info!("Loaded workflow '{}' from {:?}", doc.id, file_path);
        Ok(doc)
    }

    async fn list(&self) -> Result<Vec<WorkflowSummary>> {
        if !fs::try_exists(&self.root).await? {
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_path = entry.path();
            if file_path
                .extension()
                .map_or(true, |e| e != files::WORKFLOW_EXTENSION)
            {
                continue;
            }

            let content = match fs::read_to_string(&file_path).await {
                Ok(content) => content,
                Err(e) => {
                    log::warn!("Failed to read workflow from {:?}: {}", file_path, e);
                    continue;
                }
            };
            match serde_json::from_str::<WorkflowDocument>(&content) {
                Ok(doc) => summaries.push(WorkflowSummary::from(&doc)),
                Err(e) => {
                    log::warn!("Failed to parse workflow from {:?}: {}", file_path, e);
                }
            }
        }

        sort_summaries(&mut summaries);
        Ok(summaries)
    }

    async fn delete(&self, id: &WorkflowId) -> Result<bool> {
        let file_path = self.path_for(id)?;
        if !fs::try_exists(&file_path).await? {
            return Ok(false);
        }
        fs::remove_file(&file_path).await?;
        log::debug!("Deleted workflow '{}' from {:?}", id, file_path);
        Ok(true)
    }
}
