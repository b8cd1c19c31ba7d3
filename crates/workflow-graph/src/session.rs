//! Editing session: a store paired with a repository
//!
//! Applies the save and open rules at the persistence boundary:
//! - save snapshots the document, minting a persisted id on first save
//! - open replaces the document outright once the load completes
//!
//! Both take `&mut self`, so no mutation can interleave with an in-flight
//! save or open.

use crate::config::{EditorConfig, SaveRule};
use crate::error::{Result, WorkflowGraphError};
use crate::repository::{WorkflowRepository, WorkflowSummary};
use crate::store::WorkflowGraphStore;
use crate::types::WorkflowId;

/// A store bound to a persistence backend
pub struct EditorSession<R: WorkflowRepository> {
    store: WorkflowGraphStore,
    repository: R,
    save_rule: SaveRule,
}

impl<R: WorkflowRepository> EditorSession<R> {
    /// Start a session on an empty, unsaved document
    pub fn new(repository: R, config: &EditorConfig) -> Self {
        Self::with_store(WorkflowGraphStore::with_config(config), repository, config.save_rule)
    }

    /// Start a session around an existing store
    pub fn with_store(store: WorkflowGraphStore, repository: R, save_rule: SaveRule) -> Self {
        Self {
            store,
            repository,
            save_rule,
        }
    }

    pub fn store(&self) -> &WorkflowGraphStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut WorkflowGraphStore {
        &mut self.store
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Persist the current document and return its id
    ///
    /// With [`SaveRule::RequireValid`] an invalid graph is not saved and
    /// its diagnostics come back as [`WorkflowGraphError::InvalidWorkflow`].
    pub async fn save(&mut self) -> Result<WorkflowId> {
        if self.save_rule == SaveRule::RequireValid {
            let report = self.store.validate();
            if !report.valid {
                return Err(WorkflowGraphError::InvalidWorkflow(report.errors));
            }
        }

        if self.store.document().id.is_unsaved() {
            let id = WorkflowId::generate();
            log::info!("Assigning id '{}' to unsaved workflow", id);
            self.store.set_workflow_id(id);
        }

        let snapshot = self.store.document().clone();
        let saved = self.repository.save(snapshot).await?;
        self.store.mark_saved(saved.updated_at);
        Ok(saved.id)
    }

    /// Load a workflow and make it the current document
    pub async fn open(&mut self, id: &WorkflowId) -> Result<()> {
        let doc = self.repository.load(id).await?;
        self.store.replace_document(doc);
        Ok(())
    }

    /// Discard the current document and start an empty one
    pub fn new_document(&mut self, name: impl Into<String>) {
        self.store.new_document(name);
    }

    pub async fn list(&self) -> Result<Vec<WorkflowSummary>> {
        self.repository.list().await
    }

    /// Delete a stored workflow
    ///
    /// The open document is left as it is, so saving it again recreates it.
    pub async fn delete(&self, id: &WorkflowId) -> Result<bool> {
        self.repository.delete(id).await
    }
}
