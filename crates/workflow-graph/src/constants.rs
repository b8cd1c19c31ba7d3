//! Crate-wide constants
//!
//! Single source of truth for defaults shared by the store, the
//! configuration layer and the repositories.

/// Id carried by a workflow that has never been saved
pub const UNSAVED_WORKFLOW_ID: &str = "local";

/// Default values for editor configuration
pub mod defaults {
    /// Undo steps kept per editing session
    pub const UNDO_DEPTH: usize = 100;
    /// zstd level used for undo snapshots
    pub const SNAPSHOT_COMPRESSION_LEVEL: i32 = 3;
    /// Directory the file repository writes to when none is configured
    pub const WORKFLOW_DIR: &str = ".workflows";
    /// Name given to a new document when the caller passes none
    pub const DOCUMENT_NAME: &str = "Untitled workflow";
}

/// File names and extensions
pub mod files {
    /// Extension of persisted workflow documents
    pub const WORKFLOW_EXTENSION: &str = "json";
    /// Editor configuration file name
    pub const CONFIG_FILE: &str = "workflow-editor.json";
}
