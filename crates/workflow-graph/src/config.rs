//! Editor configuration
//!
//! Loaded from a JSON file; every field has a default so a missing file
//! or a partial file is fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::constants::defaults;
use crate::error::Result;
use crate::types::Position;

/// Whether an invalid graph may be saved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveRule {
    /// Save regardless of validation; the UI warns
    #[default]
    AllowInvalid,
    /// Refuse to save until `validate()` passes
    RequireValid,
}

/// Configuration for an editing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Undo steps kept per editing session
    #[serde(default = "default_undo_depth")]
    pub undo_depth: usize,
    /// Where `add_node` places new nodes before the canvas moves them
    #[serde(default)]
    pub default_position: Position,
    /// Directory used by the file repository
    #[serde(default = "default_workflow_dir")]
    pub workflow_dir: PathBuf,
    #[serde(default)]
    pub save_rule: SaveRule,
}

fn default_undo_depth() -> usize {
    defaults::UNDO_DEPTH
}

fn default_workflow_dir() -> PathBuf {
    PathBuf::from(defaults::WORKFLOW_DIR)
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            undo_depth: default_undo_depth(),
            default_position: Position::default(),
            workflow_dir: default_workflow_dir(),
            save_rule: SaveRule::default(),
        }
    }
}

impl EditorConfig {
    /// Load configuration from a JSON file
    ///
    /// A missing file yields the defaults.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !fs::try_exists(path).await? {
            log::debug!("No editor config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).await?;
        let config = serde_json::from_str(&contents)?;
        log::info!("Loaded editor config from {:?}", path);
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents).await?;
        log::info!("Editor config saved to {:?}", path);
        Ok(())
    }
}
