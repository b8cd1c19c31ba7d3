//! Snapshot history for undo/redo
//!
//! The store records the whole document after every applied mutation.
//! Snapshots are zstd-compressed JSON, so a cascade delete or a bulk
//! property merge restores exactly without per-operation inverses.

use std::collections::VecDeque;

use crate::constants::defaults;
use crate::error::{Result, WorkflowGraphError};
use crate::types::WorkflowDocument;

/// One compressed document state
struct Snapshot(Vec<u8>);

impl Snapshot {
    fn capture(doc: &WorkflowDocument) -> Result<Self> {
        let json = serde_json::to_vec(doc)?;
        zstd::encode_all(&json[..], defaults::SNAPSHOT_COMPRESSION_LEVEL)
            .map(Self)
            .map_err(|e| WorkflowGraphError::Compression(e.to_string()))
    }

    fn restore(&self) -> Result<WorkflowDocument> {
        let json = zstd::decode_all(&self.0[..])
            .map_err(|e| WorkflowGraphError::Compression(e.to_string()))?;
        Ok(serde_json::from_slice(&json)?)
    }
}

/// Linear undo/redo history
///
/// `entries[cursor]` is always the state the store currently shows. The
/// oldest entry is the baseline and is never undone past.
pub struct UndoStack {
    entries: VecDeque<Snapshot>,
    cursor: usize,
    /// Undo steps kept; one more entry is held for the baseline
    depth: usize,
}

impl UndoStack {
    /// History that keeps up to `depth` undo steps
    pub fn new(depth: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            depth: depth.max(1),
        }
    }

    /// Record `doc` as the newest state, discarding any redo branch
    pub fn push(&mut self, doc: &WorkflowDocument) -> Result<()> {
        let snapshot = Snapshot::capture(doc)?;

        self.entries.truncate(self.cursor + 1);
        self.entries.push_back(snapshot);
        if self.entries.len() > self.depth + 1 {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
        Ok(())
    }

    /// Step back one state
    ///
    /// `None` at the baseline. On a decode error the cursor stays put.
    pub fn undo(&mut self) -> Option<Result<WorkflowDocument>> {
        let target = self.cursor.checked_sub(1)?;
        Some(self.step_to(target))
    }

    /// Step forward one state
    ///
    /// `None` at the newest state. On a decode error the cursor stays put.
    pub fn redo(&mut self) -> Option<Result<WorkflowDocument>> {
        let target = self.cursor + 1;
        if target >= self.entries.len() {
            return None;
        }
        Some(self.step_to(target))
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Forget all history; `doc` becomes the new baseline
    pub fn reset(&mut self, doc: &WorkflowDocument) -> Result<()> {
        self.entries.clear();
        self.cursor = 0;
        self.push(doc)
    }

    fn step_to(&mut self, target: usize) -> Result<WorkflowDocument> {
        let doc = self.entries[target].restore()?;
        self.cursor = target;
        Ok(doc)
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(defaults::UNDO_DEPTH)
    }
}
