//! Undo/redo history using compressed snapshots
//!
//! Linear history over the diagram model, based on zstd-compressed
//! immutable snapshots rather than inverse operations: restoring a
//! snapshot reproduces the exact prior structural state by
//! construction, with nothing to keep in sync per mutation type.
//!
//! Cosmetic mutations (validation tags, selection, port visibility)
//! are filtered out by their [`Mutation`] classification: they never
//! create history entries, and because transient fields are skipped by
//! serde they cannot leak into a snapshot either.

use std::collections::VecDeque;

use crate::error::{DiagramError, Result};
use crate::model::Diagram;
use crate::mutation::Mutation;

/// zstd level used for snapshots; fast and effective on cell JSON
const COMPRESSION_LEVEL: i32 = 3;

/// Linear undo/redo stack of compressed diagram snapshots
pub struct HistoryStack {
    /// Compressed diagram states (zstd over serialized JSON)
    snapshots: VecDeque<Vec<u8>>,
    /// Current position in the stack
    current: usize,
    /// Maximum number of snapshots to keep
    max_snapshots: usize,
}

impl HistoryStack {
    /// Create a history stack with the given capacity
    pub fn new(max_snapshots: usize) -> Self {
        Self {
            snapshots: VecDeque::new(),
            current: 0,
            max_snapshots: max_snapshots.max(1),
        }
    }

    /// Record the state reached by a mutation
    ///
    /// Cosmetic mutations are skipped. Returns whether a snapshot was
    /// actually pushed.
    pub fn record(&mut self, mutation: &Mutation, diagram: &Diagram) -> Result<bool> {
        if mutation.is_cosmetic() {
            return Ok(false);
        }
        self.push(diagram)?;
        Ok(true)
    }

    /// Push a snapshot unconditionally
    ///
    /// Used for the baseline state after a load. Truncates any redo
    /// tail.
    pub fn push(&mut self, diagram: &Diagram) -> Result<()> {
        let json = serde_json::to_vec(diagram)?;
        let compressed = zstd::encode_all(&json[..], COMPRESSION_LEVEL)
            .map_err(|e| DiagramError::Compression(e.to_string()))?;

        while self.snapshots.len() > self.current + 1 {
            self.snapshots.pop_back();
        }

        self.snapshots.push_back(compressed);
        self.current = self.snapshots.len() - 1;

        while self.snapshots.len() > self.max_snapshots {
            self.snapshots.pop_front();
            if self.current > 0 {
                self.current -= 1;
            }
        }

        Ok(())
    }

    /// Undo: restore the previous snapshot
    ///
    /// Returns `None` when already at the oldest state.
    pub fn undo(&mut self) -> Option<Result<Diagram>> {
        if self.current > 0 {
            self.current -= 1;
            Some(self.restore(self.current))
        } else {
            None
        }
    }

    /// Redo: restore the next snapshot
    ///
    /// Returns `None` when already at the newest state.
    pub fn redo(&mut self) -> Option<Result<Diagram>> {
        if self.current + 1 < self.snapshots.len() {
            self.current += 1;
            Some(self.restore(self.current))
        } else {
            None
        }
    }

    pub fn can_undo(&self) -> bool {
        self.current > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current + 1 < self.snapshots.len()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Drop all history (e.g. when a different diagram is loaded)
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.current = 0;
    }

    fn restore(&self, index: usize) -> Result<Diagram> {
        let compressed = &self.snapshots[index];
        let json = zstd::decode_all(&compressed[..])
            .map_err(|e| DiagramError::Compression(e.to_string()))?;
        let mut diagram: Diagram = serde_json::from_slice(&json)?;
        diagram.refresh_containment();
        Ok(diagram)
    }
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(100)
    }
}
