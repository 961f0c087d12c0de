//! Bounded undo/redo over whole-scene snapshots.

use std::collections::VecDeque;

use crate::{
    resources::media::MediaOpener,
    scene::{snapshot::SceneSnapshot, store::Scene},
};

/// Undo and redo stacks of [`SceneSnapshot`]s.
///
/// Callers push *before* a mutation; a push discards the redo stack. The undo stack keeps at
/// most `limit` entries, dropping the oldest.
#[derive(Debug)]
pub struct History {
    undo: VecDeque<SceneSnapshot>,
    redo: Vec<SceneSnapshot>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(50)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Record the scene's current state as an undo point.
    pub fn push(&mut self, scene: &Scene) {
        self.push_snapshot(scene.snapshot());
    }

    /// Record a snapshot taken earlier, e.g. before a mutation that turned out to change things.
    pub fn push_snapshot(&mut self, snapshot: SceneSnapshot) {
        self.undo.push_back(snapshot);
        self.redo.clear();
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
    }

    /// Restore the most recent undo point; the current state moves to the redo stack.
    pub fn undo(&mut self, scene: &mut Scene, media: &dyn MediaOpener) -> bool {
        let Some(prev) = self.undo.pop_back() else {
            return false;
        };
        self.redo.push(scene.snapshot());
        scene.restore(&prev, media);
        tracing::debug!(undo = self.undo.len(), redo = self.redo.len(), "undo");
        true
    }

    pub fn redo(&mut self, scene: &mut Scene, media: &dyn MediaOpener) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        self.undo.push_back(scene.snapshot());
        scene.restore(&next, media);
        tracing::debug!(undo = self.undo.len(), redo = self.redo.len(), "redo");
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
#[path = "../tests/unit/history.rs"]
mod tests;
