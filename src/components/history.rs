use std::collections::VecDeque;
use std::sync::Arc;

use crate::canvas::PixelBuffer;

// ============================================================================
// HISTORY ENTRY — immutable full-buffer snapshot at a commit point
// ============================================================================

/// One committed state of the edit buffer.
///
/// `reference` is the restore-brush source aligned with `pixels`. Geometric
/// edits transform it, so each entry keeps the one matching its geometry.
/// Entries between geometric edits share the same allocation.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub description: String,
    pub pixels: PixelBuffer,
    pub reference: Arc<PixelBuffer>,
}

impl HistoryEntry {
    pub fn new(description: impl Into<String>, pixels: PixelBuffer, reference: Arc<PixelBuffer>) -> Self {
        Self {
            description: description.into(),
            pixels,
            reference,
        }
    }

    /// Bytes charged against the memory cap. Shared reference buffers are
    /// not charged.
    pub fn memory_size(&self) -> usize {
        self.pixels.memory_bytes()
    }
}

// ============================================================================
// HISTORY MANAGER — linear undo/redo over snapshots with a cursor
// ============================================================================

pub const DEFAULT_MAX_UNDO_STEPS: usize = 50;
pub const DEFAULT_MAX_MEMORY_BYTES: usize = 512 * 1024 * 1024;

/// Linear history: `entries[cursor]` is the current state.
///
/// A commit truncates everything after the cursor before appending, so redo
/// is lost once a new edit is made. Undo/redo at either end are no-ops.
/// Oldest entries are dropped when the step count or memory cap is exceeded;
/// the current entry is never dropped.
pub struct HistoryManager {
    entries: VecDeque<HistoryEntry>,
    cursor: usize,
    max_undo_steps: usize,
    max_memory_bytes: Option<usize>,
    total_memory: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO_STEPS, Some(DEFAULT_MAX_MEMORY_BYTES))
    }
}

impl HistoryManager {
    pub fn new(max_undo_steps: usize, max_memory_bytes: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            max_undo_steps: max_undo_steps.max(1),
            max_memory_bytes,
            total_memory: 0,
        }
    }

    /// Start a fresh history whose only entry is the loaded image.
    pub fn init(&mut self, entry: HistoryEntry) {
        self.clear();
        self.total_memory = entry.memory_size();
        self.entries.push_back(entry);
        self.cursor = 0;
    }

    pub fn is_initialized(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Record a new state after the cursor, discarding any redo branch.
    pub fn commit(&mut self, entry: HistoryEntry) {
        if self.entries.is_empty() {
            self.init(entry);
            return;
        }
        // Drop the redo branch.
        while self.entries.len() > self.cursor + 1 {
            if let Some(removed) = self.entries.pop_back() {
                self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
            }
        }
        self.total_memory += entry.memory_size();
        self.entries.push_back(entry);
        self.cursor = self.entries.len() - 1;
        self.prune();
    }

    /// Step back. Returns the entry to restore, or `None` at the oldest state.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if self.cursor == 0 || self.entries.is_empty() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Step forward. Returns the entry to restore, or `None` at the newest state.
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Description of the edit that `undo()` would revert.
    pub fn undo_description(&self) -> Option<&str> {
        if self.can_undo() {
            self.entries.get(self.cursor).map(|e| e.description.as_str())
        } else {
            None
        }
    }

    /// Description of the edit that `redo()` would re-apply.
    pub fn redo_description(&self) -> Option<&str> {
        self.entries.get(self.cursor + 1).map(|e| e.description.as_str())
    }

    /// Undoable descriptions, most recent first.
    pub fn undo_history(&self) -> Vec<String> {
        self.entries
            .iter()
            .take(self.cursor + 1)
            .skip(1)
            .rev()
            .map(|e| e.description.clone())
            .collect()
    }

    /// All descriptions in commit order (oldest first).
    pub fn descriptions(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.description.as_str()).collect()
    }

    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn undo_count(&self) -> usize {
        self.cursor
    }

    pub fn redo_count(&self) -> usize {
        self.entries.len().saturating_sub(self.cursor + 1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
        self.total_memory = 0;
    }

    fn pop_oldest(&mut self) {
        if let Some(removed) = self.entries.pop_front() {
            self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
            self.cursor = self.cursor.saturating_sub(1);
        }
    }

    /// Drop oldest entries to stay within limits.
    fn prune(&mut self) {
        let mut dropped = 0usize;
        while self.cursor > self.max_undo_steps {
            self.pop_oldest();
            dropped += 1;
        }
        if let Some(max_bytes) = self.max_memory_bytes {
            while self.total_memory > max_bytes && self.cursor > 0 {
                self.pop_oldest();
                dropped += 1;
            }
        }
        if dropped > 0 {
            log::debug!(
                "history pruned {} entries ({} kept, {} bytes)",
                dropped,
                self.entries.len(),
                self.total_memory
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tag: u8) -> HistoryEntry {
        let reference = Arc::new(PixelBuffer::new(2, 2));
        HistoryEntry::new(format!("step {tag}"), PixelBuffer::new_filled(2, 2, [tag, 0, 0, 255]), reference)
    }

    fn tag(e: Option<&HistoryEntry>) -> Option<u8> {
        e.map(|e| e.pixels.get_pixel(0, 0)[0])
    }

    #[test]
    fn undo_redo_walk_the_cursor() {
        let mut h = HistoryManager::default();
        h.init(entry(0));
        h.commit(entry(1));
        h.commit(entry(2));
        assert_eq!(tag(h.undo()), Some(1));
        assert_eq!(tag(h.undo()), Some(0));
        assert!(h.undo().is_none());
        assert_eq!(h.cursor(), 0);
        assert_eq!(tag(h.redo()), Some(1));
        assert_eq!(tag(h.redo()), Some(2));
        assert!(h.redo().is_none());
    }

    #[test]
    fn commit_after_undo_truncates_redo_branch() {
        let mut h = HistoryManager::default();
        h.init(entry(0));
        h.commit(entry(1));
        h.commit(entry(2));
        h.undo();
        h.commit(entry(9));
        assert_eq!(h.len(), 3);
        assert!(!h.can_redo());
        assert_eq!(tag(h.current()), Some(9));
        assert_eq!(h.descriptions(), vec!["step 0", "step 1", "step 9"]);
        assert_eq!(h.memory_usage(), 3 * 16);
    }

    #[test]
    fn step_limit_drops_oldest() {
        let mut h = HistoryManager::new(3, None);
        h.init(entry(0));
        for i in 1..=6 {
            h.commit(entry(i));
        }
        assert_eq!(h.len(), 4);
        assert_eq!(h.undo_count(), 3);
        while h.can_undo() {
            h.undo();
        }
        assert_eq!(tag(h.current()), Some(3));
    }

    #[test]
    fn memory_cap_keeps_current_entry() {
        let mut h = HistoryManager::new(50, Some(20));
        h.init(entry(0));
        h.commit(entry(1));
        h.commit(entry(2));
        assert_eq!(h.len(), 1);
        assert_eq!(tag(h.current()), Some(2));
        assert!(!h.can_undo());
    }

    #[test]
    fn descriptions_for_undo_and_redo() {
        let mut h = HistoryManager::default();
        h.init(entry(0));
        h.commit(entry(1));
        h.commit(entry(2));
        assert_eq!(h.undo_description(), Some("step 2"));
        assert_eq!(h.undo_history(), vec!["step 2".to_string(), "step 1".to_string()]);
        h.undo();
        assert_eq!(h.redo_description(), Some("step 2"));
        h.undo();
        assert_eq!(h.undo_description(), None);
    }
}
