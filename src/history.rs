//! Linear undo/redo history over dataset snapshots.
//!
//! The stack is a flat arena of [`HistoryEntry`] values plus a cursor. Entries
//! after the cursor form the redo branch; the next [`HistoryStack::push`]
//! drops them for good. The oldest entries are evicted once the configured
//! depth is exceeded.

use crate::dataset::{DatasetMetadata, Frame};
use crate::engine::Operation;
use crate::error::{Result, TidyError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

pub const DEFAULT_MAX_HISTORY: usize = 50;

/// One recorded state: the operation and the snapshot it produced.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub operation: Operation,
    pub frame: Frame,
    pub metadata: DatasetMetadata,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

impl HistoryEntry {
    pub fn new(operation: Operation, frame: Frame, metadata: DatasetMetadata) -> Self {
        let description = operation.description();
        Self {
            id: Uuid::new_v4(),
            operation,
            frame,
            metadata,
            timestamp: Utc::now(),
            description,
        }
    }

    pub fn info(&self) -> HistoryEntryInfo {
        HistoryEntryInfo {
            id: self.id,
            operation: self.operation.clone(),
            description: self.description.clone(),
            timestamp: self.timestamp,
            row_count: self.metadata.row_count,
            column_count: self.metadata.column_count(),
        }
    }
}

/// Listing view of an entry, without the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntryInfo {
    pub id: Uuid,
    pub operation: Operation,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub row_count: usize,
    pub column_count: usize,
}

#[derive(Debug, Clone)]
pub struct HistoryStack {
    entries: VecDeque<HistoryEntry>,
    cursor: Option<usize>,
    max_depth: usize,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl HistoryStack {
    /// A depth below 1 is raised to 1.
    pub fn new(max_depth: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: None,
            max_depth: max_depth.max(1),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Records `entry` as the new current state, discarding the redo branch.
    pub fn push(&mut self, entry: HistoryEntry) {
        match self.cursor {
            Some(cursor) => self.entries.truncate(cursor + 1),
            None => self.entries.clear(),
        }

        self.entries.push_back(entry);
        while self.entries.len() > self.max_depth {
            self.entries.pop_front();
        }
        self.cursor = Some(self.entries.len() - 1);
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.cursor.and_then(|i| self.entries.get(i))
    }

    pub fn undo(&mut self) -> Result<&HistoryEntry> {
        match self.cursor {
            Some(cursor) if cursor > 0 => self.move_to(cursor - 1),
            Some(_) => Err(TidyError::history("already at the oldest state, nothing to undo")),
            None => Err(TidyError::history("no history to undo")),
        }
    }

    pub fn redo(&mut self) -> Result<&HistoryEntry> {
        match self.cursor {
            Some(cursor) if cursor + 1 < self.entries.len() => self.move_to(cursor + 1),
            Some(_) => Err(TidyError::history("already at the newest state, nothing to redo")),
            None => Err(TidyError::history("no history to redo")),
        }
    }

    /// Moves the cursor to `id` in either direction; the redo branch is kept.
    pub fn jump_to(&mut self, id: Uuid) -> Result<&HistoryEntry> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| TidyError::history(format!("history entry not found: {id}")))?;
        self.move_to(index)
    }

    /// Keeps only the oldest entry and makes it current.
    pub fn reset_to_initial(&mut self) -> Result<&HistoryEntry> {
        if self.entries.is_empty() {
            return Err(TidyError::history("no history to reset"));
        }
        self.entries.truncate(1);
        self.move_to(0)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    /// Keeps the newest `keep` entries, shifting the cursor down (never below 0).
    pub fn trim(&mut self, keep: usize) {
        if self.entries.len() <= keep {
            return;
        }
        let removed = self.entries.len() - keep;
        self.entries.drain(..removed);

        self.cursor = if self.entries.is_empty() {
            None
        } else {
            self.cursor.map(|c| c.saturating_sub(removed))
        };
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(c) if c > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(c) if c + 1 < self.entries.len())
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries_info(&self) -> Vec<HistoryEntryInfo> {
        self.entries.iter().map(HistoryEntry::info).collect()
    }

    fn move_to(&mut self, index: usize) -> Result<&HistoryEntry> {
        let entry = self
            .entries
            .get(index)
            .ok_or_else(|| TidyError::history(format!("no history entry at index {index}")))?;
        self.cursor = Some(index);
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::operation::FillStrategy;
    use polars::prelude::*;
    use std::path::Path;

    fn entry(rows: usize) -> Result<HistoryEntry> {
        let values: Vec<i64> = (0..rows as i64).collect();
        let frame = Frame::from_columns(vec![Column::new("x".into(), values)])?;
        let metadata = DatasetMetadata::for_import(&frame, Path::new("x.csv"));
        let op = Operation::FillNull {
            strategy: FillStrategy::Zero,
            columns: None,
        };
        Ok(HistoryEntry::new(op, frame, metadata))
    }

    fn stack_of(n: usize, depth: usize) -> Result<HistoryStack> {
        let mut stack = HistoryStack::new(depth);
        for rows in 0..n {
            stack.push(entry(rows)?);
        }
        Ok(stack)
    }

    #[test]
    fn test_empty_stack() {
        let mut stack = HistoryStack::default();
        assert!(stack.current().is_none());
        assert!(stack.cursor().is_none());
        assert!(matches!(stack.undo(), Err(TidyError::History(_))));
        assert!(matches!(stack.redo(), Err(TidyError::History(_))));
        assert!(matches!(stack.reset_to_initial(), Err(TidyError::History(_))));
    }

    #[test]
    fn test_undo_redo_restores_metadata() -> Result<()> {
        let mut stack = stack_of(3, 10)?;
        let before = stack.current().map(|e| e.metadata.clone());

        stack.undo()?;
        assert_eq!(stack.cursor(), Some(1));
        assert!(stack.can_redo());

        let after = stack.redo()?.metadata.clone();
        assert_eq!(Some(after), before);
        assert!(!stack.can_redo());
        Ok(())
    }

    #[test]
    fn test_push_after_undo_drops_redo_branch() -> Result<()> {
        let mut stack = stack_of(3, 10)?;
        stack.undo()?;
        stack.undo()?;
        stack.push(entry(9)?);

        assert_eq!(stack.len(), 2);
        assert_eq!(stack.cursor(), Some(1));
        assert!(matches!(stack.redo(), Err(TidyError::History(_))));
        Ok(())
    }

    #[test]
    fn test_eviction_keeps_cursor_valid() -> Result<()> {
        let mut stack = stack_of(5, 3)?;
        assert_eq!(stack.len(), 3);
        assert_eq!(stack.cursor(), Some(2));
        assert_eq!(stack.current().map(|e| e.metadata.row_count), Some(4));
        // oldest surviving entry is the third push
        assert_eq!(stack.entries_info()[0].row_count, 2);
        Ok(())
    }

    #[test]
    fn test_jump_keeps_branch() -> Result<()> {
        let mut stack = stack_of(4, 10)?;
        let first = stack.entries_info()[0].id;
        let last = stack.entries_info()[3].id;

        stack.jump_to(first)?;
        assert_eq!(stack.cursor(), Some(0));
        assert_eq!(stack.len(), 4);
        stack.jump_to(last)?;
        assert_eq!(stack.cursor(), Some(3));

        assert!(matches!(stack.jump_to(Uuid::new_v4()), Err(TidyError::History(_))));
        Ok(())
    }

    #[test]
    fn test_reset_is_irreversible() -> Result<()> {
        let mut stack = stack_of(4, 10)?;
        stack.reset_to_initial()?;
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.cursor(), Some(0));
        assert!(!stack.can_redo());
        assert!(!stack.can_undo());
        Ok(())
    }

    #[test]
    fn test_trim_shifts_cursor() -> Result<()> {
        let mut stack = stack_of(5, 10)?;
        stack.jump_to(stack.entries_info()[1].id)?;
        stack.trim(2);
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.cursor(), Some(0));

        stack.clear();
        assert!(stack.is_empty());
        assert!(stack.cursor().is_none());
        Ok(())
    }

    #[test]
    fn test_depth_is_at_least_one() {
        assert_eq!(HistoryStack::new(0).max_depth(), 1);
    }
}
