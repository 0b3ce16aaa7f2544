//! Append-only, most-recent-first history log.
//!
//! [`History`] holds past jobs (or conversations) for replay within a
//! session. New entries go to the front; lookups are linear; nothing is
//! ever evicted.

use meranti_core::chat::Conversation;
use meranti_core::error::CoreError;
use meranti_core::job::Job;
use meranti_core::ticket::Ticket;

/// A record addressable by a unique string id.
pub trait HistoryEntry {
    fn entry_id(&self) -> &str;
}

impl HistoryEntry for Job {
    fn entry_id(&self) -> &str {
        &self.id
    }
}

impl HistoryEntry for Conversation {
    fn entry_id(&self) -> &str {
        &self.id
    }
}

impl HistoryEntry for Ticket {
    fn entry_id(&self) -> &str {
        &self.id
    }
}

/// Ordered log, index 0 being the most recent entry.
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: Vec<T>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: HistoryEntry> History<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a stored log that is already most-recent-first.
    ///
    /// Later duplicates of an id are dropped.
    pub fn from_entries(entries: Vec<T>) -> Self {
        let mut history = Self::new();
        for entry in entries {
            if !history.contains(entry.entry_id()) {
                history.entries.push(entry);
            }
        }
        history
    }

    /// Add an entry at the front. Ids must be unique.
    pub fn append(&mut self, entry: T) -> Result<(), CoreError> {
        if self.contains(entry.entry_id()) {
            return Err(CoreError::Conflict(format!(
                "History already holds an entry with id {}",
                entry.entry_id()
            )));
        }
        self.entries.insert(0, entry);
        Ok(())
    }

    /// Find an entry by id.
    pub fn replay(&self, id: &str) -> Option<&T> {
        self.entries.iter().find(|e| e.entry_id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.entries.iter_mut().find(|e| e.entry_id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.replay(id).is_some()
    }

    /// Remove an entry, returning it.
    pub fn remove(&mut self, id: &str) -> Option<T> {
        let index = self.entries.iter().position(|e| e.entry_id() == id)?;
        Some(self.entries.remove(index))
    }

    /// The most recent entry.
    pub fn latest(&self) -> Option<&T> {
        self.entries.first()
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Entry(&'static str);

    impl HistoryEntry for Entry {
        fn entry_id(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn append_is_lifo() {
        let mut history = History::new();
        history.append(Entry("A")).unwrap();
        history.append(Entry("B")).unwrap();
        assert_eq!(history.entries()[0], Entry("B"));
        assert_eq!(history.latest(), Some(&Entry("B")));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn replay_finds_by_id() {
        let mut history = History::new();
        history.append(Entry("A")).unwrap();
        history.append(Entry("B")).unwrap();
        assert_eq!(history.replay("A"), Some(&Entry("A")));
        assert_eq!(history.replay("missing"), None);
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut history = History::new();
        history.append(Entry("A")).unwrap();
        assert_matches!(history.append(Entry("A")), Err(CoreError::Conflict(_)));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn remove_keeps_order() {
        let mut history = History::new();
        for id in ["A", "B", "C"] {
            history.append(Entry(id)).unwrap();
        }
        assert_eq!(history.remove("B"), Some(Entry("B")));
        let ids: Vec<_> = history.iter().map(|e| e.0).collect();
        assert_eq!(ids, ["C", "A"]);
        assert!(history.remove("B").is_none());
    }

    #[test]
    fn from_entries_preserves_order_and_dedups() {
        let history = History::from_entries(vec![Entry("B"), Entry("A"), Entry("B")]);
        let ids: Vec<_> = history.iter().map(|e| e.0).collect();
        assert_eq!(ids, ["B", "A"]);
    }
}
