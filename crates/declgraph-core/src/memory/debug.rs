use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Categories for attributing arena memory usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemoryCategory {
    Nodes,
    Connections,
    LinkIdentifiers,
    Text,
    CompileCommands,
    ArgvCells,
    Other,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CategoryStats {
    pub items: u64,
    pub committed_bytes: u64,
}

#[derive(Debug, Default)]
pub struct MemoryTracker {
    inner: Mutex<HashMap<MemoryCategory, CategoryStats>>,
}

impl MemoryTracker {
    pub fn record_items(&self, category: MemoryCategory, items: u64) {
        let mut g = self.inner.lock();
        let e = g.entry(category).or_default();
        e.items = e.items.saturating_add(items);
    }

    pub fn record_commit(&self, category: MemoryCategory, bytes: u64) {
        let mut g = self.inner.lock();
        let e = g.entry(category).or_default();
        e.committed_bytes = e.committed_bytes.saturating_add(bytes);
    }

    pub fn record_release(&self, category: MemoryCategory, bytes: u64) {
        let mut g = self.inner.lock();
        let e = g.entry(category).or_default();
        e.committed_bytes = e.committed_bytes.saturating_sub(bytes.min(e.committed_bytes));
    }

    pub fn snapshot(&self) -> HashMap<MemoryCategory, CategoryStats> {
        self.inner.lock().clone()
    }
}

pub static MEMORY_TRACKER: Lazy<MemoryTracker> = Lazy::new(MemoryTracker::default);
