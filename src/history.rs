//! bounded rolling history of readings (FIFO eviction)

use crate::domain::{HistoryRow, HistoryTable, Reading};
use std::collections::VecDeque;

pub const DEFAULT_MAX_HISTORY: usize = 100;

#[derive(Clone, Debug)]
pub struct RollingHistory {
    capacity: usize,
    entries: VecDeque<Reading>,
}

impl RollingHistory {
    /// a capacity of 0 is bumped to 1 so the newest reading is always kept
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { capacity, entries: VecDeque::with_capacity(capacity) }
    }

    /// append a batch in order, then drop the oldest entries over capacity
    pub fn append_batch<I>(&mut self, readings: I)
    where
        I: IntoIterator<Item = Reading>,
    {
        self.entries.extend(readings);
        let excess = self.entries.len().saturating_sub(self.capacity);
        if excess > 0 {
            self.entries.drain(..excess);
        }
    }

    pub fn to_table(&self) -> HistoryTable {
        HistoryTable::new(self.entries.iter().map(HistoryRow::from).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for RollingHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}
