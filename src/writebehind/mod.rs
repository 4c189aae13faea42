//! Write-behind persistence queue and store.
//!
//! Mutations against a write-behind map are queued as [`DelayedEntry`] values
//! and flushed to the external store by a separate persistence subsystem no
//! earlier than each entry's `store_time`. This module only models the queue
//! and its flush counter; the flush pipeline itself lives outside the grid
//! core and talks to these types through [`WriteBehindStore`].

use crate::types::PartitionId;
use bytes::Bytes;
use std::collections::VecDeque;

/// A pending external-store write.
///
/// Order within a queue is meaningful: the external store must observe
/// writes in the order they were issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayedEntry {
    /// Serialized key.
    pub key: Bytes,

    /// Serialized value.
    pub value: Bytes,

    /// Earliest moment the entry may be flushed, in epoch millis.
    pub store_time: i64,

    /// Partition the entry belongs to.
    pub partition_id: PartitionId,
}

impl DelayedEntry {
    /// Create a delayed entry.
    pub fn new(
        key: impl Into<Bytes>,
        value: impl Into<Bytes>,
        store_time: i64,
        partition_id: PartitionId,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            store_time,
            partition_id,
        }
    }

    /// Whether the entry may be flushed at `now`.
    pub fn is_ready(&self, now: i64) -> bool {
        self.store_time <= now
    }
}

/// Append-ordered FIFO queue of pending external-store writes.
#[derive(Debug, Default)]
pub struct WriteBehindQueue {
    entries: VecDeque<DelayedEntry>,
}

impl WriteBehindQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry at the tail, preserving insertion order.
    pub fn append(&mut self, entry: DelayedEntry) {
        self.entries.push_back(entry);
    }

    /// Current contents in insertion order, without removing them.
    pub fn as_entries(&self) -> Vec<DelayedEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Remove all entries. Used during replica hydration; never merges.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of queued entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A map's write-behind state in one partition: the pending queue plus the
/// flush counter.
///
/// The flush counter is a plain number, not derived from the queue length:
/// it tracks entries currently scheduled for flush execution but not yet
/// completed, which may legitimately exceed or trail the queue length after
/// ownership changes.
#[derive(Debug, Default)]
pub struct WriteBehindStore {
    queue: WriteBehindQueue,
    flush_counter: u64,
}

impl WriteBehindStore {
    /// Create a store with an empty queue and a zero flush counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry at the tail of the queue.
    pub fn append(&mut self, entry: DelayedEntry) {
        self.queue.append(entry);
    }

    /// The pending entries in insertion order, without removing them.
    pub fn pending_entries(&self) -> Vec<DelayedEntry> {
        self.queue.as_entries()
    }

    /// Drop all pending entries. The flush counter is not touched.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// The pending queue.
    pub fn queue(&self) -> &WriteBehindQueue {
        &self.queue
    }

    /// Number of entries scheduled for flush but not yet completed.
    pub fn flush_counter(&self) -> u64 {
        self.flush_counter
    }

    /// Overwrite the flush counter. Used during replica hydration.
    pub fn set_flush_counter(&mut self, count: u64) {
        self.flush_counter = count;
    }

    /// Account for `count` entries handed to the flush scheduler.
    pub fn increment_flush_counter(&mut self, count: u64) {
        self.flush_counter += count;
    }

    /// Account for `count` completed flushes, saturating at zero.
    pub fn decrement_flush_counter(&mut self, count: u64) {
        self.flush_counter = self.flush_counter.saturating_sub(count);
    }
}
