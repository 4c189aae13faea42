//! Point-in-time replication snapshot of one partition.

use crate::record::{Record, RecordMetadata};
use crate::writebehind::DelayedEntry;
use bytes::Bytes;
use std::collections::BTreeMap;

/// Immutable transfer representation of one record.
///
/// Uniqueness is by key within a map; the builder reads records out of a
/// keyed store, so no two infos for a map share a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordReplicationInfo {
    key: Bytes,
    value: Bytes,
    metadata: RecordMetadata,
}

impl RecordReplicationInfo {
    /// Capture a record's current state for transfer.
    pub fn from_record(record: &Record) -> Self {
        Self {
            key: record.key().clone(),
            value: record.value().clone(),
            metadata: record.metadata().clone(),
        }
    }

    /// Build an info from its parts. Used by the wire codec.
    pub fn new(key: Bytes, value: Bytes, metadata: RecordMetadata) -> Self {
        Self {
            key,
            value,
            metadata,
        }
    }

    /// The record key.
    pub fn key(&self) -> &Bytes {
        &self.key
    }

    /// The record value.
    pub fn value(&self) -> &Bytes {
        &self.value
    }

    /// The captured metadata.
    pub fn metadata(&self) -> &RecordMetadata {
        &self.metadata
    }
}

/// Point-in-time capture of a partition's record and write-behind state.
///
/// Built once on the owner's partition context, serialized, applied once on
/// the replica, then discarded. Maps are keyed by name; a map appears in
/// `record_sets` only if its backup count covers the target replica index,
/// and in `delayed_entries`/`flush_counters` only if its pending queue was
/// non-empty at capture time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplicationSnapshot {
    record_sets: BTreeMap<String, Vec<RecordReplicationInfo>>,
    delayed_entries: BTreeMap<String, Vec<DelayedEntry>>,
    flush_counters: BTreeMap<String, u64>,
}

impl ReplicationSnapshot {
    /// Assemble a snapshot from its three mappings.
    pub fn new(
        record_sets: BTreeMap<String, Vec<RecordReplicationInfo>>,
        delayed_entries: BTreeMap<String, Vec<DelayedEntry>>,
        flush_counters: BTreeMap<String, u64>,
    ) -> Self {
        Self {
            record_sets,
            delayed_entries,
            flush_counters,
        }
    }

    /// Per-map record sets.
    pub fn record_sets(&self) -> &BTreeMap<String, Vec<RecordReplicationInfo>> {
        &self.record_sets
    }

    /// Per-map pending write-behind entries, in queue order.
    pub fn delayed_entries(&self) -> &BTreeMap<String, Vec<DelayedEntry>> {
        &self.delayed_entries
    }

    /// Per-map flush counters captured alongside the delayed entries.
    pub fn flush_counters(&self) -> &BTreeMap<String, u64> {
        &self.flush_counters
    }

    /// True iff the snapshot carries no record sets and no delayed entries.
    ///
    /// Callers use this to skip transmitting a no-op snapshot.
    pub fn is_empty(&self) -> bool {
        self.record_sets.is_empty() && self.delayed_entries.is_empty()
    }

    /// Total number of records across all maps.
    pub fn record_count(&self) -> usize {
        self.record_sets.values().map(Vec::len).sum()
    }

    /// Total number of delayed entries across all maps.
    pub fn delayed_entry_count(&self) -> usize {
        self.delayed_entries.values().map(Vec::len).sum()
    }
}
