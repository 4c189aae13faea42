//! Record types and the per-partition record store.
//!
//! A [`Record`] is the unit of storage: an opaque serialized key/value pair
//! plus mutable bookkeeping metadata. Records are value types owned
//! exclusively by one partition's [`RecordStore`]; replication copies record
//! contents, never references.

mod store;

pub use store::RecordStore;

use bytes::Bytes;
use std::time::Duration;

/// Mutable bookkeeping metadata attached to every record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMetadata {
    /// Mutation counter, bumped on every value update.
    pub version: u64,

    /// When the record was created, in epoch millis.
    ///
    /// Regenerated locally when a record is rebuilt from a replication
    /// snapshot; never copied across nodes.
    pub creation_time: i64,

    /// When the record was last read, in epoch millis.
    pub last_access_time: i64,

    /// When the record value was last updated, in epoch millis.
    pub last_update_time: i64,

    /// Number of reads served from this record.
    pub hits: u64,

    /// Per-record TTL override. `None` means the map's configured default
    /// TTL applies.
    pub ttl: Option<Duration>,
}

impl RecordMetadata {
    /// Fresh metadata for a record created at `now`.
    pub fn new(now: i64) -> Self {
        Self {
            version: 0,
            creation_time: now,
            last_access_time: now,
            last_update_time: now,
            hits: 0,
            ttl: None,
        }
    }
}

/// A single stored entry: opaque key and value bytes plus metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    key: Bytes,
    value: Bytes,
    metadata: RecordMetadata,
}

impl Record {
    /// Create a record at `now` with fresh metadata and no TTL override.
    pub fn new(key: Bytes, value: Bytes, now: i64) -> Self {
        Self {
            key,
            value,
            metadata: RecordMetadata::new(now),
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

    /// The record metadata.
    pub fn metadata(&self) -> &RecordMetadata {
        &self.metadata
    }

    /// Replace the value, bumping `version` and `last_update_time`.
    pub fn set_value(&mut self, value: Bytes, now: i64) {
        self.value = value;
        self.metadata.version += 1;
        self.metadata.last_update_time = now;
    }

    /// Register a read at `now`.
    pub fn on_access(&mut self, now: i64) {
        self.metadata.hits += 1;
        self.metadata.last_access_time = now;
    }

    /// Overlay replicated metadata onto this record.
    ///
    /// Copies version, hits, access/update times and the TTL override;
    /// `creation_time` stays local.
    pub fn apply_metadata(&mut self, source: &RecordMetadata) {
        self.metadata.version = source.version;
        self.metadata.hits = source.hits;
        self.metadata.last_access_time = source.last_access_time;
        self.metadata.last_update_time = source.last_update_time;
        self.metadata.ttl = source.ttl;
    }

    /// Whether the record has outlived its TTL at `now`.
    ///
    /// The per-record override wins over the map default; a record with
    /// neither never expires. Expiry is measured from the last update.
    pub fn is_expired(&self, map_default_ttl: Option<Duration>, now: i64) -> bool {
        let Some(ttl) = self.metadata.ttl.or(map_default_ttl) else {
            return false;
        };
        let deadline = self.metadata.last_update_time + ttl.as_millis() as i64;
        deadline <= now
    }
}
