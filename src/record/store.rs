//! Per-partition, per-map keyed record container.

use crate::record::Record;
use bytes::Bytes;
use std::collections::HashMap;

/// Keyed container of the live records one map holds in one partition.
///
/// All access happens on the owning partition's execution context, so the
/// store needs no internal locking. Replication reads it via [`iter`] and
/// rebuilds it via [`reset`] + [`put_record`].
///
/// [`iter`]: RecordStore::iter
/// [`reset`]: RecordStore::reset
/// [`put_record`]: RecordStore::put_record
#[derive(Debug)]
pub struct RecordStore {
    /// Name of the map this store belongs to.
    name: String,

    /// Live records keyed by their serialized key.
    records: HashMap<Bytes, Record>,
}

impl RecordStore {
    /// Create an empty store for the named map.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: HashMap::new(),
        }
    }

    /// Name of the map this store belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether a record exists for `key`.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.records.contains_key(key)
    }

    /// Insert or update a record, bumping version bookkeeping on update.
    ///
    /// Returns the previous value if the key was present.
    pub fn put(&mut self, key: Bytes, value: Bytes, now: i64) -> Option<Bytes> {
        match self.records.get_mut(&key) {
            Some(record) => {
                let previous = record.value().clone();
                record.set_value(value, now);
                Some(previous)
            }
            None => {
                self.records.insert(key.clone(), Record::new(key, value, now));
                None
            }
        }
    }

    /// Read a value, registering the access on the record.
    pub fn get(&mut self, key: &[u8], now: i64) -> Option<Bytes> {
        let record = self.records.get_mut(key)?;
        record.on_access(now);
        Some(record.value().clone())
    }

    /// Read a record without touching its access bookkeeping.
    pub fn peek(&self, key: &[u8]) -> Option<&Record> {
        self.records.get(key)
    }

    /// Remove a record, returning its value if present.
    pub fn remove(&mut self, key: &[u8]) -> Option<Bytes> {
        self.records.remove(key).map(|r| r.value().clone())
    }

    /// Insert a fully formed record keyed by its own key.
    ///
    /// Replication path: the record arrives with its metadata already set
    /// and replaces any record previously stored under the same key.
    pub fn put_record(&mut self, record: Record) {
        self.records.insert(record.key().clone(), record);
    }

    /// Iterate over live records in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Remove all records. Idempotent; fine to call on an empty store.
    pub fn reset(&mut self) {
        self.records.clear();
    }
}
