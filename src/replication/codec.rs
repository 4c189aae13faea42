//! Deterministic binary wire format for replication snapshots.
//!
//! # Layout
//!
//! All integers are big-endian. Counts and lengths are `i32`; a negative
//! value is a decode error.
//!
//! ```text
//! mapCount: i32
//! repeat mapCount times:
//!   mapNameLen: i32, mapNameUtf8Bytes
//!   recordCount: i32
//!   repeat recordCount times:
//!     key: i32 len + bytes
//!     value: i32 len + bytes
//!     metadata block:
//!       version: i64
//!       lastAccessTime: i64
//!       lastUpdateTime: i64
//!       hits: i64
//!       ttlMillis: i64 (-1 = no per-record override)
//! delayedMapCount: i32
//! repeat delayedMapCount times:
//!   mapName, entryCount: i32
//!   repeat entryCount times:
//!     key, value, storeTime: i64, partitionId: i32
//! flushCounterMapCount: i32
//! repeat flushCounterMapCount times:
//!   mapName, counter: i32
//! ```
//!
//! The metadata block's field order is an internal contract between the
//! snapshot builder and the replica applier, not a public format. A record's
//! creation time is deliberately not transmitted; the applier regenerates it
//! locally.
//!
//! Decoding never touches grid state: a malformed or truncated input fails
//! with a [`CodecError`] before anything is applied anywhere.

use crate::error::CodecError;
use crate::record::RecordMetadata;
use crate::replication::snapshot::{RecordReplicationInfo, ReplicationSnapshot};
use crate::types::PartitionId;
use crate::writebehind::DelayedEntry;
use bytes::{Buf, BufMut, Bytes};
use std::collections::BTreeMap;
use std::time::Duration;

/// TTL wire value meaning "no per-record override, use the map default".
const TTL_USE_MAP_DEFAULT: i64 = -1;

/// Smallest possible encoded record: two empty length-prefixed byte strings
/// plus the five-field metadata block.
const MIN_RECORD_BYTES: usize = 4 + 4 + 8 * 5;

/// Smallest possible encoded delayed entry: two empty length-prefixed byte
/// strings plus storeTime and partitionId.
const MIN_DELAYED_ENTRY_BYTES: usize = 4 + 4 + 8 + 4;

/// Capacity to pre-size a collection read from an untrusted count.
///
/// The count is only trusted up to what the remaining input could actually
/// hold; a huge declared count on a short buffer then fails with
/// `UnexpectedEof` inside the element loop instead of aborting on an
/// oversized allocation.
fn bounded_capacity(count: usize, input: &impl Buf, min_element_bytes: usize) -> usize {
    count.min(input.remaining() / min_element_bytes)
}

/// Serialize a snapshot into `out`.
///
/// Fails only if a collection or byte string exceeds the `i32` ranges of the
/// layout; nothing is transmitted for a failed snapshot.
pub fn write_snapshot(
    snapshot: &ReplicationSnapshot,
    out: &mut impl BufMut,
) -> Result<(), CodecError> {
    write_count(out, snapshot.record_sets().len())?;
    for (name, records) in snapshot.record_sets() {
        write_name(out, name)?;
        write_count(out, records.len())?;
        for info in records {
            write_record_info(out, info)?;
        }
    }

    write_count(out, snapshot.delayed_entries().len())?;
    for (name, entries) in snapshot.delayed_entries() {
        write_name(out, name)?;
        write_count(out, entries.len())?;
        for entry in entries {
            write_delayed_entry(out, entry)?;
        }
    }

    write_count(out, snapshot.flush_counters().len())?;
    for (name, counter) in snapshot.flush_counters() {
        write_name(out, name)?;
        let counter = i32::try_from(*counter).map_err(|_| CodecError::InvalidField {
            field: "flushCounter",
            value: *counter as i64,
        })?;
        out.put_i32(counter);
    }

    Ok(())
}

/// Deserialize a snapshot from `input`.
pub fn read_snapshot(input: &mut impl Buf) -> Result<ReplicationSnapshot, CodecError> {
    let map_count = read_count(input)?;
    let mut record_sets = BTreeMap::new();
    for _ in 0..map_count {
        let name = read_name(input)?;
        let record_count = read_count(input)?;
        let mut records =
            Vec::with_capacity(bounded_capacity(record_count, input, MIN_RECORD_BYTES));
        for _ in 0..record_count {
            records.push(read_record_info(input)?);
        }
        record_sets.insert(name, records);
    }

    let delayed_map_count = read_count(input)?;
    let mut delayed_entries = BTreeMap::new();
    for _ in 0..delayed_map_count {
        let name = read_name(input)?;
        let entry_count = read_count(input)?;
        let mut entries =
            Vec::with_capacity(bounded_capacity(entry_count, input, MIN_DELAYED_ENTRY_BYTES));
        for _ in 0..entry_count {
            entries.push(read_delayed_entry(input)?);
        }
        delayed_entries.insert(name, entries);
    }

    let counter_count = read_count(input)?;
    let mut flush_counters = BTreeMap::new();
    for _ in 0..counter_count {
        let name = read_name(input)?;
        need(input, 4)?;
        let counter = input.get_i32();
        if counter < 0 {
            return Err(CodecError::InvalidField {
                field: "flushCounter",
                value: counter as i64,
            });
        }
        flush_counters.insert(name, counter as u64);
    }

    Ok(ReplicationSnapshot::new(
        record_sets,
        delayed_entries,
        flush_counters,
    ))
}

fn write_record_info(
    out: &mut impl BufMut,
    info: &RecordReplicationInfo,
) -> Result<(), CodecError> {
    write_bytes(out, info.key())?;
    write_bytes(out, info.value())?;

    let meta = info.metadata();
    out.put_i64(meta.version as i64);
    out.put_i64(meta.last_access_time);
    out.put_i64(meta.last_update_time);
    out.put_i64(meta.hits as i64);
    let ttl_millis = match meta.ttl {
        Some(ttl) => i64::try_from(ttl.as_millis()).map_err(|_| CodecError::InvalidField {
            field: "ttlMillis",
            value: i64::MAX,
        })?,
        None => TTL_USE_MAP_DEFAULT,
    };
    out.put_i64(ttl_millis);
    Ok(())
}

fn read_record_info(input: &mut impl Buf) -> Result<RecordReplicationInfo, CodecError> {
    let key = read_bytes(input)?;
    let value = read_bytes(input)?;

    need(input, 8 * 5)?;
    let version = read_non_negative(input, "version")?;
    let last_access_time = input.get_i64();
    let last_update_time = input.get_i64();
    let hits = read_non_negative(input, "hits")?;
    let ttl_millis = input.get_i64();
    let ttl = match ttl_millis {
        TTL_USE_MAP_DEFAULT => None,
        millis if millis >= 0 => Some(Duration::from_millis(millis as u64)),
        millis => {
            return Err(CodecError::InvalidField {
                field: "ttlMillis",
                value: millis,
            })
        }
    };

    let metadata = RecordMetadata {
        version,
        // Not transmitted; the applier stamps a fresh local creation time.
        creation_time: 0,
        last_access_time,
        last_update_time,
        hits,
        ttl,
    };
    Ok(RecordReplicationInfo::new(key, value, metadata))
}

fn write_delayed_entry(out: &mut impl BufMut, entry: &DelayedEntry) -> Result<(), CodecError> {
    write_bytes(out, &entry.key)?;
    write_bytes(out, &entry.value)?;
    out.put_i64(entry.store_time);
    let partition_id = i32::try_from(entry.partition_id).map_err(|_| CodecError::InvalidField {
        field: "partitionId",
        value: entry.partition_id as i64,
    })?;
    out.put_i32(partition_id);
    Ok(())
}

fn read_delayed_entry(input: &mut impl Buf) -> Result<DelayedEntry, CodecError> {
    let key = read_bytes(input)?;
    let value = read_bytes(input)?;
    need(input, 8 + 4)?;
    let store_time = input.get_i64();
    let partition_id = input.get_i32();
    if partition_id < 0 {
        return Err(CodecError::InvalidField {
            field: "partitionId",
            value: partition_id as i64,
        });
    }
    Ok(DelayedEntry::new(
        key,
        value,
        store_time,
        partition_id as PartitionId,
    ))
}

fn write_count(out: &mut impl BufMut, count: usize) -> Result<(), CodecError> {
    let count = i32::try_from(count).map_err(|_| CodecError::InvalidLength(count as i64))?;
    out.put_i32(count);
    Ok(())
}

fn write_bytes(out: &mut impl BufMut, bytes: &Bytes) -> Result<(), CodecError> {
    write_count(out, bytes.len())?;
    out.put_slice(bytes);
    Ok(())
}

fn write_name(out: &mut impl BufMut, name: &str) -> Result<(), CodecError> {
    write_count(out, name.len())?;
    out.put_slice(name.as_bytes());
    Ok(())
}

fn read_count(input: &mut impl Buf) -> Result<usize, CodecError> {
    need(input, 4)?;
    let count = input.get_i32();
    if count < 0 {
        return Err(CodecError::InvalidCount(count));
    }
    Ok(count as usize)
}

fn read_bytes(input: &mut impl Buf) -> Result<Bytes, CodecError> {
    let len = read_count(input)?;
    need(input, len)?;
    Ok(input.copy_to_bytes(len))
}

fn read_name(input: &mut impl Buf) -> Result<String, CodecError> {
    let bytes = read_bytes(input)?;
    Ok(String::from_utf8(bytes.to_vec())?)
}

fn read_non_negative(input: &mut impl Buf, field: &'static str) -> Result<u64, CodecError> {
    let value = input.get_i64();
    if value < 0 {
        return Err(CodecError::InvalidField { field, value });
    }
    Ok(value as u64)
}

fn need(input: &impl Buf, len: usize) -> Result<(), CodecError> {
    if input.remaining() < len {
        return Err(CodecError::UnexpectedEof);
    }
    Ok(())
}
