//! The partition replication operation and its transport envelope.

use crate::error::{CodecError, Result};
use crate::partition::PartitionContainer;
use crate::replication::applier::apply_snapshot;
use crate::replication::builder::build_snapshot;
use crate::replication::codec::{read_snapshot, write_snapshot};
use crate::replication::snapshot::ReplicationSnapshot;
use crate::types::{PartitionId, ReplicaIndex};
use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};

/// Replicates one partition's state to one backup replica.
///
/// Built on the owner's partition context, carried over the operation
/// transport, and run on the replica's partition context. Safe to replay:
/// applying the same snapshot against an already-synchronized replica is a
/// no-op in effect, because apply fully resets every included map.
#[derive(Debug, Clone)]
pub struct ReplicationOperation {
    partition_id: PartitionId,
    replica_index: ReplicaIndex,
    snapshot: ReplicationSnapshot,
}

impl ReplicationOperation {
    /// Capture a partition's state for the given replica index.
    ///
    /// Must run on the partition's execution context.
    pub fn new(container: &PartitionContainer, replica_index: ReplicaIndex) -> Self {
        Self {
            partition_id: container.partition_id(),
            replica_index,
            snapshot: build_snapshot(container, replica_index),
        }
    }

    /// Rebuild an operation from an already-decoded snapshot.
    pub fn from_snapshot(
        partition_id: PartitionId,
        replica_index: ReplicaIndex,
        snapshot: ReplicationSnapshot,
    ) -> Self {
        Self {
            partition_id,
            replica_index,
            snapshot,
        }
    }

    /// The partition being replicated.
    pub fn partition_id(&self) -> PartitionId {
        self.partition_id
    }

    /// The replica index this operation targets.
    pub fn replica_index(&self) -> ReplicaIndex {
        self.replica_index
    }

    /// The captured snapshot.
    pub fn snapshot(&self) -> &ReplicationSnapshot {
        &self.snapshot
    }

    /// True iff the snapshot carries nothing; callers skip sending it.
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    /// Install the snapshot on the replica's container.
    ///
    /// Must run on the replica's partition context.
    pub fn run(&self, container: &mut PartitionContainer) {
        apply_snapshot(&self.snapshot, container);
    }

    /// Serialization hookpoint: write the snapshot payload.
    pub fn write_internal(&self, out: &mut impl BufMut) -> std::result::Result<(), CodecError> {
        write_snapshot(&self.snapshot, out)
    }

    /// Deserialization hookpoint: read the snapshot payload.
    ///
    /// Partition id and replica index travel in the envelope, not the
    /// payload, mirroring how the transport frames operations.
    pub fn read_internal(
        partition_id: PartitionId,
        replica_index: ReplicaIndex,
        input: &mut impl Buf,
    ) -> std::result::Result<Self, CodecError> {
        let snapshot = read_snapshot(input)?;
        Ok(Self::from_snapshot(partition_id, replica_index, snapshot))
    }
}

/// Messages exchanged between nodes for partition replication.
///
/// One explicit encode/decode pair per variant; the snapshot payload inside
/// `Replicate` keeps its own hand-written wire layout and travels opaquely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReplicationMessage {
    /// Request: install the carried snapshot for (partition, replica).
    Replicate {
        partition_id: PartitionId,
        replica_index: ReplicaIndex,
        payload: Vec<u8>,
    },

    /// Response: outcome of a replicate request.
    Ack {
        partition_id: PartitionId,
        replica_index: ReplicaIndex,
        success: bool,
        error: Option<String>,
    },
}

impl ReplicationMessage {
    /// Build a `Replicate` message from an operation.
    pub fn replicate(operation: &ReplicationOperation) -> Result<Self> {
        let mut payload = BytesMut::new();
        operation.write_internal(&mut payload)?;
        Ok(Self::Replicate {
            partition_id: operation.partition_id(),
            replica_index: operation.replica_index(),
            payload: payload.to_vec(),
        })
    }

    /// Build a success `Ack`.
    pub fn ack(partition_id: PartitionId, replica_index: ReplicaIndex) -> Self {
        Self::Ack {
            partition_id,
            replica_index,
            success: true,
            error: None,
        }
    }

    /// Build a failure `Ack`.
    pub fn failure(
        partition_id: PartitionId,
        replica_index: ReplicaIndex,
        error: impl Into<String>,
    ) -> Self {
        Self::Ack {
            partition_id,
            replica_index,
            success: false,
            error: Some(error.into()),
        }
    }

    /// Decode the operation carried by a `Replicate` message.
    pub fn into_operation(self) -> Result<ReplicationOperation> {
        match self {
            Self::Replicate {
                partition_id,
                replica_index,
                payload,
            } => {
                let mut input = payload.as_slice();
                let operation =
                    ReplicationOperation::read_internal(partition_id, replica_index, &mut input)?;
                Ok(operation)
            }
            Self::Ack { .. } => Err(crate::error::Error::Envelope(
                "ack carries no operation".to_string(),
            )),
        }
    }
}

/// Encode a message to bytes.
pub fn encode_message(msg: &ReplicationMessage) -> Result<Vec<u8>> {
    Ok(bincode::serialize(msg)?)
}

/// Decode a message from bytes.
pub fn decode_message(data: &[u8]) -> Result<ReplicationMessage> {
    Ok(bincode::deserialize(data)?)
}

/// Frame a message with a length prefix for TCP transmission.
pub fn frame_message(msg: &ReplicationMessage) -> Result<Vec<u8>> {
    let data = encode_message(msg)?;
    let len = data.len() as u32;

    let mut framed = Vec::with_capacity(4 + data.len());
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(&data);

    Ok(framed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MapConfig, WriteBehindConfig};
    use crate::partition::MapConfigRegistry;
    use bytes::Bytes;
    use std::sync::Arc;

    fn registry() -> Arc<MapConfigRegistry> {
        let registry = MapConfigRegistry::new();
        registry.register("orders", MapConfig::new().with_backup_count(1));
        registry.register(
            "events",
            MapConfig::new()
                .with_backup_count(1)
                .with_write_behind(WriteBehindConfig::default()),
        );
        Arc::new(registry)
    }

    fn populated_container() -> PartitionContainer {
        let mut container = PartitionContainer::new(5, registry());
        container
            .ensure_map("orders")
            .records_mut()
            .put(Bytes::from("k1"), Bytes::from("v1"), 100);
        container
    }

    #[test]
    fn test_operation_round_trip_through_message() {
        let container = populated_container();
        let operation = ReplicationOperation::new(&container, 1);
        assert!(!operation.is_empty());

        let msg = ReplicationMessage::replicate(&operation).unwrap();
        let encoded = encode_message(&msg).unwrap();
        let decoded = decode_message(&encoded).unwrap();
        let received = decoded.into_operation().unwrap();

        assert_eq!(received.partition_id(), 5);
        assert_eq!(received.replica_index(), 1);
        assert_eq!(
            received.snapshot().record_sets()["orders"].len(),
            1
        );
    }

    #[test]
    fn test_replay_against_synchronized_replica() {
        let container = populated_container();
        let operation = ReplicationOperation::new(&container, 1);

        let mut replica = PartitionContainer::new(5, registry());
        operation.run(&mut replica);
        operation.run(&mut replica);

        let records = replica.get_map("orders").unwrap().records();
        assert_eq!(records.len(), 1);
        assert!(records.contains(b"k1"));
    }

    #[test]
    fn test_empty_operation_reports_empty() {
        let registry = registry();
        let container = PartitionContainer::new(0, registry);
        let operation = ReplicationOperation::new(&container, 1);
        assert!(operation.is_empty());
    }

    #[test]
    fn test_corrupt_payload_fails_before_any_apply() {
        let msg = ReplicationMessage::Replicate {
            partition_id: 5,
            replica_index: 1,
            payload: vec![0x00, 0x00], // truncated mapCount
        };
        assert!(msg.into_operation().is_err());
    }

    #[test]
    fn test_ack_carries_no_operation() {
        let ack = ReplicationMessage::ack(5, 1);
        assert!(ack.into_operation().is_err());

        let failure = ReplicationMessage::failure(5, 1, "boom");
        if let ReplicationMessage::Ack { success, error, .. } = failure {
            assert!(!success);
            assert_eq!(error.as_deref(), Some("boom"));
        } else {
            panic!("expected ack");
        }
    }

    #[test]
    fn test_frame_message_length_prefix() {
        let msg = ReplicationMessage::ack(5, 1);
        let framed = frame_message(&msg).unwrap();

        let len = u32::from_be_bytes([framed[0], framed[1], framed[2], framed[3]]) as usize;
        assert_eq!(len, framed.len() - 4);

        let decoded = decode_message(&framed[4..]).unwrap();
        assert!(matches!(decoded, ReplicationMessage::Ack { .. }));
    }
}
