//! Partition replication: snapshot build, wire codec, replica apply.
//!
//! The replication path for one partition:
//!
//! ```text
//! owner node                                     replica node
//! ┌──────────────────────┐                       ┌──────────────────────┐
//! │ partition context P  │                       │ partition context P  │
//! │  build_snapshot ──┐  │   ReplicationMessage  │  ┌── apply_snapshot  │
//! │                   ▼  │   ──── transport ───► │  ▼                   │
//! │  write_internal bytes│                       │ read_internal bytes  │
//! └──────────────────────┘                       └──────────────────────┘
//! ```
//!
//! The snapshot is captured and applied as one unit of work on the owning
//! partition's execution context, so both sides observe a single consistent
//! instant. A deserialization failure on the replica surfaces before any
//! local state is touched; the external migration coordinator owns retries.

mod applier;
mod builder;
mod codec;
mod operation;
mod snapshot;

pub use applier::apply_snapshot;
pub use builder::build_snapshot;
pub use codec::{read_snapshot, write_snapshot};
pub use operation::{
    decode_message, encode_message, frame_message, ReplicationMessage, ReplicationOperation,
};
pub use snapshot::{RecordReplicationInfo, ReplicationSnapshot};
