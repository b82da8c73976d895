//! Log transport, wire codec, entry framing, and snapshot
//! deduplication for the scheduler storage engine.
//!
//! This crate has no concept of concurrency or domain stores; it
//! turns logical records into physical log entries and back, and
//! nothing more. `storage-concurrency` and `storage-engine` build on
//! top of it.

pub mod codec;
pub mod config;
pub mod dedup;
pub mod external;
pub mod framing;
pub mod hash;
pub mod log_manager;
pub mod stream;

pub use config::StreamConfig;
pub use external::{Entry, Log, Position, SnapshotStore, Stream};
pub use framing::{EntryDecoder, EntrySerializer, SerializerConfig};
pub use hash::HashFunction;
pub use log_manager::LogManager;
pub use stream::StreamManager;

#[cfg(any(test, feature = "testing"))]
pub use external::testing::{MemoryLog, MemoryLogState, MemoryStream};
