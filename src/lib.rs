//! Log-backed transactional storage engine for a cluster scheduler.
//!
//! This crate is a thin facade over its workspace members:
//!
//! * [`storage_core`]: the `Record`/`Op` vocabulary and the unified
//!   [`StorageError`].
//! * [`storage_durability`]: wire codec, entry framing, snapshot
//!   deduplication, and the log transport boundary.
//! * [`storage_concurrency`]: reentrant transaction coalescing.
//! * [`storage_engine`]: the [`StorageEngine`] itself, domain store
//!   interfaces, and the replay dispatcher.
//!
//! # Quick start
//!
//! ```no_run
//! use scheduler_storage::{
//!     DomainStores, EngineConfig, NullEventSink, StorageEngine,
//! };
//! # use scheduler_storage::{
//! #     HostAttributeStore, JobStore, JobUpdateStore, LockStore, QuotaStore,
//! #     SchedulerStore, SnapshotSource, TaskStore,
//! # };
//! # use storage_durability::MemoryLog;
//! # fn build_stores() -> DomainStores { unimplemented!() }
//! # fn build_snapshot_source() -> Box<dyn SnapshotSource> { unimplemented!() }
//! # fn example() -> storage_core::Result<()> {
//! let engine = StorageEngine::new(
//!     MemoryLog::new(),
//!     build_stores(),
//!     build_snapshot_source(),
//!     EngineConfig::default(),
//! );
//! engine.start(0, |_| Ok(()))?;
//! engine.write(|stores| stores.save_framework_id("framework-1"))?;
//! # Ok(())
//! # }
//! ```

pub use storage_concurrency::{OpSink, TransactionCoalescer};
pub use storage_core::error::{Result, StorageError};
pub use storage_core::op::Op;
pub use storage_core::record::{
    DeduplicatedSnapshot, LogicalRecord, PartialSnapshot, Snapshot, Transaction,
};
pub use storage_core::task::*;
pub use storage_durability::{Log, Position, Stream, StreamConfig};
pub use storage_engine::{
    ConfigError, DomainStores, EngineConfig, EngineConfigBuilder, EngineStats, EventSink,
    HostAttributeStore, HostAttributesChanged, JobStore, JobUpdateStore, LockStore,
    MutableStoreProvider, NullEventSink, QuotaStore, SchedulerStore, SnapshotSource,
    StorageEngine, TaskStore,
};
