//! Orchestrates the durability and concurrency layers into the
//! storage engine a cluster scheduler embeds: `prepare`, `start`,
//! `write`, and `snapshot` over a log-backed, transactionally
//! coalesced, replayable store.

pub mod config;
pub mod engine;
pub mod replay;
pub mod stores;
pub mod writer;

pub use config::{ConfigError, EngineConfig, EngineConfigBuilder};
pub use engine::{EngineStats, StorageEngine};
pub use stores::{
    DomainStores, EventSink, HostAttributeStore, HostAttributesChanged, JobStore, JobUpdateStore,
    LockStore, NullEventSink, QuotaStore, SchedulerStore, SnapshotSource, TaskStore,
};
pub use writer::MutableStoreProvider;
