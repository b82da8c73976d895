//! Domain store interfaces the engine writes through and replays
//! against. Their semantics (indexing, validation, query support) live
//! in the surrounding scheduler; this crate only needs to call them in
//! the right order with the right arguments.

use storage_core::record::Snapshot;
use storage_core::task::{
    CronJobConfig, HostAttributes, JobKey, JobUpdate, JobUpdateEvent, JobInstanceUpdateEvent,
    JobUpdateKey, Lock, LockKey, ResourceAggregate, Role, Task, TaskConfig, TaskId,
};
use storage_core::Result;

/// Tracks the single framework id assigned to this scheduler instance.
pub trait SchedulerStore: Send + Sync {
    fn save_framework_id(&self, id: &str) -> Result<()>;
}

/// Cron job definitions.
pub trait JobStore: Send + Sync {
    fn save_accepted_job(&self, config: &CronJobConfig) -> Result<()>;
    fn remove_job(&self, key: &JobKey) -> Result<()>;
}

/// Scheduled task instances.
pub trait TaskStore: Send + Sync {
    fn save_tasks(&self, tasks: &[Task]) -> Result<()>;

    /// Rewrites one task's config in place. Returns `false` if the task
    /// doesn't exist or the new config is identical to the existing
    /// one; callers must not log an op in that case.
    fn unsafe_modify_in_place(&self, task_id: &TaskId, new_config: &TaskConfig) -> Result<bool>;

    fn delete_tasks(&self, ids: &[TaskId]) -> Result<()>;

    fn fetch_all_tasks(&self) -> Result<Vec<Task>>;
}

/// Per-role resource quotas.
pub trait QuotaStore: Send + Sync {
    fn save_quota(&self, role: &Role, aggregate: &ResourceAggregate) -> Result<()>;
    fn remove_quota(&self, role: &Role) -> Result<()>;
}

/// Per-host attribute reports.
pub trait HostAttributeStore: Send + Sync {
    /// Returns `false` if the attributes were identical to what's
    /// already stored; callers must not log an op or publish an
    /// event in that case.
    fn save_host_attributes(&self, attrs: &HostAttributes) -> Result<bool>;
}

/// Maintenance/coordination locks.
pub trait LockStore: Send + Sync {
    fn save_lock(&self, lock: &Lock) -> Result<()>;
    fn remove_lock(&self, key: &LockKey) -> Result<()>;
}

/// Job update history: the update itself plus its whole-update and
/// per-instance event streams.
pub trait JobUpdateStore: Send + Sync {
    fn save_job_update(&self, update: &JobUpdate, lock_token: Option<&str>) -> Result<()>;
    fn save_job_update_event(&self, key: &JobUpdateKey, event: &JobUpdateEvent) -> Result<()>;
    fn save_job_instance_update_event(
        &self,
        key: &JobUpdateKey,
        event: &JobInstanceUpdateEvent,
    ) -> Result<()>;
    fn prune_history(&self, per_job_retain: u32, threshold_ms: i64) -> Result<()>;

    /// Resolves a legacy (pre-key-migration) update identifier. Returns
    /// `None` if the legacy id is unknown, in which case replay drops
    /// the event silently rather than failing recovery.
    fn fetch_update_key(&self, legacy_id: &str) -> Result<Option<JobUpdateKey>>;
}

/// Published when host attributes are saved and actually changed.
#[derive(Debug, Clone, PartialEq)]
pub struct HostAttributesChanged {
    pub attrs: HostAttributes,
}

/// Receives engine-originated events; the surrounding scheduler
/// subscribes to these to drive its own reconciliation logic.
pub trait EventSink: Send + Sync {
    fn post_host_attributes_changed(&self, event: HostAttributesChanged);
}

/// An `EventSink` that drops every event, used where nothing downstream
/// cares (recovery replay, most tests).
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn post_host_attributes_changed(&self, _event: HostAttributesChanged) {}
}

/// Bundles every domain store the engine writes through and replays
/// against.
pub struct DomainStores {
    pub scheduler: Box<dyn SchedulerStore>,
    pub jobs: Box<dyn JobStore>,
    pub tasks: Box<dyn TaskStore>,
    pub quotas: Box<dyn QuotaStore>,
    pub host_attributes: Box<dyn HostAttributeStore>,
    pub locks: Box<dyn LockStore>,
    pub job_updates: Box<dyn JobUpdateStore>,
    pub events: Box<dyn EventSink>,
}

/// Captures a full point-in-time materialization of every domain store
/// so the engine can write it as a [`Snapshot`] record. Implemented by
/// the surrounding scheduler, which knows how to read a consistent view
/// across all of its stores.
pub trait SnapshotSource: Send + Sync {
    fn capture(&self, timestamp_ms: i64) -> Result<Snapshot>;
}
