//! Opaque domain value types referenced by [`crate::op::Op`] and
//! [`crate::record::Snapshot`].
//!
//! The scheduler's task/job/quota/lock semantics live outside this
//! engine; these types carry just enough shape for the engine to
//! route, frame, and digest them without interpreting their contents.

use serde::{Deserialize, Serialize};

/// Identifier of a task instance, assigned by the scheduler.
pub type TaskId = String;

/// A role name a quota or job is scoped to.
pub type Role = String;

/// 128-bit content digest of an encoded [`TaskConfig`], used by the
/// snapshot deduplicator to collapse repeated blobs.
pub type TaskConfigDigest = u128;

/// Opaque, scheduler-defined task configuration blob. The engine only
/// ever serializes, digests, and copies this value; it never inspects
/// its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig(pub Vec<u8>);

impl TaskConfig {
    /// Bytes of the opaque configuration payload.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A scheduled task: an id paired with its (still opaque) config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub config: TaskConfig,
}

/// Stable identity of a cron job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct JobKey {
    pub role: String,
    pub environment: String,
    pub name: String,
}

/// Opaque cron job definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CronJobConfig {
    pub key: JobKey,
    pub cron_schedule: String,
    pub payload: Vec<u8>,
}

/// Resource quota aggregate for a role.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceAggregate {
    pub num_cpus: f64,
    pub ram_mb: i64,
    pub disk_mb: i64,
}

/// Attributes reported by a scheduler agent (host).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostAttributes {
    pub host: String,
    /// Replay must drop records lacking this field; see
    /// `storage-engine::replay`.
    pub slave_id: Option<String>,
    pub attributes: Vec<(String, Vec<String>)>,
}

/// Identity of a maintenance/coordination lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct LockKey {
    pub resource: String,
}

/// A held maintenance lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lock {
    pub key: LockKey,
    pub token: String,
    pub user: String,
    pub timestamp_ms: i64,
}

/// Stable identity of a job update, present once the update has been
/// fully accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct JobUpdateKey {
    pub job_key: JobKey,
    pub update_id: String,
}

/// Summary portion of a job update record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobUpdateSummary {
    /// Backfilled by replay from `job_key` + `update_id` when absent;
    /// see `storage-engine::replay::replay_save_job_update`.
    pub key: Option<JobUpdateKey>,
    pub job_key: Option<JobKey>,
    pub update_id: Option<String>,
    pub user: String,
}

/// Opaque job update definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobUpdate {
    pub summary: JobUpdateSummary,
    pub instructions: Vec<u8>,
}

/// Either a resolved update key or a pre-migration legacy identifier
/// that must be resolved via `fetch_update_key` during replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UpdateIdentifier {
    Key(JobUpdateKey),
    Legacy(String),
}

/// A status transition for a whole job update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobUpdateEvent {
    pub status: String,
    pub timestamp_ms: i64,
}

/// A status transition for one task instance within a job update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInstanceUpdateEvent {
    pub instance_id: i32,
    pub status: String,
    pub timestamp_ms: i64,
}

/// Scheduler-wide metadata tracked outside any individual domain store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerMetadata {
    pub framework_id: Option<String>,
}
