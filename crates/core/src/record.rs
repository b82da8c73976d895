//! Logical record kinds stored in the log.
//!
//! Physical framing (header/chunk splitting, content digests, optional
//! deflation) is layered on top of these by `storage-durability`; this
//! module only defines what a decoded record *means*.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::op::Op;
use crate::task::{
    CronJobConfig, HostAttributes, JobUpdate, Lock, Role, ResourceAggregate, SchedulerMetadata,
    TaskConfig, TaskConfigDigest, TaskId,
};

/// A batch of ops appended together and replayed together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub ops: Vec<Op>,
    pub schema_version: u32,
}

/// A full materialization of every domain store, written periodically
/// so recovery doesn't have to replay the log from its very start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp_ms: i64,
    pub tasks: Vec<crate::task::Task>,
    pub jobs: Vec<CronJobConfig>,
    pub quotas: Vec<(Role, ResourceAggregate)>,
    pub host_attributes: Vec<HostAttributes>,
    pub locks: Vec<Lock>,
    pub job_updates: Vec<JobUpdate>,
    pub scheduler_metadata: SchedulerMetadata,
}

/// Snapshot with task configs factored out, populated by
/// `storage-durability::dedup`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialSnapshot {
    pub timestamp_ms: i64,
    pub task_ids: Vec<TaskId>,
    pub jobs: Vec<CronJobConfig>,
    pub quotas: Vec<(Role, ResourceAggregate)>,
    pub host_attributes: Vec<HostAttributes>,
    pub locks: Vec<Lock>,
    pub job_updates: Vec<JobUpdate>,
    pub scheduler_metadata: SchedulerMetadata,
}

/// A [`Snapshot`] with repeated [`TaskConfig`] blobs factored through a
/// digest-keyed map, produced by `storage-durability::dedup::deduplicate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeduplicatedSnapshot {
    pub partial: PartialSnapshot,
    pub task_configs: HashMap<TaskConfigDigest, TaskConfig>,
    pub task_config_refs: HashMap<TaskId, TaskConfigDigest>,
}

/// A decoded log entry.
///
/// `Unknown` preserves forward compatibility: a tag byte this binary
/// doesn't recognize decodes to `Unknown` rather than failing, and is
/// silently skipped wherever records are dispatched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogicalRecord {
    Transaction(Transaction),
    Snapshot(Snapshot),
    DeduplicatedSnapshot(DeduplicatedSnapshot),
    Noop,
    #[serde(skip)]
    Unknown(u8),
}

impl LogicalRecord {
    /// Short, stable name used in log messages and error context.
    pub fn kind_name(&self) -> &'static str {
        match self {
            LogicalRecord::Transaction(_) => "Transaction",
            LogicalRecord::Snapshot(_) => "Snapshot",
            LogicalRecord::DeduplicatedSnapshot(_) => "DeduplicatedSnapshot",
            LogicalRecord::Noop => "Noop",
            LogicalRecord::Unknown(_) => "Unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_round_trips_through_json() {
        let record = LogicalRecord::Noop;
        let json = serde_json::to_string(&record).unwrap();
        let back: LogicalRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }

    #[test]
    fn kind_name_covers_every_variant() {
        assert_eq!(LogicalRecord::Noop.kind_name(), "Noop");
        assert_eq!(LogicalRecord::Unknown(0xff).kind_name(), "Unknown");
    }
}
