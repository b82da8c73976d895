//! The mutation vocabulary of a transaction.
//!
//! Every write the engine accepts is eventually expressed as one or
//! more `Op` values, appended inside a `Transaction` record and later
//! replayed through the dispatch tables in `storage-engine::replay`.

use serde::{Deserialize, Serialize};

use crate::task::{
    CronJobConfig, HostAttributes, JobKey, JobUpdate, JobUpdateEvent, JobInstanceUpdateEvent,
    Lock, LockKey, ResourceAggregate, Role, Task, TaskConfig, TaskId, UpdateIdentifier,
};

/// A single mutation, as it appears inside a [`crate::record::Transaction`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Op {
    SaveFrameworkId {
        id: String,
    },
    SaveCronJob {
        config: CronJobConfig,
    },
    RemoveJob {
        key: JobKey,
    },
    SaveTasks {
        tasks: Vec<Task>,
    },
    RewriteTask {
        task_id: TaskId,
        new_config: TaskConfig,
    },
    RemoveTasks {
        ids: Vec<TaskId>,
    },
    SaveQuota {
        role: Role,
        aggregate: ResourceAggregate,
    },
    RemoveQuota {
        role: Role,
    },
    SaveHostAttributes {
        attrs: HostAttributes,
    },
    SaveLock {
        lock: Lock,
    },
    RemoveLock {
        key: LockKey,
    },
    SaveJobUpdate {
        update: JobUpdate,
        lock_token: Option<String>,
    },
    SaveJobUpdateEvent {
        event: JobUpdateEvent,
        identifier: UpdateIdentifier,
    },
    SaveJobInstanceUpdateEvent {
        event: JobInstanceUpdateEvent,
        identifier: UpdateIdentifier,
    },
    PruneJobUpdateHistory {
        per_job_retain: u32,
        threshold_ms: i64,
    },
}

impl Op {
    /// Short, stable name used in log messages and error context.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Op::SaveFrameworkId { .. } => "SaveFrameworkId",
            Op::SaveCronJob { .. } => "SaveCronJob",
            Op::RemoveJob { .. } => "RemoveJob",
            Op::SaveTasks { .. } => "SaveTasks",
            Op::RewriteTask { .. } => "RewriteTask",
            Op::RemoveTasks { .. } => "RemoveTasks",
            Op::SaveQuota { .. } => "SaveQuota",
            Op::RemoveQuota { .. } => "RemoveQuota",
            Op::SaveHostAttributes { .. } => "SaveHostAttributes",
            Op::SaveLock { .. } => "SaveLock",
            Op::RemoveLock { .. } => "RemoveLock",
            Op::SaveJobUpdate { .. } => "SaveJobUpdate",
            Op::SaveJobUpdateEvent { .. } => "SaveJobUpdateEvent",
            Op::SaveJobInstanceUpdateEvent { .. } => "SaveJobInstanceUpdateEvent",
            Op::PruneJobUpdateHistory { .. } => "PruneJobUpdateHistory",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_name_is_stable() {
        let op = Op::SaveFrameworkId { id: "fw-1".into() };
        assert_eq!(op.kind_name(), "SaveFrameworkId");
    }

    #[test]
    fn op_round_trips_through_json() {
        let op = Op::RemoveTasks {
            ids: vec!["a".into(), "b".into()],
        };
        let json = serde_json::to_string(&op).unwrap();
        let back: Op = serde_json::from_str(&json).unwrap();
        assert_eq!(op, back);
    }
}
