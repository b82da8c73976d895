//! Live-write facade: forwards each domain mutation to its store and,
//! unless the store reports "no change", pushes the matching [`Op`]
//! into the current transaction's [`OpSink`].

use storage_concurrency::OpSink;
use storage_core::task::{
    CronJobConfig, HostAttributes, JobKey, JobUpdate, JobUpdateEvent, JobInstanceUpdateEvent,
    Lock, LockKey, ResourceAggregate, Role, Task, TaskConfig, TaskId, UpdateIdentifier,
};
use storage_core::{Op, Result};

use crate::stores::{DomainStores, HostAttributesChanged};

/// Writes to every domain store through the engine-wide write scope.
/// One is constructed per `StorageEngine::write` call.
pub struct MutableStoreProvider<'a> {
    stores: &'a DomainStores,
    sink: &'a OpSink<'a>,
}

impl<'a> MutableStoreProvider<'a> {
    pub fn new(stores: &'a DomainStores, sink: &'a OpSink<'a>) -> Self {
        Self { stores, sink }
    }

    pub fn save_framework_id(&self, id: impl Into<String>) -> Result<()> {
        let id = id.into();
        self.stores.scheduler.save_framework_id(&id)?;
        self.sink.push(Op::SaveFrameworkId { id });
        Ok(())
    }

    pub fn save_cron_job(&self, config: CronJobConfig) -> Result<()> {
        self.stores.jobs.save_accepted_job(&config)?;
        self.sink.push(Op::SaveCronJob { config });
        Ok(())
    }

    pub fn remove_job(&self, key: JobKey) -> Result<()> {
        self.stores.jobs.remove_job(&key)?;
        self.sink.push(Op::RemoveJob { key });
        Ok(())
    }

    pub fn save_tasks(&self, tasks: Vec<Task>) -> Result<()> {
        self.stores.tasks.save_tasks(&tasks)?;
        self.sink.push(Op::SaveTasks { tasks });
        Ok(())
    }

    /// Rewrites a task's config in place. Silently contributes no op
    /// when the store reports the config was unchanged.
    pub fn rewrite_task(&self, task_id: TaskId, new_config: TaskConfig) -> Result<()> {
        let changed = self
            .stores
            .tasks
            .unsafe_modify_in_place(&task_id, &new_config)?;
        if changed {
            self.sink.push(Op::RewriteTask {
                task_id,
                new_config,
            });
        }
        Ok(())
    }

    pub fn remove_tasks(&self, ids: Vec<TaskId>) -> Result<()> {
        self.stores.tasks.delete_tasks(&ids)?;
        self.sink.push(Op::RemoveTasks { ids });
        Ok(())
    }

    pub fn save_quota(&self, role: Role, aggregate: ResourceAggregate) -> Result<()> {
        self.stores.quotas.save_quota(&role, &aggregate)?;
        self.sink.push(Op::SaveQuota { role, aggregate });
        Ok(())
    }

    pub fn remove_quota(&self, role: Role) -> Result<()> {
        self.stores.quotas.remove_quota(&role)?;
        self.sink.push(Op::RemoveQuota { role });
        Ok(())
    }

    /// Silently contributes no op, and publishes no event, when the
    /// store reports the attributes were unchanged.
    pub fn save_host_attributes(&self, attrs: HostAttributes) -> Result<()> {
        let changed = self.stores.host_attributes.save_host_attributes(&attrs)?;
        if changed {
            self.sink.push(Op::SaveHostAttributes {
                attrs: attrs.clone(),
            });
            self.stores
                .events
                .post_host_attributes_changed(HostAttributesChanged { attrs });
        }
        Ok(())
    }

    pub fn save_lock(&self, lock: Lock) -> Result<()> {
        self.stores.locks.save_lock(&lock)?;
        self.sink.push(Op::SaveLock { lock });
        Ok(())
    }

    pub fn remove_lock(&self, key: LockKey) -> Result<()> {
        self.stores.locks.remove_lock(&key)?;
        self.sink.push(Op::RemoveLock { key });
        Ok(())
    }

    pub fn save_job_update(&self, update: JobUpdate, lock_token: Option<String>) -> Result<()> {
        self.stores
            .job_updates
            .save_job_update(&update, lock_token.as_deref())?;
        self.sink.push(Op::SaveJobUpdate { update, lock_token });
        Ok(())
    }

    pub fn save_job_update_event(&self, key: JobKey, update_id: String, event: JobUpdateEvent) -> Result<()> {
        let update_key = storage_core::task::JobUpdateKey {
            job_key: key,
            update_id,
        };
        self.stores
            .job_updates
            .save_job_update_event(&update_key, &event)?;
        self.sink.push(Op::SaveJobUpdateEvent {
            event,
            identifier: UpdateIdentifier::Key(update_key),
        });
        Ok(())
    }

    pub fn save_job_instance_update_event(
        &self,
        key: JobKey,
        update_id: String,
        event: JobInstanceUpdateEvent,
    ) -> Result<()> {
        let update_key = storage_core::task::JobUpdateKey {
            job_key: key,
            update_id,
        };
        self.stores
            .job_updates
            .save_job_instance_update_event(&update_key, &event)?;
        self.sink.push(Op::SaveJobInstanceUpdateEvent {
            event,
            identifier: UpdateIdentifier::Key(update_key),
        });
        Ok(())
    }

    pub fn prune_job_update_history(&self, per_job_retain: u32, threshold_ms: i64) -> Result<()> {
        self.stores
            .job_updates
            .prune_history(per_job_retain, threshold_ms)?;
        self.sink.push(Op::PruneJobUpdateHistory {
            per_job_retain,
            threshold_ms,
        });
        Ok(())
    }
}
