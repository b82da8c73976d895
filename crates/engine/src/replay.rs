//! Replay dispatch: applies decoded records directly to the domain
//! stores during recovery, bypassing the write-scope coalescer
//! entirely (replayed ops must never be re-logged).
//!
//! `replay_record` and `replay_op` are this module's two dispatch
//! tables: a closed match over each record/op kind, so adding a new
//! variant without a handler is a compile error rather than a silent
//! no-op at runtime.

use tracing::warn;

use storage_core::record::Snapshot;
use storage_core::task::{JobUpdateKey, UpdateIdentifier};
use storage_core::{LogicalRecord, Op, Result, StorageError};

use crate::stores::DomainStores;

/// Replays one decoded record against `stores`.
///
/// `DeduplicatedSnapshot` is never passed here; `StreamManager`
/// expands it to `Snapshot` before recovery sees it. `Noop` and
/// `Unknown` records are skipped, matching the "records skipped
/// silently" forward-compatibility rule.
pub fn replay_record(record: LogicalRecord, stores: &DomainStores) -> Result<()> {
    match record {
        LogicalRecord::Transaction(tx) => {
            for op in tx.ops {
                replay_op(op, stores)?;
            }
            Ok(())
        }
        LogicalRecord::Snapshot(snapshot) => replay_snapshot(snapshot, stores),
        LogicalRecord::DeduplicatedSnapshot(_) => Err(StorageError::Replay(
            "DeduplicatedSnapshot reached the replay dispatcher unexpanded".into(),
        )),
        LogicalRecord::Noop => Ok(()),
        LogicalRecord::Unknown(tag) => {
            warn!(tag, "skipping record of unrecognized kind during recovery");
            Ok(())
        }
    }
}

fn replay_snapshot(snapshot: Snapshot, stores: &DomainStores) -> Result<()> {
    if let Some(id) = &snapshot.scheduler_metadata.framework_id {
        stores.scheduler.save_framework_id(id)?;
    }
    for job in &snapshot.jobs {
        stores.jobs.save_accepted_job(job)?;
    }
    stores.tasks.save_tasks(&snapshot.tasks)?;
    for (role, aggregate) in &snapshot.quotas {
        stores.quotas.save_quota(role, aggregate)?;
    }
    for attrs in &snapshot.host_attributes {
        if attrs.slave_id.is_none() {
            warn!(host = %attrs.host, "dropping snapshot host attributes with no slave id");
            continue;
        }
        stores.host_attributes.save_host_attributes(attrs)?;
    }
    for lock in &snapshot.locks {
        stores.locks.save_lock(lock)?;
    }
    for update in &snapshot.job_updates {
        stores.job_updates.save_job_update(update, None)?;
    }
    Ok(())
}

/// Replays one op against `stores`. See module docs for the dispatch
/// table framing.
pub fn replay_op(op: Op, stores: &DomainStores) -> Result<()> {
    match op {
        Op::SaveFrameworkId { id } => stores.scheduler.save_framework_id(&id),
        Op::SaveCronJob { config } => stores.jobs.save_accepted_job(&config),
        Op::RemoveJob { key } => stores.jobs.remove_job(&key),
        Op::SaveTasks { tasks } => stores.tasks.save_tasks(&tasks),
        Op::RewriteTask {
            task_id,
            new_config,
        } => {
            // The return value only matters for live-write op
            // suppression; during replay the op already exists, so it
            // must be applied unconditionally.
            stores.tasks.unsafe_modify_in_place(&task_id, &new_config)?;
            Ok(())
        }
        Op::RemoveTasks { ids } => stores.tasks.delete_tasks(&ids),
        Op::SaveQuota { role, aggregate } => stores.quotas.save_quota(&role, &aggregate),
        Op::RemoveQuota { role } => stores.quotas.remove_quota(&role),
        Op::SaveHostAttributes { attrs } => {
            if attrs.slave_id.is_none() {
                warn!(host = %attrs.host, "dropping SaveHostAttributes with no slave id");
                return Ok(());
            }
            stores.host_attributes.save_host_attributes(&attrs)?;
            Ok(())
        }
        Op::SaveLock { lock } => stores.locks.save_lock(&lock),
        Op::RemoveLock { key } => stores.locks.remove_lock(&key),
        Op::SaveJobUpdate { mut update, lock_token } => {
            if update.summary.key.is_none() {
                match (&update.summary.job_key, &update.summary.update_id) {
                    (Some(job_key), Some(update_id)) => {
                        update.summary.key = Some(JobUpdateKey {
                            job_key: job_key.clone(),
                            update_id: update_id.clone(),
                        });
                    }
                    _ => {
                        return Err(StorageError::Replay(
                            "SaveJobUpdate has no key and cannot backfill one from job_key/update_id"
                                .into(),
                        ))
                    }
                }
            }
            stores
                .job_updates
                .save_job_update(&update, lock_token.as_deref())
        }
        Op::SaveJobUpdateEvent { event, identifier } => {
            match resolve_update_key(identifier, stores)? {
                Some(key) => stores.job_updates.save_job_update_event(&key, &event),
                None => {
                    warn!("dropping SaveJobUpdateEvent with unresolvable legacy update id");
                    Ok(())
                }
            }
        }
        Op::SaveJobInstanceUpdateEvent { event, identifier } => {
            match resolve_update_key(identifier, stores)? {
                Some(key) => stores
                    .job_updates
                    .save_job_instance_update_event(&key, &event),
                None => {
                    warn!("dropping SaveJobInstanceUpdateEvent with unresolvable legacy update id");
                    Ok(())
                }
            }
        }
        Op::PruneJobUpdateHistory {
            per_job_retain,
            threshold_ms,
        } => stores.job_updates.prune_history(per_job_retain, threshold_ms),
    }
}

fn resolve_update_key(
    identifier: UpdateIdentifier,
    stores: &DomainStores,
) -> Result<Option<JobUpdateKey>> {
    match identifier {
        UpdateIdentifier::Key(key) => Ok(Some(key)),
        UpdateIdentifier::Legacy(legacy_id) => stores.job_updates.fetch_update_key(&legacy_id),
    }
}
