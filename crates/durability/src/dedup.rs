//! Snapshot deduplication.
//!
//! Scheduler snapshots routinely carry thousands of tasks that share an
//! identical [`TaskConfig`] (same job, different instance). This module
//! factors those repeated blobs out into a digest-keyed map so the
//! snapshot record only stores each distinct config once.

use std::collections::HashMap;

use storage_core::record::{DeduplicatedSnapshot, PartialSnapshot, Snapshot};
use storage_core::task::{Task, TaskConfig, TaskConfigDigest};
use storage_core::{Result, StorageError};

use crate::hash::{digest, HashFunction};

fn encode_for_digest(config: &TaskConfig) -> Result<Vec<u8>> {
    rmp_serde::to_vec(config).map_err(|e| StorageError::Coding {
        tag: None,
        detail: format!("failed to encode task config for digest: {e}"),
    })
}

/// Factors repeated [`TaskConfig`] blobs out of `snapshot` into a
/// digest-keyed map, leaving only task ids plus digest references in
/// the partial snapshot.
pub fn deduplicate(snapshot: &Snapshot, hash_function: HashFunction) -> Result<DeduplicatedSnapshot> {
    let mut task_configs: HashMap<TaskConfigDigest, TaskConfig> = HashMap::new();
    let mut task_config_refs: HashMap<String, TaskConfigDigest> = HashMap::new();
    let mut task_ids = Vec::with_capacity(snapshot.tasks.len());

    for task in &snapshot.tasks {
        let encoded = encode_for_digest(&task.config)?;
        let config_digest = digest(hash_function, &encoded);
        task_configs.entry(config_digest).or_insert_with(|| task.config.clone());
        task_config_refs.insert(task.id.clone(), config_digest);
        task_ids.push(task.id.clone());
    }

    Ok(DeduplicatedSnapshot {
        partial: PartialSnapshot {
            timestamp_ms: snapshot.timestamp_ms,
            task_ids,
            jobs: snapshot.jobs.clone(),
            quotas: snapshot.quotas.clone(),
            host_attributes: snapshot.host_attributes.clone(),
            locks: snapshot.locks.clone(),
            job_updates: snapshot.job_updates.clone(),
            scheduler_metadata: snapshot.scheduler_metadata.clone(),
        },
        task_configs,
        task_config_refs,
    })
}

/// Reverses [`deduplicate`], re-expanding every task id into a full
/// [`Task`] by resolving its digest reference.
pub fn reduplicate(dedup: &DeduplicatedSnapshot) -> Result<Snapshot> {
    let mut tasks = Vec::with_capacity(dedup.partial.task_ids.len());
    for task_id in &dedup.partial.task_ids {
        let config_digest = dedup.task_config_refs.get(task_id).ok_or_else(|| StorageError::Dedup {
            task_id: task_id.clone(),
            digest: 0,
        })?;
        let config = dedup
            .task_configs
            .get(config_digest)
            .ok_or_else(|| StorageError::Dedup {
                task_id: task_id.clone(),
                digest: *config_digest,
            })?;
        tasks.push(Task {
            id: task_id.clone(),
            config: config.clone(),
        });
    }

    Ok(Snapshot {
        timestamp_ms: dedup.partial.timestamp_ms,
        tasks,
        jobs: dedup.partial.jobs.clone(),
        quotas: dedup.partial.quotas.clone(),
        host_attributes: dedup.partial.host_attributes.clone(),
        locks: dedup.partial.locks.clone(),
        job_updates: dedup.partial.job_updates.clone(),
        scheduler_metadata: dedup.partial.scheduler_metadata.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage_core::task::SchedulerMetadata;

    fn task(id: &str, payload: &[u8]) -> Task {
        Task {
            id: id.to_string(),
            config: TaskConfig(payload.to_vec()),
        }
    }

    fn empty_snapshot(tasks: Vec<Task>) -> Snapshot {
        Snapshot {
            timestamp_ms: 1,
            tasks,
            jobs: vec![],
            quotas: vec![],
            host_attributes: vec![],
            locks: vec![],
            job_updates: vec![],
            scheduler_metadata: SchedulerMetadata::default(),
        }
    }

    #[test]
    fn shared_configs_collapse_to_one_entry() {
        let snapshot = empty_snapshot(vec![
            task("t1", b"job-a"),
            task("t2", b"job-a"),
            task("t3", b"job-b"),
        ]);
        let dedup = deduplicate(&snapshot, HashFunction::Xxh3_128).unwrap();
        assert_eq!(dedup.task_configs.len(), 2);
        assert_eq!(dedup.task_config_refs.len(), 3);
    }

    #[test]
    fn round_trip_preserves_snapshot() {
        let snapshot = empty_snapshot(vec![task("t1", b"job-a"), task("t2", b"job-a")]);
        let dedup = deduplicate(&snapshot, HashFunction::Xxh3_128).unwrap();
        let restored = reduplicate(&dedup).unwrap();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn missing_config_reference_is_a_dedup_error() {
        let snapshot = empty_snapshot(vec![task("t1", b"job-a")]);
        let mut dedup = deduplicate(&snapshot, HashFunction::Xxh3_128).unwrap();
        dedup.task_configs.clear();
        let err = reduplicate(&dedup).unwrap_err();
        assert!(matches!(err, StorageError::Dedup { .. }));
    }

    proptest::proptest! {
        #[test]
        fn reduplicate_of_deduplicate_is_identity(
            payloads in proptest::collection::vec(proptest::collection::vec(proptest::prelude::any::<u8>(), 0..16), 0..20),
        ) {
            let tasks = payloads
                .into_iter()
                .enumerate()
                .map(|(i, payload)| task(&format!("t{i}"), &payload))
                .collect();
            let snapshot = empty_snapshot(tasks);
            let dedup = deduplicate(&snapshot, HashFunction::Xxh3_128).unwrap();
            let restored = reduplicate(&dedup).unwrap();
            proptest::prop_assert_eq!(restored, snapshot);
        }
    }
}
