//! Deterministic binary encoding of [`LogicalRecord`] values.
//!
//! Each logical record kind is encoded as a one-byte tag followed by a
//! MessagePack-encoded payload. An unrecognized tag decodes to
//! [`LogicalRecord::Unknown`] instead of failing, so a newer writer's
//! log can still be replayed (forward-compatibly, minus the new
//! variant) by an older binary.

use storage_core::{LogicalRecord, Result, StorageError};

const TAG_NOOP: u8 = 0x00;
const TAG_TRANSACTION: u8 = 0x01;
const TAG_SNAPSHOT: u8 = 0x02;
const TAG_DEDUPLICATED_SNAPSHOT: u8 = 0x03;

/// Encodes a logical record to its tagged binary representation.
pub fn encode(record: &LogicalRecord) -> Result<Vec<u8>> {
    let (tag, payload) = match record {
        LogicalRecord::Noop => (TAG_NOOP, Vec::new()),
        LogicalRecord::Transaction(tx) => (TAG_TRANSACTION, encode_payload(tx)?),
        LogicalRecord::Snapshot(snap) => (TAG_SNAPSHOT, encode_payload(snap)?),
        LogicalRecord::DeduplicatedSnapshot(dedup) => {
            (TAG_DEDUPLICATED_SNAPSHOT, encode_payload(dedup)?)
        }
        LogicalRecord::Unknown(tag) => {
            return Err(StorageError::Coding {
                tag: Some(*tag),
                detail: "cannot re-encode a record of unknown kind".into(),
            })
        }
    };
    let mut out = Vec::with_capacity(1 + payload.len());
    out.push(tag);
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Decodes a tagged binary record produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<LogicalRecord> {
    let (&tag, payload) = bytes.split_first().ok_or_else(|| StorageError::Coding {
        tag: None,
        detail: "empty entry has no tag byte".into(),
    })?;
    match tag {
        TAG_NOOP => Ok(LogicalRecord::Noop),
        TAG_TRANSACTION => Ok(LogicalRecord::Transaction(decode_payload(tag, payload)?)),
        TAG_SNAPSHOT => Ok(LogicalRecord::Snapshot(decode_payload(tag, payload)?)),
        TAG_DEDUPLICATED_SNAPSHOT => Ok(LogicalRecord::DeduplicatedSnapshot(decode_payload(
            tag, payload,
        )?)),
        other => Ok(LogicalRecord::Unknown(other)),
    }
}

fn encode_payload<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    rmp_serde::to_vec(value).map_err(|e| StorageError::Coding {
        tag: None,
        detail: format!("msgpack encode failed: {e}"),
    })
}

fn decode_payload<T: serde::de::DeserializeOwned>(tag: u8, payload: &[u8]) -> Result<T> {
    rmp_serde::from_slice(payload).map_err(|e| StorageError::Coding {
        tag: Some(tag),
        detail: format!("msgpack decode failed: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage_core::op::Op;
    use storage_core::record::{Snapshot, Transaction};
    use storage_core::task::SchedulerMetadata;

    #[test]
    fn noop_round_trips() {
        let encoded = encode(&LogicalRecord::Noop).unwrap();
        assert_eq!(encoded, vec![TAG_NOOP]);
        assert_eq!(decode(&encoded).unwrap(), LogicalRecord::Noop);
    }

    #[test]
    fn transaction_round_trips() {
        let record = LogicalRecord::Transaction(Transaction {
            ops: vec![Op::SaveFrameworkId {
                id: "fw-1".into(),
            }],
            schema_version: 7,
        });
        let encoded = encode(&record).unwrap();
        assert_eq!(encoded[0], TAG_TRANSACTION);
        assert_eq!(decode(&encoded).unwrap(), record);
    }

    #[test]
    fn snapshot_round_trips() {
        let record = LogicalRecord::Snapshot(Snapshot {
            timestamp_ms: 42,
            tasks: vec![],
            jobs: vec![],
            quotas: vec![],
            host_attributes: vec![],
            locks: vec![],
            job_updates: vec![],
            scheduler_metadata: SchedulerMetadata::default(),
        });
        let encoded = encode(&record).unwrap();
        assert_eq!(decode(&encoded).unwrap(), record);
    }

    #[test]
    fn unknown_tag_decodes_without_error() {
        let bytes = vec![0x7f, 1, 2, 3];
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, LogicalRecord::Unknown(0x7f));
    }

    #[test]
    fn empty_entry_is_a_coding_error() {
        let err = decode(&[]).unwrap_err();
        assert!(matches!(err, StorageError::Coding { tag: None, .. }));
    }

    #[test]
    fn truncated_payload_is_a_coding_error() {
        let bytes = vec![TAG_TRANSACTION, 0xff, 0xff];
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, StorageError::Coding { tag: Some(TAG_TRANSACTION), .. }));
    }

    proptest::proptest! {
        #[test]
        fn transaction_decode_of_encode_is_identity(
            ids in proptest::collection::vec(".*", 0..8),
            schema_version in 0u32..1000,
        ) {
            let record = LogicalRecord::Transaction(Transaction {
                ops: ids.into_iter().map(|id| Op::SaveFrameworkId { id }).collect(),
                schema_version,
            });
            let encoded = encode(&record).unwrap();
            proptest::prop_assert_eq!(decode(&encoded).unwrap(), record);
        }
    }
}
