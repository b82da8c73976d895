//! Entry serializer: splits an encoded logical record into one or more
//! physical entries when it exceeds the configured size limit, and
//! reassembles them on read, verifying content digests as it goes.
//!
//! Wire layout of a physical entry, first byte is the envelope tag:
//!
//! * `DIRECT`: `[tag][payload]`, a whole encoded record in one entry.
//! * `DEFLATED`: `[tag][payload]`, `payload` is a zstd frame that
//!   decompresses to an encoded record.
//! * `HEADER`: `[tag][inner_tag][chunk_count: u32 LE][digest: u128 LE]`,
//!   announces a multi-chunk record and its whole-payload digest.
//! * `CHUNK`: `[tag][chunk_digest: u128 LE][chunk_bytes]`.

use byteorder::{ByteOrder, LittleEndian};
use tracing::trace;

use storage_core::{LogicalRecord, Result, StorageError};

use crate::codec;
use crate::hash::{digest, HashFunction};

const ENVELOPE_DIRECT: u8 = 0xA0;
const ENVELOPE_DEFLATED: u8 = 0xA1;
const ENVELOPE_HEADER: u8 = 0xA2;
const ENVELOPE_CHUNK: u8 = 0xA3;

const HEADER_LEN: usize = 1 + 1 + 4 + 16;
const CHUNK_OVERHEAD: usize = 1 + 16;

/// Configuration controlling how the serializer splits and digests
/// entries.
#[derive(Debug, Clone, Copy)]
pub struct SerializerConfig {
    /// Largest single physical entry the serializer will emit before
    /// switching to header/chunk framing.
    pub max_entry_size: usize,
    /// Digest algorithm used for both whole-payload and per-chunk
    /// content verification.
    pub hash_function: HashFunction,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            max_entry_size: 8 * 1024 * 1024,
            hash_function: HashFunction::Xxh3_128,
        }
    }
}

/// Splits and joins encoded records into physical log entries.
#[derive(Debug, Clone, Copy)]
pub struct EntrySerializer {
    config: SerializerConfig,
}

impl EntrySerializer {
    pub fn new(config: SerializerConfig) -> Self {
        Self { config }
    }

    /// Encodes `record`, optionally deflates it, and frames the result
    /// into one or more physical entries.
    pub fn serialize(&self, record: &LogicalRecord, deflate: bool) -> Result<Vec<Vec<u8>>> {
        let encoded = codec::encode(record)?;
        let (inner_tag, payload) = if deflate {
            let compressed = zstd::encode_all(encoded.as_slice(), 0)
                .map_err(|e| StorageError::Framing(format!("zstd compression failed: {e}")))?;
            (ENVELOPE_DEFLATED, compressed)
        } else {
            (ENVELOPE_DIRECT, encoded)
        };

        if HEADER_LEN.max(1 + payload.len()) <= self.config.max_entry_size
            && 1 + payload.len() <= self.config.max_entry_size
        {
            let mut entry = Vec::with_capacity(1 + payload.len());
            entry.push(inner_tag);
            entry.extend_from_slice(&payload);
            return Ok(vec![entry]);
        }

        self.frame_chunks(inner_tag, &payload)
    }

    fn frame_chunks(&self, inner_tag: u8, payload: &[u8]) -> Result<Vec<Vec<u8>>> {
        let chunk_capacity = self
            .config
            .max_entry_size
            .checked_sub(CHUNK_OVERHEAD)
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                StorageError::Framing("max_entry_size too small to hold a single chunk".into())
            })?;

        let whole_digest = digest(self.config.hash_function, payload);
        let chunks: Vec<&[u8]> = payload.chunks(chunk_capacity).collect();
        let chunk_count = u32::try_from(chunks.len())
            .map_err(|_| StorageError::Framing("too many chunks for u32 count".into()))?;

        let mut header = Vec::with_capacity(HEADER_LEN);
        header.push(ENVELOPE_HEADER);
        header.push(inner_tag);
        let mut count_bytes = [0u8; 4];
        LittleEndian::write_u32(&mut count_bytes, chunk_count);
        header.extend_from_slice(&count_bytes);
        let mut digest_bytes = [0u8; 16];
        LittleEndian::write_u128(&mut digest_bytes, whole_digest);
        header.extend_from_slice(&digest_bytes);

        let mut entries = Vec::with_capacity(1 + chunks.len());
        entries.push(header);
        for chunk in chunks {
            let chunk_digest = digest(self.config.hash_function, chunk);
            let mut entry = Vec::with_capacity(CHUNK_OVERHEAD + chunk.len());
            entry.push(ENVELOPE_CHUNK);
            let mut chunk_digest_bytes = [0u8; 16];
            LittleEndian::write_u128(&mut chunk_digest_bytes, chunk_digest);
            entry.extend_from_slice(&chunk_digest_bytes);
            entry.extend_from_slice(chunk);
            entries.push(entry);
        }
        trace!(chunks = entries.len() - 1, "framed record into chunks");
        Ok(entries)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReassemblyState {
    Idle,
    Collecting,
}

/// Reassembles a stream of physical entries back into [`LogicalRecord`]
/// values, unwrapping deflation but leaving dedup expansion to the
/// caller (`storage_durability::stream::StreamManager`).
pub struct EntryDecoder {
    config: SerializerConfig,
    state: ReassemblyState,
    inner_tag: u8,
    expected_chunks: u32,
    expected_digest: u128,
    buffer: Vec<u8>,
    seen_chunks: u32,
}

impl EntryDecoder {
    pub fn new(config: SerializerConfig) -> Self {
        Self {
            config,
            state: ReassemblyState::Idle,
            inner_tag: 0,
            expected_chunks: 0,
            expected_digest: 0,
            buffer: Vec::new(),
            seen_chunks: 0,
        }
    }

    /// Feeds one physical entry. Returns `Some(record)` once a whole
    /// record has been reassembled, `None` if more chunks are needed.
    pub fn feed(&mut self, entry: &[u8]) -> Result<Option<LogicalRecord>> {
        let (&tag, rest) = entry.split_first().ok_or_else(|| {
            StorageError::Framing("empty physical entry has no envelope tag".into())
        })?;

        match tag {
            ENVELOPE_DIRECT | ENVELOPE_DEFLATED => {
                if self.state == ReassemblyState::Collecting {
                    return Err(StorageError::Framing(
                        "direct entry arrived while collecting a chunked record".into(),
                    ));
                }
                self.finish_payload(tag, rest).map(Some)
            }
            ENVELOPE_HEADER => {
                if self.state == ReassemblyState::Collecting {
                    return Err(StorageError::Framing(
                        "header arrived while already collecting a chunked record".into(),
                    ));
                }
                if rest.len() != 1 + 4 + 16 {
                    return Err(StorageError::Framing("malformed frame header length".into()));
                }
                self.inner_tag = rest[0];
                self.expected_chunks = LittleEndian::read_u32(&rest[1..5]);
                self.expected_digest = LittleEndian::read_u128(&rest[5..21]);
                self.buffer.clear();
                self.seen_chunks = 0;
                self.state = ReassemblyState::Collecting;
                if self.expected_chunks == 0 {
                    return Err(StorageError::Framing("frame header announces zero chunks".into()));
                }
                Ok(None)
            }
            ENVELOPE_CHUNK => {
                if self.state != ReassemblyState::Collecting {
                    return Err(StorageError::Framing(
                        "chunk arrived with no preceding frame header".into(),
                    ));
                }
                if rest.len() < 16 {
                    return Err(StorageError::Framing("chunk entry too short for its digest".into()));
                }
                let (digest_bytes, chunk_bytes) = rest.split_at(16);
                let expected = LittleEndian::read_u128(digest_bytes);
                let actual = digest(self.config.hash_function, chunk_bytes);
                if expected != actual {
                    return Err(StorageError::Framing(format!(
                        "chunk digest mismatch: expected {expected:032x}, got {actual:032x}"
                    )));
                }
                self.buffer.extend_from_slice(chunk_bytes);
                self.seen_chunks += 1;
                if self.seen_chunks < self.expected_chunks {
                    return Ok(None);
                }
                let whole_digest = digest(self.config.hash_function, &self.buffer);
                if whole_digest != self.expected_digest {
                    self.state = ReassemblyState::Idle;
                    return Err(StorageError::Framing(format!(
                        "reassembled record digest mismatch: expected {:032x}, got {whole_digest:032x}",
                        self.expected_digest
                    )));
                }
                let inner_tag = self.inner_tag;
                let payload = std::mem::take(&mut self.buffer);
                self.state = ReassemblyState::Idle;
                self.finish_payload(inner_tag, &payload).map(Some)
            }
            other => Err(StorageError::Framing(format!(
                "unrecognized physical envelope tag {other:#x}"
            ))),
        }
    }

    fn finish_payload(&self, inner_tag: u8, payload: &[u8]) -> Result<LogicalRecord> {
        match inner_tag {
            ENVELOPE_DIRECT => codec::decode(payload),
            ENVELOPE_DEFLATED => {
                let decompressed = zstd::decode_all(payload)
                    .map_err(|e| StorageError::Framing(format!("zstd decompression failed: {e}")))?;
                codec::decode(&decompressed)
            }
            other => Err(StorageError::Framing(format!(
                "unrecognized inner envelope tag {other:#x}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage_core::record::Transaction;

    fn sample_transaction(n: usize) -> LogicalRecord {
        LogicalRecord::Transaction(Transaction {
            ops: vec![storage_core::op::Op::SaveFrameworkId {
                id: "f".repeat(n),
            }],
            schema_version: 1,
        })
    }

    #[test]
    fn small_record_is_a_single_direct_entry() {
        let serializer = EntrySerializer::new(SerializerConfig::default());
        let entries = serializer.serialize(&sample_transaction(4), false).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0][0], ENVELOPE_DIRECT);
    }

    #[test]
    fn oversized_record_is_split_and_reassembled() {
        let config = SerializerConfig {
            max_entry_size: 64,
            hash_function: HashFunction::Xxh3_128,
        };
        let serializer = EntrySerializer::new(config);
        let record = sample_transaction(500);
        let entries = serializer.serialize(&record, false).unwrap();
        assert!(entries.len() > 2, "expected header plus multiple chunks");
        assert_eq!(entries[0][0], ENVELOPE_HEADER);
        for chunk in &entries[1..] {
            assert_eq!(chunk[0], ENVELOPE_CHUNK);
        }

        let mut decoder = EntryDecoder::new(config);
        let mut result = None;
        for entry in &entries {
            if let Some(r) = decoder.feed(entry).unwrap() {
                result = Some(r);
            }
        }
        assert_eq!(result, Some(record));
    }

    #[test]
    fn deflated_record_round_trips() {
        let config = SerializerConfig::default();
        let serializer = EntrySerializer::new(config);
        let record = sample_transaction(10_000);
        let entries = serializer.serialize(&record, true).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0][0], ENVELOPE_DEFLATED);
        let mut decoder = EntryDecoder::new(config);
        let result = decoder.feed(&entries[0]).unwrap();
        assert_eq!(result, Some(record));
    }

    #[test]
    fn corrupted_chunk_digest_is_rejected() {
        let config = SerializerConfig {
            max_entry_size: 64,
            hash_function: HashFunction::Xxh3_128,
        };
        let serializer = EntrySerializer::new(config);
        let record = sample_transaction(500);
        let mut entries = serializer.serialize(&record, false).unwrap();
        let last = entries.last_mut().unwrap();
        let tail = last.len() - 1;
        last[tail] ^= 0xff;

        let mut decoder = EntryDecoder::new(config);
        let mut err = None;
        for entry in &entries {
            match decoder.feed(entry) {
                Ok(_) => {}
                Err(e) => {
                    err = Some(e);
                    break;
                }
            }
        }
        assert!(matches!(err, Some(StorageError::Framing(_))));
    }

    proptest::proptest! {
        #[test]
        fn serialize_then_feed_reassembles_the_same_record(n in 0usize..2000) {
            let config = SerializerConfig {
                max_entry_size: 64,
                hash_function: HashFunction::Xxh3_128,
            };
            let serializer = EntrySerializer::new(config);
            let record = sample_transaction(n);
            let entries = serializer.serialize(&record, false).unwrap();

            let mut decoder = EntryDecoder::new(config);
            let mut result = None;
            for entry in &entries {
                if let Some(r) = decoder.feed(entry).unwrap() {
                    result = Some(r);
                }
            }
            proptest::prop_assert_eq!(result, Some(record));
        }
    }
}
