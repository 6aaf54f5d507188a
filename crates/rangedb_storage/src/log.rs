//! Log record format for the file engine.
//!
//! The file engine persists writes as an append-only log of records. Each
//! record carries an envelope - magic (4) + version (2) + type (1) +
//! payload length (4) - followed by the payload and a CRC32 trailer
//! computed over everything before it.
//!
//! A batch is one record whose payload holds every operation, so a torn
//! write can never replay half a batch: the CRC fails and the record is
//! treated as a truncated tail.

use crate::engine::BatchOp;
use crate::error::{StorageError, StorageResult};

/// Magic bytes identifying a log record.
pub(crate) const LOG_MAGIC: [u8; 4] = *b"RGLG";

/// Current log format version.
pub(crate) const LOG_VERSION: u16 = 1;

/// Envelope size: magic (4) + version (2) + type (1) + length (4).
const HEADER_SIZE: usize = 11;

/// CRC trailer size.
const CRC_SIZE: usize = 4;

/// Type of log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum LogRecordType {
    Put = 1,
    Delete = 2,
    Batch = 3,
}

impl LogRecordType {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Put),
            2 => Some(Self::Delete),
            3 => Some(Self::Batch),
            _ => None,
        }
    }
}

/// A log record representing one durable write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LogRecord {
    /// Insert or overwrite one key.
    Put {
        /// Key bytes.
        key: Vec<u8>,
        /// Value bytes.
        value: Vec<u8>,
    },
    /// Remove one key.
    Delete {
        /// Key bytes.
        key: Vec<u8>,
    },
    /// Apply a list of operations as one unit.
    Batch {
        /// Recorded operations, in order.
        ops: Vec<BatchOp>,
    },
}

impl LogRecord {
    fn record_type(&self) -> LogRecordType {
        match self {
            Self::Put { .. } => LogRecordType::Put,
            Self::Delete { .. } => LogRecordType::Delete,
            Self::Batch { .. } => LogRecordType::Batch,
        }
    }

    /// Serializes the record with envelope and CRC trailer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if any key or value length exceeds the
    /// format's 4-byte length fields.
    pub(crate) fn encode(&self) -> StorageResult<Vec<u8>> {
        let payload = self.encode_payload()?;
        let len = u32::try_from(payload.len())
            .map_err(|_| StorageError::invalid_argument("log record payload too large"))?;

        let mut data = Vec::with_capacity(HEADER_SIZE + payload.len() + CRC_SIZE);
        data.extend_from_slice(&LOG_MAGIC);
        data.extend_from_slice(&LOG_VERSION.to_le_bytes());
        data.push(self.record_type() as u8);
        data.extend_from_slice(&len.to_le_bytes());
        data.extend_from_slice(&payload);

        let crc = crc32fast::hash(&data);
        data.extend_from_slice(&crc.to_le_bytes());
        Ok(data)
    }

    fn encode_payload(&self) -> StorageResult<Vec<u8>> {
        let mut buf = Vec::new();
        match self {
            Self::Put { key, value } => {
                put_bytes(&mut buf, key)?;
                put_bytes(&mut buf, value)?;
            }
            Self::Delete { key } => {
                put_bytes(&mut buf, key)?;
            }
            Self::Batch { ops } => {
                let count = u32::try_from(ops.len())
                    .map_err(|_| StorageError::invalid_argument("batch records too many ops"))?;
                buf.extend_from_slice(&count.to_le_bytes());
                for op in ops {
                    match op {
                        BatchOp::Put { key, value } => {
                            buf.push(LogRecordType::Put as u8);
                            put_bytes(&mut buf, key)?;
                            put_bytes(&mut buf, value)?;
                        }
                        BatchOp::Delete { key } => {
                            buf.push(LogRecordType::Delete as u8);
                            put_bytes(&mut buf, key)?;
                        }
                    }
                }
            }
        }
        Ok(buf)
    }

    fn decode_payload(record_type: LogRecordType, payload: &[u8]) -> StorageResult<Self> {
        let mut pos = 0;
        let record = match record_type {
            LogRecordType::Put => {
                let key = take_bytes(payload, &mut pos)?;
                let value = take_bytes(payload, &mut pos)?;
                Self::Put { key, value }
            }
            LogRecordType::Delete => {
                let key = take_bytes(payload, &mut pos)?;
                Self::Delete { key }
            }
            LogRecordType::Batch => {
                let count = take_u32(payload, &mut pos)?;
                let mut ops = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let tag = *payload
                        .get(pos)
                        .ok_or_else(|| StorageError::corrupted("batch op tag missing"))?;
                    pos += 1;
                    match LogRecordType::from_byte(tag) {
                        Some(LogRecordType::Put) => {
                            let key = take_bytes(payload, &mut pos)?;
                            let value = take_bytes(payload, &mut pos)?;
                            ops.push(BatchOp::Put { key, value });
                        }
                        Some(LogRecordType::Delete) => {
                            let key = take_bytes(payload, &mut pos)?;
                            ops.push(BatchOp::Delete { key });
                        }
                        _ => {
                            return Err(StorageError::corrupted(format!(
                                "unknown batch op tag {tag}"
                            )))
                        }
                    }
                }
                Self::Batch { ops }
            }
        };
        if pos != payload.len() {
            return Err(StorageError::corrupted("trailing bytes in record payload"));
        }
        Ok(record)
    }
}

fn put_bytes(buf: &mut Vec<u8>, bytes: &[u8]) -> StorageResult<()> {
    let len = u32::try_from(bytes.len())
        .map_err(|_| StorageError::invalid_argument("key or value too large for log format"))?;
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(bytes);
    Ok(())
}

fn take_u32(payload: &[u8], pos: &mut usize) -> StorageResult<u32> {
    let end = *pos + 4;
    let bytes = payload
        .get(*pos..end)
        .ok_or_else(|| StorageError::corrupted("length field missing"))?;
    *pos = end;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn take_bytes(payload: &[u8], pos: &mut usize) -> StorageResult<Vec<u8>> {
    let len = take_u32(payload, pos)? as usize;
    let end = *pos + len;
    let bytes = payload
        .get(*pos..end)
        .ok_or_else(|| StorageError::corrupted("field shorter than its length prefix"))?;
    *pos = end;
    Ok(bytes.to_vec())
}

/// An iterator decoding records from a loaded log image.
///
/// An incomplete record at the end of the image (partial header or payload)
/// is treated as a torn tail: iteration stops cleanly and
/// [`LogReplay::valid_len`] reports how many bytes decoded successfully.
/// Corruption - bad magic, unknown type, CRC mismatch - is reported as an
/// error, and `valid_len` still marks the last good record boundary so the
/// caller can truncate.
pub(crate) struct LogReplay<'a> {
    data: &'a [u8],
    pos: usize,
    finished: bool,
}

impl<'a> LogReplay<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            finished: false,
        }
    }

    /// Byte length of the longest decodable prefix seen so far.
    pub(crate) fn valid_len(&self) -> u64 {
        self.pos as u64
    }

    fn read_next(&mut self) -> StorageResult<Option<LogRecord>> {
        if self.finished || self.pos == self.data.len() {
            self.finished = true;
            return Ok(None);
        }

        let start = self.pos;
        let Some(header) = self.data.get(start..start + HEADER_SIZE) else {
            // Torn tail
            self.finished = true;
            return Ok(None);
        };

        if header[0..4] != LOG_MAGIC {
            self.finished = true;
            return Err(StorageError::corrupted(format!(
                "invalid magic at offset {start}"
            )));
        }

        let version = u16::from_le_bytes([header[4], header[5]]);
        if version > LOG_VERSION {
            self.finished = true;
            return Err(StorageError::corrupted(format!(
                "unsupported log version {version} at offset {start}"
            )));
        }

        let type_byte = header[6];
        let Some(record_type) = LogRecordType::from_byte(type_byte) else {
            self.finished = true;
            return Err(StorageError::corrupted(format!(
                "unknown record type {type_byte} at offset {start}"
            )));
        };

        let payload_len = u32::from_le_bytes([header[7], header[8], header[9], header[10]]) as usize;
        let total_len = HEADER_SIZE + payload_len + CRC_SIZE;
        let Some(record_bytes) = self.data.get(start..start + total_len) else {
            // Torn tail
            self.finished = true;
            return Ok(None);
        };

        let crc_start = HEADER_SIZE + payload_len;
        let stored_crc = u32::from_le_bytes([
            record_bytes[crc_start],
            record_bytes[crc_start + 1],
            record_bytes[crc_start + 2],
            record_bytes[crc_start + 3],
        ]);
        let computed_crc = crc32fast::hash(&record_bytes[..crc_start]);
        if stored_crc != computed_crc {
            self.finished = true;
            return Err(StorageError::corrupted(format!(
                "checksum mismatch at offset {start}"
            )));
        }

        let record =
            LogRecord::decode_payload(record_type, &record_bytes[HEADER_SIZE..crc_start])?;
        self.pos = start + total_len;
        Ok(Some(record))
    }
}

impl Iterator for LogReplay<'_> {
    type Item = StorageResult<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_next() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_all(records: &[LogRecord]) -> Vec<u8> {
        let mut data = Vec::new();
        for record in records {
            data.extend_from_slice(&record.encode().unwrap());
        }
        data
    }

    #[test]
    fn put_record_round_trip() {
        let record = LogRecord::Put {
            key: b"some".to_vec(),
            value: b"value".to_vec(),
        };
        let data = record.encode().unwrap();
        let decoded: Vec<_> = LogReplay::new(&data).map(|r| r.unwrap()).collect();
        assert_eq!(decoded, vec![record]);
    }

    #[test]
    fn delete_record_round_trip() {
        let record = LogRecord::Delete {
            key: b"some".to_vec(),
        };
        let data = record.encode().unwrap();
        let decoded: Vec<_> = LogReplay::new(&data).map(|r| r.unwrap()).collect();
        assert_eq!(decoded, vec![record]);
    }

    #[test]
    fn batch_record_round_trip() {
        let record = LogRecord::Batch {
            ops: vec![
                BatchOp::Delete {
                    key: b"some".to_vec(),
                },
                BatchOp::Put {
                    key: b"another".to_vec(),
                    value: b"value".to_vec(),
                },
            ],
        };
        let data = record.encode().unwrap();
        let decoded: Vec<_> = LogReplay::new(&data).map(|r| r.unwrap()).collect();
        assert_eq!(decoded, vec![record]);
    }

    #[test]
    fn empty_key_and_value_round_trip() {
        let record = LogRecord::Put {
            key: Vec::new(),
            value: Vec::new(),
        };
        let data = record.encode().unwrap();
        let decoded: Vec<_> = LogReplay::new(&data).map(|r| r.unwrap()).collect();
        assert_eq!(decoded, vec![record]);
    }

    #[test]
    fn multiple_records_in_sequence() {
        let records = vec![
            LogRecord::Put {
                key: b"a".to_vec(),
                value: b"1".to_vec(),
            },
            LogRecord::Delete { key: b"a".to_vec() },
            LogRecord::Put {
                key: b"b".to_vec(),
                value: b"2".to_vec(),
            },
        ];
        let data = encode_all(&records);
        let decoded: Vec<_> = LogReplay::new(&data).map(|r| r.unwrap()).collect();
        assert_eq!(decoded, records);
    }

    #[test]
    fn torn_tail_stops_cleanly() {
        let good = LogRecord::Put {
            key: b"a".to_vec(),
            value: b"1".to_vec(),
        };
        let mut data = good.encode().unwrap();
        let good_len = data.len() as u64;

        let torn = LogRecord::Put {
            key: b"b".to_vec(),
            value: b"2".to_vec(),
        }
        .encode()
        .unwrap();
        data.extend_from_slice(&torn[..torn.len() - 3]);

        let mut replay = LogReplay::new(&data);
        assert_eq!(replay.next().unwrap().unwrap(), good);
        assert!(replay.next().is_none());
        assert_eq!(replay.valid_len(), good_len);
    }

    #[test]
    fn checksum_mismatch_is_an_error() {
        let record = LogRecord::Put {
            key: b"a".to_vec(),
            value: b"1".to_vec(),
        };
        let mut data = record.encode().unwrap();
        let payload_byte = HEADER_SIZE + 1;
        data[payload_byte] ^= 0xFF;

        let mut replay = LogReplay::new(&data);
        let result = replay.next().unwrap();
        assert!(matches!(result, Err(StorageError::Corrupted { .. })));
        assert_eq!(replay.valid_len(), 0);
        assert!(replay.next().is_none());
    }

    #[test]
    fn bad_magic_is_an_error() {
        let record = LogRecord::Delete { key: b"k".to_vec() };
        let good = record.encode().unwrap();
        let good_len = good.len() as u64;

        let mut data = good;
        data.extend_from_slice(b"garbage-not-a-record");

        let mut replay = LogReplay::new(&data);
        assert!(replay.next().unwrap().is_ok());
        assert!(matches!(
            replay.next().unwrap(),
            Err(StorageError::Corrupted { .. })
        ));
        assert_eq!(replay.valid_len(), good_len);
    }

    #[test]
    fn empty_log_yields_nothing() {
        let mut replay = LogReplay::new(&[]);
        assert!(replay.next().is_none());
        assert_eq!(replay.valid_len(), 0);
    }
}
