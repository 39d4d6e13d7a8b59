//! State record and on-disk codec.
//!
//! Records are stored as a self-describing JSON envelope. Payloads larger
//! than the compression threshold are gzipped and carried as a base64
//! sub-field; smaller payloads are inlined as plain JSON. The checksum is a
//! crc32 over the canonical serialization of the payload (serde_json keeps
//! object keys sorted, so re-serializing a decoded payload reproduces the
//! original bytes).

use crate::StateError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{Read, Write};

/// Opaque keyed payload a mode persists. Key order is canonical (sorted).
pub type Payload = serde_json::Map<String, Value>;

/// One versioned, checksummed unit of durable per-mode data.
#[derive(Debug, Clone, PartialEq)]
pub struct StateRecord {
    /// Unique record identifier.
    pub id: String,
    /// Identifier of the mode that owns this record. Loading under any other
    /// mode identifier is a hard error.
    pub mode_id: String,
    /// Unix timestamp (milliseconds) of the save.
    pub saved_at: i64,
    /// Schema version the payload was written under. `None` marks legacy
    /// data from before versioning.
    pub schema_version: Option<String>,
    /// References to artifacts produced alongside this state.
    pub artifacts: Vec<String>,
    /// The mode's data.
    pub data: Payload,
    /// crc32 of the canonical payload serialization, when stamped.
    pub checksum: Option<String>,
    /// Whether the on-disk payload was gzipped.
    pub compressed: bool,
}

/// Compute the integrity checksum for a payload.
pub fn checksum(data: &Payload) -> Result<String, StateError> {
    let bytes = serde_json::to_vec(data)?;
    let mut crc = flate2::Crc::new();
    crc.update(&bytes);
    Ok(format!("crc32:{:08x}", crc.sum()))
}

/// On-disk envelope. Exactly one of `data` / `data_gz` is present.
#[derive(Serialize, Deserialize)]
struct DiskRecord {
    id: String,
    mode_id: String,
    saved_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema_version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    artifacts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    checksum: Option<String>,
    #[serde(default)]
    compressed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Payload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data_gz: Option<String>,
}

/// Encode a record for storage, compressing the payload if its canonical
/// serialization exceeds `threshold` bytes. Returns the encoded bytes and
/// whether compression was applied.
pub fn encode(record: &StateRecord, threshold: usize) -> Result<(Vec<u8>, bool), StateError> {
    let payload = serde_json::to_vec(&record.data)?;
    let compress = payload.len() > threshold;

    let disk = DiskRecord {
        id: record.id.clone(),
        mode_id: record.mode_id.clone(),
        saved_at: record.saved_at,
        schema_version: record.schema_version.clone(),
        artifacts: record.artifacts.clone(),
        checksum: record.checksum.clone(),
        compressed: compress,
        data: if compress {
            None
        } else {
            Some(record.data.clone())
        },
        data_gz: if compress {
            Some(BASE64.encode(gzip(&payload)?))
        } else {
            None
        },
    };

    Ok((serde_json::to_vec_pretty(&disk)?, compress))
}

/// Decode a stored record. Does not verify the checksum; the manager does,
/// so corruption can be distinguished from a clean parse.
pub fn decode(bytes: &[u8]) -> Result<StateRecord, StateError> {
    let disk: DiskRecord = serde_json::from_slice(bytes)?;

    let data = if disk.compressed {
        let encoded = disk
            .data_gz
            .ok_or_else(|| StateError::Codec("compressed record missing data_gz".into()))?;
        let raw = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| StateError::Codec(format!("invalid base64 payload: {}", e)))?;
        serde_json::from_slice(&gunzip(&raw)?)?
    } else {
        disk.data
            .ok_or_else(|| StateError::Codec("record missing data".into()))?
    };

    Ok(StateRecord {
        id: disk.id,
        mode_id: disk.mode_id,
        saved_at: disk.saved_at,
        schema_version: disk.schema_version,
        artifacts: disk.artifacts,
        data,
        checksum: disk.checksum,
        compressed: disk.compressed,
    })
}

fn gzip(bytes: &[u8]) -> Result<Vec<u8>, StateError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

fn gunzip(bytes: &[u8]) -> Result<Vec<u8>, StateError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_with(data: Payload) -> StateRecord {
        let cs = checksum(&data).unwrap();
        StateRecord {
            id: "test-1".into(),
            mode_id: "test".into(),
            saved_at: 1_700_000_000_000,
            schema_version: Some("1.0.0".into()),
            artifacts: vec!["out/report.md".into()],
            data,
            checksum: Some(cs),
            compressed: false,
        }
    }

    #[test]
    fn small_payload_stays_plain() {
        let mut data = Payload::new();
        data.insert("key".into(), json!("value"));
        let record = record_with(data);

        let (bytes, compressed) = encode(&record, 10 * 1024).unwrap();
        assert!(!compressed);
        // Payload is readable in the envelope.
        assert!(String::from_utf8_lossy(&bytes).contains("\"value\""));

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.data, record.data);
        assert!(!decoded.compressed);
    }

    #[test]
    fn large_payload_round_trips_compressed() {
        let mut data = Payload::new();
        data.insert("blob".into(), json!("x".repeat(50 * 1024)));
        data.insert(
            "nested".into(),
            json!({"inner": {"list": [1, 2, 3], "flag": true}}),
        );
        let record = record_with(data);

        let (bytes, compressed) = encode(&record, 10 * 1024).unwrap();
        assert!(compressed);
        // Compressed envelope is much smaller than the raw payload.
        assert!(bytes.len() < 10 * 1024);

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.data, record.data);
        assert!(decoded.compressed);
    }

    #[test]
    fn checksum_is_deterministic_across_round_trip() {
        let mut data = Payload::new();
        data.insert("b".into(), json!(2));
        data.insert("a".into(), json!({"z": 1, "y": [null, "s"]}));
        let cs = checksum(&data).unwrap();

        let record = record_with(data);
        let (bytes, _) = encode(&record, 0).unwrap();
        let decoded = decode(&bytes).unwrap();

        assert_eq!(checksum(&decoded.data).unwrap(), cs);
    }

    #[test]
    fn truncated_envelope_is_a_codec_error() {
        let mut data = Payload::new();
        data.insert("key".into(), json!("value"));
        let (bytes, _) = encode(&record_with(data), 10 * 1024).unwrap();

        assert!(decode(&bytes[..bytes.len() / 2]).is_err());
    }
}
