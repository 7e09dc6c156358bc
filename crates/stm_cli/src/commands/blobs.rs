//! Blobs command implementation.

use super::hex_preview;
use serde::Serialize;
use std::path::Path;
use stm_codec::{CanonicalCbor, Codec};
use stm_core::{BlobId, BlobStore, LogBlobStore};
use stm_storage::FileBackend;

/// One listed blob.
#[derive(Debug, Serialize)]
pub struct BlobEntry {
    /// Blob id.
    pub id: u64,
    /// Payload size in bytes.
    pub size: usize,
    /// Decoded value, if the payload is canonical CBOR.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Hex of the leading bytes when the payload does not decode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

/// Blob log listing.
#[derive(Debug, Serialize)]
pub struct BlobsResult {
    /// Log path.
    pub path: String,
    /// Blobs in the log.
    pub count: u64,
    /// Listed blobs.
    pub blobs: Vec<BlobEntry>,
}

/// Runs the blobs command.
pub fn run(path: &Path, limit: Option<usize>, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = list(path, limit)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            println!("Blob log: {}", result.path);
            println!("Blobs:    {}", result.count);
            println!();
            for blob in &result.blobs {
                match (&blob.value, &blob.raw) {
                    (Some(value), _) => println!("  blob:{:<6} {:>6} B  {}", blob.id, blob.size, value),
                    (None, Some(raw)) => println!("  blob:{:<6} {:>6} B  0x{}", blob.id, blob.size, raw),
                    (None, None) => println!("  blob:{:<6} {:>6} B", blob.id, blob.size),
                }
            }
        }
    }

    Ok(())
}

/// Reads up to `limit` blobs from the log at `path`.
pub fn list(path: &Path, limit: Option<usize>) -> Result<BlobsResult, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No blob log found at {:?}", path).into());
    }
    let store = LogBlobStore::open(FileBackend::open(path)?)?;
    let count = store.len();
    let shown = limit.map_or(count, |limit| count.min(limit as u64));

    let mut blobs = Vec::new();
    for id in 0..shown {
        let payload = store.read(BlobId(id))?.unwrap_or_default();
        let (value, raw) = match CanonicalCbor.decode(&payload) {
            Ok(value) => (Some(value.to_string()), None),
            Err(_) => (None, Some(hex_preview(&payload, 32))),
        };
        blobs.push(BlobEntry {
            id,
            size: payload.len(),
            value,
            raw,
        });
    }

    Ok(BlobsResult {
        path: path.display().to_string(),
        count,
        blobs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use stm_core::{Config, Stm};

    #[test]
    fn lists_engine_blobs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blobs.log");
        {
            let store = LogBlobStore::open(FileBackend::open(&path).unwrap()).unwrap();
            let stm = Stm::open(Config::default(), Arc::new(store), Arc::new(CanonicalCbor));
            stm.init_root(&"hello".to_string()).unwrap();
            stm.write_raw(stm_core::PointerId::ROOT, &[0xff]).unwrap();
        }

        let result = list(&path, None).unwrap();
        assert_eq!(result.count, 2);
        assert_eq!(result.blobs[0].value.as_deref(), Some("\"hello\""));
        assert_eq!(result.blobs[1].raw.as_deref(), Some("ff"));

        let limited = list(&path, Some(1)).unwrap();
        assert_eq!(limited.blobs.len(), 1);
    }

    #[test]
    fn missing_log_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list(&dir.path().join("absent.log"), None).is_err());
    }
}
