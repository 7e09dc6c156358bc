//! Sequence command implementation.

use super::hex_preview;
use serde::Serialize;
use std::path::Path;
use stm_storage::SequenceFile;

/// One listed record.
#[derive(Debug, Serialize)]
pub struct RecordEntry {
    /// Record index.
    pub index: u64,
    /// Record length in bytes.
    pub len: usize,
    /// Hex of the leading bytes.
    pub preview: String,
}

/// Sequence file listing.
#[derive(Debug, Serialize)]
pub struct SequenceResult {
    /// File path.
    pub path: String,
    /// Records in the file.
    pub count: u64,
    /// Listed records.
    pub records: Vec<RecordEntry>,
}

/// Runs the sequence command.
pub fn run(path: &Path, limit: Option<usize>, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = list(path, limit)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            println!("Sequence file: {}", result.path);
            println!("Records:       {}", result.count);
            println!();
            for record in &result.records {
                println!("  #{:<6} {:>6} B  {}", record.index, record.len, record.preview);
            }
        }
    }

    Ok(())
}

/// Reads up to `limit` records from the sequence file at `path`.
pub fn list(path: &Path, limit: Option<usize>) -> Result<SequenceResult, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No sequence file found at {:?}", path).into());
    }
    let mut file = SequenceFile::open(path)?;
    let count = file.len();
    let shown: Vec<u64> = file.indices().take(limit.unwrap_or(usize::MAX)).collect();

    let records = file
        .get_many(&shown)?
        .into_iter()
        .zip(&shown)
        .filter_map(|(record, &index)| {
            record.map(|bytes| RecordEntry {
                index,
                len: bytes.len(),
                preview: hex_preview(&bytes, 16),
            })
        })
        .collect();

    Ok(SequenceResult {
        path: path.display().to_string(),
        count,
        records,
    })
}
