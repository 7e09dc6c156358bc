//! Array command implementation.

use serde::Serialize;
use std::path::Path;
use stm_storage::{Element, MappedArrayFile};

/// Array file listing.
#[derive(Debug, Serialize)]
pub struct ArrayResult {
    /// File path.
    pub path: String,
    /// Element width in bits.
    pub width: usize,
    /// Elements, widened to 64 bits.
    pub elements: Vec<i64>,
}

/// Runs the array command.
pub fn run<E: Element + Into<i64>>(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = list::<E>(path)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            println!("Array file: {} ({}-bit)", result.path, result.width);
            println!("Elements:   {}", result.elements.len());
            println!();
            for (index, value) in result.elements.iter().enumerate() {
                println!("  [{}] {}", index, value);
            }
        }
    }

    Ok(())
}

/// Reads every element of the array file at `path`.
pub fn list<E: Element + Into<i64>>(path: &Path) -> Result<ArrayResult, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No array file found at {:?}", path).into());
    }
    let array = MappedArrayFile::<E>::open(path)?;
    Ok(ArrayResult {
        path: path.display().to_string(),
        width: E::WIDTH * 8,
        elements: array.to_vec()?.into_iter().map(Into::into).collect(),
    })
}
