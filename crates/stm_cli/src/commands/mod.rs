//! CLI command implementations.

pub mod array;
pub mod blobs;
pub mod demo;
pub mod sequence;
pub mod stress;

/// Lowercase hex of at most `max` leading bytes, with `..` if truncated.
pub(crate) fn hex_preview(bytes: &[u8], max: usize) -> String {
    let mut out: String = bytes
        .iter()
        .take(max)
        .map(|b| format!("{:02x}", b))
        .collect();
    if bytes.len() > max {
        out.push_str("..");
    }
    out
}
