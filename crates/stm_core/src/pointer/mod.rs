//! Pointers: stable ids whose target blob changes as transactions commit.

mod ptr;
mod table;

pub use ptr::Ptr;
pub use table::PointerTable;
