//! # STM Testkit
//!
//! Test utilities for the STM engine.
//!
//! This crate provides:
//! - Engine fixtures, in memory or over a temporary blob log
//! - Property-based test generators using proptest
//! - A concurrent counter stress harness
//!
//! ## Usage
//!
//! ```rust
//! use stm_testkit::prelude::*;
//!
//! with_temp_stm(|stm| {
//!     let counter = stm.init_root(&0u32).unwrap();
//!     stm.transact(|txn| txn.set(counter, 1)).unwrap();
//!     assert_eq!(stm.load(counter).unwrap(), 1);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
