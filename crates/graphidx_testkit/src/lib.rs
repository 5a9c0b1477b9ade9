//! # graphidx Testkit
//!
//! Test utilities for graphidx.
//!
//! This crate provides:
//! - Test fixtures and manager helpers
//! - Instrumented providers that count, delay, fail or panic
//! - Property-based test generators using proptest
//! - Cross-crate integration test helpers
//! - Crash recovery and fuzz harnesses for the configuration log
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust,ignore
//! use graphidx_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_manager() {
//!     with_temp_manager(|manager| {
//!         let people = manager.for_nodes("people", None).unwrap();
//!         // ... test operations
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crash;
pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod integration;
pub mod providers;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::providers::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use integration::*;
pub use providers::*;
pub use stress::*;
