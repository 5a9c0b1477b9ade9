//! Index configuration and accessors.
//!
//! - [`IndexConfig`]: the string map identifying an index's provider and options
//! - [`GraphIndex`] / [`IndexHandle`]: what a provider hands back for a named index
//! - [`HashGraphIndex`]: the accessor of the built-in hash provider

mod config;
mod handle;
mod hash;

pub use config::IndexConfig;
pub use handle::{GraphIndex, IndexHandle};
pub use hash::{HashGraphIndex, MatchMode};
