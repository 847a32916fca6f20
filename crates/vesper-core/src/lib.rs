//! Vesper Core
//!
//! Shared utilities for the Vesper engine crates.

pub mod logging;
pub mod profiling;
