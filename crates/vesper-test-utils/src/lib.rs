//! Test utilities for Vesper.
//!
//! Provides GPU-free [`vesper_render::GpuSubmitter`] implementations that
//! record or discard submissions, so the batching pipeline can be exercised
//! and asserted on without a device.

pub mod recording;

pub use recording::*;
