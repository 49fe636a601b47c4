//! Batch Module
//!
//! This module handles the batches themselves:
//! - BatchQueue: Open batches ordered by deadline, and request placement
//! - PlacementPolicy: Which open batches a request may join
//! - BatchProcessor: Downstream commit step run for every flushed batch

mod queue;
mod policy;
mod processor;

pub use queue::BatchQueue;
pub use policy::PlacementPolicy;
pub use processor::{BatchProcessor, LoggingProcessor};
