//! This crate batches timestamped stamp requests by their tolerance windows.
//! Requests are grouped into deadline-ordered batches that are flushed to a
//! downstream commit step once their deadline passes, amortizing the cost of
//! each commit across many requests.

pub mod types; // Stamp requests, batches and placement outcomes.
pub mod clock; // Time source used for deadlines and flush ticks.
pub mod batch; // Open-batch queue, placement policies and the downstream processor seam.
pub mod aggregator; // The batching scheduler and its periodic flush loop.
pub mod validation; // Input checks applied before requests reach the aggregator.
pub mod api; // HTTP endpoint that receives stamp requests.
pub mod config; // Defines and loads service configuration.

// Re-export commonly used types and configurations for easier access.
pub use types::*;
pub use config::Config;
pub use aggregator::RequestAggregator;
