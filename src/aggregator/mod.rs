//! Request Aggregation Module
//!
//! Groups stamp requests into deadline-ordered batches and periodically
//! flushes the batches that are due:
//! - A request joins the earliest open batch that is due no sooner than the
//!   request's own deadline and still has room
//! - Otherwise it opens a new batch with its own deadline
//! - Due batches are moved to the processed log and handed to a `BatchProcessor`

mod aggregator;


pub use aggregator::RequestAggregator;
