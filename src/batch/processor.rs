//! Batch Processor Module
//!
//! The downstream commit step invoked once for every flushed batch
//! (e.g. anchoring the batch to a ledger). The aggregator treats it as a
//! black box: it only cares whether the call succeeded.

use crate::Batch;
use async_trait::async_trait;
use tracing::info;

/// Downstream processing for flushed batches
#[async_trait]
pub trait BatchProcessor: Send + Sync {
    /// Commit a flushed batch
    ///
    /// # Returns
    /// `Ok(())` if the batch was committed, or an error describing the
    /// failure. Errors are logged by the caller and never retried.
    async fn process(&self, batch: &Batch) -> anyhow::Result<()>;
}

/// Processor that only logs what it would commit
///
/// Used by the binary until a real commit backend is plugged in.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingProcessor;

#[async_trait]
impl BatchProcessor for LoggingProcessor {
    async fn process(&self, batch: &Batch) -> anyhow::Result<()> {
        let cids: Vec<&str> = batch
            .requests
            .iter()
            .map(|request| request.object_cid.as_str())
            .collect();
        info!(
            batch_id = batch.id,
            requests = batch.len(),
            deadline = batch.deadline,
            "Processing batch with requests: {:?}",
            cids
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StampRequest;

    #[tokio::test]
    async fn test_logging_processor_accepts_batch() {
        let batch = Batch {
            id: 7,
            requests: vec![StampRequest {
                object_cid: "cid".to_string(),
                time_tolerance: 1.0,
                timestamp: 0,
                signature: "mock_signature".to_string(),
            }],
            deadline: 1_000,
        };

        assert!(LoggingProcessor.process(&batch).await.is_ok());
    }
}
