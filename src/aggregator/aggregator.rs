//! Request Aggregator Module
//!
//! Owns the open batches and the processed-batch log, places incoming stamp
//! requests into batches, and runs a background loop that flushes every
//! batch whose deadline has passed.
//!
//! # Flush Flow
//! 1. Every `flush_interval_ms`, read the current time
//! 2. Pop due batches from the front of the queue (earliest deadline first)
//! 3. Drop empty batches silently, append the rest to the processed log
//! 4. Hand each flushed batch to the `BatchProcessor` on its own task, logging
//!    errors and panics alike

use crate::{
    batch::{BatchProcessor, BatchQueue},
    clock::Clock,
    config::AggregatorConfig,
    Batch, Placement, StampRequest,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// State guarded by a single lock: insertion, the flush pop sequence and
/// appends to the processed log all go through it.
struct AggregatorState {
    open: BatchQueue,
    processed: Vec<Arc<Batch>>,
}

struct Inner {
    state: Mutex<AggregatorState>,
    processor: Arc<dyn BatchProcessor>,
    clock: Arc<dyn Clock>,
}

/// Batching scheduler for stamp requests
///
/// Flushing starts as soon as the aggregator is constructed and runs until
/// [`RequestAggregator::stop_processing`] is called or the aggregator is
/// dropped.
pub struct RequestAggregator {
    inner: Arc<Inner>,
    shutdown: CancellationToken,
}

impl RequestAggregator {
    /// Creates the aggregator and spawns its flush loop
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Arguments
    /// * `config` - Batch size limit and flush cadence
    /// * `processor` - Downstream commit step invoked per flushed batch
    /// * `clock` - Time source for deadlines and flush ticks
    pub fn new(
        config: AggregatorConfig,
        processor: Arc<dyn BatchProcessor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let inner = Arc::new(Inner {
            state: Mutex::new(AggregatorState {
                open: BatchQueue::new(config.batch_size_limit, config.placement),
                processed: Vec::new(),
            }),
            processor,
            clock,
        });
        let shutdown = CancellationToken::new();

        info!(
            "Request aggregator starting: batch_size_limit={}, flush_interval_ms={}, placement={}",
            config.batch_size_limit,
            config.flush_interval_ms,
            config.placement.name()
        );
        tokio::spawn(run_flush_loop(
            inner.clone(),
            config.flush_interval(),
            shutdown.clone(),
        ));

        Self { inner, shutdown }
    }

    /// Place a stamp request into an open batch
    ///
    /// The request's own deadline is now + `time_tolerance`. It joins the
    /// open batch the placement policy accepts that is closest to that
    /// deadline and not yet full; otherwise it opens a new batch with its
    /// own deadline.
    ///
    /// # Returns
    /// The batch the request was placed in and that batch's deadline
    pub async fn add_request(&self, request: StampRequest) -> Placement {
        let deadline = self
            .inner
            .clock
            .now_millis()
            .saturating_add(request.tolerance_millis());

        let mut state = self.inner.state.lock().await;
        let placement = state.open.insert(request, deadline);
        debug!(
            "Request placed in batch #{} (deadline {}), {} requests across {} open batches",
            placement.batch_id(),
            placement.deadline(),
            state.open.request_count(),
            state.open.len()
        );
        placement
    }

    /// Run one flush tick now
    ///
    /// # Returns
    /// The number of batches handed to the processor
    pub async fn flush_due(&self) -> usize {
        self.inner.flush_due().await
    }

    /// Stop the periodic flush
    ///
    /// Idempotent. Open batches are kept but no longer flushed; a processing
    /// call already in flight is allowed to finish.
    pub fn stop_processing(&self) {
        if !self.shutdown.is_cancelled() {
            info!("Stopping batch processing");
            self.shutdown.cancel();
        }
    }

    /// Whether the periodic flush is still active
    pub fn is_processing(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    /// Batches flushed so far, in flush order
    pub async fn processed_batches(&self) -> Vec<Arc<Batch>> {
        self.inner.state.lock().await.processed.clone()
    }

    /// Snapshot of the open batches, earliest deadline first
    pub async fn open_batches(&self) -> Vec<Batch> {
        self.inner.state.lock().await.open.batches().cloned().collect()
    }

    /// Current time as seen by the aggregator's clock
    pub fn now_millis(&self) -> u64 {
        self.inner.clock.now_millis()
    }

    /// Slip an already built batch into the open set, bypassing placement
    #[cfg(test)]
    pub(crate) async fn push_open_batch(&self, batch: Batch) {
        self.inner.state.lock().await.open.push_batch(batch);
    }
}

impl Drop for RequestAggregator {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl Inner {
    async fn flush_due(&self) -> usize {
        let now = self.clock.now_millis();

        // Pop and record under the lock, process with it released so a slow
        // commit never blocks insertion
        let due = {
            let mut state = self.state.lock().await;
            let mut due = Vec::new();
            while let Some(batch) = state.open.pop_due(now) {
                if batch.is_empty() {
                    continue;
                }
                let batch = Arc::new(batch);
                state.processed.push(batch.clone());
                due.push(batch);
            }
            if let Some(next) = state.open.next_deadline() {
                debug!("Next open batch due at {}", next);
            }
            due
        };

        for batch in &due {
            // Each call runs on its own task so a panicking processor is
            // reported like an error instead of unwinding through the loop
            let processor = self.processor.clone();
            let job = batch.clone();
            let outcome = tokio::spawn(async move { processor.process(&job).await }).await;

            match outcome {
                Ok(Ok(())) => {
                    info!(
                        "Batch #{} flushed with {} requests",
                        batch.id,
                        batch.len()
                    );
                }
                Ok(Err(e)) => {
                    error!("Failed to process batch #{}: {:?}", batch.id, e);
                }
                Err(e) => {
                    error!("Processing task for batch #{} aborted: {}", batch.id, e);
                }
            }
        }

        due.len()
    }
}

async fn run_flush_loop(inner: Arc<Inner>, period: Duration, shutdown: CancellationToken) {
    let mut ticker = interval(period.max(Duration::from_millis(1)));
    // A slow tick pushes the next one back instead of bursting
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            // Cancellation wins over a tick that is ready at the same time
            biased;
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let flushed = inner.flush_due().await;
        if flushed > 0 {
            debug!("Flush tick processed {} batches", flushed);
        }
    }

    info!("Batch flush loop stopped");
}
