//! Open Batch Queue Module
//!
//! Holds the batches that have not been flushed yet, ordered by deadline
//! (earliest first), and decides which batch each incoming request joins.
//! Each batch is assigned a unique sequential ID when it is opened.

use super::PlacementPolicy;
use crate::{Batch, Placement, StampRequest};
use std::collections::VecDeque;

/// Ordered collection of open batches
///
/// # Invariants
/// - Deadlines are non-decreasing from front to back
/// - Every request sits in a batch its placement policy accepts
/// - No batch holds more than `capacity` requests
/// - A batch's deadline never changes after it is opened
pub struct BatchQueue {
    /// Open batches, earliest deadline at the front
    batches: VecDeque<Batch>,
    /// Maximum requests per batch; a full batch is sealed
    capacity: usize,
    /// Which open batches a request may join
    policy: PlacementPolicy,
    /// Next batch ID to assign (starts at 1, increments for each batch)
    next_batch_id: u64,
}

impl BatchQueue {
    /// Creates an empty queue
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of requests per batch (treated as at least 1)
    /// * `policy` - Which open batches a request may join
    pub fn new(capacity: usize, policy: PlacementPolicy) -> Self {
        Self {
            batches: VecDeque::new(),
            capacity: capacity.max(1),
            policy,
            next_batch_id: 1,
        }
    }

    /// Place a request whose own deadline is `deadline`
    ///
    /// The request joins the compatible batch closest to `deadline` that
    /// still has room, where compatibility is decided by the placement
    /// policy. The joined batch keeps its deadline. If no such batch exists,
    /// a new batch is opened with `deadline` and positioned after any
    /// batches sharing that deadline, which is where a stable re-sort would
    /// put it.
    ///
    /// # Returns
    /// Which batch the request ended up in and that batch's deadline
    pub fn insert(&mut self, request: StampRequest, deadline: u64) -> Placement {
        let policy = self.policy;
        let capacity = self.capacity;
        let has_room = |batch: &&mut Batch| batch.len() < capacity;

        let target = match policy {
            PlacementPolicy::NotBeforeDeadline => {
                // Compatible batches form a suffix; the earliest of them is closest
                let start = self
                    .batches
                    .partition_point(|batch| !policy.accepts(batch.deadline, deadline));
                self.batches.range_mut(start..).find(has_room)
            }
            PlacementPolicy::WithinTolerance => {
                // Compatible batches form a prefix; the latest of them is closest
                let end = self
                    .batches
                    .partition_point(|batch| policy.accepts(batch.deadline, deadline));
                self.batches.range_mut(..end).rev().find(has_room)
            }
        };

        if let Some(batch) = target {
            batch.requests.push(request);
            return Placement::Joined {
                batch_id: batch.id,
                deadline: batch.deadline,
            };
        }

        let batch_id = self.next_batch_id;
        self.next_batch_id += 1;

        let position = self.batches.partition_point(|batch| batch.deadline <= deadline);
        self.batches.insert(
            position,
            Batch {
                id: batch_id,
                requests: vec![request],
                deadline,
            },
        );

        Placement::Opened { batch_id, deadline }
    }

    /// Remove the front batch if its deadline is at or before `now`
    pub fn pop_due(&mut self, now: u64) -> Option<Batch> {
        match self.batches.front() {
            Some(batch) if batch.deadline <= now => self.batches.pop_front(),
            _ => None,
        }
    }

    /// Deadline of the next batch to become due
    pub fn next_deadline(&self) -> Option<u64> {
        self.batches.front().map(|batch| batch.deadline)
    }

    pub fn batches(&self) -> impl Iterator<Item = &Batch> {
        self.batches.iter()
    }

    /// Number of open batches
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Total requests waiting across all open batches
    pub fn request_count(&self) -> usize {
        self.batches.iter().map(Batch::len).sum()
    }

    /// Insert a prepared batch at its deadline position
    #[cfg(test)]
    pub(crate) fn push_batch(&mut self, batch: Batch) {
        let position = self
            .batches
            .partition_point(|open| open.deadline <= batch.deadline);
        self.batches.insert(position, batch);
    }
}
