//! Placement Policies Module
//!
//! Decides which open batches a request may join, given its own deadline.
//!
//! # Supported Policies
//! - **NotBeforeDeadline**: join a batch due at or after the request's deadline.
//!   A request is never committed early but may wait past its tolerance.
//! - **WithinTolerance**: join a batch due at or before the request's deadline.
//!   A request never waits past its tolerance but may be committed early.
//!
//! In both cases the compatible batch closest to the request's own deadline
//! wins, and batch deadlines never change once a batch is opened.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementPolicy {
    #[default]
    NotBeforeDeadline,
    WithinTolerance,
}

impl PlacementPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            PlacementPolicy::NotBeforeDeadline => "not_before_deadline",
            PlacementPolicy::WithinTolerance => "within_tolerance",
        }
    }

    /// Whether a batch due at `batch_deadline` may take a request due at `deadline`
    pub fn accepts(&self, batch_deadline: u64, deadline: u64) -> bool {
        match self {
            PlacementPolicy::NotBeforeDeadline => batch_deadline >= deadline,
            PlacementPolicy::WithinTolerance => batch_deadline <= deadline,
        }
    }
}
