use serde::{Deserialize, Serialize};

/// A request to have an object stamped within a tolerance window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StampRequest {
    pub object_cid: String,
    /// Maximum acceptable delay before commit, in seconds
    pub time_tolerance: f64,
    /// Creation time, milliseconds since the Unix epoch
    pub timestamp: u64,
    pub signature: String,
}

impl StampRequest {
    /// Tolerance converted to milliseconds
    ///
    /// Float-to-int casts saturate, so NaN and negative tolerances map to 0
    /// and oversized ones to `u64::MAX`. Rejecting such values is the job of
    /// the input boundary.
    pub fn tolerance_millis(&self) -> u64 {
        (self.time_tolerance * 1000.0) as u64
    }
}

/// A group of stamp requests committed together at one deadline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub id: u64,
    pub requests: Vec<StampRequest>,
    /// Milliseconds since the Unix epoch; fixed when the batch is opened
    pub deadline: u64,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Where an inserted request ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Appended to an existing open batch
    Joined { batch_id: u64, deadline: u64 },
    /// Started a new batch of its own
    Opened { batch_id: u64, deadline: u64 },
}

impl Placement {
    pub fn batch_id(&self) -> u64 {
        match self {
            Placement::Joined { batch_id, .. } | Placement::Opened { batch_id, .. } => *batch_id,
        }
    }

    /// Deadline of the batch the request was placed in
    pub fn deadline(&self) -> u64 {
        match self {
            Placement::Joined { deadline, .. } | Placement::Opened { deadline, .. } => *deadline,
        }
    }
}

/// Validation errors raised at the input boundary
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("objectCid must not be empty")]
    EmptyObjectCid,
    #[error("timeTolerance must be a finite, non-negative number of seconds, got {0}")]
    InvalidTolerance(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(tolerance: f64) -> StampRequest {
        StampRequest {
            object_cid: "cid".to_string(),
            time_tolerance: tolerance,
            timestamp: 0,
            signature: "mock_signature".to_string(),
        }
    }

    #[test]
    fn test_tolerance_millis() {
        assert_eq!(request(10.0).tolerance_millis(), 10_000);
        assert_eq!(request(0.25).tolerance_millis(), 250);
        assert_eq!(request(0.0).tolerance_millis(), 0);
    }

    #[test]
    fn test_tolerance_millis_saturates_on_bad_input() {
        assert_eq!(request(f64::NAN).tolerance_millis(), 0);
        assert_eq!(request(-5.0).tolerance_millis(), 0);
        assert_eq!(request(f64::INFINITY).tolerance_millis(), u64::MAX);
    }

    #[test]
    fn test_request_uses_camel_case_fields() {
        let json = serde_json::to_value(request(3.0)).unwrap();
        assert_eq!(json["objectCid"], "cid");
        assert_eq!(json["timeTolerance"], 3.0);
        assert_eq!(json["signature"], "mock_signature");
    }
}
