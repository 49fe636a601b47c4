use crate::{api::CreateStampRequest, ValidationError};
use tracing::{debug, warn};

#[derive(Debug, Default, Clone, Copy)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    /// Validate an incoming stamp request
    /// Returns Ok(()) if valid, Err(ValidationError) if invalid
    pub fn validate(&self, request: &CreateStampRequest) -> Result<(), ValidationError> {
        debug!("Validating stamp request for {:?}", request.object_cid);

        // 1. Check the content identifier
        self.check_object_cid(request)?;

        // 2. Check the tolerance window
        self.check_tolerance(request)?;

        Ok(())
    }

    fn check_object_cid(&self, request: &CreateStampRequest) -> Result<(), ValidationError> {
        if request.object_cid.trim().is_empty() {
            warn!("Rejected stamp request with empty objectCid");
            return Err(ValidationError::EmptyObjectCid);
        }
        Ok(())
    }

    /// Tolerance must be a finite, non-negative number of seconds
    fn check_tolerance(&self, request: &CreateStampRequest) -> Result<(), ValidationError> {
        let tolerance = request.time_tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            warn!(
                "Rejected stamp request for {:?}: invalid timeTolerance {}",
                request.object_cid, tolerance
            );
            return Err(ValidationError::InvalidTolerance(tolerance));
        }
        Ok(())
    }
}
