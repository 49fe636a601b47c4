//! Request Validation Module
//!
//! This module validates stamp requests at the input boundary, before they
//! reach the aggregator. Malformed tolerances are rejected here so the
//! scheduler never has to deal with them.

mod validator;
pub use validator::Validator;
