//! API Module
//!
//! This module handles the HTTP API for receiving stamp requests.
//! It provides the endpoint that clients use to submit objects for stamping.

mod server;
pub use server::{CreateStampRequest, CreateStampResponse, Server};
