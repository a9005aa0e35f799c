//! Core error types for the add gateway
//!
//! This crate provides pure data types for error handling, with no dependencies
//! on HTTP frameworks. It includes:
//! - The wire error envelope (`ErrorRes`) written for every failed request
//! - Structured sub-errors (`ErrorItem`) and the generic error-string parser
//! - Domain errors (`DomainError`) raised by service implementations
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod domain;
pub mod envelope;
pub mod item;

// Re-export commonly used types
pub use domain::DomainError;
pub use envelope::{ErrorRes, ErrorResItem};
pub use item::{ErrorItem, from_error};

/// Content type of the error envelope.
pub const APPLICATION_JSON: &str = "application/json";
