//! Domain layer for the add module
//!
//! Contains the business logic behind the two operations.

pub mod service;

pub use service::Service;
