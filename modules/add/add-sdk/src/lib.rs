//! Add SDK
//!
//! This crate provides everything needed to consume the add service,
//! independent of the transport it is reached through:
//! - API trait (`AddService`)
//! - Per-call context (`RequestCtx`)
//! - Error types (`AddError`)
//! - Operation request/response records (`dto`)
//!
//! ## Usage
//!
//! ```ignore
//! use add_sdk::{AddService, RequestCtx};
//!
//! let ctx = RequestCtx::new().with_bearer_token("token");
//! let sum = service.sum(&ctx, 2, 3).await?;
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod api;
mod context;
pub mod dto;

pub use api::{AddError, AddService};
pub use context::RequestCtx;
pub use dto::{ConcatRequest, ConcatResponse, SumRequest, SumResponse};
