//! Add module
//!
//! Domain service for the `sum` and `concat` operations, the endpoint set
//! and middleware wrapped around it, and the HTTP gateway (server router,
//! client, and the error translator shared by both).
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;
pub mod endpoints;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod transport;

pub use config::GatewayConfig;
pub use domain::Service;
pub use endpoints::{BoxEndpoint, Call, Endpoints};
pub use error::GatewayError;
pub use metrics::GatewayMetrics;
pub use middleware::Middleware;
pub use transport::http::{AddHttpClient, ErrorTranslator, GatewayState, router};
