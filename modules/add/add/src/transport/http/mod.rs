//! HTTP transport: codecs, error translation, server router and client.

pub mod client;
pub mod codec;
pub mod error_encoder;
pub mod propagation;
pub mod server;
pub mod status_map;

pub use client::AddHttpClient;
pub use codec::{JSON_CONTENT_TYPE, ResponseMeta};
pub use error_encoder::{DomainStatusRule, ErrorTranslator, Translation};
pub use server::{GatewayState, router};
pub use status_map::http_status_from_code;
