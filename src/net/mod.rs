//! Networking layer.
//!
//! - [`http`] - Evacuation routes over HTTP with protobuf bodies

pub mod http;

pub use http::{router, HttpListener, METRICS_ROUTE, PROTOBUF_CONTENT_TYPE};
