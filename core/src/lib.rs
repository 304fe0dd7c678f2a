//! Blocking client core for the BurstChain ledger REST API.
//!
//! # Overview
//! `RestClient` is bound to one server and one tenant. Every call is a
//! single JSON-over-HTTP round trip through `send`, authorized either by
//! HTTP basic auth or by an `Authorization: ID <private id>` header.
//!
//! # Design
//! - Requests and responses are plain data (`HttpRequest`, `HttpResponse`);
//!   the network lives behind the `Transport` trait. `UreqTransport` is the
//!   default and reuses one connection pool for the client's lifetime.
//! - Any status other than 200 is an `ApiError::Status`. Nothing is
//!   retried, and stopping on failure is left to the caller.
//! - The crate emits `tracing` events but never installs a subscriber.

pub mod client;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::{parse_response, RestClient, NO_BODY};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use transport::UreqTransport;
pub use types::{AssetTransfer, AssetUpdate, MapReduceQuery, NewAsset, SmartContract, TqlQuery};
