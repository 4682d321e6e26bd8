//! Callback-driven HTTP resource client with a dynamic JSON value model.
//!
//! # Overview
//! A `Resource<T>` fetches one URL and decodes the response body into `T`,
//! typically the dynamic `JsonValue`. Outcomes are delivered through
//! one-shot success/failure callbacks on a single completion context, so UI
//! glue can update its state from callbacks without locking.
//!
//! # Design
//! - The network is behind the `Transport` trait. `UreqTransport` talks HTTP,
//!   `Scripted` replays canned outcomes for tests.
//! - Callbacks run on a `CompletionContext`. `CompletionQueue` provides a
//!   dedicated serial thread; hosts with their own event loop implement the
//!   trait themselves.
//! - Failures form a closed taxonomy (`ResourceError`) and only ever reach
//!   the failure callback. `JsonValue` accessors never fail; shape mismatches
//!   read as `Null` or zero values.
//! - Request classification (`classify`) is a pure function over plain-data
//!   `HttpResponse` values, testable without I/O.

pub mod completion;
pub mod decode;
pub mod error;
pub mod http;
pub mod json;
pub mod keys;
pub mod resource;
pub mod transport;

pub use completion::{CompletionContext, CompletionQueue, Job};
pub use decode::{Decodable, Typed};
pub use error::{InFlight, ResourceError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use json::JsonValue;
pub use keys::{normalize, Keyed, ParamKey};
pub use resource::{classify, JsonResource, Resource, JSON_CONTENT_TYPE};
pub use transport::{
    Reply, Scripted, Transport, TransportConfig, UreqTransport, DEFAULT_BODY_LIMIT,
};
