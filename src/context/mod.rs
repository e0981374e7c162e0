//! # Context Module
//!
//! Per-request state threaded through every resolver call.
//!
//! [`RequestContext`] carries the request metadata the transport already
//! parsed (method, path, query string, headers), the request body, a parse
//! cache keyed by [`CacheKey`] and the stack of [`ResolutionFrame`]s pushed
//! as operations are selected. Nothing in it is shared between requests.

mod ids;
mod request;

pub use ids::{RequestId, REQUEST_ID_HEADER};
pub use request::{Body, CacheKey, RequestContext, ResolutionFrame};
