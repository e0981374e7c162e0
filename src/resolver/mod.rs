//! # Resolver Module
//!
//! Maps a request to the operation that serves it.
//!
//! ## Overview
//!
//! Resolution runs in two phases:
//!
//! 1. [`select_resource_class`] matches the request path against every root
//!    resource and keeps the most specific matches.
//! 2. [`find_target_method`] matches each candidate's operations against the
//!    path left over, gates them on method, request content type and
//!    accepted response types, and ranks the survivors.
//!
//! When the winner is a sub-resource locator, [`Engine::resolve`] continues
//! in the located resource until a terminal operation is found.
//!
//! ## Failures
//!
//! | Error | Status | Raised when |
//! |---|---|---|
//! | [`ResolveError::NotFound`] | 404 | no template or operation path matches |
//! | [`ResolveError::MethodNotAllowed`] | 405 | the path matched, no method did |
//! | [`ResolveError::UnsupportedMediaType`] | 415 | no operation consumes the body type |
//! | [`ResolveError::NotAcceptable`] | 406 | no operation produces an accepted type |
//! | [`ResolveError::InvalidContentType`] | 400 | the `Content-Type` header is malformed |
//! | [`ResolveError::InvalidAccept`] | 400 | the `Accept` header is malformed |
//! | [`ResolveError::SubResourceCycle`] | 500 | locators loop |
//!
//! A 405 carries the methods for the `Allow` header. For `OPTIONS`
//! requests callers should answer with that listing instead
//! ([`ResolveError::is_options_fallback`]).

mod allow;
mod engine;
mod error;
mod operation;
mod resource;

pub use allow::{allowed_methods, match_http_method, MethodMatch};
pub use engine::{Engine, Resolution};
pub use error::ResolveError;
pub use operation::{find_target_method, SelectOptions, Selection};
pub use resource::{
    select_resource_class, MatchCandidate, PreferMethodCompatible, RegistrationOrder,
    ResourceComparator,
};
