use crate::media::MediaTypeError;
use http::{Method, StatusCode};
use thiserror::Error;

/// Why a request could not be resolved to an operation.
///
/// Every variant maps to one HTTP status through [`ResolveError::status`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No resource template, or no operation's final path, matches.
    #[error("no resource matches path '{path}'")]
    NotFound { path: String },
    /// The path matched but no operation accepts the method.
    #[error("method {method} not allowed for '{path}'")]
    MethodNotAllowed {
        method: Method,
        path: String,
        /// Methods that would have matched, for the `Allow` header.
        allowed: Vec<Method>,
    },
    /// Path and method matched but no operation consumes the request body type.
    #[error("unsupported media type '{content_type}'")]
    UnsupportedMediaType { content_type: String },
    /// Path, method and body type matched but nothing produces an accepted type.
    #[error("no acceptable response type for '{accept}'")]
    NotAcceptable { accept: String },
    #[error("invalid Content-Type header")]
    InvalidContentType(#[source] MediaTypeError),
    #[error("invalid Accept header")]
    InvalidAccept(#[source] MediaTypeError),
    /// A locator chain revisited a resource with the same remaining path,
    /// or exceeded the configured depth.
    #[error("sub-resource cycle at '{resource}' with remaining path '{path}'")]
    SubResourceCycle { resource: String, path: String },
}

impl ResolveError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ResolveError::NotFound { .. } => StatusCode::NOT_FOUND,
            ResolveError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ResolveError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ResolveError::NotAcceptable { .. } => StatusCode::NOT_ACCEPTABLE,
            ResolveError::InvalidContentType(_) | ResolveError::InvalidAccept(_) => {
                StatusCode::BAD_REQUEST
            }
            ResolveError::SubResourceCycle { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Methods for the `Allow` header of a 405.
    #[must_use]
    pub fn allowed(&self) -> Option<&[Method]> {
        match self {
            ResolveError::MethodNotAllowed { allowed, .. } => Some(allowed),
            _ => None,
        }
    }

    /// `Allow` header value of a 405, e.g. `GET, HEAD, OPTIONS`.
    #[must_use]
    pub fn allow_header(&self) -> Option<String> {
        self.allowed().map(|methods| {
            methods
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        })
    }

    /// `true` for a 405 on an `OPTIONS` request. Callers answer those with
    /// an `Allow` listing instead of an error.
    #[must_use]
    pub fn is_options_fallback(&self) -> bool {
        matches!(self, ResolveError::MethodNotAllowed { method, .. } if method == Method::OPTIONS)
    }
}
