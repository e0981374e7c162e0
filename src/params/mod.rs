//! # Params Module
//!
//! Turns a selected operation's declared bindings into its argument list.
//!
//! ## Overview
//!
//! [`ParamExtractor::process_parameters`] walks the bindings of an
//! operation and gathers a raw value for each one:
//!
//! | Kind | Source | Nameless binding |
//! |---|---|---|
//! | `path` | template variables | all variables |
//! | `query` | query string, parsed once per request | whole query map |
//! | `matrix` | `;k=v` in path segments, parsed once per request | whole matrix map |
//! | `form` | urlencoded body, buffered and parsed once | whole form map |
//! | `header` | request headers | all headers |
//! | `cookie` | `Cookie` headers | all cookies |
//! | `body` | request body through a [`BodyReader`] | n/a |
//! | `context` | request metadata ([`ContextKind`](crate::registry::ContextKind)) | n/a |
//!
//! Raw values are percent-decoded unless the binding is `encoded`, fall back
//! to the binding's default when absent, and are handed to a
//! [`ParamConverter`] for typing. Body bindings are always read first.

mod codec;
mod convert;
mod core;
mod structured;
#[cfg(test)]
mod tests;

pub use codec::{BodyCodecs, BodyError, BodyReader, BodyWriter, FormCodec, JsonCodec, TextCodec};
pub use convert::{map_to_object, ConversionError, JsonConverter, ParamConverter, RawValue};
pub use core::{ParamError, ParamExtractor};
pub use structured::{decode, matrix_params, parse_structured, Decoding};
