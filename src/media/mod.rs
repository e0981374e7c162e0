//! # Media Module
//!
//! Media-type model and negotiation primitives used by the resolver.
//!
//! ## Overview
//!
//! - [`MediaType`] parses `Content-Type` / `Accept` entries, answers
//!   compatibility questions (including composite subtypes such as
//!   `application/vnd.acme+json`) and exposes quality factors.
//! - [`intersect`] combines a required list with an offered list, filling
//!   wildcards from the concrete side.
//! - [`negotiate_response_type`] picks the type a response is written in.
//!
//! ## Example
//!
//! ```rust
//! use brrtresolver::media::{negotiate_response_type, parse_media_types, SubtypeCheck};
//!
//! let accept = parse_media_types(Some("application/json;q=0.5, text/plain")).unwrap();
//! let produces = parse_media_types(Some("application/json, text/plain")).unwrap();
//! let chosen = negotiate_response_type(&accept, &produces, SubtypeCheck::Strict).unwrap();
//! assert_eq!(chosen.to_string(), "text/plain");
//! ```

mod core;
mod intersect;

pub use core::{
    compare_media_types, compare_quality, compare_specificity, compare_wildcards,
    parse_media_types, quality_factor, sort_media_types, to_media_type, MediaParams, MediaType,
    MediaTypeError, Quality, SubtypeCheck, CHARSET_PARAM, DISTANCE_PARAM, QS_PARAM, Q_PARAM,
    WILDCARD,
};
pub use intersect::{
    compare_intersected, compare_sorted_accept, compare_sorted_consumes, compare_sorted_lists,
    compatible_types, intersect, intersect_sorted, intersects, negotiate_response_type,
    IntersectOptions,
};
