//! # Resolver Configuration
//!
//! Knobs that change how requests are resolved. They are read from the
//! environment at startup, or from a YAML file, and are fixed for the
//! lifetime of an [`Engine`](crate::resolver::Engine).
//!
//! ## Environment Variables
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `BRRTR_KEEP_SUBRESOURCE_CANDIDATES` | `keep_subresource_candidates` | `false` |
//! | `BRRTR_PARTIAL_SUBTYPE_CHECK` | `partial_subtype_check` | `false` |
//! | `BRRTR_DEFAULT_CONTENT_TYPE` | `default_content_type` | unset |
//! | `BRRTR_RECORD_RESOLUTION` | `record_resolution_stack` | `true` |
//! | `BRRTR_MAX_LOCATOR_DEPTH` | `max_locator_depth` | `32` |
//!
//! Booleans accept `1/0`, `true/false`, `yes/no` and `on/off`. Invalid
//! values fall back to the default.
//!
//! ## Usage
//!
//! ```rust
//! use brrtresolver::config::ResolverConfig;
//!
//! let config = ResolverConfig::from_env();
//! assert!(config.max_locator_depth > 0);
//! ```

use crate::media::SubtypeCheck;
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::path::Path;

const DEFAULT_MAX_LOCATOR_DEPTH: usize = 32;

/// Resolver settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Keep final-path locators in the candidate set even when a terminal
    /// operation matched.
    pub keep_subresource_candidates: bool,
    /// Let a plain subtype match a composite subtype's suffix or prefix
    /// (`xml` against `vnd.foo+xml`).
    pub partial_subtype_check: bool,
    /// Content type assumed for body parameters when the request has none.
    /// `application/octet-stream` when unset.
    pub default_content_type: Option<String>,
    /// Push a [`ResolutionFrame`](crate::context::ResolutionFrame) for every
    /// selected operation.
    pub record_resolution_stack: bool,
    /// Maximum number of locator hops in one resolution.
    pub max_locator_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            keep_subresource_candidates: false,
            partial_subtype_check: false,
            default_content_type: None,
            record_resolution_stack: true,
            max_locator_depth: DEFAULT_MAX_LOCATOR_DEPTH,
        }
    }
}

impl ResolverConfig {
    /// Load configuration from `BRRTR_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| lookup(key).and_then(|v| parse_bool(&v)).unwrap_or(default);

        Self {
            keep_subresource_candidates: flag(
                "BRRTR_KEEP_SUBRESOURCE_CANDIDATES",
                defaults.keep_subresource_candidates,
            ),
            partial_subtype_check: flag(
                "BRRTR_PARTIAL_SUBTYPE_CHECK",
                defaults.partial_subtype_check,
            ),
            default_content_type: lookup("BRRTR_DEFAULT_CONTENT_TYPE")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            record_resolution_stack: flag(
                "BRRTR_RECORD_RESOLUTION",
                defaults.record_resolution_stack,
            ),
            max_locator_depth: lookup("BRRTR_MAX_LOCATOR_DEPTH")
                .and_then(|v| v.trim().parse().ok())
                .filter(|d| *d > 0)
                .unwrap_or(defaults.max_locator_depth),
        }
    }

    /// Load configuration from a YAML file. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading resolver config {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("parsing resolver config {}", path.display()))
    }

    #[must_use]
    pub fn subtype_check(&self) -> SubtypeCheck {
        if self.partial_subtype_check {
            SubtypeCheck::Partial
        } else {
            SubtypeCheck::Strict
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
