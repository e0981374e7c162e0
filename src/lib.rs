//! # BRRTResolver
//!
//! **BRRTResolver** maps inbound HTTP requests onto registered resource operations: it matches path
//! templates, negotiates request and response media types, follows sub-resource locators and
//! produces the ordered argument list an operation is invoked with.
//!
//! ## Overview
//!
//! The engine sits between a transport (which parses the request line and headers) and a handler
//! dispatcher (which invokes the selected operation). It never performs I/O other than reading the
//! request body once, keeps no shared mutable state, and classifies every failure as an HTTP
//! status.
//!
//! ## Architecture
//!
//! - **[`media`]** - Media types: parsing, compatibility, specificity, quality, intersection
//! - **[`template`]** - Path templates compiled to regexes, bound variables, specificity order
//! - **[`registry`]** - Resource/operation descriptors, the registry builder, YAML/JSON manifests,
//!   hot-reloadable registry snapshots
//! - **[`context`]** - Per-request context with a parse cache and resolution stack
//! - **[`resolver`]** - Resource selection, operation selection, locator chaining, the [`Engine`]
//! - **[`params`]** - Parameter extraction, value conversion, body codecs
//! - **[`config`]** / **[`logging`]** - Environment-driven settings and tracing setup
//! - **[`cli`]** - The `brrtresolver` binary
//!
//! ### Request Resolution Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant T as Transport
//!     participant E as Engine
//!     participant R as select_resource_class
//!     participant O as find_target_method
//!     participant P as ParamExtractor
//!
//!     T->>E: resolve(RequestContext)
//!     E->>E: parse Content-Type / Accept
//!     E->>R: root resources + path
//!     R-->>E: most specific candidates
//!     loop until a terminal operation
//!         E->>O: candidates, method, media types
//!         O-->>E: Selection (or 404/405/415/406)
//!         E->>E: locator? match located resource on remaining path
//!     end
//!     E-->>T: Resolution
//!     T->>E: process_parameters(operation, values, ctx)
//!     E->>P: bindings (body first)
//!     P-->>T: ordered arguments
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use brrtresolver::context::RequestContext;
//! use brrtresolver::registry::{OperationSpec, ParamBinding, RegistryBuilder, ResourceSpec, TargetType};
//! use brrtresolver::Engine;
//! use http::Method;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let registry = RegistryBuilder::new()
//!     .resource(
//!         ResourceSpec::root("pets", "/pets").operation(
//!             OperationSpec::get("get_pet")
//!                 .path("/{id}")
//!                 .produces(&["application/json"])
//!                 .param(ParamBinding::path("id", TargetType::Integer)),
//!         ),
//!     )
//!     .build()
//!     .unwrap();
//! let engine = Engine::new(Arc::new(registry));
//!
//! let mut ctx = RequestContext::new(Method::GET, "/pets/12").with_header("Accept", "application/json");
//! let resolution = engine.resolve(&mut ctx).unwrap();
//! let args = engine
//!     .process_parameters(resolution.operation(), resolution.values(), &mut ctx)
//!     .unwrap();
//! assert_eq!(args, vec![json!(12)]);
//! ```
//!
//! ## Configuration
//!
//! | Variable | Effect |
//! |---|---|
//! | `BRRTR_KEEP_SUBRESOURCE_CANDIDATES` | keep dead-end locators next to terminal matches |
//! | `BRRTR_PARTIAL_SUBTYPE_CHECK` | let `xml` match `vnd.foo+xml` |
//! | `BRRTR_DEFAULT_CONTENT_TYPE` | body type when the request declares none |
//! | `BRRTR_RECORD_RESOLUTION` | push resolution frames onto the context |
//! | `BRRTR_MAX_LOCATOR_DEPTH` | cap on chained locators |
//! | `BRRTR_LOG_LEVEL`, `BRRTR_LOG_FORMAT`, ... | see [`logging::LogConfig`] |

pub mod cli;
pub mod config;
pub mod context;
pub mod logging;
pub mod media;
pub mod params;
pub mod registry;
pub mod resolver;
pub mod template;

pub use config::ResolverConfig;
pub use context::RequestContext;
pub use media::MediaType;
pub use registry::{Registry, RegistryBuilder};
pub use resolver::{Engine, Resolution, ResolveError};
