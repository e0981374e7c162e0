//! # Registry Module
//!
//! Immutable descriptor tables the resolver reads: resources, their
//! operations, and the parameter bindings of each operation.
//!
//! ## Overview
//!
//! - [`ResourceSpec`] / [`OperationSpec`] are declarations, written in code
//!   or loaded from a YAML/JSON [`Manifest`].
//! - [`RegistryBuilder`] validates declarations (templates, media types,
//!   methods, locator targets) and produces a [`Registry`].
//! - [`SharedRegistry`] publishes registry snapshots that can be swapped at
//!   runtime, and [`watch_manifest`] rebuilds one when its manifest changes.
//!
//! Resources refer to each other through [`ResourceId`]s so that
//! self-referential sub-resource graphs can be expressed.
//!
//! ## Example
//!
//! ```rust
//! use brrtresolver::registry::{parse_manifest, ManifestFormat};
//!
//! let registry = parse_manifest(
//!     r#"
//! resources:
//!   - name: widgets
//!     path: /widgets/{id}
//!     operations:
//!       - { name: get_widget, method: GET, produces: [application/json] }
//! "#,
//!     ManifestFormat::Yaml,
//! )
//! .unwrap();
//! assert_eq!(registry.roots().count(), 1);
//! ```

mod build;
mod load;
mod shared;
mod types;

pub use build::{OperationSpec, Registry, RegistryBuilder, RegistryError, ResourceSpec};
pub use load::{load_manifest, parse_manifest, Manifest, ManifestFormat};
pub use shared::{watch_manifest, SharedRegistry};
pub use types::{
    ContextKind, OperationDescriptor, OperationMethod, ParamBinding, ParamKind,
    ResourceDescriptor, ResourceId, TargetType,
};
