use super::types::{
    OperationDescriptor, OperationMethod, ParamBinding, ResourceDescriptor, ResourceId,
};
use crate::media::{sort_media_types, MediaType, MediaTypeError, Quality};
use crate::template::{PathTemplate, TemplateError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

/// Error raised while turning declarations into a [`Registry`].
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate resource name '{0}'")]
    DuplicateResource(String),
    #[error("operation '{operation}' locates unknown resource '{target}'")]
    UnknownResource { operation: String, target: String },
    #[error("invalid path template on '{owner}'")]
    Template {
        owner: String,
        #[source]
        source: TemplateError,
    },
    #[error("invalid media type '{value}' on operation '{operation}'")]
    MediaType {
        operation: String,
        value: String,
        #[source]
        source: MediaTypeError,
    },
    #[error("invalid HTTP method '{method}' on operation '{operation}'")]
    InvalidMethod { operation: String, method: String },
    #[error("operation '{0}' declares neither a method nor a located resource")]
    LocatorWithoutTarget(String),
    #[error("operation '{0}' declares both a method and a located resource")]
    MethodOnLocator(String),
}

/// Declaration of one operation, as written in code or in a manifest.
///
/// An operation without `method` is a sub-resource locator and must name
/// the resource it returns in `locates`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationSpec {
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub consumes: Vec<String>,
    #[serde(default)]
    pub produces: Vec<String>,
    #[serde(default)]
    pub params: Vec<ParamBinding>,
    #[serde(default)]
    pub locates: Option<String>,
}

impl OperationSpec {
    pub fn new(method: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            method: Some(method.to_string()),
            ..Self::default()
        }
    }

    pub fn get(name: &str) -> Self {
        Self::new("GET", name)
    }

    pub fn post(name: &str) -> Self {
        Self::new("POST", name)
    }

    pub fn put(name: &str) -> Self {
        Self::new("PUT", name)
    }

    pub fn delete(name: &str) -> Self {
        Self::new("DELETE", name)
    }

    /// Method-agnostic operation.
    pub fn any(name: &str) -> Self {
        Self::new("*", name)
    }

    /// Sub-resource locator returning the resource named `target`.
    pub fn locator(name: &str, target: &str) -> Self {
        Self {
            name: name.to_string(),
            locates: Some(target.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }

    #[must_use]
    pub fn consumes(mut self, types: &[&str]) -> Self {
        self.consumes = types.iter().map(|s| (*s).to_string()).collect();
        self
    }

    #[must_use]
    pub fn produces(mut self, types: &[&str]) -> Self {
        self.produces = types.iter().map(|s| (*s).to_string()).collect();
        self
    }

    #[must_use]
    pub fn param(mut self, binding: ParamBinding) -> Self {
        self.params.push(binding);
        self
    }
}

fn default_root() -> bool {
    true
}

/// Declaration of one resource and its operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub name: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// Root resources are matched against request paths; sub-resources
    /// are only reached through locators.
    #[serde(default = "default_root")]
    pub root: bool,
    #[serde(default)]
    pub operations: Vec<OperationSpec>,
}

fn default_path() -> String {
    "/".to_string()
}

impl ResourceSpec {
    pub fn root(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            root: true,
            operations: Vec::new(),
        }
    }

    /// Resource only reachable through a locator.
    pub fn sub(name: &str, path: &str) -> Self {
        Self {
            root: false,
            ..Self::root(name, path)
        }
    }

    #[must_use]
    pub fn operation(mut self, op: OperationSpec) -> Self {
        self.operations.push(op);
        self
    }
}

/// Immutable table of resource descriptors consulted by the resolver.
///
/// Built once by [`RegistryBuilder`] and never mutated afterwards; share
/// it behind an `Arc` (or a [`SharedRegistry`](super::SharedRegistry)
/// when it must be swapped at runtime).
#[derive(Debug, Clone, Default)]
pub struct Registry {
    resources: Vec<ResourceDescriptor>,
    roots: Vec<ResourceId>,
}

impl Registry {
    #[must_use]
    pub fn resource(&self, id: ResourceId) -> Option<&ResourceDescriptor> {
        self.resources.get(id.0)
    }

    pub fn resource_by_name(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Root resources in registration order.
    pub fn roots(&self) -> impl Iterator<Item = &ResourceDescriptor> + '_ {
        self.roots.iter().filter_map(|id| self.resource(*id))
    }

    #[must_use]
    pub fn resources(&self) -> &[ResourceDescriptor] {
        &self.resources
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.resources.iter().map(|r| r.operations.len()).sum()
    }
}

/// Registrar that validates declarations and produces a [`Registry`].
///
/// ```rust
/// use brrtresolver::registry::{OperationSpec, RegistryBuilder, ResourceSpec};
///
/// let registry = RegistryBuilder::new()
///     .resource(
///         ResourceSpec::root("widgets", "/widgets")
///             .operation(OperationSpec::get("get_widget").path("/{id}")),
///     )
///     .build()
///     .unwrap();
/// assert_eq!(registry.operation_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    specs: Vec<ResourceSpec>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn resource(mut self, spec: ResourceSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn add_resource(&mut self, spec: ResourceSpec) -> &mut Self {
        self.specs.push(spec);
        self
    }

    /// Validate every declaration and build the registry.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistryError`] found. Nothing is built on error.
    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut ids: HashMap<&str, ResourceId> = HashMap::with_capacity(self.specs.len());
        for (i, spec) in self.specs.iter().enumerate() {
            if ids.insert(spec.name.as_str(), ResourceId(i)).is_some() {
                return Err(RegistryError::DuplicateResource(spec.name.clone()));
            }
        }

        let mut order = 0usize;
        let mut resources = Vec::with_capacity(self.specs.len());
        for (i, spec) in self.specs.iter().enumerate() {
            let template =
                PathTemplate::new(&spec.path).map_err(|source| RegistryError::Template {
                    owner: spec.name.clone(),
                    source,
                })?;

            let mut operations = Vec::with_capacity(spec.operations.len());
            for op in &spec.operations {
                operations.push(build_operation(op, &ids, order)?);
                order += 1;
            }

            let mut sub_resources: Vec<ResourceId> = Vec::new();
            for target in operations.iter().filter_map(OperationDescriptor::locates) {
                if !sub_resources.contains(&target) {
                    sub_resources.push(target);
                }
            }

            resources.push(ResourceDescriptor {
                id: ResourceId(i),
                name: spec.name.clone(),
                template,
                root: spec.root,
                operations,
                sub_resources,
                parent: None,
            });
        }

        // parent = first resource whose locator returns it
        for i in 0..resources.len() {
            let owner = resources[i].id;
            let targets = resources[i].sub_resources.clone();
            for target in targets {
                if let Some(sub) = resources.get_mut(target.0) {
                    if sub.parent.is_none() {
                        sub.parent = Some(owner);
                    }
                }
            }
        }

        let roots: Vec<ResourceId> = resources
            .iter()
            .filter(|r| r.root)
            .map(|r| r.id)
            .collect();

        let registry = Registry { resources, roots };
        info!(
            resources_count = registry.len(),
            roots_count = registry.roots.len(),
            operations_count = registry.operation_count(),
            "Resource registry built"
        );
        Ok(registry)
    }
}

fn build_operation(
    op: &OperationSpec,
    ids: &HashMap<&str, ResourceId>,
    order: usize,
) -> Result<OperationDescriptor, RegistryError> {
    let template = match op.path.as_deref() {
        Some(path) => PathTemplate::new(path).map_err(|source| RegistryError::Template {
            owner: op.name.clone(),
            source,
        })?,
        None => PathTemplate::root(),
    };

    let method = op
        .method
        .as_deref()
        .map(|m| {
            OperationMethod::parse(m).ok_or_else(|| RegistryError::InvalidMethod {
                operation: op.name.clone(),
                method: m.to_string(),
            })
        })
        .transpose()?;

    let locates = match (&method, op.locates.as_deref()) {
        (Some(_), Some(_)) => return Err(RegistryError::MethodOnLocator(op.name.clone())),
        (None, None) => return Err(RegistryError::LocatorWithoutTarget(op.name.clone())),
        (Some(_), None) => None,
        (None, Some(target)) => Some(*ids.get(target).ok_or_else(|| {
            RegistryError::UnknownResource {
                operation: op.name.clone(),
                target: target.to_string(),
            }
        })?),
    };

    let mut consumes = parse_declared(&op.name, &op.consumes)?;
    let mut produces = parse_declared(&op.name, &op.produces)?;
    sort_media_types(&mut consumes, Some(Quality::Client));
    sort_media_types(&mut produces, Some(Quality::Server));

    debug!(
        operation = %op.name,
        method = ?method.as_ref().map(OperationMethod::as_str),
        template = %template,
        "Operation registered"
    );

    Ok(OperationDescriptor {
        name: op.name.clone(),
        template,
        method,
        consumes,
        produces,
        params: op.params.clone(),
        locates,
        order,
    })
}

/// Parse declared media types; an empty declaration means `*/*`.
fn parse_declared(operation: &str, raw: &[String]) -> Result<Vec<MediaType>, RegistryError> {
    if raw.is_empty() {
        return Ok(vec![MediaType::wildcard()]);
    }
    raw.iter()
        .map(|value| {
            value.parse().map_err(|source| RegistryError::MediaType {
                operation: operation.to_string(),
                value: value.clone(),
                source,
            })
        })
        .collect()
}
