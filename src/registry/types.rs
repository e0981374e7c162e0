use crate::media::MediaType;
use crate::template::{PathTemplate, PathValues};
use http::Method;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a resource inside a [`Registry`](super::Registry).
///
/// Sub-resource graphs may be cyclic, so resources refer to each other by
/// id rather than by ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub(crate) usize);

impl ResourceId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// HTTP method an operation answers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationMethod {
    /// A concrete method such as `GET`.
    Http(Method),
    /// Method-agnostic default operation; answers any method.
    Any,
}

impl OperationMethod {
    /// Parse a declared method. `*` and `ANY` declare a method-agnostic
    /// operation; anything else must be a valid HTTP method token.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw == "*" || raw.eq_ignore_ascii_case("any") {
            return Some(OperationMethod::Any);
        }
        Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
            .ok()
            .map(OperationMethod::Http)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            OperationMethod::Http(m) => m.as_str(),
            OperationMethod::Any => "*",
        }
    }

    #[must_use]
    pub fn http(&self) -> Option<&Method> {
        match self {
            OperationMethod::Http(m) => Some(m),
            OperationMethod::Any => None,
        }
    }
}

impl fmt::Display for OperationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter's raw value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Path,
    Query,
    Matrix,
    Header,
    Cookie,
    Form,
    Body,
    Context,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParamKind::Path => "path",
            ParamKind::Query => "query",
            ParamKind::Matrix => "matrix",
            ParamKind::Header => "header",
            ParamKind::Cookie => "cookie",
            ParamKind::Form => "form",
            ParamKind::Body => "body",
            ParamKind::Context => "context",
        };
        f.write_str(s)
    }
}

/// Request-scoped objects a `context` binding can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    /// Path, query and template variables of the request.
    UriInfo,
    /// All request headers.
    Headers,
    /// Method and request id.
    Request,
}

/// Target type handed to the coercion collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
    /// Every raw value, each coerced to the inner type.
    List(Box<TargetType>),
    /// Multi-valued map of name to values.
    Object,
    /// Raw value parsed as JSON.
    Json,
    Context(ContextKind),
}

/// One declared handler argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamBinding {
    pub kind: ParamKind,
    /// `None` binds the whole multi-valued map of the source.
    #[serde(default)]
    pub name: Option<String>,
    /// Skip percent-decoding.
    #[serde(default)]
    pub encoded: bool,
    #[serde(default, rename = "default")]
    pub default_value: Option<String>,
    /// Written as `integer` or as a one-key map such as `{ list: string }`.
    #[serde(
        default,
        rename = "type",
        with = "serde_yaml::with::singleton_map_recursive"
    )]
    pub target: TargetType,
}

impl ParamBinding {
    pub fn new(kind: ParamKind, name: Option<&str>, target: TargetType) -> Self {
        Self {
            kind,
            name: name.map(str::to_string),
            encoded: false,
            default_value: None,
            target,
        }
    }

    pub fn path(name: &str, target: TargetType) -> Self {
        Self::new(ParamKind::Path, Some(name), target)
    }

    pub fn query(name: &str, target: TargetType) -> Self {
        Self::new(ParamKind::Query, Some(name), target)
    }

    pub fn matrix(name: &str, target: TargetType) -> Self {
        Self::new(ParamKind::Matrix, Some(name), target)
    }

    pub fn header(name: &str, target: TargetType) -> Self {
        Self::new(ParamKind::Header, Some(name), target)
    }

    pub fn cookie(name: &str, target: TargetType) -> Self {
        Self::new(ParamKind::Cookie, Some(name), target)
    }

    pub fn form(name: &str, target: TargetType) -> Self {
        Self::new(ParamKind::Form, Some(name), target)
    }

    pub fn body(target: TargetType) -> Self {
        Self::new(ParamKind::Body, None, target)
    }

    pub fn context(kind: ContextKind) -> Self {
        Self::new(ParamKind::Context, None, TargetType::Context(kind))
    }

    #[must_use]
    pub fn encoded(mut self) -> Self {
        self.encoded = true;
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_string());
        self
    }
}

/// Immutable description of one operation of a resource.
#[derive(Debug, Clone)]
pub struct OperationDescriptor {
    pub(crate) name: String,
    pub(crate) template: PathTemplate,
    pub(crate) method: Option<OperationMethod>,
    pub(crate) consumes: Vec<MediaType>,
    pub(crate) produces: Vec<MediaType>,
    pub(crate) params: Vec<ParamBinding>,
    pub(crate) locates: Option<ResourceId>,
    pub(crate) order: usize,
}

impl OperationDescriptor {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operation template, `/` when none was declared.
    #[must_use]
    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    /// Declared method; `None` for a sub-resource locator.
    #[must_use]
    pub fn method(&self) -> Option<&OperationMethod> {
        self.method.as_ref()
    }

    #[must_use]
    pub fn is_locator(&self) -> bool {
        self.method.is_none()
    }

    /// Consumable types, best first.
    #[must_use]
    pub fn consumes(&self) -> &[MediaType] {
        &self.consumes
    }

    /// Producible types, best first.
    #[must_use]
    pub fn produces(&self) -> &[MediaType] {
        &self.produces
    }

    #[must_use]
    pub fn params(&self) -> &[ParamBinding] {
        &self.params
    }

    /// Resource returned by this locator.
    #[must_use]
    pub fn locates(&self) -> Option<ResourceId> {
        self.locates
    }

    /// Position in registration order across the whole registry.
    #[must_use]
    pub fn order(&self) -> usize {
        self.order
    }

    /// `true` when the template matches all of `values`' current path.
    pub(crate) fn matches_finally(&self, values: &PathValues) -> bool {
        let mut scratch = values.clone();
        self.template.match_path(values.current_path(), &mut scratch) && scratch.is_final()
    }
}

/// Immutable description of a resource and its operations.
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    pub(crate) id: ResourceId,
    pub(crate) name: String,
    pub(crate) template: PathTemplate,
    pub(crate) root: bool,
    pub(crate) operations: Vec<OperationDescriptor>,
    pub(crate) sub_resources: Vec<ResourceId>,
    pub(crate) parent: Option<ResourceId>,
}

impl ResourceDescriptor {
    #[must_use]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    /// Root resources are matched against request paths directly.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.root
    }

    #[must_use]
    pub fn operations(&self) -> &[OperationDescriptor] {
        &self.operations
    }

    /// Resources reachable through this resource's locators.
    #[must_use]
    pub fn sub_resources(&self) -> &[ResourceId] {
        &self.sub_resources
    }

    /// First resource whose locator returns this one.
    #[must_use]
    pub fn parent(&self) -> Option<ResourceId> {
        self.parent
    }

    /// Whether this resource is reached through a locator.
    #[must_use]
    pub fn is_sub_resource(&self) -> bool {
        self.parent.is_some()
    }

    pub fn operation(&self, name: &str) -> Option<&OperationDescriptor> {
        self.operations.iter().find(|op| op.name == name)
    }
}
