use super::allow::allowed_methods;
use super::error::ResolveError;
use super::operation::{find_target_method, SelectOptions, Selection};
use super::resource::{select_resource_class, MatchCandidate, RegistrationOrder, ResourceComparator};
use crate::config::ResolverConfig;
use crate::context::RequestContext;
use crate::media::{parse_media_types, sort_media_types, to_media_type, MediaType, Quality};
use crate::params::{BodyCodecs, BodyError, JsonConverter, ParamConverter, ParamError, ParamExtractor};
use crate::registry::{OperationDescriptor, Registry, ResourceDescriptor, ResourceId};
use crate::template::PathValues;
use http::Method;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of [`Engine::resolve`]: the terminal operation plus the locators
/// that led to it, outermost first.
#[derive(Debug, Clone)]
pub struct Resolution<'r> {
    pub selection: Selection<'r>,
    pub locators: Vec<&'r OperationDescriptor>,
}

impl<'r> Resolution<'r> {
    #[must_use]
    pub fn resource(&self) -> &'r ResourceDescriptor {
        self.selection.resource
    }

    #[must_use]
    pub fn operation(&self) -> &'r OperationDescriptor {
        self.selection.operation
    }

    /// Variables bound along the whole chain.
    #[must_use]
    pub fn values(&self) -> &PathValues {
        &self.selection.values
    }

    #[must_use]
    pub fn response_type(&self) -> Option<&MediaType> {
        self.selection.response_type.as_ref()
    }
}

/// Request resolution engine.
///
/// Holds an immutable registry snapshot together with the pluggable
/// collaborators: resource tie-break comparator, parameter converter and
/// body codecs. An `Engine` is cheap to clone and can be shared across
/// threads; all per-request state lives in the [`RequestContext`].
///
/// # Example
///
/// ```
/// use brrtresolver::context::RequestContext;
/// use brrtresolver::registry::{OperationSpec, RegistryBuilder, ResourceSpec};
/// use brrtresolver::resolver::Engine;
/// use http::Method;
/// use std::sync::Arc;
///
/// let registry = RegistryBuilder::new()
///     .resource(
///         ResourceSpec::root("widgets", "/widgets")
///             .operation(OperationSpec::get("get_widget").path("/{id}").produces(&["application/json"])),
///     )
///     .build()
///     .unwrap();
///
/// let engine = Engine::new(Arc::new(registry));
/// let mut ctx = RequestContext::new(Method::GET, "/widgets/7");
/// let resolution = engine.resolve(&mut ctx).unwrap();
/// assert_eq!(resolution.operation().name(), "get_widget");
/// assert_eq!(resolution.values().get("id"), Some("7"));
/// ```
#[derive(Clone)]
pub struct Engine {
    registry: Arc<Registry>,
    config: ResolverConfig,
    comparator: Arc<dyn ResourceComparator>,
    converter: Arc<dyn ParamConverter>,
    codecs: Arc<BodyCodecs>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("resources", &self.registry.len())
            .field("config", &self.config)
            .field("codecs", &self.codecs)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Engine with default configuration, registration-order tie-breaks,
    /// JSON conversion and the built-in body codecs.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            config: ResolverConfig::default(),
            comparator: Arc::new(RegistrationOrder),
            converter: Arc::new(JsonConverter),
            codecs: Arc::new(BodyCodecs::with_defaults()),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_resource_comparator(mut self, comparator: Arc<dyn ResourceComparator>) -> Self {
        self.comparator = comparator;
        self
    }

    #[must_use]
    pub fn with_converter(mut self, converter: Arc<dyn ParamConverter>) -> Self {
        self.converter = converter;
        self
    }

    #[must_use]
    pub fn with_codecs(mut self, codecs: Arc<BodyCodecs>) -> Self {
        self.codecs = codecs;
        self
    }

    /// Same collaborators over another registry snapshot, e.g. one taken
    /// from a [`SharedRegistry`](crate::registry::SharedRegistry) after a
    /// reload.
    #[must_use]
    pub fn with_registry(&self, registry: Arc<Registry>) -> Self {
        Self {
            registry,
            config: self.config.clone(),
            comparator: Arc::clone(&self.comparator),
            converter: Arc::clone(&self.converter),
            codecs: Arc::clone(&self.codecs),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    #[must_use]
    pub fn codecs(&self) -> &BodyCodecs {
        &self.codecs
    }

    /// Root resources matching `path`, best first.
    #[must_use]
    pub fn select_resource_class(&self, path: &str, ctx: &RequestContext) -> Vec<MatchCandidate<'_>> {
        select_resource_class(self.registry.roots(), path, ctx, self.comparator.as_ref())
    }

    /// Best operation among `candidates` for the method in `ctx`.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ResolveError`] when nothing qualifies.
    pub fn find_target_method<'r>(
        &'r self,
        candidates: &[MatchCandidate<'r>],
        ctx: &mut RequestContext,
        content_type: &MediaType,
        accept: &[MediaType],
    ) -> Result<Selection<'r>, ResolveError> {
        let method = ctx.method().clone();
        let options = SelectOptions::from(&self.config);
        find_target_method(candidates, ctx, &method, content_type, accept, &options)
    }

    /// Resolve the request in `ctx` to a terminal operation.
    ///
    /// Sub-resource locators are followed: the located resource's template
    /// is matched against the path the locator left over and selection
    /// starts again there. Revisiting a resource with the same remaining
    /// path, or chaining more than `max_locator_depth` locators, is a
    /// [`ResolveError::SubResourceCycle`].
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] for malformed `Content-Type`/`Accept`
    /// headers, for every classified selection failure, and for cycles.
    pub fn resolve(&self, ctx: &mut RequestContext) -> Result<Resolution<'_>, ResolveError> {
        let content_type =
            to_media_type(ctx.content_type()).map_err(ResolveError::InvalidContentType)?;
        let mut accept = parse_media_types(ctx.accept()).map_err(ResolveError::InvalidAccept)?;
        sort_media_types(&mut accept, Some(Quality::Client));

        let method = ctx.method().clone();
        let path = ctx.path_to_match();
        let options = SelectOptions::from(&self.config);

        // RT1: Resolution attempt
        debug!(
            request_id = %ctx.request_id(),
            method = %method,
            path = %path,
            content_type = %content_type,
            accept = ?accept.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "Resolving request"
        );

        let mut candidates = self.select_resource_class(&path, ctx);
        if candidates.is_empty() {
            // RT4: No resource matched
            warn!(method = %method, path = %path, status = 404, "No resource matches path");
            return Err(ResolveError::NotFound { path });
        }

        let mut locators: Vec<&OperationDescriptor> = Vec::new();
        let mut visited: HashSet<(ResourceId, String)> = HashSet::new();

        loop {
            let selection =
                find_target_method(&candidates, ctx, &method, &content_type, &accept, &options)?;
            let Some(target_id) = selection.operation.locates() else {
                return Ok(Resolution { selection, locators });
            };

            let remaining = selection.values.current_path().to_string();
            let target = self
                .registry
                .resource(target_id)
                .ok_or_else(|| ResolveError::NotFound {
                    path: remaining.clone(),
                })?;

            if locators.len() >= self.config.max_locator_depth
                || !visited.insert((target_id, remaining.clone()))
            {
                warn!(
                    resource = %target.name(),
                    remaining = %remaining,
                    depth = locators.len(),
                    status = 500,
                    "Sub-resource locator cycle"
                );
                return Err(ResolveError::SubResourceCycle {
                    resource: target.name().to_string(),
                    path: remaining,
                });
            }

            let mut values = selection.values.clone();
            if !target.template().match_path(&remaining, &mut values) {
                warn!(resource = %target.name(), remaining = %remaining, status = 404, "Located resource does not match");
                return Err(ResolveError::NotFound { path: remaining });
            }

            debug!(
                locator = %selection.operation.name(),
                resource = %target.name(),
                remaining = %remaining,
                "Following sub-resource locator"
            );
            locators.push(selection.operation);
            candidates = vec![MatchCandidate {
                resource: target,
                values,
                located: true,
            }];
        }
    }

    /// Methods available on the path of `ctx`, for an `Allow` header.
    #[must_use]
    pub fn allowed_methods(&self, ctx: &RequestContext) -> Vec<Method> {
        allowed_methods(&self.select_resource_class(&ctx.path_to_match(), ctx))
    }

    /// Arguments for `operation`, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError`] for unreadable bodies and unconvertible values.
    pub fn process_parameters(
        &self,
        operation: &OperationDescriptor,
        values: &PathValues,
        ctx: &mut RequestContext,
    ) -> Result<Vec<Value>, ParamError> {
        let extractor = ParamExtractor {
            converter: self.converter.as_ref(),
            codecs: &self.codecs,
            default_content_type: self.config.default_content_type.as_deref(),
        };
        extractor.process_parameters(operation, values, ctx)
    }

    /// Serialize a handler result in the negotiated response type and
    /// return the concrete type written.
    ///
    /// # Errors
    ///
    /// [`BodyError::NoWriter`] when no writer handles the value in that
    /// type, or the writer's own failure.
    pub fn write_response(
        &self,
        selection: &Selection<'_>,
        value: &Value,
        out: &mut dyn Write,
    ) -> Result<MediaType, BodyError> {
        let requested = selection
            .response_type
            .clone()
            .unwrap_or_else(MediaType::wildcard);
        let (writer, concrete) =
            self.codecs
                .writer_for(value, &requested)
                .ok_or_else(|| BodyError::NoWriter {
                    media_type: requested.to_string(),
                })?;
        writer.write_to(value, &concrete, out)?;
        Ok(concrete)
    }
}
