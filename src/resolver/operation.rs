use super::allow::{allowed_methods, match_http_method, method_rank};
use super::error::ResolveError;
use super::resource::MatchCandidate;
use crate::config::ResolverConfig;
use crate::context::{RequestContext, ResolutionFrame};
use crate::media::{
    compare_intersected, compare_media_types, compare_sorted_lists, compatible_types,
    intersect_sorted, intersects, negotiate_response_type, MediaType, SubtypeCheck,
};
use crate::registry::{OperationDescriptor, OperationMethod, ResourceDescriptor};
use crate::template::PathValues;
use http::Method;
use std::cmp::Ordering;
use std::slice;
use tracing::{debug, info, warn};

/// Per-call switches for [`find_target_method`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOptions {
    pub keep_subresource_candidates: bool,
    pub subtype_check: SubtypeCheck,
    pub record: bool,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self::from(&ResolverConfig::default())
    }
}

impl From<&ResolverConfig> for SelectOptions {
    fn from(config: &ResolverConfig) -> Self {
        Self {
            keep_subresource_candidates: config.keep_subresource_candidates,
            subtype_check: config.subtype_check(),
            record: config.record_resolution_stack,
        }
    }
}

/// The operation picked for a request.
#[derive(Debug, Clone)]
pub struct Selection<'r> {
    pub resource: &'r ResourceDescriptor,
    pub operation: &'r OperationDescriptor,
    /// Resource and operation variables, plus the path left for a locator.
    pub values: PathValues,
    /// Negotiated response type; `None` for locators.
    pub response_type: Option<MediaType>,
}

impl Selection<'_> {
    /// `true` when a `HEAD` request is being served by a `GET` operation.
    #[must_use]
    pub fn is_head_via_get(&self, request: &Method) -> bool {
        *request == Method::HEAD
            && matches!(self.operation.method(), Some(OperationMethod::Http(m)) if *m == Method::GET)
    }
}

struct Ranked<'r, 'c> {
    resource: &'r ResourceDescriptor,
    base: &'c PathValues,
    operation: &'r OperationDescriptor,
    values: PathValues,
    method_rank: u8,
    consumes: Vec<MediaType>,
    produces: Vec<MediaType>,
}

/// Pick the single best operation among `candidates`.
///
/// Each candidate's operations are matched against the path its resource
/// left over. Locators always qualify. Terminal operations must match the
/// whole remaining path, then the method, then (unless the method is `GET`
/// or `HEAD`) the request content type, then at least one accepted type.
///
/// Survivors are ranked by method exactness, consumes specificity, produces
/// specificity against `accept`, template specificity, terminal before
/// locator, and finally registration order. When nothing survives, the
/// first gate nobody passed decides the status: path (404), method (405),
/// content type (415), otherwise 406.
///
/// # Errors
///
/// Returns the classified [`ResolveError`] when no operation qualifies.
pub fn find_target_method<'r, 'c>(
    candidates: &'c [MatchCandidate<'r>],
    ctx: &mut RequestContext,
    method: &Method,
    content_type: &MediaType,
    accept: &[MediaType],
    options: &SelectOptions,
) -> Result<Selection<'r>, ResolveError> {
    let check = options.subtype_check;
    let bodyless = *method == Method::GET || *method == Method::HEAD;
    let request_type = slice::from_ref(content_type);

    let mut path_matched = 0usize;
    let mut method_matched = 0usize;
    let mut consume_matched = 0usize;
    let mut terminal_added = false;
    let mut final_locators: Vec<usize> = Vec::new();
    let mut ranked: Vec<Ranked<'r, 'c>> = Vec::new();

    for candidate in candidates {
        let current = candidate.values.current_path();
        for op in candidate.resource.operations() {
            let mut values = candidate.values.clone();
            if !op.template().match_path(current, &mut values) {
                continue;
            }
            let is_final = values.is_final();

            if let Some(declared) = op.method() {
                if !is_final {
                    continue;
                }
                path_matched += 1;

                if match_http_method(declared, method).is_none() {
                    debug!(operation = %op.name(), declared = %declared, method = %method, "Method mismatch");
                    continue;
                }
                method_matched += 1;

                if !bodyless && !intersects(op.consumes(), request_type, check) {
                    debug!(operation = %op.name(), content_type = %content_type, "Consumes mismatch");
                    continue;
                }
                consume_matched += 1;

                if !accept
                    .iter()
                    .any(|a| intersects(slice::from_ref(a), op.produces(), check))
                {
                    debug!(operation = %op.name(), "Produces mismatch");
                    continue;
                }
                terminal_added = true;
            } else if is_final {
                final_locators.push(ranked.len());
            }

            ranked.push(Ranked {
                resource: candidate.resource,
                base: &candidate.values,
                operation: op,
                values,
                method_rank: method_rank(op, method),
                consumes: if bodyless {
                    Vec::new()
                } else {
                    compatible_types(op.consumes(), content_type, check)
                },
                produces: intersect_sorted(op.produces(), accept, true, check),
            });
        }
    }

    // Dead-end locators never shadow a terminal match.
    if terminal_added && !options.keep_subresource_candidates && !final_locators.is_empty() {
        let mut index = 0;
        ranked.retain(|_| {
            let keep = !final_locators.contains(&index);
            index += 1;
            keep
        });
    }

    ranked.sort_by(compare_ranked);

    let Some(best) = ranked.into_iter().next() else {
        return Err(classify(
            candidates,
            method,
            content_type,
            accept,
            path_matched,
            method_matched,
            consume_matched,
        ));
    };

    let response_type = if best.operation.is_locator() {
        None
    } else {
        negotiate_response_type(accept, best.operation.produces(), check)
    };

    let selection = Selection {
        resource: best.resource,
        operation: best.operation,
        values: best.values,
        response_type,
    };

    if selection.is_head_via_get(method) {
        // RT3: HEAD served by GET
        info!(
            resource = %selection.resource.name(),
            operation = %selection.operation.name(),
            "GET operation used for HEAD request"
        );
    }
    // RT2: Operation selected
    info!(
        resource = %selection.resource.name(),
        operation = %selection.operation.name(),
        locator = selection.operation.is_locator(),
        response_type = ?selection.response_type.as_ref().map(ToString::to_string),
        "Operation selected"
    );

    if options.record {
        ctx.push_frame(frame(&selection, best.base));
    }
    Ok(selection)
}

fn compare_ranked(a: &Ranked<'_, '_>, b: &Ranked<'_, '_>) -> Ordering {
    a.method_rank
        .cmp(&b.method_rank)
        .then_with(|| {
            compare_sorted_lists(&a.consumes, &b.consumes, |x, y| compare_media_types(x, y, None))
        })
        .then_with(|| {
            compare_sorted_lists(&a.produces, &b.produces, |x, y| compare_intersected(x, y, true))
        })
        .then_with(|| a.operation.template().compare_specificity(b.operation.template()))
        .then_with(|| a.operation.is_locator().cmp(&b.operation.is_locator()))
}

fn frame(selection: &Selection<'_>, base: &PathValues) -> ResolutionFrame {
    let resource_values = selection
        .resource
        .template()
        .variables()
        .iter()
        .filter_map(|name| base.get(name));
    let operation_values = selection
        .operation
        .template()
        .variables()
        .iter()
        .filter_map(|name| selection.values.get(name));

    ResolutionFrame {
        resource: selection.resource.id(),
        resource_name: selection.resource.name().to_string(),
        operation: selection.operation.name().to_string(),
        template_values: resource_values
            .chain(operation_values)
            .map(str::to_string)
            .collect(),
    }
}

fn classify(
    candidates: &[MatchCandidate<'_>],
    method: &Method,
    content_type: &MediaType,
    accept: &[MediaType],
    path_matched: usize,
    method_matched: usize,
    consume_matched: usize,
) -> ResolveError {
    let path = candidates
        .first()
        .map(|c| c.values.current_path().to_string())
        .unwrap_or_default();

    let error = if path_matched == 0 {
        ResolveError::NotFound { path }
    } else if method_matched == 0 {
        ResolveError::MethodNotAllowed {
            method: method.clone(),
            path,
            allowed: allowed_methods(candidates),
        }
    } else if consume_matched == 0 {
        ResolveError::UnsupportedMediaType {
            content_type: content_type.to_string(),
        }
    } else {
        ResolveError::NotAcceptable {
            accept: accept
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        }
    };

    // RT4: No operation matched
    if *method == Method::OPTIONS {
        debug!(method = %method, status = error.status().as_u16(), "No operation matched OPTIONS request");
    } else {
        warn!(
            method = %method,
            status = error.status().as_u16(),
            path_matched,
            method_matched,
            consume_matched,
            error = %error,
            "No operation matched"
        );
    }
    error
}
