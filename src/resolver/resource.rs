use super::allow::match_http_method;
use crate::context::RequestContext;
use crate::registry::ResourceDescriptor;
use crate::template::PathValues;
use std::cmp::Ordering;
use tracing::debug;

/// A resource whose template matched the request path, with the variables
/// it bound and the path it left over.
#[derive(Debug, Clone)]
pub struct MatchCandidate<'r> {
    pub resource: &'r ResourceDescriptor,
    pub values: PathValues,
    /// Reached through a sub-resource locator rather than by path.
    pub located: bool,
}

impl<'r> MatchCandidate<'r> {
    pub fn new(resource: &'r ResourceDescriptor, values: PathValues) -> Self {
        Self {
            resource,
            values,
            located: false,
        }
    }
}

/// Tie-break between resources whose templates are equally specific.
///
/// `Less` ranks `a` first. Implementations must be consistent (a total
/// preorder) since they drive a sort.
pub trait ResourceComparator: Send + Sync {
    fn compare(&self, a: &MatchCandidate<'_>, b: &MatchCandidate<'_>, ctx: &RequestContext)
        -> Ordering;
}

/// Keeps registration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistrationOrder;

impl ResourceComparator for RegistrationOrder {
    fn compare(&self, _: &MatchCandidate<'_>, _: &MatchCandidate<'_>, _: &RequestContext) -> Ordering {
        Ordering::Equal
    }
}

/// Ranks first the resources that have an operation finishing the path
/// with a method compatible with the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferMethodCompatible;

impl PreferMethodCompatible {
    fn serves(candidate: &MatchCandidate<'_>, ctx: &RequestContext) -> bool {
        candidate.resource.operations().iter().any(|op| {
            op.method()
                .is_some_and(|m| match_http_method(m, ctx.method()).is_some())
                && op.matches_finally(&candidate.values)
        })
    }
}

impl ResourceComparator for PreferMethodCompatible {
    fn compare(&self, a: &MatchCandidate<'_>, b: &MatchCandidate<'_>, ctx: &RequestContext) -> Ordering {
        Self::serves(b, ctx).cmp(&Self::serves(a, ctx))
    }
}

/// Match `path` against `resources` and keep the most specific matches.
///
/// With a single resource the result is that resource or nothing. With
/// several, matches are sorted by template specificity, then by
/// `comparator`, then by registration order, and every match whose template
/// ties with the best one is returned. An empty result means 404.
pub fn select_resource_class<'r, I>(
    resources: I,
    path: &str,
    ctx: &RequestContext,
    comparator: &dyn ResourceComparator,
) -> Vec<MatchCandidate<'r>>
where
    I: IntoIterator<Item = &'r ResourceDescriptor>,
{
    let resources: Vec<&'r ResourceDescriptor> = resources.into_iter().collect();

    if let [only] = resources.as_slice() {
        let only: &'r ResourceDescriptor = *only;
        let mut values = PathValues::new();
        return if only.template().match_path(path, &mut values) {
            vec![MatchCandidate::new(only, values)]
        } else {
            Vec::new()
        };
    }

    let mut matched: Vec<MatchCandidate<'r>> = resources
        .into_iter()
        .filter_map(|resource| {
            let mut values = PathValues::new();
            resource
                .template()
                .match_path(path, &mut values)
                .then(|| MatchCandidate::new(resource, values))
        })
        .collect();

    matched.sort_by(|a, b| {
        a.resource
            .template()
            .compare_specificity(b.resource.template())
            .then_with(|| comparator.compare(a, b, ctx))
    });

    if let Some(best) = matched.first().map(|c| c.resource.template().clone()) {
        matched.retain(|c| c.resource.template().compare_specificity(&best) == Ordering::Equal);
    }

    debug!(
        path = %path,
        candidates = matched.len(),
        resources = ?matched.iter().map(|c| c.resource.name()).collect::<Vec<_>>(),
        "Resource candidates selected"
    );
    matched
}
