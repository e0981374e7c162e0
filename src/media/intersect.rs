//! Media-type intersection.
//!
//! Intersecting a *required* list (what a client asks for, or what an
//! operation declares) with an *offered* list yields the concrete types both
//! sides can live with. Wildcards on the required side are filled in from the
//! offered side, and the number of wildcards that had to be filled is kept as
//! a distance so that `text/*` matching `text/plain` ranks below an exact hit.

use super::core::{
    compare_media_types, compare_quality, strip_quotes, MediaParams, MediaType, Quality,
    SubtypeCheck, CHARSET_PARAM, DISTANCE_PARAM, Q_PARAM, QS_PARAM,
};
use std::cmp::Ordering;
use std::ops::ControlFlow;

/// Knobs for [`intersect`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntersectOptions {
    /// Copy parameters of the required type that the offered type lacks.
    pub merge_params: bool,
    /// Record the wildcard distance as a `d` parameter on each result.
    pub track_distance: bool,
    /// Composite subtype handling.
    pub subtype_check: SubtypeCheck,
}

impl IntersectOptions {
    #[must_use]
    pub fn merged() -> Self {
        Self {
            merge_params: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_distance(mut self) -> Self {
        self.track_distance = true;
        self
    }

    #[must_use]
    pub fn with_subtype_check(mut self, check: SubtypeCheck) -> Self {
        self.subtype_check = check;
        self
    }
}

/// Visit every compatible (required, offered) pair whose parameters agree,
/// in required-major order. The visitor may stop the walk early.
fn walk<'a>(
    required: &'a [MediaType],
    offered: &'a [MediaType],
    check: SubtypeCheck,
    mut visit: impl FnMut(&'a MediaType, &'a MediaType) -> ControlFlow<()>,
) {
    for req in required {
        for off in offered {
            let compatible = req.is_compatible(off)
                || (req.main_type() == off.main_type()
                    && req.is_compatible_with(off, check));
            if !compatible || !params_agree(req, off) {
                continue;
            }
            if visit(req, off).is_break() {
                return;
            }
        }
    }
}

/// Every parameter the offered side declares must carry the same value on
/// the required side when the required side declares it too. Quality and
/// distance markers never take part.
fn params_agree(required: &MediaType, offered: &MediaType) -> bool {
    offered.params().iter().all(|(name, value)| {
        if matches!(name.as_str(), Q_PARAM | QS_PARAM | DISTANCE_PARAM) {
            return true;
        }
        match required.param(name) {
            None => true,
            Some(req_value) => {
                let (a, b) = (strip_quotes(req_value), strip_quotes(value));
                a == b || (name == CHARSET_PARAM && a.eq_ignore_ascii_case(b))
            }
        }
    })
}

/// Build the accumulated type for one compatible pair.
fn merge(required: &MediaType, offered: &MediaType, opts: IntersectOptions) -> MediaType {
    let type_wild = required.is_wildcard_type();
    // only a leading `*` (`*`, `*+xml`) defers to the offered subtype
    let subtype_wild = required.subtype().starts_with('*');

    let main_type = if type_wild {
        offered.main_type()
    } else {
        required.main_type()
    };
    let subtype = if subtype_wild {
        offered.subtype()
    } else {
        required.subtype()
    };

    let mut params: MediaParams = offered
        .params()
        .iter()
        .filter(|(k, _)| !(opts.track_distance && k == DISTANCE_PARAM))
        .cloned()
        .collect();
    if opts.merge_params {
        for (k, v) in required.params() {
            if !params.iter().any(|(existing, _)| existing == k) {
                params.push((k.clone(), v.clone()));
            }
        }
    }
    if opts.track_distance {
        let distance = u32::from(type_wild) + u32::from(subtype_wild);
        params.retain(|(k, _)| k != DISTANCE_PARAM);
        params.push((DISTANCE_PARAM.to_string(), distance.to_string()));
    }

    MediaType::from_parts(main_type.to_string(), subtype.to_string(), params)
}

/// Intersect `required` with `offered`, accumulating every distinct result
/// in first-seen order.
#[must_use]
pub fn intersect(
    required: &[MediaType],
    offered: &[MediaType],
    opts: IntersectOptions,
) -> Vec<MediaType> {
    let mut out: Vec<MediaType> = Vec::new();
    walk(required, offered, opts.subtype_check, |req, off| {
        let merged = merge(req, off, opts);
        if !out.contains(&merged) {
            out.push(merged);
        }
        ControlFlow::Continue(())
    });
    out
}

/// `true` as soon as one compatible pair is found.
#[must_use]
pub fn intersects(required: &[MediaType], offered: &[MediaType], check: SubtypeCheck) -> bool {
    let mut found = false;
    walk(required, offered, check, |_, _| {
        found = true;
        ControlFlow::Break(())
    });
    found
}

/// Ordering applied to intersection results: specificity, then `q`, then
/// `qs`, then (optionally) the recorded distance.
#[must_use]
pub fn compare_intersected(a: &MediaType, b: &MediaType, check_distance: bool) -> Ordering {
    compare_media_types(a, b, None)
        .then_with(|| compare_quality(a, b, Quality::Client))
        .then_with(|| compare_quality(a, b, Quality::Server))
        .then_with(|| {
            if check_distance {
                a.distance().cmp(&b.distance())
            } else {
                Ordering::Equal
            }
        })
}

/// Intersect with parameter merging and sort the result best-first.
#[must_use]
pub fn intersect_sorted(
    required: &[MediaType],
    offered: &[MediaType],
    check_distance: bool,
    check: SubtypeCheck,
) -> Vec<MediaType> {
    let opts = IntersectOptions {
        merge_params: true,
        track_distance: check_distance,
        subtype_check: check,
    };
    let mut out = intersect(required, offered, opts);
    out.sort_by(|a, b| compare_intersected(a, b, check_distance));
    out
}

/// Pick the response media type for `accept` against an operation's
/// `produces`: the best intersection with quality markers stripped.
/// A wildcard result is returned as-is for the writer to settle.
#[must_use]
pub fn negotiate_response_type(
    accept: &[MediaType],
    produces: &[MediaType],
    check: SubtypeCheck,
) -> Option<MediaType> {
    intersect_sorted(accept, produces, false, check)
        .into_iter()
        .next()
        .map(|mt| mt.without_params(&[Q_PARAM, QS_PARAM]))
}

/// Members of `declared` compatible with `request`, or `declared` itself
/// when it has a single entry.
#[must_use]
pub fn compatible_types(
    declared: &[MediaType],
    request: &MediaType,
    check: SubtypeCheck,
) -> Vec<MediaType> {
    if declared.len() == 1 {
        return declared.to_vec();
    }
    declared
        .iter()
        .filter(|mt| mt.is_compatible_with(request, check))
        .cloned()
        .collect()
}

/// Pairwise comparison of two best-first lists. When every shared position
/// ties the shorter list wins, and equal-length lists rank the first one
/// ahead so that registration order decides.
#[must_use]
pub fn compare_sorted_lists(
    a: &[MediaType],
    b: &[MediaType],
    cmp: impl Fn(&MediaType, &MediaType) -> Ordering,
) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| cmp(x, y))
        .find(|o| o.is_ne())
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

/// Rank two operations' `consumes` lists against the request content type.
#[must_use]
pub fn compare_sorted_consumes(
    a: &[MediaType],
    b: &[MediaType],
    request: &MediaType,
    check: SubtypeCheck,
) -> Ordering {
    let a = compatible_types(a, request, check);
    let b = compatible_types(b, request, check);
    compare_sorted_lists(&a, &b, |x, y| compare_media_types(x, y, None))
}

/// Rank two operations' `produces` lists against the accepted types.
#[must_use]
pub fn compare_sorted_accept(
    a: &[MediaType],
    b: &[MediaType],
    accept: &[MediaType],
    check: SubtypeCheck,
) -> Ordering {
    let a = intersect_sorted(a, accept, true, check);
    let b = intersect_sorted(b, accept, true, check);
    compare_sorted_lists(&a, &b, |x, y| compare_intersected(x, y, true))
}
