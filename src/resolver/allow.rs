use super::resource::MatchCandidate;
use crate::registry::{OperationDescriptor, OperationMethod};
use http::Method;
use std::collections::BTreeSet;

/// How a declared operation method matched the request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MethodMatch {
    /// Same method, or a `*` request asking what exists.
    Exact,
    /// `HEAD` request served by a `GET` operation.
    HeadViaGet,
    /// Method-agnostic operation.
    Any,
}

/// Match a declared operation method against the request method.
#[must_use]
pub fn match_http_method(declared: &OperationMethod, request: &Method) -> Option<MethodMatch> {
    if request.as_str() == "*" {
        return Some(MethodMatch::Exact);
    }
    match declared {
        OperationMethod::Any => Some(MethodMatch::Any),
        OperationMethod::Http(m) if m.as_str().eq_ignore_ascii_case(request.as_str()) => {
            Some(MethodMatch::Exact)
        }
        OperationMethod::Http(m) if *m == Method::GET && *request == Method::HEAD => {
            Some(MethodMatch::HeadViaGet)
        }
        OperationMethod::Http(_) => None,
    }
}

/// Ranking key for the method axis: lower wins.
///
/// Only an exact match outranks a fallback. For `HEAD` requests that means
/// an explicit `HEAD` operation beats everything else; for other methods a
/// method-agnostic operation loses to an exact one. Locators are neutral.
pub(crate) fn method_rank(op: &OperationDescriptor, request: &Method) -> u8 {
    match op.method() {
        None if *request == Method::HEAD => 1,
        None => 0,
        Some(declared) => match match_http_method(declared, request) {
            Some(MethodMatch::Exact) => 0,
            Some(MethodMatch::HeadViaGet | MethodMatch::Any) => 1,
            None => 2,
        },
    }
}

/// Methods that would match somewhere on the candidates' paths, in
/// alphabetical order.
///
/// Terminal operations whose template consumes the rest of the path
/// contribute their method. A resource reached through a locator
/// contributes every declared method and ends the enumeration. `OPTIONS`
/// is always present and `HEAD` is added whenever `GET` is.
#[must_use]
pub fn allowed_methods(candidates: &[MatchCandidate<'_>]) -> Vec<Method> {
    let mut methods: BTreeSet<String> = BTreeSet::new();

    for candidate in candidates {
        let declared = candidate
            .resource
            .operations()
            .iter()
            .filter_map(|op| op.method().and_then(OperationMethod::http).map(|m| (op, m)));

        if candidate.located {
            methods.extend(declared.map(|(_, m)| m.to_string()));
            break;
        }
        for (op, m) in declared {
            if op.matches_finally(&candidate.values) {
                methods.insert(m.to_string());
            }
        }
    }

    if methods.contains("GET") {
        methods.insert("HEAD".to_string());
    }
    methods.insert("OPTIONS".to_string());

    methods
        .into_iter()
        .filter_map(|m| Method::from_bytes(m.as_bytes()).ok())
        .collect()
}
