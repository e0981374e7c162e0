use brrtresolver::media::{
    compare_specificity, intersect, negotiate_response_type, parse_media_types, sort_media_types,
    IntersectOptions, MediaType, Quality, SubtypeCheck,
};
use std::cmp::Ordering;

fn mt(s: &str) -> MediaType {
    s.parse().unwrap()
}

fn list(s: &str) -> Vec<MediaType> {
    parse_media_types(Some(s)).unwrap()
}

#[test]
fn test_equal_concrete_types_are_compatible_and_equally_specific() {
    for raw in ["application/json", "text/plain", "image/png", "application/vnd.acme+json"] {
        let (a, b) = (mt(raw), mt(&raw.to_uppercase()));
        assert!(a.is_compatible(&b), "{raw}");
        assert_eq!(compare_specificity(&a, &b), Ordering::Equal, "{raw}");
    }
}

#[test]
fn test_wildcard_is_compatible_with_everything() {
    let any = MediaType::wildcard();
    for raw in ["application/json", "text/*", "*/*", "image/svg+xml;charset=utf-8"] {
        assert!(any.is_compatible(&mt(raw)), "{raw}");
    }
}

#[test]
fn test_intersection_carries_merged_quality() {
    let out = intersect(
        &list("application/json;q=0.5"),
        &list("application/json, text/plain"),
        IntersectOptions::merged(),
    );
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].essence(), "application/json");
    assert!((out[0].quality(Quality::Client) - 0.5).abs() < f32::EPSILON);
}

#[test]
fn test_accept_header_sorting() {
    let mut accept = list("text/*;q=0.3, text/html;q=0.7, text/html;level=1, */*;q=0.5");
    sort_media_types(&mut accept, Some(Quality::Client));
    let order: Vec<String> = accept.iter().map(ToString::to_string).collect();
    assert_eq!(order[0], "text/html;level=1");
    assert_eq!(order[1], "text/html;q=0.7");
    assert_eq!(order.last().map(String::as_str), Some("*/*;q=0.5"));
}

#[test]
fn test_missing_accept_means_anything() {
    assert_eq!(parse_media_types(None).unwrap(), vec![MediaType::wildcard()]);
    assert_eq!(parse_media_types(Some("  ")).unwrap(), vec![MediaType::wildcard()]);
    assert_eq!(list("*"), vec![MediaType::wildcard()]);
}

#[test]
fn test_quoted_parameters_compare_unquoted() {
    let out = intersect(
        &list(r#"text/plain;charset="UTF-8""#),
        &list("text/plain;charset=utf-8"),
        IntersectOptions::default(),
    );
    assert_eq!(out.len(), 1);
}

#[test]
fn test_negotiated_type_is_declared() {
    let mut produces = list("application/json;qs=0.9, application/xml;qs=0.5, text/plain");
    sort_media_types(&mut produces, Some(Quality::Server));
    for accept in ["*/*", "application/*", "text/*, application/xml;q=0.1", "application/xml"] {
        let chosen = negotiate_response_type(&list(accept), &produces, SubtypeCheck::Strict).unwrap();
        assert!(
            produces.iter().any(|p| p.essence() == chosen.essence()),
            "{accept} -> {chosen}"
        );
        assert!(chosen.param("q").is_none() && chosen.param("qs").is_none());
    }
}

#[test]
fn test_partial_subtype_check() {
    let xml = mt("application/xml");
    let vendor = mt("application/vnd.acme+xml");
    assert!(!xml.is_compatible_with(&vendor, SubtypeCheck::Strict));
    assert!(xml.is_compatible_with(&vendor, SubtypeCheck::Partial));
}
