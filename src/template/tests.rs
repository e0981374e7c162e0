use super::*;
use std::cmp::Ordering;

fn t(s: &str) -> PathTemplate {
    PathTemplate::new(s).unwrap()
}

#[test]
fn test_normalizes_slashes() {
    assert_eq!(t("widgets/").value(), "/widgets");
    assert_eq!(t("/").value(), "/");
    assert_eq!(t("").value(), "/");
}

#[test]
fn test_exact_match_has_no_remaining() {
    let mut values = PathValues::new();
    assert!(t("/widgets").match_path("/widgets", &mut values));
    assert_eq!(values.remaining(), None);
    assert!(values.is_final());
    assert_eq!(values.current_path(), "/");
}

#[test]
fn test_prefix_match_keeps_final_group() {
    let mut values = PathValues::new();
    assert!(t("/widgets").match_path("/widgets/7/parts", &mut values));
    assert_eq!(values.remaining(), Some("/7/parts"));
    assert!(!values.is_final());
}

#[test]
fn test_no_partial_segment_match() {
    let mut values = PathValues::new();
    assert!(!t("/widgets").match_path("/widgetsX", &mut values));
    assert_eq!(values, PathValues::new());
}

#[test]
fn test_variables_extracted() {
    let mut values = PathValues::new();
    assert!(t("/orgs/{org}/users/{id}").match_path("/orgs/acme/users/42", &mut values));
    assert_eq!(values.get("org"), Some("acme"));
    assert_eq!(values.get("id"), Some("42"));
}

#[test]
fn test_repeated_variable_keeps_all_values() {
    let mut values = PathValues::new();
    assert!(t("/a/{id}/b/{id}").match_path("/a/1/b/2", &mut values));
    assert_eq!(values.get_all("id"), &["1".to_string(), "2".to_string()]);
    assert_eq!(values.get("id"), Some("2"));
}

#[test]
fn test_custom_regex_variable() {
    let tpl = t(r"/files/{path: .+}");
    assert_eq!(tpl.custom_variables(), &["path".to_string()]);
    let mut values = PathValues::new();
    assert!(tpl.match_path("/files/a/b.txt", &mut values));
    assert_eq!(values.get("path"), Some("a/b.txt"));
}

#[test]
fn test_custom_regex_with_braces() {
    let tpl = t(r"/codes/{code: \d{3}}");
    let mut values = PathValues::new();
    assert!(tpl.match_path("/codes/404", &mut values));
    assert!(!tpl.match_path("/codes/40", &mut PathValues::new()));
}

#[test]
fn test_root_template_matches_everything() {
    let root = PathTemplate::root();
    assert_eq!(root, t("/"));
    let mut values = PathValues::new();
    assert!(root.match_path("/anything/here", &mut values));
    assert_eq!(values.remaining(), Some("/anything/here"));
    assert!(root.match_path("", &mut PathValues::new()));
}

#[test]
fn test_template_errors() {
    assert!(matches!(
        PathTemplate::new("/a/{id"),
        Err(TemplateError::UnterminatedVariable(_))
    ));
    assert!(matches!(
        PathTemplate::new("/a/{ }"),
        Err(TemplateError::EmptyVariableName(_))
    ));
    assert!(matches!(
        PathTemplate::new("/a/{id: [}"),
        Err(TemplateError::InvalidRegex { .. })
    ));
}

#[test]
fn test_more_literals_more_specific() {
    assert_eq!(
        t("/widgets/special").compare_specificity(&t("/widgets/{id}")),
        Ordering::Less
    );
}

#[test]
fn test_fewer_variables_more_specific() {
    // equal literal length: "/ab/" vs "/a/b/"
    let few = t("/ab/{x}");
    let many = t("/a/{x}/{y}");
    assert_eq!(few.literal_chars().len(), 4);
    assert_eq!(many.literal_chars().len(), 4);
    assert_eq!(few.compare_specificity(&many), Ordering::Less);
}

#[test]
fn test_custom_regex_breaks_tie() {
    assert_eq!(
        t(r"/a/{id: \d+}").compare_specificity(&t("/a/{id}")),
        Ordering::Less
    );
}
