use super::*;
use crate::context::RequestContext;
use crate::registry::{
    ContextKind, OperationSpec, ParamBinding, ParamKind, Registry, RegistryBuilder, ResourceSpec,
    TargetType,
};
use crate::template::PathValues;
use http::{Method, StatusCode};
use serde_json::{json, Value};
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn registry(op: OperationSpec) -> Registry {
    RegistryBuilder::new()
        .resource(ResourceSpec::root("r", "/r").operation(op))
        .build()
        .unwrap()
}

fn process(op: OperationSpec, values: &PathValues, ctx: &mut RequestContext) -> Result<Vec<Value>, ParamError> {
    let registry = registry(op);
    let codecs = BodyCodecs::with_defaults();
    let extractor = ParamExtractor {
        converter: &JsonConverter,
        codecs: &codecs,
        default_content_type: None,
    };
    let operation = &registry.resources()[0].operations()[0];
    extractor.process_parameters(operation, values, ctx)
}

fn values(pairs: &[(&str, &str)]) -> PathValues {
    let mut v = PathValues::new();
    for (k, val) in pairs {
        v.add(k, val);
    }
    v
}

#[test]
fn test_path_query_header_cookie() {
    let op = OperationSpec::get("op")
        .param(ParamBinding::path("id", TargetType::Integer))
        .param(ParamBinding::query("tags", TargetType::List(Box::new(TargetType::String))))
        .param(ParamBinding::header("X-Trace", TargetType::String))
        .param(ParamBinding::cookie("session", TargetType::String));
    let mut ctx = RequestContext::new(Method::GET, "/r/7?tags=a&tags=b%20c")
        .with_header("x-trace", "t1")
        .with_header("Cookie", "session=s1");

    let args = process(op, &values(&[("id", "7")]), &mut ctx).unwrap();
    assert_eq!(args, vec![json!(7), json!(["a", "b c"]), json!("t1"), json!("s1")]);
}

#[test]
fn test_defaults_and_missing() {
    let op = OperationSpec::get("op")
        .param(ParamBinding::query("limit", TargetType::Integer).with_default("10"))
        .param(ParamBinding::query("offset", TargetType::Integer))
        .param(ParamBinding::cookie("theme", TargetType::String).with_default("light"));
    let mut ctx = RequestContext::new(Method::GET, "/r");

    let args = process(op, &PathValues::new(), &mut ctx).unwrap();
    assert_eq!(args, vec![json!(10), Value::Null, json!("light")]);
}

#[test]
fn test_encoded_binding_keeps_raw_value() {
    let op = OperationSpec::get("op")
        .param(ParamBinding::query("q", TargetType::String).encoded())
        .param(ParamBinding::query("q", TargetType::String))
        .param(ParamBinding::path("p", TargetType::String).encoded());
    let mut ctx = RequestContext::new(Method::GET, "/r?q=a%2Fb+c");

    let args = process(op, &values(&[("p", "x%20y")]), &mut ctx).unwrap();
    assert_eq!(args, vec![json!("a%2Fb+c"), json!("a/b c"), json!("x%20y")]);
}

#[test]
fn test_matrix_params() {
    let op = OperationSpec::get("op").param(ParamBinding::matrix("color", TargetType::String));
    let mut ctx = RequestContext::new(Method::GET, "/r;color=r%C3%A9d");
    let args = process(op, &PathValues::new(), &mut ctx).unwrap();
    assert_eq!(args, vec![json!("réd")]);
}

#[test]
fn test_nameless_bindings_receive_maps() {
    let op = OperationSpec::get("op")
        .param(ParamBinding::new(ParamKind::Query, None, TargetType::Object))
        .param(ParamBinding::new(ParamKind::Path, None, TargetType::Object));
    let mut ctx = RequestContext::new(Method::GET, "/r?a=1&a=2&b=x");
    let args = process(op, &values(&[("id", "7")]), &mut ctx).unwrap();
    assert_eq!(args[0], json!({"a": ["1", "2"], "b": ["x"]}));
    assert_eq!(args[1], json!({"id": ["7"]}));
}

#[test]
fn test_repeated_path_variable_binds_last() {
    let op = OperationSpec::get("op")
        .param(ParamBinding::path("id", TargetType::Integer))
        .param(ParamBinding::path("id", TargetType::List(Box::new(TargetType::Integer))));
    let mut ctx = RequestContext::new(Method::GET, "/r");
    let args = process(op, &values(&[("id", "1"), ("id", "2")]), &mut ctx).unwrap();
    assert_eq!(args, vec![json!(2), json!([1, 2])]);
}

#[test]
fn test_conversion_failure_status_by_kind() {
    let op = OperationSpec::get("op").param(ParamBinding::path("id", TargetType::Integer));
    let err = process(op, &values(&[("id", "abc")]), &mut RequestContext::new(Method::GET, "/r"))
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);

    let op = OperationSpec::get("op").param(ParamBinding::header("X-Count", TargetType::Integer));
    let mut ctx = RequestContext::new(Method::GET, "/r").with_header("X-Count", "many");
    let err = process(op, &PathValues::new(), &mut ctx).unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert!(matches!(err, ParamError::Conversion { kind: ParamKind::Header, .. }));
}

#[test]
fn test_json_body() {
    let op = OperationSpec::post("op").param(ParamBinding::body(TargetType::Object));
    let mut ctx = RequestContext::new(Method::POST, "/r")
        .with_header("Content-Type", "application/json")
        .with_body(r#"{"name":"w"}"#);
    let args = process(op, &PathValues::new(), &mut ctx).unwrap();
    assert_eq!(args, vec![json!({"name": "w"})]);
}

#[test]
fn test_empty_body_is_null_however_delivered() {
    let op = || OperationSpec::post("op").param(ParamBinding::body(TargetType::Object));
    let json_post = || {
        RequestContext::new(Method::POST, "/r").with_header("Content-Type", "application/json")
    };

    let mut buffered = json_post().with_body(Vec::new());
    assert_eq!(process(op(), &PathValues::new(), &mut buffered).unwrap(), vec![Value::Null]);

    let mut streamed = json_post().with_body_reader(std::io::empty());
    assert_eq!(process(op(), &PathValues::new(), &mut streamed).unwrap(), vec![Value::Null]);

    let mut streamed = json_post().with_body_reader(Cursor::new(br#"{"n":1}"#.to_vec()));
    assert_eq!(process(op(), &PathValues::new(), &mut streamed).unwrap(), vec![json!({"n": 1})]);
}

#[test]
fn test_malformed_content_type_is_400() {
    let op = OperationSpec::post("op").param(ParamBinding::body(TargetType::Object));
    let mut ctx = RequestContext::new(Method::POST, "/r")
        .with_header("Content-Type", "json")
        .with_body("{}");
    let err = process(op, &PathValues::new(), &mut ctx).unwrap_err();
    assert!(matches!(err, ParamError::InvalidContentType(_)));
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_body_without_reader_is_415() {
    let op = OperationSpec::post("op").param(ParamBinding::body(TargetType::Object));
    let mut ctx = RequestContext::new(Method::POST, "/r")
        .with_header("Content-Type", "image/png")
        .with_body(vec![1, 2, 3]);
    let err = process(op, &PathValues::new(), &mut ctx).unwrap_err();
    assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[test]
fn test_malformed_body_is_400() {
    let op = OperationSpec::post("op").param(ParamBinding::body(TargetType::Object));
    let mut ctx = RequestContext::new(Method::POST, "/r")
        .with_header("Content-Type", "application/json")
        .with_body("{nope");
    let err = process(op, &PathValues::new(), &mut ctx).unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

/// Reader that counts how many times it was read to completion.
struct CountingReader {
    inner: Cursor<Vec<u8>>,
    reads: Arc<AtomicUsize>,
}

impl Read for CountingReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 {
            self.reads.fetch_add(1, Ordering::SeqCst);
        }
        Ok(n)
    }
}

#[test]
fn test_form_body_read_once_and_shared() {
    let reads = Arc::new(AtomicUsize::new(0));
    let op = OperationSpec::post("op")
        .param(ParamBinding::form("a", TargetType::String))
        .param(ParamBinding::body(TargetType::Object))
        .param(ParamBinding::form("b", TargetType::Integer))
        .param(ParamBinding::new(ParamKind::Form, None, TargetType::Object));
    let mut ctx = RequestContext::new(Method::POST, "/r")
        .with_header("Content-Type", "application/x-www-form-urlencoded")
        .with_body_reader(CountingReader {
            inner: Cursor::new(b"a=hello+world&b=3".to_vec()),
            reads: Arc::clone(&reads),
        });

    let args = process(op, &PathValues::new(), &mut ctx).unwrap();
    assert_eq!(args[0], json!("hello world"));
    assert_eq!(args[1], json!({"a": ["hello world"], "b": ["3"]}));
    assert_eq!(args[2], json!(3));
    assert_eq!(args[3], json!({"a": ["hello world"], "b": ["3"]}));
    assert_eq!(reads.load(Ordering::SeqCst), 1);
}

#[test]
fn test_form_params_reject_other_content_types() {
    let op = OperationSpec::post("op").param(ParamBinding::form("a", TargetType::String));
    let mut ctx = RequestContext::new(Method::POST, "/r")
        .with_header("Content-Type", "multipart/form-data; boundary=x")
        .with_body("--x--");
    let err = process(op, &PathValues::new(), &mut ctx).unwrap_err();
    assert!(matches!(err, ParamError::UnsupportedFormType(ref t) if t == "multipart/form-data"));
    assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[test]
fn test_context_values() {
    let op = OperationSpec::get("op")
        .param(ParamBinding::context(ContextKind::Request))
        .param(ParamBinding::context(ContextKind::UriInfo))
        .param(ParamBinding::context(ContextKind::Headers));
    let mut ctx = RequestContext::new(Method::GET, "/r/7?x=1").with_header("Accept", "text/plain");
    let args = process(op, &values(&[("id", "7")]), &mut ctx).unwrap();
    assert_eq!(args[0]["method"], json!("GET"));
    assert_eq!(args[0]["request_id"], json!(ctx.request_id().to_string()));
    assert_eq!(args[1]["query"], json!({"x": ["1"]}));
    assert_eq!(args[1]["template"], json!({"id": ["7"]}));
    assert_eq!(args[2], json!({"accept": ["text/plain"]}));
}
