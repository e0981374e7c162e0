use brrtresolver::context::RequestContext;
use brrtresolver::registry::{load_manifest, watch_manifest, SharedRegistry};
use brrtresolver::Engine;
use http::Method;
use std::sync::{Arc, Mutex};
use std::time::Duration;

mod common;
use common::temp_files;

const V1: &str = r#"
resources:
  - name: foo
    path: /foo
    operations:
      - { name: foo_one, method: GET }
"#;

const V2: &str = r#"
resources:
  - name: foo
    path: /foo
    operations:
      - { name: foo_two, method: GET }
      - { name: foo_create, method: POST }
"#;

fn operation_for(engine: &Engine, method: Method, uri: &str) -> Option<String> {
    let mut ctx = RequestContext::new(method, uri);
    engine
        .resolve(&mut ctx)
        .ok()
        .map(|r| r.operation().name().to_string())
}

#[test]
fn test_load_yaml_manifest_from_file() {
    let file = temp_files::create_temp_yaml(common::PETSTORE);
    let registry = load_manifest(file.path()).unwrap();
    assert_eq!(registry.len(), 4);
    assert_eq!(registry.roots().count(), 3);

    let engine = Engine::new(Arc::new(registry));
    assert_eq!(operation_for(&engine, Method::GET, "/pets/1").as_deref(), Some("get_pet"));
}

#[test]
fn test_load_json_manifest_from_file() {
    let json = r#"{
        "resources": [
            {"name": "orders", "path": "/orders", "operations": [
                {"name": "list_orders", "method": "GET", "produces": ["application/json"]},
                {"name": "get_order", "method": "GET", "path": "/{id: [0-9]+}"}
            ]}
        ]
    }"#;
    let file = temp_files::create_temp_json(json);
    let engine = Engine::new(Arc::new(load_manifest(file.path()).unwrap()));
    assert_eq!(operation_for(&engine, Method::GET, "/orders/12").as_deref(), Some("get_order"));
    assert_eq!(operation_for(&engine, Method::GET, "/orders/x"), None);
}

#[test]
fn test_invalid_manifests_are_rejected() {
    let unknown_target = r#"
resources:
  - name: a
    path: /a
    operations:
      - { name: to_b, locates: b }
"#;
    let file = temp_files::create_temp_yaml(unknown_target);
    let err = load_manifest(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("to_b"), "{err:#}");

    let bad_media = r#"
resources:
  - name: a
    path: /a
    operations:
      - { name: x, method: GET, produces: ["json"] }
"#;
    let file = temp_files::create_temp_yaml(bad_media);
    assert!(load_manifest(file.path()).is_err());

    assert!(load_manifest("/nonexistent/manifest.yaml").is_err());
}

#[test]
fn test_engine_over_swapped_snapshot() {
    let v1 = temp_files::create_temp_yaml(V1);
    let v2 = temp_files::create_temp_yaml(V2);
    let shared = SharedRegistry::new(load_manifest(v1.path()).unwrap());

    let engine = Engine::new(shared.snapshot());
    assert_eq!(operation_for(&engine, Method::GET, "/foo").as_deref(), Some("foo_one"));

    shared.replace(load_manifest(v2.path()).unwrap());
    assert_eq!(operation_for(&engine, Method::GET, "/foo").as_deref(), Some("foo_one"));

    let engine = engine.with_registry(shared.snapshot());
    assert_eq!(operation_for(&engine, Method::GET, "/foo").as_deref(), Some("foo_two"));
}

#[test]
fn test_watch_manifest_reload() {
    let file = temp_files::create_temp_yaml(V1);
    let shared = Arc::new(SharedRegistry::new(load_manifest(file.path()).unwrap()));

    let reloads: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&reloads);
    let watcher = watch_manifest(file.path(), Arc::clone(&shared), move |registry| {
        seen.lock().unwrap().push(registry.operation_count());
    })
    .expect("watch_manifest");

    // allow watcher thread to start
    std::thread::sleep(Duration::from_millis(100));

    // a broken manifest keeps the previous registry
    std::fs::write(file.path(), "resources: [{ name: foo, path: '/{' }]").unwrap();
    std::thread::sleep(Duration::from_millis(200));
    assert_eq!(shared.snapshot().operation_count(), 1);

    std::fs::write(file.path(), V2).unwrap();
    for _ in 0..40 {
        if shared.snapshot().operation_count() == 2 {
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    let engine = Engine::new(shared.snapshot());
    assert_eq!(operation_for(&engine, Method::POST, "/foo").as_deref(), Some("foo_create"));
    assert!(reloads.lock().unwrap().contains(&2));

    drop(watcher);
}
