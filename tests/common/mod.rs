#![allow(dead_code)]

use brrtresolver::registry::{parse_manifest, ManifestFormat, Registry};
use brrtresolver::Engine;
use std::sync::Arc;

/// Pet store manifest shared by the integration tests.
pub const PETSTORE: &str = r#"
resources:
  - name: pets
    path: /pets
    operations:
      - name: list_pets
        method: GET
        produces: [application/json, text/html;qs=0.5]
        params:
          - { kind: query, name: limit, type: integer, default: "20" }
          - { kind: query, name: tags, type: { list: string } }
      - name: add_pet
        method: POST
        consumes: [application/json, application/x-www-form-urlencoded]
        produces: [application/json]
        params:
          - { kind: body, type: object }
      - name: get_pet
        method: GET
        path: "/{id}"
        produces: [application/json, text/plain]
        params:
          - { kind: path, name: id, type: integer }
          - { kind: header, name: X-Trace-Id }
      - name: update_pet
        method: PUT
        path: "/{id}"
        consumes: [application/json]
        params:
          - { kind: path, name: id, type: integer }
          - { kind: body, type: object }
      - name: photos
        path: "/{id}/photos"
        locates: photos
  - name: photos
    root: false
    operations:
      - name: list_photos
        method: GET
        produces: [application/json]
      - name: upload_photo
        method: POST
        consumes: ["image/*"]
      - name: get_photo
        method: GET
        path: "/{photo_id: [0-9]+}"
        params:
          - { kind: path, name: id, type: integer }
          - { kind: path, name: photo_id, type: integer }
  - name: users
    path: /users/{user_id}
    operations:
      - name: get_user
        method: GET
        params:
          - { kind: path, name: user_id }
          - { kind: matrix, name: fields, type: { list: string } }
          - { kind: cookie, name: session, default: anonymous }
  - name: me
    path: /users/me
    operations:
      - name: current_user
        method: GET
"#;

pub fn petstore() -> Registry {
    parse_manifest(PETSTORE, ManifestFormat::Yaml).unwrap()
}

pub fn engine() -> Engine {
    Engine::new(Arc::new(petstore()))
}

pub mod temp_files {
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Write `content` to a temporary file with the given extension.
    pub fn create_temp_manifest(content: &str, ext: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("brrt_test_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    pub fn create_temp_yaml(content: &str) -> NamedTempFile {
        create_temp_manifest(content, "yaml")
    }

    pub fn create_temp_json(content: &str) -> NamedTempFile {
        create_temp_manifest(content, "json")
    }
}
