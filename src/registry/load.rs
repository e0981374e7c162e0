use super::build::{Registry, RegistryBuilder, ResourceSpec};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serialized form of a registry: a list of resource declarations.
///
/// ```yaml
/// resources:
///   - name: widgets
///     path: /widgets
///     operations:
///       - name: get_widget
///         method: GET
///         path: /{id}
///         produces: [application/json]
///         params:
///           - { kind: path, name: id, type: integer }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub resources: Vec<ResourceSpec>,
}

impl Manifest {
    /// Feed every declaration to a [`RegistryBuilder`] and build.
    ///
    /// # Errors
    ///
    /// Returns the builder's validation error with context.
    pub fn into_registry(self) -> anyhow::Result<Registry> {
        let builder = self
            .resources
            .into_iter()
            .fold(RegistryBuilder::new(), RegistryBuilder::resource);
        builder.build().context("invalid resource manifest")
    }
}

/// Manifest encoding, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Yaml,
    Json,
}

impl ManifestFormat {
    /// `.yaml` / `.yml` are YAML, everything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                ManifestFormat::Yaml
            }
            _ => ManifestFormat::Json,
        }
    }
}

/// Parse a manifest from a string.
///
/// # Errors
///
/// Fails on malformed YAML/JSON or invalid declarations.
pub fn parse_manifest(content: &str, format: ManifestFormat) -> anyhow::Result<Registry> {
    let manifest: Manifest = match format {
        ManifestFormat::Yaml => serde_yaml::from_str(content).context("parsing YAML manifest")?,
        ManifestFormat::Json => serde_json::from_str(content).context("parsing JSON manifest")?,
    };
    manifest.into_registry()
}

/// Load a registry from a YAML or JSON manifest file.
///
/// # Errors
///
/// Fails when the file cannot be read or does not describe a valid registry.
pub fn load_manifest(path: impl AsRef<Path>) -> anyhow::Result<Registry> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading manifest {}", path.display()))?;
    parse_manifest(&content, ManifestFormat::from_path(path))
        .with_context(|| format!("loading manifest {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ContextKind, ParamBinding, ParamKind, TargetType};

    const YAML: &str = r#"
resources:
  - name: widgets
    path: /widgets
    operations:
      - name: list_widgets
        method: GET
        produces: [application/json]
        params:
          - { kind: query, name: tags, type: { list: string } }
      - name: get_widget
        method: get
        path: /{id}
        params:
          - { kind: path, name: id, type: integer }
      - name: parts
        path: /{id}/parts
        locates: parts
  - name: parts
    root: false
    operations:
      - name: list_parts
        method: "*"
"#;

    #[test]
    fn test_parse_yaml_manifest() {
        let registry = parse_manifest(YAML, ManifestFormat::Yaml).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.roots().count(), 1);

        let widgets = registry.resource_by_name("widgets").unwrap();
        let list = widgets.operation("list_widgets").unwrap();
        assert_eq!(list.params()[0].kind, ParamKind::Query);
        assert_eq!(
            list.params()[0].target,
            TargetType::List(Box::new(TargetType::String))
        );
        assert!(widgets.operation("parts").unwrap().is_locator());

        let parts = registry.resource_by_name("parts").unwrap();
        assert_eq!(parts.template().value(), "/");
        assert_eq!(parts.parent(), Some(widgets.id()));
    }

    #[test]
    fn test_parse_json_manifest() {
        let json = r#"{"resources":[{"name":"a","path":"/a","operations":[{"name":"x","method":"POST","consumes":["application/json"]}]}]}"#;
        let registry = parse_manifest(json, ManifestFormat::Json).unwrap();
        assert_eq!(registry.operation_count(), 1);
    }

    #[test]
    fn test_nested_target_types_in_both_formats() {
        let yaml = r#"
resources:
  - name: a
    path: /a
    operations:
      - name: x
        method: GET
        params:
          - { kind: query, name: ids, type: { list: integer } }
          - { kind: context, type: { context: uri_info } }
          - { kind: header, name: x-flag, type: boolean }
"#;
        let json = r#"{"resources":[{"name":"a","path":"/a","operations":[{"name":"x","method":"GET","params":[
            {"kind":"query","name":"ids","type":{"list":"integer"}},
            {"kind":"context","type":{"context":"uri_info"}},
            {"kind":"header","name":"x-flag","type":"boolean"}]}]}]}"#;

        let expected = vec![
            TargetType::List(Box::new(TargetType::Integer)),
            TargetType::Context(ContextKind::UriInfo),
            TargetType::Boolean,
        ];
        for (text, format) in [(yaml, ManifestFormat::Yaml), (json, ManifestFormat::Json)] {
            let registry = parse_manifest(text, format).unwrap();
            let op = registry.resource_by_name("a").unwrap().operation("x").unwrap();
            let targets: Vec<TargetType> = op.params().iter().map(|p| p.target.clone()).collect();
            assert_eq!(targets, expected, "{format:?}");
        }
    }

    #[test]
    fn test_binding_serializes_to_map_form() {
        let binding = ParamBinding::query("ids", TargetType::List(Box::new(TargetType::Integer)));

        let json = serde_json::to_value(&binding).unwrap();
        assert_eq!(json["type"], serde_json::json!({ "list": "integer" }));
        assert_eq!(serde_json::from_value::<ParamBinding>(json).unwrap(), binding);

        let ctx = ParamBinding::context(ContextKind::Headers);
        let yaml = serde_yaml::to_string(&ctx).unwrap();
        assert!(yaml.contains("context: headers"), "{yaml}");
        assert_eq!(serde_yaml::from_str::<ParamBinding>(&yaml).unwrap(), ctx);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ManifestFormat::from_path(Path::new("a.yml")), ManifestFormat::Yaml);
        assert_eq!(ManifestFormat::from_path(Path::new("a.YAML")), ManifestFormat::Yaml);
        assert_eq!(ManifestFormat::from_path(Path::new("a.json")), ManifestFormat::Json);
    }

    #[test]
    fn test_invalid_manifest_reports_context() {
        let err = parse_manifest("resources: [{name: a, path: '/{'}]", ManifestFormat::Yaml)
            .unwrap_err();
        assert!(format!("{err:#}").contains("invalid resource manifest"));
    }
}
