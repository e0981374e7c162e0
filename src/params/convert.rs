use crate::registry::{ParamKind, TargetType};
use crate::template::MultiMap;
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Raw value handed to a [`ParamConverter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// One or more string values, in source order.
    Values(Vec<String>),
    /// A whole multi-valued source (nameless binding).
    Map(MultiMap),
    /// Nothing in the request and no declared default.
    Missing,
}

/// A raw value that cannot become the requested type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("'{value}' is not a valid {target}")]
    Invalid { value: String, target: String },
    #[error("{0}")]
    Unsupported(String),
}

/// Turns raw strings and maps into typed values.
pub trait ParamConverter: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`ConversionError`] when `raw` does not fit `target`.
    fn convert(
        &self,
        raw: RawValue,
        target: &TargetType,
        kind: ParamKind,
    ) -> Result<Value, ConversionError>;
}

/// Default converter producing `serde_json::Value`s.
///
/// Scalars parse into the matching JSON type; lists coerce every raw value;
/// objects receive the whole map with each name mapped to its values.
/// Missing values become `null` (or `[]` for lists).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonConverter;

impl ParamConverter for JsonConverter {
    fn convert(
        &self,
        raw: RawValue,
        target: &TargetType,
        kind: ParamKind,
    ) -> Result<Value, ConversionError> {
        match (raw, target) {
            (RawValue::Missing, TargetType::List(_)) => Ok(Value::Array(Vec::new())),
            (RawValue::Missing, _) => Ok(Value::Null),

            (RawValue::Values(values), TargetType::List(inner)) => values
                .iter()
                .map(|v| convert_scalar(v, inner))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            (RawValue::Values(values), TargetType::Object) => Err(ConversionError::Unsupported(
                format!("{kind} parameter with {} value(s) cannot bind to an object", values.len()),
            )),
            (RawValue::Values(values), scalar) => match values.first() {
                Some(first) => convert_scalar(first, scalar),
                None => Ok(Value::Null),
            },

            (RawValue::Map(map), TargetType::Object | TargetType::Json) => Ok(map_to_object(map)),
            (RawValue::Map(_), other) => Err(ConversionError::Unsupported(format!(
                "nameless {kind} parameter cannot bind to {other:?}"
            ))),
        }
    }
}

/// `{name: [values..]}`
#[must_use]
pub fn map_to_object(map: MultiMap) -> Value {
    Value::Object(
        map.into_iter()
            .map(|(k, vs)| (k, Value::Array(vs.into_iter().map(Value::String).collect())))
            .collect::<Map<String, Value>>(),
    )
}

pub(crate) fn convert_scalar(raw: &str, target: &TargetType) -> Result<Value, ConversionError> {
    let invalid = |target: &str| ConversionError::Invalid {
        value: raw.to_string(),
        target: target.to_string(),
    };
    match target {
        TargetType::String => Ok(Value::String(raw.to_string())),
        TargetType::Integer => raw
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| invalid("integer")),
        TargetType::Number => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| invalid("number")),
        TargetType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(invalid("boolean")),
        },
        TargetType::Json => serde_json::from_str(raw).map_err(|_| invalid("JSON value")),
        TargetType::Object => match serde_json::from_str(raw) {
            Ok(Value::Object(obj)) => Ok(Value::Object(obj)),
            _ => Err(invalid("JSON object")),
        },
        TargetType::List(_) => Err(ConversionError::Unsupported(
            "nested lists are not supported".to_string(),
        )),
        TargetType::Context(kind) => Err(ConversionError::Unsupported(format!(
            "{kind:?} context values are injected, not converted"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(vs: &[&str]) -> RawValue {
        RawValue::Values(vs.iter().map(|s| (*s).to_string()).collect())
    }

    #[test]
    fn test_scalars() {
        let c = JsonConverter;
        assert_eq!(c.convert(values(&["42"]), &TargetType::Integer, ParamKind::Path).unwrap(), json!(42));
        assert_eq!(c.convert(values(&["1.5"]), &TargetType::Number, ParamKind::Query).unwrap(), json!(1.5));
        assert_eq!(c.convert(values(&["TRUE"]), &TargetType::Boolean, ParamKind::Header).unwrap(), json!(true));
        assert_eq!(c.convert(values(&["x"]), &TargetType::String, ParamKind::Cookie).unwrap(), json!("x"));
        assert_eq!(
            c.convert(values(&[r#"{"a":1}"#]), &TargetType::Json, ParamKind::Query).unwrap(),
            json!({"a": 1})
        );
    }

    #[test]
    fn test_first_value_wins_for_scalars() {
        let out = JsonConverter
            .convert(values(&["1", "2"]), &TargetType::Integer, ParamKind::Query)
            .unwrap();
        assert_eq!(out, json!(1));
    }

    #[test]
    fn test_list_converts_every_value() {
        let out = JsonConverter
            .convert(
                values(&["1", "2"]),
                &TargetType::List(Box::new(TargetType::Integer)),
                ParamKind::Query,
            )
            .unwrap();
        assert_eq!(out, json!([1, 2]));
    }

    #[test]
    fn test_missing() {
        let c = JsonConverter;
        assert_eq!(c.convert(RawValue::Missing, &TargetType::Integer, ParamKind::Query).unwrap(), Value::Null);
        assert_eq!(
            c.convert(RawValue::Missing, &TargetType::List(Box::new(TargetType::String)), ParamKind::Query)
                .unwrap(),
            json!([])
        );
    }

    #[test]
    fn test_map_binds_to_object() {
        let map = MultiMap::from([("a".to_string(), vec!["1".to_string(), "2".to_string()])]);
        let out = JsonConverter
            .convert(RawValue::Map(map), &TargetType::Object, ParamKind::Query)
            .unwrap();
        assert_eq!(out, json!({"a": ["1", "2"]}));
    }

    #[test]
    fn test_invalid_values() {
        let err = JsonConverter
            .convert(values(&["abc"]), &TargetType::Integer, ParamKind::Path)
            .unwrap_err();
        assert_eq!(
            err,
            ConversionError::Invalid {
                value: "abc".to_string(),
                target: "integer".to_string()
            }
        );
        assert!(JsonConverter
            .convert(values(&["NaN"]), &TargetType::Number, ParamKind::Query)
            .is_err());
        assert!(JsonConverter
            .convert(values(&["yes"]), &TargetType::Boolean, ParamKind::Query)
            .is_err());
    }
}
