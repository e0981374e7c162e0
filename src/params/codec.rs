use super::convert::{convert_scalar, map_to_object};
use super::structured::{decode_map, parse_structured, Decoding};
use crate::media::{compare_media_types, MediaType, MediaTypeError, SubtypeCheck};
use crate::registry::TargetType;
use http::StatusCode;
use serde_json::Value;
use std::io::{self, Read, Write};
use std::sync::Arc;
use thiserror::Error;

/// Failure reading or writing a body.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("no body reader for {media_type}")]
    NoReader { media_type: String },
    #[error("no body writer for {media_type}")]
    NoWriter { media_type: String },
    #[error("malformed {media_type} body: {reason}")]
    Malformed { media_type: String, reason: String },
    #[error("request body I/O")]
    Io(#[from] io::Error),
}

impl BodyError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            BodyError::NoReader { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            BodyError::NoWriter { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            BodyError::Malformed { .. } | BodyError::Io(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn malformed(media_type: &MediaType, reason: impl ToString) -> Self {
        BodyError::Malformed {
            media_type: media_type.essence(),
            reason: reason.to_string(),
        }
    }
}

/// Deserializes request bodies.
pub trait BodyReader: Send + Sync {
    /// Whether this reader can produce `target` from `media_type`.
    fn is_readable(&self, _target: &TargetType, _media_type: &MediaType) -> bool {
        true
    }

    /// # Errors
    ///
    /// Returns [`BodyError`] for unreadable or malformed input.
    fn read_from(
        &self,
        target: &TargetType,
        media_type: &MediaType,
        input: &mut dyn Read,
    ) -> Result<Value, BodyError>;
}

/// Serializes response bodies.
pub trait BodyWriter: Send + Sync {
    fn is_writeable(&self, _value: &Value, _media_type: &MediaType) -> bool {
        true
    }

    /// # Errors
    ///
    /// Returns [`BodyError`] when the value cannot be written.
    fn write_to(
        &self,
        value: &Value,
        media_type: &MediaType,
        out: &mut dyn Write,
    ) -> Result<(), BodyError>;
}

struct Registered<T: ?Sized> {
    media_types: Vec<MediaType>,
    codec: Arc<T>,
}

impl<T: ?Sized> Registered<T> {
    /// Most specific declared type compatible with `requested`.
    fn best_match(&self, requested: &MediaType) -> Option<&MediaType> {
        self.media_types
            .iter()
            .filter(|declared| declared.is_compatible_with(requested, SubtypeCheck::Strict))
            .min_by(|a, b| compare_media_types(a, b, None))
    }
}

/// Reader/writer lookup keyed by media type and target type.
///
/// When several codecs fit, the one whose declared type is most specific
/// wins, then the one registered first.
#[derive(Default)]
pub struct BodyCodecs {
    readers: Vec<Registered<dyn BodyReader>>,
    writers: Vec<Registered<dyn BodyWriter>>,
}

impl std::fmt::Debug for BodyCodecs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let types = |list: &[MediaType]| list.iter().map(ToString::to_string).collect::<Vec<_>>();
        f.debug_struct("BodyCodecs")
            .field("readers", &self.readers.iter().map(|r| types(&r.media_types)).collect::<Vec<_>>())
            .field("writers", &self.writers.iter().map(|w| types(&w.media_types)).collect::<Vec<_>>())
            .finish()
    }
}

impl BodyCodecs {
    /// No codecs at all.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// JSON, plain text and form codecs.
    #[must_use]
    pub fn with_defaults() -> Self {
        let json = Arc::new(JsonCodec);
        let text = Arc::new(TextCodec);
        let form = Arc::new(FormCodec);
        let mut codecs = Self::default();
        codecs.push(JsonCodec::MEDIA_TYPES, &json);
        codecs.push(TextCodec::MEDIA_TYPES, &text);
        codecs.push(FormCodec::MEDIA_TYPES, &form);
        codecs
    }

    fn push<C: BodyReader + BodyWriter + 'static>(&mut self, types: &[&str], codec: &Arc<C>) {
        let media_types: Vec<MediaType> = types.iter().filter_map(|t| t.parse().ok()).collect();
        self.readers.push(Registered {
            media_types: media_types.clone(),
            codec: Arc::clone(codec) as Arc<dyn BodyReader>,
        });
        self.writers.push(Registered {
            media_types,
            codec: Arc::clone(codec) as Arc<dyn BodyWriter>,
        });
    }

    /// Register a reader for the given media types.
    ///
    /// # Errors
    ///
    /// Fails when a media type does not parse.
    pub fn register_reader(
        &mut self,
        types: &[&str],
        reader: Arc<dyn BodyReader>,
    ) -> Result<(), MediaTypeError> {
        let media_types = types.iter().map(|t| t.parse()).collect::<Result<_, _>>()?;
        self.readers.push(Registered {
            media_types,
            codec: reader,
        });
        Ok(())
    }

    /// Register a writer for the given media types.
    ///
    /// # Errors
    ///
    /// Fails when a media type does not parse.
    pub fn register_writer(
        &mut self,
        types: &[&str],
        writer: Arc<dyn BodyWriter>,
    ) -> Result<(), MediaTypeError> {
        let media_types = types.iter().map(|t| t.parse()).collect::<Result<_, _>>()?;
        self.writers.push(Registered {
            media_types,
            codec: writer,
        });
        Ok(())
    }

    /// Reader for `target` in `media_type`.
    #[must_use]
    pub fn reader_for(&self, target: &TargetType, media_type: &MediaType) -> Option<Arc<dyn BodyReader>> {
        self.readers
            .iter()
            .filter(|r| r.codec.is_readable(target, media_type))
            .filter_map(|r| r.best_match(media_type).map(|declared| (declared, r)))
            .min_by(|(a, _), (b, _)| compare_media_types(a, b, None))
            .map(|(_, r)| Arc::clone(&r.codec))
    }

    /// Writer for `value` in `media_type`, with the concrete type to
    /// announce. A wildcard `media_type` resolves to the writer's declared
    /// type, or `application/octet-stream` if that is a wildcard too.
    #[must_use]
    pub fn writer_for(
        &self,
        value: &Value,
        media_type: &MediaType,
    ) -> Option<(Arc<dyn BodyWriter>, MediaType)> {
        self.writers
            .iter()
            .filter(|w| w.codec.is_writeable(value, media_type))
            .filter_map(|w| w.best_match(media_type).map(|declared| (declared, w)))
            .min_by(|(a, _), (b, _)| compare_media_types(a, b, None))
            .map(|(declared, w)| {
                let concrete = if !media_type.is_wildcard_type() && !media_type.has_wildcard_subtype() {
                    media_type.clone()
                } else if !declared.is_wildcard_type() && !declared.has_wildcard_subtype() {
                    declared.clone()
                } else {
                    MediaType::octet_stream()
                };
                (Arc::clone(&w.codec), concrete)
            })
    }
}

/// `application/json` and `+json` vendor types.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    pub const MEDIA_TYPES: &'static [&'static str] = &["application/json", "application/*+json"];
}

impl BodyReader for JsonCodec {
    fn is_readable(&self, target: &TargetType, _: &MediaType) -> bool {
        !matches!(target, TargetType::Context(_))
    }

    fn read_from(
        &self,
        target: &TargetType,
        media_type: &MediaType,
        input: &mut dyn Read,
    ) -> Result<Value, BodyError> {
        let value: Value =
            serde_json::from_reader(input).map_err(|e| BodyError::malformed(media_type, e))?;
        let fits = match target {
            TargetType::String => value.is_string(),
            TargetType::Integer => value.is_i64() || value.is_u64(),
            TargetType::Number => value.is_number(),
            TargetType::Boolean => value.is_boolean(),
            TargetType::List(_) => value.is_array(),
            TargetType::Object => value.is_object(),
            TargetType::Json => true,
            TargetType::Context(_) => false,
        };
        if fits {
            Ok(value)
        } else {
            Err(BodyError::malformed(
                media_type,
                format!("expected {target:?}, got {value}"),
            ))
        }
    }
}

impl BodyWriter for JsonCodec {
    fn write_to(&self, value: &Value, media_type: &MediaType, out: &mut dyn Write) -> Result<(), BodyError> {
        serde_json::to_writer(out, value).map_err(|e| BodyError::malformed(media_type, e))
    }
}

/// `text/*` bodies as strings, or as scalars parsed from the text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl TextCodec {
    pub const MEDIA_TYPES: &'static [&'static str] = &["text/*"];
}

impl BodyReader for TextCodec {
    fn is_readable(&self, target: &TargetType, _: &MediaType) -> bool {
        matches!(
            target,
            TargetType::String
                | TargetType::Integer
                | TargetType::Number
                | TargetType::Boolean
                | TargetType::Json
        )
    }

    fn read_from(
        &self,
        target: &TargetType,
        media_type: &MediaType,
        input: &mut dyn Read,
    ) -> Result<Value, BodyError> {
        let mut text = String::new();
        input.read_to_string(&mut text)?;
        match target {
            TargetType::String | TargetType::Json => Ok(Value::String(text)),
            scalar => convert_scalar(&text, scalar).map_err(|e| BodyError::malformed(media_type, e)),
        }
    }
}

impl BodyWriter for TextCodec {
    fn write_to(&self, value: &Value, _: &MediaType, out: &mut dyn Write) -> Result<(), BodyError> {
        match value {
            Value::String(s) => out.write_all(s.as_bytes())?,
            Value::Null => {}
            other => out.write_all(other.to_string().as_bytes())?,
        }
        Ok(())
    }
}

/// `application/x-www-form-urlencoded` bodies as multi-valued objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormCodec;

impl FormCodec {
    pub const MEDIA_TYPES: &'static [&'static str] = &["application/x-www-form-urlencoded"];
}

impl BodyReader for FormCodec {
    fn is_readable(&self, target: &TargetType, _: &MediaType) -> bool {
        matches!(target, TargetType::Object | TargetType::Json)
    }

    fn read_from(&self, _: &TargetType, _: &MediaType, input: &mut dyn Read) -> Result<Value, BodyError> {
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes)?;
        let raw = parse_structured(&String::from_utf8_lossy(&bytes), '&', Decoding::Form);
        Ok(map_to_object(decode_map(&raw, false, Decoding::Form)))
    }
}

impl BodyWriter for FormCodec {
    fn is_writeable(&self, value: &Value, _: &MediaType) -> bool {
        value.is_object()
    }

    fn write_to(&self, value: &Value, media_type: &MediaType, out: &mut dyn Write) -> Result<(), BodyError> {
        let Value::Object(fields) = value else {
            return Err(BodyError::malformed(media_type, "form bodies must be objects"));
        };
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, field) in fields {
            let values: Vec<&Value> = match field {
                Value::Array(items) => items.iter().collect(),
                single => vec![single],
            };
            for v in values {
                match v {
                    Value::String(s) => serializer.append_pair(name, s),
                    other => serializer.append_pair(name, &other.to_string()),
                };
            }
        }
        out.write_all(serializer.finish().as_bytes())?;
        Ok(())
    }
}
