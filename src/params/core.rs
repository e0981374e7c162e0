use super::codec::{BodyCodecs, BodyError};
use super::convert::{map_to_object, ConversionError, ParamConverter, RawValue};
use super::structured::{decode, decode_map, matrix_params, parse_structured, Decoding};
use crate::context::{CacheKey, RequestContext};
use crate::media::{MediaType, MediaTypeError};
use crate::registry::{ContextKind, OperationDescriptor, ParamBinding, ParamKind, TargetType};
use crate::template::{MultiMap, PathValues};
use http::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

/// Failure producing an operation's arguments.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("cannot convert {kind} parameter '{name}'")]
    Conversion {
        kind: ParamKind,
        name: String,
        #[source]
        source: ConversionError,
    },
    #[error("cannot read request body")]
    Body(#[from] BodyError),
    #[error("form parameters need application/x-www-form-urlencoded, got '{0}'")]
    UnsupportedFormType(String),
    #[error("invalid Content-Type header")]
    InvalidContentType(#[source] MediaTypeError),
}

impl ParamError {
    /// A value that cannot be converted from the path, query or matrix
    /// means there is no such resource (404); anything else is a bad
    /// request (400).
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ParamError::Conversion { kind, .. } => match kind {
                ParamKind::Path | ParamKind::Query | ParamKind::Matrix => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_REQUEST,
            },
            ParamError::Body(e) => e.status(),
            ParamError::UnsupportedFormType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ParamError::InvalidContentType(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Produces an operation's ordered argument list from a request.
pub struct ParamExtractor<'a> {
    pub converter: &'a dyn ParamConverter,
    pub codecs: &'a BodyCodecs,
    /// Body content type when the request declares none.
    pub default_content_type: Option<&'a str>,
}

impl ParamExtractor<'_> {
    /// Build the arguments for `operation`, one per declared binding, in
    /// declaration order.
    ///
    /// Body bindings are read before any other binding so that the body
    /// stream is consumed exactly once; a form body is buffered first so
    /// that form bindings can parse it afterwards.
    ///
    /// # Errors
    ///
    /// Returns the first [`ParamError`] met.
    pub fn process_parameters(
        &self,
        operation: &OperationDescriptor,
        values: &PathValues,
        ctx: &mut RequestContext,
    ) -> Result<Vec<Value>, ParamError> {
        let bindings = operation.params();
        let mut args: Vec<Option<Value>> = vec![None; bindings.len()];

        for (i, binding) in bindings.iter().enumerate() {
            if binding.kind == ParamKind::Body {
                args[i] = Some(self.read_body(binding, ctx)?);
            }
        }
        for (i, binding) in bindings.iter().enumerate() {
            if binding.kind != ParamKind::Body {
                args[i] = Some(self.read_param(binding, values, ctx)?);
            }
        }

        debug!(
            operation = %operation.name(),
            arguments = bindings.len(),
            "Parameters processed"
        );
        Ok(args.into_iter().map(Option::unwrap_or_default).collect())
    }

    fn read_body(&self, binding: &ParamBinding, ctx: &mut RequestContext) -> Result<Value, ParamError> {
        if !ctx.has_body().map_err(BodyError::from)? {
            return Ok(Value::Null);
        }
        let declared = ctx
            .content_type()
            .or(self.default_content_type)
            .unwrap_or("application/octet-stream");
        let media_type: MediaType = declared.parse().map_err(ParamError::InvalidContentType)?;

        if is_form(&media_type) {
            ctx.buffer_body().map_err(BodyError::from)?;
        }
        let reader = self
            .codecs
            .reader_for(&binding.target, &media_type)
            .ok_or_else(|| BodyError::NoReader {
                media_type: media_type.to_string(),
            })?;
        let mut input = ctx.take_body().map_err(BodyError::from)?;
        Ok(reader.read_from(&binding.target, &media_type, &mut input)?)
    }

    fn read_param(
        &self,
        binding: &ParamBinding,
        values: &PathValues,
        ctx: &mut RequestContext,
    ) -> Result<Value, ParamError> {
        if let TargetType::Context(kind) = binding.target {
            return Ok(context_value(kind, values, ctx));
        }

        let name = binding.name.as_deref();
        let raw = match binding.kind {
            ParamKind::Path => path_raw(binding, values),
            ParamKind::Query => {
                let map = ctx.cached_or_insert(CacheKey::QueryParams, |ctx| {
                    parse_structured(ctx.query().unwrap_or_default(), '&', Decoding::Form)
                });
                from_map(map, name, binding.encoded, Decoding::Form)
            }
            ParamKind::Matrix => {
                let map =
                    ctx.cached_or_insert(CacheKey::MatrixParams, |ctx| matrix_params(ctx.path()));
                from_map(map, name, binding.encoded, Decoding::Path)
            }
            ParamKind::Form => {
                let map = ctx.cached_or_insert_with(CacheKey::FormParams, parse_form)?;
                from_map(map, name, binding.encoded, Decoding::Form)
            }
            ParamKind::Header => match name {
                Some(n) => RawValue::Values(
                    ctx.header_values(n).into_iter().map(str::to_string).collect(),
                ),
                None => RawValue::Map(collect_pairs(ctx.headers().iter().cloned())),
            },
            ParamKind::Cookie => match name {
                Some(n) => RawValue::Values(ctx.cookie(n).into_iter().collect()),
                None => RawValue::Map(collect_pairs(ctx.cookies())),
            },
            ParamKind::Body | ParamKind::Context => RawValue::Missing,
        };

        let raw = with_default(raw, binding.default_value.as_deref());
        self.converter
            .convert(raw, &binding.target, binding.kind)
            .map_err(|source| ParamError::Conversion {
                kind: binding.kind,
                name: binding.name.clone().unwrap_or_default(),
                source,
            })
    }
}

fn is_form(media_type: &MediaType) -> bool {
    let form = MediaType::form_urlencoded();
    media_type.main_type() == form.main_type() && media_type.subtype() == form.subtype()
}

fn parse_form(ctx: &mut RequestContext) -> Result<MultiMap, ParamError> {
    if let Some(declared) = ctx.content_type() {
        let media_type: MediaType = declared.parse().map_err(ParamError::InvalidContentType)?;
        if !is_form(&media_type) {
            return Err(ParamError::UnsupportedFormType(media_type.essence()));
        }
    }
    let bytes = ctx.buffer_body().map_err(BodyError::from)?;
    Ok(parse_structured(&String::from_utf8_lossy(bytes), '&', Decoding::Form))
}

fn path_raw(binding: &ParamBinding, values: &PathValues) -> RawValue {
    let decodes = |v: &String| {
        if binding.encoded {
            v.clone()
        } else {
            decode(v, Decoding::Path)
        }
    };
    match binding.name.as_deref() {
        None => RawValue::Map(decode_map(values.vars(), binding.encoded, Decoding::Path)),
        Some(name) => {
            let all = values.get_all(name);
            // a repeated variable binds its innermost value unless a list is wanted
            let picked: Vec<String> = match &binding.target {
                TargetType::List(_) => all.iter().map(decodes).collect(),
                _ => all.last().map(decodes).into_iter().collect(),
            };
            RawValue::Values(picked)
        }
    }
}

fn from_map(map: &MultiMap, name: Option<&str>, encoded: bool, decoding: Decoding) -> RawValue {
    match name {
        None => RawValue::Map(decode_map(map, encoded, decoding)),
        Some(name) => RawValue::Values(
            map.get(name)
                .map(|vs| {
                    vs.iter()
                        .map(|v| if encoded { v.clone() } else { decode(v, decoding) })
                        .collect()
                })
                .unwrap_or_default(),
        ),
    }
}

fn with_default(raw: RawValue, default_value: Option<&str>) -> RawValue {
    match (raw, default_value) {
        (RawValue::Values(vs), Some(d)) if vs.is_empty() => RawValue::Values(vec![d.to_string()]),
        (RawValue::Values(vs), None) if vs.is_empty() => RawValue::Missing,
        (RawValue::Missing, Some(d)) => RawValue::Values(vec![d.to_string()]),
        (raw, _) => raw,
    }
}

fn collect_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> MultiMap {
    let mut map = MultiMap::new();
    for (k, v) in pairs {
        map.entry(k).or_default().push(v);
    }
    map
}

fn context_value(kind: ContextKind, values: &PathValues, ctx: &mut RequestContext) -> Value {
    match kind {
        ContextKind::UriInfo => {
            let query = ctx
                .cached_or_insert(CacheKey::QueryParams, |ctx| {
                    parse_structured(ctx.query().unwrap_or_default(), '&', Decoding::Form)
                })
                .clone();
            json!({
                "path": ctx.path(),
                "query": map_to_object(decode_map(&query, false, Decoding::Form)),
                "template": map_to_object(values.vars().clone()),
            })
        }
        ContextKind::Headers => map_to_object(collect_pairs(ctx.headers().iter().cloned())),
        ContextKind::Request => json!({
            "method": ctx.method().as_str(),
            "path": ctx.path(),
            "request_id": ctx.request_id().to_string(),
        }),
    }
}
