//! Media-type value model.
//!
//! A [`MediaType`] is the parsed form of a `Content-Type` or `Accept` entry:
//! `type/subtype;name=value`. Type, subtype and parameter names are stored
//! lowercase; parameter values are kept as written (quotes included) and only
//! unquoted when compared.

use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Wildcard token accepted for both `type` and `subtype`.
pub const WILDCARD: &str = "*";
/// Client-side quality factor parameter.
pub const Q_PARAM: &str = "q";
/// Server-side quality factor parameter.
pub const QS_PARAM: &str = "qs";
/// Synthetic specificity distance added by the intersector.
pub const DISTANCE_PARAM: &str = "d";
/// Parameter compared case-insensitively during intersection.
pub const CHARSET_PARAM: &str = "charset";

/// Media-type parameters in declaration order. Almost every real header
/// carries at most two (`charset`, `q`), so they stay inline.
pub type MediaParams = SmallVec<[(String, String); 2]>;

/// Error raised when a media-type string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaTypeError {
    /// The input was empty or whitespace only.
    #[error("empty media type")]
    Empty,
    /// No `/` separating type and subtype.
    #[error("media type '{0}' has no subtype")]
    MissingSubtype(String),
    /// Type or subtype contains characters outside the token set.
    #[error("media type '{0}' contains an invalid token")]
    InvalidToken(String),
    /// A parameter without `=`, or with an empty name.
    #[error("media type parameter '{0}' is malformed")]
    InvalidParameter(String),
}

/// How composite subtypes (`vnd.foo+json`) are compared when the plain
/// check fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubtypeCheck {
    /// Both subtypes must be composite and one side wildcard-marked at the
    /// matching position (`*+json` against `vnd.foo+json`).
    #[default]
    Strict,
    /// Additionally lets a plain subtype match the other side's suffix or
    /// prefix (`xml` against `vnd.foo+xml`).
    Partial,
}

/// Which quality parameter a comparison reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    /// `q`, set by clients in `Accept`.
    Client,
    /// `qs`, declared by servers on produced types.
    Server,
}

impl Quality {
    /// Parameter name carrying this quality factor.
    #[must_use]
    pub fn param(self) -> &'static str {
        match self {
            Quality::Client => Q_PARAM,
            Quality::Server => QS_PARAM,
        }
    }
}

/// Parsed media type.
#[derive(Debug, Clone)]
pub struct MediaType {
    main_type: String,
    subtype: String,
    params: MediaParams,
}

impl MediaType {
    /// Build a media type without parameters.
    pub fn new(main_type: impl Into<String>, subtype: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into().to_ascii_lowercase(),
            subtype: subtype.into().to_ascii_lowercase(),
            params: MediaParams::new(),
        }
    }

    /// `*/*`
    #[must_use]
    pub fn wildcard() -> Self {
        Self::new(WILDCARD, WILDCARD)
    }

    /// `application/json`
    #[must_use]
    pub fn json() -> Self {
        Self::new("application", "json")
    }

    /// `application/x-www-form-urlencoded`
    #[must_use]
    pub fn form_urlencoded() -> Self {
        Self::new("application", "x-www-form-urlencoded")
    }

    /// `application/octet-stream`
    #[must_use]
    pub fn octet_stream() -> Self {
        Self::new("application", "octet-stream")
    }

    /// Add or replace a parameter.
    #[must_use]
    pub fn with_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_param(name, value);
        self
    }

    /// Add or replace a parameter in place.
    pub fn set_param(&mut self, name: &str, value: impl Into<String>) {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.params.push((name, value)),
        }
    }

    /// Top-level type, e.g. `application`.
    #[must_use]
    pub fn main_type(&self) -> &str {
        &self.main_type
    }

    #[must_use]
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Value of a parameter, looked up by lowercase name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `true` when `type` is `*`.
    #[must_use]
    pub fn is_wildcard_type(&self) -> bool {
        self.main_type == WILDCARD
    }

    /// `true` when the subtype contains a `*` anywhere, so `*+json` counts.
    #[must_use]
    pub fn has_wildcard_subtype(&self) -> bool {
        self.subtype.contains('*')
    }

    /// `type/subtype` without parameters.
    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main_type, self.subtype)
    }

    /// Copy of this type with the named parameters removed.
    #[must_use]
    pub fn without_params(&self, names: &[&str]) -> Self {
        Self {
            main_type: self.main_type.clone(),
            subtype: self.subtype.clone(),
            params: self
                .params
                .iter()
                .filter(|(k, _)| !names.iter().any(|n| k.eq_ignore_ascii_case(n)))
                .cloned()
                .collect(),
        }
    }

    pub(crate) fn from_parts(main_type: String, subtype: String, params: MediaParams) -> Self {
        Self {
            main_type,
            subtype,
            params,
        }
    }

    /// Plain compatibility: either type is `*`, or the types are equal and
    /// either subtype is `*`, or both are equal.
    #[must_use]
    pub fn is_compatible(&self, other: &MediaType) -> bool {
        if self.is_wildcard_type() || other.is_wildcard_type() {
            return true;
        }
        if self.main_type != other.main_type {
            return false;
        }
        self.subtype == WILDCARD || other.subtype == WILDCARD || self.subtype == other.subtype
    }

    /// Plain compatibility with the composite-subtype fallback for equal
    /// top-level types.
    #[must_use]
    pub fn is_compatible_with(&self, other: &MediaType, check: SubtypeCheck) -> bool {
        if self.is_compatible(other) {
            return true;
        }
        self.main_type == other.main_type
            && composite_subtypes_compatible(&self.subtype, &other.subtype, check)
    }

    /// Quality factor for the given parameter, `1.0` when absent or unusable.
    #[must_use]
    pub fn quality(&self, which: Quality) -> f32 {
        quality_factor(self.param(which.param()))
    }

    /// Synthetic distance set by the intersector, `0` when absent.
    #[must_use]
    pub fn distance(&self) -> u32 {
        self.param(DISTANCE_PARAM)
            .and_then(|d| d.parse().ok())
            .unwrap_or(0)
    }
}

impl PartialEq for MediaType {
    fn eq(&self, other: &Self) -> bool {
        self.main_type == other.main_type
            && self.subtype == other.subtype
            && self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .all(|(k, v)| other.param(k) == Some(v.as_str()))
    }
}

impl Eq for MediaType {}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.subtype)?;
        for (k, v) in &self.params {
            write!(f, ";{k}={v}")?;
        }
        Ok(())
    }
}

impl FromStr for MediaType {
    type Err = MediaTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MediaTypeError::Empty);
        }

        let mut parts = split_unquoted(s, ';').into_iter();
        let essence = parts.next().unwrap_or_default().trim();
        let (main_type, subtype) = if essence == WILDCARD {
            (WILDCARD, WILDCARD)
        } else {
            essence
                .split_once('/')
                .map(|(t, st)| (t.trim(), st.trim()))
                .ok_or_else(|| MediaTypeError::MissingSubtype(s.to_string()))?
        };
        if !is_token(main_type) || !is_token(subtype) {
            return Err(MediaTypeError::InvalidToken(s.to_string()));
        }

        let mut mt = MediaType::new(main_type, subtype);
        for raw in parts {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let (name, value) = raw
                .split_once('=')
                .ok_or_else(|| MediaTypeError::InvalidParameter(raw.to_string()))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(MediaTypeError::InvalidParameter(raw.to_string()));
            }
            mt.set_param(name, value.trim());
        }
        Ok(mt)
    }
}

/// Parse a comma-separated media-type list such as an `Accept` header.
///
/// A missing or blank header means "anything" and yields `[*/*]`.
///
/// # Errors
///
/// Returns the first entry that fails to parse.
pub fn parse_media_types(header: Option<&str>) -> Result<Vec<MediaType>, MediaTypeError> {
    let Some(header) = header.filter(|h| !h.trim().is_empty()) else {
        return Ok(vec![MediaType::wildcard()]);
    };
    split_unquoted(header, ',')
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(MediaType::from_str)
        .collect()
}

/// Parse a media-type value, treating an absent value as `*/*`.
///
/// # Errors
///
/// Propagates [`MediaTypeError`] for malformed input.
pub fn to_media_type(value: Option<&str>) -> Result<MediaType, MediaTypeError> {
    match value {
        None => Ok(MediaType::wildcard()),
        Some(v) => v.parse(),
    }
}

/// Parse a quality value. Leading-dot values (`.5`) are accepted; anything
/// missing, unparseable or outside `[0, 1]` counts as `1.0`.
#[must_use]
pub fn quality_factor(raw: Option<&str>) -> f32 {
    let Some(raw) = raw.map(strip_quotes).map(str::trim) else {
        return 1.0;
    };
    let parsed = if raw.starts_with('.') {
        format!("0{raw}").parse::<f32>()
    } else {
        raw.parse::<f32>()
    };
    match parsed {
        Ok(q) if (0.0..=1.0).contains(&q) => q,
        _ => 1.0,
    }
}

/// Order two media types by wildcard-ness only: a wildcard type sorts after
/// a concrete one, then a wildcard subtype after a concrete one. `Less`
/// means `a` is more specific.
#[must_use]
pub fn compare_wildcards(a: &MediaType, b: &MediaType) -> Ordering {
    a.is_wildcard_type()
        .cmp(&b.is_wildcard_type())
        .then_with(|| a.has_wildcard_subtype().cmp(&b.has_wildcard_subtype()))
}

/// Specificity ordering with ties falling through to the optional quality
/// parameter.
#[must_use]
pub fn compare_media_types(a: &MediaType, b: &MediaType, quality: Option<Quality>) -> Ordering {
    compare_wildcards(a, b).then_with(|| match quality {
        Some(which) => compare_quality(a, b, which),
        None => Ordering::Equal,
    })
}

/// Specificity then client quality (`q`).
#[must_use]
pub fn compare_specificity(a: &MediaType, b: &MediaType) -> Ordering {
    compare_media_types(a, b, Some(Quality::Client))
}

/// Higher quality sorts first.
#[must_use]
pub fn compare_quality(a: &MediaType, b: &MediaType, which: Quality) -> Ordering {
    b.quality(which).total_cmp(&a.quality(which))
}

/// Stable sort by specificity and the given quality parameter.
pub fn sort_media_types(types: &mut [MediaType], quality: Option<Quality>) {
    types.sort_by(|a, b| compare_media_types(a, b, quality));
}

pub(crate) fn strip_quotes(value: &str) -> &str {
    if value.len() > 1 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

fn split_subtype(subtype: &str) -> Option<(&str, &str)> {
    subtype.split_once('+')
}

fn composite_subtypes_compatible(sub1: &str, sub2: &str, check: SubtypeCheck) -> bool {
    let split1 = split_subtype(sub1);
    let split2 = split_subtype(sub2);

    match check {
        SubtypeCheck::Strict => {
            let (Some((before1, after1)), Some((before2, after2))) = (split1, split2) else {
                return false;
            };
            (after1.eq_ignore_ascii_case(after2) && (sub1.starts_with('*') || sub2.starts_with('*')))
                || (before1.eq_ignore_ascii_case(before2)
                    && (sub1.ends_with('*') || sub2.ends_with('*')))
        }
        SubtypeCheck::Partial => {
            if split1.is_none() && split2.is_none() {
                return false;
            }
            let after1 = split1.map(|(_, a)| a);
            let after2 = split2.map(|(_, a)| a);
            let before1 = split1.map(|(b, _)| b);
            let before2 = split2.map(|(b, _)| b);
            let one_plain = split1.is_none() || split2.is_none();

            if (split1.is_none() && after2 == Some(sub1)) || (split2.is_none() && after1 == Some(sub2))
            {
                return true;
            }
            if let (false, Some(a1), Some(a2)) = (one_plain, after1, after2) {
                if a1.eq_ignore_ascii_case(a2) && (sub1.starts_with('*') || sub2.starts_with('*')) {
                    return true;
                }
            }
            if (split1.is_none() && before2 == Some(sub1)) || (split2.is_none() && before1 == Some(sub2))
            {
                return true;
            }
            match (one_plain, before1, before2) {
                (false, Some(b1), Some(b2)) => {
                    b1.eq_ignore_ascii_case(b2) && (sub1.ends_with('*') || sub2.ends_with('*'))
                }
                _ => false,
            }
        }
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c))
}

/// Split on `sep` outside double-quoted sections.
fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c == sep && !in_quotes => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}
