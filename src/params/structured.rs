//! Structured parameter parsing for query strings, matrix segments and
//! form bodies.
//!
//! Names are decoded once when parsed; values stay raw so that `encoded`
//! bindings can receive them untouched.

use crate::template::MultiMap;
use std::borrow::Cow;

/// Percent-decoding flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoding {
    /// `application/x-www-form-urlencoded`: `+` is a space.
    Form,
    /// Path segments: `+` is literal.
    Path,
}

/// Decode `raw`, returning it unchanged when it is not valid UTF-8 after
/// decoding.
#[must_use]
pub fn decode(raw: &str, decoding: Decoding) -> String {
    let spaced: Cow<'_, str> = match decoding {
        Decoding::Form if raw.contains('+') => Cow::Owned(raw.replace('+', " ")),
        _ => Cow::Borrowed(raw),
    };
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced.into_owned(),
    }
}

/// Split `raw` on `sep` into a multi-valued map. A part without `=` is a
/// name with an empty value; empty parts are skipped.
#[must_use]
pub fn parse_structured(raw: &str, sep: char, names: Decoding) -> MultiMap {
    let mut map = MultiMap::new();
    for part in raw.split(sep).filter(|p| !p.is_empty()) {
        let (name, value) = part.split_once('=').unwrap_or((part, ""));
        let name = decode(name.trim(), names);
        if name.is_empty() {
            continue;
        }
        map.entry(name).or_default().push(value.to_string());
    }
    map
}

/// Matrix parameters of every segment of `path`
/// (`/cars;color=red/2024;trim=lx`), in order.
#[must_use]
pub fn matrix_params(path: &str) -> MultiMap {
    let mut map = MultiMap::new();
    for segment in path.split('/') {
        if let Some((_, params)) = segment.split_once(';') {
            for (name, values) in parse_structured(params, ';', Decoding::Path) {
                map.entry(name).or_default().extend(values);
            }
        }
    }
    map
}

/// Decode every value of `map` unless `encoded`.
#[must_use]
pub fn decode_map(map: &MultiMap, encoded: bool, decoding: Decoding) -> MultiMap {
    if encoded {
        return map.clone();
    }
    map.iter()
        .map(|(k, vs)| (k.clone(), vs.iter().map(|v| decode(v, decoding)).collect()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_values_stay_raw() {
        let map = parse_structured("a=1&b=x%20y&a=2&flag&&c%5B%5D=z", '&', Decoding::Form);
        assert_eq!(map["a"], vec!["1", "2"]);
        assert_eq!(map["b"], vec!["x%20y"]);
        assert_eq!(map["flag"], vec![""]);
        assert_eq!(map["c[]"], vec!["z"]);
    }

    #[test]
    fn test_decoding_flavours() {
        assert_eq!(decode("a+b%21", Decoding::Form), "a b!");
        assert_eq!(decode("a+b%21", Decoding::Path), "a+b!");
        assert_eq!(decode("%ff", Decoding::Path), "%ff");
    }

    #[test]
    fn test_matrix_params_across_segments() {
        let map = matrix_params("/cars;color=red;year=2024/parts;color=blue/x");
        assert_eq!(map["color"], vec!["red", "blue"]);
        assert_eq!(map["year"], vec!["2024"]);
        assert!(matrix_params("/plain/path").is_empty());
    }

    #[test]
    fn test_decode_map_respects_encoded() {
        let map = parse_structured("q=a%2Fb", '&', Decoding::Form);
        assert_eq!(decode_map(&map, false, Decoding::Form)["q"], vec!["a/b"]);
        assert_eq!(decode_map(&map, true, Decoding::Form)["q"], vec!["a%2Fb"]);
    }
}
