use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime};

/// Header a caller may use to pin the id of a resolution.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Identifies one resolution in log events and context values.
///
/// Ids are ULIDs, so they sort by creation time and render as 26 Crockford
/// base32 characters.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(ulid::Ulid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Adopt the value of an `x-request-id` header when it holds a ULID.
    ///
    /// Anything else (absent, blank, a UUID, garbage) gets a fresh id.
    #[must_use]
    pub fn from_header_or_new(header_value: Option<&str>) -> Self {
        match header_value.map(str::trim) {
            Some(raw) if !raw.is_empty() => raw.parse().unwrap_or_default(),
            _ => Self::new(),
        }
    }

    /// Wall-clock time the id was minted at (millisecond precision).
    #[must_use]
    pub fn created_at(&self) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_millis(self.0.timestamp_ms())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ulid::Ulid::from_string(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_id_adopted() {
        let id = RequestId::new();
        let header = format!("  {id} ");
        assert_eq!(RequestId::from_header_or_new(Some(&header)), id);
    }

    #[test]
    fn test_unusable_header_mints_fresh_id() {
        let seen = [
            RequestId::from_header_or_new(Some("not-a-ulid")),
            RequestId::from_header_or_new(Some("   ")),
            RequestId::from_header_or_new(None),
        ];
        assert_ne!(seen[0], seen[1]);
        assert_ne!(seen[1], seen[2]);
    }

    #[test]
    fn test_created_at_is_recent() {
        let before = SystemTime::now() - Duration::from_secs(1);
        let id = RequestId::new();
        assert!(id.created_at() >= before);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = RequestId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));
        let back: RequestId = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);
    }
}
