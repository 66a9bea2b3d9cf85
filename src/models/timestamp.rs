use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point in time as it arrives from the persistence collaborator.
///
/// Absence is modelled by `Option<RawTimestamp>` on the owning record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Document-store wire format (`{ "_seconds": .., "_nanoseconds": .. }`).
    Seconds {
        #[serde(alias = "_seconds")]
        seconds: i64,
        #[serde(default, alias = "_nanoseconds")]
        nanoseconds: u32,
    },
    /// Epoch milliseconds.
    Millis(i64),
    /// ISO-8601 or a lenient date/time string.
    Text(String),
    /// Already converted to an instant by the caller.
    Instant(DateTime<Utc>),
    /// Any other shape: fractional millis, unknown objects. Kept so one odd field
    /// does not fail the whole record.
    Other(serde_json::Value),
}

impl RawTimestamp {
    pub fn iso(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Instant(value)
    }
}

/// A normalized instant.
///
/// The derived ordering sorts `Invalid` first, then `Origin`, then real instants
/// chronologically. Change detection must use [`CanonicalInstant::is_newer_than`],
/// not `>`: an unparsable instant is never newer than anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CanonicalInstant {
    /// The raw value could not be interpreted.
    Invalid,
    /// No timestamp at all; the epoch origin, older than any real record.
    Origin,
    At(DateTime<Utc>),
}

impl CanonicalInstant {
    /// Strictly-newer test used by change detection.
    pub fn is_newer_than(&self, other: &CanonicalInstant) -> bool {
        match (self, other) {
            (Self::At(a), Self::At(b)) => a > b,
            (Self::At(_), Self::Origin) => true,
            _ => false,
        }
    }

    /// The concrete instant, if the value was a real timestamp.
    pub fn at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::At(t) => Some(*t),
            _ => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid)
    }
}
