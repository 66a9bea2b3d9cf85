//! Record normalization: raw timestamp shapes to [`CanonicalInstant`], entered lab
//! parameters to stored [`LabParameter`]s, and newest-first ordering of record lists.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::intelligence::reference;
use crate::models::*;
use super::types::ClinicalSnapshot;

/// Anything that can be normalized to a canonical instant.
pub trait IntoInstant {
    fn to_instant(&self) -> CanonicalInstant;
}

impl IntoInstant for CanonicalInstant {
    fn to_instant(&self) -> CanonicalInstant {
        *self
    }
}

impl IntoInstant for DateTime<Utc> {
    fn to_instant(&self) -> CanonicalInstant {
        CanonicalInstant::At(*self)
    }
}

impl IntoInstant for RawTimestamp {
    fn to_instant(&self) -> CanonicalInstant {
        let parsed = match self {
            RawTimestamp::Instant(t) => Some(*t),
            RawTimestamp::Seconds {
                seconds,
                nanoseconds,
            } => Utc.timestamp_opt(*seconds, *nanoseconds).single(),
            RawTimestamp::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            RawTimestamp::Text(text) => parse_text(text),
            RawTimestamp::Other(value) => value
                .as_f64()
                .filter(|ms| ms.is_finite() && ms.abs() < i64::MAX as f64)
                .and_then(|ms| Utc.timestamp_millis_opt(ms.trunc() as i64).single()),
        };
        match parsed {
            Some(t) => CanonicalInstant::At(t),
            None => {
                tracing::debug!(raw = ?self, "Malformed timestamp, treating as oldest");
                CanonicalInstant::Invalid
            }
        }
    }
}

impl<T: IntoInstant> IntoInstant for Option<T> {
    fn to_instant(&self) -> CanonicalInstant {
        match self {
            Some(raw) => raw.to_instant(),
            None => CanonicalInstant::Origin,
        }
    }
}

impl<T: IntoInstant + ?Sized> IntoInstant for &T {
    fn to_instant(&self) -> CanonicalInstant {
        (**self).to_instant()
    }
}

/// Normalize any supported timestamp shape. Pure and idempotent.
pub fn normalize_timestamp<T: IntoInstant + ?Sized>(raw: &T) -> CanonicalInstant {
    raw.to_instant()
}

/// RFC 3339 first, then zone-less date-times (read as UTC), then bare dates.
fn parse_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Some(t.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Stable sort, newest first. Equal instants keep their input order;
/// missing and unparsable timestamps sink to the end.
pub fn sort_newest_first<T, F>(records: &mut [T], observed_at: F)
where
    F: Fn(&T) -> CanonicalInstant,
{
    records.sort_by(|a, b| observed_at(b).cmp(&observed_at(a)));
}

/// Sort every category of a snapshot newest first by its observation time.
pub fn sort_snapshot(records: &mut ClinicalSnapshot) {
    sort_newest_first(&mut records.vitals, |v| v.recorded_at.to_instant());
    sort_newest_first(&mut records.labs, |l| l.ordered_at.to_instant());
    sort_newest_first(&mut records.imaging, |i| i.ordered_at.to_instant());
}

/// Turn entered parameters into stored ones: display name, unit and reference
/// bounds come from the reference table unless supplied, and status is computed.
pub fn normalize_lab_parameters(category: Option<&str>, inputs: &[ParameterInput]) -> Vec<LabParameter> {
    let category = match category {
        None => Some(DEFAULT_LAB_CATEGORY),
        Some(raw) => raw.trim().to_uppercase().parse::<LabCategory>().ok(),
    };

    inputs
        .iter()
        .map(|input| {
            let info = category.and_then(|c| reference::parameter_info(&input.key, c));
            let status = category
                .map(|c| reference::status_for(&input.key, input.value, c))
                .unwrap_or(ParameterStatus::Normal);

            LabParameter {
                key: input.key.clone(),
                name: input
                    .name
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .or_else(|| info.map(|i| i.display_name.to_string()))
                    .unwrap_or_else(|| input.key.clone()),
                value: Some(input.value),
                unit: input
                    .unit
                    .clone()
                    .or_else(|| info.map(|i| i.unit.to_string())),
                ref_min: input.ref_min.or(info.map(|i| i.ref_min)),
                ref_max: input.ref_max.or(info.map(|i| i.ref_max)),
                status: Some(status),
            }
        })
        .collect()
}

/// Stored status of a parameter, else the status its value has in the reference table.
pub fn parameter_status(lab: &LabResult, param: &LabParameter) -> Option<ParameterStatus> {
    param.status.or_else(|| {
        let category = lab.reference_category()?;
        let value = param.value?;
        reference::parameter_info(&param.key, category).map(|r| r.classify(value))
    })
}
