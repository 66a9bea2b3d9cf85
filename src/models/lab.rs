use serde::{Deserialize, Serialize};

use super::enums::{LabCategory, ParameterStatus};
use super::timestamp::RawTimestamp;

/// Category assumed when a lab result carries none.
pub const DEFAULT_LAB_CATEGORY: LabCategory = LabCategory::Biochemistry;

/// One named numeric observation inside a lab panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabParameter {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub ref_min: Option<f64>,
    pub ref_max: Option<f64>,
    pub status: Option<ParameterStatus>,
}

/// A parameter as entered by a clinician or OCR review, before reference data is applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterInput {
    pub key: String,
    pub name: Option<String>,
    pub value: f64,
    pub unit: Option<String>,
    pub ref_min: Option<f64>,
    pub ref_max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabResult {
    pub id: Option<String>,
    pub patient_id: Option<String>,
    pub test_name: Option<String>,
    pub test_type: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub parameters: Vec<LabParameter>,
    /// Free-form results blob used when no structured parameters exist.
    pub results: Option<serde_json::Value>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub ordered_at: Option<RawTimestamp>,
    pub resulted_at: Option<RawTimestamp>,
}

impl LabResult {
    /// Best available label: test name, then test type, then category.
    pub fn display_name(&self) -> &str {
        [&self.test_name, &self.test_type, &self.category]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .find(|v| !v.trim().is_empty())
            .unwrap_or("N/A")
    }

    /// Reference-table category this result is evaluated against, if it has one.
    pub fn reference_category(&self) -> Option<LabCategory> {
        match self.category.as_deref() {
            None => Some(DEFAULT_LAB_CATEGORY),
            Some(c) => c.trim().to_uppercase().parse().ok(),
        }
    }

    /// The raw results blob, unless it is null or an empty object/array/string.
    pub fn raw_results(&self) -> Option<&serde_json::Value> {
        use serde_json::Value;
        match self.results.as_ref()? {
            Value::Null => None,
            Value::Object(map) if map.is_empty() => None,
            Value::Array(items) if items.is_empty() => None,
            Value::String(s) if s.trim().is_empty() => None,
            other => Some(other),
        }
    }
}
