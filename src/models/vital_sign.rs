use serde::{Deserialize, Serialize};

use super::timestamp::RawTimestamp;

/// A single bedside vital-sign measurement. Every reading is optional:
/// an absent value is clinically meaningful and is rendered, never dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalSign {
    pub id: Option<String>,
    pub patient_id: Option<String>,
    pub heart_rate: Option<f64>,
    pub blood_pressure_systolic: Option<f64>,
    pub blood_pressure_diastolic: Option<f64>,
    pub temperature: Option<f64>,
    pub oxygen_saturation: Option<f64>,
    pub respiratory_rate: Option<f64>,
    pub consciousness: Option<String>,
    /// When the observation was taken (not when it was stored).
    pub recorded_at: Option<RawTimestamp>,
}
