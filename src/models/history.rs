use serde::{Deserialize, Serialize};

use super::timestamp::RawTimestamp;

/// The patient's standing medical history (one document per patient).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalHistory {
    pub allergies: Option<String>,
    /// Stored as `medicalHistory` by older clients.
    #[serde(alias = "medicalHistory")]
    pub chronic_diseases: Option<String>,
    pub current_medications: Option<String>,
    pub surgical_history: Option<String>,
    pub family_history: Option<String>,
    pub social_history: Option<String>,
    pub complaint_history: Option<String>,
    pub smoking: Option<bool>,
    pub alcohol: Option<bool>,
    pub updated_at: Option<RawTimestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_medical_history_field_maps_to_chronic_diseases() {
        let history: MedicalHistory =
            serde_json::from_str(r#"{"medicalHistory": "Hipertansiyon", "smoking": true}"#)
                .unwrap();
        assert_eq!(history.chronic_diseases.as_deref(), Some("Hipertansiyon"));
        assert_eq!(history.smoking, Some(true));
        assert!(history.allergies.is_none());
    }
}
