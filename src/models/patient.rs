use serde::{Deserialize, Serialize};

/// Demographic and triage fields of a patient, as shown at the top of every context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub complaint: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
}
