use serde::{Deserialize, Serialize};

use super::timestamp::RawTimestamp;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagingResult {
    pub id: Option<String>,
    pub patient_id: Option<String>,
    pub imaging_type: Option<String>,
    pub body_part: Option<String>,
    pub findings: Option<String>,
    pub impression: Option<String>,
    pub technique: Option<String>,
    pub radiologist: Option<String>,
    pub image_url: Option<String>,
    pub status: Option<String>,
    pub ordered_at: Option<RawTimestamp>,
    pub completed_at: Option<RawTimestamp>,
}
