use serde::{Deserialize, Serialize};

use crate::models::*;

/// Time-series records of one patient, each list newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicalSnapshot {
    pub vitals: Vec<VitalSign>,
    pub labs: Vec<LabResult>,
    pub imaging: Vec<ImagingResult>,
}

/// Read-only view of a patient's clinical state, rebuilt for every request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientContext {
    pub demographics: Demographics,
    pub records: ClinicalSnapshot,
    pub history: Option<MedicalHistory>,
}

/// Any timestamped patient observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClinicalRecord {
    Vital(VitalSign),
    Lab(LabResult),
    Imaging(ImagingResult),
}

impl ClinicalRecord {
    /// When the observation was taken (`recordedAt` / `orderedAt`).
    pub fn observed_at(&self) -> Option<&RawTimestamp> {
        match self {
            Self::Vital(v) => v.recorded_at.as_ref(),
            Self::Lab(l) => l.ordered_at.as_ref(),
            Self::Imaging(i) => i.ordered_at.as_ref(),
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::Vital(_) => ChangeKind::Vital,
            Self::Lab(_) => ChangeKind::Lab,
            Self::Imaging(_) => ChangeKind::Imaging,
        }
    }
}

/// A record newer than the conversation cutoff. Derived per turn, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub timestamp: CanonicalInstant,
    pub record: ClinicalRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionRole {
    System,
    User,
    Assistant,
}

impl From<ChatRole> for CompletionRole {
    fn from(role: ChatRole) -> Self {
        match role {
            ChatRole::User => Self::User,
            ChatRole::Assistant => Self::Assistant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionMessage {
    pub role: CompletionRole,
    pub content: String,
}

impl CompletionMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: CompletionRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: CompletionRole::User,
            content: content.into(),
        }
    }
}

/// Everything sent to the completion service for one call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<CompletionMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Raw answer of the completion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub model: String,
    pub total_tokens: u32,
}
