use serde::{Deserialize, Serialize};

use super::enums::ChatRole;
use super::timestamp::RawTimestamp;

/// One stored turn of the per-patient assistant conversation. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    pub id: Option<String>,
    pub role: ChatRole,
    pub content: String,
    pub created_at: Option<RawTimestamp>,
}

impl ChatTurn {
    pub fn new(role: ChatRole, content: impl Into<String>, created_at: RawTimestamp) -> Self {
        Self {
            id: None,
            role,
            content: content.into(),
            created_at: Some(created_at),
        }
    }

    pub fn user(content: impl Into<String>, created_at: RawTimestamp) -> Self {
        Self::new(ChatRole::User, content, created_at)
    }

    pub fn assistant(content: impl Into<String>, created_at: RawTimestamp) -> Self {
        Self::new(ChatRole::Assistant, content, created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_stored_assistant_turn() {
        let turn: ChatTurn = serde_json::from_str(
            r#"{"role": "AI", "content": "Nabız yükselmiş.", "createdAt": "2024-01-01T10:05:00Z"}"#,
        )
        .unwrap();
        assert_eq!(turn.role, ChatRole::Assistant);
        assert_eq!(turn.created_at, Some(RawTimestamp::iso("2024-01-01T10:05:00Z")));
        assert!(turn.id.is_none());
    }
}
