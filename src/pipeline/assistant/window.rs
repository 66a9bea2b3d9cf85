use crate::models::{CanonicalInstant, ChatRole, ChatTurn};

use super::normalize::normalize_timestamp;

/// The bounded, chronological slice of chat history shown to the completion service.
///
/// The change-detection cutoff is read from this same slice, so "what changed since we
/// last spoke" matches what the model is shown of the conversation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatWindow {
    turns: Vec<ChatTurn>,
}

impl ChatWindow {
    /// Keep the `size` most recent turns, oldest first. Input order is irrelevant;
    /// turns with equal timestamps keep their relative order.
    pub fn from_history(history: &[ChatTurn], size: usize) -> Self {
        let mut turns = history.to_vec();
        turns.sort_by_key(|t| normalize_timestamp(&t.created_at));
        let skip = turns.len().saturating_sub(size);
        turns.drain(..skip);
        Self { turns }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Timestamp of the latest assistant turn in the window, else the origin.
    pub fn cutoff(&self) -> CanonicalInstant {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == ChatRole::Assistant)
            .map(|t| normalize_timestamp(&t.created_at))
            .unwrap_or(CanonicalInstant::Origin)
    }
}
