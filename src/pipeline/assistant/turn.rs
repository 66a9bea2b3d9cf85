use crate::config::AssistantConfig;
use crate::models::ChatTurn;

use super::changes::{detect_changes, render_changes};
use super::context::assemble_context;
use super::prompt::{build_briefing, CHAT_SYSTEM_PROMPT};
use super::types::{ChangeEvent, CompletionMessage, CompletionRequest, PatientContext};
use super::window::ChatWindow;

/// Compose the completion request of one chat turn.
///
/// Message order: system briefing (persona, patient context, recent changes),
/// the windowed history oldest first, then the new user message. Pure.
pub fn build_turn(
    window: &ChatWindow,
    context: Option<&PatientContext>,
    changes: &[ChangeEvent],
    new_user_message: &str,
    config: &AssistantConfig,
) -> CompletionRequest {
    let persona = config.persona.as_deref().unwrap_or(CHAT_SYSTEM_PROMPT);
    let context_text = context
        .map(|c| assemble_context(c, &config.context))
        .unwrap_or_default();
    let changes_text = (!changes.is_empty()).then(|| render_changes(changes, &config.context));
    let briefing = build_briefing(persona, &context_text, changes_text.as_deref());

    let mut messages = Vec::with_capacity(window.len() + 2);
    if !briefing.is_empty() {
        messages.push(CompletionMessage::system(briefing));
    }
    messages.extend(window.turns().iter().map(|t| CompletionMessage {
        role: t.role.into(),
        content: t.content.clone(),
    }));
    messages.push(CompletionMessage::user(new_user_message));

    CompletionRequest {
        model: config.completion.model.clone(),
        messages,
        temperature: config.completion.chat_temperature,
        max_tokens: config.completion.chat_max_tokens,
    }
}

/// A composed turn together with the intermediate results it was built from.
#[derive(Debug, Clone)]
pub struct PreparedTurn {
    pub request: CompletionRequest,
    pub changes: Vec<ChangeEvent>,
    pub window: ChatWindow,
}

/// Window the history, take the cutoff from that window, detect changes against it,
/// and build the request.
pub fn prepare_turn(
    history: &[ChatTurn],
    context: &PatientContext,
    new_user_message: &str,
    config: &AssistantConfig,
) -> PreparedTurn {
    let window = ChatWindow::from_history(history, config.history_window);
    let cutoff = window.cutoff();
    let changes = detect_changes(&context.records, &cutoff);
    let request = build_turn(&window, Some(context), &changes, new_user_message, config);
    PreparedTurn {
        request,
        changes,
        window,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;
    use crate::pipeline::assistant::prompt::RECENT_CHANGES_HEADER;
    use crate::pipeline::assistant::types::{ClinicalSnapshot, CompletionRole};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
    }

    fn turn(minute: i64, role: ChatRole) -> ChatTurn {
        ChatTurn::new(
            role,
            format!("mesaj {minute}"),
            RawTimestamp::Instant(base() + Duration::minutes(minute)),
        )
    }

    fn vital_at(minute: i64, hr: f64) -> VitalSign {
        VitalSign {
            heart_rate: Some(hr),
            recorded_at: Some(RawTimestamp::Instant(base() + Duration::minutes(minute))),
            ..Default::default()
        }
    }

    fn patient(records: ClinicalSnapshot) -> PatientContext {
        PatientContext {
            demographics: Demographics {
                name: "Mehmet Demir".into(),
                age: Some(54),
                ..Default::default()
            },
            records,
            history: None,
        }
    }

    #[test]
    fn sixty_turns_window_of_fifty() {
        // Assistant turns at minutes 5 (discarded) and 40 (kept); user otherwise.
        let history: Vec<ChatTurn> = (0..60)
            .rev()
            .map(|m| {
                let role = if m == 5 || m == 40 { ChatRole::Assistant } else { ChatRole::User };
                turn(m, role)
            })
            .collect();
        let context = patient(ClinicalSnapshot {
            vitals: vec![vital_at(45, 130.0), vital_at(30, 110.0), vital_at(2, 90.0)],
            ..Default::default()
        });

        let prepared = prepare_turn(&history, &context, "Yeni nabız nasıl?", &AssistantConfig::default());

        assert_eq!(prepared.window.len(), 50);
        assert_eq!(
            prepared.window.cutoff(),
            CanonicalInstant::At(base() + Duration::minutes(40))
        );
        assert_eq!(prepared.changes.len(), 1);
        assert_eq!(
            prepared.changes[0].timestamp,
            CanonicalInstant::At(base() + Duration::minutes(45))
        );

        let messages = &prepared.request.messages;
        assert_eq!(messages.len(), 52);
        assert_eq!(messages[0].role, CompletionRole::System);
        let history_contents: Vec<&str> =
            messages[1..51].iter().map(|m| m.content.as_str()).collect();
        let expected: Vec<String> = (10..60).map(|m| format!("mesaj {m}")).collect();
        assert_eq!(history_contents, expected);
        assert_eq!(messages[31].role, CompletionRole::Assistant);
        assert_eq!(messages[51].role, CompletionRole::User);
        assert_eq!(messages[51].content, "Yeni nabız nasıl?");
    }

    #[test]
    fn discarded_assistant_turn_does_not_set_cutoff() {
        let history: Vec<ChatTurn> = (0..60)
            .map(|m| turn(m, if m == 5 { ChatRole::Assistant } else { ChatRole::User }))
            .collect();
        let context = patient(ClinicalSnapshot {
            vitals: vec![vital_at(3, 90.0)],
            ..Default::default()
        });
        let prepared = prepare_turn(&history, &context, "?", &AssistantConfig::default());
        assert_eq!(prepared.window.cutoff(), CanonicalInstant::Origin);
        // Measured before the discarded assistant turn, yet reported from the origin cutoff.
        assert_eq!(prepared.changes.len(), 1);
    }

    #[test]
    fn first_turn_narrates_all_existing_data() {
        let context = patient(ClinicalSnapshot {
            vitals: vec![vital_at(20, 120.0), vital_at(10, 80.0)],
            ..Default::default()
        });
        let prepared = prepare_turn(&[], &context, "Durum?", &AssistantConfig::default());
        assert_eq!(prepared.changes.len(), 2);
        let system = &prepared.request.messages[0].content;
        assert!(system.contains(RECENT_CHANGES_HEADER));
        assert_eq!(system.matches("Yeni Vital Bulgu Eklendi").count(), 2);
        assert_eq!(prepared.request.messages.len(), 2);
    }

    #[test]
    fn no_changes_means_no_changes_block() {
        let history = vec![turn(50, ChatRole::Assistant)];
        let context = patient(ClinicalSnapshot {
            vitals: vec![vital_at(20, 120.0)],
            ..Default::default()
        });
        let prepared = prepare_turn(&history, &context, "Durum?", &AssistantConfig::default());
        assert!(prepared.changes.is_empty());
        let system = &prepared.request.messages[0].content;
        assert!(system.contains("# HASTA BİLGİLERİ:"));
        assert!(!system.contains(RECENT_CHANGES_HEADER));
    }

    #[test]
    fn missing_context_still_builds_request() {
        let window = ChatWindow::default();
        let request = build_turn(&window, None, &[], "Merhaba", &AssistantConfig::default());
        assert_eq!(request.messages.len(), 2);
        assert!(!request.messages[0].content.contains("HASTA BİLGİLERİ"));
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.max_tokens, Some(800));
    }

    #[test]
    fn empty_persona_and_context_send_only_user_turn() {
        let config = AssistantConfig {
            persona: Some(String::new()),
            ..Default::default()
        };
        let request = build_turn(&ChatWindow::default(), None, &[], "Merhaba", &config);
        assert_eq!(request.messages, vec![CompletionMessage::user("Merhaba")]);
    }

    #[test]
    fn custom_persona_replaces_default() {
        let config = AssistantConfig {
            persona: Some("Kısa yanıt ver.".into()),
            ..Default::default()
        };
        let request = build_turn(&ChatWindow::default(), None, &[], "Merhaba", &config);
        assert_eq!(request.messages[0].content, "Kısa yanıt ver.");
    }
}
