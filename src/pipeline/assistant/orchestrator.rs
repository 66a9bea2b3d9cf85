use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::Instrument;

use crate::config::AssistantConfig;
use crate::models::{ChatTurn, RawTimestamp};

use super::analysis::{build_analysis_request, parse_analysis_response, ClinicalAnalysis};
use super::completion::CompletionService;
use super::locks::{PatientTurnLocks, TurnGuard};
use super::normalize::sort_snapshot;
use super::source::{ChatTurnSink, PatientRecordSource};
use super::turn::prepare_turn;
use super::types::{ClinicalSnapshot, PatientContext};
use super::AssistantError;

/// Answer of one chat turn, with the metadata the calling layer shows or stores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistantReply {
    pub message: String,
    pub model: String,
    pub total_tokens: u32,
    pub recent_changes_count: usize,
    pub has_recent_changes: bool,
    /// When the records behind this answer were read.
    pub context_as_of: DateTime<Utc>,
}

impl AssistantReply {
    /// The user turn and the assistant turn to persist, in that order.
    ///
    /// The assistant turn is stamped with [`AssistantReply::context_as_of`], not the
    /// time the answer arrived: it becomes the next turn's cutoff, and a record written
    /// while the completion was running must still count as new then.
    pub fn into_turns(self, user_message: &str, asked_at: DateTime<Utc>) -> Vec<ChatTurn> {
        let answered_at = self.context_as_of;
        vec![
            ChatTurn::user(user_message, RawTimestamp::Instant(asked_at.min(answered_at))),
            ChatTurn::assistant(self.message, RawTimestamp::Instant(answered_at)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub analysis: ClinicalAnalysis,
    pub model: String,
    pub total_tokens: u32,
}

/// Clinical assistant over one record source and one completion service.
///
/// Coordinates: fetch → sort → window → detect → compose → complete.
pub struct ClinicalAssistant<S: PatientRecordSource, C: CompletionService> {
    source: S,
    completion: C,
    config: AssistantConfig,
    /// `None` runs concurrent turns of one patient unserialized.
    locks: Option<PatientTurnLocks>,
}

impl<S: PatientRecordSource + Sync, C: CompletionService + Sync> ClinicalAssistant<S, C> {
    pub fn new(source: S, completion: C, config: AssistantConfig) -> Self {
        Self {
            source,
            completion,
            config,
            locks: Some(PatientTurnLocks::new()),
        }
    }

    /// Concurrent turns for one patient may read the same cutoff and narrate the
    /// same changes twice.
    pub fn without_turn_serialization(source: S, completion: C, config: AssistantConfig) -> Self {
        Self {
            locks: None,
            ..Self::new(source, completion, config)
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Answer one clinician message about a patient. Nothing is persisted; a caller
    /// that stores the exchange itself should use [`AssistantReply::into_turns`].
    pub async fn send_message(
        &self,
        patient_id: &str,
        message: &str,
    ) -> Result<AssistantReply, AssistantError> {
        let message = validate_message(message)?;
        let _guard = self.lock_patient(patient_id).await?;
        self.run_turn(patient_id, message)
            .instrument(tracing::info_span!("chat_turn", patient_id = %patient_id))
            .await
    }

    /// Answer one message and persist both turns before releasing the patient, so the
    /// next turn's cutoff already covers what this one narrated.
    pub async fn send_and_record<K: ChatTurnSink + Sync>(
        &self,
        sink: &K,
        patient_id: &str,
        message: &str,
    ) -> Result<AssistantReply, AssistantError> {
        let message = validate_message(message)?;
        let _guard = self.lock_patient(patient_id).await?;
        let asked_at = Utc::now();
        let reply = self
            .run_turn(patient_id, message)
            .instrument(tracing::info_span!("chat_turn", patient_id = %patient_id))
            .await?;
        let turns = reply.clone().into_turns(message, asked_at);
        sink.append_turns(patient_id, turns).await?;
        Ok(reply)
    }

    /// One-shot structured analysis of a patient.
    pub async fn analyze_patient(&self, patient_id: &str) -> Result<AnalysisReport, AssistantError> {
        async {
            let context = self.load_context(patient_id).await?;
            let request = build_analysis_request(&context, &self.config);
            let completion = self.completion.complete(&request).await.inspect_err(|e| {
                tracing::error!(error = %e, "Analysis completion failed");
            })?;
            let analysis = parse_analysis_response(&completion.text).inspect_err(|e| {
                tracing::warn!(error = %e, "Analysis answer rejected");
            })?;

            tracing::info!(
                risk_score = analysis.risk_score,
                emergency = analysis.emergency,
                differentials = analysis.differentials.len(),
                "AI analysis generated"
            );
            Ok(AnalysisReport {
                analysis,
                model: completion.model,
                total_tokens: completion.total_tokens,
            })
        }
        .instrument(tracing::info_span!("analysis", patient_id = %patient_id))
        .await
    }

    async fn lock_patient(&self, patient_id: &str) -> Result<Option<TurnGuard>, AssistantError> {
        match &self.locks {
            Some(locks) => locks.acquire(patient_id).await.map(Some),
            None => Ok(None),
        }
    }

    async fn run_turn(&self, patient_id: &str, message: &str) -> Result<AssistantReply, AssistantError> {
        let context_as_of = Utc::now();
        let (context, history) = tokio::try_join!(
            self.load_context(patient_id),
            self.source.chat_history(patient_id),
        )?;

        let prepared = prepare_turn(&history, &context, message, &self.config);
        tracing::debug!(
            window = prepared.window.len(),
            changes = prepared.changes.len(),
            "Turn prepared"
        );

        let completion = self
            .completion
            .complete(&prepared.request)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Chat completion failed"))?;

        tracing::info!(
            changes = prepared.changes.len(),
            tokens = completion.total_tokens,
            "Chat turn completed"
        );
        Ok(AssistantReply {
            message: completion.text,
            model: completion.model,
            total_tokens: completion.total_tokens,
            recent_changes_count: prepared.changes.len(),
            has_recent_changes: !prepared.changes.is_empty(),
            context_as_of,
        })
    }

    /// Fetch every category concurrently, then sort each newest first.
    async fn load_context(&self, patient_id: &str) -> Result<PatientContext, AssistantError> {
        let (demographics, vitals, labs, imaging, history) = tokio::try_join!(
            self.source.demographics(patient_id),
            self.source.vitals(patient_id),
            self.source.labs(patient_id),
            self.source.imaging(patient_id),
            self.source.medical_history(patient_id),
        )?;
        let demographics =
            demographics.ok_or_else(|| AssistantError::PatientNotFound(patient_id.to_string()))?;

        let mut records = ClinicalSnapshot {
            vitals,
            labs,
            imaging,
        };
        sort_snapshot(&mut records);

        Ok(PatientContext {
            demographics,
            records,
            history,
        })
    }
}

fn validate_message(message: &str) -> Result<&str, AssistantError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(AssistantError::EmptyMessage);
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;
    use crate::pipeline::assistant::completion::MockCompletion;
    use crate::pipeline::assistant::prompt::RECENT_CHANGES_HEADER;
    use crate::pipeline::assistant::source::{InMemoryRecordSource, PatientRecords};
    use chrono::Duration;
    use std::sync::Arc;

    fn minutes_ago(m: i64) -> RawTimestamp {
        RawTimestamp::Instant(Utc::now() - Duration::minutes(m))
    }

    fn records() -> PatientRecords {
        PatientRecords {
            demographics: Demographics {
                id: Some("p1".into()),
                name: "Hasan Çelik".into(),
                age: Some(63),
                gender: Some("Erkek".into()),
                complaint: Some("Göğüs ağrısı".into()),
                status: Some("KIRMIZI".into()),
                priority: None,
            },
            vitals: vec![
                VitalSign {
                    heart_rate: Some(88.0),
                    recorded_at: Some(minutes_ago(60)),
                    ..Default::default()
                },
                VitalSign {
                    heart_rate: Some(124.0),
                    recorded_at: Some(minutes_ago(5)),
                    ..Default::default()
                },
            ],
            labs: vec![LabResult {
                test_name: Some("Troponin".into()),
                category: Some("CARDIAC".into()),
                ordered_at: Some(minutes_ago(20)),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn assistant_with(
        completion: MockCompletion,
    ) -> ClinicalAssistant<InMemoryRecordSource, MockCompletion> {
        let source = InMemoryRecordSource::new().with_patient("p1", records());
        ClinicalAssistant::new(source, completion, AssistantConfig::default())
    }

    #[tokio::test]
    async fn empty_message_is_rejected_before_any_call() {
        let assistant = assistant_with(MockCompletion::new("ok"));
        let err = assistant.send_message("p1", "   \n").await.unwrap_err();
        assert!(matches!(err, AssistantError::EmptyMessage));
        assert!(assistant.completion.recorded().is_empty());
    }

    #[tokio::test]
    async fn unknown_patient_is_not_found() {
        let assistant = assistant_with(MockCompletion::new("ok"));
        let err = assistant.send_message("p404", "Durum?").await.unwrap_err();
        assert!(matches!(err, AssistantError::PatientNotFound(id) if id == "p404"));
        let err = assistant.analyze_patient("p404").await.unwrap_err();
        assert!(matches!(err, AssistantError::PatientNotFound(_)));
    }

    #[tokio::test]
    async fn first_turn_sorts_records_and_narrates_everything() {
        let assistant = assistant_with(MockCompletion::new("Nabız 124'e yükselmiş."));
        let reply = assistant.send_message("p1", "  Son durum?  ").await.unwrap();

        assert_eq!(reply.message, "Nabız 124'e yükselmiş.");
        assert_eq!(reply.model, "gpt-4o-mini");
        assert_eq!(reply.total_tokens, 42);
        assert_eq!(reply.recent_changes_count, 3);
        assert!(reply.has_recent_changes);

        let request = &assistant.completion.recorded()[0];
        let system = &request.messages[0].content;
        // Stored oldest first; the context shows the newest as the latest reading.
        assert!(system.contains("### 🆕 Son Ölçüm"));
        let latest = system.find("Nabız: 124 bpm").unwrap();
        let previous = system.find("Nabız: 88 bpm").unwrap();
        assert!(latest < previous);
        assert!(system.contains("- Durum: KIRMIZI"));
        assert!(system.contains("- Öncelik: orta"));
        assert!(system.contains(RECENT_CHANGES_HEADER));
        assert_eq!(request.messages.last().unwrap().content, "Son durum?");
    }

    #[tokio::test]
    async fn recorded_turn_moves_the_cutoff() {
        let assistant = assistant_with(MockCompletion::new("Değerlendirildi."));
        let first = assistant
            .send_and_record(assistant.source(), "p1", "Durum?")
            .await
            .unwrap();
        assert_eq!(first.recent_changes_count, 3);

        let history = assistant.source().chat_history("p1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, ChatRole::User);
        assert_eq!(history[1].content, "Değerlendirildi.");

        let second = assistant.send_message("p1", "Yeni bir şey var mı?").await.unwrap();
        assert_eq!(second.recent_changes_count, 0);
        assert!(!second.has_recent_changes);
        let request = assistant.completion.recorded().pop().unwrap();
        assert!(!request.messages[0].content.contains(RECENT_CHANGES_HEADER));
        assert_eq!(request.messages.len(), 4);
    }

    #[tokio::test]
    async fn only_records_after_last_assistant_turn_are_narrated() {
        let mut stored = records();
        stored.chat_history = vec![
            ChatTurn::user("İlk soru", minutes_ago(31)),
            ChatTurn::assistant("İlk yanıt", minutes_ago(30)),
        ];
        let source = InMemoryRecordSource::new().with_patient("p1", stored);
        let assistant =
            ClinicalAssistant::new(source, MockCompletion::new("ok"), AssistantConfig::default());

        let reply = assistant.send_message("p1", "Ne değişti?").await.unwrap();
        // The 5- and 20-minute-old records, not the hour-old vital.
        assert_eq!(reply.recent_changes_count, 2);
        let system = assistant.completion.recorded()[0].messages[0].content.clone();
        assert!(system.contains("Yeni Vital Bulgu Eklendi"));
        assert!(system.contains("Yeni Lab Sonucu Eklendi"));
    }

    #[tokio::test]
    async fn record_written_during_completion_is_narrated_next_turn() {
        let source = InMemoryRecordSource::new().with_patient(
            "p1",
            PatientRecords {
                demographics: records().demographics,
                ..Default::default()
            },
        );
        let completion = MockCompletion::new("ok").with_delay(std::time::Duration::from_millis(200));
        let assistant = ClinicalAssistant::new(source, completion, AssistantConfig::default());

        let late_vital = async {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            assistant
                .source()
                .insert(
                    "p1",
                    PatientRecords {
                        demographics: records().demographics,
                        vitals: vec![VitalSign {
                            heart_rate: Some(160.0),
                            recorded_at: Some(RawTimestamp::Instant(Utc::now())),
                            ..Default::default()
                        }],
                        ..Default::default()
                    },
                )
                .unwrap();
        };
        let (first, ()) = tokio::join!(
            assistant.send_and_record(assistant.source(), "p1", "Durum?"),
            late_vital,
        );
        let first = first.unwrap();
        assert_eq!(first.recent_changes_count, 0);

        let history = assistant.source().chat_history("p1").await.unwrap();
        assert_eq!(
            history[1].created_at,
            Some(RawTimestamp::Instant(first.context_as_of))
        );

        let second = assistant.send_message("p1", "Yeni bir şey var mı?").await.unwrap();
        assert_eq!(second.recent_changes_count, 1);
        let system = assistant.completion.recorded().pop().unwrap().messages[0].content.clone();
        assert!(system.contains("Nabız: 160 bpm"));
    }

    #[test]
    fn user_turn_never_sorts_after_its_answer() {
        let context_as_of = Utc::now();
        let reply = AssistantReply {
            message: "Yanıt".into(),
            model: "m".into(),
            total_tokens: 0,
            recent_changes_count: 0,
            has_recent_changes: false,
            context_as_of,
        };
        let turns = reply.into_turns("Soru", context_as_of + Duration::seconds(5));
        assert_eq!(turns[0].created_at, Some(RawTimestamp::Instant(context_as_of)));
        assert_eq!(turns[1].created_at, Some(RawTimestamp::Instant(context_as_of)));
        assert_eq!(turns[1].role, ChatRole::Assistant);
    }

    #[tokio::test]
    async fn upstream_failure_propagates_and_nothing_is_recorded() {
        let assistant = assistant_with(MockCompletion::failing("503 Service Unavailable"));
        let err = assistant
            .send_and_record(assistant.source(), "p1", "Durum?")
            .await
            .unwrap_err();
        assert!(matches!(err, AssistantError::UpstreamService(m) if m.contains("503")));
        assert!(assistant.source().chat_history("p1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn analysis_returns_ranked_report() {
        let answer = r#"```json
{"genel_risk_skoru": 82, "acil_durum": true,
 "olasi_tanilar": [{"tani": "Stabil angina", "olasilik": 30},
                   {"tani": "NSTEMI", "olasilik": 70}],
 "klinik_oneri": "Seri troponin."}
```"#;
        let assistant = assistant_with(MockCompletion::new(answer));
        let report = assistant.analyze_patient("p1").await.unwrap();
        assert!(report.analysis.emergency);
        assert_eq!(report.analysis.differentials[0].diagnosis, "NSTEMI");
        assert_eq!(report.total_tokens, 42);

        let request = &assistant.completion.recorded()[0];
        assert_eq!(request.messages.len(), 2);
        assert!(request.messages[1].content.contains("  * Nabız: 124 bpm"));
    }

    #[tokio::test]
    async fn unparsable_analysis_is_schema_error_not_upstream() {
        let assistant = assistant_with(MockCompletion::new("Analiz şu an yapılamıyor."));
        let err = assistant.analyze_patient("p1").await.unwrap_err();
        assert!(matches!(err, AssistantError::ResponseSchema(_)));
    }

    #[tokio::test]
    async fn serialized_turns_narrate_changes_once() {
        let completion = MockCompletion::new("ok").with_delay(std::time::Duration::from_millis(50));
        let assistant = Arc::new(assistant_with(completion));

        let a = {
            let assistant = Arc::clone(&assistant);
            tokio::spawn(async move {
                assistant
                    .send_and_record(assistant.source(), "p1", "Birinci")
                    .await
                    .unwrap()
            })
        };
        let b = {
            let assistant = Arc::clone(&assistant);
            tokio::spawn(async move {
                assistant
                    .send_and_record(assistant.source(), "p1", "İkinci")
                    .await
                    .unwrap()
            })
        };
        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        let mut counts = [a.recent_changes_count, b.recent_changes_count];
        counts.sort();
        assert_eq!(counts, [0, 3]);
        assert_eq!(assistant.source().chat_history("p1").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn unserialized_turns_may_narrate_twice() {
        let source = InMemoryRecordSource::new().with_patient("p1", records());
        let completion = MockCompletion::new("ok").with_delay(std::time::Duration::from_millis(50));
        let assistant = ClinicalAssistant::without_turn_serialization(
            source,
            completion,
            AssistantConfig::default(),
        );
        let (a, b) = tokio::join!(
            assistant.send_and_record(assistant.source(), "p1", "Birinci"),
            assistant.send_and_record(assistant.source(), "p1", "İkinci"),
        );
        assert_eq!(a.unwrap().recent_changes_count, 3);
        assert_eq!(b.unwrap().recent_changes_count, 3);
    }
}
