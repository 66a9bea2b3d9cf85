//! One-shot structured clinical analysis: prompt construction and response validation.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::AssistantConfig;
use crate::models::*;

use super::context::yes_no;
use super::normalize::parameter_status;
use super::prompt::ANALYSIS_SYSTEM_PROMPT;
use super::render::*;
use super::types::{CompletionMessage, CompletionRequest, PatientContext};
use super::AssistantError;

const ANALYSIS_TASK: &str = r#"GÖREV: Bu acil servis hastası için detaylı klinik analiz yap.

Yanıtını şu JSON formatında ver:
{
  "genel_risk_skoru": <0-100 arası sayı>,
  "acil_durum": <true/false - hayati tehlike var mı?>,
  "eksik_veriler": [<string array - eksik kritik test/bulgular>],
  "olasi_tanilar": [
    {
      "tani": "<tanı adı>",
      "icd10": "<ICD-10 kodu>",
      "olasilik": <0-100 arası yüzde>,
      "severity": "<CRITICAL/HIGH/MEDIUM/LOW>",
      "aciklama": "<kısa açıklama>",
      "destekleyen_bulgular": [<string array>]
    }
  ],
  "onerilen_tetkikler": [
    {
      "test": "<test adı>",
      "oncelik": "<URGENT/HIGH/MEDIUM/LOW>",
      "neden": "<kısa açıklama>"
    }
  ],
  "acil_mudahale": [
    {
      "mudahale": "<müdahale>",
      "oncelik": "<IMMEDIATE/URGENT/ROUTINE>",
      "aciklama": "<detay>"
    }
  ],
  "risk_faktorleri": [
    {
      "risk": "<risk faktörü>",
      "seviye": "<HIGH/MEDIUM/LOW>",
      "aciklama": "<detay>"
    }
  ],
  "klinik_oneri": "<genel klinik öneri ve yorum>"
}

ÖNEMLİ:
- Tanıları olasılık sırasına göre sırala (en yüksek ilk)
- Severity seviyelerini doğru belirle (CRITICAL=hayati tehlike, HIGH=acil, MEDIUM=dikkat, LOW=rutin)
- Acil durum flag'ini sadece gerçekten hayati tehlike varsa true yap
- Eksik verileri belirt (örn: "Tam kan sayımı yok", "EKG çekilmemiş")"#;

/// Build the analysis prompt: demographics, the latest vital sign, every lab and
/// imaging study, medical history, then the task and the JSON answer schema.
pub fn build_analysis_prompt(patient: &PatientContext) -> String {
    let d = &patient.demographics;
    let mut sections = vec![format!(
        "Hasta Bilgileri:\n- İsim: {}\n- Yaş: {}\n- Cinsiyet: {}\n- Şikayet: {}",
        text_or(Some(d.name.as_str()), MISSING),
        d.age.map(|a| a.to_string()).unwrap_or_else(|| MISSING.to_string()),
        text_or(d.gender.as_deref(), MISSING),
        text_or(d.complaint.as_deref(), MISSING),
    )];

    if let Some(v) = patient.records.vitals.first() {
        sections.push(format!(
            "- Vital Bulgular:\n\
             \x20 * Nabız: {} bpm\n\
             \x20 * Tansiyon: {}/{} mmHg\n\
             \x20 * Ateş: {}°C\n\
             \x20 * SpO2: {}%\n\
             \x20 * Solunum: {}/dk",
            number_or_missing(v.heart_rate),
            number_or_missing(v.blood_pressure_systolic),
            number_or_missing(v.blood_pressure_diastolic),
            number_or_missing(v.temperature),
            number_or_missing(v.oxygen_saturation),
            number_or_missing(v.respiratory_rate),
        ));
    }

    if !patient.records.labs.is_empty() {
        let labs: Vec<String> = patient.records.labs.iter().map(lab_summary).collect();
        sections.push(format!("- Laboratuvar Sonuçları:\n{}", labs.join("\n")));
    }

    if !patient.records.imaging.is_empty() {
        let studies: Vec<String> = patient.records.imaging.iter().map(imaging_summary).collect();
        sections.push(format!("- Görüntüleme Bulguları:\n{}", studies.join("\n")));
    }

    if let Some(h) = &patient.history {
        sections.push(format!(
            "- Tıbbi Geçmiş:\n\
             \x20 * Alerjiler: {}\n\
             \x20 * Kronik Hastalıklar: {}\n\
             \x20 * Kullandığı İlaçlar: {}\n\
             \x20 * Geçirilmiş Ameliyatlar: {}\n\
             \x20 * Sigara: {}\n\
             \x20 * Alkol: {}",
            text_or(h.allergies.as_deref(), "Yok"),
            text_or(h.chronic_diseases.as_deref(), "Yok"),
            text_or(h.current_medications.as_deref(), "Yok"),
            text_or(h.surgical_history.as_deref(), "Yok"),
            yes_no(h.smoking),
            yes_no(h.alcohol),
        ));
    }

    sections.push(ANALYSIS_TASK.to_string());
    sections.join("\n\n")
}

fn lab_summary(lab: &LabResult) -> String {
    let params: Vec<String> = lab
        .parameters
        .iter()
        .filter_map(|p| {
            let label = parameter_label(p)?;
            let status = parameter_status(lab, p)
                .map(|s| s.as_str())
                .unwrap_or(MISSING);
            Some(format!(
                "{label}: {} [Normal: {}] - {status}",
                value_with_unit(p),
                reference_range(p)
            ))
        })
        .collect();

    let category = text_or(lab.category.as_deref(), MISSING);
    if !params.is_empty() {
        format!("  * {} ({category}): {}", lab.display_name(), params.join(", "))
    } else {
        let results = lab
            .raw_results()
            .map(|r| raw_results(r, false))
            .unwrap_or_else(|| MISSING.to_string());
        format!("  * {} ({category}): {results}", lab.display_name())
    }
}

fn imaging_summary(img: &ImagingResult) -> String {
    let mut text = format!(
        "  * {} - {}:\n    Bulgular: {}",
        text_or(img.imaging_type.as_deref(), MISSING),
        text_or(img.body_part.as_deref(), "Genel"),
        text_or(img.findings.as_deref(), "Rapor bekleniyor"),
    );
    if let Some(impression) = present(img.impression.as_deref()) {
        text.push_str(&format!("\n    Yorum: {impression}"));
    }
    if let Some(technique) = present(img.technique.as_deref()) {
        text.push_str(&format!("\n    Teknik: {technique}"));
    }
    text
}

/// Completion request for one analysis: fixed system message plus the prompt.
pub fn build_analysis_request(patient: &PatientContext, config: &AssistantConfig) -> CompletionRequest {
    CompletionRequest {
        model: config.completion.model.clone(),
        messages: vec![
            CompletionMessage::system(ANALYSIS_SYSTEM_PROMPT),
            CompletionMessage::user(build_analysis_prompt(patient)),
        ],
        temperature: config.completion.analysis_temperature,
        max_tokens: config.completion.analysis_max_tokens,
    }
}

// ── Response schema ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalAnalysis {
    #[serde(rename = "genel_risk_skoru")]
    pub risk_score: f64,
    #[serde(rename = "acil_durum")]
    pub emergency: bool,
    #[serde(rename = "eksik_veriler", default)]
    pub missing_data: Vec<String>,
    /// Highest probability first.
    #[serde(rename = "olasi_tanilar", default)]
    pub differentials: Vec<Differential>,
    #[serde(rename = "onerilen_tetkikler", default)]
    pub recommended_tests: Vec<RecommendedTest>,
    #[serde(rename = "acil_mudahale", default)]
    pub interventions: Vec<Intervention>,
    #[serde(rename = "risk_faktorleri", default)]
    pub risk_factors: Vec<RiskFactor>,
    #[serde(rename = "klinik_oneri", default)]
    pub clinical_note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Differential {
    #[serde(rename = "tani")]
    pub diagnosis: String,
    #[serde(default)]
    pub icd10: Option<String>,
    #[serde(rename = "olasilik")]
    pub probability: f64,
    #[serde(default, deserialize_with = "lenient_enum")]
    pub severity: Option<DiagnosisSeverity>,
    #[serde(rename = "aciklama", default)]
    pub explanation: Option<String>,
    #[serde(rename = "destekleyen_bulgular", default)]
    pub supporting_findings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedTest {
    pub test: String,
    #[serde(rename = "oncelik", default, deserialize_with = "lenient_enum")]
    pub priority: Option<TestPriority>,
    #[serde(rename = "neden", default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
    #[serde(rename = "mudahale")]
    pub intervention: String,
    #[serde(rename = "oncelik", default, deserialize_with = "lenient_enum")]
    pub priority: Option<InterventionPriority>,
    #[serde(rename = "aciklama", default)]
    pub details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub risk: String,
    #[serde(rename = "seviye", default, deserialize_with = "lenient_enum")]
    pub level: Option<RiskLevel>,
    #[serde(rename = "aciklama", default)]
    pub details: Option<String>,
}

/// Unknown labels become `None` instead of failing the whole answer.
fn lenient_enum<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| T::from_str(&s.trim().to_uppercase()).ok()))
}

/// The JSON body of a model answer: the contents of its first code fence when it
/// has one, else the whole trimmed text.
pub fn strip_code_fences(response: &str) -> &str {
    let Some(open) = response.find("```") else {
        return response.trim();
    };
    let after_ticks = &response[open + 3..];
    // Skip an info string such as `json` up to the end of the line.
    let body_start = match after_ticks.find('\n') {
        Some(nl) if !after_ticks[..nl].contains('{') => nl + 1,
        _ => after_ticks
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(after_ticks.len()),
    };
    let body = &after_ticks[body_start..];
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// Validate a model answer against the analysis schema.
///
/// Differentials come back stably sorted by descending probability.
pub fn parse_analysis_response(response: &str) -> Result<ClinicalAnalysis, AssistantError> {
    let body = strip_code_fences(response);
    let mut analysis: ClinicalAnalysis = serde_json::from_str(body)
        .map_err(|e| AssistantError::ResponseSchema(e.to_string()))?;

    if !(0.0..=100.0).contains(&analysis.risk_score) {
        return Err(AssistantError::ResponseSchema(format!(
            "genel_risk_skoru out of range: {}",
            analysis.risk_score
        )));
    }
    if let Some(d) = analysis
        .differentials
        .iter()
        .find(|d| !(0.0..=100.0).contains(&d.probability))
    {
        return Err(AssistantError::ResponseSchema(format!(
            "olasilik out of range for {}: {}",
            d.diagnosis, d.probability
        )));
    }

    analysis.differentials.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(analysis)
}
