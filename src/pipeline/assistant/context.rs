use crate::config::ContextConfig;
use crate::models::*;

use super::normalize::{normalize_timestamp, parameter_status};
use super::render::*;
use super::types::PatientContext;

/// Assemble the textual clinical summary of one patient.
///
/// Every list must already be sorted newest first. Demographics are always present;
/// each other section appears only when it has content, so a patient with no records
/// gets the demographics block alone. Sections are separated by a blank line.
pub fn build_context(
    demographics: &Demographics,
    vitals: &[VitalSign],
    labs: &[LabResult],
    imaging: &[ImagingResult],
    history: Option<&MedicalHistory>,
    config: &ContextConfig,
) -> String {
    let sections = [
        Some(demographics_section(demographics, config)),
        vitals_section(vitals, config),
        labs_section(labs, config),
        imaging_section(imaging, config),
        history.map(history_section),
    ];

    sections
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// [`build_context`] over an assembled [`PatientContext`].
pub fn assemble_context(context: &PatientContext, config: &ContextConfig) -> String {
    build_context(
        &context.demographics,
        &context.records.vitals,
        &context.records.labs,
        &context.records.imaging,
        context.history.as_ref(),
        config,
    )
}

fn demographics_section(d: &Demographics, config: &ContextConfig) -> String {
    let age = d
        .age
        .map(|a| format!("{a} yaşında"))
        .unwrap_or_else(|| MISSING.to_string());
    format!(
        "## Temel Bilgiler:\n\
         - İsim: {}\n\
         - Yaş: {age}\n\
         - Cinsiyet: {}\n\
         - Şikayet: {}\n\
         - Durum: {}\n\
         - Öncelik: {}",
        text_or(Some(d.name.as_str()), MISSING),
        text_or(d.gender.as_deref(), MISSING),
        text_or(d.complaint.as_deref(), MISSING),
        text_or(d.status.as_deref(), &config.default_status),
        text_or(d.priority.as_deref(), &config.default_priority),
    )
}

/// Reading lines of one vital sign, shared with the change narration.
pub(crate) fn vital_lines(v: &VitalSign) -> String {
    format!(
        "  - Nabız: {} bpm\n\
         \x20 - Tansiyon: {}/{} mmHg\n\
         \x20 - Ateş: {}°C\n\
         \x20 - SpO2: {}%\n\
         \x20 - Solunum: {}/dk",
        number_or_missing(v.heart_rate),
        number_or_missing(v.blood_pressure_systolic),
        number_or_missing(v.blood_pressure_diastolic),
        number_or_missing(v.temperature),
        number_or_missing(v.oxygen_saturation),
        number_or_missing(v.respiratory_rate),
    )
}

fn vitals_section(vitals: &[VitalSign], config: &ContextConfig) -> Option<String> {
    if vitals.is_empty() {
        return None;
    }
    let offset = config.display_offset();
    let body = render_bounded_list(
        vitals,
        config.section_cap,
        |idx, v| {
            let label = if idx == 0 { "🆕 Son Ölçüm" } else { "Önceki Ölçüm" };
            let time = clock_time(normalize_timestamp(&v.recorded_at), offset);
            format!("### {label} ({time}):\n{}", vital_lines(v))
        },
        |omitted| format!("_Not: {omitted} eski ölçüm daha var._"),
    );
    Some(format!(
        "## Vital Bulgular (Toplam {} ölçüm):\n{body}",
        vitals.len()
    ))
}

fn labs_section(labs: &[LabResult], config: &ContextConfig) -> Option<String> {
    if labs.is_empty() {
        return None;
    }
    let offset = config.display_offset();
    let body = render_bounded_list(
        labs,
        config.section_cap,
        |idx, lab| {
            let time = day_and_clock_time(normalize_timestamp(&lab.ordered_at), offset);
            let mut text = format!(
                "### {}. {} ({time}):\n  - Kategori: {}\n  - Durum: {}",
                idx + 1,
                lab.display_name(),
                text_or(lab.category.as_deref(), MISSING),
                text_or(lab.status.as_deref(), MISSING),
            );
            let params = parameter_lines(lab, "Normal", status_marker);
            if !params.is_empty() {
                text.push_str("\n  - Parametreler:");
                for line in params {
                    text.push_str("\n    ");
                    text.push_str(&line);
                }
            } else if let Some(results) = lab.raw_results() {
                text.push_str(&format!("\n  - Sonuçlar: {}", raw_results(results, true)));
            }
            if let Some(notes) = present(lab.notes.as_deref()) {
                text.push_str(&format!("\n  - Not: {notes}"));
            }
            text
        },
        |omitted| format!("_Not: {omitted} eski test sonucu daha var._"),
    );
    Some(format!(
        "## Laboratuvar Sonuçları (Son {}/{} test):\n{body}",
        labs.len().min(config.section_cap),
        labs.len()
    ))
}

/// One line per labelled parameter: `{marker} {name}: {value} {unit} ({range_label}: min-max)`.
pub(crate) fn parameter_lines(
    lab: &LabResult,
    range_label: &str,
    marker: fn(Option<ParameterStatus>) -> &'static str,
) -> Vec<String> {
    lab.parameters
        .iter()
        .filter_map(|param| {
            let label = parameter_label(param)?;
            Some(format!(
                "{} {label}: {} ({range_label}: {})",
                marker(parameter_status(lab, param)),
                value_with_unit(param),
                reference_range(param),
            ))
        })
        .collect()
}

fn imaging_section(imaging: &[ImagingResult], config: &ContextConfig) -> Option<String> {
    if imaging.is_empty() {
        return None;
    }
    let offset = config.display_offset();
    let body = render_bounded_list(
        imaging,
        config.section_cap,
        |idx, img| {
            let time = day_and_clock_time(normalize_timestamp(&img.ordered_at), offset);
            let mut text = format!(
                "### {}. {} - {} ({time}):\n  - Durum: {}\n  - Bulgular: {}",
                idx + 1,
                text_or(img.imaging_type.as_deref(), MISSING),
                text_or(img.body_part.as_deref(), "Genel"),
                text_or(img.status.as_deref(), MISSING),
                text_or(img.findings.as_deref(), "Rapor bekleniyor"),
            );
            if let Some(impression) = present(img.impression.as_deref()) {
                text.push_str(&format!("\n  - Radyolog Yorumu: {impression}"));
            }
            if let Some(technique) = present(img.technique.as_deref()) {
                text.push_str(&format!("\n  - Teknik: {technique}"));
            }
            if let Some(radiologist) = present(img.radiologist.as_deref()) {
                text.push_str(&format!("\n  - Radyolog: {radiologist}"));
            }
            text
        },
        |omitted| format!("_Not: {omitted} eski tetkik daha var._"),
    );
    Some(format!(
        "## Görüntüleme Sonuçları (Son {}/{} tetkik):\n{body}",
        imaging.len().min(config.section_cap),
        imaging.len()
    ))
}

pub(crate) fn yes_no(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "Evet",
        Some(false) => "Hayır",
        None => "Bilinmiyor",
    }
}

fn history_section(h: &MedicalHistory) -> String {
    format!(
        "## Tıbbi Geçmiş:\n\
         \x20 - Alerjiler: {}\n\
         \x20 - Kronik Hastalıklar: {}\n\
         \x20 - Kullandığı İlaçlar: {}\n\
         \x20 - Geçirilmiş Ameliyatlar: {}\n\
         \x20 - Aile Öyküsü: {}\n\
         \x20 - Sosyal Öykü: {}\n\
         \x20 - Sigara: {}\n\
         \x20 - Alkol: {}",
        text_or(h.allergies.as_deref(), "Bilinen yok"),
        text_or(h.chronic_diseases.as_deref(), "Yok"),
        text_or(h.current_medications.as_deref(), "Yok"),
        text_or(h.surgical_history.as_deref(), "Yok"),
        text_or(h.family_history.as_deref(), "Bilinmiyor"),
        text_or(h.social_history.as_deref(), "Bilinmiyor"),
        yes_no(h.smoking),
        yes_no(h.alcohol),
    )
}
