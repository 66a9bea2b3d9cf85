//! Change detection: which records arrived after the assistant last spoke.

use crate::config::ContextConfig;
use crate::models::*;

use super::context::{parameter_lines, vital_lines};
use super::normalize::{normalize_timestamp, IntoInstant};
use super::render::*;
use super::types::{ChangeEvent, ClinicalRecord, ClinicalSnapshot};

/// Rendered by [`render_changes`] when nothing is new.
pub const NO_CHANGES: &str = "Son konuşmadan bu yana yeni veri eklenmedi.";

/// Every vital, lab and imaging record strictly newer than `since`, newest first.
///
/// Pure: the same snapshot and cutoff always give the same events in the same order.
/// Records with equal timestamps keep vitals, labs, imaging order and their input order
/// within a category. A record whose timestamp is absent or unparsable is never new,
/// and an unparsable cutoff reports nothing.
pub fn detect_changes<T: IntoInstant + ?Sized>(
    records: &ClinicalSnapshot,
    since: &T,
) -> Vec<ChangeEvent> {
    let cutoff = normalize_timestamp(since);
    if cutoff.is_invalid() {
        tracing::warn!("Change cutoff is not a valid timestamp, reporting no changes");
        return Vec::new();
    }

    let vitals = records.vitals.iter().cloned().map(ClinicalRecord::Vital);
    let labs = records.labs.iter().cloned().map(ClinicalRecord::Lab);
    let imaging = records.imaging.iter().cloned().map(ClinicalRecord::Imaging);

    let mut changes: Vec<ChangeEvent> = vitals
        .chain(labs)
        .chain(imaging)
        .filter_map(|record| {
            let timestamp = normalize_timestamp(&record.observed_at());
            timestamp.is_newer_than(&cutoff).then(|| ChangeEvent {
                kind: record.kind(),
                timestamp,
                record,
            })
        })
        .collect();

    changes.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    changes
}

/// Narrate change events as attention blocks, one per event, in the given order.
pub fn render_changes(changes: &[ChangeEvent], config: &ContextConfig) -> String {
    if changes.is_empty() {
        return NO_CHANGES.to_string();
    }
    let offset = config.display_offset();
    changes
        .iter()
        .map(|change| {
            let time = clock_time(change.timestamp, offset);
            match &change.record {
                ClinicalRecord::Vital(v) => vital_block(v, &time),
                ClinicalRecord::Lab(l) => lab_block(l, &time),
                ClinicalRecord::Imaging(i) => imaging_block(i, &time),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn vital_block(v: &VitalSign, time: &str) -> String {
    format!(
        "✅ **Yeni Vital Bulgu Eklendi** ({time}):\n{}\n  ⚠️ Önceki ölçümle karşılaştır ve yorumla!",
        vital_lines(v)
    )
}

fn lab_block(lab: &LabResult, time: &str) -> String {
    let mut text = format!(
        "✅ **Yeni Lab Sonucu Eklendi** ({time}):\n  - Test: {}\n  - Kategori: {}\n  - Durum: {}",
        lab.display_name(),
        text_or(lab.category.as_deref(), MISSING),
        text_or(lab.status.as_deref(), MISSING),
    );
    let params = parameter_lines(lab, "Ref", change_marker);
    if !params.is_empty() {
        text.push_str("\n  - Parametreler:");
        for line in params {
            text.push_str("\n    ");
            text.push_str(&line);
        }
    } else if let Some(results) = lab.raw_results() {
        text.push_str(&format!("\n  - Sonuç: {}", raw_results(results, false)));
    }
    text.push_str("\n  ⚠️ Bu sonucu önceki değerlerle karşılaştır ve klinik tabloyla ilişkilendir!");
    text
}

fn imaging_block(img: &ImagingResult, time: &str) -> String {
    let mut text = format!(
        "✅ **Yeni Görüntüleme Raporu Eklendi** ({time}):\n  - Tür: {} - {}\n  - Durum: {}\n  - Bulgular: {}",
        text_or(img.imaging_type.as_deref(), MISSING),
        text_or(img.body_part.as_deref(), "Genel"),
        text_or(img.status.as_deref(), MISSING),
        text_or(img.findings.as_deref(), "Rapor bekleniyor"),
    );
    if let Some(impression) = present(img.impression.as_deref()) {
        text.push_str(&format!("\n  - Radyolog Yorumu: {impression}"));
    }
    text.push_str("\n  ⚠️ Bu bulguları klinik tabloyla korele et ve tanı açısından değerlendir!");
    text
}
