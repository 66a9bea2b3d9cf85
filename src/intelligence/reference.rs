//! Static laboratory reference ranges.
//!
//! Keyed by `(parameter key, category)`. Used to fill display names, units and
//! bounds for entered lab parameters and to classify each value.

use crate::models::{LabCategory, ParameterStatus};

/// Reference interval for one laboratory parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceRange {
    pub key: &'static str,
    pub display_name: &'static str,
    pub unit: &'static str,
    pub ref_min: f64,
    pub ref_max: f64,
    pub critical_low: Option<f64>,
    pub critical_high: Option<f64>,
}

impl ReferenceRange {
    /// Classify a value. Critical thresholds win over the normal interval.
    pub fn classify(&self, value: f64) -> ParameterStatus {
        if self.critical_low.is_some_and(|c| value < c) {
            return ParameterStatus::CriticalLow;
        }
        if self.critical_high.is_some_and(|c| value > c) {
            return ParameterStatus::CriticalHigh;
        }
        if value < self.ref_min {
            return ParameterStatus::Low;
        }
        if value > self.ref_max {
            return ParameterStatus::High;
        }
        ParameterStatus::Normal
    }
}

/// All reference ranges of one lab category.
#[derive(Debug)]
pub struct CategoryReference {
    pub category: LabCategory,
    pub display_name: &'static str,
    pub parameters: &'static [ReferenceRange],
}

impl CategoryReference {
    pub fn parameter(&self, key: &str) -> Option<&'static ReferenceRange> {
        self.parameters.iter().find(|p| p.key == key)
    }
}

const fn range(
    key: &'static str,
    display_name: &'static str,
    unit: &'static str,
    ref_min: f64,
    ref_max: f64,
    critical_low: Option<f64>,
    critical_high: Option<f64>,
) -> ReferenceRange {
    ReferenceRange {
        key,
        display_name,
        unit,
        ref_min,
        ref_max,
        critical_low,
        critical_high,
    }
}

static HEMOGRAM: &[ReferenceRange] = &[
    range("WBC", "WBC (Beyaz Küre)", "10³/µL", 4.0, 10.0, Some(2.0), Some(20.0)),
    range("RBC", "RBC (Kırmızı Küre)", "10⁶/µL", 4.2, 5.9, Some(3.0), Some(7.0)),
    range("HGB", "Hemoglobin", "g/dL", 13.0, 17.0, Some(7.0), Some(20.0)),
    range("HCT", "Hematokrit", "%", 40.0, 52.0, Some(20.0), Some(60.0)),
    range("MCV", "MCV", "fL", 80.0, 100.0, None, None),
    range("PLT", "Trombosit", "10³/µL", 150.0, 400.0, Some(20.0), Some(1000.0)),
    range("NEU", "Nötrofil", "%", 40.0, 70.0, None, None),
    range("LYM", "Lenfosit", "%", 20.0, 40.0, None, None),
];

static BIOCHEMISTRY: &[ReferenceRange] = &[
    range("GLUCOSE", "Glukoz (Açlık)", "mg/dL", 70.0, 100.0, Some(40.0), Some(400.0)),
    range("CREATININE", "Kreatinin", "mg/dL", 0.7, 1.3, None, Some(5.0)),
    range("BUN", "BUN (Üre)", "mg/dL", 7.0, 20.0, None, Some(100.0)),
    range("URIC_ACID", "Ürik Asit", "mg/dL", 3.5, 7.2, None, None),
    range("SODIUM", "Sodyum", "mmol/L", 136.0, 145.0, Some(120.0), Some(160.0)),
    range("POTASSIUM", "Potasyum", "mmol/L", 3.5, 5.1, Some(2.5), Some(6.5)),
    range("CALCIUM", "Kalsiyum", "mg/dL", 8.5, 10.5, Some(6.0), Some(13.0)),
    range("TOTAL_PROTEIN", "Total Protein", "g/dL", 6.0, 8.3, None, None),
    range("ALBUMIN", "Albumin", "g/dL", 3.5, 5.2, None, None),
    range("AST", "AST (SGOT)", "U/L", 0.0, 40.0, None, Some(500.0)),
    range("ALT", "ALT (SGPT)", "U/L", 0.0, 41.0, None, Some(500.0)),
    range("ALP", "ALP", "U/L", 30.0, 120.0, None, None),
    range("TOTAL_BILIRUBIN", "Total Bilirubin", "mg/dL", 0.1, 1.2, None, Some(15.0)),
    range("DIRECT_BILIRUBIN", "Direkt Bilirubin", "mg/dL", 0.0, 0.3, None, None),
];

static CARDIAC: &[ReferenceRange] = &[
    range("TROPONIN_I", "Troponin I", "ng/mL", 0.0, 0.04, None, Some(0.4)),
    range("CK_MB", "CK-MB", "ng/mL", 0.0, 5.0, None, Some(25.0)),
    range("BNP", "BNP", "pg/mL", 0.0, 100.0, None, Some(400.0)),
];

static COAGULATION: &[ReferenceRange] = &[
    range("PT", "PT", "saniye", 11.0, 13.5, None, Some(30.0)),
    range("INR", "INR", "", 0.8, 1.2, None, Some(5.0)),
    range("APTT", "aPTT", "saniye", 25.0, 35.0, None, Some(100.0)),
];

static INFECTION: &[ReferenceRange] = &[
    range("CRP", "CRP", "mg/L", 0.0, 5.0, None, Some(200.0)),
    range("PROCALCITONIN", "Prokalsitonin", "ng/mL", 0.0, 0.5, None, Some(10.0)),
];

static REFERENCE_TABLE: &[CategoryReference] = &[
    CategoryReference {
        category: LabCategory::Hemogram,
        display_name: "Hemogram (Tam Kan Sayımı)",
        parameters: HEMOGRAM,
    },
    CategoryReference {
        category: LabCategory::Biochemistry,
        display_name: "Biyokimya",
        parameters: BIOCHEMISTRY,
    },
    CategoryReference {
        category: LabCategory::Cardiac,
        display_name: "Kardiyak Belirteçler",
        parameters: CARDIAC,
    },
    CategoryReference {
        category: LabCategory::Coagulation,
        display_name: "Koagülasyon",
        parameters: COAGULATION,
    },
    CategoryReference {
        category: LabCategory::Infection,
        display_name: "Enfeksiyon Belirteçleri",
        parameters: INFECTION,
    },
];

/// Every category with reference data, in display order.
pub fn categories() -> &'static [CategoryReference] {
    REFERENCE_TABLE
}

pub fn category_reference(category: LabCategory) -> Option<&'static CategoryReference> {
    REFERENCE_TABLE.iter().find(|c| c.category == category)
}

/// Look up the reference range for a parameter key within a category.
pub fn parameter_info(key: &str, category: LabCategory) -> Option<&'static ReferenceRange> {
    category_reference(category)?.parameter(key)
}

/// Status of a value. Keys without reference data are reported NORMAL.
pub fn status_for(key: &str, value: f64, category: LabCategory) -> ParameterStatus {
    parameter_info(key, category)
        .map(|r| r.classify(value))
        .unwrap_or(ParameterStatus::Normal)
}
