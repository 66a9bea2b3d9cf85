use serde::{Deserialize, Serialize};

/// A stored string did not match any known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The first literal is the canonical wire form; any `| "alias"` literals are accepted on input.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal $(| $alias:literal)*),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $s $(, alias = $alias)*)]
                $variant
            ),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s $(| $alias)* => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(ChatRole {
    User => "USER" | "user",
    Assistant => "ASSISTANT" | "AI" | "assistant",
});

str_enum!(ParameterStatus {
    Normal => "NORMAL",
    Low => "LOW",
    High => "HIGH",
    CriticalLow => "CRITICAL_LOW",
    CriticalHigh => "CRITICAL_HIGH",
});

str_enum!(LabCategory {
    Hemogram => "HEMOGRAM",
    Biochemistry => "BIOCHEMISTRY",
    Cardiac => "CARDIAC",
    Coagulation => "COAGULATION",
    Infection => "INFECTION",
});

str_enum!(ChangeKind {
    Vital => "vital",
    Lab => "lab",
    Imaging => "imaging",
});

str_enum!(DiagnosisSeverity {
    Critical => "CRITICAL" | "critical",
    High => "HIGH" | "high",
    Medium => "MEDIUM" | "medium",
    Low => "LOW" | "low",
});

str_enum!(TestPriority {
    Urgent => "URGENT" | "urgent",
    High => "HIGH" | "high",
    Medium => "MEDIUM" | "medium",
    Low => "LOW" | "low",
});

str_enum!(InterventionPriority {
    Immediate => "IMMEDIATE" | "immediate",
    Urgent => "URGENT" | "urgent",
    Routine => "ROUTINE" | "routine",
});

str_enum!(RiskLevel {
    High => "HIGH" | "high",
    Medium => "MEDIUM" | "medium",
    Low => "LOW" | "low",
});
