use std::fmt;

use serde::Serialize;

use super::model::Field;

/// A degraded-mode condition worth showing next to the dashboard.
/// Never fatal: the render carries on with a fallback.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Notice {
    /// A filter column is absent, so that filter imposes no constraint.
    FilterUnavailable { field: Field },
    /// Utilization percentages exist but the yearly trend lacks its other inputs.
    TrendUnavailable { missing: Vec<Field> },
    /// A 0–1 rate column holds a value outside [0, 1].
    OutOfRange { field: Field, row: usize, value: f64 },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::FilterUnavailable { field } => {
                write!(f, "'{field}' column not found for filtering.")
            }
            Notice::TrendUnavailable { missing } => {
                let names: Vec<&str> = missing.iter().map(|m| m.header()).collect();
                write!(
                    f,
                    "To show Budget Utilization Trend, ensure a '{}' column exists in your data.",
                    names.join("', '")
                )
            }
            Notice::OutOfRange { field, row, value } => write!(
                f,
                "'{field}' must be on a 0-1 scale, found {value} in row {row}."
            ),
        }
    }
}
