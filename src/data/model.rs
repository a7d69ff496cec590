use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CellValue – a single cell of the source sheet
// ---------------------------------------------------------------------------

/// A dynamically-typed spreadsheet cell, mirroring what calamine / pandas hand back.
/// Kept `Ord` so it can live in `BTreeMap` / `BTreeSet`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date string kept as text for simplicity.
    Date(String),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn rank(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            // Whole floats print without a fraction, like pandas' object columns.
            CellValue::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{v:.0}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Null => write!(f, ""),
        }
    }
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Guess a value type from raw text (CSV cells, numeric-looking strings).
    pub fn from_text(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::String(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Field – the known columns of a project sheet
// ---------------------------------------------------------------------------

/// The columns the dashboard knows how to use. Any subset may be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    ProjectType,
    Status,
    TotalProjects,
    BudgetAllocated,
    BudgetUtilized,
    CitizenSatisfactionRate,
    Year,
    BudgetUtilizationPercentage,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::ProjectType,
        Field::Status,
        Field::TotalProjects,
        Field::BudgetAllocated,
        Field::BudgetUtilized,
        Field::CitizenSatisfactionRate,
        Field::Year,
        Field::BudgetUtilizationPercentage,
    ];

    /// Header text of this column in the source sheet.
    pub fn header(self) -> &'static str {
        match self {
            Field::ProjectType => "Project Type",
            Field::Status => "Status",
            Field::TotalProjects => "Total Projects",
            Field::BudgetAllocated => "Budget Allocated",
            Field::BudgetUtilized => "Budget Utilized",
            Field::CitizenSatisfactionRate => "Citizen Satisfaction Rate",
            Field::Year => "Year",
            Field::BudgetUtilizationPercentage => "Budget Utilization Percentage",
        }
    }

    pub fn from_header(header: &str) -> Option<Field> {
        let header = header.trim();
        Field::ALL.into_iter().find(|f| f.header() == header)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

// ---------------------------------------------------------------------------
// ProjectRecord – one row of the sheet
// ---------------------------------------------------------------------------

/// A single project row. `None` means the column is absent or the cell is blank;
/// which of the two is answered by [`Dataset::has`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub project_type: Option<String>,
    pub status: Option<String>,
    pub total_projects: Option<f64>,
    pub budget_allocated: Option<f64>,
    pub budget_utilized: Option<f64>,
    pub citizen_satisfaction_rate: Option<f64>,
    pub year: Option<i32>,
    pub budget_utilization_percentage: Option<f64>,
    /// Columns the dashboard has no use for, kept for the raw-data table.
    #[serde(flatten)]
    pub extra: BTreeMap<String, CellValue>,
}

impl ProjectRecord {
    /// Cell for a column header, known or extra, for table display.
    pub fn cell(&self, column: &str) -> CellValue {
        let Some(field) = Field::from_header(column) else {
            return self.extra.get(column).cloned().unwrap_or(CellValue::Null);
        };
        let text = |v: &Option<String>| v.clone().map_or(CellValue::Null, CellValue::String);
        let num = |v: Option<f64>| v.map_or(CellValue::Null, CellValue::Float);
        match field {
            Field::ProjectType => text(&self.project_type),
            Field::Status => text(&self.status),
            Field::TotalProjects => num(self.total_projects),
            Field::BudgetAllocated => num(self.budget_allocated),
            Field::BudgetUtilized => num(self.budget_utilized),
            Field::CitizenSatisfactionRate => num(self.citizen_satisfaction_rate),
            Field::Year => self.year.map_or(CellValue::Null, |y| CellValue::Integer(y as i64)),
            Field::BudgetUtilizationPercentage => num(self.budget_utilization_percentage),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded sheet
// ---------------------------------------------------------------------------

/// The full parsed sheet. Immutable once built; shared behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// All rows, in sheet order.
    pub records: Vec<ProjectRecord>,
    /// Column headers in sheet order (known and extra).
    pub columns: Vec<String>,
    /// Known columns present in the sheet.
    pub fields: BTreeSet<Field>,
    /// Row number of each record in its source file, header being row 1.
    pub source_rows: Vec<usize>,
}

impl Dataset {
    /// Records numbered as if they directly follow a single header row.
    pub fn new(columns: Vec<String>, records: Vec<ProjectRecord>) -> Self {
        let source_rows = (0..records.len()).map(|i| i + 2).collect();
        Self::with_source_rows(columns, records, source_rows)
    }

    pub fn with_source_rows(
        columns: Vec<String>,
        records: Vec<ProjectRecord>,
        source_rows: Vec<usize>,
    ) -> Self {
        debug_assert_eq!(records.len(), source_rows.len());
        let fields = columns.iter().filter_map(|c| Field::from_header(c)).collect();
        Dataset {
            records,
            columns,
            fields,
            source_rows,
        }
    }

    /// Source row number of the record at `index`.
    pub fn source_row(&self, index: usize) -> usize {
        self.source_rows.get(index).copied().unwrap_or(index + 2)
    }

    /// Whether a known column is present in the sheet.
    pub fn has(&self, field: Field) -> bool {
        self.fields.contains(&field)
    }

    /// Known columns from `required` that the sheet lacks.
    pub fn missing(&self, required: &[Field]) -> Vec<Field> {
        required.iter().copied().filter(|f| !self.has(*f)).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_headers_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_header(field.header()), Some(field));
        }
        assert_eq!(Field::from_header("  Status "), Some(Field::Status));
        assert_eq!(Field::from_header("status"), None);
    }

    #[test]
    fn dataset_tracks_present_fields() {
        let ds = Dataset::new(
            vec!["Status".into(), "Region".into(), "Year".into()],
            Vec::new(),
        );
        assert!(ds.has(Field::Status));
        assert!(ds.has(Field::Year));
        assert!(!ds.has(Field::ProjectType));
        assert_eq!(
            ds.missing(&[Field::Year, Field::BudgetUtilizationPercentage]),
            vec![Field::BudgetUtilizationPercentage]
        );
    }

    #[test]
    fn cell_reads_known_and_extra_columns() {
        let mut rec = ProjectRecord {
            status: Some("Done".into()),
            year: Some(2021),
            ..Default::default()
        };
        rec.extra.insert("Region".into(), CellValue::String("North".into()));

        assert_eq!(rec.cell("Status"), CellValue::String("Done".into()));
        assert_eq!(rec.cell("Year"), CellValue::Integer(2021));
        assert_eq!(rec.cell("Region"), CellValue::String("North".into()));
        assert_eq!(rec.cell("Budget Allocated"), CellValue::Null);
        assert_eq!(rec.cell("Nope"), CellValue::Null);
    }

    #[test]
    fn text_guessing() {
        assert_eq!(CellValue::from_text(""), CellValue::Null);
        assert_eq!(CellValue::from_text(" 42 "), CellValue::Integer(42));
        assert_eq!(CellValue::from_text("0.5"), CellValue::Float(0.5));
        assert_eq!(CellValue::from_text("true"), CellValue::Bool(true));
        assert_eq!(CellValue::from_text("Road"), CellValue::String("Road".into()));
    }

    #[test]
    fn whole_floats_display_without_fraction() {
        assert_eq!(CellValue::Float(3.0).to_string(), "3");
        assert_eq!(CellValue::Float(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Null.to_string(), "");
    }
}
