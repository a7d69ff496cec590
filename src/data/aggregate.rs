use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::filter::DatasetView;
use super::model::{Field, ProjectRecord};
use super::notice::Notice;

// ---------------------------------------------------------------------------
// Result wrappers
// ---------------------------------------------------------------------------

/// Outcome of an aggregate that needs particular columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Availability<T> {
    Available { value: T },
    /// Required columns are absent from the sheet.
    Unavailable { missing: Vec<Field> },
    /// Columns are present but hold no values to aggregate.
    Empty,
    /// A 0–1 rate is outside [0, 1]; `row` is the sheet row number.
    OutOfRange { field: Field, row: usize, value: f64 },
}

impl<T> Availability<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Availability::Available { value } => Some(value),
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available { .. })
    }

    /// The notice to raise when a rate was out of range.
    pub fn range_notice(&self) -> Option<Notice> {
        match self {
            Availability::OutOfRange { field, row, value } => Some(Notice::OutOfRange {
                field: *field,
                row: *row,
                value: *value,
            }),
            _ => None,
        }
    }

    fn check(view: &DatasetView<'_>, required: &[Field]) -> Option<Self> {
        let missing = view.missing(required);
        (!missing.is_empty()).then_some(Availability::Unavailable { missing })
    }
}

/// Budget utilization, keeping apart the two ways it can be undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Utilization {
    Computed { percent: f64 },
    Unavailable { missing: Vec<Field> },
    /// Allocated budget sums to zero (or less).
    ZeroDenominator,
}

impl Utilization {
    /// The value shown on the dashboard: undefined cases collapse to 0.
    pub fn display_percent(&self) -> f64 {
        match self {
            Utilization::Computed { percent } => *percent,
            _ => 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// KPIs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSet {
    pub total_projects: Availability<f64>,
    pub budget_utilization: Utilization,
    pub satisfaction: Availability<f64>,
}

/// KPIs formatted for display: integer count, then two percentages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiDisplay {
    pub total_projects: String,
    pub budget_utilization: String,
    pub satisfaction: String,
}

impl KpiSet {
    pub fn display(&self) -> KpiDisplay {
        let total = self.total_projects.value().copied().unwrap_or(0.0);
        let satisfaction = self.satisfaction.value().copied().unwrap_or(0.0);
        KpiDisplay {
            total_projects: format!("{}", total.trunc() as i64),
            budget_utilization: format!("{:.2}%", self.budget_utilization.display_percent()),
            satisfaction: format!("{satisfaction:.2}%"),
        }
    }
}

pub fn compute_kpis(view: &DatasetView<'_>) -> KpiSet {
    let total_projects = Availability::check(view, &[Field::TotalProjects]).unwrap_or_else(|| {
        Availability::Available {
            value: view.rows().filter_map(|r| r.total_projects).sum::<f64>(),
        }
    });

    let budget_utilization = {
        let missing = view.missing(&[Field::BudgetUtilized, Field::BudgetAllocated]);
        if !missing.is_empty() {
            Utilization::Unavailable { missing }
        } else {
            let allocated: f64 = view.rows().filter_map(|r| r.budget_allocated).sum();
            let utilized: f64 = view.rows().filter_map(|r| r.budget_utilized).sum();
            if allocated > 0.0 {
                Utilization::Computed {
                    percent: utilized / allocated * 100.0,
                }
            } else {
                Utilization::ZeroDenominator
            }
        }
    };

    let satisfaction = unit_mean_percent(view, Field::CitizenSatisfactionRate, |r| {
        r.citizen_satisfaction_rate
    });

    KpiSet {
        total_projects,
        budget_utilization,
        satisfaction,
    }
}

/// Mean of a 0–1 rate column scaled to a percentage.
fn unit_mean_percent(
    view: &DatasetView<'_>,
    field: Field,
    get: impl Fn(&ProjectRecord) -> Option<f64>,
) -> Availability<f64> {
    if let Some(unavailable) = Availability::check(view, &[field]) {
        return unavailable;
    }
    if let Some(out_of_range) = check_unit_range(view, field, &get) {
        return out_of_range;
    }
    let (sum, n) = view
        .rows()
        .filter_map(&get)
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        return Availability::Empty;
    }
    Availability::Available {
        value: sum / n as f64 * 100.0,
    }
}

/// First value outside [0, 1], reported as `OutOfRange`.
fn check_unit_range<T>(
    view: &DatasetView<'_>,
    field: Field,
    get: impl Fn(&ProjectRecord) -> Option<f64>,
) -> Option<Availability<T>> {
    view.numbered_rows().find_map(|(row, r)| {
        let value = get(r)?;
        if (0.0..=1.0).contains(&value) {
            return None;
        }
        log::warn!("'{field}' out of 0-1 range in row {row}: {value}");
        Some(Availability::OutOfRange { field, row, value })
    })
}

// ---------------------------------------------------------------------------
// Grouped summaries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeBudget {
    pub project_type: String,
    pub budget_allocated: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub year: i32,
    pub avg_utilization_percent: f64,
}

/// Rows per status, most frequent first; ties keep first-seen order.
/// Blank statuses are not counted.
pub fn compute_status_counts(view: &DatasetView<'_>) -> Availability<Vec<StatusCount>> {
    if let Some(unavailable) = Availability::check(view, &[Field::Status]) {
        return unavailable;
    }

    let mut position: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<StatusCount> = Vec::new();
    for status in view.rows().filter_map(|r| r.status.as_deref()) {
        match position.get(status) {
            Some(&i) => counts[i].count += 1,
            None => {
                position.insert(status, counts.len());
                counts.push(StatusCount {
                    status: status.to_string(),
                    count: 1,
                });
            }
        }
    }
    // Stable sort keeps first-seen order among equal counts.
    counts.sort_by(|a, b| b.count.cmp(&a.count));

    Availability::Available { value: counts }
}

/// Allocated budget summed per project type, ordered by type.
/// Rows with a blank type are left out.
pub fn compute_budget_by_type(view: &DatasetView<'_>) -> Availability<Vec<TypeBudget>> {
    if let Some(unavailable) =
        Availability::check(view, &[Field::ProjectType, Field::BudgetAllocated])
    {
        return unavailable;
    }

    let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
    for rec in view.rows() {
        if let Some(project_type) = rec.project_type.as_deref() {
            *sums.entry(project_type).or_insert(0.0) += rec.budget_allocated.unwrap_or(0.0);
        }
    }

    Availability::Available {
        value: sums
            .into_iter()
            .map(|(t, budget_allocated)| TypeBudget {
                project_type: t.to_string(),
                budget_allocated,
            })
            .collect(),
    }
}

/// Mean utilization percentage per year, ascending by year.
pub fn compute_utilization_trend(view: &DatasetView<'_>) -> Availability<Vec<TrendPoint>> {
    if let Some(unavailable) =
        Availability::check(view, &[Field::Year, Field::BudgetUtilizationPercentage])
    {
        return unavailable;
    }
    if let Some(out_of_range) = check_unit_range(view, Field::BudgetUtilizationPercentage, |r| {
        r.budget_utilization_percentage
    }) {
        return out_of_range;
    }

    let mut by_year: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for rec in view.rows() {
        if let (Some(year), Some(pct)) = (rec.year, rec.budget_utilization_percentage) {
            let (sum, n) = by_year.entry(year).or_insert((0.0, 0));
            *sum += pct;
            *n += 1;
        }
    }

    Availability::Available {
        value: by_year
            .into_iter()
            .map(|(year, (sum, n))| TrendPoint {
                year,
                avg_utilization_percent: sum / n as f64 * 100.0,
            })
            .collect(),
    }
}
