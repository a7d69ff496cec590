use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::data::aggregate::{
    Availability, KpiDisplay, KpiSet, StatusCount, TrendPoint, TypeBudget, compute_budget_by_type,
    compute_kpis, compute_status_counts, compute_utilization_trend,
};
use crate::data::cache::DatasetCache;
use crate::data::filter::{
    Category, FilterField, FilterState, distinct_values, filter, init_filter_state,
};
use crate::data::loader::LoadError;
use crate::data::model::{Dataset, Field, ProjectRecord};
use crate::data::notice::Notice;

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// One dashboard interaction: the user's current selections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRequest {
    /// `None` selects every category of every filter column.
    #[serde(default)]
    pub filters: Option<FilterState>,
}

/// Everything a presentation layer needs to draw one dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    /// Selectable categories per filter column, in first-seen order.
    pub filter_options: BTreeMap<FilterField, Vec<Category>>,
    /// The selections the view was computed with.
    pub filters: FilterState,
    pub notices: Vec<Notice>,
    pub kpis: KpiSet,
    pub kpi_display: KpiDisplay,
    pub status_counts: Availability<Vec<StatusCount>>,
    pub budget_by_type: Availability<Vec<TypeBudget>>,
    pub utilization_trend: Availability<Vec<TrendPoint>>,
    /// Column headers of the source sheet, in order.
    pub columns: Vec<String>,
    pub rows: Vec<ProjectRecord>,
    pub total_rows: usize,
}

/// Run filter and every aggregate over an already loaded dataset.
pub fn build_view(dataset: &Dataset, filters: Option<FilterState>) -> DashboardView {
    let filters = filters.unwrap_or_else(|| init_filter_state(dataset));
    let (view, mut notices) = filter(dataset, &filters);

    let kpis = compute_kpis(&view);
    let status_counts = compute_status_counts(&view);
    let budget_by_type = compute_budget_by_type(&view);
    let utilization_trend = compute_utilization_trend(&view);

    if let Availability::Unavailable { missing } = &utilization_trend {
        if dataset.has(Field::BudgetUtilizationPercentage) {
            notices.push(Notice::TrendUnavailable {
                missing: missing.clone(),
            });
        }
    }
    notices.extend(kpis.satisfaction.range_notice());
    notices.extend(utilization_trend.range_notice());

    DashboardView {
        filter_options: FilterField::ALL
            .into_iter()
            .filter(|col| dataset.has(col.field()))
            .map(|col| (col, distinct_values(dataset, col)))
            .collect(),
        filters,
        notices,
        kpi_display: kpis.display(),
        kpis,
        status_counts,
        budget_by_type,
        utilization_trend,
        columns: dataset.columns.clone(),
        rows: view.to_records(),
        total_rows: dataset.len(),
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Load → filter → aggregate, with loads memoised across interactions.
pub struct Pipeline {
    path: PathBuf,
    sheet: String,
    cache: DatasetCache,
}

impl Pipeline {
    pub fn new(path: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        Pipeline {
            path: path.into(),
            sheet: sheet.into(),
            cache: DatasetCache::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// Point the pipeline at another file; the old file's entries are dropped.
    pub fn set_source(&mut self, path: impl Into<PathBuf>) {
        self.cache.invalidate(&self.path);
        self.path = path.into();
    }

    /// The current dataset, from cache when the file is unchanged.
    pub fn dataset(&mut self) -> Result<Arc<Dataset>, LoadError> {
        self.cache.get_or_load(&self.path, &self.sheet)
    }

    /// Force the next request to re-read the file.
    pub fn reload(&mut self) {
        log::info!("Invalidating cached data for {}", self.path.display());
        self.cache.invalidate(&self.path);
    }

    /// Answer one interaction. A load failure stops here: nothing is aggregated.
    pub fn handle(&mut self, request: &DashboardRequest) -> Result<DashboardView, LoadError> {
        let dataset = self.dataset()?;
        Ok(build_view(&dataset, request.filters.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn write_csv(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("projects.csv");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_file_halts_before_aggregation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleaned_project_data.xlsx");
        let mut pipeline = Pipeline::new(path, "Cleaned Data");
        assert!(matches!(
            pipeline.handle(&DashboardRequest::default()),
            Err(LoadError::NotFound { .. })
        ));
    }

    #[test]
    fn default_request_selects_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "Project Type,Status,Total Projects\nRoad,Done,2\nWater,Active,3\n",
        );
        let mut pipeline = Pipeline::new(path, "Cleaned Data");

        let view = pipeline.handle(&DashboardRequest::default()).unwrap();
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.total_rows, 2);
        assert_eq!(view.kpi_display.total_projects, "5");
        assert_eq!(
            view.filter_options[&FilterField::Status],
            vec![Some("Done".to_string()), Some("Active".to_string())]
        );
        assert!(view.notices.is_empty());
    }

    #[test]
    fn filters_narrow_every_aggregate() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "Project Type,Status,Total Projects\nRoad,Done,2\nWater,Active,3\nRoad,Active,4\n",
        );
        let mut pipeline = Pipeline::new(path, "Cleaned Data");

        let mut filters = FilterState::new();
        filters.insert(
            FilterField::ProjectType,
            BTreeSet::from([Some("Road".to_string())]),
        );
        let view = pipeline
            .handle(&DashboardRequest {
                filters: Some(filters),
            })
            .unwrap();

        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.total_rows, 3);
        assert_eq!(view.kpi_display.total_projects, "6");
        let counts = view.status_counts.value().unwrap();
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn missing_year_raises_trend_notice() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "Status,Budget Utilization Percentage\nDone,0.5\n");
        let mut pipeline = Pipeline::new(path, "Cleaned Data");

        let view = pipeline.handle(&DashboardRequest::default()).unwrap();
        assert!(view.notices.contains(&Notice::TrendUnavailable {
            missing: vec![Field::Year]
        }));
        assert!(view.notices.contains(&Notice::FilterUnavailable {
            field: Field::ProjectType
        }));
        assert!(!view.utilization_trend.is_available());
    }

    #[test]
    fn out_of_range_rates_raise_notices() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "Citizen Satisfaction Rate,Year,Budget Utilization Percentage\n\
             0.9,2020,0.5\n\
             75,2021,60\n",
        );
        let mut pipeline = Pipeline::new(path, "Cleaned Data");

        let view = pipeline.handle(&DashboardRequest::default()).unwrap();
        let ranges: Vec<&Notice> = view
            .notices
            .iter()
            .filter(|n| matches!(n, Notice::OutOfRange { .. }))
            .collect();
        assert_eq!(ranges.len(), 2);
    }

    #[test]
    fn reload_picks_up_new_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "Total Projects\n1\n");
        let mut pipeline = Pipeline::new(path.clone(), "Cleaned Data");
        assert_eq!(
            pipeline.handle(&DashboardRequest::default()).unwrap().kpi_display.total_projects,
            "1"
        );

        std::fs::write(&path, "Total Projects\n7\n").unwrap();
        pipeline.reload();
        assert_eq!(
            pipeline.handle(&DashboardRequest::default()).unwrap().kpi_display.total_projects,
            "7"
        );
    }
}
