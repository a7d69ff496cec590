use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::model::{Dataset, Field, ProjectRecord};
use super::notice::Notice;

// ---------------------------------------------------------------------------
// Filter predicate: which categories are selected per column
// ---------------------------------------------------------------------------

/// The columns a user can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterField {
    ProjectType,
    Status,
}

impl FilterField {
    pub const ALL: [FilterField; 2] = [FilterField::ProjectType, FilterField::Status];

    pub fn field(self) -> Field {
        match self {
            FilterField::ProjectType => Field::ProjectType,
            FilterField::Status => Field::Status,
        }
    }

    /// The row's category for this column.
    pub fn category(self, record: &ProjectRecord) -> Category {
        match self {
            FilterField::ProjectType => record.project_type.clone(),
            FilterField::Status => record.status.clone(),
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.field().fmt(f)
    }
}

/// A filterable cell value; `None` is the blank cell.
pub type Category = Option<String>;

/// Per-column selection state: maps column → set of selected categories.
/// A column missing from the map imposes no constraint; an empty set keeps nothing.
pub type FilterState = BTreeMap<FilterField, BTreeSet<Category>>;

/// Distinct categories of a column, in first-seen order.
pub fn distinct_values(dataset: &Dataset, column: FilterField) -> Vec<Category> {
    if !dataset.has(column.field()) {
        return Vec::new();
    }
    let mut seen = BTreeSet::new();
    dataset
        .records
        .iter()
        .map(|r| column.category(r))
        .filter(|c| seen.insert(c.clone()))
        .collect()
}

/// Initialise a [`FilterState`] with all values selected (i.e., show everything).
pub fn init_filter_state(dataset: &Dataset) -> FilterState {
    FilterField::ALL
        .into_iter()
        .filter(|col| dataset.has(col.field()))
        .map(|col| (col, distinct_values(dataset, col).into_iter().collect()))
        .collect()
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// An order-preserving selection of a dataset's rows. Borrows the dataset,
/// so filtering can never alter it.
#[derive(Debug, Clone)]
pub struct DatasetView<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> DatasetView<'a> {
    /// Every row of the dataset.
    pub fn all(dataset: &'a Dataset) -> Self {
        DatasetView {
            dataset,
            indices: (0..dataset.len()).collect(),
        }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Indices into `dataset().records`, ascending.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn has(&self, field: Field) -> bool {
        self.dataset.has(field)
    }

    pub fn missing(&self, required: &[Field]) -> Vec<Field> {
        self.dataset.missing(required)
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a ProjectRecord> + '_ {
        let records: &'a [ProjectRecord] = &self.dataset.records;
        self.indices.iter().map(move |&i| &records[i])
    }

    /// Rows paired with their row number in the source file.
    pub fn numbered_rows(&self) -> impl Iterator<Item = (usize, &'a ProjectRecord)> + '_ {
        let dataset: &'a Dataset = self.dataset;
        self.indices
            .iter()
            .map(move |&i| (dataset.source_row(i), &dataset.records[i]))
    }

    pub fn to_records(&self) -> Vec<ProjectRecord> {
        self.rows().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Apply the selections to the dataset.
///
/// A row passes a column filter when:
/// * The column is absent from the dataset → passes, and a notice is raised
/// * The column is not present in `filters` → passes (no constraint)
/// * The row's category for that column is in the selected set → passes
pub fn filter<'a>(dataset: &'a Dataset, filters: &FilterState) -> (DatasetView<'a>, Vec<Notice>) {
    let mut notices = Vec::new();
    let mut active: Vec<(FilterField, &BTreeSet<Category>)> = Vec::new();

    for col in FilterField::ALL {
        if !dataset.has(col.field()) {
            notices.push(Notice::FilterUnavailable { field: col.field() });
            continue;
        }
        if let Some(selected) = filters.get(&col) {
            active.push((col, selected));
        }
    }

    let indices = dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            active
                .iter()
                .all(|(col, selected)| selected.contains(&col.category(rec)))
        })
        .map(|(i, _)| i)
        .collect();

    (DatasetView { dataset, indices }, notices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(project_type: Option<&str>, status: Option<&str>) -> ProjectRecord {
        ProjectRecord {
            project_type: project_type.map(String::from),
            status: status.map(String::from),
            ..Default::default()
        }
    }

    fn sample() -> Dataset {
        Dataset::new(
            vec!["Project Type".into(), "Status".into()],
            vec![
                record(Some("Road"), Some("Done")),
                record(Some("Water"), Some("Active")),
                record(Some("Road"), Some("Active")),
                record(Some("Health"), None),
                record(Some("Water"), Some("Done")),
            ],
        )
    }

    fn set(values: &[Option<&str>]) -> BTreeSet<Category> {
        values.iter().map(|v| v.map(String::from)).collect()
    }

    #[test]
    fn distinct_values_keep_first_seen_order() {
        let ds = sample();
        assert_eq!(
            distinct_values(&ds, FilterField::ProjectType),
            vec![Some("Road".into()), Some("Water".into()), Some("Health".into())]
        );
        assert_eq!(
            distinct_values(&ds, FilterField::Status),
            vec![Some("Done".into()), Some("Active".into()), None]
        );
    }

    #[test]
    fn default_state_keeps_every_row() {
        let ds = sample();
        let state = init_filter_state(&ds);
        let (view, notices) = filter(&ds, &state);
        assert_eq!(view.indices(), &[0, 1, 2, 3, 4]);
        assert!(notices.is_empty());
    }

    #[test]
    fn keeps_only_selected_rows_in_order() {
        let ds = sample();
        let mut state = init_filter_state(&ds);
        state.insert(FilterField::ProjectType, set(&[Some("Water"), Some("Road")]));
        state.insert(FilterField::Status, set(&[Some("Active")]));

        let (view, _) = filter(&ds, &state);
        assert_eq!(view.indices(), &[1, 2]);
        for rec in view.rows() {
            assert!(matches!(rec.project_type.as_deref(), Some("Water" | "Road")));
            assert_eq!(rec.status.as_deref(), Some("Active"));
        }
    }

    #[test]
    fn blank_category_is_selectable() {
        let ds = sample();
        let mut state = FilterState::new();
        state.insert(FilterField::Status, set(&[None]));
        let (view, _) = filter(&ds, &state);
        assert_eq!(view.indices(), &[3]);
    }

    #[test]
    fn empty_selection_keeps_nothing() {
        let ds = sample();
        let mut state = init_filter_state(&ds);
        state.insert(FilterField::Status, BTreeSet::new());
        let (view, _) = filter(&ds, &state);
        assert!(view.is_empty());
    }

    #[test]
    fn absent_column_is_no_constraint_with_notice() {
        let ds = Dataset::new(
            vec!["Status".into()],
            vec![record(None, Some("Done")), record(None, Some("Active"))],
        );
        let mut state = FilterState::new();
        state.insert(FilterField::ProjectType, set(&[Some("Road")]));

        let (view, notices) = filter(&ds, &state);
        assert_eq!(view.len(), 2);
        assert_eq!(
            notices,
            vec![Notice::FilterUnavailable {
                field: Field::ProjectType
            }]
        );
        assert!(!init_filter_state(&ds).contains_key(&FilterField::ProjectType));
    }

    #[test]
    fn filtering_leaves_dataset_untouched() {
        let ds = sample();
        let before = ds.records.clone();
        let mut state = FilterState::new();
        state.insert(FilterField::Status, set(&[Some("Done")]));

        let (view, _) = filter(&ds, &state);
        assert_eq!(view.len(), 2);
        assert!(std::ptr::eq(view.dataset(), &ds));
        assert_eq!(ds.records, before);
    }

    #[test]
    fn numbered_rows_use_sheet_numbering() {
        let ds = sample();
        let mut state = FilterState::new();
        state.insert(FilterField::ProjectType, set(&[Some("Health")]));
        let (view, _) = filter(&ds, &state);
        let rows: Vec<usize> = view.numbered_rows().map(|(n, _)| n).collect();
        assert_eq!(rows, vec![5]);
    }

    #[test]
    fn numbered_rows_follow_source_rows() {
        let ds = Dataset::with_source_rows(
            vec!["Status".into()],
            vec![record(None, Some("Done")), record(None, Some("Active"))],
            vec![2, 7],
        );
        let mut state = FilterState::new();
        state.insert(FilterField::Status, set(&[Some("Active")]));
        let (view, _) = filter(&ds, &state);
        let rows: Vec<usize> = view.numbered_rows().map(|(n, _)| n).collect();
        assert_eq!(rows, vec![7]);
    }
}
