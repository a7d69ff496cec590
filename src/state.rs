use std::collections::BTreeSet;
use std::path::PathBuf;

use project_dashboard::data::filter::{Category, FilterField, FilterState};
use project_dashboard::data::loader::LoadError;
use project_dashboard::pipeline::{DashboardRequest, DashboardView, Pipeline};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pipeline: Pipeline,

    /// Current selections (None until the first successful load).
    pub filters: Option<FilterState>,

    /// Latest computed dashboard; None while a load error is shown.
    pub view: Option<DashboardView>,

    /// Load failure that halted the last render pass.
    pub error: Option<LoadError>,

    /// Colours per status and per project type, shared by sidebar and charts.
    pub status_colors: ColorMap,
    pub type_colors: ColorMap,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        let mut state = Self {
            pipeline,
            filters: None,
            view: None,
            error: None,
            status_colors: ColorMap::default(),
            type_colors: ColorMap::default(),
        };
        state.refresh();
        state
    }

    pub fn source_label(&self) -> String {
        format!(
            "{} [{}]",
            self.pipeline.path().display(),
            self.pipeline.sheet()
        )
    }

    /// Re-run the pipeline with the current selections.
    pub fn refresh(&mut self) {
        let request = DashboardRequest {
            filters: self.filters.clone(),
        };
        match self.pipeline.handle(&request) {
            Ok(view) => {
                self.status_colors = colors_for(&view, FilterField::Status);
                self.type_colors = colors_for(&view, FilterField::ProjectType);
                self.filters = Some(view.filters.clone());
                self.view = Some(view);
                self.error = None;
            }
            Err(e) => {
                self.view = None;
                self.error = Some(e);
            }
        }
    }

    /// Switch to another data file; selections reset to "everything".
    pub fn open(&mut self, path: PathBuf) {
        self.pipeline.set_source(path);
        self.filters = None;
        self.refresh();
    }

    /// Re-read the current file from disk.
    pub fn reload(&mut self) {
        self.pipeline.reload();
        self.filters = None;
        self.refresh();
    }

    /// Toggle a single category in a column's filter.
    pub fn toggle_filter_value(&mut self, column: FilterField, value: &Category) {
        let Some(filters) = self.filters.as_mut() else {
            return;
        };
        let selected = filters.entry(column).or_default();
        if !selected.remove(value) {
            selected.insert(value.clone());
        }
        self.refresh();
    }

    /// Select all categories in a column.
    pub fn select_all(&mut self, column: FilterField) {
        let all: Option<BTreeSet<Category>> = self
            .view
            .as_ref()
            .and_then(|v| v.filter_options.get(&column))
            .map(|vals| vals.iter().cloned().collect());
        if let (Some(filters), Some(all)) = (self.filters.as_mut(), all) {
            filters.insert(column, all);
            self.refresh();
        }
    }

    /// Deselect all categories in a column.
    pub fn select_none(&mut self, column: FilterField) {
        if let Some(filters) = self.filters.as_mut() {
            filters.insert(column, BTreeSet::new());
            self.refresh();
        }
    }
}

fn colors_for(view: &DashboardView, column: FilterField) -> ColorMap {
    let categories = view.filter_options.get(&column).into_iter().flatten();
    ColorMap::new(categories.filter_map(|c| c.as_deref()))
}

/// Sidebar label for a category; blank cells get a visible name.
pub fn category_label(category: &Category) -> &str {
    category.as_deref().unwrap_or("(blank)")
}
