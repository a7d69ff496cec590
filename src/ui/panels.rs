use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use project_dashboard::data::filter::{Category, FilterField};
use project_dashboard::data::loader::LoadError;
use project_dashboard::data::notice::Notice;

use crate::state::{AppState, category_label};

/// A sidebar click, applied once the widgets have been drawn.
enum FilterAction {
    Toggle(FilterField, Category),
    SelectAll(FilterField),
    SelectNone(FilterField),
}

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Options");
    ui.separator();

    let Some(view) = &state.view else {
        ui.label("No dataset loaded.");
        return;
    };

    // Clone what we need so we can mutate state after the loop.
    let options = view.filter_options.clone();
    let unavailable: Vec<Notice> = view
        .notices
        .iter()
        .filter(|n| matches!(n, Notice::FilterUnavailable { .. }))
        .cloned()
        .collect();
    let filters = state.filters.clone().unwrap_or_default();

    let mut action = None;
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for notice in &unavailable {
                let text = RichText::new(format!("⚠ {notice}"));
                ui.label(text.color(Color32::from_rgb(230, 160, 40)));
            }

            for (col, values) in &options {
                let selected = filters.get(col);
                let n_selected = selected.map_or(values.len(), |s| s.len());
                let header_text = match col {
                    FilterField::ProjectType => "Select Project Type(s)",
                    FilterField::Status => "Select Project Status(es)",
                };

                let title = format!("{header_text}  ({n_selected}/{})", values.len());
                egui::CollapsingHeader::new(RichText::new(title).strong())
                .id_salt(col)
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            action = Some(FilterAction::SelectAll(*col));
                        }
                        if ui.small_button("None").clicked() {
                            action = Some(FilterAction::SelectNone(*col));
                        }
                    });

                    for value in values {
                        let mut checked = selected.map_or(true, |s| s.contains(value));
                        let label = category_label(value);
                        let mut text = RichText::new(label);
                        if let Some(name) = value.as_deref() {
                            let color = match col {
                                FilterField::ProjectType => state.type_colors.color_for(name),
                                FilterField::Status => state.status_colors.color_for(name),
                            };
                            text = text.color(color);
                        }
                        if ui.checkbox(&mut checked, text).changed() {
                            action = Some(FilterAction::Toggle(*col, value.clone()));
                        }
                    }
                });
            }
        });

    match action {
        Some(FilterAction::Toggle(col, value)) => state.toggle_filter_value(col, &value),
        Some(FilterAction::SelectAll(col)) => state.select_all(col),
        Some(FilterAction::SelectNone(col)) => state.select_none(col),
        None => {}
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();
        ui.label(state.source_label());

        if let Some(view) = &state.view {
            ui.separator();
            ui.label(format!(
                "{} rows loaded, {} visible",
                view.total_rows,
                view.rows.len()
            ));
        }
    });
}

/// Shown instead of the dashboard when the data could not be loaded.
pub fn load_error(ui: &mut Ui, err: &LoadError) {
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.label(
            RichText::new(format!("{err}\n\nUse File → Open… to pick another file."))
                .color(Color32::RED)
                .heading(),
        );
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open project data")
        .add_filter(
            "Supported files",
            &["xlsx", "xlsm", "xlsb", "xls", "ods", "csv", "json", "parquet", "pq"],
        )
        .add_filter("Spreadsheets", &["xlsx", "xlsm", "xlsb", "xls", "ods"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        log::info!("Opening {}", path.display());
        state.open(path);
    }
}
