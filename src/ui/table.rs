use eframe::egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};
use project_dashboard::data::model::CellValue;
use project_dashboard::pipeline::DashboardView;

const ROW_HEIGHT: f32 = 20.0;
const MAX_TABLE_HEIGHT: f32 = 420.0;

/// Every column of the filtered rows, in sheet order.
pub fn raw_data_table(ui: &mut Ui, view: &DashboardView) {
    if view.columns.is_empty() {
        ui.label("The sheet has no columns.");
        return;
    }

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(MAX_TABLE_HEIGHT)
        .columns(Column::auto().at_least(80.0), view.columns.len())
        .header(ROW_HEIGHT, |mut header| {
            for name in &view.columns {
                header.col(|ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, view.rows.len(), |mut row| {
                let record = &view.rows[row.index()];
                for name in &view.columns {
                    row.col(|ui| {
                        let cell = record.cell(name);
                        let text = match &cell {
                            CellValue::Float(v) if v.fract() != 0.0 => format!("{v:.4}"),
                            other => other.to_string(),
                        };
                        ui.label(RichText::new(text).monospace());
                    });
                }
            });
        });
}
