use eframe::egui;
use project_dashboard::pipeline::Pipeline;

use crate::state::AppState;
use crate::ui::{charts, kpi, panels, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    pub state: AppState,
}

impl DashboardApp {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            state: AppState::new(pipeline),
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: KPIs, charts, raw data ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(err) = &self.state.error {
                // Load failed: nothing else is drawn for this pass.
                panels::load_error(ui, err);
                return;
            }
            let Some(view) = &self.state.view else {
                return;
            };

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.heading("📊 Project Performance Dashboard");
                    ui.label("Explore key insights from cleaned project data.");
                    ui.add_space(8.0);

                    kpi::kpi_row(ui, view);
                    ui.add_space(12.0);

                    ui.heading("Visualizations");
                    charts::status_bar_chart(ui, view, &self.state.status_colors);
                    charts::budget_pie_chart(ui, view, &self.state.type_colors);
                    charts::utilization_trend_chart(ui, view);
                    ui.add_space(12.0);

                    ui.heading("Filtered Raw Data");
                    table::raw_data_table(ui, view);
                });
        });
    }
}
