use eframe::egui::{Color32, RichText, Ui};
use project_dashboard::data::aggregate::{Availability, Utilization};
use project_dashboard::data::model::Field;
use project_dashboard::pipeline::DashboardView;

// ---------------------------------------------------------------------------
// KPI cards
// ---------------------------------------------------------------------------

/// Three KPI cards side by side.
pub fn kpi_row(ui: &mut Ui, view: &DashboardView) {
    ui.heading("Key Performance Indicators");

    let display = &view.kpi_display;
    let kpis = &view.kpis;
    ui.columns(3, |cols| {
        card(
            &mut cols[0],
            "Total Projects",
            &display.total_projects,
            availability_hint(&kpis.total_projects),
        );
        card(
            &mut cols[1],
            "Avg Budget Utilization",
            &display.budget_utilization,
            match &kpis.budget_utilization {
                Utilization::Computed { .. } => None,
                Utilization::Unavailable { missing } => Some(missing_hint(missing)),
                Utilization::ZeroDenominator => {
                    Some(("no allocated budget".to_string(), Color32::GRAY))
                }
            },
        );
        card(
            &mut cols[2],
            "Avg Citizen Satisfaction",
            &display.satisfaction,
            availability_hint(&kpis.satisfaction),
        );
    });
}

/// Explanation under a card's value, and its colour.
type Hint = (String, Color32);

fn card(ui: &mut Ui, label: &str, value: &str, hint: Option<Hint>) {
    ui.group(|ui: &mut Ui| {
        ui.set_min_width(ui.available_width());
        ui.label(label);
        ui.label(RichText::new(value).size(28.0).strong());
        if let Some((text, color)) = hint {
            ui.label(RichText::new(text).small().color(color));
        }
    });
}

/// Why a KPI shows its fallback, if it does.
fn availability_hint(value: &Availability<f64>) -> Option<Hint> {
    match value {
        Availability::Available { .. } => None,
        Availability::Unavailable { missing } => Some(missing_hint(missing)),
        Availability::Empty => Some(("no values".to_string(), Color32::GRAY)),
        Availability::OutOfRange { field, row, value } => Some((
            format!("'{field}' is {value} in row {row}, expected 0-1"),
            Color32::RED,
        )),
    }
}

fn missing_hint(missing: &[Field]) -> Hint {
    let names: Vec<&str> = missing.iter().map(|f| f.header()).collect();
    (format!("missing column: {}", names.join(", ")), Color32::GRAY)
}
