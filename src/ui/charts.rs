use std::f64::consts::{FRAC_PI_2, TAU};

use eframe::egui::{Color32, RichText, Stroke, Ui};
use egui_plot::{
    Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoint, PlotPoints, Points, Polygon, Text,
    uniform_grid_spacer,
};
use project_dashboard::data::aggregate::{Availability, TypeBudget};
use project_dashboard::data::notice::Notice;
use project_dashboard::pipeline::DashboardView;

use crate::color::ColorMap;

const CHART_HEIGHT: f32 = 280.0;

// ---------------------------------------------------------------------------
// Bar chart: projects by status
// ---------------------------------------------------------------------------

/// One bar per status, coloured like its sidebar entry.
pub fn status_bar_chart(ui: &mut Ui, view: &DashboardView, colors: &ColorMap) {
    let counts = match &view.status_counts {
        Availability::Available { value } => value,
        // Without a status column the chart is simply left out.
        _ => return,
    };

    ui.strong("Number of Projects by Status");
    let names: Vec<String> = counts.iter().map(|c| c.status.clone()).collect();
    Plot::new("status_counts")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Status")
        .x_grid_spacer(uniform_grid_spacer(|_| [1.0, 5.0, 10.0]))
        .x_axis_formatter(move |mark: GridMark, _range| status_tick_label(&names, mark.value))
        .y_axis_label("Count")
        .show_x(false)
        .include_y(0.0)
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (i, c) in counts.iter().enumerate() {
                let color = colors.color_for(&c.status);
                let bar = Bar::new(i as f64, c.count as f64)
                    .name(&c.status)
                    .fill(color)
                    .width(0.7);
                plot_ui.bar_chart(BarChart::new(vec![bar]).name(&c.status).color(color));
            }
        });
}

/// Bars sit at 0, 1, 2, ...; only those ticks get a label.
fn status_tick_label(names: &[String], x: f64) -> String {
    if x < 0.0 || x.fract() != 0.0 {
        return String::new();
    }
    names.get(x as usize).cloned().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Pie chart: budget allocation by project type
// ---------------------------------------------------------------------------

/// Budget share per project type, drawn as polygon wedges.
pub fn budget_pie_chart(ui: &mut Ui, view: &DashboardView, colors: &ColorMap) {
    let groups = match &view.budget_by_type {
        Availability::Available { value } => value,
        _ => return,
    };

    ui.strong("Budget Allocation by Project Type");
    let total: f64 = groups.iter().map(|g| g.budget_allocated.max(0.0)).sum();
    if total <= 0.0 {
        ui.label(RichText::new("No allocated budget to show.").color(Color32::GRAY));
        return;
    }

    Plot::new("budget_by_type")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            let mut start = FRAC_PI_2;
            for group in groups {
                let fraction = group.budget_allocated.max(0.0) / total;
                if fraction <= 0.0 {
                    continue;
                }
                let end = start - fraction * TAU;
                let color = colors.color_for(&group.project_type);
                for wedge in wedge_polygons(start, end) {
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(wedge))
                            .fill_color(color)
                            .stroke(Stroke::new(1.0, Color32::WHITE))
                            .name(&group.project_type),
                    );
                }
                let mid = (start + end) / 2.0;
                plot_ui.text(Text::new(
                    PlotPoint::new(0.65 * mid.cos(), 0.65 * mid.sin()),
                    RichText::new(share_label(group, total)).color(Color32::WHITE).strong(),
                ));
                start = end;
            }
        });
}

fn share_label(group: &TypeBudget, total: f64) -> String {
    format!("{:.1}%", group.budget_allocated / total * 100.0)
}

/// Unit-circle wedge from `start` to `end` (radians, clockwise), split into
/// pieces of at most a quarter turn so each polygon stays convex.
fn wedge_polygons(start: f64, end: f64) -> Vec<Vec<[f64; 2]>> {
    const MAX_SPAN: f64 = FRAC_PI_2;
    const STEPS_PER_RADIAN: f64 = 24.0;

    let span = start - end;
    let pieces = (span / MAX_SPAN).ceil().max(1.0) as usize;
    let piece_span = span / pieces as f64;

    (0..pieces)
        .map(|p| {
            let a0 = start - p as f64 * piece_span;
            let steps = ((piece_span * STEPS_PER_RADIAN).ceil() as usize).max(2);
            let mut pts = Vec::with_capacity(steps + 2);
            pts.push([0.0, 0.0]);
            for s in 0..=steps {
                let a = a0 - piece_span * s as f64 / steps as f64;
                pts.push([a.cos(), a.sin()]);
            }
            pts
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Line chart: yearly utilization trend
// ---------------------------------------------------------------------------

/// Average budget utilization per year, with markers.
pub fn utilization_trend_chart(ui: &mut Ui, view: &DashboardView) {
    let points = match &view.utilization_trend {
        Availability::Available { value } => value,
        Availability::OutOfRange { .. } => {
            if let Some(notice) = view.utilization_trend.range_notice() {
                ui.label(RichText::new(notice.to_string()).color(Color32::RED));
            }
            return;
        }
        _ => {
            for notice in &view.notices {
                if let Notice::TrendUnavailable { .. } = notice {
                    ui.label(RichText::new(format!("ℹ {notice}")).color(Color32::LIGHT_BLUE));
                }
            }
            return;
        }
    };

    ui.strong("Average Budget Utilization Trend");
    let series: Vec<[f64; 2]> = points
        .iter()
        .map(|p| [p.year as f64, p.avg_utilization_percent])
        .collect();

    Plot::new("utilization_trend")
        .height(CHART_HEIGHT)
        .x_axis_label("Year")
        .y_axis_label("Budget Utilization (%)")
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(series.clone()))
                    .color(Color32::LIGHT_BLUE)
                    .width(2.0),
            );
            plot_ui.points(
                Points::new(PlotPoints::from(series))
                    .color(Color32::LIGHT_BLUE)
                    .radius(4.0),
            );
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_circle_splits_into_quarter_turns() {
        let wedges = wedge_polygons(FRAC_PI_2, FRAC_PI_2 - TAU);
        assert_eq!(wedges.len(), 4);
        for w in &wedges {
            assert_eq!(w[0], [0.0, 0.0]);
            for p in &w[1..] {
                let r = (p[0] * p[0] + p[1] * p[1]).sqrt();
                assert!((r - 1.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn status_ticks_name_their_bars() {
        let names = vec!["Completed".to_string(), "Ongoing".to_string()];
        assert_eq!(status_tick_label(&names, 0.0), "Completed");
        assert_eq!(status_tick_label(&names, 1.0), "Ongoing");
        assert_eq!(status_tick_label(&names, 0.5), "");
        assert_eq!(status_tick_label(&names, 2.0), "");
        assert_eq!(status_tick_label(&names, -1.0), "");
    }

    #[test]
    fn thin_wedge_is_a_single_polygon() {
        let wedges = wedge_polygons(1.0, 0.9);
        assert_eq!(wedges.len(), 1);
        assert!(wedges[0].len() >= 4);
    }
}
