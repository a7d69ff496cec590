mod app;
mod color;
mod state;
mod ui;

use app::DashboardApp;
use clap::Parser;
use eframe::egui;
use project_dashboard::config::DesktopConfig;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DesktopConfig::parse();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "📊 Project Performance Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(DashboardApp::new(config.source.pipeline())))),
    )
}
