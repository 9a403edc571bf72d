//! VHI Explorer - Vegetation Health Index Dashboard
//!
//! Loads weekly VHI/VCI/TCI satellite series per province and displays
//! filterable tables and charts.

mod charts;
mod data;
mod gui;

use eframe::egui;
use gui::VhiApp;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_min_inner_size([1100.0, 650.0])
            .with_title("VHI Explorer"),
        ..Default::default()
    };

    eframe::run_native(
        "VHI Explorer",
        options,
        Box::new(|cc| Ok(Box::new(VhiApp::new(cc)))),
    )
}
