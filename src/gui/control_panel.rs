//! Filter Panel Widget
//! Left side panel with the data source row and all filter controls.

use std::path::PathBuf;

use egui::{Color32, ComboBox, RichText};

use crate::data::{FilterSelection, Indicator, WEEK_MAX, WEEK_MIN, YEAR_MAX, YEAR_MIN};

/// Left side panel: data source, indicator/province/range filters, reset.
pub struct FilterPanel {
    pub selection: FilterSelection,
    pub provinces: Vec<i32>,
    pub data_dir: Option<PathBuf>,
    pub status: String,
    pub export_enabled: bool,
}

impl Default for FilterPanel {
    fn default() -> Self {
        Self {
            selection: FilterSelection::default(),
            provinces: Vec::new(),
            data_dir: None,
            status: "No data loaded".to_string(),
            export_enabled: false,
        }
    }
}

impl FilterPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the province list after a load; keeps the current choice when
    /// it is still present, otherwise falls back to the first province.
    pub fn set_provinces(&mut self, provinces: Vec<i32>) {
        if !provinces.contains(&self.selection.province) {
            self.selection.province = provinces.first().copied().unwrap_or(1);
        }
        self.provinces = provinces;
    }

    /// Restore default filter selections.
    pub fn reset(&mut self) {
        self.selection = FilterSelection::reset(&self.provinces);
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }

    /// Draw the panel.
    pub fn show(&mut self, ui: &mut egui::Ui) -> PanelAction {
        let mut action = PanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📊 VHI Explorer")
                    .size(22.0)
                    .color(Color32::from_rgb(87, 166, 78)),
            );
            ui.label(
                RichText::new("Vegetation health indices by province")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let dir_text = self
                        .data_dir
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No directory selected".to_string());

                    ui.label(RichText::new(&dir_text).size(12.0).color(
                        if self.data_dir.is_some() {
                            Color32::WHITE
                        } else {
                            Color32::GRAY
                        },
                    ));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Browse").clicked() {
                            action = PanelAction::BrowseDir;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Filters Section =====
        ui.label(RichText::new("🔧 Filters").size(14.0).strong());
        ui.add_space(8.0);

        let label_width = 80.0;
        let combo_width = 150.0;
        let mut changed = false;

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Indicator:"));
            ComboBox::from_id_salt("indicator")
                .width(combo_width)
                .selected_text(self.selection.indicator.column())
                .show_ui(ui, |ui| {
                    for indicator in Indicator::ALL {
                        if ui
                            .selectable_label(
                                self.selection.indicator == indicator,
                                indicator.column(),
                            )
                            .clicked()
                        {
                            self.selection.indicator = indicator;
                            changed = true;
                        }
                    }
                });
        });

        ui.add_space(5.0);

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Province:"));
            ComboBox::from_id_salt("province")
                .width(combo_width)
                .selected_text(self.selection.province.to_string())
                .show_ui(ui, |ui| {
                    for &province in &self.provinces {
                        if ui
                            .selectable_label(
                                self.selection.province == province,
                                province.to_string(),
                            )
                            .clicked()
                        {
                            self.selection.province = province;
                            changed = true;
                        }
                    }
                });
        });

        ui.add_space(10.0);

        ui.label("Week range:");
        ui.horizontal(|ui| {
            changed |= ui
                .add(
                    egui::Slider::new(&mut self.selection.week_range.0, WEEK_MIN..=WEEK_MAX)
                        .text("from"),
                )
                .changed();
        });
        ui.horizontal(|ui| {
            changed |= ui
                .add(
                    egui::Slider::new(&mut self.selection.week_range.1, WEEK_MIN..=WEEK_MAX)
                        .text("to"),
                )
                .changed();
        });

        ui.add_space(5.0);

        ui.label("Year range:");
        ui.horizontal(|ui| {
            changed |= ui
                .add(
                    egui::Slider::new(&mut self.selection.year_range.0, YEAR_MIN..=YEAR_MAX)
                        .text("from"),
                )
                .changed();
        });
        ui.horizontal(|ui| {
            changed |= ui
                .add(
                    egui::Slider::new(&mut self.selection.year_range.1, YEAR_MIN..=YEAR_MAX)
                        .text("to"),
                )
                .changed();
        });

        // Keep both ranges well-formed while dragging.
        if self.selection.week_range.1 < self.selection.week_range.0 {
            self.selection.week_range.1 = self.selection.week_range.0;
        }
        if self.selection.year_range.1 < self.selection.year_range.0 {
            self.selection.year_range.1 = self.selection.year_range.0;
        }

        if changed && action == PanelAction::None {
            action = PanelAction::Changed;
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            let reset = egui::Button::new(RichText::new("↺ Reset Filters").size(14.0))
                .min_size(egui::vec2(170.0, 30.0));
            if ui.add(reset).clicked() {
                action = PanelAction::Reset;
            }

            ui.add_space(8.0);

            ui.add_enabled_ui(self.export_enabled, |ui| {
                let export = egui::Button::new(RichText::new("💾 Export CSV").size(14.0))
                    .min_size(egui::vec2(170.0, 30.0));
                if ui.add(export).clicked() {
                    action = PanelAction::ExportCsv;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Status =====
        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("Loaded") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }
}

/// Actions triggered by the filter panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelAction {
    None,
    BrowseDir,
    Changed,
    Reset,
    ExportCsv,
}
