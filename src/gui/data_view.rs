//! Data View Widget
//! Central panel: sort checkboxes plus table / chart / heatmap tabs for the
//! filtered rows.

use egui::{Color32, RichText, ScrollArea};

use crate::charts::ChartPlotter;
use crate::data::{DataProcessor, HeatmapGrid, Indicator, IndicatorSummary, VhiRow};

const ROW_HEIGHT: f32 = 18.0;
const COL_WIDTH: f32 = 82.0;

const TABLE_HEADERS: [&str; 8] = [
    "Year",
    "Week",
    "SMN",
    "SMT",
    "VCI",
    "TCI",
    "VHI",
    "Province",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewTab {
    #[default]
    Table,
    Chart,
    Heatmap,
}

/// Central display area holding the derived view of the current selection.
pub struct DataView {
    pub tab: ViewTab,
    pub sort_ascending: bool,
    pub sort_descending: bool,

    rows: Vec<VhiRow>,
    sorted_cache: Option<Vec<VhiRow>>,
    grid: HeatmapGrid,
    means: Vec<(i32, f64)>,
    summary: Option<IndicatorSummary>,
    indicator: Indicator,
    province: i32,
    has_data: bool,
}

impl Default for DataView {
    fn default() -> Self {
        Self {
            tab: ViewTab::default(),
            sort_ascending: false,
            sort_descending: false,
            rows: Vec::new(),
            sorted_cache: None,
            grid: HeatmapGrid::default(),
            means: Vec::new(),
            summary: None,
            indicator: Indicator::default(),
            province: 0,
            has_data: false,
        }
    }
}

impl DataView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the derived view after a load or filter change.
    pub fn set_data(
        &mut self,
        rows: Vec<VhiRow>,
        grid: HeatmapGrid,
        means: Vec<(i32, f64)>,
        summary: Option<IndicatorSummary>,
        indicator: Indicator,
        province: i32,
    ) {
        self.rows = rows;
        self.grid = grid;
        self.means = means;
        self.summary = summary;
        self.indicator = indicator;
        self.province = province;
        self.sorted_cache = None;
        self.has_data = true;
    }

    pub fn clear(&mut self) {
        *self = Self {
            tab: self.tab,
            ..Self::default()
        };
    }

    /// Both sort orders selected at once is a user error.
    pub fn sort_conflict(&self) -> bool {
        self.sort_ascending && self.sort_descending
    }

    fn rebuild_sorted_cache(&mut self) {
        if self.sorted_cache.is_none() {
            let mut rows = self.rows.clone();
            DataProcessor::sort_rows(&mut rows, self.indicator, self.sort_ascending);
            self.sorted_cache = Some(rows);
        }
    }

    /// Draw the whole central area.
    pub fn show(&mut self, ui: &mut egui::Ui) {
        if !self.has_data {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        }

        // Sort controls apply to the table tab.
        ui.horizontal(|ui| {
            if ui
                .checkbox(&mut self.sort_ascending, "Sort ascending")
                .changed()
            {
                self.sorted_cache = None;
            }
            if ui
                .checkbox(&mut self.sort_descending, "Sort descending")
                .changed()
            {
                self.sorted_cache = None;
            }
        });

        ui.add_space(4.0);

        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.tab, ViewTab::Table, "📋 Table");
            ui.selectable_value(&mut self.tab, ViewTab::Chart, "📈 Chart");
            ui.selectable_value(&mut self.tab, ViewTab::Heatmap, "🔳 Heatmap");
        });

        ui.separator();

        match self.tab {
            ViewTab::Table => self.show_table(ui),
            ViewTab::Chart => self.show_chart(ui),
            ViewTab::Heatmap => self.show_heatmap(ui),
        }
    }

    fn show_table(&mut self, ui: &mut egui::Ui) {
        if self.sort_conflict() {
            ui.add_space(8.0);
            ui.label(
                RichText::new("Only one sort order can be selected at a time.")
                    .size(14.0)
                    .color(Color32::from_rgb(220, 53, 69)),
            );
            return;
        }

        match &self.summary {
            Some(s) => {
                ui.label(format!(
                    "{} rows • {}: mean {:.2}, min {:.2}, max {:.2}",
                    self.rows.len(),
                    self.indicator,
                    s.mean,
                    s.min,
                    s.max
                ));
            }
            None => {
                ui.label("No rows match the current filters.");
            }
        }

        let heading = if self.sort_ascending {
            format!("Sorted ascending by {}:", self.indicator)
        } else if self.sort_descending {
            format!("Sorted descending by {}:", self.indicator)
        } else {
            "Unsorted data:".to_string()
        };
        ui.label(RichText::new(heading).size(12.0).color(Color32::GRAY));
        ui.add_space(4.0);

        // Header row
        ui.horizontal(|ui| {
            for header in TABLE_HEADERS {
                ui.add_sized(
                    [COL_WIDTH, ROW_HEIGHT],
                    egui::Label::new(RichText::new(header).strong().size(12.0)),
                );
            }
        });
        ui.separator();

        if self.sort_ascending || self.sort_descending {
            self.rebuild_sorted_cache();
        }
        let rows: &[VhiRow] = match &self.sorted_cache {
            Some(sorted) if self.sort_ascending || self.sort_descending => sorted,
            _ => &self.rows,
        };

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show_rows(ui, ROW_HEIGHT, rows.len(), |ui, row_range| {
                for row in &rows[row_range] {
                    ui.horizontal(|ui| {
                        let cells = [
                            row.year.to_string(),
                            row.week.to_string(),
                            fmt_value(row.smn),
                            fmt_value(row.smt),
                            fmt_value(row.vci),
                            fmt_value(row.tci),
                            fmt_value(row.vhi),
                            row.province_id.to_string(),
                        ];
                        for cell in cells {
                            ui.add_sized(
                                [COL_WIDTH, ROW_HEIGHT],
                                egui::Label::new(RichText::new(cell).size(11.0)),
                            );
                        }
                    });
                }
            });
    }

    fn show_chart(&mut self, ui: &mut egui::Ui) {
        ui.label(format!(
            "{} by week for province {}",
            self.indicator, self.province
        ));
        ui.add_space(4.0);
        ChartPlotter::draw_weekly_lines(ui, &self.rows, self.indicator);
    }

    fn show_heatmap(&mut self, ui: &mut egui::Ui) {
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.label(format!(
                    "{} heatmap for province {}",
                    self.indicator, self.province
                ));
                ui.add_space(4.0);
                ChartPlotter::draw_heatmap(ui, &self.grid);

                ui.add_space(12.0);
                ui.separator();
                ui.add_space(8.0);

                ui.label(format!(
                    "Mean {} across all provinces (province {} highlighted)",
                    self.indicator, self.province
                ));
                ui.add_space(4.0);
                ChartPlotter::draw_province_bars(
                    ui,
                    &self.means,
                    self.indicator,
                    self.province,
                );
            });
    }
}

/// Format a numeric cell; NaN renders as a dash.
fn fmt_value(v: f64) -> String {
    if v.is_nan() {
        "-".to_string()
    } else {
        format!("{v:.3}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_conflict_only_when_both_selected() {
        let mut view = DataView::new();
        assert!(!view.sort_conflict());

        view.sort_ascending = true;
        assert!(!view.sort_conflict());

        view.sort_descending = true;
        assert!(view.sort_conflict());

        view.sort_ascending = false;
        assert!(!view.sort_conflict());
    }

    #[test]
    fn test_fmt_value_handles_missing() {
        assert_eq!(fmt_value(f64::NAN), "-");
        assert_eq!(fmt_value(49.953), "49.953");
    }
}
