//! Chart Plotter Module
//! Creates interactive visualizations using egui_plot.

use std::collections::BTreeMap;

use egui::Color32;
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Polygon};

use crate::data::{HeatmapGrid, Indicator, VhiRow};

/// Color for the currently selected province in the bar comparison.
pub const HIGHLIGHT_COLOR: Color32 = Color32::from_rgb(52, 152, 219); // Blue

/// Color cycle for the per-year lines.
pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(231, 76, 60),   // Red
    Color32::from_rgb(46, 204, 113),  // Green
    Color32::from_rgb(155, 89, 182),  // Purple
    Color32::from_rgb(243, 156, 18),  // Orange
    Color32::from_rgb(26, 188, 156),  // Teal
    Color32::from_rgb(233, 30, 99),   // Pink
    Color32::from_rgb(0, 188, 212),   // Cyan
    Color32::from_rgb(255, 87, 34),   // Deep Orange
    Color32::from_rgb(121, 85, 72),   // Brown
    Color32::from_rgb(96, 125, 139),  // Blue Grey
];

/// Sequential yellow-green-blue ramp for the heatmap, low to high.
const HEAT_STOPS: [(u8, u8, u8); 5] = [
    (255, 255, 217),
    (199, 233, 180),
    (65, 182, 196),
    (34, 94, 168),
    (8, 29, 88),
];

const CHART_HEIGHT: f32 = 460.0;
const BARS_HEIGHT: f32 = 380.0;

/// Creates the weekly line chart, the Year×Week heatmap and the province
/// mean bar comparison.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Color for the i-th year line.
    pub fn year_color(index: usize) -> Color32 {
        PALETTE[index % PALETTE.len()]
    }

    /// Interpolated ramp color for a normalized value in [0, 1].
    pub fn heat_color(t: f64) -> Color32 {
        let t = t.clamp(0.0, 1.0);
        let scaled = t * (HEAT_STOPS.len() - 1) as f64;
        let idx = (scaled.floor() as usize).min(HEAT_STOPS.len() - 2);
        let frac = scaled - idx as f64;

        let (r0, g0, b0) = HEAT_STOPS[idx];
        let (r1, g1, b1) = HEAT_STOPS[idx + 1];
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;

        Color32::from_rgb(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
    }

    /// Weekly indicator series, one line per year.
    pub fn draw_weekly_lines(ui: &mut egui::Ui, rows: &[VhiRow], indicator: Indicator) {
        let mut by_year: BTreeMap<i32, Vec<[f64; 2]>> = BTreeMap::new();
        for row in rows {
            let v = indicator.of(row);
            if !v.is_nan() {
                by_year
                    .entry(row.year)
                    .or_default()
                    .push([row.week as f64, v]);
            }
        }

        Plot::new(format!("weekly_{}", indicator.column()))
            .height(CHART_HEIGHT)
            .legend(Legend::default())
            .x_axis_label("Week")
            .y_axis_label(indicator.column())
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                for (i, (year, points)) in by_year.iter().enumerate() {
                    plot_ui.line(
                        Line::new(PlotPoints::from_iter(points.iter().copied()))
                            .color(Self::year_color(i))
                            .width(1.5)
                            .name(year.to_string()),
                    );
                }
            });
    }

    /// Year×Week heatmap drawn as filled cell polygons.
    pub fn draw_heatmap(ui: &mut egui::Ui, grid: &HeatmapGrid) {
        let Some((lo, hi)) = grid.min_max() else {
            ui.label("No data for the current selection.");
            return;
        };

        Plot::new("heatmap")
            .height(CHART_HEIGHT)
            .x_axis_label("Week")
            .y_axis_label("Year")
            .allow_scroll(false)
            .y_axis_formatter(|mark, _range| {
                let v = mark.value;
                if (v - v.round()).abs() < 1e-6 {
                    format!("{:.0}", v.round())
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                for (yi, &year) in grid.years.iter().enumerate() {
                    for (wi, &week) in grid.weeks.iter().enumerate() {
                        let Some(v) = grid.value(yi, wi) else {
                            continue;
                        };
                        let t = if hi > lo { (v - lo) / (hi - lo) } else { 0.5 };

                        let x = week as f64;
                        let y = year as f64;
                        let corners = PlotPoints::from(vec![
                            [x - 0.5, y - 0.5],
                            [x + 0.5, y - 0.5],
                            [x + 0.5, y + 0.5],
                            [x - 0.5, y + 0.5],
                        ]);

                        plot_ui.polygon(
                            Polygon::new(corners)
                                .fill_color(Self::heat_color(t))
                                .stroke(egui::Stroke::new(0.5, Color32::from_gray(70))),
                        );
                    }
                }
            });
    }

    /// Mean indicator per province as bars, selected province highlighted.
    pub fn draw_province_bars(
        ui: &mut egui::Ui,
        means: &[(i32, f64)],
        indicator: Indicator,
        selected_province: i32,
    ) {
        if means.is_empty() {
            ui.label("No data loaded.");
            return;
        }

        let x_labels: Vec<String> = means.iter().map(|(id, _)| id.to_string()).collect();

        Plot::new(format!("province_means_{}", indicator.column()))
            .height(BARS_HEIGHT)
            .x_axis_label("Province")
            .y_axis_label(format!("Mean {}", indicator.column()))
            .allow_scroll(false)
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round() as usize;
                if (mark.value - mark.value.round()).abs() < 1e-6 && idx < x_labels.len() {
                    x_labels[idx].clone()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                let bars: Vec<Bar> = means
                    .iter()
                    .enumerate()
                    .map(|(i, (id, mean))| {
                        let color = if *id == selected_province {
                            HIGHLIGHT_COLOR
                        } else {
                            Color32::from_gray(140)
                        };
                        Bar::new(i as f64, *mean)
                            .width(0.6)
                            .fill(color)
                            .name(format!("Province {id}"))
                    })
                    .collect();

                plot_ui.bar_chart(BarChart::new(bars));
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heat_color_endpoints() {
        assert_eq!(ChartPlotter::heat_color(0.0), Color32::from_rgb(255, 255, 217));
        assert_eq!(ChartPlotter::heat_color(1.0), Color32::from_rgb(8, 29, 88));
        // Out-of-range input clamps instead of panicking.
        assert_eq!(ChartPlotter::heat_color(-3.0), ChartPlotter::heat_color(0.0));
        assert_eq!(ChartPlotter::heat_color(7.0), ChartPlotter::heat_color(1.0));
    }

    #[test]
    fn test_year_color_cycles() {
        assert_eq!(ChartPlotter::year_color(0), ChartPlotter::year_color(PALETTE.len()));
    }
}
