//! VHI Explorer Main Application
//! Main window wiring the filter panel to the tabbed data view.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::thread;

use anyhow::Context;
use egui::SidePanel;
use polars::prelude::*;

use crate::data::{loader, DataProcessor, VhiLoader};
use crate::gui::{DataView, FilterPanel, PanelAction};

/// Directory tried at startup when no directory has been chosen yet.
const DEFAULT_DATA_DIR: &str = "data";

/// Directory loading result from the background thread.
enum LoadResult {
    Progress(String),
    Complete { df: DataFrame, row_count: usize },
    Error(String),
}

/// Main application window.
pub struct VhiApp {
    loader: VhiLoader,
    panel: FilterPanel,
    view: DataView,

    /// Filtered view of the combined table, kept for CSV export.
    filtered: Option<DataFrame>,

    // Async directory loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl VhiApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let mut app = Self {
            loader: VhiLoader::new(),
            panel: FilterPanel::new(),
            view: DataView::new(),
            filtered: None,
            load_rx: None,
            is_loading: false,
        };

        let default_dir = PathBuf::from(DEFAULT_DATA_DIR);
        if default_dir.is_dir() {
            app.start_load(default_dir);
        }

        app
    }

    /// Kick off a directory load in a background thread.
    fn start_load(&mut self, dir: PathBuf) {
        if self.is_loading {
            return;
        }

        self.view.clear();
        self.filtered = None;
        self.panel.export_enabled = false;
        self.panel.data_dir = Some(dir.clone());
        self.panel.set_status("Loading CSV files...");
        self.loader.set_data_dir(dir.clone());
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        thread::spawn(move || {
            let _ = tx.send(LoadResult::Progress("Reading CSV files...".to_string()));

            match loader::load_directory(&dir) {
                Ok(df) => {
                    let row_count = df.height();
                    let _ = tx.send(LoadResult::Complete { df, row_count });
                }
                Err(e) => {
                    let _ = tx.send(LoadResult::Error(e.to_string()));
                }
            }
        });
    }

    /// Check for directory loading results.
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    LoadResult::Progress(status) => {
                        self.panel.set_status(&status);
                    }
                    LoadResult::Complete { df, row_count } => {
                        self.loader.set_dataframe(df);
                        let provinces = self.loader.provinces();
                        let n_provinces = provinces.len();
                        self.panel.set_provinces(provinces);
                        self.panel.set_status(&format!(
                            "Loaded {row_count} rows from {n_provinces} provinces"
                        ));
                        self.is_loading = false;
                        should_keep_receiver = false;
                        self.apply_filters();
                    }
                    LoadResult::Error(error) => {
                        self.panel.set_status(&format!("Error: {error}"));
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    /// Recompute the derived view from the current filter selection.
    fn apply_filters(&mut self) {
        let Some(df) = self.loader.get_dataframe() else {
            return;
        };

        let selection = self.panel.selection.clone();
        let indicator = selection.indicator;

        let derived = DataProcessor::apply_filter(df, &selection).and_then(|filtered| {
            let rows = DataProcessor::to_rows(&filtered)?;
            let means = DataProcessor::province_means(df, indicator)?;
            Ok((filtered, rows, means))
        });

        match derived {
            Ok((filtered, rows, means)) => {
                let grid = DataProcessor::pivot_year_week(&rows, indicator);
                let summary = DataProcessor::indicator_summary(&rows, indicator);

                self.panel.export_enabled = !rows.is_empty();
                self.view
                    .set_data(rows, grid, means, summary, indicator, selection.province);
                self.filtered = Some(filtered);
            }
            Err(e) => {
                self.panel.set_status(&format!("Error: {e}"));
                self.filtered = None;
                self.panel.export_enabled = false;
            }
        }
    }

    /// Handle data directory selection.
    fn handle_browse_dir(&mut self) {
        if self.is_loading {
            return;
        }

        if let Some(dir) = rfd::FileDialog::new().pick_folder() {
            self.start_load(dir);
        }
    }

    /// Write the filtered table to a CSV file chosen by the user.
    fn handle_export_csv(&mut self) {
        let Some(mut df) = self.filtered.clone() else {
            self.panel.set_status("No filtered data to export");
            return;
        };

        let mut dialog = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .set_file_name("vhi_filtered.csv");
        if let Some(dir) = self.loader.data_dir() {
            dialog = dialog.set_directory(dir);
        }

        let Some(path) = dialog.save_file() else {
            return; // User cancelled
        };

        match write_csv(&mut df, &path) {
            Ok(()) => {
                self.panel
                    .set_status(&format!("Exported {} rows to {}", df.height(), path.display()));
            }
            Err(e) => {
                self.panel.set_status(&format!("Error: {e:#}"));
            }
        }
    }
}

fn write_csv(df: &mut DataFrame, path: &Path) -> anyhow::Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .finish(df)
        .context("writing CSV")?;
    Ok(())
}

impl eframe::App for VhiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        if self.is_loading {
            ctx.request_repaint();
        }

        SidePanel::left("filter_panel")
            .min_width(280.0)
            .max_width(330.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.panel.show(ui);

                    match action {
                        PanelAction::BrowseDir => self.handle_browse_dir(),
                        PanelAction::Changed => self.apply_filters(),
                        PanelAction::Reset => {
                            self.panel.reset();
                            self.view.sort_ascending = false;
                            self.view.sort_descending = false;
                            self.apply_filters();
                        }
                        PanelAction::ExportCsv => self.handle_export_csv(),
                        PanelAction::None => {}
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.view.show(ui);
        });
    }
}
