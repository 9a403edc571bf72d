//! Data module - CSV loading and processing

pub mod loader;
mod processor;

pub use loader::{LoaderError, VhiLoader};
pub use processor::{
    DataProcessor, FilterSelection, HeatmapGrid, Indicator, IndicatorSummary, VhiRow, WEEK_MAX,
    WEEK_MIN, YEAR_MAX, YEAR_MIN,
};
