//! Data Processor Module
//! Filtering, sorting, pivoting and summarising of the combined VHI table.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use polars::prelude::*;
use thiserror::Error;

/// Slider bounds for the week filter.
pub const WEEK_MIN: i32 = 1;
pub const WEEK_MAX: i32 = 52;

/// Slider bounds for the year filter.
pub const YEAR_MIN: i32 = 1997;
pub const YEAR_MAX: i32 = 2025;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Drought indicator selectable in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Indicator {
    /// Vegetation Condition Index
    #[default]
    Vci,
    /// Temperature Condition Index
    Tci,
    /// Vegetation Health Index
    Vhi,
}

impl Indicator {
    pub const ALL: [Indicator; 3] = [Indicator::Vci, Indicator::Tci, Indicator::Vhi];

    /// Column name in the combined table.
    pub fn column(&self) -> &'static str {
        match self {
            Indicator::Vci => "VCI",
            Indicator::Tci => "TCI",
            Indicator::Vhi => "VHI",
        }
    }

    /// Value of this indicator in a materialized row.
    pub fn of(&self, row: &VhiRow) -> f64 {
        match self {
            Indicator::Vci => row.vci,
            Indicator::Tci => row.tci,
            Indicator::Vhi => row.vhi,
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// One materialized row of the combined table, used for table rendering
/// and chart building. Missing numeric cells are NaN.
#[derive(Debug, Clone)]
pub struct VhiRow {
    pub year: i32,
    pub week: i32,
    pub smn: f64,
    pub smt: f64,
    pub vci: f64,
    pub tci: f64,
    pub vhi: f64,
    pub province_id: i32,
}

/// Sidebar filter selections. This is the per-session state the Reset
/// button restores to its defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSelection {
    pub indicator: Indicator,
    pub province: i32,
    pub week_range: (i32, i32),
    pub year_range: (i32, i32),
}

impl FilterSelection {
    /// Defaults: VCI, first province, full week and year spans.
    pub fn reset(provinces: &[i32]) -> Self {
        Self {
            indicator: Indicator::Vci,
            province: provinces.first().copied().unwrap_or(1),
            week_range: (WEEK_MIN, WEEK_MAX),
            year_range: (YEAR_MIN, YEAR_MAX),
        }
    }
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self::reset(&[])
    }
}

/// Year×Week grid of indicator values for the heatmap, row-major by year.
#[derive(Debug, Clone, Default)]
pub struct HeatmapGrid {
    pub years: Vec<i32>,
    pub weeks: Vec<i32>,
    cells: Vec<Option<f64>>,
}

impl HeatmapGrid {
    pub fn is_empty(&self) -> bool {
        self.years.is_empty() || self.weeks.is_empty()
    }

    /// Value at (year index, week index).
    pub fn value(&self, year_idx: usize, week_idx: usize) -> Option<f64> {
        self.cells
            .get(year_idx * self.weeks.len() + week_idx)
            .copied()
            .flatten()
    }

    /// Range of populated cell values.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        let mut range: Option<(f64, f64)> = None;
        for v in self.cells.iter().flatten() {
            range = Some(match range {
                Some((lo, hi)) => (lo.min(*v), hi.max(*v)),
                None => (*v, *v),
            });
        }
        range
    }
}

/// Descriptive summary of the chosen indicator over the filtered rows.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSummary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Filtering and reshaping operations over the combined table.
pub struct DataProcessor;

impl DataProcessor {
    /// Boolean mask over three ranges: inclusive year bounds, inclusive week
    /// bounds and province equality.
    pub fn apply_filter(
        df: &DataFrame,
        selection: &FilterSelection,
    ) -> Result<DataFrame, ProcessorError> {
        let (y0, y1) = selection.year_range;
        let (w0, w1) = selection.week_range;

        let filtered = df
            .clone()
            .lazy()
            .filter(
                col("Year")
                    .gt_eq(lit(y0))
                    .and(col("Year").lt_eq(lit(y1)))
                    .and(col("Week").gt_eq(lit(w0)))
                    .and(col("Week").lt_eq(lit(w1)))
                    .and(col("province_id").eq(lit(selection.province))),
            )
            .collect()?;

        Ok(filtered)
    }

    /// Materialize a DataFrame into typed rows for rendering.
    pub fn to_rows(df: &DataFrame) -> Result<Vec<VhiRow>, ProcessorError> {
        let year = df.column("Year")?.i32()?;
        let week = df.column("Week")?.i32()?;
        let smn = df.column("SMN")?.f64()?;
        let smt = df.column("SMT")?.f64()?;
        let vci = df.column("VCI")?.f64()?;
        let tci = df.column("TCI")?.f64()?;
        let vhi = df.column("VHI")?.f64()?;
        let province = df.column("province_id")?.i32()?;

        let mut rows = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            rows.push(VhiRow {
                year: year.get(i).unwrap_or(0),
                week: week.get(i).unwrap_or(0),
                smn: smn.get(i).unwrap_or(f64::NAN),
                smt: smt.get(i).unwrap_or(f64::NAN),
                vci: vci.get(i).unwrap_or(f64::NAN),
                tci: tci.get(i).unwrap_or(f64::NAN),
                vhi: vhi.get(i).unwrap_or(f64::NAN),
                province_id: province.get(i).unwrap_or(0),
            });
        }

        Ok(rows)
    }

    /// Stable sort by the chosen indicator. Missing values (NaN) sort after
    /// every real value regardless of direction.
    pub fn sort_rows(rows: &mut [VhiRow], indicator: Indicator, ascending: bool) {
        rows.sort_by(|a, b| {
            let (va, vb) = (indicator.of(a), indicator.of(b));
            match (va.is_nan(), vb.is_nan()) {
                (true, true) => std::cmp::Ordering::Equal,
                (true, false) => std::cmp::Ordering::Greater,
                (false, true) => std::cmp::Ordering::Less,
                (false, false) => {
                    let ord = va.total_cmp(&vb);
                    if ascending {
                        ord
                    } else {
                        ord.reverse()
                    }
                }
            }
        });
    }

    /// Pivot filtered rows into a Year×Week grid of indicator values.
    pub fn pivot_year_week(rows: &[VhiRow], indicator: Indicator) -> HeatmapGrid {
        let years: BTreeSet<i32> = rows.iter().map(|r| r.year).collect();
        let weeks: BTreeSet<i32> = rows.iter().map(|r| r.week).collect();

        let mut values: BTreeMap<(i32, i32), f64> = BTreeMap::new();
        for row in rows {
            let v = indicator.of(row);
            if !v.is_nan() {
                values.insert((row.year, row.week), v);
            }
        }

        let years: Vec<i32> = years.into_iter().collect();
        let weeks: Vec<i32> = weeks.into_iter().collect();

        let mut cells = Vec::with_capacity(years.len() * weeks.len());
        for &year in &years {
            for &week in &weeks {
                cells.push(values.get(&(year, week)).copied());
            }
        }

        HeatmapGrid {
            years,
            weeks,
            cells,
        }
    }

    /// Mean of the chosen indicator per province over the whole table,
    /// ordered ascending by mean.
    pub fn province_means(
        df: &DataFrame,
        indicator: Indicator,
    ) -> Result<Vec<(i32, f64)>, ProcessorError> {
        let grouped = df
            .clone()
            .lazy()
            .group_by([col("province_id")])
            .agg([col(indicator.column()).mean().alias("mean")])
            .sort(["mean"], SortMultipleOptions::default())
            .collect()?;

        let ids = grouped.column("province_id")?.i32()?;
        let means = grouped.column("mean")?.f64()?;

        let mut out = Vec::with_capacity(grouped.height());
        for i in 0..grouped.height() {
            if let (Some(id), Some(mean)) = (ids.get(i), means.get(i)) {
                out.push((id, mean));
            }
        }

        Ok(out)
    }

    /// Count/mean/min/max of the chosen indicator, ignoring NaN cells.
    /// Returns None when no usable values remain.
    pub fn indicator_summary(rows: &[VhiRow], indicator: Indicator) -> Option<IndicatorSummary> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for row in rows {
            let v = indicator.of(row);
            if v.is_nan() {
                continue;
            }
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }

        if count == 0 {
            return None;
        }

        Some(IndicatorSummary {
            count,
            mean: sum / count as f64,
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_df() -> DataFrame {
        df!(
            "Year" => [1997, 1997, 1998, 1998, 1999, 1997],
            "Week" => [1, 2, 1, 2, 1, 1],
            "SMN" => [0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
            "SMT" => [250.0, 251.0, 252.0, 253.0, 254.0, 255.0],
            "VCI" => [30.0, 40.0, 50.0, 60.0, 70.0, 20.0],
            "TCI" => [35.0, 45.0, 55.0, 65.0, 75.0, 25.0],
            "VHI" => [32.5, 42.5, 52.5, 62.5, 72.5, 22.5],
            "province_id" => [1, 1, 1, 1, 1, 2],
        )
        .unwrap()
    }

    fn selection(province: i32, years: (i32, i32), weeks: (i32, i32)) -> FilterSelection {
        FilterSelection {
            indicator: Indicator::Vci,
            province,
            week_range: weeks,
            year_range: years,
        }
    }

    #[test]
    fn test_filter_bounds_are_inclusive() {
        let df = sample_df();
        let filtered =
            DataProcessor::apply_filter(&df, &selection(1, (1997, 1998), (1, 2))).unwrap();
        assert_eq!(filtered.height(), 4);

        // Week 2 excluded, year 1999 excluded.
        let filtered =
            DataProcessor::apply_filter(&df, &selection(1, (1997, 1998), (1, 1))).unwrap();
        let rows = DataProcessor::to_rows(&filtered).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.week == 1 && r.year <= 1998));
    }

    #[test]
    fn test_filter_selects_single_province() {
        let df = sample_df();
        let filtered =
            DataProcessor::apply_filter(&df, &selection(2, (YEAR_MIN, YEAR_MAX), (1, 52))).unwrap();
        let rows = DataProcessor::to_rows(&filtered).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].province_id, 2);
        assert_eq!(rows[0].vci, 20.0);
    }

    #[test]
    fn test_sort_rows_ascending_and_descending() {
        let df = sample_df();
        let mut rows = DataProcessor::to_rows(&df).unwrap();

        DataProcessor::sort_rows(&mut rows, Indicator::Vci, true);
        let vci: Vec<f64> = rows.iter().map(|r| r.vci).collect();
        assert_eq!(vci, [20.0, 30.0, 40.0, 50.0, 60.0, 70.0]);

        DataProcessor::sort_rows(&mut rows, Indicator::Vci, false);
        let vci: Vec<f64> = rows.iter().map(|r| r.vci).collect();
        assert_eq!(vci, [70.0, 60.0, 50.0, 40.0, 30.0, 20.0]);
    }

    #[test]
    fn test_sort_rows_puts_missing_values_last() {
        let df = sample_df();
        let mut rows = DataProcessor::to_rows(&df).unwrap();
        rows[0].vci = f64::NAN;
        rows[3].vci = f64::NAN;

        DataProcessor::sort_rows(&mut rows, Indicator::Vci, true);
        let vci: Vec<f64> = rows.iter().map(|r| r.vci).collect();
        assert_eq!(&vci[..4], [20.0, 40.0, 50.0, 70.0]);
        assert!(vci[4].is_nan() && vci[5].is_nan());

        DataProcessor::sort_rows(&mut rows, Indicator::Vci, false);
        let vci: Vec<f64> = rows.iter().map(|r| r.vci).collect();
        assert_eq!(&vci[..4], [70.0, 50.0, 40.0, 20.0]);
        assert!(vci[4].is_nan() && vci[5].is_nan());
    }

    #[test]
    fn test_pivot_year_week() {
        let df = sample_df();
        let filtered =
            DataProcessor::apply_filter(&df, &selection(1, (YEAR_MIN, YEAR_MAX), (1, 52))).unwrap();
        let rows = DataProcessor::to_rows(&filtered).unwrap();
        let grid = DataProcessor::pivot_year_week(&rows, Indicator::Vci);

        assert_eq!(grid.years, [1997, 1998, 1999]);
        assert_eq!(grid.weeks, [1, 2]);
        assert_eq!(grid.value(0, 0), Some(30.0)); // 1997 week 1
        assert_eq!(grid.value(1, 1), Some(60.0)); // 1998 week 2
        assert_eq!(grid.value(2, 1), None); // 1999 week 2 missing
        assert_eq!(grid.min_max(), Some((30.0, 70.0)));
        assert!(!grid.is_empty());
    }

    #[test]
    fn test_pivot_of_nothing_is_empty() {
        let grid = DataProcessor::pivot_year_week(&[], Indicator::Vhi);
        assert!(grid.is_empty());
        assert_eq!(grid.min_max(), None);
    }

    #[test]
    fn test_province_means_sorted_ascending() {
        let df = sample_df();
        let means = DataProcessor::province_means(&df, Indicator::Vci).unwrap();

        // Province 2 mean 20.0 < province 1 mean 50.0.
        assert_eq!(means.len(), 2);
        assert_eq!(means[0].0, 2);
        assert_eq!(means[1].0, 1);
        assert!(means[0].1 < means[1].1);
    }

    #[test]
    fn test_indicator_summary() {
        let df = sample_df();
        let rows = DataProcessor::to_rows(&df).unwrap();
        let summary = DataProcessor::indicator_summary(&rows, Indicator::Vci).unwrap();

        assert_eq!(summary.count, 6);
        assert_eq!(summary.min, 20.0);
        assert_eq!(summary.max, 70.0);
        assert!((summary.mean - 45.0).abs() < 1e-9);

        assert!(DataProcessor::indicator_summary(&[], Indicator::Vci).is_none());
    }

    #[test]
    fn test_reset_defaults() {
        let sel = FilterSelection::reset(&[4, 5, 6]);
        assert_eq!(sel.indicator, Indicator::Vci);
        assert_eq!(sel.province, 4);
        assert_eq!(sel.week_range, (WEEK_MIN, WEEK_MAX));
        assert_eq!(sel.year_range, (YEAR_MIN, YEAR_MAX));
    }
}
