//! VHI CSV Loader Module
//! Builds one combined DataFrame from a directory of per-province CSV exports.
//!
//! Each export carries a single header line, eight positional columns (the
//! last one is padding) and a trailing footer line. Cells may contain
//! `<...>` markup left over from the upstream HTML export.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use polars::prelude::*;
use rayon::prelude::*;
use thiserror::Error;

/// Positional column names of the raw exports. `empty` is padding caused by
/// the trailing comma on every data line and is dropped after parsing.
pub const VHI_COLUMNS: [&str; 8] = ["Year", "Week", "SMN", "SMT", "VCI", "TCI", "VHI", "empty"];

/// Sentinel used by the upstream export for missing VHI values.
const VHI_MISSING: f64 = -1.0;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("No usable CSV files in {0}")]
    NoData(PathBuf),
}

/// Holds the combined DataFrame and the directory it came from.
pub struct VhiLoader {
    df: Option<DataFrame>,
    data_dir: Option<PathBuf>,
}

impl Default for VhiLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl VhiLoader {
    pub fn new() -> Self {
        Self {
            df: None,
            data_dir: None,
        }
    }

    /// Get a reference to the combined DataFrame.
    pub fn get_dataframe(&self) -> Option<&DataFrame> {
        self.df.as_ref()
    }

    /// Set the DataFrame directly (used for async loading).
    pub fn set_dataframe(&mut self, df: DataFrame) {
        self.df = Some(df);
    }

    pub fn set_data_dir(&mut self, dir: PathBuf) {
        self.data_dir = Some(dir);
    }

    pub fn data_dir(&self) -> Option<&PathBuf> {
        self.data_dir.as_ref()
    }

    /// Sorted unique province ids present in the combined table.
    pub fn provinces(&self) -> Vec<i32> {
        let Some(df) = &self.df else {
            return Vec::new();
        };

        df.column("province_id")
            .ok()
            .and_then(|col| col.unique().ok())
            .and_then(|unique| {
                unique
                    .i32()
                    .ok()
                    .map(|ca| ca.into_no_null_iter().collect::<Vec<i32>>())
            })
            .map(|mut ids| {
                ids.sort_unstable();
                ids
            })
            .unwrap_or_default()
    }
}

/// Province id is the third underscore-delimited token of the file name,
/// e.g. `vhi_id_22_2025.csv` -> 22. The token must be numeric as-is, so a
/// name like `vhi_id_7.csv` (token `7.csv`) carries no id.
pub fn parse_province_id(file_name: &str) -> Option<i32> {
    file_name.split('_').nth(2)?.parse().ok()
}

/// Remove `<...>` markup and whitespace padding from a data line.
/// All real fields are numeric, so whitespace is never significant.
fn scrub_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_tag = false;
    for ch in line.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if in_tag || c.is_whitespace() => {}
            c => out.push(c),
        }
    }
    out
}

/// Drop the header line and the trailing footer line, then scrub what remains.
fn scrub_body(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().collect();
    if lines.len() < 3 {
        return String::new();
    }

    lines[1..lines.len() - 1]
        .iter()
        .map(|line| scrub_line(line))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn raw_schema() -> Schema {
    let dtypes = [
        DataType::Int32,
        DataType::Int32,
        DataType::Float64,
        DataType::Float64,
        DataType::Float64,
        DataType::Float64,
        DataType::Float64,
        DataType::String,
    ];

    Schema::from_iter(
        VHI_COLUMNS
            .iter()
            .zip(dtypes)
            .map(|(name, dtype)| Field::new((*name).into(), dtype)),
    )
}

/// Parse the raw text of one per-province export into a typed DataFrame.
///
/// Output columns: Year, Week, SMN, SMT, VCI, TCI, VHI, province_id.
/// Rows carrying the VHI missing-data sentinel are removed here.
pub fn parse_vhi_csv(raw: &str, province_id: i32) -> Result<DataFrame, LoaderError> {
    let body = scrub_body(raw);

    let df = CsvReadOptions::default()
        .with_has_header(false)
        .with_ignore_errors(true)
        .with_raise_if_empty(false)
        .with_schema(Some(Arc::new(raw_schema())))
        .map_parse_options(|po| po.with_truncate_ragged_lines(true).with_missing_is_null(true))
        .into_reader_with_file_handle(Cursor::new(body.into_bytes()))
        .finish()?;

    let df = df.drop("empty")?;

    let df = df
        .lazy()
        .filter(col("VHI").is_null().or(col("VHI").neq(lit(VHI_MISSING))))
        .with_column(lit(province_id).alias("province_id"))
        .collect()?;

    Ok(df)
}

/// Concatenate per-file frames and sort by (province_id, Year, Week).
pub fn combine_frames(frames: Vec<DataFrame>) -> Result<DataFrame, LoaderError> {
    let lazy: Vec<LazyFrame> = frames.into_iter().map(|df| df.lazy()).collect();

    let df = concat(lazy, UnionArgs::default())?
        .sort(
            ["province_id", "Year", "Week"],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;

    Ok(df)
}

/// Load every parseable `*.csv` in `dir` into the combined table.
///
/// Files whose names carry no numeric province segment are skipped with a
/// warning; unreadable or unparseable files are skipped with an error log.
pub fn load_directory(dir: &Path) -> Result<DataFrame, LoaderError> {
    let entries = std::fs::read_dir(dir).map_err(|source| LoaderError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut csv_files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false)
        })
        .collect();
    csv_files.sort();

    let frames: Vec<DataFrame> = csv_files
        .par_iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?;

            let Some(province_id) = parse_province_id(name) else {
                log::warn!("Skipping {name}: no numeric province id in file name");
                return None;
            };

            let raw = match std::fs::read_to_string(path) {
                Ok(raw) => raw,
                Err(e) => {
                    log::error!("Skipping {name}: {e}");
                    return None;
                }
            };

            match parse_vhi_csv(&raw, province_id) {
                Ok(df) if df.height() > 0 => Some(df),
                Ok(_) => {
                    log::warn!("Skipping {name}: no data rows after cleaning");
                    None
                }
                Err(e) => {
                    log::error!("Skipping {name}: {e}");
                    None
                }
            }
        })
        .collect();

    if frames.is_empty() {
        return Err(LoaderError::NoData(dir.to_path_buf()));
    }

    combine_frames(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
year,week,SMN,SMT,VCI,TCI,VHI<br>
<tt><pre>1997, 1, 0.051, 258.24, 51.11, 48.78, 49.95,
1997, 2, 0.055, 261.50, 52.00, 40.00, -1.00,
1997, 3, 0.060, 263.10, 55.30, 45.20, 50.25,
</pre></tt>";

    #[test]
    fn test_parse_province_id() {
        assert_eq!(parse_province_id("vhi_id_10_2025.csv"), Some(10));
        assert_eq!(parse_province_id("vhi_id_xx_2025.csv"), None);
        assert_eq!(parse_province_id("data.csv"), None);
        assert_eq!(parse_province_id("a_b.csv"), None);
    }

    #[test]
    fn test_province_token_must_be_numeric_as_is() {
        // `7.csv` is the third token here, not `7`.
        assert_eq!(parse_province_id("vhi_id_7.csv"), None);
        assert_eq!(parse_province_id("vhi_id_7x_2025.csv"), None);
    }

    #[test]
    fn test_scrub_line_strips_markup_and_padding() {
        assert_eq!(scrub_line("<tt><pre>1997,  1, 0.05"), "1997,1,0.05");
        assert_eq!(scrub_line("</pre></tt>"), "");
        assert_eq!(scrub_line("  1997, 2 "), "1997,2");
    }

    #[test]
    fn test_parse_drops_sentinel_rows() {
        let df = parse_vhi_csv(SAMPLE, 5).unwrap();

        // The VHI == -1 row is gone.
        assert_eq!(df.height(), 2);
        let vhi = df.column("VHI").unwrap().f64().unwrap();
        assert!(vhi.into_no_null_iter().all(|v| v != -1.0));
    }

    #[test]
    fn test_parse_schema_and_province_column() {
        let df = parse_vhi_csv(SAMPLE, 5).unwrap();

        let names: Vec<&str> = df.get_column_names().iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            ["Year", "Week", "SMN", "SMT", "VCI", "TCI", "VHI", "province_id"]
        );

        let province = df.column("province_id").unwrap().i32().unwrap();
        assert!(province.into_no_null_iter().all(|p| p == 5));
    }

    #[test]
    fn test_header_and_trailing_line_discarded() {
        // No markup footer here: the last line is still treated as metadata
        // and discarded, and the first line is skipped as the header.
        let raw = "year,week,...\n\
                   2000,1,0.1,250.0,40.0,40.0,40.0,\n\
                   2000,2,0.1,250.0,41.0,41.0,41.0,\n\
                   2000,3,0.1,250.0,42.0,42.0,42.0,";
        let df = parse_vhi_csv(raw, 1).unwrap();

        assert_eq!(df.height(), 2);
        let weeks: Vec<i32> = df
            .column("Week")
            .unwrap()
            .i32()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(weeks, [1, 2]);
    }

    #[test]
    fn test_tiny_file_yields_no_rows() {
        let df = parse_vhi_csv("header\nfooter", 1).unwrap();
        assert_eq!(df.height(), 0);
    }

    #[test]
    fn test_load_directory_skips_files_without_province_id() {
        let dir = tempfile::tempdir().unwrap();
        let good = "h\n2001,1,0.1,250.0,40.0,40.0,40.0,\n2001,2,0.1,250.0,41.0,41.0,41.0,\nf";
        let stray = "h\n2001,1,0.1,250.0,40.0,40.0,40.0,\nf";
        std::fs::write(dir.path().join("vhi_id_3_2025.csv"), good).unwrap();
        std::fs::write(dir.path().join("notes.csv"), stray).unwrap();

        let df = load_directory(dir.path()).unwrap();

        let provinces: Vec<i32> = df
            .column("province_id")
            .unwrap()
            .i32()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(provinces, [3, 3]);
    }

    #[test]
    fn test_load_directory_without_usable_files_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.csv"), "h\nf").unwrap();

        assert!(matches!(
            load_directory(dir.path()),
            Err(LoaderError::NoData(_))
        ));
    }

    #[test]
    fn test_combine_sorts_by_province_year_week() {
        let a = "h\n1998,2,0.1,250.0,40.0,40.0,40.0,\n1997,1,0.1,250.0,40.0,40.0,40.0,\nf";
        let b = "h\n1997,2,0.1,250.0,40.0,40.0,40.0,\n1997,1,0.1,250.0,40.0,40.0,40.0,\nf";

        let df_a = parse_vhi_csv(a, 2).unwrap();
        let df_b = parse_vhi_csv(b, 1).unwrap();
        let combined = combine_frames(vec![df_a, df_b]).unwrap();

        let provinces: Vec<i32> = combined
            .column("province_id")
            .unwrap()
            .i32()
            .unwrap()
            .into_no_null_iter()
            .collect();
        let years: Vec<i32> = combined
            .column("Year")
            .unwrap()
            .i32()
            .unwrap()
            .into_no_null_iter()
            .collect();
        let weeks: Vec<i32> = combined
            .column("Week")
            .unwrap()
            .i32()
            .unwrap()
            .into_no_null_iter()
            .collect();

        assert_eq!(provinces, [1, 1, 2, 2]);
        assert_eq!(years, [1997, 1997, 1997, 1998]);
        assert_eq!(weeks, [1, 2, 1, 2]);
    }
}
