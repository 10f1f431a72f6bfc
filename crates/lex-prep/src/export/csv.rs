use crate::error::{PrepError, Result, ResultExt};
use crate::utils::MISSING_MARKERS;
use polars::prelude::*;
use std::fs::{self, File};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

fn read_options() -> CsvReadOptions {
    let null_values = MISSING_MARKERS
        .iter()
        .map(|m| PlSmallStr::from(*m))
        .collect();

    CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(
            CsvParseOptions::default()
                .with_quote_char(Some(b'"'))
                .with_null_values(Some(NullValues::AllColumns(null_values))),
        )
}

/// Load a CSV file with a header row.
///
/// Common missing-value markers (`NA`, `null`, empty cells...) are read as
/// nulls.
pub fn load_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    let df = read_options()
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .context(format!("Failed to parse CSV file {}", path.display()))?;

    info!("Loaded {}: {} rows x {} columns", path.display(), df.height(), df.width());
    Ok(df)
}

/// Load CSV content already held in memory, e.g. an uploaded file.
pub fn load_csv_bytes(bytes: &[u8]) -> Result<DataFrame> {
    let df = read_options()
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()
        .context("Failed to parse CSV content")?;

    debug!("Parsed CSV content: {} rows x {} columns", df.height(), df.width());
    Ok(df)
}

fn write_to<W: std::io::Write>(writer: W, df: &DataFrame) -> Result<()> {
    let mut df = df.clone();
    CsvWriter::new(writer)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(&mut df)?;
    Ok(())
}

/// Write a DataFrame as UTF-8 CSV with a header row, creating parent
/// directories as needed.
pub fn write_csv(df: &DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    write_to(&mut file, df).context(format!("Failed to write {}", path.display()))?;

    info!("Dataset saved: {}", path.display());
    Ok(())
}

/// Render a DataFrame as CSV text.
pub fn to_csv_string(df: &DataFrame) -> Result<String> {
    let mut buffer = Vec::new();
    write_to(&mut buffer, df)?;
    String::from_utf8(buffer)
        .map_err(|e| PrepError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}
