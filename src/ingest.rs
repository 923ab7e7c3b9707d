use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::completion::AUGMENTED_HEADERS;
use crate::dates::parse_start_date;

/// Header plus every learner row of one export, held in memory.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub header: StringRecord,
    pub rows: Vec<StringRecord>,
}

/// Start date of a row; missing or unreadable cells give `None`.
pub fn start_date(row: &StringRecord, column: usize) -> Option<NaiveDate> {
    row.get(column).and_then(parse_start_date)
}

pub fn read_dataset(path: &Path) -> anyhow::Result<Dataset> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let header = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record.with_context(|| format!("malformed CSV in {}", path.display()))?);
    }

    Ok(Dataset { header, rows })
}

/// Writes the header with the derived column names, then the given rows.
/// Rows keep their own length; short rows are not padded.
pub fn write_augmented<'a>(
    path: &Path,
    header: &StringRecord,
    rows: impl IntoIterator<Item = &'a StringRecord>,
) -> anyhow::Result<()> {
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    let mut full_header = header.clone();
    for name in AUGMENTED_HEADERS {
        full_header.push_field(name);
    }
    writer.write_record(&full_header)?;

    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Parseable start dates found in one file, without any schema check.
pub fn scan_start_dates(path: &Path, column: usize) -> anyhow::Result<Vec<NaiveDate>> {
    let dataset = read_dataset(path)?;
    Ok(dataset
        .rows
        .iter()
        .filter_map(|row| start_date(row, column))
        .collect())
}
