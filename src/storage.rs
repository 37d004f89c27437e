//! CSV loading and persistence for benchmark timing files.
//!
//! The loader keeps every row as raw cells next to the parsed [`Record`] so that columns the
//! corrector does not know about, and timing cells it did not change, are written back exactly
//! as they were read.

use crate::model::{Record, Report, TimingField};
use csv::StringRecord;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading or writing timing files.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("required column `{0}` not found in header")]
    MissingColumn(&'static str),

    #[error("row {row}: `{column}` value {value:?} is not a finite number")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    /// Malformed CSV, e.g. a row with a different number of cells than the header.
    #[error("could not process CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("could not serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Column positions of the three timing fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingColumns {
    pub client: usize,
    pub server: usize,
    pub total: usize,
}

impl TimingColumns {
    fn locate(headers: &StringRecord) -> Result<Self, StorageError> {
        let find = |field: TimingField| {
            let name = field.column_name();
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(StorageError::MissingColumn(name))
        };
        Ok(Self {
            client: find(TimingField::ClientTime)?,
            server: find(TimingField::ServerTime)?,
            total: find(TimingField::TotalTime)?,
        })
    }

    fn position(&self, field: TimingField) -> usize {
        match field {
            TimingField::ClientTime => self.client,
            TimingField::ServerTime => self.server,
            TimingField::TotalTime => self.total,
        }
    }
}

/// A loaded timing file: header, raw rows and the parsed records, all in file order.
#[derive(Debug, Clone)]
pub struct TimingTable {
    pub headers: StringRecord,
    pub rows: Vec<StringRecord>,
    pub columns: TimingColumns,
    pub records: Vec<Record>,
}

fn parse_cell(
    row: &StringRecord,
    index: usize,
    columns: &TimingColumns,
    field: TimingField,
) -> Result<f64, StorageError> {
    let raw = row.get(columns.position(field)).unwrap_or_default();
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(StorageError::InvalidNumber {
            row: index,
            column: field.column_name(),
            value: raw.to_string(),
        }),
    }
}

/// Read a timing table from any CSV source.
pub fn read_table<R: io::Read>(source: R) -> Result<TimingTable, StorageError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    let columns = TimingColumns::locate(&headers)?;
    tracing::trace!(?columns, "located timing columns");

    let mut rows = Vec::new();
    let mut records = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let row = result?;
        let record = Record::new(
            index,
            parse_cell(&row, index, &columns, TimingField::ClientTime)?,
            parse_cell(&row, index, &columns, TimingField::ServerTime)?,
            parse_cell(&row, index, &columns, TimingField::TotalTime)?,
        );
        rows.push(row);
        records.push(record);
    }

    Ok(TimingTable {
        headers,
        rows,
        columns,
        records,
    })
}

pub fn load_table(path: &Path) -> Result<TimingTable, StorageError> {
    let span = tracing::debug_span!("loading CSV", ?path);
    let _guard = span.enter();

    let file = std::fs::File::open(path)?;
    let table = read_table(io::BufReader::new(file))?;
    tracing::debug!("loaded {} records from CSV.", table.records.len());
    Ok(table)
}

fn format_number(value: f64) -> String {
    value.to_string()
}

/// Write `table` with the corrected timings. A timing cell is re-rendered only when its value
/// differs from the loaded one; every other cell is written as read.
pub fn write_table<W: io::Write>(
    table: &TimingTable,
    corrected: &[Record],
    sink: W,
) -> Result<(), StorageError> {
    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record(&table.headers)?;

    for ((row, before), after) in table.rows.iter().zip(&table.records).zip(corrected) {
        let mut out: Vec<String> = row.iter().map(str::to_string).collect();
        for field in [
            TimingField::ClientTime,
            TimingField::ServerTime,
            TimingField::TotalTime,
        ] {
            let value = field.get(after);
            if value.to_bits() != field.get(before).to_bits() {
                out[table.columns.position(field)] = format_number(value);
            }
        }
        writer.write_record(&out)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn save_table(
    path: &Path,
    table: &TimingTable,
    corrected: &[Record],
) -> Result<(), StorageError> {
    let file = std::fs::File::create(path)?;
    write_table(table, corrected, io::BufWriter::new(file))?;
    tracing::debug!(?path, "wrote {} records to CSV.", corrected.len());
    Ok(())
}

/// `processed_<name>` next to the input file.
pub fn processed_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("processed_{name}"))
}

pub fn export_json(path: &Path, report: &Report) -> Result<(), StorageError> {
    let body = serde_json::to_string_pretty(report)?;
    std::fs::write(path, body)?;
    Ok(())
}
