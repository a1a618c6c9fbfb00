use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use polars::prelude::*;

use crate::errors::LoadError;
use crate::model::{TableKind, TableReport};

const UTF8_BOM: char = '\u{feff}';

/// Column positions resolved from a header row.
pub(crate) struct HeaderIndex {
    table: TableKind,
    positions: HashMap<String, usize>,
    names: Vec<String>,
}

impl HeaderIndex {
    pub fn from_record(table: TableKind, header: &StringRecord) -> Self {
        let names: Vec<String> = header
            .iter()
            .map(|name| name.trim().trim_start_matches(UTF8_BOM).trim().to_string())
            .collect();
        let mut positions = HashMap::with_capacity(names.len());
        for (idx, name) in names.iter().enumerate() {
            positions.entry(name.clone()).or_insert(idx);
        }
        Self {
            table,
            positions,
            names,
        }
    }

    pub fn require(&self, column: &'static str) -> Result<usize, LoadError> {
        self.positions
            .get(column)
            .copied()
            .ok_or(LoadError::MissingColumn {
                table: self.table,
                column,
            })
    }

    pub fn ignored(&self, used: &[&str]) -> Vec<String> {
        self.names
            .iter()
            .filter(|name| !used.contains(&name.as_str()))
            .cloned()
            .collect()
    }
}

/// Reads the header row and hands every data record to `on_record` along with its
/// 1-based line number in the source file.
pub(crate) fn read_table<F>(
    table: TableKind,
    content: &[u8],
    mut on_record: F,
) -> Result<HeaderIndex, LoadError>
where
    F: FnMut(&HeaderIndex, &StringRecord, usize) -> Result<(), LoadError>,
{
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(content);

    let header = reader
        .headers()
        .map_err(|source| LoadError::Csv { table, source })?;
    let index = HeaderIndex::from_record(table, header);

    let mut record = StringRecord::new();
    let mut fallback_line = 1usize;
    loop {
        let more = reader
            .read_record(&mut record)
            .map_err(|source| LoadError::Csv { table, source })?;
        if !more {
            break;
        }
        fallback_line += 1;
        let line_index = record
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or(fallback_line);
        on_record(&index, &record, line_index)?;
    }

    Ok(index)
}

pub(crate) fn field<'r>(record: &'r StringRecord, position: usize) -> &'r str {
    record.get(position).unwrap_or_default().trim()
}

pub(crate) fn parse_required_str(
    table: TableKind,
    value: &str,
    line_index: usize,
    column: &str,
) -> Result<String, LoadError> {
    if value.is_empty() {
        return Err(LoadError::DataRow {
            table,
            line_index,
            message: format!("column '{column}' is empty"),
        });
    }
    Ok(value.to_string())
}

pub(crate) fn parse_optional_str(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

pub(crate) fn parse_optional_i64(
    table: TableKind,
    value: &str,
    line_index: usize,
    column: &str,
) -> Result<Option<i64>, LoadError> {
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    if let Ok(parsed) = value.parse::<i64>() {
        return Ok(Some(parsed));
    }
    // Integer columns written by float-typed exporters, e.g. "4.0".
    match value.parse::<f64>() {
        // `i64::MAX as f64` rounds up to 2^63, which is already out of range.
        Ok(parsed)
            if parsed.fract() == 0.0 && parsed >= i64::MIN as f64 && parsed < i64::MAX as f64 =>
        {
            Ok(Some(parsed as i64))
        }
        _ => Err(LoadError::DataRow {
            table,
            line_index,
            message: format!("failed to parse column '{column}' as integer: '{value}'"),
        }),
    }
}

pub(crate) fn parse_optional_f64(
    table: TableKind,
    value: &str,
    line_index: usize,
    column: &str,
) -> Result<Option<f64>, LoadError> {
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|err| LoadError::DataRow {
            table,
            line_index,
            message: format!("failed to parse column '{column}' as float: {err}"),
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimestampCell {
    Missing,
    Parsed(i64),
    Unparsed,
}

impl TimestampCell {
    pub fn millis(self) -> Option<i64> {
        match self {
            TimestampCell::Parsed(value) => Some(value),
            TimestampCell::Missing | TimestampCell::Unparsed => None,
        }
    }
}

/// Parses a timestamp cell into epoch milliseconds. Unknown formats are reported
/// as `Unparsed` and stored as null by the callers.
pub(crate) fn parse_timestamp(value: &str) -> TimestampCell {
    static FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];

    if value.is_empty() || value.eq_ignore_ascii_case("nan") || value.eq_ignore_ascii_case("nat")
    {
        return TimestampCell::Missing;
    }
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return TimestampCell::Parsed(dt.and_utc().timestamp_millis());
        }
    }
    if let Some(dt) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return TimestampCell::Parsed(dt.and_utc().timestamp_millis());
    }
    TimestampCell::Unparsed
}

/// Accumulates one timestamp column plus its unparsable-cell count.
#[derive(Debug, Default)]
pub(crate) struct TimestampColumn {
    pub values: Vec<Option<i64>>,
    pub unparsed: usize,
}

impl TimestampColumn {
    pub fn push(&mut self, value: &str) {
        let cell = parse_timestamp(value);
        if cell == TimestampCell::Unparsed {
            self.unparsed += 1;
        }
        self.values.push(cell.millis());
    }
}

pub(crate) fn string_series(name: &str, values: &[String]) -> Series {
    let refs: Vec<&str> = values.iter().map(String::as_str).collect();
    Series::new(name.into(), refs)
}

pub(crate) fn optional_string_series(name: &str, values: &[Option<String>]) -> Series {
    let refs: Vec<Option<&str>> = values.iter().map(|v| v.as_deref()).collect();
    Series::new(name.into(), refs)
}

pub(crate) fn datetime_series(
    table: TableKind,
    name: &str,
    values: Vec<Option<i64>>,
) -> Result<Series, LoadError> {
    Series::new(name.into(), values)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .map_err(|err| LoadError::Validation {
            table,
            message: format!("failed to cast column '{name}' to datetime: {err}"),
        })
}

pub(crate) fn build_dataframe(
    table: TableKind,
    columns: Vec<Column>,
) -> Result<DataFrame, LoadError> {
    DataFrame::new(columns).map_err(|err| LoadError::Validation {
        table,
        message: format!("failed to build dataframe: {err}"),
    })
}

pub(crate) fn base_report(rows: usize, header: &HeaderIndex, used: &[&str]) -> TableReport {
    TableReport {
        rows,
        unparsed_timestamps: Vec::new(),
        ignored_columns: header.ignored(used),
    }
}
