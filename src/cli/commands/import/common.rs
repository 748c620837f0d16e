//! Common utilities for CSV import

use chrono::NaiveDate;
use clap::ValueEnum;
use csv::ReaderBuilder;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::api::{ApiError, Backend, Resource};

/// Record kinds that can be imported
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportKind {
    #[value(alias = "vendors")]
    Vendor,
    #[value(alias = "filaments")]
    Filament,
    #[value(alias = "spools")]
    Spool,
    #[value(alias = "purchases")]
    Purchase,
}

impl ImportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::Vendor => "vendor",
            ImportKind::Filament => "filament",
            ImportKind::Spool => "spool",
            ImportKind::Purchase => "purchase",
        }
    }
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole-file failures; nothing is submitted when one of these occurs
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Parse(#[from] csv::Error),

    #[error("CSV has no header row")]
    NoHeader,
}

/// Per-row failures; counted, logged, and skipped
#[derive(Debug, Error)]
pub enum RowError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("invalid number in '{field}': '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("invalid date in '{field}': '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },

    #[error("{0}")]
    Submit(#[from] ApiError),
}

/// One data row: its source line plus header/value pairs
#[derive(Debug, Clone)]
pub struct CsvRow {
    pub line: usize,
    cells: Vec<(String, String)>,
}

impl CsvRow {
    pub fn new(line: usize, cells: Vec<(String, String)>) -> Self {
        Self { line, cells }
    }

    /// First alias whose column exists and is non-empty
    ///
    /// Aliases are matched case-insensitively against the trimmed header.
    pub fn get(&self, aliases: &[&str]) -> Option<&str> {
        aliases.iter().find_map(|alias| {
            self.cells
                .iter()
                .find(|(header, _)| header.eq_ignore_ascii_case(alias))
                .map(|(_, value)| value.as_str())
                .filter(|value| !value.is_empty())
        })
    }

    pub fn text(&self, aliases: &[&str]) -> Option<String> {
        self.get(aliases).map(str::to_string)
    }

    pub fn required(&self, field: &'static str, aliases: &[&str]) -> Result<String, RowError> {
        self.text(aliases).ok_or(RowError::MissingField(field))
    }

    /// Currency cell; a leading `$` is dropped and empty means zero
    pub fn money(&self, field: &'static str, aliases: &[&str]) -> Result<f64, RowError> {
        match self.get(aliases) {
            Some(raw) => parse_money(raw).ok_or_else(|| RowError::InvalidNumber {
                field,
                value: raw.to_string(),
            }),
            None => Ok(0.0),
        }
    }

    pub fn float_or(
        &self,
        field: &'static str,
        aliases: &[&str],
        default: f64,
    ) -> Result<f64, RowError> {
        match self.get(aliases) {
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| RowError::InvalidNumber {
                    field,
                    value: raw.to_string(),
                }),
            None => Ok(default),
        }
    }

    pub fn count_or(
        &self,
        field: &'static str,
        aliases: &[&str],
        default: u32,
    ) -> Result<u32, RowError> {
        match self.get(aliases) {
            Some(raw) => raw.parse::<u32>().map_err(|_| RowError::InvalidNumber {
                field,
                value: raw.to_string(),
            }),
            None => Ok(default),
        }
    }

    pub fn date(&self, field: &'static str, aliases: &[&str]) -> Result<Option<NaiveDate>, RowError> {
        self.get(aliases)
            .map(|raw| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| RowError::InvalidDate {
                    field,
                    value: raw.to_string(),
                })
            })
            .transpose()
    }

    pub fn date_or(
        &self,
        field: &'static str,
        aliases: &[&str],
        default: NaiveDate,
    ) -> Result<NaiveDate, RowError> {
        Ok(self.date(field, aliases)?.unwrap_or(default))
    }

    /// `Header=value` pairs for log lines
    pub fn describe(&self) -> String {
        self.cells
            .iter()
            .map(|(h, v)| format!("{}={}", h, v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Parse a currency amount such as "$12.50" or "12.50"
pub fn parse_money(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
    if digits.is_empty() {
        return Some(0.0);
    }
    digits.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse the whole file up front so a malformed file creates nothing
pub fn parse_rows(content: &str) -> Result<Vec<CsvRow>, ImportError> {
    let content = content.trim_start_matches('\u{feff}');
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if headers.iter().all(String::is_empty) {
        return Err(ImportError::NoHeader);
    }

    let mut lines = LineCounter::new(content);
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = match record.position() {
            Some(pos) => lines.line_at(pos.byte() as usize),
            None => lines.line + 1,
        };
        let cells = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push(CsvRow::new(line, cells));
    }
    Ok(rows)
}

/// Maps record byte offsets to 1-based physical line numbers
///
/// The csv reader's own line counter skips blank lines, so newlines are
/// counted here instead. Offsets must be passed in increasing order.
struct LineCounter<'a> {
    bytes: &'a [u8],
    scanned: usize,
    line: usize,
}

impl<'a> LineCounter<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            bytes: content.as_bytes(),
            scanned: 0,
            line: 1,
        }
    }

    /// Line on which the record at `offset` starts
    fn line_at(&mut self, offset: usize) -> usize {
        let mut start = offset.clamp(self.scanned, self.bytes.len());
        // a record never starts with a line break; skip the blank lines before it
        while start < self.bytes.len() && matches!(self.bytes[start], b'\n' | b'\r') {
            start += 1;
        }
        self.line += self.bytes[self.scanned..start]
            .iter()
            .filter(|b| **b == b'\n')
            .count();
        self.scanned = start;
        self.line
    }
}

/// Import statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportStats {
    pub rows_processed: usize,
    pub records_created: usize,
    pub errors: usize,
}

/// What happened to one submitted row or purchase group
#[derive(Debug, Clone)]
pub struct RowOutcome {
    /// Source lines that fed this record
    pub lines: Vec<usize>,
    pub label: String,
    pub result: Result<i64, String>,
}

impl RowOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// "Row 4" or "Rows 2, 3, 5"
    pub fn rows_label(&self) -> String {
        match self.lines.as_slice() {
            [one] => format!("Row {}", one),
            many => format!(
                "Rows {}",
                many.iter()
                    .map(usize::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

/// Result of a whole import run
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub kind: ImportKind,
    pub stats: ImportStats,
    pub outcomes: Vec<RowOutcome>,
}

impl ImportReport {
    pub fn new(kind: ImportKind, rows_processed: usize) -> Self {
        Self {
            kind,
            stats: ImportStats {
                rows_processed,
                ..Default::default()
            },
            outcomes: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.stats.records_created
    }

    pub fn failed(&self) -> usize {
        self.stats.errors
    }

    fn record(&mut self, outcome: RowOutcome) {
        if outcome.is_success() {
            self.stats.records_created += 1;
        } else {
            self.stats.errors += 1;
        }
        self.outcomes.push(outcome);
    }
}

/// A converted record waiting to be submitted
#[derive(Debug)]
pub struct Pending<T> {
    pub lines: Vec<usize>,
    pub label: String,
    pub payload: T,
    /// Row contents, logged if the submit fails
    pub source: String,
}

/// A row or group that could not be converted
#[derive(Debug)]
pub struct Rejected {
    pub lines: Vec<usize>,
    pub label: String,
    pub error: RowError,
    pub source: String,
}

pub type Converted<T> = Result<Pending<T>, Rejected>;

/// Submit converted records one at a time, in order
///
/// Every record is attempted independently; a failure is logged with its
/// row contents and never stops the rest.
pub fn submit_all<B, R>(backend: &B, converted: Vec<Converted<R::Create>>, report: &mut ImportReport)
where
    B: Backend,
    R: Resource,
{
    for entry in converted {
        let outcome = match entry {
            Ok(pending) => {
                let result = backend.create::<R>(&pending.payload).map(|created| created.id());
                if let Err(e) = &result {
                    tracing::warn!(
                        kind = R::LABEL,
                        lines = ?pending.lines,
                        row = %pending.source,
                        error = %e,
                        "create failed"
                    );
                }
                RowOutcome {
                    lines: pending.lines,
                    label: pending.label,
                    result: result.map_err(|e| RowError::from(e).to_string()),
                }
            }
            Err(rejected) => {
                tracing::warn!(
                    kind = R::LABEL,
                    lines = ?rejected.lines,
                    row = %rejected.source,
                    error = %rejected.error,
                    "row rejected"
                );
                RowOutcome {
                    lines: rejected.lines,
                    label: rejected.label,
                    result: Err(rejected.error.to_string()),
                }
            }
        };
        report.record(outcome);
    }
}

/// Convert each row independently with `convert`
pub fn convert_rows<T>(
    rows: &[CsvRow],
    convert: impl Fn(&CsvRow) -> Result<T, RowError>,
    label: impl Fn(&T) -> String,
) -> Vec<Converted<T>> {
    rows.iter()
        .map(|row| match convert(row) {
            Ok(payload) => Ok(Pending {
                lines: vec![row.line],
                label: label(&payload),
                payload,
                source: row.describe(),
            }),
            Err(error) => Err(Rejected {
                lines: vec![row.line],
                label: String::new(),
                error,
                source: row.describe(),
            }),
        })
        .collect()
}

/// Canonical CSV header for a kind
pub fn csv_headers(kind: ImportKind) -> Vec<&'static str> {
    match kind {
        ImportKind::Vendor => vec!["Name", "Notes"],
        ImportKind::Filament => vec![
            "Filament name",
            "Manufacturer",
            "Line",
            "Material",
            "Product",
            "Color",
            "Feature",
            "Date added",
            "URL",
            "Notes",
        ],
        ImportKind::Spool => vec![
            "Filament",
            "Date opened",
            "Date finished",
            "Remaining (kg)",
            "Shelf",
            "Notes",
        ],
        ImportKind::Purchase => vec![
            "Order",
            "Date ordered",
            "Marketplace",
            "Subtotal",
            "Tax",
            "Order notes",
            "Filament",
            "Seller",
            "Spools",
            "KG/spool",
            "Unit price",
            "Date received",
            "Shelf",
            "Notes",
        ],
    }
}

/// Example data row matching `csv_headers`
pub fn csv_example(kind: ImportKind) -> Vec<&'static str> {
    match kind {
        ImportKind::Vendor => vec!["Polymaker", "\"Good PETG, ships fast\""],
        ImportKind::Filament => vec![
            "\"Polymaker PolyLite PETG Grey\"",
            "Polymaker",
            "PolyLite",
            "PETG",
            "\"PolyLite PETG\"",
            "Grey",
            "",
            "2024-11-02",
            "https://polymaker.com",
            "",
        ],
        ImportKind::Spool => vec![
            "\"Polymaker PolyLite PETG Grey\"",
            "2024-11-20",
            "",
            "0.85",
            "A1",
            "\"printer 2\"",
        ],
        ImportKind::Purchase => vec![
            "https://www.amazon.com/gp/your-account/order-details?orderID=114-0000000",
            "2024-11-15",
            "Amazon",
            "$39.98",
            "$3.20",
            "",
            "\"Polymaker PolyLite PETG Grey\"",
            "Polymaker",
            "2",
            "1.0",
            "$19.99",
            "2024-11-18",
            "A1LB",
            "",
        ],
    }
}
