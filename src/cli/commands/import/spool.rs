//! Import spools from CSV

use chrono::NaiveDate;

use crate::core::api::Backend;
use crate::entities::{NewSpool, Spool};

use super::common::{convert_rows, submit_all, CsvRow, ImportReport, RowError};

pub fn convert(row: &CsvRow, today: NaiveDate) -> Result<NewSpool, RowError> {
    let filament_name = row.required("Filament", &["filament"])?;
    let remaining_kg = row.float_or("Remaining (kg)", &["remaining (kg)", "remaining"], 1.0)?;
    if remaining_kg < 0.0 {
        return Err(RowError::InvalidNumber {
            field: "Remaining (kg)",
            value: remaining_kg.to_string(),
        });
    }
    Ok(NewSpool {
        filament_name,
        date_opened: row.date_or("Date opened", &["date opened"], today)?,
        date_finished: row.date("Date finished", &["date finished"])?,
        shelf: row.text(&["shelf"]),
        remaining_kg,
        notes: row.text(&["notes"]),
    })
}

pub fn import<B: Backend>(
    backend: &B,
    rows: &[CsvRow],
    today: NaiveDate,
    report: &mut ImportReport,
) {
    let converted = convert_rows(
        rows,
        |row| convert(row, today),
        |s| format!("{} ({} kg)", s.filament_name, s.remaining_kg),
    );
    submit_all::<B, Spool>(backend, converted, report);
}
