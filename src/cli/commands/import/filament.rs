//! Import filaments from CSV

use chrono::NaiveDate;

use crate::core::api::Backend;
use crate::entities::{Filament, Material, NewFilament};

use super::common::{convert_rows, submit_all, CsvRow, ImportReport, RowError};

pub fn convert(row: &CsvRow, today: NaiveDate) -> Result<NewFilament, RowError> {
    let name = row.required("Filament name", &["filament name", "name"])?;
    Ok(NewFilament {
        name,
        manufacturer: row.text(&["manufacturer"]).unwrap_or_default(),
        line: row.text(&["line"]),
        material: row
            .text(&["material"])
            .map(Material::from)
            .unwrap_or_default(),
        product: row.text(&["product"]),
        color: row.text(&["color", "colour"]),
        feature: row.text(&["feature"]),
        url: row.text(&["url"]),
        notes: row.text(&["notes"]),
        date_added: row.date_or("Date added", &["date added"], today)?,
    })
}

pub fn import<B: Backend>(
    backend: &B,
    rows: &[CsvRow],
    today: NaiveDate,
    report: &mut ImportReport,
) {
    let converted = convert_rows(rows, |row| convert(row, today), |f| f.name.clone());
    submit_all::<B, Filament>(backend, converted, report);
}
