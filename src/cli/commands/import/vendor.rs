//! Import vendors from CSV

use crate::core::api::Backend;
use crate::entities::{NewVendor, Vendor};

use super::common::{convert_rows, submit_all, CsvRow, ImportReport, RowError};

pub fn convert(row: &CsvRow) -> Result<NewVendor, RowError> {
    Ok(NewVendor {
        name: row.required("Name", &["name", "vendor"])?,
        notes: row.text(&["notes"]),
    })
}

pub fn import<B: Backend>(backend: &B, rows: &[CsvRow], report: &mut ImportReport) {
    let converted = convert_rows(rows, convert, |v| v.name.clone());
    submit_all::<B, Vendor>(backend, converted, report);
}
