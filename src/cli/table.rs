//! Table formatting utilities for CLI list commands
//!
//! Every list command describes its columns once and hands typed rows to a
//! `TableFormatter`, which renders TSV, CSV, Markdown, or bare ids.

use chrono::NaiveDate;
use console::style;

use crate::cli::helpers::{escape_csv, truncate_str};
use crate::cli::OutputFormat;
use crate::entities::{Material, SpoolState};

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Plain text, truncated to the column
    Text(String),
    /// Filament material family
    Material(Material),
    /// Spool lifecycle state with color coding
    State(SpoolState),
    Date(NaiveDate),
    /// Mass in kilograms
    Kg(f64),
    /// Currency amount
    Money(f64),
    Count(u32),
    /// Empty/placeholder
    Empty,
}

impl CellValue {
    /// Text when present, placeholder otherwise
    pub fn opt_text(value: Option<&str>) -> Self {
        value.map_or(CellValue::Empty, |s| CellValue::Text(s.to_string()))
    }

    pub fn opt_date(value: Option<NaiveDate>) -> Self {
        value.map_or(CellValue::Empty, CellValue::Date)
    }

    /// Format for TSV output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Text(s) => {
                let truncated = truncate_str(s, width.saturating_sub(2));
                format!("{:<width$}", truncated, width = width)
            }
            CellValue::Material(m) => format!("{:<width$}", style(m).magenta(), width = width),
            CellValue::State(state) => {
                let s = state.to_string();
                let styled = match state {
                    SpoolState::Opened => style(s).green(),
                    SpoolState::Empty => style(s).yellow(),
                    SpoolState::Finished => style(s).dim(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Date(d) => format!("{:<width$}", d.format("%Y-%m-%d"), width = width),
            CellValue::Kg(kg) => format!("{:>width$.2}", kg, width = width),
            CellValue::Money(m) => format!("{:>width$}", format!("${:.2}", m), width = width),
            CellValue::Count(n) => format!("{:>width$}", n, width = width),
            CellValue::Empty => format!("{:<width$}", "-", width = width),
        }
    }

    /// Format for CSV output (RFC 4180, no colors)
    pub fn format_csv(&self) -> String {
        match self {
            CellValue::Text(s) => escape_csv(s),
            CellValue::Empty => String::new(),
            other => other.raw(),
        }
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::Money(m) => format!("${:.2}", m),
            CellValue::Empty => "-".to_string(),
            other => other.raw(),
        };
        raw.replace('|', "\\|")
    }

    /// Get raw string value (no formatting)
    pub fn raw(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Material(m) => m.to_string(),
            CellValue::State(s) => s.to_string(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::Kg(kg) => format!("{:.2}", kg),
            CellValue::Money(m) => format!("{:.2}", m),
            CellValue::Count(n) => n.to_string(),
            CellValue::Empty => String::new(),
        }
    }

    /// Display width of the content, for dynamic column sizing
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Money(m) => format!("${:.2}", m).len(),
            CellValue::Empty => 1,
            other => other.raw().chars().count(),
        }
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
pub struct TableRow {
    pub id: i64,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Table formatter that outputs rows in various formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    entity_name: &'static str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], entity_name: &'static str) -> Self {
        Self {
            columns,
            entity_name,
            show_summary: true,
        }
    }

    /// Drop the trailing "N record(s) found" line
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.show_summary = !quiet;
        self
    }

    /// Output rows in the specified format; JSON and YAML are handled by the caller
    pub fn output(&self, rows: &[TableRow], format: OutputFormat) {
        match format {
            OutputFormat::Csv => self.output_csv(rows),
            OutputFormat::Md => self.output_md(rows),
            OutputFormat::Id => self.output_ids(rows),
            _ => self.output_tsv(rows),
        }
    }

    /// Dynamic column widths: the id column, then header or content, capped
    fn calculate_widths(&self, rows: &[TableRow]) -> Vec<usize> {
        let id_width = rows
            .iter()
            .map(|r| r.id.to_string().len())
            .max()
            .unwrap_or(2)
            .max(2);
        let mut widths = vec![id_width];

        for col in self.columns {
            let max_content = rows
                .iter()
                .filter_map(|r| r.get(col.key))
                .map(CellValue::display_width)
                .max()
                .unwrap_or(0);
            let natural = col.header.len().max(max_content.saturating_add(2));
            widths.push(natural.min(col.width));
        }
        widths
    }

    fn output_tsv(&self, rows: &[TableRow]) {
        let widths = self.calculate_widths(rows);

        let mut header_parts = vec![format!("{:<width$}", style("ID").bold().dim(), width = widths[0])];
        for (col, width) in self.columns.iter().zip(&widths[1..]) {
            header_parts.push(format!("{:<width$}", style(col.header).bold(), width = width));
        }
        println!("{}", header_parts.join(" "));

        let total_width: usize = widths.iter().sum::<usize>() + widths.len() - 1;
        println!("{}", "-".repeat(total_width));

        for row in rows {
            let mut parts = vec![format!("{:<width$}", style(row.id).cyan(), width = widths[0])];
            for (col, width) in self.columns.iter().zip(&widths[1..]) {
                match row.get(col.key) {
                    Some(value) => parts.push(value.format_tsv(*width)),
                    None => parts.push(format!("{:<width$}", "-", width = width)),
                }
            }
            println!("{}", parts.join(" "));
        }

        if self.show_summary {
            println!();
            println!("{} {}(s) found.", style(rows.len()).cyan(), self.entity_name);
        }
    }

    fn output_csv(&self, rows: &[TableRow]) {
        let mut headers = vec!["id".to_string()];
        headers.extend(self.columns.iter().map(|c| c.key.to_string()));
        println!("{}", headers.join(","));

        for row in rows {
            let mut values = vec![row.id.to_string()];
            for col in self.columns {
                values.push(row.get(col.key).map(CellValue::format_csv).unwrap_or_default());
            }
            println!("{}", values.join(","));
        }
    }

    fn output_md(&self, rows: &[TableRow]) {
        let mut headers = vec!["ID".to_string()];
        headers.extend(self.columns.iter().map(|c| c.header.to_string()));
        println!("| {} |", headers.join(" | "));

        let separators: Vec<&str> = headers.iter().map(|_| "---").collect();
        println!("|{}|", separators.join("|"));

        for row in rows {
            let mut values = vec![row.id.to_string()];
            for col in self.columns {
                values.push(
                    row.get(col.key)
                        .map(CellValue::format_md)
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
            println!("| {} |", values.join(" | "));
        }
    }

    fn output_ids(&self, rows: &[TableRow]) {
        for row in rows {
            println!("{}", row.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_text_format() {
        let cell = CellValue::Text("Hello World".to_string());
        assert!(cell.format_tsv(20).contains("Hello World"));
        assert_eq!(cell.format_csv(), "Hello World");
        assert_eq!(cell.format_md(), "Hello World");
    }

    #[test]
    fn test_cell_value_numbers() {
        assert_eq!(CellValue::Kg(1.0).format_csv(), "1.00");
        assert_eq!(CellValue::Money(19.989).format_csv(), "19.99");
        assert_eq!(CellValue::Money(5.0).format_md(), "$5.00");
        assert_eq!(CellValue::Count(3).raw(), "3");
    }

    #[test]
    fn test_cell_value_placeholders() {
        let empty = CellValue::opt_text(None);
        assert_eq!(empty.format_csv(), "");
        assert_eq!(empty.format_md(), "-");
        assert!(matches!(CellValue::opt_date(None), CellValue::Empty));
    }

    #[test]
    fn test_cell_value_md_escapes_pipes() {
        let cell = CellValue::Text("a|b|c".to_string());
        assert_eq!(cell.format_md(), "a\\|b\\|c");
    }

    #[test]
    fn test_cell_value_csv_escapes() {
        let cell = CellValue::Text("Prusament PETG, Galaxy Black".to_string());
        assert_eq!(cell.format_csv(), "\"Prusament PETG, Galaxy Black\"");
    }

    #[test]
    fn test_table_row_builder() {
        let row = TableRow::new(12)
            .cell("name", CellValue::Text("eSUN".to_string()))
            .cell("state", CellValue::State(SpoolState::Opened));
        assert_eq!(row.id, 12);
        assert!(row.get("name").is_some());
        assert!(row.get("missing").is_none());
    }

    #[test]
    fn test_widths_are_capped() {
        const COLUMNS: &[ColumnDef] = &[ColumnDef::new("name", "NAME", 10)];
        let rows = vec![TableRow::new(1).cell(
            "name",
            CellValue::Text("A very long filament name indeed".to_string()),
        )];
        let formatter = TableFormatter::new(COLUMNS, "filament");
        assert_eq!(formatter.calculate_widths(&rows), vec![2, 10]);
    }
}
