//! Import purchases from CSV
//!
//! Each row is one purchase item. Rows are grouped by their `Order` cell
//! into purchases; rows with no order all land in one shared group.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::core::api::Backend;
use crate::entities::{NewPurchase, NewPurchaseItem, Purchase};

use super::common::{submit_all, Converted, CsvRow, ImportReport, Pending, Rejected, RowError};

/// Rows sharing one `Order` value
#[derive(Debug)]
pub struct OrderGroup<'a> {
    pub key: String,
    pub rows: Vec<&'a CsvRow>,
}

fn has_filament(row: &CsvRow) -> bool {
    row.get(&["filament"]).is_some()
}

impl OrderGroup<'_> {
    fn lines(&self) -> Vec<usize> {
        self.rows.iter().map(|r| r.line).collect()
    }

    /// Lines of the rows that become purchase items
    fn item_lines(&self) -> Vec<usize> {
        self.rows
            .iter()
            .filter(|r| has_filament(r))
            .map(|r| r.line)
            .collect()
    }

    /// Rows with no filament; each one fails on its own
    fn dropped_rows(&self) -> Vec<&CsvRow> {
        self.rows
            .iter()
            .copied()
            .filter(|r| !has_filament(r))
            .collect()
    }

    fn label(&self) -> String {
        if self.key.is_empty() {
            "(no order)".to_string()
        } else {
            self.key.clone()
        }
    }

    fn describe(&self) -> String {
        self.rows
            .iter()
            .map(|r| format!("[{}]", r.describe()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Group rows by order key, keeping the order keys first appear in
pub fn group_rows(rows: &[CsvRow]) -> Vec<OrderGroup<'_>> {
    let mut groups: Vec<OrderGroup<'_>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let key = row.text(&["order"]).unwrap_or_default();
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(OrderGroup {
                key,
                rows: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].rows.push(row);
    }
    groups
}

/// Build the purchase for one group
///
/// Purchase-level cells come from the group's first row, except the
/// marketplace, which is the first non-empty one in the group. Rows without
/// a filament contribute no item; a group left with no items is rejected, as
/// is any item with a zero spool count or a non-positive mass.
pub fn convert_group(group: &OrderGroup<'_>, today: NaiveDate) -> Result<NewPurchase, RowError> {
    let Some(first) = group.rows.first() else {
        return Err(RowError::MissingField("Filament"));
    };

    let marketplace = group.rows.iter().find_map(|r| r.text(&["marketplace"]));
    let date_ordered = first.date_or("Date ordered", &["date ordered", "date"], today)?;

    let mut items = Vec::with_capacity(group.rows.len());
    for row in &group.rows {
        let Some(filament_name) = row.text(&["filament"]) else {
            continue;
        };
        let spools = row.count_or("Spools", &["spools"], 1)?;
        if spools == 0 {
            return Err(RowError::InvalidNumber {
                field: "Spools",
                value: spools.to_string(),
            });
        }
        let kg_per_spool = row.float_or("KG/spool", &["kg/spool"], 1.0)?;
        if kg_per_spool <= 0.0 {
            return Err(RowError::InvalidNumber {
                field: "KG/spool",
                value: kg_per_spool.to_string(),
            });
        }
        items.push(NewPurchaseItem {
            filament_name,
            seller: row.text(&["seller"]).or_else(|| marketplace.clone()),
            date_ordered,
            date_received: row.date("Date received", &["date received"])?,
            spools,
            kg_per_spool,
            unit_price: row.money("Unit price", &["unit price"])?,
            shelf: row.text(&["shelf"]),
            notes: row.text(&["notes"]),
        });
    }

    if items.is_empty() {
        return Err(RowError::MissingField("Filament"));
    }

    Ok(NewPurchase {
        date_ordered,
        marketplace,
        order_url: (!group.key.is_empty()).then(|| group.key.clone()),
        subtotal: first.money("Subtotal", &["subtotal"])?,
        tax: first.money("Tax", &["tax"])?,
        notes: first.text(&["order notes"]),
        items,
    })
}

pub fn import<B: Backend>(
    backend: &B,
    rows: &[CsvRow],
    today: NaiveDate,
    report: &mut ImportReport,
) {
    let mut converted: Vec<Converted<NewPurchase>> = Vec::new();
    for group in group_rows(rows) {
        match convert_group(&group, today) {
            Ok(payload) => {
                converted.push(Ok(Pending {
                    lines: group.item_lines(),
                    label: format!("{} ({} items)", group.label(), payload.items.len()),
                    payload,
                    source: group.describe(),
                }));
                converted.extend(group.dropped_rows().into_iter().map(|row| {
                    Err(Rejected {
                        lines: vec![row.line],
                        label: group.label(),
                        error: RowError::MissingField("Filament"),
                        source: row.describe(),
                    })
                }));
            }
            Err(error) => converted.push(Err(Rejected {
                lines: group.lines(),
                label: group.label(),
                error,
                source: group.describe(),
            })),
        }
    }
    submit_all::<B, Purchase>(backend, converted, report);
}
