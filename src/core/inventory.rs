//! Derived inventory summary
//!
//! Masses and spool counts are recomputed from the source lists on every
//! call; nothing here is stored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::entities::{Filament, Material, PurchaseItem, Spool, SpoolState};

/// One line of the inventory summary, one per catalog filament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRow {
    pub filament_name: String,

    pub manufacturer: String,

    pub material: Material,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Σ spools × kg_per_spool over every purchase line for this filament
    pub total_purchased_kg: f64,

    /// Σ remaining_kg over every spool record for this filament
    pub total_remaining_kg: f64,

    /// Bought but never opened; never negative
    pub unopened_spools: u32,

    pub opened_spools: u32,

    pub finished_spools: u32,

    /// Not finished, but nothing left on it
    #[serde(default)]
    pub empty_spools: u32,

    /// Consumed mass as the service reports it; local aggregation leaves it unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_opened_kg: Option<f64>,
}

#[derive(Default)]
struct Tally {
    purchased_kg: f64,
    purchased_spools: u32,
    remaining_kg: f64,
    records: u32,
    opened: u32,
    empty: u32,
    finished: u32,
}

/// Aggregate the three lists into one row per filament, in filament order
///
/// Items and spools that name a filament missing from `filaments` are
/// ignored; they have no row to land in.
pub fn summarize(
    filaments: &[Filament],
    items: &[PurchaseItem],
    spools: &[Spool],
) -> Vec<InventoryRow> {
    let mut tallies: HashMap<&str, Tally> = filaments
        .iter()
        .map(|f| (f.name.as_str(), Tally::default()))
        .collect();

    for item in items {
        if let Some(t) = tallies.get_mut(item.filament_name.as_str()) {
            t.purchased_kg += item.total_kg();
            t.purchased_spools += item.spools;
        }
    }

    for spool in spools {
        if let Some(t) = tallies.get_mut(spool.filament_name.as_str()) {
            t.remaining_kg += spool.remaining_kg;
            t.records += 1;
            match spool.state() {
                SpoolState::Opened => t.opened += 1,
                SpoolState::Empty => t.empty += 1,
                SpoolState::Finished => t.finished += 1,
            }
        }
    }

    filaments
        .iter()
        .map(|f| {
            let t = &tallies[f.name.as_str()];
            InventoryRow {
                filament_name: f.name.clone(),
                manufacturer: f.manufacturer.clone(),
                material: f.material,
                color: f.color.clone(),
                total_purchased_kg: t.purchased_kg,
                total_remaining_kg: t.remaining_kg,
                unopened_spools: t.purchased_spools.saturating_sub(t.records),
                opened_spools: t.opened,
                finished_spools: t.finished,
                empty_spools: t.empty,
                total_opened_kg: None,
            }
        })
        .collect()
}

/// Grand totals across a set of summary rows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventoryTotals {
    pub filaments: usize,
    pub purchased_kg: f64,
    pub remaining_kg: f64,
    pub unopened_spools: u32,
    pub opened_spools: u32,
    pub finished_spools: u32,
    pub empty_spools: u32,
}

impl InventoryTotals {
    pub fn from_rows(rows: &[InventoryRow]) -> Self {
        rows.iter().fold(InventoryTotals::default(), |mut acc, row| {
            acc.filaments += 1;
            acc.purchased_kg += row.total_purchased_kg;
            acc.remaining_kg += row.total_remaining_kg;
            acc.unopened_spools += row.unopened_spools;
            acc.opened_spools += row.opened_spools;
            acc.finished_spools += row.finished_spools;
            acc.empty_spools += row.empty_spools;
            acc
        })
    }

    /// Spools physically on hand (unopened plus opened)
    pub fn active_spools(&self) -> u32 {
        self.unopened_spools + self.opened_spools
    }
}
