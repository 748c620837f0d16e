//! Purchase drafting with inline filament creation
//!
//! A draft is built up item by item before anything is sent. An item whose
//! filament is not in the catalog yet carries the new filament alongside it;
//! on submit those filaments are created first, then the purchase.

use chrono::NaiveDate;
use std::collections::HashSet;
use thiserror::Error;

use crate::core::api::{ApiError, Backend};
use crate::entities::{Filament, NewFilament, NewPurchase, NewPurchaseItem, Purchase};

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("a purchase needs at least one item")]
    NoItems,

    #[error("item {index}: {message}")]
    InvalidItem { index: usize, message: String },

    #[error("could not create filament '{name}': {source}")]
    Filament {
        name: String,
        #[source]
        source: ApiError,
    },

    #[error("could not create purchase: {0}")]
    Purchase(#[source] ApiError),
}

/// One purchase line plus, optionally, the catalog entry it needs
#[derive(Debug, Clone, PartialEq)]
pub struct DraftItem {
    pub item: NewPurchaseItem,
    pub new_filament: Option<NewFilament>,
}

impl DraftItem {
    /// A line for a filament already in the catalog
    pub fn existing(item: NewPurchaseItem) -> Self {
        Self {
            item,
            new_filament: None,
        }
    }

    /// A line whose filament gets created on submit; the filament takes the
    /// line's name
    pub fn with_new_filament(item: NewPurchaseItem, mut filament: NewFilament) -> Self {
        filament.name = item.filament_name.clone();
        Self {
            item,
            new_filament: Some(filament),
        }
    }

    fn check(&self) -> Result<(), String> {
        if self.item.filament_name.trim().is_empty() {
            return Err("filament name is required".to_string());
        }
        if self.item.spools == 0 {
            return Err("spool count must be positive".to_string());
        }
        if !(self.item.kg_per_spool > 0.0) {
            return Err(format!(
                "kg per spool must be positive, got {}",
                self.item.kg_per_spool
            ));
        }
        if self.item.unit_price < 0.0 {
            return Err(format!(
                "unit price cannot be negative, got {}",
                self.item.unit_price
            ));
        }
        if let Some(filament) = &self.new_filament {
            if filament.manufacturer.trim().is_empty() {
                return Err(format!(
                    "new filament '{}' needs a manufacturer",
                    filament.name
                ));
            }
        }
        Ok(())
    }
}

/// A purchase being assembled before submission
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseDraft {
    pub date_ordered: NaiveDate,
    pub marketplace: Option<String>,
    pub order_url: Option<String>,
    /// Falls back to the sum of the item line totals when unset
    pub subtotal: Option<f64>,
    pub tax: f64,
    pub notes: Option<String>,
    pub items: Vec<DraftItem>,
}

impl PurchaseDraft {
    pub fn new(date_ordered: NaiveDate) -> Self {
        Self {
            date_ordered,
            marketplace: None,
            order_url: None,
            subtotal: None,
            tax: 0.0,
            notes: None,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, item: DraftItem) {
        self.items.push(item);
    }

    pub fn remove(&mut self, index: usize) -> Option<DraftItem> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Σ spools × unit price over the drafted lines
    pub fn items_subtotal(&self) -> f64 {
        self.items
            .iter()
            .map(|d| d.item.spools as f64 * d.item.unit_price)
            .sum()
    }

    /// Names of the filaments this draft would add to the catalog
    pub fn pending_filaments(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.items
            .iter()
            .filter_map(|d| d.new_filament.as_ref())
            .map(|f| f.name.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    pub fn validate(&self) -> Result<(), DraftError> {
        if self.items.is_empty() {
            return Err(DraftError::NoItems);
        }
        for (index, draft) in self.items.iter().enumerate() {
            draft
                .check()
                .map_err(|message| DraftError::InvalidItem {
                    index: index + 1,
                    message,
                })?;
        }
        Ok(())
    }

    /// Split into the filaments to create and the purchase payload
    pub fn into_parts(self) -> (Vec<NewFilament>, NewPurchase) {
        let subtotal = self.subtotal.unwrap_or_else(|| self.items_subtotal());
        let mut seen = HashSet::new();
        let mut filaments = Vec::new();
        let mut items = Vec::with_capacity(self.items.len());

        for draft in self.items {
            if let Some(filament) = draft.new_filament {
                if seen.insert(filament.name.clone()) {
                    filaments.push(filament);
                }
            }
            items.push(draft.item);
        }

        let purchase = NewPurchase {
            date_ordered: self.date_ordered,
            marketplace: self.marketplace,
            order_url: self.order_url,
            subtotal,
            tax: self.tax,
            notes: self.notes,
            items,
        };
        (filaments, purchase)
    }

    /// Create pending filaments, then the purchase
    ///
    /// A filament failure stops before the purchase is sent. Filaments
    /// created up to that point stay in the catalog.
    pub fn submit<B: Backend>(self, backend: &B) -> Result<Purchase, DraftError> {
        self.validate()?;
        let (filaments, purchase) = self.into_parts();

        for filament in &filaments {
            tracing::debug!(name = %filament.name, "creating filament inline");
            backend
                .create::<Filament>(filament)
                .map_err(|source| DraftError::Filament {
                    name: filament.name.clone(),
                    source,
                })?;
        }

        backend
            .create::<Purchase>(&purchase)
            .map_err(DraftError::Purchase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::MemoryBackend;
    use crate::entities::{Material, NewVendor, Vendor};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    fn line(filament: &str, spools: u32, unit_price: f64) -> NewPurchaseItem {
        NewPurchaseItem {
            filament_name: filament.to_string(),
            seller: None,
            date_ordered: date(),
            date_received: None,
            spools,
            kg_per_spool: 1.0,
            unit_price,
            shelf: None,
            notes: None,
        }
    }

    fn backend_with_vendor() -> MemoryBackend {
        let api = MemoryBackend::new();
        api.create::<Vendor>(&NewVendor {
            name: "Elegoo".to_string(),
            notes: None,
        })
        .unwrap();
        api
    }

    #[test]
    fn test_empty_draft_is_rejected() {
        let draft = PurchaseDraft::new(date());
        assert!(matches!(draft.validate(), Err(DraftError::NoItems)));
    }

    #[test]
    fn test_invalid_item_reports_position() {
        let mut draft = PurchaseDraft::new(date());
        draft.push(DraftItem::existing(line("A", 1, 10.0)));
        draft.push(DraftItem::existing(line("B", 0, 10.0)));
        match draft.validate() {
            Err(DraftError::InvalidItem { index, .. }) => assert_eq!(index, 2),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_subtotal_defaults_to_line_totals() {
        let mut draft = PurchaseDraft::new(date());
        draft.push(DraftItem::existing(line("A", 2, 15.0)));
        draft.push(DraftItem::existing(line("B", 1, 9.5)));
        let (_, purchase) = draft.into_parts();
        assert!((purchase.subtotal - 39.5).abs() < 1e-9);
    }

    #[test]
    fn test_submit_creates_inline_filament_once() {
        let api = backend_with_vendor();
        let new = NewFilament::new("ignored", "Elegoo", Material::Petg, date());

        let mut draft = PurchaseDraft::new(date());
        draft.push(DraftItem::with_new_filament(
            line("Elegoo Rapid PETG Black", 2, 14.0),
            new.clone(),
        ));
        draft.push(DraftItem::with_new_filament(
            line("Elegoo Rapid PETG Black", 1, 14.0),
            new,
        ));
        assert_eq!(draft.pending_filaments(), vec!["Elegoo Rapid PETG Black"]);

        let purchase = draft.submit(&api).unwrap();
        assert_eq!(purchase.items.len(), 2);
        assert_eq!(api.create_calls("filaments"), 1);
        assert_eq!(api.create_calls("purchases"), 1);
    }

    #[test]
    fn test_filament_failure_stops_before_purchase() {
        let api = MemoryBackend::new();
        let mut draft = PurchaseDraft::new(date());
        draft.push(DraftItem::with_new_filament(
            line("Orphan PLA", 1, 10.0),
            NewFilament::new("Orphan PLA", "Nobody", Material::Pla, date()),
        ));
        let err = draft.submit(&api).unwrap_err();
        assert!(matches!(err, DraftError::Filament { .. }));
        assert_eq!(api.create_calls("purchases"), 0);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut draft = PurchaseDraft::new(date());
        draft.push(DraftItem::existing(line("A", 1, 1.0)));
        assert!(draft.remove(3).is_none());
        assert!(draft.remove(0).is_some());
        assert!(draft.items.is_empty());
    }
}
