//! Purchase and purchase item - an order and the spools it bought

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::core::api::Resource;

/// One line of a purchase, addressable on its own once stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseItem {
    pub id: i64,

    pub purchase_id: i64,

    /// Filament catalog name
    pub filament_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller: Option<String>,

    pub date_ordered: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_received: Option<NaiveDate>,

    /// Number of spools bought
    pub spools: u32,

    pub kg_per_spool: f64,

    pub unit_price: f64,

    /// Storage location code, e.g. "A1LB"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelf: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
}

impl PurchaseItem {
    /// Mass bought on this line
    pub fn total_kg(&self) -> f64 {
        self.spools as f64 * self.kg_per_spool
    }

    pub fn line_total(&self) -> f64 {
        self.spools as f64 * self.unit_price
    }
}

/// Item payload embedded in a new purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPurchaseItem {
    pub filament_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller: Option<String>,

    pub date_ordered: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_received: Option<NaiveDate>,

    pub spools: u32,

    pub kg_per_spool: f64,

    pub unit_price: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelf: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial purchase item update
#[derive(Debug, Clone, Default, Serialize)]
pub struct PurchaseItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filament_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_ordered: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_received: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spools: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kg_per_spool: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shelf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PurchaseItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.filament_name.is_none()
            && self.seller.is_none()
            && self.date_ordered.is_none()
            && self.date_received.is_none()
            && self.spools.is_none()
            && self.kg_per_spool.is_none()
            && self.unit_price.is_none()
            && self.shelf.is_none()
            && self.notes.is_none()
    }

    /// Reject quantities a stored item may never hold
    pub fn check(&self) -> Result<(), String> {
        if self.spools == Some(0) {
            return Err("Spool count must be positive".to_string());
        }
        if let Some(kg) = self.kg_per_spool {
            if !(kg.is_finite() && kg > 0.0) {
                return Err(format!("KG per spool must be positive, got {}", kg));
            }
        }
        if let Some(price) = self.unit_price {
            if !(price.is_finite() && price >= 0.0) {
                return Err(format!("Unit price cannot be negative, got {}", price));
            }
        }
        Ok(())
    }
}

impl Resource for PurchaseItem {
    const PATH: &'static str = "purchase-items";
    const LABEL: &'static str = "Purchase item";
    type Create = NewPurchaseItem;
    type Update = PurchaseItemUpdate;

    fn id(&self) -> i64 {
        self.id
    }
}

/// A purchase order as stored by the backend, items included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: i64,

    pub date_ordered: NaiveDate,

    /// Where it was bought, e.g. "Amazon"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketplace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_url: Option<String>,

    pub subtotal: f64,

    #[serde(default)]
    pub tax: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default)]
    pub items: Vec<PurchaseItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
}

impl Purchase {
    pub fn total(&self) -> f64 {
        self.subtotal + self.tax
    }

    pub fn total_spools(&self) -> u32 {
        self.items.iter().map(|i| i.spools).sum()
    }

    pub fn total_kg(&self) -> f64 {
        self.items.iter().map(PurchaseItem::total_kg).sum()
    }
}

/// Payload for creating a purchase together with its items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPurchase {
    pub date_ordered: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketplace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_url: Option<String>,

    pub subtotal: f64,

    pub tax: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub items: Vec<NewPurchaseItem>,
}

/// Partial purchase update; items are edited through `PurchaseItemUpdate`
#[derive(Debug, Clone, Default, Serialize)]
pub struct PurchaseUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_ordered: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marketplace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PurchaseUpdate {
    pub fn is_empty(&self) -> bool {
        self.date_ordered.is_none()
            && self.marketplace.is_none()
            && self.order_url.is_none()
            && self.subtotal.is_none()
            && self.tax.is_none()
            && self.notes.is_none()
    }
}

impl Resource for Purchase {
    const PATH: &'static str = "purchases";
    const LABEL: &'static str = "Purchase";
    type Create = NewPurchase;
    type Update = PurchaseUpdate;

    fn id(&self) -> i64 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(spools: u32, kg_per_spool: f64, unit_price: f64) -> PurchaseItem {
        PurchaseItem {
            id: 1,
            purchase_id: 1,
            filament_name: "eSUN PLA+ White".to_string(),
            seller: None,
            date_ordered: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            date_received: None,
            spools,
            kg_per_spool,
            unit_price,
            shelf: None,
            notes: None,
            created_at: None,
        }
    }

    #[test]
    fn test_item_totals() {
        let line = item(3, 1.0, 19.99);
        assert_eq!(line.total_kg(), 3.0);
        assert!((line.line_total() - 59.97).abs() < 1e-9);
    }

    #[test]
    fn test_purchase_totals() {
        let purchase = Purchase {
            id: 7,
            date_ordered: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            marketplace: Some("Amazon".to_string()),
            order_url: None,
            subtotal: 80.0,
            tax: 6.4,
            notes: None,
            items: vec![item(3, 1.0, 20.0), item(2, 0.5, 10.0)],
            created_at: None,
        };
        assert_eq!(purchase.total_spools(), 5);
        assert_eq!(purchase.total_kg(), 4.0);
        assert!((purchase.total() - 86.4).abs() < 1e-9);
    }

    #[test]
    fn test_item_update_check() {
        assert!(PurchaseItemUpdate::default().check().is_ok());

        let ok = PurchaseItemUpdate {
            spools: Some(2),
            kg_per_spool: Some(0.5),
            unit_price: Some(0.0),
            ..Default::default()
        };
        assert!(ok.check().is_ok());

        let zero_spools = PurchaseItemUpdate {
            spools: Some(0),
            ..Default::default()
        };
        assert!(zero_spools.check().is_err());

        let negative_kg = PurchaseItemUpdate {
            kg_per_spool: Some(-2.0),
            ..Default::default()
        };
        assert!(negative_kg.check().unwrap_err().contains("-2"));

        let negative_price = PurchaseItemUpdate {
            unit_price: Some(-1.0),
            ..Default::default()
        };
        assert!(negative_price.check().is_err());
    }

    #[test]
    fn test_purchase_without_items_field_deserializes() {
        let json = r#"{"id": 2, "date_ordered": "2024-10-20", "subtotal": 25.0}"#;
        let purchase: Purchase = serde_json::from_str(json).unwrap();
        assert!(purchase.items.is_empty());
        assert_eq!(purchase.tax, 0.0);
    }
}
