//! Vendor - a filament manufacturer or reseller

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::core::api::Resource;

/// A vendor as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: i64,

    /// Display name, referenced by `Filament::manufacturer`
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
}

/// Payload for creating a vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVendor {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial vendor update; unset fields are left untouched
#[derive(Debug, Clone, Default, Serialize)]
pub struct VendorUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl VendorUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.notes.is_none()
    }
}

impl Resource for Vendor {
    const PATH: &'static str = "vendors";
    const LABEL: &'static str = "Vendor";
    type Create = NewVendor;
    type Update = VendorUpdate;

    fn id(&self) -> i64 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_deserializes_service_payload() {
        let json = r#"{"id": 3, "name": "Polymaker", "notes": null, "created_at": "2024-11-15T09:30:12.123456"}"#;
        let vendor: Vendor = serde_json::from_str(json).unwrap();
        assert_eq!(vendor.id, 3);
        assert_eq!(vendor.name, "Polymaker");
        assert!(vendor.notes.is_none());
        assert!(vendor.created_at.is_some());
    }

    #[test]
    fn test_update_skips_unset_fields() {
        let update = VendorUpdate {
            notes: Some("Ships fast".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"notes": "Ships fast"}));
        assert!(!update.is_empty());
        assert!(VendorUpdate::default().is_empty());
    }
}
