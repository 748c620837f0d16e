//! Filament - a catalog entry (material, color, manufacturer), not a physical spool

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::core::api::Resource;

/// Filament material family
///
/// The backend stores free text, so unrecognised values read back as `Other`
/// instead of failing the whole list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Material {
    #[default]
    Pla,
    Petg,
    Abs,
    Tpu,
    Nylon,
    Asa,
    Other,
}

impl Material {
    pub const ALL: [Material; 7] = [
        Material::Pla,
        Material::Petg,
        Material::Abs,
        Material::Tpu,
        Material::Nylon,
        Material::Asa,
        Material::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Material::Pla => "PLA",
            Material::Petg => "PETG",
            Material::Abs => "ABS",
            Material::Tpu => "TPU",
            Material::Nylon => "Nylon",
            Material::Asa => "ASA",
            Material::Other => "Other",
        }
    }
}

impl std::fmt::Display for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Material {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pla" => Ok(Material::Pla),
            "petg" => Ok(Material::Petg),
            "abs" => Ok(Material::Abs),
            "tpu" => Ok(Material::Tpu),
            "nylon" | "pa" => Ok(Material::Nylon),
            "asa" => Ok(Material::Asa),
            "other" => Ok(Material::Other),
            _ => Err(format!(
                "Invalid material: {}. Use PLA, PETG, ABS, TPU, Nylon, ASA, or Other",
                s
            )),
        }
    }
}

impl From<String> for Material {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(Material::Other)
    }
}

impl From<Material> for String {
    fn from(m: Material) -> Self {
        m.as_str().to_string()
    }
}

/// A filament catalog entry as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filament {
    pub id: i64,

    /// Unique descriptive name, referenced by purchase items and spools
    pub name: String,

    /// Vendor name
    pub manufacturer: String,

    /// Product line, e.g. "PolyLite"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,

    #[serde(default)]
    pub material: Material,

    /// Product name, e.g. "Matte Black"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Finish or special property, e.g. "Silk"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub date_added: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
}

/// Payload for creating a filament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFilament {
    pub name: String,
    pub manufacturer: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,

    pub material: Material,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub date_added: NaiveDate,
}

impl NewFilament {
    /// A minimal entry with every optional field unset
    pub fn new(
        name: impl Into<String>,
        manufacturer: impl Into<String>,
        material: Material,
        date_added: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            manufacturer: manufacturer.into(),
            line: None,
            material,
            product: None,
            color: None,
            feature: None,
            url: None,
            notes: None,
            date_added,
        }
    }
}

/// Partial filament update
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilamentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<Material>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_added: Option<NaiveDate>,
}

impl FilamentUpdate {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.manufacturer.is_none()
            && self.line.is_none()
            && self.material.is_none()
            && self.product.is_none()
            && self.color.is_none()
            && self.feature.is_none()
            && self.url.is_none()
            && self.notes.is_none()
            && self.date_added.is_none()
    }
}

impl Resource for Filament {
    const PATH: &'static str = "filaments";
    const LABEL: &'static str = "Filament";
    type Create = NewFilament;
    type Update = FilamentUpdate;

    fn id(&self) -> i64 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_parsing() {
        assert_eq!("pla".parse::<Material>().unwrap(), Material::Pla);
        assert_eq!("PETG".parse::<Material>().unwrap(), Material::Petg);
        assert_eq!("Nylon".parse::<Material>().unwrap(), Material::Nylon);
        assert!("wood".parse::<Material>().is_err());
    }

    #[test]
    fn test_material_serializes_canonical_names() {
        let json = serde_json::to_string(&Material::Petg).unwrap();
        assert_eq!(json, "\"PETG\"");
        let json = serde_json::to_string(&Material::Nylon).unwrap();
        assert_eq!(json, "\"Nylon\"");
    }

    #[test]
    fn test_unknown_material_reads_back_as_other() {
        let json = r#"{
            "id": 1, "name": "Silk Gold", "manufacturer": "eSUN",
            "material": "PLA+", "date_added": "2024-12-01"
        }"#;
        let filament: Filament = serde_json::from_str(json).unwrap();
        assert_eq!(filament.material, Material::Other);
        assert!(filament.color.is_none());
    }

    #[test]
    fn test_default_material_is_pla() {
        assert_eq!(Material::default(), Material::Pla);
    }
}
