//! Spool - a physical, opened spool tracked until it runs out

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::core::api::Resource;

/// Lifecycle state of a spool record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpoolState {
    /// Opened and still holding filament
    Opened,
    /// Not marked finished but no mass left
    Empty,
    /// `date_finished` is set
    Finished,
}

impl std::fmt::Display for SpoolState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpoolState::Opened => write!(f, "opened"),
            SpoolState::Empty => write!(f, "empty"),
            SpoolState::Finished => write!(f, "finished"),
        }
    }
}

impl std::str::FromStr for SpoolState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "opened" | "open" => Ok(SpoolState::Opened),
            "empty" => Ok(SpoolState::Empty),
            "finished" | "done" => Ok(SpoolState::Finished),
            _ => Err(format!(
                "Invalid spool state: {}. Use opened, empty, or finished",
                s
            )),
        }
    }
}

/// An opened spool as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spool {
    pub id: i64,

    /// Filament catalog name; fixed once the spool exists
    pub filament_name: String,

    pub date_opened: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_finished: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelf: Option<String>,

    pub remaining_kg: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
}

impl Spool {
    /// Classify the spool. A finish date wins over any leftover mass.
    pub fn state(&self) -> SpoolState {
        if self.date_finished.is_some() {
            SpoolState::Finished
        } else if self.remaining_kg > 0.0 {
            SpoolState::Opened
        } else {
            SpoolState::Empty
        }
    }

    pub fn is_finished(&self) -> bool {
        self.date_finished.is_some()
    }

    /// Update recording `used_kg` of consumption; mass never drops below zero
    pub fn consume(&self, used_kg: f64) -> Result<SpoolUpdate, String> {
        if self.is_finished() {
            return Err(format!("Spool {} is already finished", self.id));
        }
        if !used_kg.is_finite() || used_kg <= 0.0 {
            return Err(format!("Usage must be a positive amount, got {}", used_kg));
        }
        Ok(SpoolUpdate {
            remaining_kg: Some((self.remaining_kg - used_kg).max(0.0)),
            ..Default::default()
        })
    }

    /// Update retiring the spool on `date`
    pub fn finish(&self, date: NaiveDate) -> Result<SpoolUpdate, String> {
        if self.is_finished() {
            return Err(format!("Spool {} is already finished", self.id));
        }
        if date < self.date_opened {
            return Err(format!(
                "Finish date {} is before the spool was opened ({})",
                date, self.date_opened
            ));
        }
        Ok(SpoolUpdate {
            date_finished: Some(date),
            ..Default::default()
        })
    }
}

/// Payload for opening a spool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSpool {
    pub filament_name: String,

    pub date_opened: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_finished: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelf: Option<String>,

    pub remaining_kg: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial spool update. The filament reference is not editable.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SpoolUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_opened: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_finished: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shelf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_kg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SpoolUpdate {
    pub fn is_empty(&self) -> bool {
        self.date_opened.is_none()
            && self.date_finished.is_none()
            && self.shelf.is_none()
            && self.remaining_kg.is_none()
            && self.notes.is_none()
    }
}

impl Resource for Spool {
    const PATH: &'static str = "spools";
    const LABEL: &'static str = "Spool";
    type Create = NewSpool;
    type Update = SpoolUpdate;

    fn id(&self) -> i64 {
        self.id
    }
}
