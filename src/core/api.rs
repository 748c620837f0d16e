//! Backend seam - the REST service consumed by every command
//!
//! Each record type implements [`Resource`], which ties it to its collection
//! path and its create/update payloads. A [`Backend`] speaks the uniform
//! list/create/update/delete contract over any resource.

use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use thiserror::Error;

use crate::core::inventory::InventoryRow;
use crate::entities::spool::Spool;

/// A record type served by the backend under `/{PATH}/`
pub trait Resource: Serialize + DeserializeOwned + Clone + Debug {
    /// Collection path segment (e.g., "vendors", "purchase-items")
    const PATH: &'static str;

    /// Human readable singular name used in messages
    const LABEL: &'static str;

    /// Payload accepted by `POST /{PATH}/`
    type Create: Serialize + Debug;

    /// Partial payload accepted by `PUT /{PATH}/{id}`
    type Update: Serialize + Debug;

    /// Server-assigned identifier
    fn id(&self) -> i64;
}

/// Errors that can occur while talking to the backend
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service answered with a non-success status; `detail` is its message
    #[error("{detail} (HTTP {status})")]
    Backend { status: u16, detail: String },

    #[error("could not reach backend: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid backend URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("could not decode backend payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// The backend's own error message when it produced one
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Backend { detail, .. } => Some(detail),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Backend { status: 404, .. })
    }

    pub(crate) fn bad_request(detail: impl Into<String>) -> Self {
        ApiError::Backend {
            status: 400,
            detail: detail.into(),
        }
    }

    pub(crate) fn not_found(label: &str) -> Self {
        ApiError::Backend {
            status: 404,
            detail: format!("{} not found", label),
        }
    }
}

/// The REST surface of the filament inventory service
pub trait Backend {
    /// `GET /{PATH}/`
    fn list<R: Resource>(&self) -> Result<Vec<R>, ApiError>;

    /// `POST /{PATH}/`
    fn create<R: Resource>(&self, body: &R::Create) -> Result<R, ApiError>;

    /// `PUT /{PATH}/{id}`
    fn update<R: Resource>(&self, id: i64, body: &R::Update) -> Result<R, ApiError>;

    /// `DELETE /{PATH}/{id}`
    fn delete<R: Resource>(&self, id: i64) -> Result<(), ApiError>;

    /// `GET /spools/by-filament/{name}`
    fn spools_for_filament(&self, filament_name: &str) -> Result<Vec<Spool>, ApiError>;

    /// `GET /inventory/summary` - rows aggregated by the service itself
    fn inventory_summary(&self) -> Result<Vec<InventoryRow>, ApiError>;

    /// Fetch a single record by id from its collection
    fn get<R: Resource>(&self, id: i64) -> Result<R, ApiError> {
        self.list::<R>()?
            .into_iter()
            .find(|r| r.id() == id)
            .ok_or_else(|| ApiError::not_found(R::LABEL))
    }
}
