//! Core module - backend access, aggregation, and configuration

pub mod api;
pub mod cache;
pub mod config;
pub mod draft;
pub mod http;
pub mod inventory;
pub mod memory;

pub use api::{ApiError, Backend, Resource};
pub use cache::ListCache;
pub use config::Config;
pub use draft::{DraftError, DraftItem, PurchaseDraft};
pub use http::HttpBackend;
pub use inventory::{summarize, InventoryRow, InventoryTotals};
pub use memory::MemoryBackend;
