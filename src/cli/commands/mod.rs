//! CLI command implementations

pub mod completions;
pub mod config;
pub mod filament;
pub mod import;
pub mod inventory;
pub mod item;
pub mod purchase;
pub mod spool;
pub mod vendor;
