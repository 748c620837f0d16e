//! spoolr: filament inventory tracking
//!
//! A command-line client for a filament inventory service: vendors, the
//! filament catalog, purchases, spools, CSV import and a derived
//! per-filament stock summary.

pub mod cli;
pub mod core;
pub mod entities;
