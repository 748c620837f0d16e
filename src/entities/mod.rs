//! Record types served by the inventory backend

pub mod filament;
pub mod purchase;
pub mod spool;
pub mod vendor;

pub use filament::{Filament, FilamentUpdate, Material, NewFilament};
pub use purchase::{
    NewPurchase, NewPurchaseItem, Purchase, PurchaseItem, PurchaseItemUpdate, PurchaseUpdate,
};
pub use spool::{NewSpool, Spool, SpoolState, SpoolUpdate};
pub use vendor::{NewVendor, Vendor, VendorUpdate};
