//! Outbound ports - Interfaces that the application requires from external systems

mod boss_event_port;
mod inventory_ledger_port;
mod item_catalog_port;
mod species_pool_port;

pub use boss_event_port::BossEventRepositoryPort;
pub use inventory_ledger_port::{InventoryLedgerPort, LedgerError};
pub use item_catalog_port::{CatalogItem, ItemCatalogPort};
pub use species_pool_port::SpeciesPoolPort;
