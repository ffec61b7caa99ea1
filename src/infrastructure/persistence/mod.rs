//! Persistence adapters - in-memory stores and the SQLite inventory ledger

mod memory;
mod sqlite_ledger;

pub use memory::{
    InMemoryBossEventRepository, InMemoryInventoryLedger, InMemoryItemCatalog, InMemorySpeciesPool, SpeciesRecord,
};
pub use sqlite_ledger::SqliteInventoryLedger;
