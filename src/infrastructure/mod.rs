//! Infrastructure layer - External adapters and implementations
//!
//! This layer contains:
//! - Persistence: in-memory stores and the SQLite inventory ledger
//! - Config: engine configuration from file and environment
//! - State: services wired to their adapters
//! - Telemetry: tracing subscriber setup

pub mod config;
pub mod persistence;
pub mod state;
pub mod telemetry;
