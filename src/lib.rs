//! Menagerie Engine - Monster generation and reward backend
//!
//! The engine:
//! - Rolls monsters from species, type and attribute pools under caller constraints
//! - Rolls weighted rewards (currency, items, levels, monsters)
//! - Runs cooperative boss battles and splits rewards by damage contribution
//! - Credits rewards through an idempotent inventory ledger

pub mod application;
pub mod domain;
pub mod infrastructure;
