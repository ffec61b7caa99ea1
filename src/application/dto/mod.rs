//! Data Transfer Objects - Results handed back across the service boundary

pub mod boss;

pub use boss::*;
