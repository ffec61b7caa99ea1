//! Application layer - Use cases and port definitions
//!
//! Services orchestrate the domain rules and talk to storage only through
//! the outbound ports.

pub mod dto;
pub mod ports;
pub mod services;
