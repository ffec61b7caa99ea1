//! Domain layer - Core generation rules with no I/O
//!
//! This layer contains:
//! - Entities: MonsterDescriptor, Reward, BossEvent
//! - Value Objects: Rarity, MonsterFamily, RollRequest, EngineTables
//! - Domain Services: the selectors and the options resolver
//! - Errors: configuration failures shared by every layer

pub mod entities;
pub mod errors;
pub mod services;
pub mod value_objects;
