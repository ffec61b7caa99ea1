//! Value objects - Immutable objects defined by their attributes

mod engine_tables;
mod family;
mod ids;
mod rarity;
mod roll_request;
mod special_items;

pub use engine_tables::{
    ActivityRewardRules, ContributionRules, ContributionTier, EngineTables, GameCornerRules,
    GardenRules, RewardFallbacks, DEFAULT_BOSS_TYPE,
};
pub use family::{FilterCriteria, MonsterFamily};
pub use ids::*;
pub use rarity::{Rarity, RarityTable};
pub use roll_request::{GuaranteedSpecies, RollOverrides, RollRequest, MAX_SPECIES_SLOTS, MAX_TYPE_SLOTS};
pub use special_items::{ItemTrigger, RollPatch, SpecialItemRule, CAPTURE_PLACEHOLDER};
