//! Configuration errors
//!
//! Raised when a roll request or an engine table is malformed. These are
//! surfaced to the caller as-is and never retried.

use crate::domain::value_objects::MonsterFamily;

/// A request or table that can never produce a valid roll
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Rarity weights must sum to 100, got {total}")]
    RarityWeightsSum { total: f64 },

    #[error("Rarity weight for {rarity} is invalid: {weight}")]
    InvalidRarityWeight { rarity: String, weight: f64 },

    #[error("No eligible monster families after include/exclude filters")]
    NoEligibleFamilies,

    #[error("force_fusion and force_no_fusion cannot both be set")]
    ConflictingFusionFlags,

    #[error("Species range {min}..={max} is outside 1..=3")]
    SpeciesRange { min: usize, max: usize },

    #[error("Type range {min}..={max} is outside 1..=5")]
    TypeRange { min: usize, max: usize },

    #[error("force_fusion needs max_species >= 2, got {max}")]
    FusionUnreachable { max: usize },

    #[error("Type domain has {available} labels but up to {requested} may be drawn")]
    TypeDomainTooSmall { requested: usize, available: usize },

    #[error("{0} domain is empty")]
    EmptyDomain(&'static str),

    #[error("{domain} domain lists '{label}' more than once")]
    DuplicateDomainLabel { domain: &'static str, label: String },

    #[error("Unknown override field: {0}")]
    UnknownOverrideField(String),

    #[error("Unknown filter key '{key}' for {family}")]
    UnknownFilterKey { family: MonsterFamily, key: String },

    #[error("Invalid overrides: {0}")]
    InvalidOverrides(String),

    #[error("Fallback reward is invalid: {0}")]
    InvalidFallback(&'static str),
}
