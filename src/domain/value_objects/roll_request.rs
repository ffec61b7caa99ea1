//! Roll requests - the fully merged input of one monster generation call

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::family::{FilterCriteria, MonsterFamily};
use crate::domain::errors::ConfigurationError;

pub const MAX_SPECIES_SLOTS: usize = 3;
pub const MAX_TYPE_SLOTS: usize = 5;

/// Forces the species slot at `position` to a family after the bag draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuaranteedSpecies {
    pub family: MonsterFamily,
    pub position: usize,
}

/// Everything the selectors need to roll one monster
///
/// Empty override lists mean "no override". An empty `include_families`
/// means every family is included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RollRequest {
    pub species_override: Vec<MonsterFamily>,
    pub type_override: Vec<String>,
    pub attribute_override: Vec<String>,
    pub force_fusion: bool,
    pub force_no_fusion: bool,
    pub min_species: usize,
    pub max_species: usize,
    pub min_type: usize,
    pub max_type: usize,
    pub filters: BTreeMap<MonsterFamily, FilterCriteria>,
    pub include_families: Vec<MonsterFamily>,
    pub exclude_families: Vec<MonsterFamily>,
    pub guaranteed_species: Option<GuaranteedSpecies>,
    pub guaranteed_types: Vec<String>,
}

impl Default for RollRequest {
    fn default() -> Self {
        Self {
            species_override: Vec::new(),
            type_override: Vec::new(),
            attribute_override: Vec::new(),
            force_fusion: false,
            force_no_fusion: false,
            min_species: 1,
            max_species: MAX_SPECIES_SLOTS,
            min_type: 1,
            max_type: MAX_TYPE_SLOTS,
            filters: BTreeMap::new(),
            include_families: Vec::new(),
            exclude_families: Vec::new(),
            guaranteed_species: None,
            guaranteed_types: Vec::new(),
        }
    }
}

impl RollRequest {
    /// Families left after applying include then exclude, in canonical order
    pub fn eligible_families(&self) -> Vec<MonsterFamily> {
        MonsterFamily::ALL
            .into_iter()
            .filter(|f| self.include_families.is_empty() || self.include_families.contains(f))
            .filter(|f| !self.exclude_families.contains(f))
            .collect()
    }

    pub fn filters_for(&self, family: MonsterFamily) -> FilterCriteria {
        self.filters.get(&family).cloned().unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.force_fusion && self.force_no_fusion {
            return Err(ConfigurationError::ConflictingFusionFlags);
        }

        if self.min_species < 1 || self.min_species > self.max_species || self.max_species > MAX_SPECIES_SLOTS {
            return Err(ConfigurationError::SpeciesRange {
                min: self.min_species,
                max: self.max_species,
            });
        }

        if self.min_type < 1 || self.min_type > self.max_type || self.max_type > MAX_TYPE_SLOTS {
            return Err(ConfigurationError::TypeRange {
                min: self.min_type,
                max: self.max_type,
            });
        }

        if self.force_fusion && self.max_species < 2 {
            return Err(ConfigurationError::FusionUnreachable { max: self.max_species });
        }

        if self.eligible_families().is_empty() {
            return Err(ConfigurationError::NoEligibleFamilies);
        }

        for (family, criteria) in &self.filters {
            criteria.validate_keys(*family)?;
        }

        Ok(())
    }
}

/// Partial roll request supplied by callers
///
/// Every field is optional; present fields replace the defaults, and
/// `filters` merge per family, key by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RollOverrides {
    pub species_override: Option<Vec<MonsterFamily>>,
    pub type_override: Option<Vec<String>>,
    pub attribute_override: Option<Vec<String>>,
    pub force_fusion: Option<bool>,
    pub force_no_fusion: Option<bool>,
    pub min_species: Option<usize>,
    pub max_species: Option<usize>,
    pub min_type: Option<usize>,
    pub max_type: Option<usize>,
    pub filters: Option<BTreeMap<MonsterFamily, FilterCriteria>>,
    pub include_families: Option<Vec<MonsterFamily>>,
    pub exclude_families: Option<Vec<MonsterFamily>>,
    pub guaranteed_species: Option<GuaranteedSpecies>,
    pub guaranteed_types: Option<Vec<String>>,
}

impl RollOverrides {
    /// Overrides that only pin filter criteria, as produced by the rarity maps
    pub fn from_filters(filters: BTreeMap<MonsterFamily, FilterCriteria>) -> Self {
        Self {
            filters: Some(filters),
            ..Default::default()
        }
    }
}
