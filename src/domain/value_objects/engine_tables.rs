//! Engine tables - the immutable configuration every roll reads
//!
//! All static data (type domain, rarity weights, rarity criteria, special
//! items, contribution and activity thresholds) lives here so that tests and
//! differently configured engines can each bring their own tables.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::family::{FilterCriteria, MonsterFamily};
use super::rarity::{Rarity, RarityTable};
use super::roll_request::RollRequest;
use super::special_items::SpecialItemRule;
use crate::domain::errors::ConfigurationError;

pub const DEFAULT_BOSS_TYPE: &str = "normal";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineTables {
    pub type_domain: Vec<String>,
    pub attribute_domain: Vec<String>,
    pub rarity_weights: RarityTable,
    /// Upper bound of the uniform item quantity draw per rarity
    pub item_quantity_max: BTreeMap<Rarity, u32>,
    /// Filter criteria each family is pinned to for a monster of a given rarity
    pub rarity_criteria: BTreeMap<Rarity, BTreeMap<MonsterFamily, FilterCriteria>>,
    pub default_request: RollRequest,
    pub special_items: Vec<SpecialItemRule>,
    /// Boss type to the type labels its monster rewards are drawn from
    pub boss_reward_types: BTreeMap<String, Vec<String>>,
    pub contribution: ContributionRules,
    pub activity: ActivityRewardRules,
    pub fallbacks: RewardFallbacks,
}

impl Default for EngineTables {
    fn default() -> Self {
        Self {
            type_domain: labels(&[
                "Normal", "Fire", "Water", "Electric", "Grass", "Ice", "Fighting", "Poison", "Ground",
                "Flying", "Psychic", "Bug", "Rock", "Ghost", "Dragon", "Dark", "Steel", "Fairy",
            ]),
            attribute_domain: labels(&["Vaccine", "Variable", "Virus", "Data", "Free"]),
            rarity_weights: RarityTable::default(),
            item_quantity_max: BTreeMap::from([
                (Rarity::Legendary, 2),
                (Rarity::Epic, 3),
                (Rarity::Rare, 4),
                (Rarity::Uncommon, 5),
                (Rarity::Common, 6),
            ]),
            rarity_criteria: default_rarity_criteria(),
            default_request: default_roll_request(),
            special_items: SpecialItemRule::default_table(),
            boss_reward_types: default_boss_reward_types(),
            contribution: ContributionRules::default(),
            activity: ActivityRewardRules::default(),
            fallbacks: RewardFallbacks::default(),
        }
    }
}

impl EngineTables {
    pub fn item_quantity_max(&self, rarity: Rarity) -> u32 {
        self.item_quantity_max.get(&rarity).copied().unwrap_or(1).max(1)
    }

    pub fn criteria_for_rarity(&self, rarity: Rarity) -> BTreeMap<MonsterFamily, FilterCriteria> {
        self.rarity_criteria.get(&rarity).cloned().unwrap_or_default()
    }

    /// Reward type labels for a boss, falling back to the normal boss list
    pub fn boss_reward_types(&self, boss_type: &str) -> &[String] {
        self.boss_reward_types
            .get(&boss_type.to_lowercase())
            .or_else(|| self.boss_reward_types.get(DEFAULT_BOSS_TYPE))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_domain("type", &self.type_domain)?;
        check_domain("attribute", &self.attribute_domain)?;

        if self.type_domain.len() < self.default_request.max_type {
            return Err(ConfigurationError::TypeDomainTooSmall {
                requested: self.default_request.max_type,
                available: self.type_domain.len(),
            });
        }

        self.default_request.validate()?;

        for criteria in self.rarity_criteria.values() {
            for (family, filter) in criteria {
                filter.validate_keys(*family)?;
            }
        }

        for (family, filter) in &self.activity.garden.monster_filters {
            filter.validate_keys(*family)?;
        }

        self.fallbacks.validate()
    }
}

fn labels(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn check_domain(name: &'static str, domain: &[String]) -> Result<(), ConfigurationError> {
    if domain.is_empty() {
        return Err(ConfigurationError::EmptyDomain(name));
    }

    let mut seen = BTreeSet::new();
    for label in domain {
        if !seen.insert(label.as_str()) {
            return Err(ConfigurationError::DuplicateDomainLabel {
                domain: name,
                label: label.clone(),
            });
        }
    }
    Ok(())
}

fn default_roll_request() -> RollRequest {
    RollRequest {
        filters: BTreeMap::from([
            (
                MonsterFamily::Pokemon,
                FilterCriteria::new()
                    .with("rarity", &["Common"])
                    .with("stage", &["Base Stage", "Doesn't Evolve"]),
            ),
            (
                MonsterFamily::Digimon,
                FilterCriteria::new().with("stage", &["Training 1", "Training 2", "Rookie"]),
            ),
            (
                MonsterFamily::Yokai,
                FilterCriteria::new().with("rank", &["E", "D", "C", "B"]),
            ),
        ]),
        ..Default::default()
    }
}

fn default_rarity_criteria() -> BTreeMap<Rarity, BTreeMap<MonsterFamily, FilterCriteria>> {
    fn tier(pokemon: &[&str], digimon: &[&str], yokai: &[&str]) -> BTreeMap<MonsterFamily, FilterCriteria> {
        BTreeMap::from([
            (MonsterFamily::Pokemon, FilterCriteria::new().with("rarity", pokemon)),
            (MonsterFamily::Digimon, FilterCriteria::new().with("stage", digimon)),
            (MonsterFamily::Yokai, FilterCriteria::new().with("rank", yokai)),
        ])
    }

    BTreeMap::from([
        (
            Rarity::Legendary,
            tier(&["Legendary", "Mythical", "Ultra Beast"], &["Ultra", "Super Ultimate"], &["SS"]),
        ),
        (Rarity::Epic, tier(&["Rare", "Very Rare"], &["Mega"], &["S"])),
        (Rarity::Rare, tier(&["Rare"], &["Ultimate"], &["A"])),
        (Rarity::Uncommon, tier(&["Uncommon"], &["Champion"], &["B"])),
        (Rarity::Common, tier(&["Common"], &["Rookie", "Training"], &["E", "D", "C"])),
    ])
}

fn default_boss_reward_types() -> BTreeMap<String, Vec<String>> {
    [
        ("normal", ["Normal", "Fighting", "Flying"]),
        ("fire", ["Fire", "Dragon", "Rock"]),
        ("water", ["Water", "Ice", "Ground"]),
        ("electric", ["Electric", "Steel", "Flying"]),
        ("grass", ["Grass", "Bug", "Poison"]),
        ("psychic", ["Psychic", "Fairy", "Ghost"]),
        ("dark", ["Dark", "Ghost", "Fighting"]),
    ]
    .into_iter()
    .map(|(boss, types)| (boss.to_string(), labels(&types)))
    .collect()
}

/// One contribution tier: shares at or above `min_share` earn `rarity`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContributionTier {
    pub min_share: f64,
    pub rarity: Rarity,
}

/// Boss reward thresholds and amounts, keyed on contribution share percent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContributionRules {
    pub tiers: Vec<ContributionTier>,
    pub base_rarity: Rarity,
    pub currency_base: f64,
    pub currency_per_percent: f64,
    pub item_min_share: f64,
    pub item_quantity_share_step: f64,
    pub item_source_prefix: String,
    pub monster_min_share: f64,
    pub monster_families: Vec<MonsterFamily>,
    pub monster_max_types: usize,
    pub monster_level_min: u32,
    pub monster_level_max: u32,
}

impl Default for ContributionRules {
    fn default() -> Self {
        Self {
            tiers: vec![
                ContributionTier { min_share: 30.0, rarity: Rarity::Epic },
                ContributionTier { min_share: 15.0, rarity: Rarity::Rare },
                ContributionTier { min_share: 5.0, rarity: Rarity::Uncommon },
            ],
            base_rarity: Rarity::Common,
            currency_base: 100.0,
            currency_per_percent: 10.0,
            item_min_share: 5.0,
            item_quantity_share_step: 10.0,
            item_source_prefix: "boss_".to_string(),
            monster_min_share: 15.0,
            monster_families: vec![MonsterFamily::Pokemon, MonsterFamily::Digimon],
            monster_max_types: 2,
            monster_level_min: 5,
            monster_level_max: 15,
        }
    }
}

impl ContributionRules {
    /// Highest tier whose threshold the share meets, else the base rarity
    pub fn tier_for(&self, share_percent: f64) -> Rarity {
        self.tiers
            .iter()
            .filter(|tier| share_percent >= tier.min_share)
            .max_by(|a, b| a.min_share.total_cmp(&b.min_share))
            .map(|tier| tier.rarity)
            .unwrap_or(self.base_rarity)
    }

    pub fn currency_for(&self, share_percent: f64) -> u64 {
        (self.currency_base + share_percent * self.currency_per_percent)
            .floor()
            .max(0.0) as u64
    }

    pub fn item_quantity_for(&self, share_percent: f64) -> u32 {
        let step = if self.item_quantity_share_step > 0.0 {
            self.item_quantity_share_step
        } else {
            10.0
        };
        ((share_percent / step).ceil() as u32).max(1)
    }
}

/// Activity reward tables, kept apart from the boss contribution tiers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActivityRewardRules {
    pub game_corner: GameCornerRules,
    pub garden: GardenRules,
}

/// Focus-session rewards; productivity is a 0-100 score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameCornerRules {
    pub coins_per_unit: f64,
    pub minutes_per_bonus_unit: u32,
    pub productivity_per_reward: u32,
    pub max_rewards_per_kind: u32,
    pub level_min_productivity: u32,
    pub level_minutes_per_reward: u32,
    pub monster_level_share: f64,
    pub max_levels_per_reward: u32,
    pub item_source: String,
    pub item_minutes_per_reward: u32,
    pub item_rare_productivity: u32,
    pub item_rare_chance: f64,
    pub item_uncommon_productivity: u32,
    pub monster_min_productivity: u32,
    pub monster_minutes_per_reward: u32,
    pub monster_epic_productivity: u32,
    pub monster_legendary_productivity: u32,
    pub monster_legendary_chance: f64,
    pub monster_base_level: u32,
}

impl Default for GameCornerRules {
    fn default() -> Self {
        Self {
            coins_per_unit: 50.0,
            minutes_per_bonus_unit: 15,
            productivity_per_reward: 20,
            max_rewards_per_kind: 5,
            level_min_productivity: 50,
            level_minutes_per_reward: 30,
            monster_level_share: 0.7,
            max_levels_per_reward: 2,
            item_source: "game_corner".to_string(),
            item_minutes_per_reward: 25,
            item_rare_productivity: 90,
            item_rare_chance: 0.1,
            item_uncommon_productivity: 70,
            monster_min_productivity: 80,
            monster_minutes_per_reward: 35,
            monster_epic_productivity: 90,
            monster_legendary_productivity: 95,
            monster_legendary_chance: 0.000002,
            monster_base_level: 5,
        }
    }
}

/// Harvest rewards, rolled once per garden point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GardenRules {
    pub coins_per_point: u64,
    pub berry_chance: f64,
    pub berry_source: String,
    pub berry_rarity: RarityTable,
    pub monster_chance: f64,
    pub monster_rarity: RarityTable,
    pub monster_level_min: u32,
    pub monster_level_max: u32,
    pub monster_filters: BTreeMap<MonsterFamily, FilterCriteria>,
}

impl Default for GardenRules {
    fn default() -> Self {
        Self {
            coins_per_point: 50,
            berry_chance: 0.25,
            berry_source: "garden".to_string(),
            berry_rarity: RarityTable::new([
                (Rarity::Common, 63.0),
                (Rarity::Uncommon, 27.0),
                (Rarity::Rare, 10.0),
            ])
            .unwrap_or_default(),
            monster_chance: 0.15,
            monster_rarity: RarityTable::new([
                (Rarity::Common, 70.0),
                (Rarity::Uncommon, 20.0),
                (Rarity::Rare, 9.0),
                (Rarity::Epic, 0.99),
                (Rarity::Legendary, 0.01),
            ])
            .unwrap_or_default(),
            monster_level_min: 1,
            monster_level_max: 5,
            monster_filters: BTreeMap::from([
                (MonsterFamily::Pokemon, FilterCriteria::new().with("types", &["Grass", "Bug"])),
                (
                    MonsterFamily::Digimon,
                    FilterCriteria::new().with("attribute", &["Nature Spirit", "Insectoid"]),
                ),
                (MonsterFamily::Yokai, FilterCriteria::new().with("tribe", &["Nature"])),
            ]),
        }
    }
}

/// Minimal valid rewards handed out when a roll fails internally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RewardFallbacks {
    pub currency_amount: u64,
    pub item_name: String,
    pub item_description: String,
    pub item_category: String,
    pub level_count: u32,
    pub monster_family: MonsterFamily,
    pub monster_species: String,
    pub monster_type: String,
    pub monster_attribute: String,
    pub monster_level: u32,
}

impl Default for RewardFallbacks {
    fn default() -> Self {
        Self {
            currency_amount: 50,
            item_name: "Potion".to_string(),
            item_description: "Restores 20 HP".to_string(),
            item_category: "general".to_string(),
            level_count: 1,
            monster_family: MonsterFamily::Pokemon,
            monster_species: "Pikachu".to_string(),
            monster_type: "Electric".to_string(),
            monster_attribute: "Data".to_string(),
            monster_level: 5,
        }
    }
}

impl RewardFallbacks {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let blank = |s: &String| s.trim().is_empty();
        if self.currency_amount == 0 {
            return Err(ConfigurationError::InvalidFallback("currency_amount must be positive"));
        }
        if blank(&self.item_name) {
            return Err(ConfigurationError::InvalidFallback("item_name is empty"));
        }
        if self.level_count == 0 || self.monster_level == 0 {
            return Err(ConfigurationError::InvalidFallback("level counts must be positive"));
        }
        if blank(&self.monster_species) || blank(&self.monster_type) || blank(&self.monster_attribute) {
            return Err(ConfigurationError::InvalidFallback("monster fields must be set"));
        }
        Ok(())
    }
}
