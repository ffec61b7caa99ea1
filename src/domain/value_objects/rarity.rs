//! Rarity tiers and the weighted rarity table

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::errors::ConfigurationError;

/// Rarity tier shared by reward rolls and contribution tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub const ALL: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }

    /// Rarity label applied after the fact to a currency amount
    pub fn from_currency_amount(amount: u64) -> Self {
        match amount {
            a if a >= 10_000 => Self::Legendary,
            a if a >= 5_000 => Self::Epic,
            a if a >= 1_000 => Self::Rare,
            a if a >= 500 => Self::Uncommon,
            _ => Self::Common,
        }
    }

    /// Rarity label applied after the fact to a level-up count
    pub fn from_level_count(count: u32) -> Self {
        match count {
            c if c >= 10 => Self::Legendary,
            c if c >= 7 => Self::Epic,
            c if c >= 5 => Self::Rare,
            c if c >= 3 => Self::Uncommon,
            _ => Self::Common,
        }
    }
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Percentage weights per rarity, summing to 100
///
/// Sampling walks the tiers from common to legendary and returns the first
/// tier whose cumulative weight exceeds the roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<Rarity, f64>", into = "BTreeMap<Rarity, f64>")]
pub struct RarityTable {
    weights: Vec<(Rarity, f64)>,
}

impl RarityTable {
    const SUM_EPSILON: f64 = 1e-6;

    pub fn new(weights: impl IntoIterator<Item = (Rarity, f64)>) -> Result<Self, ConfigurationError> {
        let mut by_rarity: BTreeMap<Rarity, f64> = BTreeMap::new();
        for (rarity, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigurationError::InvalidRarityWeight {
                    rarity: rarity.to_string(),
                    weight,
                });
            }
            *by_rarity.entry(rarity).or_insert(0.0) += weight;
        }

        let total: f64 = by_rarity.values().sum();
        if (total - 100.0).abs() > Self::SUM_EPSILON {
            return Err(ConfigurationError::RarityWeightsSum { total });
        }

        Ok(Self {
            weights: by_rarity.into_iter().collect(),
        })
    }

    pub fn weight(&self, rarity: Rarity) -> f64 {
        self.weights
            .iter()
            .find(|(r, _)| *r == rarity)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> Rarity {
        let roll = rng.gen_range(0.0..100.0);
        let mut cumulative = 0.0;
        for (rarity, weight) in &self.weights {
            cumulative += weight;
            if roll < cumulative {
                return *rarity;
            }
        }

        // Only reachable through float rounding at the top of the range
        self.weights
            .iter()
            .rev()
            .find(|(_, w)| *w > 0.0)
            .map(|(r, _)| *r)
            .unwrap_or(Rarity::Common)
    }
}

impl Default for RarityTable {
    fn default() -> Self {
        Self {
            weights: vec![
                (Rarity::Common, 60.0),
                (Rarity::Uncommon, 25.0),
                (Rarity::Rare, 10.0),
                (Rarity::Epic, 4.0),
                (Rarity::Legendary, 1.0),
            ],
        }
    }
}

impl TryFrom<BTreeMap<Rarity, f64>> for RarityTable {
    type Error = ConfigurationError;

    fn try_from(value: BTreeMap<Rarity, f64>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RarityTable> for BTreeMap<Rarity, f64> {
    fn from(table: RarityTable) -> Self {
        table.weights.into_iter().collect()
    }
}
