//! Reward entity - what a roll or a boss allocation hands out
//!
//! Rewards are immutable once built: fields are private and every
//! constructor validates. Claiming is a separate ledger operation.

use serde::{Deserialize, Serialize};

use super::monster::{DescriptorError, MonsterDescriptor};
use crate::domain::value_objects::{Rarity, RewardId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    Currency,
    Item,
    Level,
    Monster,
}

impl RewardKind {
    /// Prefix used for this kind's reward ids
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Currency => "currency",
            Self::Item => "item",
            Self::Level => "level",
            Self::Monster => "monster",
        }
    }
}

impl std::fmt::Display for RewardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who receives a level reward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelTarget {
    Monster,
    Trainer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewardPayload {
    Currency {
        amount: u64,
    },
    Item {
        name: String,
        quantity: u32,
        category: String,
        #[serde(default)]
        description: String,
    },
    Level {
        count: u32,
        target: LevelTarget,
    },
    Monster {
        monster: MonsterDescriptor,
        level: u32,
    },
}

impl RewardPayload {
    pub fn kind(&self) -> RewardKind {
        match self {
            Self::Currency { .. } => RewardKind::Currency,
            Self::Item { .. } => RewardKind::Item,
            Self::Level { .. } => RewardKind::Level,
            Self::Monster { .. } => RewardKind::Monster,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RewardValidationError {
    #[error("Reward id is empty")]
    EmptyId,
    #[error("Currency amount must be positive")]
    ZeroCurrency,
    #[error("Item name is empty")]
    EmptyItemName,
    #[error("Item quantity must be positive")]
    ZeroQuantity,
    #[error("Level count must be positive")]
    ZeroLevels,
    #[error("Monster level must be positive")]
    ZeroMonsterLevel,
    #[error("Invalid monster: {0}")]
    Monster(#[from] DescriptorError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    id: RewardId,
    rarity: Rarity,
    payload: RewardPayload,
}

impl Reward {
    pub fn new(id: RewardId, rarity: Rarity, payload: RewardPayload) -> Result<Self, RewardValidationError> {
        let reward = Self { id, rarity, payload };
        reward.validate()?;
        Ok(reward)
    }

    /// Skips validation; only for payloads built from checked configuration
    pub(crate) fn new_unchecked(id: RewardId, rarity: Rarity, payload: RewardPayload) -> Self {
        Self { id, rarity, payload }
    }

    pub fn id(&self) -> &RewardId {
        &self.id
    }

    pub fn rarity(&self) -> Rarity {
        self.rarity
    }

    pub fn payload(&self) -> &RewardPayload {
        &self.payload
    }

    pub fn kind(&self) -> RewardKind {
        self.payload.kind()
    }

    /// Structural checks; rewards read back from storage are re-checked here
    pub fn validate(&self) -> Result<(), RewardValidationError> {
        if self.id.as_str().is_empty() {
            return Err(RewardValidationError::EmptyId);
        }

        match &self.payload {
            RewardPayload::Currency { amount } => {
                if *amount == 0 {
                    return Err(RewardValidationError::ZeroCurrency);
                }
            }
            RewardPayload::Item { name, quantity, .. } => {
                if name.trim().is_empty() {
                    return Err(RewardValidationError::EmptyItemName);
                }
                if *quantity == 0 {
                    return Err(RewardValidationError::ZeroQuantity);
                }
            }
            RewardPayload::Level { count, .. } => {
                if *count == 0 {
                    return Err(RewardValidationError::ZeroLevels);
                }
            }
            RewardPayload::Monster { monster, level } => {
                monster.validate()?;
                if *level == 0 {
                    return Err(RewardValidationError::ZeroMonsterLevel);
                }
            }
        }
        Ok(())
    }
}
