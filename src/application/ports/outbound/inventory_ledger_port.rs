use async_trait::async_trait;

use crate::domain::entities::Reward;
use crate::domain::value_objects::{ParticipantId, RewardId};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Reward {0} was already claimed")]
    AlreadyClaimed(RewardId),
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Credits rewards to participants, at most once per reward id
#[async_trait]
pub trait InventoryLedgerPort: Send + Sync {
    async fn credit(&self, participant: ParticipantId, reward: &Reward) -> Result<(), LedgerError>;

    async fn is_claimed(&self, reward_id: &RewardId) -> Result<bool, LedgerError>;
}
