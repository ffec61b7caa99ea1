//! Reward Claim Service - credits rewards through the inventory ledger

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::application::ports::outbound::{InventoryLedgerPort, LedgerError};
use crate::domain::entities::{Reward, RewardValidationError};
use crate::domain::value_objects::{ParticipantId, RewardId};

#[derive(Debug, thiserror::Error)]
pub enum ClaimError {
    #[error("Reward is invalid: {0}")]
    InvalidReward(#[from] RewardValidationError),
    #[error("Reward {0} was already claimed")]
    AlreadyClaimed(RewardId),
    #[error("Ledger error: {0}")]
    Ledger(String),
}

impl From<LedgerError> for ClaimError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::AlreadyClaimed(id) => Self::AlreadyClaimed(id),
            LedgerError::Storage(msg) => Self::Ledger(msg),
        }
    }
}

#[async_trait]
pub trait RewardClaimService: Send + Sync {
    /// Validate and credit one reward; a reward id is credited at most once
    async fn claim(&self, participant: ParticipantId, reward: &Reward) -> Result<(), ClaimError>;
}

#[derive(Clone)]
pub struct RewardClaimServiceImpl {
    ledger: Arc<dyn InventoryLedgerPort>,
}

impl RewardClaimServiceImpl {
    pub fn new(ledger: Arc<dyn InventoryLedgerPort>) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl RewardClaimService for RewardClaimServiceImpl {
    #[instrument(skip(self, reward), fields(reward_id = %reward.id()))]
    async fn claim(&self, participant: ParticipantId, reward: &Reward) -> Result<(), ClaimError> {
        reward.validate()?;

        match self.ledger.credit(participant, reward).await {
            Ok(()) => {
                info!(participant = %participant, kind = %reward.kind(), "Reward claimed");
                Ok(())
            }
            Err(e) => {
                warn!(participant = %participant, error = %e, "Reward claim rejected");
                Err(e.into())
            }
        }
    }
}
