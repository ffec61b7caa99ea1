use serde::{Deserialize, Serialize};

use crate::domain::entities::Reward;
use crate::domain::value_objects::{BossId, ParticipantId, Rarity, RewardId};

/// Rewards allocated to one participant of a defeated boss
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantAllocation {
    pub participant: ParticipantId,
    pub raw_amount: u64,
    pub share_percent: f64,
    pub tier: Rarity,
    pub rewards: Vec<Reward>,
}

/// Result of one damage call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageReport {
    pub boss_id: BossId,
    pub participant: ParticipantId,
    pub damage: u64,
    pub remaining_health: u64,
    /// True only for the call whose damage defeated the boss
    pub defeated: bool,
    /// Filled when this call defeated the boss and ran the allocation
    pub allocations: Option<Vec<ParticipantAllocation>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Claimed,
    AlreadyClaimed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimOutcome {
    pub reward_id: RewardId,
    pub status: ClaimStatus,
}
