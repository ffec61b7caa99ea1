//! Domain entities - Core business objects with identity

mod boss;
mod monster;
mod reward;

pub use boss::{
    aggregate_contributions, share_percent, BossError, BossEvent, BossState, ContributionRecord,
    DamageOutcome, LeaderboardEntry, ParticipantTotal,
};
pub use monster::{DescriptorError, MonsterDescriptor, SpeciesIdentity, SpeciesSlot};
pub use reward::{LevelTarget, Reward, RewardKind, RewardPayload, RewardValidationError};
