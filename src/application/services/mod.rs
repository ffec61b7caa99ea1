//! Application services - Use case implementations
//!
//! Services hold immutable engine tables and outbound ports behind `Arc`.
//! Every random decision is drawn from the generator the caller passes in.

pub mod activity_reward_service;
pub mod boss_battle_service;
pub mod contribution_allocator;
pub mod monster_composer;
pub mod reward_claim_service;
pub mod reward_roller;

pub use activity_reward_service::ActivityRewardService;
pub use boss_battle_service::{BossBattleError, BossBattleService, BossBattleServiceImpl};
pub use contribution_allocator::ContributionAllocator;
pub use monster_composer::{CompositionError, MonsterComposer};
pub use reward_claim_service::{ClaimError, RewardClaimService, RewardClaimServiceImpl};
pub use reward_roller::{ItemSource, RewardRequest, RewardRollError, RewardRoller};
