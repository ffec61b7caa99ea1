//! Contribution Allocator - turns a boss's damage snapshot into reward sets
//!
//! Each participant with a non-zero share gets currency at their tier, an
//! item above the item threshold and a monster above the monster threshold.
//! Reward ids are derived from the boss and participant so that claiming a
//! stored allocation twice hits the same ledger keys.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::RngCore;
use tracing::{debug, info, instrument};

use super::reward_roller::{ItemSource, RewardRequest, RewardRoller};
use crate::application::dto::ParticipantAllocation;
use crate::domain::entities::{ContributionRecord, Reward, RewardKind, RewardPayload, RewardValidationError};
use crate::domain::services::{contribution_shares, ContributionShare};
use crate::domain::value_objects::{BossId, EngineTables, Rarity, RewardId, RollOverrides};

#[derive(Clone)]
pub struct ContributionAllocator {
    roller: RewardRoller,
    tables: Arc<EngineTables>,
}

impl ContributionAllocator {
    pub fn new(roller: RewardRoller, tables: Arc<EngineTables>) -> Self {
        Self { roller, tables }
    }

    /// Reward sets for every participant that dealt damage, highest share first
    #[instrument(skip(self, records, rng), fields(records = records.len()))]
    pub async fn allocate(
        &self,
        boss_id: BossId,
        boss_type: &str,
        records: &[ContributionRecord],
        rng: &mut (dyn RngCore + Send),
    ) -> Vec<ParticipantAllocation> {
        let shares = contribution_shares(records, &self.tables.contribution);
        let mut allocations = Vec::with_capacity(shares.len());

        for share in shares {
            let Some(tier) = share.tier else {
                debug!(participant = %share.participant, "No contribution, no rewards");
                continue;
            };

            let rewards = self.rewards_for(boss_id, boss_type, &share, tier, rng).await;
            allocations.push(ParticipantAllocation {
                participant: share.participant,
                raw_amount: share.raw_amount,
                share_percent: share.share_percent,
                tier,
                rewards,
            });
        }

        info!(boss_id = %boss_id, participants = allocations.len(), "Allocated boss rewards");
        allocations
    }

    async fn rewards_for(
        &self,
        boss_id: BossId,
        boss_type: &str,
        share: &ContributionShare,
        tier: Rarity,
        rng: &mut (dyn RngCore + Send),
    ) -> Vec<Reward> {
        let rules = &self.tables.contribution;
        let id = |kind: RewardKind| RewardId::for_boss(kind.as_str(), boss_id, share.participant);
        let mut rewards = Vec::with_capacity(3);

        match currency_reward(id(RewardKind::Currency), tier, rules.currency_for(share.share_percent)) {
            Ok(reward) => rewards.push(reward),
            Err(e) => debug!(error = %e, "Skipping empty currency reward"),
        }

        if share.share_percent >= rules.item_min_share {
            let request = RewardRequest::Item {
                source: ItemSource::Source(format!("{}{}", rules.item_source_prefix, boss_type.to_lowercase())),
                rarity: Some(tier),
                quantity: Some(rules.item_quantity_for(share.share_percent)),
            };
            rewards.push(self.roller.roll_reward_as(id(RewardKind::Item), &request, rng).await);
        }

        if share.share_percent >= rules.monster_min_share {
            let mut types = self.tables.boss_reward_types(boss_type).to_vec();
            types.shuffle(rng);

            let request = RewardRequest::Monster {
                rarity: Some(tier),
                overrides: RollOverrides {
                    include_families: Some(rules.monster_families.clone()),
                    min_species: Some(1),
                    max_species: Some(1),
                    force_fusion: Some(false),
                    type_override: Some(types),
                    min_type: Some(1),
                    max_type: Some(rules.monster_max_types.max(1)),
                    ..Default::default()
                },
                level_min: rules.monster_level_min,
                level_max: rules.monster_level_max,
            };
            rewards.push(self.roller.roll_reward_as(id(RewardKind::Monster), &request, rng).await);
        }

        rewards
    }
}

fn currency_reward(id: RewardId, tier: Rarity, amount: u64) -> Result<Reward, RewardValidationError> {
    Reward::new(id, tier, RewardPayload::Currency { amount })
}
