//! Activity Reward Service - reward bundles for Game Corner and Garden
//!
//! Both bundles are built on the reward roller and read their thresholds
//! from `ActivityRewardRules`, independently of the boss contribution tiers.

use std::sync::Arc;

use rand::{Rng, RngCore};
use tracing::{info, instrument};

use super::reward_roller::{ItemSource, RewardRequest, RewardRoller};
use crate::domain::entities::{LevelTarget, Reward};
use crate::domain::value_objects::{EngineTables, Rarity, RollOverrides};

#[derive(Clone)]
pub struct ActivityRewardService {
    roller: RewardRoller,
    tables: Arc<EngineTables>,
}

impl ActivityRewardService {
    pub fn new(roller: RewardRoller, tables: Arc<EngineTables>) -> Self {
        Self { roller, tables }
    }

    /// Rewards for a run of focus sessions
    ///
    /// `productivity` is a 0-100 score; larger values are clamped.
    #[instrument(skip(self, rng))]
    pub async fn game_corner(
        &self,
        sessions: u32,
        minutes: u32,
        productivity: u32,
        rng: &mut (dyn RngCore + Send),
    ) -> Vec<Reward> {
        let rules = &self.tables.activity.game_corner;
        let productivity = productivity.min(100);
        let mut rewards = Vec::new();

        let units = sessions.saturating_add(minutes.div_ceil(rules.minutes_per_bonus_unit.max(1)));
        let coins = (rules.coins_per_unit * units as f64 * productivity as f64 / 100.0).round() as u64;
        self.push_coins(coins, &mut rewards, rng).await;

        let per_reward = rules.productivity_per_reward.max(1);
        let cap = |minutes_per_reward: u32| {
            (productivity / per_reward)
                .max(minutes / minutes_per_reward.max(1))
                .min(rules.max_rewards_per_kind)
        };

        if productivity >= rules.level_min_productivity {
            let count = rng.gen_range(0..=cap(rules.level_minutes_per_reward));
            let monster_levels = (count as f64 * rules.monster_level_share).ceil() as u32;

            for i in 0..count {
                let target = if i < monster_levels {
                    LevelTarget::Monster
                } else {
                    LevelTarget::Trainer
                };
                let request = RewardRequest::Level {
                    count: rng.gen_range(1..=rules.max_levels_per_reward.max(1)),
                    target,
                };
                rewards.push(self.roller.roll_reward(&request, rng).await);
            }
        }

        let items = rng.gen_range(0..=cap(rules.item_minutes_per_reward));
        for _ in 0..items {
            let rarity = if productivity >= rules.item_rare_productivity {
                if rng.gen_bool(rules.item_rare_chance.clamp(0.0, 1.0)) {
                    Rarity::Rare
                } else {
                    Rarity::Uncommon
                }
            } else if productivity >= rules.item_uncommon_productivity {
                Rarity::Uncommon
            } else {
                Rarity::Common
            };

            let request = RewardRequest::Item {
                source: ItemSource::Source(rules.item_source.clone()),
                rarity: Some(rarity),
                quantity: None,
            };
            rewards.push(self.roller.roll_reward(&request, rng).await);
        }

        if productivity >= rules.monster_min_productivity {
            let monsters = rng.gen_range(0..=cap(rules.monster_minutes_per_reward));
            let level = rules.monster_base_level.saturating_add(sessions / 2);

            for _ in 0..monsters {
                let rarity = if productivity >= rules.monster_legendary_productivity
                    && rng.gen::<f64>() <= rules.monster_legendary_chance
                {
                    Rarity::Legendary
                } else if productivity >= rules.monster_epic_productivity {
                    Rarity::Epic
                } else {
                    Rarity::Rare
                };

                let request = RewardRequest::Monster {
                    rarity: Some(rarity),
                    overrides: RollOverrides::default(),
                    level_min: level,
                    level_max: level,
                };
                rewards.push(self.roller.roll_reward(&request, rng).await);
            }
        }

        info!(rewards = rewards.len(), coins, "Game Corner rewards rolled");
        rewards
    }

    /// Rewards for a garden harvest, rolled once per point
    #[instrument(skip(self, rng))]
    pub async fn garden(&self, points: u32, rng: &mut (dyn RngCore + Send)) -> Vec<Reward> {
        let rules = &self.tables.activity.garden;
        let mut rewards = Vec::new();

        let coins = u64::from(points).saturating_mul(rules.coins_per_point);
        self.push_coins(coins, &mut rewards, rng).await;

        for _ in 0..points {
            if rng.gen_bool(rules.berry_chance.clamp(0.0, 1.0)) {
                let request = RewardRequest::Item {
                    source: ItemSource::Source(rules.berry_source.clone()),
                    rarity: Some(rules.berry_rarity.roll(rng)),
                    quantity: None,
                };
                rewards.push(self.roller.roll_reward(&request, rng).await);
            }
        }

        for _ in 0..points {
            if rng.gen_bool(rules.monster_chance.clamp(0.0, 1.0)) {
                let request = RewardRequest::Monster {
                    rarity: Some(rules.monster_rarity.roll(rng)),
                    overrides: RollOverrides::from_filters(rules.monster_filters.clone()),
                    level_min: rules.monster_level_min,
                    level_max: rules.monster_level_max,
                };
                rewards.push(self.roller.roll_reward(&request, rng).await);
            }
        }

        info!(rewards = rewards.len(), coins, "Garden rewards rolled");
        rewards
    }

    async fn push_coins(&self, coins: u64, rewards: &mut Vec<Reward>, rng: &mut (dyn RngCore + Send)) {
        if coins == 0 {
            return;
        }
        let request = RewardRequest::Currency {
            base: coins,
            multiplier: 1.0,
        };
        rewards.push(self.roller.roll_reward(&request, rng).await);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::outbound::CatalogItem;
    use crate::application::services::MonsterComposer;
    use crate::domain::entities::{RewardKind, RewardPayload};
    use crate::domain::value_objects::MonsterFamily;
    use crate::infrastructure::persistence::{InMemoryItemCatalog, InMemorySpeciesPool, SpeciesRecord};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn service() -> ActivityRewardService {
        let tables = Arc::new(EngineTables::default());
        let mut items = Vec::new();
        for source in ["game_corner", "garden"] {
            for rarity in [Rarity::Common, Rarity::Uncommon, Rarity::Rare] {
                items.push(CatalogItem {
                    name: format!("{} prize ({})", source, rarity),
                    description: String::new(),
                    category: "prizes".to_string(),
                    rarity,
                    source: source.to_string(),
                });
            }
        }
        let species = vec![
            SpeciesRecord::new(MonsterFamily::Pokemon, "Oddish")
                .with_trait("rarity", &["Common", "Uncommon", "Rare", "Very Rare"])
                .with_trait("stage", &["Base Stage"])
                .with_trait("types", &["Grass", "Poison"]),
            SpeciesRecord::new(MonsterFamily::Digimon, "Lillymon")
                .with_trait("stage", &["Rookie", "Training", "Champion", "Ultimate", "Mega"])
                .with_trait("attribute", &["Nature Spirit"]),
            SpeciesRecord::new(MonsterFamily::Yokai, "Kodama")
                .with_trait("rank", &["E", "D", "C", "B", "A", "S"])
                .with_trait("tribe", &["Nature"]),
        ];

        let composer = MonsterComposer::new(Arc::new(InMemorySpeciesPool::with_seed(species, 9)), tables.clone());
        let roller = RewardRoller::new(Arc::new(InMemoryItemCatalog::new(items)), composer, tables.clone());
        ActivityRewardService::new(roller, tables)
    }

    fn count(rewards: &[Reward], kind: RewardKind) -> usize {
        rewards.iter().filter(|r| r.kind() == kind).count()
    }

    #[tokio::test]
    async fn test_game_corner_coins() {
        let service = service();
        let mut rng = StdRng::seed_from_u64(1);

        // 50 * (2 + ceil(40 / 15)) * 0.6 = 150
        let rewards = service.game_corner(2, 40, 60, &mut rng).await;
        let coins: Vec<_> = rewards
            .iter()
            .filter_map(|r| match r.payload() {
                RewardPayload::Currency { amount } => Some(*amount),
                _ => None,
            })
            .collect();
        assert_eq!(coins, vec![150]);
        assert_eq!(count(&rewards, RewardKind::Monster), 0);
    }

    #[tokio::test]
    async fn test_game_corner_low_productivity_limits() {
        let service = service();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let rewards = service.game_corner(1, 20, 40, &mut rng).await;
            assert_eq!(count(&rewards, RewardKind::Level), 0);
            assert_eq!(count(&rewards, RewardKind::Monster), 0);
            assert!(count(&rewards, RewardKind::Item) <= 2);
            for reward in rewards.iter().filter(|r| r.kind() == RewardKind::Item) {
                assert_eq!(reward.rarity(), Rarity::Common);
            }
        }
    }

    #[tokio::test]
    async fn test_game_corner_high_productivity() {
        let service = service();
        let mut saw_monster = false;
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let rewards = service.game_corner(4, 120, 92, &mut rng).await;
            assert!(count(&rewards, RewardKind::Level) <= 5);
            assert!(count(&rewards, RewardKind::Item) <= 5);
            assert!(count(&rewards, RewardKind::Monster) <= 5);

            for reward in &rewards {
                match reward.payload() {
                    RewardPayload::Level { count, .. } => assert!((1..=2).contains(count)),
                    RewardPayload::Monster { level, .. } => {
                        saw_monster = true;
                        assert_eq!(*level, 7);
                        assert_eq!(reward.rarity(), Rarity::Epic);
                    }
                    RewardPayload::Item { .. } => {
                        assert!(matches!(reward.rarity(), Rarity::Rare | Rarity::Uncommon));
                    }
                    RewardPayload::Currency { .. } => {}
                }
            }
        }
        assert!(saw_monster);
    }

    #[tokio::test]
    async fn test_game_corner_huge_inputs_saturate() {
        let service = service();
        let mut rng = StdRng::seed_from_u64(6);
        let rewards = service.game_corner(u32::MAX, u32::MAX, 100, &mut rng).await;

        assert_eq!(
            rewards[0].payload(),
            &RewardPayload::Currency {
                amount: 50 * u64::from(u32::MAX)
            }
        );
        assert!(count(&rewards, RewardKind::Monster) <= 5);
    }

    #[tokio::test]
    async fn test_garden_bundle() {
        let service = service();
        let mut rng = StdRng::seed_from_u64(4);
        let rewards = service.garden(40, &mut rng).await;

        assert_eq!(rewards[0].payload(), &RewardPayload::Currency { amount: 2000 });
        assert!(count(&rewards, RewardKind::Item) > 0);
        for reward in &rewards {
            match reward.payload() {
                RewardPayload::Item { name, .. } => assert!(name.starts_with("garden prize")),
                RewardPayload::Monster { level, .. } => assert!((1..=5).contains(level)),
                _ => {}
            }
        }
    }

    #[tokio::test]
    async fn test_garden_zero_points() {
        let service = service();
        let mut rng = StdRng::seed_from_u64(5);
        assert!(service.garden(0, &mut rng).await.is_empty());
    }
}
