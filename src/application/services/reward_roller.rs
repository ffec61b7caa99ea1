//! Reward Roller - turns a reward request into one concrete reward
//!
//! Rarity is rolled from the engine's weighted table unless the request pins
//! it. A roll that fails internally (empty catalog, species pool miss) is
//! logged and replaced by the configured fallback reward of the same kind,
//! so callers always get something to hand out. `try_roll_reward` exposes
//! the failure instead.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use super::monster_composer::{CompositionError, MonsterComposer};
use crate::application::ports::outbound::ItemCatalogPort;
use crate::domain::entities::{
    LevelTarget, MonsterDescriptor, Reward, RewardKind, RewardPayload, RewardValidationError, SpeciesIdentity,
    SpeciesSlot,
};
use crate::domain::errors::ConfigurationError;
use crate::domain::services::OptionsResolver;
use crate::domain::value_objects::{EngineTables, Rarity, RewardId, RollOverrides};

/// Where item candidates come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSource {
    /// Drop source such as `garden` or `boss_fire`, matched with the rarity
    Source(String),
    /// Catalog category; widened to the whole category if no item has the rarity
    Category(String),
}

impl std::fmt::Display for ItemSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source(s) => write!(f, "source {}", s),
            Self::Category(c) => write!(f, "category {}", c),
        }
    }
}

fn default_multiplier() -> f64 {
    1.0
}

/// What to roll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewardRequest {
    Currency {
        base: u64,
        #[serde(default = "default_multiplier")]
        multiplier: f64,
    },
    Item {
        source: ItemSource,
        #[serde(default)]
        rarity: Option<Rarity>,
        #[serde(default)]
        quantity: Option<u32>,
    },
    Level {
        count: u32,
        target: LevelTarget,
    },
    Monster {
        #[serde(default)]
        rarity: Option<Rarity>,
        #[serde(default)]
        overrides: RollOverrides,
        level_min: u32,
        level_max: u32,
    },
}

impl RewardRequest {
    pub fn kind(&self) -> RewardKind {
        match self {
            Self::Currency { .. } => RewardKind::Currency,
            Self::Item { .. } => RewardKind::Item,
            Self::Level { .. } => RewardKind::Level,
            Self::Monster { .. } => RewardKind::Monster,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RewardRollError {
    #[error("No catalog items for {0}")]
    NoCatalogItems(String),
    #[error("Item catalog error: {0}")]
    Catalog(#[source] anyhow::Error),
    #[error(transparent)]
    Composition(#[from] CompositionError),
    #[error("Rolled an invalid reward: {0}")]
    Invalid(#[from] RewardValidationError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl RewardRollError {
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Configuration(_) => true,
            Self::Composition(e) => e.is_configuration(),
            _ => false,
        }
    }
}

#[derive(Clone)]
pub struct RewardRoller {
    catalog: Arc<dyn ItemCatalogPort>,
    composer: MonsterComposer,
    tables: Arc<EngineTables>,
}

impl RewardRoller {
    pub fn new(catalog: Arc<dyn ItemCatalogPort>, composer: MonsterComposer, tables: Arc<EngineTables>) -> Self {
        Self {
            catalog,
            composer,
            tables,
        }
    }

    pub fn tables(&self) -> &EngineTables {
        &self.tables
    }

    pub fn composer(&self) -> &MonsterComposer {
        &self.composer
    }

    pub fn roll_rarity(&self, rng: &mut (dyn RngCore + Send)) -> Rarity {
        self.tables.rarity_weights.roll(rng)
    }

    /// Rolls a reward with a fresh kind-prefixed id, degrading to the fallback
    pub async fn roll_reward(&self, request: &RewardRequest, rng: &mut (dyn RngCore + Send)) -> Reward {
        let id = RewardId::generate(request.kind().as_str(), rng);
        self.roll_reward_as(id, request, rng).await
    }

    /// Same as `roll_reward` but with a caller-chosen id
    #[instrument(skip(self, request, rng), fields(kind = %request.kind()))]
    pub async fn roll_reward_as(&self, id: RewardId, request: &RewardRequest, rng: &mut (dyn RngCore + Send)) -> Reward {
        match self.try_roll_reward_as(id.clone(), request, rng).await {
            Ok(reward) => reward,
            Err(e) => {
                if e.is_configuration() {
                    error!(reward_id = %id, error = %e, "Reward request is misconfigured, using fallback");
                } else {
                    warn!(reward_id = %id, error = %e, "Reward roll failed, using fallback");
                }
                self.fallback(id, request)
            }
        }
    }

    pub async fn try_roll_reward(
        &self,
        request: &RewardRequest,
        rng: &mut (dyn RngCore + Send),
    ) -> Result<Reward, RewardRollError> {
        let id = RewardId::generate(request.kind().as_str(), rng);
        self.try_roll_reward_as(id, request, rng).await
    }

    pub async fn try_roll_reward_as(
        &self,
        id: RewardId,
        request: &RewardRequest,
        rng: &mut (dyn RngCore + Send),
    ) -> Result<Reward, RewardRollError> {
        let reward = match request {
            RewardRequest::Currency { base, multiplier } => {
                let amount = (*base as f64 * multiplier).round().max(1.0) as u64;
                Reward::new(id, Rarity::from_currency_amount(amount), RewardPayload::Currency { amount })?
            }
            RewardRequest::Item {
                source,
                rarity,
                quantity,
            } => {
                let rarity = match rarity {
                    Some(r) => *r,
                    None => self.roll_rarity(rng),
                };
                self.roll_item(id, source, rarity, *quantity, rng).await?
            }
            RewardRequest::Level { count, target } => Reward::new(
                id,
                Rarity::from_level_count(*count),
                RewardPayload::Level {
                    count: *count,
                    target: *target,
                },
            )?,
            RewardRequest::Monster {
                rarity,
                overrides,
                level_min,
                level_max,
            } => {
                let rarity = match rarity {
                    Some(r) => *r,
                    None => self.roll_rarity(rng),
                };
                self.roll_monster(id, rarity, overrides, *level_min, *level_max, rng)
                    .await?
            }
        };

        debug!(reward_id = %reward.id(), rarity = %reward.rarity(), "Rolled reward");
        Ok(reward)
    }

    async fn roll_item(
        &self,
        id: RewardId,
        source: &ItemSource,
        rarity: Rarity,
        quantity: Option<u32>,
        rng: &mut (dyn RngCore + Send),
    ) -> Result<Reward, RewardRollError> {
        let candidates = match source {
            ItemSource::Source(name) => self
                .catalog
                .get_by_source_and_rarity(name, rarity)
                .await
                .map_err(RewardRollError::Catalog)?,
            ItemSource::Category(category) => {
                let all = self
                    .catalog
                    .get_by_category(category)
                    .await
                    .map_err(RewardRollError::Catalog)?;
                let matching: Vec<_> = all.iter().filter(|item| item.rarity == rarity).cloned().collect();
                if matching.is_empty() {
                    debug!(%category, %rarity, "No item of this rarity, widening to the category");
                    all
                } else {
                    matching
                }
            }
        };

        let item = candidates
            .choose(rng)
            .cloned()
            .ok_or_else(|| RewardRollError::NoCatalogItems(format!("{} at {}", source, rarity)))?;
        let quantity = match quantity {
            Some(q) => q,
            None => rng.gen_range(1..=self.tables.item_quantity_max(rarity)),
        };

        Ok(Reward::new(
            id,
            rarity,
            RewardPayload::Item {
                name: item.name,
                quantity,
                category: item.category,
                description: item.description,
            },
        )?)
    }

    async fn roll_monster(
        &self,
        id: RewardId,
        rarity: Rarity,
        overrides: &RollOverrides,
        level_min: u32,
        level_max: u32,
        rng: &mut (dyn RngCore + Send),
    ) -> Result<Reward, RewardRollError> {
        // defaults <- rarity criteria <- caller overrides
        let rarity_request = OptionsResolver::merge(
            &self.tables.default_request,
            &RollOverrides::from_filters(self.tables.criteria_for_rarity(rarity)),
        )?;
        let request = OptionsResolver::merge(&rarity_request, overrides)?;

        let monster = self.composer.compose(&request, rng).await?;

        let (low, high) = if level_min <= level_max {
            (level_min, level_max)
        } else {
            (level_max, level_min)
        };
        let level = rng.gen_range(low.max(1)..=high.max(1));

        Ok(Reward::new(id, rarity, RewardPayload::Monster { monster, level })?)
    }

    /// The configured minimal reward of the request's kind
    pub fn fallback(&self, id: RewardId, request: &RewardRequest) -> Reward {
        let fallbacks = &self.tables.fallbacks;
        let payload = match request {
            RewardRequest::Currency { .. } => RewardPayload::Currency {
                amount: fallbacks.currency_amount,
            },
            RewardRequest::Item { .. } => RewardPayload::Item {
                name: fallbacks.item_name.clone(),
                quantity: 1,
                category: fallbacks.item_category.clone(),
                description: fallbacks.item_description.clone(),
            },
            RewardRequest::Level { target, .. } => RewardPayload::Level {
                count: fallbacks.level_count,
                target: *target,
            },
            RewardRequest::Monster { .. } => RewardPayload::Monster {
                monster: MonsterDescriptor {
                    species: vec![SpeciesSlot {
                        family: fallbacks.monster_family,
                        identity: SpeciesIdentity::named(fallbacks.monster_species.clone()),
                    }],
                    types: vec![fallbacks.monster_type.clone()],
                    attribute: fallbacks.monster_attribute.clone(),
                },
                level: fallbacks.monster_level,
            },
        };

        // Fallbacks are checked when the tables are validated
        Reward::new_unchecked(id, Rarity::Common, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::outbound::CatalogItem;
    use crate::domain::value_objects::MonsterFamily;
    use crate::infrastructure::persistence::{InMemoryItemCatalog, InMemorySpeciesPool, SpeciesRecord};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn item(name: &str, category: &str, rarity: Rarity, source: &str) -> CatalogItem {
        CatalogItem {
            name: name.to_string(),
            description: String::new(),
            category: category.to_string(),
            rarity,
            source: source.to_string(),
        }
    }

    fn roller_with(items: Vec<CatalogItem>, species: Vec<SpeciesRecord>) -> RewardRoller {
        let tables = Arc::new(EngineTables::default());
        let composer = MonsterComposer::new(Arc::new(InMemorySpeciesPool::with_seed(species, 11)), tables.clone());
        RewardRoller::new(Arc::new(InMemoryItemCatalog::new(items)), composer, tables)
    }

    fn roller() -> RewardRoller {
        roller_with(
            vec![
                item("Oran Berry", "berries", Rarity::Common, "garden"),
                item("Sitrus Berry", "berries", Rarity::Rare, "garden"),
                item("Master Ball", "balls", Rarity::Legendary, "boss_fire"),
            ],
            vec![
                SpeciesRecord::new(MonsterFamily::Pokemon, "Mewtwo")
                    .with_trait("rarity", &["Legendary"])
                    .with_trait("stage", &["Doesn't Evolve"]),
                SpeciesRecord::new(MonsterFamily::Pokemon, "Caterpie")
                    .with_trait("rarity", &["Common"])
                    .with_trait("stage", &["Base Stage"]),
            ],
        )
    }

    #[tokio::test]
    async fn test_currency_amount_and_rarity() {
        let roller = roller();
        let mut rng = StdRng::seed_from_u64(1);

        let reward = roller
            .roll_reward(&RewardRequest::Currency { base: 100, multiplier: 1.5 }, &mut rng)
            .await;
        assert_eq!(reward.payload(), &RewardPayload::Currency { amount: 150 });
        assert_eq!(reward.rarity(), Rarity::Common);
        assert!(reward.id().as_str().starts_with("currency-"));

        let reward = roller
            .roll_reward(&RewardRequest::Currency { base: 0, multiplier: 3.0 }, &mut rng)
            .await;
        assert_eq!(reward.payload(), &RewardPayload::Currency { amount: 1 });

        let reward = roller
            .roll_reward(&RewardRequest::Currency { base: 5000, multiplier: 2.0 }, &mut rng)
            .await;
        assert_eq!(reward.rarity(), Rarity::Legendary);
    }

    #[tokio::test]
    async fn test_legendary_item_quantity_bounds() {
        let roller = roller();
        let mut rng = StdRng::seed_from_u64(2);
        let request = RewardRequest::Item {
            source: ItemSource::Source("boss_fire".to_string()),
            rarity: Some(Rarity::Legendary),
            quantity: None,
        };

        for _ in 0..100 {
            let reward = roller.try_roll_reward(&request, &mut rng).await.unwrap();
            match reward.payload() {
                RewardPayload::Item { name, quantity, .. } => {
                    assert_eq!(name, "Master Ball");
                    assert!((1..=2).contains(quantity));
                }
                other => panic!("expected item, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_category_widens_when_rarity_missing() {
        let roller = roller();
        let mut rng = StdRng::seed_from_u64(3);
        let request = RewardRequest::Item {
            source: ItemSource::Category("balls".to_string()),
            rarity: Some(Rarity::Common),
            quantity: Some(4),
        };

        let reward = roller.try_roll_reward(&request, &mut rng).await.unwrap();
        match reward.payload() {
            RewardPayload::Item { name, quantity, .. } => {
                assert_eq!(name, "Master Ball");
                assert_eq!(*quantity, 4);
            }
            other => panic!("expected item, got {:?}", other),
        }
        assert_eq!(reward.rarity(), Rarity::Common);
    }

    #[tokio::test]
    async fn test_empty_catalog_falls_back() {
        let roller = roller();
        let mut rng = StdRng::seed_from_u64(4);
        let request = RewardRequest::Item {
            source: ItemSource::Source("nowhere".to_string()),
            rarity: None,
            quantity: None,
        };

        let err = roller.try_roll_reward(&request, &mut rng).await.unwrap_err();
        assert!(matches!(err, RewardRollError::NoCatalogItems(_)));

        let reward = roller.roll_reward(&request, &mut rng).await;
        match reward.payload() {
            RewardPayload::Item { name, quantity, .. } => {
                assert_eq!(name, "Potion");
                assert_eq!(*quantity, 1);
            }
            other => panic!("expected item, got {:?}", other),
        }
        assert!(reward.validate().is_ok());
    }

    #[tokio::test]
    async fn test_level_rarity_from_count() {
        let roller = roller();
        let mut rng = StdRng::seed_from_u64(5);
        let reward = roller
            .roll_reward(
                &RewardRequest::Level {
                    count: 7,
                    target: LevelTarget::Monster,
                },
                &mut rng,
            )
            .await;
        assert_eq!(reward.rarity(), Rarity::Epic);
        assert_eq!(reward.kind(), RewardKind::Level);
    }

    #[tokio::test]
    async fn test_monster_follows_rarity_criteria() {
        let roller = roller();
        let mut rng = StdRng::seed_from_u64(6);
        let request = RewardRequest::Monster {
            rarity: Some(Rarity::Legendary),
            overrides: RollOverrides {
                include_families: Some(vec![MonsterFamily::Pokemon]),
                max_species: Some(1),
                ..Default::default()
            },
            level_min: 10,
            level_max: 12,
        };

        for _ in 0..10 {
            let reward = roller.try_roll_reward(&request, &mut rng).await.unwrap();
            match reward.payload() {
                RewardPayload::Monster { monster, level } => {
                    assert_eq!(monster.species_names(), vec!["Mewtwo"]);
                    assert!((10..=12).contains(level));
                }
                other => panic!("expected monster, got {:?}", other),
            }
            assert_eq!(reward.rarity(), Rarity::Legendary);
        }
    }

    #[tokio::test]
    async fn test_monster_miss_falls_back() {
        let roller = roller_with(Vec::new(), Vec::new());
        let mut rng = StdRng::seed_from_u64(7);
        let request = RewardRequest::Monster {
            rarity: None,
            overrides: RollOverrides::default(),
            level_min: 1,
            level_max: 3,
        };

        let reward = roller.roll_reward(&request, &mut rng).await;
        match reward.payload() {
            RewardPayload::Monster { monster, level } => {
                assert_eq!(monster.species_names(), vec!["Pikachu"]);
                assert_eq!(*level, 5);
                assert!(!monster.is_fusion());
            }
            other => panic!("expected monster, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_seeded_rolls_reproduce_ids() {
        let roller = roller();
        let request = RewardRequest::Item {
            source: ItemSource::Category("berries".to_string()),
            rarity: None,
            quantity: None,
        };

        let a = roller.roll_reward(&request, &mut StdRng::seed_from_u64(8)).await;
        let b = roller.roll_reward(&request, &mut StdRng::seed_from_u64(8)).await;
        assert_eq!(a, b);
    }

    #[test]
    fn test_request_json_shape() {
        let request: RewardRequest = serde_json::from_value(serde_json::json!({
            "kind": "item",
            "source": { "category": "berries" }
        }))
        .unwrap();
        assert_eq!(
            request,
            RewardRequest::Item {
                source: ItemSource::Category("berries".to_string()),
                rarity: None,
                quantity: None,
            }
        );

        let request: RewardRequest = serde_json::from_value(serde_json::json!({
            "kind": "currency",
            "base": 200
        }))
        .unwrap();
        assert_eq!(request, RewardRequest::Currency { base: 200, multiplier: 1.0 });
    }
}
