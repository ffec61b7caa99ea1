//! Shared engine state - services wired to their adapters

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::application::ports::outbound::{
    BossEventRepositoryPort, CatalogItem, InventoryLedgerPort, ItemCatalogPort, SpeciesPoolPort,
};
use crate::application::services::{
    ActivityRewardService, BossBattleService, BossBattleServiceImpl, ContributionAllocator, MonsterComposer,
    RewardClaimService, RewardClaimServiceImpl, RewardRoller,
};
use crate::domain::value_objects::EngineTables;
use crate::infrastructure::config::EngineConfig;
use crate::infrastructure::persistence::{
    InMemoryBossEventRepository, InMemoryItemCatalog, InMemorySpeciesPool, SpeciesRecord, SqliteInventoryLedger,
};

/// The outbound ports an engine runs against
pub struct EngineAdapters {
    pub species_pool: Arc<dyn SpeciesPoolPort>,
    pub item_catalog: Arc<dyn ItemCatalogPort>,
    pub ledger: Arc<dyn InventoryLedgerPort>,
    pub boss_events: Arc<dyn BossEventRepositoryPort>,
}

pub struct EngineState {
    pub config: EngineConfig,
    pub tables: Arc<EngineTables>,
    pub composer: MonsterComposer,
    pub reward_roller: RewardRoller,
    pub activity_service: ActivityRewardService,
    pub claim_service: Arc<dyn RewardClaimService>,
    pub boss_service: Arc<dyn BossBattleService>,
}

impl EngineState {
    /// In-memory species, items and boss events; SQLite inventory ledger
    pub async fn new(config: EngineConfig, species: Vec<SpeciesRecord>, items: Vec<CatalogItem>) -> Result<Self> {
        let url = &config.ledger_database_url;
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid ledger database URL {}", url))?
            .create_if_missing(true);
        // Every connection to an in-memory database opens a fresh one
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("Failed to open the ledger database")?;
        let ledger = SqliteInventoryLedger::new(pool)
            .await
            .context("Failed to prepare the ledger schema")?;

        let adapters = EngineAdapters {
            species_pool: Arc::new(InMemorySpeciesPool::new(species)),
            item_catalog: Arc::new(InMemoryItemCatalog::new(items)),
            ledger: Arc::new(ledger),
            boss_events: Arc::new(InMemoryBossEventRepository::new()),
        };
        Ok(Self::from_adapters(config, adapters))
    }

    pub fn from_adapters(config: EngineConfig, adapters: EngineAdapters) -> Self {
        let tables = Arc::new(config.tables.clone());

        let composer = MonsterComposer::new(adapters.species_pool, tables.clone());
        let reward_roller = RewardRoller::new(adapters.item_catalog, composer.clone(), tables.clone());
        let activity_service = ActivityRewardService::new(reward_roller.clone(), tables.clone());
        let claim_service: Arc<dyn RewardClaimService> = Arc::new(RewardClaimServiceImpl::new(adapters.ledger));
        let allocator = ContributionAllocator::new(reward_roller.clone(), tables.clone());
        let boss_service: Arc<dyn BossBattleService> = Arc::new(BossBattleServiceImpl::new(
            adapters.boss_events,
            allocator,
            claim_service.clone(),
            config.max_event_retries,
        ));

        tracing::info!("Engine state initialized");
        Self {
            config,
            tables,
            composer,
            reward_roller,
            activity_service,
            claim_service,
            boss_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::ClaimStatus;
    use crate::domain::value_objects::{MonsterFamily, ParticipantId, Rarity, RollRequest};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[tokio::test]
    async fn test_wired_engine_runs_a_boss() {
        let species = vec![SpeciesRecord::new(MonsterFamily::Pokemon, "Eevee")
            .with_trait("rarity", &["Common", "Rare", "Very Rare"])
            .with_trait("stage", &["Base Stage"])];
        let items = vec![CatalogItem {
            name: "Fire Stone".to_string(),
            description: String::new(),
            category: "evolution".to_string(),
            rarity: Rarity::Epic,
            source: "boss_fire".to_string(),
        }];
        let state = EngineState::new(EngineConfig::default(), species, items).await.unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let request = RollRequest {
            include_families: vec![MonsterFamily::Pokemon],
            max_species: 1,
            ..Default::default()
        };
        let monster = state.composer.compose(&request, &mut rng).await.unwrap();
        assert_eq!(monster.species_names(), vec!["Eevee"]);

        let boss = state.boss_service.create_boss("Blaze Titan", "fire", 50).await.unwrap();
        let hero = ParticipantId::new();
        let report = state.boss_service.deal_damage(boss.id, hero, 50, &mut rng).await.unwrap();
        assert!(report.defeated);

        let outcomes = state.boss_service.claim_rewards(boss.id, hero).await.unwrap();
        assert!(!outcomes.is_empty());
        assert!(outcomes.iter().all(|o| o.status == ClaimStatus::Claimed));

        let again = state.boss_service.claim_rewards(boss.id, hero).await.unwrap();
        assert!(again.iter().all(|o| o.status == ClaimStatus::AlreadyClaimed));
    }
}
