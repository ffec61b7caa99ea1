//! In-memory adapters
//!
//! Used by tests and by engines that load their species and item data at
//! startup. All state sits behind `tokio::sync` locks.

use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::Result;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::application::dto::ParticipantAllocation;
use crate::application::ports::outbound::{
    BossEventRepositoryPort, CatalogItem, InventoryLedgerPort, ItemCatalogPort, LedgerError, SpeciesPoolPort,
};
use crate::domain::entities::{BossEvent, Reward, SpeciesIdentity};
use crate::domain::value_objects::{BossId, FilterCriteria, MonsterFamily, ParticipantId, Rarity, RewardId};

/// One species in the pool, with the trait labels filters match against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesRecord {
    pub family: MonsterFamily,
    pub name: String,
    #[serde(default)]
    pub traits: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl SpeciesRecord {
    pub fn new(family: MonsterFamily, name: impl Into<String>) -> Self {
        Self {
            family,
            name: name.into(),
            traits: BTreeMap::new(),
            data: serde_json::Value::Null,
        }
    }

    pub fn with_trait(mut self, key: impl Into<String>, values: &[&str]) -> Self {
        self.traits
            .insert(key.into(), values.iter().map(|v| v.to_string()).collect());
        self
    }

    /// Every filter key must share at least one label with the record's trait
    pub fn matches(&self, filters: &FilterCriteria) -> bool {
        filters.iter().all(|(key, wanted)| {
            wanted.is_empty()
                || self
                    .traits
                    .get(key)
                    .is_some_and(|have| have.iter().any(|label| wanted.contains(label)))
        })
    }
}

pub struct InMemorySpeciesPool {
    records: Vec<SpeciesRecord>,
    rng: Mutex<StdRng>,
}

impl InMemorySpeciesPool {
    pub fn new(records: Vec<SpeciesRecord>) -> Self {
        Self {
            records,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Pool whose random picks repeat across runs
    pub fn with_seed(records: Vec<SpeciesRecord>, seed: u64) -> Self {
        Self {
            records,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl SpeciesPoolPort for InMemorySpeciesPool {
    async fn get_random(&self, family: MonsterFamily, filters: &FilterCriteria) -> Result<Option<SpeciesIdentity>> {
        let candidates: Vec<&SpeciesRecord> = self
            .records
            .iter()
            .filter(|r| r.family == family && r.matches(filters))
            .collect();

        let mut rng = self.rng.lock().await;
        let picked = candidates.choose(&mut *rng).map(|r| SpeciesIdentity {
            name: r.name.clone(),
            data: r.data.clone(),
        });

        debug!(%family, candidates = candidates.len(), found = picked.is_some(), "Species pool lookup");
        Ok(picked)
    }
}

pub struct InMemoryItemCatalog {
    items: Vec<CatalogItem>,
}

impl InMemoryItemCatalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl ItemCatalogPort for InMemoryItemCatalog {
    async fn get_by_source_and_rarity(&self, source: &str, rarity: Rarity) -> Result<Vec<CatalogItem>> {
        Ok(self
            .items
            .iter()
            .filter(|item| item.source == source && item.rarity == rarity)
            .cloned()
            .collect())
    }

    async fn get_by_category(&self, category: &str) -> Result<Vec<CatalogItem>> {
        Ok(self
            .items
            .iter()
            .filter(|item| item.category == category)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct LedgerState {
    claimed: HashSet<RewardId>,
    credited: HashMap<ParticipantId, Vec<Reward>>,
}

#[derive(Default)]
pub struct InMemoryInventoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryInventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn rewards_for(&self, participant: ParticipantId) -> Vec<Reward> {
        let state = self.state.lock().await;
        state.credited.get(&participant).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl InventoryLedgerPort for InMemoryInventoryLedger {
    async fn credit(&self, participant: ParticipantId, reward: &Reward) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        if !state.claimed.insert(reward.id().clone()) {
            return Err(LedgerError::AlreadyClaimed(reward.id().clone()));
        }
        state.credited.entry(participant).or_default().push(reward.clone());
        Ok(())
    }

    async fn is_claimed(&self, reward_id: &RewardId) -> Result<bool, LedgerError> {
        Ok(self.state.lock().await.claimed.contains(reward_id))
    }
}

#[derive(Default)]
pub struct InMemoryBossEventRepository {
    events: RwLock<HashMap<BossId, BossEvent>>,
    allocations: RwLock<HashMap<BossId, Vec<ParticipantAllocation>>>,
}

impl InMemoryBossEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BossEventRepositoryPort for InMemoryBossEventRepository {
    async fn create(&self, event: &BossEvent) -> Result<()> {
        let mut events = self.events.write().await;
        if events.contains_key(&event.id) {
            anyhow::bail!("Boss event {} already exists", event.id);
        }
        events.insert(event.id, event.clone());
        Ok(())
    }

    async fn get(&self, id: BossId) -> Result<Option<BossEvent>> {
        Ok(self.events.read().await.get(&id).cloned())
    }

    async fn compare_and_swap(&self, event: &BossEvent, expected_version: u64) -> Result<bool> {
        let mut events = self.events.write().await;
        let Some(stored) = events.get_mut(&event.id) else {
            anyhow::bail!("Boss event {} does not exist", event.id);
        };
        if stored.version != expected_version {
            return Ok(false);
        }

        let mut updated = event.clone();
        updated.version = expected_version + 1;
        *stored = updated;
        Ok(true)
    }

    async fn save_allocations(&self, id: BossId, allocations: &[ParticipantAllocation]) -> Result<bool> {
        let mut stored = self.allocations.write().await;
        if stored.contains_key(&id) {
            return Ok(false);
        }
        stored.insert(id, allocations.to_vec());
        Ok(true)
    }

    async fn has_allocations(&self, id: BossId) -> Result<bool> {
        Ok(self.allocations.read().await.contains_key(&id))
    }

    async fn get_allocation(&self, id: BossId, participant: ParticipantId) -> Result<Option<ParticipantAllocation>> {
        Ok(self
            .allocations
            .read()
            .await
            .get(&id)
            .and_then(|all| all.iter().find(|a| a.participant == participant).cloned()))
    }
}
