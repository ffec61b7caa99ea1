//! Boss Battle Service - shared boss events, damage and reward allocation
//!
//! Every write is load, mutate, compare-and-swap on the event version, and
//! retry on conflict. The hit that empties the health pool commits the defeat
//! in the same swap, so no damage record can land after the snapshot that
//! allocation is computed from. Allocation itself is claimed with a second
//! swap. The repository keeps the first stored allocation only, so a claim
//! whose save failed is recomputed by the next call and a boss still ends up
//! with exactly one allocation.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use rand::RngCore;
use tracing::{debug, error, info, instrument, warn};

use super::contribution_allocator::ContributionAllocator;
use super::reward_claim_service::{ClaimError, RewardClaimService};
use crate::application::dto::{ClaimOutcome, ClaimStatus, DamageReport, ParticipantAllocation};
use crate::application::ports::outbound::BossEventRepositoryPort;
use crate::domain::entities::{BossError, BossEvent, DamageOutcome, LeaderboardEntry};
use crate::domain::value_objects::{BossId, ParticipantId};

#[derive(Debug, thiserror::Error)]
pub enum BossBattleError {
    #[error("Boss {0} not found")]
    NotFound(BossId),
    #[error(transparent)]
    Boss(#[from] BossError),
    #[error("Boss {0} is still contended after {1} attempts")]
    Contention(BossId, u32),
    #[error("Participant {participant} has no rewards for boss {boss}")]
    NoRewards { boss: BossId, participant: ParticipantId },
    #[error(transparent)]
    Claim(#[from] ClaimError),
    #[error("Repository error: {0}")]
    Repository(#[from] anyhow::Error),
}

#[async_trait]
pub trait BossBattleService: Send + Sync {
    async fn create_boss(&self, name: &str, boss_type: &str, max_health: u64) -> Result<BossEvent, BossBattleError>;

    async fn get_boss(&self, id: BossId) -> Result<BossEvent, BossBattleError>;

    /// Record one hit; the hit that defeats the boss also runs allocation
    async fn deal_damage(
        &self,
        id: BossId,
        participant: ParticipantId,
        amount: u64,
        rng: &mut (dyn RngCore + Send),
    ) -> Result<DamageReport, BossBattleError>;

    /// Allocate rewards for a defeated boss; fails once allocations are stored
    async fn allocate_rewards(
        &self,
        id: BossId,
        rng: &mut (dyn RngCore + Send),
    ) -> Result<Vec<ParticipantAllocation>, BossBattleError>;

    async fn leaderboard(&self, id: BossId, limit: usize) -> Result<Vec<LeaderboardEntry>, BossBattleError>;

    async fn standing(&self, id: BossId, participant: ParticipantId) -> Result<Option<LeaderboardEntry>, BossBattleError>;

    /// Credit every stored reward of a participant, reporting each one
    async fn claim_rewards(&self, id: BossId, participant: ParticipantId) -> Result<Vec<ClaimOutcome>, BossBattleError>;
}

#[derive(Clone)]
pub struct BossBattleServiceImpl {
    repository: Arc<dyn BossEventRepositoryPort>,
    allocator: ContributionAllocator,
    claims: Arc<dyn RewardClaimService>,
    max_retries: u32,
}

impl BossBattleServiceImpl {
    pub fn new(
        repository: Arc<dyn BossEventRepositoryPort>,
        allocator: ContributionAllocator,
        claims: Arc<dyn RewardClaimService>,
        max_retries: u32,
    ) -> Self {
        Self {
            repository,
            allocator,
            claims,
            max_retries: max_retries.max(1),
        }
    }

    async fn load(&self, id: BossId) -> Result<BossEvent, BossBattleError> {
        self.repository
            .get(id)
            .await
            .context("Failed to load boss event")?
            .ok_or(BossBattleError::NotFound(id))
    }
}

#[async_trait]
impl BossBattleService for BossBattleServiceImpl {
    #[instrument(skip(self))]
    async fn create_boss(&self, name: &str, boss_type: &str, max_health: u64) -> Result<BossEvent, BossBattleError> {
        if max_health == 0 {
            return Err(BossError::InvalidHealth.into());
        }

        let event = BossEvent::new(name, boss_type, max_health);
        self.repository
            .create(&event)
            .await
            .context("Failed to create boss event")?;

        info!(boss_id = %event.id, %name, %boss_type, max_health, "Created boss event");
        Ok(event)
    }

    #[instrument(skip(self))]
    async fn get_boss(&self, id: BossId) -> Result<BossEvent, BossBattleError> {
        self.load(id).await
    }

    #[instrument(skip(self, rng))]
    async fn deal_damage(
        &self,
        id: BossId,
        participant: ParticipantId,
        amount: u64,
        rng: &mut (dyn RngCore + Send),
    ) -> Result<DamageReport, BossBattleError> {
        if amount == 0 {
            return Err(BossError::InvalidDamage.into());
        }

        for attempt in 1..=self.max_retries {
            let mut event = self.load(id).await?;
            let expected = event.version;
            let outcome = event.apply_damage(participant, amount, Utc::now())?;

            let swapped = self
                .repository
                .compare_and_swap(&event, expected)
                .await
                .context("Failed to store damage")?;
            if !swapped {
                debug!(attempt, "Version conflict recording damage, retrying");
                continue;
            }

            let defeated = outcome == DamageOutcome::Defeated;
            let allocations = if defeated {
                info!(boss_id = %id, %participant, "Boss defeated");
                match self.allocate_rewards(id, rng).await {
                    Ok(allocations) => Some(allocations),
                    Err(BossBattleError::Boss(BossError::AlreadyAllocated(_))) => None,
                    Err(e) => {
                        error!(boss_id = %id, error = %e, "Allocation after defeat failed");
                        return Err(e);
                    }
                }
            } else {
                None
            };

            debug!(remaining_health = event.current_health, "Damage recorded");
            return Ok(DamageReport {
                boss_id: id,
                participant,
                damage: amount,
                remaining_health: event.current_health,
                defeated,
                allocations,
            });
        }

        warn!(boss_id = %id, retries = self.max_retries, "Gave up recording damage");
        Err(BossBattleError::Contention(id, self.max_retries))
    }

    #[instrument(skip(self, rng))]
    async fn allocate_rewards(
        &self,
        id: BossId,
        rng: &mut (dyn RngCore + Send),
    ) -> Result<Vec<ParticipantAllocation>, BossBattleError> {
        for attempt in 1..=self.max_retries {
            let mut event = self.load(id).await?;

            let records = if event.rewards_allocated() {
                let stored = self
                    .repository
                    .has_allocations(id)
                    .await
                    .context("Failed to check stored allocations")?;
                if stored {
                    return Err(BossError::AlreadyAllocated(id).into());
                }
                // Taken by a writer whose save never landed; the contributions are final
                warn!(boss_id = %id, "Allocation was taken but never stored, recomputing");
                event.contributions.clone()
            } else {
                let expected = event.version;
                let records = event.take_allocation_snapshot()?;
                let swapped = self
                    .repository
                    .compare_and_swap(&event, expected)
                    .await
                    .context("Failed to mark allocation")?;
                if !swapped {
                    debug!(attempt, "Version conflict marking allocation, retrying");
                    continue;
                }
                records
            };

            let allocations = self.allocator.allocate(id, &event.boss_type, &records, rng).await;
            let saved = self
                .repository
                .save_allocations(id, &allocations)
                .await
                .context("Failed to store allocations")?;
            if !saved {
                return Err(BossError::AlreadyAllocated(id).into());
            }
            return Ok(allocations);
        }

        Err(BossBattleError::Contention(id, self.max_retries))
    }

    #[instrument(skip(self))]
    async fn leaderboard(&self, id: BossId, limit: usize) -> Result<Vec<LeaderboardEntry>, BossBattleError> {
        Ok(self.load(id).await?.leaderboard(limit))
    }

    #[instrument(skip(self))]
    async fn standing(&self, id: BossId, participant: ParticipantId) -> Result<Option<LeaderboardEntry>, BossBattleError> {
        Ok(self.load(id).await?.standing(participant))
    }

    #[instrument(skip(self))]
    async fn claim_rewards(&self, id: BossId, participant: ParticipantId) -> Result<Vec<ClaimOutcome>, BossBattleError> {
        let allocation = self
            .repository
            .get_allocation(id, participant)
            .await
            .context("Failed to load allocation")?;

        let Some(allocation) = allocation else {
            // Distinguish an unknown boss from a participant without rewards
            self.load(id).await?;
            return Err(BossBattleError::NoRewards { boss: id, participant });
        };

        let mut outcomes = Vec::with_capacity(allocation.rewards.len());
        for reward in &allocation.rewards {
            let status = match self.claims.claim(participant, reward).await {
                Ok(()) => ClaimStatus::Claimed,
                Err(ClaimError::AlreadyClaimed(_)) => ClaimStatus::AlreadyClaimed,
                Err(e) => return Err(e.into()),
            };
            outcomes.push(ClaimOutcome {
                reward_id: reward.id().clone(),
                status,
            });
        }

        info!(boss_id = %id, %participant, rewards = outcomes.len(), "Processed boss reward claims");
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::outbound::CatalogItem;
    use crate::application::services::{MonsterComposer, RewardClaimServiceImpl, RewardRoller};
    use crate::domain::value_objects::{EngineTables, MonsterFamily, Rarity};
    use crate::infrastructure::persistence::{
        InMemoryBossEventRepository, InMemoryInventoryLedger, InMemoryItemCatalog, InMemorySpeciesPool,
        SpeciesRecord,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn service_with(repository: Arc<dyn BossEventRepositoryPort>, max_retries: u32) -> BossBattleServiceImpl {
        let tables = Arc::new(EngineTables::default());
        let species = vec![
            SpeciesRecord::new(MonsterFamily::Pokemon, "Vulpix")
                .with_trait("rarity", &["Common", "Uncommon", "Rare", "Very Rare"])
                .with_trait("stage", &["Base Stage"]),
        ];
        let items = Rarity::ALL
            .into_iter()
            .map(|rarity| CatalogItem {
                name: format!("Ember Shard ({})", rarity),
                description: String::new(),
                category: "materials".to_string(),
                rarity,
                source: "boss_fire".to_string(),
            })
            .collect();

        let composer = MonsterComposer::new(Arc::new(InMemorySpeciesPool::with_seed(species, 5)), tables.clone());
        let roller = RewardRoller::new(Arc::new(InMemoryItemCatalog::new(items)), composer, tables.clone());
        let allocator = ContributionAllocator::new(roller, tables);
        let claims = Arc::new(RewardClaimServiceImpl::new(Arc::new(InMemoryInventoryLedger::new())));
        BossBattleServiceImpl::new(repository, allocator, claims, max_retries)
    }

    fn service() -> BossBattleServiceImpl {
        service_with(Arc::new(InMemoryBossEventRepository::new()), 5)
    }

    /// Repository whose swaps always lose the race
    struct ContendedRepository {
        inner: InMemoryBossEventRepository,
    }

    #[async_trait]
    impl BossEventRepositoryPort for ContendedRepository {
        async fn create(&self, event: &BossEvent) -> anyhow::Result<()> {
            self.inner.create(event).await
        }

        async fn get(&self, id: BossId) -> anyhow::Result<Option<BossEvent>> {
            self.inner.get(id).await
        }

        async fn compare_and_swap(&self, _event: &BossEvent, _expected_version: u64) -> anyhow::Result<bool> {
            Ok(false)
        }

        async fn save_allocations(&self, id: BossId, allocations: &[ParticipantAllocation]) -> anyhow::Result<bool> {
            self.inner.save_allocations(id, allocations).await
        }

        async fn has_allocations(&self, id: BossId) -> anyhow::Result<bool> {
            self.inner.has_allocations(id).await
        }

        async fn get_allocation(
            &self,
            id: BossId,
            participant: ParticipantId,
        ) -> anyhow::Result<Option<ParticipantAllocation>> {
            self.inner.get_allocation(id, participant).await
        }
    }

    /// Repository whose first allocation save fails
    struct FlakyAllocationRepository {
        inner: InMemoryBossEventRepository,
        fail_next_save: AtomicBool,
    }

    #[async_trait]
    impl BossEventRepositoryPort for FlakyAllocationRepository {
        async fn create(&self, event: &BossEvent) -> anyhow::Result<()> {
            self.inner.create(event).await
        }

        async fn get(&self, id: BossId) -> anyhow::Result<Option<BossEvent>> {
            self.inner.get(id).await
        }

        async fn compare_and_swap(&self, event: &BossEvent, expected_version: u64) -> anyhow::Result<bool> {
            self.inner.compare_and_swap(event, expected_version).await
        }

        async fn save_allocations(&self, id: BossId, allocations: &[ParticipantAllocation]) -> anyhow::Result<bool> {
            if self.fail_next_save.swap(false, Ordering::SeqCst) {
                anyhow::bail!("disk full");
            }
            self.inner.save_allocations(id, allocations).await
        }

        async fn has_allocations(&self, id: BossId) -> anyhow::Result<bool> {
            self.inner.has_allocations(id).await
        }

        async fn get_allocation(
            &self,
            id: BossId,
            participant: ParticipantId,
        ) -> anyhow::Result<Option<ParticipantAllocation>> {
            self.inner.get_allocation(id, participant).await
        }
    }

    #[tokio::test]
    async fn test_damage_defeat_and_allocation() {
        let service = service();
        let boss = service.create_boss("Blaze Titan", "fire", 100).await.unwrap();
        let (a, b) = (ParticipantId::new(), ParticipantId::new());
        let mut rng = StdRng::seed_from_u64(1);

        let report = service.deal_damage(boss.id, a, 60, &mut rng).await.unwrap();
        assert_eq!(report.remaining_health, 40);
        assert!(!report.defeated);
        assert!(report.allocations.is_none());

        // Overkill is kept raw for shares
        let report = service.deal_damage(boss.id, b, 90, &mut rng).await.unwrap();
        assert!(report.defeated);
        assert_eq!(report.remaining_health, 0);
        let allocations = report.allocations.unwrap();
        assert_eq!(allocations.len(), 2);
        assert_eq!(allocations[0].participant, b);
        assert_eq!(allocations[0].raw_amount, 90);

        let late = service.deal_damage(boss.id, a, 5, &mut rng).await;
        assert!(matches!(late, Err(BossBattleError::Boss(BossError::AlreadyDefeated(_)))));

        let again = service.allocate_rewards(boss.id, &mut rng).await;
        assert!(matches!(again, Err(BossBattleError::Boss(BossError::AlreadyAllocated(_)))));
    }

    #[tokio::test]
    async fn test_allocate_before_defeat_rejected() {
        let service = service();
        let boss = service.create_boss("Tide Warden", "water", 50).await.unwrap();
        let mut rng = StdRng::seed_from_u64(2);

        let result = service.allocate_rewards(boss.id, &mut rng).await;
        assert!(matches!(result, Err(BossBattleError::Boss(BossError::NotDefeated(_)))));
    }

    #[tokio::test]
    async fn test_invalid_inputs() {
        let service = service();
        let mut rng = StdRng::seed_from_u64(3);

        assert!(matches!(
            service.create_boss("Nobody", "normal", 0).await,
            Err(BossBattleError::Boss(BossError::InvalidHealth))
        ));

        let boss = service.create_boss("Somebody", "normal", 10).await.unwrap();
        assert!(matches!(
            service.deal_damage(boss.id, ParticipantId::new(), 0, &mut rng).await,
            Err(BossBattleError::Boss(BossError::InvalidDamage))
        ));
        assert!(matches!(
            service.deal_damage(BossId::new(), ParticipantId::new(), 1, &mut rng).await,
            Err(BossBattleError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_leaderboard_and_standing() {
        let service = service();
        let boss = service.create_boss("Volt Colossus", "electric", 1000).await.unwrap();
        let (a, b) = (ParticipantId::new(), ParticipantId::new());
        let mut rng = StdRng::seed_from_u64(4);

        for (participant, amount) in [(a, 10), (b, 50), (a, 20)] {
            service.deal_damage(boss.id, participant, amount, &mut rng).await.unwrap();
        }

        let board = service.leaderboard(boss.id, 10).await.unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].participant, b);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[1].total_damage, 30);
        assert_eq!(board[1].attack_count, 2);

        let standing = service.standing(boss.id, a).await.unwrap().unwrap();
        assert_eq!(standing.rank, 2);
        assert!(service.standing(boss.id, ParticipantId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_claims_are_idempotent() {
        let service = service();
        let boss = service.create_boss("Blaze Titan", "fire", 10).await.unwrap();
        let winner = ParticipantId::new();
        let mut rng = StdRng::seed_from_u64(5);
        service.deal_damage(boss.id, winner, 10, &mut rng).await.unwrap();

        let first = service.claim_rewards(boss.id, winner).await.unwrap();
        assert_eq!(first.len(), 3);
        assert!(first.iter().all(|o| o.status == ClaimStatus::Claimed));

        let second = service.claim_rewards(boss.id, winner).await.unwrap();
        assert!(second.iter().all(|o| o.status == ClaimStatus::AlreadyClaimed));

        let stranger = service.claim_rewards(boss.id, ParticipantId::new()).await;
        assert!(matches!(stranger, Err(BossBattleError::NoRewards { .. })));
    }

    #[tokio::test]
    async fn test_failed_allocation_save_is_recoverable() {
        let repository = Arc::new(FlakyAllocationRepository {
            inner: InMemoryBossEventRepository::new(),
            fail_next_save: AtomicBool::new(true),
        });
        let service = service_with(repository, 5);
        let boss = service.create_boss("Blaze Titan", "fire", 10).await.unwrap();
        let (a, b) = (ParticipantId::new(), ParticipantId::new());
        let mut rng = StdRng::seed_from_u64(7);

        service.deal_damage(boss.id, a, 4, &mut rng).await.unwrap();
        let defeat = service.deal_damage(boss.id, b, 6, &mut rng).await;
        assert!(matches!(defeat, Err(BossBattleError::Repository(_))));
        let event = service.get_boss(boss.id).await.unwrap();
        assert!(event.is_defeated());
        assert!(event.rewards_allocated());

        let allocations = service.allocate_rewards(boss.id, &mut rng).await.unwrap();
        assert_eq!(allocations.len(), 2);
        assert_eq!(allocations[0].participant, b);

        let again = service.allocate_rewards(boss.id, &mut rng).await;
        assert!(matches!(again, Err(BossBattleError::Boss(BossError::AlreadyAllocated(_)))));

        let claimed = service.claim_rewards(boss.id, a).await.unwrap();
        assert!(!claimed.is_empty());
        assert!(claimed.iter().all(|o| o.status == ClaimStatus::Claimed));
    }

    #[tokio::test]
    async fn test_huge_hits_do_not_overflow() {
        let service = service();
        let boss = service.create_boss("Eternal Titan", "normal", u64::MAX).await.unwrap();
        let (a, b) = (ParticipantId::new(), ParticipantId::new());
        let mut rng = StdRng::seed_from_u64(8);

        service.deal_damage(boss.id, a, u64::MAX - 1, &mut rng).await.unwrap();
        let report = service.deal_damage(boss.id, b, u64::MAX, &mut rng).await.unwrap();
        assert!(report.defeated);
        assert_eq!(report.allocations.map(|a| a.len()), Some(2));

        let board = service.leaderboard(boss.id, 10).await.unwrap();
        assert_eq!(board[0].participant, b);
    }

    #[tokio::test]
    async fn test_contention_gives_up() {
        let repository = Arc::new(ContendedRepository {
            inner: InMemoryBossEventRepository::new(),
        });
        let service = service_with(repository, 3);
        let boss = service.create_boss("Stone Golem", "normal", 10).await.unwrap();
        let mut rng = StdRng::seed_from_u64(6);

        let result = service.deal_damage(boss.id, ParticipantId::new(), 1, &mut rng).await;
        assert!(matches!(result, Err(BossBattleError::Contention(_, 3))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_hits_defeat_once() {
        let service = Arc::new(service_with(Arc::new(InMemoryBossEventRepository::new()), 200));
        let boss = service.create_boss("Hive Queen", "grass", 100).await.unwrap();

        let handles: Vec<_> = (0..20u64)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    let mut rng = StdRng::seed_from_u64(i);
                    service.deal_damage(boss.id, ParticipantId::new(), 10, &mut rng).await
                })
            })
            .collect();

        let mut landed = 0;
        let mut defeats = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(report) => {
                    landed += 1;
                    if report.defeated {
                        defeats += 1;
                        assert_eq!(report.allocations.map(|a| a.len()), Some(10));
                    }
                }
                Err(e) => assert!(matches!(e, BossBattleError::Boss(BossError::AlreadyDefeated(_)))),
            }
        }

        assert_eq!(landed, 10);
        assert_eq!(defeats, 1);
        let event = service.get_boss(boss.id).await.unwrap();
        assert_eq!(event.total_damage(), 100);
        assert!(event.rewards_allocated());
    }
}
