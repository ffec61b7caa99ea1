//! Boss event repository port
//!
//! Writes go through `compare_and_swap` so that a damage record and the
//! defeat it causes commit together, and allocation is taken by exactly one
//! writer.

use anyhow::Result;
use async_trait::async_trait;

use crate::application::dto::ParticipantAllocation;
use crate::domain::entities::BossEvent;
use crate::domain::value_objects::{BossId, ParticipantId};

#[async_trait]
pub trait BossEventRepositoryPort: Send + Sync {
    async fn create(&self, event: &BossEvent) -> Result<()>;

    async fn get(&self, id: BossId) -> Result<Option<BossEvent>>;

    /// Stores `event` with version `expected_version + 1` if the stored
    /// version still equals `expected_version`; returns whether it did
    async fn compare_and_swap(&self, event: &BossEvent, expected_version: u64) -> Result<bool>;

    /// Stores the allocations of a boss unless some are already stored;
    /// returns whether it stored them
    async fn save_allocations(&self, id: BossId, allocations: &[ParticipantAllocation]) -> Result<bool>;

    async fn has_allocations(&self, id: BossId) -> Result<bool>;

    async fn get_allocation(&self, id: BossId, participant: ParticipantId) -> Result<Option<ParticipantAllocation>>;
}
