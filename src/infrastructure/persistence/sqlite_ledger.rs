use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::application::ports::outbound::{InventoryLedgerPort, LedgerError};
use crate::domain::entities::Reward;
use crate::domain::value_objects::{ParticipantId, RewardId};

/// Inventory ledger keyed on reward id; a second credit of the same id is ignored
pub struct SqliteInventoryLedger {
    pool: SqlitePool,
}

impl SqliteInventoryLedger {
    pub async fn new(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS reward_claims (
                reward_id TEXT PRIMARY KEY,
                participant_id TEXT NOT NULL,
                reward TEXT NOT NULL,
                claimed_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
        "#).execute(&pool).await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_reward_claims_participant ON reward_claims (participant_id)")
            .execute(&pool)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Rewards credited to a participant, oldest first
    pub async fn rewards_for(&self, participant: ParticipantId) -> Result<Vec<Reward>, LedgerError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT reward FROM reward_claims WHERE participant_id = ? ORDER BY claimed_at, rowid")
                .bind(participant.to_string())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| LedgerError::Storage(e.to_string()))?;

        rows.into_iter()
            .map(|(json,)| serde_json::from_str(&json).map_err(|e| LedgerError::Storage(e.to_string())))
            .collect()
    }
}

#[async_trait]
impl InventoryLedgerPort for SqliteInventoryLedger {
    async fn credit(&self, participant: ParticipantId, reward: &Reward) -> Result<(), LedgerError> {
        let json = serde_json::to_string(reward).map_err(|e| LedgerError::Storage(e.to_string()))?;

        let result = sqlx::query("INSERT OR IGNORE INTO reward_claims (reward_id, participant_id, reward) VALUES (?, ?, ?)")
            .bind(reward.id().as_str())
            .bind(participant.to_string())
            .bind(json)
            .execute(&self.pool)
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::AlreadyClaimed(reward.id().clone()));
        }
        Ok(())
    }

    async fn is_claimed(&self, reward_id: &RewardId) -> Result<bool, LedgerError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reward_claims WHERE reward_id = ?")
            .bind(reward_id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        Ok(count > 0)
    }
}
