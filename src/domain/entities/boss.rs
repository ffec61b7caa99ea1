//! Boss event entity - a shared health pool that participants whittle down
//!
//! State machine: `Active -> Defeated`. The damage that empties the health
//! pool performs the transition; allocation may then be taken exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{BossId, ParticipantId};

/// One damage record, kept raw (overkill included)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionRecord {
    pub participant: ParticipantId,
    pub raw_amount: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BossState {
    Active,
    Defeated {
        defeated_at: DateTime<Utc>,
        rewards_allocated: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    Damaged { remaining_health: u64 },
    /// This hit emptied the health pool
    Defeated,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BossError {
    #[error("Boss {0} is already defeated")]
    AlreadyDefeated(BossId),
    #[error("Boss {0} is still active")]
    NotDefeated(BossId),
    #[error("Rewards for boss {0} were already allocated")]
    AlreadyAllocated(BossId),
    #[error("Damage must be positive")]
    InvalidDamage,
    #[error("Boss health must be positive")]
    InvalidHealth,
}

/// Aggregated damage for one participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantTotal {
    pub participant: ParticipantId,
    pub total_damage: u64,
    pub attack_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub participant: ParticipantId,
    pub total_damage: u64,
    pub attack_count: u32,
    pub share_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossEvent {
    pub id: BossId,
    pub name: String,
    /// Picks the item source and monster types of the rewards
    pub boss_type: String,
    pub max_health: u64,
    pub current_health: u64,
    pub contributions: Vec<ContributionRecord>,
    pub state: BossState,
    /// Bumped by the repository on every successful swap
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl BossEvent {
    pub fn new(name: impl Into<String>, boss_type: impl Into<String>, max_health: u64) -> Self {
        Self {
            id: BossId::new(),
            name: name.into(),
            boss_type: boss_type.into(),
            max_health,
            current_health: max_health,
            contributions: Vec::new(),
            state: BossState::Active,
            version: 0,
            created_at: Utc::now(),
        }
    }

    pub fn is_defeated(&self) -> bool {
        matches!(self.state, BossState::Defeated { .. })
    }

    pub fn rewards_allocated(&self) -> bool {
        matches!(
            self.state,
            BossState::Defeated {
                rewards_allocated: true,
                ..
            }
        )
    }

    pub fn apply_damage(
        &mut self,
        participant: ParticipantId,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<DamageOutcome, BossError> {
        if amount == 0 {
            return Err(BossError::InvalidDamage);
        }
        if self.is_defeated() {
            return Err(BossError::AlreadyDefeated(self.id));
        }

        self.contributions.push(ContributionRecord {
            participant,
            raw_amount: amount,
        });
        self.current_health = self.current_health.saturating_sub(amount);

        if self.current_health == 0 {
            self.state = BossState::Defeated {
                defeated_at: now,
                rewards_allocated: false,
            };
            Ok(DamageOutcome::Defeated)
        } else {
            Ok(DamageOutcome::Damaged {
                remaining_health: self.current_health,
            })
        }
    }

    /// Marks allocation as taken and returns the contributions it must cover
    pub fn take_allocation_snapshot(&mut self) -> Result<Vec<ContributionRecord>, BossError> {
        match &mut self.state {
            BossState::Active => Err(BossError::NotDefeated(self.id)),
            BossState::Defeated {
                rewards_allocated: true,
                ..
            } => Err(BossError::AlreadyAllocated(self.id)),
            BossState::Defeated { rewards_allocated, .. } => {
                *rewards_allocated = true;
                Ok(self.contributions.clone())
            }
        }
    }

    /// Per-participant totals, highest first; ties keep first-seen order
    pub fn contribution_totals(&self) -> Vec<ParticipantTotal> {
        aggregate_contributions(&self.contributions)
    }

    /// Sum of every raw hit, saturating at `u64::MAX`
    pub fn total_damage(&self) -> u64 {
        self.contributions
            .iter()
            .fold(0u64, |total, c| total.saturating_add(c.raw_amount))
    }

    pub fn leaderboard(&self, limit: usize) -> Vec<LeaderboardEntry> {
        let total = self.total_damage();
        self.contribution_totals()
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, t)| LeaderboardEntry {
                rank: i + 1,
                participant: t.participant,
                total_damage: t.total_damage,
                attack_count: t.attack_count,
                share_percent: share_percent(t.total_damage, total),
            })
            .collect()
    }

    /// A single participant's standing, if they have hit the boss
    pub fn standing(&self, participant: ParticipantId) -> Option<LeaderboardEntry> {
        self.leaderboard(usize::MAX)
            .into_iter()
            .find(|entry| entry.participant == participant)
    }
}

/// `raw / total * 100`, or 0 when nothing was dealt
pub fn share_percent(raw: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        raw as f64 / total as f64 * 100.0
    }
}

pub fn aggregate_contributions(records: &[ContributionRecord]) -> Vec<ParticipantTotal> {
    let mut totals: Vec<ParticipantTotal> = Vec::new();
    for record in records {
        match totals.iter_mut().find(|t| t.participant == record.participant) {
            Some(total) => {
                total.total_damage = total.total_damage.saturating_add(record.raw_amount);
                total.attack_count = total.attack_count.saturating_add(1);
            }
            None => totals.push(ParticipantTotal {
                participant: record.participant,
                total_damage: record.raw_amount,
                attack_count: 1,
            }),
        }
    }

    // Stable sort keeps first-seen order among equal totals
    totals.sort_by(|a, b| b.total_damage.cmp(&a.total_damage));
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_until_defeat() {
        let mut boss = BossEvent::new("Mega Snorlax", "normal", 100);
        let a = ParticipantId::new();
        let b = ParticipantId::new();

        assert_eq!(
            boss.apply_damage(a, 60, Utc::now()),
            Ok(DamageOutcome::Damaged { remaining_health: 40 })
        );
        assert_eq!(boss.apply_damage(b, 50, Utc::now()), Ok(DamageOutcome::Defeated));
        assert!(boss.is_defeated());
        assert_eq!(boss.current_health, 0);

        assert_eq!(
            boss.apply_damage(a, 1, Utc::now()),
            Err(BossError::AlreadyDefeated(boss.id))
        );
        assert_eq!(boss.total_damage(), 110);
    }

    #[test]
    fn test_zero_damage_rejected() {
        let mut boss = BossEvent::new("Golem", "normal", 10);
        assert_eq!(
            boss.apply_damage(ParticipantId::new(), 0, Utc::now()),
            Err(BossError::InvalidDamage)
        );
    }

    #[test]
    fn test_snapshot_taken_once() {
        let mut boss = BossEvent::new("Golem", "rock", 10);
        assert_eq!(
            boss.take_allocation_snapshot(),
            Err(BossError::NotDefeated(boss.id))
        );

        boss.apply_damage(ParticipantId::new(), 10, Utc::now()).unwrap();
        assert_eq!(boss.take_allocation_snapshot().map(|s| s.len()), Ok(1));
        assert!(boss.rewards_allocated());
        assert_eq!(
            boss.take_allocation_snapshot(),
            Err(BossError::AlreadyAllocated(boss.id))
        );
    }

    #[test]
    fn test_leaderboard_aggregates_and_ranks() {
        let mut boss = BossEvent::new("Kyogre", "water", 1_000);
        let a = ParticipantId::new();
        let b = ParticipantId::new();
        let c = ParticipantId::new();
        for (p, dmg) in [(a, 10), (b, 30), (a, 10), (c, 20)] {
            boss.apply_damage(p, dmg, Utc::now()).unwrap();
        }

        let board = boss.leaderboard(10);
        assert_eq!(board.len(), 3);
        assert_eq!(board[0].participant, b);
        // a and c tie at 20; a was seen first
        assert_eq!(board[1].participant, a);
        assert_eq!(board[1].attack_count, 2);
        assert_eq!(board[2].participant, c);
        assert!((board[0].share_percent - 42.857).abs() < 0.01);

        assert_eq!(boss.leaderboard(1).len(), 1);
        assert_eq!(boss.standing(c).map(|e| e.rank), Some(3));
        assert!(boss.standing(ParticipantId::new()).is_none());
    }

    #[test]
    fn test_huge_hits_saturate_totals() {
        let mut boss = BossEvent::new("Arceus", "normal", u64::MAX);
        let a = ParticipantId::new();
        let b = ParticipantId::new();

        boss.apply_damage(a, u64::MAX - 1, Utc::now()).unwrap();
        assert_eq!(boss.apply_damage(b, u64::MAX, Utc::now()), Ok(DamageOutcome::Defeated));
        assert_eq!(boss.total_damage(), u64::MAX);

        let board = boss.leaderboard(10);
        assert_eq!(board[0].participant, b);
        assert_eq!(board[0].total_damage, u64::MAX);
        assert_eq!(board[1].total_damage, u64::MAX - 1);

        let mut repeat = BossEvent::new("Regigigas", "normal", u64::MAX);
        repeat.apply_damage(a, u64::MAX - 1, Utc::now()).unwrap();
        repeat.apply_damage(a, u64::MAX, Utc::now()).unwrap();
        let totals = repeat.contribution_totals();
        assert_eq!(totals[0].total_damage, u64::MAX);
        assert_eq!(totals[0].attack_count, 2);
    }
}
