//! Contribution shares and tiers

use serde::{Deserialize, Serialize};

use crate::domain::entities::{aggregate_contributions, share_percent, ContributionRecord};
use crate::domain::value_objects::{ContributionRules, ParticipantId, Rarity};

/// One participant's slice of a group event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionShare {
    pub participant: ParticipantId,
    pub raw_amount: u64,
    pub share_percent: f64,
    /// `None` when the participant contributed nothing
    pub tier: Option<Rarity>,
}

/// Aggregates raw records per participant and maps each share to a tier
///
/// Output is sorted by amount, highest first, keeping first-seen order on
/// ties.
pub fn contribution_shares(records: &[ContributionRecord], rules: &ContributionRules) -> Vec<ContributionShare> {
    let totals = aggregate_contributions(records);
    let total = totals
        .iter()
        .fold(0u64, |total, t| total.saturating_add(t.total_damage));

    totals
        .into_iter()
        .map(|t| {
            let share = share_percent(t.total_damage, total);
            ContributionShare {
                participant: t.participant,
                raw_amount: t.total_damage,
                share_percent: share,
                tier: (t.total_damage > 0).then(|| rules.tier_for(share)),
            }
        })
        .collect()
}
