//! Species slot count and family choice

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::errors::ConfigurationError;
use crate::domain::value_objects::{MonsterFamily, RollRequest};

pub struct SpeciesSelector;

impl SpeciesSelector {
    /// Number of species slots: 1 without fusion, at least 2 when forced
    pub fn choose_species_count<R: Rng + ?Sized>(request: &RollRequest, rng: &mut R) -> usize {
        if request.force_no_fusion {
            return 1;
        }

        let max = request.max_species.max(1);
        let min = if request.force_fusion {
            request.min_species.max(2)
        } else {
            request.min_species.max(1)
        };

        // A validated request never hits this; clamp rather than panic in gen_range
        if min >= max {
            return max;
        }
        rng.gen_range(min..=max)
    }

    /// Families for `count` slots
    ///
    /// An override fills slots in order. Slots it leaves open come from a bag
    /// holding every eligible family once per open slot, shuffled, so two
    /// slots from the same family stay reachable. The guaranteed species only
    /// applies when there is no override.
    pub fn choose_families<R: Rng + ?Sized>(
        request: &RollRequest,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<MonsterFamily>, ConfigurationError> {
        let eligible = request.eligible_families();
        if eligible.is_empty() {
            return Err(ConfigurationError::NoEligibleFamilies);
        }

        let mut chosen: Vec<MonsterFamily> = request.species_override.iter().take(count).copied().collect();
        let open = count - chosen.len();
        if open > 0 {
            let mut bag: Vec<MonsterFamily> = eligible
                .iter()
                .flat_map(|family| std::iter::repeat(*family).take(open))
                .collect();
            bag.shuffle(rng);
            chosen.extend(bag.into_iter().take(open));
        }

        if request.species_override.is_empty() {
            if let Some(guaranteed) = request.guaranteed_species {
                if let Some(slot) = chosen.get_mut(guaranteed.position) {
                    *slot = guaranteed.family;
                }
            }
        }

        Ok(chosen)
    }
}
