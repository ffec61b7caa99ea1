//! Type slot count and unique type labels

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::errors::ConfigurationError;
use crate::domain::value_objects::RollRequest;

/// Draws type labels from a fixed domain without replacement
pub struct TypeSelector<'a> {
    domain: &'a [String],
}

impl<'a> TypeSelector<'a> {
    pub fn new(domain: &'a [String]) -> Self {
        Self { domain }
    }

    pub fn choose_type_count<R: Rng + ?Sized>(&self, request: &RollRequest, rng: &mut R) -> usize {
        let min = request.min_type.max(1);
        let max = request.max_type.max(min);
        rng.gen_range(min..=max)
    }

    /// `count` distinct labels
    ///
    /// Override labels come first in order; remaining slots are filled from
    /// domain labels not yet chosen. Guaranteed labels then replace one slot
    /// that the override did not pin, unless one is already present.
    pub fn choose_types<R: Rng + ?Sized>(
        &self,
        request: &RollRequest,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<String>, ConfigurationError> {
        let mut selected: Vec<String> = Vec::with_capacity(count);
        for label in &request.type_override {
            if selected.len() == count {
                break;
            }
            if !selected.contains(label) {
                selected.push(label.clone());
            }
        }
        let pinned = selected.len();

        if selected.len() < count {
            let mut remaining: Vec<&String> = self
                .domain
                .iter()
                .filter(|label| !selected.contains(*label))
                .collect();

            if remaining.len() < count - selected.len() {
                return Err(ConfigurationError::TypeDomainTooSmall {
                    requested: count,
                    available: selected.len() + remaining.len(),
                });
            }

            remaining.shuffle(rng);
            let missing = count - selected.len();
            selected.extend(remaining.into_iter().take(missing).cloned());
        }

        self.apply_guaranteed(request, &mut selected, pinned, rng);
        Ok(selected)
    }

    fn apply_guaranteed<R: Rng + ?Sized>(
        &self,
        request: &RollRequest,
        selected: &mut [String],
        pinned: usize,
        rng: &mut R,
    ) {
        let guaranteed = &request.guaranteed_types;
        if guaranteed.is_empty() || selected.iter().any(|label| guaranteed.contains(label)) {
            return;
        }
        if pinned >= selected.len() {
            return;
        }

        if let Some(label) = guaranteed.choose(rng) {
            let slot = rng.gen_range(pinned..selected.len());
            selected[slot] = label.clone();
        }
    }
}
