//! Monster Composer - assembles species, types and attribute into a descriptor
//!
//! Order of one attempt: validate, species count, families, one species pool
//! lookup per family, then types and attribute. Types never depend on which
//! species were drawn. A pool miss fails the attempt; the composer never
//! invents a placeholder monster.

use std::sync::Arc;

use futures_util::future::join_all;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, instrument, warn};

use crate::application::ports::outbound::SpeciesPoolPort;
use crate::domain::entities::{DescriptorError, MonsterDescriptor, SpeciesSlot};
use crate::domain::errors::ConfigurationError;
use crate::domain::services::{AttributeSelector, SpeciesSelector, TypeSelector};
use crate::domain::value_objects::{EngineTables, MonsterFamily, RollRequest};

#[derive(Debug, thiserror::Error)]
pub enum CompositionError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("No {family} species matched the filters")]
    ProviderMiss { family: MonsterFamily },
    #[error("Species pool error: {0}")]
    Provider(#[source] anyhow::Error),
    #[error("Composed an invalid monster: {0}")]
    InvalidDescriptor(#[from] DescriptorError),
}

impl CompositionError {
    /// Configuration errors fail every attempt the same way
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

#[derive(Clone)]
pub struct MonsterComposer {
    species_pool: Arc<dyn SpeciesPoolPort>,
    tables: Arc<EngineTables>,
}

impl MonsterComposer {
    pub fn new(species_pool: Arc<dyn SpeciesPoolPort>, tables: Arc<EngineTables>) -> Self {
        Self { species_pool, tables }
    }

    pub fn tables(&self) -> &EngineTables {
        &self.tables
    }

    #[instrument(skip(self, request, rng))]
    pub async fn compose(
        &self,
        request: &RollRequest,
        rng: &mut (dyn RngCore + Send),
    ) -> Result<MonsterDescriptor, CompositionError> {
        request.validate()?;

        let count = SpeciesSelector::choose_species_count(request, rng);
        let families = SpeciesSelector::choose_families(request, count, rng)?;
        debug!(species_count = families.len(), ?families, "Chose species families");

        let mut species = Vec::with_capacity(families.len());
        for family in families {
            let filters = request.filters_for(family);
            let identity = self
                .species_pool
                .get_random(family, &filters)
                .await
                .map_err(CompositionError::Provider)?
                .ok_or(CompositionError::ProviderMiss { family })?;
            species.push(SpeciesSlot { family, identity });
        }

        let type_selector = TypeSelector::new(&self.tables.type_domain);
        let type_count = type_selector.choose_type_count(request, rng);
        let types = type_selector.choose_types(request, type_count, rng)?;
        let attribute = AttributeSelector::new(&self.tables.attribute_domain).choose_attribute(request, rng)?;

        let descriptor = MonsterDescriptor {
            species,
            types,
            attribute,
        };
        descriptor.validate()?;

        debug!(
            species = ?descriptor.species_names(),
            types = ?descriptor.types,
            attribute = %descriptor.attribute,
            "Composed monster"
        );
        Ok(descriptor)
    }

    /// `n` independent attempts, run concurrently
    ///
    /// Each attempt gets its own generator seeded from `rng`, so a seeded
    /// caller gets the same batch back. Failures stay in place in the result.
    #[instrument(skip(self, request, rng))]
    pub async fn compose_batch(
        &self,
        request: &RollRequest,
        n: usize,
        rng: &mut (dyn RngCore + Send),
    ) -> Vec<Result<MonsterDescriptor, CompositionError>> {
        let seeds: Vec<u64> = (0..n).map(|_| rng.next_u64()).collect();

        let attempts = seeds.into_iter().map(|seed| async move {
            let mut child = StdRng::seed_from_u64(seed);
            self.compose(request, &mut child).await
        });
        let results = join_all(attempts).await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            warn!(requested = n, failed, "Some batch attempts failed");
        }
        results
    }

    /// Up to `n` monsters carrying at least one of `required_types`
    ///
    /// Attempts that miss the type filter or the species pool are discarded;
    /// gives up after `3 * n` attempts. Configuration errors are returned at
    /// once since every attempt would fail the same way.
    #[instrument(skip(self, request, rng))]
    pub async fn compose_matching(
        &self,
        request: &RollRequest,
        n: usize,
        required_types: &[String],
        rng: &mut (dyn RngCore + Send),
    ) -> Result<Vec<MonsterDescriptor>, CompositionError> {
        let budget = n.saturating_mul(3);
        let mut matched = Vec::with_capacity(n);
        let mut attempts = 0;

        while matched.len() < n && attempts < budget {
            attempts += 1;
            match self.compose(request, rng).await {
                Ok(descriptor) => {
                    if required_types.is_empty() || descriptor.has_any_type(required_types) {
                        matched.push(descriptor);
                    }
                }
                Err(e) if e.is_configuration() => return Err(e),
                Err(e) => debug!(error = %e, "Discarding failed attempt"),
            }
        }

        if matched.len() < n {
            warn!(requested = n, found = matched.len(), attempts, "Attempt budget exhausted");
        }
        Ok(matched)
    }
}
