//! Species pool port - where concrete species come from
//!
//! The engine never sees how species are stored; it only asks for one random
//! member of a family that satisfies a filter map.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::entities::SpeciesIdentity;
use crate::domain::value_objects::{FilterCriteria, MonsterFamily};

#[async_trait]
pub trait SpeciesPoolPort: Send + Sync {
    /// One random eligible member, or `None` when nothing matches
    async fn get_random(&self, family: MonsterFamily, filters: &FilterCriteria) -> Result<Option<SpeciesIdentity>>;
}
