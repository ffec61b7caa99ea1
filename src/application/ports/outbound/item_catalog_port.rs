use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::Rarity;

/// An item the catalog can hand out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub rarity: Rarity,
    /// Activity or event the item drops from, e.g. `garden`, `boss_fire`
    pub source: String,
}

#[async_trait]
pub trait ItemCatalogPort: Send + Sync {
    async fn get_by_source_and_rarity(&self, source: &str, rarity: Rarity) -> Result<Vec<CatalogItem>>;

    async fn get_by_category(&self, category: &str) -> Result<Vec<CatalogItem>>;
}
