//! Monster descriptor - the output of one composition

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{MonsterFamily, MAX_SPECIES_SLOTS, MAX_TYPE_SLOTS};

/// Raw match returned by a species pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesIdentity {
    pub name: String,
    /// Whatever else the pool knows about the species
    #[serde(default)]
    pub data: serde_json::Value,
}

impl SpeciesIdentity {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: serde_json::Value::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesSlot {
    pub family: MonsterFamily,
    pub identity: SpeciesIdentity,
}

/// A rolled monster: 1-3 species, 1-5 distinct types, one attribute
///
/// Types are chosen independently of the species, so a Fire type Psychic
/// fusion is a valid descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterDescriptor {
    pub species: Vec<SpeciesSlot>,
    pub types: Vec<String>,
    pub attribute: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DescriptorError {
    #[error("Descriptor has {0} species slots, expected 1..=3")]
    SpeciesCount(usize),
    #[error("Descriptor has {0} types, expected 1..=5")]
    TypeCount(usize),
    #[error("Type '{0}' appears more than once")]
    DuplicateType(String),
    #[error("Descriptor has no attribute")]
    MissingAttribute,
}

impl MonsterDescriptor {
    pub fn is_fusion(&self) -> bool {
        self.species.len() > 1
    }

    pub fn species_names(&self) -> Vec<&str> {
        self.species.iter().map(|s| s.identity.name.as_str()).collect()
    }

    pub fn has_any_type(&self, wanted: &[String]) -> bool {
        self.types.iter().any(|t| wanted.contains(t))
    }

    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.species.is_empty() || self.species.len() > MAX_SPECIES_SLOTS {
            return Err(DescriptorError::SpeciesCount(self.species.len()));
        }
        if self.types.is_empty() || self.types.len() > MAX_TYPE_SLOTS {
            return Err(DescriptorError::TypeCount(self.types.len()));
        }
        for (i, label) in self.types.iter().enumerate() {
            if self.types[..i].contains(label) {
                return Err(DescriptorError::DuplicateType(label.clone()));
            }
        }
        if self.attribute.trim().is_empty() {
            return Err(DescriptorError::MissingAttribute);
        }
        Ok(())
    }
}
