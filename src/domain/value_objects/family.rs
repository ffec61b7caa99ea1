//! Monster families and their filter criteria

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::errors::ConfigurationError;

/// One of the species pools a monster can be drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonsterFamily {
    Pokemon,
    Digimon,
    Yokai,
}

impl MonsterFamily {
    pub const ALL: [MonsterFamily; 3] = [
        MonsterFamily::Pokemon,
        MonsterFamily::Digimon,
        MonsterFamily::Yokai,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pokemon => "pokemon",
            Self::Digimon => "digimon",
            Self::Yokai => "yokai",
        }
    }

    /// Filter keys the family's species pool understands
    pub fn criterion_keys(&self) -> &'static [&'static str] {
        match self {
            Self::Pokemon => &["rarity", "stage", "types"],
            Self::Digimon => &["stage", "attribute"],
            Self::Yokai => &["rank", "tribe", "attribute"],
        }
    }

    pub fn accepts_key(&self, key: &str) -> bool {
        self.criterion_keys().contains(&key)
    }
}

impl std::fmt::Display for MonsterFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Criterion key to accepted labels, e.g. `stage -> [Rookie, Champion]`
///
/// A record matches when, for every key, one of its labels is in the list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterCriteria(BTreeMap<String, Vec<String>>);

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, values: &[&str]) -> Self {
        self.set(key, values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn set(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.0.insert(key.into(), values);
    }

    pub fn add_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        let values = self.0.entry(key.into()).or_default();
        if !values.contains(&value) {
            values.push(value);
        }
    }

    /// Key-by-key merge; keys present in `other` replace ours
    pub fn merge(&mut self, other: &FilterCriteria) {
        for (key, values) in &other.0 {
            self.0.insert(key.clone(), values.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn validate_keys(&self, family: MonsterFamily) -> Result<(), ConfigurationError> {
        match self.0.keys().find(|k| !family.accepts_key(k)) {
            Some(key) => Err(ConfigurationError::UnknownFilterKey {
                family,
                key: key.clone(),
            }),
            None => Ok(()),
        }
    }
}
