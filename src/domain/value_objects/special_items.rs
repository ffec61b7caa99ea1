//! Special item rules - declarative constraint patches keyed on item names
//!
//! Items handed in with a roll (incense, milks, codes...) each narrow the
//! request in a fixed way. Rules are data: adding an item means adding a row,
//! not a branch.

use serde::{Deserialize, Serialize};

use super::family::MonsterFamily;
use super::roll_request::RollRequest;

/// Placeholder replaced by the text captured from a suffix trigger
pub const CAPTURE_PLACEHOLDER: &str = "{value}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", rename_all = "snake_case")]
pub enum ItemTrigger {
    /// The whole item name
    Exact { name: String },
    /// Item names ending in `suffix`; the rest of the name is captured
    Suffix { suffix: String },
}

impl ItemTrigger {
    /// Captured text when the item matches, empty for exact triggers
    pub fn capture<'a>(&self, item: &'a str) -> Option<&'a str> {
        match self {
            Self::Exact { name } => (item == name).then_some(""),
            Self::Suffix { suffix } => item
                .strip_suffix(suffix.as_str())
                .map(str::trim)
                .filter(|captured| !captured.is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RollPatch {
    SetAttributes { values: Vec<String> },
    AddType { value: String },
    ExcludeFamily { family: MonsterFamily },
    SetCriterion {
        family: MonsterFamily,
        key: String,
        values: Vec<String>,
    },
    AddCriterionValue {
        family: MonsterFamily,
        key: String,
        value: String,
    },
    ForceFusion,
    MinTypes { count: usize },
}

impl RollPatch {
    pub fn apply(&self, request: &mut RollRequest, captured: &str) {
        let fill = |text: &String| text.replace(CAPTURE_PLACEHOLDER, captured);

        match self {
            Self::SetAttributes { values } => {
                request.attribute_override = values.iter().map(fill).collect();
            }
            Self::AddType { value } => {
                let value = fill(value);
                if !request.type_override.contains(&value) {
                    request.type_override.push(value);
                }
            }
            Self::ExcludeFamily { family } => {
                if !request.exclude_families.contains(family) {
                    request.exclude_families.push(*family);
                }
            }
            Self::SetCriterion { family, key, values } => {
                request
                    .filters
                    .entry(*family)
                    .or_default()
                    .set(fill(key), values.iter().map(fill).collect());
            }
            Self::AddCriterionValue { family, key, value } => {
                request
                    .filters
                    .entry(*family)
                    .or_default()
                    .add_value(fill(key), fill(value));
            }
            Self::ForceFusion => {
                request.force_fusion = true;
                request.force_no_fusion = false;
                request.min_species = request.min_species.max(2);
            }
            Self::MinTypes { count } => {
                request.min_type = *count;
                request.max_type = request.max_type.max(*count);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecialItemRule {
    pub trigger: ItemTrigger,
    pub patch: Vec<RollPatch>,
}

impl SpecialItemRule {
    fn exact(name: &str, patch: Vec<RollPatch>) -> Self {
        Self {
            trigger: ItemTrigger::Exact { name: name.to_string() },
            patch,
        }
    }

    fn suffix(suffix: &str, patch: Vec<RollPatch>) -> Self {
        Self {
            trigger: ItemTrigger::Suffix { suffix: suffix.to_string() },
            patch,
        }
    }

    /// The egg hatching item set
    pub fn default_table() -> Vec<SpecialItemRule> {
        let attributes = |value: &str| RollPatch::SetAttributes {
            values: vec![value.to_string()],
        };
        let criterion = |family, key: &str| RollPatch::SetCriterion {
            family,
            key: key.to_string(),
            values: vec![CAPTURE_PLACEHOLDER.to_string()],
        };

        vec![
            Self::suffix(
                " Nurture Kit",
                vec![RollPatch::AddType { value: CAPTURE_PLACEHOLDER.to_string() }],
            ),
            Self::exact("Corruption Code", vec![attributes("Virus")]),
            Self::exact("Repair Code", vec![attributes("Vaccine")]),
            Self::exact("Shiny New Code", vec![attributes("Data")]),
            Self::suffix(" Rank Incense", vec![criterion(MonsterFamily::Yokai, "rank")]),
            Self::suffix(" Color Incense", vec![criterion(MonsterFamily::Yokai, "attribute")]),
            Self::exact(
                "Spell Tag",
                vec![RollPatch::ExcludeFamily { family: MonsterFamily::Yokai }],
            ),
            Self::exact(
                "DigiMeat",
                vec![RollPatch::AddCriterionValue {
                    family: MonsterFamily::Digimon,
                    key: "stage".to_string(),
                    value: "Rookie".to_string(),
                }],
            ),
            Self::exact(
                "DigiTofu",
                vec![RollPatch::ExcludeFamily { family: MonsterFamily::Digimon }],
            ),
            Self::exact(
                "Broken Bell",
                vec![RollPatch::ExcludeFamily { family: MonsterFamily::Pokemon }],
            ),
            Self::suffix(" Poffin", vec![criterion(MonsterFamily::Pokemon, "types")]),
            Self::suffix(" tag", vec![criterion(MonsterFamily::Digimon, "attribute")]),
            Self::exact("Hot Chocolate", vec![RollPatch::ForceFusion]),
            Self::exact("Standard Milk", vec![RollPatch::MinTypes { count: 2 }]),
            Self::exact("Chocolate Milk", vec![RollPatch::MinTypes { count: 3 }]),
            Self::exact("Strawberry Milk", vec![RollPatch::MinTypes { count: 4 }]),
            Self::exact("Moomoo Milk", vec![RollPatch::MinTypes { count: 5 }]),
        ]
    }
}
