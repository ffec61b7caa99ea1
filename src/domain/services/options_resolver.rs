//! Options resolver - turns defaults plus caller overrides into one request
//!
//! Overrides replace fields wholesale, except per-family filter maps which
//! merge key by key: overriding pokemon `rarity` keeps the default `stage`.
//! Unknown fields and unknown criterion keys are rejected so that a typo can
//! never widen a roll.

use serde_json::Value;

use crate::domain::errors::ConfigurationError;
use crate::domain::value_objects::{RollOverrides, RollRequest, SpecialItemRule};

/// Top-level keys accepted in a JSON override map
pub const OVERRIDE_FIELDS: &[&str] = &[
    "species_override",
    "type_override",
    "attribute_override",
    "force_fusion",
    "force_no_fusion",
    "min_species",
    "max_species",
    "min_type",
    "max_type",
    "filters",
    "include_families",
    "exclude_families",
    "guaranteed_species",
    "guaranteed_types",
];

pub struct OptionsResolver;

impl OptionsResolver {
    pub fn merge(defaults: &RollRequest, overrides: &RollOverrides) -> Result<RollRequest, ConfigurationError> {
        let mut merged = defaults.clone();

        if let Some(v) = &overrides.species_override {
            merged.species_override = v.clone();
        }
        if let Some(v) = &overrides.type_override {
            merged.type_override = v.clone();
        }
        if let Some(v) = &overrides.attribute_override {
            merged.attribute_override = v.clone();
        }
        if let Some(v) = overrides.force_fusion {
            merged.force_fusion = v;
        }
        if let Some(v) = overrides.force_no_fusion {
            merged.force_no_fusion = v;
        }
        if let Some(v) = overrides.min_species {
            merged.min_species = v;
        }
        if let Some(v) = overrides.max_species {
            merged.max_species = v;
        }
        if let Some(v) = overrides.min_type {
            merged.min_type = v;
        }
        if let Some(v) = overrides.max_type {
            merged.max_type = v;
        }
        if let Some(filters) = &overrides.filters {
            for (family, criteria) in filters {
                merged.filters.entry(*family).or_default().merge(criteria);
            }
        }
        if let Some(v) = &overrides.include_families {
            merged.include_families = v.clone();
        }
        if let Some(v) = &overrides.exclude_families {
            merged.exclude_families = v.clone();
        }
        if let Some(v) = overrides.guaranteed_species {
            merged.guaranteed_species = Some(v);
        }
        if let Some(v) = &overrides.guaranteed_types {
            merged.guaranteed_types = v.clone();
        }

        merged.validate()?;
        Ok(merged)
    }

    /// Same as [`merge`](Self::merge) for an untyped JSON override map
    pub fn merge_json(defaults: &RollRequest, overrides: &Value) -> Result<RollRequest, ConfigurationError> {
        let map = match overrides {
            Value::Null => return Self::merge(defaults, &RollOverrides::default()),
            Value::Object(map) => map,
            other => {
                return Err(ConfigurationError::InvalidOverrides(format!(
                    "expected an object, got {}",
                    other
                )))
            }
        };

        if let Some(unknown) = map.keys().find(|k| !OVERRIDE_FIELDS.contains(&k.as_str())) {
            return Err(ConfigurationError::UnknownOverrideField(unknown.clone()));
        }

        let parsed: RollOverrides = serde_json::from_value(overrides.clone())
            .map_err(|e| ConfigurationError::InvalidOverrides(e.to_string()))?;
        Self::merge(defaults, &parsed)
    }

    /// Patches the request for every item that matches a rule
    ///
    /// Items are visited in order and each uses the first rule it matches,
    /// so a later item overrides an earlier one touching the same field.
    pub fn apply_special_items(
        request: &RollRequest,
        items: &[String],
        rules: &[SpecialItemRule],
    ) -> Result<RollRequest, ConfigurationError> {
        let mut patched = request.clone();

        for item in items {
            let matched = rules
                .iter()
                .find_map(|rule| rule.trigger.capture(item).map(|captured| (rule, captured)));

            if let Some((rule, captured)) = matched {
                for op in &rule.patch {
                    op.apply(&mut patched, captured);
                }
            }
        }

        patched.validate()?;
        Ok(patched)
    }
}
