//! Trait slider values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SpecError;
use crate::traits::{trait_by_key, TRAITS};

/// The user's slider positions: one score in [-1, 1] per catalog trait.
///
/// Constructed neutral (all zeros). Mutation happens only through [`set`],
/// which clamps into range and rejects non-finite input, so every consumer
/// downstream can assume finite, in-range scores.
///
/// [`set`]: TraitValues::set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraitValues {
    values: BTreeMap<String, f64>,
}

impl TraitValues {
    /// Creates neutral values (all traits at 0).
    pub fn neutral() -> Self {
        Self {
            values: TRAITS.iter().map(|t| (t.key.to_string(), 0.0)).collect(),
        }
    }

    /// Sets one trait's score, clamped into [-1, 1].
    ///
    /// # Errors
    /// Unknown keys and non-finite values are rejected and leave the
    /// existing state untouched.
    pub fn set(&mut self, key: &str, value: f64) -> Result<(), SpecError> {
        if trait_by_key(key).is_none() {
            return Err(SpecError::UnknownTrait {
                key: key.to_string(),
            });
        }
        if !value.is_finite() {
            return Err(SpecError::NonFiniteValue {
                key: key.to_string(),
            });
        }
        self.values
            .insert(key.to_string(), value.clamp(-1.0, 1.0));
        Ok(())
    }

    /// Returns the score for a key, 0.0 for unknown keys.
    pub fn score(&self, key: &str) -> f64 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    /// Builds values from an arbitrary key-value map, tolerantly.
    ///
    /// Unknown keys are ignored, non-finite entries dropped, finite
    /// entries clamped into range. Missing traits stay neutral. This is
    /// the deserialization path for share tokens and value files.
    pub fn from_map(map: &BTreeMap<String, f64>) -> Self {
        let mut values = Self::neutral();
        for (key, &v) in map {
            if trait_by_key(key).is_some() && v.is_finite() {
                values
                    .values
                    .insert(key.clone(), v.clamp(-1.0, 1.0));
            }
        }
        values
    }

    /// Iterates (key, score) pairs in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        TRAITS.iter().map(move |t| (t.key, self.score(t.key)))
    }

    /// The inner map, in key order.
    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.values
    }
}

impl Default for TraitValues {
    fn default() -> Self {
        Self::neutral()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_neutral_covers_catalog() {
        let v = TraitValues::neutral();
        assert_eq!(v.as_map().len(), TRAITS.len());
        for t in TRAITS {
            assert_eq!(v.score(t.key), 0.0);
        }
    }

    #[test]
    fn test_set_clamps() {
        let mut v = TraitValues::neutral();
        v.set("merry-serious", 3.0).unwrap();
        assert_eq!(v.score("merry-serious"), 1.0);
        v.set("merry-serious", -7.5).unwrap();
        assert_eq!(v.score("merry-serious"), -1.0);
    }

    #[test]
    fn test_set_rejects_unknown_and_nan() {
        let mut v = TraitValues::neutral();
        assert!(v.set("no-such-axis", 0.5).is_err());
        assert!(v.set("merry-serious", f64::NAN).is_err());
        assert_eq!(v.score("merry-serious"), 0.0);
    }

    #[test]
    fn test_from_map_is_tolerant() {
        let mut map = BTreeMap::new();
        map.insert("merry-serious".to_string(), 2.0);
        map.insert("bogus".to_string(), 0.5);
        map.insert("logic-ethics".to_string(), f64::NAN);
        let v = TraitValues::from_map(&map);
        assert_eq!(v.score("merry-serious"), 1.0);
        assert_eq!(v.score("logic-ethics"), 0.0);
        assert_eq!(v.score("bogus"), 0.0);
    }
}
