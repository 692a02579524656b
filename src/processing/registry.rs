// src/processing/registry.rs
use std::collections::{BTreeMap, HashSet};

use crate::error::{Error, Result};
use crate::processing::indices::{IndexCalculator, NormalizedDifference};

/// Index name to calculator, built once at startup and passed by reference.
///
/// Names are matched case-insensitively.
#[derive(Default)]
pub struct IndexRegistry {
    indices: BTreeMap<String, Box<dyn IndexCalculator>>,
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with NDVI, NDWI and NDBI.
    pub fn with_defaults() -> Self {
        let mut indices: BTreeMap<String, Box<dyn IndexCalculator>> = BTreeMap::new();
        for index in [
            NormalizedDifference::ndvi(),
            NormalizedDifference::ndwi(),
            NormalizedDifference::ndbi(),
        ] {
            indices.insert(key(index.name()), Box::new(index));
        }
        Self { indices }
    }

    /// Adds an index definition.
    ///
    /// Rejects a name that is already taken, a definition without bands,
    /// a band listed twice and an empty value range.
    pub fn register<I: IndexCalculator + 'static>(&mut self, index: I) -> Result<()> {
        let name = index.name().trim();
        let invalid = |reason: &str| Error::InvalidDefinition {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if name.is_empty() {
            return Err(invalid("name is empty"));
        }
        if index.required_bands().is_empty() {
            return Err(invalid("no bands declared"));
        }
        let mut seen = HashSet::new();
        if !index.required_bands().iter().all(|role| seen.insert(*role)) {
            return Err(invalid("band declared more than once"));
        }
        let (min, max) = index.valid_range();
        if !(min < max) {
            return Err(invalid("value range is empty"));
        }

        let slot = key(name);
        if self.indices.contains_key(&slot) {
            return Err(Error::DuplicateIndex(name.to_string()));
        }
        self.indices.insert(slot, Box::new(index));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&dyn IndexCalculator> {
        self.indices
            .get(&key(name))
            .map(|index| index.as_ref())
            .ok_or_else(|| Error::UnknownIndex(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.indices.contains_key(&key(name))
    }

    /// Registered calculators, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &dyn IndexCalculator> {
        self.indices.values().map(|index| index.as_ref())
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

fn key(name: &str) -> String {
    name.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::BandRole;
    use crate::processing::indices::FormulaIndex;

    #[test]
    fn defaults_are_registered() {
        let registry = IndexRegistry::with_defaults();
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("ndvi"));
        assert_eq!(registry.get("Ndwi").unwrap().name(), "NDWI");
        assert!(matches!(
            registry.get("INVALID"),
            Err(Error::UnknownIndex(name)) if name == "INVALID"
        ));
    }

    #[test]
    fn rejects_duplicates_and_bad_definitions() {
        let mut registry = IndexRegistry::with_defaults();
        assert!(matches!(
            registry.register(NormalizedDifference::ndvi()),
            Err(Error::DuplicateIndex(_))
        ));
        assert!(matches!(
            registry.register(FormulaIndex::new("EMPTY", vec![], |_| Some(0.0))),
            Err(Error::InvalidDefinition { .. })
        ));
        assert!(matches!(
            registry.register(FormulaIndex::new(
                "TWICE",
                vec![BandRole::Nir, BandRole::Nir],
                |_| Some(0.0)
            )),
            Err(Error::InvalidDefinition { .. })
        ));
        assert!(matches!(
            registry.register(
                FormulaIndex::new("FLAT", vec![BandRole::Nir], |_| Some(0.0)).with_range(1.0, 1.0)
            ),
            Err(Error::InvalidDefinition { .. })
        ));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn iterates_in_name_order() {
        let registry = IndexRegistry::with_defaults();
        let names: Vec<&str> = registry.iter().map(|index| index.name()).collect();
        assert_eq!(names, ["NDBI", "NDVI", "NDWI"]);
    }
}
