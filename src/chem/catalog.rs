//! Chemical species catalog for one compartment.

use std::collections::HashMap;

use crate::error::EngineError;

/// A species known to a compartment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChemicalSpecies {
    pub index: usize,
    pub name: String,
}

/// Ordered, unique species names with a name → index lookup.
///
/// Indices are positions in the order the names were supplied and never change
/// for the lifetime of the catalog.
#[derive(Debug, Clone, Default)]
pub struct SpeciesCatalog {
    species: Vec<ChemicalSpecies>,
    by_name: HashMap<String, usize>,
}

impl SpeciesCatalog {
    /// Build a catalog, rejecting empty or duplicated names.
    pub fn new<I, S>(names: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut catalog = SpeciesCatalog::default();
        for name in names {
            let name = name.into();
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(EngineError::catalog("species name is empty"));
            }
            if catalog.by_name.contains_key(trimmed) {
                return Err(EngineError::catalog(format!(
                    "species '{}' is listed twice",
                    trimmed
                )));
            }
            let index = catalog.species.len();
            catalog.by_name.insert(trimmed.to_string(), index);
            catalog.species.push(ChemicalSpecies {
                index,
                name: trimmed.to_string(),
            });
        }
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// Exact, whole-name lookup.
    #[inline]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.species.get(index).map(|s| s.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChemicalSpecies> {
        self.species.iter()
    }
}
