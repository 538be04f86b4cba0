//! Configuration model for the biogeochemistry stage.
//!
//! Mirrors the two host JSON documents: the model configuration (which cycling
//! frameworks run in which compartment) and the cycling-framework definitions
//! (ordered transformations with their kinetics and parameters).

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::EngineError;

/// One transformation record, keyed by its 1-based ordinal in the framework.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TransformationConfig {
    pub consumed: String,
    pub produced: String,
    pub kinetics: String,
    #[serde(default)]
    pub parameter_names: Vec<String>,
    #[serde(default)]
    pub parameter_values: BTreeMap<String, f64>,
}

/// A named biogeochemical cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CyclingFramework {
    pub list_transformations: Vec<u32>,
    pub transformations: BTreeMap<u32, TransformationConfig>,
    /// Records present in the document that could not be read, with the reason.
    /// They fail only their own ordinal at run time.
    pub rejected: BTreeMap<u32, String>,
}

impl CyclingFramework {
    /// Listed ordinals, ascending, without duplicates.
    pub fn ordinals(&self) -> Vec<u32> {
        let mut ordinals = self.list_transformations.clone();
        ordinals.sort_unstable();
        ordinals.dedup();
        ordinals
    }

    pub fn transformation(&self, ordinal: u32) -> Option<&TransformationConfig> {
        self.transformations.get(&ordinal)
    }

    /// Why a record in the document could not be read, if it was rejected.
    pub fn rejection(&self, ordinal: u32) -> Option<&str> {
        self.rejected.get(&ordinal).map(String::as_str)
    }
}

/// Everything the cycle driver reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BgcConfig {
    /// Compartment name → ordered cycling framework names.
    pub compartment_frameworks: BTreeMap<String, Vec<String>>,
    /// Framework name → definition.
    pub frameworks: BTreeMap<String, CyclingFramework>,
}

#[derive(Deserialize)]
struct CompartmentEntry {
    #[serde(default)]
    cycling_framework: Vec<String>,
}

#[derive(Deserialize)]
struct ConfigDocument {
    #[serde(rename = "BIOGEOCHEMISTRY_CONFIGURATION", default)]
    compartments: BTreeMap<String, CompartmentEntry>,
}

#[derive(Deserialize)]
struct FrameworkEntry {
    #[serde(default)]
    list_transformations: Vec<u32>,
    #[serde(flatten)]
    records: BTreeMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct CyclingDocument {
    #[serde(rename = "CYCLING_FRAMEWORKS", default)]
    frameworks: BTreeMap<String, FrameworkEntry>,
}

impl BgcConfig {
    /// Parse the model configuration and cycling-framework JSON documents.
    ///
    /// Keys other than `BIOGEOCHEMISTRY_CONFIGURATION` / `CYCLING_FRAMEWORKS`
    /// are ignored, as are non-numeric keys inside a framework.
    pub fn from_json_strs(config_json: &str, cycling_json: &str) -> Result<Self, EngineError> {
        let config: ConfigDocument = serde_json::from_str(config_json)?;
        let cycling: CyclingDocument = serde_json::from_str(cycling_json)?;

        let compartment_frameworks = config
            .compartments
            .into_iter()
            .map(|(name, entry)| (name, entry.cycling_framework))
            .collect();

        let mut frameworks = BTreeMap::new();
        for (name, entry) in cycling.frameworks {
            let mut transformations = BTreeMap::new();
            let mut rejected = BTreeMap::new();
            for (key, value) in entry.records {
                let Ok(ordinal) = key.trim().parse::<u32>() else {
                    continue;
                };
                match serde_json::from_value::<TransformationConfig>(value) {
                    Ok(record) => {
                        transformations.insert(ordinal, record);
                    }
                    Err(err) => {
                        log::warn!("framework '{}', transformation '{}': {}", name, key, err);
                        rejected.insert(ordinal, err.to_string());
                    }
                }
            }
            frameworks.insert(
                name,
                CyclingFramework {
                    list_transformations: entry.list_transformations,
                    transformations,
                    rejected,
                },
            );
        }

        Ok(BgcConfig {
            compartment_frameworks,
            frameworks,
        })
    }

    /// Framework names configured for a compartment, empty when none.
    pub fn frameworks_for(&self, compartment: &str) -> &[String] {
        self.compartment_frameworks
            .get(compartment)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// What to do when a cell's transfer is NaN or infinite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonFinitePolicy {
    /// Leave the cell untouched and keep going.
    #[default]
    Skip,
    /// Fail the transformation before any cell is written.
    Abort,
}

/// Engine tuning knobs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub num_threads: usize,
    pub non_finite: NonFinitePolicy,
    pub cache_bindings: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            num_threads: 1,
            non_finite: NonFinitePolicy::Skip,
            cache_bindings: true,
        }
    }
}

impl EngineOptions {
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }
}
