//! Bound transformations kept across time steps.

use std::collections::HashMap;
use std::sync::Arc;

use super::transform::BoundTransformation;
use crate::error::TransformError;

/// Per-compartment cache keyed by (framework, ordinal).
///
/// Only successful bindings are stored. The owner clears the cache whenever
/// the configuration it was built from is replaced.
#[derive(Debug, Default)]
pub struct BindingCache {
    entries: HashMap<(String, u32), Arc<BoundTransformation>>,
}

impl BindingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached binding or build, store and return a new one.
    pub fn get_or_build<F>(
        &mut self,
        framework: &str,
        ordinal: u32,
        build: F,
    ) -> Result<Arc<BoundTransformation>, TransformError>
    where
        F: FnOnce() -> Result<BoundTransformation, TransformError>,
    {
        let key = (framework.to_string(), ordinal);
        if let Some(bound) = self.entries.get(&key) {
            return Ok(Arc::clone(bound));
        }
        let bound = Arc::new(build()?);
        self.entries.insert(key, Arc::clone(&bound));
        Ok(bound)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
