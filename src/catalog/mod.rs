//! Model catalog: the fixed registry of models the gateway can route to.
//!
//! The catalog is built once at startup, either from the embedded seed
//! (compiled-in JSON covering the Bedrock models hermod ships with) or from
//! a custom JSON file named in the configuration. After construction it is
//! read-only, so the router shares it behind an `Arc` without locking.
//!
//! Entries keep their source order; [`ModelCatalog::list()`] and the
//! `UnknownModel` error message both enumerate names in that order.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::types::ModelDescriptor;
use crate::{HermodError, Result};

/// Raw JSON seed data compiled into the binary.
const EMBEDDED_SEED: &str = include_str!("seed.json");

/// Immutable lookup table from short name to [`ModelDescriptor`].
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    entries: Vec<ModelDescriptor>,
    index: HashMap<String, usize>,
}

impl ModelCatalog {
    /// Build a catalog from descriptors, rejecting duplicates and nonsense values.
    pub fn new(entries: Vec<ModelDescriptor>) -> Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, model) in entries.iter().enumerate() {
            check_descriptor(model)?;
            if index.insert(model.name.clone(), i).is_some() {
                return Err(HermodError::Configuration(format!(
                    "duplicate model name '{}' in catalog",
                    model.name
                )));
            }
        }
        Ok(Self { entries, index })
    }

    /// Catalog pre-populated with the embedded seed data.
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_SEED)
    }

    /// Parse a catalog from a JSON array of descriptors.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<ModelDescriptor> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    /// Load a catalog from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HermodError::Configuration(format!("Failed to read catalog file {path:?}: {e}"))
        })?;
        Self::from_json(&content)
    }

    /// Look up a model by short name.
    ///
    /// Fails with `UnknownModel` listing every valid name.
    pub fn lookup(&self, name: &str) -> Result<&ModelDescriptor> {
        self.index
            .get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| HermodError::UnknownModel {
                model: name.to_string(),
                available: self.names().map(String::from).collect(),
            })
    }

    /// Whether a short name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Every descriptor, in catalog order.
    pub fn list(&self) -> &[ModelDescriptor] {
        &self.entries
    }

    /// Every short name, in catalog order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|m| m.name.as_str())
    }

    /// Number of models in the catalog.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn check_descriptor(model: &ModelDescriptor) -> Result<()> {
    let reject = |reason: &str| {
        Err(HermodError::Configuration(format!(
            "invalid catalog entry '{}': {reason}",
            model.name
        )))
    };

    if model.name.trim().is_empty() {
        return reject("name cannot be empty");
    }
    if model.model_id.trim().is_empty() {
        return reject("model_id cannot be empty");
    }
    // Written this way round so NaN prices are rejected too.
    if !(model.input_cost_per_1k >= 0.0 && model.output_cost_per_1k >= 0.0) {
        return reject("prices must be non-negative");
    }
    if model.max_output_tokens == 0 {
        return reject("max_output_tokens must be positive");
    }
    Ok(())
}
