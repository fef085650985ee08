//! Module import graph snapshot

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Result, SplitError};
use crate::types::ModuleId;

/// Import edges discovered during one build: module id -> directly imported ids.
///
/// Filled one module at a time as the host parses modules, cleared when the
/// next build starts.
#[derive(Debug, Default, Clone)]
pub struct ModuleGraph {
    edges: HashMap<ModuleId, Vec<ModuleId>>,
}

impl ModuleGraph {
    /// Create a new empty module graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a `{ moduleId: [importedIds] }` JSON snapshot written by the host
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SplitError::ReadGraph {
            path: path.to_path_buf(),
            source,
        })?;
        let edges = serde_json::from_str(&content).map_err(|source| SplitError::ParseGraph {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { edges })
    }

    /// Record the imports of a parsed module, replacing any earlier entry
    pub fn record(&mut self, module_id: ModuleId, imported_ids: Vec<ModuleId>) {
        self.edges.insert(module_id, imported_ids);
    }

    /// Direct imports of a module; empty if the module was never recorded
    pub fn imported_ids(&self, module_id: &ModuleId) -> &[ModuleId] {
        self.edges.get(module_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All recorded module ids in sorted order
    pub fn module_ids(&self) -> Vec<&ModuleId> {
        let mut ids: Vec<&ModuleId> = self.edges.keys().collect();
        ids.sort();
        ids
    }

    pub fn clear(&mut self) {
        self.edges.clear();
    }

    /// Total number of recorded modules
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

impl FromIterator<(ModuleId, Vec<ModuleId>)> for ModuleGraph {
    fn from_iter<I: IntoIterator<Item = (ModuleId, Vec<ModuleId>)>>(iter: I) -> Self {
        Self {
            edges: iter.into_iter().collect(),
        }
    }
}
