use std::collections::HashMap;

use crate::catalog::{ToolSpec, CATALOG};

/// Immutable lookup over the tool catalog, built once at startup.
pub struct ToolRegistry {
    by_name: HashMap<&'static str, &'static ToolSpec>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            by_name: CATALOG.iter().map(|spec| (spec.name, spec)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&'static ToolSpec> {
        self.by_name.get(name).copied()
    }

    /// Catalog entries in their declared order.
    pub fn specs(&self) -> impl Iterator<Item = &'static ToolSpec> {
        CATALOG.iter()
    }

    pub fn list(&self) -> Vec<String> {
        CATALOG.iter().map(|spec| spec.name.to_string()).collect()
    }

    pub fn count(&self) -> usize {
        self.by_name.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
