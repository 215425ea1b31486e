//! Lookup of distribution families by name.

use crate::errors::{ECSUError, ECSUResult};
use crate::family::{DistributionFamily, StatrsFamily};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// A mapping from family name to its primitive operations.
///
/// New families are added with [`FamilyRegistry::register`]; the default registry
/// contains the built-in statrs-backed families.
#[derive(Debug, Clone)]
pub struct FamilyRegistry {
    families: HashMap<String, Arc<dyn DistributionFamily>>,
}

impl Default for FamilyRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        for family in StatrsFamily::builtin() {
            registry.register(Arc::new(family));
        }
        registry
    }
}

impl FamilyRegistry {
    /// Create a registry without any families
    pub fn new() -> Self {
        Self {
            families: HashMap::new(),
        }
    }

    /// Register a family under its own name.
    ///
    /// Returns the family previously registered under that name, if any.
    pub fn register(
        &mut self,
        family: Arc<dyn DistributionFamily>,
    ) -> Option<Arc<dyn DistributionFamily>> {
        self.families.insert(family.name().to_string(), family)
    }

    /// Resolve a family by name
    pub fn resolve(&self, name: &str) -> ECSUResult<Arc<dyn DistributionFamily>> {
        self.families
            .get(name)
            .cloned()
            .ok_or_else(|| ECSUError::UnknownDistributionFamily(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.families.contains_key(name)
    }

    /// Registered family names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.families.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// The process-wide registry of built-in families.
pub fn default_registry() -> &'static FamilyRegistry {
    static REGISTRY: OnceLock<FamilyRegistry> = OnceLock::new();
    REGISTRY.get_or_init(FamilyRegistry::default)
}
