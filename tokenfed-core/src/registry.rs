//! Generator registry.
//!
//! [`GeneratorRegistry`] maps each [`ProviderAlias`] to the [`TokenGenerator`]
//! that serves it. It is pure dispatch: it holds no tokens. Build it once,
//! wrap it in an `Arc` and hand it to every component that needs a generator.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tokenfed_core::{GeneratorRegistry, ProviderAlias};
//!
//! let registry = Arc::new(GeneratorRegistry::new());
//! registry.register(ProviderAlias::github(), Arc::new(static_provider));
//! assert!(registry.contains(&ProviderAlias::github()));
//! ```

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::generator::TokenGenerator;
use crate::model::ProviderAlias;

#[derive(Default)]
pub struct GeneratorRegistry {
    generators: RwLock<HashMap<ProviderAlias, Arc<dyn TokenGenerator>>>,
}

impl GeneratorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a generator for an alias.
    ///
    /// Replaces any previous registration and returns it.
    pub fn register(
        &self,
        alias: ProviderAlias,
        generator: Arc<dyn TokenGenerator>,
    ) -> Option<Arc<dyn TokenGenerator>> {
        tracing::debug!(alias = %alias, "Registering token generator");
        self.generators.write().insert(alias, generator)
    }

    pub fn get(&self, alias: &ProviderAlias) -> Option<Arc<dyn TokenGenerator>> {
        self.generators.read().get(alias).cloned()
    }

    pub fn contains(&self, alias: &ProviderAlias) -> bool {
        self.generators.read().contains_key(alias)
    }

    /// Remove a registration, returning it if present.
    pub fn unregister(&self, alias: &ProviderAlias) -> Option<Arc<dyn TokenGenerator>> {
        self.generators.write().remove(alias)
    }

    /// All registered aliases, sorted.
    pub fn aliases(&self) -> Vec<ProviderAlias> {
        let mut aliases: Vec<_> = self.generators.read().keys().cloned().collect();
        aliases.sort();
        aliases
    }

    pub fn len(&self) -> usize {
        self.generators.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.read().is_empty()
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("aliases", &self.aliases())
            .finish()
    }
}
