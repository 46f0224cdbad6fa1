//! Registry for managing providers.
//!
//! A `Registry` maps provider names to shared provider handles for one
//! capability category. It is safe to share across threads: registration takes
//! the write lock, lookups and listing take the read lock, and neither holds
//! the lock beyond the in-memory map operation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error};

use crate::error::{RegistryError, RegistryResult};

/// A named, thread-safe registry of providers of one capability type.
///
/// `T` is usually a trait object such as `dyn AuthProvider`; every entry in
/// one registry therefore satisfies the same contract.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use stash_core::{Provider, Registry};
///
/// #[derive(Debug)]
/// struct Gmail;
///
/// impl Provider for Gmail {
///     fn name(&self) -> &str { "gmail" }
/// }
///
/// let registry: Registry<dyn Provider> = Registry::for_category("email");
/// registry.register("gmail", Arc::new(Gmail)).unwrap();
///
/// assert!(registry.get("gmail").is_ok());
/// assert!(registry.register("gmail", Arc::new(Gmail)).is_err());
/// ```
pub struct Registry<T: ?Sized> {
    category: &'static str,
    providers: RwLock<HashMap<String, Arc<T>>>,
}

impl<T: ?Sized + Send + Sync> Registry<T> {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::for_category("provider")
    }

    /// Create a new empty registry whose diagnostics carry `category`.
    pub fn for_category(category: &'static str) -> Self {
        Self {
            category,
            providers: RwLock::new(HashMap::new()),
        }
    }

    /// Category label used in diagnostics.
    pub fn category(&self) -> &'static str {
        self.category
    }

    /// Register a provider under `name`.
    ///
    /// Fails with [`RegistryError::DuplicateProvider`] if the name is taken;
    /// the existing entry is left untouched.
    pub fn register(&self, name: impl Into<String>, provider: Arc<T>) -> RegistryResult<()> {
        let name = name.into();
        let mut providers = self.providers.write();
        if providers.contains_key(&name) {
            drop(providers);
            error!(category = self.category, name = %name, "duplicate provider registration");
            return Err(RegistryError::DuplicateProvider(name));
        }
        providers.insert(name.clone(), provider);
        drop(providers);

        debug!(category = self.category, name = %name, "provider registered");
        Ok(())
    }

    /// Get a provider by name.
    ///
    /// The returned handle is independent of the registry lock.
    pub fn get(&self, name: &str) -> RegistryResult<Arc<T>> {
        let found = self.providers.read().get(name).cloned();
        found.ok_or_else(|| {
            error!(category = self.category, name = %name, "provider not found");
            RegistryError::ProviderNotFound(name.to_string())
        })
    }

    /// Names of all registered providers, in no particular order.
    pub fn list(&self) -> Vec<String> {
        self.providers.read().keys().cloned().collect()
    }

    /// Check if a provider with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.providers.read().contains_key(name)
    }

    /// Get the number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }
}

impl<T: ?Sized + Send + Sync> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.providers.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("Registry")
            .field("category", &self.category)
            .field("providers", &names)
            .finish()
    }
}

/// Builder for creating registries with fluent API.
///
/// Duplicates are reported when the registry is built.
pub struct RegistryBuilder<T: ?Sized> {
    category: &'static str,
    entries: Vec<(String, Arc<T>)>,
}

impl<T: ?Sized + Send + Sync> RegistryBuilder<T> {
    /// Create a new registry builder.
    pub fn new(category: &'static str) -> Self {
        Self {
            category,
            entries: Vec::new(),
        }
    }

    /// Add a provider to the registry.
    pub fn with(mut self, name: impl Into<String>, provider: Arc<T>) -> Self {
        self.entries.push((name.into(), provider));
        self
    }

    /// Build the registry, failing on the first repeated name.
    pub fn build(self) -> RegistryResult<Registry<T>> {
        let registry = Registry::for_category(self.category);
        for (name, provider) in self.entries {
            registry.register(name, provider)?;
        }
        Ok(registry)
    }
}
