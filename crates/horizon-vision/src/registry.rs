//! Provider registry.
//!
//! The registry is the catalog of providers the engine can instantiate. Each
//! entry is a [`ProviderDescriptor`]: a unique name, the roles the provider
//! offers, the roles it conflicts with and a factory closure.
//!
//! Registration is static in the sense that nothing is discovered at run
//! time. Hosts register their providers up front, usually through
//! [`register_builtin_providers`](crate::providers::register_builtin_providers)
//! plus their own.
//!
//! # Example
//!
//! ```
//! use horizon_vision::{ProviderDescriptor, ProviderRegistry, Role, VisionProvider};
//!
//! struct Dummy;
//! impl VisionProvider for Dummy {}
//!
//! let mut registry = ProviderRegistry::new();
//! let descriptor = ProviderDescriptor::builder("dummy")
//!     .description("Does nothing")
//!     .roles([Role::ColorEnhancer])
//!     .factory(|| Ok(Box::new(Dummy)))
//!     .build()
//!     .unwrap();
//! registry.register(descriptor).unwrap();
//!
//! assert!(registry.contains("dummy"));
//! assert!(registry.register(registry.get("dummy").unwrap()).is_err());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use horizon_vision_core::logging::targets;
use parking_lot::RwLock;

use crate::config::is_no_provider;
use crate::error::{ProviderError, Result, VisionError};
use crate::provider::VisionProvider;
use crate::role::RoleSet;

/// Creates a fresh provider object.
pub type ProviderFactory =
    Arc<dyn Fn() -> std::result::Result<Box<dyn VisionProvider>, ProviderError> + Send + Sync>;

/// Static description of a provider.
pub struct ProviderDescriptor {
    name: String,
    description: String,
    supported_roles: RoleSet,
    conflicting_roles: RoleSet,
    factory: ProviderFactory,
}

impl ProviderDescriptor {
    /// Start describing a provider called `name`.
    pub fn builder(name: impl Into<String>) -> ProviderDescriptorBuilder {
        ProviderDescriptorBuilder::new(name)
    }

    /// Unique provider name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Roles this provider offers.
    pub fn supported_roles(&self) -> RoleSet {
        self.supported_roles
    }

    /// Roles that must be vacated before this provider can start.
    pub fn conflicting_roles(&self) -> RoleSet {
        self.conflicting_roles
    }

    /// Create a provider object.
    pub fn create_provider(&self) -> std::result::Result<Box<dyn VisionProvider>, ProviderError> {
        (self.factory)()
    }
}

impl fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("supported_roles", &self.supported_roles)
            .field("conflicting_roles", &self.conflicting_roles)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ProviderDescriptor`].
pub struct ProviderDescriptorBuilder {
    name: String,
    description: Option<String>,
    supported_roles: RoleSet,
    conflicting_roles: RoleSet,
    factory: Option<ProviderFactory>,
}

impl ProviderDescriptorBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            supported_roles: RoleSet::EMPTY,
            conflicting_roles: RoleSet::EMPTY,
            factory: None,
        }
    }

    /// Set the description. Defaults to the name.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the supported roles.
    pub fn roles(mut self, roles: impl Into<RoleSet>) -> Self {
        self.supported_roles = roles.into();
        self
    }

    /// Set the roles this provider conflicts with.
    pub fn conflicts_with(mut self, roles: impl Into<RoleSet>) -> Self {
        self.conflicting_roles = roles.into();
        self
    }

    /// Set the factory.
    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> std::result::Result<Box<dyn VisionProvider>, ProviderError>
            + Send
            + Sync
            + 'static,
    {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Validate and build the descriptor.
    ///
    /// Fails when the name is empty or reserved, no role or factory was
    /// given, or a role is both supported and conflicting.
    pub fn build(self) -> Result<Arc<ProviderDescriptor>> {
        if self.name.is_empty() {
            return Err(VisionError::MissingArgument("provider name"));
        }
        if is_no_provider(&self.name) {
            return Err(VisionError::InvalidArgument(format!(
                "'{}' is reserved and cannot name a provider",
                self.name
            )));
        }
        if self.supported_roles.is_empty() {
            return Err(VisionError::MissingArgument("supported roles"));
        }
        let overlap = self.supported_roles & self.conflicting_roles;
        if let Some(role) = overlap.iter().next() {
            return Err(VisionError::InvalidArgument(format!(
                "provider '{}' cannot both support and conflict with role {role}",
                self.name
            )));
        }
        let factory = self
            .factory
            .ok_or(VisionError::MissingArgument("provider factory"))?;
        Ok(Arc::new(ProviderDescriptor {
            description: self.description.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            supported_roles: self.supported_roles,
            conflicting_roles: self.conflicting_roles,
            factory,
        }))
    }
}

/// Catalog of registered providers, keyed by name.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<ProviderDescriptor>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider. Names must be unique.
    pub fn register(&mut self, descriptor: Arc<ProviderDescriptor>) -> Result<()> {
        if self.providers.contains_key(descriptor.name()) {
            return Err(VisionError::DuplicateProvider(descriptor.name().to_owned()));
        }
        tracing::debug!(
            target: targets::REGISTRY,
            name = descriptor.name(),
            roles = ?descriptor.supported_roles(),
            "registered vision enhancement provider"
        );
        self.providers
            .insert(descriptor.name().to_owned(), descriptor);
        Ok(())
    }

    /// Remove a provider.
    ///
    /// Running instances keep their descriptor alive and are unaffected.
    pub fn unregister(&mut self, name: &str) -> Result<Arc<ProviderDescriptor>> {
        let descriptor = self
            .providers
            .remove(name)
            .ok_or_else(|| VisionError::UnknownProvider(name.to_owned()))?;
        tracing::debug!(target: targets::REGISTRY, name, "unregistered vision enhancement provider");
        Ok(descriptor)
    }

    /// Look up a provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<ProviderDescriptor>> {
        self.providers.get(name).cloned()
    }

    /// Whether a provider with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.providers.keys().map(String::as_str)
    }

    /// Descriptors of providers that offer any of `roles`.
    pub fn providers_for(&self, roles: impl Into<RoleSet>) -> Vec<Arc<ProviderDescriptor>> {
        let roles = roles.into();
        self.providers
            .values()
            .filter(|d| !(d.supported_roles() & roles).is_empty())
            .cloned()
            .collect()
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// A thread-safe, shareable provider registry.
#[derive(Debug, Clone, Default)]
pub struct SharedProviderRegistry {
    inner: Arc<RwLock<ProviderRegistry>>,
}

impl SharedProviderRegistry {
    /// Create an empty shared registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute a function with read access to the registry.
    pub fn with_read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&ProviderRegistry) -> R,
    {
        f(&self.inner.read())
    }

    /// Execute a function with write access to the registry.
    pub fn with_write<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut ProviderRegistry) -> R,
    {
        f(&mut self.inner.write())
    }

    /// Add a provider.
    pub fn register(&self, descriptor: Arc<ProviderDescriptor>) -> Result<()> {
        self.with_write(|registry| registry.register(descriptor))
    }

    /// Remove a provider.
    pub fn unregister(&self, name: &str) -> Result<Arc<ProviderDescriptor>> {
        self.with_write(|registry| registry.unregister(name))
    }

    /// Look up a provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<ProviderDescriptor>> {
        self.with_read(|registry| registry.get(name))
    }

    /// Whether a provider with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.with_read(|registry| registry.contains(name))
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.with_read(|registry| registry.names().map(str::to_owned).collect())
    }
}

static GLOBAL_REGISTRY: OnceLock<SharedProviderRegistry> = OnceLock::new();

/// The process-wide provider registry.
///
/// Handlers created with [`VisionHandler::with_global_registry`](crate::VisionHandler::with_global_registry)
/// read from it.
pub fn global_registry() -> &'static SharedProviderRegistry {
    GLOBAL_REGISTRY.get_or_init(SharedProviderRegistry::new)
}

static_assertions::assert_impl_all!(ProviderDescriptor: Send, Sync);
static_assertions::assert_impl_all!(SharedProviderRegistry: Send, Sync);
