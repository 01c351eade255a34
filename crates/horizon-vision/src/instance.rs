//! Provider instances and the singleton instance manager.
//!
//! A [`ProviderInstance`] wraps the provider object created by a descriptor's
//! factory together with the roles currently active on it and, for
//! highlighters, the context rectangle map. Role activation and deactivation
//! go through [`ProviderInstance::initialize`] and
//! [`ProviderInstance::terminate`], which call each role's hook exactly once
//! per transition.
//!
//! The [`InstanceManager`] keeps at most one live instance per descriptor.
//! An instance is created on first activation and dropped when its last role
//! is terminated; a later activation builds a fresh one. A descriptor
//! registered again under a name whose old instance is still live gets its
//! own instance; the old one is never reused.

use std::collections::HashMap;
use std::sync::Arc;

use horizon_vision_core::logging::targets;
use horizon_vision_core::{AccessibleId, Point, Rect};
use slotmap::{SlotMap, new_key_type};

use crate::context::{ContextRects, ContextResolver};
use crate::error::{Result, VisionError};
use crate::provider::{VisionProvider, implemented_roles, initialize_role, terminate_role};
use crate::registry::ProviderDescriptor;
use crate::role::{Context, Role, RoleSet};

new_key_type! {
    /// Handle to a live provider instance.
    pub struct InstanceId;
}

/// A live provider and its active roles.
pub struct ProviderInstance {
    descriptor: Arc<ProviderDescriptor>,
    provider: Box<dyn VisionProvider>,
    supported_roles: RoleSet,
    active_roles: RoleSet,
    context_rects: ContextRects,
}

impl ProviderInstance {
    /// Create the provider through the descriptor's factory.
    ///
    /// Fails if the factory fails or the provider does not expose a role its
    /// descriptor declares.
    pub fn new(descriptor: Arc<ProviderDescriptor>) -> Result<Self> {
        let mut provider = descriptor
            .create_provider()
            .map_err(|source| VisionError::provider(descriptor.name(), source))?;

        let implemented = implemented_roles(provider.as_mut());
        let declared = descriptor.supported_roles();
        if let Some(role) = (declared - implemented).iter().next() {
            return Err(VisionError::CapabilityMismatch {
                provider: descriptor.name().to_owned(),
                role,
            });
        }

        tracing::debug!(
            target: targets::INSTANCE,
            provider = descriptor.name(),
            roles = ?declared,
            "created provider instance"
        );
        Ok(Self {
            supported_roles: declared & implemented,
            descriptor,
            provider,
            active_roles: RoleSet::EMPTY,
            context_rects: ContextRects::new(),
        })
    }

    /// Provider name.
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// The descriptor this instance was created from.
    pub fn descriptor(&self) -> &Arc<ProviderDescriptor> {
        &self.descriptor
    }

    /// Roles this instance can take.
    pub fn supported_roles(&self) -> RoleSet {
        self.supported_roles
    }

    /// Roles currently active.
    pub fn active_roles(&self) -> RoleSet {
        self.active_roles
    }

    /// Whether the provider is running and has any active role.
    pub fn is_enabled(&self) -> bool {
        self.provider.is_running() && !self.active_roles.is_empty()
    }

    /// The highlighter's context rectangle map.
    pub fn context_rects(&self) -> &ContextRects {
        &self.context_rects
    }

    /// The provider object.
    pub fn provider_mut(&mut self) -> &mut dyn VisionProvider {
        self.provider.as_mut()
    }

    fn check_supported(&self, roles: RoleSet) -> Result<()> {
        match (roles - self.supported_roles).iter().next() {
            Some(role) => Err(VisionError::unsupported_role(self.name(), role)),
            None => Ok(()),
        }
    }

    /// Activate `roles`, or every supported role for an empty set.
    ///
    /// Roles that are already active are skipped. If a hook fails, the roles
    /// activated by this call are terminated again before the error is
    /// returned. Returns the roles this call activated.
    pub fn initialize(&mut self, roles: RoleSet, resolver: &ContextResolver<'_>) -> Result<RoleSet> {
        let roles = if roles.is_empty() {
            self.supported_roles
        } else {
            roles
        };
        self.check_supported(roles)?;

        let mut activated = RoleSet::EMPTY;
        for role in roles.iter() {
            if self.active_roles.contains(role) {
                tracing::debug!(
                    target: targets::INSTANCE,
                    provider = self.name(),
                    %role,
                    "role already initialized, ignoring"
                );
                continue;
            }
            if let Err(source) = initialize_role(self.provider.as_mut(), role) {
                let err = VisionError::provider(self.name(), source);
                self.roll_back(activated);
                return Err(err);
            }
            self.active_roles.insert(role);
            activated.insert(role);
            if role == Role::Highlighter {
                self.seed_context_rects(resolver);
            }
            tracing::debug!(
                target: targets::INSTANCE,
                provider = self.name(),
                %role,
                "initialized role"
            );
        }
        Ok(activated)
    }

    fn roll_back(&mut self, roles: RoleSet) {
        for role in roles.iter() {
            if let Err(err) = terminate_role(self.provider.as_mut(), role) {
                tracing::error!(
                    target: targets::INSTANCE,
                    provider = self.descriptor.name(),
                    %role,
                    %err,
                    "failed to roll back role after initialization error"
                );
            }
            self.active_roles.remove(role);
            if role == Role::Highlighter {
                self.context_rects.clear();
            }
        }
    }

    fn seed_context_rects(&mut self, resolver: &ContextResolver<'_>) {
        let Some(highlighter) = self.provider.as_highlighter() else {
            return;
        };
        for context in highlighter.supported_contexts().iter() {
            let rect = highlighter.locate(resolver, context, None);
            self.context_rects.set(context, rect);
        }
    }

    /// Deactivate `roles`, or every active role for an empty set.
    ///
    /// Roles that are not active are skipped. Stops at the first failing
    /// hook; the failing role stays active. Returns the roles this call
    /// deactivated.
    pub fn terminate(&mut self, roles: RoleSet) -> Result<RoleSet> {
        let roles = if roles.is_empty() {
            self.active_roles
        } else {
            roles
        };
        self.check_supported(roles)?;

        let mut deactivated = RoleSet::EMPTY;
        for role in roles.iter() {
            if !self.active_roles.contains(role) {
                tracing::debug!(
                    target: targets::INSTANCE,
                    provider = self.name(),
                    %role,
                    "role not initialized, ignoring"
                );
                continue;
            }
            terminate_role(self.provider.as_mut(), role)
                .map_err(|source| VisionError::provider(self.descriptor.name(), source))?;
            self.active_roles.remove(role);
            deactivated.insert(role);
            if role == Role::Highlighter {
                self.context_rects.clear();
            }
            tracing::debug!(
                target: targets::INSTANCE,
                provider = self.name(),
                %role,
                "terminated role"
            );
        }
        Ok(deactivated)
    }

    /// Update the highlight rectangle of `context`.
    ///
    /// With neither `rect` nor `object`, the rectangle is located from the
    /// context's current object. Supplying both is an error. A context that
    /// cannot be located is recorded as absent.
    pub fn update_context_rect(
        &mut self,
        resolver: &ContextResolver<'_>,
        context: Context,
        rect: Option<Rect>,
        object: Option<AccessibleId>,
    ) -> Result<()> {
        let name = self.descriptor.name();
        let Some(highlighter) = self.provider.as_highlighter() else {
            return Err(VisionError::unsupported_role(name, Role::Highlighter));
        };
        if !highlighter.supported_contexts().contains(context) {
            return Err(VisionError::UnsupportedContext {
                provider: name.to_owned(),
                context,
            });
        }
        if rect.is_some() && object.is_some() {
            return Err(VisionError::InvalidArgument(
                "only one of rect or object should be provided".to_owned(),
            ));
        }

        let rect = rect.or_else(|| highlighter.locate(resolver, context, object));
        tracing::trace!(target: targets::INSTANCE, provider = name, %context, ?rect, "context rect updated");
        self.context_rects.set(context, rect);
        highlighter
            .context_rect_updated(context, &self.context_rects)
            .map_err(|source| VisionError::provider(name, source))
    }

    /// Push the context rectangle map to the highlighter's renderer.
    pub fn refresh(&mut self) -> Result<()> {
        let name = self.descriptor.name();
        let Some(highlighter) = self.provider.as_highlighter() else {
            return Err(VisionError::unsupported_role(name, Role::Highlighter));
        };
        highlighter
            .refresh(&self.context_rects)
            .map_err(|source| VisionError::provider(name, source))
    }

    /// Move the magnifier to the object of `context`.
    pub fn track_to_object(
        &mut self,
        resolver: &ContextResolver<'_>,
        context: Context,
        object: Option<AccessibleId>,
    ) -> Result<()> {
        let name = self.descriptor.name();
        let Some(magnifier) = self.provider.as_magnifier() else {
            return Err(VisionError::unsupported_role(name, Role::Magnifier));
        };
        magnifier
            .track_to_object(resolver, context, object)
            .map_err(|source| VisionError::provider(name, source))
    }

    /// Move the magnifier to a screen point.
    pub fn track_to_point(&mut self, point: Point, context: Context) -> Result<()> {
        let name = self.descriptor.name();
        let Some(magnifier) = self.provider.as_magnifier() else {
            return Err(VisionError::unsupported_role(name, Role::Magnifier));
        };
        magnifier
            .track_to_point(point, context)
            .map_err(|source| VisionError::provider(name, source))
    }

    /// Whether the highlighter draws `context`.
    pub fn highlights(&mut self, context: Context) -> bool {
        self.provider
            .as_highlighter()
            .is_some_and(|highlighter| highlighter.supported_contexts().contains(context))
    }
}

impl std::fmt::Debug for ProviderInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderInstance")
            .field("name", &self.name())
            .field("supported_roles", &self.supported_roles)
            .field("active_roles", &self.active_roles)
            .finish_non_exhaustive()
    }
}

/// Owns every live provider instance, at most one per descriptor.
#[derive(Debug, Default)]
pub struct InstanceManager {
    instances: SlotMap<InstanceId, ProviderInstance>,
    by_name: HashMap<String, InstanceId>,
}

impl InstanceManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// The live instance for `descriptor`, created if there is none.
    pub fn obtain(&mut self, descriptor: &Arc<ProviderDescriptor>) -> Result<InstanceId> {
        if let Some(&id) = self.by_name.get(descriptor.name()) {
            match self.instances.get(id) {
                Some(live) if Arc::ptr_eq(live.descriptor(), descriptor) => {
                    tracing::trace!(
                        target: targets::INSTANCE,
                        provider = descriptor.name(),
                        "reusing live provider instance"
                    );
                    return Ok(id);
                }
                _ => tracing::debug!(
                    target: targets::INSTANCE,
                    provider = descriptor.name(),
                    "live instance belongs to a replaced descriptor, not reusing it"
                ),
            }
        }
        let instance = ProviderInstance::new(Arc::clone(descriptor))?;
        let id = self.instances.insert(instance);
        self.by_name.insert(descriptor.name().to_owned(), id);
        Ok(id)
    }

    /// Look up an instance.
    pub fn get(&self, id: InstanceId) -> Option<&ProviderInstance> {
        self.instances.get(id)
    }

    /// Look up an instance mutably.
    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut ProviderInstance> {
        self.instances.get_mut(id)
    }

    /// The live instance of the most recently obtained descriptor called `name`.
    pub fn find(&self, name: &str) -> Option<InstanceId> {
        self.by_name.get(name).copied()
    }

    /// Drop the instance if it has no active role left.
    ///
    /// The provider's shutdown hook runs before it is dropped. Returns
    /// whether the instance was released.
    pub fn release_if_idle(&mut self, id: InstanceId) -> bool {
        match self.instances.get(id) {
            Some(instance) if instance.active_roles().is_empty() => {
                self.remove(id);
                true
            }
            _ => false,
        }
    }

    /// Terminate every active role of the instance and drop it.
    ///
    /// Termination failures are logged; the instance is dropped regardless.
    pub fn force_release(&mut self, id: InstanceId) {
        let Some(instance) = self.instances.get_mut(id) else {
            return;
        };
        while !instance.active_roles().is_empty() {
            if let Err(err) = instance.terminate(RoleSet::EMPTY) {
                tracing::error!(
                    target: targets::INSTANCE,
                    provider = instance.name(),
                    %err,
                    "error terminating provider"
                );
                // A failing hook leaves its role active; forget it so the
                // remaining roles still get terminated.
                if let Some(role) = instance.active_roles.iter().next() {
                    instance.active_roles.remove(role);
                }
            }
        }
        self.remove(id);
    }

    fn remove(&mut self, id: InstanceId) {
        if let Some(mut instance) = self.instances.remove(id) {
            if self.by_name.get(instance.name()) == Some(&id) {
                self.by_name.remove(instance.name());
            }
            instance.provider.shutdown();
            tracing::debug!(
                target: targets::INSTANCE,
                provider = instance.name(),
                "released provider instance"
            );
        }
    }

    /// Handles of every live instance.
    pub fn ids(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.instances.keys()
    }

    /// Every live instance.
    pub fn iter(&self) -> impl Iterator<Item = (InstanceId, &ProviderInstance)> + '_ {
        self.instances.iter()
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether no instance is live.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
