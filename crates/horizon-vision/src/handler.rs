//! The vision handler.
//!
//! [`VisionHandler`] is the single owner of the role assignment table: for
//! each [`Role`] it records which live provider instance renders that role.
//! Providers are activated and deactivated only through
//! [`VisionHandler::set_provider`], and every accessibility event the host
//! receives is routed through the handler to the assigned providers.
//!
//! # Event Routing
//!
//! Focus, foreground and mouse events are forwarded immediately. Caret and
//! review cursor moves only mark a pending update, which the next
//! [`pump_cycle`](VisionHandler::pump_cycle) flushes once, no matter how
//! many moves arrived in between.
//!
//! # Example
//!
//! ```
//! use horizon_vision::{SharedProviderRegistry, SharedSettings, VisionHandler};
//! use horizon_vision_core::SharedAccessibleStore;
//!
//! let registry = SharedProviderRegistry::new();
//! let objects = SharedAccessibleStore::new();
//! let settings = SharedSettings::default();
//!
//! let mut handler = VisionHandler::new(registry, objects, settings);
//! assert!(!handler.is_enabled());
//!
//! // Deferred activation from configuration runs here.
//! handler.pump_cycle();
//! handler.terminate();
//! ```

use std::collections::VecDeque;

use horizon_vision_core::logging::{span_names, targets};
use horizon_vision_core::{AccessibleId, ObjectModel, PerfSpan, Point, Rect, ThreadAffinity};

use crate::config::{ConfigStore, NO_PROVIDER, is_no_provider};
use crate::context::ContextResolver;
use crate::error::{Result, VisionError};
use crate::instance::{InstanceId, InstanceManager, ProviderInstance};
use crate::provider::{ColorEnhancer, Highlighter, Magnifier};
use crate::pump::UpdatePump;
use crate::registry::{SharedProviderRegistry, global_registry};
use crate::role::{Context, Role, RoleSet};

/// A closure queued to run at the start of the next pump cycle.
pub type DeferredCall = Box<dyn FnOnce(&mut VisionHandler)>;

/// Accessibility events the handler consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisionEvent {
    /// An object gained focus.
    FocusChanged(AccessibleId),
    /// The foreground window changed.
    ForegroundChanged(AccessibleId),
    /// An object changed in place (location, name, state).
    ObjectUpdated(AccessibleId),
    /// The system caret moved within an object.
    CaretMoved(AccessibleId),
    /// The review cursor or navigator object moved.
    ReviewMoved(Context),
    /// The mouse moved over an object.
    MouseMoved {
        object: Option<AccessibleId>,
        x: i32,
        y: i32,
    },
    /// The active configuration profile changed.
    ProfileSwitched,
}

/// Orchestrates vision enhancement providers.
pub struct VisionHandler {
    pub(crate) registry: SharedProviderRegistry,
    pub(crate) objects: Box<dyn ObjectModel>,
    pub(crate) config: Box<dyn ConfigStore>,
    pub(crate) instances: InstanceManager,
    pub(crate) assignments: [Option<InstanceId>; Role::ALL.len()],
    pub(crate) pump: UpdatePump,
    pub(crate) deferred: VecDeque<DeferredCall>,
    pub(crate) affinity: ThreadAffinity,
}

impl VisionHandler {
    /// Create a handler.
    ///
    /// The configured provider of each role is activated at the start of the
    /// first [`pump_cycle`](Self::pump_cycle), one activation per distinct
    /// provider name. Activation failures there are logged, not returned.
    pub fn new(
        registry: SharedProviderRegistry,
        objects: impl ObjectModel + 'static,
        config: impl ConfigStore + 'static,
    ) -> Self {
        let mut handler = Self {
            registry,
            objects: Box::new(objects),
            config: Box::new(config),
            instances: InstanceManager::new(),
            assignments: [None; Role::ALL.len()],
            pump: UpdatePump::new(),
            deferred: VecDeque::new(),
            affinity: ThreadAffinity::current(),
        };

        let mut configured: Vec<(String, RoleSet)> = Vec::new();
        for role in Role::ALL {
            let Some(name) = handler.config.provider_for(role) else {
                continue;
            };
            match configured.iter_mut().find(|(n, _)| *n == name) {
                Some((_, roles)) => {
                    roles.insert(role);
                }
                None => configured.push((name, role.into())),
            }
        }
        for (name, roles) in configured {
            handler.call_after(move |handler| {
                if let Err(err) = handler.set_provider(&name, roles) {
                    tracing::warn!(
                        target: targets::HANDLER,
                        provider = %name,
                        ?roles,
                        %err,
                        "could not activate configured vision enhancement provider"
                    );
                }
            });
        }
        handler
    }

    /// Create a handler reading from the process-wide registry.
    pub fn with_global_registry(
        objects: impl ObjectModel + 'static,
        config: impl ConfigStore + 'static,
    ) -> Self {
        Self::new(global_registry().clone(), objects, config)
    }

    /// The provider registry this handler resolves names against.
    pub fn registry(&self) -> &SharedProviderRegistry {
        &self.registry
    }

    /// The host object model.
    pub fn objects(&self) -> &dyn ObjectModel {
        self.objects.as_ref()
    }

    /// Queue `f` to run at the start of the next pump cycle.
    pub fn call_after<F>(&mut self, f: F)
    where
        F: FnOnce(&mut VisionHandler) + 'static,
    {
        self.deferred.push_back(Box::new(f));
    }

    // =========================================================================
    // Role assignment
    // =========================================================================

    /// Activate provider `name` for `roles`.
    ///
    /// An empty role set means every role the provider supports. The name
    /// `none` terminates whatever holds each of `roles` instead, and then
    /// requires a non-empty role set.
    ///
    /// Roles the provider already holds are re-initialized. Roles held by
    /// other providers, and the roles the provider conflicts with, are
    /// terminated first. The assignment table is only updated once the
    /// provider initialized successfully; on failure no role is assigned to
    /// it by this call.
    pub fn set_provider(&mut self, name: &str, roles: impl Into<RoleSet>) -> Result<()> {
        self.affinity.debug_assert_same_thread();
        let _perf = PerfSpan::new(span_names::SET_PROVIDER);
        let roles = roles.into();

        if is_no_provider(name) {
            if roles.is_empty() {
                return Err(VisionError::MissingArgument("roles"));
            }
            for role in roles.iter() {
                self.terminate_provider_for_role(role)?;
                self.config.set_provider_for(role, None);
            }
            return Ok(());
        }

        let descriptor = self
            .registry
            .get(name)
            .ok_or_else(|| VisionError::UnknownProvider(name.to_owned()))?;
        let supported = descriptor.supported_roles();
        let roles = if roles.is_empty() {
            supported
        } else {
            if let Some(role) = (roles - supported).iter().next() {
                return Err(VisionError::unsupported_role(name, role));
            }
            roles
        };

        let id = self.instances.obtain(&descriptor)?;
        let active = self.active_roles_of(id);
        if !active.is_empty() {
            tracing::debug!(target: targets::HANDLER, provider = name, "provider is already active");
        }
        let overlapping = active & roles;
        let fresh = roles - overlapping;

        if !overlapping.is_empty()
            && let Err(err) = self.instance_mut(id, name)?.terminate(overlapping)
        {
            self.sync_assignments(id);
            return Err(err);
        }

        for role in (fresh | descriptor.conflicting_roles()).iter() {
            if self.assignments[role.index()] == Some(id) {
                continue;
            }
            if let Err(err) = self.terminate_provider_for_role(role) {
                self.sync_assignments(id);
                return Err(err);
            }
        }

        let resolver = ContextResolver::new(self.objects.as_ref());
        let initialized = match self.instances.get_mut(id) {
            Some(instance) => instance.initialize(roles, &resolver),
            None => Err(VisionError::UnknownProvider(name.to_owned())),
        };
        if let Err(err) = initialized {
            self.sync_assignments(id);
            return Err(err);
        }

        for role in fresh.iter() {
            self.assignments[role.index()] = Some(id);
            self.config.set_provider_for(role, Some(name));
        }
        tracing::info!(target: targets::HANDLER, provider = name, ?roles, "vision enhancement provider activated");
        Ok(())
    }

    /// Terminate whatever provider holds `role` and clear the assignment.
    ///
    /// Does nothing if no provider holds it. The provider instance is
    /// released once it has no active role left.
    pub fn terminate_provider_for_role(&mut self, role: Role) -> Result<()> {
        self.affinity.debug_assert_same_thread();
        let Some(id) = self.assignments[role.index()] else {
            return Ok(());
        };
        if let Some(instance) = self.instances.get_mut(id) {
            instance.terminate(role.into())?;
        }
        self.assignments[role.index()] = None;
        self.instances.release_if_idle(id);
        Ok(())
    }

    /// Make the assignment table agree with the active roles of `id` after
    /// a failed transition, and release the instance if it is idle.
    fn sync_assignments(&mut self, id: InstanceId) {
        let active = self.active_roles_of(id);
        for role in Role::ALL {
            if self.assignments[role.index()] == Some(id) && !active.contains(role) {
                self.assignments[role.index()] = None;
            }
        }
        self.instances.release_if_idle(id);
    }

    fn active_roles_of(&self, id: InstanceId) -> RoleSet {
        self.instances
            .get(id)
            .map(ProviderInstance::active_roles)
            .unwrap_or_default()
    }

    fn instance_mut(&mut self, id: InstanceId, name: &str) -> Result<&mut ProviderInstance> {
        self.instances
            .get_mut(id)
            .ok_or_else(|| VisionError::UnknownProvider(name.to_owned()))
    }

    /// The instance holding `role`, if it is enabled.
    fn enabled_holder(&mut self, role: Role) -> Option<&mut ProviderInstance> {
        let id = self.assignments[role.index()]?;
        self.instances
            .get_mut(id)
            .filter(|instance| instance.is_enabled())
    }

    /// Stop every provider and clear pending work.
    ///
    /// Termination errors are logged. The handler stays usable: providers
    /// can be activated again afterwards.
    pub fn terminate(&mut self) {
        self.affinity.debug_assert_same_thread();
        let _perf = PerfSpan::new(span_names::TERMINATE);
        for role in Role::ALL {
            if let Err(err) = self.terminate_provider_for_role(role) {
                tracing::error!(target: targets::HANDLER, %role, %err, "error terminating provider");
            }
        }
        let leftover: Vec<InstanceId> = self.instances.ids().collect();
        for id in leftover {
            self.instances.force_release(id);
        }
        self.assignments = [None; Role::ALL.len()];
        self.pump.clear();
        self.deferred.clear();
        tracing::debug!(target: targets::HANDLER, "vision handler terminated");
    }

    // =========================================================================
    // Event handling
    // =========================================================================

    /// Dispatch an accessibility event.
    ///
    /// Only a profile switch can fail; provider errors while tracking are
    /// logged and swallowed.
    pub fn handle_event(&mut self, event: VisionEvent) -> Result<()> {
        match event {
            VisionEvent::FocusChanged(object) => self.handle_gain_focus(object),
            VisionEvent::ForegroundChanged(object) => self.handle_foreground(object),
            VisionEvent::ObjectUpdated(object) => self.handle_object_update(object),
            VisionEvent::CaretMoved(object) => self.handle_caret_move(object),
            VisionEvent::ReviewMoved(context) => self.handle_review_move(context),
            VisionEvent::MouseMoved { object, x, y } => self.handle_mouse_move(object, x, y),
            VisionEvent::ProfileSwitched => return self.handle_profile_switch(),
        }
        Ok(())
    }

    /// An object gained focus.
    pub fn handle_gain_focus(&mut self, object: AccessibleId) {
        self.affinity.debug_assert_same_thread();
        self.update_now(Context::Focus, Some(object));
    }

    /// The foreground window changed.
    pub fn handle_foreground(&mut self, object: AccessibleId) {
        self.affinity.debug_assert_same_thread();
        self.update_now(Context::Foreground, Some(object));
    }

    /// An object changed in place.
    ///
    /// The focus object is updated immediately; the navigator object is
    /// treated as a review move.
    pub fn handle_object_update(&mut self, object: AccessibleId) {
        self.affinity.debug_assert_same_thread();
        if !self.is_enabled() {
            return;
        }
        if self.objects.focus_object() == Some(object) {
            self.update_now(Context::Focus, Some(object));
        } else if self.objects.navigator_object() == Some(object) {
            self.handle_review_move(Context::Navigator);
        }
    }

    /// The caret moved. Flushed on the next pump cycle.
    pub fn handle_caret_move(&mut self, object: AccessibleId) {
        self.affinity.debug_assert_same_thread();
        if !self.is_enabled() {
            return;
        }
        self.pump.mark_caret(object);
    }

    /// The review position moved. Flushed on the next pump cycle.
    pub fn handle_review_move(&mut self, context: Context) {
        self.affinity.debug_assert_same_thread();
        if !self.is_enabled() {
            return;
        }
        self.pump.mark_review(context);
    }

    /// The mouse moved. Only the magnifier follows the mouse.
    pub fn handle_mouse_move(&mut self, _object: Option<AccessibleId>, x: i32, y: i32) {
        self.affinity.debug_assert_same_thread();
        if let Some(magnifier) = self.enabled_holder(Role::Magnifier)
            && let Err(err) = magnifier.track_to_point(Point::new(x, y), Context::Mouse)
        {
            tracing::warn!(target: targets::HANDLER, %err, "magnifier failed to follow the mouse");
        }
    }

    /// The configuration profile changed.
    ///
    /// Every role whose configured provider differs from the one holding it
    /// is reassigned. All roles are attempted; the first error is returned.
    pub fn handle_profile_switch(&mut self) -> Result<()> {
        self.affinity.debug_assert_same_thread();
        let mut first_error = None;
        for role in Role::ALL {
            let configured = self.config.provider_for(role);
            let current = self.provider_for(role).map(str::to_owned);
            if configured == current {
                continue;
            }
            let name = configured.as_deref().unwrap_or(NO_PROVIDER);
            if let Err(err) = self.set_provider(name, role) {
                tracing::warn!(
                    target: targets::HANDLER,
                    %role,
                    provider = name,
                    %err,
                    "could not apply provider from switched profile"
                );
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Update the assigned highlighter's rectangle for `context`.
    ///
    /// Pass an explicit `rect`, an `object` to locate, or neither to locate
    /// the context's current object. Does nothing if no enabled highlighter
    /// is assigned. Fails if both `rect` and `object` are given or the
    /// highlighter does not draw `context`.
    pub fn update_context_rect(
        &mut self,
        context: Context,
        rect: Option<Rect>,
        object: Option<AccessibleId>,
    ) -> Result<()> {
        self.affinity.debug_assert_same_thread();
        let Some(id) = self.assignments[Role::Highlighter.index()] else {
            return Ok(());
        };
        let resolver = ContextResolver::new(self.objects.as_ref());
        match self.instances.get_mut(id) {
            Some(instance) if instance.is_enabled() => {
                instance.update_context_rect(&resolver, context, rect, object)
            }
            _ => Ok(()),
        }
    }

    /// Push `context` to the magnifier and highlighter right away.
    pub(crate) fn update_now(&mut self, context: Context, object: Option<AccessibleId>) {
        self.track_magnifier(context, object);
        self.update_highlighter(context, object);
    }

    pub(crate) fn track_magnifier(&mut self, context: Context, object: Option<AccessibleId>) {
        let Some(id) = self.assignments[Role::Magnifier.index()] else {
            return;
        };
        let resolver = ContextResolver::new(self.objects.as_ref());
        if let Some(instance) = self.instances.get_mut(id)
            && instance.is_enabled()
            && let Err(err) = instance.track_to_object(&resolver, context, object)
        {
            tracing::warn!(target: targets::HANDLER, %context, %err, "magnifier failed to track");
        }
    }

    pub(crate) fn update_highlighter(&mut self, context: Context, object: Option<AccessibleId>) {
        let Some(id) = self.assignments[Role::Highlighter.index()] else {
            return;
        };
        let resolver = ContextResolver::new(self.objects.as_ref());
        if let Some(instance) = self.instances.get_mut(id)
            && instance.is_enabled()
            && instance.highlights(context)
            && let Err(err) = instance.update_context_rect(&resolver, context, None, object)
        {
            tracing::warn!(target: targets::HANDLER, %context, %err, "highlighter failed to update");
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Name of the provider holding `role`.
    pub fn provider_for(&self, role: Role) -> Option<&str> {
        let id = self.assignments[role.index()]?;
        self.instances.get(id).map(ProviderInstance::name)
    }

    /// Roles active on provider `name`. Empty if it has no live instance.
    pub fn active_roles(&self, name: &str) -> RoleSet {
        self.instances
            .find(name)
            .map(|id| self.active_roles_of(id))
            .unwrap_or_default()
    }

    /// Names of the providers holding at least one role, in role order.
    pub fn initialized_providers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for role in Role::ALL {
            if let Some(name) = self.provider_for(role)
                && !names.contains(&name)
            {
                names.push(name);
            }
        }
        names
    }

    /// Whether any assigned provider is enabled.
    pub fn is_enabled(&self) -> bool {
        self.assignments
            .iter()
            .flatten()
            .filter_map(|id| self.instances.get(*id))
            .any(ProviderInstance::is_enabled)
    }

    /// Updates waiting for the next pump cycle.
    pub fn pending_updates(&self) -> &UpdatePump {
        &self.pump
    }

    /// The active highlighter's last known rectangle for `context`.
    pub fn context_rect(&self, context: Context) -> Option<Rect> {
        let id = self.assignments[Role::Highlighter.index()]?;
        self.instances.get(id)?.context_rects().get(context)
    }

    /// Run `f` against the assigned magnifier.
    pub fn with_magnifier<R>(&mut self, f: impl FnOnce(&mut dyn Magnifier) -> R) -> Option<R> {
        let id = self.assignments[Role::Magnifier.index()]?;
        let magnifier = self.instances.get_mut(id)?.provider_mut().as_magnifier()?;
        Some(f(magnifier))
    }

    /// Run `f` against the assigned highlighter.
    pub fn with_highlighter<R>(&mut self, f: impl FnOnce(&mut dyn Highlighter) -> R) -> Option<R> {
        let id = self.assignments[Role::Highlighter.index()]?;
        let highlighter = self.instances.get_mut(id)?.provider_mut().as_highlighter()?;
        Some(f(highlighter))
    }

    /// Run `f` against the assigned color enhancer.
    pub fn with_color_enhancer<R>(
        &mut self,
        f: impl FnOnce(&mut dyn ColorEnhancer) -> R,
    ) -> Option<R> {
        let id = self.assignments[Role::ColorEnhancer.index()]?;
        let enhancer = self.instances.get_mut(id)?.provider_mut().as_color_enhancer()?;
        Some(f(enhancer))
    }
}

impl Drop for VisionHandler {
    fn drop(&mut self) {
        if !self.instances.is_empty() {
            tracing::warn!(
                target: targets::HANDLER,
                providers = ?self.initialized_providers(),
                "vision handler dropped with active providers, terminating"
            );
            self.terminate();
        }
    }
}

impl std::fmt::Debug for VisionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionHandler")
            .field("magnifier", &self.provider_for(Role::Magnifier))
            .field("highlighter", &self.provider_for(Role::Highlighter))
            .field("color_enhancer", &self.provider_for(Role::ColorEnhancer))
            .field("pump", &self.pump)
            .field("deferred", &self.deferred.len())
            .finish_non_exhaustive()
    }
}
