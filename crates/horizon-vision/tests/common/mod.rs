//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use horizon_vision::{
    ColorEnhancer, ColorTransformation, Context, ContextRects, ContextSet, Highlighter, Magnifier,
    ProviderDescriptor, ProviderError, Role, RoleSet, SharedProviderRegistry, SharedSettings,
    VisionHandler, VisionProvider, VisionSettings,
};
use horizon_vision_core::{Rect, SharedAccessibleStore};
use parking_lot::{Mutex, RwLock};

/// Install a test-friendly tracing subscriber once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Ordered record of every provider hook call, shared by all mocks of a test.
#[derive(Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
    fail_on: Arc<Mutex<Option<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `entry`; fails if it was set with [`fail_on`](Self::fail_on).
    pub fn record(&self, entry: String) -> Result<(), ProviderError> {
        let fail = self.fail_on.lock().as_deref() == Some(entry.as_str());
        self.entries.lock().push(entry.clone());
        if fail {
            Err(ProviderError::Backend(entry))
        } else {
            Ok(())
        }
    }

    /// Make the hook recorded as `entry` fail.
    pub fn fail_on(&self, entry: &str) {
        *self.fail_on.lock() = Some(entry.to_owned());
    }

    pub fn clear_failure(&self) {
        *self.fail_on.lock() = None;
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.entries.lock())
    }

    /// Number of entries starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    /// Position of the first entry equal to `entry`.
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries.lock().iter().position(|e| e == entry)
    }
}

/// Formats a rectangle the way mocks record it.
pub fn ltrb(rect: Rect) -> String {
    format!("{},{},{},{}", rect.left, rect.top, rect.right, rect.bottom)
}

/// A provider exposing a configurable set of capabilities and recording
/// every hook call in a [`Journal`].
pub struct MockProvider {
    name: String,
    journal: Journal,
    exposed: RoleSet,
    contexts: ContextSet,
    level: f32,
    transformations: Vec<ColorTransformation>,
}

impl MockProvider {
    pub fn new(name: &str, exposed: RoleSet, journal: Journal) -> Self {
        Self {
            name: name.to_owned(),
            journal,
            exposed,
            contexts: ContextSet::from([
                Context::Focus,
                Context::Navigator,
                Context::Review,
                Context::Caret,
            ]),
            level: 1.0,
            transformations: Vec::new(),
        }
    }

    fn record(&self, what: impl std::fmt::Display) -> Result<(), ProviderError> {
        self.journal.record(format!("{}: {what}", self.name))
    }
}

impl VisionProvider for MockProvider {
    fn as_magnifier(&mut self) -> Option<&mut dyn Magnifier> {
        if self.exposed.contains(Role::Magnifier) {
            Some(self)
        } else {
            None
        }
    }

    fn as_highlighter(&mut self) -> Option<&mut dyn Highlighter> {
        if self.exposed.contains(Role::Highlighter) {
            Some(self)
        } else {
            None
        }
    }

    fn as_color_enhancer(&mut self) -> Option<&mut dyn ColorEnhancer> {
        if self.exposed.contains(Role::ColorEnhancer) {
            Some(self)
        } else {
            None
        }
    }

    fn shutdown(&mut self) {
        let _ = self.record("shutdown");
    }
}

impl Magnifier for MockProvider {
    fn initialize_magnifier(&mut self) -> Result<(), ProviderError> {
        self.record("init magnifier")
    }

    fn terminate_magnifier(&mut self) -> Result<(), ProviderError> {
        self.record("term magnifier")
    }

    fn track_to_rectangle(&mut self, rect: Rect, context: Context) -> Result<(), ProviderError> {
        self.record(format!("track {context} {}", ltrb(rect)))
    }

    fn magnification_level(&self) -> f32 {
        self.level
    }

    fn set_magnification_level(&mut self, level: f32) -> Result<(), ProviderError> {
        self.level = level;
        Ok(())
    }
}

impl Highlighter for MockProvider {
    fn supported_contexts(&self) -> ContextSet {
        self.contexts
    }

    fn initialize_highlighter(&mut self) -> Result<(), ProviderError> {
        self.record("init highlighter")
    }

    fn terminate_highlighter(&mut self) -> Result<(), ProviderError> {
        self.record("term highlighter")
    }

    fn context_rect_updated(
        &mut self,
        context: Context,
        _rects: &ContextRects,
    ) -> Result<(), ProviderError> {
        self.record(format!("updated {context}"))
    }

    fn refresh(&mut self, _rects: &ContextRects) -> Result<(), ProviderError> {
        self.record("refresh")
    }
}

impl ColorEnhancer for MockProvider {
    fn initialize_color_enhancer(&mut self) -> Result<(), ProviderError> {
        self.record("init colorEnhancer")
    }

    fn terminate_color_enhancer(&mut self) -> Result<(), ProviderError> {
        self.record("term colorEnhancer")
    }

    fn available_transformations(&self) -> &[ColorTransformation] {
        &self.transformations
    }

    fn transformation(&self) -> Option<&ColorTransformation> {
        None
    }

    fn set_transformation(&mut self, name: &str) -> Result<(), ProviderError> {
        Err(ProviderError::UnknownTransformation(name.to_owned()))
    }
}

/// Descriptor for a [`MockProvider`] exposing exactly the declared roles.
pub fn mock_descriptor(
    name: &'static str,
    roles: impl Into<RoleSet>,
    conflicts: impl Into<RoleSet>,
    journal: &Journal,
) -> Arc<ProviderDescriptor> {
    let roles = roles.into();
    mock_descriptor_exposing(name, roles, roles, conflicts, journal)
}

/// Descriptor whose declared roles may differ from what the provider exposes.
pub fn mock_descriptor_exposing(
    name: &'static str,
    declared: impl Into<RoleSet>,
    exposed: impl Into<RoleSet>,
    conflicts: impl Into<RoleSet>,
    journal: &Journal,
) -> Arc<ProviderDescriptor> {
    let exposed = exposed.into();
    let journal = journal.clone();
    ProviderDescriptor::builder(name)
        .roles(declared)
        .conflicts_with(conflicts)
        .factory(move || Ok(Box::new(MockProvider::new(name, exposed, journal.clone()))))
        .build()
        .unwrap()
}

/// A registry with four mocks, an empty object store and empty settings.
///
/// - `magnifier`: Magnifier
/// - `highlighter`: Highlighter
/// - `combo`: Magnifier and Highlighter
/// - `curtain`: ColorEnhancer, conflicts with Magnifier
pub struct Fixture {
    pub registry: SharedProviderRegistry,
    pub objects: SharedAccessibleStore,
    pub settings: SharedSettings,
    pub journal: Journal,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_settings(VisionSettings::new())
    }

    pub fn with_settings(settings: VisionSettings) -> Self {
        init_tracing();
        let journal = Journal::new();
        let registry = SharedProviderRegistry::new();
        let none = RoleSet::EMPTY;
        registry
            .register(mock_descriptor("magnifier", Role::Magnifier, none, &journal))
            .unwrap();
        registry
            .register(mock_descriptor("highlighter", Role::Highlighter, none, &journal))
            .unwrap();
        registry
            .register(mock_descriptor(
                "combo",
                [Role::Magnifier, Role::Highlighter],
                none,
                &journal,
            ))
            .unwrap();
        registry
            .register(mock_descriptor(
                "curtain",
                Role::ColorEnhancer,
                Role::Magnifier,
                &journal,
            ))
            .unwrap();

        Self {
            registry,
            objects: SharedAccessibleStore::new(),
            settings: Arc::new(RwLock::new(settings)),
            journal,
        }
    }

    pub fn handler(&self) -> VisionHandler {
        VisionHandler::new(
            self.registry.clone(),
            self.objects.clone(),
            self.settings.clone(),
        )
    }

    pub fn configured(&self, role: Role) -> Option<String> {
        self.settings.read().provider_for(role).map(str::to_owned)
    }
}

/// Every role held by `name` in the assignment table is active on it, and
/// nothing else is.
pub fn assert_assignments_match(handler: &VisionHandler, names: &[&str]) {
    for name in names {
        let assigned: RoleSet = Role::ALL
            .into_iter()
            .filter(|role| handler.provider_for(*role) == Some(*name))
            .collect();
        assert_eq!(
            handler.active_roles(name),
            assigned,
            "active roles of '{name}' disagree with the assignment table"
        );
    }
}
