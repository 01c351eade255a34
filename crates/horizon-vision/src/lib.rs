//! Horizon Vision - vision enhancement provider engine.
//!
//! Horizon Vision coordinates the providers that make the screen easier to
//! see for low-vision users: magnifiers, focus highlighters and color
//! enhancers such as a screen curtain. It decides which provider renders
//! each role, resolves conflicts between them, and turns accessibility
//! events into rectangles the providers can track.
//!
//! # Architecture
//!
//! - [`ProviderRegistry`]: catalog of [`ProviderDescriptor`]s
//! - [`VisionHandler`]: the role assignment table and event routing
//! - [`InstanceManager`]: one live [`ProviderInstance`] per provider
//! - [`ContextResolver`]: from a [`Context`] to an object and a rectangle
//! - [`UpdatePump`]: caret and review moves coalesced per cycle
//! - [`VisionSettings`]: per-role provider selection with profiles
//!
//! The host owns the accessibility object tree and the screen. It reaches
//! the engine through [`ObjectModel`](horizon_vision_core::ObjectModel) for
//! object geometry, [`ConfigStore`] for persisted choices, and the sinks in
//! [`sink`] for drawing.
//!
//! # Quick Start
//!
//! ```
//! use horizon_vision::providers::{BuiltinSinks, register_builtin_providers};
//! use horizon_vision::{
//!     HighlightSink, Outline, ProviderError, Role, SharedProviderRegistry, SharedSettings,
//!     VisionEvent, VisionHandler,
//! };
//! use horizon_vision_core::{Rect, SharedAccessibleStore};
//!
//! struct NullOverlay;
//!
//! impl HighlightSink for NullOverlay {
//!     fn open(&mut self) -> Result<(), ProviderError> { Ok(()) }
//!     fn close(&mut self) -> Result<(), ProviderError> { Ok(()) }
//!     fn present(&mut self, _: &[Outline]) -> Result<(), ProviderError> { Ok(()) }
//! }
//!
//! let registry = SharedProviderRegistry::new();
//! let sinks = BuiltinSinks::new().with_highlight_overlay(|| Box::new(NullOverlay));
//! register_builtin_providers(&registry, &sinks).unwrap();
//!
//! let objects = SharedAccessibleStore::new();
//! let button = objects.with_write(|store| store.insert("OK", Some(Rect::new(10, 10, 90, 34))));
//!
//! let mut handler = VisionHandler::new(registry, objects.clone(), SharedSettings::default());
//! handler.set_provider("defaultHighlighter", Role::Highlighter).unwrap();
//!
//! objects.with_write(|store| store.set_focus(Some(button))).unwrap();
//! handler.handle_event(VisionEvent::FocusChanged(button)).unwrap();
//! handler.pump_cycle();
//!
//! assert_eq!(
//!     handler.context_rect(horizon_vision::Context::Focus),
//!     Some(Rect::new(10, 10, 90, 34))
//! );
//! handler.terminate();
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod instance;
pub mod provider;
pub mod providers;
pub mod pump;
pub mod registry;
pub mod role;
pub mod sink;

pub use config::{ConfigStore, NO_PROVIDER, RoleSelection, SharedSettings, VisionSettings, is_no_provider};
pub use context::{ContextRects, ContextResolver};
pub use error::{ConfigError, ProviderError, Result, VisionError};
pub use handler::{DeferredCall, VisionEvent, VisionHandler};
pub use instance::{InstanceId, InstanceManager, ProviderInstance};
pub use provider::{
    ColorEnhancer, ColorMatrix, ColorTransformation, Highlighter, Magnifier, TransformValue,
    VisionProvider,
};
pub use pump::{CaretFlush, CycleReport, UpdatePump};
pub use registry::{
    ProviderDescriptor, ProviderDescriptorBuilder, ProviderFactory, ProviderRegistry,
    SharedProviderRegistry, global_registry,
};
pub use role::{Context, ContextSet, Role, RoleSet};
pub use sink::{ColorTransformSink, HighlightSink, Outline};

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        ColorEnhancer, Context, ContextSet, Highlighter, Magnifier, ProviderDescriptor,
        ProviderError, Role, RoleSet, SharedProviderRegistry, VisionError, VisionEvent,
        VisionHandler, VisionProvider,
    };
    pub use horizon_vision_core::{AccessibleId, ObjectModel, Point, Rect, Rgb};
}
