//! Built-in vision enhancement providers.
//!
//! - [`DefaultHighlighter`] outlines focus, navigator and caret
//! - [`ScreenCurtain`] blacks out the screen with a fullscreen color effect
//! - [`ScreenMask`] covers the screen with an opaque overlay
//!
//! The providers draw through sinks the host supplies in [`BuiltinSinks`].
//! Only providers whose sink is supplied are registered.

pub mod default_highlighter;
pub mod screen_curtain;
pub mod screen_mask;

use std::sync::Arc;

pub use default_highlighter::DefaultHighlighter;
pub use screen_curtain::ScreenCurtain;
pub use screen_mask::ScreenMask;

use crate::error::Result;
use crate::registry::{ProviderDescriptor, SharedProviderRegistry};
use crate::role::Role;
use crate::sink::{ColorTransformSink, HighlightSink};

/// Creates a highlight overlay.
pub type HighlightSinkFactory = Arc<dyn Fn() -> Box<dyn HighlightSink> + Send + Sync>;

/// Creates a color transform service handle.
pub type ColorTransformSinkFactory = Arc<dyn Fn() -> Box<dyn ColorTransformSink> + Send + Sync>;

/// Sink factories for the built-in providers.
#[derive(Clone, Default)]
pub struct BuiltinSinks {
    highlight_overlay: Option<HighlightSinkFactory>,
    color_effects: Option<ColorTransformSinkFactory>,
    mask_overlay: Option<ColorTransformSinkFactory>,
}

impl BuiltinSinks {
    /// No sinks: nothing gets registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay for the default highlighter.
    pub fn with_highlight_overlay<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn HighlightSink> + Send + Sync + 'static,
    {
        self.highlight_overlay = Some(Arc::new(factory));
        self
    }

    /// Fullscreen color effect service for the screen curtain.
    pub fn with_color_effects<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn ColorTransformSink> + Send + Sync + 'static,
    {
        self.color_effects = Some(Arc::new(factory));
        self
    }

    /// Overlay for the screen mask.
    pub fn with_mask_overlay<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn ColorTransformSink> + Send + Sync + 'static,
    {
        self.mask_overlay = Some(Arc::new(factory));
        self
    }
}

impl std::fmt::Debug for BuiltinSinks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinSinks")
            .field("highlight_overlay", &self.highlight_overlay.is_some())
            .field("color_effects", &self.color_effects.is_some())
            .field("mask_overlay", &self.mask_overlay.is_some())
            .finish()
    }
}

/// Descriptor of the default highlighter.
pub fn default_highlighter_descriptor(overlay: HighlightSinkFactory) -> Result<Arc<ProviderDescriptor>> {
    ProviderDescriptor::builder(default_highlighter::NAME)
        .description("Focus Highlight")
        .roles(Role::Highlighter)
        .factory(move || Ok(Box::new(DefaultHighlighter::new(overlay()))))
        .build()
}

/// Descriptor of the screen curtain.
pub fn screen_curtain_descriptor(effects: ColorTransformSinkFactory) -> Result<Arc<ProviderDescriptor>> {
    ProviderDescriptor::builder(screen_curtain::NAME)
        .description("Screen Curtain")
        .roles(Role::ColorEnhancer)
        .conflicts_with(Role::Magnifier)
        .factory(move || Ok(Box::new(ScreenCurtain::new(effects())?)))
        .build()
}

/// Descriptor of the screen mask.
pub fn screen_mask_descriptor(overlay: ColorTransformSinkFactory) -> Result<Arc<ProviderDescriptor>> {
    ProviderDescriptor::builder(screen_mask::NAME)
        .description("Screen Mask")
        .roles(Role::ColorEnhancer)
        .factory(move || Ok(Box::new(ScreenMask::new(overlay()))))
        .build()
}

/// Register the built-in providers whose sinks are supplied.
pub fn register_builtin_providers(registry: &SharedProviderRegistry, sinks: &BuiltinSinks) -> Result<()> {
    if let Some(overlay) = &sinks.mask_overlay {
        registry.register(screen_mask_descriptor(Arc::clone(overlay))?)?;
    }
    if let Some(overlay) = &sinks.highlight_overlay {
        registry.register(default_highlighter_descriptor(Arc::clone(overlay))?)?;
    }
    if let Some(effects) = &sinks.color_effects {
        registry.register(screen_curtain_descriptor(Arc::clone(effects))?)?;
    }
    Ok(())
}
