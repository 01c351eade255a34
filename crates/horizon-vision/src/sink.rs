//! Rendering and color transform boundaries.
//!
//! Built-in providers never draw or call the operating system themselves.
//! They push what they want shown into a sink supplied by the host: a
//! [`HighlightSink`] for on-screen outlines and overlays, a
//! [`ColorTransformSink`] for fullscreen color effects. Sinks report only
//! success or failure.

use horizon_vision_core::{Rect, Rgb};

use crate::error::ProviderError;
use crate::provider::ColorTransformation;
use crate::role::Context;

/// One outline to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outline {
    /// The context this outline marks.
    pub context: Context,
    /// Outer rectangle of the outline.
    pub rect: Rect,
    /// Stroke color.
    pub color: Rgb,
    /// Stroke width in pixels.
    pub width: u32,
}

/// An on-screen overlay that draws outlines.
pub trait HighlightSink {
    /// Create the overlay window.
    fn open(&mut self) -> Result<(), ProviderError>;

    /// Destroy the overlay window.
    fn close(&mut self) -> Result<(), ProviderError>;

    /// Replace everything drawn with `outlines`.
    fn present(&mut self, outlines: &[Outline]) -> Result<(), ProviderError>;
}

/// A fullscreen color transform service.
pub trait ColorTransformSink {
    /// Whether the service works on this system.
    fn is_supported(&self) -> bool {
        true
    }

    /// Acquire the service.
    fn acquire(&mut self) -> Result<(), ProviderError>;

    /// Release the service.
    fn release(&mut self) -> Result<(), ProviderError>;

    /// Apply a transformation to the whole screen.
    fn apply(&mut self, transformation: &ColorTransformation) -> Result<(), ProviderError>;
}
