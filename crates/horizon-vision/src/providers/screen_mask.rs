//! Screen mask.
//!
//! Covers the screen with an opaque overlay. Unlike the screen curtain it
//! needs no system color effect support, only a topmost window.

use horizon_vision_core::Rgb;
use horizon_vision_core::logging::targets;

use crate::error::ProviderError;
use crate::provider::{ColorEnhancer, ColorTransformation, TransformValue, VisionProvider};
use crate::sink::ColorTransformSink;

/// Registered provider name.
pub const NAME: &str = "screenMask";

/// A color enhancer that masks the screen with a solid color.
pub struct ScreenMask {
    sink: Box<dyn ColorTransformSink>,
    transformations: Vec<ColorTransformation>,
    current: Option<usize>,
}

impl ScreenMask {
    /// Create a mask drawing through `sink`.
    pub fn new(sink: Box<dyn ColorTransformSink>) -> Self {
        let black = ColorTransformation::new(
            "black",
            Rgb::BLACK.to_string(),
            TransformValue::Fill(Rgb::BLACK),
        );
        Self {
            sink,
            transformations: vec![black],
            current: None,
        }
    }

    fn find(&self, name: &str) -> Result<usize, ProviderError> {
        self.transformations
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| ProviderError::UnknownTransformation(name.to_owned()))
    }
}

impl VisionProvider for ScreenMask {
    fn as_color_enhancer(&mut self) -> Option<&mut dyn ColorEnhancer> {
        Some(self)
    }
}

impl ColorEnhancer for ScreenMask {
    fn initialize_color_enhancer(&mut self) -> Result<(), ProviderError> {
        self.sink.acquire()?;
        if let Err(err) = self.sink.apply(&self.transformations[0]) {
            if let Err(release_err) = self.sink.release() {
                tracing::warn!(
                    target: targets::PROVIDERS,
                    err = %release_err,
                    "failed to release mask overlay after apply error"
                );
            }
            return Err(err);
        }
        self.current = Some(0);
        tracing::debug!(target: targets::PROVIDERS, "screen mask shown");
        Ok(())
    }

    fn terminate_color_enhancer(&mut self) -> Result<(), ProviderError> {
        self.sink.release()?;
        self.current = None;
        tracing::debug!(target: targets::PROVIDERS, "screen mask hidden");
        Ok(())
    }

    fn available_transformations(&self) -> &[ColorTransformation] {
        &self.transformations
    }

    fn transformation(&self) -> Option<&ColorTransformation> {
        self.current.map(|index| &self.transformations[index])
    }

    fn set_transformation(&mut self, name: &str) -> Result<(), ProviderError> {
        let index = self.find(name)?;
        // Only the shown mask is repainted; a hidden one picks it up on show.
        if self.current.is_some() {
            self.sink.apply(&self.transformations[index])?;
            self.current = Some(index);
        }
        Ok(())
    }
}
