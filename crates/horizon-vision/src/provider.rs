//! Provider capability model.
//!
//! A vision enhancement provider implements [`VisionProvider`] plus one
//! capability trait per role it offers:
//!
//! - [`Magnifier`] - tracks a screen rectangle and magnifies around it
//! - [`Highlighter`] - draws highlights around context rectangles
//! - [`ColorEnhancer`] - applies a named color transformation to the screen
//!
//! The engine never inspects a provider's concrete type. It reaches a
//! capability through the `as_*` accessors on [`VisionProvider`], which a
//! provider overrides for exactly the roles it implements. A provider's
//! [`ProviderDescriptor`](crate::ProviderDescriptor) declares the same roles
//! up front, and the two are checked against each other when the provider is
//! first instantiated.
//!
//! # Example
//!
//! ```
//! use horizon_vision::{
//!     ContextResolver, ContextRects, ContextSet, Context, Highlighter, ProviderError,
//!     VisionProvider,
//! };
//!
//! struct LogHighlighter;
//!
//! impl VisionProvider for LogHighlighter {
//!     fn as_highlighter(&mut self) -> Option<&mut dyn Highlighter> {
//!         Some(self)
//!     }
//! }
//!
//! impl Highlighter for LogHighlighter {
//!     fn supported_contexts(&self) -> ContextSet {
//!         ContextSet::from([Context::Focus])
//!     }
//!
//!     fn initialize_highlighter(&mut self) -> Result<(), ProviderError> {
//!         Ok(())
//!     }
//!
//!     fn terminate_highlighter(&mut self) -> Result<(), ProviderError> {
//!         Ok(())
//!     }
//!
//!     fn refresh(&mut self, rects: &ContextRects) -> Result<(), ProviderError> {
//!         for (context, rect) in rects.iter() {
//!             println!("{context}: {rect:?}");
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use std::fmt;

use horizon_vision_core::{AccessibleId, Point, Rect, Rgb};
use horizon_vision_core::logging::targets;

use crate::context::{ContextRects, ContextResolver};
use crate::error::ProviderError;
use crate::role::{Context, ContextSet, Role, RoleSet};

/// Base trait for every vision enhancement provider.
pub trait VisionProvider {
    /// Magnifier capability, if implemented.
    fn as_magnifier(&mut self) -> Option<&mut dyn Magnifier> {
        None
    }

    /// Highlighter capability, if implemented.
    fn as_highlighter(&mut self) -> Option<&mut dyn Highlighter> {
        None
    }

    /// Color enhancer capability, if implemented.
    fn as_color_enhancer(&mut self) -> Option<&mut dyn ColorEnhancer> {
        None
    }

    /// Whether the provider's backend is running.
    ///
    /// Providers that drive an out-of-process service override this. An
    /// instance whose provider is not running receives no tracking calls.
    fn is_running(&self) -> bool {
        true
    }

    /// Called once after the provider's last active role is terminated,
    /// right before the instance is dropped.
    fn shutdown(&mut self) {}
}

/// The roles a provider actually exposes through its `as_*` accessors.
pub(crate) fn implemented_roles(provider: &mut dyn VisionProvider) -> RoleSet {
    let mut roles = RoleSet::EMPTY;
    if provider.as_magnifier().is_some() {
        roles.insert(Role::Magnifier);
    }
    if provider.as_highlighter().is_some() {
        roles.insert(Role::Highlighter);
    }
    if provider.as_color_enhancer().is_some() {
        roles.insert(Role::ColorEnhancer);
    }
    roles
}

/// Run the initialize hook for `role`.
pub(crate) fn initialize_role(
    provider: &mut dyn VisionProvider,
    role: Role,
) -> Result<(), ProviderError> {
    match role {
        Role::Magnifier => provider
            .as_magnifier()
            .ok_or(ProviderError::NotImplemented("magnifier"))?
            .initialize_magnifier(),
        Role::Highlighter => provider
            .as_highlighter()
            .ok_or(ProviderError::NotImplemented("highlighter"))?
            .initialize_highlighter(),
        Role::ColorEnhancer => provider
            .as_color_enhancer()
            .ok_or(ProviderError::NotImplemented("color enhancer"))?
            .initialize_color_enhancer(),
    }
}

/// Run the terminate hook for `role`.
pub(crate) fn terminate_role(
    provider: &mut dyn VisionProvider,
    role: Role,
) -> Result<(), ProviderError> {
    match role {
        Role::Magnifier => provider
            .as_magnifier()
            .ok_or(ProviderError::NotImplemented("magnifier"))?
            .terminate_magnifier(),
        Role::Highlighter => provider
            .as_highlighter()
            .ok_or(ProviderError::NotImplemented("highlighter"))?
            .terminate_highlighter(),
        Role::ColorEnhancer => provider
            .as_color_enhancer()
            .ok_or(ProviderError::NotImplemented("color enhancer"))?
            .terminate_color_enhancer(),
    }
}

/// Magnifies the screen around a tracked rectangle.
pub trait Magnifier {
    /// Start magnifying.
    fn initialize_magnifier(&mut self) -> Result<(), ProviderError>;

    /// Stop magnifying.
    fn terminate_magnifier(&mut self) -> Result<(), ProviderError>;

    /// Move the magnified view to `rect`.
    fn track_to_rectangle(&mut self, rect: Rect, context: Context) -> Result<(), ProviderError>;

    /// Move the magnified view to a point.
    ///
    /// The default tracks to the 1x1 rectangle at `point`.
    fn track_to_point(&mut self, point: Point, context: Context) -> Result<(), ProviderError> {
        self.track_to_rectangle(
            Rect::new(
                point.x,
                point.y,
                point.x.saturating_add(1),
                point.y.saturating_add(1),
            ),
            context,
        )
    }

    /// Move the magnified view to an object.
    ///
    /// When `object` is `None` the context's current object is used. The
    /// default resolves the context rectangle and tracks to it; if there is
    /// no rectangle, nothing happens.
    fn track_to_object(
        &mut self,
        resolver: &ContextResolver<'_>,
        context: Context,
        object: Option<AccessibleId>,
    ) -> Result<(), ProviderError> {
        match resolver.context_rect(context, object) {
            Ok(rect) => self.track_to_rectangle(rect, context),
            Err(err) => {
                tracing::trace!(
                    target: targets::PROVIDERS,
                    %context,
                    %err,
                    "no rectangle to track"
                );
                Ok(())
            }
        }
    }

    /// Current magnification factor.
    fn magnification_level(&self) -> f32;

    /// Change the magnification factor.
    fn set_magnification_level(&mut self, level: f32) -> Result<(), ProviderError>;
}

/// Highlights context rectangles on screen.
///
/// The engine owns the [`ContextRects`] map for each highlighter instance:
/// it seeds the map on initialization, updates it as events arrive and
/// clears it on termination. The highlighter only renders it.
pub trait Highlighter {
    /// Contexts this highlighter draws.
    fn supported_contexts(&self) -> ContextSet;

    /// Prepare rendering resources.
    fn initialize_highlighter(&mut self) -> Result<(), ProviderError>;

    /// Release rendering resources.
    fn terminate_highlighter(&mut self) -> Result<(), ProviderError>;

    /// Locate the rectangle for `context`.
    ///
    /// Override to position a context differently. An absent rectangle
    /// clears the highlight for that context.
    fn locate(
        &self,
        resolver: &ContextResolver<'_>,
        context: Context,
        object: Option<AccessibleId>,
    ) -> Option<Rect> {
        resolver.context_rect(context, object).ok()
    }

    /// Called after the rectangle of `context` changed.
    fn context_rect_updated(
        &mut self,
        _context: Context,
        _rects: &ContextRects,
    ) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Push the current rectangles to the screen.
    ///
    /// Called once at the end of every pump cycle.
    fn refresh(&mut self, rects: &ContextRects) -> Result<(), ProviderError>;
}

/// A 5x5 color matrix in the row-vector convention used by fullscreen
/// color effect services.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix(pub [[f32; 5]; 5]);

impl ColorMatrix {
    /// Leaves colors unchanged.
    pub const IDENTITY: Self = Self([
        [1.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 1.0],
    ]);

    /// Maps every color to black.
    pub const BLACK: Self = Self([
        [0.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 1.0],
    ]);
}

/// How a transformation is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformValue {
    /// Apply a color matrix to the whole screen.
    Matrix(ColorMatrix),
    /// Cover the screen with an opaque color.
    Fill(Rgb),
}

/// A named color transformation offered by a [`ColorEnhancer`].
#[derive(Debug, Clone, PartialEq)]
pub struct ColorTransformation {
    /// Identifier used in configuration, e.g. `"grayScale"`.
    pub name: String,
    /// Human readable description.
    pub description: String,
    /// Enhancer specific value.
    pub value: TransformValue,
}

impl ColorTransformation {
    /// Create a new transformation.
    pub fn new(name: impl Into<String>, description: impl Into<String>, value: TransformValue) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            value,
        }
    }
}

impl fmt::Display for ColorTransformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description, self.name)
    }
}

/// Changes the color presentation of the screen.
pub trait ColorEnhancer {
    /// Start transforming colors.
    fn initialize_color_enhancer(&mut self) -> Result<(), ProviderError>;

    /// Stop transforming colors and restore the screen.
    fn terminate_color_enhancer(&mut self) -> Result<(), ProviderError>;

    /// Transformations this enhancer can apply.
    fn available_transformations(&self) -> &[ColorTransformation];

    /// The transformation currently applied, if any.
    fn transformation(&self) -> Option<&ColorTransformation>;

    /// Apply the transformation named `name`.
    fn set_transformation(&mut self, name: &str) -> Result<(), ProviderError>;
}
