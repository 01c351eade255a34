//! Context resolution: from a [`Context`] to an object and a rectangle.
//!
//! [`ContextResolver`] asks the host [`ObjectModel`] which object a context
//! currently refers to and where it is on screen. [`ContextRects`] is the
//! per-highlighter map of the last known rectangle for each context.
//!
//! Lookup failures are never fatal. A context whose object has no location
//! simply has no rectangle, and the highlighter draws nothing for it.

use horizon_vision_core::{AccessibleId, LookupError, LookupResult, ObjectModel, Rect};

use crate::role::Context;

/// Resolves contexts against the host object model.
#[derive(Clone, Copy)]
pub struct ContextResolver<'a> {
    objects: &'a dyn ObjectModel,
}

impl<'a> ContextResolver<'a> {
    /// Create a resolver over an object model.
    pub fn new(objects: &'a dyn ObjectModel) -> Self {
        Self { objects }
    }

    /// The underlying object model.
    pub fn objects(&self) -> &'a dyn ObjectModel {
        self.objects
    }

    /// The object a context currently refers to.
    pub fn context_object(&self, context: Context) -> LookupResult<AccessibleId> {
        let object = match context {
            Context::Focus => self.objects.focus_object(),
            Context::Foreground => self.objects.foreground_object(),
            Context::Caret => self.objects.caret_object(),
            Context::Review => self.objects.review_object(),
            Context::Navigator => self.objects.navigator_object(),
            Context::Mouse => self.objects.mouse_object(),
            Context::Undetermined => {
                return Err(LookupError::NotImplemented("object for undetermined context"));
            }
        };
        object.ok_or(LookupError::NotFound)
    }

    /// The screen rectangle for a context.
    ///
    /// When `object` is `None` the context's current object is looked up first.
    ///
    /// - Caret: the window caret, then the caret text position's bounding
    ///   rectangle, then a zero-size rectangle at its start point.
    /// - Review: the review position's bounding rectangle, then a zero-size
    ///   rectangle at its start point.
    /// - Anything else: the object's screen location.
    pub fn context_rect(&self, context: Context, object: Option<AccessibleId>) -> LookupResult<Rect> {
        let object = match object {
            Some(object) => object,
            None => self.context_object(context)?,
        };
        if !self.objects.is_alive(object) {
            return Err(LookupError::NotFound);
        }
        match context {
            Context::Caret => self
                .objects
                .window_caret_rect(object)
                .or_else(|_| self.objects.caret_bounding_rect(object))
                .or_else(|_| self.objects.caret_start_point(object).map(Rect::from_point)),
            Context::Review => self
                .objects
                .review_bounding_rect()
                .or_else(|_| self.objects.review_start_point().map(Rect::from_point)),
            _ => self.objects.location(object),
        }
    }
}

/// The last known rectangle of each context.
///
/// An absent entry means the context is not currently positioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextRects {
    rects: [Option<Rect>; Context::ALL.len()],
}

impl ContextRects {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// The rectangle recorded for `context`.
    #[inline]
    pub fn get(&self, context: Context) -> Option<Rect> {
        self.rects[context.index()]
    }

    /// Record or clear the rectangle for `context`.
    #[inline]
    pub fn set(&mut self, context: Context, rect: Option<Rect>) {
        self.rects[context.index()] = rect;
    }

    /// Forget every rectangle.
    pub fn clear(&mut self) {
        self.rects = [None; Context::ALL.len()];
    }

    /// Whether no context is positioned.
    pub fn is_empty(&self) -> bool {
        self.rects.iter().all(Option::is_none)
    }

    /// Positioned contexts and their rectangles, in context order.
    pub fn iter(&self) -> impl Iterator<Item = (Context, Rect)> + '_ {
        Context::ALL
            .into_iter()
            .zip(self.rects.iter())
            .filter_map(|(context, rect)| rect.map(|rect| (context, rect)))
    }
}
