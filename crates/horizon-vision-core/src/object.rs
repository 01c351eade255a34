//! Accessibility object model boundary.
//!
//! The objects vision enhancers track (the focused control, the caret's
//! window, the object under the mouse) are owned by the host's accessibility
//! layer, not by Horizon Vision. This module provides:
//!
//! - [`AccessibleId`] - a generational, non-owning handle to such an object
//! - [`ObjectModel`] - the queries the engine makes against the host
//! - [`AccessibleStore`] - an in-process mirror the host keeps up to date
//! - [`SharedAccessibleStore`] - a lockable, cloneable handle to a store
//!
//! Holding an [`AccessibleId`] never keeps an object alive. Once the host
//! destroys the object, every query for the stale handle fails with
//! [`LookupError::NotFound`] and [`ObjectModel::is_alive`] returns `false`.

use std::sync::Arc;

use parking_lot::RwLock;
use slotmap::{new_key_type, SlotMap};

use crate::geometry::{Point, Rect};

new_key_type! {
    /// A non-owning handle to an externally owned accessible object.
    pub struct AccessibleId;
}

/// Why a geometry or object lookup produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// The object is gone, or it has no such geometry right now.
    #[error("object or location not found")]
    NotFound,
    /// The object model cannot answer this query at all.
    #[error("lookup not implemented: {0}")]
    NotImplemented(&'static str),
}

/// A specialized Result type for object model lookups.
pub type LookupResult<T> = std::result::Result<T, LookupError>;

/// Queries the engine makes against the host accessibility layer.
///
/// Every method must be fast; they are called on the event thread.
pub trait ObjectModel {
    /// The object with keyboard focus.
    fn focus_object(&self) -> Option<AccessibleId>;

    /// The foreground (active top-level) object.
    fn foreground_object(&self) -> Option<AccessibleId>;

    /// The object hosting the system caret.
    fn caret_object(&self) -> Option<AccessibleId>;

    /// The navigator object.
    fn navigator_object(&self) -> Option<AccessibleId>;

    /// The object the review cursor is positioned in.
    fn review_object(&self) -> Option<AccessibleId>;

    /// The object under the mouse pointer.
    fn mouse_object(&self) -> Option<AccessibleId>;

    /// Whether `id` still refers to a live object.
    fn is_alive(&self, id: AccessibleId) -> bool;

    /// Screen location of the object.
    fn location(&self, id: AccessibleId) -> LookupResult<Rect>;

    /// Caret rectangle reported by the window hosting the object.
    fn window_caret_rect(&self, _id: AccessibleId) -> LookupResult<Rect> {
        Err(LookupError::NotImplemented("window caret"))
    }

    /// Bounding rectangle of the caret's text position.
    fn caret_bounding_rect(&self, _id: AccessibleId) -> LookupResult<Rect> {
        Err(LookupError::NotImplemented("caret text position"))
    }

    /// Start point of the caret's text position.
    fn caret_start_point(&self, _id: AccessibleId) -> LookupResult<Point> {
        Err(LookupError::NotImplemented("caret text position"))
    }

    /// Bounding rectangle of the review position.
    fn review_bounding_rect(&self) -> LookupResult<Rect> {
        Err(LookupError::NotImplemented("review position"))
    }

    /// Start point of the review position.
    fn review_start_point(&self) -> LookupResult<Point> {
        Err(LookupError::NotImplemented("review position"))
    }
}

/// Caret geometry of an object with a text caret.
///
/// A `None` field means that particular query fails with `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaretGeometry {
    /// Rectangle from the window's own caret.
    pub window_rect: Option<Rect>,
    /// Bounding rectangle of the caret text position.
    pub text_rect: Option<Rect>,
    /// Start point of the caret text position.
    pub start: Option<Point>,
}

/// The review cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewPosition {
    /// The object the review position lives in.
    pub object: AccessibleId,
    /// Bounding rectangle of the reviewed text.
    pub bounding_rect: Option<Rect>,
    /// Start point of the reviewed text.
    pub start: Option<Point>,
}

/// Internal per-object data.
#[derive(Debug, Clone)]
struct AccessibleData {
    name: String,
    location: Option<Rect>,
    /// `None` when the object exposes no text caret at all.
    caret: Option<CaretGeometry>,
}

/// An in-process mirror of the host's accessible objects.
///
/// The host inserts objects as it learns about them, updates their geometry
/// and the focus/caret/navigator/mouse pointers, and destroys them when they
/// go away. Destroyed handles are never reused.
#[derive(Debug, Default)]
pub struct AccessibleStore {
    objects: SlotMap<AccessibleId, AccessibleData>,
    focus: Option<AccessibleId>,
    foreground: Option<AccessibleId>,
    caret: Option<AccessibleId>,
    navigator: Option<AccessibleId>,
    mouse: Option<AccessibleId>,
    review: Option<ReviewPosition>,
}

impl AccessibleStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object and return its handle.
    pub fn insert(&mut self, name: impl Into<String>, location: Option<Rect>) -> AccessibleId {
        self.objects.insert(AccessibleData {
            name: name.into(),
            location,
            caret: None,
        })
    }

    /// Destroy an object. Pointers that referred to it are cleared.
    pub fn destroy(&mut self, id: AccessibleId) -> LookupResult<()> {
        self.objects.remove(id).ok_or(LookupError::NotFound)?;
        for slot in [
            &mut self.focus,
            &mut self.foreground,
            &mut self.caret,
            &mut self.navigator,
            &mut self.mouse,
        ] {
            if *slot == Some(id) {
                *slot = None;
            }
        }
        if self.review.is_some_and(|r| r.object == id) {
            self.review = None;
        }
        tracing::trace!(target: "horizon_vision_core::object", ?id, "accessible destroyed");
        Ok(())
    }

    /// Whether the handle refers to a live object.
    pub fn contains(&self, id: AccessibleId) -> bool {
        self.objects.contains_key(id)
    }

    /// Number of live objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Get the object's name.
    pub fn name(&self, id: AccessibleId) -> LookupResult<&str> {
        self.objects
            .get(id)
            .map(|d| d.name.as_str())
            .ok_or(LookupError::NotFound)
    }

    /// Set or clear the object's screen location.
    pub fn set_location(&mut self, id: AccessibleId, location: Option<Rect>) -> LookupResult<()> {
        self.objects
            .get_mut(id)
            .map(|d| d.location = location)
            .ok_or(LookupError::NotFound)
    }

    /// Set or clear the object's caret geometry.
    pub fn set_caret_geometry(
        &mut self,
        id: AccessibleId,
        caret: Option<CaretGeometry>,
    ) -> LookupResult<()> {
        self.objects
            .get_mut(id)
            .map(|d| d.caret = caret)
            .ok_or(LookupError::NotFound)
    }

    /// Set the focus object.
    pub fn set_focus(&mut self, id: Option<AccessibleId>) -> LookupResult<()> {
        self.focus = self.checked(id)?;
        Ok(())
    }

    /// Set the foreground object.
    pub fn set_foreground(&mut self, id: Option<AccessibleId>) -> LookupResult<()> {
        self.foreground = self.checked(id)?;
        Ok(())
    }

    /// Set the object hosting the caret.
    pub fn set_caret(&mut self, id: Option<AccessibleId>) -> LookupResult<()> {
        self.caret = self.checked(id)?;
        Ok(())
    }

    /// Set the navigator object.
    pub fn set_navigator(&mut self, id: Option<AccessibleId>) -> LookupResult<()> {
        self.navigator = self.checked(id)?;
        Ok(())
    }

    /// Set the object under the mouse.
    pub fn set_mouse(&mut self, id: Option<AccessibleId>) -> LookupResult<()> {
        self.mouse = self.checked(id)?;
        Ok(())
    }

    /// Set or clear the review position.
    pub fn set_review_position(&mut self, review: Option<ReviewPosition>) -> LookupResult<()> {
        if let Some(r) = review {
            self.checked(Some(r.object))?;
        }
        self.review = review;
        Ok(())
    }

    fn checked(&self, id: Option<AccessibleId>) -> LookupResult<Option<AccessibleId>> {
        match id {
            Some(id) if !self.objects.contains_key(id) => Err(LookupError::NotFound),
            other => Ok(other),
        }
    }

    fn caret_geometry(&self, id: AccessibleId) -> LookupResult<CaretGeometry> {
        let data = self.objects.get(id).ok_or(LookupError::NotFound)?;
        data.caret
            .ok_or(LookupError::NotImplemented("object has no text caret"))
    }
}

impl ObjectModel for AccessibleStore {
    fn focus_object(&self) -> Option<AccessibleId> {
        self.focus
    }

    fn foreground_object(&self) -> Option<AccessibleId> {
        self.foreground
    }

    fn caret_object(&self) -> Option<AccessibleId> {
        self.caret
    }

    fn navigator_object(&self) -> Option<AccessibleId> {
        self.navigator
    }

    fn review_object(&self) -> Option<AccessibleId> {
        self.review.map(|r| r.object)
    }

    fn mouse_object(&self) -> Option<AccessibleId> {
        self.mouse
    }

    fn is_alive(&self, id: AccessibleId) -> bool {
        self.contains(id)
    }

    fn location(&self, id: AccessibleId) -> LookupResult<Rect> {
        self.objects
            .get(id)
            .and_then(|d| d.location)
            .ok_or(LookupError::NotFound)
    }

    fn window_caret_rect(&self, id: AccessibleId) -> LookupResult<Rect> {
        self.caret_geometry(id)?.window_rect.ok_or(LookupError::NotFound)
    }

    fn caret_bounding_rect(&self, id: AccessibleId) -> LookupResult<Rect> {
        self.caret_geometry(id)?.text_rect.ok_or(LookupError::NotFound)
    }

    fn caret_start_point(&self, id: AccessibleId) -> LookupResult<Point> {
        self.caret_geometry(id)?.start.ok_or(LookupError::NotFound)
    }

    fn review_bounding_rect(&self) -> LookupResult<Rect> {
        self.review
            .and_then(|r| r.bounding_rect)
            .ok_or(LookupError::NotFound)
    }

    fn review_start_point(&self) -> LookupResult<Point> {
        self.review
            .and_then(|r| r.start)
            .ok_or(LookupError::NotFound)
    }
}

/// A thread-safe, cloneable handle to an [`AccessibleStore`].
///
/// The host's accessibility thread writes through this handle while the
/// engine reads through its [`ObjectModel`] implementation.
#[derive(Debug, Clone, Default)]
pub struct SharedAccessibleStore {
    inner: Arc<RwLock<AccessibleStore>>,
}

impl SharedAccessibleStore {
    /// Create an empty shared store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Access the store with a read lock.
    pub fn with_read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AccessibleStore) -> R,
    {
        f(&self.inner.read())
    }

    /// Access the store with a write lock.
    pub fn with_write<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut AccessibleStore) -> R,
    {
        f(&mut self.inner.write())
    }
}

impl ObjectModel for SharedAccessibleStore {
    fn focus_object(&self) -> Option<AccessibleId> {
        self.inner.read().focus_object()
    }

    fn foreground_object(&self) -> Option<AccessibleId> {
        self.inner.read().foreground_object()
    }

    fn caret_object(&self) -> Option<AccessibleId> {
        self.inner.read().caret_object()
    }

    fn navigator_object(&self) -> Option<AccessibleId> {
        self.inner.read().navigator_object()
    }

    fn review_object(&self) -> Option<AccessibleId> {
        self.inner.read().review_object()
    }

    fn mouse_object(&self) -> Option<AccessibleId> {
        self.inner.read().mouse_object()
    }

    fn is_alive(&self, id: AccessibleId) -> bool {
        self.inner.read().is_alive(id)
    }

    fn location(&self, id: AccessibleId) -> LookupResult<Rect> {
        self.inner.read().location(id)
    }

    fn window_caret_rect(&self, id: AccessibleId) -> LookupResult<Rect> {
        self.inner.read().window_caret_rect(id)
    }

    fn caret_bounding_rect(&self, id: AccessibleId) -> LookupResult<Rect> {
        self.inner.read().caret_bounding_rect(id)
    }

    fn caret_start_point(&self, id: AccessibleId) -> LookupResult<Point> {
        self.inner.read().caret_start_point(id)
    }

    fn review_bounding_rect(&self) -> LookupResult<Rect> {
        self.inner.read().review_bounding_rect()
    }

    fn review_start_point(&self) -> LookupResult<Point> {
        self.inner.read().review_start_point()
    }
}

static_assertions::assert_impl_all!(SharedAccessibleStore: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destroy_invalidates_handle() {
        let mut store = AccessibleStore::new();
        let edit = store.insert("edit", Some(Rect::new(0, 0, 10, 10)));
        store.set_focus(Some(edit)).unwrap();
        store.set_caret(Some(edit)).unwrap();

        assert!(store.is_alive(edit));
        store.destroy(edit).unwrap();

        assert!(!store.is_alive(edit));
        assert_eq!(store.focus_object(), None);
        assert_eq!(store.caret_object(), None);
        assert_eq!(store.location(edit), Err(LookupError::NotFound));
        assert_eq!(store.destroy(edit), Err(LookupError::NotFound));
    }

    #[test]
    fn test_stale_handle_not_reused() {
        let mut store = AccessibleStore::new();
        let first = store.insert("first", None);
        store.destroy(first).unwrap();
        let second = store.insert("second", None);
        assert_ne!(first, second);
        assert!(!store.is_alive(first));
        assert_eq!(store.name(second), Ok("second"));
    }

    #[test]
    fn test_pointer_to_dead_object_rejected() {
        let mut store = AccessibleStore::new();
        let obj = store.insert("button", None);
        store.destroy(obj).unwrap();
        assert_eq!(store.set_navigator(Some(obj)), Err(LookupError::NotFound));
    }

    #[test]
    fn test_caret_queries() {
        let mut store = AccessibleStore::new();
        let plain = store.insert("static text", Some(Rect::new(0, 0, 5, 5)));
        assert!(matches!(
            store.caret_bounding_rect(plain),
            Err(LookupError::NotImplemented(_))
        ));

        let edit = store.insert("edit", None);
        store
            .set_caret_geometry(
                edit,
                Some(CaretGeometry {
                    window_rect: None,
                    text_rect: Some(Rect::new(3, 4, 3, 20)),
                    start: Some(Point::new(3, 4)),
                }),
            )
            .unwrap();
        assert_eq!(store.window_caret_rect(edit), Err(LookupError::NotFound));
        assert_eq!(store.caret_bounding_rect(edit), Ok(Rect::new(3, 4, 3, 20)));
        assert_eq!(store.caret_start_point(edit), Ok(Point::new(3, 4)));
    }

    #[test]
    fn test_review_position_follows_object() {
        let mut store = AccessibleStore::new();
        let doc = store.insert("document", None);
        store
            .set_review_position(Some(ReviewPosition {
                object: doc,
                bounding_rect: None,
                start: Some(Point::new(1, 2)),
            }))
            .unwrap();
        assert_eq!(store.review_object(), Some(doc));
        assert_eq!(store.review_bounding_rect(), Err(LookupError::NotFound));
        assert_eq!(store.review_start_point(), Ok(Point::new(1, 2)));

        store.destroy(doc).unwrap();
        assert_eq!(store.review_object(), None);
    }

    #[test]
    fn test_shared_store() {
        let shared = SharedAccessibleStore::new();
        let obj = shared.with_write(|s| s.insert("window", Some(Rect::new(1, 1, 2, 2))));
        let reader = shared.clone();
        assert_eq!(reader.location(obj), Ok(Rect::new(1, 1, 2, 2)));
        shared.with_write(|s| s.destroy(obj)).unwrap();
        assert!(!reader.is_alive(obj));
    }
}
