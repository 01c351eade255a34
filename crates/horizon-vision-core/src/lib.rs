//! Core types for Horizon Vision.
//!
//! This crate provides the value types and host boundaries the vision engine
//! is built on:
//!
//! - **Geometry**: integer screen [`Point`] and [`Rect`] with intersection and
//!   containment operations
//! - **Colors**: [`Rgb`] and the predefined palette
//! - **Object Model**: non-owning [`AccessibleId`] handles and the
//!   [`ObjectModel`] queries the engine makes against the host
//! - **Logging**: tracing targets, span names and the [`PerfSpan`] guard
//! - **Thread Checks**: [`ThreadAffinity`] for the single event-thread model
//!
//! # Example
//!
//! ```
//! use horizon_vision_core::{AccessibleStore, ObjectModel, Rect};
//!
//! let mut store = AccessibleStore::new();
//! let button = store.insert("OK", Some(Rect::from_ltwh(10, 10, 80, 24)));
//! store.set_focus(Some(button)).unwrap();
//!
//! assert_eq!(store.location(button), Ok(Rect::new(10, 10, 90, 34)));
//!
//! store.destroy(button).unwrap();
//! assert!(!store.is_alive(button));
//! ```

pub mod color;
pub mod geometry;
pub mod logging;
pub mod object;
pub mod thread_check;

pub use color::Rgb;
pub use geometry::{Point, Rect, RectLtwh};
pub use logging::PerfSpan;
pub use object::{
    AccessibleId, AccessibleStore, CaretGeometry, LookupError, LookupResult, ObjectModel,
    ReviewPosition, SharedAccessibleStore,
};
pub use thread_check::ThreadAffinity;
