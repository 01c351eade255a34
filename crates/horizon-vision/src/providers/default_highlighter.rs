//! The default highlighter.
//!
//! Draws a colored outline around the focus object, the navigator object and
//! the caret on a transparent overlay supplied by the host.

use horizon_vision_core::Rgb;
use horizon_vision_core::logging::targets;

use crate::context::ContextRects;
use crate::error::ProviderError;
use crate::provider::{Highlighter, VisionProvider};
use crate::role::{Context, ContextSet};
use crate::sink::{HighlightSink, Outline};

/// Registered provider name.
pub const NAME: &str = "defaultHighlighter";

/// Distance between an object and its outline, in pixels.
pub const MARGIN: i32 = 15;

/// Outline stroke width, in pixels.
pub const LINE_WIDTH: u32 = 4;

/// Outline color for `context`, if the default highlighter draws it.
pub fn context_color(context: Context) -> Option<Rgb> {
    match context {
        Context::Focus => Some(Rgb::RED),
        Context::Navigator => Some(Rgb::BLUE),
        Context::Caret => Some(Rgb::GREEN),
        _ => None,
    }
}

/// Outlines focus, navigator and caret on an overlay.
pub struct DefaultHighlighter {
    sink: Box<dyn HighlightSink>,
    open: bool,
}

impl DefaultHighlighter {
    /// Create a highlighter drawing into `sink`.
    pub fn new(sink: Box<dyn HighlightSink>) -> Self {
        Self { sink, open: false }
    }

    /// Outlines for every positioned context.
    pub fn outlines(rects: &ContextRects) -> Vec<Outline> {
        rects
            .iter()
            .filter_map(|(context, rect)| {
                context_color(context).map(|color| Outline {
                    context,
                    rect: rect.inflate(MARGIN),
                    color,
                    width: LINE_WIDTH,
                })
            })
            .collect()
    }

    fn present(&mut self, rects: &ContextRects) -> Result<(), ProviderError> {
        if !self.open {
            return Ok(());
        }
        self.sink.present(&Self::outlines(rects))
    }
}

impl VisionProvider for DefaultHighlighter {
    fn as_highlighter(&mut self) -> Option<&mut dyn Highlighter> {
        Some(self)
    }
}

impl Highlighter for DefaultHighlighter {
    fn supported_contexts(&self) -> ContextSet {
        ContextSet::from([Context::Focus, Context::Navigator, Context::Caret])
    }

    fn initialize_highlighter(&mut self) -> Result<(), ProviderError> {
        self.sink.open()?;
        self.open = true;
        tracing::debug!(target: targets::PROVIDERS, "highlight overlay opened");
        Ok(())
    }

    fn terminate_highlighter(&mut self) -> Result<(), ProviderError> {
        if self.open {
            self.sink.close()?;
            self.open = false;
            tracing::debug!(target: targets::PROVIDERS, "highlight overlay closed");
        }
        Ok(())
    }

    fn context_rect_updated(
        &mut self,
        _context: Context,
        rects: &ContextRects,
    ) -> Result<(), ProviderError> {
        self.present(rects)
    }

    fn refresh(&mut self, rects: &ContextRects) -> Result<(), ProviderError> {
        self.present(rects)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use horizon_vision_core::Rect;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        presented: Vec<Vec<Outline>>,
        open: bool,
    }

    struct Overlay(Rc<RefCell<Recorder>>);

    impl HighlightSink for Overlay {
        fn open(&mut self) -> Result<(), ProviderError> {
            self.0.borrow_mut().open = true;
            Ok(())
        }

        fn close(&mut self) -> Result<(), ProviderError> {
            self.0.borrow_mut().open = false;
            Ok(())
        }

        fn present(&mut self, outlines: &[Outline]) -> Result<(), ProviderError> {
            self.0.borrow_mut().presented.push(outlines.to_vec());
            Ok(())
        }
    }

    #[test]
    fn test_outline_colors_and_margin() {
        let mut rects = ContextRects::new();
        rects.set(Context::Focus, Some(Rect::new(100, 100, 200, 150)));
        rects.set(Context::Caret, Some(Rect::new(120, 110, 120, 130)));
        rects.set(Context::Mouse, Some(Rect::new(0, 0, 1, 1)));

        let outlines = DefaultHighlighter::outlines(&rects);
        assert_eq!(
            outlines,
            vec![
                Outline {
                    context: Context::Focus,
                    rect: Rect::new(85, 85, 215, 165),
                    color: Rgb::RED,
                    width: LINE_WIDTH,
                },
                Outline {
                    context: Context::Caret,
                    rect: Rect::new(105, 95, 135, 145),
                    color: Rgb::GREEN,
                    width: LINE_WIDTH,
                },
            ]
        );
    }

    #[test]
    fn test_presents_only_while_open() {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let mut highlighter = DefaultHighlighter::new(Box::new(Overlay(recorder.clone())));
        let mut rects = ContextRects::new();
        rects.set(Context::Navigator, Some(Rect::new(0, 0, 10, 10)));

        highlighter.refresh(&rects).unwrap();
        assert!(recorder.borrow().presented.is_empty());

        highlighter.initialize_highlighter().unwrap();
        assert!(recorder.borrow().open);
        highlighter
            .context_rect_updated(Context::Navigator, &rects)
            .unwrap();
        highlighter.refresh(&rects).unwrap();
        assert_eq!(recorder.borrow().presented.len(), 2);
        assert_eq!(recorder.borrow().presented[0][0].color, Rgb::BLUE);

        highlighter.terminate_highlighter().unwrap();
        assert!(!recorder.borrow().open);
        highlighter.refresh(&rects).unwrap();
        assert_eq!(recorder.borrow().presented.len(), 2);
    }
}
