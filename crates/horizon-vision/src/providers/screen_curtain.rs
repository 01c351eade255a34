//! Screen curtain.
//!
//! Blacks out the whole screen through the fullscreen color effect service
//! while leaving the accessibility tree untouched. Magnifying a black screen
//! is pointless, so the curtain conflicts with the magnifier role.

use horizon_vision_core::logging::targets;

use crate::error::ProviderError;
use crate::provider::{ColorEnhancer, ColorMatrix, ColorTransformation, TransformValue, VisionProvider};
use crate::sink::ColorTransformSink;

/// Registered provider name.
pub const NAME: &str = "screenCurtain";

/// Transformation that makes the screen black.
pub const BLACK: &str = "black";

/// Transformation that restores the screen.
pub const DEFAULT: &str = "default";

/// A color enhancer that turns the screen black.
pub struct ScreenCurtain {
    sink: Box<dyn ColorTransformSink>,
    transformations: Vec<ColorTransformation>,
    current: Option<usize>,
}

impl ScreenCurtain {
    /// Acquire the color effect service.
    ///
    /// Fails with [`ProviderError::Unavailable`] when the service is not
    /// supported on this system.
    pub fn new(mut sink: Box<dyn ColorTransformSink>) -> Result<Self, ProviderError> {
        if !sink.is_supported() {
            return Err(ProviderError::Unavailable(
                "fullscreen color effects are not supported on this system".to_owned(),
            ));
        }
        sink.acquire()?;
        Ok(Self {
            sink,
            transformations: vec![
                ColorTransformation::new(BLACK, "Black", TransformValue::Matrix(ColorMatrix::BLACK)),
                ColorTransformation::new(
                    DEFAULT,
                    "Disabled",
                    TransformValue::Matrix(ColorMatrix::IDENTITY),
                ),
            ],
            current: None,
        })
    }
}

impl VisionProvider for ScreenCurtain {
    fn as_color_enhancer(&mut self) -> Option<&mut dyn ColorEnhancer> {
        Some(self)
    }

    fn shutdown(&mut self) {
        if let Err(err) = self.sink.release() {
            tracing::warn!(target: targets::PROVIDERS, %err, "failed to release color effect service");
        }
    }
}

impl ColorEnhancer for ScreenCurtain {
    fn initialize_color_enhancer(&mut self) -> Result<(), ProviderError> {
        self.set_transformation(BLACK)
    }

    fn terminate_color_enhancer(&mut self) -> Result<(), ProviderError> {
        self.set_transformation(DEFAULT)
    }

    fn available_transformations(&self) -> &[ColorTransformation] {
        &self.transformations
    }

    fn transformation(&self) -> Option<&ColorTransformation> {
        self.current.map(|index| &self.transformations[index])
    }

    fn set_transformation(&mut self, name: &str) -> Result<(), ProviderError> {
        let index = self
            .transformations
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| ProviderError::UnknownTransformation(name.to_owned()))?;
        self.sink.apply(&self.transformations[index])?;
        self.current = Some(index);
        tracing::debug!(target: targets::PROVIDERS, transformation = name, "screen curtain transformation applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Default)]
    struct Service {
        supported: bool,
        calls: Vec<String>,
    }

    struct Effects(Rc<RefCell<Service>>);

    impl ColorTransformSink for Effects {
        fn is_supported(&self) -> bool {
            self.0.borrow().supported
        }

        fn acquire(&mut self) -> Result<(), ProviderError> {
            self.0.borrow_mut().calls.push("acquire".into());
            Ok(())
        }

        fn release(&mut self) -> Result<(), ProviderError> {
            self.0.borrow_mut().calls.push("release".into());
            Ok(())
        }

        fn apply(&mut self, transformation: &ColorTransformation) -> Result<(), ProviderError> {
            self.0
                .borrow_mut()
                .calls
                .push(format!("apply {}", transformation.name));
            Ok(())
        }
    }

    fn service(supported: bool) -> Rc<RefCell<Service>> {
        Rc::new(RefCell::new(Service {
            supported,
            calls: Vec::new(),
        }))
    }

    #[test]
    fn test_unsupported_system() {
        let svc = service(false);
        assert!(matches!(
            ScreenCurtain::new(Box::new(Effects(svc.clone()))),
            Err(ProviderError::Unavailable(_))
        ));
        assert!(svc.borrow().calls.is_empty());
    }

    #[test]
    fn test_lifecycle() {
        let svc = service(true);
        let mut curtain = ScreenCurtain::new(Box::new(Effects(svc.clone()))).unwrap();
        assert!(curtain.transformation().is_none());

        curtain.initialize_color_enhancer().unwrap();
        assert_eq!(curtain.transformation().unwrap().name, BLACK);
        curtain.terminate_color_enhancer().unwrap();
        assert_eq!(curtain.transformation().unwrap().name, DEFAULT);
        curtain.shutdown();

        assert_eq!(
            svc.borrow().calls,
            vec!["acquire", "apply black", "apply default", "release"]
        );
    }

    #[test]
    fn test_transformation_values() {
        let svc = service(true);
        let curtain = ScreenCurtain::new(Box::new(Effects(svc))).unwrap();
        let values: Vec<_> = curtain
            .available_transformations()
            .iter()
            .map(|t| t.value)
            .collect();
        assert_eq!(
            values,
            vec![
                TransformValue::Matrix(ColorMatrix::BLACK),
                TransformValue::Matrix(ColorMatrix::IDENTITY),
            ]
        );
    }

    #[test]
    fn test_unknown_transformation() {
        let svc = service(true);
        let mut curtain = ScreenCurtain::new(Box::new(Effects(svc))).unwrap();
        assert_eq!(
            curtain.set_transformation("sepia"),
            Err(ProviderError::UnknownTransformation("sepia".into()))
        );
    }
}
