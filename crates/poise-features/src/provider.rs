//! Landmark provider seam.
//!
//! The detector itself (model loading, inference) lives outside this crate.
//! Anything that turns an image into [`Detections`] can drive the
//! [`FrameProcessor`](crate::frame::FrameProcessor).

use poise_core::{Detections, Result};

/// Per-image landmark detector
pub trait LandmarkProvider {
    /// Decoded image type the provider accepts
    type Image;

    /// Detect face, pose and hand landmarks in one image.
    ///
    /// A missing modality is reported through [`Detections`], not as an
    /// error. Errors are reserved for provider failures.
    fn detect(&mut self, image: &Self::Image) -> Result<Detections>;
}

impl<P: LandmarkProvider + ?Sized> LandmarkProvider for Box<P> {
    type Image = P::Image;

    fn detect(&mut self, image: &Self::Image) -> Result<Detections> {
        (**self).detect(image)
    }
}
