//! Per-frame analysis: one image in, one [`FrameResult`] out.

use poise_core::{frame_timestamp, Detections, Error, FrameIndex, Modality, Result};
use serde::{Deserialize, Serialize};

use crate::face::{FaceFeatureExtractor, FaceFeatures};
use crate::hands::{HandFeatureExtractor, HandsFeatures};
use crate::pose::{PoseFeatureExtractor, PoseFeatures};
use crate::provider::LandmarkProvider;
use crate::views::{ExpressionRecord, GazeRecord};

/// Everything derived from one frame.
///
/// Every record is optional; `eye_contact` and `expressions` are present
/// exactly when `face` is.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameResult {
    pub frame: FrameIndex,
    pub timestamp: f64,
    pub face: Option<FaceFeatures>,
    pub pose: Option<PoseFeatures>,
    pub hands: Option<HandsFeatures>,
    pub eye_contact: Option<GazeRecord>,
    pub expressions: Option<ExpressionRecord>,
}

impl FrameResult {
    /// Result with no record for any modality
    pub fn empty(frame: FrameIndex, timestamp: f64) -> Self {
        Self {
            frame,
            timestamp,
            ..Default::default()
        }
    }

    pub fn has_any(&self) -> bool {
        self.face.is_some() || self.pose.is_some() || self.hands.is_some()
    }
}

/// Keep a frame-local failure as an absent record, propagate anything else
fn absent_if_local<T>(result: Result<T>, frame: FrameIndex) -> Result<Option<T>> {
    match result {
        Ok(record) => Ok(Some(record)),
        Err(e) if e.is_frame_local() => {
            tracing::debug!("Frame {}: {}", frame, e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Runs the landmark provider and every feature extractor on one image
pub struct FrameProcessor<P> {
    provider: P,
    face: FaceFeatureExtractor,
    pose: PoseFeatureExtractor,
    hands: HandFeatureExtractor,
}

impl<P: LandmarkProvider> FrameProcessor<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            face: FaceFeatureExtractor::new(),
            pose: PoseFeatureExtractor::new(),
            hands: HandFeatureExtractor::new(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn into_provider(self) -> P {
        self.provider
    }

    /// Analyse one image.
    ///
    /// Never fails: a provider error is logged and the frame is treated as
    /// having no detections, and a malformed landmark set leaves only its
    /// own record absent.
    pub fn process(&mut self, image: &P::Image, frame: FrameIndex, fps: f64) -> FrameResult {
        let timestamp = frame_timestamp(frame, fps);

        let detections = match self.provider.detect(image) {
            Ok(detections) => detections,
            Err(e) => {
                tracing::warn!("Frame {}: landmark detection failed: {}", frame, e);
                return FrameResult::empty(frame, timestamp);
            }
        };

        self.analyze(&detections, frame, timestamp)
    }

    /// Derive every record from already detected landmarks
    pub fn analyze(
        &self,
        detections: &Detections,
        frame: FrameIndex,
        timestamp: f64,
    ) -> FrameResult {
        let face = self.modality_record(Modality::Face, frame, || {
            let landmarks = detections.face.as_ref().ok_or(Error::DetectionAbsent {
                modality: Modality::Face,
            })?;
            self.face.extract(landmarks, frame, timestamp)
        });

        let pose = self.modality_record(Modality::Pose, frame, || {
            let landmarks = detections.pose.as_ref().ok_or(Error::DetectionAbsent {
                modality: Modality::Pose,
            })?;
            self.pose.extract(landmarks, frame, timestamp)
        });

        let hands = self.modality_record(Modality::Hand, frame, || {
            self.hands.extract(&detections.hands, frame, timestamp)
        });

        FrameResult {
            frame,
            timestamp,
            eye_contact: face.as_ref().map(GazeRecord::from),
            expressions: face.as_ref().map(ExpressionRecord::from),
            face,
            pose,
            hands,
        }
    }

    fn modality_record<T>(
        &self,
        modality: Modality,
        frame: FrameIndex,
        extract: impl FnOnce() -> Result<T>,
    ) -> Option<T> {
        match absent_if_local(extract(), frame) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Frame {}: {} analysis failed: {}", frame, modality, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::tests::{face_with_gaze_offset, neutral_face};
    use crate::face::ContactQuality;
    use crate::hands::tests::hand_at;
    use crate::pose::tests::upright_pose;
    use poise_core::{Handedness, LandmarkPoint, LandmarkSet};

    /// Replays the detections it is handed; `None` simulates a provider failure
    struct ReplayProvider {
        calls: usize,
    }

    impl LandmarkProvider for ReplayProvider {
        type Image = Option<Detections>;

        fn detect(&mut self, image: &Self::Image) -> Result<Detections> {
            self.calls += 1;
            image
                .clone()
                .ok_or_else(|| Error::Provider("model not loaded".into()))
        }
    }

    fn processor() -> FrameProcessor<ReplayProvider> {
        FrameProcessor::new(ReplayProvider { calls: 0 })
    }

    #[test]
    fn test_all_modalities() {
        let detections = Detections {
            face: Some(neutral_face()),
            pose: Some(upright_pose()),
            hands: vec![hand_at(0.5, 0.6, &[true; 5], Handedness::Left)],
        };
        let result = processor().process(&Some(detections), 30, 30.0);

        assert_eq!(result.frame, 30);
        assert!((result.timestamp - 1.0).abs() < 1e-12);
        assert!(result.face.is_some());
        assert!(result.pose.is_some());
        assert_eq!(result.hands.as_ref().unwrap().hands_detected, 1);
        assert!(result.eye_contact.is_some());
        assert!(result.expressions.is_some());
    }

    #[test]
    fn test_views_follow_face() {
        let mut processor = processor();

        let without_face = Detections {
            pose: Some(upright_pose()),
            ..Detections::empty()
        };
        let result = processor.process(&Some(without_face), 0, 10.0);
        assert!(result.face.is_none());
        assert!(result.eye_contact.is_none());
        assert!(result.expressions.is_none());
        assert!(result.pose.is_some());

        let with_face = Detections {
            face: Some(face_with_gaze_offset(0.02)),
            ..Detections::empty()
        };
        let result = processor.process(&Some(with_face), 1, 10.0);
        assert_eq!(
            result.eye_contact.unwrap().contact_quality,
            ContactQuality::Excellent
        );
        assert!(result.pose.is_none());
        assert!(result.hands.is_none());
    }

    #[test]
    fn test_provider_failure_yields_empty_frame() {
        let mut processor = processor();
        let result = processor.process(&None, 7, 0.0);

        assert_eq!(result, FrameResult::empty(7, 0.0));
        assert!(!result.has_any());
        assert_eq!(processor.provider().calls, 1);
    }

    #[test]
    fn test_malformed_face_keeps_other_records() {
        let detections = Detections {
            face: Some(LandmarkSet::new(vec![LandmarkPoint::default(); 400])),
            pose: Some(upright_pose()),
            hands: Vec::new(),
        };
        let result = processor().process(&Some(detections), 0, 25.0);

        assert!(result.face.is_none());
        assert!(result.eye_contact.is_none());
        assert!(result.pose.is_some());
    }
}
