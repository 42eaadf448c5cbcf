//! Upper-body posture: shoulder line and head position over the shoulders.

use poise_core::schema::pose as idx;
use poise_core::{
    angle_deg, distance_2d, frame_metrics, midpoint_2d, FeatureRecord, FrameIndex, LandmarkSet,
    Metric, Modality, Result,
};
use serde::{Deserialize, Serialize};

/// Confidence reported for every detected pose
pub const UPPER_BODY_CONFIDENCE: f64 = 1.0;

/// Posture metrics for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseFeatures {
    pub frame: FrameIndex,
    pub timestamp: f64,
    /// Inclination of the shoulder line (degrees)
    pub shoulder_tilt: f64,
    /// Direction of the nose seen from the shoulder midpoint (degrees)
    pub head_tilt: f64,
    /// Normalized distance between both shoulders
    pub shoulder_width: f64,
    pub upper_body_confidence: f64,
}

impl FeatureRecord for PoseFeatures {
    fn frame(&self) -> FrameIndex {
        self.frame
    }

    fn timestamp(&self) -> f64 {
        self.timestamp
    }

    fn metrics(&self) -> Vec<Metric> {
        let mut metrics = frame_metrics(self.frame, self.timestamp).to_vec();
        metrics.extend([
            Metric::new("shoulder_tilt", self.shoulder_tilt),
            Metric::new("head_tilt", self.head_tilt),
            Metric::new("shoulder_width", self.shoulder_width),
            Metric::new("upper_body_confidence", self.upper_body_confidence),
        ]);
        metrics
    }
}

/// Extracts [`PoseFeatures`] from a 33-point body pose
#[derive(Debug, Clone, Copy, Default)]
pub struct PoseFeatureExtractor;

impl PoseFeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(
        &self,
        landmarks: &LandmarkSet,
        frame: FrameIndex,
        timestamp: f64,
    ) -> Result<PoseFeatures> {
        landmarks.validate(Modality::Pose)?;

        let left_shoulder = landmarks.point(idx::LEFT_SHOULDER, Modality::Pose)?;
        let right_shoulder = landmarks.point(idx::RIGHT_SHOULDER, Modality::Pose)?;
        let nose = landmarks.point(idx::NOSE, Modality::Pose)?;

        let shoulder_tilt = angle_deg(
            right_shoulder.y - left_shoulder.y,
            right_shoulder.x - left_shoulder.x,
        );

        let shoulder_center = midpoint_2d(&left_shoulder, &right_shoulder);
        let head_tilt = angle_deg(nose.y - shoulder_center.y, nose.x - shoulder_center.x);

        Ok(PoseFeatures {
            frame,
            timestamp,
            shoulder_tilt,
            head_tilt,
            shoulder_width: distance_2d(&left_shoulder, &right_shoulder),
            upper_body_confidence: UPPER_BODY_CONFIDENCE,
        })
    }
}
