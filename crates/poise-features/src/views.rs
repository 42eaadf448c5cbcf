//! Gaze and expression projections of [`FaceFeatures`].
//!
//! Both views are pure restrictions of the face record: they exist for a
//! frame exactly when the face record does.

use poise_core::{frame_metrics, FeatureRecord, FrameIndex, Metric};
use serde::{Deserialize, Serialize};

use crate::face::{ContactQuality, ExpressionCategory, FaceFeatures};

/// Eye-contact view of a face record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazeRecord {
    pub frame: FrameIndex,
    pub timestamp: f64,
    pub looking_at_camera: bool,
    pub eye_direction_x: f64,
    pub eye_direction_y: f64,
    pub gaze_distance: f64,
    pub contact_quality: ContactQuality,
}

impl From<&FaceFeatures> for GazeRecord {
    fn from(face: &FaceFeatures) -> Self {
        Self {
            frame: face.frame,
            timestamp: face.timestamp,
            looking_at_camera: face.looking_at_camera,
            eye_direction_x: face.gaze_direction_x,
            eye_direction_y: face.gaze_direction_y,
            gaze_distance: face.gaze_distance,
            contact_quality: face.contact_quality,
        }
    }
}

impl FeatureRecord for GazeRecord {
    fn frame(&self) -> FrameIndex {
        self.frame
    }

    fn timestamp(&self) -> f64 {
        self.timestamp
    }

    fn metrics(&self) -> Vec<Metric> {
        let mut metrics = frame_metrics(self.frame, self.timestamp).to_vec();
        metrics.extend([
            Metric::new("looking_at_camera", self.looking_at_camera),
            Metric::new("eye_direction_x", self.eye_direction_x),
            Metric::new("eye_direction_y", self.eye_direction_y),
            Metric::new("gaze_distance", self.gaze_distance),
            Metric::category("contact_quality", self.contact_quality.as_str()),
        ]);
        metrics
    }
}

/// Facial-expression view of a face record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionRecord {
    pub frame: FrameIndex,
    pub timestamp: f64,
    pub is_smiling: bool,
    pub mouth_width: f64,
    pub mouth_height: f64,
    pub mouth_curve: f64,
    pub expression_category: ExpressionCategory,
}

impl From<&FaceFeatures> for ExpressionRecord {
    fn from(face: &FaceFeatures) -> Self {
        Self {
            frame: face.frame,
            timestamp: face.timestamp,
            is_smiling: face.is_smiling,
            mouth_width: face.mouth_width,
            mouth_height: face.mouth_height,
            mouth_curve: face.mouth_curve,
            expression_category: face.expression_category,
        }
    }
}

impl FeatureRecord for ExpressionRecord {
    fn frame(&self) -> FrameIndex {
        self.frame
    }

    fn timestamp(&self) -> f64 {
        self.timestamp
    }

    fn metrics(&self) -> Vec<Metric> {
        let mut metrics = frame_metrics(self.frame, self.timestamp).to_vec();
        metrics.extend([
            Metric::new("is_smiling", self.is_smiling),
            Metric::new("mouth_width", self.mouth_width),
            Metric::new("mouth_height", self.mouth_height),
            Metric::new("mouth_curve", self.mouth_curve),
            Metric::category("expression_category", self.expression_category.as_str()),
        ]);
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::tests::face_with_gaze_offset;
    use crate::face::FaceFeatureExtractor;

    #[test]
    fn test_views_mirror_face() {
        let face = FaceFeatureExtractor::new()
            .extract(&face_with_gaze_offset(0.02), 3, 0.1)
            .unwrap();

        let gaze = GazeRecord::from(&face);
        assert_eq!(gaze.frame, 3);
        assert_eq!(gaze.eye_direction_x, face.gaze_direction_x);
        assert_eq!(gaze.contact_quality, ContactQuality::Excellent);
        assert!(gaze.looking_at_camera);

        let expression = ExpressionRecord::from(&face);
        assert_eq!(expression.timestamp, 0.1);
        assert_eq!(expression.mouth_curve, face.mouth_curve);
        assert_eq!(expression.expression_category, face.expression_category);
        assert_eq!(expression.metrics().len(), 7);
    }
}
