//! Accumulated per-frame records of one pipeline run.

use poise_core::{Error, FeatureRecord, FrameIndex, Result};
use poise_features::{
    ExpressionRecord, FaceFeatures, FrameResult, GazeRecord, HandsFeatures, PoseFeatures,
};
use serde::{Deserialize, Serialize};

/// Source properties and bookkeeping of a run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub fps: f64,
    pub total_frames: u64,
    /// Seconds, `total_frames / fps` (0 when the frame rate is unknown)
    pub duration: f64,
    /// Sampled frames handed to the frame processor
    #[serde(default)]
    pub processed_frames: u64,
}

impl Metadata {
    pub fn new(fps: f64, total_frames: u64) -> Self {
        let duration = if fps > 0.0 {
            total_frames as f64 / fps
        } else {
            0.0
        };

        Self {
            fps,
            total_frames,
            duration,
            processed_frames: 0,
        }
    }
}

/// Five ordered record sequences plus run metadata.
///
/// Each sequence only holds frames where its record was present, in
/// increasing frame order, so sequences may differ in length.
/// Equality ignores the push cursor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunResult {
    pub face_analysis: Vec<FaceFeatures>,
    pub pose_analysis: Vec<PoseFeatures>,
    pub hand_analysis: Vec<HandsFeatures>,
    pub eye_contact: Vec<GazeRecord>,
    pub facial_expressions: Vec<ExpressionRecord>,
    pub metadata: Metadata,
    #[serde(skip)]
    last_frame: Option<FrameIndex>,
}

impl RunResult {
    pub fn new(metadata: Metadata) -> Self {
        Self {
            metadata,
            ..Default::default()
        }
    }

    /// Append every present record of a processed frame.
    ///
    /// Frames must arrive in strictly increasing index order; a frame is
    /// either appended whole or not at all.
    pub fn push(&mut self, frame: FrameResult) -> Result<()> {
        if let Some(last) = self.last_frame {
            if frame.frame <= last {
                return Err(Error::InvalidInput(format!(
                    "frame {} received after frame {}",
                    frame.frame, last
                )));
            }
        }

        self.last_frame = Some(frame.frame);
        self.metadata.processed_frames += 1;

        if let Some(face) = frame.face {
            self.face_analysis.push(face);
        }
        if let Some(pose) = frame.pose {
            self.pose_analysis.push(pose);
        }
        if let Some(hands) = frame.hands {
            self.hand_analysis.push(hands);
        }
        if let Some(gaze) = frame.eye_contact {
            self.eye_contact.push(gaze);
        }
        if let Some(expression) = frame.expressions {
            self.facial_expressions.push(expression);
        }

        Ok(())
    }

    /// Index of the last appended frame
    pub fn last_frame(&self) -> Option<FrameIndex> {
        self.last_frame
    }

    /// True when no modality produced a single record
    pub fn is_empty(&self) -> bool {
        self.face_analysis.is_empty()
            && self.pose_analysis.is_empty()
            && self.hand_analysis.is_empty()
            && self.eye_contact.is_empty()
            && self.facial_expressions.is_empty()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a serialized run.
    ///
    /// Every sequence must be strictly increasing by frame. Further pushes
    /// must come after the latest frame of any sequence.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut run: Self = serde_json::from_str(json)?;
        run.last_frame = [
            check_order("face_analysis", &run.face_analysis)?,
            check_order("pose_analysis", &run.pose_analysis)?,
            check_order("hand_analysis", &run.hand_analysis)?,
            check_order("eye_contact", &run.eye_contact)?,
            check_order("facial_expressions", &run.facial_expressions)?,
        ]
        .into_iter()
        .flatten()
        .max();
        Ok(run)
    }
}

impl PartialEq for RunResult {
    fn eq(&self, other: &Self) -> bool {
        self.face_analysis == other.face_analysis
            && self.pose_analysis == other.pose_analysis
            && self.hand_analysis == other.hand_analysis
            && self.eye_contact == other.eye_contact
            && self.facial_expressions == other.facial_expressions
            && self.metadata == other.metadata
    }
}

/// Last frame of `records`, or an error if frames do not strictly increase
fn check_order<R: FeatureRecord>(name: &str, records: &[R]) -> Result<Option<FrameIndex>> {
    for pair in records.windows(2) {
        let (prev, next) = (pair[0].frame(), pair[1].frame());
        if next <= prev {
            return Err(Error::InvalidInput(format!(
                "{}: frame {} follows frame {}",
                name, next, prev
            )));
        }
    }
    Ok(records.last().map(|r| r.frame()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use poise_core::Coordinate2D;
    use poise_features::{ContactQuality, ExpressionCategory, HeadOrientation};

    fn face(frame: FrameIndex) -> FaceFeatures {
        FaceFeatures {
            frame,
            timestamp: frame as f64 / 10.0,
            face_detected: true,
            confidence: 1.0,
            face_center: Coordinate2D::new(0.5, 0.5),
            head_tilt: 0.0,
            head_nod: 0.0,
            head_turn: 0.0,
            orientation_category: HeadOrientation::FrontalStable,
            facial_symmetry: 0.0,
            eye_distance: 0.2,
            eye_level: 0.4,
            gaze_direction_x: 0.02,
            gaze_direction_y: 0.0,
            gaze_distance: 0.02,
            eye_openness: 0.02,
            looking_at_camera: true,
            good_eye_contact: true,
            acceptable_eye_contact: true,
            contact_quality: ContactQuality::Excellent,
            mouth_width: 0.2,
            mouth_height: 0.02,
            lip_separation: 0.02,
            mouth_curve: 0.0,
            is_smiling: false,
            genuine_smile: false,
            slight_smile: false,
            neutral_expression: true,
            frowning: false,
            eyebrow_raised: false,
            mouth_openness: Some(0.1),
            expression_intensity: 0.04,
            expression_category: ExpressionCategory::Neutral,
        }
    }

    fn frame_with_face(frame: FrameIndex) -> FrameResult {
        let face = face(frame);
        FrameResult {
            frame,
            timestamp: face.timestamp,
            eye_contact: Some(GazeRecord::from(&face)),
            expressions: Some(ExpressionRecord::from(&face)),
            face: Some(face),
            ..Default::default()
        }
    }

    #[test]
    fn test_metadata_duration() {
        let metadata = Metadata::new(25.0, 100);
        assert!((metadata.duration - 4.0).abs() < 1e-12);
        assert_eq!(Metadata::new(0.0, 100).duration, 0.0);
    }

    #[test]
    fn test_push_keeps_sequences_aligned() {
        let mut run = RunResult::new(Metadata::new(10.0, 3));
        run.push(frame_with_face(0)).unwrap();
        run.push(FrameResult::empty(1, 0.1)).unwrap();
        run.push(frame_with_face(2)).unwrap();

        assert_eq!(run.face_analysis.len(), 2);
        assert_eq!(run.eye_contact.len(), 2);
        assert_eq!(run.facial_expressions.len(), 2);
        assert!(run.pose_analysis.is_empty());
        assert_eq!(run.metadata.processed_frames, 3);
        assert_eq!(run.last_frame(), Some(2));
    }

    #[test]
    fn test_push_rejects_out_of_order_frame() {
        let mut run = RunResult::default();
        run.push(frame_with_face(4)).unwrap();
        assert!(run.push(frame_with_face(4)).is_err());
        assert!(run.push(frame_with_face(2)).is_err());
        assert_eq!(run.face_analysis.len(), 1);
        assert_eq!(run.metadata.processed_frames, 1);
    }

    #[test]
    fn test_json_round_trip() {
        let mut run = RunResult::new(Metadata::new(10.0, 1));
        run.push(frame_with_face(0)).unwrap();

        let json = run.to_json_pretty().unwrap();
        assert!(json.contains("\"contact_quality\": \"excellent\""));
        assert!(json.contains("\"orientation_category\": \"frontal_stable\""));

        let restored = RunResult::from_json(&json).unwrap();
        assert_eq!(restored, run);
    }

    #[test]
    fn test_reloaded_run_keeps_frame_order() {
        let mut run = RunResult::new(Metadata::new(10.0, 6));
        run.push(frame_with_face(5)).unwrap();

        let mut restored = RunResult::from_json(&run.to_json_pretty().unwrap()).unwrap();
        assert_eq!(restored, run);
        assert_eq!(restored.last_frame(), Some(5));

        assert!(restored.push(frame_with_face(2)).is_err());
        assert!(restored.push(frame_with_face(5)).is_err());
        restored.push(frame_with_face(6)).unwrap();
        assert_eq!(restored.face_analysis.len(), 2);
    }

    #[test]
    fn test_from_json_rejects_unordered_sequence() {
        let mut run = RunResult::default();
        run.push(frame_with_face(1)).unwrap();
        run.push(frame_with_face(3)).unwrap();
        run.eye_contact.swap(0, 1);

        let err = RunResult::from_json(&run.to_json_pretty().unwrap()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(msg) if msg.starts_with("eye_contact")));
    }

    #[test]
    fn test_equality_ignores_trailing_empty_frames() {
        let mut with_gap = RunResult::default();
        with_gap.push(frame_with_face(0)).unwrap();
        let mut without_gap = with_gap.clone();
        with_gap.push(FrameResult::empty(1, 0.1)).unwrap();
        without_gap.metadata.processed_frames += 1;

        assert_eq!(with_gap, without_gap);
        assert_ne!(with_gap.last_frame(), without_gap.last_frame());
    }
}
