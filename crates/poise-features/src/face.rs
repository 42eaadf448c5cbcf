//! Face analysis: head orientation, eye contact, symmetry and expression.
//!
//! ## Head orientation
//!
//! - **Tilt**: roll of the ear-to-ear axis in the image plane
//! - **Nod**: chin relative to nose tip in the (y, z) plane
//! - **Turn**: nose tip horizontal offset from the image centre against depth
//!
//! ## Eye contact
//!
//! The midpoint of both iris centres is compared to a fixed reference
//! (0.5, 0.4) slightly above the image centre, where a speaker looking into
//! the lens places their eyes. The Euclidean offset ("gaze distance") is an
//! inverse proxy for contact quality.
//!
//! ## Expression
//!
//! Mouth curvature is the height of the mouth top relative to the average
//! height of the two inner mouth corners. Image y grows downwards, so raised
//! corners (a smile) give a negative curvature.

use nalgebra::Point2;
use poise_core::schema::face as idx;
use poise_core::{
    angle_deg, distance_2d, frame_metrics, midpoint_2d, offset_from, Coordinate2D,
    FeatureRecord, FrameIndex, LandmarkSet, Metric, Modality, Result,
};
use serde::{Deserialize, Serialize};

/// Reference point the eyes are compared against
pub const GAZE_REFERENCE: (f64, f64) = (0.5, 0.4);

/// Eye openness below which the eyes count as closed
pub const EYES_CLOSED_OPENNESS: f64 = 0.01;
pub const EXCELLENT_CONTACT_DISTANCE: f64 = 0.05;
pub const GOOD_CONTACT_DISTANCE: f64 = 0.10;
pub const ACCEPTABLE_CONTACT_DISTANCE: f64 = 0.15;

pub const GENUINE_SMILE_CURVE: f64 = -0.015;
pub const SLIGHT_SMILE_CURVE: f64 = -0.005;
pub const FROWN_CURVE: f64 = 0.005;
pub const GENUINE_SMILE_SEPARATION: f64 = 0.01;
/// Inner eyebrows above this image height count as raised
pub const EYEBROW_RAISED_HEIGHT: f64 = 0.3;

pub const FRONTAL_MAX_TILT: f64 = 5.0;
pub const FRONTAL_MAX_NOD: f64 = 5.0;
pub const FRONTAL_MAX_TURN: f64 = 10.0;
pub const EXCESSIVE_TILT: f64 = 15.0;
pub const EXCESSIVE_NOD: f64 = 15.0;
pub const EXCESSIVE_TURN: f64 = 20.0;

/// Head orientation category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadOrientation {
    FrontalStable,
    TiltExcessive,
    NodExcessive,
    TurnExcessive,
    NaturalMovement,
}

impl HeadOrientation {
    /// Decision table over the three head angles (degrees).
    ///
    /// Frontal first, then the first exceeded threshold in tilt, nod, turn
    /// order, otherwise natural movement.
    pub fn classify(tilt: f64, nod: f64, turn: f64) -> Self {
        if tilt.abs() < FRONTAL_MAX_TILT
            && nod.abs() < FRONTAL_MAX_NOD
            && turn.abs() < FRONTAL_MAX_TURN
        {
            HeadOrientation::FrontalStable
        } else if tilt.abs() > EXCESSIVE_TILT {
            HeadOrientation::TiltExcessive
        } else if nod.abs() > EXCESSIVE_NOD {
            HeadOrientation::NodExcessive
        } else if turn.abs() > EXCESSIVE_TURN {
            HeadOrientation::TurnExcessive
        } else {
            HeadOrientation::NaturalMovement
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HeadOrientation::FrontalStable => "frontal_stable",
            HeadOrientation::TiltExcessive => "tilt_excessive",
            HeadOrientation::NodExcessive => "nod_excessive",
            HeadOrientation::TurnExcessive => "turn_excessive",
            HeadOrientation::NaturalMovement => "natural_movement",
        }
    }
}

/// Eye contact quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactQuality {
    EyesClosed,
    Excellent,
    Good,
    Acceptable,
    Poor,
}

impl ContactQuality {
    pub fn classify(gaze_distance: f64, eye_openness: f64) -> Self {
        if eye_openness < EYES_CLOSED_OPENNESS {
            ContactQuality::EyesClosed
        } else if gaze_distance < EXCELLENT_CONTACT_DISTANCE {
            ContactQuality::Excellent
        } else if gaze_distance < GOOD_CONTACT_DISTANCE {
            ContactQuality::Good
        } else if gaze_distance < ACCEPTABLE_CONTACT_DISTANCE {
            ContactQuality::Acceptable
        } else {
            ContactQuality::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactQuality::EyesClosed => "eyes_closed",
            ContactQuality::Excellent => "excellent",
            ContactQuality::Good => "good",
            ContactQuality::Acceptable => "acceptable",
            ContactQuality::Poor => "poor",
        }
    }
}

/// Facial expression category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionCategory {
    GenuineSmile,
    SlightSmile,
    Concerned,
    Frown,
    Surprised,
    Neutral,
    Unclear,
}

impl ExpressionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpressionCategory::GenuineSmile => "genuine_smile",
            ExpressionCategory::SlightSmile => "slight_smile",
            ExpressionCategory::Concerned => "concerned",
            ExpressionCategory::Frown => "frown",
            ExpressionCategory::Surprised => "surprised",
            ExpressionCategory::Neutral => "neutral",
            ExpressionCategory::Unclear => "unclear",
        }
    }
}

/// Mouth and eyebrow flags derived from curvature and lip separation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpressionFlags {
    pub genuine_smile: bool,
    pub slight_smile: bool,
    pub neutral: bool,
    pub frown: bool,
    pub eyebrow_raised: bool,
}

impl ExpressionFlags {
    pub fn from_measurements(mouth_curve: f64, lip_separation: f64, eyebrow_height: f64) -> Self {
        Self {
            genuine_smile: mouth_curve < GENUINE_SMILE_CURVE
                && lip_separation > GENUINE_SMILE_SEPARATION,
            slight_smile: (GENUINE_SMILE_CURVE..SLIGHT_SMILE_CURVE).contains(&mouth_curve),
            neutral: mouth_curve.abs() <= FROWN_CURVE,
            frown: mouth_curve > FROWN_CURVE,
            eyebrow_raised: eyebrow_height < EYEBROW_RAISED_HEIGHT,
        }
    }

    /// Ordered, mutually exclusive classification
    pub fn category(&self) -> ExpressionCategory {
        if self.genuine_smile {
            ExpressionCategory::GenuineSmile
        } else if self.slight_smile {
            ExpressionCategory::SlightSmile
        } else if self.frown {
            if self.eyebrow_raised {
                ExpressionCategory::Concerned
            } else {
                ExpressionCategory::Frown
            }
        } else if self.eyebrow_raised {
            ExpressionCategory::Surprised
        } else if self.neutral {
            ExpressionCategory::Neutral
        } else {
            ExpressionCategory::Unclear
        }
    }

    pub fn is_smiling(&self) -> bool {
        self.genuine_smile || self.slight_smile
    }
}

/// Face metrics for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceFeatures {
    pub frame: FrameIndex,
    pub timestamp: f64,
    pub face_detected: bool,
    pub confidence: f64,
    pub face_center: Coordinate2D,

    // Head orientation (degrees)
    pub head_tilt: f64,
    pub head_nod: f64,
    pub head_turn: f64,
    pub orientation_category: HeadOrientation,

    pub facial_symmetry: f64,
    pub eye_distance: f64,

    // Eye contact
    pub eye_level: f64,
    pub gaze_direction_x: f64,
    pub gaze_direction_y: f64,
    pub gaze_distance: f64,
    pub eye_openness: f64,
    pub looking_at_camera: bool,
    pub good_eye_contact: bool,
    pub acceptable_eye_contact: bool,
    pub contact_quality: ContactQuality,

    // Expression
    pub mouth_width: f64,
    pub mouth_height: f64,
    pub lip_separation: f64,
    pub mouth_curve: f64,
    pub is_smiling: bool,
    pub genuine_smile: bool,
    pub slight_smile: bool,
    pub neutral_expression: bool,
    pub frowning: bool,
    pub eyebrow_raised: bool,
    /// Height over width; absent when the mouth has no width
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mouth_openness: Option<f64>,
    pub expression_intensity: f64,
    pub expression_category: ExpressionCategory,
}

impl FeatureRecord for FaceFeatures {
    fn frame(&self) -> FrameIndex {
        self.frame
    }

    fn timestamp(&self) -> f64 {
        self.timestamp
    }

    fn metrics(&self) -> Vec<Metric> {
        let mut metrics = frame_metrics(self.frame, self.timestamp).to_vec();
        metrics.extend([
            Metric::new("face_detected", self.face_detected),
            Metric::new("confidence", self.confidence),
            Metric::new("face_center", self.face_center),
            Metric::new("head_tilt", self.head_tilt),
            Metric::new("head_nod", self.head_nod),
            Metric::new("head_turn", self.head_turn),
            Metric::category("orientation_category", self.orientation_category.as_str()),
            Metric::new("facial_symmetry", self.facial_symmetry),
            Metric::new("eye_distance", self.eye_distance),
            Metric::new("eye_level", self.eye_level),
            Metric::new("gaze_direction_x", self.gaze_direction_x),
            Metric::new("gaze_direction_y", self.gaze_direction_y),
            Metric::new("gaze_distance", self.gaze_distance),
            Metric::new("eye_openness", self.eye_openness),
            Metric::new("looking_at_camera", self.looking_at_camera),
            Metric::new("good_eye_contact", self.good_eye_contact),
            Metric::new("acceptable_eye_contact", self.acceptable_eye_contact),
            Metric::category("contact_quality", self.contact_quality.as_str()),
            Metric::new("mouth_width", self.mouth_width),
            Metric::new("mouth_height", self.mouth_height),
            Metric::new("lip_separation", self.lip_separation),
            Metric::new("mouth_curve", self.mouth_curve),
            Metric::new("is_smiling", self.is_smiling),
            Metric::new("genuine_smile", self.genuine_smile),
            Metric::new("slight_smile", self.slight_smile),
            Metric::new("neutral_expression", self.neutral_expression),
            Metric::new("frowning", self.frowning),
            Metric::new("eyebrow_raised", self.eyebrow_raised),
            Metric::new("expression_intensity", self.expression_intensity),
            Metric::category("expression_category", self.expression_category.as_str()),
        ]);
        if let Some(openness) = self.mouth_openness {
            metrics.push(Metric::new("mouth_openness", openness));
        }
        metrics
    }
}

/// Midpoint between both eyes.
///
/// Uses the iris centres of a refined mesh, or the middle of each eye's
/// corners when the mesh has no iris points.
fn eye_center(landmarks: &LandmarkSet) -> Result<Point2<f64>> {
    let p = |i: usize| landmarks.point(i, Modality::Face);
    if landmarks.len() >= idx::POINT_COUNT {
        return Ok(midpoint_2d(
            &p(idx::LEFT_EYE_CENTER)?,
            &p(idx::RIGHT_EYE_CENTER)?,
        ));
    }
    let left = midpoint_2d(&p(idx::LEFT_EYE_OUTER)?, &p(idx::LEFT_EYE_INNER)?);
    let right = midpoint_2d(&p(idx::RIGHT_EYE_INNER)?, &p(idx::RIGHT_EYE_OUTER)?);
    Ok(nalgebra::center(&left, &right))
}

/// Extracts [`FaceFeatures`] from a face mesh, with or without irises
#[derive(Debug, Clone, Copy, Default)]
pub struct FaceFeatureExtractor;

impl FaceFeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(
        &self,
        landmarks: &LandmarkSet,
        frame: FrameIndex,
        timestamp: f64,
    ) -> Result<FaceFeatures> {
        landmarks.validate(Modality::Face)?;
        let p = |i: usize| landmarks.point(i, Modality::Face);

        let nose_tip = p(idx::NOSE_TIP)?;
        let chin = p(idx::CHIN)?;
        let left_ear = p(idx::LEFT_EAR)?;
        let right_ear = p(idx::RIGHT_EAR)?;

        // Head orientation
        let head_tilt = angle_deg(right_ear.y - left_ear.y, right_ear.x - left_ear.x);
        let head_nod = angle_deg(chin.y - nose_tip.y, chin.z - nose_tip.z);
        let head_turn = angle_deg(nose_tip.x - 0.5, nose_tip.z);

        // Symmetry
        let left_cheek = p(idx::LEFT_CHEEK)?;
        let right_cheek = p(idx::RIGHT_CHEEK)?;
        let facial_symmetry = (left_cheek.x - 0.5).abs() - (right_cheek.x - 0.5).abs();

        let eye_distance = distance_2d(&p(idx::LEFT_EYE_OUTER)?, &p(idx::RIGHT_EYE_OUTER)?);

        // Eye contact
        let eye_center = eye_center(landmarks)?;
        let gaze = offset_from(
            &eye_center,
            &Point2::new(GAZE_REFERENCE.0, GAZE_REFERENCE.1),
        );
        let gaze_distance = gaze.norm();

        let left_eye_height =
            (p(idx::LEFT_EYE_LOWER_LID)?.y - p(idx::LEFT_EYE_UPPER_LID)?.y).abs();
        let right_eye_height =
            (p(idx::RIGHT_EYE_LOWER_LID)?.y - p(idx::RIGHT_EYE_UPPER_LID)?.y).abs();
        let eye_openness = (left_eye_height + right_eye_height) / 2.0;

        // Mouth
        let mouth_top = p(idx::MOUTH_TOP)?;
        let mouth_width = (p(idx::MOUTH_RIGHT)?.x - p(idx::MOUTH_LEFT)?.x).abs();
        let mouth_height = (p(idx::MOUTH_BOTTOM)?.y - mouth_top.y).abs();
        let lip_separation = (p(idx::UPPER_LIP)?.y - p(idx::LOWER_LIP)?.y).abs();
        let corners_height =
            (p(idx::LEFT_MOUTH_CORNER)?.y + p(idx::RIGHT_MOUTH_CORNER)?.y) / 2.0;
        let mouth_curve = mouth_top.y - corners_height;

        let eyebrow_height =
            (p(idx::LEFT_EYEBROW_INNER)?.y + p(idx::RIGHT_EYEBROW_INNER)?.y) / 2.0;
        let flags = ExpressionFlags::from_measurements(mouth_curve, lip_separation, eyebrow_height);

        Ok(FaceFeatures {
            frame,
            timestamp,
            face_detected: true,
            confidence: 1.0,
            face_center: Coordinate2D::new(nose_tip.x, nose_tip.y),
            head_tilt,
            head_nod,
            head_turn,
            orientation_category: HeadOrientation::classify(head_tilt, head_nod, head_turn),
            facial_symmetry,
            eye_distance,
            eye_level: eye_center.y,
            gaze_direction_x: gaze.x,
            gaze_direction_y: gaze.y,
            gaze_distance,
            eye_openness,
            looking_at_camera: gaze_distance < EXCELLENT_CONTACT_DISTANCE,
            good_eye_contact: gaze_distance < GOOD_CONTACT_DISTANCE,
            acceptable_eye_contact: gaze_distance < ACCEPTABLE_CONTACT_DISTANCE,
            contact_quality: ContactQuality::classify(gaze_distance, eye_openness),
            mouth_width,
            mouth_height,
            lip_separation,
            mouth_curve,
            is_smiling: flags.is_smiling(),
            genuine_smile: flags.genuine_smile,
            slight_smile: flags.slight_smile,
            neutral_expression: flags.neutral,
            frowning: flags.frown,
            eyebrow_raised: flags.eyebrow_raised,
            mouth_openness: (mouth_width > 0.0).then(|| mouth_height / mouth_width),
            expression_intensity: mouth_curve.abs() + lip_separation * 2.0,
            expression_category: flags.category(),
        })
    }
}
