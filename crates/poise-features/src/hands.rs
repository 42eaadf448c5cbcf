//! Hand movement and gesture analysis.
//!
//! Each detected hand is reduced to activity, spread, finger count,
//! openness, a position zone and a gesture type. The frame record adds how
//! many hands were seen and whether two visible hands agree on a gesture.

use poise_core::schema::hand as idx;
use poise_core::{
    distance_2d, frame_metrics, mean, std_dev, BoundingBox2D, Error, FeatureRecord, FrameIndex,
    HandLandmarks, Handedness, Metric, Modality, Result,
};
use serde::{Deserialize, Serialize};

/// Hands analysed per frame at most
pub const MAX_HANDS: usize = 2;

/// Thumb-to-pinky span above which five extended fingers read as an open palm
pub const OPEN_PALM_OPENNESS: f64 = 0.15;
/// Bounding-box spread above which an unnamed gesture reads as expressive
pub const EXPRESSIVE_SPREAD: f64 = 0.2;

/// Region of the image the hand centroid falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandZone {
    ComfortZone,
    AboveHead,
    BelowWaist,
    FarLeft,
    FarRight,
    ExtendedZone,
}

impl HandZone {
    /// Range membership tests, evaluated in declaration order
    pub fn classify(x: f64, y: f64) -> Self {
        if (0.3..=0.7).contains(&x) && (0.4..=0.8).contains(&y) {
            HandZone::ComfortZone
        } else if y < 0.3 {
            HandZone::AboveHead
        } else if y > 0.9 {
            HandZone::BelowWaist
        } else if x < 0.2 {
            HandZone::FarLeft
        } else if x > 0.8 {
            HandZone::FarRight
        } else {
            HandZone::ExtendedZone
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HandZone::ComfortZone => "comfort_zone",
            HandZone::AboveHead => "above_head",
            HandZone::BelowWaist => "below_waist",
            HandZone::FarLeft => "far_left",
            HandZone::FarRight => "far_right",
            HandZone::ExtendedZone => "extended_zone",
        }
    }
}

/// Gesture performed by one hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureType {
    Fist,
    OpenPalm,
    Pointing,
    PeaceOrTwo,
    ExpressiveGesture,
    PartialGesture,
}

impl GestureType {
    /// Decision table over finger count, thumb-to-pinky openness and spread
    pub fn classify(fingers_extended: u32, openness: f64, spread: f64) -> Self {
        match fingers_extended {
            0 => GestureType::Fist,
            5 if openness > OPEN_PALM_OPENNESS => GestureType::OpenPalm,
            1 => GestureType::Pointing,
            2 => GestureType::PeaceOrTwo,
            _ if spread > EXPRESSIVE_SPREAD => GestureType::ExpressiveGesture,
            _ => GestureType::PartialGesture,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GestureType::Fist => "fist",
            GestureType::OpenPalm => "open_palm",
            GestureType::Pointing => "pointing",
            GestureType::PeaceOrTwo => "peace_or_two",
            GestureType::ExpressiveGesture => "expressive_gesture",
            GestureType::PartialGesture => "partial_gesture",
        }
    }
}

/// Agreement between the gestures of the visible hands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureCoordination {
    Synchronized,
    Independent,
    SingleHand,
    NoHand,
}

impl GestureCoordination {
    pub fn classify(hands: &[HandFeatures]) -> Self {
        match hands {
            [a, b] if a.gesture_type == b.gesture_type => GestureCoordination::Synchronized,
            [_, _] => GestureCoordination::Independent,
            [_] => GestureCoordination::SingleHand,
            _ => GestureCoordination::NoHand,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GestureCoordination::Synchronized => "synchronized",
            GestureCoordination::Independent => "independent",
            GestureCoordination::SingleHand => "single_hand",
            GestureCoordination::NoHand => "no_hand",
        }
    }
}

/// Metrics for one detected hand.
///
/// `frame` and `timestamp` repeat the enclosing frame so a hand can be
/// aggregated on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandFeatures {
    pub frame: FrameIndex,
    pub timestamp: f64,
    pub hand: Handedness,
    /// std(x) + std(y) over all points, a jitter proxy
    pub activity_level: f64,
    /// Bounding-box width + height
    pub hand_spread: f64,
    pub center_x: f64,
    pub center_y: f64,
    pub center_z: f64,
    pub landmarks_count: usize,
    pub fingers_extended: u32,
    /// Thumb tip to pinky tip distance
    pub hand_openness: f64,
    pub comfort_zone: HandZone,
    pub gesture_type: GestureType,
}

impl FeatureRecord for HandFeatures {
    fn frame(&self) -> FrameIndex {
        self.frame
    }

    fn timestamp(&self) -> f64 {
        self.timestamp
    }

    fn metrics(&self) -> Vec<Metric> {
        let mut metrics = frame_metrics(self.frame, self.timestamp).to_vec();
        metrics.extend([
            Metric::category("hand", self.hand.as_str()),
            Metric::new("activity_level", self.activity_level),
            Metric::new("hand_spread", self.hand_spread),
            Metric::new("center_x", self.center_x),
            Metric::new("center_y", self.center_y),
            Metric::new("center_z", self.center_z),
            Metric::new("landmarks_count", self.landmarks_count),
            Metric::new("fingers_extended", self.fingers_extended),
            Metric::new("hand_openness", self.hand_openness),
            Metric::category("comfort_zone", self.comfort_zone.as_str()),
            Metric::category("gesture_type", self.gesture_type.as_str()),
        ]);
        metrics
    }
}

/// Hands seen in one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandsFeatures {
    pub frame: FrameIndex,
    pub timestamp: f64,
    pub hands_detected: usize,
    pub hands_data: Vec<HandFeatures>,
    pub both_hands_visible: bool,
    pub gesture_coordination: GestureCoordination,
}

impl HandsFeatures {
    pub fn from_hands(hands_data: Vec<HandFeatures>, frame: FrameIndex, timestamp: f64) -> Self {
        Self {
            frame,
            timestamp,
            hands_detected: hands_data.len(),
            both_hands_visible: hands_data.len() == 2,
            gesture_coordination: GestureCoordination::classify(&hands_data),
            hands_data,
        }
    }
}

impl FeatureRecord for HandsFeatures {
    fn frame(&self) -> FrameIndex {
        self.frame
    }

    fn timestamp(&self) -> f64 {
        self.timestamp
    }

    fn metrics(&self) -> Vec<Metric> {
        let mut metrics = frame_metrics(self.frame, self.timestamp).to_vec();
        metrics.extend([
            Metric::new("hands_detected", self.hands_detected),
            Metric::new("both_hands_visible", self.both_hands_visible),
            Metric::category("gesture_coordination", self.gesture_coordination.as_str()),
        ]);
        metrics
    }
}

/// Count fingers whose tip sits above its base joint (upright hand assumed).
///
/// A finger with a missing joint is not extended.
pub fn count_extended_fingers(hand: &HandLandmarks) -> u32 {
    let points = &hand.landmarks;
    idx::FINGER_PAIRS
        .iter()
        .filter(|&&(tip, base)| match (points.get(tip), points.get(base)) {
            (Some(tip), Some(base)) => tip.y < base.y,
            _ => false,
        })
        .count() as u32
}

/// Extracts [`HandFeatures`] per hand and [`HandsFeatures`] per frame
#[derive(Debug, Clone, Copy, Default)]
pub struct HandFeatureExtractor;

impl HandFeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Analyse a single hand
    pub fn extract_hand(
        &self,
        hand: &HandLandmarks,
        frame: FrameIndex,
        timestamp: f64,
    ) -> Result<HandFeatures> {
        let landmarks = &hand.landmarks;
        landmarks.validate(Modality::Hand)?;

        let xs: Vec<f64> = landmarks.xs().collect();
        let ys: Vec<f64> = landmarks.ys().collect();

        let activity_level =
            std_dev(&xs).unwrap_or_default() + std_dev(&ys).unwrap_or_default();
        let hand_spread = BoundingBox2D::from_points(&landmarks.points)
            .map(|bbox| bbox.width() + bbox.height())
            .unwrap_or_default();

        let center_x = mean(xs.iter().copied()).unwrap_or_default();
        let center_y = mean(ys.iter().copied()).unwrap_or_default();
        let center_z = mean(landmarks.zs()).unwrap_or_default();

        let fingers_extended = count_extended_fingers(hand);
        let hand_openness = distance_2d(
            &landmarks.point(idx::THUMB_TIP, Modality::Hand)?,
            &landmarks.point(idx::PINKY_TIP, Modality::Hand)?,
        );

        Ok(HandFeatures {
            frame,
            timestamp,
            hand: hand.handedness,
            activity_level,
            hand_spread,
            center_x,
            center_y,
            center_z,
            landmarks_count: landmarks.len(),
            fingers_extended,
            hand_openness,
            comfort_zone: HandZone::classify(center_x, center_y),
            gesture_type: GestureType::classify(fingers_extended, hand_openness, hand_spread),
        })
    }

    /// Analyse every valid hand of a frame.
    ///
    /// Malformed hands are skipped; [`Error::DetectionAbsent`] when no hand
    /// survives.
    pub fn extract(
        &self,
        hands: &[HandLandmarks],
        frame: FrameIndex,
        timestamp: f64,
    ) -> Result<HandsFeatures> {
        if hands.len() > MAX_HANDS {
            tracing::warn!(
                "Frame {}: {} hands detected, analysing the first {}",
                frame,
                hands.len(),
                MAX_HANDS
            );
        }

        let hands_data: Vec<HandFeatures> = hands
            .iter()
            .take(MAX_HANDS)
            .filter_map(|hand| match self.extract_hand(hand, frame, timestamp) {
                Ok(features) => Some(features),
                Err(e) => {
                    tracing::debug!("Frame {}: skipping {} hand: {}", frame, hand.handedness, e);
                    None
                }
            })
            .collect();

        if hands_data.is_empty() {
            return Err(Error::DetectionAbsent {
                modality: Modality::Hand,
            });
        }

        Ok(HandsFeatures::from_hands(hands_data, frame, timestamp))
    }
}
