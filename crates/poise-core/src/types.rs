//! Fundamental types for the Poise system.

use std::fmt;

use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Zero-based index of a frame in its source
pub type FrameIndex = u64;

/// Body region covered by one landmark set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Face,
    Pose,
    Hand,
}

impl Modality {
    /// Number of points the provider delivers for this modality
    pub fn point_count(&self) -> usize {
        match self {
            Modality::Face => crate::schema::face::POINT_COUNT,
            Modality::Pose => crate::schema::pose::POINT_COUNT,
            Modality::Hand => crate::schema::hand::POINT_COUNT,
        }
    }

    /// Whether a set of `len` points matches this modality's schema.
    ///
    /// Faces are accepted with or without the refined iris points.
    pub fn accepts_len(&self, len: usize) -> bool {
        match self {
            Modality::Face => {
                len == crate::schema::face::POINT_COUNT
                    || len == crate::schema::face::BASE_POINT_COUNT
            }
            _ => len == self.point_count(),
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Modality::Face => "face",
            Modality::Pose => "pose",
            Modality::Hand => "hand",
        };
        f.write_str(name)
    }
}

/// Single detected keypoint.
///
/// `x` and `y` are normalized to the image width and height; `z` is a
/// provider-defined relative depth.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl LandmarkPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn to_point2(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    pub fn to_nalgebra(&self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }
}

/// Ordered keypoints of one modality in one frame, indexed by the
/// provider's anatomical schema (see [`crate::schema`]).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkSet {
    pub points: Vec<LandmarkPoint>,
}

impl LandmarkSet {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LandmarkPoint> {
        self.points.get(index)
    }

    /// Point at a schema index of `modality`, or `MalformedLandmarkSet`
    /// when the set is too short to hold it
    pub fn point(&self, index: usize, modality: Modality) -> Result<LandmarkPoint> {
        self.points
            .get(index)
            .copied()
            .ok_or_else(|| self.malformed(modality))
    }

    /// Check the set has exactly the point count of `modality`'s schema
    pub fn validate(&self, modality: Modality) -> Result<()> {
        if !modality.accepts_len(self.points.len()) {
            return Err(self.malformed(modality));
        }
        Ok(())
    }

    fn malformed(&self, modality: Modality) -> Error {
        Error::MalformedLandmarkSet {
            modality,
            expected: modality.point_count(),
            actual: self.points.len(),
        }
    }

    pub fn xs(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.x)
    }

    pub fn ys(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.y)
    }

    pub fn zs(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.z)
    }
}

impl From<Vec<LandmarkPoint>> for LandmarkSet {
    fn from(points: Vec<LandmarkPoint>) -> Self {
        Self::new(points)
    }
}

/// Which hand a hand landmark set belongs to, as labelled by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Handedness::Left => "Left",
            Handedness::Right => "Right",
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandLandmarks {
    pub landmarks: LandmarkSet,
    pub handedness: Handedness,
}

impl HandLandmarks {
    pub fn new(landmarks: LandmarkSet, handedness: Handedness) -> Self {
        Self {
            landmarks,
            handedness,
        }
    }
}

/// Everything the landmark provider found in one image.
///
/// Each modality may be missing independently of the others.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Detections {
    pub face: Option<LandmarkSet>,
    pub pose: Option<LandmarkSet>,
    pub hands: Vec<HandLandmarks>,
}

impl Detections {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.face.is_none() && self.pose.is_none() && self.hands.is_empty()
    }
}

/// Seconds since the start of the source for a frame index.
///
/// A non-positive frame rate yields 0 rather than a division by zero.
pub fn frame_timestamp(frame: FrameIndex, fps: f64) -> f64 {
    if fps > 0.0 {
        frame as f64 / fps
    } else {
        0.0
    }
}
