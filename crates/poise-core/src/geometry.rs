//! Geometric and statistical helpers over normalized landmark coordinates.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::types::LandmarkPoint;

/// `atan2(dy, dx)` in degrees
pub fn angle_deg(dy: f64, dx: f64) -> f64 {
    dy.atan2(dx).to_degrees()
}

/// Euclidean distance in the image plane (depth ignored)
pub fn distance_2d(a: &LandmarkPoint, b: &LandmarkPoint) -> f64 {
    nalgebra::distance(&a.to_point2(), &b.to_point2())
}

pub fn midpoint_2d(a: &LandmarkPoint, b: &LandmarkPoint) -> Point2<f64> {
    nalgebra::center(&a.to_point2(), &b.to_point2())
}

/// Offset of `point` from a fixed reference in the image plane
pub fn offset_from(point: &Point2<f64>, reference: &Point2<f64>) -> Vector2<f64> {
    point - reference
}

/// Arithmetic mean, `None` for an empty input
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Population variance (divides by N)
pub fn variance(values: &[f64]) -> Option<f64> {
    let m = mean(values.iter().copied())?;
    Some(values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by N)
pub fn std_dev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

/// Axis-aligned bounding box in the image plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2D {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox2D {
    pub fn from_points(points: &[LandmarkPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        Some(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point2<f64> {
        Point2::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}
