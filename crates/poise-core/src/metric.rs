//! Typed metric values shared by every feature record.
//!
//! Each record reduces to a list of named [`MetricValue`]s whose kind is
//! fixed when the record is built, so aggregation dispatches on the tag
//! instead of guessing from the value.

use serde::{Deserialize, Serialize};

use crate::types::FrameIndex;

/// Named 2-D coordinate (e.g. the face centre)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate2D {
    pub x: f64,
    pub y: f64,
}

impl Coordinate2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Value of one metric in one record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Numeric(f64),
    Boolean(bool),
    Category(&'static str),
    Coordinate(Coordinate2D),
}

/// Tag of a [`MetricValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Numeric,
    Boolean,
    Category,
    Coordinate,
}

impl MetricValue {
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricValue::Numeric(_) => MetricKind::Numeric,
            MetricValue::Boolean(_) => MetricKind::Boolean,
            MetricValue::Category(_) => MetricKind::Category,
            MetricValue::Coordinate(_) => MetricKind::Coordinate,
        }
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Numeric(v)
    }
}

impl From<u32> for MetricValue {
    fn from(v: u32) -> Self {
        MetricValue::Numeric(v as f64)
    }
}

impl From<usize> for MetricValue {
    fn from(v: usize) -> Self {
        MetricValue::Numeric(v as f64)
    }
}

impl From<bool> for MetricValue {
    fn from(v: bool) -> Self {
        MetricValue::Boolean(v)
    }
}

impl From<Coordinate2D> for MetricValue {
    fn from(v: Coordinate2D) -> Self {
        MetricValue::Coordinate(v)
    }
}

/// Named metric value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metric {
    pub name: &'static str,
    pub value: MetricValue,
}

impl Metric {
    pub fn new(name: &'static str, value: impl Into<MetricValue>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }

    pub fn category(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            value: MetricValue::Category(label),
        }
    }
}

/// Record of derived metrics for one frame (or one hand of one frame).
///
/// `metrics` lists only the fields the record actually carries: an absent
/// measurement is omitted, never reported as zero.
pub trait FeatureRecord {
    fn frame(&self) -> FrameIndex;

    fn timestamp(&self) -> f64;

    fn metrics(&self) -> Vec<Metric>;
}

impl<R: FeatureRecord + ?Sized> FeatureRecord for &R {
    fn frame(&self) -> FrameIndex {
        (**self).frame()
    }

    fn timestamp(&self) -> f64 {
        (**self).timestamp()
    }

    fn metrics(&self) -> Vec<Metric> {
        (**self).metrics()
    }
}

/// Leading `frame` and `timestamp` metrics every record reports
pub fn frame_metrics(frame: FrameIndex, timestamp: f64) -> [Metric; 2] {
    [
        Metric::new("frame", frame as f64),
        Metric::new("timestamp", timestamp),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_kinds() {
        assert_eq!(Metric::new("a", 1.5).value.kind(), MetricKind::Numeric);
        assert_eq!(Metric::new("b", true).value.kind(), MetricKind::Boolean);
        assert_eq!(
            Metric::category("c", "neutral").value.kind(),
            MetricKind::Category
        );
        assert_eq!(
            Metric::new("d", Coordinate2D::new(0.1, 0.2)).value.kind(),
            MetricKind::Coordinate
        );
        assert_eq!(Metric::new("e", 3u32).value, MetricValue::Numeric(3.0));
    }
}
