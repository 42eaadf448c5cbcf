//! Temporal bucket aggregation.
//!
//! A record sequence is cut into five contiguous buckets (one when it is
//! shorter than five) and each bucket is reduced to one summary per metric
//! name. The summary rule follows the metric's tag: numeric values are
//! averaged, booleans become a `%true` share, categories a percentage
//! distribution and coordinates a component-wise mean.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use poise_core::{Coordinate2D, FeatureRecord, MetricKind, MetricValue};
use poise_features::{HandFeatures, HandsFeatures};
use serde::{Deserialize, Serialize, Serializer};

use crate::report::{AggregatedReport, ReportMetadata};
use crate::run::RunResult;

/// Buckets produced for sequences of at least this many records
pub const GROUP_COUNT: usize = 5;

pub const DEFAULT_PROCESSING_METHOD: &str = "division_5_groupes";

/// Split `len` positions into contiguous buckets.
///
/// Five buckets of `len / 5` positions, the last one absorbing the
/// remainder; a single bucket below five positions; none for zero.
pub fn partition(len: usize) -> Vec<Range<usize>> {
    if len == 0 {
        return Vec::new();
    }
    if len < GROUP_COUNT {
        return vec![0..len];
    }

    let base = len / GROUP_COUNT;
    (0..GROUP_COUNT)
        .map(|i| {
            let start = i * base;
            let end = if i == GROUP_COUNT - 1 { len } else { start + base };
            start..end
        })
        .collect()
}

/// Summary of one metric over one bucket
#[derive(Debug, Clone, PartialEq)]
pub enum MetricSummary {
    Mean(f64),
    /// Percentage of `true` among the records carrying the metric
    TruePercentage(f64),
    /// Percentage per category, in first-seen order
    Distribution(Vec<(&'static str, f64)>),
    Coordinate(Coordinate2D),
}

impl fmt::Display for MetricSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricSummary::Mean(mean) => write!(f, "{}", mean),
            MetricSummary::TruePercentage(pct) => write!(f, "{:.0}%true", pct),
            MetricSummary::Distribution(shares) => {
                for (i, (category, pct)) in shares.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{:.0}%{}", pct, category)?;
                }
                Ok(())
            }
            MetricSummary::Coordinate(c) => write!(f, "({}, {})", c.x, c.y),
        }
    }
}

impl Serialize for MetricSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetricSummary::Mean(mean) => serializer.serialize_f64(*mean),
            MetricSummary::Coordinate(c) => c.serialize(serializer),
            MetricSummary::TruePercentage(_) | MetricSummary::Distribution(_) => {
                serializer.collect_str(self)
            }
        }
    }
}

/// Running totals for one metric name
enum Accumulator {
    Numeric { sum: f64, count: usize },
    Boolean { trues: usize, count: usize },
    Category { counts: Vec<(&'static str, usize)>, count: usize },
    Coordinate { x: f64, y: f64, count: usize },
}

impl Accumulator {
    fn new(kind: MetricKind) -> Self {
        match kind {
            MetricKind::Numeric => Accumulator::Numeric { sum: 0.0, count: 0 },
            MetricKind::Boolean => Accumulator::Boolean { trues: 0, count: 0 },
            MetricKind::Category => Accumulator::Category {
                counts: Vec::new(),
                count: 0,
            },
            MetricKind::Coordinate => Accumulator::Coordinate {
                x: 0.0,
                y: 0.0,
                count: 0,
            },
        }
    }

    /// Add a value; `false` when its kind differs from the accumulator's
    fn add(&mut self, value: MetricValue) -> bool {
        match (self, value) {
            (Accumulator::Numeric { sum, count }, MetricValue::Numeric(v)) => {
                *sum += v;
                *count += 1;
            }
            (Accumulator::Boolean { trues, count }, MetricValue::Boolean(v)) => {
                *trues += usize::from(v);
                *count += 1;
            }
            (Accumulator::Category { counts, count }, MetricValue::Category(label)) => {
                match counts.iter_mut().find(|(seen, _)| *seen == label) {
                    Some((_, n)) => *n += 1,
                    None => counts.push((label, 1)),
                }
                *count += 1;
            }
            (Accumulator::Coordinate { x, y, count }, MetricValue::Coordinate(c)) => {
                *x += c.x;
                *y += c.y;
                *count += 1;
            }
            _ => return false,
        }
        true
    }

    fn finish(self) -> MetricSummary {
        let pct = |n: usize, total: usize| n as f64 / total as f64 * 100.0;
        // Accumulators are only created together with their first value
        match self {
            Accumulator::Numeric { sum, count } => MetricSummary::Mean(sum / count as f64),
            Accumulator::Boolean { trues, count } => {
                MetricSummary::TruePercentage(pct(trues, count))
            }
            Accumulator::Category { counts, count } => MetricSummary::Distribution(
                counts
                    .into_iter()
                    .map(|(label, n)| (label, pct(n, count)))
                    .collect(),
            ),
            Accumulator::Coordinate { x, y, count } => MetricSummary::Coordinate(
                Coordinate2D::new(x / count as f64, y / count as f64),
            ),
        }
    }
}

/// Reduce a bucket of records to one summary per metric name.
///
/// The union of metric names over the bucket is summarized; each name's
/// denominator is the number of records that carry it. When records
/// disagree on a metric's kind the first observed kind wins.
pub fn summarize<R: FeatureRecord>(records: &[R]) -> BTreeMap<&'static str, MetricSummary> {
    let mut accumulators: BTreeMap<&'static str, Accumulator> = BTreeMap::new();

    for record in records {
        for metric in record.metrics() {
            let accumulator = accumulators
                .entry(metric.name)
                .or_insert_with(|| Accumulator::new(metric.value.kind()));
            if !accumulator.add(metric.value) {
                tracing::debug!(
                    "Frame {}: skipping {:?} value for metric {}",
                    record.frame(),
                    metric.value.kind(),
                    metric.name
                );
            }
        }
    }

    accumulators
        .into_iter()
        .map(|(name, accumulator)| (name, accumulator.finish()))
        .collect()
}

/// Summary of one temporal bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketSummary {
    /// `Groupe_1`..`Groupe_5`, or `Groupe_Unique` for short sequences
    pub groupe: String,
    /// `frames_{first}-{last}` over positions in the aggregated sequence
    pub range: String,
    pub frames_count: usize,
    #[serde(flatten)]
    pub metrics: BTreeMap<&'static str, MetricSummary>,
}

impl BucketSummary {
    pub fn metric(&self, name: &str) -> Option<&MetricSummary> {
        self.metrics.get(name)
    }
}

/// Aggregation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Tag appended to the report metadata
    pub processing_method: String,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            processing_method: DEFAULT_PROCESSING_METHOD.to_string(),
        }
    }
}

/// Cuts record sequences into temporal buckets and summarizes them
#[derive(Debug, Clone, Default)]
pub struct TemporalAggregator {
    config: AggregatorConfig,
}

impl TemporalAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Bucket summaries of one ordered record sequence (empty for no records)
    pub fn aggregate<R: FeatureRecord>(&self, records: &[R]) -> Vec<BucketSummary> {
        let ranges = partition(records.len());
        let single = ranges.len() == 1;

        ranges
            .into_iter()
            .enumerate()
            .map(|(i, range)| {
                let groupe = if single {
                    "Groupe_Unique".to_string()
                } else {
                    format!("Groupe_{}", i + 1)
                };
                tracing::debug!(
                    "{}: frames {}-{} ({} records)",
                    groupe,
                    range.start,
                    range.end - 1,
                    range.len()
                );

                BucketSummary {
                    range: format!("frames_{}-{}", range.start, range.end - 1),
                    frames_count: range.len(),
                    metrics: summarize(&records[range]),
                    groupe,
                }
            })
            .collect()
    }

    /// Bucket summaries over individual hands.
    ///
    /// Each detected hand counts as its own record, so a frame with two
    /// hands contributes two elements.
    pub fn aggregate_hands(&self, frames: &[HandsFeatures]) -> Vec<BucketSummary> {
        let hands: Vec<&HandFeatures> = frames
            .iter()
            .flat_map(|frame| frame.hands_data.iter())
            .collect();
        self.aggregate(&hands)
    }

    /// Aggregate every sequence of a run into the report layout
    pub fn aggregate_run(&self, run: &RunResult) -> AggregatedReport {
        let report = AggregatedReport {
            face_analysis: self.aggregate(&run.face_analysis),
            pose_analysis: self.aggregate(&run.pose_analysis),
            hand_analysis: self.aggregate_hands(&run.hand_analysis),
            eye_contact: self.aggregate(&run.eye_contact),
            facial_expressions: self.aggregate(&run.facial_expressions),
            metadata: ReportMetadata {
                run: run.metadata.clone(),
                processing_method: self.config.processing_method.clone(),
            },
        };

        tracing::info!(
            "Aggregated run: {} face / {} pose / {} hand / {} eye contact / {} expression buckets",
            report.face_analysis.len(),
            report.pose_analysis.len(),
            report.hand_analysis.len(),
            report.eye_contact.len(),
            report.facial_expressions.len()
        );

        report
    }
}
