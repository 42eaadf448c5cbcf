//! Aggregated report layout.

use poise_core::Result;
use serde::Serialize;

use crate::aggregator::BucketSummary;
use crate::run::Metadata;

/// Run metadata as reported, with the aggregation method appended
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMetadata {
    #[serde(flatten)]
    pub run: Metadata,
    pub processing_method: String,
}

/// Bucketed summaries of every record sequence of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedReport {
    pub face_analysis: Vec<BucketSummary>,
    pub pose_analysis: Vec<BucketSummary>,
    pub hand_analysis: Vec<BucketSummary>,
    pub eye_contact: Vec<BucketSummary>,
    pub facial_expressions: Vec<BucketSummary>,
    pub metadata: ReportMetadata,
}

impl AggregatedReport {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
