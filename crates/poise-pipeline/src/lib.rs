//! # Poise-Pipeline
//!
//! Runs frame-level feature extraction over a whole video and condenses the
//! result.
//!
//! ## Stages
//!
//! 1. **Sampling**: [`VideoPipeline`] reads a [`FrameSource`] in order and
//!    processes every `skip_frames`-th frame
//! 2. **Accumulation**: present records are appended to the five ordered
//!    sequences of a [`RunResult`]
//! 3. **Aggregation**: [`TemporalAggregator`] cuts each sequence into five
//!    temporal buckets and summarizes every metric per bucket
//!
//! [`SessionMetrics`] adds whole-run figures such as the eye contact and
//! smile percentages.

pub mod aggregator;
pub mod config;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod run;
pub mod source;

pub use aggregator::*;
pub use config::*;
pub use metrics::*;
pub use pipeline::*;
pub use report::*;
pub use run::*;
pub use source::*;
