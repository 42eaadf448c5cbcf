//! Frame sampling pipeline.
//!
//! Reads a [`FrameSource`] in index order, runs the [`FrameProcessor`] on
//! every sampled frame and accumulates the records into a [`RunResult`].
//! Frames are processed one at a time; the prefetching variant only moves
//! decoding onto a separate blocking task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use poise_core::{Error, FrameIndex};
use poise_features::{FrameProcessor, LandmarkProvider};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::run::{Metadata, RunResult};
use crate::source::FrameSource;

/// Configuration for the video pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Sampling interval: 0 processes every frame, N > 0 every frame whose
    /// index is a multiple of N
    pub skip_frames: u64,

    /// Decoded frames buffered ahead of processing by `run_prefetched`
    pub prefetch_depth: usize,

    /// Processed frames between two progress log lines (0 disables them)
    pub progress_interval: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            skip_frames: 0,
            prefetch_depth: 8,
            progress_interval: 20,
        }
    }
}

impl PipelineConfig {
    pub fn is_sampled(&self, index: FrameIndex) -> bool {
        self.skip_frames == 0 || index % self.skip_frames == 0
    }
}

/// Cooperative stop signal, checked once per frame
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Clear a previous stop request so the pipeline can run again
    pub fn reset(&self) {
        self.stopped.store(false, Ordering::SeqCst);
    }
}

/// Why a run ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Every frame of the source was read
    SourceExhausted,
    /// The stop signal was raised
    Cancelled,
    /// The source failed; records up to the failing frame are kept
    Aborted { frame: FrameIndex, reason: String },
}

/// Result of a run together with how it ended
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub result: RunResult,
    pub termination: Termination,
}

impl PipelineOutcome {
    pub fn is_complete(&self) -> bool {
        self.termination == Termination::SourceExhausted
    }

    pub fn into_result(self) -> RunResult {
        self.result
    }
}

/// Frame handed from the prefetching decoder to the processing loop
enum Prefetched<I> {
    Frame(FrameIndex, I),
    Failed(FrameIndex, Error),
}

/// Per-run accumulation state shared by both loop variants
struct RunState {
    result: RunResult,
    next_index: FrameIndex,
    total_frames: u64,
    progress_interval: u64,
}

impl RunState {
    fn new(fps: f64, total_frames: u64, progress_interval: u64) -> Self {
        Self {
            result: RunResult::new(Metadata::new(fps, total_frames)),
            next_index: 0,
            total_frames,
            progress_interval,
        }
    }

    fn log_progress(&self) {
        let processed = self.result.metadata.processed_frames;
        if self.progress_interval == 0 || processed % self.progress_interval != 0 {
            return;
        }

        if self.total_frames > 0 {
            let pct = self.next_index as f64 / self.total_frames as f64 * 100.0;
            tracing::info!(
                "Processed {} frames ({:.1}% of {})",
                processed,
                pct,
                self.total_frames
            );
        } else {
            tracing::info!("Processed {} frames", processed);
        }
    }

    fn finish(self, termination: Termination) -> PipelineOutcome {
        let metadata = &self.result.metadata;
        tracing::info!(
            "Run finished ({:?}): {} frames read, {} processed, {} face / {} pose / {} hand records",
            termination,
            self.next_index,
            metadata.processed_frames,
            self.result.face_analysis.len(),
            self.result.pose_analysis.len(),
            self.result.hand_analysis.len()
        );

        PipelineOutcome {
            result: self.result,
            termination,
        }
    }
}

/// Drives a [`FrameProcessor`] over a [`FrameSource`]
pub struct VideoPipeline<P> {
    config: PipelineConfig,
    processor: FrameProcessor<P>,
    stop: StopHandle,
}

impl<P: LandmarkProvider> VideoPipeline<P> {
    pub fn new(provider: P, config: PipelineConfig) -> Self {
        Self {
            config,
            processor: FrameProcessor::new(provider),
            stop: StopHandle::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn processor(&self) -> &FrameProcessor<P> {
        &self.processor
    }

    /// Handle that stops this pipeline from another thread or task
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Process one image that was read at `index`
    fn handle_frame(&mut self, state: &mut RunState, index: FrameIndex, image: &P::Image) {
        state.next_index = index + 1;
        if !self.config.is_sampled(index) {
            return;
        }

        let fps = state.result.metadata.fps;
        let frame = self.processor.process(image, index, fps);
        if let Err(e) = state.result.push(frame) {
            // Indices come from the loop counter; this only fires on a bug
            tracing::error!("Dropping frame {}: {}", index, e);
            return;
        }

        state.log_progress();
    }

    /// Run synchronously until the source is exhausted, the stop signal is
    /// raised or the source fails.
    ///
    /// Always returns the records accumulated so far.
    pub fn run<S>(&mut self, source: &mut S) -> PipelineOutcome
    where
        S: FrameSource<Image = P::Image>,
    {
        let mut state = RunState::new(
            source.fps(),
            source.total_frame_count(),
            self.config.progress_interval,
        );
        tracing::info!(
            "Starting run: {} frames at {} fps, skip_frames={}",
            state.total_frames,
            state.result.metadata.fps,
            self.config.skip_frames
        );

        loop {
            if self.stop.is_stopped() {
                tracing::info!("Stop requested before frame {}", state.next_index);
                return state.finish(Termination::Cancelled);
            }

            let index = state.next_index;
            match source.next_frame() {
                Ok(Some(image)) => self.handle_frame(&mut state, index, &image),
                Ok(None) => return state.finish(Termination::SourceExhausted),
                Err(e) => {
                    tracing::error!("Frame source failed at frame {}: {}", index, e);
                    return state.finish(Termination::Aborted {
                        frame: index,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    /// Like [`VideoPipeline::run`], but decodes up to `prefetch_depth`
    /// frames ahead on a blocking task.
    ///
    /// Processing stays sequential and in index order.
    pub async fn run_prefetched<S>(&mut self, mut source: S) -> PipelineOutcome
    where
        S: FrameSource<Image = P::Image> + Send + 'static,
        P::Image: Send + 'static,
    {
        let mut state = RunState::new(
            source.fps(),
            source.total_frame_count(),
            self.config.progress_interval,
        );
        tracing::info!(
            "Starting prefetched run: {} frames at {} fps, skip_frames={}, prefetch_depth={}",
            state.total_frames,
            state.result.metadata.fps,
            self.config.skip_frames,
            self.config.prefetch_depth
        );

        let (tx, mut rx) = mpsc::channel(self.config.prefetch_depth.max(1));
        let stop = self.stop.clone();

        // Returns true when the source ran out of frames
        let producer = tokio::task::spawn_blocking(move || {
            let mut index: FrameIndex = 0;
            loop {
                if stop.is_stopped() {
                    return false;
                }

                let item = match source.next_frame() {
                    Ok(Some(image)) => Prefetched::Frame(index, image),
                    Ok(None) => return true,
                    Err(e) => Prefetched::Failed(index, e),
                };
                let failed = matches!(item, Prefetched::Failed(..));

                if tx.blocking_send(item).is_err() || failed {
                    return false;
                }
                index += 1;
            }
        });

        let mut termination = None;
        while let Some(item) = rx.recv().await {
            if self.stop.is_stopped() {
                tracing::info!("Stop requested before frame {}", state.next_index);
                termination = Some(Termination::Cancelled);
                break;
            }

            match item {
                Prefetched::Frame(index, image) => {
                    if index != state.next_index {
                        tracing::error!(
                            "Prefetched frame {} arrived while expecting {}",
                            index,
                            state.next_index
                        );
                        termination = Some(Termination::Aborted {
                            frame: index,
                            reason: format!("out-of-order frame, expected {}", state.next_index),
                        });
                        break;
                    }
                    self.handle_frame(&mut state, index, &image);
                }
                Prefetched::Failed(index, e) => {
                    tracing::error!("Frame source failed at frame {}: {}", index, e);
                    termination = Some(Termination::Aborted {
                        frame: index,
                        reason: e.to_string(),
                    });
                    break;
                }
            }
        }

        // Unblocks a producer waiting on a full channel
        drop(rx);

        let exhausted = match producer.await {
            Ok(exhausted) => exhausted,
            Err(e) => {
                tracing::error!("Frame prefetch task failed: {}", e);
                termination.get_or_insert(Termination::Aborted {
                    frame: state.next_index,
                    reason: e.to_string(),
                });
                false
            }
        };

        let termination = termination.unwrap_or(if exhausted {
            Termination::SourceExhausted
        } else {
            Termination::Cancelled
        });
        state.finish(termination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::TemporalAggregator;
    use crate::source::VecFrameSource;
    use poise_core::schema::face as idx;
    use poise_core::{Detections, LandmarkPoint, LandmarkSet, Result};
    use poise_features::ContactQuality;

    /// Replays the detections it is handed; `None` simulates a provider failure
    struct ReplayProvider {
        calls: usize,
        stop_after: Option<(usize, StopHandle)>,
    }

    impl ReplayProvider {
        fn new() -> Self {
            Self {
                calls: 0,
                stop_after: None,
            }
        }
    }

    impl LandmarkProvider for ReplayProvider {
        type Image = Option<Detections>;

        fn detect(&mut self, image: &Self::Image) -> Result<Detections> {
            self.calls += 1;
            if let Some((limit, handle)) = &self.stop_after {
                if self.calls >= *limit {
                    handle.stop();
                }
            }
            image
                .clone()
                .ok_or_else(|| Error::Provider("inference failed".into()))
        }
    }

    /// Face mesh whose iris centres sit `gaze_dx` right of the gaze reference
    fn face_looking(gaze_dx: f64) -> LandmarkSet {
        let mut points = vec![LandmarkPoint::new(0.5, 0.4, 0.0); idx::POINT_COUNT];
        points[idx::LEFT_EYE_CENTER] = LandmarkPoint::new(0.5 + gaze_dx, 0.4, 0.0);
        points[idx::RIGHT_EYE_CENTER] = LandmarkPoint::new(0.5 + gaze_dx, 0.4, 0.0);
        for (upper, lower) in [
            (idx::LEFT_EYE_UPPER_LID, idx::LEFT_EYE_LOWER_LID),
            (idx::RIGHT_EYE_UPPER_LID, idx::RIGHT_EYE_LOWER_LID),
        ] {
            points[upper].y = 0.39;
            points[lower].y = 0.41;
        }
        LandmarkSet::new(points)
    }

    fn face_frame() -> Option<Detections> {
        Some(Detections {
            face: Some(face_looking(0.02)),
            ..Detections::empty()
        })
    }

    /// Frames 1-5 (indices 0-4) show a face, frames 6-10 do not
    fn half_face_source() -> VecFrameSource<Option<Detections>> {
        let frames = (0..10)
            .map(|i| {
                if i < 5 {
                    face_frame()
                } else {
                    Some(Detections::empty())
                }
            })
            .collect();
        VecFrameSource::new(frames, 10.0)
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.skip_frames, 0);
        assert_eq!(config.prefetch_depth, 8);
        assert_eq!(config.progress_interval, 20);
        assert!(config.is_sampled(7));
    }

    #[test]
    fn test_sampling_interval() {
        let config = PipelineConfig {
            skip_frames: 3,
            ..Default::default()
        };
        let sampled: Vec<FrameIndex> = (0..10).filter(|&i| config.is_sampled(i)).collect();
        assert_eq!(sampled, vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_face_only_in_first_half() {
        let mut pipeline = VideoPipeline::new(ReplayProvider::new(), PipelineConfig::default());
        let outcome = pipeline.run(&mut half_face_source());

        assert!(outcome.is_complete());
        let run = outcome.result;
        assert_eq!(run.face_analysis.len(), 5);
        assert_eq!(run.eye_contact.len(), 5);
        assert_eq!(run.facial_expressions.len(), 5);
        assert!(run
            .eye_contact
            .iter()
            .all(|gaze| gaze.contact_quality == ContactQuality::Excellent));
        assert!(run.pose_analysis.is_empty());
        assert!(run.hand_analysis.is_empty());

        assert_eq!(run.metadata.total_frames, 10);
        assert!((run.metadata.duration - 1.0).abs() < 1e-12);
        assert_eq!(run.metadata.processed_frames, 10);

        let frames: Vec<FrameIndex> = run.face_analysis.iter().map(|f| f.frame).collect();
        assert_eq!(frames, vec![0, 1, 2, 3, 4]);
        assert!((run.face_analysis[4].timestamp - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_face_only_run_aggregates_to_single_bucket() {
        let mut pipeline = VideoPipeline::new(ReplayProvider::new(), PipelineConfig::default());
        let run = pipeline.run(&mut half_face_source()).into_result();
        let report = TemporalAggregator::default().aggregate_run(&run);

        assert_eq!(report.face_analysis.len(), 1);
        assert_eq!(report.face_analysis[0].groupe, "Groupe_Unique");
        assert_eq!(report.face_analysis[0].frames_count, 5);
        assert_eq!(
            report.eye_contact[0].metric("contact_quality").unwrap().to_string(),
            "100%excellent"
        );
        assert!(report.pose_analysis.is_empty());
        assert!(report.hand_analysis.is_empty());
        assert!((report.metadata.run.duration - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_skip_frames_samples_by_index() {
        let config = PipelineConfig {
            skip_frames: 2,
            ..Default::default()
        };
        let mut pipeline = VideoPipeline::new(ReplayProvider::new(), config);
        let outcome = pipeline.run(&mut half_face_source());

        let frames: Vec<FrameIndex> = outcome.result.face_analysis.iter().map(|f| f.frame).collect();
        assert_eq!(frames, vec![0, 2, 4]);
        assert_eq!(outcome.result.metadata.processed_frames, 5);
        assert_eq!(pipeline.processor().provider().calls, 5);
    }

    #[test]
    fn test_provider_failure_does_not_abort() {
        let frames = vec![face_frame(), None, face_frame()];
        let mut pipeline = VideoPipeline::new(ReplayProvider::new(), PipelineConfig::default());
        let outcome = pipeline.run(&mut VecFrameSource::new(frames, 30.0));

        assert!(outcome.is_complete());
        assert_eq!(outcome.result.face_analysis.len(), 2);
        assert_eq!(outcome.result.metadata.processed_frames, 3);
    }

    #[test]
    fn test_source_failure_keeps_partial_result() {
        let mut source = half_face_source().with_failure_at(3);
        let mut pipeline = VideoPipeline::new(ReplayProvider::new(), PipelineConfig::default());
        let outcome = pipeline.run(&mut source);

        match &outcome.termination {
            Termination::Aborted { frame, .. } => assert_eq!(*frame, 3),
            other => panic!("expected aborted run, got {:?}", other),
        }
        assert_eq!(outcome.result.face_analysis.len(), 3);
        assert_eq!(outcome.result.eye_contact.len(), 3);
    }

    #[test]
    fn test_cancellation_between_frames() {
        let mut pipeline = VideoPipeline::new(ReplayProvider::new(), PipelineConfig::default());
        let handle = pipeline.stop_handle();
        pipeline.processor.provider_mut().stop_after = Some((3, handle));

        let outcome = pipeline.run(&mut half_face_source());

        assert_eq!(outcome.termination, Termination::Cancelled);
        assert_eq!(outcome.result.metadata.processed_frames, 3);
        assert_eq!(outcome.result.face_analysis.len(), 3);
        assert_eq!(outcome.result.eye_contact.len(), 3);
    }

    #[test]
    fn test_stop_before_run() {
        let mut pipeline = VideoPipeline::new(ReplayProvider::new(), PipelineConfig::default());
        pipeline.stop_handle().stop();

        let outcome = pipeline.run(&mut half_face_source());
        assert_eq!(outcome.termination, Termination::Cancelled);
        assert!(outcome.result.is_empty());

        pipeline.stop_handle().reset();
        assert!(pipeline.run(&mut half_face_source()).is_complete());
    }

    #[test]
    fn test_zero_fps_source() {
        let mut pipeline = VideoPipeline::new(ReplayProvider::new(), PipelineConfig::default());
        let outcome = pipeline.run(&mut VecFrameSource::new(vec![face_frame()], 0.0));

        assert_eq!(outcome.result.metadata.duration, 0.0);
        assert_eq!(outcome.result.face_analysis[0].timestamp, 0.0);
    }

    #[tokio::test]
    async fn test_prefetched_matches_sync_run() {
        let config = PipelineConfig {
            prefetch_depth: 2,
            ..Default::default()
        };

        let mut sync_pipeline = VideoPipeline::new(ReplayProvider::new(), config.clone());
        let expected = sync_pipeline.run(&mut half_face_source());

        let mut pipeline = VideoPipeline::new(ReplayProvider::new(), config);
        let outcome = pipeline.run_prefetched(half_face_source()).await;

        assert!(outcome.is_complete());
        assert_eq!(outcome.result, expected.result);
    }

    #[tokio::test]
    async fn test_prefetched_source_failure() {
        let mut pipeline = VideoPipeline::new(ReplayProvider::new(), PipelineConfig::default());
        let outcome = pipeline
            .run_prefetched(half_face_source().with_failure_at(2))
            .await;

        assert!(matches!(
            outcome.termination,
            Termination::Aborted { frame: 2, .. }
        ));
        assert_eq!(outcome.result.face_analysis.len(), 2);
    }

    #[tokio::test]
    async fn test_prefetched_cancellation() {
        let mut pipeline = VideoPipeline::new(ReplayProvider::new(), PipelineConfig::default());
        let handle = pipeline.stop_handle();
        pipeline.processor.provider_mut().stop_after = Some((4, handle));

        let outcome = pipeline.run_prefetched(half_face_source()).await;

        assert_eq!(outcome.termination, Termination::Cancelled);
        assert_eq!(outcome.result.metadata.processed_frames, 4);
    }
}
