//! Frame source boundary.
//!
//! Video decoding lives outside this crate; a [`FrameSource`] hands decoded
//! images over in order together with the stream's reported frame rate and
//! length.

use std::collections::VecDeque;

use poise_core::{Error, FrameIndex, Result};

/// Ordered, finite sequence of decoded images
pub trait FrameSource {
    type Image;

    /// Frame rate reported by the source (0 when unknown)
    fn fps(&self) -> f64;

    /// Frame count reported by the source (0 when unknown)
    fn total_frame_count(&self) -> u64;

    /// Next image in index order, `None` once the source is exhausted.
    ///
    /// An error means the source can no longer be read and ends the run.
    fn next_frame(&mut self) -> Result<Option<Self::Image>>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    type Image = S::Image;

    fn fps(&self) -> f64 {
        (**self).fps()
    }

    fn total_frame_count(&self) -> u64 {
        (**self).total_frame_count()
    }

    fn next_frame(&mut self) -> Result<Option<Self::Image>> {
        (**self).next_frame()
    }
}

/// In-memory frame source, e.g. for replaying pre-decoded frames
#[derive(Debug, Clone)]
pub struct VecFrameSource<I> {
    frames: VecDeque<I>,
    fps: f64,
    total_frames: u64,
    position: FrameIndex,
    fail_at: Option<FrameIndex>,
}

impl<I> VecFrameSource<I> {
    pub fn new(frames: Vec<I>, fps: f64) -> Self {
        Self {
            total_frames: frames.len() as u64,
            frames: frames.into(),
            fps,
            position: 0,
            fail_at: None,
        }
    }

    /// Report a read failure instead of returning frame `index`
    pub fn with_failure_at(mut self, index: FrameIndex) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Index of the next frame to be read
    pub fn position(&self) -> FrameIndex {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl<I> FrameSource for VecFrameSource<I> {
    type Image = I;

    fn fps(&self) -> f64 {
        self.fps
    }

    fn total_frame_count(&self) -> u64 {
        self.total_frames
    }

    fn next_frame(&mut self) -> Result<Option<I>> {
        if self.fail_at == Some(self.position) {
            return Err(Error::Source(format!(
                "unable to decode frame {}",
                self.position
            )));
        }

        let frame = self.frames.pop_front();
        if frame.is_some() {
            self.position += 1;
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_source_order() {
        let mut source = VecFrameSource::new(vec!['a', 'b'], 25.0);
        assert_eq!(source.total_frame_count(), 2);
        assert_eq!(source.next_frame().unwrap(), Some('a'));
        assert_eq!(source.next_frame().unwrap(), Some('b'));
        assert_eq!(source.next_frame().unwrap(), None);
        assert_eq!(source.position(), 2);
    }

    #[test]
    fn test_injected_failure() {
        let mut source = VecFrameSource::new(vec![1, 2, 3], 25.0).with_failure_at(1);
        assert_eq!(source.next_frame().unwrap(), Some(1));
        assert!(matches!(source.next_frame(), Err(Error::Source(_))));
        assert_eq!(source.remaining(), 2);
    }
}
