//! # Poise-Features
//!
//! Per-frame nonverbal feature extraction.
//!
//! A [`LandmarkProvider`] turns an image into landmark sets; the extractors
//! in this crate turn those landmarks into typed feature records:
//!
//! - **Face**: head orientation, gaze and eye contact, mouth and eyebrow
//!   expression
//! - **Pose**: shoulder line and head position over the shoulders
//! - **Hands**: activity, spread, extended fingers, zone and gesture
//!
//! [`FrameProcessor`] runs the provider and all extractors on one frame and
//! derives the gaze and expression views from the face record.

pub mod face;
pub mod frame;
pub mod hands;
pub mod pose;
pub mod provider;
pub mod views;

pub use face::*;
pub use frame::*;
pub use hands::*;
pub use pose::*;
pub use provider::*;
pub use views::*;
