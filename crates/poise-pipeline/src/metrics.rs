//! Whole-session movement metrics.
//!
//! Unlike the bucketed report these are single figures over the entire run.
//! Each figure is absent when the sequence it is computed from is empty.

use poise_core::{mean, std_dev, variance};
use serde::{Deserialize, Serialize};

use crate::run::RunResult;

/// Head movement over the session (degrees, population variance)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadMovement {
    pub tilt_variance: f64,
    pub nod_variance: f64,
    pub average_tilt: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PostureStability {
    /// 100 for a perfectly steady shoulder line, losing 10 points per
    /// degree of shoulder tilt standard deviation, floored at 0
    pub shoulder_stability: f64,
}

/// Session-level summary of a run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eye_contact_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_movement: Option<HeadMovement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smile_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hands_visible_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posture_stability: Option<PostureStability>,
}

/// Share of `items` matching `pred`, in percent
fn percentage<T>(items: &[T], pred: impl Fn(&T) -> bool) -> Option<f64> {
    if items.is_empty() {
        return None;
    }
    let matching = items.iter().filter(|item| pred(item)).count();
    Some(matching as f64 / items.len() as f64 * 100.0)
}

impl SessionMetrics {
    pub fn from_run(run: &RunResult) -> Self {
        let eye_contact_percentage = percentage(&run.eye_contact, |gaze| gaze.looking_at_camera);

        let tilts: Vec<f64> = run.face_analysis.iter().map(|f| f.head_tilt).collect();
        let nods: Vec<f64> = run.face_analysis.iter().map(|f| f.head_nod).collect();
        let head_movement = match (variance(&tilts), variance(&nods), mean(tilts.iter().copied())) {
            (Some(tilt_variance), Some(nod_variance), Some(average_tilt)) => Some(HeadMovement {
                tilt_variance,
                nod_variance,
                average_tilt,
            }),
            _ => None,
        };

        let smile_percentage = percentage(&run.facial_expressions, |e| e.is_smiling);

        let processed = run.metadata.processed_frames;
        let hands_visible_percentage = (processed > 0 && !run.hand_analysis.is_empty()).then(|| {
            let hand_frames = run
                .hand_analysis
                .iter()
                .filter(|frame| frame.hands_detected > 0)
                .count();
            (hand_frames as f64 / processed as f64 * 100.0).min(100.0)
        });

        let shoulder_tilts: Vec<f64> = run.pose_analysis.iter().map(|p| p.shoulder_tilt).collect();
        let posture_stability = std_dev(&shoulder_tilts).map(|std| PostureStability {
            shoulder_stability: 100.0 - (std * 10.0).min(100.0),
        });

        Self {
            eye_contact_percentage,
            head_movement,
            smile_percentage,
            hands_visible_percentage,
            posture_stability,
        }
    }
}
