//! Anatomical landmark index schema.
//!
//! Point ordering is fixed by the landmark provider (MediaPipe Face Mesh
//! with refined irises, Pose and Hands). Every extractor reads indices
//! from these tables only, so a provider schema change is a change here.

/// Refined face mesh: 468 surface points plus 10 iris points
pub mod face {
    pub const POINT_COUNT: usize = 478;
    /// Mesh without the refined iris points
    pub const BASE_POINT_COUNT: usize = 468;

    // === Head orientation ===
    pub const NOSE_TIP: usize = 1;
    pub const CHIN: usize = 175;
    pub const LEFT_EAR: usize = 234;
    pub const RIGHT_EAR: usize = 454;
    pub const FOREHEAD: usize = 10;

    // === Cheeks ===
    pub const LEFT_CHEEK: usize = 116;
    pub const RIGHT_CHEEK: usize = 345;

    // === Eyes ===
    /// Left iris centre
    pub const LEFT_EYE_CENTER: usize = 468;
    /// Right iris centre
    pub const RIGHT_EYE_CENTER: usize = 473;
    pub const LEFT_EYE_INNER: usize = 133;
    pub const LEFT_EYE_OUTER: usize = 33;
    pub const RIGHT_EYE_INNER: usize = 362;
    pub const RIGHT_EYE_OUTER: usize = 263;
    pub const LEFT_EYE_LOWER_LID: usize = 145;
    pub const LEFT_EYE_UPPER_LID: usize = 159;
    pub const RIGHT_EYE_LOWER_LID: usize = 374;
    pub const RIGHT_EYE_UPPER_LID: usize = 386;

    // === Mouth ===
    pub const MOUTH_LEFT: usize = 61;
    pub const MOUTH_RIGHT: usize = 291;
    pub const MOUTH_TOP: usize = 13;
    pub const MOUTH_BOTTOM: usize = 14;
    pub const UPPER_LIP: usize = 12;
    pub const LOWER_LIP: usize = 15;
    /// Inner corners used for curvature
    pub const LEFT_MOUTH_CORNER: usize = 308;
    pub const RIGHT_MOUTH_CORNER: usize = 78;

    // === Eyebrows ===
    pub const LEFT_EYEBROW_INNER: usize = 70;
    pub const LEFT_EYEBROW_OUTER: usize = 107;
    pub const RIGHT_EYEBROW_INNER: usize = 300;
    pub const RIGHT_EYEBROW_OUTER: usize = 336;
}

/// Full-body pose (33 points)
pub mod pose {
    pub const POINT_COUNT: usize = 33;

    pub const NOSE: usize = 0;
    pub const LEFT_EAR: usize = 7;
    pub const RIGHT_EAR: usize = 8;
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
}

/// One hand (21 points)
pub mod hand {
    pub const POINT_COUNT: usize = 21;

    pub const WRIST: usize = 0;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_PIP: usize = 14;
    pub const RING_TIP: usize = 16;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_TIP: usize = 20;

    /// (tip, base) pairs compared to decide whether a finger is extended
    pub const FINGER_PAIRS: [(usize, usize); 5] = [
        (THUMB_TIP, THUMB_IP),
        (INDEX_TIP, INDEX_PIP),
        (MIDDLE_TIP, MIDDLE_PIP),
        (RING_TIP, RING_PIP),
        (PINKY_TIP, PINKY_PIP),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_within_point_count() {
        let face_indices = [
            face::NOSE_TIP,
            face::CHIN,
            face::LEFT_EAR,
            face::RIGHT_EAR,
            face::LEFT_EYE_CENTER,
            face::RIGHT_EYE_CENTER,
            face::RIGHT_EYEBROW_OUTER,
        ];
        assert!(face_indices.iter().all(|&i| i < face::POINT_COUNT));
        assert!([
            face::LEFT_EYE_INNER,
            face::LEFT_EYE_OUTER,
            face::RIGHT_EYE_INNER,
            face::RIGHT_EYE_OUTER,
        ]
        .iter()
        .all(|&i| i < face::BASE_POINT_COUNT));
        assert!(pose::RIGHT_SHOULDER < pose::POINT_COUNT);
        assert!(hand::FINGER_PAIRS
            .iter()
            .all(|&(tip, base)| tip < hand::POINT_COUNT && base < hand::POINT_COUNT));
    }
}
