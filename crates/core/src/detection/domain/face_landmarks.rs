//! 5-point face landmarks reported alongside a detection.
//!
//! The swap step anchors its face crop on the weighted landmark centroid,
//! which tracks the visual face center better than the box center when the
//! head is turned.

/// Landmark weights: [left_eye, right_eye, nose, left_mouth, right_mouth].
const WEIGHTS: [f64; 5] = [2.0, 2.0, 3.0, 1.0, 1.0];

#[derive(Clone, Debug, PartialEq)]
pub struct FaceLandmarks {
    /// Points with x <= 0 are treated as invisible.
    points: [(f64, f64); 5],
}

impl FaceLandmarks {
    pub fn new(points: [(f64, f64); 5]) -> Self {
        Self { points }
    }

    pub fn has_visible(&self) -> bool {
        self.points.iter().any(|(x, _)| *x > 0.0)
    }

    /// Weighted centroid of visible landmarks, `None` when none are visible.
    pub fn center(&self) -> Option<(f64, f64)> {
        let mut wx_sum = 0.0;
        let mut wy_sum = 0.0;
        let mut w_sum = 0.0;

        for (i, (x, y)) in self.points.iter().enumerate() {
            if *x > 0.0 {
                let w = WEIGHTS[i];
                wx_sum += x * w;
                wy_sum += y * w;
                w_sum += w;
            }
        }

        if w_sum == 0.0 {
            return None;
        }

        Some((wx_sum / w_sum, wy_sum / w_sum))
    }
}
