use crate::detection::domain::face_landmarks::FaceLandmarks;

/// Axis-aligned face box in image pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl BoundingBox {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f64 {
        (self.right - self.left).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.bottom - self.top).max(0.0)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let inter = BoundingBox::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        )
        .area();
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }
}

/// A face reported by the model adapter.
///
/// `embedding` is opaque identity data consumed only by the swap step.
/// Faces are scoped to the request that detected them.
#[derive(Clone, Debug, PartialEq)]
pub struct Face {
    pub bbox: BoundingBox,
    pub score: f64,
    pub landmarks: Option<FaceLandmarks>,
    pub embedding: Vec<f32>,
}

impl Face {
    pub fn new(bbox: BoundingBox, score: f64) -> Self {
        Self {
            bbox,
            score,
            landmarks: None,
            embedding: Vec::new(),
        }
    }

    pub fn with_landmarks(mut self, landmarks: FaceLandmarks) -> Self {
        self.landmarks = Some(landmarks);
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }
}

/// Stable sort by the left edge of the bounding box, so ordinal selection
/// is deterministic for identical detector output. Ties keep detector order.
pub fn sort_left_to_right(faces: &mut [Face]) {
    faces.sort_by(|a, b| a.bbox.left.total_cmp(&b.bbox.left));
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn face_at(left: f64, score: f64) -> Face {
        Face::new(BoundingBox::new(left, 10.0, left + 50.0, 60.0), score)
    }

    #[test]
    fn test_bbox_dimensions() {
        let b = BoundingBox::new(10.0, 20.0, 40.0, 80.0);
        assert_relative_eq!(b.width(), 30.0);
        assert_relative_eq!(b.height(), 60.0);
        assert_relative_eq!(b.area(), 1800.0);
        assert_eq!(b.center(), (25.0, 50.0));
    }

    #[test]
    fn test_inverted_bbox_has_zero_area() {
        let b = BoundingBox::new(40.0, 20.0, 10.0, 80.0);
        assert_eq!(b.area(), 0.0);
    }

    #[test]
    fn test_iou_no_overlap() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_identical() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert_relative_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn test_sort_orders_by_left_edge() {
        let mut faces = vec![face_at(200.0, 0.9), face_at(100.0, 0.8), face_at(150.0, 0.7)];
        sort_left_to_right(&mut faces);
        let lefts: Vec<f64> = faces.iter().map(|f| f.bbox.left).collect();
        assert_eq!(lefts, vec![100.0, 150.0, 200.0]);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let mut faces = vec![face_at(100.0, 0.1), face_at(100.0, 0.2), face_at(50.0, 0.3)];
        sort_left_to_right(&mut faces);
        let scores: Vec<f64> = faces.iter().map(|f| f.score).collect();
        assert_eq!(scores, vec![0.3, 0.1, 0.2]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let mut faces = vec![face_at(300.0, 0.5), face_at(10.0, 0.6), face_at(120.0, 0.7)];
        sort_left_to_right(&mut faces);
        let once = faces.clone();
        sort_left_to_right(&mut faces);
        assert_eq!(faces, once);
    }
}
