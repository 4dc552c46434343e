/// YOLO face detector using ONNX Runtime via `ort`.
///
/// Handles letterbox preprocessing, inference, NMS post-processing and
/// keypoint decoding. Produces faces without identity embeddings; those
/// are attached by the model adapter.
use std::path::Path;
use std::sync::Mutex;

use crate::detection::domain::face::{BoundingBox, Face};
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::detection::infrastructure::execution_provider::open_session;
use crate::shared::error::BoxError;
use crate::shared::image::Image;

/// Fallback YOLO model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Default confidence threshold for face detection.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// Number of keypoints per detection (5 landmarks × 3 values each: x, y, conf).
const NUM_KEYPOINT_VALUES: usize = 15;

/// Minimum keypoint confidence to treat a landmark as visible.
const KEYPOINT_CONF_THRESH: f64 = 0.5;

pub struct OnnxYoloDetector {
    session: Mutex<ort::session::Session>,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting NCHW).
    /// Falls back to 640 if the shape is dynamic or unreadable.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = open_session(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        Ok(Self {
            session: Mutex::new(session),
            confidence,
            input_size,
        })
    }

    pub fn detect(&self, image: &Image) -> Result<Vec<Face>, BoxError> {
        if image.is_empty() {
            return Ok(Vec::new());
        }
        let (input_tensor, scale, pad_x, pad_y) = letterbox(image, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        if shape.len() != 3 {
            return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
        }

        // Output is [1, features, detections] (transposed) or [1, detections, features].
        let transposed = shape[1] < shape[2];
        let (num_dets, num_feats) = if transposed {
            (shape[2], shape[1])
        } else {
            (shape[1], shape[2])
        };
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let mut raw_dets = Vec::new();
        for i in 0..num_dets {
            let row: Vec<f32> = if transposed {
                (0..num_feats).map(|f| data[f * num_dets + i]).collect()
            } else {
                data[i * num_feats..(i + 1) * num_feats].to_vec()
            };
            if let Some(det) = decode_row(&row, self.confidence, scale, pad_x, pad_y) {
                raw_dets.push(det);
            }
        }
        drop(outputs);
        drop(session);

        Ok(nms(&mut raw_dets, NMS_IOU_THRESH)
            .into_iter()
            .map(RawDetection::into_face)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Letterbox-resize an image to `target_size` × `target_size`.
///
/// Returns `(NCHW float32 tensor, scale, pad_x, pad_y)`.
fn letterbox(image: &Image, target_size: u32) -> (ndarray::Array4<f32>, f64, u32, u32) {
    let fw = image.width() as f64;
    let fh = image.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // Padding is 114/255 gray (YOLO convention).
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = image.as_ndarray();
    let src_h = image.height() as usize;
    let src_w = image.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (tensor, scale, pad_x, pad_y)
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct RawDetection {
    bbox: BoundingBox,
    confidence: f64,
    keypoints: Option<[(f64, f64); 5]>,
}

impl RawDetection {
    fn into_face(self) -> Face {
        let face = Face::new(self.bbox, self.confidence);
        match self.keypoints.map(FaceLandmarks::new) {
            Some(lm) if lm.has_visible() => face.with_landmarks(lm),
            _ => face,
        }
    }
}

/// Decode one `[cx, cy, w, h, conf, kp0_x, kp0_y, kp0_conf, ...]` row back
/// into original image coordinates. `None` below the confidence threshold.
fn decode_row(
    row: &[f32],
    confidence: f64,
    scale: f64,
    pad_x: u32,
    pad_y: u32,
) -> Option<RawDetection> {
    if row.len() < 5 {
        return None;
    }
    let conf = row[4] as f64;
    if conf < confidence {
        return None;
    }

    let unpad = |v: f32, pad: u32| (v as f64 - pad as f64) / scale;
    let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
    let bbox = BoundingBox::new(
        unpad(cx - w / 2.0, pad_x),
        unpad(cy - h / 2.0, pad_y),
        unpad(cx + w / 2.0, pad_x),
        unpad(cy + h / 2.0, pad_y),
    );

    let keypoints = (row.len() >= 5 + NUM_KEYPOINT_VALUES).then(|| {
        let mut pts = [(0.0f64, 0.0f64); 5];
        for (k, pt) in pts.iter_mut().enumerate() {
            let kconf = row[5 + k * 3 + 2] as f64;
            // Low-confidence points stay at (0, 0), which FaceLandmarks treats as invisible.
            if kconf >= KEYPOINT_CONF_THRESH {
                *pt = (unpad(row[5 + k * 3], pad_x), unpad(row[5 + k * 3 + 1], pad_y));
            }
        }
        pts
    });

    Some(RawDetection {
        bbox,
        confidence: conf,
        keypoints,
    })
}

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
fn nms(dets: &mut [RawDetection], iou_thresh: f64) -> Vec<RawDetection> {
    dets.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep = Vec::new();
    let mut suppressed = vec![false; dets.len()];

    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(dets[i].clone());
        for j in (i + 1)..dets.len() {
            if !suppressed[j] && dets[i].bbox.iou(&dets[j].bbox) > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}
