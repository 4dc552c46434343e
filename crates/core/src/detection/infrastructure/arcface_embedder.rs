/// ArcFace identity embeddings using ONNX Runtime.
///
/// Each detected face crop is mapped to an L2-normalized 512-d vector. The
/// swapper consumes the source face's vector as its identity input.
use std::path::Path;
use std::sync::Mutex;

use crate::detection::domain::face::BoundingBox;
use crate::detection::infrastructure::execution_provider::open_session;
use crate::shared::error::BoxError;

pub const EMBEDDING_DIM: usize = 512;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct ArcFaceEmbedder {
    session: Mutex<ort::session::Session>,
}

impl ArcFaceEmbedder {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: Mutex::new(open_session(model_path)?),
        })
    }

    /// Embedding of the `bbox` region of `image`.
    pub fn embed(&self, image: &image::RgbImage, bbox: &BoundingBox) -> Result<Vec<f32>, BoxError> {
        let (x, y, w, h) = clamp_to_image(bbox, image.width(), image.height())
            .ok_or("Face box lies outside the image")?;
        let crop = image::imageops::crop_imm(image, x, y, w, h).to_image();

        let tensor = preprocess(crop.as_raw(), w, h);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let embedding_slice = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?;

        let mut embedding = embedding_slice.to_vec();
        l2_normalize(&mut embedding);
        Ok(embedding)
    }
}

/// Integer `(x, y, w, h)` of `bbox` clipped to the image, `None` if empty.
pub fn clamp_to_image(bbox: &BoundingBox, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let x1 = bbox.left.max(0.0).floor() as u32;
    let y1 = bbox.top.max(0.0).floor() as u32;
    let x2 = (bbox.right.ceil().max(0.0) as u32).min(width);
    let y2 = (bbox.bottom.ceil().max(0.0) as u32).min(height);
    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some((x1, y1, x2 - x1, y2 - y1))
}

/// Resize crop to 112x112, normalize, NCHW layout.
fn preprocess(rgb_data: &[u8], width: u32, height: u32) -> ndarray::Array4<f32> {
    let src_w = width as usize;
    let src_h = height as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));

    for y in 0..INPUT_SIZE {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let src_x =
                (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as usize).min(src_w - 1);
            let offset = (src_y * src_w + src_x) * 3;
            if offset + 2 < rgb_data.len() {
                for c in 0..3 {
                    tensor[[0, c, y, x]] = (rgb_data[offset + c] as f32 - NORM_MEAN) / NORM_STD;
                }
            }
        }
    }

    tensor
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
