/// Face swapping with an inswapper-128 style ONNX model.
///
/// The model takes a 128×128 RGB crop of the destination face (`target`)
/// and a 512-d identity latent (`source`), and returns the crop with the
/// identity replaced. The crop is pasted back onto a copy of the
/// destination image.
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::{Array1, Array2, Array4, ArrayViewD, Ix4};

use crate::detection::domain::face::{BoundingBox, Face};
use crate::detection::infrastructure::arcface_embedder::{
    clamp_to_image, l2_normalize, EMBEDDING_DIM,
};
use crate::detection::infrastructure::execution_provider::open_session;
use crate::shared::error::BoxError;

pub const SWAP_INPUT_SIZE: u32 = 128;

/// Crop side relative to the larger face box dimension.
const CROP_SCALE: f64 = 1.2;

pub struct InswapperSwapper {
    session: Mutex<ort::session::Session>,
    emap: Array2<f32>,
}

impl InswapperSwapper {
    /// `emap_path` points at a raw little-endian `f32` 512×512 matrix that
    /// projects ArcFace embeddings into the swapper's latent space.
    pub fn new(model_path: &Path, emap_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let emap = load_emap(emap_path)?;
        Ok(Self {
            session: Mutex::new(open_session(model_path)?),
            emap,
        })
    }

    pub fn swap(
        &self,
        destination: &RgbImage,
        dest_face: &Face,
        source_face: &Face,
    ) -> Result<RgbImage, BoxError> {
        if source_face.embedding.len() != EMBEDDING_DIM {
            return Err(format!(
                "source face embedding has {} values, expected {EMBEDDING_DIM}",
                source_face.embedding.len()
            )
            .into());
        }
        let latent = project_latent(&source_face.embedding, &self.emap);

        let (x, y, w, h) = crop_region(dest_face, destination.width(), destination.height())
            .ok_or("Destination face lies outside the image")?;
        let crop = imageops::crop_imm(destination, x, y, w, h).to_image();
        let target = to_tensor(&imageops::resize(
            &crop,
            SWAP_INPUT_SIZE,
            SWAP_INPUT_SIZE,
            FilterType::Triangle,
        ));
        let source = Array2::from_shape_vec((1, EMBEDDING_DIM), latent)?;

        let target_value = ort::value::Tensor::from_array(target)?;
        let source_value = ort::value::Tensor::from_array(source)?;
        let swapped = {
            let mut session = self
                .session
                .lock()
                .map_err(|e| format!("Lock poisoned: {e}"))?;
            let outputs = session.run(ort::inputs![
                "target" => target_value,
                "source" => source_value
            ])?;
            let output = outputs[0].try_extract_array::<f32>()?;
            from_tensor(output)?
        };

        let patch = imageops::resize(&swapped, w, h, FilterType::Triangle);
        let mut result = destination.clone();
        imageops::replace(&mut result, &patch, x as i64, y as i64);
        Ok(result)
    }
}

fn load_emap(path: &Path) -> Result<Array2<f32>, Box<dyn std::error::Error>> {
    let bytes = fs::read(path)?;
    let expected = EMBEDDING_DIM * EMBEDDING_DIM * 4;
    if bytes.len() != expected {
        return Err(format!(
            "emap {} has {} bytes, expected {expected}",
            path.display(),
            bytes.len()
        )
        .into());
    }
    let values: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Ok(Array2::from_shape_vec((EMBEDDING_DIM, EMBEDDING_DIM), values)?)
}

/// `normalize(embedding · emap)`.
fn project_latent(embedding: &[f32], emap: &Array2<f32>) -> Vec<f32> {
    let mut latent = Array1::from(embedding.to_vec()).dot(emap).to_vec();
    l2_normalize(&mut latent);
    latent
}

/// Square crop around the face, anchored on landmarks when available.
fn crop_region(face: &Face, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let (cx, cy) = face
        .landmarks
        .as_ref()
        .and_then(|lm| lm.center())
        .unwrap_or_else(|| face.bbox.center());
    let half = face.bbox.width().max(face.bbox.height()) * CROP_SCALE / 2.0;
    clamp_to_image(
        &BoundingBox::new(cx - half, cy - half, cx + half, cy + half),
        width,
        height,
    )
}

/// RGB image to NCHW float in [0, 1].
fn to_tensor(img: &RgbImage) -> Array4<f32> {
    let (w, h) = img.dimensions();
    let mut tensor = Array4::<f32>::zeros((1, 3, h as usize, w as usize));
    for (x, y, pixel) in img.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }
    tensor
}

/// NCHW float in [0, 1] back to an RGB image, clamping out-of-range values.
fn from_tensor(output: ArrayViewD<'_, f32>) -> Result<RgbImage, BoxError> {
    let output = output.into_dimensionality::<Ix4>()?;
    let (_, channels, h, w) = output.dim();
    if channels != 3 {
        return Err(format!("Unexpected swapper output shape: {:?}", output.shape()).into());
    }
    Ok(RgbImage::from_fn(w as u32, h as u32, |x, y| {
        let px = |c: usize| {
            (output[[0, c, y as usize, x as usize]] * 255.0)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        image::Rgb([px(0), px(1), px(2)])
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_landmarks::FaceLandmarks;
    use approx::assert_relative_eq;

    #[test]
    fn test_project_latent_normalizes() {
        let identity = Array2::eye(2);
        let latent = project_latent(&[3.0, 4.0], &identity);
        assert_relative_eq!(latent[0], 0.6, epsilon = 1e-6);
        assert_relative_eq!(latent[1], 0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_project_latent_applies_emap() {
        // Swaps the two axes.
        let emap = Array2::from_shape_vec((2, 2), vec![0.0, 1.0, 1.0, 0.0]).unwrap();
        let latent = project_latent(&[1.0, 0.0], &emap);
        assert_relative_eq!(latent[0], 0.0);
        assert_relative_eq!(latent[1], 1.0);
    }

    #[test]
    fn test_load_emap_rejects_wrong_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emap.bin");
        fs::write(&path, vec![0u8; 16]).unwrap();
        assert!(load_emap(&path).is_err());
    }

    #[test]
    fn test_load_emap_reads_little_endian() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emap.bin");
        let mut bytes = vec![0u8; EMBEDDING_DIM * EMBEDDING_DIM * 4];
        bytes[4..8].copy_from_slice(&2.5f32.to_le_bytes());
        fs::write(&path, bytes).unwrap();

        let emap = load_emap(&path).unwrap();
        assert_eq!(emap.dim(), (EMBEDDING_DIM, EMBEDDING_DIM));
        assert_relative_eq!(emap[[0, 1]], 2.5);
    }

    #[test]
    fn test_crop_region_uses_box_center() {
        let face = Face::new(BoundingBox::new(40.0, 40.0, 60.0, 60.0), 0.9);
        // side = 20 * 1.2 = 24 around (50, 50)
        assert_eq!(crop_region(&face, 200, 200), Some((38, 38, 24, 24)));
    }

    #[test]
    fn test_crop_region_prefers_landmark_center() {
        let face = Face::new(BoundingBox::new(40.0, 40.0, 60.0, 60.0), 0.9)
            .with_landmarks(FaceLandmarks::new([(70.0, 70.0); 5]));
        assert_eq!(crop_region(&face, 200, 200), Some((58, 58, 24, 24)));
    }

    #[test]
    fn test_crop_region_clamped_at_border() {
        let face = Face::new(BoundingBox::new(0.0, 0.0, 20.0, 20.0), 0.9);
        assert_eq!(crop_region(&face, 200, 200), Some((0, 0, 22, 22)));
    }

    #[test]
    fn test_tensor_conversion_preserves_pixels() {
        let mut img = RgbImage::new(4, 3);
        img.put_pixel(3, 2, image::Rgb([255, 0, 128]));
        let tensor = to_tensor(&img);
        assert_eq!(tensor.shape(), &[1, 3, 3, 4]);
        assert_relative_eq!(tensor[[0, 0, 2, 3]], 1.0);

        let back = from_tensor(tensor.view().into_dyn()).unwrap();
        assert_eq!(back.get_pixel(3, 2), &image::Rgb([255, 0, 128]));
    }

    #[test]
    fn test_from_tensor_clamps_values() {
        let tensor = Array4::<f32>::from_elem((1, 3, 1, 1), 2.0);
        let img = from_tensor(tensor.view().into_dyn()).unwrap();
        assert_eq!(img.get_pixel(0, 0), &image::Rgb([255, 255, 255]));
    }

    #[test]
    fn test_from_tensor_rejects_wrong_rank() {
        let tensor = Array2::<f32>::zeros((3, 3));
        assert!(from_tensor(tensor.view().into_dyn()).is_err());
    }
}
