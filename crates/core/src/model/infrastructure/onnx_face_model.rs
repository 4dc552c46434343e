use std::path::PathBuf;

use crate::detection::domain::face::Face;
use crate::detection::infrastructure::arcface_embedder::ArcFaceEmbedder;
use crate::detection::infrastructure::model_resolver::{self, ModelSource};
use crate::detection::infrastructure::onnx_yolo_detector::{OnnxYoloDetector, DEFAULT_CONFIDENCE};
use crate::model::domain::face_model::{FaceModel, ModelLoader};
use crate::shared::constants::{
    EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL, SWAPPER_MODEL_NAME, YOLO_MODEL_NAME, YOLO_MODEL_URL,
};
use crate::shared::error::BoxError;
use crate::shared::image::Image;
use crate::swapping::infrastructure::inswapper_swapper::InswapperSwapper;

/// Where the ONNX model files live and how the detector is tuned.
#[derive(Clone, Debug)]
pub struct OnnxModelConfig {
    /// Directory searched for model files after the user cache.
    pub model_dir: Option<PathBuf>,
    pub detector_model: Option<PathBuf>,
    pub embedder_model: Option<PathBuf>,
    pub swapper_model: Option<PathBuf>,
    /// Raw `f32` 512×512 latent projection for the swapper. Required.
    pub emap_path: Option<PathBuf>,
    pub confidence: f64,
}

impl Default for OnnxModelConfig {
    fn default() -> Self {
        Self {
            model_dir: None,
            detector_model: None,
            embedder_model: None,
            swapper_model: None,
            emap_path: None,
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

/// [`FaceModel`] backed by three ONNX sessions: YOLO-face detection,
/// ArcFace identity embedding, and inswapper face replacement.
pub struct OnnxFaceModel {
    detector: OnnxYoloDetector,
    embedder: ArcFaceEmbedder,
    swapper: InswapperSwapper,
}

impl OnnxFaceModel {
    pub fn new(
        detector: OnnxYoloDetector,
        embedder: ArcFaceEmbedder,
        swapper: InswapperSwapper,
    ) -> Self {
        Self {
            detector,
            embedder,
            swapper,
        }
    }
}

impl FaceModel for OnnxFaceModel {
    fn detect(&self, image: &Image) -> Result<Vec<Face>, BoxError> {
        let faces = self.detector.detect(image)?;
        if faces.is_empty() {
            return Ok(faces);
        }
        let rgb = image.to_rgb();
        faces
            .into_iter()
            .map(|face| {
                let embedding = self.embedder.embed(&rgb, &face.bbox)?;
                Ok(face.with_embedding(embedding))
            })
            .collect()
    }

    fn swap(
        &self,
        destination: &Image,
        dest_face: &Face,
        source_face: &Face,
    ) -> Result<Image, BoxError> {
        let swapped = self
            .swapper
            .swap(&destination.to_rgb(), dest_face, source_face)?;
        Ok(Image::from_rgb(swapped))
    }
}

/// Resolves model files and opens the ONNX sessions on `load()`.
pub struct OnnxModelLoader {
    config: OnnxModelConfig,
}

impl OnnxModelLoader {
    pub fn new(config: OnnxModelConfig) -> Self {
        Self { config }
    }
}

impl ModelLoader for OnnxModelLoader {
    fn load(&self) -> Result<Box<dyn FaceModel>, Box<dyn std::error::Error>> {
        let config = &self.config;
        let emap_path = config
            .emap_path
            .as_deref()
            .ok_or("emap_path is required for the inswapper swap model")?;
        let bundled_dir = config.model_dir.as_deref();

        let detector_path = model_resolver::resolve(&ModelSource {
            name: YOLO_MODEL_NAME,
            explicit: config.detector_model.as_deref(),
            bundled_dir,
            url: Some(YOLO_MODEL_URL),
        })?;
        let embedder_path = model_resolver::resolve(&ModelSource {
            name: EMBEDDING_MODEL_NAME,
            explicit: config.embedder_model.as_deref(),
            bundled_dir,
            url: Some(EMBEDDING_MODEL_URL),
        })?;
        let swapper_path = model_resolver::resolve(&ModelSource {
            name: SWAPPER_MODEL_NAME,
            explicit: config.swapper_model.as_deref(),
            bundled_dir,
            url: None,
        })?;

        let model = OnnxFaceModel::new(
            OnnxYoloDetector::new(&detector_path, config.confidence)?,
            ArcFaceEmbedder::new(&embedder_path)?,
            InswapperSwapper::new(&swapper_path, emap_path)?,
        );
        log::info!(
            "Face model ready (detector {}, embedder {}, swapper {})",
            detector_path.display(),
            embedder_path.display(),
            swapper_path.display()
        );
        Ok(Box::new(model))
    }
}
