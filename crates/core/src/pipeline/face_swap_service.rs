use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::detection::domain::face::{sort_left_to_right, Face};
use crate::model::domain::face_model::{FaceModel, ModelLoader};
use crate::shared::error::FaceSwapError;
use crate::shared::image::Image;
use crate::shared::image_codec::{decode_image, encode_jpeg, load_image_file};

/// A preloaded destination image and the name reported back to clients.
#[derive(Clone, Debug)]
pub struct DestinationEntry {
    pub image: Image,
    pub name: String,
}

/// One successfully swapped destination.
#[derive(Clone, Debug, PartialEq)]
pub struct SwappedImage {
    /// JPEG-encoded result.
    pub image_data: Vec<u8>,
    pub destination_name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SwapOutcome {
    /// In destination preload order; destinations that failed are absent.
    pub swapped_images: Vec<SwappedImage>,
    pub faces_detected_in_source: usize,
}

/// Read-only view used for health reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServiceStatus {
    pub models_loaded: bool,
    pub destination_images_count: usize,
}

struct Loaded {
    model: Box<dyn FaceModel>,
    destinations: Vec<DestinationEntry>,
}

/// Face swap orchestration: validates face selections, runs the model once
/// per image and collects results across the preloaded destinations.
///
/// State is written once by [`initialize`](Self::initialize) and read
/// without locking afterwards, so one instance can serve concurrent requests.
pub struct FaceSwapService {
    loader: Box<dyn ModelLoader>,
    destination_paths: Vec<PathBuf>,
    state: OnceLock<Loaded>,
}

impl FaceSwapService {
    pub fn new(loader: Box<dyn ModelLoader>, destination_paths: Vec<PathBuf>) -> Self {
        Self {
            loader,
            destination_paths,
            state: OnceLock::new(),
        }
    }

    /// Loads the model and preloads every destination image.
    ///
    /// Missing or undecodable destinations are skipped with a warning; an
    /// empty result fails. Must succeed before any other operation.
    pub fn initialize(&self) -> Result<(), FaceSwapError> {
        if self.state.get().is_some() {
            return Err(FaceSwapError::ModelLoad("Models already initialized".into()));
        }

        let model = self
            .loader
            .load()
            .map_err(|e| FaceSwapError::ModelLoad(format!("Failed to initialize models: {e}")))?;
        let destinations = load_destinations(&self.destination_paths)?;
        log::info!(
            "Loaded {} destination images into memory",
            destinations.len()
        );

        self.state
            .set(Loaded {
                model,
                destinations,
            })
            .map_err(|_| FaceSwapError::ModelLoad("Models already initialized".into()))
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            models_loaded: self.state.get().is_some(),
            destination_images_count: self.state.get().map_or(0, |s| s.destinations.len()),
        }
    }

    pub fn destinations(&self) -> &[DestinationEntry] {
        self.state
            .get()
            .map_or(&[][..], |s| s.destinations.as_slice())
    }

    /// Detected faces ordered left to right by bounding box.
    pub fn get_faces(&self, image: &Image) -> Result<Vec<Face>, FaceSwapError> {
        let state = self.loaded()?;
        detect_sorted(state.model.as_ref(), image)
    }

    /// Checks that the 1-based `index` selects one of `faces`.
    ///
    /// `label` ("source", "destination") only shapes the error message.
    pub fn validate_face_index(
        faces: &[Face],
        index: i64,
        label: &str,
    ) -> Result<(), FaceSwapError> {
        if faces.is_empty() {
            return Err(FaceSwapError::NoFaceDetected(format!(
                "No faces detected in {label} image"
            )));
        }
        if index < 1 || index > faces.len() as i64 {
            return Err(FaceSwapError::InsufficientFaces(format!(
                "{label} image contains {} faces, but requested face {index}",
                faces.len()
            )));
        }
        Ok(())
    }

    /// Swaps the selected source face onto the selected destination face.
    ///
    /// The model's output image is returned as is.
    pub fn swap_face_on_image(
        &self,
        source: &Image,
        destination: &Image,
        source_face_id: i64,
        dest_face_id: i64,
    ) -> Result<Image, FaceSwapError> {
        let state = self.loaded()?;
        let model = state.model.as_ref();
        let source_faces = detect_sorted(model, source)?;
        let dest_faces = detect_sorted(model, destination)?;
        Self::validate_face_index(&source_faces, source_face_id, "source")?;
        swap_selected(model, &source_faces, source_face_id, destination, &dest_faces, dest_face_id)
    }

    /// Swaps the face in `source_bytes` onto every preloaded destination.
    ///
    /// Source problems fail the whole request before any destination is
    /// touched. A failing destination is logged and left out of the result.
    pub fn process_face_swap_request(
        &self,
        source_bytes: &[u8],
        source_face_id: i64,
        dest_face_id: i64,
    ) -> Result<SwapOutcome, FaceSwapError> {
        let state = self.loaded()?;
        let model = state.model.as_ref();

        let source = decode_image(source_bytes)?;
        let source_faces = detect_sorted(model, &source)?;
        Self::validate_face_index(&source_faces, source_face_id, "source")?;

        let mut swapped_images = Vec::with_capacity(state.destinations.len());
        for dest in &state.destinations {
            let result = detect_sorted(model, &dest.image)
                .and_then(|dest_faces| {
                    swap_selected(
                        model,
                        &source_faces,
                        source_face_id,
                        &dest.image,
                        &dest_faces,
                        dest_face_id,
                    )
                })
                .and_then(|swapped| encode_jpeg(&swapped));

            match result {
                Ok(image_data) => swapped_images.push(SwappedImage {
                    image_data,
                    destination_name: dest.name.clone(),
                }),
                Err(e) => log::warn!("Skipping destination {}: {e}", dest.name),
            }
        }

        log::info!(
            "Swapped face {source_face_id} onto {}/{} destinations ({} faces in source)",
            swapped_images.len(),
            state.destinations.len(),
            source_faces.len()
        );

        Ok(SwapOutcome {
            swapped_images,
            faces_detected_in_source: source_faces.len(),
        })
    }

    fn loaded(&self) -> Result<&Loaded, FaceSwapError> {
        self.state.get().ok_or_else(|| {
            FaceSwapError::ModelLoad("Models not initialized. Call initialize() first.".into())
        })
    }
}

fn detect_sorted(model: &dyn FaceModel, image: &Image) -> Result<Vec<Face>, FaceSwapError> {
    let mut faces = model.detect(image).map_err(FaceSwapError::Model)?;
    sort_left_to_right(&mut faces);
    Ok(faces)
}

/// Swap step shared by the single-pair and batch paths. The source
/// selection must already be validated.
fn swap_selected(
    model: &dyn FaceModel,
    source_faces: &[Face],
    source_face_id: i64,
    destination: &Image,
    dest_faces: &[Face],
    dest_face_id: i64,
) -> Result<Image, FaceSwapError> {
    FaceSwapService::validate_face_index(dest_faces, dest_face_id, "destination")?;
    let source_face = &source_faces[(source_face_id - 1) as usize];
    let dest_face = &dest_faces[(dest_face_id - 1) as usize];
    model
        .swap(destination, dest_face, source_face)
        .map_err(FaceSwapError::Model)
}

fn load_destinations(paths: &[PathBuf]) -> Result<Vec<DestinationEntry>, FaceSwapError> {
    let mut destinations = Vec::with_capacity(paths.len());

    for path in paths {
        if !path.exists() {
            log::warn!("Destination image not found: {}", path.display());
            continue;
        }
        match load_image_file(path) {
            Ok(image) => destinations.push(DestinationEntry {
                image,
                name: destination_name(path),
            }),
            Err(e) => log::warn!("Could not load image {}: {e}", path.display()),
        }
    }

    if destinations.is_empty() {
        return Err(FaceSwapError::ModelLoad(
            "No destination images could be loaded".into(),
        ));
    }
    Ok(destinations)
}

fn destination_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
