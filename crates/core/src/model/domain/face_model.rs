use crate::detection::domain::face::Face;
use crate::shared::error::BoxError;
use crate::shared::image::Image;

/// Domain interface for the face detection and swap model.
///
/// Treated as a black box by the orchestrator. Implementations are shared
/// across concurrent requests, hence `&self` and `Sync`.
pub trait FaceModel: Send + Sync {
    /// Detect faces in `image`. Order of the result is unspecified.
    fn detect(&self, image: &Image) -> Result<Vec<Face>, BoxError>;

    /// Replace `dest_face` in `destination` with the identity of `source_face`.
    fn swap(&self, destination: &Image, dest_face: &Face, source_face: &Face)
        -> Result<Image, BoxError>;
}

/// Builds a [`FaceModel`] during service initialization.
///
/// Separate from the model itself so construction failures surface through
/// `initialize()` rather than at process wiring time.
pub trait ModelLoader: Send + Sync {
    fn load(&self) -> Result<Box<dyn FaceModel>, Box<dyn std::error::Error>>;
}
