use thiserror::Error;

/// Boxed error used at the model adapter boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Every failure the face swap service reports.
///
/// The first four variants are the request-facing taxonomy. `Model` carries
/// anything else the model adapter raised.
#[derive(Error, Debug)]
pub enum FaceSwapError {
    #[error("{0}")]
    ModelLoad(String),

    #[error("{0}")]
    InvalidImage(String),

    #[error("{0}")]
    NoFaceDetected(String),

    #[error("{0}")]
    InsufficientFaces(String),

    #[error("model error: {0}")]
    Model(#[source] BoxError),
}

impl FaceSwapError {
    /// True for problems with the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FaceSwapError::InvalidImage(_)
                | FaceSwapError::NoFaceDetected(_)
                | FaceSwapError::InsufficientFaces(_)
        )
    }

    /// Stable identifier for the variant, used in wire error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            FaceSwapError::ModelLoad(_) => "model_load",
            FaceSwapError::InvalidImage(_) => "invalid_image",
            FaceSwapError::NoFaceDetected(_) => "no_face_detected",
            FaceSwapError::InsufficientFaces(_) => "insufficient_faces",
            FaceSwapError::Model(_) => "model",
        }
    }
}
