//! JSON shapes shared by the REST and KServe endpoints.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use swaparoony_core::pipeline::face_swap_service::SwapOutcome;
use swaparoony_core::shared::error::FaceSwapError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireSwappedImage {
    /// Base64 (standard alphabet) JPEG.
    pub image_data: String,
    pub destination_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub swapped_images: Vec<WireSwappedImage>,
    #[serde(default)]
    pub faces_detected_in_source: usize,
}

impl SwapResponse {
    pub fn from_outcome(outcome: SwapOutcome) -> Self {
        let swapped_images: Vec<WireSwappedImage> = outcome
            .swapped_images
            .into_iter()
            .map(|s| WireSwappedImage {
                image_data: STANDARD.encode(&s.image_data),
                destination_name: s.destination_name,
            })
            .collect();
        Self {
            success: true,
            message: Some(format!(
                "Successfully swapped face onto {} images",
                swapped_images.len()
            )),
            error: None,
            swapped_images,
            faces_detected_in_source: outcome.faces_detected_in_source,
        }
    }

    pub fn failure(err: &FaceSwapError) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(err.to_string()),
            swapped_images: Vec::new(),
            faces_detected_in_source: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
