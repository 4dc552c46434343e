use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use swaparoony_core::shared::upload::validate_upload;

use crate::api_error::ApiError;
use crate::app::AppState;
use crate::wire::SwapResponse;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub models_loaded: bool,
    pub destination_images_count: usize,
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Swaparoony Face Swap API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = state.service.status();
    Json(HealthResponse {
        status: "healthy",
        models_loaded: status.models_loaded,
        destination_images_count: status.destination_images_count,
    })
}

struct SwapForm {
    filename: Option<String>,
    image: Vec<u8>,
    source_face_id: i64,
    destination_face_id: i64,
}

/// `POST /api/v1/swap`: swap the uploaded face onto every destination.
pub async fn swap(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SwapResponse>, ApiError> {
    let multipart = multipart.map_err(|e| ApiError::Unprocessable(e.body_text()))?;
    let form = read_form(multipart).await?;
    validate_upload(form.filename.as_deref(), &form.image, &state.limits)?;

    let outcome = state
        .swap(form.image, form.source_face_id, form.destination_face_id)
        .await?;
    log::info!(
        "Swap request for {}: face {} onto face {}, {} results",
        form.filename.as_deref().unwrap_or("<unnamed>"),
        form.source_face_id,
        form.destination_face_id,
        outcome.swapped_images.len()
    );
    Ok(Json(SwapResponse::from_outcome(outcome)))
}

async fn read_form(mut multipart: Multipart) -> Result<SwapForm, ApiError> {
    let malformed = |e: axum::extract::multipart::MultipartError| {
        ApiError::Unprocessable(format!("Malformed form data: {}", e.body_text()))
    };

    let mut image = None;
    let mut source_face_id = 1;
    let mut destination_face_id = 1;

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        match field.name() {
            Some("image") => {
                let filename = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(malformed)?;
                image = Some((filename, bytes.to_vec()));
            }
            Some("source_face_id") => {
                let text = field.text().await.map_err(malformed)?;
                source_face_id = parse_face_id("source_face_id", &text)?;
            }
            Some("destination_face_id") => {
                let text = field.text().await.map_err(malformed)?;
                destination_face_id = parse_face_id("destination_face_id", &text)?;
            }
            _ => {}
        }
    }

    let (filename, image) =
        image.ok_or_else(|| ApiError::Unprocessable("Missing required field: image".into()))?;
    Ok(SwapForm {
        filename,
        image,
        source_face_id,
        destination_face_id,
    })
}

fn parse_face_id(field: &str, value: &str) -> Result<i64, ApiError> {
    let id: i64 = value.trim().parse().map_err(|_| {
        ApiError::Unprocessable(format!("{field} must be an integer, got {value:?}"))
    })?;
    if id < 1 {
        return Err(ApiError::Unprocessable(format!(
            "{field} must be greater than or equal to 1, got {id}"
        )));
    }
    Ok(id)
}
