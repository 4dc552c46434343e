//! KServe V1 inference protocol over JSON.
//!
//! `POST /v1/models/{name}:predict` takes
//! `{"instances": [{"image_b64": ..., "source_face_id": 1, "destination_face_id": 1}]}`
//! and answers with one swap response per instance.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use swaparoony_core::shared::error::FaceSwapError;
use swaparoony_core::shared::upload::validate_upload;

use crate::api_error::ApiError;
use crate::app::AppState;
use crate::wire::SwapResponse;

const PREDICT_SUFFIX: &str = ":predict";

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub instances: Vec<PredictInstance>,
}

#[derive(Debug, Deserialize)]
pub struct PredictInstance {
    pub image_b64: String,
    #[serde(default = "first_face")]
    pub source_face_id: i64,
    #[serde(default = "first_face")]
    pub destination_face_id: i64,
}

fn first_face() -> i64 {
    1
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predictions: Vec<SwapResponse>,
    pub model_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelList {
    pub models: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelReady {
    pub name: String,
    pub ready: bool,
}

pub async fn list_models(State(state): State<AppState>) -> Json<ModelList> {
    Json(ModelList {
        models: vec![state.model_name.to_string()],
    })
}

pub async fn model_ready(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ModelReady>, ApiError> {
    check_model_name(&state, &name)?;
    Ok(Json(ModelReady {
        name,
        ready: state.service.status().models_loaded,
    }))
}

pub async fn predict(
    State(state): State<AppState>,
    Path(target): Path<String>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let name = target
        .strip_suffix(PREDICT_SUFFIX)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown endpoint: {target}")))?;
    check_model_name(&state, name)?;
    if !state.service.status().models_loaded {
        return Err(ApiError::Unavailable(format!("Model {name} is not ready")));
    }

    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if request.instances.is_empty() {
        return Err(ApiError::BadRequest("instances must not be empty".into()));
    }
    let decoded = request
        .instances
        .iter()
        .enumerate()
        .map(|(i, instance)| {
            STANDARD
                .decode(instance.image_b64.trim())
                .map_err(|e| {
                    ApiError::BadRequest(format!("instance {i}: invalid base64 image: {e}"))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut predictions = Vec::with_capacity(decoded.len());
    for (instance, bytes) in request.instances.iter().zip(decoded) {
        let result = match validate_upload(None, &bytes, &state.limits) {
            Ok(()) => {
                state
                    .swap(bytes, instance.source_face_id, instance.destination_face_id)
                    .await
            }
            Err(e) => Err(ApiError::Service(e)),
        };
        let prediction = match result {
            Ok(outcome) => SwapResponse::from_outcome(outcome),
            Err(ApiError::Service(e)) if !matches!(e, FaceSwapError::Model(_)) => {
                SwapResponse::failure(&e)
            }
            Err(other) => return Err(other),
        };
        predictions.push(prediction);
    }
    log::info!(
        "Predict on {name}: {} instances, {} succeeded",
        predictions.len(),
        predictions.iter().filter(|p| p.success).count()
    );

    Ok(Json(PredictResponse {
        predictions,
        model_name: name.to_string(),
    }))
}

fn check_model_name(state: &AppState, name: &str) -> Result<(), ApiError> {
    if name != &*state.model_name {
        return Err(ApiError::NotFound(format!("Model {name} not found")));
    }
    Ok(())
}
