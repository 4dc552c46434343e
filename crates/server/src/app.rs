use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tokio::sync::Semaphore;
use tower_http::cors::CorsLayer;

use swaparoony_core::pipeline::face_swap_service::{FaceSwapService, SwapOutcome};
use swaparoony_core::shared::upload::UploadLimits;

use crate::api_error::ApiError;
use crate::settings::Settings;
use crate::{kserve, rest};

/// Room for multipart framing and base64 inflation on top of the file itself.
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

/// Shared by every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<FaceSwapService>,
    pub limits: Arc<UploadLimits>,
    pub model_name: Arc<str>,
    permits: Arc<Semaphore>,
}

impl AppState {
    pub fn new(service: Arc<FaceSwapService>, settings: &Settings) -> Self {
        Self {
            service,
            limits: Arc::new(settings.upload_limits()),
            model_name: Arc::from(settings.model_name.as_str()),
            permits: Arc::new(Semaphore::new(settings.max_concurrent_requests)),
        }
    }

    /// Runs one swap request on the blocking pool once a permit is free.
    ///
    /// The permit moves into the blocking task, so work abandoned by its
    /// caller still counts against the limit until it finishes.
    pub async fn swap(
        &self,
        source_bytes: Vec<u8>,
        source_face_id: i64,
        destination_face_id: i64,
    ) -> Result<SwapOutcome, ApiError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| ApiError::Unavailable("Server is shutting down".into()))?;
        let service = Arc::clone(&self.service);
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            service.process_face_swap_request(&source_bytes, source_face_id, destination_face_id)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Swap task failed: {e}")))?
        .map_err(ApiError::from)
    }

    /// Refuses new swaps; requests still waiting for a permit get 503.
    pub fn close(&self) {
        self.permits.close();
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.limits.max_file_size * 2 + BODY_LIMIT_SLACK;
    Router::new()
        .route("/", get(rest::root))
        .route("/api/v1/swap", axum::routing::post(rest::swap))
        .route("/api/v1/health", get(rest::health))
        .route("/v1/models", get(kserve::list_models))
        .route(
            "/v1/models/:target",
            get(kserve::model_ready).post(kserve::predict),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
