//! In-process fixtures for route tests.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Response;
use axum::Router;
use http_body_util::BodyExt;

use swaparoony_core::detection::domain::face::{BoundingBox, Face};
use swaparoony_core::model::domain::face_model::{FaceModel, ModelLoader};
use swaparoony_core::pipeline::face_swap_service::FaceSwapService;
use swaparoony_core::shared::error::BoxError;
use swaparoony_core::shared::image::Image;

use crate::app::{router, AppState};
use crate::settings::Settings;

pub const BOUNDARY: &str = "swaparoony-test-boundary";

/// Reports one face per 10 pixel column, right to left, and returns the
/// destination unchanged on swap.
struct StripeModel;

impl FaceModel for StripeModel {
    fn detect(&self, image: &Image) -> Result<Vec<Face>, BoxError> {
        let count = image.width() / 10;
        Ok((0..count)
            .rev()
            .map(|i| {
                let left = f64::from(i * 10);
                Face::new(
                    BoundingBox::new(left, 0.0, left + 10.0, f64::from(image.height())),
                    0.9,
                )
            })
            .collect())
    }

    fn swap(&self, destination: &Image, _: &Face, _: &Face) -> Result<Image, BoxError> {
        Ok(destination.clone())
    }
}

struct StripeLoader;

impl ModelLoader for StripeLoader {
    fn load(&self) -> Result<Box<dyn FaceModel>, Box<dyn std::error::Error>> {
        Ok(Box::new(StripeModel))
    }
}

/// Slow swaps that record how many ran at the same time.
pub struct SwapGauge {
    delay: Duration,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl SwapGauge {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn loader(self: &Arc<Self>) -> Box<dyn ModelLoader> {
        Box::new(GaugedLoader(Arc::clone(self)))
    }
}

struct GaugedModel(Arc<SwapGauge>);

impl FaceModel for GaugedModel {
    fn detect(&self, image: &Image) -> Result<Vec<Face>, BoxError> {
        StripeModel.detect(image)
    }

    fn swap(&self, destination: &Image, _: &Face, _: &Face) -> Result<Image, BoxError> {
        let gauge = &self.0;
        let now = gauge.active.fetch_add(1, Ordering::SeqCst) + 1;
        gauge.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(gauge.delay);
        gauge.active.fetch_sub(1, Ordering::SeqCst);
        Ok(destination.clone())
    }
}

struct GaugedLoader(Arc<SwapGauge>);

impl ModelLoader for GaugedLoader {
    fn load(&self) -> Result<Box<dyn FaceModel>, Box<dyn std::error::Error>> {
        Ok(Box::new(GaugedModel(Arc::clone(&self.0))))
    }
}

/// PNG with `width / 10` faces as far as [`StripeModel`] is concerned.
pub fn png(width: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image::RgbImage::from_pixel(width, 4, image::Rgb([120, 90, 60]))
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

pub struct TestApp {
    _dir: tempfile::TempDir,
    pub state: AppState,
}

impl TestApp {
    pub fn settings() -> Settings {
        Settings {
            destination_images: vec![PathBuf::from("unused.png")],
            ..Default::default()
        }
    }

    /// Destinations are 20 pixels wide, so each holds two faces.
    pub fn initialized(names: &[&str]) -> Self {
        Self::with_settings(names, Self::settings(), true)
    }

    pub fn uninitialized(names: &[&str]) -> Self {
        Self::with_settings(names, Self::settings(), false)
    }

    pub fn with_settings(names: &[&str], settings: Settings, initialize: bool) -> Self {
        Self::build(names, settings, Box::new(StripeLoader), initialize)
    }

    /// Initialized app whose model comes from `loader`.
    pub fn with_loader(names: &[&str], settings: Settings, loader: Box<dyn ModelLoader>) -> Self {
        Self::build(names, settings, loader, true)
    }

    fn build(
        names: &[&str],
        mut settings: Settings,
        loader: Box<dyn ModelLoader>,
        initialize: bool,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        settings.destination_images = names
            .iter()
            .map(|name| {
                let path = dir.path().join(name);
                std::fs::write(&path, png(20)).unwrap();
                path
            })
            .collect();

        let service = FaceSwapService::new(loader, settings.destination_images.clone());
        if initialize {
            service.initialize().unwrap();
        }
        Self {
            _dir: dir,
            state: AppState::new(Arc::new(service), &settings),
        }
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }
}

/// `multipart/form-data` body from `(name, filename, content)` parts.
pub fn multipart(parts: &[(&str, Option<&str>, &[u8])]) -> Body {
    let mut body = Vec::new();
    for (name, filename, content) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(f) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    Body::from(body)
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
