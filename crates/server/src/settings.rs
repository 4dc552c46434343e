use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use swaparoony_core::detection::infrastructure::onnx_yolo_detector::DEFAULT_CONFIDENCE;
use swaparoony_core::model::infrastructure::onnx_face_model::OnnxModelConfig;
use swaparoony_core::shared::constants::{DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_FILE_SIZE};
use swaparoony_core::shared::upload::UploadLimits;

pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 6;
pub const DEFAULT_MODEL_NAME: &str = "swaparoony-face-swap";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub model_dir: Option<PathBuf>,
    pub detector_model: Option<PathBuf>,
    pub embedder_model: Option<PathBuf>,
    pub swapper_model: Option<PathBuf>,
    pub emap_path: Option<PathBuf>,
    pub confidence: f64,
    pub destination_images: Vec<PathBuf>,
    pub max_file_size: usize,
    pub allowed_extensions: Vec<String>,
    pub max_concurrent_requests: usize,
    pub host: String,
    pub port: u16,
    pub model_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_dir: None,
            detector_model: None,
            embedder_model: None,
            swapper_model: None,
            emap_path: None,
            confidence: DEFAULT_CONFIDENCE,
            destination_images: Vec::new(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            host: "0.0.0.0".to_string(),
            port: 8000,
            model_name: DEFAULT_MODEL_NAME.to_string(),
        }
    }
}

impl Settings {
    /// `settings.json` in the user config directory, used when no file is
    /// given explicitly.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("Swaparoony").join("settings.json"))
    }

    /// Reads settings from `path`. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = fs::read_to_string(path)
            .map_err(|e| format!("Cannot read settings {}: {e}", path.display()))?;
        let settings = serde_json::from_str(&json)
            .map_err(|e| format!("Invalid settings {}: {e}", path.display()))?;
        Ok(settings)
    }

    /// Explicit file if given, else the default path if it exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path().filter(|p| p.exists()) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!(
                "Confidence must be between 0.0 and 1.0, got {}",
                self.confidence
            )
            .into());
        }
        if self.max_concurrent_requests == 0 {
            return Err("max_concurrent_requests must be at least 1".into());
        }
        if self.max_file_size == 0 {
            return Err("max_file_size must be at least 1 byte".into());
        }
        if self.destination_images.is_empty() {
            return Err("No destination images configured".into());
        }
        if self.emap_path.is_none() {
            return Err("emap_path is required for the inswapper swap model".into());
        }
        if let Some(ext) = self.allowed_extensions.iter().find(|e| !e.starts_with('.')) {
            return Err(format!("Allowed extensions must start with '.', got {ext:?}").into());
        }
        Ok(())
    }

    pub fn model_config(&self) -> OnnxModelConfig {
        OnnxModelConfig {
            model_dir: self.model_dir.clone(),
            detector_model: self.detector_model.clone(),
            embedder_model: self.embedder_model.clone(),
            swapper_model: self.swapper_model.clone(),
            emap_path: self.emap_path.clone(),
            confidence: self.confidence,
        }
    }

    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits {
            max_file_size: self.max_file_size,
            allowed_extensions: self
                .allowed_extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
