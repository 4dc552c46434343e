pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

/// Not downloadable; must be supplied locally.
pub const SWAPPER_MODEL_NAME: &str = "inswapper_128.onnx";

pub const DEFAULT_MAX_FILE_SIZE: usize = 2 * 1024 * 1024;

pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp"];

/// JPEG quality for swapped images returned to clients.
pub const OUTPUT_JPEG_QUALITY: u8 = 90;
