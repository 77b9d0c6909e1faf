use super::color::Rgb;

pub const DEFAULT_WEIGHTS_PATH: &str = "weights/best.onnx";

/// Default minimum score for a detection to be reported.
pub const DEFAULT_CONFIDENCE: f32 = 0.4;

/// Default IoU above which overlapping boxes of the same class are suppressed.
pub const DEFAULT_IOU: f32 = 0.6;

pub const DEFAULT_COLOR: Rgb = Rgb(0, 122, 255);

/// Fallback model input resolution when neither the input shape nor the
/// metadata specify one.
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// Upper bound on boxes returned per image after suppression.
pub const MAX_DETECTIONS: usize = 300;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
