use crate::detection::domain::detection_error::DetectionError;
use crate::shared::detection::Detection;
use crate::shared::frame::Frame;

/// Domain interface for object detection on a single image.
///
/// Running an inference session mutates runtime state, hence `&mut self`.
pub trait ObjectDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectionError>;
}
