use std::collections::BTreeMap;
use std::sync::Arc;

use crate::detection::domain::detection_error::DetectionError;
use crate::shared::frame::Frame;

/// Class index to human-readable label.
pub type ClassNames = BTreeMap<usize, String>;

/// Score thresholds passed to every inference call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    /// Minimum class score for a candidate to survive.
    pub confidence: f32,
    /// Overlap above which a lower-scored box of the same class is dropped.
    pub iou: f32,
}

/// A box as reported by the backend, in original image pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct RawBox {
    pub xyxy: [f32; 4],
    pub confidence: f32,
    pub class_id: usize,
}

/// Native result of one inference call: surviving boxes plus the name table
/// the model was exported with, if any.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InferenceResult {
    pub boxes: Vec<RawBox>,
    pub names: Option<Arc<ClassNames>>,
}

/// Runs a detection model on one image.
///
/// Implementations own model loading, preprocessing, output decoding and
/// suppression; callers only see [`InferenceResult`]s.
pub trait InferenceBackend: Send {
    fn infer(
        &mut self,
        frame: &Frame,
        thresholds: &Thresholds,
    ) -> Result<Vec<InferenceResult>, DetectionError>;
}
