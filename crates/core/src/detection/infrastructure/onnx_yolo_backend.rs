//! YOLO inference backend using ONNX Runtime via `ort`.
//!
//! Handles letterbox preprocessing, inference and output decoding, and reads
//! the class-name table that Ultralytics exports store in the model metadata.
use std::path::Path;
use std::sync::Arc;

use crate::detection::domain::detection_error::DetectionError;
use crate::detection::domain::inference_backend::{
    ClassNames, InferenceBackend, InferenceResult, Thresholds,
};
use crate::shared::constants::DEFAULT_INPUT_SIZE;
use crate::shared::frame::Frame;

use super::class_names::{parse_class_names, parse_imgsz};
use super::letterbox::letterbox;
use super::output_decoder::decode;

const NAMES_METADATA_KEY: &str = "names";
const IMGSZ_METADATA_KEY: &str = "imgsz";

/// Object detector backed by an ONNX Runtime session.
pub struct OnnxYoloBackend {
    session: ort::session::Session,
    input_width: u32,
    input_height: u32,
    names: Option<Arc<ClassNames>>,
}

impl OnnxYoloBackend {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting
    /// NCHW), then from the `imgsz` metadata entry, and falls back to 640.
    /// Runtime logging is limited to errors.
    pub fn load(weights_path: &Path) -> Result<Self, DetectionError> {
        if !weights_path.is_file() {
            return Err(model_load_error(weights_path, "weights file not found"));
        }

        let session = ort::session::Session::builder()
            .map_err(|e| model_load_error(weights_path, e))?
            .with_log_level(ort::logging::LogLevel::Error)
            .map_err(|e| model_load_error(weights_path, e))?
            .commit_from_file(weights_path)
            .map_err(|e| model_load_error(weights_path, e))?;

        let (input_height, input_width) = input_size_from_shape(&session)
            .or_else(|| read_metadata(&session, IMGSZ_METADATA_KEY).and_then(|s| parse_imgsz(&s)))
            .unwrap_or((DEFAULT_INPUT_SIZE, DEFAULT_INPUT_SIZE));

        let names = read_metadata(&session, NAMES_METADATA_KEY)
            .and_then(|raw| parse_class_names(&raw))
            .map(Arc::new);
        if names.is_none() {
            log::warn!(
                "{} has no class names; labels will be class indices",
                weights_path.display()
            );
        }

        log::info!(
            "Loaded {} (input {}x{}, {} classes)",
            weights_path.display(),
            input_width,
            input_height,
            names.as_ref().map_or(0, |n| n.len())
        );

        Ok(Self {
            session,
            input_width,
            input_height,
            names,
        })
    }
}

impl InferenceBackend for OnnxYoloBackend {
    fn infer(
        &mut self,
        frame: &Frame,
        thresholds: &Thresholds,
    ) -> Result<Vec<InferenceResult>, DetectionError> {
        let (input_tensor, geometry) = letterbox(frame, self.input_width, self.input_height)?;

        let input_value =
            ort::value::Tensor::from_array(input_tensor).map_err(DetectionError::runtime)?;
        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(DetectionError::runtime)?;
        if outputs.len() == 0 {
            return Err(DetectionError::UnexpectedOutput(
                "model produced no outputs".into(),
            ));
        }
        let tensor = outputs[0]
            .try_extract_array::<f32>()
            .map_err(DetectionError::runtime)?;
        let shape = tensor.shape().to_vec();
        let data = tensor.as_slice().ok_or_else(|| {
            DetectionError::UnexpectedOutput("output tensor is not contiguous".into())
        })?;

        let num_classes = self
            .names
            .as_ref()
            .and_then(|names| names.last_key_value().map(|(id, _)| id + 1));
        let boxes = decode(
            data,
            &shape,
            num_classes,
            &geometry,
            (frame.width(), frame.height()),
            thresholds,
        )?;

        Ok(vec![InferenceResult {
            boxes,
            names: self.names.clone(),
        }])
    }
}

/// `(height, width)` from a static NCHW input shape.
fn input_size_from_shape(session: &ort::session::Session) -> Option<(u32, u32)> {
    session.inputs().first().and_then(|input| {
        if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
            if shape.len() >= 4 && shape[2] > 0 && shape[3] > 0 {
                Some((shape[2] as u32, shape[3] as u32))
            } else {
                None
            }
        } else {
            None
        }
    })
}

fn read_metadata(session: &ort::session::Session, key: &str) -> Option<String> {
    session.metadata().ok()?.custom(key)
}

fn model_load_error(path: &Path, reason: impl std::fmt::Display) -> DetectionError {
    DetectionError::ModelLoad {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
