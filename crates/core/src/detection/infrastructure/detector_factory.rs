use crate::detection::domain::detector_adapter::DetectorAdapter;
use crate::detection::domain::inference_backend::InferenceBackend;
use crate::shared::detector_config::DetectorConfig;

use super::onnx_yolo_backend::OnnxYoloBackend;

/// Creates a detector for the configured weights.
///
/// Never fails: if the model cannot be loaded the error is logged and the
/// returned adapter is disabled.
pub fn create_detector(config: &DetectorConfig) -> DetectorAdapter {
    log::info!("Loading model from {}", config.weights_path.display());
    let loaded = OnnxYoloBackend::load(&config.weights_path)
        .map(|backend| Box::new(backend) as Box<dyn InferenceBackend>);
    DetectorAdapter::from_load_result(loaded, config.thresholds(), config.palette.clone())
}
