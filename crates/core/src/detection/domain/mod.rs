pub mod detection_error;
pub mod detector_adapter;
pub mod inference_backend;
pub mod object_detector;
