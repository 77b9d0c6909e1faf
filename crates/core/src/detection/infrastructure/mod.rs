pub mod class_names;
pub mod detector_factory;
pub mod letterbox;
pub mod math;
pub mod onnx_yolo_backend;
pub mod output_decoder;
