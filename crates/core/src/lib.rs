//! Object detection over pretrained YOLO models exported to ONNX.
//!
//! The [`detection::domain::detector_adapter::DetectorAdapter`] is the entry
//! point: it wraps an inference backend and translates its results into plain
//! [`shared::detection::Detection`] records.

pub mod detection;
pub mod imaging;
pub mod pipeline;
pub mod rendering;
pub mod shared;
