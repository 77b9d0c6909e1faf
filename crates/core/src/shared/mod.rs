pub mod color;
pub mod constants;
pub mod detection;
pub mod detector_config;
pub mod frame;
