use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::detection::domain::object_detector::ObjectDetector;
use crate::imaging::domain::image_reader::ImageReader;
use crate::imaging::domain::image_writer::ImageWriter;
use crate::rendering::box_renderer::BoxRenderer;
use crate::shared::detection::Detection;

/// Detections found in one image, ready for serialization.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectionReport {
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    pub detections: Vec<Detection>,
}

/// Single-image detection pipeline: read → detect → (render → write).
pub struct DetectImageUseCase {
    reader: Box<dyn ImageReader>,
    detector: Box<dyn ObjectDetector>,
    annotator: Option<(BoxRenderer, Box<dyn ImageWriter>)>,
}

impl DetectImageUseCase {
    pub fn new(
        reader: Box<dyn ImageReader>,
        detector: Box<dyn ObjectDetector>,
        annotator: Option<(BoxRenderer, Box<dyn ImageWriter>)>,
    ) -> Self {
        Self {
            reader,
            detector,
            annotator,
        }
    }

    /// Detects objects in `input_path`.
    ///
    /// When `annotated_path` is given and an annotator is configured, a copy
    /// of the image with detection outlines is written there.
    pub fn execute(
        &mut self,
        input_path: &Path,
        annotated_path: Option<&Path>,
    ) -> Result<DetectionReport, Box<dyn std::error::Error>> {
        let mut frame = self.reader.read(input_path)?;
        let detections = self.detector.detect(&frame)?;

        if let (Some((renderer, writer)), Some(out)) = (&self.annotator, annotated_path) {
            renderer.render(&mut frame, &detections)?;
            writer.write(out, &frame)?;
        }

        Ok(DetectionReport {
            source: input_path.to_path_buf(),
            width: frame.width(),
            height: frame.height(),
            detections,
        })
    }
}
