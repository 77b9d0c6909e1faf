//! Adapter from an inference backend to plain [`Detection`] records.
//!
//! The adapter is built once from the outcome of loading a model. A failed
//! load leaves it permanently disabled: `detect` then returns no detections
//! instead of an error, so a missing model never stops the caller.
use std::fmt::Display;

use crate::detection::domain::detection_error::DetectionError;
use crate::detection::domain::inference_backend::{
    InferenceBackend, InferenceResult, Thresholds,
};
use crate::detection::domain::object_detector::ObjectDetector;
use crate::shared::color::ColorPalette;
use crate::shared::detection::{BoundingBox, Detection};
use crate::shared::frame::Frame;

/// Externally visible lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectorStatus {
    Ready,
    Disabled,
}

enum ModelState {
    Ready(Box<dyn InferenceBackend>),
    Disabled,
}

pub struct DetectorAdapter {
    state: ModelState,
    thresholds: Thresholds,
    palette: ColorPalette,
}

impl DetectorAdapter {
    pub fn new(
        backend: Box<dyn InferenceBackend>,
        thresholds: Thresholds,
        palette: ColorPalette,
    ) -> Self {
        Self {
            state: ModelState::Ready(backend),
            thresholds,
            palette,
        }
    }

    pub fn disabled(thresholds: Thresholds, palette: ColorPalette) -> Self {
        Self {
            state: ModelState::Disabled,
            thresholds,
            palette,
        }
    }

    /// Builds a ready adapter on success; logs the error and builds a
    /// disabled one otherwise.
    pub fn from_load_result<E: Display>(
        loaded: Result<Box<dyn InferenceBackend>, E>,
        thresholds: Thresholds,
        palette: ColorPalette,
    ) -> Self {
        match loaded {
            Ok(backend) => Self::new(backend, thresholds, palette),
            Err(e) => {
                log::error!("Error loading model: {e}");
                Self::disabled(thresholds, palette)
            }
        }
    }

    pub fn status(&self) -> DetectorStatus {
        match self.state {
            ModelState::Ready(_) => DetectorStatus::Ready,
            ModelState::Disabled => DetectorStatus::Disabled,
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn palette(&self) -> &ColorPalette {
        &self.palette
    }
}

impl ObjectDetector for DetectorAdapter {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectionError> {
        let backend = match &mut self.state {
            ModelState::Ready(backend) => backend,
            ModelState::Disabled => return Ok(Vec::new()),
        };

        let results = backend.infer(frame, &self.thresholds)?;
        let detections = translate(&results, &self.palette);
        log::debug!(
            "Detected {} objects in {}x{} image",
            detections.len(),
            frame.width(),
            frame.height()
        );
        Ok(detections)
    }
}

/// Flattens backend results into detections, preserving report order.
fn translate(results: &[InferenceResult], palette: &ColorPalette) -> Vec<Detection> {
    let mut detections = Vec::new();
    for result in results {
        for raw in &result.boxes {
            let label = resolve_label(result, raw.class_id);
            let color = palette.color_for(&label);
            detections.push(Detection {
                bbox: BoundingBox::from_xyxy(raw.xyxy),
                confidence: raw.confidence,
                label,
                color,
            });
        }
    }
    detections
}

/// Name from the result's table, or the stringified index when the table is
/// missing, empty, or lacks the index.
fn resolve_label(result: &InferenceResult, class_id: usize) -> String {
    result
        .names
        .as_deref()
        .and_then(|names| names.get(&class_id))
        .cloned()
        .unwrap_or_else(|| class_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::inference_backend::{ClassNames, RawBox};
    use crate::shared::color::Rgb;
    use crate::shared::constants::DEFAULT_COLOR;
    use approx::assert_relative_eq;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    /// Replays fixed candidates, applying the confidence threshold like a
    /// real backend would.
    struct StubBackend {
        boxes: Vec<RawBox>,
        names: Option<Arc<ClassNames>>,
        seen_thresholds: Arc<Mutex<Vec<Thresholds>>>,
    }

    impl StubBackend {
        fn new(boxes: Vec<RawBox>, names: Option<ClassNames>) -> Self {
            Self {
                boxes,
                names: names.map(Arc::new),
                seen_thresholds: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl InferenceBackend for StubBackend {
        fn infer(
            &mut self,
            _frame: &Frame,
            thresholds: &Thresholds,
        ) -> Result<Vec<InferenceResult>, DetectionError> {
            self.seen_thresholds.lock().unwrap().push(*thresholds);
            Ok(vec![InferenceResult {
                boxes: self
                    .boxes
                    .iter()
                    .filter(|b| b.confidence >= thresholds.confidence)
                    .cloned()
                    .collect(),
                names: self.names.clone(),
            }])
        }
    }

    struct FailingBackend;

    impl InferenceBackend for FailingBackend {
        fn infer(
            &mut self,
            _frame: &Frame,
            _thresholds: &Thresholds,
        ) -> Result<Vec<InferenceResult>, DetectionError> {
            Err(DetectionError::UnexpectedOutput("no outputs".into()))
        }
    }

    // --- Helpers ---

    fn frame() -> Frame {
        Frame::new(vec![0u8; 64 * 48 * 3], 64, 48, 3)
    }

    fn thresholds(confidence: f32) -> Thresholds {
        Thresholds {
            confidence,
            iou: 0.6,
        }
    }

    fn raw(xyxy: [f32; 4], confidence: f32, class_id: usize) -> RawBox {
        RawBox {
            xyxy,
            confidence,
            class_id,
        }
    }

    fn names(entries: &[(usize, &str)]) -> ClassNames {
        entries.iter().map(|&(i, n)| (i, n.to_string())).collect()
    }

    fn adapter(backend: StubBackend, confidence: f32) -> DetectorAdapter {
        DetectorAdapter::new(
            Box::new(backend),
            thresholds(confidence),
            ColorPalette::default(),
        )
    }

    // --- Lifecycle ---

    #[test]
    fn test_disabled_adapter_returns_empty() {
        let mut detector = DetectorAdapter::disabled(thresholds(0.4), ColorPalette::default());
        assert_eq!(detector.status(), DetectorStatus::Disabled);
        assert!(detector.detect(&frame()).unwrap().is_empty());
        assert!(detector.detect(&frame()).unwrap().is_empty());
    }

    #[test]
    fn test_failed_load_produces_disabled_adapter() {
        let loaded: Result<Box<dyn InferenceBackend>, DetectionError> =
            Err(DetectionError::ModelLoad {
                path: "weights/missing.onnx".into(),
                reason: "file not found".into(),
            });
        let mut detector =
            DetectorAdapter::from_load_result(loaded, thresholds(0.4), ColorPalette::default());

        assert_eq!(detector.status(), DetectorStatus::Disabled);
        assert!(detector.detect(&frame()).unwrap().is_empty());
    }

    #[test]
    fn test_successful_load_produces_ready_adapter() {
        let backend: Box<dyn InferenceBackend> = Box::new(StubBackend::new(vec![], None));
        let detector = DetectorAdapter::from_load_result(
            Ok::<_, DetectionError>(backend),
            thresholds(0.4),
            ColorPalette::default(),
        );
        assert_eq!(detector.status(), DetectorStatus::Ready);
    }

    // --- Translation ---

    #[test]
    fn test_single_person_detection() {
        let backend = StubBackend::new(
            vec![raw([10.0, 20.0, 110.0, 220.0], 0.9, 0)],
            Some(names(&[(0, "person")])),
        );
        let mut detector = adapter(backend, 0.4);

        let dets = detector.detect(&frame()).unwrap();

        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].label, "person");
        assert_eq!(dets[0].color, DEFAULT_COLOR);
        assert_eq!(dets[0].bbox, BoundingBox::new(10, 20, 110, 220));
        assert_relative_eq!(dets[0].confidence, 0.9);
    }

    #[test]
    fn test_coordinates_are_truncated() {
        let backend = StubBackend::new(vec![raw([1.99, 2.5, 30.7, 40.01], 0.8, 0)], None);
        let mut detector = adapter(backend, 0.4);

        let dets = detector.detect(&frame()).unwrap();

        assert_eq!(dets[0].bbox, BoundingBox::new(1, 2, 30, 40));
    }

    #[test]
    fn test_label_falls_back_to_index_without_names() {
        let backend = StubBackend::new(vec![raw([0.0, 0.0, 5.0, 5.0], 0.8, 3)], None);
        let mut detector = adapter(backend, 0.4);

        assert_eq!(detector.detect(&frame()).unwrap()[0].label, "3");
    }

    #[test]
    fn test_label_falls_back_to_index_with_empty_names() {
        let backend =
            StubBackend::new(vec![raw([0.0, 0.0, 5.0, 5.0], 0.8, 2)], Some(ClassNames::new()));
        let mut detector = adapter(backend, 0.4);

        assert_eq!(detector.detect(&frame()).unwrap()[0].label, "2");
    }

    #[test]
    fn test_label_falls_back_to_index_when_missing_from_names() {
        let backend = StubBackend::new(
            vec![raw([0.0, 0.0, 5.0, 5.0], 0.8, 7)],
            Some(names(&[(0, "person")])),
        );
        let mut detector = adapter(backend, 0.4);

        assert_eq!(detector.detect(&frame()).unwrap()[0].label, "7");
    }

    #[test]
    fn test_palette_maps_labels_to_colors() {
        let backend = StubBackend::new(
            vec![
                raw([0.0, 0.0, 5.0, 5.0], 0.9, 0),
                raw([10.0, 10.0, 15.0, 15.0], 0.8, 1),
            ],
            Some(names(&[(0, "person"), (1, "car")])),
        );
        let palette = ColorPalette::default().with_label("car", Rgb(255, 0, 0));
        let mut detector = DetectorAdapter::new(Box::new(backend), thresholds(0.4), palette);

        let dets = detector.detect(&frame()).unwrap();

        assert_eq!(dets[0].color, DEFAULT_COLOR);
        assert_eq!(dets[1].color, Rgb(255, 0, 0));
    }

    #[test]
    fn test_order_follows_backend() {
        let backend = StubBackend::new(
            vec![
                raw([0.0, 0.0, 5.0, 5.0], 0.5, 0),
                raw([10.0, 10.0, 15.0, 15.0], 0.9, 0),
                raw([20.0, 20.0, 25.0, 25.0], 0.7, 0),
            ],
            None,
        );
        let mut detector = adapter(backend, 0.1);

        let confs: Vec<f32> = detector
            .detect(&frame())
            .unwrap()
            .iter()
            .map(|d| d.confidence)
            .collect();

        assert_eq!(confs, vec![0.5, 0.9, 0.7]);
    }

    #[test]
    fn test_multiple_results_are_concatenated() {
        let results = vec![
            InferenceResult {
                boxes: vec![raw([0.0, 0.0, 1.0, 1.0], 0.9, 0)],
                names: None,
            },
            InferenceResult {
                boxes: vec![raw([2.0, 2.0, 3.0, 3.0], 0.8, 1)],
                names: Some(Arc::new(names(&[(1, "dog")]))),
            },
        ];

        let dets = translate(&results, &ColorPalette::default());

        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].label, "0");
        assert_eq!(dets[1].label, "dog");
    }

    // --- Properties ---

    #[test]
    fn test_detect_is_deterministic() {
        let backend = StubBackend::new(
            vec![
                raw([0.0, 0.0, 5.0, 5.0], 0.9, 0),
                raw([10.0, 10.0, 20.0, 30.0], 0.6, 1),
            ],
            Some(names(&[(0, "person"), (1, "car")])),
        );
        let mut detector = adapter(backend, 0.4);

        let first = detector.detect(&frame()).unwrap();
        let second = detector.detect(&frame()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_detections_satisfy_invariants() {
        let backend = StubBackend::new(
            vec![
                raw([0.0, 0.0, 0.5, 0.5], 1.0, 0),
                raw([3.2, 4.8, 63.9, 47.9], 0.41, 0),
            ],
            None,
        );
        let mut detector = adapter(backend, 0.4);

        for det in detector.detect(&frame()).unwrap() {
            assert!((0.0..=1.0).contains(&det.confidence));
            assert!(det.bbox.is_ordered());
        }
    }

    #[test]
    fn test_raising_confidence_never_adds_detections() {
        let boxes = vec![
            raw([0.0, 0.0, 5.0, 5.0], 0.95, 0),
            raw([10.0, 10.0, 15.0, 15.0], 0.55, 0),
            raw([20.0, 20.0, 25.0, 25.0], 0.35, 0),
        ];
        let mut previous = usize::MAX;
        for confidence in [0.1, 0.3, 0.5, 0.7, 0.9, 0.99] {
            let mut detector = adapter(StubBackend::new(boxes.clone(), None), confidence);
            let count = detector.detect(&frame()).unwrap().len();
            assert!(count <= previous);
            previous = count;
        }
    }

    #[test]
    fn test_configured_thresholds_reach_backend() {
        let backend = StubBackend::new(vec![], None);
        let seen = backend.seen_thresholds.clone();
        let mut detector = DetectorAdapter::new(
            Box::new(backend),
            Thresholds {
                confidence: 0.25,
                iou: 0.45,
            },
            ColorPalette::default(),
        );

        detector.detect(&frame()).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_relative_eq!(seen[0].confidence, 0.25);
        assert_relative_eq!(seen[0].iou, 0.45);
    }

    #[test]
    fn test_backend_errors_propagate() {
        let mut detector = DetectorAdapter::new(
            Box::new(FailingBackend),
            thresholds(0.4),
            ColorPalette::default(),
        );
        assert!(matches!(
            detector.detect(&frame()),
            Err(DetectionError::UnexpectedOutput(_))
        ));
    }
}
