//! Decoding of YOLO output tensors into boxes in original image coordinates.
//!
//! Supported layouts (batch size 1):
//! - anchor-free `[1, 4 + nc, N]` (YOLOv8/11 default export) or its row-major
//!   transpose `[1, N, 4 + nc]`, rows `[cx, cy, w, h, score_0, ..]`;
//! - objectness `[1, N, 5 + nc]` (YOLOv5 export), rows
//!   `[cx, cy, w, h, obj, score_0, ..]`, confidence is `obj * score`;
//! - end-to-end `[1, N, 6]` with `N <= 300`, rows
//!   `[x1, y1, x2, y2, score, class]`, already suppressed by the model.
//!
//! When the class count is known it decides the layout and the feature axis.
//! Without it, the shorter axis is the feature axis and a row-major output is
//! read as objectness.

use crate::detection::domain::detection_error::DetectionError;
use crate::detection::domain::inference_backend::{RawBox, Thresholds};
use crate::shared::constants::MAX_DETECTIONS;

use super::letterbox::LetterboxGeometry;
use super::math::class_aware_nms;

/// Where per-class scores start in a candidate row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreLayout {
    /// `[cx, cy, w, h, score_0, ..]`
    ClassScores,
    /// `[cx, cy, w, h, obj, score_0, ..]`
    Objectness,
}

impl ScoreLayout {
    fn first_class(self) -> usize {
        match self {
            ScoreLayout::ClassScores => 4,
            ScoreLayout::Objectness => 5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputLayout {
    Candidates {
        num_dets: usize,
        num_feats: usize,
        transposed: bool,
        scores: ScoreLayout,
    },
    EndToEnd {
        num_dets: usize,
    },
}

impl OutputLayout {
    /// Infers the layout of a `[1, a, b]` output.
    ///
    /// `num_classes` comes from the model's name table when it has one.
    pub fn from_shape(shape: &[usize], num_classes: Option<usize>) -> Result<Self, DetectionError> {
        if shape.len() != 3 || shape[0] != 1 {
            return Err(DetectionError::UnexpectedOutput(format!(
                "expected shape [1, a, b], got {shape:?}"
            )));
        }
        let (a, b) = (shape[1], shape[2]);
        let end_to_end = b == 6 && a <= MAX_DETECTIONS;
        let candidates = |num_dets, num_feats, transposed, scores| OutputLayout::Candidates {
            num_dets,
            num_feats,
            transposed,
            scores,
        };

        let layout = match num_classes {
            Some(nc) if a == 4 + nc => candidates(b, a, true, ScoreLayout::ClassScores),
            Some(_) if end_to_end => OutputLayout::EndToEnd { num_dets: a },
            Some(nc) if b == 5 + nc => candidates(a, b, false, ScoreLayout::Objectness),
            Some(nc) if b == 4 + nc => candidates(a, b, false, ScoreLayout::ClassScores),
            Some(nc) => {
                return Err(DetectionError::UnexpectedOutput(format!(
                    "shape {shape:?} does not fit a model with {nc} classes"
                )))
            }
            None if a <= b => candidates(b, a, true, ScoreLayout::ClassScores),
            None if end_to_end => OutputLayout::EndToEnd { num_dets: a },
            None => candidates(a, b, false, ScoreLayout::Objectness),
        };

        if let OutputLayout::Candidates {
            num_feats, scores, ..
        } = layout
        {
            if num_feats <= scores.first_class() {
                return Err(DetectionError::UnexpectedOutput(format!(
                    "need more than {} features per detection, got {num_feats}",
                    scores.first_class()
                )));
            }
        }
        Ok(layout)
    }

    fn len(&self) -> usize {
        match *self {
            OutputLayout::Candidates {
                num_dets,
                num_feats,
                ..
            } => num_dets * num_feats,
            OutputLayout::EndToEnd { num_dets } => num_dets * 6,
        }
    }
}

/// Decode a raw output tensor.
///
/// Candidates scoring at or below `thresholds.confidence` are dropped, boxes
/// are mapped out of the letterbox and clipped to `image_size` (width,
/// height), and candidate outputs go through class-aware NMS. The result is
/// sorted by confidence, highest first.
pub fn decode(
    data: &[f32],
    shape: &[usize],
    num_classes: Option<usize>,
    geometry: &LetterboxGeometry,
    image_size: (u32, u32),
    thresholds: &Thresholds,
) -> Result<Vec<RawBox>, DetectionError> {
    let layout = OutputLayout::from_shape(shape, num_classes)?;
    if data.len() != layout.len() {
        return Err(DetectionError::UnexpectedOutput(format!(
            "tensor has {} values, shape {shape:?} needs {}",
            data.len(),
            layout.len()
        )));
    }

    let clip = |xyxy: [f32; 4]| -> [f32; 4] {
        let (x1, y1) = geometry.to_original(xyxy[0], xyxy[1]);
        let (x2, y2) = geometry.to_original(xyxy[2], xyxy[3]);
        let (w, h) = (image_size.0 as f32, image_size.1 as f32);
        [
            x1.clamp(0.0, w),
            y1.clamp(0.0, h),
            x2.clamp(0.0, w),
            y2.clamp(0.0, h),
        ]
    };

    match layout {
        OutputLayout::Candidates {
            num_dets,
            num_feats,
            transposed,
            scores,
        } => {
            let value = |det: usize, feat: usize| {
                if transposed {
                    data[feat * num_dets + det]
                } else {
                    data[det * num_feats + feat]
                }
            };
            let first = scores.first_class();

            let mut candidates = Vec::new();
            for i in 0..num_dets {
                let (class_id, class_score) = (first..num_feats)
                    .map(|f| (f - first, value(i, f)))
                    .fold((0, f32::NEG_INFINITY), |best, cur| {
                        if cur.1 > best.1 {
                            cur
                        } else {
                            best
                        }
                    });
                let score = match scores {
                    ScoreLayout::ClassScores => class_score,
                    ScoreLayout::Objectness => value(i, 4) * class_score,
                };
                if score.is_nan() || score <= thresholds.confidence {
                    continue;
                }
                let (cx, cy, w, h) = (value(i, 0), value(i, 1), value(i, 2), value(i, 3));
                candidates.push(RawBox {
                    xyxy: clip([cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0]),
                    confidence: score,
                    class_id,
                });
            }
            Ok(class_aware_nms(candidates, thresholds.iou, MAX_DETECTIONS))
        }
        OutputLayout::EndToEnd { num_dets } => {
            let mut boxes: Vec<RawBox> = data
                .chunks_exact(6)
                .take(num_dets)
                .filter(|row| row[4] > thresholds.confidence)
                .map(|row| RawBox {
                    xyxy: clip([row[0], row[1], row[2], row[3]]),
                    confidence: row[4],
                    class_id: row[5].max(0.0) as usize,
                })
                .collect();
            boxes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
            boxes.truncate(MAX_DETECTIONS);
            Ok(boxes)
        }
    }
}
