//! Box geometry and suppression shared by the output decoders.

use crate::detection::domain::inference_backend::RawBox;

/// IoU between two bounding boxes represented as `[x1, y1, x2, y2]`.
pub fn bbox_iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }

    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

/// Greedy per-class NMS: sort by confidence descending, then drop any box
/// whose IoU with an already-kept box of the same class exceeds `iou_thresh`.
///
/// At most `max_det` boxes are returned, highest confidence first.
pub fn class_aware_nms(mut boxes: Vec<RawBox>, iou_thresh: f32, max_det: usize) -> Vec<RawBox> {
    boxes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<RawBox> = Vec::new();
    for candidate in boxes {
        if keep.len() == max_det {
            break;
        }
        let suppressed = keep.iter().any(|k| {
            k.class_id == candidate.class_id && bbox_iou(&k.xyxy, &candidate.xyxy) > iou_thresh
        });
        if !suppressed {
            keep.push(candidate);
        }
    }
    keep
}
