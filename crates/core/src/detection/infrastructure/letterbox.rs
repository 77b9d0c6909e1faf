//! Aspect-preserving resize into the model's input tensor.

use image::imageops::FilterType;

use crate::detection::domain::detection_error::DetectionError;
use crate::shared::frame::Frame;

/// Gray fill used for padding (YOLO convention).
const PAD_VALUE: f32 = 114.0 / 255.0;

/// Maps between letterboxed model-input coordinates and original pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LetterboxGeometry {
    pub scale: f32,
    pub pad_x: u32,
    pub pad_y: u32,
}

impl LetterboxGeometry {
    pub fn to_original(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.pad_x as f32) / self.scale,
            (y - self.pad_y as f32) / self.scale,
        )
    }
}

/// Letterbox-resize a frame to `target_w` × `target_h`.
///
/// Returns an NCHW float32 tensor with values in `[0, 1]` and the geometry
/// needed to map predictions back.
pub fn letterbox(
    frame: &Frame,
    target_w: u32,
    target_h: u32,
) -> Result<(ndarray::Array4<f32>, LetterboxGeometry), DetectionError> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(DetectionError::InvalidFrame("image has zero size".into()));
    }
    let rgb = frame.to_rgb_image().ok_or_else(|| {
        DetectionError::InvalidFrame(format!(
            "expected 3 channels, got {}",
            frame.channels()
        ))
    })?;

    let fw = frame.width() as f32;
    let fh = frame.height() as f32;
    let scale = (target_w as f32 / fw).min(target_h as f32 / fh);
    let new_w = ((fw * scale).round() as u32).clamp(1, target_w);
    let new_h = ((fh * scale).round() as u32).clamp(1, target_h);
    let pad_x = (target_w - new_w) / 2;
    let pad_y = (target_h - new_h) / 2;

    let resized = image::imageops::resize(&rgb, new_w, new_h, FilterType::Triangle);

    let mut tensor = ndarray::Array4::<f32>::from_elem(
        (1, 3, target_h as usize, target_w as usize),
        PAD_VALUE,
    );
    for (x, y, pixel) in resized.enumerate_pixels() {
        let ty = (pad_y + y) as usize;
        let tx = (pad_x + x) as usize;
        for c in 0..3 {
            tensor[[0, c, ty, tx]] = pixel.0[c] as f32 / 255.0;
        }
    }

    Ok((
        tensor,
        LetterboxGeometry {
            scale,
            pad_x,
            pad_y,
        },
    ))
}
