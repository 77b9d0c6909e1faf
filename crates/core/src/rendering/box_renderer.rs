use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::shared::detection::Detection;
use crate::shared::frame::Frame;

pub const DEFAULT_THICKNESS: u32 = 2;

/// Draws detection outlines in each detection's display color.
pub struct BoxRenderer {
    thickness: u32,
}

impl BoxRenderer {
    pub fn new(thickness: u32) -> Self {
        Self {
            thickness: thickness.max(1),
        }
    }

    /// Outlines every detection on `frame`, drawing `thickness` nested rings
    /// inward from the box edge. Boxes are clamped to the frame; inverted
    /// boxes and boxes with no area after clamping are skipped.
    pub fn render(
        &self,
        frame: &mut Frame,
        detections: &[Detection],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut img = frame
            .to_rgb_image()
            .ok_or("Box rendering requires an RGB frame")?;
        if img.width() == 0 || img.height() == 0 {
            return Ok(());
        }
        let max_x = img.width() as i32 - 1;
        let max_y = img.height() as i32 - 1;

        for det in detections.iter().filter(|d| d.bbox.is_ordered()) {
            let color = image::Rgb(det.color.to_array());
            let x1 = det.bbox.x1.clamp(0, max_x);
            let y1 = det.bbox.y1.clamp(0, max_y);
            let x2 = det.bbox.x2.clamp(0, max_x);
            let y2 = det.bbox.y2.clamp(0, max_y);

            for t in 0..self.thickness as i32 {
                let (left, top, right, bottom) = (x1 + t, y1 + t, x2 - t, y2 - t);
                if right <= left || bottom <= top {
                    break;
                }
                let rect = Rect::at(left, top)
                    .of_size((right - left + 1) as u32, (bottom - top + 1) as u32);
                draw_hollow_rect_mut(&mut img, rect, color);
            }
        }

        *frame = Frame::from_rgb_image(img);
        Ok(())
    }
}

impl Default for BoxRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_THICKNESS)
    }
}
