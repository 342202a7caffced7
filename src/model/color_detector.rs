use super::Detector;
use crate::config::{ColorDetectorSettings, ColorRange};
use crate::error::AppError;
use crate::pipeline::types::{BoundingBox, Detection, Frame};
use image::{Rgb, RgbImage};
use indexmap::IndexMap;
use tracing::debug;

/// Labels connected regions of configured colours.
///
/// Each class is an RGB box; matching pixels are grouped into 4-connected
/// blobs. A blob's confidence is its fill ratio inside its bounding box, so
/// solid sprites score high and scattered noise scores low.
#[derive(Debug, Clone)]
pub struct ColorBlobDetector {
    classes: IndexMap<String, ColorRange>,
    min_area: u32,
}

impl ColorBlobDetector {
    pub fn new(settings: &ColorDetectorSettings) -> Self {
        Self {
            classes: settings.classes.clone(),
            min_area: settings.min_area.max(1),
        }
    }

    fn matches(range: &ColorRange, px: &Rgb<u8>) -> bool {
        (0..3).all(|c| px[c] >= range.min[c] && px[c] <= range.max[c])
    }

    fn find_blobs(&self, image: &RgbImage, label: &str, range: &ColorRange) -> Vec<Detection> {
        let (width, height) = image.dimensions();
        let mut visited = vec![false; (width * height) as usize];
        let mut blobs = Vec::new();
        let mut stack = Vec::new();

        for y in 0..height {
            for x in 0..width {
                let index = (y * width + x) as usize;
                if visited[index] || !Self::matches(range, image.get_pixel(x, y)) {
                    continue;
                }

                visited[index] = true;
                stack.push((x, y));
                let (mut min_x, mut min_y, mut max_x, mut max_y) = (x, y, x, y);
                let mut count = 0u32;

                while let Some((cx, cy)) = stack.pop() {
                    count += 1;
                    min_x = min_x.min(cx);
                    min_y = min_y.min(cy);
                    max_x = max_x.max(cx);
                    max_y = max_y.max(cy);

                    let neighbours = [
                        (cx.wrapping_sub(1), cy),
                        (cx + 1, cy),
                        (cx, cy.wrapping_sub(1)),
                        (cx, cy + 1),
                    ];
                    for (nx, ny) in neighbours {
                        if nx >= width || ny >= height {
                            continue;
                        }
                        let n_index = (ny * width + nx) as usize;
                        if !visited[n_index] && Self::matches(range, image.get_pixel(nx, ny)) {
                            visited[n_index] = true;
                            stack.push((nx, ny));
                        }
                    }
                }

                if count < self.min_area {
                    continue;
                }
                let box_area = (max_x - min_x + 1) * (max_y - min_y + 1);
                blobs.push(Detection {
                    label: label.to_string(),
                    confidence: count as f32 / box_area as f32,
                    bbox: BoundingBox::new(
                        min_x as f32,
                        min_y as f32,
                        (max_x + 1) as f32,
                        (max_y + 1) as f32,
                    ),
                });
            }
        }
        blobs
    }
}

impl Detector for ColorBlobDetector {
    fn detect(&mut self, frame: &Frame, confidence_threshold: f32) -> Result<Vec<Detection>, AppError> {
        let mut detections = Vec::new();
        for (label, range) in &self.classes {
            detections.extend(
                self.find_blobs(frame.image(), label, range)
                    .into_iter()
                    .filter(|d| d.confidence >= confidence_threshold),
            );
        }
        debug!("Color detector found {} objects", detections.len());
        Ok(detections)
    }
}
