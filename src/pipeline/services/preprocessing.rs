use crate::pipeline::types::Frame;
use image::imageops::{self, FilterType};

/// BT.601 luma weights, the ones the encoder was trained with.
const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Resizes to the encoder's resolution, converts to grayscale and scales to
/// `[0, 1]`. Output is row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preprocessor {
    width: u32,
    height: u32,
}

impl Preprocessor {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn output_len(&self) -> usize {
        (self.width * self.height) as usize
    }

    pub fn apply(&self, frame: &Frame) -> Vec<f32> {
        let resized = imageops::resize(frame.image(), self.width, self.height, FilterType::Triangle);
        resized.pixels().map(|px| luma(px.0) / 255.0).collect()
    }
}

/// 8-bit luma, rounded like the training pipeline's uint8 conversion.
fn luma(rgb: [u8; 3]) -> f32 {
    let y: f32 = rgb
        .iter()
        .zip(LUMA_WEIGHTS)
        .map(|(channel, weight)| *channel as f32 * weight)
        .sum();
    y.round().min(255.0)
}
