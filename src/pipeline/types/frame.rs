use chrono::{DateTime, Utc};
use image::{DynamicImage, RgbImage, RgbaImage};
use uuid::Uuid;

/// One captured screen region. Owned by the iteration that grabbed it.
#[derive(Debug)]
pub struct Frame {
    image: RgbImage,
    captured_at: DateTime<Utc>,
    frame_id: Uuid,
}

impl Frame {
    pub fn new(image: RgbImage, captured_at: DateTime<Utc>) -> Self {
        Self {
            image,
            captured_at,
            frame_id: Uuid::new_v4(),
        }
    }

    /// Drops the alpha channel of a raw capture.
    pub fn from_rgba(image: RgbaImage, captured_at: DateTime<Utc>) -> Self {
        Self::new(DynamicImage::ImageRgba8(image).to_rgb8(), captured_at)
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn frame_id(&self) -> Uuid {
        self.frame_id
    }
}
