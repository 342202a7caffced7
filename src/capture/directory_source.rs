use super::FrameSource;
use crate::config::CaptureRegion;
use crate::error::AppError;
use crate::pipeline::types::Frame;
use chrono::Utc;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::debug;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Replays image files from a directory in file-name order. Running out of
/// files is reported as a capture failure.
#[derive(Debug)]
pub struct DirectoryFrameSource {
    pending: VecDeque<PathBuf>,
    region: Option<CaptureRegion>,
}

impl DirectoryFrameSource {
    pub fn open(directory: &Path) -> Result<Self, AppError> {
        let entries = std::fs::read_dir(directory)
            .map_err(|e| AppError::Capture(format!("{}: {}", directory.display(), e)))?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();
        debug!("Replaying {} frames from {}", files.len(), directory.display());
        Ok(Self {
            pending: files.into(),
            region: None,
        })
    }

    /// Crops every replayed image to `region`, clamped to the image bounds.
    pub fn with_region(mut self, region: CaptureRegion) -> Self {
        self.region = Some(region);
        self
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl FrameSource for DirectoryFrameSource {
    fn grab(&mut self) -> Result<Frame, AppError> {
        let path = self
            .pending
            .pop_front()
            .ok_or_else(|| AppError::Capture("no frames left to replay".to_string()))?;
        let image = image::open(&path)
            .map_err(|e| AppError::Capture(format!("{}: {}", path.display(), e)))?
            .to_rgb8();
        let image = match self.region {
            Some(region) => {
                let left = region.left.max(0) as u32;
                let top = region.top.max(0) as u32;
                if left >= image.width() || top >= image.height() {
                    return Err(AppError::Capture(format!(
                        "capture region lies outside the replayed frame {}",
                        path.display()
                    )));
                }
                let width = region.width.min(image.width().saturating_sub(left));
                let height = region.height.min(image.height().saturating_sub(top));
                image::imageops::crop_imm(&image, left, top, width, height).to_image()
            }
            None => image,
        };
        Ok(Frame::new(image, Utc::now()))
    }
}
