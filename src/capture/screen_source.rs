use super::FrameSource;
use crate::config::CaptureRegion;
use crate::error::AppError;
use crate::pipeline::types::Frame;
use chrono::Utc;
use xcap::Monitor;

/// Grabs a fixed region of the primary monitor on every call.
pub struct ScreenFrameSource {
    monitor: Monitor,
    region: CaptureRegion,
}

impl ScreenFrameSource {
    pub fn open(region: CaptureRegion) -> Result<Self, AppError> {
        let monitors = Monitor::all().map_err(|e| AppError::Capture(e.to_string()))?;
        let monitor = monitors
            .into_iter()
            .find(|m| m.is_primary())
            .ok_or_else(|| AppError::Capture("no primary monitor found".to_string()))?;
        tracing::info!(
            "Capturing {}x{} at ({}, {}) from monitor '{}'",
            region.width,
            region.height,
            region.left,
            region.top,
            monitor.name()
        );
        Ok(Self { monitor, region })
    }
}

impl FrameSource for ScreenFrameSource {
    fn grab(&mut self) -> Result<Frame, AppError> {
        let screenshot = self
            .monitor
            .capture_image()
            .map_err(|e| AppError::Capture(e.to_string()))?;
        let left = (self.region.left - self.monitor.x()).max(0) as u32;
        let top = (self.region.top - self.monitor.y()).max(0) as u32;
        if left >= screenshot.width() || top >= screenshot.height() {
            return Err(AppError::Capture(
                "capture region lies outside the monitor".to_string(),
            ));
        }
        let width = self.region.width.min(screenshot.width() - left);
        let height = self.region.height.min(screenshot.height() - top);
        let cropped = image::imageops::crop_imm(&screenshot, left, top, width, height).to_image();
        Ok(Frame::from_rgba(cropped, Utc::now()))
    }
}
