pub mod directory_source;
#[cfg(feature = "desktop")]
pub mod screen_source;

use crate::error::AppError;
use crate::pipeline::types::Frame;

pub use directory_source::DirectoryFrameSource;
#[cfg(feature = "desktop")]
pub use screen_source::ScreenFrameSource;

/// Pulls the freshest frame on demand. Implementations never queue frames.
pub trait FrameSource {
    fn grab(&mut self) -> Result<Frame, AppError>;
}
