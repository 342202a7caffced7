use super::preprocessing::Preprocessor;
use super::sequence_window::SequenceWindow;
use crate::config::EncodingSettings;
use crate::error::AppError;
use crate::model::Encoder;
use crate::pipeline::types::{DecisionInput, Frame};
use tracing::debug;

/// Preprocess -> encode -> accumulate a window of latents.
pub struct EncodingPipeline {
    preprocessor: Preprocessor,
    encoder: Box<dyn Encoder>,
    window: SequenceWindow,
}

impl EncodingPipeline {
    pub fn new(encoder: Box<dyn Encoder>, settings: &EncodingSettings) -> Result<Self, AppError> {
        let preprocessor = Preprocessor::new(settings.width, settings.height);
        if encoder.input_len() != preprocessor.output_len() {
            return Err(AppError::ModelShape(format!(
                "encoder takes {} pixels but frames are preprocessed to {}x{}",
                encoder.input_len(),
                settings.width,
                settings.height
            )));
        }
        Ok(Self {
            preprocessor,
            encoder,
            window: SequenceWindow::new(settings.sequence_length),
        })
    }

    pub fn window(&self) -> &SequenceWindow {
        &self.window
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }

    /// `None` until the window holds a full sequence.
    pub fn process(&mut self, frame: &Frame) -> Result<Option<DecisionInput>, AppError> {
        let pixels = self.preprocessor.apply(frame);
        let latent = self.encoder.encode(&pixels)?;
        self.window.push(latent);
        if !self.window.is_full() {
            debug!(
                "Filling sequence window {}/{}",
                self.window.len(),
                self.window.capacity()
            );
            return Ok(None);
        }
        Ok(Some(DecisionInput::Sequence(self.window.to_sequence())))
    }
}
