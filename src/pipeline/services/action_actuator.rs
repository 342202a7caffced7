use crate::clock::Clock;
use crate::error::AppError;
use std::time::Duration;
use tracing::info;

/// Output device for the controlled key.
pub trait KeyPresser {
    fn press(&mut self) -> Result<(), AppError>;
    fn release(&mut self) -> Result<(), AppError>;
}

/// Presses, holds and releases the controlled key when a decision clears
/// its threshold. The hold blocks the loop.
pub struct ActionActuator {
    presser: Box<dyn KeyPresser>,
    hold: Duration,
}

impl ActionActuator {
    pub fn new(presser: Box<dyn KeyPresser>, hold: Duration) -> Self {
        Self { presser, hold }
    }

    /// Fires when `probability > threshold`; never on equality. Returns
    /// whether the key was pressed.
    pub fn maybe_act(
        &mut self,
        probability: f32,
        threshold: f32,
        clock: &dyn Clock,
    ) -> Result<bool, AppError> {
        if probability <= threshold {
            return Ok(false);
        }
        info!("ACTION: JUMP (prob {:.2})", probability);
        self.presser.press()?;
        clock.sleep(self.hold);
        self.presser.release()?;
        Ok(true)
    }
}

/// Presser that only logs, for dry runs.
#[derive(Debug, Default)]
pub struct LoggingPresser;

impl KeyPresser for LoggingPresser {
    fn press(&mut self) -> Result<(), AppError> {
        tracing::debug!("dry run: press");
        Ok(())
    }

    fn release(&mut self) -> Result<(), AppError> {
        tracing::debug!("dry run: release");
        Ok(())
    }
}

#[cfg(feature = "desktop")]
pub use desktop::RdevKeyPresser;

#[cfg(feature = "desktop")]
mod desktop {
    use super::KeyPresser;
    use crate::error::AppError;
    use crate::input::rdev_listener::rdev_key;
    use crate::input::KeyId;
    use rdev::{simulate, EventType, Key};

    pub struct RdevKeyPresser {
        key: Key,
    }

    impl RdevKeyPresser {
        pub fn new(key: &KeyId) -> Result<Self, AppError> {
            Ok(Self { key: rdev_key(key)? })
        }
    }

    impl KeyPresser for RdevKeyPresser {
        fn press(&mut self) -> Result<(), AppError> {
            simulate(&EventType::KeyPress(self.key)).map_err(|e| AppError::Actuator(format!("{:?}", e)))
        }

        fn release(&mut self) -> Result<(), AppError> {
            simulate(&EventType::KeyRelease(self.key)).map_err(|e| AppError::Actuator(format!("{:?}", e)))
        }
    }
}
