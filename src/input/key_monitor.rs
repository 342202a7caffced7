use crate::error::AppError;
use std::collections::HashSet;
use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, RwLock};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Identifier of a physical key, lowercased (`"p"`, `"1"`, `"space"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyId(String);

impl KeyId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTransition {
    Press,
    Release,
}

/// Read side of the held-key set.
pub trait KeyState {
    fn is_pressed(&self, key: &KeyId) -> bool;
}

/// A device that reports raw key transitions.
pub trait KeyEventSource: Send + 'static {
    /// Delivers events to `sink` until the device closes. An error returned
    /// here before the startup grace period elapses is fatal.
    fn listen(self: Box<Self>, sink: KeyEventSink) -> Result<(), AppError>;
}

/// Write handle handed to the listener. Only the listener mutates the set.
#[derive(Debug, Clone)]
pub struct KeyEventSink {
    keys: Arc<RwLock<HashSet<KeyId>>>,
}

impl KeyEventSink {
    /// Applies one transition. Events whose key could not be classified are
    /// dropped; input monitoring never fails the listener.
    pub fn record(&self, transition: KeyTransition, key: Result<KeyId, AppError>) {
        let key = match key {
            Ok(key) => key,
            Err(e) => {
                trace!("Ignoring key event: {}", e);
                return;
            }
        };
        let mut keys = match self.keys.write() {
            Ok(keys) => keys,
            Err(poisoned) => poisoned.into_inner(),
        };
        match transition {
            KeyTransition::Press => {
                keys.insert(key);
            }
            KeyTransition::Release => {
                keys.remove(&key);
            }
        }
    }

    pub fn press(&self, key: &str) {
        self.record(KeyTransition::Press, Ok(KeyId::new(key)));
    }

    pub fn release(&self, key: &str) {
        self.record(KeyTransition::Release, Ok(KeyId::new(key)));
    }
}

/// Live set of currently held keys, fed by a background listener.
#[derive(Debug)]
pub struct InputMonitor {
    keys: Arc<RwLock<HashSet<KeyId>>>,
    listener: Option<JoinHandle<()>>,
}

impl InputMonitor {
    /// Monitor without a listener thread; events arrive through the returned
    /// sink.
    pub fn with_sink() -> (Self, KeyEventSink) {
        let keys = Arc::new(RwLock::new(HashSet::new()));
        let sink = KeyEventSink { keys: keys.clone() };
        (
            Self {
                keys,
                listener: None,
            },
            sink,
        )
    }

    /// Spawns the listener thread and waits up to `startup_grace` for the
    /// device to fail opening.
    pub fn start(
        source: Box<dyn KeyEventSource>,
        startup_grace: Duration,
    ) -> Result<Self, AppError> {
        let (mut monitor, sink) = Self::with_sink();
        let (status_tx, status_rx) = mpsc::channel::<Result<(), AppError>>();

        let handle = std::thread::Builder::new()
            .name("key-listener".to_string())
            .spawn(move || {
                let result = source.listen(sink);
                if let Err(e) = &result {
                    tracing::error!("Key listener stopped: {}", e);
                }
                let _ = status_tx.send(result);
            })
            .map_err(|e| AppError::InputListener(e.to_string()))?;

        match status_rx.recv_timeout(startup_grace) {
            Ok(Err(e)) => return Err(AppError::InputListener(e.to_string())),
            Ok(Ok(())) => debug!("Key listener finished during startup"),
            Err(RecvTimeoutError::Timeout) => info!("Key listener running"),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(AppError::InputListener(
                    "listener thread exited without reporting".to_string(),
                ));
            }
        }

        monitor.listener = Some(handle);
        Ok(monitor)
    }

    /// Copy of the currently held keys.
    pub fn snapshot(&self) -> HashSet<KeyId> {
        match self.keys.read() {
            Ok(keys) => keys.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }
}

impl KeyState for InputMonitor {
    fn is_pressed(&self, key: &KeyId) -> bool {
        match self.keys.read() {
            Ok(keys) => keys.contains(key),
            Err(poisoned) => poisoned.into_inner().contains(key),
        }
    }
}
