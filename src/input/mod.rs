pub mod key_monitor;
pub mod line_source;
#[cfg(feature = "desktop")]
pub mod rdev_listener;

pub use key_monitor::{InputMonitor, KeyEventSink, KeyEventSource, KeyId, KeyState, KeyTransition};
pub use line_source::LineKeySource;
#[cfg(feature = "desktop")]
pub use rdev_listener::RdevKeySource;
