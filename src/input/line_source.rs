use super::key_monitor::{KeyEventSink, KeyEventSource, KeyId, KeyTransition};
use crate::error::AppError;
use std::io::BufRead;
use std::time::Duration;

/// Reads whitespace-separated key names, one chord per line, and holds each
/// chord for `hold` before releasing it. Drives replay runs on machines
/// without a keyboard hook.
pub struct LineKeySource<R> {
    reader: R,
    hold: Duration,
}

impl<R: BufRead + Send + 'static> LineKeySource<R> {
    pub fn new(reader: R, hold: Duration) -> Self {
        Self { reader, hold }
    }
}

impl LineKeySource<std::io::BufReader<std::io::Stdin>> {
    pub fn stdin(hold: Duration) -> Self {
        Self::new(std::io::BufReader::new(std::io::stdin()), hold)
    }
}

impl<R: BufRead + Send + 'static> KeyEventSource for LineKeySource<R> {
    fn listen(self: Box<Self>, sink: KeyEventSink) -> Result<(), AppError> {
        let LineKeySource { reader, hold } = *self;
        for line in reader.lines() {
            let line = line.map_err(|e| AppError::InputListener(e.to_string()))?;
            let chord: Vec<KeyId> = line.split_whitespace().map(KeyId::new).collect();
            if chord.is_empty() {
                continue;
            }
            for key in &chord {
                sink.record(KeyTransition::Press, Ok(key.clone()));
            }
            std::thread::sleep(hold);
            for key in chord {
                sink.record(KeyTransition::Release, Ok(key));
            }
        }
        Ok(())
    }
}
