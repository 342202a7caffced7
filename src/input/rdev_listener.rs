//! Desktop keyboard backend built on rdev.
//!
//! On macOS the process needs the Input Monitoring and Accessibility
//! permissions, otherwise `rdev::listen` fails straight away.

use super::key_monitor::{KeyEventSink, KeyEventSource, KeyId, KeyTransition};
use crate::error::AppError;
use rdev::{EventType, Key};

const KEY_NAMES: &[(Key, &str)] = &[
    (Key::KeyA, "a"),
    (Key::KeyB, "b"),
    (Key::KeyC, "c"),
    (Key::KeyD, "d"),
    (Key::KeyE, "e"),
    (Key::KeyF, "f"),
    (Key::KeyG, "g"),
    (Key::KeyH, "h"),
    (Key::KeyI, "i"),
    (Key::KeyJ, "j"),
    (Key::KeyK, "k"),
    (Key::KeyL, "l"),
    (Key::KeyM, "m"),
    (Key::KeyN, "n"),
    (Key::KeyO, "o"),
    (Key::KeyP, "p"),
    (Key::KeyQ, "q"),
    (Key::KeyR, "r"),
    (Key::KeyS, "s"),
    (Key::KeyT, "t"),
    (Key::KeyU, "u"),
    (Key::KeyV, "v"),
    (Key::KeyW, "w"),
    (Key::KeyX, "x"),
    (Key::KeyY, "y"),
    (Key::KeyZ, "z"),
    (Key::Num0, "0"),
    (Key::Num1, "1"),
    (Key::Num2, "2"),
    (Key::Num3, "3"),
    (Key::Num4, "4"),
    (Key::Num5, "5"),
    (Key::Num6, "6"),
    (Key::Num7, "7"),
    (Key::Num8, "8"),
    (Key::Num9, "9"),
    (Key::Space, "space"),
    (Key::Escape, "escape"),
    (Key::Return, "enter"),
    (Key::Tab, "tab"),
    (Key::UpArrow, "up"),
    (Key::DownArrow, "down"),
    (Key::LeftArrow, "left"),
    (Key::RightArrow, "right"),
    (Key::ShiftLeft, "shift"),
    (Key::ControlLeft, "ctrl"),
];

pub fn key_id(key: Key) -> Result<KeyId, AppError> {
    KEY_NAMES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, name)| KeyId::new(name))
        .ok_or_else(|| AppError::UnknownKey(format!("{:?}", key)))
}

pub fn rdev_key(id: &KeyId) -> Result<Key, AppError> {
    KEY_NAMES
        .iter()
        .find(|(_, name)| *name == id.as_str())
        .map(|(key, _)| *key)
        .ok_or_else(|| AppError::UnknownKey(id.to_string()))
}

#[derive(Debug, Default)]
pub struct RdevKeySource;

impl KeyEventSource for RdevKeySource {
    fn listen(self: Box<Self>, sink: KeyEventSink) -> Result<(), AppError> {
        rdev::listen(move |event| match event.event_type {
            EventType::KeyPress(key) => sink.record(KeyTransition::Press, key_id(key)),
            EventType::KeyRelease(key) => sink.record(KeyTransition::Release, key_id(key)),
            _ => {}
        })
        .map_err(|e| AppError::InputListener(format!("{:?}", e)))
    }
}
