use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::keys::{KeyCode, KeyId};

/// A single recorded key press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeystrokeEvent {
    pub at: Instant,
    pub code: KeyCode,
}

/// Write-only analytics trail for one session. Aggregates are maintained
/// incrementally as events arrive; nothing is ever removed.
#[derive(Clone, Debug, Default)]
pub struct KeystrokeRecorder {
    keystrokes: Vec<KeystrokeEvent>,
    key_frequency: HashMap<KeyId, u64>,
    backspaces: u64,
    word_times: Vec<Duration>,
    mistakes_by_char: HashMap<char, u64>,
}

impl KeystrokeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_keystroke(&mut self, at: Instant, code: KeyCode) {
        self.keystrokes.push(KeystrokeEvent { at, code });
        *self.key_frequency.entry(KeyId::from(code)).or_insert(0) += 1;
    }

    pub fn record_backspace(&mut self) {
        self.backspaces += 1;
    }

    pub fn record_word_time(&mut self, duration: Duration) {
        self.word_times.push(duration);
    }

    /// Counts a target character that was not typed correctly.
    pub fn record_mistake(&mut self, expected: char) {
        *self.mistakes_by_char.entry(expected).or_insert(0) += 1;
    }

    pub fn keystrokes(&self) -> &[KeystrokeEvent] {
        &self.keystrokes
    }

    pub fn key_frequency(&self) -> &HashMap<KeyId, u64> {
        &self.key_frequency
    }

    pub fn frequency_of(&self, key: KeyId) -> u64 {
        self.key_frequency.get(&key).copied().unwrap_or(0)
    }

    pub fn backspaces(&self) -> u64 {
        self.backspaces
    }

    pub fn word_times(&self) -> &[Duration] {
        &self.word_times
    }

    /// Word timings in seconds, the unit consistency is computed in.
    pub fn word_times_secs(&self) -> Vec<f64> {
        self.word_times.iter().map(Duration::as_secs_f64).collect()
    }

    pub fn mistakes_by_char(&self) -> &HashMap<char, u64> {
        &self.mistakes_by_char
    }
}
