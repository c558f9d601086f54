use std::time::{Duration, Instant};

use crate::error::SessionError;
use crate::keys::{KeyClass, KeyCode};
use crate::recorder::KeystrokeRecorder;
use crate::runtime::{Clock, SystemClock};
use crate::stats::{compare_word, TypingStats};
use crate::word_source::WordSourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub time_limit: Duration,
    pub word_source: WordSourceKind,
}

impl SessionConfig {
    pub fn new(time_limit_secs: u64, word_source: WordSourceKind) -> Self {
        Self {
            time_limit: Duration::from_secs(time_limit_secs),
            word_source,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(60, WordSourceKind::Common)
    }
}

/// Why a session stopped accepting keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum CompletionReason {
    Escape,
    WordsExhausted,
    TimeUp,
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Completed(CompletionReason),
}

/// One timed typing attempt. Constructed running; once completed it ignores
/// all further input. A restart builds a new session.
#[derive(Debug)]
pub struct TypingSession<C: Clock = SystemClock> {
    config: SessionConfig,
    words: Vec<String>,
    current_word_index: usize,
    current_input: String,
    started_at: Instant,
    word_started_at: Instant,
    elapsed: Duration,
    state: SessionState,
    stats: TypingStats,
    recorder: KeystrokeRecorder,
    clock: C,
}

impl TypingSession<SystemClock> {
    pub fn start_now(config: SessionConfig, words: Vec<String>) -> Result<Self, SessionError> {
        Self::start(config, words, SystemClock)
    }
}

impl<C: Clock> TypingSession<C> {
    /// Starts the timer and returns a running session.
    pub fn start(config: SessionConfig, words: Vec<String>, clock: C) -> Result<Self, SessionError> {
        if words.is_empty() {
            return Err(SessionError::EmptyWordList);
        }

        let started_at = clock.now();
        tracing::debug!(
            "session started: {} words from {}, limit {}s",
            words.len(),
            config.word_source,
            config.time_limit.as_secs()
        );

        Ok(Self {
            config,
            words,
            current_word_index: 0,
            current_input: String::new(),
            started_at,
            word_started_at: started_at,
            elapsed: Duration::ZERO,
            state: SessionState::Running,
            stats: TypingStats::new(),
            recorder: KeystrokeRecorder::new(),
            clock,
        })
    }

    /// Applies one key press. Ignored once the session is completed.
    pub fn process_key(&mut self, code: KeyCode) -> Result<(), SessionError> {
        if self.is_completed() {
            return Ok(());
        }

        let now = self.clock.now();
        self.recorder.record_keystroke(now, code);

        match code.class() {
            KeyClass::Escape => self.complete(CompletionReason::Escape, now),
            KeyClass::Backspace => {
                if self.current_input.pop().is_some() {
                    self.recorder.record_backspace();
                }
            }
            KeyClass::Space => self.submit_word(now)?,
            KeyClass::Printable(c) => self.current_input.push(c),
            KeyClass::Other => {}
        }

        Ok(())
    }

    fn submit_word(&mut self, now: Instant) -> Result<(), SessionError> {
        let target = self
            .words
            .get(self.current_word_index)
            .ok_or(SessionError::WordIndexOutOfRange {
                index: self.current_word_index,
                len: self.words.len(),
            })?;

        self.recorder
            .record_word_time(now.saturating_duration_since(self.word_started_at));
        self.word_started_at = now;

        let comparison = compare_word(&self.current_input, target);
        for expected in comparison.missed {
            self.recorder.record_mistake(expected);
        }
        self.stats
            .update_character_stats(comparison.tally.correct, comparison.tally.incorrect);

        self.current_word_index += 1;
        self.current_input.clear();

        if self.current_word_index >= self.words.len() {
            self.complete(CompletionReason::WordsExhausted, now);
        }

        Ok(())
    }

    /// Recomputes live statistics and enforces the time limit.
    pub fn tick(&mut self) {
        if self.is_completed() {
            return;
        }

        let now = self.clock.now();
        if now.saturating_duration_since(self.started_at) >= self.config.time_limit {
            self.complete(CompletionReason::TimeUp, now);
        } else {
            self.refresh_stats_at(now);
        }
    }

    /// Forced completion from an external interrupt.
    pub fn interrupt(&mut self) {
        if !self.is_completed() {
            let now = self.clock.now();
            self.complete(CompletionReason::Interrupted, now);
        }
    }

    fn complete(&mut self, reason: CompletionReason, now: Instant) {
        self.refresh_stats_at(now);
        self.state = SessionState::Completed(reason);
        tracing::info!(
            "session completed ({reason}) after {:.2}s at {:.1} wpm",
            self.elapsed.as_secs_f64(),
            self.stats.wpm
        );
    }

    fn refresh_stats_at(&mut self, now: Instant) {
        self.elapsed = now.saturating_duration_since(self.started_at);
        self.stats.calculate_wpm(self.elapsed.as_secs_f64());
        self.stats.update_consistency(&self.recorder.word_times_secs());
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, SessionState::Completed(_))
    }

    pub fn completion_reason(&self) -> Option<CompletionReason> {
        match self.state {
            SessionState::Completed(reason) => Some(reason),
            SessionState::Running => None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn time_limit(&self) -> Duration {
        self.config.time_limit
    }

    pub fn word_source(&self) -> WordSourceKind {
        self.config.word_source
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn current_word_index(&self) -> usize {
        self.current_word_index
    }

    pub fn current_word(&self) -> Option<&str> {
        self.words.get(self.current_word_index).map(String::as_str)
    }

    pub fn current_input(&self) -> &str {
        &self.current_input
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Elapsed time as of the last tick, key-driven completion or interrupt.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn remaining(&self) -> Duration {
        self.config.time_limit.saturating_sub(self.elapsed)
    }

    /// Fraction of the time limit used, in `[0, 1]`.
    pub fn time_progress(&self) -> f64 {
        let limit = self.config.time_limit.as_secs_f64();
        if limit <= 0.0 {
            return 1.0;
        }
        (self.elapsed.as_secs_f64() / limit).min(1.0)
    }

    pub fn stats(&self) -> &TypingStats {
        &self.stats
    }

    pub fn recorder(&self) -> &KeystrokeRecorder {
        &self.recorder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ManualClock;
    use approx::assert_relative_eq;
    use assert_matches::assert_matches;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    fn session(list: &[&str]) -> (TypingSession<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let s = TypingSession::start(
            SessionConfig::new(60, WordSourceKind::Common),
            words(list),
            clock.clone(),
        )
        .unwrap();
        (s, clock)
    }

    fn type_str<C: Clock>(s: &mut TypingSession<C>, text: &str) {
        for c in text.chars() {
            s.process_key(KeyCode::from_char(c)).unwrap();
        }
    }

    #[test]
    fn starts_running_and_empty() {
        let (s, _) = session(&["the", "quick"]);
        assert_eq!(s.state(), SessionState::Running);
        assert_eq!(s.current_word_index(), 0);
        assert_eq!(s.current_input(), "");
        assert_eq!(s.current_word(), Some("the"));
        assert_eq!(s.elapsed(), Duration::ZERO);
    }

    #[test]
    fn empty_word_list_is_rejected() {
        let result = TypingSession::start(SessionConfig::default(), vec![], ManualClock::new());
        assert_matches!(result, Err(SessionError::EmptyWordList));
    }

    #[test]
    fn printable_keys_fill_the_buffer() {
        let (mut s, _) = session(&["the"]);
        type_str(&mut s, "th~");
        assert_eq!(s.current_input(), "th~");
    }

    #[test]
    fn unknown_keys_are_ignored_but_recorded() {
        let (mut s, _) = session(&["the"]);
        s.process_key(KeyCode::ENTER).unwrap();
        s.process_key(KeyCode(999)).unwrap();
        s.process_key(KeyCode::LEFT).unwrap();

        assert_eq!(s.current_input(), "");
        assert_eq!(s.state(), SessionState::Running);
        assert_eq!(s.recorder().keystrokes().len(), 3);
    }

    #[test]
    fn backspace_variants_remove_last_char() {
        let (mut s, _) = session(&["hello"]);
        type_str(&mut s, "help");
        s.process_key(KeyCode::DELETE).unwrap();
        assert_eq!(s.current_input(), "hel");
        s.process_key(KeyCode::CTRL_H).unwrap();
        assert_eq!(s.current_input(), "he");
        s.process_key(KeyCode::BACKSPACE).unwrap();
        assert_eq!(s.current_input(), "h");
        assert_eq!(s.recorder().backspaces(), 3);
    }

    #[test]
    fn backspace_on_empty_buffer_is_a_no_op() {
        let (mut s, _) = session(&["hello"]);
        s.process_key(KeyCode::DELETE).unwrap();
        assert_eq!(s.current_input(), "");
        assert_eq!(s.recorder().backspaces(), 0);
        // still logged as a keystroke
        assert_eq!(s.recorder().keystrokes().len(), 1);
    }

    #[test]
    fn correct_word_scores_all_chars() {
        let (mut s, _) = session(&["the", "end"]);
        type_str(&mut s, "the ");
        assert_eq!(s.stats().correct_chars(), 3);
        assert_eq!(s.stats().incorrect_chars(), 0);
        assert_eq!(s.current_word_index(), 1);
        assert_eq!(s.current_input(), "");
    }

    #[test]
    fn transposition_scores_one_correct_two_incorrect() {
        let (mut s, _) = session(&["the", "end"]);
        type_str(&mut s, "teh ");
        assert_eq!(s.stats().correct_chars(), 1);
        assert_eq!(s.stats().incorrect_chars(), 2);
    }

    #[test]
    fn shortfall_is_charged_on_submit() {
        let (mut s, _) = session(&["hello", "end"]);
        type_str(&mut s, "hel ");
        assert_eq!(s.stats().correct_chars(), 3);
        assert_eq!(s.stats().incorrect_chars(), 2);
        assert_eq!(s.recorder().mistakes_by_char().get(&'l'), Some(&1));
        assert_eq!(s.recorder().mistakes_by_char().get(&'o'), Some(&1));
    }

    #[test]
    fn overflow_is_charged_on_submit_strict_policy() {
        let (mut s, _) = session(&["hi", "end"]);
        type_str(&mut s, "hippo ");
        assert_eq!(s.stats().correct_chars(), 2);
        assert_eq!(s.stats().incorrect_chars(), 3);
    }

    #[test]
    fn space_on_empty_buffer_submits_whole_word_as_missed() {
        let (mut s, _) = session(&["abc", "d"]);
        s.process_key(KeyCode::SPACE).unwrap();
        assert_eq!(s.stats().incorrect_chars(), 3);
        assert_eq!(s.current_word_index(), 1);
    }

    #[test]
    fn escape_completes_without_touching_tallies() {
        let (mut s, _) = session(&["the", "end"]);
        type_str(&mut s, "the ");
        type_str(&mut s, "en");
        let before = s.stats().tally();

        s.process_key(KeyCode::ESCAPE).unwrap();

        assert!(s.is_completed());
        assert_eq!(s.completion_reason(), Some(CompletionReason::Escape));
        assert_eq!(s.stats().tally(), before);
    }

    #[test]
    fn escape_with_empty_buffer_completes() {
        let (mut s, _) = session(&["the"]);
        s.process_key(KeyCode::ESCAPE).unwrap();
        assert!(s.is_completed());
        assert_eq!(s.stats().tally().total(), 0);
    }

    #[test]
    fn keys_after_completion_are_ignored() {
        let (mut s, _) = session(&["the"]);
        s.process_key(KeyCode::ESCAPE).unwrap();
        let logged = s.recorder().keystrokes().len();

        type_str(&mut s, "the ");

        assert_eq!(s.current_input(), "");
        assert_eq!(s.current_word_index(), 0);
        assert_eq!(s.recorder().keystrokes().len(), logged);
    }

    #[test]
    fn last_word_completes_the_session() {
        let (mut s, _) = session(&["a", "b"]);
        type_str(&mut s, "a b ");
        assert_eq!(s.completion_reason(), Some(CompletionReason::WordsExhausted));
        assert_eq!(s.current_word_index(), 2);
        assert_eq!(s.current_word(), None);
    }

    #[test]
    fn word_index_is_monotonic_and_bounded() {
        let (mut s, _) = session(&["a", "b", "c"]);
        let mut last = 0;
        for c in "a xx b  c d e ".chars() {
            s.process_key(KeyCode::from_char(c)).unwrap();
            assert!(s.current_word_index() >= last);
            assert!(s.current_word_index() <= s.words().len());
            last = s.current_word_index();
        }
        assert!(s.is_completed());
    }

    #[test]
    fn time_limit_completes_on_tick() {
        let (mut s, clock) = session(&["the"]);
        clock.advance(Duration::from_millis(59_900));
        s.tick();
        assert!(!s.is_completed());

        clock.advance(Duration::from_millis(100));
        s.tick();
        assert_eq!(s.completion_reason(), Some(CompletionReason::TimeUp));
        assert!(s.elapsed() >= Duration::from_secs(60));
    }

    #[test]
    fn interrupt_forces_completion() {
        let (mut s, clock) = session(&["the", "end"]);
        type_str(&mut s, "the ");
        clock.advance_secs(6.0);
        s.interrupt();

        assert_eq!(s.completion_reason(), Some(CompletionReason::Interrupted));
        assert_eq!(s.elapsed(), Duration::from_secs(6));
        assert_relative_eq!(s.stats().wpm, (3.0 / 5.0) / (6.0 / 60.0));
    }

    #[test]
    fn elapsed_freezes_after_completion() {
        let (mut s, clock) = session(&["x"]);
        clock.advance_secs(2.0);
        s.process_key(KeyCode::ESCAPE).unwrap();
        clock.advance_secs(30.0);
        s.tick();
        s.interrupt();

        assert_eq!(s.elapsed(), Duration::from_secs(2));
        assert_eq!(s.completion_reason(), Some(CompletionReason::Escape));
    }

    #[test]
    fn word_times_measure_gaps_between_submits() {
        let (mut s, clock) = session(&["ab", "cd", "ef"]);
        clock.advance_secs(1.0);
        type_str(&mut s, "ab ");
        clock.advance_secs(3.0);
        type_str(&mut s, "cd ");

        assert_eq!(
            s.recorder().word_times(),
            &[Duration::from_secs(1), Duration::from_secs(3)]
        );
        s.tick();
        assert_relative_eq!(s.stats().consistency, 50.0);
    }

    #[test]
    fn live_stats_are_idempotent_without_new_keys() {
        let (mut s, clock) = session(&["the", "quick", "fox"]);
        clock.advance_secs(1.0);
        type_str(&mut s, "the ");
        clock.advance_secs(2.0);
        type_str(&mut s, "quikc ");
        clock.advance_secs(0.5);

        s.tick();
        let first = s.stats().clone();
        s.tick();

        assert_eq!(s.stats(), &first);
    }

    #[test]
    fn wpm_is_zero_before_time_passes() {
        let (mut s, _) = session(&["the", "end"]);
        type_str(&mut s, "the ");
        s.tick();
        assert_eq!(s.stats().wpm, 0.0);
        assert_eq!(s.stats().wpm_raw, 0.0);
    }

    #[test]
    fn time_progress_is_clamped() {
        let (mut s, clock) = session(&["the"]);
        clock.advance_secs(30.0);
        s.tick();
        assert_relative_eq!(s.time_progress(), 0.5);
        assert_eq!(s.remaining(), Duration::from_secs(30));

        clock.advance_secs(90.0);
        s.tick();
        assert_eq!(s.time_progress(), 1.0);
        assert_eq!(s.remaining(), Duration::ZERO);
    }

    #[test]
    fn key_frequency_tracks_every_key() {
        let (mut s, _) = session(&["aa", "b"]);
        type_str(&mut s, "aa ");
        s.process_key(KeyCode::DELETE).unwrap();

        use crate::keys::KeyId;
        assert_eq!(s.recorder().frequency_of(KeyId::Printable('a')), 2);
        assert_eq!(s.recorder().frequency_of(KeyId::Printable(' ')), 1);
        assert_eq!(s.recorder().frequency_of(KeyId::from(KeyCode::DELETE)), 1);
    }
}
