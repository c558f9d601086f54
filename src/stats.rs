use crate::util::variance;

/// Characters per standard word.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Running count of correctly and incorrectly typed characters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CharacterTally {
    pub correct: u64,
    pub incorrect: u64,
}

impl CharacterTally {
    pub fn new(correct: u64, incorrect: u64) -> Self {
        Self { correct, incorrect }
    }

    pub fn total(&self) -> u64 {
        self.correct + self.incorrect
    }
}

/// Outcome of checking one submitted word against its target.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WordComparison {
    pub tally: CharacterTally,
    /// Target characters that were not matched, in position order.
    pub missed: Vec<char>,
}

/// Compares `input` to `target` position by position.
///
/// Every position without a correct match counts as incorrect, so both a
/// shortfall (input shorter than target) and an overflow (input longer)
/// are charged: `incorrect = max(len(input), len(target)) - correct`.
pub fn compare_word(input: &str, target: &str) -> WordComparison {
    let mut comparison = WordComparison::default();
    let mut typed = input.chars();

    for expected in target.chars() {
        match typed.next() {
            Some(c) if c == expected => comparison.tally.correct += 1,
            _ => {
                comparison.tally.incorrect += 1;
                comparison.missed.push(expected);
            }
        }
    }

    // overflow
    comparison.tally.incorrect += typed.count() as u64;

    comparison
}

/// Consistency score in `(0, 100]` derived from the variance of per-word
/// times, or `0` when fewer than two words were timed.
pub fn calculate_consistency(word_times: &[f64]) -> f64 {
    if word_times.len() < 2 {
        return 0.0;
    }

    match variance(word_times) {
        Some(v) => 100.0 / (1.0 + v),
        None => 0.0,
    }
}

/// Live typing statistics for one session.
#[derive(Clone, Debug, PartialEq)]
pub struct TypingStats {
    tally: CharacterTally,
    pub wpm: f64,
    pub wpm_raw: f64,
    /// `correct / (correct / 5) * 100`, kept exactly as computed. Exceeds 100
    /// as soon as anything was typed correctly; see [`TypingStats::accuracy`].
    pub accuracy_raw: f64,
    pub consistency: f64,
}

impl Default for TypingStats {
    fn default() -> Self {
        Self {
            tally: CharacterTally::default(),
            wpm: 0.0,
            wpm_raw: 0.0,
            accuracy_raw: 100.0,
            consistency: 0.0,
        }
    }
}

impl TypingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tally(&self) -> CharacterTally {
        self.tally
    }

    pub fn correct_chars(&self) -> u64 {
        self.tally.correct
    }

    pub fn incorrect_chars(&self) -> u64 {
        self.tally.incorrect
    }

    /// Adds to the running totals. Totals never decrease.
    pub fn update_character_stats(&mut self, correct_delta: u64, incorrect_delta: u64) {
        self.tally.correct += correct_delta;
        self.tally.incorrect += incorrect_delta;
    }

    /// Recomputes wpm, raw wpm and raw accuracy. Leaves everything unchanged
    /// when `elapsed_seconds <= 0`.
    pub fn calculate_wpm(&mut self, elapsed_seconds: f64) {
        if elapsed_seconds <= 0.0 {
            return;
        }

        let correct = self.tally.correct as f64;
        let total = self.tally.total() as f64;
        let time_minutes = elapsed_seconds / 60.0;

        let raw_words = total / CHARS_PER_WORD;
        let net_words = correct / CHARS_PER_WORD;

        self.wpm_raw = raw_words / time_minutes;
        self.wpm = net_words / time_minutes;

        self.accuracy_raw = if net_words > 0.0 {
            (correct / net_words) * 100.0
        } else {
            100.0
        };
    }

    pub fn update_consistency(&mut self, word_times: &[f64]) {
        self.consistency = calculate_consistency(word_times);
    }

    /// Reported accuracy: the raw figure clamped into `[0, 100]`.
    pub fn accuracy(&self) -> f64 {
        self.accuracy_raw.clamp(0.0, 100.0)
    }

    /// Share of correct characters among all judged characters, `100` before
    /// anything was judged.
    pub fn char_accuracy(&self) -> f64 {
        match self.tally.total() {
            0 => 100.0,
            total => self.tally.correct as f64 / total as f64 * 100.0,
        }
    }
}
