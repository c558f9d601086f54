use std::collections::HashMap;
use std::time::Duration;

use itertools::Itertools;

use crate::keys::KeyId;
use crate::runtime::Clock;
use crate::session::TypingSession;
use crate::stats::CHARS_PER_WORD;

/// How many entries the key and mistake rankings keep.
pub const TOP_N: usize = 5;
pub const MAX_INSIGHTS: usize = 3;

/// Post-session breakdown shown on the analytics screen.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionAnalytics {
    pub wpm: f64,
    pub accuracy: f64,
    pub char_accuracy: f64,
    pub consistency: f64,
    /// WPM of each timed word, in typing order.
    pub wpm_over_time: Vec<f64>,
    pub burst_speed: f64,
    pub top_keys: Vec<(KeyId, u64)>,
    pub top_mistakes: Vec<(char, u64)>,
    pub slowest_key: Option<KeyId>,
    pub backspaces: u64,
    pub words_completed: usize,
    pub insights: Vec<String>,
}

impl SessionAnalytics {
    pub fn from_session<C: Clock>(session: &TypingSession<C>) -> Self {
        let stats = session.stats();
        let recorder = session.recorder();

        let wpm_over_time = word_speeds(session.words(), recorder.word_times());
        let burst_speed = wpm_over_time.iter().copied().fold(0.0, f64::max);

        let top_keys = recorder
            .key_frequency()
            .iter()
            .filter(|(key, _)| matches!(key, KeyId::Printable(_)))
            .map(|(key, count)| (*key, *count))
            .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
            .take(TOP_N)
            .collect();

        let top_mistakes = recorder
            .mistakes_by_char()
            .iter()
            .map(|(c, count)| (*c, *count))
            .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
            .take(TOP_N)
            .collect();

        let slowest_key = slowest_key(
            recorder
                .keystrokes()
                .iter()
                .map(|k| (k.at, KeyId::from(k.code))),
        );

        let mut analytics = Self {
            wpm: stats.wpm,
            accuracy: stats.accuracy(),
            char_accuracy: stats.char_accuracy(),
            consistency: stats.consistency,
            wpm_over_time,
            burst_speed,
            top_keys,
            top_mistakes,
            slowest_key,
            backspaces: recorder.backspaces(),
            words_completed: session.current_word_index(),
            insights: Vec::new(),
        };
        analytics.insights = analytics.derive_insights(stats.tally().total());
        analytics
    }

    fn derive_insights(&self, judged_chars: u64) -> Vec<String> {
        let mut insights = Vec::new();

        if let Some(key) = self.slowest_key {
            insights.push(format!("Your slowest key is '{key}'"));
        }

        if self.consistency > 0.0 {
            insights.push(
                if self.consistency > 80.0 {
                    "Your typing rhythm is very consistent"
                } else if self.consistency > 60.0 {
                    "Your typing has good consistency"
                } else {
                    "Try to develop a more consistent typing rhythm"
                }
                .to_string(),
            );
        }

        if self.backspaces > 0 && judged_chars > 0 {
            let ratio = self.backspaces as f64 / judged_chars as f64;
            if ratio > 0.2 {
                insights.push("You're using backspace frequently - focus on accuracy".to_string());
            } else if ratio < 0.05 && self.char_accuracy < 90.0 {
                insights.push("Try using backspace more to correct mistakes".to_string());
            }
        }

        insights.truncate(MAX_INSIGHTS);
        insights
    }
}

/// `len(word) / 5 / minutes` for each submitted word with a positive time.
pub fn word_speeds(words: &[String], word_times: &[Duration]) -> Vec<f64> {
    words
        .iter()
        .zip(word_times)
        .filter(|(_, t)| !t.is_zero())
        .map(|(word, t)| {
            let words_typed = word.chars().count() as f64 / CHARS_PER_WORD;
            words_typed / (t.as_secs_f64() / 60.0)
        })
        .collect()
}

/// Printable key with the highest mean latency from the keystroke before it.
/// Only keys seen at least twice are ranked.
pub fn slowest_key<I>(keystrokes: I) -> Option<KeyId>
where
    I: IntoIterator<Item = (std::time::Instant, KeyId)>,
{
    let mut latencies: HashMap<KeyId, (Duration, u32)> = HashMap::new();

    for ((prev_at, _), (at, key)) in keystrokes.into_iter().tuple_windows() {
        if let KeyId::Printable(_) = key {
            let entry = latencies.entry(key).or_insert((Duration::ZERO, 0));
            entry.0 += at.saturating_duration_since(prev_at);
            entry.1 += 1;
        }
    }

    latencies
        .into_iter()
        .filter(|(_, (_, samples))| *samples >= 2)
        .map(|(key, (total, samples))| (key, total / samples))
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .map(|(key, _)| key)
        .next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyCode;
    use crate::runtime::ManualClock;
    use crate::session::SessionConfig;
    use crate::word_source::WordSourceKind;
    use approx::assert_relative_eq;
    use std::time::Instant;

    fn session(list: &[&str]) -> (TypingSession<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let s = TypingSession::start(
            SessionConfig::new(60, WordSourceKind::Common),
            list.iter().map(|w| w.to_string()).collect(),
            clock.clone(),
        )
        .unwrap();
        (s, clock)
    }

    fn press(s: &mut TypingSession<ManualClock>, clock: &ManualClock, c: char, gap_ms: u64) {
        clock.advance(Duration::from_millis(gap_ms));
        s.process_key(KeyCode::from_char(c)).unwrap();
    }

    #[test]
    fn word_speeds_skip_untimed_words() {
        let words = vec!["hello".to_string(), "hi".to_string(), "abcdefghij".to_string()];
        let times = [
            Duration::from_secs(1),
            Duration::ZERO,
            Duration::from_secs(2),
        ];
        let speeds = word_speeds(&words, &times);
        assert_eq!(speeds.len(), 2);
        assert_relative_eq!(speeds[0], 60.0);
        assert_relative_eq!(speeds[1], 60.0);
    }

    #[test]
    fn slowest_key_needs_two_samples() {
        let t0 = Instant::now();
        let ms = |n| t0 + Duration::from_millis(n);

        // 'z' is slow but only seen once
        let strokes = vec![
            (ms(0), KeyId::Printable('a')),
            (ms(100), KeyId::Printable('b')),
            (ms(2000), KeyId::Printable('z')),
            (ms(2300), KeyId::Printable('b')),
            (ms(2350), KeyId::Printable('a')),
        ];
        // 'b' averages 200ms, 'a' has a single 50ms sample
        assert_eq!(slowest_key(strokes), Some(KeyId::Printable('b')));

        assert_eq!(slowest_key(vec![(ms(0), KeyId::Printable('q'))]), None);
    }

    #[test]
    fn slowest_key_ignores_symbolic_keys() {
        let t0 = Instant::now();
        let ms = |n| t0 + Duration::from_millis(n);
        let del = KeyId::from(KeyCode::DELETE);
        let strokes = vec![
            (ms(0), KeyId::Printable('x')),
            (ms(900), del),
            (ms(1800), del),
        ];
        assert_eq!(slowest_key(strokes), None);
    }

    #[test]
    fn analytics_summarize_a_session() {
        let (mut s, clock) = session(&["tea", "eat", "ate"]);
        for (c, gap) in [('t', 100), ('e', 100), ('a', 100), (' ', 100)] {
            press(&mut s, &clock, c, gap);
        }
        for (c, gap) in [('e', 100), ('a', 400), ('x', 100)] {
            press(&mut s, &clock, c, gap);
        }
        s.process_key(KeyCode::DELETE).unwrap();
        press(&mut s, &clock, 't', 100);
        press(&mut s, &clock, ' ', 100);
        s.process_key(KeyCode::ESCAPE).unwrap();

        let analytics = SessionAnalytics::from_session(&s);

        assert_eq!(analytics.words_completed, 2);
        assert_eq!(analytics.backspaces, 1);
        assert_eq!(analytics.wpm_over_time.len(), 2);
        // "tea" in 0.4s, "eat" in 0.8s
        assert_relative_eq!(analytics.wpm_over_time[0], 0.6 / (0.4 / 60.0), epsilon = 1e-9);
        assert_relative_eq!(analytics.burst_speed, analytics.wpm_over_time[0]);

        // ties broken by key order, space sorts first
        assert_eq!(analytics.top_keys[0], (KeyId::Printable(' '), 2));
        assert!(analytics.top_keys.len() <= TOP_N);
        assert!(analytics
            .top_keys
            .iter()
            .all(|(k, _)| matches!(k, KeyId::Printable(_))));
        assert!(analytics.top_mistakes.is_empty());
        // 'a' waits 100ms then 400ms
        assert_eq!(analytics.slowest_key, Some(KeyId::Printable('a')));
        assert!(analytics.insights.len() <= MAX_INSIGHTS);
        assert_eq!(analytics.insights[0], "Your slowest key is 'a'");
    }

    #[test]
    fn mistakes_are_ranked() {
        let (mut s, _) = session(&["eel", "see", "x"]);
        for c in "ll ss ".chars() {
            s.process_key(KeyCode::from_char(c)).unwrap();
        }
        let analytics = SessionAnalytics::from_session(&s);
        assert_eq!(analytics.top_mistakes[0], ('e', 4));
        assert_eq!(analytics.top_mistakes[1], ('l', 1));
    }

    #[test]
    fn consistency_insights() {
        let base = SessionAnalytics {
            wpm: 0.0,
            accuracy: 100.0,
            char_accuracy: 100.0,
            consistency: 0.0,
            wpm_over_time: vec![],
            burst_speed: 0.0,
            top_keys: vec![],
            top_mistakes: vec![],
            slowest_key: None,
            backspaces: 0,
            words_completed: 0,
            insights: vec![],
        };

        assert!(base.derive_insights(10).is_empty());

        let very = SessionAnalytics {
            consistency: 95.0,
            ..base.clone()
        };
        assert_eq!(
            very.derive_insights(10),
            vec!["Your typing rhythm is very consistent"]
        );

        let good = SessionAnalytics {
            consistency: 70.0,
            ..base.clone()
        };
        assert_eq!(good.derive_insights(10), vec!["Your typing has good consistency"]);

        let shaky = SessionAnalytics {
            consistency: 20.0,
            ..base
        };
        assert_eq!(
            shaky.derive_insights(10),
            vec!["Try to develop a more consistent typing rhythm"]
        );
    }

    #[test]
    fn backspace_insights() {
        let base = SessionAnalytics {
            wpm: 0.0,
            accuracy: 100.0,
            char_accuracy: 100.0,
            consistency: 0.0,
            wpm_over_time: vec![],
            burst_speed: 0.0,
            top_keys: vec![],
            top_mistakes: vec![],
            slowest_key: Some(KeyId::Printable(' ')),
            backspaces: 5,
            words_completed: 0,
            insights: vec![],
        };

        assert_eq!(
            base.derive_insights(10),
            vec![
                "Your slowest key is 'SPACE'",
                "You're using backspace frequently - focus on accuracy"
            ]
        );

        let sloppy = SessionAnalytics {
            backspaces: 1,
            char_accuracy: 80.0,
            slowest_key: None,
            ..base
        };
        assert_eq!(
            sloppy.derive_insights(100),
            vec!["Try using backspace more to correct mistakes"]
        );
        assert!(sloppy.derive_insights(10).is_empty());
    }
}
