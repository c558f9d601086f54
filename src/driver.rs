use chrono::Local;

use crate::error::{DriveError, SessionError};
use crate::history::{ResultManager, SaveReport, SessionResult};
use crate::runtime::{
    translate_key, Clock, KeyInput, Runner, SessionEvent, SessionEventSource, Ticker,
};
use crate::session::TypingSession;

/// Feeds one runtime event into the session.
///
/// Keys go through [`translate_key`]; ticks and resizes re-check the time
/// limit; a closed event source interrupts the session.
pub fn apply_event<C: Clock>(
    session: &mut TypingSession<C>,
    event: SessionEvent,
) -> Result<(), SessionError> {
    match event {
        SessionEvent::Key(key) => match translate_key(key) {
            KeyInput::Code(code) => session.process_key(code)?,
            KeyInput::Interrupt => session.interrupt(),
            KeyInput::Ignored => {}
        },
        SessionEvent::Tick | SessionEvent::Resize => {}
        SessionEvent::Closed => session.interrupt(),
    }

    // keeps elapsed time and live stats current after every event
    session.tick();
    Ok(())
}

/// Runs the session to completion, rendering after every event.
///
/// A render failure aborts the loop only while the session is still running;
/// once it has completed the error is logged so the caller can still save.
pub fn drive_session<C, E, T, F>(
    session: &mut TypingSession<C>,
    runner: &Runner<E, T>,
    mut render: F,
) -> Result<(), DriveError>
where
    C: Clock,
    E: SessionEventSource,
    T: Ticker,
    F: FnMut(&TypingSession<C>) -> std::io::Result<()>,
{
    render(session)?;

    while !session.is_completed() {
        apply_event(session, runner.step())?;
        if let Err(e) = render(session) {
            if !session.is_completed() {
                return Err(e.into());
            }
            tracing::warn!("final frame not drawn: {e}");
        }
    }

    Ok(())
}

/// Builds the result of a completed session and appends it to the history.
///
/// Storage problems are logged and reported as `None`; they never discard
/// the computed result.
pub fn finish_session<C: Clock>(
    session: &TypingSession<C>,
    results: &ResultManager,
) -> (SessionResult, Option<SaveReport>) {
    let result = SessionResult::from_session(session, Local::now());

    let report = match results.save_result(&result) {
        Ok(report) => {
            if let Some(backup) = &report.recovered_to {
                tracing::warn!(
                    "previous history was unreadable and kept at {}",
                    backup.display()
                );
            }
            Some(report)
        }
        Err(e) => {
            tracing::error!("could not save result: {e}");
            None
        }
    };

    (result, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyCode;
    use crate::runtime::{FixedTicker, ManualClock, TestEventSource};
    use crate::session::{CompletionReason, SessionConfig};
    use crate::word_source::WordSourceKind;
    use crossterm::event::{KeyCode as CtKeyCode, KeyEvent, KeyModifiers};
    use std::sync::mpsc;
    use std::time::Duration;
    use tempfile::tempdir;

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

    fn key(c: char) -> SessionEvent {
        SessionEvent::Key(KeyEvent::new(CtKeyCode::Char(c), KeyModifiers::NONE))
    }

    #[test]
    fn key_events_reach_the_session() {
        let (mut s, _) = session(&["ok", "go"]);
        for c in "ok g".chars() {
            apply_event(&mut s, key(c)).unwrap();
        }
        apply_event(
            &mut s,
            SessionEvent::Key(KeyEvent::new(CtKeyCode::Backspace, KeyModifiers::NONE)),
        )
        .unwrap();

        assert_eq!(s.current_word_index(), 1);
        assert_eq!(s.current_input(), "");
        assert_eq!(s.recorder().backspaces(), 1);
    }

    #[test]
    fn ctrl_c_interrupts() {
        let (mut s, _) = session(&["ok"]);
        apply_event(
            &mut s,
            SessionEvent::Key(KeyEvent::new(CtKeyCode::Char('c'), KeyModifiers::CONTROL)),
        )
        .unwrap();
        assert_eq!(s.completion_reason(), Some(CompletionReason::Interrupted));
    }

    #[test]
    fn closed_source_interrupts() {
        let (mut s, _) = session(&["ok"]);
        apply_event(&mut s, SessionEvent::Closed).unwrap();
        assert_eq!(s.completion_reason(), Some(CompletionReason::Interrupted));
    }

    #[test]
    fn tick_enforces_time_limit() {
        let (mut s, clock) = session(&["ok"]);
        clock.advance(Duration::from_secs(61));
        apply_event(&mut s, SessionEvent::Tick).unwrap();
        assert_eq!(s.completion_reason(), Some(CompletionReason::TimeUp));
    }

    #[test]
    fn drive_runs_until_completed_and_renders() {
        let (mut s, _) = session(&["hi", "yo"]);
        let (tx, rx) = mpsc::channel();
        for c in "hi yo ".chars() {
            tx.send(key(c)).unwrap();
        }
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );

        let mut frames = 0;
        drive_session(&mut s, &runner, |_| {
            frames += 1;
            Ok(())
        })
        .unwrap();

        assert_eq!(s.completion_reason(), Some(CompletionReason::WordsExhausted));
        assert_eq!(s.stats().correct_chars(), 4);
        // initial frame plus one per event
        assert_eq!(frames, 7);
    }

    #[test]
    fn render_errors_stop_the_loop() {
        let (mut s, _) = session(&["hi"]);
        let (_tx, rx) = mpsc::channel();
        let runner = Runner::new(TestEventSource::new(rx), FixedTicker::default());

        let err = drive_session(&mut s, &runner, |_| {
            Err(std::io::Error::other("gone"))
        })
        .unwrap_err();

        assert!(matches!(err, DriveError::Render(_)));
        assert!(!s.is_completed());
    }

    #[test]
    fn render_error_on_completion_frame_still_completes() {
        let dir = tempdir().unwrap();
        let results = ResultManager::new(dir.path().join("history.json"));
        let (mut s, _) = session(&["hi"]);
        let (tx, rx) = mpsc::channel();
        for c in "hi ".chars() {
            tx.send(key(c)).unwrap();
        }
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );

        drive_session(&mut s, &runner, |s| {
            if s.is_completed() {
                Err(std::io::Error::other("terminal gone"))
            } else {
                Ok(())
            }
        })
        .unwrap();

        assert_eq!(s.completion_reason(), Some(CompletionReason::WordsExhausted));
        let (_, report) = finish_session(&s, &results);
        assert_eq!(report.map(|r| r.entries), Some(1));
    }

    #[test]
    fn last_word_beats_time_limit_in_same_iteration() {
        let clock = ManualClock::new();
        let mut s = TypingSession::start(
            SessionConfig::new(1, WordSourceKind::Common),
            vec!["a".to_string()],
            clock.clone(),
        )
        .unwrap();

        apply_event(&mut s, key('a')).unwrap();
        clock.advance(Duration::from_secs(2));
        apply_event(&mut s, key(' ')).unwrap();

        assert_eq!(s.completion_reason(), Some(CompletionReason::WordsExhausted));
        assert_eq!(s.stats().correct_chars(), 1);
    }

    #[test]
    fn finish_saves_exactly_one_result() {
        let dir = tempdir().unwrap();
        let results = ResultManager::new(dir.path().join("history.json"));
        let (mut s, clock) = session(&["hi", "yo"]);

        clock.advance_secs(3.0);
        s.process_key(KeyCode::from_char('h')).unwrap();
        s.process_key(KeyCode::ESCAPE).unwrap();

        let (result, report) = finish_session(&s, &results);

        assert_eq!(report.map(|r| r.entries), Some(1));
        assert_eq!(result.elapsed_time, 3.0);
        assert_eq!(results.get_history(), vec![result]);
    }

    #[test]
    fn finish_keeps_result_when_store_cannot_be_written() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let results = ResultManager::new(blocker.join("history.json"));
        let (mut s, _) = session(&["hi"]);
        s.interrupt();

        let (result, report) = finish_session(&s, &results);

        assert!(report.is_none());
        assert_eq!(result.word_source, "common");
    }
}
