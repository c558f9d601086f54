use std::cell::Cell;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyCode as CtKeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::keys::KeyCode;

/// Default poll interval of the session loop.
pub const DEFAULT_TICK_RATE_MS: u64 = 10;

/// Monotonic time source for the session engine.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }
}

/// Unified event type consumed by the session loop
#[derive(Clone, Debug)]
pub enum SessionEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    /// The event source went away; treated like an interrupt.
    Closed,
}

/// What a terminal key event means to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyInput {
    Code(KeyCode),
    Interrupt,
    Ignored,
}

/// Translates a crossterm key event into the integer key encoding.
pub fn translate_key(key: KeyEvent) -> KeyInput {
    if key.kind == KeyEventKind::Release {
        return KeyInput::Ignored;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let code = match key.code {
        CtKeyCode::Char('c') if ctrl => return KeyInput::Interrupt,
        CtKeyCode::Char('h') if ctrl => KeyCode::CTRL_H,
        CtKeyCode::Char(c) => KeyCode::from_char(c),
        CtKeyCode::Esc => KeyCode::ESCAPE,
        CtKeyCode::Backspace => KeyCode::DELETE,
        CtKeyCode::Enter => KeyCode::ENTER,
        CtKeyCode::Tab => KeyCode::TAB,
        CtKeyCode::Up => KeyCode::UP,
        CtKeyCode::Down => KeyCode::DOWN,
        CtKeyCode::Left => KeyCode::LEFT,
        CtKeyCode::Right => KeyCode::RIGHT,
        _ => return KeyInput::Ignored,
    };

    KeyInput::Code(code)
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait SessionEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<SessionEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                Ok(CtEvent::Key(key)) => Some(SessionEvent::Key(key)),
                Ok(CtEvent::Resize(_, _)) => Some(SessionEvent::Resize),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!("terminal event reader stopped: {e}");
                    break;
                }
            };

            if let Some(ev) = forwarded {
                if tx.send(ev).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_TICK_RATE_MS))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<SessionEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<SessionEvent>) -> Self {
        Self { rx }
    }
}

impl SessionEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: SessionEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: SessionEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> SessionEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => SessionEvent::Tick,
            Err(RecvTimeoutError::Disconnected) => SessionEvent::Closed,
        }
    }
}
