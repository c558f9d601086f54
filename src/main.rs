mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use shelltype::{
    analytics::SessionAnalytics,
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    driver,
    error::SessionError,
    history::{ResultManager, SessionResult},
    runtime::{CrosstermEventSource, FixedTicker, Runner, SessionEvent},
    session::{CompletionReason, SessionConfig, TypingSession},
    word_source::{load_words_or_fallback, provider_for, WordSourceKind},
};
use std::{
    error::Error,
    fs::OpenOptions,
    io::{self, stdin},
    sync::Mutex,
    time::Duration,
};
use tracing_subscriber::EnvFilter;

pub const MENU_ITEMS: [&str; 6] = [
    "30 Second Test",
    "60 Second Test",
    "120 Second Test",
    "Word Lists",
    "View History",
    "Exit",
];
const MENU_TEST_SECS: [u64; 3] = [30, 60, 120];
pub const HISTORY_PAGE_SIZE: usize = 10;

/// terminal typing test with live wpm, accuracy and consistency tracking
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal typing test. Type the words shown, press space to submit each one, and get wpm, accuracy and consistency when time runs out. Results are appended to a local history."
)]
pub struct Cli {
    /// number of seconds to run the test [default: 60]
    #[clap(short = 't', long = "time", value_parser = clap::value_parser!(u64).range(1..))]
    time: Option<u64>,

    /// word list to draw from [default: common]
    #[clap(short = 'w', long = "words", value_enum)]
    words: Option<WordSourceKind>,

    /// open the main menu instead of starting a test right away
    #[clap(long)]
    menu: bool,
}

impl Cli {
    /// Overrides the stored defaults with whatever was given on the command line
    fn apply(&self, config: &mut Config) {
        if let Some(secs) = self.time {
            config.time_limit = secs;
        }
        if let Some(words) = self.words {
            config.word_source = words;
        }
        if self.menu {
            config.menu = true;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Menu,
    WordLists,
    Typing,
    Results,
    Analytics,
    History,
}

#[derive(Debug, PartialEq, Eq)]
enum ExitType {
    Restart,
    Quit,
}

pub struct App {
    pub config: Config,
    config_store: FileConfigStore,
    results: ResultManager,
    pub state: AppState,
    pub session_config: SessionConfig,
    pub session: Option<TypingSession>,
    pub last_result: Option<SessionResult>,
    pub analytics: Option<SessionAnalytics>,
    /// One-line warning shown under results or history.
    pub notice: Option<String>,
    /// Newest first.
    pub history: Vec<SessionResult>,
    pub history_page: usize,
    history_return: AppState,
    pub menu_index: usize,
    pub word_list_index: usize,
}

impl App {
    pub fn new(config: Config, config_store: FileConfigStore, results: ResultManager) -> Self {
        let word_list_index = WordSourceKind::ALL
            .iter()
            .position(|s| *s == config.word_source)
            .unwrap_or(0);

        Self {
            state: if config.menu {
                AppState::Menu
            } else {
                AppState::Typing
            },
            session_config: config.session_config(),
            config,
            config_store,
            results,
            session: None,
            last_result: None,
            analytics: None,
            notice: None,
            history: Vec::new(),
            history_page: 0,
            history_return: AppState::Menu,
            menu_index: 0,
            word_list_index,
        }
    }

    /// Replaces any previous session with a fresh one for `session_config`.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        let provider = provider_for(self.config.word_list_dir.as_deref());
        let words = load_words_or_fallback(
            provider.as_ref(),
            self.session_config.word_source,
            &mut rand::thread_rng(),
        );

        self.session = Some(TypingSession::start_now(self.session_config, words)?);
        self.last_result = None;
        self.analytics = None;
        self.notice = None;
        self.state = AppState::Typing;
        Ok(())
    }

    /// Persists the finished session and switches to the results screen.
    pub fn finish_session(&mut self) {
        let Some(session) = &self.session else {
            return;
        };

        let (result, report) = driver::finish_session(session, &self.results);
        self.notice = match report {
            None => Some("Result could not be saved, see the log for details".to_string()),
            Some(report) => report.recovered_to.map(|backup| {
                format!(
                    "Previous history was unreadable and was moved to {}",
                    backup.display()
                )
            }),
        };
        self.analytics = Some(SessionAnalytics::from_session(session));
        self.last_result = Some(result);
        self.state = AppState::Results;
    }

    pub fn open_history(&mut self, return_to: AppState) {
        self.history = match self.results.load_history() {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!("could not load history: {e}");
                self.notice = Some(format!("History unavailable: {e}"));
                Vec::new()
            }
        };
        self.history.reverse();
        self.history_page = 0;
        self.history_return = return_to;
        self.state = AppState::History;
    }

    pub fn history_pages(&self) -> usize {
        self.history.len().div_ceil(HISTORY_PAGE_SIZE).max(1)
    }

    pub fn history_page_entries(&self) -> &[SessionResult] {
        let start = (self.history_page * HISTORY_PAGE_SIZE).min(self.history.len());
        let end = (start + HISTORY_PAGE_SIZE).min(self.history.len());
        &self.history[start..end]
    }

    /// Makes `source` the default word list and remembers it for next time.
    pub fn select_word_list(&mut self, source: WordSourceKind) {
        self.config.word_source = source;
        self.session_config.word_source = source;

        if let Err(e) = self.config_store.save(&self.config) {
            tracing::warn!("could not save config: {e}");
            self.notice = Some(format!("Could not save settings: {e}"));
        }
    }

    fn leave_results(&mut self) -> Option<ExitType> {
        if self.config.menu {
            self.state = AppState::Menu;
            None
        } else {
            Some(ExitType::Quit)
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<ExitType> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(ExitType::Quit);
        }

        match self.state {
            AppState::Menu => match key.code {
                KeyCode::Up | KeyCode::Char('k') => {
                    self.menu_index = self.menu_index.saturating_sub(1);
                    None
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.menu_index = (self.menu_index + 1).min(MENU_ITEMS.len() - 1);
                    None
                }
                KeyCode::Char(c @ '1'..='6') => {
                    self.menu_index = c as usize - '1' as usize;
                    self.select_menu_item()
                }
                KeyCode::Enter => self.select_menu_item(),
                KeyCode::Esc | KeyCode::Char('q') => Some(ExitType::Quit),
                _ => None,
            },
            AppState::WordLists => {
                match key.code {
                    KeyCode::Up | KeyCode::Char('k') => {
                        self.word_list_index = self.word_list_index.saturating_sub(1);
                    }
                    KeyCode::Down | KeyCode::Char('j') => {
                        self.word_list_index =
                            (self.word_list_index + 1).min(WordSourceKind::ALL.len() - 1);
                    }
                    KeyCode::Enter => {
                        self.select_word_list(WordSourceKind::ALL[self.word_list_index]);
                        self.state = AppState::Menu;
                    }
                    KeyCode::Esc | KeyCode::Backspace => self.state = AppState::Menu,
                    _ => {}
                }
                None
            }
            // typing keys are consumed by the driver
            AppState::Typing => None,
            AppState::Results => match key.code {
                KeyCode::Enter | KeyCode::Char('r') => Some(ExitType::Restart),
                KeyCode::Char('a') => {
                    if self.analytics.is_some() {
                        self.state = AppState::Analytics;
                    }
                    None
                }
                KeyCode::Char('h') => {
                    self.open_history(AppState::Results);
                    None
                }
                KeyCode::Esc => self.leave_results(),
                _ => None,
            },
            AppState::Analytics => {
                self.state = AppState::Results;
                None
            }
            AppState::History => {
                match key.code {
                    KeyCode::Left | KeyCode::PageUp | KeyCode::Char('p') => {
                        self.history_page = self.history_page.saturating_sub(1);
                    }
                    KeyCode::Right | KeyCode::PageDown | KeyCode::Char('n') => {
                        self.history_page = (self.history_page + 1).min(self.history_pages() - 1);
                    }
                    KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => {
                        self.state = self.history_return;
                    }
                    _ => {}
                }
                None
            }
        }
    }

    fn select_menu_item(&mut self) -> Option<ExitType> {
        match self.menu_index {
            i @ 0..=2 => {
                self.session_config = SessionConfig::new(MENU_TEST_SECS[i], self.config.word_source);
                Some(ExitType::Restart)
            }
            3 => {
                self.state = AppState::WordLists;
                None
            }
            4 => {
                self.notice = None;
                self.open_history(AppState::Menu);
                None
            }
            _ => Some(ExitType::Quit),
        }
    }
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_env("SHELLTYPE_LOG")
        .unwrap_or_else(|_| EnvFilter::new("shelltype=info"));

    // the terminal belongs to the TUI, so logs only ever go to the file
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging();

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    cli.apply(&mut config);
    tracing::info!(
        "starting: {}s, {} words, menu {}",
        config.time_limit,
        config.word_source,
        config.menu
    );

    let results = ResultManager::new(
        config
            .history_path()
            .unwrap_or_else(|| "typing_history.json".into()),
    );
    let tick = Duration::from_millis(config.tick_rate_ms.max(1));

    let mut app = App::new(config, config_store, results);
    if app.state == AppState::Typing {
        app.restart()?;
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::new(tick));
    let outcome = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    outcome
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<CrosstermEventSource, FixedTicker>,
) -> Result<(), Box<dyn Error>> {
    loop {
        if app.state == AppState::Typing {
            let Some(session) = app.session.as_mut() else {
                app.restart()?;
                continue;
            };

            driver::drive_session(session, runner, |s| {
                terminal.draw(|f| f.render_widget(ui::SessionView::new(s), f.area()))?;
                Ok(())
            })?;

            let interrupted =
                session.completion_reason() == Some(CompletionReason::Interrupted);
            app.finish_session();
            if interrupted {
                break;
            }
        }

        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        let exit_type = match runner.step() {
            SessionEvent::Key(key) => app.handle_key(key),
            SessionEvent::Closed => Some(ExitType::Quit),
            SessionEvent::Resize | SessionEvent::Tick => None,
        };

        match exit_type {
            Some(ExitType::Restart) => app.restart()?,
            Some(ExitType::Quit) => break,
            None => {}
        }
    }

    Ok(())
}
