pub mod charting;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, BarChart, Block, Borders, Cell, Chart, Dataset, Gauge, GraphType, Paragraph, Row,
        Table, Widget, Wrap,
    },
};
use shelltype::{
    analytics::SessionAnalytics,
    runtime::Clock,
    session::{CompletionReason, TypingSession},
    word_source::WordSourceKind,
};

use crate::{App, AppState, MENU_ITEMS};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
/// Words shown at once; the view flips to the next block when the cursor leaves it.
const WORDS_PER_VIEW: usize = 24;

fn bold_style() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold_style() -> Style {
    bold_style().add_modifier(Modifier::DIM)
}

fn title_style() -> Style {
    bold_style().fg(Color::Cyan)
}

fn legend_style() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

/// Live view of a running session.
pub struct SessionView<'a, C: Clock> {
    session: &'a TypingSession<C>,
}

impl<'a, C: Clock> SessionView<'a, C> {
    pub fn new(session: &'a TypingSession<C>) -> Self {
        Self { session }
    }
}

impl<C: Clock> Widget for SessionView<'_, C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = self.session;
        let stats = session.stats();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // live stats
                Constraint::Length(1), // time gauge
                Constraint::Length(1),
                Constraint::Min(3),    // words
                Constraint::Length(3), // input
                Constraint::Length(1), // legend
            ])
            .split(area);

        let header = Paragraph::new(Line::from(vec![
            Span::styled(format!("{:.0} wpm", stats.wpm), bold_style()),
            Span::raw("   "),
            Span::styled(format!("{:.0}% acc", stats.char_accuracy()), bold_style()),
            Span::raw("   "),
            Span::styled(
                format!("{} words", session.current_word_index()),
                dim_bold_style(),
            ),
        ]))
        .alignment(Alignment::Center);
        header.render(chunks[0], buf);

        Gauge::default()
            .gauge_style(Style::default().fg(Color::Magenta))
            .ratio(session.time_progress())
            .label(format!("{:.1}s", session.remaining().as_secs_f64()))
            .render(chunks[1], buf);

        let words = Paragraph::new(Line::from(word_spans(
            session.words(),
            session.current_word_index(),
            session.current_input(),
        )))
        .wrap(Wrap { trim: true });
        words.render(chunks[3], buf);

        let on_track = session
            .current_word()
            .is_some_and(|w| w.starts_with(session.current_input()));
        let input_style = if on_track {
            bold_style()
        } else {
            bold_style().fg(Color::Red)
        };
        Paragraph::new(Span::styled(session.current_input().to_string(), input_style))
            .block(Block::default().borders(Borders::ALL).title("input"))
            .render(chunks[4], buf);

        Paragraph::new(Span::styled(
            "(space) submit word / (esc) finish",
            legend_style(),
        ))
        .render(chunks[5], buf);
    }
}

fn word_spans(words: &[String], current: usize, input: &str) -> Vec<Span<'static>> {
    let green_bold_style = bold_style().fg(Color::Green);
    let red_bold_style = bold_style().fg(Color::Red);
    let underlined_dim_bold_style = dim_bold_style().add_modifier(Modifier::UNDERLINED);

    let focus = current.min(words.len().saturating_sub(1));
    let start = (focus / WORDS_PER_VIEW) * WORDS_PER_VIEW;
    let end = (start + WORDS_PER_VIEW).min(words.len());

    let mut spans = Vec::new();
    for (idx, word) in words[start..end]
        .iter()
        .enumerate()
        .map(|(i, w)| (start + i, w))
    {
        if idx == current {
            let typed: Vec<char> = input.chars().collect();
            for (i, expected) in word.chars().enumerate() {
                let style = match typed.get(i) {
                    Some(c) if *c == expected => green_bold_style,
                    Some(_) => red_bold_style,
                    None if i == typed.len() => underlined_dim_bold_style,
                    None => dim_bold_style(),
                };
                spans.push(Span::styled(expected.to_string(), style));
            }
            let overflow: String = typed.iter().skip(word.chars().count()).collect();
            if !overflow.is_empty() {
                spans.push(Span::styled(overflow, red_bold_style));
            }
        } else if idx < current {
            spans.push(Span::styled(
                word.clone(),
                Style::default().fg(Color::DarkGray),
            ));
        } else {
            spans.push(Span::styled(word.clone(), dim_bold_style()));
        }
        spans.push(Span::raw(" "));
    }

    spans
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Menu => render_menu(self, area, buf),
            AppState::WordLists => render_word_lists(self, area, buf),
            AppState::Typing => {
                if let Some(session) = &self.session {
                    SessionView::new(session).render(area, buf);
                }
            }
            AppState::Results => render_results(self, area, buf),
            AppState::Analytics => {
                if let Some(analytics) = &self.analytics {
                    render_analytics(analytics, area, buf);
                }
            }
            AppState::History => render_history(self, area, buf),
        }
    }
}

fn screen_layout(area: Rect, body: Constraint) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(3), // title
            body,
            Constraint::Length(1), // notice
            Constraint::Length(1), // legend
        ])
        .split(area)
}

fn render_title(text: &str, area: Rect, buf: &mut Buffer) {
    Paragraph::new(text.to_string())
        .block(Block::default().borders(Borders::ALL))
        .style(title_style())
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_footer(notice: Option<&str>, legend: &str, chunks: &[Rect], buf: &mut Buffer) {
    if let Some(notice) = notice {
        Paragraph::new(Span::styled(
            notice.to_string(),
            Style::default().fg(Color::Yellow),
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);
    }

    Paragraph::new(Span::styled(legend.to_string(), legend_style()))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
}

fn selectable_lines<'a, I>(items: I, selected: usize) -> Vec<Line<'a>>
where
    I: IntoIterator<Item = String>,
{
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let style = if i == selected {
                bold_style().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Line::from(Span::styled(item, style))
        })
        .collect()
}

fn render_menu(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = screen_layout(area, Constraint::Min(MENU_ITEMS.len() as u16));
    render_title("SHELLTYPE", chunks[0], buf);

    let items = MENU_ITEMS
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {item}", i + 1));
    Paragraph::new(selectable_lines(items, app.menu_index))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let notice = format!("word list: {}", app.config.word_source.label());
    render_footer(
        Some(app.notice.as_deref().unwrap_or(&notice)),
        "(↑/↓) move / (enter) select / (esc) quit",
        &chunks,
        buf,
    );
}

fn render_word_lists(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = screen_layout(area, Constraint::Min(WordSourceKind::ALL.len() as u16));
    render_title("WORD LISTS", chunks[0], buf);

    let items = WordSourceKind::ALL.iter().map(|source| {
        if *source == app.config.word_source {
            format!("{} (current)", source.label())
        } else {
            source.label().to_string()
        }
    });
    Paragraph::new(selectable_lines(items, app.word_list_index))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    render_footer(
        app.notice.as_deref(),
        "(↑/↓) move / (enter) choose / (esc) back",
        &chunks,
        buf,
    );
}

fn describe(reason: Option<CompletionReason>) -> &'static str {
    match reason {
        Some(CompletionReason::TimeUp) => "time's up",
        Some(CompletionReason::WordsExhausted) => "all words typed",
        Some(CompletionReason::Escape) => "ended early",
        Some(CompletionReason::Interrupted) => "interrupted",
        None => "",
    }
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(result) = &app.last_result else {
        return;
    };

    let chunks = screen_layout(area, Constraint::Min(8));
    let reason = app.session.as_ref().and_then(|s| s.completion_reason());
    render_title(
        &format!("TEST COMPLETE ({})", describe(reason)),
        chunks[0],
        buf,
    );

    let row = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{label:>12}: "), dim_bold_style()),
            Span::styled(value, bold_style()),
        ])
    };

    let lines = vec![
        row("WPM", format!("{:.2}", result.wpm)),
        row("Raw WPM", format!("{:.2}", result.wpm_raw.unwrap_or(0.0))),
        row("Accuracy", format!("{:.2}%", result.accuracy)),
        row(
            "Characters",
            format!(
                "{} correct / {} incorrect ({:.1}%)",
                result.correct_chars.unwrap_or(0),
                result.incorrect_chars.unwrap_or(0),
                result.char_accuracy.unwrap_or(100.0)
            ),
        ),
        row("Consistency", format!("{:.2}%", result.consistency)),
        row(
            "Time",
            format!("{:.2}s of {}s", result.elapsed_time, result.time_limit),
        ),
        row("Words", result.words_completed.unwrap_or(0).to_string()),
        row("Word list", result.word_source.clone()),
    ];
    Paragraph::new(lines).render(chunks[1], buf);

    render_footer(
        app.notice.as_deref(),
        "(enter) restart / (a)nalytics / (h)istory / (esc) leave",
        &chunks,
        buf,
    );
}

fn render_analytics(analytics: &SessionAnalytics, area: Rect, buf: &mut Buffer) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Min(8),    // metrics and charts
            Constraint::Length(5), // insights
            Constraint::Length(1), // legend
        ])
        .split(area);

    render_title("DETAILED TYPING ANALYTICS", outer[0], buf);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(outer[1]);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(3)])
        .split(columns[0]);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(columns[1]);

    let metrics = vec![
        Line::from(format!("WPM: {:.1}", analytics.wpm)),
        Line::from(format!("Accuracy: {:.1}%", analytics.char_accuracy)),
        Line::from(format!("Consistency: {:.1}%", analytics.consistency)),
        Line::from(format!("Burst Speed: {:.1} WPM", analytics.burst_speed)),
        Line::from(format!("Backspaces: {}", analytics.backspaces)),
        Line::from(format!("Words: {}", analytics.words_completed)),
    ];
    Paragraph::new(metrics).style(bold_style()).render(left[0], buf);

    render_speed_chart(&analytics.wpm_over_time, left[1], buf);

    let key_labels: Vec<String> = analytics.top_keys.iter().map(|(k, _)| k.to_string()).collect();
    let key_data: Vec<(&str, u64)> = key_labels
        .iter()
        .map(String::as_str)
        .zip(analytics.top_keys.iter().map(|(_, count)| *count))
        .collect();
    render_bars("MOST USED KEYS", &key_data, Color::Cyan, right[0], buf);

    let mistake_labels: Vec<String> = analytics
        .top_mistakes
        .iter()
        .map(|(c, _)| c.to_string())
        .collect();
    let mistake_data: Vec<(&str, u64)> = mistake_labels
        .iter()
        .map(String::as_str)
        .zip(analytics.top_mistakes.iter().map(|(_, count)| *count))
        .collect();
    render_bars("MOST COMMON MISTAKES", &mistake_data, Color::Red, right[1], buf);

    let mut insights = vec![Line::from(Span::styled("INSIGHTS:", bold_style()))];
    insights.extend(
        analytics
            .insights
            .iter()
            .map(|insight| Line::from(format!("  • {insight}"))),
    );
    Paragraph::new(insights)
        .wrap(Wrap { trim: false })
        .render(outer[2], buf);

    Paragraph::new(Span::styled("press any key to go back", legend_style()))
        .alignment(Alignment::Center)
        .render(outer[3], buf);
}

fn render_speed_chart(wpm_over_time: &[f64], area: Rect, buf: &mut Buffer) {
    let block = Block::default().borders(Borders::ALL).title("WPM OVER TIME");
    if wpm_over_time.is_empty() {
        Paragraph::new("Not enough data")
            .block(block)
            .alignment(Alignment::Center)
            .render(area, buf);
        return;
    }

    let points = charting::word_speed_points(wpm_over_time);
    let (overall, highest_wpm) = charting::compute_chart_params(&points);

    let datasets = vec![Dataset::default()
        .marker(symbols::Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&points)];

    Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title("word")
                .bounds([1.0, overall])
                .labels(vec![
                    Span::styled("1", bold_style()),
                    Span::styled(charting::format_label(overall), bold_style()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm])
                .labels(vec![
                    Span::styled("0", bold_style()),
                    Span::styled(charting::format_label(highest_wpm), bold_style()),
                ]),
        )
        .render(area, buf);
}

fn render_bars(title: &str, data: &[(&str, u64)], color: Color, area: Rect, buf: &mut Buffer) {
    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    if data.is_empty() {
        Paragraph::new("None").block(block).render(area, buf);
        return;
    }

    BarChart::default()
        .block(block)
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .bar_style(Style::default().fg(color))
        .value_style(bold_style())
        .data(data)
        .render(area, buf);
}

fn render_history(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = screen_layout(area, Constraint::Min(3));
    render_title(
        &format!(
            "TYPING HISTORY (page {}/{})",
            app.history_page + 1,
            app.history_pages()
        ),
        chunks[0],
        buf,
    );

    if app.history.is_empty() {
        Paragraph::new("No history yet")
            .alignment(Alignment::Center)
            .render(chunks[1], buf);
    } else {
        let rows = app.history_page_entries().iter().map(|r| {
            Row::new(vec![
                Cell::from(r.date.clone()),
                Cell::from(format!("{:.1}", r.wpm)),
                Cell::from(format!("{:.1}%", r.accuracy)),
                Cell::from(format!("{}s", r.time_limit)),
                Cell::from(r.word_source.clone()),
                Cell::from(format!("{:.1}%", r.consistency)),
            ])
        });

        Table::new(
            rows,
            [
                Constraint::Length(19),
                Constraint::Length(8),
                Constraint::Length(9),
                Constraint::Length(6),
                Constraint::Length(12),
                Constraint::Length(11),
            ],
        )
        .header(
            Row::new(vec!["Date", "WPM", "Accuracy", "Time", "Word list", "Consistency"])
                .style(bold_style().fg(Color::Yellow)),
        )
        .block(Block::default().borders(Borders::ALL))
        .render(chunks[1], buf);
    }

    render_footer(
        app.notice.as_deref(),
        "(←/→) page / (esc) back",
        &chunks,
        buf,
    );
}
