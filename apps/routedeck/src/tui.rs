//! # Interactive Dashboard
//!
//! Renders the decisions state broadcast by the store and drives the
//! cross-filter set with the keyboard. All data shaping lives in
//! `routedeck-core`; this module only draws panels and maps keys to
//! actions.
//!
//! Keys: `Tab`/`Shift-Tab` cycle panel focus, `Up`/`Down` select a row,
//! `Enter` turns the selected row into a filter (the histogram is view
//! only), `1`-`4` drop a chip, `c` clears all filters, `r` reloads, `j`
//! toggles the raw JSON view, `q` quits.

use std::io::{self, stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use tokio::sync::{Mutex, watch};

use routedeck_core::aggregate::{self, BandCount, CategoryCount, TransportCount};
use routedeck_core::decision::Decision;
use routedeck_core::filters::{FilterKey, Filters};
use routedeck_core::source::DecisionSource;
use routedeck_core::store::{DecisionsState, DecisionsStore, load_decisions, make_state_channel};

// =============================================================================
// RAII TERMINAL GUARD (prevents broken terminal on panic/error)
// =============================================================================

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

// =============================================================================
// PANELS
// =============================================================================

/// The six chart panels, in focus-cycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Panel {
    Country,
    Region,
    Transport,
    RoutingCode,
    Histogram,
    Split,
}

impl Panel {
    const ALL: [Panel; 6] = [
        Panel::Country,
        Panel::Region,
        Panel::Transport,
        Panel::RoutingCode,
        Panel::Histogram,
        Panel::Split,
    ];

    fn index(self) -> usize {
        match self {
            Panel::Country => 0,
            Panel::Region => 1,
            Panel::Transport => 2,
            Panel::RoutingCode => 3,
            Panel::Histogram => 4,
            Panel::Split => 5,
        }
    }

    fn next(self) -> Panel {
        Panel::ALL[(self.index() + 1) % Panel::ALL.len()]
    }

    fn prev(self) -> Panel {
        Panel::ALL[(self.index() + Panel::ALL.len() - 1) % Panel::ALL.len()]
    }

    fn title(self) -> &'static str {
        match self {
            Panel::Country => "Supplier Country Distribution",
            Panel::Region => "Region / Continent Distribution",
            Panel::Transport => "Transport Mode Distribution",
            Panel::RoutingCode => "Routing Code Breakdown",
            Panel::Histogram => "Confidence Score Distribution",
            Panel::Split => "Confidence Level Split",
        }
    }

    /// The histogram has no filter to emit; its rows cannot be selected.
    fn selectable(self) -> bool {
        !matches!(self, Panel::Histogram)
    }
}

/// Filter assignments produced by pressing Enter on `panel` row `idx`.
///
/// Empty for view-only panels, out-of-range rows and malformed routing
/// codes. A routing code emits region and transport together or not at all,
/// so a malformed code never half-applies.
fn selection_emission(
    panel: Panel,
    idx: usize,
    filtered: &[Decision],
) -> Vec<(FilterKey, String)> {
    match panel {
        Panel::Country => {
            if let Some(row) = aggregate::country_counts(filtered).get(idx) {
                vec![(FilterKey::Country, row.label.clone())]
            } else {
                Vec::new()
            }
        }
        Panel::Region => {
            if let Some(row) = aggregate::region_counts(filtered).get(idx) {
                vec![(FilterKey::Region, row.label.clone())]
            } else {
                Vec::new()
            }
        }
        Panel::Transport => {
            if let Some(row) = aggregate::transport_counts(filtered).get(idx) {
                vec![(FilterKey::PrimaryTransport, row.mode.clone())]
            } else {
                Vec::new()
            }
        }
        Panel::RoutingCode => {
            let rows = aggregate::routing_code_counts(filtered);
            if let Some(row) = rows.get(idx)
                && let Some((region, transport)) = aggregate::parse_routing_code(&row.label)
            {
                vec![
                    (FilterKey::Region, region.to_string()),
                    (FilterKey::PrimaryTransport, transport.to_string()),
                ]
            } else {
                Vec::new()
            }
        }
        Panel::Histogram => Vec::new(),
        Panel::Split => {
            if let Some(row) = aggregate::confidence_split(filtered).get(idx) {
                vec![(FilterKey::ConfidenceBand, row.band.as_str().to_string())]
            } else {
                Vec::new()
            }
        }
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// TUI application state.
struct App {
    source: Arc<dyn DecisionSource>,
    store: Arc<Mutex<DecisionsStore>>,
    state_tx: watch::Sender<DecisionsState>,
    state_rx: watch::Receiver<DecisionsState>,
    filters: Filters,
    focus: Panel,
    selections: [usize; 6],
    show_raw: bool,
    raw_scroll: u16,
    should_quit: bool,
}

impl App {
    fn new(source: Arc<dyn DecisionSource>, filters: Filters) -> Self {
        let (state_tx, state_rx) = make_state_channel();
        Self {
            source,
            store: Arc::new(Mutex::new(DecisionsStore::new())),
            state_tx,
            state_rx,
            filters,
            focus: Panel::Country,
            selections: [0; 6],
            show_raw: false,
            raw_scroll: 0,
            should_quit: false,
        }
    }

    /// Kick off one load in the background. Overlapping reloads are fine;
    /// the store resolves them last-write-wins.
    fn spawn_load(&self) {
        tokio::spawn(load_decisions(
            self.source.clone(),
            self.store.clone(),
            self.state_tx.clone(),
        ));
    }

    fn selection(&self, panel: Panel) -> usize {
        self.selections[panel.index()]
    }

    fn row_count(&self, panel: Panel, filtered: &[Decision]) -> usize {
        match panel {
            Panel::Country => aggregate::country_counts(filtered).len(),
            Panel::Region => aggregate::region_counts(filtered).len(),
            Panel::Transport => aggregate::transport_counts(filtered).len(),
            Panel::RoutingCode => aggregate::routing_code_counts(filtered).len(),
            Panel::Histogram => aggregate::HISTOGRAM_LABELS.len(),
            Panel::Split => aggregate::confidence_split(filtered).len(),
        }
    }

    fn filtered_decisions(&self) -> Vec<Decision> {
        let state = self.state_rx.borrow().clone();
        self.filters.apply(&state.decisions)
    }

    fn step_selection(&mut self, delta: i64) {
        let filtered = self.filtered_decisions();
        let count = self.row_count(self.focus, &filtered);
        if count == 0 {
            return;
        }
        let idx = self.selection(self.focus) as i64 + delta;
        self.selections[self.focus.index()] = idx.clamp(0, count as i64 - 1) as usize;
    }

    /// Pull every panel's selection back into range. A tighter filter or a
    /// smaller reload can leave a stored index past the last row.
    fn clamp_selections(&mut self) {
        let filtered = self.filtered_decisions();
        for panel in Panel::ALL {
            let count = self.row_count(panel, &filtered);
            if self.selection(panel) >= count {
                self.selections[panel.index()] = count.saturating_sub(1);
            }
        }
    }

    fn apply_selection(&mut self) {
        let filtered = self.filtered_decisions();
        for (key, value) in selection_emission(self.focus, self.selection(self.focus), &filtered)
        {
            let _ = self.filters.set(key, &value);
        }
        self.clamp_selections();
    }

    fn remove_chip(&mut self, n: usize) {
        let active = self.filters.active();
        if let Some((key, _)) = active.get(n) {
            self.filters.remove(*key);
            self.clamp_selections();
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('r') => self.spawn_load(),
            KeyCode::Char('j') => {
                self.show_raw = !self.show_raw;
                self.raw_scroll = 0;
            }
            KeyCode::Char('c') => {
                self.filters.clear();
                self.clamp_selections();
            }
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.prev(),
            KeyCode::Up => {
                if self.show_raw {
                    self.raw_scroll = self.raw_scroll.saturating_sub(1);
                } else {
                    self.step_selection(-1);
                }
            }
            KeyCode::Down => {
                if self.show_raw {
                    self.raw_scroll = self.raw_scroll.saturating_add(1);
                } else {
                    self.step_selection(1);
                }
            }
            KeyCode::Enter => {
                if !self.show_raw && self.focus.selectable() {
                    self.apply_selection();
                }
            }
            KeyCode::Char(c @ '1'..='4') => {
                self.remove_chip((c as usize) - ('1' as usize));
            }
            _ => {}
        }
    }
}

/// Launch the dashboard over `source` with `filters` pre-applied.
pub async fn run_dash(source: Arc<dyn DecisionSource>, filters: Filters) -> Result<()> {
    let app = App::new(source, filters);
    app.spawn_load();
    run_tui(app).await
}

async fn run_tui(mut app: App) -> Result<()> {
    // RAII guard ensures terminal is restored even on panic/error
    let _guard = TerminalGuard::enter()?;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    loop {
        // Get latest state
        let state = app.state_rx.borrow().clone();

        // A reload can shrink the charts
        app.clamp_selections();

        // Draw
        terminal.draw(|frame| ui(frame, &app, &state))?;

        // Handle input (non-blocking)
        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
        {
            app.handle_key(key);
        }

        if app.should_quit {
            break;
        }

        // Wait for state change or timeout
        tokio::select! {
            _ = app.state_rx.changed() => {}
            _ = tokio::time::sleep(Duration::from_millis(250)) => {}
        }
    }

    // Guard's Drop will restore terminal
    Ok(())
}

// =============================================================================
// RENDERING
// =============================================================================

fn ui(frame: &mut Frame, app: &App, state: &DecisionsState) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(1), // Filter chips
            Constraint::Min(12),   // Charts / raw view
            Constraint::Length(3), // Footer
        ])
        .split(area);

    let filtered = app.filters.apply(&state.decisions);

    render_header(frame, chunks[0], app, state, filtered.len());
    render_chips(frame, chunks[1], app);

    if state.loading {
        render_loading(frame, chunks[2], app);
    } else if let Some(error) = &state.error {
        render_error(frame, chunks[2], error);
    } else if state.meta.is_none() {
        render_loading(frame, chunks[2], app);
    } else if app.show_raw {
        render_raw(frame, chunks[2], app, &filtered);
    } else {
        render_charts(frame, chunks[2], app, &filtered);
    }

    render_footer(frame, chunks[3]);
}

fn render_header(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    state: &DecisionsState,
    shown: usize,
) {
    let mut spans = vec![Span::styled(
        "Routing Decisions Dashboard",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];

    if let Some(meta) = &state.meta {
        spans.push(Span::raw("  |  Source: "));
        spans.push(Span::styled(
            meta.source.clone(),
            Style::default().fg(Color::Yellow),
        ));
        spans.push(Span::raw("  |  Count: "));
        spans.push(Span::styled(
            meta.count.to_string(),
            Style::default().fg(Color::Yellow),
        ));
        spans.push(Span::raw("  |  Showing: "));
        spans.push(Span::styled(
            shown.to_string(),
            Style::default().fg(Color::Green),
        ));
    } else {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            app.source.describe(),
            Style::default().fg(Color::Gray),
        ));
    }

    let header = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn render_chips(frame: &mut Frame, area: Rect, app: &App) {
    let active = app.filters.active();

    let line = if active.is_empty() {
        Line::from(Span::styled(
            " no filters active",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut spans = vec![Span::styled(" filters: ", Style::default().fg(Color::Gray))];
        for (i, (key, value)) in active.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw("  "));
            }
            spans.push(Span::styled(
                format!("[{}] {}: {}", i + 1, key.label(), value),
                Style::default().fg(Color::Black).bg(Color::Cyan),
            ));
        }
        Line::from(spans)
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn render_loading(frame: &mut Frame, area: Rect, app: &App) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Loading decisions...",
            Style::default().fg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("source: {}", app.source.describe()),
            Style::default().fg(Color::Gray),
        )),
    ];

    let block = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(block, area);
}

fn render_error(frame: &mut Frame, area: Rect, error: &str) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw("press "),
            Span::styled("r", Style::default().fg(Color::Yellow)),
            Span::raw(" to retry, "),
            Span::styled("q", Style::default().fg(Color::Yellow)),
            Span::raw(" to quit"),
        ]),
    ];

    let block = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(block, area);
}

fn render_raw(frame: &mut Frame, area: Rect, app: &App, filtered: &[Decision]) {
    let json = serde_json::to_string_pretty(filtered)
        .unwrap_or_else(|e| format!("serialization error: {}", e));

    let title = format!("Raw Decisions ({} shown)", filtered.len());
    let block = Paragraph::new(json)
        .scroll((app.raw_scroll, 0))
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(block, area);
}

fn render_charts(frame: &mut Frame, area: Rect, app: &App, filtered: &[Decision]) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(rows[0]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(rows[1]);

    render_category_panel(
        frame,
        top[0],
        app,
        Panel::Country,
        &aggregate::country_counts(filtered),
        10,
    );
    render_category_panel(
        frame,
        top[1],
        app,
        Panel::Region,
        &aggregate::region_counts(filtered),
        10,
    );
    render_transport_panel(frame, top[2], app, &aggregate::transport_counts(filtered));
    render_category_panel(
        frame,
        bottom[0],
        app,
        Panel::RoutingCode,
        &aggregate::routing_code_counts(filtered),
        16,
    );
    render_category_panel(
        frame,
        bottom[1],
        app,
        Panel::Histogram,
        &aggregate::confidence_histogram(filtered),
        11,
    );
    render_split_panel(frame, bottom[2], app, &aggregate::confidence_split(filtered));
}

fn panel_block(app: &App, panel: Panel) -> Block<'static> {
    let border_style = if app.focus == panel {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .title(panel.title())
        .borders(Borders::ALL)
        .border_style(border_style)
}

fn row_highlight(app: &App, panel: Panel, idx: usize) -> Style {
    if app.focus == panel && panel.selectable() && idx == app.selection(panel) {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    }
}

fn render_category_panel(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    panel: Panel,
    rows: &[CategoryCount],
    label_width: usize,
) {
    let no_data = rows.iter().all(|r| r.count == 0);
    let text: Vec<Line> = if no_data {
        vec![Line::from(Span::styled(
            "No data available",
            Style::default().fg(Color::Gray),
        ))]
    } else {
        let max = rows.iter().map(|r| r.count).max().unwrap_or(1).max(1);
        let bar_width = area.width.saturating_sub(label_width as u16 + 9);

        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                Line::from(vec![
                    Span::styled(
                        format!(
                            "{:<width$}",
                            truncate_label(&row.label, label_width),
                            width = label_width
                        ),
                        Style::default().fg(Color::White),
                    ),
                    Span::styled(
                        format!("{:>5} ", row.count),
                        Style::default().fg(Color::Yellow),
                    ),
                    Span::styled(
                        bar(row.count, max, bar_width),
                        Style::default().fg(Color::Cyan),
                    ),
                ])
                .style(row_highlight(app, panel, i))
            })
            .collect()
    };

    let offset = if no_data || !panel.selectable() {
        0
    } else {
        scroll_offset(app.selection(panel), area.height.saturating_sub(2))
    };
    let block = Paragraph::new(text)
        .scroll((offset, 0))
        .block(panel_block(app, panel));
    frame.render_widget(block, area);
}

fn render_transport_panel(frame: &mut Frame, area: Rect, app: &App, rows: &[TransportCount]) {
    let no_data = rows.iter().all(|r| r.primary == 0 && r.secondary == 0);
    let text: Vec<Line> = if no_data {
        vec![Line::from(Span::styled(
            "No data available",
            Style::default().fg(Color::Gray),
        ))]
    } else {
        let max = rows
            .iter()
            .map(|r| r.primary.max(r.secondary))
            .max()
            .unwrap_or(1)
            .max(1);
        let bar_width = area.width.saturating_sub(32) / 2;

        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                Line::from(vec![
                    Span::styled(
                        format!("{:<10}", truncate_label(&row.mode, 10)),
                        Style::default().fg(Color::White),
                    ),
                    Span::styled("P ", Style::default().fg(Color::Green)),
                    Span::styled(
                        format!("{:>4} ", row.primary),
                        Style::default().fg(Color::Yellow),
                    ),
                    Span::styled(
                        format!("{:<width$}", bar(row.primary, max, bar_width), width = bar_width as usize),
                        Style::default().fg(Color::Green),
                    ),
                    Span::styled(" S ", Style::default().fg(Color::Blue)),
                    Span::styled(
                        format!("{:>4} ", row.secondary),
                        Style::default().fg(Color::Yellow),
                    ),
                    Span::styled(
                        bar(row.secondary, max, bar_width),
                        Style::default().fg(Color::Blue),
                    ),
                ])
                .style(row_highlight(app, Panel::Transport, i))
            })
            .collect()
    };

    let offset = if no_data {
        0
    } else {
        scroll_offset(app.selection(Panel::Transport), area.height.saturating_sub(2))
    };
    let block = Paragraph::new(text)
        .scroll((offset, 0))
        .block(panel_block(app, Panel::Transport));
    frame.render_widget(block, area);
}

fn render_split_panel(frame: &mut Frame, area: Rect, app: &App, rows: &[BandCount]) {
    let no_data = rows.iter().all(|r| r.count == 0);
    let text: Vec<Line> = if no_data {
        vec![Line::from(Span::styled(
            "No data available",
            Style::default().fg(Color::Gray),
        ))]
    } else {
        let max = rows.iter().map(|r| r.count).max().unwrap_or(1).max(1);
        let bar_width = area.width.saturating_sub(29);

        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                let band_color = match row.band.as_str() {
                    "low" => Color::Red,
                    "medium" => Color::Yellow,
                    _ => Color::Green,
                };
                Line::from(vec![
                    Span::styled(
                        format!("{:<20}", row.band.chart_label()),
                        Style::default().fg(Color::White),
                    ),
                    Span::styled(
                        format!("{:>5} ", row.count),
                        Style::default().fg(Color::Yellow),
                    ),
                    Span::styled(
                        bar(row.count, max, bar_width),
                        Style::default().fg(band_color),
                    ),
                ])
                .style(row_highlight(app, Panel::Split, i))
            })
            .collect()
    };

    let offset = if no_data {
        0
    } else {
        scroll_offset(app.selection(Panel::Split), area.height.saturating_sub(2))
    };
    let block = Paragraph::new(text)
        .scroll((offset, 0))
        .block(panel_block(app, Panel::Split));
    frame.render_widget(block, area);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let hints = [
        ("Tab", "panel"),
        ("Up/Down", "row"),
        ("Enter", "filter"),
        ("1-4", "drop chip"),
        ("c", "clear"),
        ("r", "reload"),
        ("j", "raw"),
        ("q", "quit"),
    ];

    let mut spans = Vec::new();
    for (i, (key, action)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(format!(" {}", action)));
    }

    let footer = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}

/// Rows to scroll past so the row at `selected` stays inside a panel
/// `visible` rows tall. Zero until the selection walks off the bottom,
/// then the window follows it down.
fn scroll_offset(selected: usize, visible: u16) -> u16 {
    (selected as u16).saturating_add(1).saturating_sub(visible)
}

/// Scale `count` into a bar of at most `max_width` cells. Nonzero counts
/// always get at least one cell so small categories stay visible.
fn bar(count: u64, max_count: u64, max_width: u16) -> String {
    if count == 0 || max_count == 0 || max_width == 0 {
        return String::new();
    }
    let width = ((count * max_width as u64) / max_count).max(1);
    "█".repeat(width as usize)
}

/// Truncate string safely (handles UTF-8 multibyte chars).
fn truncate_label(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
