use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tracing_subscriber::EnvFilter;

use epl_predictor::config::Settings;
use epl_predictor::matchday::{Clock, SystemClock};
use epl_predictor::outcome::{
    Confidence, Side, classify, confidence_label, format_kickoff, format_percent, is_favourite, outcome_label,
};
use epl_predictor::predict_api::HttpPredictionApi;
use epl_predictor::provider::spawn_provider;
use epl_predictor::state::{
    AppState, Delta, MatchPrediction, ProviderCommand, Screen, TeamSide, apply_delta,
};
use epl_predictor::store::FileStore;

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<ProviderCommand>,
}

impl App {
    fn new(cmd_tx: mpsc::Sender<ProviderCommand>) -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.confirm_clear {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.state.confirm_clear = false;
                    self.send(ProviderCommand::ClearCache, "Cache clear");
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.state.confirm_clear = false;
                    self.state.push_log("[INFO] Cache clear cancelled");
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.state.screen = Screen::Matchday,
            KeyCode::Char('2') => self.state.screen = Screen::Custom,
            KeyCode::Tab => self.state.toggle_screen(),
            KeyCode::Char('C') => self.state.confirm_clear = true,
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ => match self.state.screen {
                Screen::Matchday => self.on_matchday_key(key),
                Screen::Custom => self.on_custom_key(key),
            },
        }
    }

    fn on_matchday_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('l') => self.load_matchday(false),
            KeyCode::Char('r') => self.load_matchday(true),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            _ => {}
        }
    }

    fn on_custom_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Char('h') | KeyCode::Char('a') => {
                self.state.toggle_focus()
            }
            KeyCode::Down | KeyCode::Char('j') => self.cycle_team(1),
            KeyCode::Up | KeyCode::Char('k') => self.cycle_team(-1),
            KeyCode::Char('s') => self.send(ProviderCommand::Swap, "Swap"),
            KeyCode::Char('p') | KeyCode::Enter => {
                if self.state.custom_loading {
                    return;
                }
                self.send(ProviderCommand::Predict, "Prediction");
            }
            _ => {}
        }
    }

    fn load_matchday(&mut self, force_refresh: bool) {
        if self.state.matchday_loading {
            self.state.push_log("[INFO] Matchday fetch already running");
            return;
        }
        self.send(ProviderCommand::LoadMatchday { force_refresh }, "Matchday");
    }

    fn cycle_team(&mut self, step: isize) {
        let Some(team) = self.state.cycle_team(step) else {
            self.state.push_log("[INFO] No teams to choose from");
            return;
        };
        let cmd = match self.state.custom_focus {
            TeamSide::Home => ProviderCommand::SelectHome(team),
            TeamSide::Away => ProviderCommand::SelectAway(team),
        };
        self.send(cmd, "Team selection");
    }

    fn send(&mut self, cmd: ProviderCommand, what: &str) {
        if self.cmd_tx.send(cmd).is_err() {
            self.state.push_log(format!("[WARN] {what} request failed"));
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let settings = Settings::from_env();
    init_logging(&settings);
    tracing::info!(api = %settings.api_url, cache = %settings.cache_dir.display(), "starting");

    let api = HttpPredictionApi::from_settings(&settings).context("prediction api setup")?;
    let store = FileStore::new(settings.cache_dir.clone());

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(store, api, SystemClock, tx, cmd_rx);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(cmd_tx);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn init_logging(settings: &Settings) {
    if let Some(dir) = settings.log_file.parent() {
        let _ = fs::create_dir_all(dir);
    }
    let file = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.log_file)
    {
        Ok(file) => file,
        Err(err) => {
            eprintln!(
                "Warning: could not open log file {} ({err}), logging disabled",
                settings.log_file.display()
            );
            return;
        }
    };
    let filter = EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init();
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Matchday => render_matchday(frame, chunks[1], &app.state),
        Screen::Custom => render_custom(frame, chunks[1], &app.state),
    }

    render_console(frame, chunks[2], &app.state);

    let footer = Paragraph::new(footer_text(&app.state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
    if app.state.confirm_clear {
        render_confirm_clear(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let view = match state.screen {
        Screen::Matchday => "Current Matchday",
        Screen::Custom => "Custom Prediction",
    };
    format!(" EPL PREDICTOR | ML-Powered Match Predictions | {view}")
}

fn footer_text(state: &AppState) -> String {
    match state.screen {
        Screen::Matchday => {
            "1/2/Tab View | l Load | r Refresh | j/k Scroll | C Clear cache | ? Help | q Quit"
                .to_string()
        }
        Screen::Custom => {
            "1/2/Tab View | ←/→ Side | ↑/↓ Team | s Swap | p/Enter Predict | C Clear cache | ? Help | q Quit"
                .to_string()
        }
    }
}

fn render_matchday(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(area);

    let mut status = vec![Line::from(Span::styled(
        "Current Matchday Predictions",
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    if let Some(label) = state.updated_label(SystemClock.now_ms()) {
        status.push(Line::from(Span::styled(
            label,
            Style::default().fg(Color::DarkGray),
        )));
    }
    frame.render_widget(Paragraph::new(status), sections[0]);

    let body = sections[1];
    if let Some(err) = &state.matchday_error {
        let msg = Paragraph::new(err.as_str()).style(Style::default().fg(Color::Red));
        frame.render_widget(msg, Rect { height: 1, ..body });
    }
    let list_area = Rect {
        y: body.y + 1,
        height: body.height.saturating_sub(1),
        ..body
    };

    if state.matchday_loading {
        let text = "Fetching current matchday predictions...\nThis may take 2-3 minutes due to API rate limits";
        frame.render_widget(
            Paragraph::new(text).style(Style::default().fg(Color::Yellow)),
            list_area,
        );
        return;
    }

    if state.matchday.is_empty() {
        if state.matchday_error.is_none() {
            let empty = Paragraph::new("Press l to load current matchday predictions")
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(empty, list_area);
        }
        return;
    }

    const CARD_HEIGHT: u16 = 6;
    if list_area.height < CARD_HEIGHT {
        let small = Paragraph::new("Prediction list needs more height")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(small, list_area);
        return;
    }

    let visible = (list_area.height / CARD_HEIGHT) as usize;
    let (start, end) = visible_range(state.matchday_selected, state.matchday.len(), visible);
    for (i, idx) in (start..end).enumerate() {
        let card_area = Rect {
            x: list_area.x,
            y: list_area.y + (i as u16) * CARD_HEIGHT,
            width: list_area.width,
            height: CARD_HEIGHT,
        };
        render_prediction_card(
            frame,
            card_area,
            &state.matchday[idx],
            idx == state.matchday_selected,
        );
    }
}

fn render_custom(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(2),
            Constraint::Min(1),
        ])
        .split(area);

    let selectors = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Percentage(10),
            Constraint::Percentage(45),
        ])
        .split(sections[0]);

    render_team_selector(
        frame,
        selectors[0],
        "Home Team",
        state.custom.home_team.as_deref(),
        "Select home team...",
        state.custom_focus == TeamSide::Home,
    );
    let swap = Paragraph::new("\n  ⇄ (s)").style(Style::default().fg(Color::DarkGray));
    frame.render_widget(swap, selectors[1]);
    render_team_selector(
        frame,
        selectors[2],
        "Away Team",
        state.custom.away_team.as_deref(),
        "Select away team...",
        state.custom_focus == TeamSide::Away,
    );

    let status = if state.custom_loading {
        Paragraph::new("Fetching prediction...").style(Style::default().fg(Color::Yellow))
    } else if let Some(err) = &state.custom_error {
        Paragraph::new(err.as_str()).style(Style::default().fg(Color::Red))
    } else if state.teams.is_empty() {
        Paragraph::new("Team list unavailable").style(Style::default().fg(Color::DarkGray))
    } else {
        Paragraph::new("p / Enter: Get Prediction").style(Style::default().fg(Color::DarkGray))
    };
    frame.render_widget(status.wrap(Wrap { trim: true }), sections[1]);

    if state.custom_loading {
        return;
    }
    if let Some(prediction) = &state.custom.prediction {
        let card_area = Rect {
            height: sections[2].height.min(6),
            ..sections[2]
        };
        render_prediction_card(frame, card_area, prediction, false);
    }
}

fn render_team_selector(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    team: Option<&str>,
    placeholder: &str,
    focused: bool,
) {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let text = match team {
        Some(team) => Span::raw(team.to_string()),
        None => Span::styled(placeholder.to_string(), Style::default().fg(Color::DarkGray)),
    };
    let widget = Paragraph::new(Line::from(text)).block(
        Block::default()
            .title(title.to_string())
            .borders(Borders::ALL)
            .border_style(border_style),
    );
    frame.render_widget(widget, area);
}

fn render_prediction_card(frame: &mut Frame, area: Rect, prediction: &MatchPrediction, selected: bool) {
    let probs = &prediction.probabilities;
    let class = classify(probs);

    let mut title = format!("{} vs {}", prediction.home_team, prediction.away_team);
    if let Some(date) = prediction.date.as_deref() {
        title.push_str(&format!("  ·  {}", format_kickoff(date)));
    }

    let bar_width = area.width.saturating_sub(24) as usize;
    let lines = vec![
        prob_line("HOME WIN", probs.home, is_favourite(probs, Side::Home), Color::Green, bar_width),
        prob_line("DRAW", probs.draw, is_favourite(probs, Side::Draw), Color::Yellow, bar_width),
        prob_line("AWAY WIN", probs.away, is_favourite(probs, Side::Away), Color::Red, bar_width),
        Line::from(vec![
            Span::raw("Prediction: "),
            Span::styled(
                outcome_label(class.outcome),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                format!("{} Confidence", confidence_label(class.confidence)),
                confidence_style(class.confidence),
            ),
        ]),
    ];

    let border_style = if selected {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let card = Paragraph::new(lines).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style),
    );
    frame.render_widget(card, area);
}

fn prob_line(label: &str, p: f64, favourite: bool, color: Color, width: usize) -> Line<'static> {
    let filled = ((p.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    let mut bar_style = Style::default().fg(color);
    if favourite {
        bar_style = bar_style.add_modifier(Modifier::BOLD);
    } else {
        bar_style = bar_style.add_modifier(Modifier::DIM);
    }
    Line::from(vec![
        Span::raw(format!("{label:<9} {:>6} ", format_percent(p))),
        Span::styled("█".repeat(filled), bar_style),
        Span::styled(
            "░".repeat(width - filled),
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

fn confidence_style(confidence: Confidence) -> Style {
    match confidence {
        Confidence::High => Style::default().fg(Color::Green),
        Confidence::Medium => Style::default().fg(Color::Yellow),
        Confidence::Low => Style::default().fg(Color::DarkGray),
    }
}

fn render_console(frame: &mut Frame, area: Rect, state: &AppState) {
    let lines = area.height.saturating_sub(2) as usize;
    let skip = state.logs.len().saturating_sub(lines);
    let text = state
        .logs
        .iter()
        .skip(skip)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");
    let console = Paragraph::new(text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "EPL Predictor - Help",
        "",
        "Global:",
        "  1 / 2 / Tab  Switch view",
        "  C            Clear cache",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Current Matchday:",
        "  l            Load (cached if fresh)",
        "  r            Refresh from API",
        "  j/k or ↑/↓   Scroll",
        "",
        "Custom Prediction:",
        "  ←/→          Focus home / away",
        "  ↑/↓          Change team",
        "  s            Swap teams",
        "  p / Enter    Get prediction",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn render_confirm_clear(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(50, 20, area);
    frame.render_widget(Clear, popup_area);
    let text = "Clear all cached predictions?\nThis removes stored matchday and custom predictions.\n\ny: clear   n: cancel";
    let confirm = Paragraph::new(text)
        .block(Block::default().title("Clear Cache").borders(Borders::ALL))
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(confirm, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
