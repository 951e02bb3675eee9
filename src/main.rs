use std::collections::VecDeque;
use std::io;
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
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};

use pl_predictor::PredictError;
use pl_predictor::config::{self, DataPaths};
use pl_predictor::metrics::Prob3;
use pl_predictor::overview::team_overview;
use pl_predictor::predictor::Predictor;
use pl_predictor::records::Outcome;
use pl_predictor::team_names::TeamNameResolver;

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Home,
    Away,
}

impl Side {
    fn label(self) -> &'static str {
        match self {
            Side::Home => "Home",
            Side::Away => "Away",
        }
    }
}

/// Owned copy of a prediction so the view does not borrow the predictor.
struct PredictionView {
    home: String,
    away: String,
    probabilities: Prob3,
    label: Outcome,
    insights: Vec<String>,
}

struct App {
    predictor: Predictor,
    resolver: TeamNameResolver,
    teams: Vec<String>,
    focus: Side,
    home_idx: usize,
    away_idx: usize,
    search: Option<String>,
    prediction: Option<PredictionView>,
    logs: VecDeque<String>,
    show_help: bool,
    should_quit: bool,
}

impl App {
    fn new(predictor: Predictor) -> Self {
        let resolver = TeamNameResolver::from_table(predictor.table());
        let teams = predictor
            .table()
            .team_names()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let mut app = Self {
            away_idx: usize::from(teams.len() > 1),
            predictor,
            resolver,
            teams,
            focus: Side::Home,
            home_idx: 0,
            search: None,
            prediction: None,
            logs: VecDeque::new(),
            show_help: false,
            should_quit: false,
        };
        app.push_log(format!("[INFO] Loaded {} teams", app.teams.len()));
        app
    }

    fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    fn selected_mut(&mut self) -> &mut usize {
        match self.focus {
            Side::Home => &mut self.home_idx,
            Side::Away => &mut self.away_idx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if let Some(query) = self.search.as_mut() {
            match key.code {
                KeyCode::Esc => self.search = None,
                KeyCode::Enter => {
                    let query = std::mem::take(query);
                    self.search = None;
                    self.jump_to(&query);
                }
                KeyCode::Backspace => {
                    query.pop();
                }
                KeyCode::Char(c) => query.push(c),
                _ => {}
            }
            return;
        }

        let total = self.teams.len();
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = !self.show_help,
            KeyCode::Esc => self.show_help = false,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Left | KeyCode::Right => {
                self.focus = match self.focus {
                    Side::Home => Side::Away,
                    Side::Away => Side::Home,
                };
            }
            KeyCode::Char('j') | KeyCode::Down => {
                let idx = self.selected_mut();
                if *idx + 1 < total {
                    *idx += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                let idx = self.selected_mut();
                *idx = idx.saturating_sub(1);
            }
            KeyCode::Char('/') => self.search = Some(String::new()),
            KeyCode::Char('s') => std::mem::swap(&mut self.home_idx, &mut self.away_idx),
            KeyCode::Char('p') | KeyCode::Enter => self.run_prediction(),
            _ => {}
        }
    }

    /// Moves the focused list to whatever the resolver makes of `query`.
    fn jump_to(&mut self, query: &str) {
        let Some(name) = self.resolver.resolve(query).map(str::to_string) else {
            self.push_log(format!("[WARN] Could not match team {query:?}"));
            return;
        };
        if let Some(pos) = self.teams.iter().position(|t| *t == name) {
            *self.selected_mut() = pos;
            self.push_log(format!("[INFO] {} set to {name}", self.focus.label()));
        }
    }

    fn run_prediction(&mut self) {
        let (Some(home), Some(away)) = (
            self.teams.get(self.home_idx).cloned(),
            self.teams.get(self.away_idx).cloned(),
        ) else {
            self.push_log("[WARN] No teams loaded");
            return;
        };
        if home == away {
            self.push_log("[WARN] Pick two different teams");
            return;
        }

        let outcome = self
            .predictor
            .predict(&home, &away)
            .map(|p| (p.probabilities, p.label, p.insights));
        match outcome {
            Ok((probabilities, label, insights)) => {
                self.push_log(format!(
                    "[INFO] {home} vs {away}: {}",
                    label.display_name()
                ));
                self.prediction = Some(PredictionView {
                    home,
                    away,
                    probabilities,
                    label,
                    insights,
                });
            }
            Err(PredictError::UnknownTeam(name)) => {
                self.prediction = None;
                self.push_log(format!("[WARN] Could not match team {name:?}"));
            }
            Err(err) => {
                self.prediction = None;
                self.push_log(format!("[ERROR] {err}"));
            }
        }
    }
}

fn main() -> Result<()> {
    config::load_dotenv();

    // Artifacts are checked before the terminal is taken over so failures print plainly.
    let paths = DataPaths::from_env();
    let predictor = Predictor::load(&paths).with_context(|| {
        format!(
            "load {} and model artifacts; run build_team_stats and train_team_model first",
            paths.team_stats.display()
        )
    })?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(predictor);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
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

    let header = Paragraph::new("Premier League Match Predictor")
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(30),
            Constraint::Percentage(40),
        ])
        .split(chunks[1]);
    render_side(frame, body[0], app, Side::Home);
    render_side(frame, body[1], app, Side::Away);
    render_prediction(frame, body[2], app.prediction.as_ref());

    let console = Paragraph::new(console_text(app))
        .block(Block::default().title("Log").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(app)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.show_help {
        render_help_overlay(frame, frame.size());
    }
}

fn render_side(frame: &mut Frame, area: Rect, app: &App, side: Side) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(11)])
        .split(area);

    let selected = match side {
        Side::Home => app.home_idx,
        Side::Away => app.away_idx,
    };
    let focused = app.focus == side;
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let items = app
        .teams
        .iter()
        .map(|t| ListItem::new(t.as_str()))
        .collect::<Vec<_>>();
    let list = List::new(items)
        .block(
            Block::default()
                .title(format!("{} Team", side.label()))
                .borders(Borders::ALL)
                .border_style(border),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(selected));
    frame.render_stateful_widget(list, rows[0], &mut state);

    let overview = app
        .teams
        .get(selected)
        .and_then(|name| app.predictor.table().get(name))
        .map(|row| {
            team_overview(row)
                .into_iter()
                .map(|(k, v)| format!("{k:<14}{v}"))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();
    let overview = Paragraph::new(overview)
        .block(Block::default().title("Overview").borders(Borders::ALL));
    frame.render_widget(overview, rows[1]);
}

fn render_prediction(frame: &mut Frame, area: Rect, prediction: Option<&PredictionView>) {
    let block = Block::default().title("Prediction").borders(Borders::ALL);
    let Some(p) = prediction else {
        let hint = Paragraph::new("Pick both teams and press Enter")
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(hint, area);
        return;
    };

    let inner = block.inner(area);
    frame.render_widget(block, area);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(6),
            Constraint::Min(1),
        ])
        .split(inner);

    let title = Paragraph::new(vec![
        Line::from(format!("{} vs {}", p.home, p.away)),
        Line::from(Span::styled(
            format!("Predicted: {}", p.label.display_name()),
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ]);
    frame.render_widget(title, rows[0]);
    frame.render_widget(probability_chart(&p.probabilities), rows[1]);

    let insights = p
        .insights
        .iter()
        .map(|line| format!("- {line}"))
        .collect::<Vec<_>>()
        .join("\n");
    let insights = Paragraph::new(insights)
        .wrap(Wrap { trim: true })
        .block(Block::default().title("Insights").borders(Borders::TOP));
    frame.render_widget(insights, rows[2]);
}

fn probability_chart(probs: &Prob3) -> BarChart<'static> {
    let bars = Outcome::ORDERED
        .iter()
        .map(|&o| {
            let pct = probs.get(o) * 100.0;
            Bar::default()
                .value(pct.round() as u64)
                .label(Line::from(o.display_name()))
                .text_value(format!("{pct:.1}%"))
                .style(Style::default().fg(outcome_color(o)))
        })
        .collect::<Vec<_>>();

    BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(1)
        .max(100)
}

fn outcome_color(outcome: Outcome) -> Color {
    match outcome {
        Outcome::HomeWin => Color::Green,
        Outcome::Draw => Color::Yellow,
        Outcome::AwayWin => Color::Red,
    }
}

fn console_text(app: &App) -> String {
    let start = app.logs.len().saturating_sub(3);
    app.logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn footer_text(app: &App) -> String {
    match &app.search {
        Some(query) => format!("Find {} team: {query}_   (Enter accept, Esc cancel)", app.focus.label()),
        None => "Tab switch side | j/k move | / find | s swap | Enter predict | ? help | q quit"
            .to_string(),
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Premier League Match Predictor - Help",
        "",
        "  Tab / ←/→    Switch home/away list",
        "  j/k or ↑/↓   Move selection",
        "  /            Find team by name or code (ARS, MUN...)",
        "  s            Swap home and away",
        "  Enter / p    Predict",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text).block(Block::default().title("Help").borders(Borders::ALL));
    frame.render_widget(help, popup_area);
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
