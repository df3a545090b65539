//! Terminal frontend.
//!
//! Draws the controller's page with ratatui: the live readings and status dot
//! on top, the history table or chart in the middle, and the control bar at
//! the bottom. Keys are translated into `UserAction`s on a separate task.

use crate::chart::{LineChart, Rgb, HUMIDITY, HUMIDITY_COLOR, TEMPERATURE, TEMPERATURE_COLOR};
use crate::controller::{DashboardController, FLASH_CLASS};
use crate::page::{ElementId, Page, Size};
use crate::scheduler::{Frontend, UserAction};
use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Row, Table},
    Frame, Terminal,
};
use std::io::{self, Stdout};
use tokio::sync::mpsc;
use tracing::debug;

pub struct TerminalFrontend {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    presets: Vec<u32>,
    restored: bool,
}

impl TerminalFrontend {
    /// Switches the terminal to raw mode on the alternate screen.
    pub fn enter(presets: Vec<u32>) -> Result<Self> {
        enable_raw_mode().context("enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("create terminal")?;
        terminal.clear().ok();

        Ok(Self {
            terminal,
            presets,
            restored: false,
        })
    }

    pub fn restore(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode().context("disable raw mode")?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen).context("leave alternate screen")?;
        self.terminal.show_cursor().ok();
        Ok(())
    }
}

impl Drop for TerminalFrontend {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

impl Frontend for TerminalFrontend {
    fn draw(&mut self, controller: &mut DashboardController) -> Result<()> {
        // Lay out first so the controller knows the graph container's size
        // before the next graph render.
        let size = self.terminal.size()?;
        let [_, body, _] = split(Rect::new(0, 0, size.width, size.height));
        controller.page_mut().set_graph_container(Size {
            width: body.width as u32,
            height: body.height as u32,
        });

        let presets = &self.presets;
        self.terminal.draw(|frame| draw(frame, controller, presets))?;
        Ok(())
    }
}

fn split(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(5), Constraint::Length(3)])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

fn draw(frame: &mut Frame, controller: &DashboardController, presets: &[u32]) {
    let [header, body, controls] = split(frame.area());
    let page = controller.page();

    draw_readings(frame, header, controller);

    if page.is_shown(ElementId::TableContainer) {
        draw_table(frame, body, page, controller.view().current_history_hours);
    } else if page.is_shown(ElementId::GraphContainer) {
        match controller.chart() {
            Some(chart) => draw_chart(frame, body, chart, controller.view().current_history_hours),
            None => draw_placeholder(frame, body, "Brak danych"),
        }
    } else {
        draw_placeholder(frame, body, "Wybierz okres, aby zobaczyć dane historyczne");
    }

    draw_controls(frame, controls, page, presets);
}

fn draw_readings(frame: &mut Frame, area: Rect, controller: &DashboardController) {
    let page = controller.page();
    let dot_color = if page.has_class(ElementId::StatusDot, FLASH_CLASS) {
        Color::Green
    } else {
        Color::DarkGray
    };
    let updated = controller
        .last_update()
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());

    let value = Style::default().add_modifier(Modifier::BOLD);
    let lines = vec![
        Line::from(vec![
            Span::styled("● ", Style::default().fg(dot_color)),
            Span::styled(format!("Ostatnia aktualizacja: {}", updated), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(vec![
            Span::raw("Temperatura: "),
            Span::styled(page.text(ElementId::Temp).to_string(), value.fg(color(TEMPERATURE_COLOR))),
        ]),
        Line::from(vec![
            Span::raw("Wilgotność:  "),
            Span::styled(page.text(ElementId::Hum).to_string(), value.fg(color(HUMIDITY_COLOR))),
        ]),
    ];

    let block = Block::default().borders(Borders::ALL).title(" Odczyty na żywo ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_table(frame: &mut Frame, area: Rect, page: &Page, hours: u32) {
    let header = Row::new(vec!["Data i godzina", "Temperatura", "Wilgotność"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = page.table_rows().iter().map(|r| {
        Row::new(vec![r.datetime.clone(), r.temperature.clone(), r.humidity.clone()])
    });

    let table = Table::new(
        rows,
        [Constraint::Length(21), Constraint::Length(13), Constraint::Length(12)],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Historia ({}h) ", hours)),
    );
    frame.render_widget(table, area);
}

fn color(Rgb(r, g, b): Rgb) -> Color {
    Color::Rgb(r, g, b)
}

fn draw_chart(frame: &mut Frame, area: Rect, chart: &LineChart, hours: u32) {
    let temperature = chart.points(TEMPERATURE);
    let humidity = chart.points(HUMIDITY);

    let datasets = vec![
        Dataset::default()
            .name(chart.datasets[TEMPERATURE].label)
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(color(chart.datasets[TEMPERATURE].color)))
            .data(&temperature),
        Dataset::default()
            .name(chart.datasets[HUMIDITY].label)
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(color(chart.datasets[HUMIDITY].color)))
            .data(&humidity),
    ];

    let x_labels: Vec<Span> = match chart.labels.as_slice() {
        [] => Vec::new(),
        [only] => vec![Span::from(only.clone())],
        labels => vec![
            Span::from(labels[0].clone()),
            Span::from(labels[labels.len() / 2].clone()),
            Span::from(labels[labels.len() - 1].clone()),
        ],
    };

    let [y_min, y_max] = chart.y_bounds();
    let axis_style = Style::default().fg(Color::DarkGray);
    let widget = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Historia ({}h) ", hours)),
        )
        .x_axis(Axis::default().style(axis_style).bounds(chart.x_bounds()).labels(x_labels))
        .y_axis(
            Axis::default()
                .style(axis_style)
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::from(format!("{:.0}", y_min)),
                    Span::from(format!("{:.0}", (y_min + y_max) / 2.0)),
                    Span::from(format!("{:.0}", y_max)),
                ]),
        );
    frame.render_widget(widget, area);
}

fn draw_placeholder(frame: &mut Frame, area: Rect, text: &str) {
    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL).title(" Historia "));
    frame.render_widget(paragraph, area);
}

fn draw_controls(frame: &mut Frame, area: Rect, page: &Page, presets: &[u32]) {
    let key = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let mut spans = Vec::new();

    for (i, hours) in presets.iter().enumerate().take(9) {
        spans.push(Span::styled(format!("[{}]", i + 1), key));
        spans.push(Span::raw(format!(" {}h  ", hours)));
    }
    if page.is_shown(ElementId::DataControls) {
        spans.push(Span::styled("[g]", key));
        spans.push(Span::raw(format!(" {}  ", page.text(ElementId::ShowGraph))));
        spans.push(Span::styled("[h]", key));
        spans.push(Span::raw(format!(" {}  ", page.text(ElementId::HideData))));
    }
    spans.push(Span::styled("[q]", key));
    spans.push(Span::raw(" Wyjście"));

    let block = Block::default().borders(Borders::ALL);
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

/// Maps a key press to an action. Digits pick the n-th period preset.
pub fn action_for_key(code: KeyCode, modifiers: KeyModifiers, presets: &[u32]) -> Option<UserAction> {
    match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(UserAction::Quit),
        KeyCode::Char('q') | KeyCode::Esc => Some(UserAction::Quit),
        KeyCode::Char('g') | KeyCode::Tab => Some(UserAction::ToggleView),
        KeyCode::Char('h') => Some(UserAction::HideHistory),
        KeyCode::Char(c @ '1'..='9') => {
            let index = c.to_digit(10)? as usize - 1;
            presets.get(index).copied().map(UserAction::ShowHistory)
        }
        _ => None,
    }
}

/// Reads terminal events until the receiver goes away or the user quits.
pub fn spawn_input(tx: mpsc::UnboundedSender<UserAction>, presets: Vec<u32>) {
    tokio::spawn(async move {
        let mut events = EventStream::new();
        while let Some(event) = events.next().await {
            let Ok(Event::Key(key)) = event else { continue };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(action) = action_for_key(key.code, key.modifiers, &presets) {
                debug!(?action, "Key press");
                if tx.send(action).is_err() || action == UserAction::Quit {
                    break;
                }
            }
        }
    });
}
