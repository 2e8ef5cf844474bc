//! Terminal dashboard for the bridge.
//!
//! Consumes bridge events, renders live speed/RPM, and lets the user switch
//! serial ports, launch the telemetry server, and flip the persisted
//! toggles.

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};
use tracing::warn;

use speedlink_common::{BridgeEvent, ConnectionState, Settings};

use crate::bridge::{BridgeHandle, BridgeReceiver};
use crate::device::list_ports;
use crate::launcher;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Dashboard state and data.
struct Dashboard {
    /// Serial link state as last reported by the worker.
    link: ConnectionState,
    /// Latest speed reading.
    speed_kmh: i32,
    /// Latest RPM reading.
    rpm: u32,
    /// When the last sample arrived.
    last_sample: Option<Instant>,
    /// Most recent error, shown until the next one replaces it.
    last_error: Option<String>,
    /// Enumerated serial ports.
    ports: Vec<String>,
    /// Index into `ports` of the active port.
    selected_port: usize,
    /// Persisted settings, rewritten on each toggle.
    settings: Settings,
    /// Autostart entry present?
    autostart: bool,
    /// Should quit?
    should_quit: bool,
}

/// What the input handler wants done outside the dashboard itself.
enum Action {
    None,
    SetPort(String),
}

impl Dashboard {
    fn new(settings: Settings, ports: Vec<String>, active_port: Option<&str>) -> Self {
        let selected_port = active_port
            .and_then(|p| ports.iter().position(|candidate| candidate.as_str() == p))
            .unwrap_or(0);
        Self {
            link: ConnectionState::Disconnected,
            speed_kmh: 0,
            rpm: 0,
            last_sample: None,
            last_error: None,
            ports,
            selected_port,
            settings,
            autostart: crate::autostart::is_enabled(),
            should_quit: false,
        }
    }

    /// Apply one bridge event.
    fn apply(&mut self, event: BridgeEvent) {
        match event {
            BridgeEvent::Link(state) => self.link = state,
            BridgeEvent::Sample(sample) => {
                self.speed_kmh = sample.speed_kmh;
                self.rpm = sample.rpm;
                self.last_sample = Some(Instant::now());
            }
            BridgeEvent::Error(msg) => self.last_error = Some(msg),
        }
    }

    /// Handle keyboard input. Settings toggles persist immediately.
    fn handle_key(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Left | KeyCode::Char('h') => return self.cycle_port(-1),
            KeyCode::Right | KeyCode::Char('l') => return self.cycle_port(1),
            KeyCode::Char('r') => self.refresh_ports(),
            KeyCode::Char('t') => {
                if let Err(e) = launcher::launch(&self.settings) {
                    self.last_error = Some(e.to_string());
                }
            }
            KeyCode::Char('a') => {
                self.settings.auto_launch_telemetry = !self.settings.auto_launch_telemetry;
                self.persist_settings();
            }
            KeyCode::Char('m') => {
                self.settings.minimize_to_tray = !self.settings.minimize_to_tray;
                self.persist_settings();
            }
            KeyCode::Char('s') => match crate::autostart::set_enabled(!self.autostart) {
                Ok(enabled) => self.autostart = enabled,
                Err(e) => self.last_error = Some(format!("Autostart: {}", e)),
            },
            _ => {}
        }
        Action::None
    }

    fn cycle_port(&mut self, step: isize) -> Action {
        if self.ports.is_empty() {
            return Action::None;
        }
        let len = self.ports.len() as isize;
        let next = (self.selected_port as isize + step).rem_euclid(len) as usize;
        if next == self.selected_port {
            return Action::None;
        }
        self.selected_port = next;
        Action::SetPort(self.ports[next].clone())
    }

    fn refresh_ports(&mut self) {
        let active = self.ports.get(self.selected_port).cloned();
        match list_ports() {
            Ok(ports) => {
                self.selected_port = active
                    .and_then(|p| ports.iter().position(|candidate| *candidate == p))
                    .unwrap_or(0);
                self.ports = ports;
            }
            Err(e) => self.last_error = Some(e.to_string()),
        }
    }

    fn persist_settings(&mut self) {
        if let Err(e) = self.settings.save() {
            warn!("Failed to save settings: {}", e);
            self.last_error = Some(format!("Settings: {}", e));
        }
    }
}

/// Draw the dashboard UI.
fn draw(f: &mut Frame, dashboard: &Dashboard) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Link status
            Constraint::Length(5), // Speed
            Constraint::Length(5), // RPM
            Constraint::Min(5),    // Ports + settings
            Constraint::Length(3), // Footer
        ])
        .split(f.size());

    draw_header(f, chunks[0]);
    draw_link(f, chunks[1], dashboard);
    draw_speed(f, chunks[2], dashboard);
    draw_rpm(f, chunks[3], dashboard);
    draw_details(f, chunks[4], dashboard);
    draw_footer(f, chunks[5]);
}

fn draw_header(f: &mut Frame, area: Rect) {
    let now = chrono::Local::now();
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "  Speedlink ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("v{}", VERSION), Style::default().fg(Color::Gray)),
        Span::raw("  |  "),
        Span::styled(
            now.format("%Y-%m-%d %H:%M:%S").to_string(),
            Style::default().fg(Color::Gray),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    )
    .alignment(Alignment::Left);

    f.render_widget(header, area);
}

fn draw_link(f: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let (text, color) = match dashboard.link {
        ConnectionState::Connected => ("Connected", Color::Green),
        ConnectionState::Disconnected => ("Disconnected", Color::Red),
    };
    let status = Paragraph::new(Span::styled(
        text,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
    .block(Block::default().borders(Borders::ALL).title(" Serial Link "))
    .alignment(Alignment::Center);

    f.render_widget(status, area);
}

fn draw_speed(f: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let speed = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("{} km/h", dashboard.speed_kmh),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue))
            .title(" Speed "),
    )
    .alignment(Alignment::Center);

    f.render_widget(speed, area);
}

fn draw_rpm(f: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let rpm = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("{} RPM", dashboard.rpm),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue))
            .title(" Engine "),
    )
    .alignment(Alignment::Center);

    f.render_widget(rpm, area);
}

fn draw_details(f: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let mut lines = vec![Line::from(Span::styled(
        "Ports",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))];

    if dashboard.ports.is_empty() {
        lines.push(Line::from(Span::styled(
            "  none detected (press r to refresh)",
            Style::default().fg(Color::Gray),
        )));
    } else {
        for (i, port) in dashboard.ports.iter().enumerate() {
            let style = if i == dashboard.selected_port {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            let marker = if i == dashboard.selected_port { "> " } else { "  " };
            lines.push(Line::from(Span::styled(format!("{}{}", marker, port), style)));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Settings",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )));
    let flag = |on: bool| if on { "on" } else { "off" };
    lines.push(Line::from(format!(
        "  auto-launch telemetry: {}",
        flag(dashboard.settings.auto_launch_telemetry)
    )));
    lines.push(Line::from(format!(
        "  minimize to tray:      {}",
        flag(dashboard.settings.minimize_to_tray)
    )));
    lines.push(Line::from(format!("  start at login:        {}", flag(dashboard.autostart))));
    let telemetry_path = if dashboard.settings.telemetry_path.is_empty() {
        "(not set)"
    } else {
        dashboard.settings.telemetry_path.as_str()
    };
    lines.push(Line::from(format!("  telemetry server:      {}", telemetry_path)));

    lines.push(Line::from(""));
    let freshness = match dashboard.last_sample {
        Some(at) => format!("  last sample: {:.1}s ago", at.elapsed().as_secs_f64()),
        None => "  last sample: none yet".to_string(),
    };
    lines.push(Line::from(Span::styled(
        freshness,
        Style::default().fg(Color::Gray),
    )));

    if let Some(err) = &dashboard.last_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("! {}", err),
            Style::default().fg(Color::Red),
        )));
    }

    let details = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Bridge "))
        .wrap(Wrap { trim: true });

    f.render_widget(details, area);
}

fn draw_footer(f: &mut Frame, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Black).bg(Color::Gray));
    let footer = Paragraph::new(Line::from(vec![
        key(" q "),
        Span::raw(" Quit  "),
        key(" </> "),
        Span::raw(" Port  "),
        key(" r "),
        Span::raw(" Rescan  "),
        key(" t "),
        Span::raw(" Launch telemetry  "),
        key(" a/m/s "),
        Span::raw(" Toggles"),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Gray)),
    )
    .alignment(Alignment::Left);

    f.render_widget(footer, area);
}

/// Run the dashboard until the user quits. The caller owns worker shutdown.
pub async fn run(
    handle: &BridgeHandle,
    events: &mut BridgeReceiver,
    settings: Settings,
    active_port: Option<&str>,
) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let ports = list_ports().unwrap_or_default();
    let mut dashboard = Dashboard::new(settings, ports, active_port);

    let result = run_event_loop(&mut terminal, &mut dashboard, handle, events).await;

    // Restore terminal (always attempt cleanup)
    let cleanup = restore_terminal(&mut terminal);
    result.and(cleanup)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    dashboard: &mut Dashboard,
    handle: &BridgeHandle,
    events: &mut BridgeReceiver,
) -> Result<()> {
    let tick_rate = Duration::from_millis(50);
    let mut last_tick = Instant::now();

    loop {
        // Drain whatever the worker produced since the last frame.
        while let Some(event) = events.try_recv() {
            dashboard.apply(event);
        }

        terminal.draw(|f| draw(f, dashboard))?;

        // Handle input with timeout so the loop keeps ticking.
        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Action::SetPort(port) = dashboard.handle_key(key.code) {
                        handle.set_port(port).await;
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if dashboard.should_quit {
            break;
        }
    }

    Ok(())
}

/// Headless mode: same event consumption, no terminal. Runs until Ctrl-C.
pub async fn run_headless(events: &mut BridgeReceiver) -> Result<()> {
    loop {
        tokio::select! {
            maybe = events.recv() => {
                match maybe {
                    Some(BridgeEvent::Link(state)) => tracing::info!("Serial link: {:?}", state),
                    Some(BridgeEvent::Sample(s)) => {
                        tracing::info!("{} km/h @ {} rpm", s.speed_kmh, s.rpm)
                    }
                    Some(BridgeEvent::Error(msg)) => tracing::error!("{}", msg),
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}
