use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::warn;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame, Terminal,
};
use std::{
    io,
    path::PathBuf,
    sync::mpsc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use techtile::{
    alignment::Vec3,
    facility::Facility,
    gui::{band_color, color_bands, room_outline, sensor_points, Projection, TechtileGuiError, ViewBounds},
    measurements::Measurement,
    plotter::{anchor_trace, TechtilePlotter},
    scene::Scene,
};

/// Requests the dashboard passes on to its data, one per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `r`: forget everything shown so far
    Reset,
    /// `+`: one more simulated node
    MorePoints,
    /// `-`: one simulated node less
    FewerPoints,
    /// `]`: larger simulated position error
    MoreNoise,
    /// `[`: smaller simulated position error
    LessNoise,
}

impl Command {
    fn from_key(c: char) -> Option<Self> {
        match c {
            'r' => Some(Command::Reset),
            '+' | '=' => Some(Command::MorePoints),
            '-' => Some(Command::FewerPoints),
            ']' => Some(Command::MoreNoise),
            '[' => Some(Command::LessNoise),
            _ => None,
        }
    }
}

/// Where the dashboard gets its measurements from.
pub trait LiveData {
    /// The measurements to show right now.
    fn status(&mut self) -> Vec<Measurement>;

    /// Act on a key press.
    fn command(&mut self, command: Command);
}

/// Number of colour bands the value range is split into.
const BANDS: usize = 5;

/// What the dashboard shows besides the live measurements.
pub struct Dashboard {
    pub facility: Facility,
    pub anchor_names: Vec<String>,
    pub anchors: Vec<Vec3>,
    pub cmax: f64,
    pub html: Option<PathBuf>,
}

/// Writes scenes to an HTML file on its own thread, so a slow disk never
/// holds up the terminal.
struct Exporter {
    tx: mpsc::Sender<Scene>,
    handle: JoinHandle<()>,
}

impl Exporter {
    fn spawn(path: PathBuf, refresh: Duration) -> Self {
        let (tx, rx) = mpsc::channel::<Scene>();
        let handle = thread::spawn(move || {
            while let Ok(mut scene) = rx.recv() {
                // only the newest scene matters
                while let Ok(newer) = rx.try_recv() {
                    scene = newer;
                }
                if let Err(e) = scene.write_html(&path, Some(refresh)) {
                    warn!("Could not update {}: {}", path.display(), e);
                }
            }
        });
        Exporter { tx, handle }
    }

    fn send(&self, scene: Scene) -> Result<(), TechtileGuiError> {
        self.tx.send(scene)?;
        Ok(())
    }

    fn finish(self) -> Result<(), TechtileGuiError> {
        drop(self.tx);
        self.handle.join().map_err(|_| TechtileGuiError::JoinError)
    }
}

struct App {
    data: Box<dyn LiveData>,
    dashboard: Dashboard,
    measurements: Vec<Measurement>,
    exporter: Option<Exporter>,
}

impl App {
    fn new(data: Box<dyn LiveData>, dashboard: Dashboard, tick_rate: Duration) -> App {
        let exporter = dashboard
            .html
            .clone()
            .map(|path| Exporter::spawn(path, tick_rate.max(Duration::from_secs(1))));
        App {
            data,
            dashboard,
            measurements: vec![],
            exporter,
        }
    }

    fn on_tick(&mut self) -> Result<(), TechtileGuiError> {
        self.measurements = self.data.status();
        if let Some(exporter) = &self.exporter {
            let names: Vec<&str> = self.dashboard.anchor_names.iter().map(String::as_str).collect();
            let scene = TechtilePlotter::new(&self.dashboard.facility)
                .title("Techtile live")
                .room()
                .measurements(&self.measurements, self.dashboard.cmax)
                .finish()
                .with_trace(anchor_trace(&self.dashboard.anchors, &names));
            exporter.send(scene)?;
        }
        Ok(())
    }
}

pub fn engage_gui(
    data: Box<dyn LiveData>,
    dashboard: Dashboard,
    tick_rate: Duration,
) -> Result<(), TechtileGuiError> {
    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // create app and run it
    let mut app = App::new(data, dashboard, tick_rate);
    let res = run_app(&mut terminal, &mut app, tick_rate);

    // restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Some(exporter) = app.exporter.take() {
        exporter.finish()?;
    }

    res
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<(), TechtileGuiError> {
    app.on_tick()?;
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Char(c) => {
                        if let Some(command) = Command::from_key(c) {
                            app.data.command(command);
                            app.on_tick()?;
                            last_tick = Instant::now();
                        }
                    }
                    _ => {}
                }
            }
        }
        if last_tick.elapsed() >= tick_rate {
            app.on_tick()?;
            last_tick = Instant::now();
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(3)])
        .split(f.size());
    let views = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    render_view(f, views[0], app, Projection::Top, " Top ");
    render_view(f, views[1], app, Projection::Side, " Side ");

    let worst = app
        .measurements
        .iter()
        .map(|m| m.value)
        .fold(f64::NAN, f64::max);
    let status = if app.measurements.is_empty() {
        " Waiting for measurements... q quit, r reset ".to_owned()
    } else {
        format!(
            " {} points, worst {:.2} m | q quit, r reset, +/- nodes, [/] noise ",
            app.measurements.len(),
            worst
        )
    };
    f.render_widget(
        Paragraph::new(status).block(Block::default().borders(Borders::ALL)),
        rows[1],
    );
}

fn render_view(f: &mut Frame, area: Rect, app: &App, projection: Projection, title: &str) {
    let room = &app.dashboard.facility.room;
    let outline = room_outline(room, projection);
    let anchors = sensor_points(&app.dashboard.anchors, projection);
    let bands = color_bands(&app.measurements, app.dashboard.cmax, BANDS, projection);
    let step = app.dashboard.cmax / BANDS as f64;

    let mut datasets = vec![
        Dataset::default()
            .name("Room")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::White))
            .data(&outline),
        Dataset::default()
            .name("Anchors")
            .marker(symbols::Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Magenta))
            .data(&anchors),
    ];
    datasets.extend(bands.iter().enumerate().map(|(i, points)| {
        Dataset::default()
            .name(format!("{:.2}-{:.2} m", i as f64 * step, (i + 1) as f64 * step))
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(band_color(i, BANDS)))
            .data(points)
    }));

    let bounds = ViewBounds::fit(room, projection);
    let (x_labels, y_labels) = bounds.labels();
    let (x_title, y_title) = projection.axis_titles();

    let chart = Chart::new(datasets)
        .block(Block::default().title(title).borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .title(Span::styled(x_title, Style::default().fg(Color::Red)))
                .style(Style::default().fg(Color::White))
                .bounds(bounds.x)
                .labels(x_labels.into_iter().map(Span::from).collect()),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled(y_title, Style::default().fg(Color::Red)))
                .style(Style::default().fg(Color::White))
                .bounds(bounds.y)
                .labels(y_labels.into_iter().map(Span::from).collect()),
        );

    f.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(Command::from_key('r'), Some(Command::Reset));
        assert_eq!(Command::from_key('+'), Some(Command::MorePoints));
        assert_eq!(Command::from_key('='), Some(Command::MorePoints));
        assert_eq!(Command::from_key('-'), Some(Command::FewerPoints));
        assert_eq!(Command::from_key(']'), Some(Command::MoreNoise));
        assert_eq!(Command::from_key('['), Some(Command::LessNoise));
        assert_eq!(Command::from_key('x'), None);
    }
}
