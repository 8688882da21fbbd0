//! Interactive terminal frontend: the response graph on a canvas with
//! mouse-draggable handles, wheel Q adjustment, preset popups, and the
//! live spectrum overlay. Everything model-side lives in the controller;
//! this module only translates terminal events and draws the scene.

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Context, Line as CanvasLine, Rectangle},
        Block, Borders, Clear, List, ListItem, ListState, Paragraph,
    },
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

use crate::bands::{Band, EqSettings};
use crate::engine::{AudioEngine, UpdateDebouncer};
use crate::graph::controller::{GraphController, GraphEvent, WheelDirection};
use crate::graph::mapping::{format_frequency, format_gain, format_q};
use crate::graph::response::CurvePath;
use crate::graph::{
    PlotBounds, Readout, RenderTarget, SpectrumBar, HANDLE_RADIUS, PLOT_HEIGHT, PLOT_WIDTH,
};
use crate::presets::{PresetCatalog, CUSTOM_PRESET_ID};

/// Poll timeout of the event loop; doubles as the spectrum frame cadence.
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

const MAX_PRESET_NAME_LEN: usize = 30;

#[derive(PartialEq)]
enum EditorMode {
    Normal,
    PresetSelect,
    PresetSave,
    PresetDelete,
}

/// Retained drawing state behind the [`RenderTarget`] seam. The
/// controller updates it piecewise; every frame paints it wholesale.
#[derive(Default)]
pub struct GraphScene {
    curve: CurvePath,
    handles: Vec<SceneHandle>,
    bars: Vec<SpectrumBar>,
    readout: Option<Readout>,
}

struct SceneHandle {
    band_id: u32,
    x: f64,
    y: f64,
    color: Color,
}

impl RenderTarget for GraphScene {
    fn set_curve(&mut self, curve: &CurvePath) {
        self.curve = curve.clone();
    }

    fn clear_handles(&mut self) {
        self.handles.clear();
    }

    fn add_handle(&mut self, band_id: u32, x: f64, y: f64, color: &str) {
        self.handles.push(SceneHandle {
            band_id,
            x,
            y,
            color: parse_hex_color(color).unwrap_or(Color::Cyan),
        });
    }

    fn set_handle_position(&mut self, band_id: u32, x: f64, y: f64) {
        if let Some(handle) = self.handles.iter_mut().find(|h| h.band_id == band_id) {
            handle.x = x;
            handle.y = y;
        }
    }

    fn draw_spectrum_bars(&mut self, bars: &[SpectrumBar]) {
        self.bars = bars.to_vec();
    }

    fn show_readout(&mut self, readout: &Readout) {
        self.readout = Some(readout.clone());
    }

    fn hide_readout(&mut self) {
        self.readout = None;
    }
}

/// Parse a `#RRGGBB` display color.
fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

/// Map a terminal cell inside `area` to plot coordinates, using the cell
/// center so clicks land where the glyph appears.
fn cell_to_plot(column: u16, row: u16, area: Rect) -> Option<(f64, f64)> {
    if area.width == 0 || area.height == 0 {
        return None;
    }
    if column < area.x
        || column >= area.x + area.width
        || row < area.y
        || row >= area.y + area.height
    {
        return None;
    }
    let x = ((column - area.x) as f64 + 0.5) / area.width as f64 * PLOT_WIDTH;
    let y = ((row - area.y) as f64 + 0.5) / area.height as f64 * PLOT_HEIGHT;
    Some((x, y))
}

pub struct EqEditor {
    settings: EqSettings,
    controller: GraphController,
    catalog: PresetCatalog,
    scene: GraphScene,
    debouncer: UpdateDebouncer,
    current_preset: Option<String>,
    mode: EditorMode,
    preset_list_state: ListState,
    save_input: String,
    selected_band: usize,
    modified: bool,
    graph_area: Rect,
}

impl EqEditor {
    pub fn new(settings: EqSettings) -> Self {
        let catalog = PresetCatalog::with_user_presets(&settings.presets);
        // A hand-edited settings file may arrive with no bands at all;
        // the graph needs the full chain to be editable.
        let bands = if settings.bands.is_empty() {
            crate::bands::default_bands()
        } else {
            settings.bands.clone()
        };
        let mut controller = GraphController::new(PlotBounds::default(), bands);
        let mut scene = GraphScene::default();
        controller.rebuild_handles(&mut scene);
        controller.start_spectrum_animation();
        let current_preset = catalog.identify(controller.bands());

        EqEditor {
            settings,
            controller,
            catalog,
            scene,
            debouncer: UpdateDebouncer::new(),
            current_preset,
            mode: EditorMode::Normal,
            preset_list_state: ListState::default(),
            save_input: String::new(),
            selected_band: 0,
            modified: false,
            graph_area: Rect::default(),
        }
    }

    /// Take over the terminal and run until the user saves or cancels.
    /// Returns the full settings tree to persist, or `None` on cancel.
    pub fn run(mut self, engine: &mut dyn AudioEngine) -> io::Result<Option<EqSettings>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Install panic hook for terminal restore
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
            original_hook(info);
        }));

        engine.apply_bands(self.controller.bands());
        engine.set_bypass(!self.settings.is_active);

        let result = self.event_loop(&mut terminal, engine);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;

        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        engine: &mut dyn AudioEngine,
    ) -> io::Result<Option<EqSettings>> {
        loop {
            terminal.draw(|frame| self.draw(frame))?;

            if event::poll(FRAME_INTERVAL)? {
                match event::read()? {
                    Event::Key(key) => match self.mode {
                        EditorMode::Normal => {
                            if let Some(result) = self.handle_normal_key(key, engine) {
                                return Ok(result);
                            }
                        }
                        EditorMode::PresetSelect => self.handle_preset_select_key(key, engine),
                        EditorMode::PresetSave => self.handle_preset_save_key(key),
                        EditorMode::PresetDelete => self.handle_preset_delete_key(key),
                    },
                    Event::Mouse(mouse) => self.handle_mouse(mouse, engine),
                    _ => {}
                }
            }

            let now = Instant::now();
            self.controller.tick(now, &mut self.scene);
            if self.debouncer.poll(now) {
                engine.apply_bands(self.controller.bands());
                self.current_preset = self.catalog.identify(self.controller.bands());
            }
            self.controller.spectrum_frame(engine, &mut self.scene);
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, engine: &mut dyn AudioEngine) {
        if self.mode != EditorMode::Normal {
            return;
        }
        let now = Instant::now();
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some((x, y)) = cell_to_plot(mouse.column, mouse.row, self.graph_area) {
                    self.controller.pointer_down(x, y, &mut self.scene);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some((x, y)) = cell_to_plot(mouse.column, mouse.row, self.graph_area) {
                    if let Some(graph_event) = self.controller.pointer_move(x, y, &mut self.scene)
                    {
                        self.on_graph_event(graph_event, engine, now);
                    }
                }
            }
            // Release is handled wherever the pointer ended up, so a drag
            // that leaves the graph still resolves.
            MouseEventKind::Up(_) => {
                if let Some(graph_event) = self.controller.pointer_up(now) {
                    self.on_graph_event(graph_event, engine, now);
                }
            }
            MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => {
                if let Some((x, y)) = cell_to_plot(mouse.column, mouse.row, self.graph_area) {
                    let direction = if mouse.kind == MouseEventKind::ScrollUp {
                        WheelDirection::Up
                    } else {
                        WheelDirection::Down
                    };
                    let events = self.controller.wheel(x, y, direction, now, &mut self.scene);
                    for graph_event in events {
                        self.on_graph_event(graph_event, engine, now);
                    }
                }
            }
            _ => {}
        }
    }

    fn on_graph_event(&mut self, graph_event: GraphEvent, engine: &mut dyn AudioEngine, now: Instant) {
        self.modified = true;
        match graph_event {
            GraphEvent::Changed { .. } => {
                self.debouncer.mark(now);
            }
            GraphEvent::ChangeComplete { .. } => {
                self.debouncer.cancel();
                engine.apply_bands(self.controller.bands());
                self.current_preset = self.catalog.identify(self.controller.bands());
            }
        }
    }

    /// Returns Some(result) to exit, None to continue
    fn handle_normal_key(
        &mut self,
        key: KeyEvent,
        engine: &mut dyn AudioEngine,
    ) -> Option<Option<EqSettings>> {
        let band_count = self.controller.bands().len();
        let now = Instant::now();
        match key.code {
            KeyCode::Left => {
                self.selected_band = (self.selected_band + band_count - 1) % band_count;
            }
            KeyCode::Right => {
                self.selected_band = (self.selected_band + 1) % band_count;
            }
            KeyCode::Up => self.nudge_gain(1.0, now),
            KeyCode::Down => self.nudge_gain(-1.0, now),
            KeyCode::PageUp => self.nudge_gain(3.0, now),
            KeyCode::PageDown => self.nudge_gain(-3.0, now),
            KeyCode::Char(']') => self.nudge_q(0.1, now),
            KeyCode::Char('[') => self.nudge_q(-0.1, now),
            KeyCode::Char('0') => {
                let band_id = self.selected_band_id();
                self.controller.set_gain(band_id, 0.0, &mut self.scene);
                self.modified = true;
                self.debouncer.mark(now);
            }
            KeyCode::Char('x') => {
                let band_id = self.selected_band_id();
                if self.controller.toggle_band(band_id, &mut self.scene).is_some() {
                    self.modified = true;
                    engine.apply_bands(self.controller.bands());
                    self.current_preset = self.catalog.identify(self.controller.bands());
                }
            }
            KeyCode::Char('r') => {
                self.apply_preset("flat", engine);
            }
            KeyCode::Char('b') => {
                self.settings.is_active = !self.settings.is_active;
                self.modified = true;
                engine.set_bypass(!self.settings.is_active);
            }
            KeyCode::Char('t') => {
                self.settings.theme_is_dark = !self.settings.theme_is_dark;
                self.modified = true;
            }
            KeyCode::Char('p') => {
                self.mode = EditorMode::PresetSelect;
                let entries = self.catalog.selector_entries();
                let current = self
                    .current_preset
                    .as_deref()
                    .unwrap_or(CUSTOM_PRESET_ID);
                self.preset_list_state.select(Some(
                    entries
                        .iter()
                        .position(|entry| entry.id == current)
                        .unwrap_or(0),
                ));
            }
            KeyCode::Char('s') => {
                self.mode = EditorMode::PresetSave;
                self.save_input = self
                    .current_preset
                    .as_deref()
                    .and_then(|id| self.catalog.get(id))
                    .filter(|preset| preset.is_user_preset)
                    .map(|preset| preset.name.clone())
                    .unwrap_or_default();
            }
            KeyCode::Char('d') => {
                if self.catalog.user_preset_count() > 0 {
                    self.mode = EditorMode::PresetDelete;
                    self.preset_list_state.select(Some(0));
                }
            }
            KeyCode::Enter => {
                let mut settings = self.settings.clone();
                settings.bands = self.controller.bands().to_vec();
                settings.presets = self.catalog.user_presets();
                return Some(Some(settings));
            }
            KeyCode::Esc | KeyCode::Char('q') => {
                return Some(None);
            }
            _ => {}
        }
        None
    }

    fn selected_band_id(&self) -> u32 {
        self.controller.bands()[self.selected_band].id
    }

    fn nudge_gain(&mut self, delta: f64, now: Instant) {
        let band_id = self.selected_band_id();
        let Some(band) = self.controller.band(band_id) else {
            return;
        };
        let gain = band.gain + delta;
        self.controller.set_gain(band_id, gain, &mut self.scene);
        self.modified = true;
        self.debouncer.mark(now);
    }

    fn nudge_q(&mut self, delta: f64, now: Instant) {
        let band_id = self.selected_band_id();
        let Some(band) = self.controller.band(band_id) else {
            return;
        };
        let q = band.q + delta;
        self.controller.set_q(band_id, q, &mut self.scene);
        self.modified = true;
        self.debouncer.mark(now);
    }

    fn apply_preset(&mut self, preset_id: &str, engine: &mut dyn AudioEngine) {
        let Some(preset) = self.catalog.get(preset_id) else {
            return;
        };
        // Band identity and colors survive a preset; only the tunable
        // parameters are replaced.
        let bands: Vec<Band> = self
            .controller
            .bands()
            .iter()
            .zip(&preset.bands)
            .map(|(band, preset_band)| Band {
                id: band.id,
                frequency: preset_band.frequency,
                gain: preset_band.gain,
                q: preset_band.q,
                is_active: preset_band.is_active,
                color: band.color.clone(),
            })
            .collect();

        self.controller.replace_bands(bands, &mut self.scene);
        self.debouncer.cancel();
        engine.apply_bands(self.controller.bands());
        self.current_preset = Some(preset_id.to_string());
        self.modified = true;
    }

    fn handle_preset_select_key(&mut self, key: KeyEvent, engine: &mut dyn AudioEngine) {
        let entries = self.catalog.selector_entries();
        let len = entries.len();

        match key.code {
            KeyCode::Up => {
                let i = self.preset_list_state.selected().unwrap_or(0);
                self.preset_list_state
                    .select(Some(if i == 0 { len - 1 } else { i - 1 }));
            }
            KeyCode::Down => {
                let i = self.preset_list_state.selected().unwrap_or(0);
                self.preset_list_state.select(Some((i + 1) % len));
            }
            KeyCode::Enter => {
                if let Some(i) = self.preset_list_state.selected() {
                    if let Some(entry) = entries.get(i) {
                        if entry.id != CUSTOM_PRESET_ID {
                            let id = entry.id.clone();
                            self.apply_preset(&id, engine);
                        }
                    }
                }
                self.mode = EditorMode::Normal;
            }
            KeyCode::Esc => {
                self.mode = EditorMode::Normal;
            }
            _ => {}
        }
    }

    fn handle_preset_save_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) => {
                if self.save_input.len() < MAX_PRESET_NAME_LEN {
                    self.save_input.push(c);
                }
            }
            KeyCode::Backspace => {
                self.save_input.pop();
            }
            KeyCode::Enter => {
                if !self.save_input.is_empty() {
                    let id = self.catalog.save(&self.save_input, self.controller.bands());
                    self.current_preset = Some(id);
                }
                self.save_input.clear();
                self.mode = EditorMode::Normal;
            }
            KeyCode::Esc => {
                self.save_input.clear();
                self.mode = EditorMode::Normal;
            }
            _ => {}
        }
    }

    fn user_preset_ids(&self) -> Vec<(String, String)> {
        self.catalog
            .all()
            .filter(|(_, preset)| preset.is_user_preset)
            .map(|(id, preset)| (id.to_string(), preset.name.clone()))
            .collect()
    }

    fn handle_preset_delete_key(&mut self, key: KeyEvent) {
        let user_presets = self.user_preset_ids();
        if user_presets.is_empty() {
            self.mode = EditorMode::Normal;
            return;
        }
        let len = user_presets.len();

        match key.code {
            KeyCode::Up => {
                let i = self.preset_list_state.selected().unwrap_or(0);
                self.preset_list_state
                    .select(Some(if i == 0 { len - 1 } else { i - 1 }));
            }
            KeyCode::Down => {
                let i = self.preset_list_state.selected().unwrap_or(0);
                self.preset_list_state.select(Some((i + 1) % len));
            }
            KeyCode::Enter => {
                if let Some(i) = self.preset_list_state.selected() {
                    if let Some((id, _)) = user_presets.get(i) {
                        self.catalog.delete(id);
                        if self.current_preset.as_deref() == Some(id.as_str()) {
                            self.current_preset = None;
                        }
                    }
                }
                self.preset_list_state.select(Some(0));
                self.mode = EditorMode::Normal;
            }
            KeyCode::Esc => {
                self.mode = EditorMode::Normal;
            }
            _ => {}
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();

        let title = if self.settings.is_active {
            " parameq "
        } else {
            " parameq (bypassed) "
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(3),
            ])
            .split(inner);

        self.graph_area = chunks[0];

        let accent = if self.settings.theme_is_dark {
            Color::Cyan
        } else {
            Color::Blue
        };
        let bounds = *self.controller.bounds();
        let scene = &self.scene;
        let selected_id = self.controller.bands().get(self.selected_band).map(|b| b.id);
        let canvas = Canvas::default()
            .x_bounds([0.0, PLOT_WIDTH])
            .y_bounds([0.0, PLOT_HEIGHT])
            .marker(Marker::Braille)
            .paint(move |ctx| paint_graph(ctx, scene, &bounds, accent, selected_id));
        frame.render_widget(canvas, chunks[0]);

        let info = self.build_info_line();
        frame.render_widget(Paragraph::new(info), chunks[1]);

        let footer = build_footer();
        frame.render_widget(footer, chunks[2]);

        match self.mode {
            EditorMode::PresetSelect => self.draw_preset_select(frame, area),
            EditorMode::PresetSave => self.draw_preset_save(frame, area),
            EditorMode::PresetDelete => self.draw_preset_delete(frame, area),
            EditorMode::Normal => {}
        }
    }

    fn build_info_line(&self) -> Line<'static> {
        let band = &self.controller.bands()[self.selected_band.min(self.controller.bands().len() - 1)];
        let state = if band.is_active { "" } else { " (off)" };
        let info = format!(
            " Band {}: {}  {}  {}{}",
            band.id,
            format_frequency(band.frequency),
            format_gain(band.gain),
            format_q(band.q),
            state,
        );
        let preset_info = match &self.current_preset {
            Some(id) => {
                let name = self
                    .catalog
                    .get(id)
                    .map(|preset| preset.name.clone())
                    .unwrap_or_else(|| id.clone());
                format!("  Preset: {}{}", name, if self.modified { " *" } else { "" })
            }
            None => "  Custom".to_string(),
        };
        Line::from(vec![
            Span::styled(
                info,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(preset_info, Style::default().fg(Color::DarkGray)),
        ])
    }

    fn draw_preset_select(&mut self, frame: &mut Frame, area: Rect) {
        let popup = centered_rect(40, 60, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(" Select Preset ")
            .borders(Borders::ALL);

        let current = self.current_preset.as_deref().unwrap_or(CUSTOM_PRESET_ID);
        let items: Vec<ListItem> = self
            .catalog
            .selector_entries()
            .into_iter()
            .map(|entry| {
                let marker = if entry.is_user_preset { " \u{2605}" } else { "" };
                let style = if entry.id == current {
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(format!("{}{}", entry.label, marker)).style(style)
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("\u{25b6} ");

        frame.render_stateful_widget(list, popup, &mut self.preset_list_state);
    }

    fn draw_preset_save(&self, frame: &mut Frame, area: Rect) {
        let popup = centered_rect(50, 25, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(" Save Preset ")
            .borders(Borders::ALL);
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let lines = vec![
            Line::default(),
            Line::from(vec![
                Span::raw("  Name: "),
                Span::styled(
                    format!("{}_", self.save_input),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::default(),
            Line::from(Span::styled(
                "  Enter: Save  Esc: Cancel",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        let paragraph = Paragraph::new(lines);
        frame.render_widget(paragraph, inner);
    }

    fn draw_preset_delete(&mut self, frame: &mut Frame, area: Rect) {
        let user_presets = self.user_preset_ids();
        let popup = centered_rect(40, 50, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(" Delete Preset ")
            .borders(Borders::ALL);

        let items: Vec<ListItem> = user_presets
            .iter()
            .map(|(_, name)| ListItem::new(name.clone()))
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .bg(Color::Red)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("\u{25b6} ");

        frame.render_stateful_widget(list, popup, &mut self.preset_list_state);
    }
}

/// Paint the retained scene into canvas space. The canvas y axis grows
/// upward while plot coordinates grow downward, so every y flips here.
fn paint_graph(
    ctx: &mut Context,
    scene: &GraphScene,
    bounds: &PlotBounds,
    accent: Color,
    selected_id: Option<u32>,
) {
    for bar in &scene.bars {
        ctx.draw(&Rectangle {
            x: bar.x,
            y: PLOT_HEIGHT - (bar.y + bar.height),
            width: bar.width,
            height: bar.height,
            color: Color::DarkGray,
        });
    }
    ctx.layer();

    // 0 dB grid line
    let zero_y = PLOT_HEIGHT - bounds.center_y();
    ctx.draw(&CanvasLine {
        x1: bounds.min_x,
        y1: zero_y,
        x2: bounds.max_x,
        y2: zero_y,
        color: Color::Yellow,
    });

    for pair in scene.curve.samples().windows(2) {
        ctx.draw(&CanvasLine {
            x1: pair[0].x,
            y1: PLOT_HEIGHT - pair[0].y,
            x2: pair[1].x,
            y2: PLOT_HEIGHT - pair[1].y,
            color: accent,
        });
    }
    ctx.layer();

    for handle in &scene.handles {
        let radius = if selected_id == Some(handle.band_id) {
            HANDLE_RADIUS * 0.75
        } else {
            HANDLE_RADIUS * 0.5
        };
        ctx.draw(&Circle {
            x: handle.x,
            y: PLOT_HEIGHT - handle.y,
            radius,
            color: handle.color,
        });
    }

    if let Some(readout) = &scene.readout {
        ctx.print(
            readout.x,
            PLOT_HEIGHT - readout.y,
            Line::from(Span::styled(
                format!("{}  {}  {}", readout.frequency, readout.gain, readout.q),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )),
        );
    }
}

fn build_footer() -> Paragraph<'static> {
    let lines = vec![
        Line::from(vec![
            Span::styled("Drag", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(": Freq+Gain  "),
            Span::styled("Wheel", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(": Q  "),
            Span::styled(
                "\u{2190}\u{2192}",
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(": Band  "),
            Span::styled(
                "\u{2191}\u{2193}",
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(": \u{00b1}1dB  "),
            Span::styled("PgUp/Dn", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(": \u{00b1}3dB  "),
            Span::styled("[ ]", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(": \u{00b1}0.1Q  "),
            Span::styled("0", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(": Reset band"),
        ]),
        Line::from(vec![
            Span::styled("x", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(": Band on/off  "),
            Span::styled("b", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(": Bypass  "),
            Span::styled("r", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(": Flat  "),
            Span::styled("t", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(": Theme  "),
            Span::styled("p", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(": Presets  "),
            Span::styled("s", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(": Save preset  "),
            Span::styled("d", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(": Delete preset  "),
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(": Save+Exit  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("/"),
            Span::styled("q", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(": Cancel"),
        ]),
    ];
    Paragraph::new(lines)
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::default_bands;
    use crate::graph::response::render_curve;
    use crate::graph::CURVE_SAMPLES;

    #[test]
    fn cell_mapping_covers_the_plot_surface() {
        let area = Rect::new(1, 1, 78, 20);

        let (x, y) = cell_to_plot(1, 1, area).unwrap();
        assert!(x > 0.0 && x < PLOT_WIDTH / 78.0);
        assert!(y > 0.0 && y < PLOT_HEIGHT / 20.0);

        let (x, y) = cell_to_plot(78, 20, area).unwrap();
        assert!(x < PLOT_WIDTH);
        assert!(y < PLOT_HEIGHT);

        // The center cell lands near the center of the plot.
        let (x, y) = cell_to_plot(40, 11, area).unwrap();
        assert!((x - PLOT_WIDTH / 2.0).abs() < PLOT_WIDTH / 78.0);
        assert!((y - PLOT_HEIGHT / 2.0).abs() < PLOT_HEIGHT / 20.0);
    }

    #[test]
    fn cells_outside_the_graph_do_not_map() {
        let area = Rect::new(1, 1, 78, 20);
        assert!(cell_to_plot(0, 5, area).is_none());
        assert!(cell_to_plot(79, 5, area).is_none());
        assert!(cell_to_plot(5, 0, area).is_none());
        assert!(cell_to_plot(5, 21, area).is_none());
        assert!(cell_to_plot(5, 5, Rect::new(1, 1, 0, 0)).is_none());
    }

    #[test]
    fn hex_colors_parse_to_rgb() {
        assert_eq!(parse_hex_color("#EC407A"), Some(Color::Rgb(0xEC, 0x40, 0x7A)));
        assert_eq!(parse_hex_color("#ffffff"), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(parse_hex_color("EC407A"), None);
        assert_eq!(parse_hex_color("#xyzxyz"), None);
        assert_eq!(parse_hex_color("#fff"), None);
    }

    #[test]
    fn scene_retains_what_the_controller_draws() {
        let mut scene = GraphScene::default();
        let bands = default_bands();
        let bounds = PlotBounds::default();

        scene.set_curve(&render_curve(&bands, CURVE_SAMPLES, &bounds));
        assert_eq!(scene.curve.points.len(), 203);

        scene.add_handle(1, 100.0, 90.0, "#EC407A");
        scene.add_handle(2, 200.0, 110.0, "not-a-color");
        assert_eq!(scene.handles.len(), 2);
        assert_eq!(scene.handles[0].color, Color::Rgb(0xEC, 0x40, 0x7A));
        assert_eq!(scene.handles[1].color, Color::Cyan, "bad colors fall back");

        scene.set_handle_position(1, 120.0, 95.0);
        assert_eq!(scene.handles[0].x, 120.0);
        scene.set_handle_position(99, 0.0, 0.0); // stale id: ignored
        assert_eq!(scene.handles.len(), 2);

        scene.show_readout(&Readout {
            band_id: 1,
            x: 110.0,
            y: 85.0,
            frequency: "60 Hz".to_string(),
            gain: "+2.0 dB".to_string(),
            q: "Q: 0.8".to_string(),
        });
        assert!(scene.readout.is_some());
        scene.hide_readout();
        assert!(scene.readout.is_none());

        scene.clear_handles();
        assert!(scene.handles.is_empty());
    }
}
