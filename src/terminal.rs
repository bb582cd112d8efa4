// SPDX-License-Identifier: GPL-3.0-only

//! Terminal front-end
//!
//! Renders the navigation shell, the capture screens and the camera modal
//! in the terminal. Camera frames are drawn with Unicode half-block
//! characters for improved vertical resolution.
//!
//! The UI loop runs on the calling thread with a tokio runtime entered, so
//! the session driver can spawn its work while input is polled here.

use crate::app::screens::NO_PERMISSION_TEXT;
use crate::app::{
    CaptureScreen, DriverEvent, NavigationShell, Notice, NoticeLevel, NoticeQueue, PermissionGate,
    PermissionOutcome, PermissionState, Route, ScreenView, SessionDriver, SessionMessage,
    SessionOutput, SessionPhase, ShellView,
};
use crate::backends::camera::CameraBackendManager;
use crate::backends::camera::types::{CameraFrame, Face};
use crate::backends::virtual_camera::load_image_as_frame;
use crate::config::Config;
use crate::constants::terminal::POLL_INTERVAL;
use crate::storage::CapturedImage;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget},
};
use std::io::{self, stdout};
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// Run the terminal UI until the user quits
pub fn run(config: Config, camera: CameraBackendManager) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let mut app = TerminalApp::new(config, camera);
    let result = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Decoded still of a captured photo, keyed by its URI
struct StillCache {
    uri: String,
    frame: Option<CameraFrame>,
}

struct TerminalApp {
    config: Config,
    shell: NavigationShell,
    driver: SessionDriver,
    permission: Option<oneshot::Receiver<PermissionOutcome>>,
    screen: Option<CaptureScreen>,
    notices: NoticeQueue,
    menu_index: usize,
    still: Option<StillCache>,
    quit: bool,
}

impl TerminalApp {
    fn new(config: Config, camera: CameraBackendManager) -> Self {
        // The gate runs in the background while the shell shows its
        // loading placeholder
        let (sender, receiver) = oneshot::channel();
        let gate_camera = camera.clone();
        tokio::spawn(async move {
            let outcome = PermissionGate::new().run(&gate_camera).await;
            let _ = sender.send(outcome);
        });

        Self {
            notices: NoticeQueue::new(config.notice_duration()),
            config,
            shell: NavigationShell::new(),
            driver: SessionDriver::new(camera),
            permission: Some(receiver),
            screen: None,
            menu_index: 0,
            still: None,
            quit: false,
        }
    }

    fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        while !self.quit {
            self.poll_permission();
            self.drain_messages();
            self.notices.tick(Instant::now());
            self.refresh_still();

            terminal.draw(|f| self.render(f.area(), f.buffer_mut()))?;

            // Handle input with timeout for frame updates
            if event::poll(POLL_INTERVAL)?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key);
            }
        }

        if let Some(screen) = self.screen.as_mut() {
            self.driver.dispatch(screen, SessionMessage::Close);
        }
        Ok(())
    }

    fn poll_permission(&mut self) {
        let Some(receiver) = self.permission.as_mut() else {
            return;
        };
        match receiver.try_recv() {
            Ok(outcome) => {
                self.shell.finish_initialization(outcome.state);
                if let Some(notice) = outcome.notice {
                    self.notices.push(notice, Instant::now());
                }
                self.permission = None;
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
            Err(oneshot::error::TryRecvError::Closed) => {
                warn!("Permission gate ended without an outcome");
                self.shell.finish_initialization(PermissionState::denied());
                self.permission = None;
            }
        }
    }

    /// Feed asynchronous results into the current screen
    fn drain_messages(&mut self) {
        while let Some(message) = self.driver.try_recv() {
            // Results for a screen that was left are dropped
            let Some(screen) = self.screen.as_mut() else {
                continue;
            };
            let events = self.driver.dispatch(screen, message);
            self.handle_events(events);
        }
    }

    fn handle_events(&mut self, events: Vec<DriverEvent>) {
        let now = Instant::now();
        for event in events {
            match event {
                DriverEvent::Notice(notice) => self.notices.push(notice, now),
                DriverEvent::Completed(SessionOutput::Code(value)) => {
                    info!(value = %value, "Scan finished");
                }
                DriverEvent::Completed(SessionOutput::Photo(image)) => {
                    info!(name = %image.name, "Capture finished");
                }
            }
        }
    }

    fn dispatch(&mut self, message: SessionMessage) {
        if let Some(screen) = self.screen.as_mut() {
            let events = self.driver.dispatch(screen, message);
            self.handle_events(events);
        }
    }

    /// Photo shown on screen right now, if any
    fn visible_photo(&self) -> Option<&CapturedImage> {
        let screen = self.screen.as_ref()?;
        let session = screen.session();
        let output = if session.is_visible() {
            session.result()
        } else {
            screen.output()
        };
        match output {
            Some(SessionOutput::Photo(image)) => Some(image),
            _ => None,
        }
    }

    /// Decode the visible photo once so drawing stays cheap
    fn refresh_still(&mut self) {
        let Some(image) = self.visible_photo() else {
            self.still = None;
            return;
        };
        if self.still.as_ref().is_some_and(|s| s.uri == image.uri) {
            return;
        }
        let uri = image.uri.clone();
        let frame = match load_image_as_frame(&image.path(), 0) {
            Ok(frame) => Some(frame),
            Err(e) => {
                warn!(error = %e, "Cannot preview captured photo");
                None
            }
        };
        self.still = Some(StillCache { uri, frame });
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit = true;
            return;
        }

        match self.shell.view() {
            ShellView::Loading => {
                if key.code == KeyCode::Char('q') {
                    self.quit = true;
                }
            }
            ShellView::Screen(Route::Home, _) => self.handle_home_key(key.code),
            ShellView::Screen(_, _) => {
                let modal_open = self
                    .screen
                    .as_ref()
                    .is_some_and(|s| s.session().is_visible());
                if modal_open {
                    self.handle_modal_key(key.code);
                } else {
                    self.handle_screen_key(key.code);
                }
            }
        }
    }

    fn handle_home_key(&mut self, code: KeyCode) {
        let count = Route::DESTINATIONS.len();
        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.menu_index = (self.menu_index + count - 1) % count;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.menu_index = (self.menu_index + 1) % count;
            }
            KeyCode::Char(c @ '1'..='3') => {
                self.menu_index = (c as usize) - ('1' as usize);
                self.open_route(Route::DESTINATIONS[self.menu_index]);
            }
            KeyCode::Enter => self.open_route(Route::DESTINATIONS[self.menu_index]),
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            _ => {}
        }
    }

    fn open_route(&mut self, route: Route) {
        let Some(permission) = self.shell.permission() else {
            return;
        };
        if self.shell.navigate(route) {
            self.screen = CaptureScreen::for_route(route, permission, &self.config);
        }
    }

    fn handle_screen_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter | KeyCode::Char('o') => self.dispatch(SessionMessage::Open),
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => {
                self.shell.back();
                self.screen = None;
            }
            KeyCode::Char('q') => self.quit = true,
            _ => {}
        }
    }

    fn handle_modal_key(&mut self, code: KeyCode) {
        let message = match code {
            KeyCode::Esc => SessionMessage::Close,
            KeyCode::Char(' ') | KeyCode::Char('p') => SessionMessage::ShutterPressed,
            KeyCode::Char('f') => SessionMessage::ToggleFlash,
            KeyCode::Char('s') => SessionMessage::ToggleFacing,
            KeyCode::Char('r') => SessionMessage::Retry,
            KeyCode::Enter => SessionMessage::Confirm,
            _ => return,
        };
        self.dispatch(message);
    }

    fn render(&self, area: Rect, buf: &mut Buffer) {
        let [title_area, body_area, notice_area, status_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        let title = match self.shell.view() {
            ShellView::Loading => "Camera Showcase",
            ShellView::Screen(route, _) => route.title(),
        };
        Paragraph::new(Line::from(Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .render(title_area, buf);

        match self.shell.view() {
            ShellView::Loading => centered_text("Loading App..", body_area, buf),
            ShellView::Screen(Route::Home, permission) => {
                self.render_home(permission.granted, body_area, buf)
            }
            ShellView::Screen(_, _) => {
                if let Some(screen) = &self.screen {
                    self.render_screen(screen, body_area, buf);
                }
            }
        }

        NoticeLine {
            notice: self.notices.current(),
        }
        .render(notice_area, buf);

        StatusBar {
            message: &self.status_message(),
        }
        .render(status_area, buf);
    }

    fn render_home(&self, granted: bool, area: Rect, buf: &mut Buffer) {
        let mut lines: Vec<Line> = Route::DESTINATIONS
            .iter()
            .enumerate()
            .map(|(i, route)| {
                let selected = i == self.menu_index;
                let marker = if selected { "> " } else { "  " };
                let style = if selected {
                    Style::default().fg(Color::Black).bg(Color::White)
                } else {
                    Style::default()
                };
                Line::from(Span::styled(
                    format!("{}{}. {}", marker, i + 1, route.title()),
                    style,
                ))
            })
            .collect();
        lines.push(Line::from(""));
        if !granted {
            lines.push(Line::from(Span::styled(
                "Camera permission was not granted",
                Style::default().fg(Color::Yellow),
            )));
        }

        Paragraph::new(lines)
            .block(Block::bordered().title(" Home "))
            .render(area, buf);
    }

    fn render_screen(&self, screen: &CaptureScreen, area: Rect, buf: &mut Buffer) {
        let session = screen.session();
        if session.is_visible() {
            self.render_modal(screen, area, buf);
            return;
        }

        let block = Block::bordered().title(format!(" {} ", screen.route().title()));
        let inner = block.inner(area);
        block.render(area, buf);

        match screen.view() {
            ScreenView::NoPermission => centered_text(NO_PERMISSION_TEXT, inner, buf),
            ScreenView::Empty => centered_text(
                &format!("No result yet. [Enter] {}", screen.action_label()),
                inner,
                buf,
            ),
            ScreenView::Result(SessionOutput::Code(value)) => {
                let lines = vec![
                    Line::from("Scanned value:"),
                    Line::from(Span::styled(
                        value.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(""),
                    Line::from(format!("[Enter] {}", screen.action_label())),
                ];
                Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .render(inner, buf);
            }
            ScreenView::Result(SessionOutput::Photo(image)) => {
                let [preview_area, info_area] =
                    Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(inner);
                self.still_widget().render(preview_area, buf);
                Paragraph::new(vec![
                    Line::from(format!("{} ({})", image.name, image.mime_type)),
                    Line::from(image.uri.clone()),
                    Line::from(format!("[Enter] {}", screen.action_label())),
                ])
                .alignment(Alignment::Center)
                .render(info_area, buf);
            }
        }
    }

    fn render_modal(&self, screen: &CaptureScreen, area: Rect, buf: &mut Buffer) {
        let session = screen.session();
        let device = session
            .device()
            .map(|d| d.name.as_str())
            .unwrap_or("no device");
        let block = Block::bordered()
            .title(format!(" {} ", device))
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        block.render(area, buf);

        let [view_area, indicator_area] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(inner);

        match session.phase() {
            SessionPhase::ResultPending => self.still_widget().render(view_area, buf),
            SessionPhase::AwaitingDevice | SessionPhase::Closed => {
                centered_text("Waiting for camera...", view_area, buf)
            }
            SessionPhase::Live | SessionPhase::Capturing => FrameWidget {
                frame: session.preview().map(|f| &**f),
                faces: session.faces(),
                placeholder: "Starting camera...",
            }
            .render(view_area, buf),
        }

        let mut indicators = vec![format!("facing: {}", session.facing())];
        if session.device().is_some_and(|d| d.has_flash) {
            indicators.push(format!("flash: {}", session.flash()));
        }
        if session.detection_active() {
            indicators.push(format!("detecting: {}", session.source().label()));
        }
        if session.phase() == SessionPhase::Capturing {
            indicators.push("capturing...".to_string());
        }
        Paragraph::new(indicators.join(" | "))
            .alignment(Alignment::Center)
            .render(indicator_area, buf);
    }

    fn still_widget(&self) -> FrameWidget<'_> {
        FrameWidget {
            frame: self.still.as_ref().and_then(|s| s.frame.as_ref()),
            faces: &[],
            placeholder: "Photo unavailable",
        }
    }

    fn status_message(&self) -> String {
        match self.shell.view() {
            ShellView::Loading => "'q' quit".to_string(),
            ShellView::Screen(Route::Home, _) => {
                "Up/Down select | Enter open | 1-3 jump | 'q' quit".to_string()
            }
            ShellView::Screen(_, _) => {
                let Some(screen) = &self.screen else {
                    return "Esc back".to_string();
                };
                let session = screen.session();
                if !session.is_visible() {
                    return "Enter open camera | Esc back | 'q' quit".to_string();
                }
                match session.phase() {
                    SessionPhase::ResultPending => "'r' retry | Enter OK | Esc close".to_string(),
                    SessionPhase::Live => {
                        let mut msg = String::new();
                        if session.source().has_shutter() {
                            msg.push_str("Space capture | ");
                        }
                        if session.can_toggle_flash() {
                            msg.push_str("'f' flash | ");
                        }
                        msg.push_str("'s' switch camera | Esc close");
                        msg
                    }
                    _ => "Esc close".to_string(),
                }
            }
        }
    }
}

fn centered_text(text: &str, area: Rect, buf: &mut Buffer) {
    if area.height == 0 {
        return;
    }
    let y = area.y + area.height / 2;
    Paragraph::new(text)
        .alignment(Alignment::Center)
        .render(Rect { y, height: 1, ..area }, buf);
}

/// Widget that renders a camera frame using half-block characters
struct FrameWidget<'a> {
    frame: Option<&'a CameraFrame>,
    /// Regions outlined on top of the frame
    faces: &'a [Face],
    placeholder: &'a str,
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = self.frame.filter(|f| f.width > 0 && f.height > 0) else {
            centered_text(self.placeholder, area, buf);
            return;
        };
        if area.width == 0 || area.height == 0 {
            return;
        }

        // Calculate display dimensions maintaining aspect ratio
        // Each terminal cell displays 2 vertical pixels using half-block characters
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            // Terminal is wider - fit to height
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            // Terminal is taller - fit to width
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        // Upper half (▀) colored with fg, lower half with bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let (r, g, b) = frame.pixel_rgb(src_x, src_y_top);
                let (br, bg, bb) = frame.pixel_rgb(src_x, src_y_bottom);

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(Color::Rgb(r, g, b));
                    cell.set_bg(Color::Rgb(br, bg, bb));
                }
            }
        }

        let view = Rect {
            x: x_offset,
            y: y_offset,
            width: display_width,
            height: display_height,
        };
        for face in self.faces {
            outline_region(face, view, buf);
        }
    }
}

/// Outline a normalized region inside the rendered frame
fn outline_region(face: &Face, view: Rect, buf: &mut Buffer) {
    let region = &face.bounds;
    let to_x =
        |v: f32| view.x + ((v.clamp(0.0, 1.0) * view.width as f32) as u16).min(view.width - 1);
    let to_y =
        |v: f32| view.y + ((v.clamp(0.0, 1.0) * view.height as f32) as u16).min(view.height - 1);

    let (x0, x1) = (to_x(region.x), to_x(region.x + region.width));
    let (y0, y1) = (to_y(region.y), to_y(region.y + region.height));
    let style = Style::default().fg(Color::Yellow);

    for x in x0..=x1 {
        for y in [y0, y1] {
            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_char('─').set_style(style);
            }
        }
    }
    for y in y0..=y1 {
        for x in [x0, x1] {
            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_char('│').set_style(style);
            }
        }
    }
}

/// Transient notice line
struct NoticeLine<'a> {
    notice: Option<&'a Notice>,
}

impl Widget for NoticeLine<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(notice) = self.notice else {
            return;
        };
        let color = match notice.level {
            NoticeLevel::Info => Color::Green,
            NoticeLevel::Warning => Color::Yellow,
            NoticeLevel::Error => Color::Red,
        };
        Paragraph::new(notice.text.as_str())
            .style(Style::default().fg(color))
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}
