//! Session controller: owns every component and routes actions between them.
//!
//! All transitions happen inside [`Controller::handle`], one action at a
//! time. Timers are continuations in the controller's [`Scheduler`]; the
//! frontend calls `handle` with [`RuntimeAction::Tick`] once the next
//! deadline passes.

use std::path::PathBuf;
use std::time::{Instant, SystemTime};

use ratatui::text::Line;

use crate::actions::{AppAction, AppEffect, RuntimeAction, UserAction};
use crate::config::Config;
use crate::dispatch::DispatchOptions;
use crate::error::LoadError;
use crate::layout::layout_tree;
use crate::monitor::{FileMonitor, FileSystem, OsFileSystem, WatchEvent};
use crate::refresh::RefreshController;
use crate::render::RenderTree;
use crate::scheduler::{Scheduler, TaskId, TimerTask};
use crate::state::{AppState, Overlay, ViewMode, Viewport};
use crate::streaming::{StreamingEngine, TickOutcome};
use crate::theme::ThemeContext;

pub struct Controller<F: FileSystem = OsFileSystem> {
    fs: F,
    state: AppState,
    scheduler: Scheduler<TimerTask>,
    monitor: FileMonitor,
    streaming: StreamingEngine,
    refresh: RefreshController,
    lines: Vec<Line<'static>>,
}

impl<F: FileSystem> Controller<F> {
    pub fn new(fs: F, path: impl Into<PathBuf>, config: &Config, theme: ThemeContext) -> Self {
        let path = path.into();
        let mut state = AppState::new(path.clone(), theme);
        state.conceal = config.display.conceal;
        state.rule_max_width = config.display.rule_max_width;
        Self {
            fs,
            state,
            scheduler: Scheduler::new(),
            monitor: FileMonitor::new(path, &config.watch),
            streaming: StreamingEngine::new(&config.streaming),
            refresh: RefreshController::new(),
            lines: Vec::new(),
        }
    }

    /// Replaces the playback engine, e.g. with a seeded one.
    pub fn with_streaming(mut self, engine: StreamingEngine) -> Self {
        self.streaming = engine;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn tree(&self) -> Option<&RenderTree> {
        self.refresh.current()
    }

    pub fn refresh_controller(&self) -> &RefreshController {
        &self.refresh
    }

    pub fn streaming(&self) -> &StreamingEngine {
        &self.streaming
    }

    pub fn monitor(&self) -> &FileMonitor {
        &self.monitor
    }

    pub fn scheduler(&self) -> &Scheduler<TimerTask> {
        &self.scheduler
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Laid-out content lines for the current tree and viewport width.
    pub fn lines(&self) -> &[Line<'static>] {
        &self.lines
    }

    pub fn visible_lines(&self) -> &[Line<'static>] {
        let start = self.state.scroll.min(self.lines.len());
        let end = (start + usize::from(self.state.viewport.height)).min(self.lines.len());
        &self.lines[start..end]
    }

    /// Initial load, then begin watching.
    pub fn start(&mut self, viewport: Viewport, now: Instant) -> Vec<AppEffect> {
        self.state.viewport = viewport;
        if self.load_document() {
            self.state.status = format!("Watching {}", self.state.document.title());
        }
        self.render();
        if let Some(event) = self.monitor.start(&self.fs, &mut self.scheduler, now) {
            self.apply_watch_event(event);
        }
        vec![AppEffect::RequestFrame]
    }

    /// Cancels every pending continuation.
    pub fn shutdown(&mut self) {
        self.monitor.stop(&mut self.scheduler);
        self.streaming.stop(&mut self.scheduler);
        tracing::debug!(pending = self.scheduler.len(), "controller shut down");
    }

    pub fn handle(&mut self, action: AppAction, now: Instant) -> Vec<AppEffect> {
        match action {
            AppAction::User(action) => self.handle_user(action, now),
            AppAction::Runtime(action) => self.handle_runtime(action, now),
        }
    }

    fn handle_user(&mut self, action: UserAction, now: Instant) -> Vec<AppEffect> {
        if self.state.help_visible() && !action.allowed_over_help() {
            return Vec::new();
        }
        match action {
            UserAction::Escape => {
                if self.state.help_visible() {
                    self.state.overlay = Overlay::None;
                } else {
                    return vec![AppEffect::Exit];
                }
            }
            UserAction::Quit => return vec![AppEffect::Exit],
            UserAction::ToggleHelp => {
                self.state.overlay = match self.state.overlay {
                    Overlay::None => Overlay::Help,
                    Overlay::Help => Overlay::None,
                };
            }
            UserAction::CycleTheme => {
                self.state.theme = self.state.theme.next();
                let name = self.state.theme.current().name;
                tracing::debug!(theme = name, "theme changed");
                self.state.status = format!("Theme: {name}");
                self.render();
            }
            UserAction::ToggleConceal => {
                self.state.conceal = !self.state.conceal;
                self.stop_streaming();
                self.state.status = format!(
                    "Conceal: {}",
                    if self.state.conceal { "ON" } else { "OFF" }
                );
                self.render();
            }
            UserAction::Reload => {
                self.stop_streaming();
                if self.load_document() {
                    self.state.status = format!(
                        "Reloaded {} at {}",
                        self.state.document.title(),
                        chrono::Local::now().format("%H:%M:%S")
                    );
                } else {
                    self.state.status = "Reload failed".to_string();
                }
                self.render();
            }
            UserAction::StartStreaming => {
                self.streaming.set_source(self.state.document.raw_text.clone());
                self.state.status = self.streaming.start(&mut self.scheduler, now);
                self.state.view = ViewMode::Stream;
                self.render();
            }
            UserAction::ToggleEndless => {
                self.state.status = self.streaming.toggle_endless();
            }
            UserAction::StopStreaming => {
                self.stop_streaming();
                self.state.status = self.streaming.status_line();
                self.render();
            }
            UserAction::IncreaseSpeed => {
                self.state.status = self.streaming.increase_speed();
            }
            UserAction::DecreaseSpeed => {
                self.state.status = self.streaming.decrease_speed();
            }
            UserAction::ScrollUp => self.scroll_by(-1),
            UserAction::ScrollDown => self.scroll_by(1),
            UserAction::PageUp => self.scroll_by(-self.page()),
            UserAction::PageDown => self.scroll_by(self.page()),
            UserAction::ScrollTop => self.state.scroll = 0,
            UserAction::ScrollBottom => self.state.scroll = self.max_scroll(),
        }
        vec![AppEffect::RequestFrame]
    }

    fn handle_runtime(&mut self, action: RuntimeAction, now: Instant) -> Vec<AppEffect> {
        match action {
            RuntimeAction::Resize(viewport) => {
                if viewport == self.state.viewport {
                    return Vec::new();
                }
                self.state.viewport = viewport;
                self.render();
                vec![AppEffect::RequestFrame]
            }
            RuntimeAction::Tick => {
                let mut changed = false;
                while let Some((id, task)) = self.scheduler.pop_due(now) {
                    changed |= match task {
                        TimerTask::PollFile => self.on_poll(id, now),
                        TimerTask::StreamTick => self.on_stream_tick(id, now),
                    };
                }
                if changed {
                    vec![AppEffect::RequestFrame]
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn on_poll(&mut self, id: TaskId, now: Instant) -> bool {
        match self.monitor.on_timer(id, &self.fs, &mut self.scheduler, now) {
            Some(event) => self.apply_watch_event(event),
            None => false,
        }
    }

    fn on_stream_tick(&mut self, id: TaskId, now: Instant) -> bool {
        match self.streaming.on_timer(id, &mut self.scheduler, now) {
            Some(TickOutcome::Continued) => {}
            Some(TickOutcome::Completed(status)) => self.state.status = status,
            None => return false,
        }
        if self.state.view == ViewMode::Stream {
            self.render();
        }
        true
    }

    /// Returns true if the display changed.
    fn apply_watch_event(&mut self, event: WatchEvent) -> bool {
        match event {
            WatchEvent::Updated { content, modified } => {
                self.record_mod_time(modified);
                self.streaming.set_source(content.clone());
                self.state.document.raw_text = content;
                self.state.load_error = None;
                if self.streaming.is_active() {
                    tracing::debug!("file changed during playback; source swapped");
                    return false;
                }
                self.state.view = ViewMode::Document;
                self.render();
                true
            }
            WatchEvent::Failed(err) => {
                tracing::warn!(error = %err, "watch poll failed");
                false
            }
        }
    }

    /// Reads the document from disk. On failure the error panel replaces
    /// the document view.
    fn load_document(&mut self) -> bool {
        match self.read_document() {
            Ok((content, modified)) => {
                tracing::info!(
                    path = %self.state.document.path.display(),
                    bytes = content.len(),
                    "loaded document"
                );
                if let Some(modified) = modified {
                    self.record_mod_time(modified);
                    self.monitor.observe(modified);
                }
                self.streaming.set_source(content.clone());
                self.state.document.raw_text = content;
                self.state.load_error = None;
                self.state.view = ViewMode::Document;
                true
            }
            Err(err) => {
                tracing::warn!(path = %err.path().display(), error = %err, "failed to load document");
                let message = err.to_string();
                self.state.load_error = Some(message.clone());
                self.state.view = ViewMode::Error(message);
                false
            }
        }
    }

    fn read_document(&self) -> Result<(String, Option<SystemTime>), LoadError> {
        let path = &self.state.document.path;
        if !self.fs.exists(path) {
            return Err(LoadError::NotFound(path.clone()));
        }
        let content = self
            .fs
            .read_to_string(path)
            .map_err(|source| LoadError::Read {
                path: path.clone(),
                source,
            })?;
        Ok((content, self.fs.modified(path).ok()))
    }

    fn record_mod_time(&mut self, modified: SystemTime) {
        let doc = &mut self.state.document;
        if doc.last_known_mod_time.map_or(true, |known| modified > known) {
            doc.last_known_mod_time = Some(modified);
        }
    }

    /// Stops playback and returns the view to the document, or to the
    /// error panel if the document never loaded.
    fn stop_streaming(&mut self) {
        self.streaming.stop(&mut self.scheduler);
        if self.state.view == ViewMode::Stream {
            self.state.view = match &self.state.load_error {
                Some(message) => ViewMode::Error(message.clone()),
                None => ViewMode::Document,
            };
        }
    }

    /// Rebuilds the attached tree for the current view and lays it out.
    fn render(&mut self) {
        let theme = self.state.theme.current();
        let options = DispatchOptions {
            conceal: self.state.conceal,
            rule_max_width: self.state.rule_max_width,
        };
        let title = self.state.document.title();
        let tree = match &self.state.view {
            ViewMode::Document => {
                self.refresh
                    .refresh(&title, &self.state.document.raw_text, theme, options)
            }
            ViewMode::Stream => {
                self.refresh
                    .show_stream(&title, self.streaming.buffer(), theme, options)
            }
            ViewMode::Error(message) => self.refresh.show_error(message, theme),
        };
        self.lines = layout_tree(tree, self.state.viewport.width);

        let max = self.max_scroll();
        if self.state.view == ViewMode::Stream && self.streaming.sticky_bottom() {
            self.state.scroll = max;
        } else {
            self.state.scroll = self.state.scroll.min(max);
        }
    }

    fn page(&self) -> isize {
        isize::try_from(self.state.viewport.height.max(1)).unwrap_or(1)
    }

    fn max_scroll(&self) -> usize {
        self.lines
            .len()
            .saturating_sub(usize::from(self.state.viewport.height))
    }

    fn scroll_by(&mut self, delta: isize) {
        let target = self.state.scroll.saturating_add_signed(delta);
        self.state.scroll = target.min(self.max_scroll());
    }
}

#[cfg(test)]
mod tests;
