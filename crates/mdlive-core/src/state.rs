use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::theme::ThemeContext;

/// The watched file and its last loaded content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub raw_text: String,
    /// `None` until the first successful read of `path`.
    pub last_known_mod_time: Option<SystemTime>,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            raw_text: String::new(),
            last_known_mod_time: None,
        }
    }

    /// File name shown in the header, falling back to the full path.
    pub fn title(&self) -> String {
        title_for(&self.path)
    }
}

pub fn title_for(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    Help,
}

/// What the attached tree currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewMode {
    Document,
    Stream,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub document: Document,
    pub theme: ThemeContext,
    pub conceal: bool,
    pub overlay: Overlay,
    pub view: ViewMode,
    /// Set while the document has not loaded since the last failure.
    pub load_error: Option<String>,
    pub status: String,
    /// First visible line of the content pane.
    pub scroll: usize,
    pub viewport: Viewport,
    pub rule_max_width: usize,
}

impl AppState {
    pub fn new(path: impl Into<PathBuf>, theme: ThemeContext) -> Self {
        Self {
            document: Document::new(path),
            theme,
            conceal: false,
            overlay: Overlay::None,
            view: ViewMode::Document,
            load_error: None,
            status: String::new(),
            scroll: 0,
            viewport: Viewport::default(),
            rule_max_width: crate::config::DEFAULT_RULE_MAX_WIDTH,
        }
    }

    pub fn help_visible(&self) -> bool {
        self.overlay == Overlay::Help
    }
}
