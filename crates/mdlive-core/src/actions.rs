use crate::state::Viewport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    User(UserAction),
    Runtime(RuntimeAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    /// Closes the help overlay, or exits when none is shown.
    Escape,
    /// Exits unconditionally.
    Quit,
    ToggleHelp,
    CycleTheme,
    ToggleConceal,
    Reload,
    StartStreaming,
    ToggleEndless,
    StopStreaming,
    IncreaseSpeed,
    DecreaseSpeed,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    ScrollTop,
    ScrollBottom,
}

impl UserAction {
    /// Actions still handled while the help overlay is shown.
    pub fn allowed_over_help(self) -> bool {
        matches!(self, UserAction::Escape | UserAction::Quit | UserAction::ToggleHelp)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeAction {
    Resize(Viewport),
    /// Drain every scheduled continuation that is due.
    Tick,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEffect {
    RequestFrame,
    Exit,
}

/// One row per key binding, shown in the help overlay.
pub const KEY_BINDINGS: &[(&str, &str)] = &[
    ("ESC / Ctrl+C", "Exit"),
    ("?", "Toggle this help"),
    ("T", "Cycle theme"),
    ("C", "Toggle conceal mode"),
    ("R", "Reload file"),
    ("S", "Start / restart streaming"),
    ("E", "Toggle endless streaming"),
    ("X", "Stop streaming"),
    ("[ / ]", "Slower / faster streaming"),
    ("Up / Down, k / j", "Scroll one line"),
    ("PgUp / PgDn", "Scroll one page"),
    ("Home / End, g / G", "Jump to top / bottom"),
];
