use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};

use mdlive_core::actions::{AppAction, AppEffect, RuntimeAction, UserAction, KEY_BINDINGS};
use mdlive_core::controller::Controller;
use mdlive_core::monitor::FileSystem;
use mdlive_core::state::{AppState, Viewport};

/// Longest the loop sleeps waiting for input when no timer is pending.
const MAX_IDLE: Duration = Duration::from_millis(250);

struct TuiGuard;

impl Drop for TuiGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
    }
}

pub fn run<F: FileSystem>(mut controller: Controller<F>) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, crossterm::cursor::Hide)?;
    let _guard = TuiGuard; // Ensures terminal is restored on exit or panic

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut controller);
    controller.shutdown();
    result.map_err(|e| e.into())
}

fn run_app<B: Backend, F: FileSystem>(
    terminal: &mut Terminal<B>,
    controller: &mut Controller<F>,
) -> io::Result<()> {
    let size = terminal.size()?;
    controller.start(content_viewport(size.width, size.height), Instant::now());
    let mut dirty = true;

    loop {
        if dirty {
            terminal.draw(|f| draw(f, controller))?;
            dirty = false;
        }

        let mut effects = Vec::new();
        if event::poll(poll_timeout(controller.next_deadline(), Instant::now()))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Some(action) = key_to_action(key) {
                        effects.extend(controller.handle(AppAction::User(action), Instant::now()));
                    }
                }
                Event::Resize(width, height) => {
                    let viewport = content_viewport(width, height);
                    effects.extend(controller.handle(
                        AppAction::Runtime(RuntimeAction::Resize(viewport)),
                        Instant::now(),
                    ));
                }
                _ => {}
            }
        }
        effects.extend(controller.handle(AppAction::Runtime(RuntimeAction::Tick), Instant::now()));

        for effect in effects {
            match effect {
                AppEffect::RequestFrame => dirty = true,
                AppEffect::Exit => return Ok(()),
            }
        }
    }
}

fn poll_timeout(deadline: Option<Instant>, now: Instant) -> Duration {
    deadline
        .map(|deadline| deadline.saturating_duration_since(now))
        .unwrap_or(MAX_IDLE)
        .min(MAX_IDLE)
}

/// The last row is the status bar.
fn content_viewport(width: u16, height: u16) -> Viewport {
    Viewport {
        width,
        height: height.saturating_sub(1),
    }
}

fn key_to_action(key: KeyEvent) -> Option<UserAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(UserAction::Quit),
            _ => None,
        };
    }
    let action = match key.code {
        KeyCode::Esc => UserAction::Escape,
        KeyCode::Char('?') => UserAction::ToggleHelp,
        KeyCode::Char('[') => UserAction::DecreaseSpeed,
        KeyCode::Char(']') => UserAction::IncreaseSpeed,
        KeyCode::Char('g') | KeyCode::Home => UserAction::ScrollTop,
        KeyCode::Char('G') | KeyCode::End => UserAction::ScrollBottom,
        KeyCode::Char('k') | KeyCode::Up => UserAction::ScrollUp,
        KeyCode::Char('j') | KeyCode::Down => UserAction::ScrollDown,
        KeyCode::PageUp => UserAction::PageUp,
        KeyCode::PageDown => UserAction::PageDown,
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            't' => UserAction::CycleTheme,
            'c' => UserAction::ToggleConceal,
            'r' => UserAction::Reload,
            's' => UserAction::StartStreaming,
            'e' => UserAction::ToggleEndless,
            'x' => UserAction::StopStreaming,
            _ => return None,
        },
        _ => return None,
    };
    Some(action)
}

fn draw<F: FileSystem>(f: &mut Frame, controller: &Controller<F>) {
    let state = controller.state();
    let theme = state.theme.current();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(f.area());

    let background = controller
        .tree()
        .map_or(theme.background, |tree| tree.background);
    let content = Paragraph::new(controller.visible_lines().to_vec()).style(
        Style::default()
            .fg(theme.palette.foreground)
            .bg(background),
    );
    f.render_widget(content, chunks[0]);

    let status = Paragraph::new(status_line(state)).style(
        Style::default()
            .fg(theme.palette.foreground)
            .bg(theme.palette.background_alt),
    );
    f.render_widget(status, chunks[1]);

    if state.help_visible() {
        render_help(f, state);
    }
}

fn status_line(state: &AppState) -> Line<'static> {
    let palette = &state.theme.current().palette;
    let muted = Style::default().fg(palette.border);
    Line::from(vec![
        Span::styled(format!(" {}", state.status), Style::default().fg(palette.accent)),
        Span::styled(" | ", muted),
        Span::raw(format!("theme: {}", state.theme.current().name)),
        Span::styled(" | ", muted),
        Span::raw(format!("conceal: {}", if state.conceal { "on" } else { "off" })),
        Span::styled(" | ", muted),
        Span::styled("? help", muted),
    ])
}

fn render_help(f: &mut Frame, state: &AppState) {
    let palette = &state.theme.current().palette;
    let area = centered_rect(60, 70, f.area());
    f.render_widget(Clear, area);

    let key_width = KEY_BINDINGS
        .iter()
        .map(|(keys, _)| keys.chars().count())
        .max()
        .unwrap_or(0);
    let lines: Vec<Line<'static>> = KEY_BINDINGS
        .iter()
        .map(|(keys, description)| {
            Line::from(vec![
                Span::styled(
                    format!("  {keys:<key_width$}  "),
                    Style::default()
                        .fg(palette.accent)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(*description),
            ])
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help (? or ESC to close) ")
        .border_style(Style::default().fg(palette.border))
        .style(
            Style::default()
                .fg(palette.foreground)
                .bg(palette.background_alt),
        );
    f.render_widget(Paragraph::new(lines).block(block), area);
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
    use std::path::Path;

    use mdlive_core::config::Config;
    use mdlive_core::monitor::OsFileSystem;
    use mdlive_core::theme::ThemeContext;
    use pretty_assertions::assert_eq;
    use ratatui::backend::TestBackend;

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = usize::from(buffer.area.width);
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn controller_for(path: &Path) -> Controller<OsFileSystem> {
        Controller::new(OsFileSystem, path, &Config::default(), ThemeContext::default())
    }

    #[test]
    fn command_letters_are_case_insensitive() {
        assert_eq!(key_to_action(key(KeyCode::Char('t'))), Some(UserAction::CycleTheme));
        assert_eq!(key_to_action(key(KeyCode::Char('T'))), Some(UserAction::CycleTheme));
        assert_eq!(key_to_action(key(KeyCode::Char('S'))), Some(UserAction::StartStreaming));
        assert_eq!(key_to_action(key(KeyCode::Char('x'))), Some(UserAction::StopStreaming));
        assert_eq!(key_to_action(key(KeyCode::Char('z'))), None);
    }

    #[test]
    fn navigation_and_exit_keys() {
        assert_eq!(key_to_action(key(KeyCode::Esc)), Some(UserAction::Escape));
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(UserAction::Quit)
        );
        assert_eq!(key_to_action(key(KeyCode::Char('c'))), Some(UserAction::ToggleConceal));
        assert_eq!(key_to_action(key(KeyCode::Char('g'))), Some(UserAction::ScrollTop));
        assert_eq!(key_to_action(key(KeyCode::Char('G'))), Some(UserAction::ScrollBottom));
        assert_eq!(key_to_action(key(KeyCode::Char(']'))), Some(UserAction::IncreaseSpeed));
        assert_eq!(key_to_action(key(KeyCode::PageDown)), Some(UserAction::PageDown));
    }

    #[test]
    fn poll_timeout_waits_for_next_deadline_but_is_capped() {
        let now = Instant::now();
        assert_eq!(poll_timeout(None, now), MAX_IDLE);
        assert_eq!(
            poll_timeout(Some(now + Duration::from_millis(40)), now),
            Duration::from_millis(40)
        );
        assert_eq!(poll_timeout(Some(now + Duration::from_secs(9)), now), MAX_IDLE);
        assert_eq!(poll_timeout(Some(now), now + Duration::from_secs(1)), Duration::ZERO);
    }

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = centered_rect(60, 50, area);
        assert_eq!(popup.width, 60);
        assert_eq!(popup.height, 20);
        assert!(popup.x >= area.x && popup.right() <= area.right());
    }

    #[test]
    fn draw_shows_document_and_status_bar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guide.md");
        std::fs::write(&path, "# Guide\n\nSome *body* text.").unwrap();

        let mut controller = controller_for(&path);
        controller.start(content_viewport(80, 24), Instant::now());
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| draw(f, &controller)).unwrap();

        let screen = screen_text(&terminal);
        assert!(screen.contains("guide.md - Markdown Preview"));
        assert!(screen.contains("# Guide"));
        assert!(screen.contains("Some body text."));
        assert!(screen.contains("theme: github-dark"));
        controller.shutdown();
    }

    #[test]
    fn draw_shows_error_panel_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.md");

        let mut controller = controller_for(&path);
        controller.start(content_viewport(80, 24), Instant::now());
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| draw(f, &controller)).unwrap();

        let screen = screen_text(&terminal);
        assert!(screen.contains("ERROR"));
        assert!(screen.contains("File not found:"));
    }

    #[test]
    fn help_overlay_lists_bindings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        std::fs::write(&path, "text").unwrap();

        let mut controller = controller_for(&path);
        controller.start(content_viewport(100, 40), Instant::now());
        controller.handle(AppAction::User(UserAction::ToggleHelp), Instant::now());
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|f| draw(f, &controller)).unwrap();

        let screen = screen_text(&terminal);
        assert!(screen.contains("Cycle theme"));
        assert!(screen.contains("Stop streaming"));
    }
}
