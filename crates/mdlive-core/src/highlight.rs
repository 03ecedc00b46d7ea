use std::sync::OnceLock;

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

fn get_syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn get_theme_set() -> &'static ThemeSet {
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

/// Highlights `source` as `language`. Unknown languages render as plain
/// text in `fallback`; so does an unknown syntax theme.
pub fn highlight_code(
    source: &str,
    language: &str,
    syntax_theme: &str,
    fallback: Color,
) -> Vec<Line<'static>> {
    let ps = get_syntax_set();
    let Some(theme) = get_theme_set().themes.get(syntax_theme) else {
        return plain_lines(source, fallback);
    };
    let syntax = ps
        .find_syntax_by_token(language)
        .unwrap_or_else(|| ps.find_syntax_plain_text());
    let mut h = HighlightLines::new(syntax, theme);

    let mut lines = Vec::new();
    for raw in LinesWithEndings::from(source) {
        let ranges = match h.highlight_line(raw, ps) {
            Ok(ranges) => ranges,
            Err(_) => {
                lines.push(Line::styled(trim_eol(raw).to_string(), Style::default().fg(fallback)));
                continue;
            }
        };
        let spans: Vec<Span<'static>> = ranges
            .into_iter()
            .filter_map(|(style, text)| {
                let text = trim_eol(text);
                if text.is_empty() {
                    return None;
                }
                let fg = Color::Rgb(style.foreground.r, style.foreground.g, style.foreground.b);
                Some(Span::styled(text.to_string(), Style::default().fg(fg)))
            })
            .collect();
        lines.push(Line::from(spans));
    }
    if lines.is_empty() {
        lines.push(Line::default());
    }
    lines
}

fn plain_lines(source: &str, fallback: Color) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = source
        .lines()
        .map(|line| Line::styled(line.to_string(), Style::default().fg(fallback)))
        .collect();
    if lines.is_empty() {
        lines.push(Line::default());
    }
    lines
}

fn trim_eol(text: &str) -> &str {
    text.trim_end_matches(['\n', '\r'])
}
