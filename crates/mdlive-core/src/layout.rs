//! Flattens a [`RenderTree`] into terminal lines for a given width.
//!
//! Bordered blocks are drawn with box characters; widths are measured in
//! terminal cells.

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthChar;

use crate::render::{BorderKind, Chrome, RenderBlock, RenderTree};

/// Cell width of the narrowest content area a bordered block keeps.
const MIN_INNER_WIDTH: usize = 1;

struct BorderGlyphs {
    top_left: char,
    top_right: char,
    bottom_left: char,
    bottom_right: char,
    horizontal: char,
    vertical: char,
}

const ROUNDED: BorderGlyphs = BorderGlyphs {
    top_left: '╭',
    top_right: '╮',
    bottom_left: '╰',
    bottom_right: '╯',
    horizontal: '─',
    vertical: '│',
};

const PLAIN: BorderGlyphs = BorderGlyphs {
    top_left: '┌',
    top_right: '┐',
    bottom_left: '└',
    bottom_right: '┘',
    horizontal: '─',
    vertical: '│',
};

fn glyphs(kind: BorderKind) -> &'static BorderGlyphs {
    match kind {
        BorderKind::Rounded => &ROUNDED,
        BorderKind::Plain => &PLAIN,
    }
}

/// Top-level blocks are separated by one blank line.
pub fn layout_tree(tree: &RenderTree, width: u16) -> Vec<Line<'static>> {
    let width = usize::from(width).max(MIN_INNER_WIDTH);
    let mut out = Vec::new();
    for (idx, block) in tree.blocks.iter().enumerate() {
        if idx > 0 {
            out.push(Line::default());
        }
        layout_block(block, width, &mut out);
    }
    out
}

fn layout_block(block: &RenderBlock, width: usize, out: &mut Vec<Line<'static>>) {
    match block.chrome {
        Some(chrome) => layout_framed(block, chrome, width, out),
        None => layout_content(block, width, out),
    }
}

fn layout_content(block: &RenderBlock, width: usize, out: &mut Vec<Line<'static>>) {
    for line in &block.lines {
        let pieces = if block.wrap {
            wrap_line(line, width)
        } else {
            vec![clip_line(line, width)]
        };
        for piece in pieces {
            out.push(match block.background {
                Some(bg) => fill_line(piece, width, bg),
                None => piece,
            });
        }
    }
    for child in &block.children {
        layout_block(child, width, out);
    }
}

fn layout_framed(block: &RenderBlock, chrome: Chrome, width: usize, out: &mut Vec<Line<'static>>) {
    let g = glyphs(chrome.border);
    let pad = usize::from(chrome.padding);
    let inner_width = width.saturating_sub(2 + 2 * pad).max(MIN_INNER_WIDTH);
    let border_style = Style::default().fg(chrome.border_color);
    let fill_style = chrome
        .background
        .map_or(Style::default(), |bg| Style::default().bg(bg));

    let mut inner = Vec::new();
    layout_content(block, inner_width, &mut inner);
    for _ in 0..pad / 2 {
        inner.insert(0, Line::default());
        inner.push(Line::default());
    }

    let rule: String = std::iter::repeat(g.horizontal).take(inner_width + 2 * pad).collect();
    out.push(Line::from(Span::styled(
        format!("{}{rule}{}", g.top_left, g.top_right),
        border_style,
    )));
    for line in inner {
        let used = line_width(&line);
        let mut spans = vec![
            Span::styled(g.vertical.to_string(), border_style),
            Span::styled(" ".repeat(pad), fill_style),
        ];
        spans.extend(line.spans.into_iter().map(|span| {
            let style = fill_style.patch(span.style);
            Span::styled(span.content, style)
        }));
        spans.push(Span::styled(
            " ".repeat(inner_width.saturating_sub(used) + pad),
            fill_style,
        ));
        spans.push(Span::styled(g.vertical.to_string(), border_style));
        out.push(Line::from(spans));
    }
    out.push(Line::from(Span::styled(
        format!("{}{rule}{}", g.bottom_left, g.bottom_right),
        border_style,
    )));
}

pub fn line_width(line: &Line<'_>) -> usize {
    line.spans
        .iter()
        .flat_map(|span| span.content.chars())
        .map(|c| c.width().unwrap_or(0))
        .sum()
}

/// Breaks a line into rows no wider than `width`, keeping span styles.
pub fn wrap_line(line: &Line<'_>, width: usize) -> Vec<Line<'static>> {
    let width = width.max(MIN_INNER_WIDTH);
    let mut rows: Vec<Vec<Span<'static>>> = vec![Vec::new()];
    let mut used = 0;
    for span in &line.spans {
        let mut chunk = String::new();
        for c in span.content.chars() {
            let w = c.width().unwrap_or(0);
            if used + w > width && used > 0 {
                if !chunk.is_empty() {
                    if let Some(row) = rows.last_mut() {
                        row.push(Span::styled(std::mem::take(&mut chunk), span.style));
                    }
                }
                rows.push(Vec::new());
                used = 0;
            }
            chunk.push(c);
            used += w;
        }
        if !chunk.is_empty() {
            if let Some(row) = rows.last_mut() {
                row.push(Span::styled(chunk, span.style));
            }
        }
    }
    rows.into_iter()
        .map(|spans| Line::from(spans).style(line.style))
        .collect()
}

/// Cuts a line at `width` cells.
pub fn clip_line(line: &Line<'_>, width: usize) -> Line<'static> {
    let mut used = 0;
    let mut spans = Vec::new();
    for span in &line.spans {
        let mut kept = String::new();
        for c in span.content.chars() {
            let w = c.width().unwrap_or(0);
            if used + w > width {
                break;
            }
            kept.push(c);
            used += w;
        }
        let truncated = kept.len() < span.content.len();
        if !kept.is_empty() {
            spans.push(Span::styled(kept, span.style));
        }
        if truncated {
            break;
        }
    }
    Line::from(spans).style(line.style)
}

fn fill_line(line: Line<'static>, width: usize, bg: Color) -> Line<'static> {
    let used = line_width(&line);
    let fill = Style::default().bg(bg);
    let style = line.style;
    let mut spans: Vec<Span<'static>> = line
        .spans
        .into_iter()
        .map(|span| {
            let patched = fill.patch(span.style);
            Span::styled(span.content, patched)
        })
        .collect();
    if used < width {
        spans.push(Span::styled(" ".repeat(width - used), fill));
    }
    Line::from(spans).style(style)
}
