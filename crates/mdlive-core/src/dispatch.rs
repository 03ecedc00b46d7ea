//! Maps tokens to layout blocks. One top-level block per token; unknown
//! token kinds produce nothing.

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::config::DEFAULT_RULE_MAX_WIDTH;
use crate::highlight::highlight_code;
use crate::markup::{
    blockquote_text, heading_marker, heading_rule, list_bullet, list_item_text, strip_markup,
};
use crate::render::{BlockRole, BorderKind, Chrome, RenderBlock};
use crate::theme::{canonical_language, ThemeProfile};
use crate::token::{ListItem, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Hide heading markers and inline markup in headings.
    pub conceal: bool,
    pub rule_max_width: usize,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            conceal: false,
            rule_max_width: DEFAULT_RULE_MAX_WIDTH,
        }
    }
}

pub fn dispatch(tokens: &[Token], theme: &ThemeProfile) -> Vec<RenderBlock> {
    dispatch_with(tokens, theme, DispatchOptions::default())
}

pub fn dispatch_with(
    tokens: &[Token],
    theme: &ThemeProfile,
    options: DispatchOptions,
) -> Vec<RenderBlock> {
    tokens
        .iter()
        .filter_map(|token| render_token(token, theme, options))
        .collect()
}

fn render_token(token: &Token, theme: &ThemeProfile, options: DispatchOptions) -> Option<RenderBlock> {
    let block = match token {
        Token::Heading { depth, text } => render_heading(*depth, text, theme, options),
        Token::Paragraph { text } => render_paragraph(text, theme),
        Token::Code { lang, text } => render_code(lang.as_deref(), text, theme),
        Token::List { ordered, items } => render_list(*ordered, items, theme),
        Token::Blockquote { children } => render_blockquote(children, theme),
        Token::Hr => render_hr(theme, options),
        Token::Table { header, rows } => render_table(header.len(), rows.len(), theme),
        Token::Other { kind } => {
            tracing::trace!(kind = %kind, "skipping unrecognized token");
            return None;
        }
    };
    Some(block)
}

fn render_heading(depth: u8, text: &str, theme: &ThemeProfile, options: DispatchOptions) -> RenderBlock {
    let color = theme.heading_color(depth);
    let content = if options.conceal {
        strip_markup(text)
    } else {
        format!("{} {}", heading_marker(depth), text)
    };
    let rule_len = content.chars().count();
    let heading = Line::from(Span::styled(
        content,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ));

    let block = RenderBlock::new(BlockRole::Heading(depth)).with_line(heading);
    if depth <= 2 {
        block.with_line(Line::styled(
            heading_rule(depth, rule_len, options.rule_max_width),
            Style::default().fg(color),
        ))
    } else {
        block
    }
}

fn render_paragraph(text: &str, theme: &ThemeProfile) -> RenderBlock {
    let style = Style::default().fg(theme.palette.foreground);
    let lines = strip_markup(text)
        .split('\n')
        .map(|line| Line::styled(line.to_string(), style))
        .collect();
    RenderBlock::new(BlockRole::Paragraph)
        .with_lines(lines)
        .wrapped()
}

fn render_code(lang: Option<&str>, text: &str, theme: &ThemeProfile) -> RenderBlock {
    let palette = &theme.palette;
    let mut block = RenderBlock::new(BlockRole::Code).with_chrome(Chrome {
        border: BorderKind::Rounded,
        border_color: palette.border,
        background: None,
        padding: 0,
    });

    if let Some(lang) = lang {
        block = block.with_child(
            RenderBlock::new(BlockRole::CodeLabel)
                .with_line(Line::from(Span::styled(
                    lang.to_uppercase(),
                    Style::default()
                        .fg(palette.code_label)
                        .add_modifier(Modifier::BOLD),
                )))
                .with_background(palette.background_alt),
        );
    }

    let language = canonical_language(lang.unwrap_or("text"));
    let body = highlight_code(text, &language, theme.syntax_theme, palette.foreground);
    block.with_child(RenderBlock::new(BlockRole::CodeBody).with_lines(body))
}

fn render_list(ordered: bool, items: &[ListItem], theme: &ThemeProfile) -> RenderBlock {
    let style = Style::default().fg(theme.palette.foreground);
    items
        .iter()
        .enumerate()
        .fold(RenderBlock::new(BlockRole::List), |list, (idx, item)| {
            let line = format!("  {}{}", list_bullet(ordered, idx), list_item_text(item));
            list.with_child(
                RenderBlock::new(BlockRole::ListItem)
                    .with_line(Line::styled(line, style))
                    .wrapped(),
            )
        })
}

fn render_blockquote(children: &[Token], theme: &ThemeProfile) -> RenderBlock {
    let palette = &theme.palette;
    let style = Style::default()
        .fg(palette.quote)
        .add_modifier(Modifier::ITALIC);
    let quote = RenderBlock::new(BlockRole::Blockquote).with_chrome(Chrome {
        border: BorderKind::Plain,
        border_color: palette.border,
        background: Some(palette.background_alt),
        padding: 1,
    });
    blockquote_text(children).split('\n').fold(quote, |quote, line| {
        quote.with_child(
            RenderBlock::new(BlockRole::QuoteLine)
                .with_line(Line::styled(format!("│ {line}"), style))
                .wrapped(),
        )
    })
}

fn render_hr(theme: &ThemeProfile, options: DispatchOptions) -> RenderBlock {
    RenderBlock::new(BlockRole::Rule).with_line(Line::styled(
        "─".repeat(options.rule_max_width),
        Style::default().fg(theme.palette.border),
    ))
}

fn render_table(columns: usize, rows: usize, theme: &ThemeProfile) -> RenderBlock {
    let palette = &theme.palette;
    RenderBlock::new(BlockRole::Table)
        .with_chrome(Chrome {
            border: BorderKind::Rounded,
            border_color: palette.border,
            background: Some(palette.background_alt),
            padding: 1,
        })
        .with_line(Line::from(Span::styled(
            format!("TABLE: {columns} columns × {rows} rows"),
            Style::default()
                .fg(palette.table)
                .add_modifier(Modifier::BOLD),
        )))
}
