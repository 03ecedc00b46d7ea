//! Plain-text flattening of inline markdown.
//!
//! Inline emphasis, code spans and links are not styled; they are reduced to
//! their text by a fixed list of substitutions.

use std::sync::OnceLock;

use regex::Regex;

use crate::token::{ListItem, Token};

static SUBSTITUTIONS: OnceLock<Vec<Regex>> = OnceLock::new();

fn substitutions() -> &'static [Regex] {
    SUBSTITUTIONS.get_or_init(|| {
        [
            r"\*\*(.+?)\*\*",
            r"\*(.+?)\*",
            r"__(.+?)__",
            r"_(.+?)_",
            r"`(.+?)`",
            r"\[(.+?)\]\(.+?\)",
        ]
        .into_iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
    })
}

/// Removes bold, italic, inline-code and link markup, keeping the inner text.
pub fn strip_markup(text: &str) -> String {
    substitutions()
        .iter()
        .fold(text.to_string(), |acc, re| re.replace_all(&acc, "$1").into_owned())
}

/// Flattens a list item to one line of plain text. Nested structure is
/// dropped; only the text of leaf blocks survives.
pub fn list_item_text(item: &ListItem) -> String {
    let text: String = item.blocks.iter().filter_map(Token::text).collect();
    strip_markup(text.trim())
}

/// Joins the paragraphs of a blockquote with single spaces.
pub fn blockquote_text(children: &[Token]) -> String {
    let mut text = String::new();
    for child in children {
        if let Token::Paragraph { text: para } = child {
            text.push_str(para);
            text.push(' ');
        }
    }
    strip_markup(text.trim())
}

pub fn heading_marker(depth: u8) -> String {
    "#".repeat(usize::from(depth))
}

pub fn list_bullet(ordered: bool, index: usize) -> String {
    if ordered {
        format!("{}. ", index + 1)
    } else {
        "• ".to_string()
    }
}

/// Rule drawn under level 1 and 2 headings.
pub fn heading_rule(depth: u8, length: usize, max_width: usize) -> String {
    let ch = if depth == 1 { '━' } else { '─' };
    std::iter::repeat(ch).take(length.min(max_width)).collect()
}
