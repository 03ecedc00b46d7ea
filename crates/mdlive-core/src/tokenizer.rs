//! Markdown lexer producing the [`Token`] sequence the dispatcher consumes.
//!
//! Block structure comes from `pulldown-cmark`. Inline content is written
//! back out as markdown markup so token text looks the way the author typed
//! it; stripping or styling that markup is the renderer's business.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::token::{ListItem, Token};

pub fn tokenize(text: &str) -> Vec<Token> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut builder = TokenBuilder::default();
    for event in Parser::new_ext(text, options) {
        builder.push(event);
    }
    builder.finish()
}

enum Container {
    Blockquote(Vec<Token>),
    List { ordered: bool, items: Vec<ListItem> },
    Item { blocks: Vec<Token>, inline: String },
    Discard { kind: &'static str },
}

enum Leaf {
    Paragraph(String),
    Heading(u8, String),
    Code { lang: Option<String>, text: String },
}

#[derive(Default)]
struct TableBuf {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: Option<String>,
}

#[derive(Default)]
struct TokenBuilder {
    tokens: Vec<Token>,
    stack: Vec<Container>,
    leaf: Option<Leaf>,
    table: Option<TableBuf>,
    link_targets: Vec<String>,
}

impl TokenBuilder {
    fn finish(mut self) -> Vec<Token> {
        while let Some(container) = self.stack.pop() {
            self.close(container);
        }
        self.tokens
    }

    fn push(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if let Some(Leaf::Code { text: code, .. }) = self.leaf.as_mut() {
                    code.push_str(&text);
                } else {
                    self.push_inline(&text);
                }
            }
            Event::Code(code) => self.push_inline(&format!("`{code}`")),
            Event::InlineHtml(html) => self.push_inline(&html),
            Event::FootnoteReference(name) => self.push_inline(&format!("[^{name}]")),
            Event::SoftBreak | Event::HardBreak => self.push_inline("\n"),
            Event::TaskListMarker(done) => self.push_inline(if done { "[x] " } else { "[ ] " }),
            Event::Rule => self.emit(Token::Hr),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.leaf = Some(Leaf::Paragraph(String::new())),
            Tag::Heading { level, .. } => {
                self.leaf = Some(Leaf::Heading(heading_depth(level), String::new()));
            }
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                self.leaf = Some(Leaf::Code {
                    lang,
                    text: String::new(),
                });
            }
            Tag::BlockQuote(_) => self.stack.push(Container::Blockquote(Vec::new())),
            Tag::List(start) => self.stack.push(Container::List {
                ordered: start.is_some(),
                items: Vec::new(),
            }),
            Tag::Item => self.stack.push(Container::Item {
                blocks: Vec::new(),
                inline: String::new(),
            }),
            Tag::Table(_) => self.table = Some(TableBuf::default()),
            Tag::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.cell = Some(String::new());
                }
            }
            Tag::HtmlBlock => self.stack.push(Container::Discard { kind: "html" }),
            Tag::FootnoteDefinition(_) => self.stack.push(Container::Discard { kind: "footnote" }),
            Tag::Emphasis => self.push_inline("*"),
            Tag::Strong => self.push_inline("**"),
            Tag::Strikethrough => self.push_inline("~~"),
            Tag::Link { dest_url, .. } => {
                self.link_targets.push(dest_url.to_string());
                self.push_inline("[");
            }
            Tag::Image { dest_url, .. } => {
                self.link_targets.push(dest_url.to_string());
                self.push_inline("![");
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::CodeBlock => {
                if let Some(leaf) = self.leaf.take() {
                    let token = match leaf {
                        Leaf::Paragraph(text) => Token::Paragraph { text },
                        Leaf::Heading(depth, text) => Token::Heading { depth, text },
                        Leaf::Code { lang, text } => Token::Code {
                            lang,
                            text: text.strip_suffix('\n').unwrap_or(&text).to_string(),
                        },
                    };
                    self.emit(token);
                }
            }
            TagEnd::BlockQuote
            | TagEnd::List(_)
            | TagEnd::Item
            | TagEnd::HtmlBlock
            | TagEnd::FootnoteDefinition => {
                if let Some(container) = self.stack.pop() {
                    self.close(container);
                }
            }
            TagEnd::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    let cell = table.cell.take().unwrap_or_default();
                    table.row.push(cell.trim().to_string());
                }
            }
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.header = std::mem::take(&mut table.row);
                }
            }
            TagEnd::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.emit(Token::Table {
                        header: table.header,
                        rows: table.rows,
                    });
                }
            }
            TagEnd::Emphasis => self.push_inline("*"),
            TagEnd::Strong => self.push_inline("**"),
            TagEnd::Strikethrough => self.push_inline("~~"),
            TagEnd::Link | TagEnd::Image => {
                let target = self.link_targets.pop().unwrap_or_default();
                self.push_inline(&format!("]({target})"));
            }
            _ => {}
        }
    }

    fn close(&mut self, container: Container) {
        match container {
            Container::Blockquote(children) => self.emit(Token::Blockquote { children }),
            Container::List { ordered, items } => self.emit(Token::List { ordered, items }),
            Container::Item { mut blocks, inline } => {
                flush_item_inline(&mut blocks, inline);
                if let Some(Container::List { items, .. }) = self.stack.last_mut() {
                    items.push(ListItem::new(blocks));
                }
            }
            Container::Discard { kind } => self.emit(Token::Other {
                kind: kind.to_string(),
            }),
        }
    }

    fn emit(&mut self, token: Token) {
        match self.stack.last_mut() {
            None => self.tokens.push(token),
            Some(Container::Blockquote(children)) => children.push(token),
            Some(Container::Item { blocks, inline }) => {
                flush_item_inline(blocks, std::mem::take(inline));
                blocks.push(token);
            }
            Some(Container::List { .. }) | Some(Container::Discard { .. }) => {}
        }
    }

    fn push_inline(&mut self, text: &str) {
        if let Some(table) = self.table.as_mut() {
            if let Some(cell) = table.cell.as_mut() {
                cell.push_str(text);
                return;
            }
        }
        match self.leaf.as_mut() {
            Some(Leaf::Paragraph(buf)) | Some(Leaf::Heading(_, buf)) => buf.push_str(text),
            Some(Leaf::Code { text: buf, .. }) => buf.push_str(text),
            None => {
                if let Some(Container::Item { inline, .. }) = self.stack.last_mut() {
                    inline.push_str(text);
                }
            }
        }
    }
}

fn flush_item_inline(blocks: &mut Vec<Token>, inline: String) {
    if !inline.trim().is_empty() {
        blocks.push(Token::Paragraph { text: inline });
    }
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn heading_and_paragraph_keep_inline_markup() {
        let tokens = tokenize("# Title\n\nHello *world*.");
        assert_eq!(
            tokens,
            vec![
                Token::Heading {
                    depth: 1,
                    text: "Title".to_string(),
                },
                Token::Paragraph {
                    text: "Hello *world*.".to_string(),
                },
            ]
        );
    }

    #[test]
    fn fenced_code_keeps_language_and_drops_trailing_newline() {
        let tokens = tokenize("```py title\nprint(1)\nprint(2)\n```\n");
        assert_eq!(
            tokens,
            vec![Token::Code {
                lang: Some("py".to_string()),
                text: "print(1)\nprint(2)".to_string(),
            }]
        );
    }

    #[test]
    fn tight_list_items_become_paragraphs() {
        let tokens = tokenize("1. first **bold**\n2. second `code`\n");
        assert_eq!(
            tokens,
            vec![Token::List {
                ordered: true,
                items: vec![
                    ListItem::paragraph("first **bold**"),
                    ListItem::paragraph("second `code`"),
                ],
            }]
        );
    }

    #[test]
    fn nested_list_stays_inside_its_item() {
        let tokens = tokenize("- outer\n  - inner\n");
        let Token::List { ordered, items } = &tokens[0] else {
            panic!("expected list, got {tokens:?}");
        };
        assert!(!ordered);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].blocks[0], Token::Paragraph { text: "outer".to_string() });
        assert!(matches!(items[0].blocks[1], Token::List { .. }));
    }

    #[test]
    fn blockquote_children_and_rule() {
        let tokens = tokenize("> quoted [link](https://x.dev)\n\n---\n");
        assert_eq!(
            tokens,
            vec![
                Token::Blockquote {
                    children: vec![Token::Paragraph {
                        text: "quoted [link](https://x.dev)".to_string(),
                    }],
                },
                Token::Hr,
            ]
        );
    }

    #[test]
    fn table_collects_header_and_rows() {
        let tokens = tokenize("| a | b |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |\n");
        assert_eq!(
            tokens,
            vec![Token::Table {
                header: vec!["a".to_string(), "b".to_string()],
                rows: vec![
                    vec!["1".to_string(), "2".to_string()],
                    vec!["3".to_string(), "4".to_string()],
                ],
            }]
        );
    }

    #[test]
    fn html_block_maps_to_catch_all() {
        let tokens = tokenize("<div>\nhi\n</div>\n");
        assert_eq!(
            tokens,
            vec![Token::Other {
                kind: "html".to_string(),
            }]
        );
    }
}
