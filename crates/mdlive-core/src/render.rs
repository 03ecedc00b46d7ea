//! Layout blocks produced by the dispatcher and painted by the frontend.

use ratatui::style::Color;
use ratatui::text::Line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRole {
    Header,
    Heading(u8),
    Paragraph,
    Code,
    CodeLabel,
    CodeBody,
    List,
    ListItem,
    Blockquote,
    QuoteLine,
    Rule,
    Table,
    ErrorPanel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderKind {
    Rounded,
    Plain,
}

/// Border and fill drawn around a block's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chrome {
    pub border: BorderKind,
    pub border_color: Color,
    pub background: Option<Color>,
    pub padding: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderBlock {
    pub role: BlockRole,
    pub lines: Vec<Line<'static>>,
    /// Soft-wrap long lines to the viewport instead of clipping them.
    pub wrap: bool,
    pub background: Option<Color>,
    pub chrome: Option<Chrome>,
    pub children: Vec<RenderBlock>,
}

impl RenderBlock {
    pub fn new(role: BlockRole) -> Self {
        Self {
            role,
            lines: Vec::new(),
            wrap: false,
            background: None,
            chrome: None,
            children: Vec::new(),
        }
    }

    pub fn with_lines(mut self, lines: Vec<Line<'static>>) -> Self {
        self.lines = lines;
        self
    }

    pub fn with_line(mut self, line: Line<'static>) -> Self {
        self.lines.push(line);
        self
    }

    pub fn wrapped(mut self) -> Self {
        self.wrap = true;
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn with_chrome(mut self, chrome: Chrome) -> Self {
        self.chrome = Some(chrome);
        self
    }

    pub fn with_child(mut self, child: RenderBlock) -> Self {
        self.children.push(child);
        self
    }

    /// Own lines followed by every descendant's lines, one string per line.
    pub fn text_lines(&self) -> Vec<String> {
        let mut out: Vec<String> = self.lines.iter().map(line_text).collect();
        for child in &self.children {
            out.extend(child.text_lines());
        }
        out
    }

    /// Number of blocks in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(RenderBlock::node_count).sum::<usize>()
    }
}

pub fn line_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|span| span.content.as_ref()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeKind {
    Document,
    Stream,
    Error,
}

/// The set of blocks attached to the display root.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTree {
    pub id: u64,
    pub kind: TreeKind,
    pub background: Color,
    pub blocks: Vec<RenderBlock>,
}

impl RenderTree {
    pub fn node_count(&self) -> usize {
        self.blocks.iter().map(RenderBlock::node_count).sum()
    }

    /// Releases the tree. Returns the number of nodes released.
    pub fn dispose(self) -> usize {
        let released = self.node_count();
        tracing::trace!(tree = self.id, released, "disposed render tree");
        released
    }
}
