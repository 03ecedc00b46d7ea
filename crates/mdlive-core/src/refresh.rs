//! Ownership of the single attached [`RenderTree`].
//!
//! Every build path detaches and disposes the current tree before the
//! replacement is attached, so at most one tree is ever live.

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::dispatch::{dispatch_with, DispatchOptions};
use crate::render::{BlockRole, BorderKind, Chrome, RenderBlock, RenderTree, TreeKind};
use crate::theme::ThemeProfile;
use crate::tokenizer::tokenize;

#[derive(Debug, Default)]
pub struct RefreshController {
    current: Option<RenderTree>,
    next_id: u64,
    disposed_nodes: usize,
    repaint: bool,
}

impl RefreshController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&RenderTree> {
        self.current.as_ref()
    }

    /// Total nodes released by earlier refreshes.
    pub fn disposed_nodes(&self) -> usize {
        self.disposed_nodes
    }

    /// Returns and clears the pending repaint request.
    pub fn take_repaint(&mut self) -> bool {
        std::mem::take(&mut self.repaint)
    }

    /// Rebuilds the document tree from raw markdown.
    pub fn refresh(
        &mut self,
        title: &str,
        content: &str,
        theme: &ThemeProfile,
        options: DispatchOptions,
    ) -> &RenderTree {
        self.detach();
        let mut blocks = vec![header_block(title, theme)];
        blocks.extend(dispatch_with(&tokenize(content), theme, options));
        self.attach(TreeKind::Document, theme, blocks)
    }

    /// Shows a partially revealed buffer while playback is running.
    pub fn show_stream(
        &mut self,
        title: &str,
        buffer: &str,
        theme: &ThemeProfile,
        options: DispatchOptions,
    ) -> &RenderTree {
        self.detach();
        let mut blocks = vec![header_block(title, theme)];
        blocks.extend(dispatch_with(&tokenize(buffer), theme, options));
        self.attach(TreeKind::Stream, theme, blocks)
    }

    pub fn show_error(&mut self, message: &str, theme: &ThemeProfile) -> &RenderTree {
        self.detach();
        tracing::debug!(message, "showing error panel");
        self.attach(TreeKind::Error, theme, vec![error_panel(message, theme)])
    }

    fn detach(&mut self) {
        if let Some(tree) = self.current.take() {
            self.disposed_nodes += tree.dispose();
        }
    }

    fn attach(&mut self, kind: TreeKind, theme: &ThemeProfile, blocks: Vec<RenderBlock>) -> &RenderTree {
        self.next_id += 1;
        self.repaint = true;
        self.current.insert(RenderTree {
            id: self.next_id,
            kind,
            background: theme.background,
            blocks,
        })
    }
}

fn header_block(title: &str, theme: &ThemeProfile) -> RenderBlock {
    let palette = &theme.palette;
    RenderBlock::new(BlockRole::Header)
        .with_line(Line::from(Span::styled(
            format!("{title} - Markdown Preview"),
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
        )))
        .with_chrome(Chrome {
            border: BorderKind::Rounded,
            border_color: palette.border,
            background: Some(palette.background_alt),
            padding: 1,
        })
}

fn error_panel(message: &str, theme: &ThemeProfile) -> RenderBlock {
    let error = theme.palette.error;
    RenderBlock::new(BlockRole::ErrorPanel)
        .with_line(Line::styled(
            "ERROR",
            Style::default().fg(error).add_modifier(Modifier::BOLD),
        ))
        .with_line(Line::default())
        .with_line(Line::styled(message.to_string(), Style::default().fg(error)))
        .wrapped()
        .with_chrome(Chrome {
            border: BorderKind::Rounded,
            border_color: error,
            background: Some(theme.palette.background_alt),
            padding: 2,
        })
}
