/// One structural unit of a markdown document. Text fields carry inline
/// markup as written (`**bold**`, `` `code` ``, `[label](url)`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Heading {
        depth: u8,
        text: String,
    },
    Paragraph {
        text: String,
    },
    Code {
        lang: Option<String>,
        text: String,
    },
    List {
        ordered: bool,
        items: Vec<ListItem>,
    },
    Blockquote {
        children: Vec<Token>,
    },
    Hr,
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Anything the renderer does not know how to draw (html blocks,
    /// footnote definitions, ...). Rendering skips it.
    Other {
        kind: String,
    },
}

impl Token {
    /// Text carried directly by leaf tokens.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Heading { text, .. } | Self::Paragraph { text } | Self::Code { text, .. } => {
                Some(text)
            }
            _ => None,
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Heading { .. } => "heading",
            Self::Paragraph { .. } => "paragraph",
            Self::Code { .. } => "code",
            Self::List { .. } => "list",
            Self::Blockquote { .. } => "blockquote",
            Self::Hr => "hr",
            Self::Table { .. } => "table",
            Self::Other { kind } => kind,
        }
    }
}

/// Blocks nested inside one list item. Tight items carry their inline text
/// as a single paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListItem {
    pub blocks: Vec<Token>,
}

impl ListItem {
    pub fn new(blocks: Vec<Token>) -> Self {
        Self { blocks }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            blocks: vec![Token::Paragraph { text: text.into() }],
        }
    }
}
