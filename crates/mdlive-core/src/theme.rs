use ratatui::style::Color;

/// Used when a heading depth has no entry in the palette.
pub const DEFAULT_HEADING_COLOR: Color = Color::Rgb(255, 255, 255);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub foreground: Color,
    pub background_alt: Color,
    pub border: Color,
    pub accent: Color,
    pub error: Color,
    pub heading_colors: &'static [Color],
    pub code_label: Color,
    pub quote: Color,
    pub table: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeProfile {
    pub name: &'static str,
    pub background: Color,
    pub palette: Palette,
    /// Key into syntect's default theme set.
    pub syntax_theme: &'static str,
}

impl ThemeProfile {
    pub fn heading_color(&self, depth: u8) -> Color {
        usize::from(depth)
            .checked_sub(1)
            .and_then(|idx| self.palette.heading_colors.get(idx))
            .copied()
            .unwrap_or(DEFAULT_HEADING_COLOR)
    }
}

const GITHUB_DARK_HEADINGS: [Color; 6] = [
    Color::Rgb(255, 107, 107),
    Color::Rgb(78, 205, 196),
    Color::Rgb(69, 183, 209),
    Color::Rgb(210, 168, 255),
    Color::Rgb(243, 166, 131),
    Color::Rgb(168, 218, 220),
];

const MONOKAI_HEADINGS: [Color; 6] = [
    Color::Rgb(249, 38, 114),
    Color::Rgb(166, 226, 46),
    Color::Rgb(102, 217, 239),
    Color::Rgb(174, 129, 255),
    Color::Rgb(253, 151, 31),
    Color::Rgb(230, 219, 116),
];

const NORD_HEADINGS: [Color; 6] = [
    Color::Rgb(136, 192, 208),
    Color::Rgb(129, 161, 193),
    Color::Rgb(94, 129, 172),
    Color::Rgb(180, 142, 173),
    Color::Rgb(163, 190, 140),
    Color::Rgb(235, 203, 139),
];

pub const THEMES: [ThemeProfile; 3] = [
    ThemeProfile {
        name: "github-dark",
        background: Color::Rgb(13, 17, 23),
        palette: Palette {
            foreground: Color::Rgb(230, 237, 243),
            background_alt: Color::Rgb(22, 27, 34),
            border: Color::Rgb(48, 54, 61),
            accent: Color::Rgb(88, 166, 255),
            error: Color::Rgb(248, 81, 73),
            heading_colors: &GITHUB_DARK_HEADINGS,
            code_label: Color::Rgb(255, 166, 87),
            quote: Color::Rgb(139, 148, 158),
            table: Color::Rgb(121, 192, 255),
        },
        syntax_theme: "base16-ocean.dark",
    },
    ThemeProfile {
        name: "monokai",
        background: Color::Rgb(39, 40, 34),
        palette: Palette {
            foreground: Color::Rgb(248, 248, 242),
            background_alt: Color::Rgb(62, 61, 50),
            border: Color::Rgb(117, 113, 94),
            accent: Color::Rgb(102, 217, 239),
            error: Color::Rgb(249, 38, 114),
            heading_colors: &MONOKAI_HEADINGS,
            code_label: Color::Rgb(253, 151, 31),
            quote: Color::Rgb(117, 113, 94),
            table: Color::Rgb(166, 226, 46),
        },
        syntax_theme: "base16-eighties.dark",
    },
    ThemeProfile {
        name: "nord",
        background: Color::Rgb(46, 52, 64),
        palette: Palette {
            foreground: Color::Rgb(216, 222, 233),
            background_alt: Color::Rgb(59, 66, 82),
            border: Color::Rgb(76, 86, 106),
            accent: Color::Rgb(136, 192, 208),
            error: Color::Rgb(191, 97, 106),
            heading_colors: &NORD_HEADINGS,
            code_label: Color::Rgb(208, 135, 112),
            quote: Color::Rgb(129, 161, 193),
            table: Color::Rgb(143, 188, 187),
        },
        syntax_theme: "base16-mocha.dark",
    },
];

/// Case-insensitive lookup into [`THEMES`].
pub fn theme_index_by_name(name: &str) -> Option<usize> {
    let wanted = name.trim();
    THEMES
        .iter()
        .position(|theme| theme.name.eq_ignore_ascii_case(wanted))
}

pub fn theme_names() -> impl Iterator<Item = &'static str> {
    THEMES.iter().map(|theme| theme.name)
}

/// Active theme, selected by index into [`THEMES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThemeContext {
    index: usize,
}

impl ThemeContext {
    pub fn new(index: usize) -> Self {
        Self {
            index: index % THEMES.len(),
        }
    }

    pub fn index(self) -> usize {
        self.index
    }

    pub fn current(self) -> &'static ThemeProfile {
        &THEMES[self.index]
    }

    pub fn next(self) -> Self {
        Self {
            index: (self.index + 1) % THEMES.len(),
        }
    }
}

const LANGUAGE_ALIASES: [(&str, &str); 10] = [
    ("js", "javascript"),
    ("ts", "typescript"),
    ("jsx", "javascript"),
    ("tsx", "typescript"),
    ("py", "python"),
    ("rb", "ruby"),
    ("sh", "bash"),
    ("shell", "bash"),
    ("yml", "yaml"),
    ("md", "markdown"),
];

/// Maps a fence tag to the canonical language name; unknown tags pass
/// through lower-cased.
pub fn canonical_language(lang: &str) -> String {
    let lower = lang.trim().to_ascii_lowercase();
    LANGUAGE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or(lower)
}
