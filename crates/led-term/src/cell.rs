// SPDX-License-Identifier: MIT
//
// Cell: one character position on the terminal.
//
// A cell is a glyph plus how to draw it: foreground and background color
// and a set of text attributes. The LED rasterizer writes cells, the
// frame buffer stores them, the diff renderer compares them, and the
// cell writer turns them into bytes.
//
// Size: 16 bytes per cell, Copy. A 200×50 terminal is 160 KB per buffer.
//
// Wide characters (CJK, some emoji) occupy two columns. The first cell
// holds the codepoint; the second is a continuation cell (ch = 0) that the
// writer skips. Only the text panes ever produce them; diode glyphs are
// all single-width.

use crate::color::CellColor;

// ─── Text Attributes ─────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// Text attributes stored as a compact bitfield.
    ///
    /// These map directly to SGR parameters. Diode highlight flags (for
    /// example a collision shown in reverse video) are plain `Attr` values
    /// OR-ed onto the glyph's own attributes.
    ///
    /// ```
    /// use led_term::cell::Attr;
    ///
    /// let style = Attr::BOLD | Attr::INVERSE;
    /// assert!(style.contains(Attr::BOLD));
    /// assert!(!style.contains(Attr::DIM));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Attr: u8 {
        /// SGR 1: increased intensity.
        const BOLD          = 1 << 0;
        /// SGR 2: decreased intensity.
        const DIM           = 1 << 1;
        /// SGR 3: italic.
        const ITALIC        = 1 << 2;
        /// SGR 4: underline.
        const UNDERLINE     = 1 << 3;
        /// SGR 5: blink.
        const BLINK         = 1 << 4;
        /// SGR 7: swap foreground and background.
        const INVERSE       = 1 << 5;
        /// SGR 8: invisible text.
        const HIDDEN        = 1 << 6;
        /// SGR 9: crossed-out text.
        const STRIKETHROUGH = 1 << 7;
    }
}

// ─── Cell ────────────────────────────────────────────────────────────────────

/// A single terminal cell.
///
/// # Layout (16 bytes)
///
/// ```text
/// ┌──────────┬──────────┬──────────┬───────┬─────────┐
/// │ ch: u32  │ fg: Cell │ bg: Cell │ attrs │ padding │
/// │ 4 bytes  │  Color   │  Color   │  u8   │ 3 bytes │
/// └──────────┴──────────┴──────────┴───────┴─────────┘
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Unicode codepoint. `0` marks a continuation cell, `' '` is empty.
    pub ch: u32,
    /// Foreground (glyph) color.
    pub fg: CellColor,
    /// Background color.
    pub bg: CellColor,
    /// Text attributes.
    pub attrs: Attr,
}

const CONTINUATION: u32 = 0;
const SPACE: u32 = b' ' as u32;

impl Cell {
    /// An empty cell: space character, default colors, no attributes.
    pub const EMPTY: Self = Self {
        ch: SPACE,
        fg: CellColor::Default,
        bg: CellColor::Default,
        attrs: Attr::empty(),
    };

    /// A cell with a character and default styling.
    #[inline]
    #[must_use]
    pub const fn new(ch: char) -> Self {
        Self {
            ch: ch as u32,
            fg: CellColor::Default,
            bg: CellColor::Default,
            attrs: Attr::empty(),
        }
    }

    /// A cell with full styling.
    #[inline]
    #[must_use]
    pub const fn styled(ch: char, fg: CellColor, bg: CellColor, attrs: Attr) -> Self {
        Self {
            ch: ch as u32,
            fg,
            bg,
            attrs,
        }
    }

    /// Continuation cell for the second column of a wide character.
    #[inline]
    #[must_use]
    pub const fn continuation(fg: CellColor, bg: CellColor, attrs: Attr) -> Self {
        Self {
            ch: CONTINUATION,
            fg,
            bg,
            attrs,
        }
    }

    // ─── Queries ──────────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub const fn is_continuation(self) -> bool {
        self.ch == CONTINUATION
    }

    /// Whether this cell is visually empty (space, default colors, no attrs).
    #[inline]
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.ch == SPACE
            && self.fg.is_default()
            && self.bg.is_default()
            && self.attrs.is_empty()
    }

    /// The codepoint as a `char`. `None` for continuation cells.
    #[inline]
    #[must_use]
    pub const fn character(self) -> Option<char> {
        if self.ch == CONTINUATION {
            return None;
        }
        char::from_u32(self.ch)
    }

    // ─── Builders ─────────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub const fn with_fg(self, fg: CellColor) -> Self {
        Self { fg, ..self }
    }

    #[inline]
    #[must_use]
    pub const fn with_attrs(self, attrs: Attr) -> Self {
        Self { attrs, ..self }
    }
}

impl Default for Cell {
    #[inline]
    fn default() -> Self {
        Self::EMPTY
    }
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_continuation() {
            return write!(f, "Cell(continuation)");
        }
        let ch = char::from_u32(self.ch).unwrap_or('?');
        write!(f, "Cell({ch:?}")?;
        if !self.fg.is_default() {
            write!(f, ", fg={:?}", self.fg)?;
        }
        if !self.bg.is_default() {
            write!(f, ", bg={:?}", self.bg)?;
        }
        if !self.attrs.is_empty() {
            write!(f, ", {:?}", self.attrs)?;
        }
        write!(f, ")")
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
