// SPDX-License-Identifier: MIT
//
// Terminal colors for LED styling.
//
// A diode lights up in one of a handful of named colors, the same eight
// an ncurses `init_pair` call would accept. `AnsiColor` names them;
// `CellColor` is what a cell actually stores, and also admits the
// terminal's own default and the 256-color palette for callers that want
// more than eight.

use std::fmt;

// ─── AnsiColor ───────────────────────────────────────────────────────────────

/// The eight standard terminal colors, plus their bright variants.
///
/// Discriminants are the palette indices terminals use (0–15), so
/// conversion to [`CellColor::Ansi256`] is a plain cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AnsiColor {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
    BrightBlack = 8,
    BrightRed = 9,
    BrightGreen = 10,
    BrightYellow = 11,
    BrightBlue = 12,
    BrightMagenta = 13,
    BrightCyan = 14,
    BrightWhite = 15,
}

impl AnsiColor {
    /// Palette index (0–15).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }
}

impl From<AnsiColor> for CellColor {
    #[inline]
    fn from(color: AnsiColor) -> Self {
        Self::Ansi256(color.index())
    }
}

// ─── CellColor ───────────────────────────────────────────────────────────────

/// A fully resolved color as stored in a [`Cell`](crate::cell::Cell).
///
/// 4 bytes, `Copy`, cheap to compare in the diff loop.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellColor {
    /// The terminal's configured default (SGR 39 / 49).
    #[default]
    Default,
    /// Palette index. 0–7 standard, 8–15 bright, 16–255 extended.
    Ansi256(u8),
    /// 24-bit color.
    Rgb(u8, u8, u8),
}

impl CellColor {
    /// Whether this is the terminal default color.
    #[inline]
    #[must_use]
    pub const fn is_default(self) -> bool {
        matches!(self, Self::Default)
    }
}

impl fmt::Debug for CellColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "Default"),
            Self::Ansi256(idx) => write!(f, "Ansi({idx})"),
            Self::Rgb(r, g, b) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
