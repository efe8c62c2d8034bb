// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No state
// and no decisions about when to emit; that is the `CellWriter`'s job.
//
// Cursor positions are 0-indexed in our API and converted to the 1-indexed
// form the terminal expects.
use std::io::{self, Write};

use crate::cell::Attr;
use crate::color::CellColor;

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(x, y)` with CUP.
#[inline]
pub fn cursor_to(w: &mut impl Write, x: u16, y: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", u32::from(y) + 1, u32::from(x) + 1)
}

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Reset all SGR attributes to terminal defaults (SGR 0).
///
/// The stateful writer must forget its tracked style after this.
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

// ─── Colors ──────────────────────────────────────────────────────────────────

/// Set the foreground color.
///
/// Compact SGR codes for the 16 standard colors (30–37, 90–97), the
/// 256-color form for higher indices, and 24-bit for RGB.
pub fn fg(w: &mut impl Write, color: CellColor) -> io::Result<()> {
    match color {
        CellColor::Default => w.write_all(b"\x1b[39m"),
        CellColor::Ansi256(idx) if idx < 8 => write!(w, "\x1b[{}m", 30 + u16::from(idx)),
        CellColor::Ansi256(idx) if idx < 16 => write!(w, "\x1b[{}m", 82 + u16::from(idx)),
        CellColor::Ansi256(idx) => write!(w, "\x1b[38;5;{idx}m"),
        CellColor::Rgb(r, g, b) => write!(w, "\x1b[38;2;{r};{g};{b}m"),
    }
}

/// Set the background color. Same encoding as [`fg`] with BG codes.
pub fn bg(w: &mut impl Write, color: CellColor) -> io::Result<()> {
    match color {
        CellColor::Default => w.write_all(b"\x1b[49m"),
        CellColor::Ansi256(idx) if idx < 8 => write!(w, "\x1b[{}m", 40 + u16::from(idx)),
        CellColor::Ansi256(idx) if idx < 16 => write!(w, "\x1b[{}m", 92 + u16::from(idx)),
        CellColor::Ansi256(idx) => write!(w, "\x1b[48;5;{idx}m"),
        CellColor::Rgb(r, g, b) => write!(w, "\x1b[48;2;{r};{g};{b}m"),
    }
}

// ─── Text Attributes ─────────────────────────────────────────────────────────

/// Emit SGR codes for text attributes as one CSI sequence.
///
/// `\x1b[1;7m` for bold + inverse. Writes nothing for an empty set.
pub fn attrs(w: &mut impl Write, attr: Attr) -> io::Result<()> {
    const CODES: [(Attr, &[u8]); 8] = [
        (Attr::BOLD, b"1"),
        (Attr::DIM, b"2"),
        (Attr::ITALIC, b"3"),
        (Attr::UNDERLINE, b"4"),
        (Attr::BLINK, b"5"),
        (Attr::INVERSE, b"7"),
        (Attr::HIDDEN, b"8"),
        (Attr::STRIKETHROUGH, b"9"),
    ];

    if attr.is_empty() {
        return Ok(());
    }

    w.write_all(b"\x1b[")?;
    let mut first = true;
    for (flag, code) in CODES {
        if attr.contains(flag) {
            if !first {
                w.write_all(b";")?;
            }
            w.write_all(code)?;
            first = false;
        }
    }
    w.write_all(b"m")
}

// ─── Synchronized Output ─────────────────────────────────────────────────────

/// Begin synchronized output (DEC 2026). The terminal holds the frame
/// until [`end_sync`].
#[inline]
pub fn begin_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2026h")
}

#[inline]
pub fn end_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2026l")
}

// ─── Alternate Screen ───────────────────────────────────────────────────────

/// Enter the alternate screen buffer (DEC 1049).
#[inline]
pub fn enter_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049h")
}

/// Leave the alternate screen and bring back the shell's content.
#[inline]
pub fn exit_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049l")
}

// ─── Tests ───────────────────────────────────────────────────────────────────
