// SPDX-License-Identifier: MIT
//
// Output buffering and stateful cell rendering.
//
//   OutputBuffer: collects a whole frame of escape bytes in memory so it
//   reaches the terminal in one write.
//
//   CellWriter: remembers the cursor position, colors and attributes it
//   last emitted and skips sequences that would not change anything. A row
//   of identically styled diode glyphs costs one SGR run, then bare bytes.

use std::io::{self, Write};

use crate::ansi;
use crate::cell::{Attr, Cell};
use crate::color::CellColor;

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// A byte buffer that accumulates ANSI output for a single `write()`.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 16_384;

impl OutputBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Write a codepoint as UTF-8. Invalid codepoints and the continuation
    /// marker produce `?`.
    pub fn write_codepoint(&mut self, cp: u32) {
        match char::from_u32(cp).filter(|&c| c != '\0') {
            Some(ch) => {
                let mut enc = [0u8; 4];
                self.buf.extend_from_slice(ch.encode_utf8(&mut enc).as_bytes());
            }
            None => self.buf.push(b'?'),
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write accumulated output to stdout and clear the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stdout fails.
    pub fn flush_stdout(&mut self) -> io::Result<()> {
        self.flush_to(&mut io::stdout().lock())
    }

    /// Write accumulated output to `w` and clear the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        if !self.buf.is_empty() {
            w.write_all(&self.buf)?;
            w.flush()?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Real flushing goes through flush_stdout() / flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── CellWriter ──────────────────────────────────────────────────────────────

/// Stateful cell renderer that skips redundant escapes.
///
/// - Cursor moves are skipped when the next cell is directly to the right
///   of the last one.
/// - An attribute change emits SGR 0 and the new set, which forgets both
///   tracked colors. Going from no attributes to some skips the reset.
/// - Colors are emitted only when they differ from the tracked ones.
#[allow(clippy::struct_field_names)]
pub struct CellWriter {
    last_x: i32,
    last_y: i32,
    last_fg: Option<CellColor>,
    last_bg: Option<CellColor>,
    last_attrs: Attr,
}

impl CellWriter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_x: -1,
            last_y: -1,
            last_fg: None,
            last_bg: None,
            last_attrs: Attr::empty(),
        }
    }

    /// Forget all tracked state. Call after a terminal reset or clear.
    #[allow(clippy::missing_const_for_fn)]
    pub fn reset_state(&mut self) {
        *self = Self::new();
    }

    /// Render one cell, emitting only the sequences it needs.
    pub fn render_cell(&mut self, out: &mut OutputBuffer, x: u16, y: u16, cell: &Cell) {
        let xi = i32::from(x);
        let yi = i32::from(y);

        if cell.is_continuation() && xi > 0 && self.last_x == xi - 1 && self.last_y == yi {
            // The wide character before it already covered this column.
            self.last_x = xi;
            return;
        }

        if yi != self.last_y || xi != self.last_x + 1 {
            ansi::cursor_to(out, x, y).ok();
        }

        self.apply_style(out, cell);
        if cell.is_continuation() {
            out.buf.push(b' ');
        } else {
            out.write_codepoint(cell.ch);
        }

        self.last_x = xi;
        self.last_y = yi;
    }

    fn apply_style(&mut self, out: &mut OutputBuffer, cell: &Cell) {
        if cell.attrs != self.last_attrs {
            if !self.last_attrs.is_empty() {
                ansi::reset(out).ok();
                self.last_fg = None;
                self.last_bg = None;
            }
            self.last_attrs = cell.attrs;
            ansi::attrs(out, cell.attrs).ok();
        }

        if self.last_fg != Some(cell.fg) {
            ansi::fg(out, cell.fg).ok();
            self.last_fg = Some(cell.fg);
        }

        if self.last_bg != Some(cell.bg) {
            ansi::bg(out, cell.bg).ok();
            self.last_bg = Some(cell.bg);
        }
    }
}

impl Default for CellWriter {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
