// SPDX-License-Identifier: MIT
//
// Differential renderer.
//
// Each presented frame is compared against the one before it and only the
// cells that changed are emitted. A game tick usually moves a handful of
// diodes, so a 200-column board repaints a few dozen cells instead of the
// whole screen.
//
// Per frame:
//
//   1. Windows and panes paint into a FrameBuffer.
//   2. `render` compares it with the stored previous frame.
//   3. Changed cells go through the CellWriter into an OutputBuffer.
//   4. `flush` writes the buffer in one syscall.
//
// Unchanged rows are skipped with one slice comparison. The frame is wrapped
// in synchronized output (DEC 2026) so terminals that support it never show
// half a frame.

use std::io::{self, Write};

use crate::ansi;
use crate::buffer::FrameBuffer;
use crate::output::{CellWriter, OutputBuffer};

// ─── RenderStats ─────────────────────────────────────────────────────────────

/// Counters from one render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub cells_rendered: usize,
    pub cells_skipped: usize,
    pub bytes_written: usize,
}

impl RenderStats {
    #[inline]
    #[must_use]
    pub const fn total_cells(&self) -> usize {
        self.cells_rendered + self.cells_skipped
    }
}

// ─── DiffRenderer ────────────────────────────────────────────────────────────

/// Emits ANSI output only for cells that changed since the last frame.
///
/// ```
/// use led_term::buffer::FrameBuffer;
/// use led_term::diff::DiffRenderer;
///
/// let mut renderer = DiffRenderer::new();
/// let frame = FrameBuffer::new(8, 2);
/// let first = renderer.render(&frame);
/// assert_eq!(first.cells_rendered, 16);
/// let second = renderer.render(&frame);
/// assert_eq!(second.cells_rendered, 0);
/// ```
pub struct DiffRenderer {
    output: OutputBuffer,
    writer: CellWriter,
    previous: Option<FrameBuffer>,
}

impl DiffRenderer {
    /// A renderer with no previous frame; the first render draws everything.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: OutputBuffer::new(),
            writer: CellWriter::new(),
            previous: None,
        }
    }

    /// Diff `current` against the previous frame and buffer the output.
    pub fn render(&mut self, current: &FrameBuffer) -> RenderStats {
        self.output.clear();
        self.writer.reset_state();

        let width = current.width();
        let height = current.height();
        let mut stats = RenderStats::default();

        if width == 0 || height == 0 {
            self.store_frame(current);
            return stats;
        }

        ansi::begin_sync(&mut self.output).ok();

        let previous = self
            .previous
            .as_ref()
            .filter(|prev| prev.width() == width && prev.height() == height);

        if previous.is_none() {
            ansi::clear_screen(&mut self.output).ok();
            ansi::cursor_to(&mut self.output, 0, 0).ok();
        }

        for y in 0..height {
            let (Some(curr_row), prev_row) = (current.row(y), previous.and_then(|p| p.row(y)))
            else {
                continue;
            };

            if prev_row == Some(curr_row) {
                stats.cells_skipped += curr_row.len();
                continue;
            }

            for (x, cell) in (0..width).zip(curr_row) {
                let changed = prev_row.is_none_or(|row| row[usize::from(x)] != *cell);
                if changed {
                    self.writer.render_cell(&mut self.output, x, y, cell);
                    stats.cells_rendered += 1;
                } else {
                    stats.cells_skipped += 1;
                }
            }
        }

        // Leave the terminal in default SGR state between frames.
        ansi::reset(&mut self.output).ok();
        ansi::end_sync(&mut self.output).ok();

        stats.bytes_written = self.output.len();
        self.store_frame(current);
        stats
    }

    /// The raw bytes from the last render.
    #[must_use]
    pub fn output_bytes(&self) -> &[u8] {
        self.output.as_bytes()
    }

    /// Write the buffered output to stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stdout fails.
    pub fn flush(&mut self) -> io::Result<()> {
        self.output.flush_stdout()
    }

    /// Write the buffered output to `w`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        self.output.flush_to(w)
    }

    fn store_frame(&mut self, current: &FrameBuffer) {
        match &mut self.previous {
            Some(prev) => prev.copy_from(current),
            None => self.previous = Some(current.clone()),
        }
    }
}

impl Default for DiffRenderer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
