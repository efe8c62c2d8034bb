// SPDX-License-Identifier: MIT
//
// Surface: the character canvas the rasterizer paints into.
//
// The core never talks to a terminal directly. A `SurfaceHost` hands out
// surfaces (and info sinks for text panels next to them); a `Surface`
// accepts cell writes, flushes, and reads keys. The terminal screen from
// `led-term` is the real host, `RecordingSurface` the test double.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use led_term::buffer::Rect;
use led_term::cell::Cell;
use led_term::input::KeyEvent;
use led_term::screen::{Pane, SharedScreen, Window};

use crate::sink::InfoSink;

// ─── Traits ──────────────────────────────────────────────────────────────────

/// A rectangular grid of character cells, addressed `(row, col)`.
pub trait Surface {
    /// `(rows, cols)`.
    fn extent(&self) -> (u16, u16);

    fn has_colors(&self) -> bool;

    /// Write one cell. Writes outside the extent are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying device rejects the write.
    fn put(&mut self, row: u16, col: u16, cell: Cell) -> io::Result<()>;

    /// Blank every cell.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying device rejects the write.
    fn clear(&mut self) -> io::Result<()>;

    /// Make everything written so far visible.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails.
    fn flush(&mut self) -> io::Result<()>;

    /// Next key press, waiting up to `timeout`. `Some(Duration::ZERO)`
    /// polls, `None` waits until a key arrives or input ends.
    ///
    /// # Errors
    ///
    /// Returns an error if input has failed.
    fn poll_key(&mut self, timeout: Option<Duration>) -> io::Result<Option<KeyEvent>>;

    /// Release the surface. Blanking it is enough for most hosts.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails.
    fn close(&mut self) -> io::Result<()> {
        self.clear()?;
        self.flush()
    }
}

/// Creates surfaces and info sinks on some display.
pub trait SurfaceHost {
    type Surface: Surface;

    /// `(rows, cols)` of the whole display.
    fn screen_size(&self) -> (u16, u16);

    /// # Errors
    ///
    /// Returns an error if `rect` does not fit the display.
    fn create_surface(&self, rect: Rect) -> io::Result<Self::Surface>;

    /// A text panel occupying `rect`.
    ///
    /// # Errors
    ///
    /// Returns an error if `rect` does not fit the display.
    fn create_info_sink(&self, rect: Rect) -> io::Result<Box<dyn InfoSink>>;
}

// ─── Terminal ────────────────────────────────────────────────────────────────

impl SurfaceHost for SharedScreen {
    type Surface = Window;

    fn screen_size(&self) -> (u16, u16) {
        let size = self.borrow().size();
        (size.rows, size.cols)
    }

    fn create_surface(&self, rect: Rect) -> io::Result<Window> {
        Window::new(self, rect)
    }

    fn create_info_sink(&self, rect: Rect) -> io::Result<Box<dyn InfoSink>> {
        Ok(Box::new(Pane::new(self, rect)?))
    }
}

impl Surface for Window {
    fn extent(&self) -> (u16, u16) {
        Self::extent(self)
    }

    fn has_colors(&self) -> bool {
        Self::has_colors(self)
    }

    fn put(&mut self, row: u16, col: u16, cell: Cell) -> io::Result<()> {
        Self::put(self, row, col, cell);
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        Self::clear(self);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.present()
    }

    fn poll_key(&mut self, timeout: Option<Duration>) -> io::Result<Option<KeyEvent>> {
        Self::poll_key(self, timeout)
    }
}

// ─── RecordingSurface ────────────────────────────────────────────────────────

/// One recorded cell write.
pub type CellWrite = (u16, u16, Cell);

/// An in-memory surface that remembers every write.
///
/// Writes are grouped into frames, one per `flush`. Keys are served from a
/// script; once it runs out, every poll returns `None`, including blocking
/// ones, so programs reading from it always terminate. After
/// [`close_input`](Self::close_input) an exhausted script reports
/// `UnexpectedEof` instead, like a terminal whose stdin has closed.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    rows: u16,
    cols: u16,
    colors: bool,
    cells: Vec<Cell>,
    pending: Vec<CellWrite>,
    frames: Vec<Vec<CellWrite>>,
    clears: usize,
    keys: VecDeque<KeyEvent>,
    failing: bool,
    input_closed: bool,
    closed: bool,
}

impl RecordingSurface {
    #[must_use]
    pub fn new(rows: u16, cols: u16) -> Self {
        Self {
            rows,
            cols,
            colors: true,
            cells: vec![Cell::EMPTY; usize::from(rows) * usize::from(cols)],
            pending: Vec::new(),
            frames: Vec::new(),
            clears: 0,
            keys: VecDeque::new(),
            failing: false,
            input_closed: false,
            closed: false,
        }
    }

    #[must_use]
    pub const fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    /// Queue keys for `poll_key`.
    pub fn push_keys(&mut self, keys: impl IntoIterator<Item = KeyEvent>) {
        self.keys.extend(keys);
    }

    /// Report end of input once the key script is used up.
    pub const fn close_input(&mut self) {
        self.input_closed = true;
    }

    /// Make every later write, clear and flush fail.
    pub const fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    /// Current content of `(row, col)`.
    #[must_use]
    pub fn cell(&self, row: u16, col: u16) -> Option<Cell> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.cells[usize::from(row) * usize::from(self.cols) + usize::from(col)])
    }

    /// The characters of one row.
    #[must_use]
    pub fn row_text(&self, row: u16) -> String {
        (0..self.cols)
            .filter_map(|col| self.cell(row, col).and_then(Cell::character))
            .collect()
    }

    /// Writes of every completed frame.
    #[must_use]
    pub fn frames(&self) -> &[Vec<CellWrite>] {
        &self.frames
    }

    /// Writes since the last flush.
    #[must_use]
    pub fn pending(&self) -> &[CellWrite] {
        &self.pending
    }

    #[must_use]
    pub const fn clears(&self) -> usize {
        self.clears
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    fn check(&self) -> io::Result<()> {
        if self.failing {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "surface is failing"));
        }
        Ok(())
    }
}

impl Surface for RecordingSurface {
    fn extent(&self) -> (u16, u16) {
        (self.rows, self.cols)
    }

    fn has_colors(&self) -> bool {
        self.colors
    }

    fn put(&mut self, row: u16, col: u16, cell: Cell) -> io::Result<()> {
        self.check()?;
        if row < self.rows && col < self.cols {
            self.cells[usize::from(row) * usize::from(self.cols) + usize::from(col)] = cell;
            self.pending.push((row, col, cell));
        }
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.check()?;
        self.cells.fill(Cell::EMPTY);
        self.clears += 1;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.check()?;
        self.frames.push(std::mem::take(&mut self.pending));
        Ok(())
    }

    fn poll_key(&mut self, _timeout: Option<Duration>) -> io::Result<Option<KeyEvent>> {
        match self.keys.pop_front() {
            None if self.input_closed => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed")),
            key => Ok(key),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.check()?;
        self.closed = true;
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
