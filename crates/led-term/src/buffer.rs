// SPDX-License-Identifier: MIT
//
// FrameBuffer: the 2D cell grid the whole screen paints into.
//
// LED windows and text panes all write here. The diff renderer then
// compares the frame against the previously presented one and emits
// escapes only for cells that changed.
//
// Design:
//
//   - Flat `Vec<Cell>` with row-major indexing (`y * width + x`). A row's
//     cells are contiguous, so the renderer's left-to-right scan is linear.
//
//   - Writes are bounds-checked and report whether they landed. Region
//     clipping is expressed with `Rect`; windows and panes pass their own
//     rectangle so nothing they draw leaks into a neighbour.
//
//   - Wide characters take two columns: the codepoint, then a continuation
//     cell (ch = 0). Overwriting either half breaks the pair cleanly.

use unicode_width::UnicodeWidthChar;

use crate::cell::{Attr, Cell};
use crate::color::CellColor;

// ─── Rect ───────────────────────────────────────────────────────────────────────

/// A rectangle in screen cells.
///
/// ```
/// use led_term::buffer::Rect;
///
/// let r = Rect::new(10, 5, 80, 24);
/// assert!(r.contains(10, 5));
/// assert!(r.contains(89, 28));
/// assert!(!r.contains(90, 5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left column.
    pub x: u16,
    /// Top row.
    pub y: u16,
    /// Width in columns.
    pub width: u16,
    /// Height in rows.
    pub height: u16,
}

impl Rect {
    #[inline]
    #[must_use]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn right(self) -> u32 {
        self.x as u32 + self.width as u32
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn bottom(self) -> u32 {
        self.y as u32 + self.height as u32
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    #[must_use]
    pub fn contains(self, px: u16, py: u16) -> bool {
        px >= self.x && u32::from(px) < self.right() && py >= self.y && u32::from(py) < self.bottom()
    }

    /// Intersection of two rectangles, or `None` if they don't overlap.
    #[must_use]
    pub fn intersect(self, other: Self) -> Option<Self> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());

        if x2 > u32::from(x1) && y2 > u32::from(y1) {
            // Differences are bounded by the inputs' u16 extents.
            #[allow(clippy::cast_possible_truncation)]
            Some(Self {
                x: x1,
                y: y1,
                width: (x2 - u32::from(x1)) as u16,
                height: (y2 - u32::from(y1)) as u16,
            })
        } else {
            None
        }
    }
}

// ─── FrameBuffer ────────────────────────────────────────────────────────────────

/// A 2D buffer of terminal cells.
///
/// ```
/// use led_term::buffer::FrameBuffer;
/// use led_term::cell::Cell;
///
/// let mut buf = FrameBuffer::new(80, 24);
/// buf.set(5, 3, Cell::new('O'));
/// assert_eq!(buf.get(5, 3).unwrap().character(), Some('O'));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    /// A buffer filled with empty cells.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        let size = usize::from(width) * usize::from(height);
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; size],
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// The full buffer as a [`Rect`].
    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    #[inline]
    #[must_use]
    pub const fn in_bounds(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    const fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if self.in_bounds(x, y) {
            Some(&self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    /// A single row as a slice.
    #[inline]
    #[must_use]
    pub fn row(&self, y: u16) -> Option<&[Cell]> {
        if y < self.height {
            let start = self.index(0, y);
            Some(&self.cells[start..start + usize::from(self.width)])
        } else {
            None
        }
    }

    /// Iterate cells with their `(x, y)` coordinates.
    #[allow(clippy::cast_possible_truncation)]
    pub fn iter(&self) -> impl Iterator<Item = (u16, u16, &Cell)> {
        let w = usize::from(self.width).max(1);
        self.cells.iter().enumerate().map(move |(i, cell)| {
            // x < width and y < height, both u16.
            ((i % w) as u16, (i / w) as u16, cell)
        })
    }

    /// The visible characters of row `y`, for tests and debugging.
    #[must_use]
    pub fn row_text(&self, y: u16) -> String {
        self.row(y)
            .map(|cells| cells.iter().filter_map(|c| c.character()).collect())
            .unwrap_or_default()
    }

    // ─── Clear, Copy ─────────────────────────────────────────────────────

    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
    }

    /// Copy another buffer's contents into this one, reusing the allocation.
    pub fn copy_from(&mut self, other: &Self) {
        self.width = other.width;
        self.height = other.height;
        self.cells.clone_from(&other.cells);
    }

    // ─── Writes ──────────────────────────────────────────────────────────

    /// Write a cell. Returns `true` if `(x, y)` was in bounds.
    ///
    /// Breaks any wide character the position belonged to.
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        self.break_wide_char_at(x, y);
        let idx = self.index(x, y);
        self.cells[idx] = cell;
        true
    }

    /// Fill a rectangle with one cell, clipped to the buffer.
    pub fn fill(&mut self, rect: Rect, cell: Cell) {
        let Some(area) = rect.intersect(self.bounds()) else {
            return;
        };
        for y in area.y..area.y + area.height {
            let start = self.index(area.x, y);
            let end = start + usize::from(area.width);
            self.cells[start..end].fill(cell);
        }
    }

    /// Paint text left-to-right from `(x, y)`, clipped to `clip`.
    ///
    /// Wide characters take two columns; one that would straddle the clip
    /// edge is replaced by a space. Zero-width characters are dropped.
    /// Returns the number of columns consumed.
    pub fn paint_text(
        &mut self,
        x: u16,
        y: u16,
        text: &str,
        fg: CellColor,
        bg: CellColor,
        attrs: Attr,
        clip: Rect,
    ) -> u16 {
        let mut col = x;
        for ch in text.chars() {
            if !clip.contains(col, y) {
                break;
            }
            let w = ch.width().unwrap_or(0);
            if w == 0 {
                continue;
            }
            if w == 2 && !clip.contains(col.saturating_add(1), y) {
                self.set(col, y, Cell::styled(' ', fg, bg, attrs));
                col = col.saturating_add(1);
                break;
            }
            self.set(col, y, Cell::styled(ch, fg, bg, attrs));
            if w == 2 {
                let cont = col + 1;
                self.break_wide_char_at(cont, y);
                let idx = self.index(cont, y);
                self.cells[idx] = Cell::continuation(fg, bg, attrs);
            }
            // w is 1 or 2.
            #[allow(clippy::cast_possible_truncation)]
            let step = w as u16;
            col = col.saturating_add(step);
        }
        col.saturating_sub(x)
    }

    /// If `(x, y)` is half of a wide character, blank the other half.
    fn break_wide_char_at(&mut self, x: u16, y: u16) {
        let idx = self.index(x, y);
        if self.cells[idx].is_continuation() && x > 0 {
            let prev = self.index(x - 1, y);
            self.cells[prev].ch = u32::from(b' ');
        }
        if x + 1 < self.width {
            let next = self.index(x + 1, y);
            if self.cells[next].is_continuation() {
                self.cells[next] = Cell::EMPTY;
            }
        }
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FrameBuffer({}x{})", self.width, self.height)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────────
