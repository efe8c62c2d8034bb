// SPDX-License-Identifier: MIT
//
// Geometry: how big a diode is and where it sits.
//
// Given a logical grid of diodes and a character surface, pick one diode
// size that fits every diode on the surface, correcting columns by the
// aspect ratio (terminal cells are about twice as tall as they are wide,
// so a round diode is `size` rows tall and `size * ratio` columns wide).
//
// Sizing:
//
//   rows_per = surface_rows / grid_rows
//   cols_per = surface_cols / (grid_cols * ratio)
//
// The smaller of the two binds and is floored. Sizes above 5 are made odd
// so the centre cell sits in the middle. The squared outer and inner radii
// used by the rasterizer are derived once here.
//
// Everything is computed once per session and never changes afterwards.

use crate::error::{LedError, Result};

/// Logical grid dimensions in diodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Grid {
    pub rows: u16,
    pub cols: u16,
}

impl Grid {
    #[must_use]
    pub const fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }

    /// Number of diodes.
    #[must_use]
    pub const fn len(self) -> usize {
        self.rows as usize * self.cols as usize
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Whether `(row, col)` addresses a diode. Negative coordinates never do.
    #[must_use]
    pub fn contains(self, row: i32, col: i32) -> bool {
        (0..i32::from(self.rows)).contains(&row) && (0..i32::from(self.cols)).contains(&col)
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(6, 8)
    }
}

/// Default width-to-height correction for terminal cells.
pub const DEFAULT_ASPECT_RATIO: u16 = 2;

/// Sizes above this are forced odd.
const ODD_SIZE_THRESHOLD: u32 = 5;

/// Derived diode sizing for one grid on one surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    grid: Grid,
    surface_rows: u16,
    surface_cols: u16,
    aspect_ratio: u32,
    diode_size: u32,
    ratioed_size: u32,
    outer_radius_sq: u32,
    inner_radius_sq: u32,
    grid_available: bool,
}

impl Geometry {
    /// Size `grid` for a `surface_rows` × `surface_cols` surface.
    ///
    /// # Errors
    ///
    /// [`LedError::Setup`] if the grid is empty, the aspect ratio is zero, or
    /// the surface has fewer cells than diodes in either direction.
    pub fn compute(grid: Grid, surface_rows: u16, surface_cols: u16, aspect_ratio: u16) -> Result<Self> {
        if grid.is_empty() {
            return Err(LedError::Setup(format!(
                "a {}x{} grid has no diodes",
                grid.rows, grid.cols
            )));
        }
        if aspect_ratio == 0 {
            return Err(LedError::Setup("aspect ratio must be at least 1".into()));
        }
        if grid.rows > surface_rows || grid.cols > surface_cols {
            return Err(LedError::Setup(format!(
                "cannot fit one diode per character cell: {}x{} grid on a {}x{} surface",
                grid.rows, grid.cols, surface_rows, surface_cols
            )));
        }

        let ratio = u32::from(aspect_ratio);
        let rows_per_diode = f32::from(surface_rows) / f32::from(grid.rows);
        let cols_per_diode = f32::from(surface_cols) / (f32::from(grid.cols) * f32::from(aspect_ratio));
        let binding = if cols_per_diode > rows_per_diode {
            rows_per_diode
        } else {
            cols_per_diode
        };

        // Non-negative and no larger than a u16 surface extent.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let mut diode_size = (binding.floor() as u32).max(1);
        if diode_size > ODD_SIZE_THRESHOLD && diode_size % 2 == 0 {
            diode_size -= 1;
        }

        let half = diode_size / 2;
        let ratioed_size = diode_size * ratio;

        let spare_rows = i64::from(surface_rows) - i64::from(diode_size) * i64::from(grid.rows);
        let spare_cols = i64::from(surface_cols) - i64::from(ratioed_size) * i64::from(grid.cols);
        let grid_available = spare_rows >= i64::from(grid.rows) - 1
            && spare_cols >= i64::from(ratio) * (i64::from(grid.cols) - 1);

        let geometry = Self {
            grid,
            surface_rows,
            surface_cols,
            aspect_ratio: ratio,
            diode_size,
            ratioed_size,
            outer_radius_sq: half * half,
            inner_radius_sq: half.saturating_sub(1).pow(2),
            grid_available,
        };
        log::debug!("{geometry:?}");
        Ok(geometry)
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    #[must_use]
    pub const fn grid(&self) -> Grid {
        self.grid
    }

    /// `(rows, cols)` of the surface this was computed for.
    #[must_use]
    pub const fn surface(&self) -> (u16, u16) {
        (self.surface_rows, self.surface_cols)
    }

    #[must_use]
    pub const fn aspect_ratio(&self) -> u32 {
        self.aspect_ratio
    }

    /// Diode height in rows.
    #[must_use]
    pub const fn diode_size(&self) -> u32 {
        self.diode_size
    }

    /// Diode width in columns.
    #[must_use]
    pub const fn ratioed_size(&self) -> u32 {
        self.ratioed_size
    }

    #[must_use]
    pub const fn outer_radius_sq(&self) -> u32 {
        self.outer_radius_sq
    }

    #[must_use]
    pub const fn inner_radius_sq(&self) -> u32 {
        self.inner_radius_sq
    }

    /// Whether there is room for one separator line between neighbours.
    #[must_use]
    pub const fn grid_available(&self) -> bool {
        self.grid_available
    }

    // ─── Positions ───────────────────────────────────────────────────────

    /// Surface `(row, col)` of a diode's centre.
    ///
    /// With `gap` set, every diode after the first in each direction is
    /// pushed one separator further.
    #[must_use]
    pub fn center(&self, row: u16, col: u16, gap: bool) -> (i64, i64) {
        let step = i64::from(self.diode_size) + i64::from(gap);
        let center_row = i64::from(row) * step + i64::from(self.diode_size / 2);
        let center_col =
            i64::from(col) * i64::from(self.aspect_ratio) * step + i64::from(self.ratioed_size / 2);
        (center_row, center_col)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
