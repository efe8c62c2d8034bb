// SPDX-License-Identifier: MIT
//
// Grid overlay: separator lines between diodes.
//
// With the overlay on, each diode is one row and `ratio` columns further
// from its neighbour, and the first of those spare lines gets a separator:
//
//   rows  size + k * (size + 1)                 k in [0, grid_rows - 1)
//   cols  ratioed + k * (size + 1) * ratio       k in [0, grid_cols - 1)
//
// Each line spans the whole surface. Lines that would start past the
// surface edge are skipped.

use std::io;

use led_term::cell::Cell;

use crate::geometry::Geometry;
use crate::surface::Surface;

const HORIZONTAL: Cell = Cell::new('─');
const VERTICAL: Cell = Cell::new('│');
const CROSSING: Cell = Cell::new('┼');

/// Surface rows holding horizontal separators.
fn separator_rows(g: &Geometry, surface_rows: u16) -> impl Iterator<Item = u16> + '_ {
    let step = g.diode_size() + 1;
    (0..u32::from(g.grid().rows.saturating_sub(1)))
        .map(move |k| g.diode_size() + k * step)
        .take_while(move |&r| r < u32::from(surface_rows))
        .filter_map(|r| u16::try_from(r).ok())
}

/// Surface columns holding vertical separators.
fn separator_cols(g: &Geometry, surface_cols: u16) -> impl Iterator<Item = u16> + '_ {
    let step = (g.diode_size() + 1) * g.aspect_ratio();
    (0..u32::from(g.grid().cols.saturating_sub(1)))
        .map(move |k| g.ratioed_size() + k * step)
        .take_while(move |&c| c < u32::from(surface_cols))
        .filter_map(|c| u16::try_from(c).ok())
}

/// Draw the separator lines for `g` across the whole surface.
///
/// Only meaningful when [`Geometry::grid_available`] is true; otherwise the
/// lines cut through diodes.
///
/// # Errors
///
/// Propagates the first surface write failure.
pub fn draw_grid<S: Surface + ?Sized>(g: &Geometry, surface: &mut S) -> io::Result<()> {
    let (rows, cols) = surface.extent();
    let row_lines: Vec<u16> = separator_rows(g, rows).collect();
    let col_lines: Vec<u16> = separator_cols(g, cols).collect();
    log::trace!("grid rows {row_lines:?} cols {col_lines:?}");

    for &r in &row_lines {
        for c in 0..cols {
            surface.put(r, c, HORIZONTAL)?;
        }
    }
    for &c in &col_lines {
        for r in 0..rows {
            let cell = if row_lines.contains(&r) { CROSSING } else { VERTICAL };
            surface.put(r, c, cell)?;
        }
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
