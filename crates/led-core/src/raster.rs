// SPDX-License-Identifier: MIT
//
// Rasterizer: paint every diode as a circle of glyphs.
//
// For each diode, only the lower-right quadrant of offsets is walked:
//
//   di in [0, diode_size / 2)     dj in [0, ratioed_size / 2)
//
// Each offset is classified by its aspect-corrected squared distance from
// the centre and the chosen glyph is written to all four reflections
// `(±di, ±dj)`. Offsets beyond the outer radius are skipped so the grid
// overlay (or whatever was there) shows through.
//
//   distSq = trunc(di² + (dj / ratio)²)
//
//   inner <= distSq <= outer   edge glyph
//   distSq <  inner            fill glyph
//   distSq >  outer            nothing
//
// Every pass repaints every diode; there is no dirty tracking.

use std::io;

use led_term::cell::Cell;

use crate::geometry::Geometry;
use crate::store::{Diode, DiodeStore};
use crate::style::{GlyphSet, StyleRegistry};
use crate::surface::Surface;

// ─── Classification ──────────────────────────────────────────────────────────

/// Where an offset falls relative to a diode's circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Edge,
    Inner,
    Outside,
}

/// Classify a squared distance against the squared radii.
#[must_use]
pub const fn classify(dist_sq: u32, inner_radius_sq: u32, outer_radius_sq: u32) -> Zone {
    if dist_sq > outer_radius_sq {
        Zone::Outside
    } else if dist_sq < inner_radius_sq {
        Zone::Inner
    } else {
        Zone::Edge
    }
}

/// Aspect-corrected squared distance of offset `(di, dj)`, truncated.
///
/// The column offset is divided by the ratio before squaring, so a circle
/// `ratio` times wider than tall has the same distances as a round one.
#[must_use]
pub fn dist_sq(di: u32, dj: u32, aspect_ratio: u32) -> u32 {
    // Offsets are bounded by half a u16 surface extent.
    #[allow(clippy::cast_precision_loss)]
    let scaled = dj as f32 / aspect_ratio as f32;
    #[allow(clippy::cast_precision_loss)]
    let rows = (di * di) as f32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        (rows + scaled * scaled) as u32
    }
}

// ─── Mirrored writes ─────────────────────────────────────────────────────────

/// Write `cell` at `(row, col)` if it lies inside the surface.
fn put_clipped<S: Surface + ?Sized>(surface: &mut S, row: i64, col: i64, cell: Cell) -> io::Result<()> {
    let (rows, cols) = surface.extent();
    match (u16::try_from(row), u16::try_from(col)) {
        (Ok(r), Ok(c)) if r < rows && c < cols => surface.put(r, c, cell),
        _ => Ok(()),
    }
}

/// Write `cell` at the four reflections of `(di, dj)` around a centre.
pub fn put_mirrored<S: Surface + ?Sized>(
    surface: &mut S,
    center: (i64, i64),
    di: u32,
    dj: u32,
    cell: Cell,
) -> io::Result<()> {
    let (cr, cc) = center;
    let (di, dj) = (i64::from(di), i64::from(dj));
    put_clipped(surface, cr + di, cc + dj, cell)?;
    put_clipped(surface, cr + di, cc - dj, cell)?;
    put_clipped(surface, cr - di, cc + dj, cell)?;
    put_clipped(surface, cr - di, cc - dj, cell)
}

// ─── Painter ─────────────────────────────────────────────────────────────────

/// Everything a draw pass reads besides the diodes themselves.
#[derive(Debug, Clone, Copy)]
pub struct Painter<'a> {
    pub geometry: &'a Geometry,
    pub styles: &'a StyleRegistry,
    pub glyphs: &'a GlyphSet,
    /// Leave one separator between neighbours.
    pub gap: bool,
    /// Mark each diode's centre cell with the centre glyph.
    pub mark_centers: bool,
}

impl Painter<'_> {
    /// Paint every diode in `store`.
    ///
    /// # Errors
    ///
    /// Propagates the first surface write failure.
    pub fn draw_all<S: Surface + ?Sized>(&self, store: &DiodeStore, surface: &mut S) -> io::Result<()> {
        let colors = surface.has_colors();
        for (row, col, diode) in store.iter() {
            self.draw_diode(row, col, diode, colors, surface)?;
        }
        Ok(())
    }

    /// Paint one diode.
    ///
    /// # Errors
    ///
    /// Propagates the first surface write failure.
    pub fn draw_diode<S: Surface + ?Sized>(
        &self,
        row: u16,
        col: u16,
        diode: Diode,
        colors: bool,
        surface: &mut S,
    ) -> io::Result<()> {
        let g = self.geometry;
        let on = diode.is_on();
        let style = self.styles.resolve(diode.value, colors);
        log::trace!("diode ({row}, {col}) value {} style {style:?}", diode.value);

        let center = g.center(row, col, self.gap);
        let half_rows = g.diode_size() / 2;
        let half_cols = g.ratioed_size() / 2;

        if half_rows == 0 {
            let cell = self.glyphs.edge(on).cell(style, diode.attrs);
            put_mirrored(surface, center, 0, 0, cell)?;
        }

        for di in 0..half_rows {
            for dj in 0..half_cols {
                let d = dist_sq(di, dj, g.aspect_ratio());
                let glyph = match classify(d, g.inner_radius_sq(), g.outer_radius_sq()) {
                    Zone::Edge => self.glyphs.edge(on),
                    Zone::Inner => self.glyphs.inner(on),
                    Zone::Outside => continue,
                };
                put_mirrored(surface, center, di, dj, glyph.cell(style, diode.attrs))?;
            }
        }

        if self.mark_centers {
            let mark = self.glyphs.center.cell(style, diode.attrs);
            put_mirrored(surface, center, 0, 0, mark)?;
        }
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
