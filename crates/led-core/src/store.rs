// SPDX-License-Identifier: MIT
//
// DiodeStore: the state of every diode, independent of drawing.
//
// Flat row-major storage (`row * cols + col`). Every accessor checks bounds
// strictly and reports `OutOfBounds` instead of clamping; a coordinate
// outside the grid is a caller bug.

use led_term::cell::Attr;

use crate::error::{LedError, Result};
use crate::geometry::Grid;

/// One diode: a value (0 = off, otherwise a style index) plus highlight
/// attributes OR-ed onto its glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Diode {
    pub value: u8,
    pub attrs: Attr,
}

impl Diode {
    #[must_use]
    pub const fn is_on(self) -> bool {
        self.value != 0
    }
}

/// Mutable grid of diodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiodeStore {
    grid: Grid,
    diodes: Vec<Diode>,
}

impl DiodeStore {
    /// A store with every diode off.
    #[must_use]
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            diodes: vec![Diode::default(); grid.len()],
        }
    }

    #[must_use]
    pub const fn grid(&self) -> Grid {
        self.grid
    }

    fn index(&self, row: i32, col: i32) -> Result<usize> {
        if !self.grid.contains(row, col) {
            return Err(LedError::OutOfBounds {
                row,
                col,
                rows: self.grid.rows,
                cols: self.grid.cols,
            });
        }
        // Both non-negative and inside the grid.
        #[allow(clippy::cast_sign_loss)]
        Ok(row as usize * usize::from(self.grid.cols) + col as usize)
    }

    /// # Errors
    ///
    /// [`LedError::OutOfBounds`] outside the grid.
    pub fn set_value(&mut self, row: i32, col: i32, value: u8) -> Result<()> {
        let idx = self.index(row, col)?;
        self.diodes[idx].value = value;
        Ok(())
    }

    /// Add highlight attributes.
    ///
    /// # Errors
    ///
    /// [`LedError::OutOfBounds`] outside the grid.
    pub fn set_attrs(&mut self, row: i32, col: i32, attrs: Attr) -> Result<()> {
        let idx = self.index(row, col)?;
        self.diodes[idx].attrs |= attrs;
        Ok(())
    }

    /// Remove highlight attributes.
    ///
    /// # Errors
    ///
    /// [`LedError::OutOfBounds`] outside the grid.
    pub fn clear_attrs(&mut self, row: i32, col: i32, attrs: Attr) -> Result<()> {
        let idx = self.index(row, col)?;
        self.diodes[idx].attrs.remove(attrs);
        Ok(())
    }

    /// # Errors
    ///
    /// [`LedError::OutOfBounds`] outside the grid.
    pub fn get(&self, row: i32, col: i32) -> Result<Diode> {
        self.index(row, col).map(|idx| self.diodes[idx])
    }

    /// Turn every diode off and drop all highlights.
    pub fn reset(&mut self) {
        self.diodes.fill(Diode::default());
    }

    /// Diodes in row-major order with their `(row, col)`.
    pub fn iter(&self) -> impl Iterator<Item = (u16, u16, Diode)> + '_ {
        let cols = self.grid.cols;
        (0..self.grid.rows)
            .flat_map(move |row| (0..cols).map(move |col| (row, col)))
            .zip(&self.diodes)
            .map(|((row, col), &diode)| (row, col, diode))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store() -> DiodeStore {
        DiodeStore::new(Grid::new(3, 5))
    }

    #[test]
    fn new_store_is_all_off() {
        let s = store();
        assert_eq!(s.iter().count(), 15);
        assert!(s.iter().all(|(_, _, d)| d == Diode::default()));
    }

    #[test]
    fn set_and_get_value() {
        let mut s = store();
        s.set_value(2, 0, 1).unwrap();
        assert_eq!(s.get(2, 0).unwrap().value, 1);
        assert!(s.get(2, 0).unwrap().is_on());
        assert!(!s.get(0, 0).unwrap().is_on());
    }

    #[test]
    fn flat_index_is_row_major() {
        let mut s = store();
        s.set_value(1, 2, 7).unwrap();
        let lit: Vec<(u16, u16)> = s
            .iter()
            .filter(|(_, _, d)| d.is_on())
            .map(|(r, c, _)| (r, c))
            .collect();
        assert_eq!(lit, vec![(1, 2)]);
        assert_eq!(s.diodes[7].value, 7);
    }

    #[test]
    fn attrs_or_and_and_not() {
        let mut s = store();
        s.set_attrs(0, 0, Attr::INVERSE).unwrap();
        s.set_attrs(0, 0, Attr::BLINK).unwrap();
        assert_eq!(s.get(0, 0).unwrap().attrs, Attr::INVERSE | Attr::BLINK);
        s.clear_attrs(0, 0, Attr::INVERSE).unwrap();
        assert_eq!(s.get(0, 0).unwrap().attrs, Attr::BLINK);
        s.clear_attrs(0, 0, Attr::INVERSE).unwrap();
        assert_eq!(s.get(0, 0).unwrap().attrs, Attr::BLINK);
    }

    #[test]
    fn value_and_attrs_are_independent() {
        let mut s = store();
        s.set_attrs(1, 1, Attr::INVERSE).unwrap();
        s.set_value(1, 1, 0).unwrap();
        assert_eq!(
            s.get(1, 1).unwrap(),
            Diode {
                value: 0,
                attrs: Attr::INVERSE
            }
        );
    }

    #[test]
    fn every_coordinate_in_range_succeeds() {
        let mut s = store();
        for row in 0..3 {
            for col in 0..5 {
                s.set_value(row, col, 1).unwrap();
                assert!(s.get(row, col).is_ok());
            }
        }
    }

    #[test]
    fn out_of_range_coordinates_fail() {
        let mut s = store();
        for (row, col) in [(3, 0), (0, 5), (3, 5), (-1, 0), (0, -1), (i32::MIN, i32::MAX)] {
            assert!(
                matches!(s.get(row, col), Err(LedError::OutOfBounds { rows: 3, cols: 5, .. })),
                "({row}, {col})"
            );
            assert!(s.set_value(row, col, 1).is_err());
            assert!(s.set_attrs(row, col, Attr::BOLD).is_err());
            assert!(s.clear_attrs(row, col, Attr::BOLD).is_err());
        }
        assert!(s.iter().all(|(_, _, d)| d == Diode::default()));
    }

    #[test]
    fn reset_turns_everything_off() {
        let mut s = store();
        s.set_value(0, 0, 2).unwrap();
        s.set_attrs(2, 4, Attr::INVERSE).unwrap();
        s.reset();
        assert_eq!(s, store());
    }
}
