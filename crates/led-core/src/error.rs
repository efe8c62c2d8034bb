// SPDX-License-Identifier: MIT
//
// Error type for LED sessions.

use std::io;

use thiserror::Error;

/// Everything that can go wrong setting up or driving an LED matrix.
#[derive(Debug, Error)]
pub enum LedError {
    /// The surface could not be created or cannot hold the requested grid.
    #[error("setup failed: {0}")]
    Setup(String),

    /// A diode coordinate outside the grid.
    #[error("diode ({row}, {col}) is outside the {rows}x{cols} grid")]
    OutOfBounds {
        row: i32,
        col: i32,
        rows: u16,
        cols: u16,
    },

    /// Writing to, flushing or reading from the surface failed.
    #[error("render failed: {0}")]
    Render(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, LedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let e = LedError::OutOfBounds {
            row: 3,
            col: -1,
            rows: 3,
            cols: 5,
        };
        assert_eq!(e.to_string(), "diode (3, -1) is outside the 3x5 grid");
        assert_eq!(
            LedError::Setup("cannot fit one diode per character cell".into()).to_string(),
            "setup failed: cannot fit one diode per character cell"
        );
    }

    #[test]
    fn io_errors_become_render_errors() {
        let e: LedError = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        assert!(matches!(e, LedError::Render(_)));
        assert_eq!(e.to_string(), "render failed: gone");
    }
}
