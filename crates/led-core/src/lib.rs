// SPDX-License-Identifier: MIT
//
// led-core: simulated LED diodes on a character surface.
//
// A logical grid of round lights is sized once for the surface it lives
// on, kept in a flat diode store, and repainted as circles of glyphs on
// every render, with optional separator lines between diodes. The surface
// itself is a trait so the same session drives a real terminal window or
// an in-memory recorder.

pub mod error;
pub mod geometry;
pub mod grid;
pub mod raster;
pub mod session;
pub mod sink;
pub mod store;
pub mod style;
pub mod surface;

pub use error::{LedError, Result};
pub use geometry::{DEFAULT_ASPECT_RATIO, Geometry, Grid};
pub use session::{DEBUG_LINES, Session, SessionConfig, SurfaceRequest};
pub use sink::{InfoSink, MemorySink, NullSink};
pub use store::{Diode, DiodeStore};
pub use style::{Glyph, GlyphSet, Style, StyleRegistry};
pub use surface::{RecordingSurface, Surface, SurfaceHost};
