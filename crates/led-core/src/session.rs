// SPDX-License-Identifier: MIT
//
// Session: one LED matrix on one surface.
//
// A session bundles everything a program driving the matrix needs: the
// surface, the diode store, the geometry computed once at setup, the style
// registry, the glyph set and an info sink for status text. Programs mutate
// diodes, call `render`, and read keys; `end` releases the surface.
//
// Setup goes through a `SurfaceHost`:
//
//   1. resolve the requested region against the screen size
//      (debug sessions keep `DEBUG_LINES` rows below it for the info pane)
//   2. create the surface (and the debug pane)
//   3. compute the geometry; a grid that does not fit is a setup error
//
// Nothing is shared between sessions. The surface is released on every
// exit path: explicitly through `end`, or when the session drops.

use std::fmt;
use std::time::Duration;

use led_term::buffer::Rect;
use led_term::cell::Attr;
use led_term::input::KeyEvent;
use log::Level;

use crate::error::{LedError, Result};
use crate::geometry::{DEFAULT_ASPECT_RATIO, Geometry, Grid};
use crate::grid::draw_grid;
use crate::raster::Painter;
use crate::sink::{InfoSink, NullSink};
use crate::store::{Diode, DiodeStore};
use crate::style::{GlyphSet, Style, StyleRegistry};
use crate::surface::{Surface, SurfaceHost};

/// Rows kept under a debug session's surface for its info pane.
pub const DEBUG_LINES: u16 = 10;

// ─── Config ──────────────────────────────────────────────────────────────────

/// Where the LED surface goes on the screen.
///
/// `rows` and `cols` of 0 take everything from the origin to the screen
/// edge; negative values take that much less.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceRequest {
    pub rows: i32,
    pub cols: i32,
    pub origin_row: i32,
    pub origin_col: i32,
}

impl SurfaceRequest {
    /// The whole screen.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            rows: 0,
            cols: 0,
            origin_row: 0,
            origin_col: 0,
        }
    }

    /// Turn the request into a rectangle on a `screen_rows` × `screen_cols`
    /// screen. With `debug`, `DEBUG_LINES` rows are taken off the bottom.
    ///
    /// # Errors
    ///
    /// [`LedError::Setup`] if the origin is off screen or the result is
    /// empty or does not fit.
    pub fn resolve(&self, screen_rows: u16, screen_cols: u16, debug: bool) -> Result<Rect> {
        let bad = |what: &str| {
            LedError::Setup(format!(
                "{what}: {}x{} at ({}, {}) on a {screen_rows}x{screen_cols} screen",
                self.rows, self.cols, self.origin_row, self.origin_col
            ))
        };

        let (Ok(y), Ok(x)) = (u16::try_from(self.origin_row), u16::try_from(self.origin_col)) else {
            return Err(bad("origin is off screen"));
        };
        if y >= screen_rows || x >= screen_cols {
            return Err(bad("origin is off screen"));
        }

        let remaining_rows = i32::from(screen_rows - y);
        let remaining_cols = i32::from(screen_cols - x);
        let mut rows = if self.rows > 0 { self.rows } else { remaining_rows + self.rows };
        let cols = if self.cols > 0 { self.cols } else { remaining_cols + self.cols };
        if debug {
            rows -= i32::from(DEBUG_LINES);
        }

        let (Ok(height), Ok(width)) = (u16::try_from(rows), u16::try_from(cols)) else {
            return Err(bad("surface would be empty or too large"));
        };
        if height == 0 || width == 0 {
            return Err(bad("surface would be empty"));
        }
        let reserved = if debug { DEBUG_LINES } else { 0 };
        if u32::from(y) + u32::from(height) + u32::from(reserved) > u32::from(screen_rows)
            || u32::from(x) + u32::from(width) > u32::from(screen_cols)
        {
            return Err(bad("surface does not fit"));
        }
        Ok(Rect::new(x, y, width, height))
    }
}

/// Everything needed to start a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub grid: Grid,
    pub surface: SurfaceRequest,
    pub aspect_ratio: u16,
    /// Keep an info pane under the surface and mark diode centres.
    pub debug: bool,
    /// `None` picks the default set for the surface.
    pub glyphs: Option<GlyphSet>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            grid: Grid::default(),
            surface: SurfaceRequest::full(),
            aspect_ratio: DEFAULT_ASPECT_RATIO,
            debug: false,
            glyphs: None,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn with_grid(rows: u16, cols: u16) -> Self {
        Self {
            grid: Grid::new(rows, cols),
            ..Self::default()
        }
    }
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// An LED matrix being driven on a surface.
pub struct Session<S: Surface> {
    surface: S,
    store: DiodeStore,
    geometry: Geometry,
    styles: StyleRegistry,
    glyphs: GlyphSet,
    grid_enabled: bool,
    debug: bool,
    sink: Box<dyn InfoSink>,
    region: Rect,
}

impl<S: Surface> Session<S> {
    /// Create the surface on `host` and size the grid for it.
    ///
    /// # Errors
    ///
    /// [`LedError::Setup`] if the region cannot be resolved or created, or
    /// the grid does not fit it.
    pub fn init<H>(host: &H, config: &SessionConfig) -> Result<Self>
    where
        H: SurfaceHost<Surface = S>,
    {
        let (screen_rows, screen_cols) = host.screen_size();
        let region = config
            .surface
            .resolve(screen_rows, screen_cols, config.debug)
            .inspect_err(|e| log::warn!("{e}"))?;

        let surface = host.create_surface(region).map_err(|e| {
            log::warn!("surface creation failed: {e}");
            LedError::Setup(format!(
                "cannot create a {}x{} surface: {e}",
                region.height, region.width
            ))
        })?;

        let sink: Box<dyn InfoSink> = if config.debug {
            let pane = Rect::new(region.x, region.y + region.height, region.width, DEBUG_LINES);
            host.create_info_sink(pane)
                .map_err(|e| LedError::Setup(format!("cannot create the debug pane: {e}")))?
        } else {
            Box::new(NullSink)
        };

        Self::build(surface, config, sink, region)
    }

    /// Drive an existing surface.
    ///
    /// # Errors
    ///
    /// [`LedError::Setup`] if the grid does not fit the surface.
    pub fn new(surface: S, config: &SessionConfig, sink: Box<dyn InfoSink>) -> Result<Self> {
        let (rows, cols) = surface.extent();
        Self::build(surface, config, sink, Rect::new(0, 0, cols, rows))
    }

    fn build(surface: S, config: &SessionConfig, sink: Box<dyn InfoSink>, region: Rect) -> Result<Self> {
        let (rows, cols) = surface.extent();
        let geometry = Geometry::compute(config.grid, rows, cols, config.aspect_ratio)
            .inspect_err(|e| log::warn!("{e}"))?;
        let glyphs = config
            .glyphs
            .unwrap_or_else(|| GlyphSet::for_surface(surface.has_colors()));

        let mut session = Self {
            surface,
            store: DiodeStore::new(config.grid),
            geometry,
            styles: StyleRegistry::default(),
            glyphs,
            grid_enabled: false,
            debug: config.debug,
            sink,
            region,
        };
        if session.debug {
            session.report_setup();
        }
        Ok(session)
    }

    fn report_setup(&mut self) {
        let g = self.geometry;
        let (rows, cols) = g.surface();
        self.info(Level::Debug, format_args!("Grid: {}x{} diodes", g.grid().rows, g.grid().cols));
        let (y, x) = (self.region.y, self.region.x);
        self.info(Level::Debug, format_args!("Surface: {rows}x{cols} at ({y}, {x})"));
        self.info(Level::Debug, format_args!("Diode size: {}", g.diode_size()));
        self.info(Level::Debug, format_args!("Ratioed size: {}", g.ratioed_size()));
        self.info(Level::Debug, format_args!("Halfsize squared: {}", g.outer_radius_sq()));
        let available = if g.grid_available() { "yes" } else { "no" };
        self.info(Level::Debug, format_args!("Grid available: {available}"));
    }

    // ─── Diodes ──────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// [`LedError::OutOfBounds`] outside the grid.
    pub fn set_diode(&mut self, row: i32, col: i32, value: u8) -> Result<()> {
        self.store.set_value(row, col, value)
    }

    /// # Errors
    ///
    /// [`LedError::OutOfBounds`] outside the grid.
    pub fn set_diode_attrs(&mut self, row: i32, col: i32, attrs: Attr) -> Result<()> {
        self.store.set_attrs(row, col, attrs)
    }

    /// # Errors
    ///
    /// [`LedError::OutOfBounds`] outside the grid.
    pub fn clear_diode_attrs(&mut self, row: i32, col: i32, attrs: Attr) -> Result<()> {
        self.store.clear_attrs(row, col, attrs)
    }

    /// # Errors
    ///
    /// [`LedError::OutOfBounds`] outside the grid.
    pub fn diode(&self, row: i32, col: i32) -> Result<Diode> {
        self.store.get(row, col)
    }

    /// Turn every diode off and drop all highlights.
    pub fn reset_diodes(&mut self) {
        self.store.reset();
    }

    /// Register or replace the colors for diode value `index`.
    pub fn register_style(&mut self, index: u8, style: Style) {
        self.styles.register(index, style);
    }

    // ─── Drawing ─────────────────────────────────────────────────────────

    /// Turn the separator overlay on or off for the next `render`.
    ///
    /// Returns `false`, changing nothing, when asked to enable it without
    /// room for separators. Pixels already drawn stay until the caller
    /// clears and renders again.
    pub fn set_grid_overlay(&mut self, enabled: bool) -> bool {
        if enabled && !self.geometry.grid_available() {
            log::debug!("grid overlay unavailable for {:?}", self.geometry.grid());
            return false;
        }
        self.grid_enabled = enabled;
        true
    }

    #[must_use]
    pub const fn grid_overlay(&self) -> bool {
        self.grid_enabled
    }

    /// Repaint every diode, then the overlay if enabled, then flush.
    ///
    /// # Errors
    ///
    /// [`LedError::Render`] if the surface fails; the session should then be
    /// ended.
    pub fn render(&mut self) -> Result<()> {
        let painter = Painter {
            geometry: &self.geometry,
            styles: &self.styles,
            glyphs: &self.glyphs,
            gap: self.grid_enabled,
            mark_centers: self.debug,
        };
        painter.draw_all(&self.store, &mut self.surface)?;
        if self.grid_enabled {
            draw_grid(&self.geometry, &mut self.surface)?;
        }
        self.surface.flush()?;
        Ok(())
    }

    /// Blank the surface without touching the diodes.
    ///
    /// # Errors
    ///
    /// [`LedError::Render`] if the surface fails.
    pub fn clear(&mut self) -> Result<()> {
        self.surface.clear()?;
        Ok(())
    }

    // ─── Input and text ──────────────────────────────────────────────────

    /// Next key press; see [`Surface::poll_key`].
    ///
    /// # Errors
    ///
    /// [`LedError::Render`] if input has failed.
    pub fn read_key(&mut self, timeout: Option<Duration>) -> Result<Option<KeyEvent>> {
        Ok(self.surface.poll_key(timeout)?)
    }

    /// Send a line to the info sink and the log.
    pub fn info(&mut self, level: Level, args: fmt::Arguments<'_>) {
        let text = args.to_string();
        log::log!(level, "{text}");
        self.sink.emit(level, &text);
    }

    /// Replace the info sink, returning the old one.
    pub fn set_info_sink(&mut self, sink: Box<dyn InfoSink>) -> Box<dyn InfoSink> {
        std::mem::replace(&mut self.sink, sink)
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    #[must_use]
    pub const fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[must_use]
    pub const fn grid(&self) -> Grid {
        self.geometry.grid()
    }

    /// Where the surface sits on the screen.
    #[must_use]
    pub const fn region(&self) -> Rect {
        self.region
    }

    #[must_use]
    pub const fn is_debug(&self) -> bool {
        self.debug
    }

    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    pub const fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    // ─── Teardown ────────────────────────────────────────────────────────

    /// Release the surface and report whether that worked.
    ///
    /// # Errors
    ///
    /// [`LedError::Render`] if the surface fails to close.
    pub fn end(mut self) -> Result<()> {
        log::debug!("ending {}x{} session", self.grid().rows, self.grid().cols);
        self.surface.close()?;
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use crate::surface::RecordingSurface;
    use led_term::color::{AnsiColor, CellColor};
    use led_term::input::KeyCode;
    use led_term::screen::{Screen, ScreenConfig, SharedScreen};
    use pretty_assertions::assert_eq;

    fn recording(rows: u16, cols: u16, surface_rows: u16, surface_cols: u16) -> Session<RecordingSurface> {
        Session::new(
            RecordingSurface::new(surface_rows, surface_cols),
            &SessionConfig::with_grid(rows, cols),
            Box::new(NullSink),
        )
        .unwrap()
    }

    // ── Surface requests ────────────────────────────────────────────────

    #[test]
    fn zero_takes_the_full_screen() {
        let rect = SurfaceRequest::full().resolve(30, 100, false).unwrap();
        assert_eq!(rect, Rect::new(0, 0, 100, 30));
    }

    #[test]
    fn negative_takes_less_than_the_screen() {
        let req = SurfaceRequest {
            rows: -5,
            cols: -10,
            ..SurfaceRequest::full()
        };
        assert_eq!(req.resolve(30, 100, false).unwrap(), Rect::new(0, 0, 90, 25));
    }

    #[test]
    fn origin_shrinks_the_remaining_extent() {
        let req = SurfaceRequest {
            origin_row: 2,
            origin_col: 4,
            ..SurfaceRequest::full()
        };
        assert_eq!(req.resolve(30, 100, false).unwrap(), Rect::new(4, 2, 96, 28));
    }

    #[test]
    fn debug_keeps_rows_for_the_pane() {
        assert_eq!(SurfaceRequest::full().resolve(40, 100, true).unwrap(), Rect::new(0, 0, 100, 30));
        let explicit = SurfaceRequest {
            rows: 25,
            cols: 50,
            ..SurfaceRequest::full()
        };
        assert_eq!(explicit.resolve(40, 100, true).unwrap(), Rect::new(0, 0, 50, 15));
        let negative = SurfaceRequest {
            rows: -5,
            ..SurfaceRequest::full()
        };
        assert_eq!(negative.resolve(40, 100, true).unwrap(), Rect::new(0, 0, 100, 25));
    }

    #[test]
    fn impossible_requests_fail() {
        let cases = [
            SurfaceRequest { rows: -30, ..SurfaceRequest::full() },
            SurfaceRequest { cols: 101, ..SurfaceRequest::full() },
            SurfaceRequest { origin_row: 30, ..SurfaceRequest::full() },
            SurfaceRequest { origin_col: -1, ..SurfaceRequest::full() },
            SurfaceRequest { rows: 25, origin_row: 10, ..SurfaceRequest::full() },
        ];
        for req in cases {
            assert!(matches!(req.resolve(30, 100, false), Err(LedError::Setup(_))), "{req:?}");
        }
        assert!(SurfaceRequest::full().resolve(10, 100, true).is_err());
    }

    // ── Setup ───────────────────────────────────────────────────────────

    #[test]
    fn init_on_a_headless_screen() {
        let screen: SharedScreen = Screen::headless(100, 30, ScreenConfig::default());
        let session = Session::init(&screen, &SessionConfig::with_grid(3, 5)).unwrap();
        assert_eq!(session.region(), Rect::new(0, 0, 100, 30));
        // rows_per = 10, cols_per = 10: size 10 made odd.
        assert_eq!(session.geometry().diode_size(), 9);
        assert!(!session.is_debug());
    }

    #[test]
    fn grid_too_big_for_the_surface_is_a_setup_error() {
        let result = Session::new(
            RecordingSurface::new(5, 50),
            &SessionConfig::with_grid(6, 8),
            Box::new(NullSink),
        );
        assert!(matches!(result, Err(LedError::Setup(_))));
    }

    #[test]
    fn region_that_does_not_fit_is_a_setup_error() {
        let screen = Screen::headless(20, 10, ScreenConfig::default());
        let config = SessionConfig {
            surface: SurfaceRequest {
                rows: 11,
                ..SurfaceRequest::full()
            },
            ..SessionConfig::default()
        };
        assert!(matches!(Session::init(&screen, &config), Err(LedError::Setup(_))));
    }

    #[test_log::test]
    fn debug_session_reports_setup_on_its_pane() {
        let screen = Screen::headless(100, 40, ScreenConfig::default());
        let config = SessionConfig {
            debug: true,
            ..SessionConfig::with_grid(3, 5)
        };
        let session = Session::init(&screen, &config).unwrap();
        assert_eq!(session.region(), Rect::new(0, 0, 100, 30));
        let s = screen.borrow();
        assert_eq!(s.frame().row_text(30).trim_end(), "Grid: 3x5 diodes");
        assert_eq!(s.frame().row_text(31).trim_end(), "Surface: 30x100 at (0, 0)");
        assert_eq!(s.frame().row_text(32).trim_end(), "Diode size: 9");
        assert_eq!(s.frame().row_text(35).trim_end(), "Grid available: yes");
    }

    #[test]
    fn debug_report_names_the_surface_origin() {
        let screen = Screen::headless(100, 40, ScreenConfig::default());
        let config = SessionConfig {
            debug: true,
            surface: SurfaceRequest {
                origin_row: 2,
                origin_col: 4,
                ..SurfaceRequest::full()
            },
            ..SessionConfig::with_grid(3, 5)
        };
        let session = Session::init(&screen, &config).unwrap();
        assert_eq!(session.region(), Rect::new(4, 2, 96, 28));
        let s = screen.borrow();
        assert_eq!(s.frame().row_text(31).trim(), "Surface: 28x96 at (2, 4)");
    }

    #[test]
    fn colorless_surface_gets_reversed_edges() {
        let session = Session::new(
            RecordingSurface::new(15, 50).with_colors(false),
            &SessionConfig::with_grid(3, 5),
            Box::new(NullSink),
        )
        .unwrap();
        assert!(session.glyphs.edge_on.attrs.contains(Attr::INVERSE));
    }

    // ── Diodes ──────────────────────────────────────────────────────────

    #[test]
    fn diode_operations_go_through_the_store() {
        let mut s = recording(3, 5, 15, 50);
        s.set_diode(2, 0, 1).unwrap();
        s.set_diode_attrs(2, 0, Attr::INVERSE).unwrap();
        assert_eq!(
            s.diode(2, 0).unwrap(),
            Diode {
                value: 1,
                attrs: Attr::INVERSE
            }
        );
        s.clear_diode_attrs(2, 0, Attr::INVERSE).unwrap();
        assert_eq!(s.diode(2, 0).unwrap().attrs, Attr::empty());
        s.reset_diodes();
        assert_eq!(s.diode(2, 0).unwrap(), Diode::default());
    }

    #[test]
    fn out_of_bounds_diodes_fail() {
        let mut s = recording(3, 5, 15, 50);
        assert!(matches!(s.set_diode(3, 0, 1), Err(LedError::OutOfBounds { .. })));
        assert!(matches!(s.diode(0, 5), Err(LedError::OutOfBounds { .. })));
        assert!(s.set_diode_attrs(-1, 0, Attr::BOLD).is_err());
    }

    // ── Drawing ─────────────────────────────────────────────────────────

    #[test]
    fn render_flushes_one_frame_per_call() {
        let mut s = recording(3, 5, 15, 50);
        s.set_diode(2, 0, 1).unwrap();
        s.render().unwrap();
        s.render().unwrap();
        let frames = s.surface().frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], frames[1]);
        assert_eq!(s.surface().cell(12, 5).unwrap().character(), Some('+'));
    }

    #[test]
    fn grid_overlay_refused_without_slack() {
        let mut s = recording(3, 5, 15, 50);
        s.render().unwrap();
        assert!(!s.set_grid_overlay(true));
        assert!(!s.grid_overlay());
        s.render().unwrap();
        let frames = s.surface().frames();
        assert_eq!(frames[0], frames[1]);
    }

    #[test]
    fn grid_overlay_draws_separators() {
        let mut s = recording(3, 5, 17, 58);
        assert!(s.set_grid_overlay(true));
        s.render().unwrap();
        assert_eq!(s.surface().cell(5, 0).unwrap().character(), Some('─'));
        assert_eq!(s.surface().cell(0, 10).unwrap().character(), Some('│'));
        assert!(s.set_grid_overlay(false));
        assert!(!s.grid_overlay());
    }

    #[test]
    fn registered_styles_reach_the_surface() {
        let mut s = recording(3, 5, 15, 50);
        s.register_style(2, Style::new(AnsiColor::Green, AnsiColor::Black));
        s.set_diode(0, 0, 2).unwrap();
        s.render().unwrap();
        assert_eq!(s.surface().cell(2, 5).unwrap().fg, CellColor::Ansi256(2));
    }

    #[test]
    fn render_failure_is_a_render_error() {
        let mut s = recording(3, 5, 15, 50);
        s.surface_mut().set_failing(true);
        assert!(matches!(s.render(), Err(LedError::Render(_))));
        assert!(matches!(s.clear(), Err(LedError::Render(_))));
    }

    // ── Input and text ──────────────────────────────────────────────────

    #[test]
    fn read_key_polls_the_surface() {
        let mut s = recording(3, 5, 15, 50);
        s.surface_mut().push_keys([KeyEvent::plain(KeyCode::Char('q'))]);
        assert_eq!(
            s.read_key(Some(Duration::ZERO)).unwrap(),
            Some(KeyEvent::plain(KeyCode::Char('q')))
        );
        assert_eq!(s.read_key(Some(Duration::ZERO)).unwrap(), None);
    }

    #[test_log::test]
    fn info_goes_to_the_current_sink() {
        let mut s = recording(3, 5, 15, 50);
        let first = MemorySink::new();
        s.set_info_sink(Box::new(first.clone()));
        s.info(Level::Info, format_args!("Score: {}", 4));
        let second = MemorySink::new();
        s.set_info_sink(Box::new(second.clone()));
        s.info(Level::Warn, format_args!("== GAME OVER =="));
        assert_eq!(first.texts(), vec!["Score: 4".to_string()]);
        assert_eq!(second.lines(), vec![(Level::Warn, "== GAME OVER ==".to_string())]);
    }

    // ── Teardown ────────────────────────────────────────────────────────

    #[test]
    fn end_blanks_a_terminal_window() {
        let screen = Screen::headless(50, 15, ScreenConfig::default());
        let mut session = Session::init(&screen, &SessionConfig::with_grid(3, 5)).unwrap();
        session.set_diode(0, 0, 1).unwrap();
        session.render().unwrap();
        assert!(!screen.borrow().frame().get(5, 2).unwrap().is_empty());
        session.end().unwrap();
        assert!(screen.borrow().frame().get(5, 2).unwrap().is_empty());
    }

    #[test]
    fn end_reports_close_failure() {
        let mut s = recording(3, 5, 15, 50);
        s.surface_mut().set_failing(true);
        assert!(matches!(s.end(), Err(LedError::Render(_))));
    }
}
