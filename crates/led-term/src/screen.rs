// SPDX-License-Identifier: MIT
//
// Screen: the shared terminal, carved into windows and panes.
//
// One `Screen` owns the terminal, the frame buffer, the differential
// renderer and the key input path. It is shared as `Rc<RefCell<Screen>>`
// between the regions drawn on it:
//
//   Window: a rectangle for the LED board. Cell writes are relative to
//   its top-left corner and clipped to it.
//
//   Pane: a rectangle of scrolling text lines, used for status and debug
//   output next to the board.
//
// Every region presents through the same frame, so a window flush and a
// pane line cost one differential write each. The terminal is restored
// when the last holder of the screen drops.
//
// Key input comes from the background stdin reader. `poll_key` waits on its
// channel with a timeout: `Some(ZERO)` is a non-blocking poll, `None`
// blocks. A lone ESC is held for one `escape_timeout` before being
// reported as the Escape key.
//
// A headless screen has no terminal and no reader: frames are diffed but
// discarded, keys come from `push_keys`. Tests and non-interactive runs
// use it.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use unicode_width::UnicodeWidthChar;

use crate::buffer::{FrameBuffer, Rect};
use crate::cell::{Attr, Cell};
use crate::color::CellColor;
use crate::diff::DiffRenderer;
use crate::input::{KeyEvent, Parser};
use crate::reader::StdinReader;
use crate::terminal::{self, Size, Terminal};

/// Shared handle to the screen.
pub type SharedScreen = Rc<RefCell<Screen>>;

// ─── Config ──────────────────────────────────────────────────────────────────

/// Screen timing and capability overrides.
#[derive(Debug, Clone, Copy)]
pub struct ScreenConfig {
    /// How long a lone ESC waits for the rest of a sequence.
    pub escape_timeout: Duration,
    /// Force color support on or off instead of asking the environment.
    pub colors: Option<bool>,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            escape_timeout: Duration::from_millis(25),
            colors: None,
        }
    }
}

// ─── Screen ──────────────────────────────────────────────────────────────────

enum Backend {
    Tty {
        // Declared before `terminal` so the reader stops before the
        // terminal leaves raw mode.
        reader: StdinReader,
        rx: Receiver<Vec<u8>>,
        terminal: Terminal,
    },
    Headless,
}

/// The terminal and everything drawn on it.
pub struct Screen {
    backend: Backend,
    frame: FrameBuffer,
    renderer: DiffRenderer,
    parser: Parser,
    keys: VecDeque<KeyEvent>,
    colors: bool,
    config: ScreenConfig,
}

impl Screen {
    /// Take over the terminal: raw mode, alternate screen, stdin reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be set up or the reader
    /// thread cannot be spawned.
    pub fn open(config: ScreenConfig) -> io::Result<SharedScreen> {
        let mut terminal = Terminal::new();
        terminal.enter()?;
        let (reader, rx) = StdinReader::spawn()?;
        let size = terminal.size();

        Ok(Rc::new(RefCell::new(Self {
            backend: Backend::Tty {
                reader,
                rx,
                terminal,
            },
            frame: FrameBuffer::new(size.cols, size.rows),
            renderer: DiffRenderer::new(),
            parser: Parser::new(),
            keys: VecDeque::new(),
            colors: config.colors.unwrap_or_else(terminal::supports_color),
            config,
        })))
    }

    /// A screen with no terminal behind it.
    #[must_use]
    pub fn headless(cols: u16, rows: u16, config: ScreenConfig) -> SharedScreen {
        Rc::new(RefCell::new(Self {
            backend: Backend::Headless,
            frame: FrameBuffer::new(cols, rows),
            renderer: DiffRenderer::new(),
            parser: Parser::new(),
            keys: VecDeque::new(),
            colors: config.colors.unwrap_or(true),
            config,
        }))
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    #[must_use]
    pub const fn size(&self) -> Size {
        Size {
            cols: self.frame.width(),
            rows: self.frame.height(),
        }
    }

    #[must_use]
    pub const fn has_colors(&self) -> bool {
        self.colors
    }

    #[must_use]
    pub const fn is_headless(&self) -> bool {
        matches!(self.backend, Backend::Headless)
    }

    /// The frame as last painted, presented or not.
    #[must_use]
    pub const fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    // ─── Output ──────────────────────────────────────────────────────────

    /// Diff the frame against what the terminal shows and write the changes.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the terminal fails.
    pub fn present(&mut self) -> io::Result<()> {
        self.renderer.render(&self.frame);
        match self.backend {
            Backend::Tty { .. } => self.renderer.flush(),
            Backend::Headless => self.renderer.flush_to(&mut io::sink()),
        }
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Queue keys for a headless screen, or ahead of terminal input.
    pub fn push_keys(&mut self, keys: impl IntoIterator<Item = KeyEvent>) {
        self.keys.extend(keys);
    }

    /// Next key press, waiting up to `timeout` (`None` waits forever).
    ///
    /// A headless screen only returns queued keys.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedEof` if stdin has closed.
    pub fn poll_key(&mut self, timeout: Option<Duration>) -> io::Result<Option<KeyEvent>> {
        if let Some(key) = self.keys.pop_front() {
            return Ok(Some(key));
        }
        let Backend::Tty { rx, .. } = &self.backend else {
            return Ok(None);
        };

        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            let received = if self.parser.has_pending() {
                rx.recv_timeout(self.config.escape_timeout)
            } else if let Some(deadline) = deadline {
                rx.recv_timeout(deadline.saturating_duration_since(Instant::now()))
            } else {
                rx.recv().map_err(|_| RecvTimeoutError::Disconnected)
            };

            match received {
                Ok(bytes) => self.keys.extend(self.parser.advance(&bytes)),
                Err(RecvTimeoutError::Timeout) if self.parser.has_pending() => {
                    self.keys.extend(self.parser.flush());
                }
                Err(RecvTimeoutError::Timeout) => return Ok(None),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
                }
            }

            if let Some(key) = self.keys.pop_front() {
                return Ok(Some(key));
            }
            if deadline.is_some_and(|d| Instant::now() >= d) && !self.parser.has_pending() {
                return Ok(None);
            }
        }
    }

    // ─── Teardown ────────────────────────────────────────────────────────

    /// Stop the reader and leave the terminal now instead of on drop.
    ///
    /// # Errors
    ///
    /// Returns an error if restoring the terminal fails.
    pub fn shutdown(&mut self) -> io::Result<()> {
        if let Backend::Tty {
            reader, terminal, ..
        } = &mut self.backend
        {
            reader.stop();
            terminal.leave()?;
        }
        Ok(())
    }

    fn check_region(&self, rect: Rect) -> io::Result<()> {
        if rect.is_empty() || rect.right() > u32::from(self.frame.width()) || rect.bottom() > u32::from(self.frame.height()) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "region {}x{} at ({}, {}) does not fit a {}x{} screen",
                    rect.height,
                    rect.width,
                    rect.y,
                    rect.x,
                    self.frame.height(),
                    self.frame.width()
                ),
            ));
        }
        Ok(())
    }
}

// ─── Window ──────────────────────────────────────────────────────────────────

/// A rectangular canvas on the screen, addressed `(row, col)` from its
/// top-left corner.
pub struct Window {
    screen: SharedScreen,
    rect: Rect,
}

impl Window {
    /// Carve a window out of the screen.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the rectangle is empty or leaves the screen.
    pub fn new(screen: &SharedScreen, rect: Rect) -> io::Result<Self> {
        screen.borrow().check_region(rect)?;
        Ok(Self {
            screen: Rc::clone(screen),
            rect,
        })
    }

    #[must_use]
    pub const fn rect(&self) -> Rect {
        self.rect
    }

    /// `(rows, cols)`.
    #[must_use]
    pub const fn extent(&self) -> (u16, u16) {
        (self.rect.height, self.rect.width)
    }

    #[must_use]
    pub fn has_colors(&self) -> bool {
        self.screen.borrow().has_colors()
    }

    #[must_use]
    pub fn screen(&self) -> &SharedScreen {
        &self.screen
    }

    /// Write one cell. Returns `false` if `(row, col)` is outside the window.
    pub fn put(&self, row: u16, col: u16, cell: Cell) -> bool {
        if row >= self.rect.height || col >= self.rect.width {
            return false;
        }
        self.screen
            .borrow_mut()
            .frame
            .set(self.rect.x + col, self.rect.y + row, cell)
    }

    /// The cell at `(row, col)`, if inside the window.
    #[must_use]
    pub fn get(&self, row: u16, col: u16) -> Option<Cell> {
        if row >= self.rect.height || col >= self.rect.width {
            return None;
        }
        self.screen
            .borrow()
            .frame
            .get(self.rect.x + col, self.rect.y + row)
            .copied()
    }

    /// Blank the whole window.
    pub fn clear(&self) {
        self.screen.borrow_mut().frame.fill(self.rect, Cell::EMPTY);
    }

    /// Present the screen.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the terminal fails.
    pub fn present(&self) -> io::Result<()> {
        self.screen.borrow_mut().present()
    }

    /// See [`Screen::poll_key`].
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedEof` if stdin has closed.
    pub fn poll_key(&self, timeout: Option<Duration>) -> io::Result<Option<KeyEvent>> {
        self.screen.borrow_mut().poll_key(timeout)
    }
}

// ─── Pane ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    text: String,
    fg: CellColor,
    attrs: Attr,
}

/// A scrolling text panel. New lines appear at the bottom; long lines wrap.
pub struct Pane {
    screen: SharedScreen,
    rect: Rect,
    lines: VecDeque<Line>,
}

impl Pane {
    /// Carve a pane out of the screen.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the rectangle is empty or leaves the screen.
    pub fn new(screen: &SharedScreen, rect: Rect) -> io::Result<Self> {
        screen.borrow().check_region(rect)?;
        Ok(Self {
            screen: Rc::clone(screen),
            rect,
            lines: VecDeque::with_capacity(usize::from(rect.height)),
        })
    }

    #[must_use]
    pub const fn rect(&self) -> Rect {
        self.rect
    }

    /// Text of the visible lines, oldest first.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.text.as_str())
    }

    /// Append text, wrapping and scrolling as needed, and present.
    ///
    /// Embedded newlines start new lines.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the terminal fails.
    pub fn push(&mut self, text: &str, fg: CellColor, attrs: Attr) -> io::Result<()> {
        let width = usize::from(self.rect.width);
        for raw in text.split('\n') {
            for piece in wrap(raw, width) {
                if self.lines.len() == usize::from(self.rect.height) {
                    self.lines.pop_front();
                }
                self.lines.push_back(Line {
                    text: piece,
                    fg,
                    attrs,
                });
            }
        }
        self.repaint();
        self.screen.borrow_mut().present()
    }

    /// Drop every line and blank the pane.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.repaint();
    }

    fn repaint(&self) {
        let mut screen = self.screen.borrow_mut();
        let frame = &mut screen.frame;
        frame.fill(self.rect, Cell::EMPTY);
        for (y, line) in (self.rect.y..).zip(&self.lines) {
            frame.paint_text(
                self.rect.x,
                y,
                &line.text,
                line.fg,
                CellColor::Default,
                line.attrs,
                self.rect,
            );
        }
    }
}

/// Split `text` into pieces no wider than `width` columns.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push(ch);
        used += w;
    }
    pieces.push(current);
    pieces
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyCode;
    use pretty_assertions::assert_eq;

    fn screen() -> SharedScreen {
        Screen::headless(20, 10, ScreenConfig::default())
    }

    // ── Screen ──────────────────────────────────────────────────────────

    #[test]
    fn headless_screen_has_requested_size() {
        let s = screen();
        assert_eq!(s.borrow().size(), Size { cols: 20, rows: 10 });
        assert!(s.borrow().is_headless());
        assert!(s.borrow().has_colors());
    }

    #[test]
    fn color_override() {
        let s = Screen::headless(4, 4, ScreenConfig {
            colors: Some(false),
            ..ScreenConfig::default()
        });
        assert!(!s.borrow().has_colors());
    }

    #[test]
    fn headless_poll_serves_queued_keys_then_none() {
        let s = screen();
        s.borrow_mut().push_keys([KeyEvent::plain(KeyCode::Char('q'))]);
        let first = s.borrow_mut().poll_key(Some(Duration::ZERO)).unwrap();
        assert_eq!(first, Some(KeyEvent::plain(KeyCode::Char('q'))));
        assert_eq!(s.borrow_mut().poll_key(None).unwrap(), None);
    }

    #[test]
    fn present_and_shutdown_headless() {
        let s = screen();
        s.borrow_mut().present().unwrap();
        s.borrow_mut().shutdown().unwrap();
    }

    // ── Window ──────────────────────────────────────────────────────────

    #[test]
    fn window_writes_are_offset() {
        let s = screen();
        let w = Window::new(&s, Rect::new(5, 2, 10, 4)).unwrap();
        assert_eq!(w.extent(), (4, 10));
        assert!(w.put(1, 3, Cell::new('O')));
        assert_eq!(s.borrow().frame().get(8, 3).unwrap().character(), Some('O'));
        assert_eq!(w.get(1, 3).unwrap().character(), Some('O'));
    }

    #[test]
    fn window_writes_are_clipped() {
        let s = screen();
        let w = Window::new(&s, Rect::new(0, 0, 3, 3)).unwrap();
        assert!(!w.put(3, 0, Cell::new('O')));
        assert!(!w.put(0, 3, Cell::new('O')));
        assert!(w.get(3, 3).is_none());
        assert_eq!(s.borrow().frame().row_text(0), " ".repeat(20));
    }

    #[test]
    fn window_clear_only_touches_its_rect() {
        let s = screen();
        s.borrow_mut().frame.set(19, 9, Cell::new('z'));
        let w = Window::new(&s, Rect::new(0, 0, 4, 4)).unwrap();
        w.put(0, 0, Cell::new('O'));
        w.clear();
        assert!(w.get(0, 0).unwrap().is_empty());
        assert_eq!(s.borrow().frame().get(19, 9).unwrap().character(), Some('z'));
    }

    #[test]
    fn window_outside_screen_is_rejected() {
        let s = screen();
        let err = Window::new(&s, Rect::new(15, 0, 10, 2)).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(Window::new(&s, Rect::new(0, 0, 0, 2)).is_err());
    }

    // ── Pane ────────────────────────────────────────────────────────────

    #[test]
    fn pane_scrolls_oldest_line_out() {
        let s = screen();
        let mut p = Pane::new(&s, Rect::new(0, 7, 20, 3)).unwrap();
        for text in ["one", "two", "three", "four"] {
            p.push(text, CellColor::Default, Attr::empty()).unwrap();
        }
        assert_eq!(p.lines().collect::<Vec<_>>(), vec!["two", "three", "four"]);
        assert_eq!(s.borrow().frame().row_text(7).trim_end(), "two");
        assert_eq!(s.borrow().frame().row_text(9).trim_end(), "four");
    }

    #[test]
    fn pane_wraps_long_lines() {
        let s = screen();
        let mut p = Pane::new(&s, Rect::new(0, 0, 5, 4)).unwrap();
        p.push("Score: 12", CellColor::Default, Attr::empty()).unwrap();
        assert_eq!(p.lines().collect::<Vec<_>>(), vec!["Score", ": 12"]);
    }

    #[test]
    fn pane_splits_newlines() {
        let s = screen();
        let mut p = Pane::new(&s, Rect::new(0, 0, 20, 4)).unwrap();
        p.push("a\nb", CellColor::Default, Attr::BOLD).unwrap();
        assert_eq!(p.lines().count(), 2);
        assert_eq!(s.borrow().frame().get(0, 1).unwrap().attrs, Attr::BOLD);
    }

    #[test]
    fn pane_clear_blanks() {
        let s = screen();
        let mut p = Pane::new(&s, Rect::new(0, 0, 20, 2)).unwrap();
        p.push("GAME OVER", CellColor::Default, Attr::empty()).unwrap();
        p.clear();
        assert_eq!(p.lines().count(), 0);
        assert_eq!(s.borrow().frame().row_text(0).trim(), "");
    }

    #[test]
    fn wrap_edges() {
        assert_eq!(wrap("", 4), vec![String::new()]);
        assert_eq!(wrap("abcd", 4), vec!["abcd".to_string()]);
        assert_eq!(wrap("中中中", 4), vec!["中中".to_string(), "中".to_string()]);
    }
}
