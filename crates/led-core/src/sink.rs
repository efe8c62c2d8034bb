// SPDX-License-Identifier: MIT
//
// Info sinks: where a session's status and debug text goes.
//
// A session owns one boxed `InfoSink`. Games print their status through it
// ("Score: 12"), debug sessions print their setup facts. The terminal
// `Pane` is the interactive sink; `MemorySink` records for tests.

use std::cell::RefCell;
use std::rc::Rc;

use led_term::cell::Attr;
use led_term::color::{AnsiColor, CellColor};
use led_term::screen::Pane;
use log::Level;

/// Accepts leveled lines of text.
pub trait InfoSink {
    fn emit(&mut self, level: Level, text: &str);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl InfoSink for NullSink {
    fn emit(&mut self, _level: Level, _text: &str) {}
}

/// Records every line. Clones share the same record, so a test can keep
/// one clone and hand the other to a session.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    lines: Rc<RefCell<Vec<(Level, String)>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every line emitted so far.
    #[must_use]
    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.borrow().clone()
    }

    /// Just the text, in order.
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.lines.borrow().iter().map(|(_, t)| t.clone()).collect()
    }

    /// Whether any line contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|(_, t)| t.contains(needle))
    }

    pub fn clear(&self) {
        self.lines.borrow_mut().clear();
    }
}

impl InfoSink for MemorySink {
    fn emit(&mut self, level: Level, text: &str) {
        self.lines.borrow_mut().push((level, text.to_owned()));
    }
}

/// Color and attributes a pane line gets for its level.
const fn level_style(level: Level) -> (CellColor, Attr) {
    match level {
        Level::Error => (CellColor::Ansi256(AnsiColor::Red.index()), Attr::BOLD),
        Level::Warn => (CellColor::Ansi256(AnsiColor::Yellow.index()), Attr::empty()),
        Level::Info => (CellColor::Default, Attr::empty()),
        Level::Debug | Level::Trace => (CellColor::Default, Attr::DIM),
    }
}

impl InfoSink for Pane {
    fn emit(&mut self, level: Level, text: &str) {
        let (fg, attrs) = level_style(level);
        if let Err(e) = self.push(text, fg, attrs) {
            log::warn!("info pane write failed: {e}");
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use led_term::buffer::Rect;
    use led_term::screen::{Screen, ScreenConfig};
    use pretty_assertions::assert_eq;

    #[test]
    fn memory_sink_clones_share_lines() {
        let sink = MemorySink::new();
        let mut handle = sink.clone();
        handle.emit(Level::Info, "Score: 3");
        handle.emit(Level::Warn, "== GAME OVER ==");
        assert_eq!(
            sink.lines(),
            vec![
                (Level::Info, "Score: 3".to_string()),
                (Level::Warn, "== GAME OVER ==".to_string()),
            ]
        );
        assert!(sink.contains("GAME OVER"));
        sink.clear();
        assert!(sink.texts().is_empty());
    }

    #[test]
    fn null_sink_accepts_anything() {
        let mut sink = NullSink;
        sink.emit(Level::Error, "ignored");
    }

    #[test]
    fn pane_sink_styles_by_level() {
        let screen = Screen::headless(30, 4, ScreenConfig::default());
        let mut pane = Pane::new(&screen, Rect::new(0, 0, 30, 4)).unwrap();
        pane.emit(Level::Info, "Arrows to move");
        pane.emit(Level::Error, "boom");
        pane.emit(Level::Debug, "diode size 5");

        assert_eq!(pane.lines().collect::<Vec<_>>(), vec!["Arrows to move", "boom", "diode size 5"]);
        let s = screen.borrow();
        assert_eq!(s.frame().get(0, 0).unwrap().fg, CellColor::Default);
        assert_eq!(s.frame().get(0, 1).unwrap().fg, CellColor::Ansi256(1));
        assert_eq!(s.frame().get(0, 1).unwrap().attrs, Attr::BOLD);
        assert_eq!(s.frame().get(0, 2).unwrap().attrs, Attr::DIM);
    }
}
