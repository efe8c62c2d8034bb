// SPDX-License-Identifier: MIT
//
// Styles and glyphs.
//
// A lit diode's value picks a color pair from the session's
// `StyleRegistry`. Which character goes where, on or off, edge or fill,
// comes from its `GlyphSet`.

use std::collections::BTreeMap;

use led_term::cell::{Attr, Cell};
use led_term::color::{AnsiColor, CellColor};

// ─── StyleRegistry ───────────────────────────────────────────────────────────

/// Foreground and background for a lit diode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub fg: CellColor,
    pub bg: CellColor,
}

impl Style {
    #[must_use]
    pub fn new(fg: impl Into<CellColor>, bg: impl Into<CellColor>) -> Self {
        Self {
            fg: fg.into(),
            bg: bg.into(),
        }
    }
}

/// Color pairs indexed by diode value.
///
/// Index 0 means "off" and is never looked up. Style 1 is red on black
/// unless replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRegistry {
    styles: BTreeMap<u8, Style>,
}

impl StyleRegistry {
    /// A registry with no styles at all.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            styles: BTreeMap::new(),
        }
    }

    /// Register or replace the style for diode value `index`.
    pub fn register(&mut self, index: u8, style: Style) {
        log::trace!("style {index} = {style:?}");
        self.styles.insert(index, style);
    }

    #[must_use]
    pub fn get(&self, index: u8) -> Option<Style> {
        self.styles.get(&index).copied()
    }

    /// The style a diode with `value` is drawn in.
    ///
    /// Off diodes, unregistered values and colorless surfaces all get the
    /// terminal's default colors.
    #[must_use]
    pub fn resolve(&self, value: u8, colors: bool) -> Style {
        const PLAIN: Style = Style {
            fg: CellColor::Default,
            bg: CellColor::Default,
        };
        if value == 0 || !colors {
            return PLAIN;
        }
        self.get(value).unwrap_or_else(|| {
            log::trace!("style {value} is not registered");
            PLAIN
        })
    }
}

impl Default for StyleRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(1, Style::new(AnsiColor::Red, AnsiColor::Black));
        registry
    }
}

// ─── GlyphSet ────────────────────────────────────────────────────────────────

/// A character and the attributes it is always drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub ch: char,
    pub attrs: Attr,
}

impl Glyph {
    #[must_use]
    pub const fn new(ch: char, attrs: Attr) -> Self {
        Self { ch, attrs }
    }

    /// The cell for this glyph in `style`, with `extra` highlight attributes.
    #[must_use]
    pub fn cell(self, style: Style, extra: Attr) -> Cell {
        Cell::styled(self.ch, style.fg, style.bg, self.attrs | extra)
    }
}

/// The characters a diode is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphSet {
    pub edge_on: Glyph,
    pub edge_off: Glyph,
    pub inner_on: Glyph,
    pub inner_off: Glyph,
    /// Centre marker in debug sessions.
    pub center: Glyph,
}

impl GlyphSet {
    /// The default set for a surface. Without colors, a lit edge is also
    /// drawn in reverse video so on and off stay distinguishable.
    #[must_use]
    pub fn for_surface(colors: bool) -> Self {
        let mut set = Self::default();
        if !colors {
            set.edge_on.attrs |= Attr::INVERSE;
        }
        set
    }

    #[must_use]
    pub const fn edge(&self, on: bool) -> Glyph {
        if on { self.edge_on } else { self.edge_off }
    }

    #[must_use]
    pub const fn inner(&self, on: bool) -> Glyph {
        if on { self.inner_on } else { self.inner_off }
    }
}

impl Default for GlyphSet {
    fn default() -> Self {
        Self {
            edge_on: Glyph::new('O', Attr::BOLD),
            edge_off: Glyph::new('O', Attr::empty()),
            inner_on: Glyph::new('+', Attr::BOLD),
            inner_off: Glyph::new(' ', Attr::empty()),
            center: Glyph::new('x', Attr::empty()),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn style_one_is_red_on_black_by_default() {
        let r = StyleRegistry::default();
        assert_eq!(r.get(1), Some(Style::new(AnsiColor::Red, AnsiColor::Black)));
        assert_eq!(r.get(2), None);
    }

    #[test]
    fn register_replaces() {
        let mut r = StyleRegistry::default();
        r.register(1, Style::new(AnsiColor::Green, AnsiColor::Black));
        r.register(2, Style::new(AnsiColor::Blue, AnsiColor::Black));
        assert_eq!(r.get(1).unwrap().fg, CellColor::Ansi256(2));
        assert_eq!(r.get(2).unwrap().fg, CellColor::Ansi256(4));
    }

    #[test]
    fn resolve_falls_back_to_default_colors() {
        let r = StyleRegistry::default();
        let plain = Style::new(CellColor::Default, CellColor::Default);
        assert_eq!(r.resolve(0, true), plain);
        assert_eq!(r.resolve(1, false), plain);
        assert_eq!(r.resolve(9, true), plain);
        assert_eq!(r.resolve(1, true).fg, CellColor::Ansi256(1));
    }

    #[test]
    fn default_glyphs() {
        let g = GlyphSet::default();
        assert_eq!(g.edge(true), Glyph::new('O', Attr::BOLD));
        assert_eq!(g.edge(false), Glyph::new('O', Attr::empty()));
        assert_eq!(g.inner(true), Glyph::new('+', Attr::BOLD));
        assert_eq!(g.inner(false), Glyph::new(' ', Attr::empty()));
    }

    #[test]
    fn colorless_surface_reverses_lit_edges() {
        assert_eq!(GlyphSet::for_surface(false).edge_on.attrs, Attr::BOLD | Attr::INVERSE);
        assert_eq!(GlyphSet::for_surface(true), GlyphSet::default());
    }

    #[test]
    fn glyph_cell_combines_attrs_and_colors() {
        let cell = Glyph::new('O', Attr::BOLD).cell(Style::new(AnsiColor::Blue, AnsiColor::Black), Attr::INVERSE);
        assert_eq!(cell.character(), Some('O'));
        assert_eq!(cell.attrs, Attr::BOLD | Attr::INVERSE);
        assert_eq!(cell.fg, CellColor::Ansi256(4));
        assert_eq!(cell.bg, CellColor::Ansi256(0));
    }
}
