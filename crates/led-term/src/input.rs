// SPDX-License-Identifier: MIT
//
// Terminal key parser.
//
// Turns raw stdin bytes into key events:
//
// - ASCII and control characters (Ctrl+letter, Enter, Tab, Backspace)
// - Legacy CSI sequences (arrows, Home/End, editing keys, F5–F12)
// - SS3 sequences (application-mode arrows, F1–F4)
// - Alt+key (ESC followed by a printable character)
// - UTF-8 multi-byte characters
//
// Escape sequences can span several `read()` calls, so the parser keeps a
// small byte buffer. A lone ESC stays pending until more bytes arrive or
// the caller gives up waiting and calls [`Parser::flush`].

use bitflags::bitflags;

// ─── Key Types ──────────────────────────────────────────────────────────────

/// A key press with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// A press with no modifiers.
    #[must_use]
    pub const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
        }
    }

    /// Ctrl-C. Raw mode turns off ISIG, so the interrupt arrives as a key.
    #[must_use]
    pub fn is_interrupt(&self) -> bool {
        self.code == KeyCode::Char('c') && self.modifiers.contains(Modifiers::CTRL)
    }
}

/// Identity of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Escape,
    Delete,
    Insert,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    /// F1 through F12.
    F(u8),
}

bitflags! {
    /// Keyboard modifiers, in the xterm encoding where `param = 1 + bits`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0000_0001;
        const ALT   = 0b0000_0010;
        const CTRL  = 0b0000_0100;
        const SUPER = 0b0000_1000;
    }
}

// ─── Parser ─────────────────────────────────────────────────────────────────

/// Incremental key parser.
///
/// ```
/// use led_term::input::{KeyCode, Parser};
///
/// let mut p = Parser::new();
/// assert!(p.advance(b"\x1b[").is_empty());
/// let keys = p.advance(b"A");
/// assert_eq!(keys[0].code, KeyCode::Up);
/// ```
pub struct Parser {
    buf: Vec<u8>,
}

impl Parser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(64),
        }
    }

    /// Feed raw bytes and return every key that can be parsed so far.
    ///
    /// Incomplete sequences stay buffered for the next call.
    pub fn advance(&mut self, data: &[u8]) -> Vec<KeyEvent> {
        self.buf.extend_from_slice(data);
        let mut keys = Vec::new();
        let mut pos = 0;

        while pos < self.buf.len() {
            match try_parse(&self.buf[pos..]) {
                Parsed::Key(key, consumed) => {
                    keys.push(key);
                    pos += consumed;
                }
                Parsed::Incomplete => break,
                Parsed::Skip(n) => pos += n,
            }
        }

        if pos > 0 {
            self.buf.drain(..pos);
        }
        keys
    }

    /// Are there buffered bytes waiting for more input?
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Give up waiting: a pending lone ESC becomes Escape, other leftover
    /// bytes become plain or Ctrl characters.
    pub fn flush(&mut self) -> Vec<KeyEvent> {
        let keys = self
            .buf
            .iter()
            .filter_map(|&byte| match byte {
                0x1B => Some(KeyEvent::plain(KeyCode::Escape)),
                b @ 0x01..=0x1A => Some(ctrl(b)),
                0x7F => Some(KeyEvent::plain(KeyCode::Backspace)),
                b @ 0x20..=0x7E => Some(KeyEvent::plain(KeyCode::Char(b as char))),
                _ => None,
            })
            .collect();
        self.buf.clear();
        keys
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Stateless Parsing ──────────────────────────────────────────────────────

enum Parsed {
    Key(KeyEvent, usize),
    Incomplete,
    Skip(usize),
}

fn try_parse(buf: &[u8]) -> Parsed {
    let Some(&lead) = buf.first() else {
        return Parsed::Skip(0);
    };

    match lead {
        0x1B => parse_escape(buf),
        0x00 => Parsed::Key(with(KeyCode::Char('@'), Modifiers::CTRL), 1),
        0x08 | 0x7F => Parsed::Key(KeyEvent::plain(KeyCode::Backspace), 1),
        0x09 => Parsed::Key(KeyEvent::plain(KeyCode::Tab), 1),
        0x0A | 0x0D => Parsed::Key(KeyEvent::plain(KeyCode::Enter), 1),
        b @ 0x01..=0x1A => Parsed::Key(ctrl(b), 1),
        b @ 0x20..=0x7E => Parsed::Key(KeyEvent::plain(KeyCode::Char(b as char)), 1),
        0xC0..=0xFF => parse_utf8(buf),
        _ => Parsed::Skip(1),
    }
}

fn parse_escape(buf: &[u8]) -> Parsed {
    let Some(&second) = buf.get(1) else {
        return Parsed::Incomplete;
    };

    match second {
        b'[' => parse_csi(buf),
        b'O' => parse_ss3(buf),
        0x1B => Parsed::Key(with(KeyCode::Escape, Modifiers::ALT), 2),
        b @ 0x20..=0x7E => Parsed::Key(with(KeyCode::Char(b as char), Modifiers::ALT), 2),
        _ => Parsed::Key(KeyEvent::plain(KeyCode::Escape), 1),
    }
}

fn parse_csi(buf: &[u8]) -> Parsed {
    // Parameter bytes 0x30..=0x3F, intermediates 0x20..=0x2F, final 0x40..=0x7E.
    let mut end = 2;
    while end < buf.len() {
        let b = buf[end];
        if (0x40..=0x7E).contains(&b) {
            break;
        }
        if !(0x20..=0x3F).contains(&b) {
            return Parsed::Skip(end + 1);
        }
        end += 1;
    }
    if end >= buf.len() {
        return Parsed::Incomplete;
    }

    let final_byte = buf[end];
    let params = parse_params(&buf[2..end]);
    let consumed = end + 1;
    let modifiers = params.get(1).map_or(Modifiers::empty(), |&p| decode_modifiers(p));

    let code = if final_byte == b'~' {
        match params.first().copied().unwrap_or(0) {
            1 | 7 => KeyCode::Home,
            2 => KeyCode::Insert,
            3 => KeyCode::Delete,
            4 | 8 => KeyCode::End,
            5 => KeyCode::PageUp,
            6 => KeyCode::PageDown,
            15 => KeyCode::F(5),
            17 => KeyCode::F(6),
            18 => KeyCode::F(7),
            19 => KeyCode::F(8),
            20 => KeyCode::F(9),
            21 => KeyCode::F(10),
            23 => KeyCode::F(11),
            24 => KeyCode::F(12),
            _ => return Parsed::Skip(consumed),
        }
    } else {
        match final_byte {
            b'A' => KeyCode::Up,
            b'B' => KeyCode::Down,
            b'C' => KeyCode::Right,
            b'D' => KeyCode::Left,
            b'H' => KeyCode::Home,
            b'F' => KeyCode::End,
            b'P' => KeyCode::F(1),
            b'Q' => KeyCode::F(2),
            b'R' => KeyCode::F(3),
            b'S' => KeyCode::F(4),
            b'Z' => return Parsed::Key(with(KeyCode::Tab, Modifiers::SHIFT), consumed),
            _ => return Parsed::Skip(consumed),
        }
    };

    Parsed::Key(with(code, modifiers), consumed)
}

fn parse_ss3(buf: &[u8]) -> Parsed {
    let Some(&third) = buf.get(2) else {
        return Parsed::Incomplete;
    };

    let code = match third {
        b'A' => KeyCode::Up,
        b'B' => KeyCode::Down,
        b'C' => KeyCode::Right,
        b'D' => KeyCode::Left,
        b'H' => KeyCode::Home,
        b'F' => KeyCode::End,
        b'P' => KeyCode::F(1),
        b'Q' => KeyCode::F(2),
        b'R' => KeyCode::F(3),
        b'S' => KeyCode::F(4),
        _ => return Parsed::Skip(3),
    };
    Parsed::Key(KeyEvent::plain(code), 3)
}

fn parse_utf8(buf: &[u8]) -> Parsed {
    let expected = utf8_char_len(buf[0]);
    if expected == 0 {
        return Parsed::Skip(1);
    }
    if buf.len() < expected {
        return Parsed::Incomplete;
    }

    std::str::from_utf8(&buf[..expected])
        .ok()
        .and_then(|s| s.chars().next())
        .map_or(Parsed::Skip(1), |ch| {
            Parsed::Key(KeyEvent::plain(KeyCode::Char(ch)), expected)
        })
}

// ─── Helpers ────────────────────────────────────────────────────────────────

const fn with(code: KeyCode, modifiers: Modifiers) -> KeyEvent {
    KeyEvent { code, modifiers }
}

const fn ctrl(byte: u8) -> KeyEvent {
    with(KeyCode::Char((byte + b'a' - 1) as char), Modifiers::CTRL)
}

/// Semicolon-separated decimal parameters. Colon sub-parameters are dropped.
fn parse_params(raw: &[u8]) -> Vec<u16> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(|&b| b == b';')
        .map(|part| {
            part.iter()
                .take_while(|b| b.is_ascii_digit())
                .fold(0u16, |acc, &b| acc.saturating_mul(10).saturating_add(u16::from(b - b'0')))
        })
        .collect()
}

/// `1 + bitmask` encoding; 0 and 1 mean no modifiers.
#[allow(clippy::cast_possible_truncation)]
const fn decode_modifiers(param: u16) -> Modifiers {
    let val = if param > 0 { param - 1 } else { 0 };
    Modifiers::from_bits_truncate(val as u8)
}

const fn utf8_char_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 0,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
