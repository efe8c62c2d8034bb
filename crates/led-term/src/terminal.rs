// SPDX-License-Identifier: MIT
//
// The controlling terminal: size, colour support, raw mode and the
// alternate screen.
//
// Safety: termios, ioctl(TIOCGWINSZ), isatty and the raw fd write in the
// panic hook are the POSIX terminal interfaces and have no safe wrapper in
// std. Unsafe blocks are kept to the single call they need.
#![allow(unsafe_code)]
//
// `Terminal::enter` switches stdin to raw mode (a `RawMode` guard that
// restores the saved termios on drop) and writes the setup sequence;
// `leave` writes the matching restore sequence and drops the guard. The
// restore bytes are also kept as a constant for the panic hook, which
// writes them straight to fd 1 so a panic in the middle of a frame cannot
// deadlock on the stdout lock.

use std::io::{self, Write};
use std::sync::{Mutex, Once};

use crate::ansi;

/// Size assumed when the terminal cannot be asked.
pub const FALLBACK_SIZE: Size = Size { cols: 80, rows: 24 };

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub cols: u16,
    pub rows: u16,
}

// ─── Queries ─────────────────────────────────────────────────────────────────

/// Ask stdout's terminal for its size. `None` when stdout is not a
/// terminal or reports a zero dimension.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let ok = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &raw mut ws) } == 0;
    (ok && ws.ws_col > 0 && ws.ws_row > 0).then_some(Size {
        cols: ws.ws_col,
        rows: ws.ws_row,
    })
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

/// Whether a terminal named `term` can show colours. Unset, empty and
/// `dumb` cannot.
#[must_use]
pub fn term_supports_color(term: Option<&str>) -> bool {
    matches!(term, Some(t) if !t.is_empty() && t != "dumb")
}

/// Colour support of the running process: `NO_COLOR` wins, then `TERM`.
#[must_use]
pub fn supports_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
        return false;
    }
    term_supports_color(std::env::var("TERM").ok().as_deref())
}

// ─── Escape sequences ────────────────────────────────────────────────────────

/// Alternate screen, hidden cursor, blank page.
fn setup_sequence() -> Vec<u8> {
    let mut out = Vec::new();
    // Writes into a Vec cannot fail.
    let _ = ansi::enter_alt_screen(&mut out);
    let _ = ansi::cursor_hide(&mut out);
    let _ = ansi::clear_screen(&mut out);
    out
}

/// Undo `setup_sequence` and any half-written synchronized frame. The
/// alternate screen is left last so the shell comes back clean.
fn restore_sequence() -> Vec<u8> {
    let mut out = Vec::new();
    let _ = ansi::end_sync(&mut out);
    let _ = ansi::reset(&mut out);
    let _ = ansi::cursor_show(&mut out);
    let _ = ansi::exit_alt_screen(&mut out);
    out
}

/// `restore_sequence` as a constant, for the panic hook.
#[rustfmt::skip]
const PANIC_RESTORE: &[u8] = b"\
    \x1b[?2026l\
    \x1b[0m\
    \x1b[?25h\
    \x1b[?1049l";

// ─── Raw mode ────────────────────────────────────────────────────────────────

/// Termios saved by the active `RawMode`, for the panic hook.
#[cfg(unix)]
static SAVED_TERMIOS: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Clear the flags `cfmakeraw` clears. Reads block for one byte; the
/// reader thread does its own timing.
#[cfg(unix)]
const fn make_raw(t: &mut libc::termios) {
    t.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON);
    t.c_oflag &= !libc::OPOST;
    t.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
    t.c_cflag &= !(libc::CSIZE | libc::PARENB);
    t.c_cflag |= libc::CS8;
    t.c_cc[libc::VMIN] = 1;
    t.c_cc[libc::VTIME] = 0;
}

/// Stdin in raw mode until dropped. When stdin is not a terminal nothing
/// is changed and nothing is restored.
struct RawMode {
    #[cfg(unix)]
    saved: Option<libc::termios>,
}

impl RawMode {
    #[cfg(unix)]
    fn enable() -> io::Result<Self> {
        use std::os::unix::io::AsRawFd;

        if !is_tty() {
            return Ok(Self { saved: None });
        }
        let fd = io::stdin().as_raw_fd();
        let mut termios: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(fd, &raw mut termios) } != 0 {
            return Err(io::Error::last_os_error());
        }
        let saved = termios;
        make_raw(&mut termios);
        if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) } != 0 {
            return Err(io::Error::last_os_error());
        }
        if let Ok(mut slot) = SAVED_TERMIOS.lock() {
            *slot = Some(saved);
        }
        Ok(Self { saved: Some(saved) })
    }

    #[cfg(not(unix))]
    fn enable() -> io::Result<Self> {
        Ok(Self {})
    }

    #[cfg(unix)]
    fn restore(&mut self) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        let Some(saved) = self.saved.take() else {
            return Ok(());
        };
        if let Ok(mut slot) = SAVED_TERMIOS.lock() {
            *slot = None;
        }
        let fd = io::stdin().as_raw_fd();
        if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const saved) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn restore(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

// ─── Panic hook ──────────────────────────────────────────────────────────────

static PANIC_HOOK: Once = Once::new();

fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            write_panic_restore();
            #[cfg(unix)]
            if let Ok(slot) = SAVED_TERMIOS.lock() {
                if let Some(saved) = slot.as_ref() {
                    unsafe {
                        libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, saved);
                    }
                }
            }
            previous(info);
        }));
    });
}

fn write_panic_restore() {
    #[cfg(unix)]
    unsafe {
        libc::write(
            libc::STDOUT_FILENO,
            PANIC_RESTORE.as_ptr().cast::<libc::c_void>(),
            PANIC_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(PANIC_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Terminal ────────────────────────────────────────────────────────────────

/// The process's terminal. Left automatically when dropped.
///
/// ```no_run
/// use led_term::terminal::Terminal;
///
/// let mut term = Terminal::new();
/// term.enter()?;
/// // ... draw the board, read keys ...
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Terminal {
    size: Size,
    raw: Option<RawMode>,
}

impl Terminal {
    /// A handle sized from the OS, or [`FALLBACK_SIZE`]. The terminal is
    /// untouched until [`enter`](Self::enter).
    #[must_use]
    pub fn new() -> Self {
        Self {
            size: get_size().unwrap_or(FALLBACK_SIZE),
            raw: None,
        }
    }

    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.raw.is_some()
    }

    /// Raw mode and the alternate screen. Does nothing when already active.
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode cannot be set or stdout fails.
    pub fn enter(&mut self) -> io::Result<()> {
        if self.raw.is_some() {
            return Ok(());
        }
        install_panic_hook();
        let raw = RawMode::enable()?;

        let mut stdout = io::stdout().lock();
        stdout.write_all(&setup_sequence())?;
        stdout.flush()?;

        self.raw = Some(raw);
        Ok(())
    }

    /// Undo [`enter`](Self::enter). Does nothing when not active.
    ///
    /// # Errors
    ///
    /// Returns an error if stdout fails or the saved termios cannot be put
    /// back.
    pub fn leave(&mut self) -> io::Result<()> {
        let Some(mut raw) = self.raw.take() else {
            return Ok(());
        };
        let mut stdout = io::stdout().lock();
        stdout.write_all(&restore_sequence())?;
        stdout.flush()?;
        drop(stdout);
        raw.restore()
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ── Queries ───────────────────────────────────────────────────────────

    #[test]
    fn queries_do_not_panic() {
        let _ = get_size();
        let _ = is_tty();
        let _ = supports_color();
    }

    #[test]
    fn color_support_by_term_name() {
        assert!(term_supports_color(Some("xterm-256color")));
        assert!(term_supports_color(Some("screen")));
        assert!(!term_supports_color(Some("dumb")));
        assert!(!term_supports_color(Some("")));
        assert!(!term_supports_color(None));
    }

    // ── Sequences ─────────────────────────────────────────────────────────

    #[test]
    fn panic_restore_matches_leave() {
        assert_eq!(PANIC_RESTORE, restore_sequence().as_slice());
        assert!(PANIC_RESTORE.ends_with(b"\x1b[?1049l"));
    }

    #[test]
    fn setup_enters_the_alternate_screen_first() {
        let seq = setup_sequence();
        assert!(seq.starts_with(b"\x1b[?1049h"));
        assert!(seq.ends_with(b"\x1b[2J"));
    }

    #[cfg(unix)]
    #[test]
    fn raw_flags() {
        let mut t: libc::termios = unsafe { std::mem::zeroed() };
        t.c_lflag = libc::ECHO | libc::ICANON | libc::ISIG;
        t.c_iflag = libc::ICRNL | libc::IXON;
        make_raw(&mut t);
        assert_eq!(t.c_lflag & (libc::ECHO | libc::ICANON | libc::ISIG), 0);
        assert_eq!(t.c_iflag & (libc::ICRNL | libc::IXON), 0);
        assert_eq!(t.c_cflag & libc::CS8, libc::CS8);
        assert_eq!(t.c_cc[libc::VMIN], 1);
    }

    // ── Terminal ──────────────────────────────────────────────────────────

    #[test]
    fn new_terminal_is_inactive() {
        let mut term = Terminal::new();
        assert!(!term.is_active());
        assert!(term.size().cols > 0 && term.size().rows > 0);
        term.leave().unwrap();
        assert!(!term.is_active());
    }
}
