// SPDX-License-Identifier: MIT
//
// Pieces shared by the games: key commands, the tick counter that paces
// updates, and how a round ends.

use std::time::Duration;

use led_term::input::{KeyCode, KeyEvent};

/// What a key press asks the game to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Up,
    Down,
    Left,
    Right,
    Quit,
    Restart,
}

impl Command {
    /// Arrows move, `q` quits, `r` restarts. Ctrl-C quits too since raw
    /// mode delivers it as a key.
    #[must_use]
    pub fn from_key(key: KeyEvent) -> Option<Self> {
        if key.is_interrupt() {
            return Some(Self::Quit);
        }
        match key.code {
            KeyCode::Up => Some(Self::Up),
            KeyCode::Down => Some(Self::Down),
            KeyCode::Left => Some(Self::Left),
            KeyCode::Right => Some(Self::Right),
            KeyCode::Char('q' | 'Q') => Some(Self::Quit),
            KeyCode::Char('r' | 'R') => Some(Self::Restart),
            _ => None,
        }
    }
}

/// How a round of a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEnd {
    Quit,
    Restart,
}

/// Counts ticks and says when an update is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticker {
    ticks_per_update: u32,
    ticks: u32,
}

impl Ticker {
    #[must_use]
    pub const fn new(ticks_per_update: u32) -> Self {
        Self {
            ticks_per_update,
            ticks: 0,
        }
    }

    /// Count one tick. Returns `true`, and starts over, once enough ticks
    /// have passed for an update.
    pub const fn tick(&mut self) -> bool {
        self.ticks += 1;
        if self.ticks >= self.ticks_per_update {
            self.ticks = 0;
            return true;
        }
        false
    }

    #[must_use]
    pub const fn ticks_per_update(&self) -> u32 {
        self.ticks_per_update
    }

    /// Update `step` ticks sooner, but never more often than every `floor`.
    pub fn speed_up(&mut self, step: u32, floor: u32) {
        self.ticks_per_update = self.ticks_per_update.saturating_sub(step).max(floor);
        log::debug!("ticks per update now {}", self.ticks_per_update);
    }
}

/// Pacing of a game loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pace {
    /// Sleep between ticks.
    pub tick: Duration,
    /// Ticks between updates at the start of a round.
    pub ticks_per_update: u32,
}

/// Sleep for one tick. Zero skips the call entirely.
pub fn nap(tick: Duration) {
    if !tick.is_zero() {
        std::thread::sleep(tick);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use led_term::input::Modifiers;
    use pretty_assertions::assert_eq;

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(Command::from_key(KeyEvent::plain(KeyCode::Left)), Some(Command::Left));
        assert_eq!(Command::from_key(KeyEvent::plain(KeyCode::Char('Q'))), Some(Command::Quit));
        assert_eq!(Command::from_key(KeyEvent::plain(KeyCode::Char('r'))), Some(Command::Restart));
        assert_eq!(Command::from_key(KeyEvent::plain(KeyCode::Char('x'))), None);
        let ctrl_c = KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: Modifiers::CTRL,
        };
        assert_eq!(Command::from_key(ctrl_c), Some(Command::Quit));
    }

    #[test]
    fn ticker_fires_every_n_ticks() {
        let mut t = Ticker::new(3);
        let fired: Vec<bool> = (0..7).map(|_| t.tick()).collect();
        assert_eq!(fired, vec![false, false, true, false, false, true, false]);
    }

    #[test]
    fn speed_up_stops_at_the_floor() {
        let mut t = Ticker::new(27);
        t.speed_up(5, 20);
        assert_eq!(t.ticks_per_update(), 22);
        t.speed_up(5, 20);
        assert_eq!(t.ticks_per_update(), 20);
        t.speed_up(5, 20);
        assert_eq!(t.ticks_per_update(), 20);
    }
}
