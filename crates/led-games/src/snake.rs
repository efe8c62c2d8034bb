// SPDX-License-Identifier: MIT
//
// Snake: eat the targets, don't hit the walls or yourself.
//
// The body is a ring buffer as large as the grid, head first. Every update:
//
//   1. take the requested direction unless it reverses the snake
//   2. head on the target: move the target somewhere free and grow
//      (with no free cell left, the player has won)
//   3. head about to leave the grid, or sitting on its own body: crash
//   4. otherwise drop the tail (unless growing) and step the head
//
// A crash marks the head in reverse video and stops the round. The score is
// the number of targets eaten.

use std::collections::VecDeque;
use std::time::Duration;

use led_core::{Grid, Result, Session, Style, Surface};
use led_term::cell::Attr;
use led_term::color::AnsiColor;
use log::Level;
use rand::Rng;

use crate::program::{Command, Pace, RoundEnd, Ticker, nap};

pub const SNAKE_STYLE: u8 = 1;
pub const TARGET_STYLE: u8 = 2;

/// Snake game pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnakeConfig {
    pub pace: Pace,
}

impl Default for SnakeConfig {
    fn default() -> Self {
        Self {
            pace: Pace {
                tick: Duration::from_millis(8),
                ticks_per_update: 50,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Up,
    Down,
    Right,
}

impl Direction {
    const ALL: [Self; 4] = [Self::Left, Self::Up, Self::Down, Self::Right];

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Right => Self::Left,
        }
    }

    /// `(row, col)` step.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Left => (0, -1),
            Self::Up => (-1, 0),
            Self::Down => (1, 0),
            Self::Right => (0, 1),
        }
    }
}

/// `(row, col)` on the grid.
pub type Position = (i32, i32);

/// One round of the snake game.
#[derive(Debug, Clone)]
pub struct Snake {
    rows: i32,
    cols: i32,
    /// Head first.
    body: VecDeque<Position>,
    capacity: usize,
    dir: Direction,
    requested: Direction,
    target: Position,
    ticker: Ticker,
    running: bool,
    reported: bool,
}

impl Snake {
    /// A one-cell snake at a random position heading a random way, and a
    /// first target.
    ///
    /// # Errors
    ///
    /// Propagates session failures.
    pub fn new<S: Surface, R: Rng + ?Sized>(
        session: &mut Session<S>,
        config: &SnakeConfig,
        rng: &mut R,
    ) -> Result<Self> {
        let grid = session.grid();
        let start = (
            rng.random_range(0..i32::from(grid.rows)),
            rng.random_range(0..i32::from(grid.cols)),
        );
        let dir = start_direction(grid, start, rng);
        session.info(Level::Info, format_args!("---- Start position: ({}, {}) ----", start.0, start.1));
        session.info(Level::Info, format_args!("Arrows to move. Press 'Q' to exit"));
        let mut snake = Self::placed(grid, start, dir, config);
        session.set_diode(start.0, start.1, SNAKE_STYLE)?;
        snake.place_target(session, rng)?;
        Ok(snake)
    }

    /// A one-cell snake at `start`, with the target not yet placed.
    fn placed(grid: Grid, start: Position, dir: Direction, config: &SnakeConfig) -> Self {
        let capacity = grid.len();
        let mut body = VecDeque::with_capacity(capacity);
        body.push_front(start);
        Self {
            rows: i32::from(grid.rows),
            cols: i32::from(grid.cols),
            body,
            capacity,
            dir,
            requested: dir,
            target: start,
            ticker: Ticker::new(config.pace.ticks_per_update),
            running: true,
            reported: false,
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    #[must_use]
    pub fn head(&self) -> Position {
        self.body.front().copied().unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    #[must_use]
    pub const fn target(&self) -> Position {
        self.target
    }

    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.dir
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.body.len().saturating_sub(1)
    }

    fn occupies(&self, cell: Position) -> bool {
        self.body.contains(&cell)
    }

    // ─── Round ───────────────────────────────────────────────────────────

    /// Put the target on a free cell. With no free cell left the round is
    /// won and nothing is placed.
    fn place_target<S: Surface, R: Rng + ?Sized>(&mut self, session: &mut Session<S>, rng: &mut R) -> Result<()> {
        if self.body.len() >= self.capacity {
            session.info(Level::Info, format_args!("Full grid. Congrats!"));
            self.running = false;
            return Ok(());
        }
        session.info(Level::Debug, format_args!("Allocating target..."));
        let target = loop {
            let cell = (rng.random_range(0..self.rows), rng.random_range(0..self.cols));
            if !self.occupies(cell) {
                break cell;
            }
        };
        self.target = target;
        session.info(Level::Info, format_args!("New target: ({}, {})", target.0, target.1));
        session.set_diode(target.0, target.1, TARGET_STYLE)
    }

    /// Steer. Returns how the round ends, if this command ends it.
    pub const fn command(&mut self, command: Command) -> Option<RoundEnd> {
        match command {
            Command::Quit => return Some(RoundEnd::Quit),
            Command::Restart => return Some(RoundEnd::Restart),
            Command::Up => self.requested = Direction::Up,
            Command::Down => self.requested = Direction::Down,
            Command::Left => self.requested = Direction::Left,
            Command::Right => self.requested = Direction::Right,
        }
        None
    }

    /// Light every body cell.
    ///
    /// # Errors
    ///
    /// Propagates session failures.
    pub fn paint<S: Surface>(&self, session: &mut Session<S>) -> Result<()> {
        for &(row, col) in &self.body {
            session.set_diode(row, col, SNAKE_STYLE)?;
        }
        Ok(())
    }

    /// One tick has passed: count it, or report the end of the round once.
    ///
    /// # Errors
    ///
    /// Propagates session failures.
    pub fn tick<S: Surface, R: Rng + ?Sized>(&mut self, session: &mut Session<S>, rng: &mut R) -> Result<()> {
        if self.running {
            if self.ticker.tick() {
                self.update(session, rng)?;
            }
        } else if !self.reported {
            self.reported = true;
            session.info(Level::Warn, format_args!("== GAME OVER =="));
            session.info(Level::Info, format_args!("Score: {}", self.score()));
            session.info(Level::Info, format_args!("Press 'R' to restart"));
        }
        Ok(())
    }

    /// Move the snake one cell.
    ///
    /// # Errors
    ///
    /// Propagates session failures.
    pub fn update<S: Surface, R: Rng + ?Sized>(&mut self, session: &mut Session<S>, rng: &mut R) -> Result<()> {
        if self.requested != self.dir.opposite() {
            self.dir = self.requested;
        }
        let head = self.head();

        let grow = head == self.target;
        if grow {
            if self.body.len() + 1 >= self.capacity {
                session.info(Level::Info, format_args!("Full grid. Congrats!"));
                self.running = false;
                return Ok(());
            }
            self.place_target(session, rng)?;
        }

        let (dr, dc) = self.dir.delta();
        let next = (head.0 + dr, head.1 + dc);
        let off_grid = !(0..self.rows).contains(&next.0) || !(0..self.cols).contains(&next.1);
        if off_grid || self.body.iter().skip(1).any(|&c| c == head) {
            log::debug!("crash at {head:?} heading {:?}", self.dir);
            session.set_diode_attrs(head.0, head.1, Attr::INVERSE)?;
            self.running = false;
            return Ok(());
        }

        if !grow {
            if let Some((row, col)) = self.body.pop_back() {
                session.set_diode(row, col, 0)?;
            }
        }
        self.body.push_front(next);
        Ok(())
    }

    /// Play until the player quits or restarts.
    ///
    /// # Errors
    ///
    /// Propagates session failures.
    pub fn run<S: Surface, R: Rng + ?Sized>(
        &mut self,
        session: &mut Session<S>,
        tick: Duration,
        rng: &mut R,
    ) -> Result<RoundEnd> {
        loop {
            session.render()?;
            if let Some(key) = session.read_key(Some(Duration::ZERO))? {
                if let Some(end) = Command::from_key(key).and_then(|c| self.command(c)) {
                    return Ok(end);
                }
            }
            nap(tick);
            self.tick(session, rng)?;
            self.paint(session)?;
        }
    }
}

/// A random direction, except that corners only allow the two directions
/// pointing into the grid.
fn start_direction<R: Rng + ?Sized>(grid: Grid, (row, col): Position, rng: &mut R) -> Direction {
    let last_row = i32::from(grid.rows) - 1;
    let last_col = i32::from(grid.cols) - 1;
    let vertical = if row == 0 {
        Some(Direction::Down)
    } else if row == last_row {
        Some(Direction::Up)
    } else {
        None
    };
    let horizontal = if col == 0 {
        Some(Direction::Right)
    } else if col == last_col {
        Some(Direction::Left)
    } else {
        None
    };
    match (vertical, horizontal) {
        (Some(v), Some(h)) => {
            if rng.random_bool(0.5) {
                v
            } else {
                h
            }
        }
        _ => Direction::ALL[rng.random_range(0..Direction::ALL.len())],
    }
}

/// Play rounds of snake on `session` until the player quits.
///
/// # Errors
///
/// Propagates session failures.
pub fn play<S: Surface, R: Rng + ?Sized>(session: &mut Session<S>, config: &SnakeConfig, rng: &mut R) -> Result<()> {
    session.register_style(TARGET_STYLE, Style::new(AnsiColor::Yellow, AnsiColor::Black));
    loop {
        let mut snake = Snake::new(session, config, rng)?;
        match snake.run(session, config.pace.tick, rng)? {
            RoundEnd::Quit => return Ok(()),
            RoundEnd::Restart => {
                log::debug!("restarting snake");
                session.reset_diodes();
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use led_core::{MemorySink, NullSink, RecordingSurface, SessionConfig};
    use led_term::input::{KeyCode, KeyEvent};
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn session(rows: u16, cols: u16) -> Session<RecordingSurface> {
        Session::new(
            RecordingSurface::new(rows * 3, cols * 6),
            &SessionConfig::with_grid(rows, cols),
            Box::new(NullSink),
        )
        .unwrap()
    }

    fn config() -> SnakeConfig {
        SnakeConfig {
            pace: Pace {
                tick: Duration::ZERO,
                ticks_per_update: 1,
            },
        }
    }

    /// A snake at `start` with its target pinned at `target`.
    fn snake(s: &mut Session<RecordingSurface>, start: Position, dir: Direction, target: Position) -> Snake {
        let mut snake = Snake::placed(s.grid(), start, dir, &config());
        snake.target = target;
        s.set_diode(start.0, start.1, SNAKE_STYLE).unwrap();
        s.set_diode(target.0, target.1, TARGET_STYLE).unwrap();
        snake
    }

    // ── Start ───────────────────────────────────────────────────────────

    #[test]
    fn corners_start_heading_inwards() {
        let grid = Grid::new(6, 8);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let top_left = start_direction(grid, (0, 0), &mut rng);
            assert!(matches!(top_left, Direction::Down | Direction::Right));
            let bottom_right = start_direction(grid, (5, 7), &mut rng);
            assert!(matches!(bottom_right, Direction::Up | Direction::Left));
            let top_right = start_direction(grid, (0, 7), &mut rng);
            assert!(matches!(top_right, Direction::Down | Direction::Left));
            let bottom_left = start_direction(grid, (5, 0), &mut rng);
            assert!(matches!(bottom_left, Direction::Up | Direction::Right));
        }
    }

    #[test]
    fn new_round_lights_snake_and_target() {
        let mut s = session(6, 8);
        let sink = MemorySink::new();
        s.set_info_sink(Box::new(sink.clone()));
        let snake = Snake::new(&mut s, &config(), &mut StdRng::seed_from_u64(3)).unwrap();
        let (hr, hc) = snake.head();
        let (tr, tc) = snake.target();
        assert_ne!(snake.head(), snake.target());
        assert_eq!(s.diode(hr, hc).unwrap().value, SNAKE_STYLE);
        assert_eq!(s.diode(tr, tc).unwrap().value, TARGET_STYLE);
        assert!(sink.contains(&format!("---- Start position: ({hr}, {hc}) ----")));
        assert!(sink.contains(&format!("New target: ({tr}, {tc})")));
    }

    #[test]
    fn single_cell_grid_is_won_at_once() {
        let mut s = session(1, 1);
        let sink = MemorySink::new();
        s.set_info_sink(Box::new(sink.clone()));
        let snake = Snake::new(&mut s, &config(), &mut StdRng::seed_from_u64(5)).unwrap();
        assert!(!snake.is_running());
        assert_eq!(snake.head(), (0, 0));
        assert_eq!(s.diode(0, 0).unwrap().value, SNAKE_STYLE);
        assert!(sink.contains("Full grid. Congrats!"));
        assert!(!sink.contains("Allocating target..."));
    }

    #[test]
    fn two_cell_grid_places_the_target_in_the_free_cell() {
        let mut s = session(1, 2);
        let snake = Snake::new(&mut s, &config(), &mut StdRng::seed_from_u64(5)).unwrap();
        assert!(snake.is_running());
        let (hr, hc) = snake.head();
        assert_eq!(snake.target(), (hr, 1 - hc));
    }

    // ── Movement ────────────────────────────────────────────────────────

    #[test]
    fn moving_drops_the_tail() {
        let mut s = session(6, 8);
        let mut r = StdRng::seed_from_u64(0);
        let mut snake = snake(&mut s, (2, 2), Direction::Right, (5, 7));
        snake.update(&mut s, &mut r).unwrap();
        snake.paint(&mut s).unwrap();
        assert_eq!(snake.head(), (2, 3));
        assert_eq!(snake.len(), 1);
        assert_eq!(s.diode(2, 2).unwrap().value, 0);
        assert_eq!(s.diode(2, 3).unwrap().value, SNAKE_STYLE);
    }

    #[test]
    fn reversing_is_ignored() {
        let mut s = session(6, 8);
        let mut r = StdRng::seed_from_u64(0);
        let mut snake = snake(&mut s, (2, 2), Direction::Right, (5, 7));
        snake.command(Command::Left);
        snake.update(&mut s, &mut r).unwrap();
        assert_eq!(snake.head(), (2, 3));
        snake.command(Command::Down);
        snake.update(&mut s, &mut r).unwrap();
        assert_eq!(snake.head(), (3, 3));
        assert_eq!(snake.direction(), Direction::Down);
    }

    #[test]
    fn eating_grows_and_moves_the_target() {
        let mut s = session(6, 8);
        let mut r = StdRng::seed_from_u64(0);
        let mut snake = snake(&mut s, (2, 2), Direction::Right, (2, 2));
        snake.update(&mut s, &mut r).unwrap();
        assert_eq!(snake.len(), 2);
        assert_eq!(snake.score(), 1);
        assert_ne!(snake.target(), (2, 2));
        let (tr, tc) = snake.target();
        assert_eq!(s.diode(tr, tc).unwrap().value, TARGET_STYLE);
    }

    #[test]
    fn wall_ends_the_round() {
        let mut s = session(6, 8);
        let mut r = StdRng::seed_from_u64(0);
        let mut snake = snake(&mut s, (0, 4), Direction::Up, (5, 7));
        snake.update(&mut s, &mut r).unwrap();
        assert!(!snake.is_running());
        assert_eq!(snake.head(), (0, 4));
        assert_eq!(s.diode(0, 4).unwrap().attrs, Attr::INVERSE);
    }

    #[test]
    fn biting_itself_ends_the_round() {
        let mut s = session(6, 8);
        let mut r = StdRng::seed_from_u64(0);
        let mut snake = snake(&mut s, (2, 2), Direction::Right, (5, 7));
        // Head (2, 2) already inside its own body.
        snake.body = VecDeque::from([(2, 2), (2, 3), (3, 3), (3, 2), (2, 2)]);
        snake.update(&mut s, &mut r).unwrap();
        assert!(!snake.is_running());
        assert_eq!(s.diode(2, 2).unwrap().attrs, Attr::INVERSE);
    }

    #[test]
    fn following_the_tail_is_safe() {
        let mut s = session(6, 8);
        let mut r = StdRng::seed_from_u64(0);
        let mut snake = snake(&mut s, (2, 2), Direction::Up, (5, 7));
        // Head (2, 2), tail (2, 3): moving up then right then down chases it.
        snake.body = VecDeque::from([(2, 2), (3, 2), (3, 3), (2, 3)]);
        snake.command(Command::Right);
        snake.update(&mut s, &mut r).unwrap();
        assert!(snake.is_running());
        assert_eq!(snake.head(), (2, 3));
    }

    #[test]
    fn full_grid_wins() {
        let mut s = session(1, 2);
        let sink = MemorySink::new();
        s.set_info_sink(Box::new(sink.clone()));
        let mut r = StdRng::seed_from_u64(0);
        let mut snake = snake(&mut s, (0, 0), Direction::Right, (0, 0));
        snake.update(&mut s, &mut r).unwrap();
        assert!(!snake.is_running());
        assert!(sink.contains("Full grid. Congrats!"));
    }

    #[test]
    fn game_over_is_reported_once() {
        let mut s = session(6, 8);
        let sink = MemorySink::new();
        s.set_info_sink(Box::new(sink.clone()));
        let mut r = StdRng::seed_from_u64(0);
        let mut snake = snake(&mut s, (0, 4), Direction::Up, (5, 7));
        snake.body.push_back((1, 4));
        snake.update(&mut s, &mut r).unwrap();
        snake.tick(&mut s, &mut r).unwrap();
        snake.tick(&mut s, &mut r).unwrap();
        assert_eq!(sink.texts(), vec!["== GAME OVER ==", "Score: 1", "Press 'R' to restart"]);
    }

    // ── Loop ────────────────────────────────────────────────────────────

    #[test]
    fn play_until_quit() {
        let mut s = session(6, 8);
        s.surface_mut().push_keys([KeyEvent::plain(KeyCode::Char('q'))]);
        play(&mut s, &config(), &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(s.surface().frames().len(), 1);
    }

    #[test]
    fn restart_clears_the_board() {
        let mut s = session(6, 8);
        s.surface_mut().push_keys([
            KeyEvent::plain(KeyCode::Char('r')),
            KeyEvent::plain(KeyCode::Char('q')),
        ]);
        play(&mut s, &config(), &mut StdRng::seed_from_u64(5)).unwrap();
        let lit = (0..6)
            .flat_map(|r| (0..8).map(move |c| (r, c)))
            .filter(|&(r, c)| s.diode(r, c).unwrap().is_on())
            .count();
        assert_eq!(lit, 2);
    }
}
