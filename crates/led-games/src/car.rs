// SPDX-License-Identifier: MIT
//
// Car: dodge the obstacles scrolling down the lanes.
//
// The board is a ring of obstacle rows. Every update the ring turns by one
// row, so the rows appear to scroll down past the car: display row `i`
// shows ring row `(rows + i - cycle % rows) % rows`. The row leaving at the
// bottom is cleared; every second update it is refilled and enters at the
// top, so obstacle rows alternate with empty ones.
//
// A new obstacle row lights each lane with probability `prob` percent. A
// completely blocked row gets one random lane cleared.
//
// The car sits one row above the bottom. An update that finds an obstacle
// under it is a crash: the car is drawn in reverse video and the round
// stops. Every 100 cycles the game gets faster, down to one update every
// 20 ticks. The score is the number of obstacle rows survived.

use std::time::Duration;

use led_core::{Grid, LedError, Result, Session, Style, Surface};
use led_term::cell::Attr;
use led_term::color::AnsiColor;
use log::Level;
use rand::Rng;

use crate::program::{Command, Pace, RoundEnd, Ticker, nap};

/// Default board: twelve rows of four lanes.
pub const CAR_GRID: Grid = Grid::new(12, 4);

/// Obstacles use the default style 1 (red).
pub const OBSTACLE_STYLE: u8 = 1;
pub const CAR_STYLE: u8 = 2;

const SPEEDUP_EVERY: u32 = 100;
const SPEEDUP_STEP: u32 = 5;
const MIN_TICKS_PER_UPDATE: u32 = 20;
/// Rows at the bottom that start without obstacles.
const CLEAR_ROWS: u16 = 5;

/// Car game settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarConfig {
    /// Chance in percent that a lane of a new row holds an obstacle.
    pub prob: u8,
    pub pace: Pace,
}

impl Default for CarConfig {
    fn default() -> Self {
        Self {
            prob: 30,
            pace: Pace {
                tick: Duration::from_millis(5),
                ticks_per_update: 50,
            },
        }
    }
}

/// One round of the car game.
#[derive(Debug, Clone)]
pub struct Car {
    rows: u16,
    cols: u16,
    prob: u8,
    /// Ring of obstacle rows, row-major.
    obstacles: Vec<u8>,
    car_row: u16,
    car_col: u16,
    cycle: u32,
    ticker: Ticker,
    running: bool,
    reported: bool,
}

impl Car {
    /// A fresh round sized for `grid`.
    ///
    /// # Errors
    ///
    /// [`LedError::Setup`] if the grid has fewer than two rows.
    pub fn new<R: Rng + ?Sized>(grid: Grid, config: &CarConfig, rng: &mut R) -> Result<Self> {
        if grid.rows < 2 || grid.cols == 0 {
            return Err(LedError::Setup(format!(
                "the car game needs at least 2 rows, got a {}x{} grid",
                grid.rows, grid.cols
            )));
        }
        let mut car = Self {
            rows: grid.rows,
            cols: grid.cols,
            prob: config.prob,
            obstacles: vec![0; grid.len()],
            car_row: grid.rows - 2,
            car_col: 1.min(grid.cols - 1),
            cycle: 0,
            ticker: Ticker::new(config.pace.ticks_per_update),
            running: true,
            reported: false,
        };
        for row in (0..grid.rows.saturating_sub(CLEAR_ROWS)).step_by(2) {
            car.fill_row(row, rng);
        }
        Ok(car)
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub const fn score(&self) -> u32 {
        self.cycle / 2
    }

    #[must_use]
    pub const fn car(&self) -> (u16, u16) {
        (self.car_row, self.car_col)
    }

    #[must_use]
    pub const fn ticks_per_update(&self) -> u32 {
        self.ticker.ticks_per_update()
    }

    /// Ring row currently shown at display row `row`.
    fn ring_row(&self, row: u16) -> u16 {
        // Always below `rows`.
        let shift = u16::try_from(self.cycle % u32::from(self.rows)).unwrap_or(0);
        (self.rows + row - shift) % self.rows
    }

    fn ring_index(&self, ring_row: u16, col: u16) -> usize {
        usize::from(ring_row) * usize::from(self.cols) + usize::from(col)
    }

    /// Obstacle value shown at display `(row, col)`.
    #[must_use]
    pub fn shown(&self, row: u16, col: u16) -> u8 {
        self.obstacles[self.ring_index(self.ring_row(row), col)]
    }

    // ─── Obstacles ───────────────────────────────────────────────────────

    fn fill_row<R: Rng + ?Sized>(&mut self, ring_row: u16, rng: &mut R) {
        let start = self.ring_index(ring_row, 0);
        let lanes = &mut self.obstacles[start..start + usize::from(self.cols)];
        for lane in lanes.iter_mut() {
            *lane = if rng.random_range(0..100) < self.prob {
                OBSTACLE_STYLE
            } else {
                0
            };
        }
        if lanes.iter().all(|&v| v != 0) {
            let escape = rng.random_range(0..lanes.len());
            lanes[escape] = 0;
        }
    }

    fn clear_row(&mut self, ring_row: u16) {
        let start = self.ring_index(ring_row, 0);
        self.obstacles[start..start + usize::from(self.cols)].fill(0);
    }

    // ─── Round ───────────────────────────────────────────────────────────

    /// Put the obstacles and the car on the diodes.
    ///
    /// # Errors
    ///
    /// Only if the session grid is smaller than the board.
    pub fn paint<S: Surface>(&self, session: &mut Session<S>) -> Result<()> {
        for row in 0..self.rows {
            for col in 0..self.cols {
                session.set_diode(i32::from(row), i32::from(col), self.shown(row, col))?;
            }
        }
        session.set_diode(i32::from(self.car_row), i32::from(self.car_col), CAR_STYLE)
    }

    /// Steer. Returns how the round ends, if this command ends it.
    pub fn command(&mut self, command: Command) -> Option<RoundEnd> {
        match command {
            Command::Quit => return Some(RoundEnd::Quit),
            Command::Restart => return Some(RoundEnd::Restart),
            Command::Left if self.running => self.car_col = self.car_col.saturating_sub(1),
            Command::Right if self.running => self.car_col = (self.car_col + 1).min(self.cols - 1),
            _ => {}
        }
        None
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

    /// Turn the ring by one row.
    ///
    /// # Errors
    ///
    /// Propagates session failures.
    pub fn update<S: Surface, R: Rng + ?Sized>(&mut self, session: &mut Session<S>, rng: &mut R) -> Result<()> {
        let under_car = self.ring_index(self.ring_row(self.car_row), self.car_col);
        if self.obstacles[under_car] != 0 {
            log::debug!("crash at {:?} after {} cycles", self.car(), self.cycle);
            session.set_diode_attrs(i32::from(self.car_row), i32::from(self.car_col), Attr::INVERSE)?;
            session.render()?;
            self.running = false;
        }

        let outgoing = self.ring_row(self.rows - 1);
        self.clear_row(outgoing);
        if self.cycle % 2 == 0 {
            self.fill_row(outgoing, rng);
            if self.cycle % SPEEDUP_EVERY == 0 {
                self.ticker.speed_up(SPEEDUP_STEP, MIN_TICKS_PER_UPDATE);
            }
        }
        self.cycle += 1;
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
        session.info(Level::Info, format_args!("---------------------------------"));
        session.info(Level::Info, format_args!("Arrows to move. Press 'Q' to exit"));
        loop {
            self.paint(session)?;
            if let Some(key) = session.read_key(Some(Duration::ZERO))? {
                if let Some(end) = Command::from_key(key).and_then(|c| self.command(c)) {
                    return Ok(end);
                }
                self.paint(session)?;
            }
            session.render()?;
            nap(tick);
            self.tick(session, rng)?;
        }
    }
}

/// Play rounds of the car game on `session` until the player quits.
///
/// # Errors
///
/// Propagates session failures.
pub fn play<S: Surface, R: Rng + ?Sized>(session: &mut Session<S>, config: &CarConfig, rng: &mut R) -> Result<()> {
    session.register_style(CAR_STYLE, Style::new(AnsiColor::Blue, AnsiColor::Black));
    loop {
        let mut car = Car::new(session.grid(), config, rng)?;
        match car.run(session, config.pace.tick, rng)? {
            RoundEnd::Quit => return Ok(()),
            RoundEnd::Restart => {
                log::debug!("restarting the car game");
                session.reset_diodes();
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
