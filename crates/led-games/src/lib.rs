// SPDX-License-Identifier: MIT
//
// led-games: programs that drive an LED matrix session.
//
// Each game is a small state machine over a `Session`: keys turn into
// commands, a tick counter paces the updates, and the board state is
// pushed into the diodes before every render. Randomness comes from an
// injected RNG so a seed reproduces a whole run.

pub mod car;
pub mod demo;
pub mod program;
pub mod snake;

pub use car::{CAR_GRID, Car, CarConfig};
pub use program::{Command, Pace, RoundEnd, Ticker};
pub use snake::{Direction, Snake, SnakeConfig};
