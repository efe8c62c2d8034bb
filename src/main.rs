// SPDX-License-Identifier: MIT
//
// ledboard: LED matrix games and demos on a character terminal.
//
// The launcher wires the crates together:
//
//   led-term  → raw-mode terminal, key input, screen split into regions
//   led-core  → geometry, diode store, rasterizer, session
//   led-games → car, snake and the small demos
//
// Layout for the games:
//
//   ┌──────────────────────────────┐
//   │ LED board                    │  ← all rows but the last 5
//   ├──────────────────────────────┤
//   │ status pane                  │  ← 5 rows of game messages
//   └──────────────────────────────┘
//
// Demos and `--debug` runs swap the status pane for the 10-row debug pane
// that the session creates itself.

mod cli;

use std::env;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use led_core::{Grid, LedError, Session, SessionConfig, SurfaceRequest};
use led_games::{CAR_GRID, CarConfig, SnakeConfig, car, demo, snake};
use led_term::buffer::Rect;
use led_term::screen::{Pane, Screen, ScreenConfig, SharedScreen};
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;

use crate::cli::{CliError, Config, Program};

/// Rows under the board for game messages.
const STATUS_LINES: u16 = 5;
/// Widest board the snake and the demos use.
const MAX_COLS: u16 = 100;
const DEMO_GRID: Grid = Grid::new(3, 5);

#[derive(Debug, Error)]
enum AppError {
    #[error("cannot open the log file {path}: {source}")]
    Log { path: String, source: io::Error },
    #[error("terminal: {0}")]
    Terminal(#[source] io::Error),
    #[error(transparent)]
    Led(#[from] LedError),
}

fn main() {
    let config = match cli::parse(env::args().skip(1)) {
        Ok(config) => config,
        Err(CliError::Help) => {
            println!("{}", cli::USAGE);
            return;
        }
        Err(e) => {
            eprintln!("ledboard: {e}\n\n{}", cli::USAGE);
            process::exit(1);
        }
    };

    // The screen is gone by the time `run` returns, so the message lands on
    // the restored terminal.
    if let Err(e) = run(&config) {
        eprintln!("ledboard: {e}");
        process::exit(1);
    }
}

fn run(config: &Config) -> Result<(), AppError> {
    if let Some(path) = &config.log {
        init_logging(path)?;
    }

    let seed = config.seed.unwrap_or_else(clock_seed);
    log::info!("ledboard {:?}, seed {seed}", config.program);
    let mut rng = StdRng::seed_from_u64(seed);

    let screen = Screen::open(ScreenConfig::default()).map_err(AppError::Terminal)?;
    let session_config = session_config(config, &screen);
    let mut session = Session::init(&screen, &session_config)?;

    if config.program.is_game() && !config.debug {
        let region = session.region();
        let rect = Rect::new(region.x, region.y + region.height, region.width, STATUS_LINES);
        let pane = Pane::new(&screen, rect).map_err(|e| LedError::Setup(format!("cannot create the status pane: {e}")))?;
        session.set_info_sink(Box::new(pane));
    }
    if config.grid && !session.set_grid_overlay(true) {
        log::warn!("no room for grid lines on this board");
    }

    let played = match config.program {
        Program::Car => {
            let mut car_config = CarConfig::default();
            if let Some(prob) = config.prob {
                car_config.prob = prob;
            }
            car::play(&mut session, &car_config, &mut rng)
        }
        Program::Snake => snake::play(&mut session, &SnakeConfig::default(), &mut rng),
        Program::Led => demo::led(&mut session),
        Program::Xmas => demo::xmas(&mut session),
        Program::Walk => demo::walk(&mut session),
    };

    // Tear the session down even when the program failed, but report the
    // program's error first.
    let ended = session.end();
    played?;
    ended?;
    screen.borrow_mut().shutdown().map_err(AppError::Terminal)?;
    Ok(())
}

/// Grid, region and debug settings for the chosen program on `screen`.
fn session_config(config: &Config, screen: &SharedScreen) -> SessionConfig {
    let screen_cols = screen.borrow().size().cols;
    let narrow = i32::from(MAX_COLS.min(screen_cols));

    let (grid, cols, debug) = match config.program {
        Program::Car => (CAR_GRID, 0, config.debug),
        Program::Snake => (config.size.unwrap_or_default(), narrow, config.debug),
        Program::Led | Program::Xmas => (DEMO_GRID, narrow, true),
        Program::Walk => (config.size.unwrap_or_default(), narrow, true),
    };
    if config.size.is_some() && matches!(config.program, Program::Car | Program::Led | Program::Xmas) {
        log::warn!("--size is ignored by {:?}", config.program);
    }

    let rows = if config.program.is_game() && !debug {
        -i32::from(STATUS_LINES)
    } else {
        0
    };

    SessionConfig {
        grid,
        surface: SurfaceRequest {
            rows,
            cols,
            ..SurfaceRequest::full()
        },
        debug,
        ..SessionConfig::default()
    }
}

/// Send log output to `path`. The terminal belongs to the board.
fn init_logging(path: &Path) -> Result<(), AppError> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|source| AppError::Log {
            path: path.display().to_string(),
            source,
        })?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .format_timestamp_micros()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

// Nanoseconds wrap into 64 bits; any value is a usable seed.
#[allow(clippy::cast_possible_truncation)]
fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as u64)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
