// SPDX-License-Identifier: MIT
//
// Command-line parsing for the launcher.
//
//   ledboard <car|snake|led|xmas|walk> [--seed N] [--size ROWSxCOLS]
//            [--prob PERCENT] [--grid] [--debug] [--log FILE]

use std::path::PathBuf;

use led_core::Grid;
use thiserror::Error;

pub const USAGE: &str = "\
usage: ledboard <program> [options]

programs:
  car      dodge the obstacles
  snake    eat the targets, avoid the walls and yourself
  led      light one diode
  xmas     cycle colours through the grid
  walk     move a diode with the arrow keys

options:
  --seed N            seed the random number generator
  --size ROWSxCOLS    grid size (snake, walk)
  --prob PERCENT      obstacle probability for car (0-100)
  --grid              draw the grid lines between diodes
  --debug             show the debug panel and diode centres
  --log FILE          write log output to FILE
  -h, --help          show this help";

/// Which program to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Program {
    Car,
    Snake,
    Led,
    Xmas,
    Walk,
}

impl Program {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "car" => Some(Self::Car),
            "snake" => Some(Self::Snake),
            "led" => Some(Self::Led),
            "xmas" => Some(Self::Xmas),
            "walk" => Some(Self::Walk),
            _ => None,
        }
    }

    /// Games take input on a timer and report into a status pane.
    #[must_use]
    pub const fn is_game(self) -> bool {
        matches!(self, Self::Car | Self::Snake)
    }
}

/// Launcher settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub program: Program,
    pub seed: Option<u64>,
    pub size: Option<Grid>,
    pub prob: Option<u8>,
    pub grid: bool,
    pub debug: bool,
    pub log: Option<PathBuf>,
}

impl Config {
    const fn new(program: Program) -> Self {
        Self {
            program,
            seed: None,
            size: None,
            prob: None,
            grid: false,
            debug: false,
            log: None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("help requested")]
    Help,
    #[error("no program given")]
    MissingProgram,
    #[error("unknown program '{0}'")]
    UnknownProgram(String),
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    #[error("option '{0}' needs a value")]
    MissingValue(&'static str),
    #[error("invalid value '{value}' for '{flag}'")]
    InvalidValue { flag: &'static str, value: String },
}

/// Parse the arguments that follow the binary name.
///
/// # Errors
///
/// [`CliError::Help`] for `-h`/`--help`; any other variant describes why
/// the arguments were rejected.
pub fn parse<I>(args: I) -> Result<Config, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut program = None;
    let mut config = Config::new(Program::Car);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err(CliError::Help),
            "--grid" => config.grid = true,
            "--debug" => config.debug = true,
            "--seed" => {
                let value = value(&mut args, "--seed")?;
                config.seed = Some(value.parse().map_err(|_| invalid("--seed", value))?);
            }
            "--size" => {
                let value = value(&mut args, "--size")?;
                config.size = Some(parse_size(&value).ok_or_else(|| invalid("--size", value))?);
            }
            "--prob" => {
                let value = value(&mut args, "--prob")?;
                let prob = value.parse::<u8>().ok().filter(|p| *p <= 100);
                config.prob = Some(prob.ok_or_else(|| invalid("--prob", value))?);
            }
            "--log" => config.log = Some(PathBuf::from(value(&mut args, "--log")?)),
            flag if flag.starts_with('-') => return Err(CliError::UnknownOption(flag.to_owned())),
            _ if program.is_none() => {
                program = Some(Program::parse(&arg).ok_or(CliError::UnknownProgram(arg))?);
            }
            _ => return Err(CliError::UnknownOption(arg)),
        }
    }

    config.program = program.ok_or(CliError::MissingProgram)?;
    Ok(config)
}

fn value(args: &mut impl Iterator<Item = String>, flag: &'static str) -> Result<String, CliError> {
    args.next().ok_or(CliError::MissingValue(flag))
}

fn invalid(flag: &'static str, value: String) -> CliError {
    CliError::InvalidValue { flag, value }
}

/// `ROWSxCOLS`, both at least 1.
fn parse_size(text: &str) -> Option<Grid> {
    let (rows, cols) = text.split_once(['x', 'X'])?;
    let rows: u16 = rows.parse().ok()?;
    let cols: u16 = cols.parse().ok()?;
    (rows > 0 && cols > 0).then(|| Grid::new(rows, cols))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(line: &str) -> Result<Config, CliError> {
        parse(line.split_whitespace().map(String::from))
    }

    // ── Programs ──────────────────────────────────────────────────────────

    #[test]
    fn program_alone() {
        let config = args("snake").unwrap();
        assert_eq!(config, Config::new(Program::Snake));
    }

    #[test]
    fn every_program_name() {
        for (name, program) in [
            ("car", Program::Car),
            ("snake", Program::Snake),
            ("led", Program::Led),
            ("xmas", Program::Xmas),
            ("walk", Program::Walk),
        ] {
            assert_eq!(args(name).unwrap().program, program);
        }
    }

    #[test]
    fn games_and_demos() {
        assert!(Program::Car.is_game());
        assert!(Program::Snake.is_game());
        assert!(!Program::Walk.is_game());
    }

    #[test]
    fn missing_and_unknown_programs() {
        assert_eq!(args(""), Err(CliError::MissingProgram));
        assert_eq!(args("--grid"), Err(CliError::MissingProgram));
        assert_eq!(args("tetris"), Err(CliError::UnknownProgram("tetris".into())));
        assert_eq!(args("car snake"), Err(CliError::UnknownOption("snake".into())));
    }

    // ── Options ───────────────────────────────────────────────────────────

    #[test]
    fn all_options() {
        let config = args("--seed 42 walk --size 4x9 --prob 55 --grid --debug --log /tmp/led.log").unwrap();
        assert_eq!(
            config,
            Config {
                program: Program::Walk,
                seed: Some(42),
                size: Some(Grid::new(4, 9)),
                prob: Some(55),
                grid: true,
                debug: true,
                log: Some(PathBuf::from("/tmp/led.log")),
            }
        );
    }

    #[test]
    fn help_wins() {
        assert_eq!(args("car --help"), Err(CliError::Help));
        assert_eq!(args("-h"), Err(CliError::Help));
    }

    #[test]
    fn option_errors() {
        assert_eq!(args("car --seed"), Err(CliError::MissingValue("--seed")));
        assert_eq!(args("car --fast"), Err(CliError::UnknownOption("--fast".into())));
        assert_eq!(
            args("car --seed abc"),
            Err(CliError::InvalidValue {
                flag: "--seed",
                value: "abc".into()
            })
        );
        assert_eq!(
            args("car --prob 101"),
            Err(CliError::InvalidValue {
                flag: "--prob",
                value: "101".into()
            })
        );
    }

    #[test]
    fn sizes() {
        assert_eq!(parse_size("6x8"), Some(Grid::new(6, 8)));
        assert_eq!(parse_size("12X4"), Some(Grid::new(12, 4)));
        assert_eq!(parse_size("0x8"), None);
        assert_eq!(parse_size("6x"), None);
        assert_eq!(parse_size("6*8"), None);
    }

    #[test]
    fn error_messages() {
        assert_eq!(CliError::UnknownProgram("x".into()).to_string(), "unknown program 'x'");
        assert_eq!(CliError::MissingValue("--log").to_string(), "option '--log' needs a value");
    }
}
