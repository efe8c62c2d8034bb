// SPDX-License-Identifier: MIT
//
// Small demos: one lit diode, cycling colours, and a diode walked around
// with the arrow keys.
//
// Demos wait for keys with a blocking read. When input runs out (a
// scripted surface, or stdin closing) they end as if told to.

use std::io;

use led_core::{LedError, Result, Session, Style, Surface};
use led_term::color::AnsiColor;
use led_term::input::{KeyCode, KeyEvent};
use log::Level;

/// Light diode (2, 0) and wait for any key.
///
/// # Errors
///
/// Propagates session failures.
pub fn led<S: Surface>(session: &mut Session<S>) -> Result<()> {
    session.set_diode(2, 0, 1)?;
    session.render()?;
    next_key(session)?;
    Ok(())
}

/// Block for the next key. Closed input reads as no key.
fn next_key<S: Surface>(session: &mut Session<S>) -> Result<Option<KeyEvent>> {
    match session.read_key(None) {
        Err(LedError::Render(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
            log::debug!("input closed, ending the demo");
            Ok(None)
        }
        other => other,
    }
}

/// Cycle three colours through the diodes, one step per key press, until
/// the space bar.
///
/// # Errors
///
/// Propagates session failures.
pub fn xmas<S: Surface>(session: &mut Session<S>) -> Result<()> {
    session.register_style(2, Style::new(AnsiColor::Green, AnsiColor::Black));
    session.register_style(3, Style::new(AnsiColor::Blue, AnsiColor::Black));
    let grid = session.grid();
    let count = grid.len();

    for round in 0usize.. {
        for i in 0..count {
            let row = i / usize::from(grid.cols);
            let col = i % usize::from(grid.cols);
            // Both below a u16 grid extent; value in 1..=3.
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            session.set_diode(row as i32, col as i32, ((round + i) % 3 + 1) as u8)?;
        }
        session.render()?;
        session.info(Level::Info, format_args!("Any key to continue. PRESS SPACE BAR TO EXIT"));
        match next_key(session)? {
            Some(KeyEvent {
                code: KeyCode::Char(' '),
                ..
            })
            | None => break,
            Some(key) if key.is_interrupt() => break,
            Some(_) => {}
        }
    }
    Ok(())
}

/// Move one lit diode with the arrows, clamped to the grid, until Enter.
///
/// # Errors
///
/// Propagates session failures.
pub fn walk<S: Surface>(session: &mut Session<S>) -> Result<()> {
    let grid = session.grid();
    let last_row = i32::from(grid.rows) - 1;
    let last_col = i32::from(grid.cols) - 1;
    let (mut row, mut col) = (2.min(last_row), 3.min(last_col));

    loop {
        session.set_diode(row, col, 1)?;
        session.render()?;
        session.info(Level::Info, format_args!("Arrows to move. PRESS ENTER TO EXIT"));
        let Some(key) = next_key(session)? else {
            break;
        };
        if key.is_interrupt() {
            break;
        }
        let (dr, dc) = match key.code {
            KeyCode::Enter => break,
            KeyCode::Up => (-1, 0),
            KeyCode::Down => (1, 0),
            KeyCode::Left => (0, -1),
            KeyCode::Right => (0, 1),
            _ => continue,
        };
        session.set_diode(row, col, 0)?;
        row = (row + dr).clamp(0, last_row);
        col = (col + dc).clamp(0, last_col);
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use led_core::{MemorySink, NullSink, RecordingSurface, SessionConfig};
    use pretty_assertions::assert_eq;

    fn session(rows: u16, cols: u16) -> Session<RecordingSurface> {
        Session::new(
            RecordingSurface::new(rows * 5, cols * 10),
            &SessionConfig::with_grid(rows, cols),
            Box::new(NullSink),
        )
        .unwrap()
    }

    fn keys(s: &mut Session<RecordingSurface>, codes: impl IntoIterator<Item = KeyCode>) {
        s.surface_mut().push_keys(codes.into_iter().map(KeyEvent::plain));
    }

    fn lit(s: &Session<RecordingSurface>) -> Vec<(i32, i32)> {
        let grid = s.grid();
        (0..i32::from(grid.rows))
            .flat_map(|r| (0..i32::from(grid.cols)).map(move |c| (r, c)))
            .filter(|&(r, c)| s.diode(r, c).unwrap().is_on())
            .collect()
    }

    #[test]
    fn led_lights_one_diode_and_waits() {
        let mut s = session(3, 5);
        keys(&mut s, [KeyCode::Char('x')]);
        led(&mut s).unwrap();
        assert_eq!(lit(&s), vec![(2, 0)]);
        assert_eq!(s.surface().frames().len(), 1);
    }

    #[test]
    fn xmas_cycles_until_space() {
        let mut s = session(3, 5);
        let sink = MemorySink::new();
        s.set_info_sink(Box::new(sink.clone()));
        keys(&mut s, [KeyCode::Char('a'), KeyCode::Char(' '), KeyCode::Char('b')]);
        xmas(&mut s).unwrap();
        // Second round: diode i shows (1 + i) % 3 + 1.
        assert_eq!(s.diode(0, 0).unwrap().value, 2);
        assert_eq!(s.diode(0, 1).unwrap().value, 3);
        assert_eq!(s.diode(2, 4).unwrap().value, 1);
        assert_eq!(sink.texts().len(), 2);
        assert_eq!(s.surface_mut().poll_key(None).unwrap(), Some(KeyEvent::plain(KeyCode::Char('b'))));
    }

    #[test]
    fn xmas_ends_when_input_runs_out() {
        let mut s = session(3, 5);
        xmas(&mut s).unwrap();
        assert_eq!(s.diode(0, 0).unwrap().value, 1);
        assert_eq!(s.diode(0, 2).unwrap().value, 3);
    }

    #[test]
    fn walk_moves_and_clamps() {
        let mut s = session(6, 8);
        keys(&mut s, [KeyCode::Right, KeyCode::Right, KeyCode::Right, KeyCode::Right, KeyCode::Right]);
        keys(&mut s, [KeyCode::Up, KeyCode::Up, KeyCode::Up, KeyCode::Enter]);
        walk(&mut s).unwrap();
        assert_eq!(lit(&s), vec![(0, 7)]);
    }

    #[test]
    fn closed_input_ends_every_demo() {
        let mut s = session(3, 5);
        s.surface_mut().close_input();
        led(&mut s).unwrap();
        xmas(&mut s).unwrap();
        assert_eq!(s.diode(0, 0).unwrap().value, 1);

        let mut s = session(6, 8);
        keys(&mut s, [KeyCode::Left]);
        s.surface_mut().close_input();
        walk(&mut s).unwrap();
        assert_eq!(lit(&s), vec![(2, 2)]);
    }

    #[test]
    fn walk_starts_inside_small_grids() {
        let mut s = session(2, 2);
        keys(&mut s, [KeyCode::Enter]);
        walk(&mut s).unwrap();
        assert_eq!(lit(&s), vec![(1, 1)]);
    }
}
