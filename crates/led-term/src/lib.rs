// SPDX-License-Identifier: MIT
//
// led-term: the terminal surface behind ledboard.
//
// Everything the LED core needs from a character terminal lives here:
// cells with attributes and 16-color styling, a frame buffer to paint
// into, stateful ANSI output with differential frames, raw-mode terminal
// control with guaranteed restore, a background stdin reader, a key
// parser, and a shared `Screen` carved into windows (LED canvases) and
// panes (scrolling text panels).
//
// No TUI framework underneath. Escape sequences are written by hand and
// the terminal is driven through termios, the same way an ncurses
// program would drive it, minus ncurses.

pub mod ansi;
pub mod buffer;
pub mod cell;
pub mod color;
pub mod diff;
pub mod input;
pub mod output;
pub mod reader;
pub mod screen;
pub mod terminal;
