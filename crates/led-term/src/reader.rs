// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Background stdin reader.
//
// A dedicated thread reads stdin and sends byte chunks down a channel. The
// game loop then waits on the channel with `recv_timeout`, which is how a
// tick-based game gets a key-or-timeout read without a non-blocking tty.
//
// The thread polls stdin with a short timeout and checks a stop flag
// between polls, so dropping the reader never leaves it stuck in `read()`.

#[cfg(unix)]
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

/// Bytes per read. A keypress is 1–6 bytes.
const READ_BUF_SIZE: usize = 1024;

/// How often the thread checks the stop flag.
const POLL_TIMEOUT_MS: i32 = 50;

/// Background stdin reader thread, stopped on drop.
pub struct StdinReader {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl StdinReader {
    /// Spawn the reader thread.
    ///
    /// Every received `Vec<u8>` is a non-empty chunk. The channel closes
    /// when the reader stops or stdin reaches EOF.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS cannot spawn the thread.
    pub fn spawn() -> io::Result<(Self, Receiver<Vec<u8>>)> {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("stdin-reader".into())
            .spawn(move || read_loop(&tx, &stop_flag))?;

        Ok((
            Self {
                handle: Some(handle),
                stop,
            },
            rx,
        ))
    }

    /// Signal the thread and wait for it. Idempotent.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StdinReader {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(unix)]
fn read_loop(tx: &mpsc::Sender<Vec<u8>>, stop: &AtomicBool) {
    use std::os::unix::io::AsRawFd;

    let stdin_fd = io::stdin().as_raw_fd();
    let mut buf = [0u8; READ_BUF_SIZE];

    while !stop.load(Ordering::Relaxed) {
        let ready = unsafe {
            let mut pfd = libc::pollfd {
                fd: stdin_fd,
                events: libc::POLLIN,
                revents: 0,
            };
            libc::poll(&raw mut pfd, 1, POLL_TIMEOUT_MS)
        };
        if ready <= 0 {
            continue;
        }

        let n = unsafe { libc::read(stdin_fd, buf.as_mut_ptr().cast(), buf.len()) };
        if n <= 0 {
            break;
        }

        #[allow(clippy::cast_sign_loss)]
        let chunk = buf[..n as usize].to_vec();
        if tx.send(chunk).is_err() {
            break;
        }
    }
}

#[cfg(not(unix))]
fn read_loop(tx: &mpsc::Sender<Vec<u8>>, stop: &AtomicBool) {
    use std::io::Read;

    let stdin = std::io::stdin();
    let mut buf = [0u8; READ_BUF_SIZE];

    while !stop.load(Ordering::Relaxed) {
        match stdin.lock().read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
