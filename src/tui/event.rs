//! Event intake for the TUI.
//!
//! Terminal input, poll results and interrupts all arrive on one channel so
//! the app loop is the only place view state changes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use tracing::debug;

use crate::model::StatsSnapshot;

/// How often the input thread wakes up to check the stop flag.
pub const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Application events.
#[derive(Debug)]
pub enum Event {
    /// Keyboard input.
    Key(KeyEvent),
    /// Terminal resize (width, height).
    Resize(u16, u16),
    /// Successful poll.
    Snapshot {
        tick: u64,
        snapshot: Arc<StatsSnapshot>,
    },
    /// External interrupt (SIGINT/SIGTERM).
    Quit,
}

/// Owns the intake channel and the terminal input thread.
pub struct EventHandler {
    rx: Receiver<Event>,
    tx: Sender<Event>,
    stop: Arc<AtomicBool>,
    input: Option<JoinHandle<()>>,
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler {
    /// Creates the intake without any producers.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            rx,
            tx,
            stop: Arc::new(AtomicBool::new(false)),
            input: None,
        }
    }

    /// A producer handle for the intake.
    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    /// Starts forwarding crossterm key and resize events.
    pub fn spawn_input(&mut self, poll_timeout: Duration) -> std::io::Result<()> {
        let tx = self.tx.clone();
        let stop = self.stop.clone();
        let handle = thread::Builder::new()
            .name("input".to_string())
            .spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    if !event::poll(poll_timeout).unwrap_or(false) {
                        continue;
                    }
                    let event = match event::read() {
                        Ok(CrosstermEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                            Event::Key(key)
                        }
                        Ok(CrosstermEvent::Resize(w, h)) => Event::Resize(w, h),
                        Ok(_) => continue,
                        Err(e) => {
                            debug!(error = %e, "failed to read terminal event");
                            continue;
                        }
                    };
                    if tx.send(event).is_err() {
                        break;
                    }
                }
            })?;
        self.input = Some(handle);
        Ok(())
    }

    /// Receives the next event, blocking until one is available.
    pub fn next(&self) -> Result<Event, RecvError> {
        self.rx.recv()
    }

    /// Receives the next event or times out.
    pub fn next_timeout(&self, timeout: Duration) -> Option<Event> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Stops the input thread; it exits at its next poll timeout.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.input.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.stop();
    }
}
