//! Main TUI application.

use std::io;
use std::time::Duration;

use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use tracing::{debug, info, warn};

use crate::config::InstanceConfig;
use crate::scheduler::{PollScheduler, SchedulerHandle};

use super::event::{Event, EventHandler, INPUT_POLL_TIMEOUT};
use super::input::handle_key;
use super::render::{content_rows, render};
use super::state::DisplayController;

/// Static description of the monitored instance, shown in the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    pub name: String,
    pub engine: &'static str,
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl InstanceInfo {
    pub fn new(name: impl Into<String>, engine: &'static str, instance: &InstanceConfig) -> Self {
        Self {
            name: name.into(),
            engine,
            host: instance.host.clone(),
            port: instance.port(),
            database: instance.database.clone(),
        }
    }

    /// `host:port`, with `/database` when filtered.
    pub fn endpoint(&self) -> String {
        if self.database.is_empty() {
            format!("{}:{}", self.host, self.port)
        } else {
            format!("{}:{}/{}", self.host, self.port, self.database)
        }
    }
}

/// What the loop does after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    /// Refresh interval changed; re-arm the poller.
    Reschedule(Duration),
    Exit,
}

/// Main TUI application.
pub struct App {
    info: InstanceInfo,
    view: DisplayController,
    /// Rows available to process and table data.
    content_rows: usize,
}

impl App {
    pub fn new(info: InstanceInfo, refresh_interval: Duration) -> Self {
        Self {
            info,
            view: DisplayController::new(refresh_interval),
            content_rows: 0,
        }
    }

    /// Runs the TUI until the user quits or an interrupt arrives.
    ///
    /// The scheduler is started here and stopped before the terminal is
    /// restored.
    pub fn run(mut self, scheduler: PollScheduler) -> io::Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal, scheduler);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        scheduler: PollScheduler,
    ) -> io::Result<()> {
        let mut events = EventHandler::new();
        events.spawn_input(INPUT_POLL_TIMEOUT)?;

        let interrupt = events.sender();
        if let Err(e) = ctrlc::set_handler(move || {
            let _ = interrupt.send(Event::Quit);
        }) {
            warn!(error = %e, "failed to install interrupt handler");
        }

        self.content_rows = content_rows(terminal.size()?.height);
        self.view.resize(self.content_rows);

        let poller = scheduler.spawn(events.sender())?;
        info!(instance = %self.info.name, "dashboard started");

        let result = self.drive(terminal, &events, &poller);

        poller.stop();
        events.stop();
        info!("dashboard stopped");
        result
    }

    fn drive<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        events: &EventHandler,
        poller: &SchedulerHandle,
    ) -> io::Result<()> {
        loop {
            terminal.draw(|frame| render(frame, &self.view, &self.info))?;

            let Ok(event) = events.next() else {
                return Ok(());
            };
            match self.handle_event(event) {
                Step::Continue => {}
                Step::Reschedule(interval) => poller.set_interval(interval),
                Step::Exit => return Ok(()),
            }
        }
    }

    fn handle_event(&mut self, event: Event) -> Step {
        match event {
            Event::Key(key) => {
                let Some(command) = handle_key(&self.view, key) else {
                    return Step::Continue;
                };
                let before = self.view.refresh_interval();
                if !self.view.handle_command(command) {
                    return Step::Exit;
                }
                let after = self.view.refresh_interval();
                if after != before {
                    debug!(interval_ms = after.as_millis() as u64, "refresh interval changed");
                    Step::Reschedule(after)
                } else {
                    Step::Continue
                }
            }
            Event::Resize(_, height) => {
                self.content_rows = content_rows(height);
                self.view.resize(self.content_rows);
                Step::Continue
            }
            Event::Snapshot { tick, snapshot } => {
                debug!(tick, "snapshot applied");
                self.view.apply(snapshot, self.content_rows);
                Step::Continue
            }
            Event::Quit => Step::Exit,
        }
    }
}
