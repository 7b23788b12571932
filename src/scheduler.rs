//! Timed statistics acquisition.
//!
//! The scheduler owns the database session and runs on its own thread. It
//! polls once immediately, then once per refresh interval, and pushes every
//! successful snapshot into the TUI intake. A failed tick is logged and
//! skipped; the view keeps the previous snapshot.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::adapter::{AdapterError, Connection, EngineAdapter};
use crate::config::MIN_REFRESH_INTERVAL;
use crate::model::StatsSnapshot;
use crate::tui::Event;

/// What the poll thread is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for the next deadline.
    Idle,
    /// A `get_stats` call is in flight.
    Polling,
}

/// Messages from the UI to the poll thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// New refresh interval, applied when the next wait is armed.
    SetInterval(Duration),
    /// Finish the current tick and exit.
    Stop,
}

/// Poll loop for one instance.
pub struct PollScheduler {
    adapter: Arc<dyn EngineAdapter>,
    session: Connection,
    database: String,
    interval: Duration,
    state: SchedulerState,
    ticks: u64,
}

impl PollScheduler {
    pub fn new(
        adapter: Arc<dyn EngineAdapter>,
        session: Connection,
        database: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            adapter,
            session,
            database: database.into(),
            interval: interval.max(MIN_REFRESH_INTERVAL),
            state: SchedulerState::Idle,
            ticks: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of ticks run so far, successful or not.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Runs one collection. No retry: a failure only costs this tick.
    pub fn tick(&mut self) -> Result<StatsSnapshot, AdapterError> {
        self.state = SchedulerState::Polling;
        self.ticks += 1;
        let started = Instant::now();
        let result = self
            .adapter
            .get_stats(self.session.as_mut(), &self.database);
        self.state = SchedulerState::Idle;

        match &result {
            Ok(snapshot) => debug!(
                tick = self.ticks,
                processes = snapshot.processes.len(),
                tables = snapshot.tables.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "stats collected"
            ),
            Err(e) => warn!(
                tick = self.ticks,
                engine = self.adapter.engine(),
                error = %e,
                "stats collection failed"
            ),
        }
        result
    }

    /// Polls until stopped.
    ///
    /// Exits on `Control::Stop`, when the control channel disconnects, or
    /// when the sink is gone. The session is released on exit.
    pub fn run(mut self, control: Receiver<Control>, sink: Sender<Event>) {
        info!(
            engine = self.adapter.engine(),
            database = %self.database,
            interval_ms = self.interval.as_millis() as u64,
            "poll loop started"
        );

        loop {
            if let Ok(snapshot) = self.tick() {
                let event = Event::Snapshot {
                    tick: self.ticks,
                    snapshot: Arc::new(snapshot),
                };
                if sink.send(event).is_err() {
                    debug!("event intake closed");
                    break;
                }
            }

            if !self.wait(&control) {
                break;
            }
        }

        info!(ticks = self.ticks, "poll loop stopped, releasing connection");
    }

    /// Waits out one interval. Returns false when the loop should exit.
    ///
    /// Control messages queued during the last tick are applied before the
    /// deadline is armed. Interval changes received while waiting are stored
    /// for the next wait; the current deadline stays as armed.
    fn wait(&mut self, control: &Receiver<Control>) -> bool {
        loop {
            match control.try_recv() {
                Ok(Control::SetInterval(interval)) => self.set_interval(interval),
                Ok(Control::Stop) | Err(TryRecvError::Disconnected) => return false,
                Err(TryRecvError::Empty) => break,
            }
        }

        let deadline = Instant::now() + self.interval;
        loop {
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            match control.recv_timeout(deadline - now) {
                Ok(Control::SetInterval(interval)) => self.set_interval(interval),
                Ok(Control::Stop) | Err(RecvTimeoutError::Disconnected) => return false,
                Err(RecvTimeoutError::Timeout) => return true,
            }
        }
    }

    fn set_interval(&mut self, interval: Duration) {
        self.interval = interval.max(MIN_REFRESH_INTERVAL);
        debug!(interval_ms = self.interval.as_millis() as u64, "refresh interval changed");
    }

    /// Moves the scheduler onto its own thread.
    pub fn spawn(self, sink: Sender<Event>) -> std::io::Result<SchedulerHandle> {
        let (control_tx, control_rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("poller".to_string())
            .spawn(move || self.run(control_rx, sink))?;
        Ok(SchedulerHandle {
            control: control_tx,
            thread: Some(thread),
        })
    }
}

/// Control side of a spawned scheduler.
pub struct SchedulerHandle {
    control: Sender<Control>,
    thread: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    pub fn set_interval(&self, interval: Duration) {
        let _ = self.control.send(Control::SetInterval(interval));
    }

    /// Stops the poll thread and waits for the in-flight tick to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.control.send(Control::Stop);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{MockSession, PostgresAdapter, QueryPurpose, Row};
    use crate::config::{Config, InstanceConfig};
    use crate::adapter::AdapterRegistry;
    use crate::row;
    use crate::tui::DisplayController;

    fn table_rows(name: &str) -> Vec<Row> {
        vec![row![name, 10i64, 8192i64, 0i64]]
    }

    fn scripted() -> MockSession {
        MockSession::new()
            .respond(QueryPurpose::ConnectionCounts, vec![row![3i64, 5i64]])
            .respond(QueryPurpose::Uptime, vec![row![120i64]])
            .respond(QueryPurpose::ProcessList, vec![])
            .respond(QueryPurpose::TableSizes, table_rows("public.orders"))
    }

    fn scheduler(session: MockSession, interval: Duration) -> PollScheduler {
        PollScheduler::new(Arc::new(PostgresAdapter), Box::new(session), "", interval)
    }

    #[test]
    fn test_tick_returns_to_idle() {
        let mut poller = scheduler(scripted(), Duration::from_secs(1));
        assert_eq!(poller.state(), SchedulerState::Idle);
        let snap = poller.tick().unwrap();
        assert_eq!(snap.total_connections, 5);
        assert_eq!(poller.state(), SchedulerState::Idle);
        assert_eq!(poller.ticks(), 1);
    }

    #[test]
    fn test_failed_tick_returns_error_and_counts() {
        let mut poller = scheduler(MockSession::new(), Duration::from_secs(1));
        assert!(poller.tick().is_err());
        assert_eq!(poller.state(), SchedulerState::Idle);
        assert_eq!(poller.ticks(), 1);
    }

    #[test]
    fn test_interval_floor() {
        let poller = scheduler(scripted(), Duration::from_millis(100));
        assert_eq!(poller.interval(), MIN_REFRESH_INTERVAL);
    }

    #[test]
    fn test_first_poll_is_immediate() {
        let (tx, rx) = mpsc::channel();
        let handle = scheduler(scripted(), Duration::from_secs(30))
            .spawn(tx)
            .unwrap();
        match rx.recv_timeout(Duration::from_secs(2)) {
            Ok(Event::Snapshot { tick, snapshot }) => {
                assert_eq!(tick, 1);
                assert_eq!(snapshot.active_connections, 3);
            }
            other => panic!("expected snapshot, got {other:?}"),
        }
        handle.stop();
        // Sender dropped with the thread.
        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(1)),
            Err(RecvTimeoutError::Disconnected)
        ));
    }

    #[test]
    fn test_failed_tick_sends_nothing() {
        let session = scripted();
        session.fail_next(QueryPurpose::Uptime, "timeout");
        let (tx, rx) = mpsc::channel();
        let handle = scheduler(session, MIN_REFRESH_INTERVAL).spawn(tx).unwrap();
        match rx.recv_timeout(Duration::from_secs(3)) {
            Ok(Event::Snapshot { tick, .. }) => assert_eq!(tick, 2),
            other => panic!("expected snapshot, got {other:?}"),
        }
        handle.stop();
    }

    #[test]
    fn test_interval_change_waits_for_rearm() {
        let (tx, rx) = mpsc::channel();
        let handle = scheduler(scripted(), Duration::from_secs(30))
            .spawn(tx)
            .unwrap();
        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(2)),
            Ok(Event::Snapshot { tick: 1, .. })
        ));
        // Let the poller arm its 30s wait first.
        thread::sleep(Duration::from_millis(200));
        handle.set_interval(MIN_REFRESH_INTERVAL);
        // The 30s wait already armed is not shortened.
        assert!(matches!(
            rx.recv_timeout(Duration::from_millis(1200)),
            Err(RecvTimeoutError::Timeout)
        ));
        handle.stop();
    }

    /// Adapter whose collection takes a while, so control messages can
    /// arrive mid-tick.
    struct SlowAdapter {
        delay: Duration,
    }

    impl EngineAdapter for SlowAdapter {
        fn engine(&self) -> &'static str {
            "slow"
        }

        fn connect(&self, _instance: &InstanceConfig) -> Result<Connection, AdapterError> {
            Err(AdapterError::ConnectionError("not connectable".to_string()))
        }

        fn get_stats(
            &self,
            session: &mut dyn crate::adapter::Session,
            database: &str,
        ) -> Result<StatsSnapshot, AdapterError> {
            thread::sleep(self.delay);
            PostgresAdapter.get_stats(session, database)
        }
    }

    #[test]
    fn test_interval_change_during_tick_applies_at_next_rearm() {
        let adapter = Arc::new(SlowAdapter {
            delay: Duration::from_millis(600),
        });
        let (tx, rx) = mpsc::channel();
        let handle = PollScheduler::new(adapter, Box::new(scripted()), "", Duration::from_secs(30))
            .spawn(tx)
            .unwrap();

        // Lands while tick 1 is still collecting.
        thread::sleep(Duration::from_millis(200));
        handle.set_interval(MIN_REFRESH_INTERVAL);

        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(2)),
            Ok(Event::Snapshot { tick: 1, .. })
        ));
        // 500ms wait + 600ms collection, well short of the old 30s.
        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(3)),
            Ok(Event::Snapshot { tick: 2, .. })
        ));
        handle.stop();
    }

    #[test]
    fn test_stop_during_tick_exits_before_waiting() {
        let adapter = Arc::new(SlowAdapter {
            delay: Duration::from_millis(300),
        });
        let (tx, rx) = mpsc::channel();
        let handle = PollScheduler::new(adapter, Box::new(scripted()), "", Duration::from_secs(30))
            .spawn(tx)
            .unwrap();
        thread::sleep(Duration::from_millis(100));
        let started = Instant::now();
        handle.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(matches!(rx.recv(), Ok(Event::Snapshot { tick: 1, .. })));
        assert!(rx.recv().is_err());
    }

    #[test]
    fn test_exits_when_sink_closes() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let handle = scheduler(scripted(), MIN_REFRESH_INTERVAL)
            .spawn(tx)
            .unwrap();
        // Join must not hang: the first send fails and the loop exits.
        handle.stop();
    }

    #[test]
    fn test_prod_pg_end_to_end() {
        let config = Config::parse(
            "instances:\n  prod-pg:\n    type: postgres\n    host: db.example.com\n    username: monitor\n",
        )
        .unwrap();
        let instance: &InstanceConfig = &config.instances["prod-pg"];
        let registry = AdapterRegistry::with_builtin();
        let adapter = registry.lookup(&instance.engine).unwrap();

        let mut poller = PollScheduler::new(
            adapter,
            Box::new(scripted()),
            instance.database.clone(),
            instance.refresh_interval,
        );
        let snap = poller.tick().unwrap();
        assert_eq!(snap.active_connections, 3);
        assert_eq!(snap.total_connections, 5);
    }

    #[test]
    fn test_failed_table_query_keeps_previous_tables() {
        let handle = scripted();
        let mut poller = scheduler(handle.clone(), MIN_REFRESH_INTERVAL);
        let mut view = DisplayController::new(MIN_REFRESH_INTERVAL);

        view.apply(Arc::new(poller.tick().unwrap()), 20);
        assert_eq!(view.tables()[0].name, "public.orders");

        handle.set_rows(QueryPurpose::TableSizes, table_rows("public.users"));
        handle.fail_next(QueryPurpose::TableSizes, "canceling statement due to statement timeout");
        if let Ok(snapshot) = poller.tick() {
            view.apply(Arc::new(snapshot), 20);
        }
        assert_eq!(view.tables()[0].name, "public.orders");

        view.apply(Arc::new(poller.tick().unwrap()), 20);
        assert_eq!(view.tables()[0].name, "public.users");
    }
}
