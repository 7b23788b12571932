//! View state: sort order, refresh cadence and the visible-row budget.
//!
//! The controller never reorders the snapshot it holds. Sorting produces an
//! index view over `snapshot.processes`, truncated to the view budget.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crate::config::MIN_REFRESH_INTERVAL;
use crate::model::{ProcessInfo, StatsSnapshot, TableInfo};

/// Refresh interval change per `+`/`-` press.
pub const REFRESH_STEP: Duration = Duration::from_millis(500);

/// Share of display rows given to the process list.
const PROCESS_ROWS_SHARE: f64 = 0.6;

/// Process list sort column. `CycleSort` walks these in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    User,
    Host,
    Database,
    Elapsed,
    State,
}

impl SortField {
    pub const ALL: [SortField; 6] = [
        SortField::Id,
        SortField::User,
        SortField::Host,
        SortField::Database,
        SortField::Elapsed,
        SortField::State,
    ];

    pub fn next(self) -> Self {
        match self {
            SortField::Id => SortField::User,
            SortField::User => SortField::Host,
            SortField::Host => SortField::Database,
            SortField::Database => SortField::Elapsed,
            SortField::Elapsed => SortField::State,
            SortField::State => SortField::Id,
        }
    }

    /// Column header label.
    pub fn label(self) -> &'static str {
        match self {
            SortField::Id => "ID",
            SortField::User => "USER",
            SortField::Host => "HOST",
            SortField::Database => "DB",
            SortField::Elapsed => "TIME",
            SortField::State => "STATE",
        }
    }

    /// Ascending comparison on this field only.
    fn compare(self, a: &ProcessInfo, b: &ProcessInfo) -> Ordering {
        match self {
            SortField::Id => a.id.cmp(&b.id),
            SortField::User => a.user.cmp(&b.user),
            SortField::Host => a.host.cmp(&b.host),
            SortField::Database => a.database.cmp(&b.database),
            SortField::Elapsed => a.elapsed_secs.cmp(&b.elapsed_secs),
            SortField::State => a.state.cmp(&b.state),
        }
    }
}

/// Sort field plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub field: SortField,
    pub descending: bool,
}

impl Default for SortState {
    /// Longest-running sessions first.
    fn default() -> Self {
        Self {
            field: SortField::Elapsed,
            descending: true,
        }
    }
}

impl SortState {
    /// Stable order: equal keys keep snapshot order in both directions.
    pub fn compare(&self, a: &ProcessInfo, b: &ProcessInfo) -> Ordering {
        let ord = self.field.compare(a, b);
        if self.descending { ord.reverse() } else { ord }
    }

    /// Header indicator, e.g. `TIME▼`.
    pub fn indicator(&self) -> String {
        format!(
            "{}{}",
            self.field.label(),
            if self.descending { "▼" } else { "▲" }
        )
    }
}

/// How many process rows the display can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewBudget(pub usize);

impl ViewBudget {
    /// 60% of the available rows, rounded down, at least 1 when any row
    /// is available.
    pub fn from_rows(available_rows: usize) -> Self {
        if available_rows == 0 {
            return ViewBudget(0);
        }
        let rows = (available_rows as f64 * PROCESS_ROWS_SHARE).floor() as usize;
        ViewBudget(rows.max(1))
    }

    pub fn rows(self) -> usize {
        self.0
    }
}

/// User commands the controller understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    CycleSort,
    ReverseSort,
    /// Shorter refresh interval.
    SpeedUp,
    /// Longer refresh interval.
    SlowDown,
    ToggleHelp,
}

/// Interactive view state fed by snapshots and commands.
#[derive(Debug, Clone)]
pub struct DisplayController {
    sort: SortState,
    refresh_interval: Duration,
    snapshot: Option<Arc<StatsSnapshot>>,
    available_rows: usize,
    budget: ViewBudget,
    /// Indices into `snapshot.processes`, sorted and truncated.
    visible: Vec<usize>,
    show_help: bool,
}

impl DisplayController {
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            sort: SortState::default(),
            refresh_interval: refresh_interval.max(MIN_REFRESH_INTERVAL),
            snapshot: None,
            available_rows: 0,
            budget: ViewBudget::default(),
            visible: Vec::new(),
            show_help: false,
        }
    }

    /// Replaces the snapshot and recomputes the visible rows.
    pub fn apply(&mut self, snapshot: Arc<StatsSnapshot>, available_rows: usize) {
        self.snapshot = Some(snapshot);
        self.available_rows = available_rows;
        self.refresh_view();
    }

    /// Recomputes the view for a new display height.
    pub fn resize(&mut self, available_rows: usize) {
        self.available_rows = available_rows;
        self.refresh_view();
    }

    /// Applies a command. Returns false when the app should exit.
    pub fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Quit => return false,
            Command::CycleSort => self.sort.field = self.sort.field.next(),
            Command::ReverseSort => self.sort.descending = !self.sort.descending,
            Command::SpeedUp => {
                self.refresh_interval = self
                    .refresh_interval
                    .saturating_sub(REFRESH_STEP)
                    .max(MIN_REFRESH_INTERVAL);
            }
            Command::SlowDown => {
                self.refresh_interval = self.refresh_interval.saturating_add(REFRESH_STEP);
            }
            Command::ToggleHelp => self.show_help = !self.show_help,
        }
        self.refresh_view();
        true
    }

    fn refresh_view(&mut self) {
        self.budget = ViewBudget::from_rows(self.available_rows);
        let Some(snapshot) = self.snapshot.clone() else {
            self.visible.clear();
            return;
        };
        let processes = &snapshot.processes;
        let mut order: Vec<usize> = (0..processes.len()).collect();
        // sort_by is stable: ties keep snapshot order.
        order.sort_by(|&a, &b| self.sort.compare(&processes[a], &processes[b]));
        order.truncate(self.budget.rows());
        self.visible = order;
    }

    /// Sorted, budget-limited process rows.
    pub fn visible_processes(&self) -> Vec<&ProcessInfo> {
        match &self.snapshot {
            Some(snapshot) => self
                .visible
                .iter()
                .map(|&idx| &snapshot.processes[idx])
                .collect(),
            None => Vec::new(),
        }
    }

    /// Tables of the last applied snapshot, in snapshot order.
    pub fn tables(&self) -> &[TableInfo] {
        self.snapshot
            .as_deref()
            .map(|s| s.tables.as_slice())
            .unwrap_or(&[])
    }

    pub fn snapshot(&self) -> Option<&StatsSnapshot> {
        self.snapshot.as_deref()
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    pub fn view_budget(&self) -> ViewBudget {
        self.budget
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }
}
