//! Normalized statistics collected from a database instance.
//!
//! Every engine adapter translates its own introspection output into these
//! structures, so the display layer never sees engine-specific rows.

use std::time::Duration;

/// One live session/connection on the server.
///
/// Source: `pg_stat_activity`, `SHOW PROCESSLIST` or `v$session`,
/// depending on the engine.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ProcessInfo {
    /// Backend pid, MySQL thread id or Oracle SID.
    pub id: i64,

    /// Login user of the session.
    pub user: String,

    /// Client host or address. Postgres reports `localhost` for
    /// Unix-socket clients (null `client_addr`).
    pub host: String,

    /// Database (or schema, for Oracle) the session is attached to.
    pub database: String,

    /// Command label (`Query`, `Sleep`, backend type, ...). May be empty.
    pub command: String,

    /// State label (`active`, `idle`, `ACTIVE`, `Sending data`, ...).
    pub state: String,

    /// Current query text, if the engine exposes one.
    pub info: Option<String>,

    /// Seconds since the current query (or logon) started. 0 if unknown.
    pub elapsed_secs: i64,
}

/// One relation and its approximate size.
///
/// Engines that cannot attribute size per relation leave the size fields at
/// zero. Zero means "unknown", not "empty".
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct TableInfo {
    /// Table name, `schema.table` when collected across schemas.
    pub name: String,

    /// Approximate row count (planner estimate).
    pub rows: i64,

    /// Data segment size in bytes.
    pub data_size: i64,

    /// Index segment size in bytes.
    pub index_size: i64,
}

impl TableInfo {
    /// Data plus index size, the ordering key for the largest-tables list.
    pub fn total_size(&self) -> i64 {
        self.data_size.saturating_add(self.index_size)
    }
}

/// Server-wide counters some engines expose in their status views.
///
/// Zero means the engine does not report the counter.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ServerCounters {
    /// Average statements per second since server start.
    pub queries_per_second: f64,
    /// Statements that exceeded the server's slow query threshold.
    pub slow_queries: i64,
    /// Threads (sessions) currently executing.
    pub threads_running: i64,
    /// Threads (sessions) currently connected.
    pub threads_connected: i64,
}

/// Statistics captured at one poll tick.
///
/// Built once by an adapter and never mutated afterwards; the next successful
/// tick replaces it wholesale.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct StatsSnapshot {
    /// Capture time (seconds since Unix epoch).
    pub timestamp: i64,
    pub active_connections: i64,
    pub total_connections: i64,
    pub uptime: Duration,
    pub counters: ServerCounters,
    /// Sessions in the order the engine returned them.
    pub processes: Vec<ProcessInfo>,
    /// Largest relations, descending by total size.
    pub tables: Vec<TableInfo>,
}

impl StatsSnapshot {
    /// Creates an empty snapshot stamped with the current time.
    pub fn now() -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp(),
            ..Self::default()
        }
    }
}
