//! Oracle adapter.
//!
//! Sources: `v$session` (counts, sessions), `v$instance` (uptime),
//! `all_tables` + `dba_segments` (table sizes). The database filter is a
//! schema name.

mod queries;
mod session;

use std::fmt;
use std::time::Duration;

use crate::adapter::{
    AdapterError, Connection, EngineAdapter, QueryPurpose, Row, RowParseError, Session,
    connect_first, parse_rows, run_query, scalar_or_zero,
};
use crate::config::InstanceConfig;
use crate::model::{ProcessInfo, StatsSnapshot, TableInfo};

use queries::{
    build_connection_counts_query, build_process_list_query, build_table_sizes_query,
    build_uptime_query,
};
use session::OracleSession;

/// Adapter for `oracle` instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleAdapter;

impl EngineAdapter for OracleAdapter {
    fn engine(&self) -> &'static str {
        "Oracle"
    }

    /// There are no local sockets to try; a password-less instance gets one
    /// network attempt with an empty credential.
    fn connect(&self, instance: &InstanceConfig) -> Result<Connection, AdapterError> {
        let targets = [OracleTarget::from_instance(instance)];
        connect_first(&targets, |target| {
            let session =
                OracleSession::open(&target.user, &target.password, &target.connect_string())?;
            Ok(Box::new(session) as Connection)
        })
    }

    fn get_stats(
        &self,
        session: &mut dyn Session,
        database: &str,
    ) -> Result<StatsSnapshot, AdapterError> {
        let mut snapshot = StatsSnapshot::now();

        let counts = run_query(session, &build_connection_counts_query(database))?;
        if let Some(row) = counts.first() {
            snapshot.active_connections = row.int_or_zero(0).unwrap_or(0);
            snapshot.total_connections = row.int_or_zero(1).unwrap_or(0);
        }

        let uptime = run_query(session, &build_uptime_query())?;
        snapshot.uptime = Duration::from_secs(scalar_or_zero(&uptime).max(0) as u64);

        let rows = run_query(session, &build_process_list_query(database))?;
        snapshot.processes = parse_rows(&rows, QueryPurpose::ProcessList, parse_session_row);

        let rows = run_query(session, &build_table_sizes_query(database))?;
        snapshot.tables = parse_rows(&rows, QueryPurpose::TableSizes, parse_table_row);

        Ok(snapshot)
    }
}

/// Columns: sid, username, machine, schemaname, status, elapsed, sql_text.
fn parse_session_row(row: &Row) -> Result<ProcessInfo, RowParseError> {
    Ok(ProcessInfo {
        id: row.int(0)?,
        user: row.text(1)?,
        host: row.opt_text(2)?.unwrap_or_default(),
        database: row.opt_text(3)?.unwrap_or_default(),
        command: String::new(),
        state: row.opt_text(4)?.unwrap_or_default(),
        elapsed_secs: row.int_or_zero(5)?.max(0),
        info: row.opt_text(6)?,
    })
}

fn parse_table_row(row: &Row) -> Result<TableInfo, RowParseError> {
    Ok(TableInfo {
        name: row.text(0)?,
        rows: row.int_or_zero(1)?,
        data_size: row.int_or_zero(2)?,
        index_size: row.int_or_zero(3)?,
    })
}

/// `user/password@host:port/service`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OracleTarget {
    user: String,
    password: String,
    host: String,
    port: u16,
    service: String,
}

impl OracleTarget {
    fn from_instance(instance: &InstanceConfig) -> Self {
        Self {
            user: instance.username.clone(),
            password: instance.password.clone(),
            host: if instance.host.is_empty() {
                "localhost".to_string()
            } else {
                instance.host.clone()
            },
            port: instance.port(),
            service: instance.database.clone(),
        }
    }

    /// EZConnect part after `@`.
    fn connect_string(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.service)
    }

    #[cfg(test)]
    fn dsn(&self) -> String {
        format!("{}/{}@{}", self.user, self.password, self.connect_string())
    }
}

impl fmt::Display for OracleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked = if self.password.is_empty() { "" } else { "***" };
        write!(f, "{}/{}@{}", self.user, masked, self.connect_string())
    }
}
