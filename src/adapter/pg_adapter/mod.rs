//! PostgreSQL adapter.
//!
//! Reads statistics views:
//! - `pg_stat_activity`: session counts and the process list
//! - `pg_stat_user_tables`: table sizes via `pg_table_size`/`pg_indexes_size`
//! - `pg_postmaster_start_time()`: uptime
//!
//! ## Connecting without a password
//!
//! When the instance has no password the adapter walks a fixed list of
//! targets: the Unix socket directories `/var/run/postgresql` and `/tmp`
//! (local hosts only), then TCP with an empty password.

mod queries;
mod session;

use std::fmt;
use std::time::Duration;

use crate::adapter::{
    AdapterError, Connection, EngineAdapter, QueryPurpose, Row, RowParseError, Session,
    connect_first, parse_rows, run_query, scalar_or_zero,
};
use crate::config::InstanceConfig;
use crate::model::{ProcessInfo, ServerCounters, StatsSnapshot, TableInfo};

use queries::{
    build_connection_counts_query, build_process_list_query, build_table_sizes_query,
    build_uptime_query,
};
use session::{PgSession, TlsPolicy};

/// Socket directories tried for password-less local connections.
const SOCKET_DIRS: [&str; 2] = ["/var/run/postgresql", "/tmp"];

/// Adapter for `postgres` / `postgresql` instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresAdapter;

impl EngineAdapter for PostgresAdapter {
    fn engine(&self) -> &'static str {
        "PostgreSQL"
    }

    fn connect(&self, instance: &InstanceConfig) -> Result<Connection, AdapterError> {
        let targets = connection_targets(instance);
        connect_first(&targets, |target| {
            let session = PgSession::open(&target.driver_dsn(), target.tls())?;
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
        let (active, total) = counts
            .first()
            .map(|row| {
                (
                    row.int_or_zero(0).unwrap_or(0),
                    row.int_or_zero(1).unwrap_or(0),
                )
            })
            .unwrap_or((0, 0));

        let uptime = run_query(session, &build_uptime_query())?;
        let uptime_secs = scalar_or_zero(&uptime).max(0) as u64;

        let rows = run_query(session, &build_process_list_query(database))?;
        let processes = parse_rows(&rows, QueryPurpose::ProcessList, parse_process_row);

        let rows = run_query(session, &build_table_sizes_query(database))?;
        let tables = parse_rows(&rows, QueryPurpose::TableSizes, parse_table_row);

        snapshot.active_connections = active;
        snapshot.total_connections = total;
        snapshot.uptime = Duration::from_secs(uptime_secs);
        snapshot.counters = ServerCounters {
            threads_running: active,
            threads_connected: total,
            ..ServerCounters::default()
        };
        snapshot.processes = processes;
        snapshot.tables = tables;
        Ok(snapshot)
    }
}

/// Columns: pid, usename, client_addr, datname, backend_type, state, elapsed, query.
fn parse_process_row(row: &Row) -> Result<ProcessInfo, RowParseError> {
    Ok(ProcessInfo {
        id: row.int(0)?,
        user: row.text(1)?,
        host: row
            .opt_text(2)?
            .unwrap_or_else(|| "localhost".to_string()),
        database: row.text(3)?,
        command: row.opt_text(4)?.unwrap_or_default(),
        state: row.text(5)?,
        elapsed_secs: row.int_or_zero(6)?.max(0),
        info: row.opt_text(7)?,
    })
}

/// Columns: table_name, approx_rows, data_size, index_size.
fn parse_table_row(row: &Row) -> Result<TableInfo, RowParseError> {
    Ok(TableInfo {
        name: row.text(0)?,
        rows: row.int_or_zero(1)?,
        data_size: row.int_or_zero(2)?,
        index_size: row.int_or_zero(3)?,
    })
}

/// One connection attempt in libpq key=value form.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PgTarget {
    host: String,
    port: u16,
    user: String,
    /// `None` omits the key (socket peer auth).
    password: Option<String>,
    ssl_mode: String,
    database: String,
}

impl PgTarget {
    /// Connection string as configured.
    #[cfg(test)]
    fn dsn(&self) -> String {
        self.render(self.password.as_deref(), &self.ssl_mode)
    }

    /// Connection string for the driver, which only knows
    /// `disable`/`prefer`/`require`. Certificate checks are done by the TLS
    /// connector instead.
    fn driver_dsn(&self) -> String {
        let ssl_mode = match self.tls() {
            TlsPolicy::Disabled => "disable",
            TlsPolicy::Unverified if self.ssl_mode == "allow" || self.ssl_mode == "prefer" => {
                "prefer"
            }
            _ => "require",
        };
        self.render(self.password.as_deref(), ssl_mode)
    }

    fn tls(&self) -> TlsPolicy {
        TlsPolicy::from_ssl_mode(&self.ssl_mode)
    }

    fn render(&self, password: Option<&str>, ssl_mode: &str) -> String {
        let mut dsn = format!(
            "host={} port={} user={}",
            quote_value(&self.host),
            self.port,
            quote_value(&self.user)
        );
        if let Some(password) = password {
            dsn.push_str(&format!(" password={}", quote_value(password)));
        }
        dsn.push_str(&format!(" sslmode={}", quote_value(ssl_mode)));
        if !self.database.is_empty() {
            dsn.push_str(&format!(" dbname={}", quote_value(&self.database)));
        }
        dsn
    }
}

impl fmt::Display for PgTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked = self.password.as_ref().map(|_| "***");
        f.write_str(&self.render(masked, &self.ssl_mode))
    }
}

/// Quotes a libpq value when it is empty or contains spaces, quotes or
/// backslashes.
fn quote_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\');
    if !needs_quotes {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}'", escaped)
}

/// Login user, falling back to `$USER` like libpq.
fn login_user(instance: &InstanceConfig) -> String {
    if !instance.username.is_empty() {
        return instance.username.clone();
    }
    std::env::var("USER").unwrap_or_else(|_| "postgres".to_string())
}

/// Ordered connection attempts for an instance.
fn connection_targets(instance: &InstanceConfig) -> Vec<PgTarget> {
    let host = if instance.host.is_empty() {
        "localhost".to_string()
    } else {
        instance.host.clone()
    };
    let network = PgTarget {
        host,
        port: instance.port(),
        user: login_user(instance),
        password: Some(instance.password.clone()),
        ssl_mode: instance.ssl_mode.clone(),
        database: instance.database.clone(),
    };

    if instance.has_credentials() || !instance.is_local_host() {
        return vec![network];
    }

    let mut targets: Vec<PgTarget> = SOCKET_DIRS
        .iter()
        .map(|dir| PgTarget {
            host: dir.to_string(),
            password: None,
            ssl_mode: "disable".to_string(),
            ..network.clone()
        })
        .collect();
    targets.push(network);
    targets
}

/// Formats PostgreSQL error message for display.
pub(crate) fn format_postgres_error(e: &postgres::Error) -> String {
    if let Some(db_error) = e.as_db_error() {
        format!("{}: {}", db_error.severity(), db_error.message())
    } else {
        let msg = e.to_string();
        if msg.contains("Connection refused") {
            "connection refused".to_string()
        } else if msg.contains("password authentication failed") {
            "password authentication failed".to_string()
        } else if msg.contains("does not exist") {
            msg.split("FATAL:")
                .last()
                .unwrap_or(&msg)
                .trim()
                .to_string()
        } else {
            msg
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MockSession;
    use crate::row;

    fn process_row(pid: i64, user: &str, state: &str, elapsed: i64) -> Row {
        row![
            pid,
            user,
            Some("10.0.0.7"),
            "app",
            "client backend",
            state,
            elapsed,
            Some("SELECT 1")
        ]
    }

    fn scripted() -> MockSession {
        MockSession::new()
            .respond(QueryPurpose::ConnectionCounts, vec![row![3i64, 5i64]])
            .respond(QueryPurpose::Uptime, vec![row![86_400i64]])
            .respond(
                QueryPurpose::ProcessList,
                vec![
                    process_row(101, "alice", "active", 12),
                    process_row(102, "bob", "idle", 300),
                ],
            )
            .respond(
                QueryPurpose::TableSizes,
                vec![
                    row!["public.orders", 1000i64, 81920i64, 16384i64],
                    row!["public.users", 50i64, 8192i64, 8192i64],
                ],
            )
    }

    #[test]
    fn test_get_stats_counts_and_uptime() {
        let mut session = scripted();
        let snap = PostgresAdapter.get_stats(&mut session, "").unwrap();
        assert_eq!(snap.active_connections, 3);
        assert_eq!(snap.total_connections, 5);
        assert_eq!(snap.uptime, Duration::from_secs(86_400));
        assert_eq!(snap.counters.threads_running, 3);
        assert_eq!(snap.counters.threads_connected, 5);
        assert_eq!(snap.counters.slow_queries, 0);
    }

    #[test]
    fn test_get_stats_golden_rows() {
        let mut session = scripted();
        let snap = PostgresAdapter.get_stats(&mut session, "").unwrap();
        assert_eq!(
            snap.processes[0],
            ProcessInfo {
                id: 101,
                user: "alice".to_string(),
                host: "10.0.0.7".to_string(),
                database: "app".to_string(),
                command: "client backend".to_string(),
                state: "active".to_string(),
                info: Some("SELECT 1".to_string()),
                elapsed_secs: 12,
            }
        );
        assert_eq!(snap.processes.len(), 2);
        assert_eq!(snap.tables[0].name, "public.orders");
        assert_eq!(snap.tables[0].total_size(), 98304);
    }

    #[test]
    fn test_null_client_addr_is_localhost() {
        let session = scripted();
        session.set_rows(
            QueryPurpose::ProcessList,
            vec![row![
                7i64,
                "postgres",
                None::<&str>,
                "app",
                "client backend",
                "active",
                None::<i64>,
                None::<&str>
            ]],
        );
        let mut session = session;
        let snap = PostgresAdapter.get_stats(&mut session, "").unwrap();
        assert_eq!(snap.processes[0].host, "localhost");
        assert_eq!(snap.processes[0].elapsed_secs, 0);
        assert_eq!(snap.processes[0].info, None);
    }

    #[test]
    fn test_negative_elapsed_clamped() {
        let session = scripted();
        session.set_rows(
            QueryPurpose::ProcessList,
            vec![process_row(1, "alice", "active", -3)],
        );
        let mut session = session;
        let snap = PostgresAdapter.get_stats(&mut session, "").unwrap();
        assert_eq!(snap.processes[0].elapsed_secs, 0);
    }

    #[test]
    fn test_row_with_null_user_is_dropped() {
        let session = scripted();
        session.set_rows(
            QueryPurpose::ProcessList,
            vec![
                process_row(1, "alice", "active", 1),
                row![
                    2i64,
                    None::<&str>,
                    None::<&str>,
                    None::<&str>,
                    "autovacuum launcher",
                    "idle",
                    0i64,
                    None::<&str>
                ],
                process_row(3, "carol", "active", 2),
            ],
        );
        let mut session = session;
        let snap = PostgresAdapter.get_stats(&mut session, "").unwrap();
        let ids: Vec<i64> = snap.processes.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_null_sizes_read_as_zero() {
        let session = scripted();
        session.set_rows(
            QueryPurpose::TableSizes,
            vec![row!["orders", None::<i64>, None::<i64>, 4096i64]],
        );
        let mut session = session;
        let snap = PostgresAdapter.get_stats(&mut session, "app").unwrap();
        assert_eq!(snap.tables[0].rows, 0);
        assert_eq!(snap.tables[0].data_size, 0);
        assert_eq!(snap.tables[0].index_size, 4096);
    }

    #[test]
    fn test_database_filter_is_bound() {
        let handle = scripted();
        let mut session = handle.clone();
        PostgresAdapter.get_stats(&mut session, "app").unwrap();
        let counts = handle.executed_for(QueryPurpose::ConnectionCounts);
        assert_eq!(counts[0].params, vec!["app".to_string()]);
        let procs = handle.executed_for(QueryPurpose::ProcessList);
        assert_eq!(procs[0].params, vec!["app".to_string()]);
        let tables = handle.executed_for(QueryPurpose::TableSizes);
        assert!(tables[0].sql.contains("LIMIT 10"));
    }

    #[test]
    fn test_query_failure_fails_whole_collection() {
        let handle = scripted();
        handle.fail_next(QueryPurpose::TableSizes, "permission denied");
        let mut session = handle.clone();
        let err = PostgresAdapter.get_stats(&mut session, "").unwrap_err();
        assert_eq!(
            err,
            AdapterError::QueryError {
                purpose: QueryPurpose::TableSizes,
                message: "permission denied".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_counts_read_as_zero() {
        let session = scripted();
        session.set_rows(QueryPurpose::ConnectionCounts, vec![]);
        let mut session = session;
        let snap = PostgresAdapter.get_stats(&mut session, "").unwrap();
        assert_eq!(snap.active_connections, 0);
        assert_eq!(snap.total_connections, 0);
    }

    #[test]
    fn test_dsn_with_credentials() {
        let mut instance = InstanceConfig::new("postgres");
        instance.host = "db.example.com".to_string();
        instance.username = "monitor".to_string();
        instance.password = "secret".to_string();
        instance.database = "app".to_string();

        let targets = connection_targets(&instance);
        assert_eq!(targets.len(), 1);
        assert_eq!(
            targets[0].dsn(),
            "host=db.example.com port=5432 user=monitor password=secret sslmode=disable dbname=app"
        );
        assert_eq!(
            targets[0].to_string(),
            "host=db.example.com port=5432 user=monitor password=*** sslmode=disable dbname=app"
        );
    }

    #[test]
    fn test_local_fallback_order() {
        let mut instance = InstanceConfig::new("postgres");
        instance.username = "monitor".to_string();

        let hosts: Vec<String> = connection_targets(&instance)
            .into_iter()
            .map(|t| t.host)
            .collect();
        assert_eq!(hosts, vec!["/var/run/postgresql", "/tmp", "localhost"]);

        let targets = connection_targets(&instance);
        assert_eq!(targets[0].password, None);
        assert_eq!(targets[2].password, Some(String::new()));
        assert!(targets[2].dsn().contains("password=''"));
    }

    #[test]
    fn test_remote_fallback_is_network_only() {
        let mut instance = InstanceConfig::new("postgresql");
        instance.host = "10.1.2.3".to_string();
        instance.username = "monitor".to_string();
        let targets = connection_targets(&instance);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].host, "10.1.2.3");
    }

    #[test]
    fn test_driver_dsn_normalizes_ssl_mode() {
        let mut instance = InstanceConfig::new("postgres");
        instance.username = "monitor".to_string();
        instance.password = "pw".to_string();
        instance.ssl_mode = "verify-full".to_string();
        let target = &connection_targets(&instance)[0];
        assert!(target.dsn().contains("sslmode=verify-full"));
        assert!(target.driver_dsn().contains("sslmode=require"));

        instance.ssl_mode = "allow".to_string();
        let target = &connection_targets(&instance)[0];
        assert!(target.driver_dsn().contains("sslmode=prefer"));
    }

    #[test]
    fn test_quote_value() {
        assert_eq!(quote_value("plain"), "plain");
        assert_eq!(quote_value(""), "''");
        assert_eq!(quote_value("with space"), "'with space'");
        assert_eq!(quote_value("it's"), "'it\\'s'");
    }
}
