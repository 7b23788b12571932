//! MySQL / MariaDB adapter.
//!
//! Both flavors speak the same protocol and expose the same views, so one
//! adapter serves both; the flavor only changes the display name.
//!
//! Sources:
//! - `SHOW GLOBAL STATUS`: uptime, thread counters, slow queries, QPS
//! - `SHOW FULL PROCESSLIST`: sessions (filtered by `db` client-side)
//! - `information_schema.tables`: table sizes

mod queries;
mod session;

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use mysql::OptsBuilder;

use crate::adapter::{
    AdapterError, Connection, EngineAdapter, QueryPurpose, Row, RowParseError, Session,
    connect_first, parse_rows, run_query,
};
use crate::config::InstanceConfig;
use crate::model::{ProcessInfo, ServerCounters, StatsSnapshot, TableInfo};

use queries::{PROCESS_LIMIT, build_process_list_query, build_status_query, build_table_sizes_query};
use session::MySqlSession;

/// Socket files tried for password-less local connections.
const SOCKET_PATHS: [&str; 3] = [
    "/var/run/mysqld/mysqld.sock",
    "/tmp/mysql.sock",
    "/var/lib/mysql/mysql.sock",
];

/// Process list command of an idle connection.
const IDLE_COMMAND: &str = "Sleep";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MySqlFlavor {
    MySql,
    MariaDb,
}

/// Adapter for `mysql` / `mariadb` instances.
#[derive(Debug, Clone, Copy)]
pub struct MySqlAdapter {
    flavor: MySqlFlavor,
}

impl MySqlAdapter {
    pub fn new(flavor: MySqlFlavor) -> Self {
        Self { flavor }
    }

    pub fn flavor(&self) -> MySqlFlavor {
        self.flavor
    }
}

impl EngineAdapter for MySqlAdapter {
    fn engine(&self) -> &'static str {
        match self.flavor {
            MySqlFlavor::MySql => "MySQL",
            MySqlFlavor::MariaDb => "MariaDB",
        }
    }

    fn connect(&self, instance: &InstanceConfig) -> Result<Connection, AdapterError> {
        let targets = connection_targets(instance);
        connect_first(&targets, |target| {
            let session = MySqlSession::open(target.opts())?;
            Ok(Box::new(session) as Connection)
        })
    }

    fn get_stats(
        &self,
        session: &mut dyn Session,
        database: &str,
    ) -> Result<StatsSnapshot, AdapterError> {
        let mut snapshot = StatsSnapshot::now();

        let rows = run_query(session, &build_status_query())?;
        let status = StatusVariables::from_rows(&rows);

        let rows = run_query(session, &build_process_list_query())?;
        let mut processes: Vec<ProcessInfo> =
            parse_rows(&rows, QueryPurpose::ProcessList, parse_process_row)
                .into_iter()
                .filter(|p| database.is_empty() || p.database == database)
                .collect();

        let active = processes
            .iter()
            .filter(|p| p.command != IDLE_COMMAND)
            .count() as i64;
        let total = if database.is_empty() {
            status.get("Threads_connected")
        } else {
            processes.len() as i64
        };

        // Most recent first; sort_by_key is stable so ties keep server order.
        processes.sort_by_key(|p| p.elapsed_secs);
        processes.truncate(PROCESS_LIMIT);

        let rows = run_query(session, &build_table_sizes_query(database))?;
        let tables = parse_rows(&rows, QueryPurpose::TableSizes, parse_table_row);

        let uptime = status.get("Uptime").max(0);
        snapshot.active_connections = active;
        snapshot.total_connections = total;
        snapshot.uptime = Duration::from_secs(uptime as u64);
        snapshot.counters = ServerCounters {
            queries_per_second: if uptime > 0 {
                status.get("Questions") as f64 / uptime as f64
            } else {
                0.0
            },
            slow_queries: status.get("Slow_queries"),
            threads_running: status.get("Threads_running"),
            threads_connected: status.get("Threads_connected"),
        };
        snapshot.processes = processes;
        snapshot.tables = tables;
        Ok(snapshot)
    }
}

/// `SHOW STATUS` name → value, numeric values only.
struct StatusVariables(HashMap<String, i64>);

impl StatusVariables {
    fn from_rows(rows: &[Row]) -> Self {
        let values = parse_rows(rows, QueryPurpose::ServerStatus, |row| {
            Ok((row.text(0)?, row.int_or_zero(1)?))
        });
        Self(values.into_iter().collect())
    }

    /// Missing counters read as 0.
    fn get(&self, name: &str) -> i64 {
        self.0.get(name).copied().unwrap_or(0)
    }
}

/// Columns: Id, User, Host, db, Command, Time, State, Info.
fn parse_process_row(row: &Row) -> Result<ProcessInfo, RowParseError> {
    Ok(ProcessInfo {
        id: row.int(0)?,
        user: row.text(1)?,
        host: row.opt_text(2)?.unwrap_or_default(),
        database: row.opt_text(3)?.unwrap_or_default(),
        command: row.opt_text(4)?.unwrap_or_default(),
        elapsed_secs: row.int_or_zero(5)?.max(0),
        state: row.opt_text(6)?.unwrap_or_default(),
        info: row.opt_text(7)?,
    })
}

/// Columns: table_name, table_rows, data_length, index_length.
fn parse_table_row(row: &Row) -> Result<TableInfo, RowParseError> {
    Ok(TableInfo {
        name: row.text(0)?,
        rows: row.int_or_zero(1)?,
        data_size: row.int_or_zero(2)?,
        index_size: row.int_or_zero(3)?,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Transport {
    Tcp { host: String, port: u16 },
    Socket(String),
}

/// One connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MySqlTarget {
    user: String,
    password: String,
    transport: Transport,
    database: String,
}

impl MySqlTarget {
    fn opts(&self) -> OptsBuilder {
        let mut opts = OptsBuilder::new()
            .user(Some(self.user.as_str()))
            .pass(Some(self.password.as_str()))
            .db_name((!self.database.is_empty()).then_some(self.database.as_str()));
        match &self.transport {
            Transport::Tcp { host, port } => {
                opts = opts.ip_or_hostname(Some(host.as_str())).tcp_port(*port);
            }
            Transport::Socket(path) => {
                opts = opts.socket(Some(path.as_str()));
            }
        }
        opts
    }

    fn render(&self, password: &str) -> String {
        let address = match &self.transport {
            Transport::Tcp { host, port } => format!("tcp({}:{})", host, port),
            Transport::Socket(path) => format!("unix({})", path),
        };
        format!(
            "{}:{}@{}/{}",
            self.user, password, address, self.database
        )
    }

    /// `user:password@tcp(host:port)/database`.
    #[cfg(test)]
    fn dsn(&self) -> String {
        self.render(&self.password)
    }
}

impl fmt::Display for MySqlTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked = if self.password.is_empty() { "" } else { "***" };
        f.write_str(&self.render(masked))
    }
}

/// Ordered connection attempts for an instance.
fn connection_targets(instance: &InstanceConfig) -> Vec<MySqlTarget> {
    let host = if instance.host.is_empty() {
        "localhost".to_string()
    } else {
        instance.host.clone()
    };
    let network = MySqlTarget {
        user: instance.username.clone(),
        password: instance.password.clone(),
        transport: Transport::Tcp {
            host,
            port: instance.port(),
        },
        database: instance.database.clone(),
    };

    if instance.has_credentials() || !instance.is_local_host() {
        return vec![network];
    }

    let mut targets: Vec<MySqlTarget> = SOCKET_PATHS
        .iter()
        .map(|path| MySqlTarget {
            transport: Transport::Socket(path.to_string()),
            ..network.clone()
        })
        .collect();
    targets.push(network);
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MockSession;
    use crate::row;

    fn status_rows() -> Vec<Row> {
        vec![
            row!["Uptime", "1000"],
            row!["Threads_connected", "12"],
            row!["Threads_running", "3"],
            row!["Slow_queries", "7"],
            row!["Questions", "5000"],
        ]
    }

    fn process(id: i64, db: Option<&str>, command: &str, time: i64) -> Row {
        row![
            id,
            "app",
            "10.0.0.9:51234",
            db,
            command,
            time,
            "",
            None::<&str>
        ]
    }

    fn scripted(processes: Vec<Row>) -> MockSession {
        MockSession::new()
            .respond(QueryPurpose::ServerStatus, status_rows())
            .respond(QueryPurpose::ProcessList, processes)
            .respond(
                QueryPurpose::TableSizes,
                vec![row!["shop.orders", "2000", "1048576", "262144"]],
            )
    }

    fn adapter() -> MySqlAdapter {
        MySqlAdapter::new(MySqlFlavor::MySql)
    }

    #[test]
    fn test_engine_names() {
        assert_eq!(MySqlAdapter::new(MySqlFlavor::MySql).engine(), "MySQL");
        assert_eq!(MySqlAdapter::new(MySqlFlavor::MariaDb).engine(), "MariaDB");
    }

    #[test]
    fn test_status_counters() {
        let mut session = scripted(vec![]);
        let snap = adapter().get_stats(&mut session, "").unwrap();
        assert_eq!(snap.uptime, Duration::from_secs(1000));
        assert_eq!(snap.counters.threads_connected, 12);
        assert_eq!(snap.counters.threads_running, 3);
        assert_eq!(snap.counters.slow_queries, 7);
        assert!((snap.counters.queries_per_second - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unfiltered_counts_use_threads_connected() {
        let mut session = scripted(vec![
            process(1, Some("shop"), "Query", 2),
            process(2, Some("shop"), "Sleep", 50),
            process(3, None, "Daemon", 900),
        ]);
        let snap = adapter().get_stats(&mut session, "").unwrap();
        assert_eq!(snap.total_connections, 12);
        assert_eq!(snap.active_connections, 2);
        assert_eq!(snap.processes.len(), 3);
    }

    #[test]
    fn test_filtered_counts_use_process_rows() {
        let mut session = scripted(vec![
            process(1, Some("shop"), "Query", 2),
            process(2, Some("shop"), "Sleep", 50),
            process(3, Some("crm"), "Query", 1),
            process(4, None, "Sleep", 1),
        ]);
        let snap = adapter().get_stats(&mut session, "shop").unwrap();
        assert_eq!(snap.total_connections, 2);
        assert_eq!(snap.active_connections, 1);
        let ids: Vec<i64> = snap.processes.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_process_list_keeps_30_most_recent() {
        let rows: Vec<Row> = (0..40)
            .map(|i| process(i, Some("shop"), "Query", 100 - i))
            .collect();
        let mut session = scripted(rows);
        let snap = adapter().get_stats(&mut session, "").unwrap();
        assert_eq!(snap.processes.len(), 30);
        assert_eq!(snap.processes[0].elapsed_secs, 61);
        assert_eq!(snap.processes[29].elapsed_secs, 90);
    }

    #[test]
    fn test_equal_elapsed_keeps_server_order() {
        let mut session = scripted(vec![
            process(5, Some("shop"), "Query", 3),
            process(9, Some("shop"), "Query", 3),
            process(2, Some("shop"), "Query", 3),
        ]);
        let snap = adapter().get_stats(&mut session, "").unwrap();
        let ids: Vec<i64> = snap.processes.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![5, 9, 2]);
    }

    #[test]
    fn test_unparsable_process_row_dropped() {
        let mut session = scripted(vec![
            process(1, Some("shop"), "Query", 2),
            row!["not-a-number", "app", "h", "shop", "Query", 1i64, "", None::<&str>],
        ]);
        let snap = adapter().get_stats(&mut session, "").unwrap();
        assert_eq!(snap.processes.len(), 1);
        assert_eq!(snap.processes[0].id, 1);
    }

    #[test]
    fn test_table_rows_golden() {
        let mut session = scripted(vec![]);
        let snap = adapter().get_stats(&mut session, "").unwrap();
        assert_eq!(
            snap.tables,
            vec![TableInfo {
                name: "shop.orders".to_string(),
                rows: 2000,
                data_size: 1_048_576,
                index_size: 262_144,
            }]
        );
    }

    #[test]
    fn test_status_failure_is_query_error() {
        let handle = scripted(vec![]);
        handle.fail_next(QueryPurpose::ServerStatus, "Access denied");
        let mut session = handle.clone();
        let err = adapter().get_stats(&mut session, "").unwrap_err();
        assert_eq!(err.to_string(), "failed to get status variables: Access denied");
    }

    #[test]
    fn test_zero_uptime_gives_zero_qps() {
        let handle = scripted(vec![]);
        handle.set_rows(QueryPurpose::ServerStatus, vec![row!["Questions", "10"]]);
        let mut session = handle.clone();
        let snap = adapter().get_stats(&mut session, "").unwrap();
        assert_eq!(snap.counters.queries_per_second, 0.0);
        assert_eq!(snap.total_connections, 0);
    }

    #[test]
    fn test_dsn_shape_and_masking() {
        let mut instance = InstanceConfig::new("mysql");
        instance.host = "db.internal".to_string();
        instance.username = "monitor".to_string();
        instance.password = "secret".to_string();
        instance.database = "shop".to_string();

        let targets = connection_targets(&instance);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].dsn(), "monitor:secret@tcp(db.internal:3306)/shop");
        assert_eq!(targets[0].to_string(), "monitor:***@tcp(db.internal:3306)/shop");
    }

    #[test]
    fn test_local_fallback_tries_sockets_then_tcp() {
        let mut instance = InstanceConfig::new("mariadb");
        instance.username = "root".to_string();

        let targets = connection_targets(&instance);
        let transports: Vec<Transport> = targets.into_iter().map(|t| t.transport).collect();
        assert_eq!(
            transports,
            vec![
                Transport::Socket("/var/run/mysqld/mysqld.sock".to_string()),
                Transport::Socket("/tmp/mysql.sock".to_string()),
                Transport::Socket("/var/lib/mysql/mysql.sock".to_string()),
                Transport::Tcp {
                    host: "localhost".to_string(),
                    port: 3306
                },
            ]
        );
    }

    #[test]
    fn test_remote_without_password_is_tcp_only() {
        let mut instance = InstanceConfig::new("mysql");
        instance.host = "10.0.0.5".to_string();
        instance.port = Some(3307);
        let targets = connection_targets(&instance);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].to_string(), ":@tcp(10.0.0.5:3307)/");
    }
}
