//! Engine adapters: connection bootstrap and translation of engine-native
//! introspection queries into a [`StatsSnapshot`].
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                     AdapterRegistry                       │
//! │   "postgres" "postgresql" "mysql" "mariadb" "oracle"      │
//! └──────────────┬──────────────────────┬─────────────────────┘
//!                │                      │
//!      ┌─────────▼───────┐   ┌──────────▼──────────┐   ┌────────────────┐
//!      │ PostgresAdapter │   │  MySqlAdapter       │   │ OracleAdapter  │
//!      │                 │   │  (MySQL / MariaDB)  │   │                │
//!      └─────────┬───────┘   └──────────┬──────────┘   └───────┬────────┘
//!                └──────────────┬───────┴──────────────────────┘
//!                        ┌──────▼──────┐
//!                        │   Session   │ (trait)
//!                        └──────┬──────┘
//!           ┌───────────────────┼──────────────────┐
//!    ┌──────▼──────┐     ┌──────▼──────┐    ┌──────▼──────┐
//!    │ driver conn │     │ driver conn │    │ MockSession │
//!    └─────────────┘     └─────────────┘    └─────────────┘
//! ```
//!
//! # Testing
//!
//! ```
//! use dbtop::adapter::{EngineAdapter, MockSession, PostgresAdapter, QueryPurpose};
//! use dbtop::row;
//!
//! let mut session = MockSession::new()
//!     .respond(QueryPurpose::ConnectionCounts, vec![row![3i64, 5i64]])
//!     .respond(QueryPurpose::Uptime, vec![row![60i64]])
//!     .respond(QueryPurpose::ProcessList, vec![])
//!     .respond(QueryPurpose::TableSizes, vec![]);
//! let snapshot = PostgresAdapter.get_stats(&mut session, "").unwrap();
//! assert_eq!(snapshot.total_connections, 5);
//! ```

pub mod mock;
mod mysql_adapter;
mod oracle_adapter;
mod pg_adapter;
mod registry;
mod session;

use tracing::debug;

use crate::config::InstanceConfig;
use crate::model::StatsSnapshot;

pub use mock::MockSession;
pub use mysql_adapter::{MySqlAdapter, MySqlFlavor};
pub use oracle_adapter::OracleAdapter;
pub use pg_adapter::PostgresAdapter;
pub use registry::AdapterRegistry;
pub use session::{Query, QueryPurpose, Row, RowParseError, Session, Value};

/// An open, verified connection owned by the poll loop.
pub type Connection = Box<dyn Session>;

/// Error type for adapter operations.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterError {
    /// No adapter registered under this engine type.
    UnsupportedEngine(String),
    /// Could not open or ping the server. Fatal for the session.
    ConnectionError(String),
    /// An introspection query failed. Only the current tick is lost.
    QueryError {
        purpose: QueryPurpose,
        message: String,
    },
}

impl std::fmt::Display for AdapterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdapterError::UnsupportedEngine(name) => {
                write!(f, "unsupported database type: {}", name)
            }
            AdapterError::ConnectionError(msg) => write!(f, "connection failed: {}", msg),
            AdapterError::QueryError { purpose, message } => {
                write!(f, "failed to get {}: {}", purpose, message)
            }
        }
    }
}

impl std::error::Error for AdapterError {}

/// One engine family.
///
/// Implementations are stateless; all per-connection state lives in the
/// [`Session`] returned by [`connect`](EngineAdapter::connect).
pub trait EngineAdapter: Send + Sync {
    /// Display name of the engine family.
    fn engine(&self) -> &'static str;

    /// Opens and pings a connection for `instance`.
    fn connect(&self, instance: &InstanceConfig) -> Result<Connection, AdapterError>;

    /// Runs the introspection battery and assembles one snapshot.
    ///
    /// `database` restricts sessions and tables to one database/schema when
    /// non-empty.
    fn get_stats(
        &self,
        session: &mut dyn Session,
        database: &str,
    ) -> Result<StatsSnapshot, AdapterError>;
}

/// Runs a query, tagging failures with its purpose.
pub(crate) fn run_query(
    session: &mut dyn Session,
    query: &Query,
) -> Result<Vec<Row>, AdapterError> {
    session.query(query).map_err(|message| AdapterError::QueryError {
        purpose: query.purpose,
        message,
    })
}

/// Parses every row, dropping (and logging) the ones that fail.
pub(crate) fn parse_rows<T>(
    rows: &[Row],
    purpose: QueryPurpose,
    parse: impl Fn(&Row) -> Result<T, RowParseError>,
) -> Vec<T> {
    let mut parsed = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        match parse(row) {
            Ok(value) => parsed.push(value),
            Err(e) => debug!(%purpose, row = idx, error = %e, "skipping unparsable row"),
        }
    }
    parsed
}

/// Reads the first integer of the first row, NULL as zero.
pub(crate) fn scalar_or_zero(rows: &[Row]) -> i64 {
    rows.first()
        .and_then(|row| row.int_or_zero(0).ok())
        .unwrap_or(0)
}

/// Tries connection candidates in order and returns the first that opens
/// and answers a ping.
///
/// Candidates render through `Display` for logs, so their `Display` must not
/// reveal passwords.
pub(crate) fn connect_first<T: std::fmt::Display>(
    candidates: &[T],
    mut open: impl FnMut(&T) -> Result<Connection, String>,
) -> Result<Connection, AdapterError> {
    let mut last_error = "no connection candidates".to_string();
    for candidate in candidates {
        match open(candidate) {
            Ok(mut conn) => match conn.ping() {
                Ok(()) => {
                    debug!(target_dsn = %candidate, "connected");
                    return Ok(conn);
                }
                Err(e) => {
                    debug!(target_dsn = %candidate, error = %e, "ping failed");
                    last_error = format!("failed to ping database: {}", e);
                }
            },
            Err(e) => {
                debug!(target_dsn = %candidate, error = %e, "connection attempt failed");
                last_error = format!("failed to open database connection: {}", e);
            }
        }
    }
    Err(AdapterError::ConnectionError(last_error))
}
