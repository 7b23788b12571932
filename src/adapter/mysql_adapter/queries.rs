//! SQL for MySQL and MariaDB.

use crate::adapter::{Query, QueryPurpose};

/// Status variables read each tick.
pub(super) const STATUS_VARIABLES: [&str; 5] = [
    "Uptime",
    "Threads_connected",
    "Threads_running",
    "Slow_queries",
    "Questions",
];

/// Sessions kept from the process list.
pub(super) const PROCESS_LIMIT: usize = 30;
pub(super) const TABLES_LIMIT_FILTERED: usize = 10;
pub(super) const TABLES_LIMIT_ALL: usize = 20;

/// Server-wide status counters as `(Variable_name, Value)` rows.
pub(super) fn build_status_query() -> Query {
    let names = STATUS_VARIABLES
        .iter()
        .map(|name| format!("'{}'", name))
        .collect::<Vec<_>>()
        .join(", ");
    Query::new(
        QueryPurpose::ServerStatus,
        format!("SHOW GLOBAL STATUS WHERE Variable_name IN ({names})"),
    )
}

/// Id, User, Host, db, Command, Time, State, Info.
pub(super) fn build_process_list_query() -> Query {
    Query::new(QueryPurpose::ProcessList, "SHOW FULL PROCESSLIST")
}

/// Largest tables by data + index length.
pub(super) fn build_table_sizes_query(database: &str) -> Query {
    if database.is_empty() {
        Query::new(
            QueryPurpose::TableSizes,
            format!(
                r#"
            SELECT
                CONCAT(table_schema, '.', table_name) AS table_name,
                COALESCE(table_rows, 0) AS table_rows,
                COALESCE(data_length, 0) AS data_length,
                COALESCE(index_length, 0) AS index_length
            FROM information_schema.tables
            WHERE table_schema NOT IN ('mysql', 'information_schema', 'performance_schema', 'sys')
            ORDER BY (data_length + index_length) DESC
            LIMIT {TABLES_LIMIT_ALL}
        "#
            ),
        )
    } else {
        Query::new(
            QueryPurpose::TableSizes,
            format!(
                r#"
            SELECT
                table_name,
                COALESCE(table_rows, 0) AS table_rows,
                COALESCE(data_length, 0) AS data_length,
                COALESCE(index_length, 0) AS index_length
            FROM information_schema.tables
            WHERE table_schema = ?
            ORDER BY (data_length + index_length) DESC
            LIMIT {TABLES_LIMIT_FILTERED}
        "#
            ),
        )
        .bind(database)
    }
}
