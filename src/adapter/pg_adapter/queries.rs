//! SQL query builders for PostgreSQL statistics views.

use crate::adapter::{Query, QueryPurpose};

/// Sessions returned by the process list query.
pub(super) const PROCESS_LIMIT: usize = 50;
/// Tables returned when a database filter is set.
pub(super) const TABLES_LIMIT_FILTERED: usize = 10;
/// Tables returned across all schemas.
pub(super) const TABLES_LIMIT_ALL: usize = 20;

/// Active and total sessions in one pass over pg_stat_activity.
pub(super) fn build_connection_counts_query(database: &str) -> Query {
    let base = r#"
            SELECT
                count(*) FILTER (WHERE state = 'active') AS active,
                count(*) AS total
            FROM pg_stat_activity
        "#;
    if database.is_empty() {
        Query::new(QueryPurpose::ConnectionCounts, base)
    } else {
        Query::new(
            QueryPurpose::ConnectionCounts,
            format!("{base} WHERE datname = $1"),
        )
        .bind(database)
    }
}

pub(super) fn build_uptime_query() -> Query {
    Query::new(
        QueryPurpose::Uptime,
        "SELECT EXTRACT(EPOCH FROM (now() - pg_postmaster_start_time()))::bigint",
    )
}

/// Most recent sessions first.
///
/// `usename`, `datname` and `state` are left nullable on purpose: rows from
/// background workers carry NULLs there and are dropped while parsing.
pub(super) fn build_process_list_query(database: &str) -> Query {
    let filter = if database.is_empty() {
        ""
    } else {
        " AND datname = $1"
    };
    let sql = format!(
        r#"
            SELECT
                pid::bigint AS pid,
                usename,
                host(client_addr) AS client_addr,
                datname,
                COALESCE(backend_type, '') AS backend_type,
                state,
                EXTRACT(EPOCH FROM (now() - query_start))::bigint AS elapsed,
                query
            FROM pg_stat_activity
            WHERE state IS NOT NULL{filter}
            ORDER BY query_start DESC NULLS LAST
            LIMIT {PROCESS_LIMIT}
        "#
    );
    let query = Query::new(QueryPurpose::ProcessList, sql);
    if database.is_empty() {
        query
    } else {
        query.bind(database)
    }
}

/// Largest user tables by heap + index size.
///
/// With a database filter the connection is already inside that database, so
/// the list narrows to the `public` schema and shows bare table names.
pub(super) fn build_table_sizes_query(database: &str) -> Query {
    let (name_expr, filter, limit) = if database.is_empty() {
        (
            "schemaname || '.' || relname",
            "",
            TABLES_LIMIT_ALL,
        )
    } else {
        (
            "relname::text",
            "WHERE schemaname = 'public'",
            TABLES_LIMIT_FILTERED,
        )
    };
    Query::new(
        QueryPurpose::TableSizes,
        format!(
            r#"
            SELECT
                {name_expr} AS table_name,
                n_live_tup AS approx_rows,
                pg_table_size(relid) AS data_size,
                pg_indexes_size(relid) AS index_size
            FROM pg_stat_user_tables
            {filter}
            ORDER BY pg_table_size(relid) + pg_indexes_size(relid) DESC
            LIMIT {limit}
        "#
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_query_binds_database() {
        let q = build_connection_counts_query("app");
        assert!(q.sql.contains("datname = $1"));
        assert_eq!(q.params, vec!["app".to_string()]);

        let q = build_connection_counts_query("");
        assert!(!q.sql.contains("$1"));
        assert!(q.params.is_empty());
    }

    #[test]
    fn process_query_limits_and_orders() {
        let q = build_process_list_query("");
        assert!(q.sql.contains("LIMIT 50"));
        assert!(q.sql.contains("ORDER BY query_start DESC"));
        assert!(q.params.is_empty());
    }

    #[test]
    fn process_query_reports_bare_client_address() {
        let q = build_process_list_query("");
        assert!(q.sql.contains("host(client_addr) AS client_addr"));
        assert!(!q.sql.contains("client_addr::text"));
    }

    #[test]
    fn table_query_shapes() {
        let all = build_table_sizes_query("");
        assert!(all.sql.contains("schemaname || '.' || relname"));
        assert!(all.sql.contains("LIMIT 20"));

        let one = build_table_sizes_query("app");
        assert!(one.sql.contains("schemaname = 'public'"));
        assert!(one.sql.contains("LIMIT 10"));
        assert!(one.params.is_empty());
    }
}
