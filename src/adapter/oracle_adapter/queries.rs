//! SQL for Oracle dynamic performance and dictionary views.

use crate::adapter::{Query, QueryPurpose};

pub(super) const PROCESS_LIMIT: usize = 50;
pub(super) const TABLES_LIMIT_FILTERED: usize = 10;
pub(super) const TABLES_LIMIT_ALL: usize = 20;

/// User sessions: active and total.
pub(super) fn build_connection_counts_query(schema: &str) -> Query {
    let sql = r#"
            SELECT
                COUNT(CASE WHEN status = 'ACTIVE' THEN 1 END) AS active,
                COUNT(*) AS total
            FROM v$session
            WHERE username IS NOT NULL
        "#;
    if schema.is_empty() {
        Query::new(QueryPurpose::ConnectionCounts, sql)
    } else {
        Query::new(
            QueryPurpose::ConnectionCounts,
            format!("{sql} AND schemaname = :1"),
        )
        .bind(schema)
    }
}

pub(super) fn build_uptime_query() -> Query {
    Query::new(
        QueryPurpose::Uptime,
        "SELECT ROUND((SYSDATE - startup_time) * 86400) FROM v$instance",
    )
}

/// Columns: sid, username, machine, schemaname, status, elapsed, sql_text.
pub(super) fn build_process_list_query(schema: &str) -> Query {
    let filter = if schema.is_empty() {
        ""
    } else {
        " AND s.schemaname = :1"
    };
    let query = Query::new(
        QueryPurpose::ProcessList,
        format!(
            r#"
            SELECT
                s.sid,
                s.username,
                s.machine,
                s.schemaname,
                s.status,
                ROUND((SYSDATE - s.logon_time) * 86400) AS elapsed,
                q.sql_text
            FROM v$session s
            LEFT JOIN v$sql q
                ON s.sql_id = q.sql_id AND s.sql_child_number = q.child_number
            WHERE s.username IS NOT NULL{filter}
            ORDER BY s.logon_time DESC
            FETCH FIRST {PROCESS_LIMIT} ROWS ONLY
        "#
        ),
    );
    if schema.is_empty() {
        query
    } else {
        query.bind(schema)
    }
}

/// Largest tables by table + index segment bytes.
///
/// One statement serves both shapes. With a schema the owner is bound once
/// per subquery (`:1`, `:2`, `:3`) and names are bare; without one, names are
/// `owner.table`.
pub(super) fn build_table_sizes_query(schema: &str) -> Query {
    let filtered = !schema.is_empty();
    let (name_expr, data_filter, index_filter, table_filter, limit) = if filtered {
        (
            "t.table_name",
            " AND owner = :1",
            " AND i.table_owner = :2",
            "WHERE t.owner = :3",
            TABLES_LIMIT_FILTERED,
        )
    } else {
        ("t.owner || '.' || t.table_name", "", "", "", TABLES_LIMIT_ALL)
    };

    let sql = format!(
        r#"
            SELECT
                {name_expr} AS table_name,
                NVL(t.num_rows, 0) AS num_rows,
                NVL(d.bytes, 0) AS data_size,
                NVL(x.bytes, 0) AS index_size
            FROM all_tables t
            LEFT JOIN (
                SELECT owner, segment_name, SUM(bytes) AS bytes
                FROM dba_segments
                WHERE segment_type LIKE 'TABLE%'{data_filter}
                GROUP BY owner, segment_name
            ) d ON d.owner = t.owner AND d.segment_name = t.table_name
            LEFT JOIN (
                SELECT i.table_owner, i.table_name, SUM(s.bytes) AS bytes
                FROM all_indexes i
                JOIN dba_segments s
                    ON s.owner = i.owner AND s.segment_name = i.index_name
                WHERE s.segment_type LIKE 'INDEX%'{index_filter}
                GROUP BY i.table_owner, i.table_name
            ) x ON x.table_owner = t.owner AND x.table_name = t.table_name
            {table_filter}
            ORDER BY NVL(d.bytes, 0) + NVL(x.bytes, 0) DESC
            FETCH FIRST {limit} ROWS ONLY
        "#
    );

    let query = Query::new(QueryPurpose::TableSizes, sql);
    if filtered {
        query.bind(schema).bind(schema).bind(schema)
    } else {
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filtered_table_query_binds_each_placeholder() {
        let q = build_table_sizes_query("HR");
        assert_eq!(q.params, vec!["HR", "HR", "HR"]);
        assert!(q.sql.contains(":1") && q.sql.contains(":2") && q.sql.contains(":3"));
        assert!(q.sql.contains("FETCH FIRST 10 ROWS ONLY"));
        assert!(!q.sql.contains("t.owner || '.'"));
    }

    #[test]
    fn unfiltered_table_query_qualifies_names() {
        let q = build_table_sizes_query("");
        assert!(q.params.is_empty());
        assert!(!q.sql.contains(":1"));
        assert!(q.sql.contains("t.owner || '.' || t.table_name"));
        assert!(q.sql.contains("FETCH FIRST 20 ROWS ONLY"));
    }

    #[test]
    fn session_queries_filter_by_schema() {
        let q = build_process_list_query("HR");
        assert!(q.sql.contains("s.schemaname = :1"));
        assert_eq!(q.params, vec!["HR"]);
        let q = build_connection_counts_query("");
        assert!(q.params.is_empty());
    }
}
