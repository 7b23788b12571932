//! `Session` over an `oracle::Connection`.

use oracle::sql_type::ToSql;

use crate::adapter::{Query, Row, Session, Value};

pub(super) struct OracleSession {
    conn: oracle::Connection,
}

impl OracleSession {
    /// `connect_string` is EZConnect: `host:port/service`.
    pub(super) fn open(user: &str, password: &str, connect_string: &str) -> Result<Self, String> {
        let conn = oracle::Connection::connect(user, password, connect_string)
            .map_err(|e| e.to_string())?;
        Ok(Self { conn })
    }
}

impl Session for OracleSession {
    /// Every column is fetched as text; `Row` parses numbers on demand.
    fn query(&mut self, query: &Query) -> Result<Vec<Row>, String> {
        let params: Vec<&dyn ToSql> = query.params.iter().map(|p| p as &dyn ToSql).collect();
        let result_set = self
            .conn
            .query(&query.sql, &params)
            .map_err(|e| e.to_string())?;

        let mut rows = Vec::new();
        for row in result_set {
            let row = row.map_err(|e| e.to_string())?;
            let mut values = Vec::with_capacity(row.column_info().len());
            for idx in 0..row.column_info().len() {
                let cell: Option<String> = row.get(idx).map_err(|e| e.to_string())?;
                values.push(Value::from(cell));
            }
            rows.push(Row::new(values));
        }
        Ok(rows)
    }

    fn ping(&mut self) -> Result<(), String> {
        self.conn.ping().map_err(|e| e.to_string())
    }
}
