//! `Session` over a blocking `mysql::Conn`.

use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder, Params};

use crate::adapter::{Query, Row, Session, Value};

pub(super) struct MySqlSession {
    conn: Conn,
}

impl MySqlSession {
    pub(super) fn open(opts: OptsBuilder) -> Result<Self, String> {
        let conn = Conn::new(opts).map_err(|e| e.to_string())?;
        Ok(Self { conn })
    }
}

impl Session for MySqlSession {
    fn query(&mut self, query: &Query) -> Result<Vec<Row>, String> {
        let rows: Vec<mysql::Row> = if query.params.is_empty() {
            self.conn.query::<mysql::Row, _>(query.sql.as_str())
        } else {
            let params: Vec<mysql::Value> = query
                .params
                .iter()
                .map(|p| mysql::Value::from(p.as_str()))
                .collect();
            self.conn
                .exec::<mysql::Row, _, _>(query.sql.as_str(), Params::from(params))
        }
        .map_err(|e| e.to_string())?;

        Ok(rows
            .into_iter()
            .map(|row| Row::new(row.unwrap().into_iter().map(convert_value).collect()))
            .collect())
    }

    fn ping(&mut self) -> Result<(), String> {
        self.conn.query_drop("SELECT 1").map_err(|e| e.to_string())
    }
}

/// Text protocol results arrive as bytes; numeric parsing happens in `Row`.
fn convert_value(value: mysql::Value) -> Value {
    match value {
        mysql::Value::NULL => Value::Null,
        mysql::Value::Bytes(bytes) => Value::Text(String::from_utf8_lossy(&bytes).into_owned()),
        mysql::Value::Int(n) => Value::Int(n),
        mysql::Value::UInt(n) => Value::Int(i64::try_from(n).unwrap_or(i64::MAX)),
        mysql::Value::Float(n) => Value::Float(n as f64),
        mysql::Value::Double(n) => Value::Float(n),
        mysql::Value::Date(y, mo, d, h, mi, s, _) => Value::Text(format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            y, mo, d, h, mi, s
        )),
        mysql::Value::Time(neg, days, h, mi, s, _) => {
            let total = days as i64 * 86_400 + h as i64 * 3600 + mi as i64 * 60 + s as i64;
            Value::Int(if neg { -total } else { total })
        }
    }
}
